#![allow(dead_code)]

use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::Engine;
use migration::MigratorTrait;

pub const USER: &str = "alice";

pub struct Ledger {
    pub engine: Engine,
    pub db: DatabaseConnection,
    pub cash: Uuid,
    pub bank: Uuid,
    pub home: Uuid,
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// In-memory ledger with a `Cash` wallet holding 1000.00, an empty `Bank`
/// wallet and a `Home` category.
pub async fn ledger() -> Ledger {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();

    let opened = date(2025, 1, 1);
    let cash = engine
        .new_wallet(USER, "Cash", 1000_00, opened)
        .await
        .unwrap();
    let bank = engine.new_wallet(USER, "Bank", 0, opened).await.unwrap();
    let home = engine.new_category(USER, "Home").await.unwrap();

    Ledger {
        engine,
        db,
        cash,
        bank,
        home,
    }
}

pub async fn count(db: &DatabaseConnection, table: &str) -> i64 {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_string(
            backend,
            format!("SELECT COUNT(*) AS n FROM {table}"),
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get::<i64>("", "n").unwrap()
}

pub async fn balance(ledger: &Ledger, wallet_id: Uuid) -> i64 {
    ledger.engine.wallet(USER, wallet_id).await.unwrap().balance
}

pub async fn assert_no_drift(ledger: &Ledger, wallet_id: Uuid) {
    let audit = ledger.engine.audit_wallet(USER, wallet_id).await.unwrap();
    assert_eq!(audit.drift, 0, "{audit:?}");
}
