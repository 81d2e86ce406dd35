use chrono::NaiveDate;
use sea_orm::{QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, Wallet, util::normalize_required_name, wallets};

use super::{Engine, with_tx};

impl Engine {
    /// Return a wallet snapshot from DB.
    pub async fn wallet(&self, user_id: &str, wallet_id: Uuid) -> ResultEngine<Wallet> {
        with_tx!(self, |db_tx| {
            self.require_wallet(&db_tx, user_id, wallet_id).await
        })
    }

    /// Add a new wallet starting at `initial_balance` on `initial_date`.
    ///
    /// Names are unique per user, case-insensitively.
    pub async fn new_wallet(
        &self,
        user_id: &str,
        name: &str,
        initial_balance: i64,
        initial_date: NaiveDate,
    ) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "wallet")?;
        with_tx!(self, |db_tx| {
            let exists = wallets::Entity::find()
                .filter(wallets::Column::UserId.eq(user_id))
                .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::Conflict(format!("wallet '{name}'")));
            }

            let wallet = Wallet::new(user_id.to_string(), name, initial_balance, initial_date);
            wallets::ActiveModel::from(&wallet).insert(&db_tx).await?;
            tracing::info!("created wallet {} for {user_id}", wallet.id);
            Ok(wallet.id)
        })
    }
}
