//! The module contains `Wallet` struct and its implementation.

use chrono::NaiveDate;
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

/// A wallet.
///
/// A wallet is a representation of a real wallet, a bank account or anything
/// else where money are kept. It is not a representation of a credit card.
///
/// `balance` is maintained incrementally: it starts at `initial_balance` and
/// moves by the signed amount of every paid movement attached to the wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub balance: i64,
    pub initial_balance: i64,
    pub initial_date: NaiveDate,
}

impl Wallet {
    pub fn new(user_id: String, name: String, initial_balance: i64, initial_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            balance: initial_balance,
            initial_balance,
            initial_date,
        }
    }

    /// Returns `true` if applying `amount_minor` keeps the balance
    /// non-negative. Credits are always affordable.
    #[must_use]
    pub fn can_afford(&self, amount_minor: i64) -> bool {
        amount_minor >= 0 || self.balance + amount_minor >= 0
    }

    /// Applies a signed amount to the balance.
    pub fn apply(&mut self, amount_minor: i64) {
        self.balance += amount_minor;
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub balance: i64,
    pub initial_balance: i64,
    pub initial_date: Date,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::movements::Entity")]
    Movements,
}

impl Related<super::movements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Wallet> for ActiveModel {
    fn from(value: &Wallet) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            user_id: ActiveValue::Set(value.user_id.clone()),
            name: ActiveValue::Set(value.name.clone()),
            balance: ActiveValue::Set(value.balance),
            initial_balance: ActiveValue::Set(value.initial_balance),
            initial_date: ActiveValue::Set(value.initial_date),
        }
    }
}

impl TryFrom<Model> for Wallet {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "wallet")?,
            user_id: model.user_id,
            name: model.name,
            balance: model.balance,
            initial_balance: model.initial_balance,
            initial_date: model.initial_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet(balance: i64) -> Wallet {
        Wallet::new(
            "alice".to_string(),
            String::from("Cash"),
            balance,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        )
    }

    #[test]
    fn apply_moves_balance_both_ways() {
        let mut wallet = wallet(1000);
        wallet.apply(-400);
        assert_eq!(wallet.balance, 600);
        wallet.apply(400);
        assert_eq!(wallet.balance, 1000);
        assert_eq!(wallet.initial_balance, 1000);
    }

    #[test]
    fn debit_over_balance_is_not_affordable() {
        let wallet = wallet(100);
        assert!(wallet.can_afford(-100));
        assert!(!wallet.can_afford(-101));
    }

    #[test]
    fn credits_are_always_affordable() {
        let overdrawn = wallet(-50);
        assert!(overdrawn.can_afford(10));
        assert!(!overdrawn.can_afford(-1));
        assert!(wallet(0).can_afford(0));
    }
}
