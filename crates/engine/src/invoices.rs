//! Credit card invoices.
//!
//! An [`Invoice`] accumulates the signed amounts of the credit card movements
//! billed in one cycle. Debt is negative: an invoice of `-500_00` means
//! 500.00 are owed. The amount is frozen while the invoice is paid.

use chrono::NaiveDate;
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    BillingCycle, EngineError, ResultEngine,
    months::MonthYear,
    util::{parse_optional_uuid, parse_uuid},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub user_id: String,
    pub credit_card_id: Uuid,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub due_date: NaiveDate,
    pub payment_date: Option<NaiveDate>,
    pub amount: i64,
    pub is_paid: bool,
    /// Wallet the invoice was paid from, `None` while open.
    pub wallet_id: Option<Uuid>,
}

impl Invoice {
    #[must_use]
    pub fn open(user_id: String, credit_card_id: Uuid, cycle: &BillingCycle) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            credit_card_id,
            period_start: cycle.period_start,
            period_end: cycle.period_end,
            due_date: cycle.due_date,
            payment_date: None,
            amount: 0,
            is_paid: false,
            wallet_id: None,
        }
    }

    /// The month the invoice closes in, used as its lookup key.
    #[must_use]
    pub fn month(&self) -> MonthYear {
        MonthYear::of(self.period_end)
    }

    /// Normalizes a requested payment into the (negative) amount to settle.
    ///
    /// `None` pays the full total. A partial amount may be given with either
    /// sign; it must be non-zero and must not exceed what is owed.
    pub fn payable_amount(&self, requested: Option<i64>) -> ResultEngine<i64> {
        let Some(requested) = requested else {
            if self.amount >= 0 {
                return Err(EngineError::InvalidPaymentAmount(
                    "invoice has nothing to pay".to_string(),
                ));
            }
            return Ok(self.amount);
        };
        let owed = -requested.abs();
        if owed == 0 {
            return Err(EngineError::InvalidPaymentAmount(
                "payment amount must not be 0".to_string(),
            ));
        }
        if owed < self.amount {
            return Err(EngineError::InvalidPaymentAmount(format!(
                "payment of {} exceeds invoice total {}",
                owed.abs(),
                self.amount.abs()
            )));
        }
        Ok(owed)
    }

    pub fn ensure_open(&self) -> ResultEngine<()> {
        if self.is_paid {
            return Err(EngineError::InvoiceAlreadyPaid(self.id.to_string()));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub credit_card_id: String,
    pub period_start: Date,
    pub period_end: Date,
    pub due_date: Date,
    pub payment_date: Option<Date>,
    pub amount: i64,
    pub is_paid: bool,
    pub wallet_id: Option<String>,
    /// `year * 12 + month - 1` of `period_end`.
    pub month_index: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::credit_cards::Entity",
        from = "Column::CreditCardId",
        to = "super::credit_cards::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    CreditCards,
    #[sea_orm(has_many = "super::movements::Entity")]
    Movements,
}

impl Related<super::credit_cards::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CreditCards.def()
    }
}

impl Related<super::movements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Invoice> for ActiveModel {
    fn from(value: &Invoice) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            user_id: ActiveValue::Set(value.user_id.clone()),
            credit_card_id: ActiveValue::Set(value.credit_card_id.to_string()),
            period_start: ActiveValue::Set(value.period_start),
            period_end: ActiveValue::Set(value.period_end),
            due_date: ActiveValue::Set(value.due_date),
            payment_date: ActiveValue::Set(value.payment_date),
            amount: ActiveValue::Set(value.amount),
            is_paid: ActiveValue::Set(value.is_paid),
            wallet_id: ActiveValue::Set(value.wallet_id.map(|id| id.to_string())),
            month_index: ActiveValue::Set(value.month().index()),
        }
    }
}

impl TryFrom<Model> for Invoice {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "invoice")?,
            user_id: model.user_id,
            credit_card_id: parse_uuid(&model.credit_card_id, "credit card")?,
            period_start: model.period_start,
            period_end: model.period_end,
            due_date: model.due_date,
            payment_date: model.payment_date,
            amount: model.amount,
            is_paid: model.is_paid,
            wallet_id: parse_optional_uuid(model.wallet_id.as_deref(), "wallet")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice(amount: i64) -> Invoice {
        let date = |d| NaiveDate::from_ymd_opt(2025, 3, d).unwrap();
        Invoice {
            amount,
            ..Invoice::open(
                "alice".to_string(),
                Uuid::new_v4(),
                &BillingCycle {
                    month: MonthYear::new(2025, 3),
                    period_start: date(1),
                    period_end: date(5),
                    due_date: date(12),
                },
            )
        }
    }

    #[test]
    fn full_payment_by_default() {
        assert_eq!(invoice(-500_00).payable_amount(None).unwrap(), -500_00);
    }

    #[test]
    fn partial_payment_is_normalized() {
        let invoice = invoice(-500_00);
        assert_eq!(invoice.payable_amount(Some(200_00)).unwrap(), -200_00);
        assert_eq!(invoice.payable_amount(Some(-200_00)).unwrap(), -200_00);
        assert_eq!(invoice.payable_amount(Some(500_00)).unwrap(), -500_00);
    }

    #[test]
    fn invalid_payment_amounts() {
        assert!(matches!(
            invoice(0).payable_amount(None),
            Err(EngineError::InvalidPaymentAmount(_))
        ));
        let invoice = invoice(-500_00);
        assert!(matches!(
            invoice.payable_amount(Some(0)),
            Err(EngineError::InvalidPaymentAmount(_))
        ));
        assert!(matches!(
            invoice.payable_amount(Some(500_01)),
            Err(EngineError::InvalidPaymentAmount(_))
        ));
    }

    #[test]
    fn month_is_the_closing_month() {
        assert_eq!(invoice(0).month(), MonthYear::new(2025, 3));
    }
}
