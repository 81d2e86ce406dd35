//! Movement primitives.
//!
//! A [`Movement`] is one ledger entry: an income, an expense, a credit card
//! purchase (or one of its installments), an invoice payment or one leg of an
//! internal transfer.
//!
//! Amounts are stored as signed integer **minor units**:
//! - positive values are income / credit
//! - negative values are expenses / debt
//!
//! Only paid movements affect the balance of their wallet. Credit card
//! movements are never paid themselves: they accumulate on an invoice which is
//! settled by an `invoice_payment` movement.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    util::{parse_optional_uuid, parse_uuid},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Cash,
    DebitCard,
    BankTransfer,
    CreditCard,
    InvoicePayment,
    InternalTransfer,
}

impl PaymentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::DebitCard => "debit_card",
            Self::BankTransfer => "bank_transfer",
            Self::CreditCard => "credit_card",
            Self::InvoicePayment => "invoice_payment",
            Self::InternalTransfer => "internal_transfer",
        }
    }
}

impl TryFrom<&str> for PaymentType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "cash" => Ok(Self::Cash),
            "debit_card" => Ok(Self::DebitCard),
            "bank_transfer" => Ok(Self::BankTransfer),
            "credit_card" => Ok(Self::CreditCard),
            "invoice_payment" => Ok(Self::InvoicePayment),
            "internal_transfer" => Ok(Self::InternalTransfer),
            other => Err(EngineError::InvalidInput(format!(
                "invalid payment type: {other}"
            ))),
        }
    }
}

/// Credit card linkage of a movement.
///
/// `installment_*` fields are set only for purchases split in installments;
/// every installment of one purchase shares `installment_group_id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditCardInfo {
    pub credit_card_id: Uuid,
    pub invoice_id: Uuid,
    pub installment_number: Option<i32>,
    pub total_installments: Option<i32>,
    pub installment_group_id: Option<Uuid>,
}

impl CreditCardInfo {
    #[must_use]
    pub fn new(credit_card_id: Uuid, invoice_id: Uuid) -> Self {
        Self {
            credit_card_id,
            invoice_id,
            installment_number: None,
            total_installments: None,
            installment_group_id: None,
        }
    }

    #[must_use]
    pub fn is_installment(&self) -> bool {
        self.installment_group_id.is_some() && self.total_installments.is_some_and(|n| n > 1)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: Uuid,
    pub user_id: String,
    pub description: String,
    pub amount: i64,
    pub date: NaiveDate,
    pub is_paid: bool,
    pub is_recurrent: bool,
    pub recurrent_id: Option<Uuid>,
    pub wallet_id: Uuid,
    pub payment_type: PaymentType,
    pub category_id: Uuid,
    pub sub_category_id: Option<Uuid>,
    pub credit_card: Option<CreditCardInfo>,
    pub pair_id: Option<Uuid>,
    /// Set on the remainder carried into the next invoice by a partial
    /// payment; points to the invoice that was partially paid.
    pub remainder_of_invoice_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Movement {
    #[must_use]
    pub fn is_credit_card(&self) -> bool {
        self.payment_type == PaymentType::CreditCard && self.credit_card.is_some()
    }

    #[must_use]
    pub fn is_internal_transfer(&self) -> bool {
        self.payment_type == PaymentType::InternalTransfer && self.pair_id.is_some()
    }

    #[must_use]
    pub fn invoice_id(&self) -> Option<Uuid> {
        self.credit_card.as_ref().map(|info| info.invoice_id)
    }

    /// Signed effect of this movement on its wallet.
    #[must_use]
    pub fn wallet_effect(&self) -> Option<(Uuid, i64)> {
        self.is_paid.then_some((self.wallet_id, self.amount))
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub description: String,
    pub amount: i64,
    pub date: Date,
    pub is_paid: bool,
    pub is_recurrent: bool,
    pub recurrent_id: Option<String>,
    pub wallet_id: String,
    pub payment_type: String,
    pub category_id: String,
    pub sub_category_id: Option<String>,
    pub credit_card_id: Option<String>,
    pub invoice_id: Option<String>,
    pub installment_number: Option<i32>,
    pub total_installments: Option<i32>,
    pub installment_group_id: Option<String>,
    pub pair_id: Option<String>,
    pub remainder_of_invoice_id: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::WalletId",
        to = "super::wallets::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Wallets,
    #[sea_orm(
        belongs_to = "super::invoices::Entity",
        from = "Column::InvoiceId",
        to = "super::invoices::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Invoices,
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallets.def()
    }
}

impl Related<super::invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Movement> for ActiveModel {
    fn from(value: &Movement) -> Self {
        let info = value.credit_card.as_ref();
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            user_id: ActiveValue::Set(value.user_id.clone()),
            description: ActiveValue::Set(value.description.clone()),
            amount: ActiveValue::Set(value.amount),
            date: ActiveValue::Set(value.date),
            is_paid: ActiveValue::Set(value.is_paid),
            is_recurrent: ActiveValue::Set(value.is_recurrent),
            recurrent_id: ActiveValue::Set(value.recurrent_id.map(|id| id.to_string())),
            wallet_id: ActiveValue::Set(value.wallet_id.to_string()),
            payment_type: ActiveValue::Set(value.payment_type.as_str().to_string()),
            category_id: ActiveValue::Set(value.category_id.to_string()),
            sub_category_id: ActiveValue::Set(value.sub_category_id.map(|id| id.to_string())),
            credit_card_id: ActiveValue::Set(info.map(|i| i.credit_card_id.to_string())),
            invoice_id: ActiveValue::Set(info.map(|i| i.invoice_id.to_string())),
            installment_number: ActiveValue::Set(info.and_then(|i| i.installment_number)),
            total_installments: ActiveValue::Set(info.and_then(|i| i.total_installments)),
            installment_group_id: ActiveValue::Set(
                info.and_then(|i| i.installment_group_id)
                    .map(|id| id.to_string()),
            ),
            pair_id: ActiveValue::Set(value.pair_id.map(|id| id.to_string())),
            remainder_of_invoice_id: ActiveValue::Set(
                value.remainder_of_invoice_id.map(|id| id.to_string()),
            ),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<Model> for Movement {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        let credit_card = match (model.credit_card_id.as_deref(), model.invoice_id.as_deref()) {
            (Some(card_id), Some(invoice_id)) => Some(CreditCardInfo {
                credit_card_id: parse_uuid(card_id, "credit card")?,
                invoice_id: parse_uuid(invoice_id, "invoice")?,
                installment_number: model.installment_number,
                total_installments: model.total_installments,
                installment_group_id: parse_optional_uuid(
                    model.installment_group_id.as_deref(),
                    "installment group",
                )?,
            }),
            _ => None,
        };
        Ok(Self {
            id: parse_uuid(&model.id, "movement")?,
            user_id: model.user_id,
            description: model.description,
            amount: model.amount,
            date: model.date,
            is_paid: model.is_paid,
            is_recurrent: model.is_recurrent,
            recurrent_id: parse_optional_uuid(model.recurrent_id.as_deref(), "recurrent")?,
            wallet_id: parse_uuid(&model.wallet_id, "wallet")?,
            payment_type: PaymentType::try_from(model.payment_type.as_str())?,
            category_id: parse_uuid(&model.category_id, "category")?,
            sub_category_id: parse_optional_uuid(
                model.sub_category_id.as_deref(),
                "sub category",
            )?,
            credit_card,
            pair_id: parse_optional_uuid(model.pair_id.as_deref(), "pair")?,
            remainder_of_invoice_id: parse_optional_uuid(
                model.remainder_of_invoice_id.as_deref(),
                "invoice",
            )?,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_type_round_trips_through_storage_names() {
        for kind in [
            PaymentType::Cash,
            PaymentType::DebitCard,
            PaymentType::BankTransfer,
            PaymentType::CreditCard,
            PaymentType::InvoicePayment,
            PaymentType::InternalTransfer,
        ] {
            assert_eq!(PaymentType::try_from(kind.as_str()).unwrap(), kind);
        }
        assert!(PaymentType::try_from("pix").is_err());
    }

    #[test]
    fn single_purchase_is_not_an_installment() {
        let info = CreditCardInfo::new(Uuid::new_v4(), Uuid::new_v4());
        assert!(!info.is_installment());

        let info = CreditCardInfo {
            installment_number: Some(1),
            total_installments: Some(3),
            installment_group_id: Some(Uuid::new_v4()),
            ..info
        };
        assert!(info.is_installment());
    }
}
