//! Category registry per user.
//!
//! Categories are plain lookup rows; the engine only needs them to validate
//! sub-category membership and to tag transfer legs and invoice payments with
//! the per-user system categories.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Categories the engine creates on its own, at most one per user and kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemCategoryKind {
    TransferIn,
    TransferOut,
    /// Invoice payments and the remainders they carry over.
    InvoicePayment,
}

impl SystemCategoryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TransferIn => "transfer_in",
            Self::TransferOut => "transfer_out",
            Self::InvoicePayment => "invoice_payment",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::TransferIn => "Transfer in",
            Self::TransferOut => "Transfer out",
            Self::InvoicePayment => "Invoice payment",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub system_kind: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sub_categories::Entity")]
    SubCategories,
}

impl Related<super::sub_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubCategories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
