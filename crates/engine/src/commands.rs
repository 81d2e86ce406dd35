//! Command structs for engine operations.
//!
//! These types group parameters for write operations (movements, invoices,
//! transfers), keeping call sites readable and avoiding long argument lists.

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::{Movement, PaymentType, RecurrentMovement};

/// Create a movement.
///
/// Credit card purchases set `credit_card_id` (and optionally an explicit
/// `invoice_id` or `total_installments`); they must not be paid.
#[derive(Clone, Debug)]
pub struct NewMovement {
    pub user_id: String,
    pub description: String,
    pub amount_minor: i64,
    pub date: NaiveDate,
    pub wallet_id: Uuid,
    pub category_id: Uuid,
    pub sub_category_id: Option<Uuid>,
    pub payment_type: PaymentType,
    pub is_paid: bool,
    pub is_recurrent: bool,
    pub recurrent_id: Option<Uuid>,
    pub credit_card_id: Option<Uuid>,
    pub invoice_id: Option<Uuid>,
    pub total_installments: Option<u32>,
}

impl NewMovement {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        description: impl Into<String>,
        amount_minor: i64,
        date: NaiveDate,
        wallet_id: Uuid,
        category_id: Uuid,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            description: description.into(),
            amount_minor,
            date,
            wallet_id,
            category_id,
            sub_category_id: None,
            payment_type: PaymentType::Cash,
            is_paid: false,
            is_recurrent: false,
            recurrent_id: None,
            credit_card_id: None,
            invoice_id: None,
            total_installments: None,
        }
    }

    #[must_use]
    pub fn paid(mut self) -> Self {
        self.is_paid = true;
        self
    }

    #[must_use]
    pub fn recurrent(mut self) -> Self {
        self.is_recurrent = true;
        self
    }

    #[must_use]
    pub fn recurrent_id(mut self, recurrent_id: Uuid) -> Self {
        self.is_recurrent = true;
        self.recurrent_id = Some(recurrent_id);
        self
    }

    #[must_use]
    pub fn payment_type(mut self, payment_type: PaymentType) -> Self {
        self.payment_type = payment_type;
        self
    }

    #[must_use]
    pub fn sub_category(mut self, sub_category_id: Uuid) -> Self {
        self.sub_category_id = Some(sub_category_id);
        self
    }

    /// Bills the movement on a credit card.
    #[must_use]
    pub fn credit_card(mut self, credit_card_id: Uuid) -> Self {
        self.payment_type = PaymentType::CreditCard;
        self.credit_card_id = Some(credit_card_id);
        self
    }

    #[must_use]
    pub fn invoice(mut self, invoice_id: Uuid) -> Self {
        self.invoice_id = Some(invoice_id);
        self
    }

    #[must_use]
    pub fn installments(mut self, total_installments: u32) -> Self {
        self.total_installments = Some(total_installments);
        self
    }

    pub(crate) fn to_movement(&self) -> Movement {
        let now = Utc::now();
        Movement {
            id: Uuid::new_v4(),
            user_id: self.user_id.clone(),
            description: self.description.trim().to_string(),
            amount: self.amount_minor,
            date: self.date,
            is_paid: self.is_paid,
            is_recurrent: self.is_recurrent,
            recurrent_id: self.recurrent_id,
            wallet_id: self.wallet_id,
            payment_type: self.payment_type,
            category_id: self.category_id,
            sub_category_id: self.sub_category_id,
            credit_card: None,
            pair_id: None,
            remainder_of_invoice_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a movement.
///
/// `None` leaves a field unchanged; `Some` overrides it, including with an
/// empty description or a cleared sub-category.
#[derive(Clone, Debug, Default)]
pub struct MovementPatch {
    pub description: Option<String>,
    pub amount_minor: Option<i64>,
    pub date: Option<NaiveDate>,
    pub is_paid: Option<bool>,
    pub is_recurrent: Option<bool>,
    pub wallet_id: Option<Uuid>,
    pub payment_type: Option<PaymentType>,
    pub category_id: Option<Uuid>,
    pub sub_category_id: Option<Option<Uuid>>,
}

impl MovementPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn amount(mut self, amount_minor: i64) -> Self {
        self.amount_minor = Some(amount_minor);
        self
    }

    #[must_use]
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn paid(mut self, is_paid: bool) -> Self {
        self.is_paid = Some(is_paid);
        self
    }

    #[must_use]
    pub fn recurrent(mut self, is_recurrent: bool) -> Self {
        self.is_recurrent = Some(is_recurrent);
        self
    }

    #[must_use]
    pub fn wallet_id(mut self, wallet_id: Uuid) -> Self {
        self.wallet_id = Some(wallet_id);
        self
    }

    #[must_use]
    pub fn payment_type(mut self, payment_type: PaymentType) -> Self {
        self.payment_type = Some(payment_type);
        self
    }

    #[must_use]
    pub fn category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn sub_category(mut self, sub_category_id: Option<Uuid>) -> Self {
        self.sub_category_id = Some(sub_category_id);
        self
    }

    /// Returns `movement` with the patched fields replaced.
    #[must_use]
    pub fn apply_to(&self, movement: &Movement) -> Movement {
        Movement {
            description: self
                .description
                .clone()
                .unwrap_or_else(|| movement.description.clone()),
            amount: self.amount_minor.unwrap_or(movement.amount),
            date: self.date.unwrap_or(movement.date),
            is_paid: self.is_paid.unwrap_or(movement.is_paid),
            is_recurrent: self.is_recurrent.unwrap_or(movement.is_recurrent),
            wallet_id: self.wallet_id.unwrap_or(movement.wallet_id),
            payment_type: self.payment_type.unwrap_or(movement.payment_type),
            category_id: self.category_id.unwrap_or(movement.category_id),
            sub_category_id: self.sub_category_id.unwrap_or(movement.sub_category_id),
            updated_at: Utc::now(),
            ..movement.clone()
        }
    }

    /// Returns `series` with the patched template fields replaced.
    ///
    /// Dates are not part of a template: the split decides where the series
    /// starts and ends.
    #[must_use]
    pub fn apply_to_series(&self, series: &RecurrentMovement) -> RecurrentMovement {
        RecurrentMovement {
            description: self
                .description
                .clone()
                .unwrap_or_else(|| series.description.clone()),
            amount: self.amount_minor.unwrap_or(series.amount),
            wallet_id: self.wallet_id.unwrap_or(series.wallet_id),
            payment_type: self.payment_type.unwrap_or(series.payment_type),
            category_id: self.category_id.unwrap_or(series.category_id),
            sub_category_id: self.sub_category_id.unwrap_or(series.sub_category_id),
            ..series.clone()
        }
    }

    pub(crate) fn touches_credit_card(&self) -> bool {
        self.payment_type == Some(PaymentType::CreditCard)
    }
}

/// Settle a credit card invoice.
#[derive(Clone, Debug)]
pub struct PayInvoiceCmd {
    pub user_id: String,
    pub invoice_id: Uuid,
    pub wallet_id: Uuid,
    /// Defaults to today.
    pub payment_date: Option<NaiveDate>,
    /// Partial payment; `None` pays the full total.
    pub amount_minor: Option<i64>,
}

impl PayInvoiceCmd {
    #[must_use]
    pub fn new(user_id: impl Into<String>, invoice_id: Uuid, wallet_id: Uuid) -> Self {
        Self {
            user_id: user_id.into(),
            invoice_id,
            wallet_id,
            payment_date: None,
            amount_minor: None,
        }
    }

    #[must_use]
    pub fn payment_date(mut self, payment_date: NaiveDate) -> Self {
        self.payment_date = Some(payment_date);
        self
    }

    #[must_use]
    pub fn amount(mut self, amount_minor: i64) -> Self {
        self.amount_minor = Some(amount_minor);
        self
    }
}

/// Move money between two wallets of the same user.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub user_id: String,
    pub origin_wallet_id: Uuid,
    pub destination_wallet_id: Uuid,
    pub amount_minor: i64,
    pub date: Option<NaiveDate>,
    pub note: Option<String>,
    pub is_paid: bool,
}

impl TransferCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        origin_wallet_id: Uuid,
        destination_wallet_id: Uuid,
        amount_minor: i64,
        date: NaiveDate,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            origin_wallet_id,
            destination_wallet_id,
            amount_minor,
            date: Some(date),
            note: None,
            is_paid: true,
        }
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn unpaid(mut self) -> Self {
        self.is_paid = false;
        self
    }
}

/// Edit an existing transfer through one of its legs.
#[derive(Clone, Debug)]
pub struct UpdateTransferCmd {
    pub user_id: String,
    /// Either leg of the pair; date-only edits change this leg only.
    pub movement_id: Uuid,
    pub origin_wallet_id: Uuid,
    pub destination_wallet_id: Uuid,
    pub amount_minor: i64,
    pub date: Option<NaiveDate>,
    pub note: Option<String>,
}

impl UpdateTransferCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        movement_id: Uuid,
        origin_wallet_id: Uuid,
        destination_wallet_id: Uuid,
        amount_minor: i64,
        date: NaiveDate,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            movement_id,
            origin_wallet_id,
            destination_wallet_id,
            amount_minor,
            date: Some(date),
            note: None,
        }
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movement() -> Movement {
        NewMovement::new(
            "alice",
            "Groceries",
            -42_00,
            NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
            Uuid::new_v4(),
            Uuid::new_v4(),
        )
        .sub_category(Uuid::new_v4())
        .to_movement()
    }

    #[test]
    fn empty_patch_changes_nothing_but_timestamp() {
        let original = movement();
        let patched = MovementPatch::new().apply_to(&original);
        assert_eq!(patched.description, original.description);
        assert_eq!(patched.amount, original.amount);
        assert_eq!(patched.date, original.date);
        assert_eq!(patched.sub_category_id, original.sub_category_id);
    }

    #[test]
    fn patch_can_clear_fields() {
        let original = movement();
        let patched = MovementPatch::new()
            .description("")
            .sub_category(None)
            .amount(-10_00)
            .apply_to(&original);
        assert_eq!(patched.description, "");
        assert_eq!(patched.sub_category_id, None);
        assert_eq!(patched.amount, -10_00);
        assert_eq!(patched.id, original.id);
    }
}
