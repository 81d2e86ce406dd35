use chrono::Utc;
use sea_orm::{DatabaseTransaction, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    CreditCard, CreditCardInfo, EngineError, Movement, MovementPatch, NewMovement, PaymentType,
    ResultEngine, credit_cards,
    months::shift_months,
    util::normalize_required_name,
};

use super::{Engine, with_tx};

impl Engine {
    /// Return a credit card snapshot from DB.
    pub async fn credit_card(&self, user_id: &str, credit_card_id: Uuid) -> ResultEngine<CreditCard> {
        with_tx!(self, |db_tx| {
            self.require_credit_card(&db_tx, user_id, credit_card_id)
                .await
        })
    }

    /// Add a credit card whose invoices are paid by default from
    /// `default_wallet_id`.
    pub async fn new_credit_card(
        &self,
        user_id: &str,
        name: &str,
        credit_limit: i64,
        closing_day: u32,
        due_day: u32,
        default_wallet_id: Uuid,
    ) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "credit card")?;
        let card = CreditCard::new(
            user_id.to_string(),
            name,
            credit_limit,
            closing_day,
            due_day,
            default_wallet_id,
        )?;
        with_tx!(self, |db_tx| {
            self.require_wallet(&db_tx, user_id, default_wallet_id)
                .await?;
            credit_cards::ActiveModel::from(&card).insert(&db_tx).await?;
            tracing::info!("created credit card {} for {user_id}", card.id);
            Ok(card.id)
        })
    }

    /// Bills a purchase on the invoices of its card.
    ///
    /// With `n` installments the amount is split in `n` parts (the first one
    /// takes the cents left over), dated one month apart and each billed on
    /// the invoice of its own cycle. The whole amount is taken from the card
    /// limit at once.
    pub(super) async fn add_credit_card_movement(
        &self,
        db_tx: &DatabaseTransaction,
        cmd: &NewMovement,
    ) -> ResultEngine<Movement> {
        if cmd.is_paid {
            return Err(EngineError::CreditMovementShouldNotBePaid(
                "credit card movements are settled by paying their invoice".to_string(),
            ));
        }
        let Some(credit_card_id) = cmd.credit_card_id else {
            return Err(EngineError::InvalidInput(
                "credit card movement requires a credit card".to_string(),
            ));
        };
        let card = self
            .require_credit_card(db_tx, &cmd.user_id, credit_card_id)
            .await?;
        self.update_limit_delta(db_tx, &cmd.user_id, card.id, cmd.amount_minor, true)
            .await?;

        let parts = split_installments(cmd.amount_minor, cmd.total_installments.unwrap_or(1));
        let total = i32::try_from(parts.len())
            .map_err(|_| EngineError::InvalidInput("too many installments".to_string()))?;
        let group_id = (total > 1).then(Uuid::new_v4);

        let mut first = None;
        for (number, amount) in (1..=total).zip(parts) {
            let date = shift_months(cmd.date, number - 1)?;
            let explicit_invoice = if number == 1 { cmd.invoice_id } else { None };
            let invoice = self
                .find_or_create_invoice(db_tx, &cmd.user_id, explicit_invoice, &card, date)
                .await?;
            invoice.ensure_open()?;

            let movement = Movement {
                amount,
                date,
                credit_card: Some(CreditCardInfo {
                    installment_number: group_id.map(|_| number),
                    total_installments: group_id.map(|_| total),
                    installment_group_id: group_id,
                    ..CreditCardInfo::new(card.id, invoice.id)
                }),
                ..cmd.to_movement()
            };
            self.insert_movement(db_tx, &movement).await?;
            self.add_to_invoice_amount(db_tx, &invoice, amount).await?;
            tracing::debug!("billed {amount} on invoice {} of card {}", invoice.id, card.id);
            first.get_or_insert(movement);
        }

        first.ok_or_else(|| EngineError::InvalidInput("installments must be at least 1".to_string()))
    }

    /// Applies an "edit this and following" patch to a credit card purchase.
    ///
    /// For installment purchases the patch reaches the edited installment and
    /// every later one: the first takes `patch.date`, the others follow one
    /// month apart. Amount and cycle changes move the invoice amounts and the
    /// card limit by their difference.
    pub(super) async fn update_credit_card_movements(
        &self,
        db_tx: &DatabaseTransaction,
        movement: &Movement,
        patch: &MovementPatch,
    ) -> ResultEngine<Movement> {
        validate_credit_card_patch(patch)?;
        self.validate_patch(db_tx, movement, patch).await?;
        let Some(info) = movement.credit_card.as_ref() else {
            return Err(EngineError::UnsupportedMovementType(format!(
                "movement {} is not a credit card movement",
                movement.id
            )));
        };
        let user_id = movement.user_id.as_str();
        let card = self
            .require_credit_card(db_tx, user_id, info.credit_card_id)
            .await?;

        let affected = match info.installment_group_id.zip(info.installment_number) {
            Some((group_id, number)) if info.is_installment() => {
                self.installments_from_number(db_tx, user_id, group_id, number)
                    .await?
            }
            _ => vec![movement.clone()],
        };
        let start = patch.date.unwrap_or(movement.date);

        // Installments on a paid invoice are settled and stay untouched.
        for old in &affected {
            if let Some(old_info) = old.credit_card.as_ref() {
                self.require_invoice(db_tx, user_id, old_info.invoice_id)
                    .await?
                    .ensure_open()?;
            }
        }

        let mut limit_delta = 0;
        let mut updated = Vec::with_capacity(affected.len());
        for (offset, old) in (0..).zip(&affected) {
            let Some(old_info) = old.credit_card.as_ref() else {
                continue;
            };
            let date = shift_months(start, offset)?;
            let mut new = Movement {
                date,
                is_paid: false,
                is_recurrent: false,
                recurrent_id: None,
                payment_type: PaymentType::CreditCard,
                updated_at: Utc::now(),
                ..patch.apply_to(old)
            };

            let invoice = self
                .find_or_create_invoice(db_tx, user_id, None, &card, date)
                .await?;
            if invoice.id != old_info.invoice_id || new.amount != old.amount {
                self.adjust_invoice(db_tx, user_id, old_info.invoice_id, -old.amount)
                    .await?;
                self.adjust_invoice(db_tx, user_id, invoice.id, new.amount)
                    .await?;
                limit_delta += new.amount - old.amount;
            }
            new.credit_card = Some(CreditCardInfo {
                invoice_id: invoice.id,
                ..old_info.clone()
            });
            self.update_movement(db_tx, &new).await?;
            updated.push(new);
        }

        self.update_limit_delta(db_tx, user_id, card.id, limit_delta, true)
            .await?;

        updated
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::NotFound(format!("movement {}", movement.id)))
    }
}

/// Splits `amount_minor` in `count` parts; the first part takes the
/// remainder so that the parts add up to the amount.
fn split_installments(amount_minor: i64, count: u32) -> Vec<i64> {
    let count = i64::from(count.max(1));
    let base = amount_minor / count;
    let remainder = amount_minor - base * count;
    (0..count)
        .map(|index| if index == 0 { base + remainder } else { base })
        .collect()
}

fn validate_credit_card_patch(patch: &MovementPatch) -> ResultEngine<()> {
    if patch.is_paid == Some(true) {
        return Err(EngineError::CreditMovementShouldNotBePaid(
            "credit card movements are settled by paying their invoice".to_string(),
        ));
    }
    if patch.is_recurrent == Some(true) {
        return Err(EngineError::RecurrentCreditCardNotSupported(
            "credit card movements cannot be recurrent".to_string(),
        ));
    }
    if patch
        .payment_type
        .is_some_and(|kind| kind != PaymentType::CreditCard)
    {
        return Err(EngineError::UnsupportedMovementType(
            "credit card movements cannot change payment type".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installments_add_up_and_first_takes_cents() {
        let parts = split_installments(-100_00, 3);
        assert_eq!(parts, vec![-33_34, -33_33, -33_33]);
        assert_eq!(parts.iter().sum::<i64>(), -100_00);

        assert_eq!(split_installments(-90_00, 3), vec![-30_00; 3]);
        assert_eq!(split_installments(-5, 1), vec![-5]);
    }

    #[test]
    fn payment_type_change_is_rejected() {
        let patch = MovementPatch::new().payment_type(PaymentType::Cash);
        assert!(matches!(
            validate_credit_card_patch(&patch),
            Err(EngineError::UnsupportedMovementType(_))
        ));
        assert!(validate_credit_card_patch(&MovementPatch::new().amount(-5)).is_ok());
    }
}
