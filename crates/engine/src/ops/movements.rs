use sea_orm::{DatabaseTransaction, TransactionTrait};
use uuid::Uuid;

use crate::{
    EngineError, MonthYear, Movement, MovementPatch, NewMovement, PaymentType, RecurrentMovement,
    ResultEngine,
};

use super::{Engine, with_tx};

mod delete;
mod update;

impl Engine {
    /// Add a movement.
    ///
    /// - a recurrent movement without `recurrent_id` starts a new open-ended
    ///   series dated on the movement;
    /// - credit card purchases are billed on the invoice(s) of their cycle and
    ///   consume the card limit, never the wallet;
    /// - a paid movement moves its wallet balance, and an expense must not
    ///   bring it below zero.
    ///
    /// Returns the stored movement (the first installment for installment
    /// purchases).
    pub async fn add(&self, cmd: NewMovement) -> ResultEngine<Movement> {
        validate_new_movement(&cmd)?;
        with_tx!(self, |db_tx| {
            self.require_wallet(&db_tx, &cmd.user_id, cmd.wallet_id)
                .await?;
            self.validate_classification(&db_tx, &cmd.user_id, cmd.category_id, cmd.sub_category_id)
                .await?;

            if cmd.payment_type == PaymentType::CreditCard {
                let movement = self.add_credit_card_movement(&db_tx, &cmd).await?;
                tracing::info!(
                    "added credit card movement {} for {}",
                    movement.id,
                    cmd.user_id
                );
                return Ok(movement);
            }

            let mut movement = cmd.to_movement();
            if movement.is_recurrent {
                match movement.recurrent_id {
                    Some(recurrent_id) => {
                        self.find_recurrent(&db_tx, &cmd.user_id, recurrent_id)
                            .await?
                            .ok_or_else(|| {
                                EngineError::NotFound(format!("recurrent movement {recurrent_id}"))
                            })?;
                    }
                    None => {
                        let series = RecurrentMovement::from_movement(&movement);
                        self.insert_recurrent(&db_tx, &series).await?;
                        tracing::debug!("started series {} from movement {}", series.id, movement.id);
                        movement.recurrent_id = Some(series.id);
                    }
                }
            }

            self.insert_movement(&db_tx, &movement).await?;
            self.reconcile_wallets(&db_tx, &cmd.user_id, None, Some(&movement))
                .await?;
            tracing::info!("added movement {} for {}", movement.id, cmd.user_id);
            Ok(movement)
        })
    }

    /// Checks that the category exists and, when given, that the
    /// sub-category belongs to it.
    pub(super) async fn validate_classification(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        category_id: Uuid,
        sub_category_id: Option<Uuid>,
    ) -> ResultEngine<()> {
        self.require_category(db_tx, user_id, category_id).await?;
        if let Some(sub_category_id) = sub_category_id
            && !self
                .is_sub_category_of(db_tx, user_id, sub_category_id, category_id)
                .await?
        {
            return Err(EngineError::InvalidInput(format!(
                "sub category {sub_category_id} does not belong to category {category_id}"
            )));
        }
        Ok(())
    }

    /// Validates the fields a patch changes on `movement`.
    pub(super) async fn validate_patch(
        &self,
        db_tx: &DatabaseTransaction,
        movement: &Movement,
        patch: &MovementPatch,
    ) -> ResultEngine<()> {
        if patch.amount_minor == Some(0) {
            return Err(EngineError::InvalidInput(
                "amount must not be 0".to_string(),
            ));
        }
        if let Some(wallet_id) = patch.wallet_id {
            self.require_wallet(db_tx, &movement.user_id, wallet_id)
                .await?;
        }
        if patch.category_id.is_some() || patch.sub_category_id.is_some() {
            let patched = patch.apply_to(movement);
            self.validate_classification(
                db_tx,
                &movement.user_id,
                patched.category_id,
                patched.sub_category_id,
            )
            .await?;
        }
        Ok(())
    }

    /// Points the stored instances of `from_series` dated after `cut_month`
    /// at `to_series`, leaving `skip` alone.
    pub(super) async fn repoint_later_instances(
        &self,
        db_tx: &DatabaseTransaction,
        from_series: Uuid,
        to_series: Uuid,
        cut_month: MonthYear,
        skip: Uuid,
    ) -> ResultEngine<()> {
        let from = cut_month.shift(1).first_day()?;
        for mut movement in self.series_instances_from(db_tx, from_series, from).await? {
            if movement.id == skip {
                continue;
            }
            movement.recurrent_id = Some(to_series);
            self.update_movement(db_tx, &movement).await?;
            tracing::debug!("moved {} from series {from_series} to {to_series}", movement.id);
        }
        Ok(())
    }
}

fn validate_new_movement(cmd: &NewMovement) -> ResultEngine<()> {
    if cmd.amount_minor == 0 {
        return Err(EngineError::InvalidInput(
            "amount must not be 0".to_string(),
        ));
    }
    let is_credit_card = cmd.payment_type == PaymentType::CreditCard;
    if is_credit_card && cmd.is_recurrent {
        return Err(EngineError::RecurrentCreditCardNotSupported(
            "credit card movements cannot be recurrent".to_string(),
        ));
    }
    if is_credit_card && cmd.credit_card_id.is_none() {
        return Err(EngineError::InvalidInput(
            "credit card movement requires a credit card".to_string(),
        ));
    }
    if is_credit_card && cmd.is_paid {
        return Err(EngineError::CreditMovementShouldNotBePaid(
            "credit card movements are settled by paying their invoice".to_string(),
        ));
    }
    if cmd.total_installments == Some(0) {
        return Err(EngineError::InvalidInput(
            "installments must be at least 1".to_string(),
        ));
    }
    if matches!(
        cmd.payment_type,
        PaymentType::InvoicePayment | PaymentType::InternalTransfer
    ) {
        return Err(EngineError::UnsupportedMovementType(format!(
            "{} movements are created by the engine",
            cmd.payment_type.as_str()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn cmd(amount_minor: i64) -> NewMovement {
        NewMovement::new(
            "alice",
            "Coffee",
            amount_minor,
            NaiveDate::from_ymd_opt(2025, 5, 2).unwrap(),
            Uuid::new_v4(),
            Uuid::new_v4(),
        )
    }

    #[test]
    fn zero_amount_is_rejected() {
        assert!(matches!(
            validate_new_movement(&cmd(0)),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn recurrent_credit_card_is_rejected() {
        let cmd = cmd(-10_00).credit_card(Uuid::new_v4()).recurrent();
        assert!(matches!(
            validate_new_movement(&cmd),
            Err(EngineError::RecurrentCreditCardNotSupported(_))
        ));
    }

    #[test]
    fn paid_credit_card_is_rejected() {
        let cmd = cmd(-10_00).credit_card(Uuid::new_v4()).paid();
        assert!(matches!(
            validate_new_movement(&cmd),
            Err(EngineError::CreditMovementShouldNotBePaid(_))
        ));
    }

    #[test]
    fn engine_owned_payment_types_are_rejected() {
        let cmd = cmd(-10_00).payment_type(PaymentType::InternalTransfer);
        assert!(matches!(
            validate_new_movement(&cmd),
            Err(EngineError::UnsupportedMovementType(_))
        ));
    }
}
