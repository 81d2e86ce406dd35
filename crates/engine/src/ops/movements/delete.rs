use chrono::NaiveDate;
use sea_orm::{DatabaseTransaction, TransactionTrait};
use uuid::Uuid;

use crate::{EngineError, Movement, ResultEngine};

use super::super::{Engine, with_tx};

impl Engine {
    /// Delete one credit card movement, backing it out of its invoice and
    /// giving its amount back to the card limit.
    pub async fn delete_one(&self, user_id: &str, id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let movement = self.require_movement(&db_tx, user_id, id).await?;
            if !movement.is_credit_card() {
                return Err(EngineError::UnsupportedMovementType(format!(
                    "movement {id} is not a credit card movement"
                )));
            }
            self.remove_credit_card_movement(&db_tx, &movement).await?;
            tracing::info!("deleted movement {id} for {user_id}");
            Ok(())
        })
    }

    /// Delete a credit card movement and, for installment purchases, every
    /// following installment.
    ///
    /// Nothing is deleted when one of the installments sits on a paid
    /// invoice.
    pub async fn delete_all_next(
        &self,
        user_id: &str,
        id: Uuid,
        date: Option<NaiveDate>,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let resolved = self.resolve(&db_tx, user_id, id, date).await?;
            let movement = resolved.movement();
            if resolved.is_virtual() || !movement.is_credit_card() {
                return Err(EngineError::UnsupportedMovementType(format!(
                    "movement {id} is not a credit card movement"
                )));
            }

            let group = movement
                .credit_card
                .as_ref()
                .filter(|info| info.is_installment())
                .and_then(|info| info.installment_group_id.zip(info.installment_number));
            let Some((group_id, number)) = group else {
                self.remove_credit_card_movement(&db_tx, movement).await?;
                tracing::info!("deleted movement {id} for {user_id}");
                return Ok(());
            };

            let installments = self
                .installments_from_number(&db_tx, user_id, group_id, number)
                .await?;
            for installment in &installments {
                let Some(invoice_id) = installment.invoice_id() else {
                    continue;
                };
                self.require_invoice(&db_tx, user_id, invoice_id)
                    .await?
                    .ensure_open()?;
            }
            for installment in &installments {
                self.remove_credit_card_movement(&db_tx, installment)
                    .await?;
            }
            tracing::info!(
                "deleted {} installments of group {group_id} for {user_id}",
                installments.len()
            );
            Ok(())
        })
    }

    async fn remove_credit_card_movement(
        &self,
        db_tx: &DatabaseTransaction,
        movement: &Movement,
    ) -> ResultEngine<()> {
        if movement.is_paid {
            return Err(EngineError::CreditMovementShouldNotBePaid(format!(
                "movement {} is paid",
                movement.id
            )));
        }
        let Some(info) = movement.credit_card.as_ref() else {
            return Err(EngineError::UnsupportedMovementType(format!(
                "movement {} is not a credit card movement",
                movement.id
            )));
        };
        self.adjust_invoice(db_tx, &movement.user_id, info.invoice_id, -movement.amount)
            .await?;
        self.update_limit_delta(
            db_tx,
            &movement.user_id,
            info.credit_card_id,
            -movement.amount,
            false,
        )
        .await?;
        self.delete_movement(db_tx, movement.id).await
    }
}
