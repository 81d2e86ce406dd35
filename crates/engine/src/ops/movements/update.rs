use chrono::{NaiveDate, Utc};
use sea_orm::{DatabaseTransaction, TransactionTrait};
use uuid::Uuid;

use crate::{
    EngineError, MonthYear, Movement, MovementPatch, MovementTarget, PaymentType,
    RecurrentMovement, ResolvedMovement, ResultEngine, recurrents::split,
};

use super::super::{Engine, with_tx};

impl Engine {
    /// Edit one instance of a movement.
    ///
    /// `target_date` picks the month when `id` names a recurring series with
    /// no stored movement for that month. An instance of a series is cut out
    /// of it: the series ends the month before, a copy resumes the month
    /// after, and the edited instance is stored as a standalone movement.
    pub async fn update_one(
        &self,
        user_id: &str,
        id: Uuid,
        target_date: Option<NaiveDate>,
        patch: MovementPatch,
    ) -> ResultEngine<Movement> {
        with_tx!(self, |db_tx| {
            let resolved = self.resolve(&db_tx, user_id, id, target_date).await?;
            ensure_user_editable(resolved.movement(), &patch)?;
            if resolved.is_credit_card() || patch.touches_credit_card() {
                return Err(EngineError::UnsupportedMovementType(
                    "credit card movements are edited through update_all_next".to_string(),
                ));
            }
            self.validate_patch(&db_tx, resolved.movement(), &patch)
                .await?;

            if resolved.is_recurrent() {
                self.split_around(&db_tx, &resolved, None).await?;
            }

            let movement = match &resolved.target {
                MovementTarget::Virtual { projected, .. } => {
                    let now = Utc::now();
                    let movement = Movement {
                        id: Uuid::new_v4(),
                        is_recurrent: false,
                        recurrent_id: None,
                        created_at: now,
                        ..patch.apply_to(projected)
                    };
                    self.insert_movement(&db_tx, &movement).await?;
                    self.reconcile_wallets(&db_tx, user_id, None, Some(&movement))
                        .await?;
                    movement
                }
                MovementTarget::Materialized(old) => {
                    let movement = Movement {
                        is_recurrent: false,
                        recurrent_id: None,
                        ..patch.apply_to(old)
                    };
                    self.update_movement(&db_tx, &movement).await?;
                    self.reconcile_wallets(&db_tx, user_id, Some(old), Some(&movement))
                        .await?;
                    movement
                }
            };

            tracing::info!("updated movement {} for {user_id}", movement.id);
            Ok(movement)
        })
    }

    /// Edit an instance and every following one.
    ///
    /// `patch.date` is required: it is the date of the edited instance and
    /// the point where a recurring series is split. The following months
    /// then come from a new series built from the patched template.
    pub async fn update_all_next(
        &self,
        user_id: &str,
        id: Uuid,
        patch: MovementPatch,
    ) -> ResultEngine<Movement> {
        let Some(cut) = patch.date else {
            return Err(EngineError::DateRequired(
                "date is required to update following movements".to_string(),
            ));
        };
        with_tx!(self, |db_tx| {
            let resolved = self.resolve(&db_tx, user_id, id, Some(cut)).await?;
            ensure_user_editable(resolved.movement(), &patch)?;

            if resolved.is_credit_card() || patch.touches_credit_card() {
                if resolved.is_recurrent() {
                    return Err(EngineError::RecurrentCreditCardNotSupported(format!(
                        "movement {id} is recurrent"
                    )));
                }
                let MovementTarget::Materialized(movement) = &resolved.target else {
                    return Err(EngineError::UnsupportedMovementType(format!(
                        "movement {id} is not a credit card movement"
                    )));
                };
                if !movement.is_credit_card() {
                    return Err(EngineError::UnsupportedMovementType(format!(
                        "movement {id} is not a credit card movement"
                    )));
                }
                let updated = self
                    .update_credit_card_movements(&db_tx, movement, &patch)
                    .await?;
                tracing::info!("updated credit card movement {} for {user_id}", updated.id);
                return Ok(updated);
            }

            self.validate_patch(&db_tx, resolved.movement(), &patch)
                .await?;

            let Some(series) = resolved.recurrent.as_ref().filter(|_| resolved.is_recurrent())
            else {
                let MovementTarget::Materialized(old) = &resolved.target else {
                    return Err(EngineError::NotFound(format!("movement {id}")));
                };
                let mut movement = patch.apply_to(old);
                movement.is_recurrent = old.is_recurrent;
                self.update_movement(&db_tx, &movement).await?;
                self.reconcile_wallets(&db_tx, user_id, Some(old), Some(&movement))
                    .await?;
                tracing::info!("updated movement {} for {user_id}", movement.id);
                return Ok(movement);
            };

            let resolved = ResolvedMovement {
                target_month: MonthYear::of(cut),
                ..resolved.clone()
            };
            let successor = self
                .split_around(&db_tx, &resolved, Some(patch.apply_to_series(series)))
                .await?;

            let movement = match &resolved.target {
                MovementTarget::Virtual { projected, .. } => {
                    let now = Utc::now();
                    let movement = Movement {
                        id: Uuid::new_v4(),
                        is_recurrent: true,
                        recurrent_id: Some(successor.id),
                        created_at: now,
                        ..patch.apply_to(projected)
                    };
                    self.insert_movement(&db_tx, &movement).await?;
                    self.reconcile_wallets(&db_tx, user_id, None, Some(&movement))
                        .await?;
                    movement
                }
                MovementTarget::Materialized(old) => {
                    let movement = Movement {
                        is_recurrent: true,
                        recurrent_id: Some(successor.id),
                        ..patch.apply_to(old)
                    };
                    self.update_movement(&db_tx, &movement).await?;
                    self.reconcile_wallets(&db_tx, user_id, Some(old), Some(&movement))
                        .await?;
                    movement
                }
            };

            tracing::info!(
                "updated movement {} and following for {user_id}, series {} replaced by {}",
                movement.id,
                series.id,
                successor.id
            );
            Ok(movement)
        })
    }

    /// Ends the series of `resolved` before its target month and starts the
    /// successor after it, moving later stored instances to the successor.
    async fn split_around(
        &self,
        db_tx: &DatabaseTransaction,
        resolved: &ResolvedMovement,
        template: Option<RecurrentMovement>,
    ) -> ResultEngine<RecurrentMovement> {
        let Some(series) = resolved.recurrent.as_ref() else {
            return Err(EngineError::NotFound(format!(
                "series of movement {}",
                resolved.movement().id
            )));
        };
        // Instance stored ahead of its series, e.g. the cut month of an
        // earlier split: nothing to end, the series is re-templated in place.
        if resolved.target_month < MonthYear::of(series.initial_date) {
            let Some(template) = template else {
                return Ok(series.clone());
            };
            let series = RecurrentMovement {
                id: series.id,
                initial_date: series.initial_date,
                end_date: series.end_date,
                ..template
            };
            self.update_recurrent(db_tx, &series).await?;
            return Ok(series);
        }

        let cut = resolved.target_month.first_day()?;
        let (ended, successor) = split(series, cut, template)?;
        self.update_recurrent(db_tx, &ended).await?;
        self.insert_recurrent(db_tx, &successor).await?;
        self.repoint_later_instances(
            db_tx,
            series.id,
            successor.id,
            resolved.target_month,
            resolved.movement().id,
        )
        .await?;
        tracing::debug!(
            "split series {} at {}-{:02}, successor {}",
            series.id,
            resolved.target_month.year,
            resolved.target_month.month,
            successor.id
        );
        Ok(successor)
    }
}

/// Transfer legs and invoice payments are owned by the operations that
/// created them and cannot be edited as plain movements.
fn ensure_user_editable(movement: &Movement, patch: &MovementPatch) -> ResultEngine<()> {
    let engine_owned = |payment_type: PaymentType| {
        matches!(
            payment_type,
            PaymentType::InternalTransfer | PaymentType::InvoicePayment
        )
    };
    if engine_owned(movement.payment_type) {
        return Err(EngineError::UnsupportedMovementType(format!(
            "movement {} is {}",
            movement.id,
            movement.payment_type.as_str()
        )));
    }
    if let Some(payment_type) = patch.payment_type
        && engine_owned(payment_type)
    {
        return Err(EngineError::UnsupportedMovementType(format!(
            "movements cannot be turned into {}",
            payment_type.as_str()
        )));
    }
    Ok(())
}
