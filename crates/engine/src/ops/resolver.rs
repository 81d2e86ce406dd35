//! Identifier resolution for movements.
//!
//! A movement id either names a stored row or, for months of a recurring
//! series that were never materialized, the series itself. In the latter case
//! a target date picks the month to project.

use chrono::NaiveDate;
use sea_orm::{DatabaseTransaction, TransactionTrait};
use uuid::Uuid;

use crate::{EngineError, MonthYear, Movement, RecurrentMovement, ResultEngine};

use super::{Engine, with_tx};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MovementTarget {
    /// A stored movement.
    Materialized(Movement),
    /// A month of a series with no stored movement yet.
    Virtual { series_id: Uuid, projected: Movement },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedMovement {
    pub target: MovementTarget,
    /// The owning series, when it still exists.
    pub recurrent: Option<RecurrentMovement>,
    pub target_month: MonthYear,
}

impl ResolvedMovement {
    #[must_use]
    pub fn movement(&self) -> &Movement {
        match &self.target {
            MovementTarget::Materialized(movement) => movement,
            MovementTarget::Virtual { projected, .. } => projected,
        }
    }

    #[must_use]
    pub fn is_virtual(&self) -> bool {
        matches!(self.target, MovementTarget::Virtual { .. })
    }

    #[must_use]
    pub fn is_recurrent(&self) -> bool {
        self.movement().is_recurrent && self.recurrent.is_some()
    }

    #[must_use]
    pub fn is_credit_card(&self) -> bool {
        self.movement().is_credit_card()
    }
}

impl Engine {
    pub(super) async fn resolve(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        id: Uuid,
        target_date: Option<NaiveDate>,
    ) -> ResultEngine<ResolvedMovement> {
        if let Some(movement) = self.find_movement(db_tx, user_id, id).await? {
            let recurrent = match movement.recurrent_id {
                Some(recurrent_id) => self.find_recurrent(db_tx, user_id, recurrent_id).await?,
                None => None,
            };
            tracing::debug!("resolved movement {id}");
            return Ok(ResolvedMovement {
                target_month: MonthYear::of(movement.date),
                target: MovementTarget::Materialized(movement),
                recurrent,
            });
        }

        let series = self
            .find_recurrent(db_tx, user_id, id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("movement {id}")))?;
        let target_date = target_date.ok_or_else(|| {
            EngineError::DateRequired(format!("target date required for recurrent movement {id}"))
        })?;
        let target_month = MonthYear::of(target_date);
        let projected = series.project(target_month)?;
        tracing::debug!(
            "resolved virtual instance of {id} in {}-{:02}",
            target_month.year,
            target_month.month
        );
        Ok(ResolvedMovement {
            target: MovementTarget::Virtual {
                series_id: series.id,
                projected,
            },
            recurrent: Some(series),
            target_month,
        })
    }

    /// Resolves `id` to a stored movement or to the virtual instance of a
    /// recurring series in the month of `target_date`.
    pub async fn resolve_movement(
        &self,
        user_id: &str,
        id: Uuid,
        target_date: Option<NaiveDate>,
    ) -> ResultEngine<ResolvedMovement> {
        with_tx!(self, |db_tx| {
            self.resolve(&db_tx, user_id, id, target_date).await
        })
    }

    /// Return a stored movement.
    pub async fn movement(&self, user_id: &str, movement_id: Uuid) -> ResultEngine<Movement> {
        with_tx!(self, |db_tx| {
            self.require_movement(&db_tx, user_id, movement_id).await
        })
    }

    /// Return a recurring series.
    pub async fn recurrent_movement(
        &self,
        user_id: &str,
        recurrent_id: Uuid,
    ) -> ResultEngine<RecurrentMovement> {
        with_tx!(self, |db_tx| {
            self.find_recurrent(&db_tx, user_id, recurrent_id)
                .await?
                .ok_or_else(|| EngineError::NotFound(format!("recurrent movement {recurrent_id}")))
        })
    }

    /// Return every recurring series of a user, oldest first.
    pub async fn recurrent_movements(&self, user_id: &str) -> ResultEngine<Vec<RecurrentMovement>> {
        with_tx!(self, |db_tx| {
            self.recurrents_of_user(&db_tx, user_id).await
        })
    }
}
