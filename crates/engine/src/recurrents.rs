//! Recurring movement series.
//!
//! A [`RecurrentMovement`] is a template projected once per month, on the day
//! of its `initial_date` (clamped to the month length), from `initial_date`
//! up to `end_date` (or forever when open-ended).
//!
//! Months of a series without a materialized [`Movement`] are *virtual*:
//! they are synthesized on demand by [`RecurrentMovement::project`] and share
//! the id of the series.

use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Movement, PaymentType, ResultEngine,
    months::{MonthYear, move_to_month},
    util::{parse_optional_uuid, parse_uuid},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrentMovement {
    pub id: Uuid,
    pub user_id: String,
    pub description: String,
    pub amount: i64,
    pub initial_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub wallet_id: Uuid,
    pub category_id: Uuid,
    pub sub_category_id: Option<Uuid>,
    pub payment_type: PaymentType,
}

impl RecurrentMovement {
    /// Builds an open-ended series using `movement` as template.
    #[must_use]
    pub fn from_movement(movement: &Movement) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: movement.user_id.clone(),
            description: movement.description.clone(),
            amount: movement.amount,
            initial_date: movement.date,
            end_date: None,
            wallet_id: movement.wallet_id,
            category_id: movement.category_id,
            sub_category_id: movement.sub_category_id,
            payment_type: movement.payment_type,
        }
    }

    /// Returns `true` if the series has an instance in `month`.
    #[must_use]
    pub fn occurs_in(&self, month: MonthYear) -> bool {
        MonthYear::of(self.initial_date) <= month
            && self
                .end_date
                .is_none_or(|end| month <= MonthYear::of(end))
    }

    /// Synthesizes the (unpaid) instance of `month`.
    ///
    /// The instance keeps the id of the series so callers can address virtual
    /// and materialized instances the same way.
    pub fn project(&self, month: MonthYear) -> ResultEngine<Movement> {
        if !self.occurs_in(month) {
            return Err(EngineError::NotFound(format!(
                "recurrent movement {} has no instance in {}-{:02}",
                self.id, month.year, month.month
            )));
        }
        let now = Utc::now();
        Ok(Movement {
            id: self.id,
            user_id: self.user_id.clone(),
            description: self.description.clone(),
            amount: self.amount,
            date: move_to_month(self.initial_date, month)?,
            is_paid: false,
            is_recurrent: true,
            recurrent_id: Some(self.id),
            wallet_id: self.wallet_id,
            payment_type: self.payment_type,
            category_id: self.category_id,
            sub_category_id: self.sub_category_id,
            credit_card: None,
            pair_id: None,
            remainder_of_invoice_id: None,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Splits `series` around the month of `cut`.
///
/// Returns the terminated series, ending the month before `cut`, and its
/// successor, starting the month after `cut`. Neither covers the month of
/// `cut` itself: that month is owned by a concrete movement.
///
/// The successor is `new_template` when given, otherwise a copy of `series`.
/// It always receives a fresh id and no end date.
pub fn split(
    series: &RecurrentMovement,
    cut: NaiveDate,
    new_template: Option<RecurrentMovement>,
) -> ResultEngine<(RecurrentMovement, RecurrentMovement)> {
    let cut_month = MonthYear::of(cut);

    let end_date = move_to_month(series.initial_date, cut_month.shift(-1))?.max(series.initial_date);
    let ended = RecurrentMovement {
        end_date: Some(end_date),
        ..series.clone()
    };

    let successor = RecurrentMovement {
        id: Uuid::new_v4(),
        end_date: None,
        initial_date: move_to_month(series.initial_date, cut_month.shift(1))?,
        ..new_template.unwrap_or_else(|| series.clone())
    };

    Ok((ended, successor))
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recurrent_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub description: String,
    pub amount: i64,
    pub initial_date: Date,
    pub end_date: Option<Date>,
    pub wallet_id: String,
    pub category_id: String,
    pub sub_category_id: Option<String>,
    pub payment_type: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&RecurrentMovement> for ActiveModel {
    fn from(value: &RecurrentMovement) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            user_id: ActiveValue::Set(value.user_id.clone()),
            description: ActiveValue::Set(value.description.clone()),
            amount: ActiveValue::Set(value.amount),
            initial_date: ActiveValue::Set(value.initial_date),
            end_date: ActiveValue::Set(value.end_date),
            wallet_id: ActiveValue::Set(value.wallet_id.to_string()),
            category_id: ActiveValue::Set(value.category_id.to_string()),
            sub_category_id: ActiveValue::Set(value.sub_category_id.map(|id| id.to_string())),
            payment_type: ActiveValue::Set(value.payment_type.as_str().to_string()),
        }
    }
}

impl TryFrom<Model> for RecurrentMovement {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "recurrent")?,
            user_id: model.user_id,
            description: model.description,
            amount: model.amount,
            initial_date: model.initial_date,
            end_date: model.end_date,
            wallet_id: parse_uuid(&model.wallet_id, "wallet")?,
            category_id: parse_uuid(&model.category_id, "category")?,
            sub_category_id: parse_optional_uuid(
                model.sub_category_id.as_deref(),
                "sub category",
            )?,
            payment_type: PaymentType::try_from(model.payment_type.as_str())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn series(initial_date: NaiveDate) -> RecurrentMovement {
        RecurrentMovement {
            id: Uuid::new_v4(),
            user_id: "alice".to_string(),
            description: "Rent".to_string(),
            amount: -100_00,
            initial_date,
            end_date: None,
            wallet_id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            sub_category_id: None,
            payment_type: PaymentType::BankTransfer,
        }
    }

    #[test]
    fn split_skips_the_cut_month() {
        let rent = series(date(2025, 1, 15));
        let (ended, successor) = split(&rent, date(2025, 6, 15), None).unwrap();

        assert_eq!(ended.id, rent.id);
        assert_eq!(ended.end_date, Some(date(2025, 5, 15)));
        assert_ne!(successor.id, rent.id);
        assert_eq!(successor.initial_date, date(2025, 7, 15));
        assert_eq!(successor.end_date, None);
        assert_eq!(successor.amount, rent.amount);

        let june = MonthYear::new(2025, 6);
        assert!(!ended.occurs_in(june));
        assert!(!successor.occurs_in(june));
    }

    #[test]
    fn split_clamps_days() {
        let rent = series(date(2024, 1, 31));
        let (ended, successor) = split(&rent, date(2024, 3, 10), None).unwrap();
        assert_eq!(ended.end_date, Some(date(2024, 2, 29)));
        assert_eq!(successor.initial_date, date(2024, 4, 30));

        let (ended, _) = split(&rent, date(2025, 3, 1), None).unwrap();
        assert_eq!(ended.end_date, Some(date(2025, 2, 28)));
    }

    #[test]
    fn split_rolls_over_years() {
        let rent = series(date(2024, 3, 10));
        let (ended, successor) = split(&rent, date(2025, 1, 5), None).unwrap();
        assert_eq!(ended.end_date, Some(date(2024, 12, 10)));
        assert_eq!(successor.initial_date, date(2025, 2, 10));

        let (ended, successor) = split(&rent, date(2024, 12, 5), None).unwrap();
        assert_eq!(ended.end_date, Some(date(2024, 11, 10)));
        assert_eq!(successor.initial_date, date(2025, 1, 10));
    }

    #[test]
    fn split_on_first_month_collapses_end_date() {
        let rent = series(date(2025, 1, 15));
        let (ended, successor) = split(&rent, date(2025, 1, 15), None).unwrap();
        assert_eq!(ended.end_date, Some(date(2025, 1, 15)));
        assert_eq!(successor.initial_date, date(2025, 2, 15));
    }

    #[test]
    fn split_uses_new_template() {
        let rent = series(date(2025, 1, 15));
        let template = RecurrentMovement {
            amount: -150_00,
            description: "Rent (new)".to_string(),
            ..rent.clone()
        };
        let (_, successor) = split(&rent, date(2025, 6, 15), Some(template)).unwrap();
        assert_eq!(successor.amount, -150_00);
        assert_eq!(successor.description, "Rent (new)");
        assert_eq!(successor.initial_date, date(2025, 7, 15));
    }

    #[test]
    fn project_uses_series_id_and_clamps() {
        let rent = series(date(2025, 1, 31));
        let feb = rent.project(MonthYear::new(2025, 2)).unwrap();
        assert_eq!(feb.id, rent.id);
        assert_eq!(feb.recurrent_id, Some(rent.id));
        assert_eq!(feb.date, date(2025, 2, 28));
        assert!(feb.is_recurrent);
        assert!(!feb.is_paid);
    }

    #[test]
    fn project_outside_interval_fails() {
        let mut rent = series(date(2025, 3, 1));
        rent.end_date = Some(date(2025, 5, 1));
        assert!(rent.project(MonthYear::new(2025, 2)).is_err());
        assert!(rent.project(MonthYear::new(2025, 6)).is_err());
        assert!(rent.project(MonthYear::new(2025, 5)).is_ok());
    }
}
