//! Credit cards and their billing cycle.

use chrono::{Days, NaiveDate};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    months::{MonthYear, clamped_date},
    util::parse_uuid,
};

/// A credit card.
///
/// `credit_limit` is the limit still available: purchases consume it and
/// invoice payments give it back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditCard {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub credit_limit: i64,
    /// Day of month the invoice closes (clamped to the month length).
    pub closing_day: u32,
    /// Day of month the invoice is due (clamped to the month length).
    pub due_day: u32,
    pub default_wallet_id: Uuid,
}

/// One billing period of a card, identified by the month its invoice closes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BillingCycle {
    pub month: MonthYear,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub due_date: NaiveDate,
}

impl CreditCard {
    pub fn new(
        user_id: String,
        name: String,
        credit_limit: i64,
        closing_day: u32,
        due_day: u32,
        default_wallet_id: Uuid,
    ) -> ResultEngine<Self> {
        for (label, day) in [("closing", closing_day), ("due", due_day)] {
            if !(1..=31).contains(&day) {
                return Err(EngineError::InvalidInput(format!(
                    "{label} day must be between 1 and 31, got {day}"
                )));
            }
        }
        if credit_limit < 0 {
            return Err(EngineError::InvalidInput(
                "credit limit must be >= 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            credit_limit,
            closing_day,
            due_day,
            default_wallet_id,
        })
    }

    /// Returns `true` if the limit can absorb `delta_minor`.
    #[must_use]
    pub fn has_sufficient_limit(&self, delta_minor: i64) -> bool {
        self.credit_limit + delta_minor >= 0
    }

    /// The cycle whose invoice closes in `month`.
    pub fn cycle_for_month(&self, month: MonthYear) -> ResultEngine<BillingCycle> {
        let period_end = month.with_day(self.closing_day)?;
        let previous_end = month.shift(-1).with_day(self.closing_day)?;
        let period_start = previous_end
            .checked_add_days(Days::new(1))
            .ok_or_else(|| EngineError::InvalidInput("date out of range".to_string()))?;
        let due_month = if self.due_day > self.closing_day {
            month
        } else {
            month.shift(1)
        };
        let due_date = clamped_date(due_month.year, due_month.month, self.due_day)?;
        Ok(BillingCycle {
            month,
            period_start,
            period_end,
            due_date,
        })
    }

    /// The cycle a purchase made on `date` is billed in.
    pub fn cycle_for_date(&self, date: NaiveDate) -> ResultEngine<BillingCycle> {
        let month = MonthYear::of(date);
        if date <= month.with_day(self.closing_day)? {
            self.cycle_for_month(month)
        } else {
            self.cycle_for_month(month.shift(1))
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "credit_cards")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub credit_limit: i64,
    pub closing_day: i32,
    pub due_day: i32,
    pub default_wallet_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::invoices::Entity")]
    Invoices,
}

impl Related<super::invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&CreditCard> for ActiveModel {
    fn from(value: &CreditCard) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            user_id: ActiveValue::Set(value.user_id.clone()),
            name: ActiveValue::Set(value.name.clone()),
            credit_limit: ActiveValue::Set(value.credit_limit),
            closing_day: ActiveValue::Set(value.closing_day as i32),
            due_day: ActiveValue::Set(value.due_day as i32),
            default_wallet_id: ActiveValue::Set(value.default_wallet_id.to_string()),
        }
    }
}

impl TryFrom<Model> for CreditCard {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        let day = |value: i32, label: &str| {
            u32::try_from(value)
                .map_err(|_| EngineError::InvalidInput(format!("invalid {label} day: {value}")))
        };
        Ok(Self {
            id: parse_uuid(&model.id, "credit card")?,
            user_id: model.user_id,
            name: model.name,
            credit_limit: model.credit_limit,
            closing_day: day(model.closing_day, "closing")?,
            due_day: day(model.due_day, "due")?,
            default_wallet_id: parse_uuid(&model.default_wallet_id, "wallet")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn card(credit_limit: i64, closing_day: u32, due_day: u32) -> CreditCard {
        CreditCard::new(
            "alice".to_string(),
            "Visa".to_string(),
            credit_limit,
            closing_day,
            due_day,
            Uuid::new_v4(),
        )
        .unwrap()
    }

    #[test]
    fn sufficient_limit_boundaries() {
        assert!(card(1000_00, 5, 12).has_sufficient_limit(-1000_00));
        assert!(!card(1000_00, 5, 12).has_sufficient_limit(-1000_01));
        assert!(card(0, 5, 12).has_sufficient_limit(0));
    }

    #[test]
    fn purchase_after_closing_goes_to_next_cycle() {
        let card = card(1000_00, 5, 12);
        let cycle = card.cycle_for_date(date(2025, 3, 5)).unwrap();
        assert_eq!(cycle.month, MonthYear::new(2025, 3));
        assert_eq!(cycle.period_start, date(2025, 2, 6));
        assert_eq!(cycle.period_end, date(2025, 3, 5));
        assert_eq!(cycle.due_date, date(2025, 3, 12));

        let cycle = card.cycle_for_date(date(2025, 3, 6)).unwrap();
        assert_eq!(cycle.month, MonthYear::new(2025, 4));
    }

    #[test]
    fn due_day_before_closing_day_falls_next_month() {
        let card = card(1000_00, 25, 5);
        let cycle = card.cycle_for_date(date(2025, 12, 20)).unwrap();
        assert_eq!(cycle.period_end, date(2025, 12, 25));
        assert_eq!(cycle.due_date, date(2026, 1, 5));
    }

    #[test]
    fn closing_day_is_clamped() {
        let card = card(1000_00, 31, 10);
        let cycle = card.cycle_for_month(MonthYear::new(2025, 3)).unwrap();
        assert_eq!(cycle.period_start, date(2025, 3, 1));
        assert_eq!(cycle.period_end, date(2025, 3, 31));
        let cycle = card.cycle_for_month(MonthYear::new(2025, 2)).unwrap();
        assert_eq!(cycle.period_end, date(2025, 2, 28));
    }

    #[test]
    fn invalid_days_are_rejected() {
        let err = CreditCard::new(
            "alice".to_string(),
            "Visa".to_string(),
            0,
            0,
            10,
            Uuid::new_v4(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }
}
