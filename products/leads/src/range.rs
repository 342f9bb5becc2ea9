use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use thiserror::Error;

use crate::model::{CreatedOn, Lead};

/// Date range choices offered by the dashboard sidebar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RangePreset {
    #[default]
    Today,
    ThisWeek,
    AllTime,
    Last30Days,
    Last90Days,
    Custom,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("range start {from} is after range end {to}")]
    Inverted { from: NaiveDate, to: NaiveDate },
}

/// Inclusive range of calendar dates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

const CUSTOM_LOOKBACK_DAYS: i64 = 90;

fn all_time_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN)
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, RangeError> {
        if from > to {
            return Err(RangeError::Inverted { from, to });
        }
        Ok(Self { from, to })
    }

    /// Resolve a preset against `today`. `from`/`to` only apply to
    /// [`RangePreset::Custom`] and default to the last 90 days.
    pub fn resolve(
        preset: RangePreset,
        today: NaiveDate,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Self, RangeError> {
        let days_back = |days: i64| today - Duration::days(days);
        match preset {
            RangePreset::Today => Self::new(today, today),
            RangePreset::ThisWeek => {
                let since_monday = i64::from(today.weekday().num_days_from_monday());
                Self::new(days_back(since_monday), today)
            }
            RangePreset::AllTime => Self::new(all_time_start().min(today), today),
            RangePreset::Last30Days => Self::new(days_back(30), today),
            RangePreset::Last90Days => Self::new(days_back(90), today),
            RangePreset::Custom => Self::new(
                from.unwrap_or_else(|| days_back(CUSTOM_LOOKBACK_DAYS)),
                to.unwrap_or(today),
            ),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    /// Leads without a creation time are dropped; leads whose creation time
    /// cannot be read are kept.
    pub fn admits(&self, lead: &Lead) -> bool {
        match lead.created_on() {
            CreatedOn::Missing => false,
            CreatedOn::Unparseable => true,
            CreatedOn::Date(date) => self.contains(date),
        }
    }
}
