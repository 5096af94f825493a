//! Chart period computation

use chrono::{Datelike, Local, NaiveDate, TimeDelta, Weekday};
use serde::{Deserialize, Serialize};

/// How charts are keyed in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartPeriod {
    /// One chart per week, starting on `starts_on`
    Weekly { starts_on: Weekday },
}

impl Default for ChartPeriod {
    fn default() -> Self {
        ChartPeriod::Weekly { starts_on: Weekday::Sun }
    }
}

impl ChartPeriod {
    pub fn weekly(starts_on: Weekday) -> Self {
        ChartPeriod::Weekly { starts_on }
    }

    /// Start of the period containing `date` (on or before it)
    pub fn start_for(&self, date: NaiveDate) -> NaiveDate {
        match self {
            ChartPeriod::Weekly { starts_on } => {
                let today = date.weekday().num_days_from_monday();
                let start = starts_on.num_days_from_monday();
                let offset = (today + 7 - start) % 7;
                date - TimeDelta::days(offset as i64)
            }
        }
    }

    /// Start of the current period in the local calendar
    pub fn current_start(&self) -> NaiveDate {
        self.start_for(Local::now().date_naive())
    }

    /// Explicit chart date, or the current period start
    pub fn resolve(&self, chart_date: Option<NaiveDate>) -> NaiveDate {
        chart_date.unwrap_or_else(|| self.current_start())
    }
}
