// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Display-timezone stamps and calendar bucketing.
//!
//! Instants are stored in UTC. Dates shown to users, and the day/month
//! boundaries used by statistics and list filters, are computed in a single
//! configured fixed offset.

use chrono::{DateTime, Datelike, FixedOffset, Months, NaiveDate, NaiveTime, TimeDelta, Utc};

use leadflow_config::{IntakeConfig, parse_utc_offset};
use leadflow_core::{LeadflowError, Stamp};

/// Half-open UTC interval `[start, end)`.
pub type UtcRange = (DateTime<Utc>, DateTime<Utc>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayClock {
    offset: FixedOffset,
}

impl DisplayClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn from_config(config: &IntakeConfig) -> Result<Self, LeadflowError> {
        parse_utc_offset(&config.utc_offset)
            .and_then(FixedOffset::east_opt)
            .map(Self::new)
            .ok_or_else(|| {
                LeadflowError::Config(format!("invalid utc_offset `{}`", config.utc_offset))
            })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Stamp for the current instant.
    pub fn now(&self) -> Stamp {
        self.stamp(Utc::now())
    }

    pub fn stamp(&self, at: DateTime<Utc>) -> Stamp {
        let local = at.with_timezone(&self.offset);
        Stamp {
            at,
            date: local.format("%Y-%m-%d").to_string(),
            time: local.format("%H:%M:%S").to_string(),
        }
    }

    /// Calendar date of `at` in the display offset.
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    pub fn today(&self) -> NaiveDate {
        self.local_date(Utc::now())
    }

    fn midnight(&self, date: NaiveDate) -> DateTime<Utc> {
        let local = date.and_time(NaiveTime::MIN);
        (local - TimeDelta::seconds(i64::from(self.offset.local_minus_utc()))).and_utc()
    }

    /// UTC bounds of the local calendar day containing `date`.
    pub fn day_bounds(&self, date: NaiveDate) -> Result<UtcRange, LeadflowError> {
        let next = date.succ_opt().ok_or_else(out_of_range)?;
        Ok((self.midnight(date), self.midnight(next)))
    }

    /// UTC bounds of the local calendar month containing `date`.
    pub fn month_bounds(&self, date: NaiveDate) -> Result<UtcRange, LeadflowError> {
        let first = date.with_day(1).ok_or_else(out_of_range)?;
        let next = first
            .checked_add_months(Months::new(1))
            .ok_or_else(out_of_range)?;
        Ok((self.midnight(first), self.midnight(next)))
    }

    /// Resolves list date filters. `today` wins over `from`/`to`; both
    /// bounds are inclusive calendar dates.
    pub fn filter_range(
        &self,
        today: bool,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), LeadflowError> {
        if today {
            let (start, end) = self.day_bounds(self.today())?;
            return Ok((Some(start), Some(end)));
        }

        let from = non_blank(from).map(|raw| parse_date("from", raw)).transpose()?;
        let to = non_blank(to).map(|raw| parse_date("to", raw)).transpose()?;
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(LeadflowError::invalid(
                    "from",
                    "from date must not be after to date",
                ));
            }
        }

        let start = from.map(|d| self.midnight(d));
        let end = to
            .map(|d| self.day_bounds(d).map(|(_, end)| end))
            .transpose()?;
        Ok((start, end))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn out_of_range() -> LeadflowError {
    LeadflowError::Internal("date out of range".into())
}

/// Parses a `YYYY-MM-DD` query value.
pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, LeadflowError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        LeadflowError::invalid(field, format!("Invalid {field} date, expected YYYY-MM-DD"))
    })
}
