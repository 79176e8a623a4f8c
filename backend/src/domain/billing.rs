//! Billing periods: named date windows used to scope stroke reads and resets.
//!
//! At most one period is active at a time. Periods never gate writes.

use std::str::FromStr;

use chrono::{DateTime, Days, NaiveDate, Utc};

use super::ids::{BillingPeriodId, UserId};

/// Validation errors for billing period values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BillingPeriodValidationError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("start date must not be after end date")]
    InvertedRange,
    #[error("end date is out of range")]
    EndOutOfRange,
    #[error("billing period must be \"all\" or a positive integer")]
    InvalidSelector,
}

/// Display name of a billing period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodName(String);

impl PeriodName {
    /// Validate and trim a period name.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, BillingPeriodValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(BillingPeriodValidationError::EmptyName);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for PeriodName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Inclusive calendar date range, both ends counted in full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Validate that `start <= end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, BillingPeriodValidationError> {
        if start > end {
            return Err(BillingPeriodValidationError::InvertedRange);
        }
        if end.checked_add_days(Days::new(1)).is_none() {
            return Err(BillingPeriodValidationError::EndOutOfRange);
        }
        Ok(Self { start, end })
    }

    /// First day.
    #[must_use]
    pub const fn start(self) -> NaiveDate {
        self.start
    }

    /// Last day, inclusive.
    #[must_use]
    pub const fn end(self) -> NaiveDate {
        self.end
    }

    /// Half-open UTC instant window covering both dates entirely.
    #[must_use]
    pub fn window(self) -> PeriodWindow {
        let start = self.start.and_time(chrono::NaiveTime::MIN).and_utc();
        let end_exclusive = self
            .end
            .checked_add_days(Days::new(1))
            .unwrap_or(self.end)
            .and_time(chrono::NaiveTime::MIN)
            .and_utc();
        PeriodWindow {
            start,
            end_exclusive,
        }
    }
}

/// Instant window `[start, end_exclusive)` used to filter strokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindow {
    pub start: DateTime<Utc>,
    pub end_exclusive: DateTime<Utc>,
}

impl PeriodWindow {
    /// Whether `instant` falls inside the window.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end_exclusive
    }
}

/// Optional window check; `None` admits everything.
#[must_use]
pub fn within(window: Option<&PeriodWindow>, instant: DateTime<Utc>) -> bool {
    window.is_none_or(|w| w.contains(instant))
}

/// A named billing window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingPeriod {
    pub id: BillingPeriodId,
    pub name: PeriodName,
    pub range: DateRange,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
}

/// Data required to create a billing period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBillingPeriod {
    pub name: PeriodName,
    pub range: DateRange,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// Billing period scoping requested by a reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeriodSelector {
    /// No scoping.
    #[default]
    All,
    /// Scope to the period with this id; an unknown id means no scoping.
    Period(BillingPeriodId),
}

impl FromStr for PeriodSelector {
    type Err = BillingPeriodValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        trimmed
            .parse::<BillingPeriodId>()
            .map(Self::Period)
            .map_err(|_| BillingPeriodValidationError::InvalidSelector)
    }
}
