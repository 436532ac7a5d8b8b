use chrono::{Datelike, NaiveDate};

use crate::error::{Result, ScraperError};

pub const DEFAULT_MONTHS: u32 = 12;
pub const DEFAULT_TOP: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchMode {
    /// One price summary per calendar month, `months` months forward.
    MonthOffset { months: u32 },
    /// Top `top` flight cards for one fixed round trip.
    FixedRange {
        depart: NaiveDate,
        return_date: NaiveDate,
        top: usize,
    },
}

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub origin: String,
    pub destination: String,
    pub adults: u32,
    pub mode: SearchMode,
}

impl SearchRequest {
    pub fn months(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            adults: 1,
            mode: SearchMode::MonthOffset {
                months: DEFAULT_MONTHS,
            },
        }
    }

    pub fn fixed_range(
        origin: impl Into<String>,
        destination: impl Into<String>,
        depart: NaiveDate,
        return_date: NaiveDate,
        top: usize,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            adults: 1,
            mode: SearchMode::FixedRange {
                depart,
                return_date,
                top,
            },
        }
    }

    pub fn validate(&self, today: NaiveDate) -> Result<()> {
        if self.origin.trim().is_empty() {
            return Err(ScraperError::InvalidRequest {
                reason: "origin is required".into(),
            });
        }
        if self.destination.trim().is_empty() {
            return Err(ScraperError::InvalidRequest {
                reason: "destination is required".into(),
            });
        }
        if self.adults == 0 {
            return Err(ScraperError::InvalidRequest {
                reason: "at least one adult passenger is required".into(),
            });
        }

        match self.mode {
            SearchMode::MonthOffset { months } => {
                if months == 0 || months > 24 {
                    return Err(ScraperError::InvalidRequest {
                        reason: format!("months must be between 1 and 24, got {months}"),
                    });
                }
            }
            SearchMode::FixedRange {
                depart,
                return_date,
                top,
            } => {
                if depart < today {
                    return Err(ScraperError::InvalidRequest {
                        reason: format!("depart date {depart} is in the past"),
                    });
                }
                if return_date < depart {
                    return Err(ScraperError::InvalidRequest {
                        reason: "return date must not be before depart date".into(),
                    });
                }
                if top == 0 {
                    return Err(ScraperError::InvalidRequest {
                        reason: "top must be at least 1".into(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Whole calendar months from `from`'s month to `to`'s month, never negative.
pub fn month_delta(from: NaiveDate, to: NaiveDate) -> u32 {
    let delta = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    u32::try_from(delta).unwrap_or(0)
}
