//! Lock clock
//!
//! Turns a time-change request into a new `lockAfter` timestamp.
//!
//! Requests carry `time` (milliseconds) or any of `hours`/`minutes`/`seconds`.
//! Each field may be a JSON number or a string. A string starting with `+`
//! marks the request as additive: the delta extends the current lock instead
//! of replacing it. That textual marker is consumed here, at the edge, and the
//! rest of the crate only sees a typed [`TimeChange`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const MS_PER_HOUR: f64 = 3_600_000.0;
const MS_PER_MINUTE: f64 = 60_000.0;
const MS_PER_SECOND: f64 = 1_000.0;

/// A raw time value as sent by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeField {
    Number(f64),
    Text(String),
}

impl TimeField {
    /// Numeric value, parsed leniently from text (`"+5"` is 5, `""` is 0)
    fn value(&self) -> Result<f64> {
        match self {
            TimeField::Number(n) => Ok(*n),
            TimeField::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(0.0);
                }
                trimmed
                    .parse::<f64>()
                    .map_err(|_| Error::InvalidTime(s.clone()))
            }
        }
    }

    /// Whether the client sent a literal leading `+`
    fn has_plus(&self) -> bool {
        matches!(self, TimeField::Text(s) if s.starts_with('+'))
    }
}

impl From<f64> for TimeField {
    fn from(n: f64) -> Self {
        TimeField::Number(n)
    }
}

impl From<&str> for TimeField {
    fn from(s: &str) -> Self {
        TimeField::Text(s.to_string())
    }
}

/// Body of a lock-timer request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<TimeField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minutes: Option<TimeField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seconds: Option<TimeField>,
}

impl TimeRequest {
    fn fields(&self) -> [Option<&TimeField>; 4] {
        [
            self.time.as_ref(),
            self.hours.as_ref(),
            self.minutes.as_ref(),
            self.seconds.as_ref(),
        ]
    }

    /// Resolve the request into a typed change
    pub fn parse(&self) -> Result<TimeChange> {
        let fields = self.fields();
        if fields.iter().all(Option::is_none) {
            return Err(Error::NoTimeProvided);
        }

        let additive = fields.iter().flatten().any(|f| f.has_plus());

        let delta = match &self.time {
            Some(time) => time.value()?,
            None => {
                let part = |f: &Option<TimeField>| f.as_ref().map_or(Ok(0.0), TimeField::value);
                part(&self.hours)? * MS_PER_HOUR
                    + part(&self.minutes)? * MS_PER_MINUTE
                    + part(&self.seconds)? * MS_PER_SECOND
            }
        };

        if !delta.is_finite() || delta.abs() >= i64::MAX as f64 {
            return Err(Error::InvalidTime(delta.to_string()));
        }

        Ok(TimeChange {
            delta_ms: delta.round() as i64,
            additive,
        })
    }
}

/// A parsed lock-time adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeChange {
    /// Requested change in milliseconds; zero unlocks, negative removes time
    pub delta_ms: i64,
    /// Extend from the later of the current lock and now
    pub additive: bool,
}

impl TimeChange {
    pub fn set(delta_ms: i64) -> Self {
        Self {
            delta_ms,
            additive: false,
        }
    }

    pub fn add(delta_ms: i64) -> Self {
        Self {
            delta_ms,
            additive: true,
        }
    }

    /// How the change is reported back to the caller
    pub fn kind(&self) -> ChangeKind {
        if self.delta_ms < 0 {
            ChangeKind::Removed
        } else if self.delta_ms > 0 && self.additive {
            ChangeKind::Added
        } else {
            ChangeKind::Changed
        }
    }
}

/// Classification of an applied change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Removed,
    Added,
    Changed,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            ChangeKind::Removed => "Removed",
            ChangeKind::Added => "Added",
            ChangeKind::Changed => "Changed",
        };
        write!(f, "{} time", word)
    }
}

/// Result of applying a [`TimeChange`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockChange {
    pub lock_after: i64,
    pub kind: ChangeKind,
}

/// Compute the new lock expiry.
///
/// - zero delta unlocks immediately (`now`)
/// - positive additive delta extends `max(current, now)`
/// - positive absolute delta counts from `now`
/// - negative delta shortens `current`, possibly into the past
pub fn compute_lock_after(current_lock_after: i64, now: i64, change: TimeChange) -> LockChange {
    let delta = change.delta_ms;
    let lock_after = if delta == 0 {
        now
    } else if delta > 0 {
        if change.additive {
            current_lock_after.max(now).saturating_add(delta)
        } else {
            now.saturating_add(delta)
        }
    } else {
        current_lock_after.saturating_add(delta)
    };

    LockChange {
        lock_after,
        kind: change.kind(),
    }
}
