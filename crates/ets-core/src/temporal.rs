//! # Temporal Types: Unix-Second Timestamps
//!
//! ACL expirations and transcript validity windows are Unix timestamps in
//! whole seconds, the unit the ledger stores. `Timestamp` wraps that value
//! and provides ISO 8601 conversions at the I/O boundary.
//!
//! Freshness is inclusive: an entry expiring at `t` is still usable at
//! `now == t` and expired at `t + 1`.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EtsError;

/// Seconds since the Unix epoch, UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// The current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    /// Wrap a Unix epoch timestamp (seconds).
    pub fn from_epoch_secs(secs: i64) -> Self {
        Self(secs)
    }

    /// Seconds since the epoch.
    pub fn epoch_secs(&self) -> i64 {
        self.0
    }

    /// Parse an ISO 8601 / RFC 3339 string.
    ///
    /// Strings with an offset are converted to UTC. Naive strings without
    /// an offset (`2024-09-22T12:00:00`) are taken to be UTC.
    pub fn parse_iso8601(s: &str) -> Result<Self, EtsError> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self(dt.with_timezone(&Utc).timestamp()));
        }
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .map(|naive| Self(naive.and_utc().timestamp()))
            .map_err(|e| EtsError::Validation(format!("invalid ISO 8601 timestamp {s:?}: {e}")))
    }

    /// Render as `YYYY-MM-DDTHH:MM:SSZ`.
    pub fn to_iso8601(&self) -> String {
        match DateTime::from_timestamp(self.0, 0) {
            Some(dt) => dt.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            None => format!("@{}", self.0),
        }
    }

    /// This timestamp shifted by `secs` seconds, saturating.
    pub fn plus_secs(&self, secs: i64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// True once `now` is strictly past this instant.
    pub fn is_passed_at(&self, now: Timestamp) -> bool {
        now.0 > self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

/// Source of "now" for freshness checks.
///
/// The system clock by default. A fixed clock is shared by every clone, so
/// a test can hand one to both the ledger and the service and move time
/// for both at once.
#[derive(Debug, Clone, Default)]
pub struct Clock {
    fixed: Option<Arc<AtomicI64>>,
}

impl Clock {
    pub fn system() -> Self {
        Self { fixed: None }
    }

    pub fn fixed(at: Timestamp) -> Self {
        Self {
            fixed: Some(Arc::new(AtomicI64::new(at.0))),
        }
    }

    pub fn now(&self) -> Timestamp {
        match &self.fixed {
            Some(t) => Timestamp(t.load(Ordering::SeqCst)),
            None => Timestamp::now(),
        }
    }

    /// Move a fixed clock to `at`. Returns false for the system clock.
    pub fn set(&self, at: Timestamp) -> bool {
        match &self.fixed {
            Some(t) => {
                t.store(at.0, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    /// Advance a fixed clock by `secs`. Returns false for the system clock.
    pub fn advance(&self, secs: i64) -> bool {
        match &self.fixed {
            Some(t) => {
                t.fetch_add(secs, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }
}
