//! # Verification Outcomes
//!
//! Per-item results, a batch report, and cost/timing metrics. Item metrics
//! are collected independently by each task and merged into
//! [`BatchMetrics`] only after every item has finished.

use std::time::Duration;

use serde::Serialize;

use ets_access::DisclosureMask;
use ets_core::{Digest256, SessionId, SubjectId, Timestamp};

use crate::error::VerificationError;
use crate::mode::{BatchPolicy, VerificationMode};

/// Proof that a verifier passed the entitlement gate for a subject.
///
/// Only the service constructs these; `disclose` accepts nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedClaim {
    session: SessionId,
    subject_id: SubjectId,
    authorized_secret_hash: Digest256,
    mode: VerificationMode,
    verified_at: Timestamp,
    disclosure_mask: DisclosureMask,
}

impl VerifiedClaim {
    pub(crate) fn new(
        session: SessionId,
        subject_id: SubjectId,
        authorized_secret_hash: Digest256,
        mode: VerificationMode,
        verified_at: Timestamp,
        disclosure_mask: DisclosureMask,
    ) -> Self {
        Self {
            session,
            subject_id,
            authorized_secret_hash,
            mode,
            verified_at,
            disclosure_mask,
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }

    pub fn authorized_secret_hash(&self) -> &Digest256 {
        &self.authorized_secret_hash
    }

    pub fn mode(&self) -> VerificationMode {
        self.mode
    }

    pub fn verified_at(&self) -> Timestamp {
        self.verified_at
    }

    pub fn disclosure_mask(&self) -> &DisclosureMask {
        &self.disclosure_mask
    }
}

/// Cost and time spent on one item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ItemMetrics {
    /// Ledger cost charged for the item's submission.
    pub cost: u64,
    pub elapsed: Duration,
}

#[derive(Debug)]
pub struct VerificationOutcome {
    pub subject_id: SubjectId,
    pub result: Result<VerifiedClaim, VerificationError>,
    pub metrics: ItemMetrics,
}

impl VerificationOutcome {
    pub fn is_verified(&self) -> bool {
        self.result.is_ok()
    }

    pub fn claim(&self) -> Option<&VerifiedClaim> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&VerificationError> {
        self.result.as_ref().err()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Every item verified.
    Complete,
    /// Some items verified, some failed.
    PartialFailure,
    /// No item verified (including the empty batch).
    Failed,
}

impl BatchStatus {
    pub fn from_counts(accepted: usize, total: usize) -> Self {
        if total > 0 && accepted == total {
            Self::Complete
        } else if accepted > 0 {
            Self::PartialFailure
        } else {
            Self::Failed
        }
    }
}

/// Totals over a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchMetrics {
    pub items: usize,
    pub total_cost: u64,
    /// Sum of per-item elapsed times. Exceeds `wall_clock` when items overlap.
    pub total_item_time: Duration,
    pub wall_clock: Duration,
}

impl BatchMetrics {
    /// Merge finished item metrics.
    pub fn merge<'a>(items: impl IntoIterator<Item = &'a ItemMetrics>, wall_clock: Duration) -> Self {
        items.into_iter().fold(
            Self {
                wall_clock,
                ..Self::default()
            },
            |mut acc, m| {
                acc.items += 1;
                acc.total_cost = acc.total_cost.saturating_add(m.cost);
                acc.total_item_time = acc.total_item_time.saturating_add(m.elapsed);
                acc
            },
        )
    }
}

#[derive(Debug)]
pub struct BatchReport {
    /// One outcome per request, in request order.
    pub outcomes: Vec<VerificationOutcome>,
    pub status: BatchStatus,
    pub metrics: BatchMetrics,
    pub policy: BatchPolicy,
}

impl BatchReport {
    pub fn accepted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_verified()).count()
    }

    /// Indices and errors of the failed items.
    pub fn failures(&self) -> Vec<(usize, &VerificationError)> {
        self.outcomes
            .iter()
            .enumerate()
            .filter_map(|(i, o)| o.error().map(|e| (i, e)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_from_counts() {
        assert_eq!(BatchStatus::from_counts(5, 5), BatchStatus::Complete);
        assert_eq!(BatchStatus::from_counts(4, 5), BatchStatus::PartialFailure);
        assert_eq!(BatchStatus::from_counts(0, 5), BatchStatus::Failed);
        assert_eq!(BatchStatus::from_counts(0, 0), BatchStatus::Failed);
    }

    #[test]
    fn metrics_merge_sums_items() {
        let items = [
            ItemMetrics { cost: 26_000, elapsed: Duration::from_millis(3) },
            ItemMetrics { cost: 26_000, elapsed: Duration::from_millis(5) },
            ItemMetrics { cost: 0, elapsed: Duration::from_millis(1) },
        ];
        let m = BatchMetrics::merge(&items, Duration::from_millis(6));
        assert_eq!(m.items, 3);
        assert_eq!(m.total_cost, 52_000);
        assert_eq!(m.total_item_time, Duration::from_millis(9));
        assert_eq!(m.wall_clock, Duration::from_millis(6));
    }
}
