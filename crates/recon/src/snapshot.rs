//! Authoritative period-end snapshots ("anchors") and their ordered store.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Verified capital structure at a period end, as reported in a structured
/// financial disclosure.
///
/// `common_shares` is the count as originally reported. Unless
/// `shares_split_adjusted` is set, it must go through the split normalizer
/// before being compared with any other date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSnapshot {
    pub date: NaiveDate,
    /// Physical asset quantity. When absent, the event log's running total
    /// at or before `date` is used instead.
    #[serde(default)]
    pub asset_quantity: Option<Decimal>,
    pub cash: Decimal,
    #[serde(default)]
    pub convertible_debt: Decimal,
    /// All non-convertible debt (secured notes, term loans).
    #[serde(default)]
    pub secured_debt: Decimal,
    /// Liquidation preference of outstanding preferred equity.
    #[serde(default)]
    pub preferred_equity: Decimal,
    pub common_shares: Decimal,
    pub total_assets: Decimal,
    pub total_liabilities: Decimal,
    #[serde(default)]
    pub provenance: String,
    #[serde(default)]
    pub shares_split_adjusted: bool,
}

impl PeriodSnapshot {
    pub fn total_debt(&self) -> Decimal {
        self.convertible_debt + self.secured_debt
    }

    pub fn book_equity(&self) -> Decimal {
        self.total_assets - self.total_liabilities
    }
}

/// Snapshots in strictly ascending period-end order.
///
/// Built once from a full vector; there are no mutation operations.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SnapshotStore {
    snapshots: Vec<PeriodSnapshot>,
}

impl SnapshotStore {
    pub fn new(snapshots: Vec<PeriodSnapshot>) -> Result<Self, LedgerError> {
        for pair in snapshots.windows(2) {
            let (previous, next) = (pair[0].date, pair[1].date);
            if previous == next {
                return Err(LedgerError::DuplicateSnapshot(next));
            }
            if next < previous {
                return Err(LedgerError::SnapshotOrder { previous, next });
            }
        }
        Ok(Self { snapshots })
    }

    /// Exact period-end match.
    pub fn get_by_date(&self, date: NaiveDate) -> Option<&PeriodSnapshot> {
        self.snapshots
            .binary_search_by(|s| s.date.cmp(&date))
            .ok()
            .map(|idx| &self.snapshots[idx])
    }

    pub fn list_all(&self) -> &[PeriodSnapshot] {
        &self.snapshots
    }

    /// Latest snapshot strictly before `date`.
    pub fn get_prior_to(&self, date: NaiveDate) -> Option<&PeriodSnapshot> {
        let idx = self.snapshots.partition_point(|s| s.date < date);
        idx.checked_sub(1).map(|i| &self.snapshots[i])
    }

    /// Earliest snapshot on or after `date`.
    pub fn get_next_at_or_after(&self, date: NaiveDate) -> Option<&PeriodSnapshot> {
        let idx = self.snapshots.partition_point(|s| s.date < date);
        self.snapshots.get(idx)
    }

    pub fn first(&self) -> Option<&PeriodSnapshot> {
        self.snapshots.first()
    }

    pub fn latest(&self) -> Option<&PeriodSnapshot> {
        self.snapshots.last()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
