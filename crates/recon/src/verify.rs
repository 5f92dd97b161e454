//! Cross-checks the event log against consecutive anchors.
//!
//! For each anchor, the authoritative change since the preceding anchor is
//! compared with the change the event log predicts for the same interval:
//!
//! - Assets: presence check only. Reported asset values are currency
//!   denominated and change valuation basis (cost vs. fair value), so they
//!   cannot be reconciled to acquired quantities.
//! - Shares: split-normalized share delta vs. common issuance units. Wide
//!   bands, since conversions and option exercises are never in the log.
//! - Debt: total debt delta vs. issued principal. Tight bands; the residual
//!   is discount/premium amortization.
//!
//! The first anchor is measured from zero over the window opening at the
//! configured epoch.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::classify::{classify_with, relative, VerificationStatus};
use crate::config::{EngineConfig, Thresholds};
use crate::event::{CapitalEvent, EquityClass, EventKind, EventLog, EventType};
use crate::snapshot::{PeriodSnapshot, SnapshotStore};
use crate::split::adjust_for_split;

const ASSET_CHECK_NOTE: &str = "asset check is presence-only: reported asset values are \
currency-denominated and change valuation basis, so they are not reconciled to acquired quantities";

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedQuantity {
    Assets,
    Shares,
    Debt,
}

impl std::fmt::Display for TrackedQuantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Assets => write!(f, "assets"),
            Self::Shares => write!(f, "shares"),
            Self::Debt => write!(f, "debt"),
        }
    }
}

/// One quantity checked over one interval.
#[derive(Debug, Clone, Serialize)]
pub struct DiscrepancyRecord {
    pub quantity: TrackedQuantity,
    pub authoritative_delta: Option<Decimal>,
    pub predicted_delta: Decimal,
    pub discrepancy: Option<Decimal>,
    pub discrepancy_pct: Option<Decimal>,
    pub status: VerificationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl DiscrepancyRecord {
    fn no_data(quantity: TrackedQuantity, authoritative: Option<Decimal>, note: impl Into<String>) -> Self {
        Self {
            quantity,
            authoritative_delta: authoritative,
            predicted_delta: Decimal::ZERO,
            discrepancy: None,
            discrepancy_pct: None,
            status: VerificationStatus::NoData,
            note: Some(note.into()),
        }
    }
}

/// All checks for the interval ending at one anchor.
#[derive(Debug, Clone, Serialize)]
pub struct IntervalVerification {
    /// Calendar quarter of the period end, e.g. `Q3 2024`.
    pub label: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub prior_anchor: Option<NaiveDate>,
    pub event_count: usize,
    /// Events reconciled in this interval.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<CapitalEvent>,
    pub assets: DiscrepancyRecord,
    pub shares: DiscrepancyRecord,
    pub debt: DiscrepancyRecord,
}

impl IntervalVerification {
    pub fn records(&self) -> [&DiscrepancyRecord; 3] {
        [&self.assets, &self.shares, &self.debt]
    }

    /// At least one quantity warned or failed.
    pub fn has_discrepancy(&self) -> bool {
        self.records().iter().any(|r| r.status.is_discrepancy())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pass: usize,
    pub warn: usize,
    pub fail: usize,
    pub no_data: usize,
}

impl StatusCounts {
    fn record(&mut self, status: VerificationStatus) {
        match status {
            VerificationStatus::Pass => self.pass += 1,
            VerificationStatus::Warn => self.warn += 1,
            VerificationStatus::Fail => self.fail += 1,
            VerificationStatus::NoData => self.no_data += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationSummary {
    pub intervals: usize,
    pub assets: StatusCounts,
    pub shares: StatusCounts,
    pub debt: StatusCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub engine_version: String,
    pub split_basis_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub meta: ReportMeta,
    pub summary: VerificationSummary,
    pub intervals: Vec<IntervalVerification>,
    pub notes: Vec<String>,
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Verify every anchor against its predecessor.
pub fn verify(
    snapshots: &SnapshotStore,
    events: &EventLog,
    config: &EngineConfig,
    basis_date: NaiveDate,
) -> VerificationReport {
    let anchors = snapshots.list_all();
    let intervals: Vec<IntervalVerification> = anchors
        .iter()
        .enumerate()
        .map(|(i, current)| {
            let prior = i.checked_sub(1).map(|p| &anchors[p]);
            verify_interval(current, prior, events, config, basis_date)
        })
        .collect();

    let summary = compute_summary(&intervals);
    log::info!(
        "verified {} intervals: shares {} pass / {} warn / {} fail, debt {} pass / {} warn / {} fail",
        summary.intervals,
        summary.shares.pass,
        summary.shares.warn,
        summary.shares.fail,
        summary.debt.pass,
        summary.debt.warn,
        summary.debt.fail,
    );

    VerificationReport {
        meta: ReportMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            split_basis_date: basis_date,
        },
        summary,
        intervals,
        notes: vec![ASSET_CHECK_NOTE.to_string()],
    }
}

/// Verify the single interval ending at the anchor dated `period_end`.
pub fn verify_interval_ending(
    snapshots: &SnapshotStore,
    events: &EventLog,
    period_end: NaiveDate,
    config: &EngineConfig,
    basis_date: NaiveDate,
) -> Option<IntervalVerification> {
    let current = snapshots.get_by_date(period_end)?;
    let prior = snapshots.get_prior_to(period_end);
    Some(verify_interval(current, prior, events, config, basis_date))
}

/// Intervals with at least one warn or fail.
pub fn get_discrepancies(report: &VerificationReport) -> Vec<&IntervalVerification> {
    report.intervals.iter().filter(|i| i.has_discrepancy()).collect()
}

pub fn compute_summary(intervals: &[IntervalVerification]) -> VerificationSummary {
    let mut summary = VerificationSummary {
        intervals: intervals.len(),
        ..Default::default()
    };
    for interval in intervals {
        summary.assets.record(interval.assets.status);
        summary.shares.record(interval.shares.status);
        summary.debt.record(interval.debt.status);
    }
    summary
}

fn verify_interval(
    current: &PeriodSnapshot,
    prior: Option<&PeriodSnapshot>,
    events: &EventLog,
    config: &EngineConfig,
    basis_date: NaiveDate,
) -> IntervalVerification {
    let period_end = current.date;
    let period_start = prior
        .and_then(|p| p.date.succ_opt())
        .unwrap_or(config.verification.epoch);
    let in_range = events.in_range(period_start, period_end);

    let interval = IntervalVerification {
        label: quarter_label(period_end),
        period_start,
        period_end,
        prior_anchor: prior.map(|p| p.date),
        event_count: in_range.len(),
        events: in_range.to_vec(),
        assets: check_assets(in_range, events, period_end),
        shares: check_shares(current, prior, in_range, events, basis_date, &config.tolerance.shares),
        debt: check_debt(current, prior, in_range, &config.tolerance.debt),
    };

    if interval.records().iter().any(|r| r.status == VerificationStatus::Fail) {
        log::warn!(
            "interval {} ({period_start} to {period_end}) failed verification: shares {}, debt {}",
            interval.label,
            interval.shares.status,
            interval.debt.status,
        );
    }
    interval
}

fn check_assets(in_range: &[CapitalEvent], events: &EventLog, period_end: NaiveDate) -> DiscrepancyRecord {
    let acquired: Vec<Decimal> = in_range
        .iter()
        .filter_map(|e| match &e.kind {
            EventKind::AssetAcquisition(a) => Some(a.quantity),
            _ => None,
        })
        .collect();

    if acquired.is_empty() {
        return DiscrepancyRecord::no_data(TrackedQuantity::Assets, None, "no acquisition events");
    }

    let note = match events.cumulative_as_of(period_end, EventType::AssetAcquisition) {
        Some(total) => format!("event log running total: {total}"),
        None => "event log carries no running total".to_string(),
    };
    DiscrepancyRecord {
        quantity: TrackedQuantity::Assets,
        authoritative_delta: None,
        predicted_delta: acquired.iter().copied().sum(),
        discrepancy: None,
        discrepancy_pct: None,
        status: VerificationStatus::Pass,
        note: Some(note),
    }
}

fn check_shares(
    current: &PeriodSnapshot,
    prior: Option<&PeriodSnapshot>,
    in_range: &[CapitalEvent],
    events: &EventLog,
    basis_date: NaiveDate,
    thresholds: &Thresholds,
) -> DiscrepancyRecord {
    let baseline = prior.map_or(Decimal::ZERO, |p| adjust_for_split(p, events, basis_date));
    let authoritative = adjust_for_split(current, events, basis_date) - baseline;

    let issued: Vec<Decimal> = in_range
        .iter()
        .filter_map(|e| match &e.kind {
            EventKind::EquityIssuance(i) if i.class == EquityClass::Common => Some(i.units),
            _ => None,
        })
        .collect();
    if issued.is_empty() {
        return DiscrepancyRecord::no_data(
            TrackedQuantity::Shares,
            Some(authoritative),
            "no common issuance events",
        );
    }

    let predicted: Decimal = issued.iter().copied().sum();
    let note = (authoritative != predicted)
        .then(|| "gap may be conversions, option exercises or other issuance not in the event log".to_string());
    compare(TrackedQuantity::Shares, authoritative, predicted, thresholds, note)
}

fn check_debt(
    current: &PeriodSnapshot,
    prior: Option<&PeriodSnapshot>,
    in_range: &[CapitalEvent],
    thresholds: &Thresholds,
) -> DiscrepancyRecord {
    let baseline = prior.map_or(Decimal::ZERO, PeriodSnapshot::total_debt);
    let authoritative = current.total_debt() - baseline;

    let issuances: Vec<(&CapitalEvent, Decimal)> = in_range
        .iter()
        .filter_map(|e| match &e.kind {
            EventKind::DebtIssuance(d) => Some((e, d.principal)),
            _ => None,
        })
        .collect();
    if issuances.is_empty() {
        return DiscrepancyRecord::no_data(
            TrackedQuantity::Debt,
            Some(authoritative),
            "no debt issuance events",
        );
    }

    let predicted: Decimal = issuances.iter().map(|(_, p)| *p).sum();
    let descriptions: Vec<&str> = issuances
        .iter()
        .map(|(e, _)| e.description.as_str())
        .filter(|d| !d.is_empty())
        .collect();
    let note = (!descriptions.is_empty()).then(|| descriptions.join("; "));
    compare(TrackedQuantity::Debt, authoritative, predicted, thresholds, note)
}

fn compare(
    quantity: TrackedQuantity,
    authoritative: Decimal,
    predicted: Decimal,
    thresholds: &Thresholds,
    note: Option<String>,
) -> DiscrepancyRecord {
    let discrepancy = authoritative - predicted;
    let pct = relative(discrepancy, authoritative);
    DiscrepancyRecord {
        quantity,
        authoritative_delta: Some(authoritative),
        predicted_delta: predicted,
        discrepancy: Some(discrepancy),
        discrepancy_pct: pct,
        status: classify_with(pct, thresholds),
        note,
    }
}

fn quarter_label(date: NaiveDate) -> String {
    format!("Q{} {}", date.month0() / 3 + 1, date.year())
}
