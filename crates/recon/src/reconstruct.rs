//! Point-in-time capital structure: exact anchors, or the nearest prior anchor
//! with every intervening event replayed on top.

use chrono::{Days, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::event::{
    AssetAcquisition, CapitalEvent, DebtCategory, DebtIssuance, EquityClass, EquityIssuance,
    EventKind, EventLog, EventType,
};
use crate::snapshot::{PeriodSnapshot, SnapshotStore};
use crate::split;

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateSource {
    /// Taken directly from an anchor.
    Verified,
    /// Anchor plus replayed events.
    Derived,
}

/// How far a figure can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Reported on an anchor.
    Exact,
    /// Extrapolated from event replay.
    Approximate,
}

#[derive(Debug, Clone, Serialize)]
pub struct DerivedState {
    pub date: NaiveDate,
    pub source: StateSource,

    pub asset_quantity: Decimal,
    pub asset_cost_basis: Decimal,
    pub cash: Decimal,

    pub convertible_debt: Decimal,
    pub secured_debt: Decimal,
    pub total_debt: Decimal,

    pub preferred_equity: Decimal,
    /// On the engine's split basis.
    pub common_shares: Decimal,

    pub total_assets: Decimal,
    pub total_liabilities: Decimal,
    pub book_equity: Decimal,

    pub cash_confidence: Confidence,
    /// Applies to total assets, total liabilities and book equity.
    pub balance_sheet_confidence: Confidence,

    /// Anchor the state was built from (equal to `date` when verified).
    pub base_anchor: NaiveDate,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<CapitalEvent>,
    pub note: String,
}

// ---------------------------------------------------------------------------
// Running totals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Running {
    assets: Decimal,
    cost_basis: Decimal,
    cash: Decimal,
    convertible: Decimal,
    secured: Decimal,
    preferred: Decimal,
    shares: Decimal,
}

impl Running {
    fn from_anchor(anchor: &PeriodSnapshot, assets: Decimal, cost_basis: Decimal) -> Self {
        Self {
            assets,
            cost_basis,
            cash: anchor.cash,
            convertible: anchor.convertible_debt,
            secured: anchor.secured_debt,
            preferred: anchor.preferred_equity,
            shares: anchor.common_shares,
        }
    }

    fn total_debt(&self) -> Decimal {
        self.convertible + self.secured
    }

    fn apply(&mut self, kind: &EventKind) {
        match kind {
            EventKind::AssetAcquisition(AssetAcquisition {
                quantity,
                aggregate_price,
                funded_by_raise,
                ..
            }) => {
                let price = aggregate_price.unwrap_or(Decimal::ZERO);
                self.assets += *quantity;
                self.cost_basis += price;
                match funded_by_raise {
                    Some(raise) => self.cash += *raise - price,
                    None => self.cash -= price,
                }
            }
            EventKind::DebtIssuance(DebtIssuance { principal, category, .. }) => {
                match category {
                    DebtCategory::Convertible => self.convertible += *principal,
                    DebtCategory::Secured | DebtCategory::Term => self.secured += *principal,
                }
                self.cash += *principal;
            }
            EventKind::EquityIssuance(EquityIssuance { class, units, gross_proceeds, .. }) => {
                match class {
                    EquityClass::Preferred => self.preferred += *gross_proceeds,
                    EquityClass::Common => self.shares += *units,
                }
                self.cash += *gross_proceeds;
            }
            // Splits are applied once at the read boundary, never during replay.
            EventKind::ProgramAnnouncement(_) | EventKind::CorporateAction(_) => {}
            // Informational only; surfaced as pending confirmations by the schedule.
            EventKind::DebtLifecycle(_) => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Reconstruction
// ---------------------------------------------------------------------------

/// Capital structure on `date`, or `None` when `date` precedes the first anchor.
///
/// `basis_date` selects the split basis all share counts are restated on.
pub fn reconstruct(
    snapshots: &SnapshotStore,
    events: &EventLog,
    date: NaiveDate,
    basis_date: NaiveDate,
) -> Option<DerivedState> {
    if let Some(anchor) = snapshots.get_by_date(date) {
        return Some(verified_state(anchor, events, basis_date));
    }

    let base = snapshots.get_prior_to(date)?;
    let anchor = split::normalized(base, events, basis_date);
    let replayed = events.in_range(base.date.succ_opt()?, date);

    let start = Running::from_anchor(
        &anchor,
        anchor_assets(&anchor, events),
        events.cost_basis_as_of(anchor.date),
    );
    let mut run = start.clone();
    for event in replayed {
        run.apply(&event.kind);
    }

    let asset_change = (run.cost_basis - start.cost_basis) + (run.cash - start.cash);
    let liability_change =
        (run.total_debt() - start.total_debt()) + (run.preferred - start.preferred);
    let total_assets = anchor.total_assets + asset_change;
    let total_liabilities = anchor.total_liabilities + liability_change;

    log::debug!(
        "reconstruct {date}: base anchor {} + {} events",
        anchor.date,
        replayed.len()
    );

    Some(DerivedState {
        date,
        source: StateSource::Derived,
        asset_quantity: run.assets,
        asset_cost_basis: run.cost_basis,
        cash: run.cash.max(Decimal::ZERO),
        convertible_debt: run.convertible,
        secured_debt: run.secured,
        total_debt: run.total_debt(),
        preferred_equity: run.preferred,
        common_shares: run.shares,
        total_assets,
        total_liabilities,
        book_equity: total_assets - total_liabilities,
        cash_confidence: Confidence::Approximate,
        balance_sheet_confidence: Confidence::Approximate,
        base_anchor: anchor.date,
        events: replayed.to_vec(),
        note: format!("derived from {} anchor + {} events", anchor.date, replayed.len()),
    })
}

/// An anchor as a state, shares normalized, nothing replayed.
pub fn verified_state(anchor: &PeriodSnapshot, events: &EventLog, basis_date: NaiveDate) -> DerivedState {
    let anchor = split::normalized(anchor, events, basis_date);
    DerivedState {
        date: anchor.date,
        source: StateSource::Verified,
        asset_quantity: anchor_assets(&anchor, events),
        asset_cost_basis: events.cost_basis_as_of(anchor.date),
        cash: anchor.cash,
        convertible_debt: anchor.convertible_debt,
        secured_debt: anchor.secured_debt,
        total_debt: anchor.total_debt(),
        preferred_equity: anchor.preferred_equity,
        common_shares: anchor.common_shares,
        total_assets: anchor.total_assets,
        total_liabilities: anchor.total_liabilities,
        book_equity: anchor.book_equity(),
        cash_confidence: Confidence::Exact,
        balance_sheet_confidence: Confidence::Exact,
        base_anchor: anchor.date,
        events: Vec::new(),
        note: anchor.provenance.clone(),
    }
}

/// Reported quantity, falling back to the log's running total.
fn anchor_assets(anchor: &PeriodSnapshot, events: &EventLog) -> Decimal {
    anchor
        .asset_quantity
        .or_else(|| events.cumulative_as_of(anchor.date, EventType::AssetAcquisition))
        .unwrap_or(Decimal::ZERO)
}

/// Every anchor as a verified state, ascending.
pub fn timeline(snapshots: &SnapshotStore, events: &EventLog, basis_date: NaiveDate) -> Vec<DerivedState> {
    snapshots
        .list_all()
        .iter()
        .map(|anchor| verified_state(anchor, events, basis_date))
        .collect()
}

// ---------------------------------------------------------------------------
// Sampling
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
}

impl Interval {
    /// The `n`th sample date counted from `start`. Month steps are computed from
    /// `start` each time so that end-of-month clamping does not drift.
    pub fn nth(self, start: NaiveDate, n: u32) -> Option<NaiveDate> {
        match self {
            Self::Daily => start.checked_add_days(Days::new(u64::from(n))),
            Self::Weekly => start.checked_add_days(Days::new(7 * u64::from(n))),
            Self::Monthly => start.checked_add_months(Months::new(n)),
            Self::Quarterly => start.checked_add_months(Months::new(3 * n)),
        }
    }
}

/// Sample states from `start` to `end` inclusive. Dates before the first anchor are skipped.
pub fn reconstruct_range(
    snapshots: &SnapshotStore,
    events: &EventLog,
    start: NaiveDate,
    end: NaiveDate,
    interval: Interval,
    basis_date: NaiveDate,
) -> Vec<DerivedState> {
    (0..)
        .map_while(|n| interval.nth(start, n).filter(|d| *d <= end))
        .filter_map(|d| reconstruct(snapshots, events, d, basis_date))
        .collect()
}
