//! Forward-looking obligations derived from the event log.
//!
//! Three kinds of rows:
//! - Maturity: a convertible issuance whose maturity is still ahead.
//! - ContingentConversion: a convertible that has matured but no anchor has
//!   been filed since, so its settlement (cash or shares) is unconfirmed.
//! - PendingConfirmation: a redemption/conversion/amendment that happened but
//!   no anchor has been filed since.
//!
//! Pending rows clear only when a later anchor is ingested. "As of" is always
//! explicit; nothing here reads the clock.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::ScheduleConfig;
use crate::event::{CapitalEvent, DebtCategory, EventKind, EventLog};
use crate::snapshot::SnapshotStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScheduledKind {
    Maturity,
    ContingentConversion,
    PendingConfirmation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScheduleStatus {
    Upcoming,
    DueSoon,
    Due,
    Overdue,
    PendingVerification,
}

impl std::fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upcoming => write!(f, "upcoming"),
            Self::DueSoon => write!(f, "due-soon"),
            Self::Due => write!(f, "due"),
            Self::Overdue => write!(f, "overdue"),
            Self::PendingVerification => write!(f, "pending-verification"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduledEvent {
    pub due: NaiveDate,
    pub kind: ScheduledKind,
    pub status: ScheduleStatus,
    /// Negative once the due date has passed.
    pub days_until_due: i64,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion_price: Option<Decimal>,
    /// Market price above conversion price. Unset unless both are known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion_likely: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub source: CapitalEvent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleSummary {
    pub as_of: NaiveDate,
    pub horizon: NaiveDate,
    pub pending: usize,
    /// Upcoming plus due-soon rows.
    pub upcoming: usize,
    pub total_principal_maturing: Decimal,
    pub near_term_maturities: usize,
}

/// Status for a row that is not pending verification.
pub fn status_for_days(days_until_due: i64, due_soon_days: u32) -> ScheduleStatus {
    if days_until_due < 0 {
        ScheduleStatus::Overdue
    } else if days_until_due == 0 {
        ScheduleStatus::Due
    } else if days_until_due <= i64::from(due_soon_days) {
        ScheduleStatus::DueSoon
    } else {
        ScheduleStatus::Upcoming
    }
}

/// All scheduled rows as of `as_of`: pending rows first, then maturities,
/// each ascending by due date.
pub fn scheduled_events(
    snapshots: &SnapshotStore,
    events: &EventLog,
    as_of: NaiveDate,
    market_price: Option<Decimal>,
    config: &ScheduleConfig,
) -> Vec<ScheduledEvent> {
    let unconfirmed = |date: NaiveDate| snapshots.get_next_at_or_after(date).is_none();

    let mut pending = Vec::new();
    let mut maturities = Vec::new();

    for event in events.list_all() {
        match &event.kind {
            EventKind::DebtIssuance(d) if d.category == DebtCategory::Convertible => {
                let Some(maturity) = d.maturity else {
                    continue;
                };
                let days = (maturity - as_of).num_days();
                let conversion_likely = market_price
                    .zip(d.conversion_price)
                    .map(|(price, conversion)| price > conversion);
                let mut row = ScheduledEvent {
                    due: maturity,
                    kind: ScheduledKind::Maturity,
                    status: status_for_days(days, config.due_soon_days),
                    days_until_due: days,
                    description: event.description.clone(),
                    amount: Some(d.principal),
                    coupon: d.coupon,
                    conversion_price: d.conversion_price,
                    conversion_likely,
                    note: None,
                    source: event.clone(),
                };
                if maturity > as_of {
                    maturities.push(row);
                } else if unconfirmed(maturity) {
                    row.kind = ScheduledKind::ContingentConversion;
                    row.status = ScheduleStatus::PendingVerification;
                    row.note = Some(format!(
                        "matured {maturity}; settlement unconfirmed until an anchor dated on or after maturity"
                    ));
                    pending.push(row);
                }
            }
            EventKind::DebtLifecycle(l) if event.date <= as_of && unconfirmed(event.date) => {
                let days = (event.date - as_of).num_days();
                let note = match (&l.instrument, l.shares_issued) {
                    (Some(instrument), Some(shares)) => {
                        Some(format!("{instrument}: {shares} shares issued, awaiting anchor"))
                    }
                    (Some(instrument), None) => Some(format!("{instrument}: awaiting anchor")),
                    (None, Some(shares)) => Some(format!("{shares} shares issued, awaiting anchor")),
                    (None, None) => None,
                };
                pending.push(ScheduledEvent {
                    due: event.date,
                    kind: ScheduledKind::PendingConfirmation,
                    status: ScheduleStatus::PendingVerification,
                    days_until_due: days,
                    description: event.description.clone(),
                    amount: l.principal,
                    coupon: None,
                    conversion_price: None,
                    conversion_likely: None,
                    note,
                    source: event.clone(),
                });
            }
            _ => {}
        }
    }

    pending.sort_by_key(|r| r.due);
    maturities.sort_by_key(|r| r.due);
    pending.extend(maturities);
    pending
}

/// Counts and totals over rows produced by [`scheduled_events`].
pub fn schedule_summary(rows: &[ScheduledEvent], as_of: NaiveDate, config: &ScheduleConfig) -> ScheduleSummary {
    let horizon = as_of
        .checked_add_months(Months::new(config.near_term_months))
        .unwrap_or(NaiveDate::MAX);
    let maturities = || rows.iter().filter(|r| r.kind == ScheduledKind::Maturity);

    ScheduleSummary {
        as_of,
        horizon,
        pending: rows
            .iter()
            .filter(|r| r.status == ScheduleStatus::PendingVerification)
            .count(),
        upcoming: rows
            .iter()
            .filter(|r| matches!(r.status, ScheduleStatus::Upcoming | ScheduleStatus::DueSoon))
            .count(),
        total_principal_maturing: maturities().filter_map(|r| r.amount).sum(),
        near_term_maturities: maturities().filter(|r| r.due <= horizon).count(),
    }
}
