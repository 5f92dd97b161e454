//! Capital events disclosed between anchors, and the append-only log holding them.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::split::SplitRatio;

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// Where an event was disclosed. Opaque to the engine: never validated or resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disclosure {
    #[serde(default)]
    pub filing_id: String,
    #[serde(default)]
    pub locator: Option<String>,
    #[serde(default)]
    pub filed: Option<String>,
}

/// A dated material-event disclosure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalEvent {
    /// Effective date of the event (not the filing date).
    pub date: NaiveDate,
    #[serde(default)]
    pub disclosure: Disclosure,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl CapitalEvent {
    pub fn event_type(&self) -> EventType {
        self.kind.event_type()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    AssetAcquisition(AssetAcquisition),
    DebtIssuance(DebtIssuance),
    EquityIssuance(EquityIssuance),
    ProgramAnnouncement(ProgramAnnouncement),
    CorporateAction(CorporateAction),
    DebtLifecycle(DebtLifecycle),
}

impl EventKind {
    pub fn event_type(&self) -> EventType {
        match self {
            Self::AssetAcquisition(_) => EventType::AssetAcquisition,
            Self::DebtIssuance(_) => EventType::DebtIssuance,
            Self::EquityIssuance(_) => EventType::EquityIssuance,
            Self::ProgramAnnouncement(_) => EventType::ProgramAnnouncement,
            Self::CorporateAction(_) => EventType::CorporateAction,
            Self::DebtLifecycle(_) => EventType::DebtLifecycle,
        }
    }
}

/// Discriminant of [`EventKind`], used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    AssetAcquisition,
    DebtIssuance,
    EquityIssuance,
    ProgramAnnouncement,
    CorporateAction,
    DebtLifecycle,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AssetAcquisition => write!(f, "asset_acquisition"),
            Self::DebtIssuance => write!(f, "debt_issuance"),
            Self::EquityIssuance => write!(f, "equity_issuance"),
            Self::ProgramAnnouncement => write!(f, "program_announcement"),
            Self::CorporateAction => write!(f, "corporate_action"),
            Self::DebtLifecycle => write!(f, "debt_lifecycle"),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-kind payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetAcquisition {
    pub quantity: Decimal,
    /// Aggregate purchase price.
    #[serde(default)]
    pub aggregate_price: Option<Decimal>,
    #[serde(default)]
    pub average_price: Option<Decimal>,
    /// Running total of holdings after this event, when disclosed.
    #[serde(default)]
    pub cumulative: Option<Decimal>,
    /// Proceeds of a capital raise disclosed together with the purchase.
    /// When set, cash moves by `raise - price` instead of `-price`.
    #[serde(default)]
    pub funded_by_raise: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtCategory {
    Convertible,
    Secured,
    Term,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtIssuance {
    /// Face value.
    pub principal: Decimal,
    /// Annual coupon in percent (0.75 = 0.75%).
    #[serde(default)]
    pub coupon: Option<Decimal>,
    #[serde(default)]
    pub maturity: Option<NaiveDate>,
    pub category: DebtCategory,
    /// Per-share conversion price on the current split basis.
    #[serde(default)]
    pub conversion_price: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquityClass {
    Common,
    Preferred,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityIssuance {
    pub class: EquityClass,
    /// Series identifier for preferred equity.
    #[serde(default)]
    pub series: Option<String>,
    /// Shares issued, on the current split basis. Replay and verification
    /// add these as-is, so pre-split issuance must be restated at ingestion.
    #[serde(default)]
    pub units: Decimal,
    pub gross_proceeds: Decimal,
    #[serde(default)]
    pub dividend_rate: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramAnnouncement {
    /// Program capacity ceiling.
    pub capacity: Decimal,
    #[serde(default)]
    pub securities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CorporateAction {
    Split { ratio: SplitRatio },
    Rename { new_name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    Redemption,
    Conversion,
    Amendment,
}

/// Redemption, conversion or amendment of an existing instrument.
/// Logged and surfaced for confirmation; never applied to running totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtLifecycle {
    pub action: LifecycleAction,
    #[serde(default)]
    pub instrument: Option<String>,
    #[serde(default)]
    pub principal: Option<Decimal>,
    #[serde(default)]
    pub shares_issued: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Log
// ---------------------------------------------------------------------------

/// Date-ordered, append-only event log. Same-day events keep insertion order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventLog {
    events: Vec<CapitalEvent>,
}

impl EventLog {
    pub fn new(events: Vec<CapitalEvent>) -> Result<Self, LedgerError> {
        let mut log = Self { events: Vec::with_capacity(events.len()) };
        for event in events {
            log.append(event)?;
        }
        Ok(log)
    }

    /// Append an event. Rejects events dated before the current tail.
    pub fn append(&mut self, event: CapitalEvent) -> Result<(), LedgerError> {
        if let Some(last) = self.events.last() {
            if event.date < last.date {
                return Err(LedgerError::EventOrder {
                    index: self.events.len(),
                    previous: last.date,
                    next: event.date,
                });
            }
        }
        self.events.push(event);
        Ok(())
    }

    pub fn list_all(&self) -> &[CapitalEvent] {
        &self.events
    }

    pub fn by_type(&self, kind: EventType) -> impl Iterator<Item = &CapitalEvent> {
        self.events.iter().filter(move |e| e.event_type() == kind)
    }

    /// Events with `start <= date <= end`, ascending. Empty when `start > end`.
    pub fn in_range(&self, start: NaiveDate, end: NaiveDate) -> &[CapitalEvent] {
        if start > end {
            return &[];
        }
        let lo = self.events.partition_point(|e| e.date < start);
        let hi = self.events.partition_point(|e| e.date <= end);
        &self.events[lo..hi]
    }

    /// Last disclosed running total at or before `date`.
    ///
    /// Only asset acquisitions carry a running total; every other kind yields `None`.
    pub fn cumulative_as_of(&self, date: NaiveDate, kind: EventType) -> Option<Decimal> {
        let end = self.events.partition_point(|e| e.date <= date);
        self.events[..end].iter().rev().find_map(|e| match (&e.kind, kind) {
            (EventKind::AssetAcquisition(a), EventType::AssetAcquisition) => a.cumulative,
            _ => None,
        })
    }

    /// Sum of acquisition prices at or before `date`.
    pub fn cost_basis_as_of(&self, date: NaiveDate) -> Decimal {
        let end = self.events.partition_point(|e| e.date <= date);
        self.events[..end]
            .iter()
            .filter_map(|e| match &e.kind {
                EventKind::AssetAcquisition(a) => a.aggregate_price,
                _ => None,
            })
            .sum()
    }

    /// Split corporate actions as `(effective date, ratio)`.
    pub fn splits(&self) -> impl Iterator<Item = (NaiveDate, &SplitRatio)> {
        self.events.iter().filter_map(|e| match &e.kind {
            EventKind::CorporateAction(CorporateAction::Split { ratio }) => Some((e.date, ratio)),
            _ => None,
        })
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.events.last().map(|e| e.date)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
