use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::EngineConfig;
use crate::error::LedgerError;
use crate::event::EventLog;
use crate::flows::{capital_flows, CapitalFlows};
use crate::reconstruct::{self, DerivedState, Interval};
use crate::schedule::{self, ScheduleSummary, ScheduledEvent};
use crate::snapshot::SnapshotStore;
use crate::verify::{self, IntervalVerification, VerificationReport};

/// Anchors, events and settings for one issuer. Every query is a pure read.
#[derive(Debug, Clone)]
pub struct Ledger {
    name: String,
    snapshots: SnapshotStore,
    events: EventLog,
    config: EngineConfig,
}

impl Ledger {
    pub fn new(snapshots: SnapshotStore, events: EventLog, config: EngineConfig) -> Result<Self, LedgerError> {
        config.validate()?;
        Ok(Self {
            name: String::new(),
            snapshots,
            events,
            config,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Split basis for every share figure: the configured date, else the
    /// latest date in either input, else the verification epoch.
    pub fn basis_date(&self) -> NaiveDate {
        if let Some(date) = self.config.split_basis_date {
            return date;
        }
        let latest_anchor = self.snapshots.latest().map(|s| s.date);
        latest_anchor
            .max(self.events.latest_date())
            .unwrap_or(self.config.verification.epoch)
    }

    pub fn reconstruct(&self, date: NaiveDate) -> Option<DerivedState> {
        reconstruct::reconstruct(&self.snapshots, &self.events, date, self.basis_date())
    }

    pub fn timeline(&self) -> Vec<DerivedState> {
        reconstruct::timeline(&self.snapshots, &self.events, self.basis_date())
    }

    pub fn reconstruct_range(&self, start: NaiveDate, end: NaiveDate, interval: Interval) -> Vec<DerivedState> {
        reconstruct::reconstruct_range(&self.snapshots, &self.events, start, end, interval, self.basis_date())
    }

    pub fn verify(&self) -> VerificationReport {
        verify::verify(&self.snapshots, &self.events, &self.config, self.basis_date())
    }

    pub fn verify_interval_ending(&self, period_end: NaiveDate) -> Option<IntervalVerification> {
        verify::verify_interval_ending(&self.snapshots, &self.events, period_end, &self.config, self.basis_date())
    }

    pub fn scheduled_events(&self, as_of: NaiveDate, market_price: Option<Decimal>) -> Vec<ScheduledEvent> {
        schedule::scheduled_events(&self.snapshots, &self.events, as_of, market_price, &self.config.schedule)
    }

    pub fn schedule_summary(&self, as_of: NaiveDate, market_price: Option<Decimal>) -> ScheduleSummary {
        let rows = self.scheduled_events(as_of, market_price);
        schedule::schedule_summary(&rows, as_of, &self.config.schedule)
    }

    pub fn capital_flows(&self, start: NaiveDate, end: NaiveDate) -> CapitalFlows {
        capital_flows(&self.events, start, end)
    }
}
