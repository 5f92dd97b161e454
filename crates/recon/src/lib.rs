//! `capledger-recon`: capital-structure reconstruction and verification engine.
//!
//! Pure engine crate: receives pre-loaded anchors and events, returns derived
//! states, verification reports and scheduled obligations. No CLI dependencies;
//! the only IO is the optional [`Dataset::load`] helper.

pub mod classify;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod event;
pub mod flows;
pub mod reconstruct;
pub mod schedule;
pub mod snapshot;
pub mod split;
pub mod verify;

pub use classify::VerificationStatus;
pub use config::EngineConfig;
pub use dataset::{Dataset, DatasetFormat};
pub use engine::Ledger;
pub use error::LedgerError;
pub use event::{CapitalEvent, EventKind, EventLog, EventType};
pub use reconstruct::{DerivedState, Interval};
pub use schedule::{ScheduleStatus, ScheduledEvent};
pub use snapshot::{PeriodSnapshot, SnapshotStore};
pub use verify::{get_discrepancies, VerificationReport};
