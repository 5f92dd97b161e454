//! On-disk dataset: engine settings, anchors and events in one TOML or JSON file.
//!
//! ```toml
//! name = "Example Corp"
//!
//! [config.tolerance.debt]
//! warn = "0.05"
//! fail = "0.20"
//!
//! [[snapshots]]
//! date = "2024-03-31"
//! cash = 1000
//! common_shares = 100
//! total_assets = 10000
//! total_liabilities = 4000
//!
//! [[events]]
//! date = "2024-04-15"
//! type = "equity_issuance"
//! class = "common"
//! units = 40
//! gross_proceeds = 4000
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::engine::Ledger;
use crate::error::LedgerError;
use crate::event::{CapitalEvent, EventLog};
use crate::snapshot::{PeriodSnapshot, SnapshotStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Toml,
    Json,
}

impl DatasetFormat {
    /// `.json` is JSON; anything else is read as TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub config: EngineConfig,
    #[serde(default)]
    pub snapshots: Vec<PeriodSnapshot>,
    #[serde(default)]
    pub events: Vec<CapitalEvent>,
}

impl Dataset {
    pub fn parse(input: &str, format: DatasetFormat) -> Result<Self, LedgerError> {
        match format {
            DatasetFormat::Toml => {
                toml::from_str(input).map_err(|e| LedgerError::DatasetParse(e.to_string()))
            }
            DatasetFormat::Json => {
                serde_json::from_str(input).map_err(|e| LedgerError::DatasetParse(e.to_string()))
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let input = std::fs::read_to_string(path)
            .map_err(|e| LedgerError::Io(format!("{}: {e}", path.display())))?;
        let dataset = Self::parse(&input, DatasetFormat::from_path(path))?;
        log::debug!(
            "loaded {}: {} snapshots, {} events",
            path.display(),
            dataset.snapshots.len(),
            dataset.events.len()
        );
        Ok(dataset)
    }

    /// Validate ordering and settings, producing a queryable ledger.
    pub fn into_ledger(self) -> Result<Ledger, LedgerError> {
        let snapshots = SnapshotStore::new(self.snapshots)?;
        let events = EventLog::new(self.events)?;
        Ok(Ledger::new(snapshots, events, self.config)?.with_name(self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventType;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = r#"
name = "Sample"

[config.schedule]
due_soon_days = 30

[[snapshots]]
date = "2024-03-31"
cash = 1000
convertible_debt = 500
common_shares = 100
total_assets = 10000
total_liabilities = 4000
shares_split_adjusted = true

[[events]]
date = "2024-04-15"
type = "equity_issuance"
class = "common"
units = 40
gross_proceeds = "4000.50"
description = "ATM sales"

[events.disclosure]
filing_id = "8-K 2024-04-15"

[[events]]
date = "2024-08-07"
type = "corporate_action"
action = "split"
ratio = "10:1"
"#;

    #[test]
    fn parse_toml_sample() {
        let ds = Dataset::parse(SAMPLE, DatasetFormat::Toml).unwrap();
        assert_eq!(ds.name, "Sample");
        assert_eq!(ds.config.schedule.due_soon_days, 30);
        assert_eq!(ds.snapshots[0].convertible_debt, dec!(500));
        assert_eq!(ds.snapshots[0].secured_debt, dec!(0));
        assert_eq!(ds.events[0].event_type(), EventType::EquityIssuance);
        assert_eq!(ds.events[0].disclosure.filing_id, "8-K 2024-04-15");
        assert_eq!(ds.events[1].event_type(), EventType::CorporateAction);

        let ledger = ds.into_ledger().unwrap();
        assert_eq!(ledger.name(), "Sample");
        assert_eq!(ledger.events().len(), 2);
    }

    #[test]
    fn json_round_trips_through_serialize() {
        let ds = Dataset::parse(SAMPLE, DatasetFormat::Toml).unwrap();
        let json = serde_json::to_string(&ds).unwrap();
        let back = Dataset::parse(&json, DatasetFormat::Json).unwrap();
        assert_eq!(back.events, ds.events);
        assert_eq!(back.snapshots, ds.snapshots);
    }

    #[test]
    fn unknown_event_type_is_parse_error() {
        let input = r#"
[[events]]
date = "2024-04-15"
type = "dividend"
"#;
        let err = Dataset::parse(input, DatasetFormat::Toml).unwrap_err();
        assert!(matches!(err, LedgerError::DatasetParse(_)));
    }

    #[test]
    fn out_of_order_snapshots_rejected() {
        let input = r#"
[[snapshots]]
date = "2024-06-30"
cash = 0
common_shares = 1
total_assets = 1
total_liabilities = 0

[[snapshots]]
date = "2024-03-31"
cash = 0
common_shares = 1
total_assets = 1
total_liabilities = 0
"#;
        let err = Dataset::parse(input, DatasetFormat::Toml)
            .unwrap()
            .into_ledger()
            .unwrap_err();
        assert!(matches!(err, LedgerError::SnapshotOrder { .. }));
    }

    #[test]
    fn invalid_config_rejected() {
        let input = r#"
[config.tolerance.shares]
warn = "0.5"
fail = "0.1"
"#;
        let err = Dataset::parse(input, DatasetFormat::Toml)
            .unwrap()
            .into_ledger()
            .unwrap_err();
        assert!(matches!(err, LedgerError::ConfigValidation(_)));
    }

    #[test]
    fn load_picks_format_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("corp.toml");
        std::fs::write(&toml_path, SAMPLE).unwrap();
        let ds = Dataset::load(&toml_path).unwrap();

        let json_path = dir.path().join("corp.json");
        std::fs::write(&json_path, serde_json::to_string(&ds).unwrap()).unwrap();
        assert_eq!(DatasetFormat::from_path(&json_path), DatasetFormat::Json);
        assert_eq!(Dataset::load(&json_path).unwrap().events.len(), 2);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Dataset::load(Path::new("/nonexistent/corp.toml")).unwrap_err();
        assert!(matches!(err, LedgerError::Io(_)));
        assert!(err.to_string().contains("/nonexistent/corp.toml"));
    }
}
