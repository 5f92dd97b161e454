use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Engine settings. Every section is optional and falls back to the defaults below.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Split basis for share normalization. When unset, the latest date present
    /// in either the snapshot store or the event log is used.
    #[serde(default)]
    pub split_basis_date: Option<NaiveDate>,
    #[serde(default)]
    pub tolerance: ToleranceConfig,
    #[serde(default)]
    pub verification: VerificationConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

// ---------------------------------------------------------------------------
// Tolerance
// ---------------------------------------------------------------------------

/// Relative discrepancy bands: `|pct| <= warn` passes, `|pct| <= fail` warns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub warn: Decimal,
    pub fail: Decimal,
}

impl Thresholds {
    pub const fn new(warn: Decimal, fail: Decimal) -> Self {
        Self { warn, fail }
    }
}

/// Shares get wide bands: option exercises, conversions and private placements
/// never appear in the event log. Debt gets tight bands: issuances are reliably
/// disclosed and the residual is discount/premium amortization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceConfig {
    #[serde(default = "default_share_thresholds")]
    pub shares: Thresholds,
    #[serde(default = "default_debt_thresholds")]
    pub debt: Thresholds,
}

fn default_share_thresholds() -> Thresholds {
    Thresholds::new(Decimal::new(10, 2), Decimal::new(30, 2))
}

fn default_debt_thresholds() -> Thresholds {
    Thresholds::new(Decimal::new(5, 2), Decimal::new(20, 2))
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            shares: default_share_thresholds(),
            debt: default_debt_thresholds(),
        }
    }
}

// ---------------------------------------------------------------------------
// Verification + Schedule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Period start used for the first anchor, which has no predecessor.
    #[serde(default = "default_epoch")]
    pub epoch: NaiveDate,
}

fn default_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN)
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self { epoch: default_epoch() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Days-until-due at or below which an obligation is `due-soon`.
    #[serde(default = "default_due_soon_days")]
    pub due_soon_days: u32,
    /// Horizon for counting near-term maturities in the schedule summary.
    #[serde(default = "default_near_term_months")]
    pub near_term_months: u32,
}

fn default_due_soon_days() -> u32 {
    90
}

fn default_near_term_months() -> u32 {
    24
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            due_soon_days: default_due_soon_days(),
            near_term_months: default_near_term_months(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl EngineConfig {
    pub fn from_toml(input: &str) -> Result<Self, LedgerError> {
        let config: EngineConfig =
            toml::from_str(input).map_err(|e| LedgerError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        for (name, t) in [("shares", &self.tolerance.shares), ("debt", &self.tolerance.debt)] {
            if t.warn.is_sign_negative() || t.fail.is_sign_negative() {
                return Err(LedgerError::ConfigValidation(format!(
                    "tolerance.{name}: thresholds must be non-negative"
                )));
            }
            if t.warn > t.fail {
                return Err(LedgerError::ConfigValidation(format!(
                    "tolerance.{name}: warn ({}) must not exceed fail ({})",
                    t.warn, t.fail
                )));
            }
        }

        if self.schedule.near_term_months == 0 {
            return Err(LedgerError::ConfigValidation(
                "schedule.near_term_months must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
