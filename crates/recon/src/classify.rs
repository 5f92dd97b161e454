use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::Thresholds;

/// Severity of the gap between an authoritative delta and the event-predicted delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerificationStatus {
    Pass,
    Warn,
    Fail,
    /// The quantity could not be reconciled for this interval.
    NoData,
}

impl VerificationStatus {
    /// Warn or fail. Pass and no-data are never surfaced as discrepancies.
    pub fn is_discrepancy(self) -> bool {
        matches!(self, Self::Warn | Self::Fail)
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "pass"),
            Self::Warn => write!(f, "warn"),
            Self::Fail => write!(f, "fail"),
            Self::NoData => write!(f, "no-data"),
        }
    }
}

/// Bucket a relative discrepancy. Both bounds are inclusive.
pub fn classify(pct: Option<Decimal>, warn: Decimal, fail: Decimal) -> VerificationStatus {
    let Some(pct) = pct else {
        return VerificationStatus::NoData;
    };
    let abs = pct.abs();
    if abs <= warn {
        VerificationStatus::Pass
    } else if abs <= fail {
        VerificationStatus::Warn
    } else {
        VerificationStatus::Fail
    }
}

pub fn classify_with(pct: Option<Decimal>, thresholds: &Thresholds) -> VerificationStatus {
    classify(pct, thresholds.warn, thresholds.fail)
}

/// `discrepancy / authoritative`, or `None` when the authoritative delta is zero.
pub fn relative(discrepancy: Decimal, authoritative: Decimal) -> Option<Decimal> {
    discrepancy.checked_div(authoritative)
}
