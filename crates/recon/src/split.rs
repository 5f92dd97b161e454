//! Share-count normalization across stock splits.
//!
//! Every cross-date share comparison goes through [`adjust_for_split`] so that
//! both sides sit on the same split basis.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::event::EventLog;
use crate::snapshot::PeriodSnapshot;

/// `new:old` split ratio. `10:1` is a forward split, `1:8` a reverse split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SplitRatio {
    pub new: u32,
    pub old: u32,
}

impl SplitRatio {
    /// Apply this ratio to a pre-split share count.
    pub fn apply(&self, shares: Decimal) -> Decimal {
        shares * Decimal::from(self.new) / Decimal::from(self.old)
    }
}

impl FromStr for SplitRatio {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || LedgerError::InvalidSplitRatio(s.to_string());
        let (new, old) = s.split_once(':').ok_or_else(bad)?;
        let new: u32 = new.trim().parse().map_err(|_| bad())?;
        let old: u32 = old.trim().parse().map_err(|_| bad())?;
        if new == 0 || old == 0 {
            return Err(bad());
        }
        Ok(Self { new, old })
    }
}

impl TryFrom<String> for SplitRatio {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SplitRatio> for String {
    fn from(ratio: SplitRatio) -> Self {
        ratio.to_string()
    }
}

impl fmt::Display for SplitRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.new, self.old)
    }
}

/// Reported share count of `snapshot` restated on the split basis in effect at `basis_date`.
///
/// Applies every split effective after the snapshot's period end and at or
/// before `basis_date`, in log order. Already-adjusted snapshots pass through.
pub fn adjust_for_split(snapshot: &PeriodSnapshot, events: &EventLog, basis_date: NaiveDate) -> Decimal {
    if snapshot.shares_split_adjusted {
        return snapshot.common_shares;
    }
    events
        .splits()
        .filter(|(effective, _)| *effective > snapshot.date && *effective <= basis_date)
        .fold(snapshot.common_shares, |shares, (_, ratio)| ratio.apply(shares))
}

/// Return a copy of `snapshot` with shares on the `basis_date` split basis and the
/// adjusted flag set. Normalizing an already-normalized snapshot is a no-op.
pub fn normalized(snapshot: &PeriodSnapshot, events: &EventLog, basis_date: NaiveDate) -> PeriodSnapshot {
    let mut out = snapshot.clone();
    out.common_shares = adjust_for_split(snapshot, events, basis_date);
    out.shares_split_adjusted = true;
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::tests::{buy, split};
    use crate::snapshot::tests::{anchor, date};
    use rust_decimal_macros::dec;

    fn unadjusted(d: &str, shares: Decimal) -> PeriodSnapshot {
        let mut s = anchor(d, shares, dec!(0));
        s.shares_split_adjusted = false;
        s
    }

    #[test]
    fn parse_ratio() {
        let r: SplitRatio = "10:1".parse().unwrap();
        assert_eq!(r, SplitRatio { new: 10, old: 1 });
        assert_eq!("1:8".parse::<SplitRatio>().unwrap(), SplitRatio { new: 1, old: 8 });
        assert!("10".parse::<SplitRatio>().is_err());
        assert!("0:1".parse::<SplitRatio>().is_err());
        assert!("a:b".parse::<SplitRatio>().is_err());
    }

    #[test]
    fn forward_split_after_period_multiplies() {
        let log = EventLog::new(vec![split("2024-08-07", "10:1")]).unwrap();
        let s = unadjusted("2024-06-30", dec!(19000000));
        assert_eq!(adjust_for_split(&s, &log, date("2025-01-01")), dec!(190000000));
    }

    #[test]
    fn reverse_split_divides() {
        let log = EventLog::new(vec![split("2024-08-07", "1:8")]).unwrap();
        let s = unadjusted("2024-06-30", dec!(800));
        assert_eq!(adjust_for_split(&s, &log, date("2025-01-01")), dec!(100));
    }

    #[test]
    fn split_before_period_or_after_basis_ignored() {
        let log = EventLog::new(vec![
            split("2024-01-15", "2:1"),
            buy("2024-03-01", dec!(1), dec!(1), None),
            split("2025-06-01", "3:1"),
        ])
        .unwrap();
        let s = unadjusted("2024-03-31", dec!(100));
        assert_eq!(adjust_for_split(&s, &log, date("2025-01-01")), dec!(100));
        assert_eq!(adjust_for_split(&s, &log, date("2025-06-01")), dec!(300));
    }

    #[test]
    fn multiple_splits_compound() {
        let log = EventLog::new(vec![split("2024-05-01", "2:1"), split("2024-08-01", "3:1")]).unwrap();
        let s = unadjusted("2024-03-31", dec!(100));
        assert_eq!(adjust_for_split(&s, &log, date("2024-12-31")), dec!(600));
    }

    #[test]
    fn normalizing_twice_is_noop() {
        let log = EventLog::new(vec![split("2024-08-07", "10:1")]).unwrap();
        let s = unadjusted("2024-06-30", dec!(100));
        let once = normalized(&s, &log, date("2025-01-01"));
        let twice = normalized(&once, &log, date("2025-01-01"));
        assert_eq!(once.common_shares, dec!(1000));
        assert_eq!(once, twice);
    }

    #[test]
    fn ratio_serde_as_string() {
        let r: SplitRatio = serde_json::from_str("\"10:1\"").unwrap();
        assert_eq!(serde_json::to_string(&r).unwrap(), "\"10:1\"");
        assert!(serde_json::from_str::<SplitRatio>("\"ten\"").is_err());
    }
}
