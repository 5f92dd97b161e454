use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::event::{EquityClass, EventKind, EventLog};

/// Gross capital moved by the event log over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapitalFlows {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub event_count: usize,
    pub assets_acquired: Decimal,
    pub acquisition_spend: Decimal,
    pub debt_issued: Decimal,
    pub common_shares_issued: Decimal,
    pub common_proceeds: Decimal,
    pub preferred_proceeds: Decimal,
}

pub fn capital_flows(events: &EventLog, start: NaiveDate, end: NaiveDate) -> CapitalFlows {
    let in_range = events.in_range(start, end);
    let mut flows = CapitalFlows {
        start,
        end,
        event_count: in_range.len(),
        assets_acquired: Decimal::ZERO,
        acquisition_spend: Decimal::ZERO,
        debt_issued: Decimal::ZERO,
        common_shares_issued: Decimal::ZERO,
        common_proceeds: Decimal::ZERO,
        preferred_proceeds: Decimal::ZERO,
    };

    for event in in_range {
        match &event.kind {
            EventKind::AssetAcquisition(a) => {
                flows.assets_acquired += a.quantity;
                flows.acquisition_spend += a.aggregate_price.unwrap_or_default();
            }
            EventKind::DebtIssuance(d) => flows.debt_issued += d.principal,
            EventKind::EquityIssuance(e) => match e.class {
                EquityClass::Common => {
                    flows.common_shares_issued += e.units;
                    flows.common_proceeds += e.gross_proceeds;
                }
                EquityClass::Preferred => flows.preferred_proceeds += e.gross_proceeds,
            },
            EventKind::ProgramAnnouncement(_)
            | EventKind::CorporateAction(_)
            | EventKind::DebtLifecycle(_) => {}
        }
    }
    flows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::tests::{buy, common, debt, event, split};
    use crate::event::{DebtCategory, EquityIssuance};
    use crate::snapshot::tests::date;
    use rust_decimal_macros::dec;

    #[test]
    fn sums_by_kind_within_range() {
        let log = EventLog::new(vec![
            buy("2024-01-05", dec!(1), dec!(10), None),
            buy("2024-02-05", dec!(3), dec!(30), None),
            debt("2024-02-20", dec!(500), DebtCategory::Convertible),
            common("2024-03-01", dec!(40), dec!(400)),
            event(
                "2024-03-15",
                EventKind::EquityIssuance(EquityIssuance {
                    class: EquityClass::Preferred,
                    series: Some("A".into()),
                    units: dec!(2),
                    gross_proceeds: dec!(200),
                    dividend_rate: Some(dec!(8)),
                }),
            ),
            split("2024-03-20", "2:1"),
            buy("2024-04-01", dec!(7), dec!(70), None),
        ])
        .unwrap();

        let f = capital_flows(&log, date("2024-02-01"), date("2024-03-31"));
        assert_eq!(f.event_count, 5);
        assert_eq!(f.assets_acquired, dec!(3));
        assert_eq!(f.acquisition_spend, dec!(30));
        assert_eq!(f.debt_issued, dec!(500));
        assert_eq!(f.common_shares_issued, dec!(40));
        assert_eq!(f.common_proceeds, dec!(400));
        assert_eq!(f.preferred_proceeds, dec!(200));
    }

    #[test]
    fn inverted_range_is_empty() {
        let log = EventLog::new(vec![buy("2024-01-05", dec!(1), dec!(10), None)]).unwrap();
        let f = capital_flows(&log, date("2024-12-31"), date("2024-01-01"));
        assert_eq!(f.event_count, 0);
        assert_eq!(f.assets_acquired, Decimal::ZERO);
    }
}
