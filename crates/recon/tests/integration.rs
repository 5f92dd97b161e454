use std::path::PathBuf;

use capledger_recon::reconstruct::{Confidence, StateSource};
use capledger_recon::schedule::ScheduledKind;
use capledger_recon::verify::StatusCounts;
use capledger_recon::{
    get_discrepancies, Dataset, Interval, Ledger, ScheduleStatus, VerificationStatus,
};
use chrono::NaiveDate;
use rust_decimal_macros::dec;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load(name: &str) -> Ledger {
    let path = fixtures_dir().join(name);
    Dataset::load(&path)
        .and_then(Dataset::into_ledger)
        .unwrap_or_else(|e| panic!("cannot load {}: {e}", path.display()))
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

// -------------------------------------------------------------------------
// Worked example
// -------------------------------------------------------------------------

#[test]
fn worked_example_share_and_debt_checks() {
    let ledger = load("worked-example.toml");
    assert_eq!(ledger.name(), "Worked Example");

    let report = ledger.verify();
    assert_eq!(report.intervals.len(), 2);

    let q2 = &report.intervals[1];
    assert_eq!(q2.label, "Q2 2024");
    assert_eq!(q2.event_count, 2);

    assert_eq!(q2.shares.authoritative_delta, Some(dec!(50)));
    assert_eq!(q2.shares.predicted_delta, dec!(40));
    assert_eq!(q2.shares.discrepancy, Some(dec!(10)));
    assert_eq!(q2.shares.status, VerificationStatus::Warn);

    assert_eq!(q2.debt.authoritative_delta, Some(dec!(400)));
    assert_eq!(q2.debt.discrepancy, Some(dec!(0)));
    assert_eq!(q2.debt.status, VerificationStatus::Pass);
    assert_eq!(
        q2.debt.note.as_deref(),
        Some("0.625% convertible senior notes due 2029")
    );
}

#[test]
fn worked_example_serializes_statuses_kebab_case() {
    let report = load("worked-example.toml").verify();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["intervals"][0]["shares"]["status"], "no-data");
    assert_eq!(json["intervals"][1]["shares"]["status"], "warn");
    assert_eq!(json["intervals"][1]["shares"]["quantity"], "shares");
    assert!(json["meta"]["engine_version"].is_string());
}

// -------------------------------------------------------------------------
// Reconstruction
// -------------------------------------------------------------------------

#[test]
fn before_first_anchor_is_not_found() {
    let ledger = load("issuer.toml");
    assert!(ledger.reconstruct(date("2024-03-30")).is_none());
    assert!(ledger.reconstruct(date("2021-01-01")).is_none());
}

#[test]
fn anchor_dates_return_verified_state_on_post_split_basis() {
    let ledger = load("issuer.toml");
    let q1 = ledger.reconstruct(date("2024-03-31")).unwrap();
    assert_eq!(q1.source, StateSource::Verified);
    assert_eq!(q1.common_shares, dec!(200));
    assert_eq!(q1.asset_quantity, dec!(1000));
    assert_eq!(q1.total_debt, dec!(2500));
    assert_eq!(q1.book_equity, dec!(57000));
    assert_eq!(q1.note, "10-Q Q1 2024");
    assert_eq!(q1.cash_confidence, Confidence::Exact);

    // Already adjusted, passes through untouched.
    let q3 = ledger.reconstruct(date("2024-09-30")).unwrap();
    assert_eq!(q3.common_shares, dec!(215));
}

#[test]
fn between_anchors_replays_events() {
    let ledger = load("issuer.toml");
    let s = ledger.reconstruct(date("2024-05-31")).unwrap();

    assert_eq!(s.source, StateSource::Derived);
    assert_eq!(s.base_anchor, date("2024-03-31"));
    assert_eq!(s.events.len(), 2);
    assert_eq!(s.asset_quantity, dec!(1300));
    assert_eq!(s.asset_cost_basis, dec!(18000));
    // Raise covered the purchase; only the debt proceeds land in cash.
    assert_eq!(s.cash, dec!(1300));
    assert_eq!(s.convertible_debt, dec!(2800));
    assert_eq!(s.secured_debt, dec!(500));
    assert_eq!(s.common_shares, dec!(200));
    assert_eq!(s.total_assets, dec!(78800));
    assert_eq!(s.total_liabilities, dec!(3800));
    assert_eq!(s.book_equity, dec!(75000));
    assert_eq!(s.cash_confidence, Confidence::Approximate);
    assert_eq!(s.note, "derived from 2024-03-31 anchor + 2 events");
}

#[test]
fn lifecycle_events_do_not_move_totals() {
    let ledger = load("issuer.toml");
    let anchor = ledger.reconstruct(date("2024-09-30")).unwrap();
    let later = ledger.reconstruct(date("2024-12-31")).unwrap();
    assert_eq!(later.events.len(), 2);
    assert_eq!(later.convertible_debt, anchor.convertible_debt);
    assert_eq!(later.common_shares, anchor.common_shares);
    assert_eq!(later.total_assets, anchor.total_assets);
}

#[test]
fn quarterly_range_and_timeline() {
    let ledger = load("issuer.toml");
    let timeline = ledger.timeline();
    assert_eq!(timeline.len(), 3);
    assert!(timeline.iter().all(|s| s.source == StateSource::Verified));

    let range = ledger.reconstruct_range(date("2023-12-31"), date("2024-12-31"), Interval::Quarterly);
    let dates: Vec<String> = range.iter().map(|s| s.date.to_string()).collect();
    assert_eq!(dates, ["2024-03-31", "2024-06-30", "2024-09-30", "2024-12-31"]);
    assert_eq!(range[3].source, StateSource::Derived);
}

// -------------------------------------------------------------------------
// Verification
// -------------------------------------------------------------------------

#[test]
fn issuer_verification_across_split() {
    let report = load("issuer.toml").verify();
    assert_eq!(report.meta.split_basis_date, date("2024-11-01"));

    let q1 = &report.intervals[0];
    assert_eq!(q1.period_start, date("2020-01-01"));
    assert_eq!(q1.event_count, 1);
    assert_eq!(q1.events[0].date, date("2020-12-10"));
    assert_eq!(q1.assets.status, VerificationStatus::NoData);
    // Measured from zero: debt outstanding before the log starts shows up here.
    assert_eq!(q1.shares.authoritative_delta, Some(dec!(200)));
    assert_eq!(q1.shares.status, VerificationStatus::NoData);
    assert_eq!(q1.debt.authoritative_delta, Some(dec!(2500)));
    assert_eq!(q1.debt.predicted_delta, dec!(650));
    assert_eq!(q1.debt.discrepancy, Some(dec!(1850)));
    assert_eq!(q1.debt.status, VerificationStatus::Fail);

    let q2 = &report.intervals[1];
    assert_eq!(q2.shares.authoritative_delta, Some(dec!(10)));
    assert_eq!(q2.shares.status, VerificationStatus::Pass);
    assert_eq!(q2.debt.status, VerificationStatus::Pass);
    assert_eq!(q2.assets.note.as_deref(), Some("event log running total: 1300"));

    let q3 = &report.intervals[2];
    assert_eq!(q3.event_count, 4);
    assert_eq!(q3.shares.discrepancy, Some(dec!(1)));
    assert_eq!(q3.shares.status, VerificationStatus::Warn);
    assert_eq!(q3.debt.authoritative_delta, Some(dec!(0)));
    assert_eq!(q3.debt.status, VerificationStatus::NoData);

    assert_eq!(report.summary.shares, StatusCounts { pass: 1, warn: 1, fail: 0, no_data: 1 });
    assert_eq!(report.summary.debt, StatusCounts { pass: 1, warn: 0, fail: 1, no_data: 1 });
    assert_eq!(report.summary.assets, StatusCounts { pass: 2, warn: 0, fail: 0, no_data: 1 });
}

#[test]
fn discrepancies_are_strict_subset() {
    let report = load("issuer.toml").verify();
    let found = get_discrepancies(&report);
    assert_eq!(found.len(), 2);
    assert!(found.len() < report.intervals.len());
    assert_eq!(found[0].label, "Q1 2024");
    assert_eq!(found[1].label, "Q3 2024");
    for interval in &found {
        assert!(interval
            .records()
            .iter()
            .any(|r| matches!(r.status, VerificationStatus::Warn | VerificationStatus::Fail)));
    }
}

#[test]
fn single_interval_matches_full_report() {
    let ledger = load("issuer.toml");
    let report = ledger.verify();
    let single = ledger.verify_interval_ending(date("2024-09-30")).unwrap();
    assert_eq!(single.shares.status, report.intervals[2].shares.status);
    assert_eq!(single.period_start, date("2024-07-01"));
    assert!(ledger.verify_interval_ending(date("2024-08-31")).is_none());
}

// -------------------------------------------------------------------------
// Schedule + flows
// -------------------------------------------------------------------------

#[test]
fn scheduled_rows_as_of_january() {
    let ledger = load("issuer.toml");
    let rows = ledger.scheduled_events(date("2025-01-10"), Some(dec!(300)));

    let kinds: Vec<ScheduledKind> = rows.iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        [
            ScheduledKind::PendingConfirmation,
            ScheduledKind::ContingentConversion,
            ScheduledKind::Maturity,
        ]
    );
    assert_eq!(rows[0].due, date("2024-10-20"));
    assert_eq!(rows[1].due, date("2024-12-15"));
    assert_eq!(rows[1].conversion_likely, Some(true));
    assert_eq!(rows[2].due, date("2028-09-15"));
    assert_eq!(rows[2].status, ScheduleStatus::Upcoming);
    assert_eq!(rows[2].conversion_likely, Some(true));

    let summary = ledger.schedule_summary(date("2025-01-10"), Some(dec!(300)));
    assert_eq!(summary.pending, 2);
    assert_eq!(summary.upcoming, 1);
    assert_eq!(summary.total_principal_maturing, dec!(800));
    assert_eq!(summary.near_term_maturities, 0);
}

#[test]
fn matured_notes_turn_pending_on_due_date() {
    let ledger = load("issuer.toml");
    // Before maturity the 2024 notes are an ordinary maturity row.
    let rows = ledger.scheduled_events(date("2024-12-14"), None);
    let notes = rows.iter().find(|r| r.due == date("2024-12-15")).unwrap();
    assert_eq!(notes.kind, ScheduledKind::Maturity);
    assert_eq!(notes.status, ScheduleStatus::DueSoon);
    assert_eq!(notes.days_until_due, 1);

    // From the maturity date onward they await confirmation.
    let rows = ledger.scheduled_events(date("2024-12-15"), None);
    let notes = rows.iter().find(|r| r.due == date("2024-12-15")).unwrap();
    assert_eq!(notes.status, ScheduleStatus::PendingVerification);
}

#[test]
fn flows_over_second_quarter() {
    let flows = load("issuer.toml").capital_flows(date("2024-04-01"), date("2024-06-30"));
    assert_eq!(flows.event_count, 3);
    assert_eq!(flows.assets_acquired, dec!(300));
    assert_eq!(flows.acquisition_spend, dec!(18000));
    assert_eq!(flows.debt_issued, dec!(800));
    assert_eq!(flows.common_shares_issued, dec!(10));
    assert_eq!(flows.preferred_proceeds, dec!(0));
}
