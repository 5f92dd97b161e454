//! Subcommand implementations. JSON goes to stdout, human summaries to stderr.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use capledger_recon::reconstruct::StateSource;
use capledger_recon::schedule::ScheduleSummary;
use capledger_recon::verify::{DiscrepancyRecord, IntervalVerification};
use capledger_recon::{get_discrepancies, Dataset, DerivedState, Interval, Ledger, ScheduledEvent};

use crate::exit_codes::{EXIT_DISCREPANCIES, EXIT_NOT_COVERED};
use crate::CliError;

fn load(path: &Path) -> Result<Ledger, CliError> {
    let ledger = Dataset::load(path)?.into_ledger()?;
    tracing::debug!(
        snapshots = ledger.snapshots().len(),
        events = ledger.events().len(),
        basis = %ledger.basis_date(),
        "dataset loaded"
    );
    Ok(ledger)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(|e| CliError::io(format!("JSON serialization error: {e}")))
}

fn not_covered(ledger: &Ledger, date: NaiveDate) -> CliError {
    let err = CliError::new(EXIT_NOT_COVERED, format!("no anchor at or before {date}"));
    match ledger.snapshots().first() {
        Some(first) => err.with_hint(format!("first anchor is {}", first.date)),
        None => err.with_hint("dataset has no snapshots"),
    }
}

fn pct(value: Option<Decimal>) -> String {
    match value {
        Some(v) => format!("{}%", (v * Decimal::ONE_HUNDRED).round_dp(1)),
        None => "-".to_string(),
    }
}

// ============================================================================
// validate
// ============================================================================

pub fn cmd_validate(dataset: PathBuf) -> Result<(), CliError> {
    let ledger = load(&dataset)?;
    let name = if ledger.name().is_empty() { "dataset" } else { ledger.name() };
    let span = match (ledger.snapshots().first(), ledger.snapshots().latest()) {
        (Some(first), Some(last)) => format!(", anchors {} to {}", first.date, last.date),
        _ => String::new(),
    };
    eprintln!(
        "{name}: valid ({} snapshots, {} events{span}, split basis {})",
        ledger.snapshots().len(),
        ledger.events().len(),
        ledger.basis_date(),
    );
    let tolerance = &ledger.config().tolerance;
    eprintln!(
        "tolerance: shares warn {} / fail {}, debt warn {} / fail {}",
        tolerance.shares.warn, tolerance.shares.fail, tolerance.debt.warn, tolerance.debt.fail,
    );
    Ok(())
}

// ============================================================================
// at / range
// ============================================================================

pub fn cmd_at(dataset: PathBuf, date: NaiveDate, json_output: bool) -> Result<(), CliError> {
    let ledger = load(&dataset)?;
    let state = ledger.reconstruct(date).ok_or_else(|| not_covered(&ledger, date))?;

    if json_output {
        println!("{}", to_json(&state)?);
        return Ok(());
    }

    println!("date:              {}", state.date);
    println!("source:            {}", source_label(&state));
    println!("asset quantity:    {}", state.asset_quantity);
    println!("asset cost basis:  {}", state.asset_cost_basis);
    println!("cash:              {}{}", state.cash, approx_marker(&state));
    println!("convertible debt:  {}", state.convertible_debt);
    println!("secured debt:      {}", state.secured_debt);
    println!("preferred equity:  {}", state.preferred_equity);
    println!("common shares:     {}", state.common_shares);
    println!("total assets:      {}{}", state.total_assets, approx_marker(&state));
    println!("total liabilities: {}{}", state.total_liabilities, approx_marker(&state));
    println!("book equity:       {}{}", state.book_equity, approx_marker(&state));
    eprintln!("{}", state.note);
    Ok(())
}

pub fn cmd_range(
    dataset: PathBuf,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    interval: Interval,
    timeline: bool,
    json_output: bool,
) -> Result<(), CliError> {
    let ledger = load(&dataset)?;

    let states = if timeline {
        ledger.timeline()
    } else {
        let (Some(start), Some(end)) = (start, end) else {
            return Err(CliError::args("range needs <START> and <END>, or --timeline"));
        };
        if start > end {
            return Err(CliError::args(format!("start {start} is after end {end}")));
        }
        ledger.reconstruct_range(start, end, interval)
    };

    if json_output {
        println!("{}", to_json(&states)?);
    } else {
        println!(
            "{:<10}  {:<8}  {:>16}  {:>16}  {:>16}  {:>16}",
            "date", "source", "assets", "shares", "total debt", "book equity"
        );
        for s in &states {
            println!(
                "{:<10}  {:<8}  {:>16}  {:>16}  {:>16}  {:>16}",
                s.date.to_string(),
                source_label(s),
                s.asset_quantity.to_string(),
                s.common_shares.to_string(),
                s.total_debt.to_string(),
                s.book_equity.to_string(),
            );
        }
    }

    let derived = states.iter().filter(|s| s.source == StateSource::Derived).count();
    eprintln!("{} states ({} verified, {} derived)", states.len(), states.len() - derived, derived);
    Ok(())
}

fn source_label(state: &DerivedState) -> &'static str {
    match state.source {
        StateSource::Verified => "verified",
        StateSource::Derived => "derived",
    }
}

fn approx_marker(state: &DerivedState) -> &'static str {
    match state.source {
        StateSource::Verified => "",
        StateSource::Derived => " (approx)",
    }
}

// ============================================================================
// verify
// ============================================================================

pub fn cmd_verify(
    dataset: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    discrepancies_only: bool,
    period_end: Option<NaiveDate>,
) -> Result<(), CliError> {
    let ledger = load(&dataset)?;

    if let Some(date) = period_end {
        let interval = ledger.verify_interval_ending(date).ok_or_else(|| {
            CliError::new(EXIT_NOT_COVERED, format!("no anchor dated {date}"))
                .with_hint("--period-end must be an anchor date; see `capledger range --timeline`")
        })?;
        emit(&interval, json_output, output_file.as_deref())?;
        if !json_output {
            print_interval(&interval);
        }
        return discrepancy_exit(interval.has_discrepancy());
    }

    let report = ledger.verify();
    let flagged = get_discrepancies(&report);

    if discrepancies_only {
        emit(&flagged, json_output, output_file.as_deref())?;
    } else {
        emit(&report, json_output, output_file.as_deref())?;
    }

    if !json_output {
        let shown: Vec<&IntervalVerification> = if discrepancies_only {
            flagged.clone()
        } else {
            report.intervals.iter().collect()
        };
        for interval in shown {
            print_interval(interval);
        }
        for note in &report.notes {
            println!("note: {note}");
        }
    }

    let s = &report.summary;
    eprintln!(
        "verified {} intervals: shares {} pass / {} warn / {} fail / {} no-data, debt {} pass / {} warn / {} fail / {} no-data",
        s.intervals,
        s.shares.pass,
        s.shares.warn,
        s.shares.fail,
        s.shares.no_data,
        s.debt.pass,
        s.debt.warn,
        s.debt.fail,
        s.debt.no_data,
    );

    discrepancy_exit(!flagged.is_empty())
}

fn emit<T: Serialize + ?Sized>(value: &T, json_output: bool, output_file: Option<&Path>) -> Result<(), CliError> {
    if !json_output && output_file.is_none() {
        return Ok(());
    }
    let json_str = to_json(value)?;
    if let Some(path) = output_file {
        std::fs::write(path, &json_str).map_err(|e| CliError::io(format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }
    if json_output {
        println!("{json_str}");
    }
    Ok(())
}

fn discrepancy_exit(found: bool) -> Result<(), CliError> {
    if found {
        // Summary already printed; exit code carries the verdict.
        Err(CliError::new(EXIT_DISCREPANCIES, "discrepancies found"))
    } else {
        Ok(())
    }
}

fn print_interval(interval: &IntervalVerification) {
    println!(
        "{} ({} to {}, {} events)",
        interval.label, interval.period_start, interval.period_end, interval.event_count
    );
    for record in interval.records() {
        print_record(record);
    }
}

fn print_record(r: &DiscrepancyRecord) {
    let authoritative = r.authoritative_delta.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
    let discrepancy = r.discrepancy.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
    println!(
        "  {:<7} {:<8} reported {:>14}  logged {:>14}  gap {:>12} ({})",
        r.quantity.to_string(),
        r.status.to_string(),
        authoritative,
        r.predicted_delta.to_string(),
        discrepancy,
        pct(r.discrepancy_pct),
    );
    if let Some(note) = &r.note {
        println!("          {note}");
    }
}

// ============================================================================
// scheduled
// ============================================================================

#[derive(Serialize)]
struct ScheduleOutput<'a> {
    summary: &'a ScheduleSummary,
    events: &'a [ScheduledEvent],
}

pub fn cmd_scheduled(
    dataset: PathBuf,
    as_of: NaiveDate,
    price: Option<Decimal>,
    json_output: bool,
) -> Result<(), CliError> {
    let ledger = load(&dataset)?;
    let events = ledger.scheduled_events(as_of, price);
    let summary = ledger.schedule_summary(as_of, price);

    if json_output {
        println!("{}", to_json(&ScheduleOutput { summary: &summary, events: &events })?);
    } else {
        for e in &events {
            let amount = e.amount.map(|a| a.to_string()).unwrap_or_else(|| "-".into());
            let likely = match e.conversion_likely {
                Some(true) => " conversion likely",
                Some(false) => " conversion unlikely",
                None => "",
            };
            println!(
                "{}  {:<20}  {:>6}d  {:>14}  {}{likely}",
                e.due,
                e.status.to_string(),
                e.days_until_due,
                amount,
                e.description,
            );
            if let Some(note) = &e.note {
                println!("            {note}");
            }
        }
    }

    eprintln!(
        "as of {}: {} pending, {} upcoming, {} maturing in total, {} maturities before {}",
        summary.as_of,
        summary.pending,
        summary.upcoming,
        summary.total_principal_maturing,
        summary.near_term_maturities,
        summary.horizon,
    );
    Ok(())
}

// ============================================================================
// flows
// ============================================================================

pub fn cmd_flows(dataset: PathBuf, start: NaiveDate, end: NaiveDate, json_output: bool) -> Result<(), CliError> {
    if start > end {
        return Err(CliError::args(format!("start {start} is after end {end}")));
    }
    let ledger = load(&dataset)?;
    let flows = ledger.capital_flows(start, end);

    if json_output {
        println!("{}", to_json(&flows)?);
    } else {
        println!("assets acquired:      {}", flows.assets_acquired);
        println!("acquisition spend:    {}", flows.acquisition_spend);
        println!("debt issued:          {}", flows.debt_issued);
        println!("common shares issued: {}", flows.common_shares_issued);
        println!("common proceeds:      {}", flows.common_proceeds);
        println!("preferred proceeds:   {}", flows.preferred_proceeds);
    }
    eprintln!("{} events between {start} and {end}", flows.event_count);
    Ok(())
}
