//! Console cards for opportunities.
//!
//! Two renderers: [`opportunity_card`] for freshly transformed records (the
//! `run --print` report), and [`row_card`] for rows read back from a Parquet
//! file (`show`), with type-aware formatting per column.

use std::fmt::Write as _;

use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Int32Type, Int64Type, TimeUnit, TimestampMillisecondType};
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use chrono::DateTime;
use setaside_core::Opportunity;
use setaside_core::schema::columns::*;

const RULE_WIDTH: usize = 60;

// ── Schema section groupings ──

const IDENTITY: &[&str] = &[ID, TITLE, SOLICITATION_NUMBER, AGENCY, LINK];

const CLASSIFICATION: &[&str] = &[SET_ASIDE, NAICS_CODE, NAICS_DESCRIPTION, HAS_NAICS];

const LOCATION: &[&str] = &[CITY, STATE];

const RECENCY: &[&str] = &[POSTED_DATE, DAYS_SINCE_POSTED, IS_RECENT, RECENCY_SCORE];

// ── Transformed records ──

/// Print each opportunity as a numbered card.
pub fn print_opportunities(opportunities: &[Opportunity]) {
    for (i, opp) in opportunities.iter().enumerate() {
        println!("{}", opportunity_card(i + 1, opp));
    }
}

pub fn opportunity_card(number: usize, opp: &Opportunity) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nOpportunity #{number}");
    let _ = writeln!(out, "Title: {}", opp.title);
    let _ = writeln!(out, "Solicitation #: {}", opp.solicitation_number);
    let _ = writeln!(out, "Agency: {}", opp.agency);
    let _ = writeln!(out, "Posted Date: {}", opp.posted_date.format("%Y-%m-%d"));
    let _ = writeln!(out, "Set-Aside Type: {}", opp.set_aside);
    let _ = writeln!(out, "NAICS: {} ({})", opp.naics_code, opp.naics_description);
    let _ = writeln!(out, "Location: {}, {}", opp.city, opp.state);
    let _ = writeln!(
        out,
        "Recency: {} day(s) ago, score {}",
        opp.days_since_posted, opp.recency_score
    );
    let _ = writeln!(out, "Link: {}", opp.link);
    out.push_str(&"-".repeat(RULE_WIDTH));
    out
}

// ── Persisted rows ──

/// Render one row of a persisted opportunity batch as a card grouped by
/// schema section.
pub fn row_card(batch: &RecordBatch, row: usize) -> String {
    let id = cell(batch, ID, row).unwrap_or_default();
    let title = cell(batch, TITLE, row).unwrap_or_default();

    let mut out = String::new();
    let _ = writeln!(out, "=== {id} ===");
    if !title.is_empty() {
        let _ = writeln!(out, "{title}");
    }
    let _ = writeln!(out);

    section(&mut out, batch, row, "Identity", IDENTITY);
    section(&mut out, batch, row, "Classification", CLASSIFICATION);
    section(&mut out, batch, row, "Location", LOCATION);
    section(&mut out, batch, row, "Recency", RECENCY);
    out
}

fn section(out: &mut String, batch: &RecordBatch, row: usize, header: &str, cols: &[&str]) {
    let values: Vec<(&str, String)> = cols
        .iter()
        .filter_map(|&col| cell(batch, col, row).map(|v| (col, v)))
        .collect();
    if values.is_empty() {
        return;
    }

    let _ = writeln!(out, "{header}");
    for (col, value) in values {
        let _ = writeln!(out, "  {col:<20} {value}");
    }
    let _ = writeln!(out);
}

/// Format one cell; `None` for missing columns and nulls.
fn cell(batch: &RecordBatch, name: &str, row: usize) -> Option<String> {
    let col = batch.column_by_name(name)?;
    if col.is_null(row) {
        return None;
    }

    let value = match col.data_type() {
        DataType::Utf8 => col.as_string::<i32>().value(row).to_string(),
        DataType::LargeUtf8 => col.as_string::<i64>().value(row).to_string(),
        DataType::Int32 => col.as_primitive::<Int32Type>().value(row).to_string(),
        DataType::Int64 => col.as_primitive::<Int64Type>().value(row).to_string(),
        DataType::Boolean => {
            let yes = col.as_boolean().value(row);
            (if yes { "yes" } else { "no" }).to_string()
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            let millis = col.as_primitive::<TimestampMillisecondType>().value(row);
            match DateTime::from_timestamp_millis(millis) {
                Some(ts) => ts.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
                None => millis.to_string(),
            }
        }
        other => match ArrayFormatter::try_new(col.as_ref(), &FormatOptions::default()) {
            Ok(fmt) => fmt.value(row).to_string(),
            Err(_) => format!("({other})"),
        },
    };
    Some(value)
}
