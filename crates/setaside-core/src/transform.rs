//! Flatten, clean, enrich, score and rank veteran set-aside opportunities.
//!
//! The stages run in a fixed order for every record:
//!
//! 1. Flatten the raw record and trim every string field.
//! 2. Drop records without an id, a title, or a parseable posting date.
//! 3. Derive `days_since_posted`, `is_recent` and `has_naics`.
//! 4. Upper-case the office state.
//! 5. Classify the NAICS code through the injected [`NaicsTable`].
//! 6. Assign a 1–5 recency score.
//!
//! The surviving records are then stably sorted by recency score and posting
//! date, both descending, so ties keep their fetch order.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::{CoreError, NaicsTable, Opportunity, RawOpportunity, decode_records};

/// A record is "recent" when posted at most this many days ago.
pub const RECENT_DAYS: i64 = 7;

const SECONDS_PER_DAY: i64 = 86_400;

/// Turns raw search records into ranked [`Opportunity`] values.
#[derive(Debug, Clone, Default)]
pub struct Transformer {
    naics: NaicsTable,
}

impl Transformer {
    pub fn new(naics: NaicsTable) -> Self {
        Self { naics }
    }

    pub fn naics(&self) -> &NaicsTable {
        &self.naics
    }

    /// Transform records relative to the run instant `now`.
    ///
    /// Records missing required fields are dropped without error.
    pub fn transform(&self, raw: &[RawOpportunity], now: DateTime<Utc>) -> Vec<Opportunity> {
        let mut out: Vec<Opportunity> = raw
            .iter()
            .filter_map(|r| self.transform_one(r, now))
            .collect();

        let dropped = raw.len() - out.len();
        if dropped > 0 {
            debug!(dropped, "dropped records missing id, title or posted date");
        }

        // `sort_by` is stable: equal keys keep their input order.
        out.sort_by(|a, b| {
            b.recency_score
                .cmp(&a.recency_score)
                .then_with(|| b.posted_date.cmp(&a.posted_date))
        });
        out
    }

    /// Transform an untyped JSON array of records.
    ///
    /// Fails with [`CoreError::InvalidInput`] when `value` is not an array of
    /// objects.
    pub fn transform_value(
        &self,
        value: Value,
        now: DateTime<Utc>,
    ) -> Result<Vec<Opportunity>, CoreError> {
        let raw = decode_records(value)?;
        Ok(self.transform(&raw, now))
    }

    fn transform_one(&self, raw: &RawOpportunity, now: DateTime<Utc>) -> Option<Opportunity> {
        let flat = Flattened::from_raw(raw);

        let id = required(flat.id)?;
        let title = required(flat.title)?;
        let posted_date = parse_posted_date(flat.posted_date)?;

        let days_since_posted = days_between(posted_date, now);
        let naics_description = self.naics.describe(flat.naics_code).to_string();

        Some(Opportunity {
            id: id.to_string(),
            title: title.to_string(),
            solicitation_number: flat.solicitation_number.to_string(),
            agency: flat.agency.to_string(),
            posted_date,
            set_aside: flat.set_aside.to_string(),
            naics_code: flat.naics_code.to_string(),
            naics_description,
            city: flat.city.to_string(),
            state: normalize_state(flat.state),
            link: flat.link.to_string(),
            days_since_posted,
            is_recent: days_since_posted <= RECENT_DAYS,
            has_naics: !flat.naics_code.is_empty(),
            recency_score: recency_score(days_since_posted),
        })
    }
}

/// Trimmed view over a raw record; absent fields read as empty strings.
struct Flattened<'a> {
    id: &'a str,
    title: &'a str,
    solicitation_number: &'a str,
    agency: &'a str,
    posted_date: &'a str,
    set_aside: &'a str,
    naics_code: &'a str,
    city: &'a str,
    state: &'a str,
    link: &'a str,
}

impl<'a> Flattened<'a> {
    fn from_raw(raw: &'a RawOpportunity) -> Self {
        let (city, state) = raw.location();
        Self {
            id: field(&raw.notice_id),
            title: field(&raw.title),
            solicitation_number: field(&raw.solicitation_number),
            agency: field(&raw.full_parent_path_name),
            posted_date: field(&raw.posted_date),
            set_aside: field(&raw.type_of_set_aside_description),
            naics_code: field(&raw.naics_code),
            city: city.trim(),
            state: state.trim(),
            link: field(&raw.ui_link),
        }
    }
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("").trim()
}

fn required(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

/// Parse a posting date as published by the search API.
///
/// Offsets are converted to UTC; values without an offset are taken as UTC,
/// and bare dates as midnight UTC. Returns `None` for anything else.
pub fn parse_posted_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // `%#z` accepts `-05`, `-0500` and `-05:00`.
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }
    for fmt in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}

/// Whole days from `posted` to `now`, rounded towards negative infinity.
pub fn days_between(posted: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - posted).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Step function from days since posting to a 1–5 score.
///
/// Negative inputs (a posting date in the future) fall through to 1.
pub fn recency_score(days_since_posted: i64) -> u8 {
    match days_since_posted {
        0..=1 => 5,
        2..=3 => 4,
        4..=5 => 3,
        6..=7 => 2,
        _ => 1,
    }
}

/// Upper-case a state code. No validation is applied.
pub fn normalize_state(state: &str) -> String {
    state.to_uppercase()
}
