//! Arrow schema for transformed opportunities.
//!
//! Column names follow the camelCase field names used by downstream catalog
//! tables and analytic queries.

use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanArray, Int32Array, Int64Array, StringArray, TimestampMillisecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;

use crate::{CoreError, Opportunity};

pub mod columns {
    pub const ID: &str = "id";
    pub const TITLE: &str = "title";
    pub const SOLICITATION_NUMBER: &str = "solicitationNumber";
    pub const AGENCY: &str = "agency";
    pub const POSTED_DATE: &str = "postedDate";
    pub const SET_ASIDE: &str = "setAside";
    pub const NAICS_CODE: &str = "naicsCode";
    pub const NAICS_DESCRIPTION: &str = "naicsDescription";
    pub const CITY: &str = "city";
    pub const STATE: &str = "state";
    pub const LINK: &str = "link";
    pub const DAYS_SINCE_POSTED: &str = "daysSincePosted";
    pub const IS_RECENT: &str = "isRecent";
    pub const HAS_NAICS: &str = "hasNAICS";
    pub const RECENCY_SCORE: &str = "recencyScore";
}

/// Schema of the persisted opportunity table, one row per [`Opportunity`].
pub fn opportunity_schema() -> Schema {
    use columns::*;

    let utf8 = |name: &str| Field::new(name, DataType::Utf8, false);
    Schema::new(vec![
        utf8(ID),
        utf8(TITLE),
        utf8(SOLICITATION_NUMBER),
        utf8(AGENCY),
        Field::new(
            POSTED_DATE,
            DataType::Timestamp(TimeUnit::Millisecond, Some("UTC".into())),
            false,
        ),
        utf8(SET_ASIDE),
        utf8(NAICS_CODE),
        utf8(NAICS_DESCRIPTION),
        utf8(CITY),
        utf8(STATE),
        utf8(LINK),
        Field::new(DAYS_SINCE_POSTED, DataType::Int64, false),
        Field::new(IS_RECENT, DataType::Boolean, false),
        Field::new(HAS_NAICS, DataType::Boolean, false),
        Field::new(RECENCY_SCORE, DataType::Int32, false),
    ])
}

/// Build a single RecordBatch from transformed opportunities, preserving order.
pub fn to_record_batch(opportunities: &[Opportunity]) -> Result<RecordBatch, CoreError> {
    let strings = |f: fn(&Opportunity) -> &str| -> ArrayRef {
        Arc::new(StringArray::from_iter_values(opportunities.iter().map(f)))
    };

    let columns: Vec<ArrayRef> = vec![
        strings(|o| o.id.as_str()),
        strings(|o| o.title.as_str()),
        strings(|o| o.solicitation_number.as_str()),
        strings(|o| o.agency.as_str()),
        Arc::new(
            TimestampMillisecondArray::from_iter_values(
                opportunities.iter().map(|o| o.posted_date.timestamp_millis()),
            )
            .with_timezone("UTC"),
        ),
        strings(|o| o.set_aside.as_str()),
        strings(|o| o.naics_code.as_str()),
        strings(|o| o.naics_description.as_str()),
        strings(|o| o.city.as_str()),
        strings(|o| o.state.as_str()),
        strings(|o| o.link.as_str()),
        Arc::new(Int64Array::from_iter_values(
            opportunities.iter().map(|o| o.days_since_posted),
        )),
        Arc::new(BooleanArray::from_iter(
            opportunities.iter().map(|o| Some(o.is_recent)),
        )),
        Arc::new(BooleanArray::from_iter(
            opportunities.iter().map(|o| Some(o.has_naics)),
        )),
        Arc::new(Int32Array::from_iter_values(
            opportunities.iter().map(|o| i32::from(o.recency_score)),
        )),
    ];

    Ok(RecordBatch::try_new(Arc::new(opportunity_schema()), columns)?)
}
