//! Opportunity records before and after transformation.
//!
//! [`RawOpportunity`] mirrors one element of the search API's
//! `opportunitiesData` array. Every field is optional: a key that is absent,
//! `null`, or carries an unexpected JSON type decodes to `None`, so a missing
//! field is an ordinary value rather than a decode failure.
//!
//! [`Opportunity`] is the cleaned, scored record produced by
//! [`Transformer`](crate::Transformer).

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::CoreError;

/// A search API record as returned by SAM.gov.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOpportunity {
    #[serde(default, deserialize_with = "lenient::string")]
    pub notice_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub solicitation_number: Option<String>,
    /// Hierarchical agency path, e.g. `DEPT OF DEFENSE.DEPT OF THE ARMY`.
    #[serde(default, deserialize_with = "lenient::string")]
    pub full_parent_path_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub posted_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub type_of_set_aside_description: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub naics_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::address")]
    pub office_address: Option<OfficeAddress>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub ui_link: Option<String>,
}

/// The contracting office address embedded in a raw record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OfficeAddress {
    #[serde(default, deserialize_with = "lenient::string")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub state: Option<String>,
}

impl RawOpportunity {
    /// Decode a single JSON object into a raw record.
    pub fn from_value(value: Value) -> Result<Self, CoreError> {
        if !value.is_object() {
            return Err(CoreError::InvalidInput(format!(
                "expected an object, got {}",
                json_kind(&value)
            )));
        }
        serde_json::from_value(value).map_err(|e| CoreError::InvalidInput(e.to_string()))
    }

    /// City and state of the contracting office, empty when absent.
    pub fn location(&self) -> (&str, &str) {
        let address = self.office_address.as_ref();
        (
            address.and_then(|a| a.city.as_deref()).unwrap_or(""),
            address.and_then(|a| a.state.as_deref()).unwrap_or(""),
        )
    }
}

/// Decode a JSON array of record objects.
///
/// Fails with [`CoreError::InvalidInput`] if `value` is not an array or any
/// element is not an object. Missing fields inside an object are not errors.
pub fn decode_records(value: Value) -> Result<Vec<RawOpportunity>, CoreError> {
    let Value::Array(items) = value else {
        return Err(CoreError::InvalidInput(format!(
            "expected an array of records, got {}",
            json_kind(&value)
        )));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            RawOpportunity::from_value(item)
                .map_err(|e| CoreError::InvalidInput(format!("record {i}: {e}")))
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A cleaned, enriched and scored opportunity.
#[derive(Debug, Clone, PartialEq)]
pub struct Opportunity {
    pub id: String,
    pub title: String,
    pub solicitation_number: String,
    pub agency: String,
    pub posted_date: DateTime<Utc>,
    pub set_aside: String,
    pub naics_code: String,
    pub naics_description: String,
    pub city: String,
    pub state: String,
    pub link: String,
    /// Whole days between the run instant and `posted_date`, floored.
    /// Negative when the posting date lies in the future.
    pub days_since_posted: i64,
    pub is_recent: bool,
    pub has_naics: bool,
    pub recency_score: u8,
}

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::OfficeAddress;

    pub fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::String(s)) => Some(s),
            _ => None,
        })
    }

    pub fn address<'de, D>(deserializer: D) -> Result<Option<OfficeAddress>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(value @ Value::Object(_)) => serde_json::from_value(value).ok(),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_sam_record() {
        let set_aside = "Service-Disabled Veteran-Owned Small Business (SDVOSB) Set-Aside";
        let raw = RawOpportunity::from_value(json!({
            "noticeId": "abc123",
            "title": "Cloud Migration Support",
            "solicitationNumber": "W91-25-R-0001",
            "fullParentPathName": "DEPT OF DEFENSE.DEPT OF THE ARMY",
            "postedDate": "2026-10-18",
            "typeOfSetAsideDescription": set_aside,
            "naicsCode": "541511",
            "officeAddress": { "city": "Fort Belvoir", "state": "va", "zipcode": "22060" },
            "uiLink": "https://sam.gov/opp/abc123/view"
        }))
        .unwrap();

        assert_eq!(raw.notice_id.as_deref(), Some("abc123"));
        assert_eq!(
            raw.full_parent_path_name.as_deref(),
            Some("DEPT OF DEFENSE.DEPT OF THE ARMY")
        );
        assert_eq!(raw.location(), ("Fort Belvoir", "va"));
    }

    #[test]
    fn missing_and_mistyped_fields_are_none() {
        let raw = RawOpportunity::from_value(json!({
            "noticeId": 42,
            "title": null,
            "typeOfSetAsideDescription": ["Veteran-Owned"],
            "officeAddress": "Washington, DC"
        }))
        .unwrap();

        assert_eq!(raw, RawOpportunity::default());
        assert_eq!(raw.location(), ("", ""));
    }

    #[test]
    fn partial_office_address() {
        let raw = RawOpportunity::from_value(json!({
            "officeAddress": { "state": "TX" }
        }))
        .unwrap();
        assert_eq!(raw.location(), ("", "TX"));
    }

    #[test]
    fn decode_records_rejects_non_array() {
        let err = decode_records(json!({ "noticeId": "1" })).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn decode_records_rejects_non_object_element() {
        let err = decode_records(json!([{ "noticeId": "1" }, "oops"])).unwrap_err();
        match err {
            CoreError::InvalidInput(msg) => assert!(msg.starts_with("record 1:"), "{msg}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn decode_records_preserves_order() {
        let records = decode_records(json!([
            { "noticeId": "a" },
            {},
            { "noticeId": "c" }
        ]))
        .unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.notice_id.as_deref()).collect();
        assert_eq!(ids, vec![Some("a"), None, Some("c")]);
    }
}
