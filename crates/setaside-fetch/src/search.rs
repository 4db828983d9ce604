//! HTTP client for the SAM.gov opportunities search endpoint.

use std::time::Duration;

use chrono::{Days, NaiveDate};
use reqwest::StatusCode;
use serde_json::Value;
use setaside_core::{CoreError, RawOpportunity, decode_records};
use thiserror::Error;
use tracing::{info, warn};

/// Production search endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.sam.gov/prod/opportunities/v2/search";

/// Date format expected by `postedFrom` / `postedTo`.
const API_DATE_FORMAT: &str = "%m/%d/%Y";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid search response: {0}")]
    Decode(#[from] CoreError),
    #[error("invalid search parameters: {0}")]
    InvalidParams(String),
}

/// What to search for and how much of it to collect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    /// Free-text keyword (`q`).
    pub keyword: String,
    /// Width of the posting window ending today.
    pub days_back: u32,
    /// Page size; also the offset increment.
    pub limit: usize,
    /// Stop once this many records have been collected.
    pub max_records: usize,
}

/// Inclusive posting-date window `[today - days_back, today]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    pub fn ending(today: NaiveDate, days_back: u32) -> Self {
        let from = today
            .checked_sub_days(Days::new(u64::from(days_back)))
            .unwrap_or(NaiveDate::MIN);
        Self { from, to: today }
    }

    /// `postedFrom` query value.
    pub fn posted_from(&self) -> String {
        self.from.format(API_DATE_FORMAT).to_string()
    }

    /// `postedTo` query value.
    pub fn posted_to(&self) -> String {
        self.to.format(API_DATE_FORMAT).to_string()
    }
}

/// Why pagination ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// A page came back shorter than the page size.
    Exhausted,
    /// The record cap was reached; results were truncated to it.
    Capped,
    /// The API answered with a non-200 status. Records gathered before the
    /// failing page are kept.
    ServerError { status: u16, body: String },
}

/// Records accumulated by [`SamClient::fetch`] and the reason it stopped.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub records: Vec<RawOpportunity>,
    pub stop: StopReason,
}

impl FetchOutcome {
    /// True when the API aborted pagination and `records` may be incomplete.
    pub fn is_partial(&self) -> bool {
        matches!(self.stop, StopReason::ServerError { .. })
    }
}

/// Paginating client for the opportunities search API.
///
/// Holds the API credential and a `reqwest::Client` configured with a fixed
/// per-request timeout. Requests are never retried.
pub struct SamClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SamClient {
    /// Create a client for `base_url` (usually [`DEFAULT_BASE_URL`]).
    pub fn new(base_url: &str, api_key: String, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Page through all results posted in the window ending on `today`.
    ///
    /// Stops on a short page, on reaching `max_records` (truncating to exactly
    /// that many), or on a non-200 status. The last case is not an error:
    /// the records collected so far are returned with
    /// [`StopReason::ServerError`]. Transport failures and undecodable bodies
    /// are errors.
    pub async fn fetch(
        &self,
        params: &SearchParams,
        today: NaiveDate,
    ) -> Result<FetchOutcome, FetchError> {
        if params.limit == 0 {
            return Err(FetchError::InvalidParams("limit must be positive".into()));
        }
        if params.max_records == 0 {
            return Err(FetchError::InvalidParams(
                "max_records must be positive".into(),
            ));
        }

        let window = DateWindow::ending(today, params.days_back);
        let mut records: Vec<RawOpportunity> = Vec::new();
        let mut offset = 0usize;

        loop {
            info!(
                from = offset,
                to = offset + params.limit,
                keyword = %params.keyword,
                "fetching records"
            );

            let page = match self.fetch_page(params, &window, offset).await? {
                Ok(page) => page,
                Err(stop) => {
                    warn!(
                        ?stop,
                        kept = records.len(),
                        "search API returned an error, keeping partial results"
                    );
                    return Ok(FetchOutcome { records, stop });
                }
            };

            let page_len = page.len();
            records.extend(page);

            if records.len() >= params.max_records {
                records.truncate(params.max_records);
                info!(count = records.len(), "record cap reached");
                return Ok(FetchOutcome {
                    records,
                    stop: StopReason::Capped,
                });
            }
            if page_len < params.limit {
                info!(count = records.len(), "search results exhausted");
                return Ok(FetchOutcome {
                    records,
                    stop: StopReason::Exhausted,
                });
            }

            offset += params.limit;
        }
    }

    /// Fetch one page. The inner `Err` carries a non-200 status.
    async fn fetch_page(
        &self,
        params: &SearchParams,
        window: &DateWindow,
        offset: usize,
    ) -> Result<Result<Vec<RawOpportunity>, StopReason>, FetchError> {
        let posted_from = window.posted_from();
        let posted_to = window.posted_to();
        let limit = params.limit.to_string();
        let offset = offset.to_string();

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("q", params.keyword.as_str()),
                ("postedFrom", posted_from.as_str()),
                ("postedTo", posted_to.as_str()),
                ("limit", limit.as_str()),
                ("offset", offset.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Ok(Err(StopReason::ServerError {
                status: status.as_u16(),
                body,
            }));
        }

        let bytes = resp.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes)?;
        let Value::Object(mut body) = body else {
            return Err(
                CoreError::InvalidInput("search response is not a JSON object".into()).into(),
            );
        };

        let page = match body.remove("opportunitiesData") {
            None | Some(Value::Null) => Vec::new(),
            Some(data) => decode_records(data)?,
        };
        Ok(Ok(page))
    }
}
