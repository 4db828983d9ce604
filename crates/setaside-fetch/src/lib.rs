//! Fetch layer: paginated retrieval of contract opportunities from SAM.gov.

pub mod search;

pub use search::{
    DEFAULT_BASE_URL, DateWindow, FetchError, FetchOutcome, SamClient, SearchParams, StopReason,
};
