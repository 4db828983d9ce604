pub mod error;
pub mod filter;
pub mod naics;
pub mod opportunity;
pub mod schema;
pub mod transform;

pub use error::CoreError;
pub use filter::{VETERAN_MARKERS, filter_set_asides};
pub use naics::NaicsTable;
pub use opportunity::{OfficeAddress, Opportunity, RawOpportunity, decode_records};
pub use schema::{opportunity_schema, to_record_batch};
pub use transform::{Transformer, normalize_state, parse_posted_date, recency_score};
