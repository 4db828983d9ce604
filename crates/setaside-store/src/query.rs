//! Sample analytic query over the published table.
//!
//! The query engine is asynchronous: a query is started, then its status is
//! polled at a fixed interval until it reaches a terminal state. Polling is
//! bounded by [`PollPolicy::timeout`].

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::StoreError;

/// Table the catalog crawler registers for the upload prefix.
pub const CONTRACTS_TABLE: &str = "contracts";

/// Sample query: the most recently posted high-scoring opportunities.
pub fn analytic_sql(min_score: u8, limit: u32) -> String {
    format!(
        "SELECT title, solicitationNumber, postedDate, setAside, recencyScore\n\
         FROM {CONTRACTS_TABLE}\n\
         WHERE recencyScore >= {min_score}\n\
         ORDER BY postedDate DESC\n\
         LIMIT {limit};"
    )
}

/// Where query results are written for a given bucket.
pub fn results_location(bucket: &str) -> String {
    format!("s3://{bucket}/athena_results/")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub sql: String,
    pub database: String,
    pub output_location: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryState {
    Queued,
    Running,
    Succeeded,
    /// Failed, with the engine's reason when it gave one.
    Failed(Option<String>),
    Cancelled,
}

impl QueryState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed(_) | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            timeout: Duration::from_secs(300),
        }
    }
}

#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Submit a query and return its execution id.
    async fn start_query(&self, request: &QueryRequest) -> Result<String, StoreError>;

    async fn query_state(&self, execution_id: &str) -> Result<QueryState, StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOutcome {
    pub execution_id: String,
    pub state: QueryState,
    /// Result object written by the engine (meaningful on success).
    pub result_location: String,
}

/// Start a query and poll until it finishes or `policy.timeout` elapses.
///
/// A query that ends `Failed` or `Cancelled` is returned as an outcome, not
/// an error; only engine failures and the timeout are errors.
pub async fn run_query(
    engine: &dyn QueryEngine,
    request: &QueryRequest,
    policy: PollPolicy,
) -> Result<QueryOutcome, StoreError> {
    let execution_id = engine.start_query(request).await?;
    info!(execution_id = %execution_id, database = %request.database, "analytic query started");

    let started = Instant::now();
    let state = loop {
        let state = engine.query_state(&execution_id).await?;
        if state.is_terminal() {
            break state;
        }
        if started.elapsed() >= policy.timeout {
            return Err(StoreError::QueryTimeout {
                execution_id,
                waited: started.elapsed(),
            });
        }
        tokio::time::sleep(policy.interval).await;
    };

    let result_location = format!("{}{}.csv", request.output_location, execution_id);
    match &state {
        QueryState::Succeeded => info!(output = %result_location, "analytic query succeeded"),
        QueryState::Failed(reason) => warn!(
            execution_id = %execution_id,
            reason = reason.as_deref().unwrap_or("unknown"),
            "analytic query failed"
        ),
        other => warn!(
            execution_id = %execution_id,
            state = ?other,
            "analytic query did not succeed"
        ),
    }

    Ok(QueryOutcome {
        execution_id,
        state,
        result_location,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a fixed sequence of states, repeating the last one.
    struct ScriptedEngine {
        states: Mutex<VecDeque<QueryState>>,
        polls: Mutex<usize>,
    }

    impl ScriptedEngine {
        fn new(states: Vec<QueryState>) -> Self {
            Self {
                states: Mutex::new(states.into()),
                polls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl QueryEngine for ScriptedEngine {
        async fn start_query(&self, request: &QueryRequest) -> Result<String, StoreError> {
            if request.database.is_empty() {
                return Err(StoreError::Query("database is required".into()));
            }
            Ok("exec-1".into())
        }

        async fn query_state(&self, _execution_id: &str) -> Result<QueryState, StoreError> {
            *self.polls.lock().unwrap() += 1;
            let mut states = self.states.lock().unwrap();
            if states.len() > 1 {
                Ok(states.pop_front().unwrap())
            } else {
                Ok(states.front().cloned().unwrap_or(QueryState::Running))
            }
        }
    }

    fn request() -> QueryRequest {
        QueryRequest {
            sql: analytic_sql(4, 10),
            database: "samgov_data".into(),
            output_location: results_location("cleo-samgov-etl"),
        }
    }

    fn fast() -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(1),
            timeout: Duration::from_millis(200),
        }
    }

    #[test]
    fn sql_template() {
        let sql = analytic_sql(4, 10);
        assert!(sql.starts_with(
            "SELECT title, solicitationNumber, postedDate, setAside, recencyScore\n"
        ));
        assert!(sql.contains("FROM contracts\n"));
        assert!(sql.contains("WHERE recencyScore >= 4"));
        assert!(sql.contains("ORDER BY postedDate DESC"));
        assert!(sql.ends_with("LIMIT 10;"));

        let sql = analytic_sql(5, 25);
        assert!(sql.contains("WHERE recencyScore >= 5"));
        assert!(sql.ends_with("LIMIT 25;"));
    }

    #[test]
    fn results_under_bucket_prefix() {
        assert_eq!(
            results_location("cleo-samgov-etl"),
            "s3://cleo-samgov-etl/athena_results/"
        );
    }

    #[tokio::test]
    async fn polls_until_succeeded() {
        let engine = ScriptedEngine::new(vec![
            QueryState::Queued,
            QueryState::Running,
            QueryState::Succeeded,
        ]);
        let outcome = run_query(&engine, &request(), fast()).await.unwrap();
        assert_eq!(outcome.state, QueryState::Succeeded);
        assert_eq!(outcome.execution_id, "exec-1");
        assert_eq!(
            outcome.result_location,
            "s3://cleo-samgov-etl/athena_results/exec-1.csv"
        );
        assert_eq!(*engine.polls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn failed_query_is_an_outcome() {
        let engine = ScriptedEngine::new(vec![
            QueryState::Running,
            QueryState::Failed(Some("TABLE_NOT_FOUND".into())),
        ]);
        let outcome = run_query(&engine, &request(), fast()).await.unwrap();
        assert_eq!(outcome.state, QueryState::Failed(Some("TABLE_NOT_FOUND".into())));
    }

    #[tokio::test]
    async fn polling_is_bounded() {
        let engine = ScriptedEngine::new(vec![QueryState::Running]);
        let policy = PollPolicy {
            interval: Duration::from_millis(5),
            timeout: Duration::from_millis(30),
        };
        let result = run_query(&engine, &request(), policy).await;
        match result {
            Err(StoreError::QueryTimeout { execution_id, waited }) => {
                assert_eq!(execution_id, "exec-1");
                assert!(waited >= Duration::from_millis(30));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn start_failure_propagates() {
        let engine = ScriptedEngine::new(vec![QueryState::Succeeded]);
        let mut req = request();
        req.database.clear();
        assert!(matches!(
            run_query(&engine, &req, fast()).await,
            Err(StoreError::Query(_))
        ));
    }
}
