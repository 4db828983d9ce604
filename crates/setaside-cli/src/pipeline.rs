//! One end-to-end pass: fetch, filter, transform, persist, then the optional
//! publish, catalog and query stages.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use setaside_core::{Transformer, filter_set_asides};
use setaside_fetch::SamClient;
use setaside_store::{
    CatalogCrawler, ObjectStore, QueryEngine, notify, publish, run_query, write_opportunities,
};
use tracing::{error, info, warn};

use crate::config::PipelineConfig;
use crate::display;

/// Status record reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunStatus {
    pub status: Status,
    /// Opportunities that passed the set-aside filter.
    pub record_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

impl RunStatus {
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

/// Service clients for one run. Remote stages whose client is `None` are
/// skipped with a warning, except publishing, which is required when enabled.
pub struct Clients<'a> {
    pub search: &'a SamClient,
    pub store: Option<&'a dyn ObjectStore>,
    pub crawler: Option<&'a dyn CatalogCrawler>,
    pub query: Option<&'a dyn QueryEngine>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Print each transformed opportunity as a card.
    pub print: bool,
}

/// Run the pipeline once. Failures are reported in the returned status
/// rather than as an `Err`.
pub async fn run(
    config: &PipelineConfig,
    clients: &Clients<'_>,
    options: RunOptions,
    now: DateTime<Utc>,
) -> RunStatus {
    match execute(config, clients, options, now).await {
        Ok(record_count) => RunStatus {
            status: Status::Success,
            record_count,
            error: None,
        },
        Err(err) => {
            error!(error = format!("{err:#}"), "pipeline run failed");
            RunStatus {
                status: Status::Error,
                record_count: 0,
                error: Some(format!("{err:#}")),
            }
        }
    }
}

async fn execute(
    config: &PipelineConfig,
    clients: &Clients<'_>,
    options: RunOptions,
    now: DateTime<Utc>,
) -> Result<usize> {
    let outcome = clients
        .search
        .fetch(&config.search_params(), now.date_naive())
        .await
        .context("fetching opportunities")?;
    if outcome.is_partial() {
        warn!(stop = ?outcome.stop, "continuing with partial search results");
    }

    let fetched = outcome.records.len();
    let veteran = filter_set_asides(outcome.records, &config.filter.markers);
    let record_count = veteran.len();
    info!(fetched, kept = record_count, "filtered set-aside opportunities");

    let transformer = Transformer::new(config.naics_table());
    let opportunities = transformer.transform(&veteran, now);
    info!(
        rows = opportunities.len(),
        dropped = record_count - opportunities.len(),
        "transformed opportunities"
    );

    if options.print {
        display::print_opportunities(&opportunities);
    }

    let path = &config.output.path;
    write_opportunities(&opportunities, path)
        .with_context(|| format!("writing {}", path.display()))?;

    if config.publish.enabled {
        let store = clients
            .store
            .context("publishing is enabled but no object store is available")?;
        let dest = config.destination();
        publish(store, path, &dest)
            .await
            .with_context(|| format!("publishing to {}", dest.uri()))?;
    }

    if config.catalog.enabled {
        match clients.crawler {
            Some(crawler) => {
                if let Err(err) = notify(crawler, &config.catalog.crawler).await {
                    warn!(
                        crawler = %config.catalog.crawler,
                        error = %err,
                        "catalog refresh failed"
                    );
                }
            }
            None => warn!("catalog stage enabled but no crawler is available, skipping"),
        }
    }

    if config.query.enabled {
        match clients.query {
            Some(engine) => {
                if let Err(err) =
                    run_query(engine, &config.query_request(), config.poll_policy()).await
                {
                    warn!(error = %err, "analytic query failed");
                }
            }
            None => warn!("query stage enabled but no query engine is available, skipping"),
        }
    }

    Ok(record_count)
}
