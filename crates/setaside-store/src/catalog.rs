//! Catalog crawler trigger.

use async_trait::async_trait;
use tracing::info;

use crate::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlerStart {
    Started,
    /// A crawl was already in progress; nothing was started.
    AlreadyRunning,
}

/// A catalog service that can (re)build table metadata from stored files.
#[async_trait]
pub trait CatalogCrawler: Send + Sync {
    /// Start the named crawler. An in-progress crawl is reported as
    /// [`CrawlerStart::AlreadyRunning`], never as an error.
    async fn start_crawler(&self, name: &str) -> Result<CrawlerStart, StoreError>;
}

/// Trigger a crawl and log the result.
pub async fn notify(crawler: &dyn CatalogCrawler, name: &str) -> Result<CrawlerStart, StoreError> {
    let start = crawler.start_crawler(name).await?;
    match start {
        CrawlerStart::Started => info!(crawler = name, "catalog crawler triggered"),
        CrawlerStart::AlreadyRunning => info!(crawler = name, "catalog crawler already running"),
    }
    Ok(start)
}
