use crate::models::RawListing;
use anyhow::Result;
use async_trait::async_trait;

/// Common trait for listing sources feeding the pipeline
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Collect the raw fields of every listing the source currently shows
    async fn scrape(&self) -> Result<Vec<RawListing>>;

    /// Get the name of the listing source
    fn source_name(&self) -> &'static str;
}
