use async_trait::async_trait;

use crate::error::ApiError;

/// Produces the merged metrics document for one request.
///
/// Implemented by [`sessmux_core::Aggregator`]; tests and embedders can plug
/// in their own source.
#[async_trait]
pub trait ScrapeHandler: Send + Sync + 'static {
    /// Runs one aggregation cycle and returns the exposition text.
    async fn scrape(&self) -> Result<String, ApiError>;
}
