use async_trait::async_trait;

use sessmux_core::{Aggregator, SessionDirectory};

use crate::{error::ApiError, handler::ScrapeHandler};

#[async_trait]
impl<D> ScrapeHandler for Aggregator<D>
where
    D: SessionDirectory,
{
    async fn scrape(&self) -> Result<String, ApiError> {
        let scrape = Aggregator::scrape(self).await?;

        let mut body = Vec::new();
        scrape
            .families
            .write_to(&mut body)
            .map_err(|e| ApiError::Render(e.to_string()))?;
        String::from_utf8(body).map_err(|e| ApiError::Render(e.to_string()))
    }
}
