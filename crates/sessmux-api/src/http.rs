use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::any,
};

use crate::handler::ScrapeHandler;

/// Path of the merged metrics endpoint.
pub const METRICS_ROUTE: &str = "/metrics";

/// Content type of the merged document.
pub const CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// HTTP API service builder.
pub struct HttpApi<H> {
    handler: Arc<H>,
}

impl<H> HttpApi<H>
where
    H: ScrapeHandler,
{
    pub fn new(handler: Arc<H>) -> Self {
        Self { handler }
    }

    /// Builds the router.
    ///
    /// Routes:
    /// - GET /metrics - merged metrics of every source
    /// - anything else - 404
    pub fn router(self) -> Router {
        Router::new()
            .route(METRICS_ROUTE, any(metrics::<H>))
            .fallback(not_found)
            .with_state(self.handler)
    }
}

/// ANY /metrics
async fn metrics<H>(State(handler): State<Arc<H>>, method: Method) -> Response
where
    H: ScrapeHandler,
{
    if method != Method::GET {
        return StatusCode::NOT_FOUND.into_response();
    }

    match handler.scrape().await {
        Ok(body) => ([(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
