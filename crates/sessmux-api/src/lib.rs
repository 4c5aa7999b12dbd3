//! Public HTTP surface of sessmux.
//!
//! A single endpoint, `GET /metrics`, runs one aggregation cycle per request
//! and answers with the merged exposition document. Every other method or
//! path is answered with 404.

mod adapter;
mod error;
mod handler;
mod http;

pub use error::ApiError;
pub use handler::ScrapeHandler;
pub use http::{CONTENT_TYPE, HttpApi, METRICS_ROUTE};
