//! Minimal client for the Prometheus HTTP query API.

mod client;
mod error;
mod model;
mod response;

pub use client::{PrometheusClient, Range};
pub use error::Error;
pub use model::{Labels, QueryResult, Sample, SamplePair, SampleValue, Scalar, Series, Timestamp};
