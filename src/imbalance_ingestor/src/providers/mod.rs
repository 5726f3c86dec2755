//! Document source abstraction.
//!
//! This module defines the [`DocumentSource`] trait, the single seam between the
//! acquisition engine and the network. The engine only ever asks for the raw
//! bytes behind one URL (plus optional query parameters) within a timeout;
//! parsing and decoding happen elsewhere.
//!
//! The production implementation is [`semo_http::SemoHttpSource`]. Tests plug in
//! an in-memory source.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use imbalance_ingestor::providers::{DocumentSource, FetchError, FetchRequest};
//!
//! struct Offline;
//!
//! #[async_trait]
//! impl DocumentSource for Offline {
//!     async fn fetch(&self, request: &FetchRequest) -> Result<Vec<u8>, FetchError> {
//!         imbalance_ingestor::providers::NotFoundSnafu { url: request.display_url() }.fail()
//!     }
//! }
//! ```

pub mod catalog;
pub mod semo_http;

use std::time::Duration;

use async_trait::async_trait;
use snafu::{Backtrace, Snafu};

/// One GET request the engine wants answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    /// Upper bound on the whole request, connect to last byte.
    pub timeout: Duration,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            timeout,
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    /// URL with the query appended unencoded. For logs and lookup keys only.
    pub fn display_url(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }
        let query = self
            .query
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.url, query)
    }
}

/// Trait for fetching raw documents from the market operator.
///
/// Implementations must honour [`FetchRequest::timeout`] and must not retry;
/// the engine treats any error as "this candidate is unavailable" and moves on.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<u8>, FetchError>;
}

/// Errors that can occur during the creation of a provider instance.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The configured user agent contains invalid characters.
    #[snafu(display("Invalid User-Agent header: {source}"))]
    InvalidUserAgent {
        source: reqwest::header::InvalidHeaderValue,
        backtrace: Backtrace,
    },
}

/// A single fetch failed. Never fatal to a resolution.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum FetchError {
    /// Network failure or timeout.
    #[snafu(display("GET {url} failed: {source}"))]
    Request {
        url: String,
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The server answered with a non-success status.
    #[snafu(display("GET {url} returned HTTP {status}"))]
    Status {
        url: String,
        status: u16,
        backtrace: Backtrace,
    },

    /// The document does not exist (used by offline sources).
    #[snafu(display("GET {url}: document not found"))]
    NotFound { url: String, backtrace: Backtrace },

    /// A catalog response could not be decoded.
    #[snafu(display("catalog response from {url} is not valid JSON: {source}"))]
    CatalogDecode {
        url: String,
        source: serde_json::Error,
        backtrace: Backtrace,
    },
}
