use std::num::NonZeroU32;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::{Client, header};
use snafu::ResultExt;

use crate::{
    config::IngestorConfig,
    providers::{
        ClientBuildSnafu, DocumentSource, FetchError, FetchRequest, InvalidUserAgentSnafu,
        ProviderInitError, RequestSnafu, StatusSnafu,
    },
};

const ACCEPT_REPORTS: &str = "application/xml, application/json;q=0.9, */*;q=0.8";

/// HTTP document source for the market operator's report site.
///
/// Every request carries a browser-like `User-Agent`; the remote rejects
/// unidentified clients. Requests are paced by a direct rate limiter so the
/// sequential candidate scan cannot burst against the service.
pub struct SemoHttpSource {
    client: Client,
    limiter: DefaultDirectRateLimiter,
}

impl SemoHttpSource {
    /// Creates a new source from the user agent and request rate in `config`.
    pub fn new(config: &IngestorConfig) -> Result<Self, ProviderInitError> {
        let client = Client::builder()
            .default_headers(default_headers(config)?)
            .build()
            .context(ClientBuildSnafu)?;

        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(nonzero!(1u32));

        Ok(Self {
            client,
            limiter: RateLimiter::direct(Quota::per_second(per_second)),
        })
    }
}

/// Headers sent with every request: the configured `User-Agent` and an
/// `Accept` preferring XML reports over JSON catalog pages.
fn default_headers(config: &IngestorConfig) -> Result<header::HeaderMap, ProviderInitError> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::USER_AGENT,
        header::HeaderValue::from_str(&config.user_agent).context(InvalidUserAgentSnafu)?,
    );
    headers.insert(header::ACCEPT, header::HeaderValue::from_static(ACCEPT_REPORTS));
    Ok(headers)
}

#[async_trait]
impl DocumentSource for SemoHttpSource {
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<u8>, FetchError> {
        self.limiter.until_ready().await;

        let url = request.display_url();
        let response = self
            .client
            .get(&request.url)
            .query(&request.query)
            .timeout(request.timeout)
            .send()
            .await
            .context(RequestSnafu { url: &url })?;

        let status = response.status();
        if !status.is_success() {
            return StatusSnafu {
                url,
                status: status.as_u16(),
            }
            .fail();
        }

        let body = response.bytes().await.context(RequestSnafu { url })?;
        Ok(body.to_vec())
    }
}
