/// Authenticated HTTP GET against the upstream provider.
///
/// `Fetch` is the seam between the service and the network: the registry
/// and the pollers only ever see a JSON body or a `FetchError`. The
/// production implementation wraps one shared `reqwest::blocking::Client`,
/// whose connection pool is reused by every poller.

use std::time::Duration;

use log::debug;

use crate::model::FetchError;

/// Something that can GET a URL and return the response body.
pub trait Fetch: Send + Sync {
    fn get(&self, url: &str) -> Result<String, FetchError>;
}

/// `Fetch` over HTTPS with the HydAPI key carried in `X-API-Key`.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    api_key: String,
}

impl HttpFetcher {
    /// Builds a fetcher whose requests fail after `timeout`.
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("nve_exporter/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
        })
    }
}

impl Fetch for HttpFetcher {
    fn get(&self, url: &str) -> Result<String, FetchError> {
        debug!("Getting json data from {}", url);

        let response = self
            .client
            .get(url)
            .header("X-API-Key", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(status.as_u16()));
        }

        response
            .text()
            .map_err(|e| FetchError::Network(format!("failed reading response body: {}", e)))
    }
}
