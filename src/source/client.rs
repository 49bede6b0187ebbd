use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::Value;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

use super::payload::ResourcePage;
use super::rate_limit::RateLimiter;
use crate::error::{ImportError, ImportResult};

pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";

/// Where the importers read from.
///
/// `resource` is the list endpoint name (`move`, `pokemon-species`, ...).
pub trait Source {
    /// One page of `{count, results}` for a resource
    fn fetch_page(&self, resource: &str, limit: u32, offset: u64) -> ImportResult<ResourcePage>;

    /// The raw detail document of one record
    fn fetch_detail(&self, resource: &str, id: i64) -> ImportResult<Value>;
}

/// Connection and pacing settings for [`PokeApiClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Minimum gap between two requests
    pub delay: Duration,
    /// Extra attempts for transient failures (0 = fail on first error)
    pub retries: u32,
    /// Backoff before the first retry, doubled for each further one
    pub retry_backoff: Duration,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            delay: Duration::from_millis(100),
            retries: 0,
            retry_backoff: Duration::from_millis(500),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Outcome of a single HTTP attempt that did not produce a document
enum AttemptError {
    /// Worth retrying: connect/timeout errors, 429 and 5xx
    Transient(String),
    Fatal(String),
}

/// Blocking, rate-limited PokeAPI client
pub struct PokeApiClient {
    client: Client,
    base_url: String,
    limiter: RateLimiter,
    retries: u32,
    retry_backoff: Duration,
}

impl PokeApiClient {
    pub fn new(config: ClientConfig) -> ImportResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("pokedex-sync/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(|e| ImportError::InvalidConfig(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            limiter: RateLimiter::new(config.delay),
            retries: config.retries,
            retry_backoff: config.retry_backoff,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` (relative to the base URL) and parse it as JSON
    fn get_json(&self, path: &str) -> ImportResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt: u32 = 0;

        loop {
            self.limiter.wait();
            debug!(%url, attempt, "GET");

            match self.try_get(&url) {
                Ok(value) => return Ok(value),
                Err(AttemptError::Transient(message)) if attempt < self.retries => {
                    let backoff = self.retry_backoff.saturating_mul(2u32.saturating_pow(attempt));
                    attempt += 1;
                    warn!(
                        %url,
                        attempt,
                        retries = self.retries,
                        "transient failure ({}), retrying in {:?}",
                        message,
                        backoff
                    );
                    thread::sleep(backoff);
                }
                Err(AttemptError::Transient(message)) | Err(AttemptError::Fatal(message)) => {
                    return Err(ImportError::fetch(path, message));
                }
            }
        }
    }

    fn try_get(&self, url: &str) -> Result<Value, AttemptError> {
        let response = self.client.get(url).send().map_err(|e| {
            if e.is_timeout() || e.is_connect() || e.is_request() {
                AttemptError::Transient(e.to_string())
            } else {
                AttemptError::Fatal(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = format!("HTTP {}", status);
            return Err(if is_transient_status(status) {
                AttemptError::Transient(message)
            } else {
                AttemptError::Fatal(message)
            });
        }

        response
            .json::<Value>()
            .map_err(|e| AttemptError::Fatal(format!("Failed to parse response: {}", e)))
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

impl Source for PokeApiClient {
    fn fetch_page(&self, resource: &str, limit: u32, offset: u64) -> ImportResult<ResourcePage> {
        if limit == 0 {
            return Err(ImportError::InvalidConfig("page limit must be > 0".into()));
        }
        let path = page_path(resource, limit, offset);
        let value = self.get_json(&path)?;
        serde_json::from_value(value)
            .map_err(|e| ImportError::format(format!("invalid page for {}: {}", path, e)))
    }

    fn fetch_detail(&self, resource: &str, id: i64) -> ImportResult<Value> {
        self.get_json(&detail_path(resource, id))
    }
}

pub fn page_path(resource: &str, limit: u32, offset: u64) -> String {
    format!("/{}?limit={}&offset={}", resource, limit, offset)
}

pub fn detail_path(resource: &str, id: i64) -> String {
    format!("/{}/{}", resource, id)
}
