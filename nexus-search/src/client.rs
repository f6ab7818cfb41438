//! Search API client

use async_trait::async_trait;
use nexus_core::{ErrorContext, NexusError, NexusResult, SearchConfig, SearchResult};
use tracing::{debug, error, info, warn};

use crate::librex::{normalize_results, parse_body};

/// Configuration for the search client
#[derive(Debug, Clone)]
pub struct SearchClientConfig {
    /// Endpoints tried in order; later ones are fallbacks
    pub endpoints: Vec<String>,
    /// User agent string
    pub user_agent: String,
    /// Request timeout in seconds. `None` leaves requests unbounded.
    pub timeout_seconds: Option<u64>,
}

impl Default for SearchClientConfig {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

impl From<&SearchConfig> for SearchClientConfig {
    fn from(config: &SearchConfig) -> Self {
        Self {
            endpoints: config.endpoints.clone(),
            user_agent: config.user_agent.clone(),
            timeout_seconds: config.timeout_seconds,
        }
    }
}

impl SearchClientConfig {
    /// Configuration with the given endpoints and default settings otherwise
    pub fn with_endpoints<I, S>(endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            endpoints: endpoints.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = Some(timeout_seconds);
        self
    }
}

/// Trait for web search backends
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Fetch one page of results for `query`. `page` is passed to the backend unchecked.
    async fn fetch_results(&self, query: &str, page: u32) -> NexusResult<Vec<SearchResult>>;

    /// Fetch the first page of results
    async fn fetch_first_page(&self, query: &str) -> NexusResult<Vec<SearchResult>> {
        self.fetch_results(query, 1).await
    }
}

/// Client for LibreX `api.php` instances
pub struct LibreXClient {
    client: reqwest::Client,
    config: SearchClientConfig,
}

impl LibreXClient {
    /// Create a new LibreX client
    pub fn new(config: SearchClientConfig) -> NexusResult<Self> {
        let client = create_http_client(&config)?;

        info!(
            "Created LibreX client with {} endpoint(s)",
            config.endpoints.len()
        );

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &SearchClientConfig {
        &self.config
    }

    /// Walk the endpoint list until one answers with a success status
    async fn fetch_from_endpoints(&self, query: &str, page: u32) -> NexusResult<Vec<SearchResult>> {
        let page_param = page.to_string();
        let params = [("q", query), ("format", "json"), ("page", page_param.as_str())];

        let mut last_status = None;

        for (attempt, endpoint) in self.config.endpoints.iter().enumerate() {
            if attempt > 0 {
                warn!("Search endpoint failed, trying fallback {}", endpoint);
            }

            debug!("Making search request to: {}", endpoint);

            let response = self
                .client
                .get(endpoint)
                .query(&params)
                .send()
                .await
                .map_err(|e| classify_send_error(e, endpoint))?;

            let status = response.status();
            if !status.is_success() {
                warn!("Search endpoint {} returned status {}", endpoint, status);
                last_status = Some(status);
                continue;
            }

            let body = response.text().await.map_err(|e| NexusError::Search {
                message: format!("Failed to read response body from {}: {}", endpoint, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("librex_client")
                    .with_operation("read_body")
                    .with_metadata("endpoint", endpoint),
            })?;

            let entries = parse_body(&body).map_err(|e| NexusError::Search {
                message: format!("Failed to parse search results from {}: {}", endpoint, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("librex_client")
                    .with_operation("parse_results")
                    .with_metadata("endpoint", endpoint),
            })?;

            let results = normalize_results(entries, page);
            debug!("Endpoint {} returned {} usable results", endpoint, results.len());
            return Ok(results);
        }

        let message = match last_status {
            Some(status) => format!(
                "Search API request failed on all {} endpoint(s), last status {}",
                self.config.endpoints.len(),
                status.as_u16()
            ),
            None => "No search endpoints configured".to_string(),
        };

        Err(NexusError::Search {
            message,
            source: None,
            context: ErrorContext::new("librex_client")
                .with_operation("fetch_from_endpoints")
                .with_suggestion("The search instances may be down; try again later"),
        })
    }
}

#[async_trait]
impl SearchProvider for LibreXClient {
    async fn fetch_results(&self, query: &str, page: u32) -> NexusResult<Vec<SearchResult>> {
        info!("Fetching web results for: \"{}\", page: {}", query, page);

        match self.fetch_from_endpoints(query, page).await {
            Ok(results) => Ok(results),
            Err(e @ NexusError::Connectivity { .. }) => {
                error!("Error fetching web search results: {}", e);
                Err(e)
            }
            Err(e) => {
                error!("Error fetching web search results: {}", e);
                Err(NexusError::Search {
                    message: "Failed to fetch web search results from the search API".to_string(),
                    source: Some(Box::new(e)),
                    context: ErrorContext::new("librex_client").with_operation("fetch_results"),
                })
            }
        }
    }
}

/// Transport failures mean the API was never reached; anything else is a request failure
fn classify_send_error(e: reqwest::Error, endpoint: &str) -> NexusError {
    if e.is_builder() {
        return NexusError::Search {
            message: format!("Invalid search request for {}: {}", endpoint, e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("librex_client")
                .with_operation("send")
                .with_metadata("endpoint", endpoint)
                .with_suggestion("Check search.endpoints in your configuration"),
        };
    }

    NexusError::Connectivity {
        message: format!(
            "Network error connecting to the search API at {}. The service may be temporarily down.",
            endpoint
        ),
        source: Some(Box::new(e)),
        context: ErrorContext::new("librex_client")
            .with_operation("send")
            .with_metadata("endpoint", endpoint)
            .with_suggestion("Check network connectivity"),
    }
}

/// Helper function to create HTTP client with common configuration
pub(crate) fn create_http_client(config: &SearchClientConfig) -> NexusResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());

    if let Some(timeout_seconds) = config.timeout_seconds {
        builder = builder.timeout(std::time::Duration::from_secs(timeout_seconds));
    }

    builder.build().map_err(|e| NexusError::Internal {
        message: format!("Failed to create HTTP client: {}", e),
        source: Some(Box::new(e)),
        context: ErrorContext::new("http_client").with_operation("create_client"),
    })
}
