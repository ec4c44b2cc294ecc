//! Bing Maps routes HTTP client.

use crate::domain::RouteSegment;
use crate::estimator::RouteService;

use super::error::RoutingError;
use super::types::RouteResponse;

/// Default base URL for the Bing Maps REST services.
const DEFAULT_BASE_URL: &str = "https://dev.virtualearth.net/REST/V1";

/// Configuration for the routing client.
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    /// Bing Maps key, sent as the `key` query parameter
    pub api_key: String,
    /// Base URL for the API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl RoutingConfig {
    /// Create a new config with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Query parameters for a segment: `wp.0=lat,lon`, `wp.1=...` in path order.
pub fn waypoint_query(segment: &RouteSegment) -> Vec<(String, String)> {
    segment
        .request_points()
        .enumerate()
        .map(|(i, p)| {
            (
                format!("wp.{i}"),
                format!("{:.6},{:.6}", p.latitude, p.longitude),
            )
        })
        .collect()
}

/// Driving-route client.
#[derive(Debug, Clone)]
pub struct RoutingClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RoutingClient {
    /// Create a new routing client.
    pub fn new(config: RoutingConfig) -> Result<Self, RoutingError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }

    /// Traffic-aware driving time through the segment, in seconds.
    pub async fn driving_duration(&self, segment: &RouteSegment) -> Result<u32, RoutingError> {
        let url = format!("{}/Routes/Driving", self.base_url);

        let mut query = vec![("key".to_string(), self.api_key.clone())];
        query.extend(waypoint_query(segment));

        let response = self.http.get(&url).query(&query).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RoutingError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        let route: RouteResponse = serde_json::from_str(&body).map_err(|e| RoutingError::Json {
            message: format!("{e} (body: {})", body.chars().take(500).collect::<String>()),
        })?;

        Ok(route.duration_secs())
    }
}

impl RouteService for RoutingClient {
    async fn travel_duration(&self, segment: &RouteSegment) -> Result<u32, RoutingError> {
        self.driving_duration(segment).await
    }
}
