//! Golemio HTTP client.
//!
//! Handles authentication, status classification and conversion to domain
//! types. Implements both feed traits the cache layer consumes.

use reqwest::Url;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;

use crate::domain::TripMetadata;
use crate::positions::{PositionPage, PositionSource};
use crate::trips::TripSource;

use super::convert::{convert_positions, convert_trip};
use super::error::FeedError;
use super::types::{GolemioTrip, PositionResponse};

/// Default base URL for the Golemio API.
const DEFAULT_BASE_URL: &str = "https://api.golemio.cz/v1";

/// Configuration for the Golemio client.
#[derive(Debug, Clone)]
pub struct GolemioConfig {
    /// Access token sent as `x-access-token`
    pub api_key: String,
    /// Base URL for the API (defaults to production Golemio)
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl GolemioConfig {
    /// Create a new config with the given access token.
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

/// Golemio API client.
#[derive(Debug, Clone)]
pub struct GolemioClient {
    http: reqwest::Client,
    base_url: String,
}

impl GolemioClient {
    /// Create a new Golemio client with the given configuration.
    pub fn new(config: GolemioConfig) -> Result<Self, FeedError> {
        let mut headers = HeaderMap::new();

        let token = HeaderValue::from_str(&config.api_key).map_err(|_| FeedError::Api {
            status: 0,
            message: "Invalid access token format".to_string(),
        })?;
        headers.insert(HeaderName::from_static("x-access-token"), token);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch one page of vehicle positions.
    pub async fn fetch_positions_page(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<PositionPage, FeedError> {
        let url = self.endpoint(&["vehiclepositions"])?;
        let query = [("limit", limit.to_string()), ("offset", offset.to_string())];

        let response: PositionResponse = self.get_json(url, &query, "vehicle positions").await?;
        let received = response.features.len();

        Ok(PositionPage {
            positions: convert_positions(response.features),
            received,
        })
    }

    /// Fetch one trip with its stops.
    pub async fn fetch_trip_details(&self, trip_id: &str) -> Result<TripMetadata, FeedError> {
        let url = self.endpoint(&["gtfs", "trips", trip_id])?;
        let query = [("includeStops", "true".to_string())];

        let trip: GolemioTrip = self
            .get_json(url, &query, &format!("trip {trip_id}"))
            .await?;

        Ok(convert_trip(trip))
    }

    /// Base URL with `segments` appended, each percent-encoded as a single
    /// path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, FeedError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| FeedError::InvalidUrl {
            message: format!("{}: {e}", self.base_url),
        })?;

        url.path_segments_mut()
            .map_err(|_| FeedError::InvalidUrl {
                message: format!("{} cannot take a path", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<T, FeedError> {
        let response = self.http.get(url).query(query).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(FeedError::Unauthorized);
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FeedError::NotFound(what.to_string()));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| FeedError::Json {
            message: format!("{e} (body: {})", body.chars().take(500).collect::<String>()),
        })
    }
}

impl PositionSource for GolemioClient {
    async fn fetch_positions(&self, limit: usize, offset: usize) -> Result<PositionPage, FeedError> {
        self.fetch_positions_page(limit, offset).await
    }
}

impl TripSource for GolemioClient {
    async fn fetch_trip(&self, trip_id: &str) -> Result<TripMetadata, FeedError> {
        self.fetch_trip_details(trip_id).await
    }
}
