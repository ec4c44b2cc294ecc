//! Bing Maps routes response DTOs.
//!
//! Only the parts needed for the duration are modelled.

use serde::Deserialize;

/// Top-level routes response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResponse {
    #[serde(default)]
    pub resource_sets: Vec<RouteResourceSet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteResourceSet {
    #[serde(default)]
    pub resources: Vec<RouteResource>,
}

/// One computed route.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResource {
    /// Travel time with current traffic, in seconds.
    pub travel_duration_traffic: Option<f64>,
}

impl RouteResponse {
    /// Duration of the first route, in whole seconds. A response without a
    /// route counts as zero.
    pub fn duration_secs(&self) -> u32 {
        self.resource_sets
            .first()
            .and_then(|set| set.resources.first())
            .and_then(|r| r.travel_duration_traffic)
            .map(|secs| secs.max(0.0).round() as u32)
            .unwrap_or(0)
    }
}
