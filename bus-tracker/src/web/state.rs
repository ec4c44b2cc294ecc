//! Application state for the web layer.

use std::sync::Arc;

use crate::buses::BusInfoAssembler;
use crate::estimator::RouteEstimator;

/// Shared application state.
pub struct AppState<K, F, R> {
    /// Enriched vehicle lists
    pub buses: Arc<BusInfoAssembler<K, F>>,

    /// Time-to-stop estimates
    pub estimator: Arc<RouteEstimator<K, F, R>>,
}

impl<K, F, R> AppState<K, F, R> {
    /// Create a new app state.
    pub fn new(buses: Arc<BusInfoAssembler<K, F>>, estimator: RouteEstimator<K, F, R>) -> Self {
        Self {
            buses,
            estimator: Arc::new(estimator),
        }
    }
}

impl<K, F, R> Clone for AppState<K, F, R> {
    fn clone(&self) -> Self {
        Self {
            buses: Arc::clone(&self.buses),
            estimator: Arc::clone(&self.estimator),
        }
    }
}
