//! Time-to-stop estimation.
//!
//! The remaining path of a vehicle is split into waypoint-bounded segments
//! (see [`plan_route`]); each segment is one routing request. Requests run
//! concurrently and their traffic-aware durations are summed. A single failed
//! request fails the whole estimate: a partial sum would silently understate
//! the travel time.

mod error;
mod segment;

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::buses::BusInfoAssembler;
use crate::domain::{Coordinate, Estimate, RouteSegment};
use crate::kv::KvStore;
use crate::positions::PositionSource;
use crate::routing::RoutingError;
use crate::trips::TripSource;

pub use error::EstimateError;
pub use segment::{plan_route, split_path};

/// Routing backend answering one segment at a time.
pub trait RouteService: Send + Sync + 'static {
    /// Travel duration with traffic, in whole seconds.
    fn travel_duration(
        &self,
        segment: &RouteSegment,
    ) -> impl Future<Output = Result<u32, RoutingError>> + Send;
}

/// Configuration for the estimator.
#[derive(Debug, Clone)]
pub struct EstimatorConfig {
    /// Upper bound on the whole routing fan-out.
    pub deadline: Duration,
}

impl EstimatorConfig {
    /// Set the upper bound on one estimate.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(20),
        }
    }
}

/// Accumulated outcome of the per-segment requests.
#[derive(Debug, Default)]
struct Tally {
    minutes: f64,
    failed: bool,
}

/// Estimates how long a vehicle needs to reach a stop.
pub struct RouteEstimator<K, F, R> {
    buses: Arc<BusInfoAssembler<K, F>>,
    router: Arc<R>,
    config: EstimatorConfig,
}

impl<K, F, R> RouteEstimator<K, F, R>
where
    K: KvStore,
    F: PositionSource + TripSource,
    R: RouteService,
{
    /// Create a new estimator over the assembler's vehicles.
    pub fn new(buses: Arc<BusInfoAssembler<K, F>>, router: Arc<R>, config: EstimatorConfig) -> Self {
        Self {
            buses,
            router,
            config,
        }
    }

    /// Estimate the minutes until bus `bus_id` reaches stop `stop_id`.
    pub async fn estimate_time_to_stop(
        &self,
        bus_id: &str,
        stop_id: &str,
    ) -> Result<Estimate, EstimateError> {
        let vehicle = self
            .buses
            .find_vehicle(bus_id)
            .await?
            .ok_or(EstimateError::BusNotFound)?;

        let start = Coordinate::new(vehicle.latitude, vehicle.longitude);
        let segments = plan_route(start, &vehicle.stops, &vehicle.next_stop_id, stop_id)?;

        if segments.is_empty() {
            return Err(EstimateError::UnspecifiedEstimate);
        }

        debug!(bus_id, stop_id, segments = segments.len(), "requesting route estimate");
        let minutes = self.sum_durations(segments).await?;

        Ok(Estimate::new(minutes, bus_id, stop_id))
    }

    /// Route every segment concurrently and add up the results.
    ///
    /// All requests are awaited before deciding, so a failure is seen no
    /// matter which request it came from or when it finished.
    async fn sum_durations(&self, segments: Vec<RouteSegment>) -> Result<f64, EstimateError> {
        let tally = Arc::new(Mutex::new(Tally::default()));
        let mut tasks = JoinSet::new();

        for (index, segment) in segments.into_iter().enumerate() {
            let router = Arc::clone(&self.router);
            let tally = Arc::clone(&tally);

            tasks.spawn(async move {
                let outcome = router.travel_duration(&segment).await;
                if let Err(e) = &outcome {
                    warn!(segment = index, error = %e, "route segment failed");
                }

                let mut tally = tally.lock().unwrap_or_else(PoisonError::into_inner);
                match outcome {
                    Ok(0) => {}
                    Ok(secs) => tally.minutes += f64::from(secs) / 60.0,
                    Err(_) => tally.failed = true,
                }
            });
        }

        let joined = tokio::time::timeout(self.config.deadline, async {
            while let Some(result) = tasks.join_next().await {
                if let Err(e) = result {
                    warn!(error = %e, "route segment task did not complete");
                    tally.lock().unwrap_or_else(PoisonError::into_inner).failed = true;
                }
            }
        })
        .await;

        if joined.is_err() {
            warn!(deadline = ?self.config.deadline, "route estimate timed out");
            tasks.abort_all();
            return Err(EstimateError::UnspecifiedEstimate);
        }

        let tally = tally.lock().unwrap_or_else(PoisonError::into_inner);
        if tally.failed {
            Err(EstimateError::UnspecifiedEstimate)
        } else {
            Ok(tally.minutes)
        }
    }
}
