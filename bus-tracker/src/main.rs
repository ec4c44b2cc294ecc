use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use bus_tracker::buses::BusInfoAssembler;
use bus_tracker::config::AppConfig;
use bus_tracker::estimator::{RouteEstimator, RouteService};
use bus_tracker::golemio::{GolemioClient, GolemioConfig, MockFeed};
use bus_tracker::kv::{KvStore, MemoryStore, RedisStore};
use bus_tracker::positions::{PositionCache, PositionSource};
use bus_tracker::routing::{RoutingClient, RoutingConfig, StraightLineRouter};
use bus_tracker::trips::{TripSource, TripStore};
use bus_tracker::web::{AppState, create_router};

/// How often to drop idle per-trip locks (24 hours).
const LOCK_PRUNE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    if let Some(dir) = config.mock_data_dir.clone() {
        info!(dir = %dir.display(), "serving mock data");
        let feed = MockFeed::from_dir(&dir)
            .await
            .expect("Failed to load mock data");
        with_store(config, feed, StraightLineRouter::default()).await;
        return;
    }

    if config.golemio_api_key.is_empty() {
        warn!("GOLEMIO_API_KEY not set. Feed calls will fail.");
    }
    if config.routing_api_key.is_empty() {
        warn!("ROUTING_API_KEY not set. Estimates will fail.");
    }

    let feed = GolemioClient::new(GolemioConfig::new(&config.golemio_api_key))
        .expect("Failed to create Golemio client");
    let router = RoutingClient::new(RoutingConfig::new(&config.routing_api_key))
        .expect("Failed to create routing client");

    with_store(config, feed, router).await;
}

/// Pick the cache backend and run.
async fn with_store<F, R>(config: AppConfig, feed: F, router: R)
where
    F: PositionSource + TripSource,
    R: RouteService,
{
    match config.redis_url.clone() {
        Some(url) => {
            let kv = RedisStore::connect(&url)
                .await
                .expect("Failed to connect to Redis");
            run(config, Arc::new(kv), feed, router).await;
        }
        None => {
            info!("REDIS_URL not set, caching in process");
            let kv = Arc::new(MemoryStore::new(&config.cache));
            run(config, kv, feed, router).await;
        }
    }
}

async fn run<K, F, R>(config: AppConfig, kv: Arc<K>, feed: F, router: R)
where
    K: KvStore,
    F: PositionSource + TripSource,
    R: RouteService,
{
    let feed = Arc::new(feed);
    let trips = Arc::new(TripStore::new(Arc::clone(&kv), Arc::clone(&feed)));
    let positions = Arc::new(PositionCache::new(
        kv,
        feed,
        Arc::clone(&trips),
        config.snapshot.clone(),
    ));
    let buses = Arc::new(BusInfoAssembler::new(
        Arc::clone(&positions),
        Arc::clone(&trips),
    ));
    let estimator = RouteEstimator::new(
        Arc::clone(&buses),
        Arc::new(router),
        config.estimator.clone(),
    );

    // Keep the snapshot warm so requests rarely wait on the feed
    if let Some(period) = config.refresh_interval {
        let positions = Arc::clone(&positions);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                match positions.refresh_snapshot().await {
                    Ok(snapshot) => info!(vehicles = snapshot.vehicles.len(), "refreshed positions"),
                    Err(e) => error!(error = %e, "failed to refresh positions"),
                }
            }
        });
    }

    let prune_trips = Arc::clone(&trips);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(LOCK_PRUNE_INTERVAL);
        interval.tick().await; // First tick is immediate, skip it
        loop {
            interval.tick().await;
            let removed = prune_trips.prune_locks();
            info!(removed, remaining = prune_trips.lock_count(), "pruned trip locks");
        }
    });

    let app = create_router(AppState::new(buses, estimator));

    let addr = config.bind_addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    info!("Bus tracker listening on http://{addr}");
    info!("  GET  /health                              - Health check");
    info!("  GET  /buses                               - Enriched vehicle list");
    info!("  GET  /buses/:bus_id/estimate/:stop_id     - Minutes to stop");

    axum::serve(listener, app).await.expect("Server error");
}
