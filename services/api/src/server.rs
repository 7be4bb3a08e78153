use crate::cli::ServeArgs;
use crate::infra::{AppState, GovernanceSeed, InMemoryGovernanceRepository};
use crate::routes::with_governance_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use pricing_governance::config::{AppConfig, DataConfig};
use pricing_governance::error::AppError;
use pricing_governance::telemetry;
use pricing_governance::workflows::governance::GovernanceService;
use pricing_governance::workflows::simulation::{UsageFeed, UsageFeedError};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let repository = Arc::new(load_repository(&config.data)?);
    let feed = Arc::new(load_usage_feed(&config.data.usage_events_path)?);

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        usage_events: feed.len(),
    };

    let governance_service = Arc::new(GovernanceService::new(repository, feed));

    let app = with_governance_routes(governance_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "pricing governance service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn load_repository(data: &DataConfig) -> Result<InMemoryGovernanceRepository, AppError> {
    let Some(path) = &data.seed_path else {
        info!("no governance seed configured, starting with an empty store");
        return Ok(InMemoryGovernanceRepository::default());
    };

    let repository = InMemoryGovernanceRepository::from_seed(GovernanceSeed::from_path(path)?);
    info!(
        path = %path.display(),
        configs = repository.config_count(),
        "governance seed loaded"
    );
    Ok(repository)
}

/// A missing export starts the service with an empty feed; a malformed one fails startup.
fn load_usage_feed(path: &Path) -> Result<UsageFeed, AppError> {
    match UsageFeed::from_path(path) {
        Ok(feed) => {
            info!(path = %path.display(), events = feed.len(), "usage feed loaded");
            Ok(feed)
        }
        Err(UsageFeedError::Io(err)) if err.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "usage export not found, simulating against an empty feed");
            Ok(UsageFeed::default())
        }
        Err(err) => Err(err.into()),
    }
}
