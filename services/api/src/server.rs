use crate::cli::ServeArgs;
use crate::infra::{seed_demo_data, AppState};
use crate::routes::with_kyc_routes;
use aegis_kyc::config::AppConfig;
use aegis_kyc::error::AppError;
use aegis_kyc::identity::IdentityService;
use aegis_kyc::kyc::{KycService, StubVerificationEngine};
use aegis_kyc::storage::memory::InMemoryStore;
use aegis_kyc::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if args.no_seed {
        config.seed.demo_data = false;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryStore::default());
    if config.seed.demo_data {
        seed_demo_data(store.as_ref())?;
    }

    let identity = Arc::new(IdentityService::new(store.clone()));
    let kyc = Arc::new(KycService::new(store, Arc::new(StubVerificationEngine)));

    let app = with_kyc_routes(identity, kyc)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, seeded = config.seed.demo_data, "kyc service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
