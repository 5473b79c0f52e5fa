use crate::infra::AppState;
use aegis_kyc::identity::IdentityService;
use aegis_kyc::kyc::{KycService, VerificationEngine};
use aegis_kyc::storage::{KycRepository, UserRepository};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

/// API routes plus the operational endpoints.
pub(crate) fn with_kyc_routes<U, K, V>(
    identity: Arc<IdentityService<U>>,
    kyc: Arc<KycService<K, V>>,
) -> axum::Router
where
    U: UserRepository + 'static,
    K: KycRepository + 'static,
    V: VerificationEngine + 'static,
{
    aegis_kyc::api_router(identity, kyc)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{seed_demo_data, DEMO_EMAIL, DEMO_PASSWORD};
    use aegis_kyc::kyc::StubVerificationEngine;
    use aegis_kyc::storage::memory::InMemoryStore;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn app(ready: bool) -> (axum::Router, InMemoryStore) {
        let store = InMemoryStore::default();
        seed_demo_data(&store).expect("seed succeeds");
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };

        let router = with_kyc_routes(
            Arc::new(IdentityService::new(Arc::new(store.clone()))),
            Arc::new(KycService::new(
                Arc::new(store.clone()),
                Arc::new(StubVerificationEngine),
            )),
        )
        .layer(Extension(state));
        (router, store)
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json payload")
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn readiness_follows_flag() {
        let (router, _) = app(false);
        let response = router
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let state = AppState {
            readiness: Arc::new(AtomicBool::new(false)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        state.readiness.store(true, Ordering::Release);
        let response = readiness_endpoint(Extension(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "status": "ready" }));
    }

    #[tokio::test]
    async fn seeded_admin_can_sign_in_and_read_stats() {
        let (router, _) = app(true);

        let login = router
            .clone()
            .oneshot(
                Request::post("/api/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({ "email": DEMO_EMAIL, "password": DEMO_PASSWORD }).to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("route executes");
        assert_eq!(login.status(), StatusCode::OK);
        assert_eq!(json_body(login).await["role"], "admin");

        let stats = router
            .oneshot(
                Request::get("/api/admin/stats")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("route executes");
        let stats = json_body(stats).await;
        assert_eq!(stats["total"], 3);
        assert_eq!(stats["approved"], 1);
    }
}
