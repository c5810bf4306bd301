use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use super::AppState;
use super::handlers::{admin, quotes};

pub fn build_router(state: AppState, debug: bool) -> Router {
    let router = Router::new()
        .route("/", get(admin::api_info))
        .route("/health", get(admin::health))
        .route("/admin/scheduler", get(admin::scheduler_status))
        .route("/admin/generate", post(admin::manual_generate))
        .route("/api/quote", get(quotes::get_daily_quote))
        .route("/api/quote/generate", post(quotes::generate_quote))
        .route("/api/quote/{target_date}", get(quotes::get_quote_by_date))
        .route("/api/quotes/recent", get(quotes::get_recent_quotes))
        .with_state(state);

    // Cross-origin access is only for local frontend development.
    if debug {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use tokio::sync::Mutex;
    use tokio_util::sync::CancellationToken;
    use tower::util::ServiceExt;

    use crate::core::pipeline::GenerationPipeline;
    use crate::core::provider::PromptPool;
    use crate::core::scheduler::{LogNotifier, QuoteScheduler};
    use crate::core::store::{NewQuote, QuoteStore};

    fn test_state(enable_manual_generation: bool) -> (AppState, QuoteStore) {
        let store = QuoteStore::open_in_memory().unwrap();
        let token = CancellationToken::new();
        let pipeline = Arc::new(GenerationPipeline::new(
            store.clone(),
            None,
            PromptPool::new(vec!["测试提示".to_string()]),
            3,
            Duration::from_millis(1),
            token.clone(),
        ));
        let scheduler = QuoteScheduler::new(
            pipeline.clone(),
            Arc::new(LogNotifier),
            23,
            0,
            token,
        );
        let state = AppState {
            pipeline,
            scheduler: Arc::new(Mutex::new(scheduler)),
            enable_manual_generation,
        };
        (state, store)
    }

    async fn seed(store: &QuoteStore, date: &str, content: &str) {
        store
            .insert(&NewQuote {
                date,
                content,
                author: "作者",
                is_generated: true,
                is_fallback: false,
                attempt_count: 1,
            })
            .await
            .unwrap();
    }

    async fn json_request(
        app: Router,
        method: Method,
        path: &str,
    ) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body_bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json: serde_json::Value =
            serde_json::from_slice(&body_bytes).unwrap_or(serde_json::json!({}));
        (status, json)
    }

    #[tokio::test]
    async fn today_quote_degrades_to_fallback_without_provider() {
        let (state, _store) = test_state(false);
        let app = build_router(state, false);
        let (status, json) = json_request(app, Method::GET, "/api/quote").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["is_fallback"], true);
    }

    #[tokio::test]
    async fn quote_by_date_validates_and_finds() {
        let (state, store) = test_state(false);
        seed(&store, "2025-07-01", "内容").await;

        let app = build_router(state.clone(), false);
        let (status, _) = json_request(app, Method::GET, "/api/quote/not-a-date").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let app = build_router(state.clone(), false);
        let (status, _) = json_request(app, Method::GET, "/api/quote/2025-07-02").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let app = build_router(state, false);
        let (status, json) = json_request(app, Method::GET, "/api/quote/2025-07-01").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["content"], "内容");
    }

    #[tokio::test]
    async fn recent_quotes_respects_limit() {
        let (state, store) = test_state(false);
        for d in ["2025-07-01", "2025-07-02", "2025-07-03"] {
            seed(&store, d, "x").await;
        }

        let app = build_router(state, false);
        let (status, json) =
            json_request(app, Method::GET, "/api/quotes/recent?limit=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["count"], 2);
        assert_eq!(json["data"][0]["date"], "2025-07-03");
    }

    #[tokio::test]
    async fn manual_generation_is_gated_by_toggle() {
        let (state, _store) = test_state(false);
        let app = build_router(state, false);
        let (status, json) = json_request(
            app,
            Method::POST,
            "/admin/generate?target_date=2025-07-03",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], false);

        let (state, store) = test_state(true);
        let app = build_router(state, false);
        let (status, json) = json_request(
            app,
            Method::POST,
            "/admin/generate?target_date=2025-07-03",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert!(store.get_by_date("2025-07-03").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn generate_endpoint_reports_existing_quote() {
        let (state, store) = test_state(false);
        seed(&store, "2025-07-03", "已有").await;

        let app = build_router(state, false);
        let (status, json) = json_request(
            app,
            Method::POST,
            "/api/quote/generate?target_date=2025-07-03",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "already_existed");
        assert_eq!(json["data"]["content"], "已有");
    }

    #[tokio::test]
    async fn health_reports_scheduler_state() {
        let (state, _store) = test_state(false);
        let app = build_router(state, false);
        let (status, json) = json_request(app, Method::GET, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["scheduler"]["is_running"], false);
    }

    #[tokio::test]
    async fn api_route_contract_has_all_expected_paths() {
        let paths = [
            "/",
            "/health",
            "/admin/scheduler",
            "/admin/generate",
            "/api/quote",
            "/api/quote/generate",
            "/api/quote/2025-07-01",
            "/api/quotes/recent",
        ];

        let (state, _store) = test_state(false);
        let app = build_router(state, false);
        for path in paths {
            let req = Request::builder()
                .method(Method::PUT)
                .uri(path)
                .body(Body::empty())
                .expect("request should build");
            let resp = app
                .clone()
                .oneshot(req)
                .await
                .expect("router oneshot should succeed");
            assert_ne!(
                resp.status(),
                StatusCode::NOT_FOUND,
                "Route missing from router: {}",
                path
            );
        }
    }
}
