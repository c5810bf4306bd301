use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::error;

use super::super::AppState;
use super::valid_date;

pub async fn api_info() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "每日一言系统 API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "专注于提供高质量哲学家名言的API服务",
        "endpoints": {
            "today": "GET /api/quote",
            "by_date": "GET /api/quote/{date}",
            "recent": "GET /api/quotes/recent",
            "health": "GET /health"
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let scheduler = state.scheduler.lock().await.status().await;
    Json(serde_json::json!({
        "status": "healthy",
        "service": "每日一言系统",
        "version": env!("CARGO_PKG_VERSION"),
        "scheduler": scheduler,
        "database": "connected"
    }))
}

pub async fn scheduler_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let status = state.scheduler.lock().await.status().await;
    Json(serde_json::json!(status))
}

#[derive(Deserialize)]
pub struct ManualGenerateParams {
    target_date: String,
}

pub async fn manual_generate(
    Query(params): Query<ManualGenerateParams>,
    State(state): State<AppState>,
) -> (StatusCode, Json<serde_json::Value>) {
    if !state.enable_manual_generation {
        return (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": false,
                "message": "手动生成功能已被禁用。如需启用，请设置 ENABLE_MANUAL_GENERATION=true"
            })),
        );
    }

    if !valid_date(&params.target_date) {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "success": false,
                "message": "日期格式错误，请使用 YYYY-MM-DD 格式"
            })),
        );
    }

    let trigger = {
        let scheduler = state.scheduler.lock().await;
        scheduler.manual_trigger(&params.target_date).await
    };
    match trigger {
        Ok(outcome) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "status": outcome.status,
                "data": outcome.quote,
                "message": outcome.message
            })),
        ),
        Err(e) => {
            error!("manual trigger for {} failed: {e}", params.target_date);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "success": false,
                    "message": format!("手动生成失败: {e}")
                })),
            )
        }
    }
}
