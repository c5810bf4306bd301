use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::error;

use super::super::AppState;
use super::valid_date;

pub async fn get_daily_quote(
    State(state): State<AppState>,
) -> (StatusCode, Json<serde_json::Value>) {
    match state.pipeline.get_today_quote().await {
        Ok(quote) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "data": quote,
                "message": "获取成功"
            })),
        ),
        Err(e) => {
            error!("failed to get today's quote: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "success": false,
                    "message": format!("服务器内部错误: {e}")
                })),
            )
        }
    }
}

pub async fn get_quote_by_date(
    Path(target_date): Path<String>,
    State(state): State<AppState>,
) -> (StatusCode, Json<serde_json::Value>) {
    if !valid_date(&target_date) {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "success": false,
                "message": "日期格式错误，请使用 YYYY-MM-DD 格式"
            })),
        );
    }

    match state.pipeline.store().get_by_date(&target_date).await {
        Ok(Some(quote)) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "data": quote,
                "message": "获取成功"
            })),
        ),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "success": false,
                "message": format!("未找到日期 {target_date} 的语录")
            })),
        ),
        Err(e) => {
            error!("failed to get quote for {target_date}: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "success": false,
                    "message": format!("服务器内部错误: {e}")
                })),
            )
        }
    }
}

#[derive(Deserialize)]
pub struct RecentParams {
    limit: Option<u32>,
}

pub async fn get_recent_quotes(
    Query(params): Query<RecentParams>,
    State(state): State<AppState>,
) -> (StatusCode, Json<serde_json::Value>) {
    match state
        .pipeline
        .store()
        .list_recent(params.limit.unwrap_or(10))
        .await
    {
        Ok(quotes) => {
            let count = quotes.len();
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "success": true,
                    "data": quotes,
                    "count": count,
                    "message": "获取成功"
                })),
            )
        }
        Err(e) => {
            error!("failed to list recent quotes: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "success": false,
                    "message": format!("服务器内部错误: {e}")
                })),
            )
        }
    }
}

#[derive(Deserialize)]
pub struct GenerateParams {
    target_date: String,
}

pub async fn generate_quote(
    Query(params): Query<GenerateParams>,
    State(state): State<AppState>,
) -> (StatusCode, Json<serde_json::Value>) {
    if !valid_date(&params.target_date) {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "success": false,
                "message": "日期格式错误，请使用 YYYY-MM-DD 格式"
            })),
        );
    }

    match state.pipeline.generate_daily_quote(&params.target_date).await {
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
            error!("manual generation for {} failed: {e}", params.target_date);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "success": false,
                    "message": format!("生成语录失败: {e}")
                })),
            )
        }
    }
}
