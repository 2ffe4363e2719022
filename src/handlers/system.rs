use crate::{
    handlers::AppState,
    response::{ApiResponse, ResponseCode},
};
use axum::{extract::State, response::Json};
use serde_json::{Value as JsonValue, json};

/// 服务说明
pub async fn service_info(State(state): State<AppState>) -> Json<ApiResponse<JsonValue>> {
    let storage = if state.database.is_some() {
        "postgres"
    } else {
        "memory"
    };

    Json(ApiResponse::success(json!({
        "name": "Performance Analyzer Backend",
        "version": env!("CARGO_PKG_VERSION"),
        "storage": storage,
        "endpoints": [
            "POST /initAnalize/{tenant}/{repo}/{uuid}",
            "POST /sendFile/{uuid}",
            "POST /sendResults/{uuid}",
            "GET /getAnalizeResults/{uuid}",
        ],
    })))
}

/// 健康检查
#[utoipa::path(
    get,
    path = "/health",
    tag = "系统监控",
    responses((status = 200, description = "服务正常"))
)]
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<JsonValue>> {
    let store = match state.store.health_check().await {
        Ok(true) => "healthy",
        _ => "unhealthy",
    };

    Json(ApiResponse::success(json!({
        "status": "ok",
        "store": store,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "queued_analyses": state.analyzer.queue().len(),
        "queue_capacity": state.config.analysis.queue_capacity,
    })))
}

/// 数据库健康检查
#[utoipa::path(
    get,
    path = "/api/health/db",
    tag = "系统监控",
    responses(
        (status = 200, description = "数据库正常"),
        (status = 503, description = "数据库不可用")
    )
)]
pub async fn db_health_check(State(state): State<AppState>) -> ApiResponse<JsonValue> {
    match &state.database {
        Some(db) => match db.health_check().await {
            Ok(true) => ApiResponse::success(json!({
                "database": "healthy",
                "timestamp": chrono::Utc::now().to_rfc3339(),
            })),
            Ok(false) => ApiResponse::error_with_data(
                ResponseCode::SERVICE_UNAVAILABLE,
                "数据库连接异常".to_string(),
                json!({"status": "unhealthy"}),
            ),
            Err(e) => {
                tracing::error!("数据库健康检查失败: {}", e);
                ApiResponse::error_with_data(
                    ResponseCode::SERVICE_UNAVAILABLE,
                    format!("数据库健康检查失败: {}", e),
                    json!({"status": "error"}),
                )
            }
        },
        None => ApiResponse::error_with_data(
            ResponseCode::SERVICE_UNAVAILABLE,
            "数据库未配置或连接失败，当前使用内存存储".to_string(),
            json!({"status": "unavailable"}),
        ),
    }
}

/// AI 服务健康检查
#[utoipa::path(
    get,
    path = "/api/health/ai",
    tag = "系统监控",
    responses(
        (status = 200, description = "AI 服务正常"),
        (status = 503, description = "AI 服务不可用，分析将使用兜底内容")
    )
)]
pub async fn ai_health_check(State(state): State<AppState>) -> ApiResponse<JsonValue> {
    match state.ai_client.health_check().await {
        Ok(()) => ApiResponse::success(json!({
            "ai": "healthy",
            "base_url": state.ai_client.base_url(),
        })),
        Err(e) => {
            tracing::warn!("AI 服务健康检查失败: {}", e);
            ApiResponse::error_with_data(
                ResponseCode::SERVICE_UNAVAILABLE,
                e.to_string(),
                json!({"status": "unavailable", "fallback": true}),
            )
        }
    }
}
