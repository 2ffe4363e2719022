use crate::docs::ApiDoc;
use crate::handlers::{
    AppState, ai_health_check, db_health_check, get_analyze_results, health_check, init_analyze,
    send_file, send_results, service_info,
};
use axum::{
    Json, Router,
    routing::{get, post},
};
use utoipa::OpenApi;

/// 创建分析流程API路由
pub fn create_api_routes() -> Router<AppState> {
    Router::new()
        .route("/initAnalize/{tenant}/{repo}/{uuid}", post(init_analyze)) // 初始化项目
        .route("/sendFile/{uuid}", post(send_file)) // 提交源文件
        .route("/sendResults/{uuid}", post(send_results)) // 提交压测结果并触发分析
        .route("/getAnalizeResults/{uuid}", get(get_analyze_results)) // 查询最终分析
}

/// 创建完整路由（不含中间件层）
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health_check))
        .route("/api/health/db", get(db_health_check))
        .route("/api/health/ai", get(ai_health_check))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .merge(create_api_routes())
        .with_state(state)
}
