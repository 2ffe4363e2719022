/*
 * Performance Analyzer - AI-assisted Load Test Analysis Service
 * Copyright (c) 2024 Performance Analyzer Project
 *
 * This work is licensed under CC BY-NC-SA 4.0
 * https://creativecommons.org/licenses/by-nc-sa/4.0/
 */

use axum::http::Method;
use perf_analyzer_backend::{
    config::Config,
    database::Database,
    error::AppResult,
    handlers::AppState,
    repositories::{MemoryProjectStore, PgProjectStore, ProjectStore},
    routes::create_router,
    services::{AiClient, Analyzer},
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> AppResult<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "perf_analyzer_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let mut config = match Config::from_file("config.toml") {
        Ok(config) => {
            tracing::info!("已加载配置文件: config.toml");
            config
        }
        Err(_) => {
            tracing::warn!("未找到配置文件，使用默认配置");
            let default_config = Config::default();
            // 保存默认配置到文件
            if let Err(e) = default_config.save_to_file("config.toml") {
                tracing::warn!("保存默认配置失败: {}", e);
            }
            default_config
        }
    };
    config.apply_env_overrides()?;

    tracing::info!("服务器配置: {}", config.server_addr());

    // 初始化数据库（如果连接失败则使用内存存储继续启动）
    let database = match Database::new(&config.database).await {
        Ok(db) => {
            if let Err(e) = db.verify_connection().await {
                tracing::warn!("数据库验证失败: {}", e);
            }
            match db.migrate().await {
                Ok(()) => Some(db),
                Err(e) => {
                    tracing::warn!("数据库迁移失败，改用内存存储: {}", e);
                    None
                }
            }
        }
        Err(e) => {
            tracing::warn!("数据库连接失败，服务将使用内存存储启动: {}", e);
            None
        }
    };

    let store: Arc<dyn ProjectStore> = match &database {
        Some(db) => Arc::new(PgProjectStore::new(db.clone())),
        None => Arc::new(MemoryProjectStore::new()),
    };

    // 初始化 AI 客户端（不可用时分析自动降级为兜底内容）
    let ai_client = AiClient::new(config.ai.clone())?;
    if let Err(e) = ai_client.health_check().await {
        tracing::warn!("AI 服务暂不可用，分析将使用兜底内容: {}", e);
    }

    // 创建分析服务并启动后台处理器
    let (analyzer, processor) = Analyzer::new(
        store.clone(),
        Arc::new(ai_client.clone()),
        config.analysis.queue_capacity,
    );
    tokio::spawn(processor.start());
    tracing::info!(
        "后台分析处理器已启动，队列容量: {}",
        config.analysis.queue_capacity
    );

    let app_state = AppState {
        store,
        analyzer,
        ai_client,
        database: database.clone(),
        config: config.clone(),
    };

    // 创建CORS中间件
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let app = create_router(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // 启动服务器
    let listener = tokio::net::TcpListener::bind(&config.server_addr()).await?;
    tracing::info!("🚀 服务器启动成功，监听地址: {}", config.server_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(db) = database {
        db.close().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    wait_for_signal(tokio::signal::ctrl_c()).await;
}

/// 等待退出信号；信号监听注册失败时永不返回
async fn wait_for_signal<F>(signal: F)
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::error!("监听退出信号失败，服务将持续运行: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("收到退出信号，正在停止服务...");
}
