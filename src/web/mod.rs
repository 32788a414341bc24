pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod ui;

use crate::{models::ModelManager, Config, Result};
use axum::{
    extract::DefaultBodyLimit,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer};

pub async fn serve(config: Config) -> Result<()> {
    // 初始化模型管理器
    ModelManager::init(config.clone())?;

    // 构建应用路由
    let app = create_app(config.clone());

    // 解析绑定地址
    let addr: SocketAddr = config.bind_addr.parse().map_err(|e| {
        crate::utils::error::WayangError::Config(format!(
            "Invalid bind address {}: {}",
            config.bind_addr, e
        ))
    })?;

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  POST /classify        - JSON base64 upload");
    tracing::info!("  POST /classify/upload - Multipart file upload");
    tracing::info!("  GET  /                - Web UI");
    tracing::info!("  GET  /health          - Health check");
    tracing::info!("  GET  /api/info        - Service information");
    tracing::info!("  GET  /api/labels      - Class labels");

    // 启动服务器
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        crate::utils::error::WayangError::Internal(format!(
            "Failed to bind to address {}: {}",
            addr, e
        ))
    })?;

    axum::serve(listener, app).await.map_err(|e| {
        crate::utils::error::WayangError::Internal(format!("Server failed to start: {}", e))
    })?;

    Ok(())
}

fn create_app(config: Config) -> Router {
    let max_request_size = config.server_config.max_request_size;
    let request_timeout = config.server_config.request_timeout;

    Router::new()
        // 分类API路由
        .route("/classify", post(handlers::classify_json_handler))
        .route("/classify/upload", post(handlers::classify_upload_handler))
        // Web UI路由
        .route("/", get(ui::index_handler))
        // 系统路由
        .route("/health", get(health_handler))
        .route("/api/info", get(info_handler))
        .route("/api/labels", get(labels_handler))
        // 中间件 - 分层模式避免复杂类型嵌套
        .layer(axum::middleware::from_fn(middleware::request_logging))
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(DefaultBodyLimit::max(max_request_size))
        .layer(RequestBodyLimitLayer::new(max_request_size))
        .layer(TimeoutLayer::new(Duration::from_secs(request_timeout)))
        .layer(CorsLayer::permissive())
        // 传递配置到处理器
        .with_state(config)
}

/// 健康检查端点
async fn health_handler() -> Result<Json<serde_json::Value>> {
    crate::models::health_check()?;

    Ok(Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    })))
}

/// 服务信息端点
async fn info_handler() -> Result<Json<serde_json::Value>> {
    let stats = crate::models::get_model_stats()?;
    let available_models = stats.loaded_models.clone();

    Ok(Json(json!({
        "service": "Wayang Classification Service",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "models": stats,
        "features": {
            "dual_upload_modes": true,
            "multi_model_selection": true,
            "available_models": available_models,
        }
    })))
}

/// 类别标签端点，UI的角色画廊从这里取数据
async fn labels_handler() -> Result<Json<serde_json::Value>> {
    let labels = crate::models::get_labels()?;

    Ok(Json(json!({
        "labels": labels.names(),
        "count": labels.len(),
    })))
}
