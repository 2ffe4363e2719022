use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::response::{ApiResponse, ResponseCode};

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("验证错误: {0}")]
    Validation(String),

    #[error("AI服务错误: {0}")]
    AiService(String),

    #[error("内部错误: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("请求参数错误: {0}")]
    BadRequest(String),

    #[error("资源不存在: {resource}")]
    NotFound { resource: String },

    #[error("资源冲突: {0}")]
    Conflict(String),

    #[error("服务不可用: {0}")]
    ServiceUnavailable(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, message) = match &self {
            AppError::Database(_) => (ResponseCode::DATABASE_ERROR, self.to_string()),
            AppError::Serialization(_) => {
                (ResponseCode::INTERNAL_ERROR, "数据序列化错误".to_string())
            }
            AppError::Io(_) => (ResponseCode::INTERNAL_ERROR, "文件IO错误".to_string()),
            AppError::Config(_) => (ResponseCode::INTERNAL_ERROR, "配置错误".to_string()),
            AppError::Validation(msg) => (ResponseCode::BAD_REQUEST, msg.clone()),
            AppError::AiService(_) => (ResponseCode::AI_SERVICE_ERROR, self.to_string()),
            AppError::Internal(_) => (ResponseCode::INTERNAL_ERROR, "服务器内部错误".to_string()),
            AppError::BadRequest(msg) => (ResponseCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound { resource } => {
                (ResponseCode::NOT_FOUND, format!("资源不存在: {}", resource))
            }
            AppError::Conflict(msg) => (ResponseCode::CONFLICT, msg.clone()),
            AppError::ServiceUnavailable(_) => {
                (ResponseCode::SERVICE_UNAVAILABLE, self.to_string())
            }
        };

        // 记录错误日志
        tracing::error!("应用错误: {}", self);

        ApiResponse::<()>::error(code, message).into_response()
    }
}

/// 应用程序Result类型别名
pub type AppResult<T> = Result<T, AppError>;

/// 错误构造辅助函数
impl AppError {
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        Self::Validation(msg.into())
    }

    pub fn bad_request<T: Into<String>>(msg: T) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found<T: Into<String>>(resource: T) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn service_unavailable<T: Into<String>>(msg: T) -> Self {
        Self::ServiceUnavailable(msg.into())
    }

    pub fn ai_service<T: Into<String>>(msg: T) -> Self {
        Self::AiService(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = AppError::validation("测试验证错误");
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.to_string(), "验证错误: 测试验证错误");
    }

    #[test]
    fn test_not_found_error() {
        let err = AppError::not_found("项目");
        assert!(matches!(err, AppError::NotFound { .. }));
        assert_eq!(err.to_string(), "资源不存在: 项目");
    }

    #[test]
    fn test_conflict_maps_to_409() {
        let response = AppError::conflict("项目已存在").into_response();
        assert_eq!(response.status(), axum::http::StatusCode::CONFLICT);
    }

    #[test]
    fn test_service_unavailable_maps_to_503() {
        let err = AppError::service_unavailable("数据库连接中断");
        assert!(matches!(err, AppError::ServiceUnavailable(_)));
        let response = err.into_response();
        assert_eq!(
            response.status(),
            axum::http::StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
