use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 统一API响应格式
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// 业务响应码
    pub code: i32,
    /// 响应消息
    pub msg: String,
    /// 响应数据
    pub data: Option<T>,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self {
            code: ResponseCode::SUCCESS,
            msg: "操作成功".to_string(),
            data: Some(data),
        }
    }

    /// 创建成功响应（自定义消息）
    pub fn success_with_message(data: T, msg: String) -> Self {
        Self {
            code: ResponseCode::SUCCESS,
            msg,
            data: Some(data),
        }
    }

    /// 创建带自定义响应码的响应（201/202 等）
    pub fn with_code(code: i32, data: T, msg: String) -> Self {
        Self {
            code,
            msg,
            data: Some(data),
        }
    }

    /// 创建错误响应
    pub fn error(code: i32, msg: String) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg,
            data: None,
        }
    }

    /// 创建错误响应（带数据）
    pub fn error_with_data(code: i32, msg: String, data: T) -> Self {
        Self {
            code,
            msg,
            data: Some(data),
        }
    }
}

impl<T> IntoResponse for ApiResponse<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        // 根据业务响应码确定HTTP状态码
        let status = match self.code {
            ResponseCode::SUCCESS => StatusCode::OK,
            ResponseCode::CREATED => StatusCode::CREATED,
            ResponseCode::ACCEPTED => StatusCode::ACCEPTED,
            ResponseCode::BAD_REQUEST => StatusCode::BAD_REQUEST,
            ResponseCode::NOT_FOUND => StatusCode::NOT_FOUND,
            ResponseCode::CONFLICT => StatusCode::CONFLICT,
            ResponseCode::SERVICE_UNAVAILABLE => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

/// 业务响应码常量
pub struct ResponseCode;

impl ResponseCode {
    /// 成功响应码 2xx
    pub const SUCCESS: i32 = 200;
    pub const CREATED: i32 = 201;
    pub const ACCEPTED: i32 = 202;

    /// 客户端错误 4xx
    pub const BAD_REQUEST: i32 = 400;
    pub const NOT_FOUND: i32 = 404;
    pub const CONFLICT: i32 = 409;

    /// 服务器错误 5xx
    pub const INTERNAL_ERROR: i32 = 500;
    pub const DATABASE_ERROR: i32 = 501;
    pub const AI_SERVICE_ERROR: i32 = 502;
    pub const SERVICE_UNAVAILABLE: i32 = 503;
}

/// 响应码对应的默认消息
impl ResponseCode {
    pub fn get_message(code: i32) -> &'static str {
        match code {
            Self::SUCCESS => "操作成功",
            Self::CREATED => "创建成功",
            Self::ACCEPTED => "已接受，处理中",
            Self::BAD_REQUEST => "请求参数错误",
            Self::NOT_FOUND => "资源不存在",
            Self::CONFLICT => "资源冲突",
            Self::INTERNAL_ERROR => "服务器内部错误",
            Self::DATABASE_ERROR => "数据库错误",
            Self::AI_SERVICE_ERROR => "AI服务错误",
            Self::SERVICE_UNAVAILABLE => "服务不可用",
            _ => "未知错误",
        }
    }
}
