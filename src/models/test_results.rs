use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// 压测结果，同一项目可有多次提交，分析时取最新一条
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TestResults {
    pub id: i64,
    pub project_uuid: Uuid,
    /// 95 分位响应时间（语义由调用方定义，原样透传）
    pub response_time_p95: Option<JsonValue>,
    /// 99 分位响应时间
    pub response_time_p99: Option<JsonValue>,
    pub successful_calls: i32,
    pub failed_calls: i32,
    /// 非功能性需求
    pub nonfunctional_requirements: Option<JsonValue>,
    /// 原始结果
    pub raw_results: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
}

impl TestResults {
    pub fn total_calls(&self) -> i64 {
        i64::from(self.successful_calls) + i64::from(self.failed_calls)
    }
}

/// 写入压测结果所需字段
#[derive(Debug, Clone)]
pub struct NewTestResults {
    pub project_uuid: Uuid,
    pub response_time_p95: Option<JsonValue>,
    pub response_time_p99: Option<JsonValue>,
    pub successful_calls: i32,
    pub failed_calls: i32,
    pub nonfunctional_requirements: Option<JsonValue>,
    pub raw_results: Option<JsonValue>,
}

/// 压测结果提交请求
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SendResultsRequest {
    pub response_time_p95: Option<JsonValue>,
    pub response_time_p99: Option<JsonValue>,
    pub successful_calls: i32,
    pub failed_calls: i32,
    pub nonfunctional_requirements: Option<JsonValue>,
    pub raw_results: Option<JsonValue>,
}

impl SendResultsRequest {
    /// 转换为存储记录；raw_results 保存整次提交及接收时间
    pub fn into_new_results(self, project_uuid: Uuid, received_at: DateTime<Utc>) -> NewTestResults {
        let raw = serde_json::json!({
            "response_time_p95": self.response_time_p95,
            "response_time_p99": self.response_time_p99,
            "successful_calls": self.successful_calls,
            "failed_calls": self.failed_calls,
            "nonfunctional_requirements": self.nonfunctional_requirements,
            "raw_results": self.raw_results,
            "received_at": received_at,
        });

        NewTestResults {
            project_uuid,
            response_time_p95: self.response_time_p95,
            response_time_p99: self.response_time_p99,
            successful_calls: self.successful_calls,
            failed_calls: self.failed_calls,
            nonfunctional_requirements: self.nonfunctional_requirements,
            raw_results: Some(raw),
        }
    }
}
