use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// 最终分析状态机：pending -> processing -> completed | failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "analysis_status_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    /// 等待分析（项目创建时写入）
    Pending,
    /// 分析中
    Processing,
    /// 已完成
    Completed,
    /// 失败
    Failed,
}

impl AnalysisStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Processing => "processing",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 项目的最终分析记录，每个项目恰有一条
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AnalysisResult {
    pub id: i64,
    pub project_uuid: Uuid,
    /// 最终分析内容（完成前为空）
    pub final_analysis: Option<JsonValue>,
    pub status: AnalysisStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}
