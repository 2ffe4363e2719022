use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// 项目生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "project_status_enum", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// 已初始化，等待文件与测试结果
    Initialized,
    /// 已收到测试结果
    ResultsReceived,
}

/// 项目模型，一次分析运行对应一个项目
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Project {
    pub id: i64,
    /// 租户
    pub tenant: String,
    /// 仓库名
    pub repo: String,
    /// 运行标识（全局唯一，创建后不可变）
    pub uuid: Uuid,
    /// 源码语言
    pub language: String,
    /// 压测工具
    pub testing_tool: String,
    /// 项目附加信息（原样透传的 JSON）
    pub project_info: Option<JsonValue>,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 创建项目所需字段
#[derive(Debug, Clone)]
pub struct NewProject {
    pub tenant: String,
    pub repo: String,
    pub uuid: Uuid,
    pub language: String,
    pub testing_tool: String,
    pub project_info: Option<JsonValue>,
}

/// 项目文件，同一项目内文件名唯一，重复提交覆盖内容与分析
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ProjectFile {
    pub id: i64,
    pub project_uuid: Uuid,
    pub filename: String,
    pub content: String,
    /// 单文件 AI 分析结果（计算前为空）
    pub file_analysis: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
}

/// 初始化分析请求
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InitAnalyzeRequest {
    pub language: String,
    pub testing_tool: String,
    pub project_info: Option<JsonValue>,
}

/// 文件提交请求
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SendFileRequest {
    pub filename: String,
    pub content: String,
}
