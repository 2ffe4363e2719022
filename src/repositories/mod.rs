pub mod memory;
pub mod project;

pub use memory::MemoryProjectStore;
pub use project::PgProjectStore;

use crate::{
    error::AppResult,
    models::{
        AnalysisResult, AnalysisStatus, NewProject, NewTestResults, Project, ProjectFile,
        ProjectStatus, TestResults,
    },
};
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// 项目存储抽象接口
///
/// 同一行的并发写入由存储自身串行化（数据库原子性或内部锁），
/// 调用方不做额外加锁。
#[async_trait::async_trait]
pub trait ProjectStore: Send + Sync {
    /// 创建项目，并同时写入一条 `pending` 状态的分析记录
    async fn create_project(&self, project: NewProject) -> AppResult<Project>;

    /// 项目是否存在
    async fn project_exists(&self, uuid: Uuid) -> AppResult<bool>;

    /// 更新项目生命周期状态
    async fn update_project_status(&self, uuid: Uuid, status: ProjectStatus) -> AppResult<()>;

    /// 写入或覆盖项目文件（按文件名去重）
    async fn upsert_file(
        &self,
        uuid: Uuid,
        filename: &str,
        content: &str,
        file_analysis: &JsonValue,
    ) -> AppResult<ProjectFile>;

    /// 追加一次压测结果
    async fn insert_test_results(&self, results: NewTestResults) -> AppResult<TestResults>;

    /// 查询项目的分析记录
    async fn get_analysis_result(&self, uuid: Uuid) -> AppResult<Option<AnalysisResult>>;

    /// 获取项目，不存在时返回 NotFound
    async fn get_project(&self, uuid: Uuid) -> AppResult<Project>;

    /// 获取项目全部文件
    async fn get_files(&self, uuid: Uuid) -> AppResult<Vec<ProjectFile>>;

    /// 获取最新一次压测结果，不存在时返回 NotFound
    async fn get_latest_test_results(&self, uuid: Uuid) -> AppResult<TestResults>;

    /// 更新分析状态
    async fn set_analysis_status(&self, uuid: Uuid, status: AnalysisStatus) -> AppResult<()>;

    /// 保存最终分析并置为 `completed`
    async fn save_final_analysis(
        &self,
        uuid: Uuid,
        payload: &JsonValue,
        completed_at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// 置为 `failed` 并记录错误信息
    async fn mark_failed(&self, uuid: Uuid, error_message: &str) -> AppResult<()>;

    /// 存储健康检查
    async fn health_check(&self) -> AppResult<bool>;
}
