use crate::{
    error::{AppError, AppResult},
    models::{
        AnalysisResult, AnalysisStatus, NewProject, NewTestResults, Project, ProjectFile,
        ProjectStatus, TestResults,
    },
};
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::ProjectStore;

/// 内存项目存储
///
/// 数据库不可用时的降级存储，进程退出即丢失；测试中也用它替代数据库。
#[derive(Debug, Default)]
pub struct MemoryProjectStore {
    state: RwLock<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i64,
    projects: HashMap<Uuid, Project>,
    files: HashMap<Uuid, Vec<ProjectFile>>,
    test_results: HashMap<Uuid, Vec<TestResults>>,
    analyses: HashMap<Uuid, AnalysisResult>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn analysis_mut(&mut self, uuid: Uuid) -> AppResult<&mut AnalysisResult> {
        self.analyses
            .get_mut(&uuid)
            .ok_or_else(|| AppError::not_found(format!("项目 {} 的分析记录", uuid)))
    }
}

impl MemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ProjectStore for MemoryProjectStore {
    async fn create_project(&self, project: NewProject) -> AppResult<Project> {
        let mut state = self.state.write().await;
        if state.projects.contains_key(&project.uuid) {
            return Err(AppError::conflict(format!(
                "运行标识 {} 的项目已存在",
                project.uuid
            )));
        }

        let now = Utc::now();
        let created = Project {
            id: state.next_id(),
            tenant: project.tenant,
            repo: project.repo,
            uuid: project.uuid,
            language: project.language,
            testing_tool: project.testing_tool,
            project_info: project.project_info,
            status: ProjectStatus::Initialized,
            created_at: now,
            updated_at: now,
        };
        let analysis = AnalysisResult {
            id: state.next_id(),
            project_uuid: project.uuid,
            final_analysis: None,
            status: AnalysisStatus::Pending,
            error_message: None,
            created_at: now,
            completed_at: None,
        };

        state.projects.insert(project.uuid, created.clone());
        state.analyses.insert(project.uuid, analysis);

        Ok(created)
    }

    async fn project_exists(&self, uuid: Uuid) -> AppResult<bool> {
        Ok(self.state.read().await.projects.contains_key(&uuid))
    }

    async fn update_project_status(&self, uuid: Uuid, status: ProjectStatus) -> AppResult<()> {
        let mut state = self.state.write().await;
        let project = state
            .projects
            .get_mut(&uuid)
            .ok_or_else(|| AppError::not_found(format!("项目 {}", uuid)))?;
        project.status = status;
        project.updated_at = Utc::now();
        Ok(())
    }

    async fn upsert_file(
        &self,
        uuid: Uuid,
        filename: &str,
        content: &str,
        file_analysis: &JsonValue,
    ) -> AppResult<ProjectFile> {
        let mut state = self.state.write().await;
        if !state.projects.contains_key(&uuid) {
            return Err(AppError::not_found(format!("项目 {}", uuid)));
        }

        let id = state.next_id();
        let files = state.files.entry(uuid).or_default();
        if let Some(existing) = files.iter_mut().find(|f| f.filename == filename) {
            existing.content = content.to_string();
            existing.file_analysis = Some(file_analysis.clone());
            return Ok(existing.clone());
        }

        let file = ProjectFile {
            id,
            project_uuid: uuid,
            filename: filename.to_string(),
            content: content.to_string(),
            file_analysis: Some(file_analysis.clone()),
            created_at: Utc::now(),
        };
        files.push(file.clone());
        Ok(file)
    }

    async fn insert_test_results(&self, results: NewTestResults) -> AppResult<TestResults> {
        let mut state = self.state.write().await;
        if !state.projects.contains_key(&results.project_uuid) {
            return Err(AppError::not_found(format!(
                "项目 {}",
                results.project_uuid
            )));
        }

        let stored = TestResults {
            id: state.next_id(),
            project_uuid: results.project_uuid,
            response_time_p95: results.response_time_p95,
            response_time_p99: results.response_time_p99,
            successful_calls: results.successful_calls,
            failed_calls: results.failed_calls,
            nonfunctional_requirements: results.nonfunctional_requirements,
            raw_results: results.raw_results,
            created_at: Utc::now(),
        };
        state
            .test_results
            .entry(results.project_uuid)
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    async fn get_analysis_result(&self, uuid: Uuid) -> AppResult<Option<AnalysisResult>> {
        Ok(self.state.read().await.analyses.get(&uuid).cloned())
    }

    async fn get_project(&self, uuid: Uuid) -> AppResult<Project> {
        self.state
            .read()
            .await
            .projects
            .get(&uuid)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("项目 {}", uuid)))
    }

    async fn get_files(&self, uuid: Uuid) -> AppResult<Vec<ProjectFile>> {
        Ok(self
            .state
            .read()
            .await
            .files
            .get(&uuid)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_latest_test_results(&self, uuid: Uuid) -> AppResult<TestResults> {
        self.state
            .read()
            .await
            .test_results
            .get(&uuid)
            .and_then(|all| all.iter().max_by_key(|r| (r.created_at, r.id)))
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("项目 {} 的压测结果", uuid)))
    }

    async fn set_analysis_status(&self, uuid: Uuid, status: AnalysisStatus) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.analysis_mut(uuid)?.status = status;
        Ok(())
    }

    async fn save_final_analysis(
        &self,
        uuid: Uuid,
        payload: &JsonValue,
        completed_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        let analysis = state.analysis_mut(uuid)?;
        analysis.final_analysis = Some(payload.clone());
        analysis.status = AnalysisStatus::Completed;
        analysis.error_message = None;
        analysis.completed_at = Some(completed_at);
        Ok(())
    }

    async fn mark_failed(&self, uuid: Uuid, error_message: &str) -> AppResult<()> {
        let mut state = self.state.write().await;
        let analysis = state.analysis_mut(uuid)?;
        analysis.status = AnalysisStatus::Failed;
        analysis.error_message = Some(error_message.to_string());
        analysis.completed_at = None;
        Ok(())
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_project(uuid: Uuid) -> NewProject {
        NewProject {
            tenant: "acme".to_string(),
            repo: "checkout".to_string(),
            uuid,
            language: "go".to_string(),
            testing_tool: "k6".to_string(),
            project_info: Some(json!({"team": "payments"})),
        }
    }

    #[tokio::test]
    async fn test_create_project_initializes_pending_analysis() {
        let store = MemoryProjectStore::new();
        let uuid = Uuid::new_v4();
        let project = store.create_project(new_project(uuid)).await.unwrap();

        assert_eq!(project.status, ProjectStatus::Initialized);
        let analysis = store.get_analysis_result(uuid).await.unwrap().unwrap();
        assert_eq!(analysis.status, AnalysisStatus::Pending);
        assert!(analysis.final_analysis.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_project_conflicts() {
        let store = MemoryProjectStore::new();
        let uuid = Uuid::new_v4();
        store.create_project(new_project(uuid)).await.unwrap();

        let err = store.create_project(new_project(uuid)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_upsert_file_overwrites_same_filename() {
        let store = MemoryProjectStore::new();
        let uuid = Uuid::new_v4();
        store.create_project(new_project(uuid)).await.unwrap();

        store
            .upsert_file(uuid, "main.go", "package main", &json!({"v": 1}))
            .await
            .unwrap();
        store
            .upsert_file(uuid, "main.go", "package main // v2", &json!({"v": 2}))
            .await
            .unwrap();
        store
            .upsert_file(uuid, "handler.go", "package api", &json!({"v": 1}))
            .await
            .unwrap();

        let files = store.get_files(uuid).await.unwrap();
        assert_eq!(files.len(), 2);
        let main = files.iter().find(|f| f.filename == "main.go").unwrap();
        assert_eq!(main.content, "package main // v2");
        assert_eq!(main.file_analysis, Some(json!({"v": 2})));
    }

    #[tokio::test]
    async fn test_latest_test_results_wins() {
        let store = MemoryProjectStore::new();
        let uuid = Uuid::new_v4();
        store.create_project(new_project(uuid)).await.unwrap();

        assert!(matches!(
            store.get_latest_test_results(uuid).await.unwrap_err(),
            AppError::NotFound { .. }
        ));

        for (ok, failed) in [(10, 1), (20, 2)] {
            store
                .insert_test_results(NewTestResults {
                    project_uuid: uuid,
                    response_time_p95: None,
                    response_time_p99: None,
                    successful_calls: ok,
                    failed_calls: failed,
                    nonfunctional_requirements: None,
                    raw_results: None,
                })
                .await
                .unwrap();
        }

        let latest = store.get_latest_test_results(uuid).await.unwrap();
        assert_eq!(latest.successful_calls, 20);
        assert_eq!(latest.failed_calls, 2);
    }

    #[tokio::test]
    async fn test_status_writes_require_analysis_record() {
        let store = MemoryProjectStore::new();
        let missing = Uuid::new_v4();

        assert!(
            store
                .set_analysis_status(missing, AnalysisStatus::Processing)
                .await
                .is_err()
        );
        assert!(store.mark_failed(missing, "boom").await.is_err());
    }
}
