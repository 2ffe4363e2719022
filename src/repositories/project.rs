use crate::{
    database::Database,
    error::{AppError, AppResult},
    models::{
        AnalysisResult, AnalysisStatus, NewProject, NewTestResults, Project, ProjectFile,
        ProjectStatus, TestResults,
    },
};
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::ProjectStore;

const PROJECT_COLUMNS: &str = "id, tenant, repo, uuid, language, testing_tool, project_info, \
                               status, created_at, updated_at";

const TEST_RESULT_COLUMNS: &str = "id, project_uuid, response_time_p95, response_time_p99, \
                                   successful_calls, failed_calls, nonfunctional_requirements, \
                                   raw_results, created_at";

/// 基于 PostgreSQL 的项目存储
#[derive(Clone, Debug)]
pub struct PgProjectStore {
    db: Database,
}

impl PgProjectStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// UPDATE 未命中任何行时视为分析记录不存在
    fn ensure_affected(rows: u64, uuid: Uuid) -> AppResult<()> {
        if rows == 0 {
            return Err(AppError::not_found(format!("项目 {} 的分析记录", uuid)));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ProjectStore for PgProjectStore {
    async fn create_project(&self, project: NewProject) -> AppResult<Project> {
        let mut tx = self.db.pool().begin().await?;

        let created = sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (tenant, repo, uuid, language, testing_tool, project_info, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'initialized')
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        ))
        .bind(&project.tenant)
        .bind(&project.repo)
        .bind(project.uuid)
        .bind(&project.language)
        .bind(&project.testing_tool)
        .bind(&project.project_info)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            let duplicated =
                matches!(&e, sqlx::Error::Database(db_err) if db_err.is_unique_violation());
            if duplicated {
                AppError::conflict(format!("运行标识 {} 的项目已存在", project.uuid))
            } else {
                AppError::Database(e)
            }
        })?;

        sqlx::query("INSERT INTO analysis_results (project_uuid, status) VALUES ($1, 'pending')")
            .bind(project.uuid)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn project_exists(&self, uuid: Uuid) -> AppResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM projects WHERE uuid = $1)")
                .bind(uuid)
                .fetch_one(self.db.pool())
                .await?;

        Ok(exists)
    }

    async fn update_project_status(&self, uuid: Uuid, status: ProjectStatus) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE projects SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE uuid = $2",
        )
        .bind(status)
        .bind(uuid)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("项目 {}", uuid)));
        }
        Ok(())
    }

    async fn upsert_file(
        &self,
        uuid: Uuid,
        filename: &str,
        content: &str,
        file_analysis: &JsonValue,
    ) -> AppResult<ProjectFile> {
        let file = sqlx::query_as::<_, ProjectFile>(
            r#"
            INSERT INTO project_files (project_uuid, filename, content, file_analysis)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (project_uuid, filename)
            DO UPDATE SET content = EXCLUDED.content, file_analysis = EXCLUDED.file_analysis
            RETURNING id, project_uuid, filename, content, file_analysis, created_at
            "#,
        )
        .bind(uuid)
        .bind(filename)
        .bind(content)
        .bind(file_analysis)
        .fetch_one(self.db.pool())
        .await?;

        Ok(file)
    }

    async fn insert_test_results(&self, results: NewTestResults) -> AppResult<TestResults> {
        let stored = sqlx::query_as::<_, TestResults>(&format!(
            r#"
            INSERT INTO test_results (project_uuid, response_time_p95, response_time_p99,
                                      successful_calls, failed_calls,
                                      nonfunctional_requirements, raw_results)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            TEST_RESULT_COLUMNS
        ))
        .bind(results.project_uuid)
        .bind(&results.response_time_p95)
        .bind(&results.response_time_p99)
        .bind(results.successful_calls)
        .bind(results.failed_calls)
        .bind(&results.nonfunctional_requirements)
        .bind(&results.raw_results)
        .fetch_one(self.db.pool())
        .await?;

        Ok(stored)
    }

    async fn get_analysis_result(&self, uuid: Uuid) -> AppResult<Option<AnalysisResult>> {
        let result = sqlx::query_as::<_, AnalysisResult>(
            r#"
            SELECT id, project_uuid, final_analysis, status, error_message, created_at, completed_at
            FROM analysis_results
            WHERE project_uuid = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(uuid)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(result)
    }

    async fn get_project(&self, uuid: Uuid) -> AppResult<Project> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {} FROM projects WHERE uuid = $1",
            PROJECT_COLUMNS
        ))
        .bind(uuid)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or_else(|| AppError::not_found(format!("项目 {}", uuid)))
    }

    async fn get_files(&self, uuid: Uuid) -> AppResult<Vec<ProjectFile>> {
        let files = sqlx::query_as::<_, ProjectFile>(
            r#"
            SELECT id, project_uuid, filename, content, file_analysis, created_at
            FROM project_files
            WHERE project_uuid = $1
            ORDER BY id
            "#,
        )
        .bind(uuid)
        .fetch_all(self.db.pool())
        .await?;

        Ok(files)
    }

    async fn get_latest_test_results(&self, uuid: Uuid) -> AppResult<TestResults> {
        sqlx::query_as::<_, TestResults>(&format!(
            "SELECT {} FROM test_results WHERE project_uuid = $1 \
             ORDER BY created_at DESC, id DESC LIMIT 1",
            TEST_RESULT_COLUMNS
        ))
        .bind(uuid)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or_else(|| AppError::not_found(format!("项目 {} 的压测结果", uuid)))
    }

    async fn set_analysis_status(&self, uuid: Uuid, status: AnalysisStatus) -> AppResult<()> {
        let result = sqlx::query("UPDATE analysis_results SET status = $1 WHERE project_uuid = $2")
            .bind(status)
            .bind(uuid)
            .execute(self.db.pool())
            .await?;

        Self::ensure_affected(result.rows_affected(), uuid)
    }

    async fn save_final_analysis(
        &self,
        uuid: Uuid,
        payload: &JsonValue,
        completed_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE analysis_results
            SET final_analysis = $1, status = 'completed', error_message = NULL, completed_at = $2
            WHERE project_uuid = $3
            "#,
        )
        .bind(payload)
        .bind(completed_at)
        .bind(uuid)
        .execute(self.db.pool())
        .await?;

        Self::ensure_affected(result.rows_affected(), uuid)
    }

    async fn mark_failed(&self, uuid: Uuid, error_message: &str) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE analysis_results
            SET status = 'failed', error_message = $1, completed_at = NULL
            WHERE project_uuid = $2
            "#,
        )
        .bind(error_message)
        .bind(uuid)
        .execute(self.db.pool())
        .await?;

        Self::ensure_affected(result.rows_affected(), uuid)
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.db.health_check().await
    }
}
