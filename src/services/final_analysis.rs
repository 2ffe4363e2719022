use chrono::Utc;
use serde_json::{Value as JsonValue, json};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    models::{AnalysisStatus, Project, ProjectFile, TestResults},
    repositories::ProjectStore,
};

use super::ai_client::{AiAnswer, AnalysisModel};

/// 最终分析结果的结构版本
pub const ANALYSIS_VERSION: &str = "1.0";

/// 单次流水线执行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// 分析已保存，状态为 completed
    Completed { fallback: bool },
    /// 已标记为 failed
    Failed { reason: String },
    /// 无法置为 processing，状态保持不变，等待下一次触发
    Aborted,
    /// 标记失败也未成功，记录停留在 processing
    Stuck { reason: String },
}

/// 最终分析流水线
///
/// 状态机：pending -> processing -> completed | failed。
/// 同一时刻只由一个后台处理器驱动，不做额外加锁。
pub struct FinalAnalysisPipeline {
    store: Arc<dyn ProjectStore>,
    model: Arc<dyn AnalysisModel>,
}

impl FinalAnalysisPipeline {
    pub fn new(store: Arc<dyn ProjectStore>, model: Arc<dyn AnalysisModel>) -> Self {
        Self { store, model }
    }

    /// 执行一次完整的最终分析
    pub async fn run(&self, project_uuid: Uuid) -> PipelineOutcome {
        if let Err(e) = self
            .store
            .set_analysis_status(project_uuid, AnalysisStatus::Processing)
            .await
        {
            error!(
                project = %project_uuid,
                error = %e,
                "更新分析状态为 processing 失败，放弃本次分析"
            );
            return PipelineOutcome::Aborted;
        }

        let project = match self.store.get_project(project_uuid).await {
            Ok(project) => project,
            Err(e) => return self.fail(project_uuid, format!("获取项目失败: {}", e)).await,
        };

        let files = match self.store.get_files(project_uuid).await {
            Ok(files) => files,
            Err(e) => return self.fail(project_uuid, format!("获取项目文件失败: {}", e)).await,
        };

        let test_results = match self.store.get_latest_test_results(project_uuid).await {
            Ok(results) => results,
            Err(e) => return self.fail(project_uuid, format!("获取压测结果失败: {}", e)).await,
        };

        let prompt = build_final_prompt(&project, &files, &test_results);
        let answer = match self.model.query(&prompt).await {
            Ok(answer) => answer,
            Err(e) => return self.fail(project_uuid, format!("AI 分析失败: {}", e)).await,
        };
        let fallback = answer.is_fallback();

        let payload = assemble_payload(&project, files.len(), &test_results, &answer);
        let completed_at = Utc::now();
        if let Err(e) = self
            .store
            .save_final_analysis(project_uuid, &payload, completed_at)
            .await
        {
            error!(project = %project_uuid, error = %e, "保存最终分析失败");
            return self.fail(project_uuid, format!("保存分析结果失败: {}", e)).await;
        }

        info!(project = %project_uuid, fallback, "最终分析完成");
        PipelineOutcome::Completed { fallback }
    }

    /// 尽力标记为 failed；再次失败只记录日志
    async fn fail(&self, project_uuid: Uuid, reason: String) -> PipelineOutcome {
        warn!(project = %project_uuid, reason = %reason, "最终分析失败");
        match self.store.mark_failed(project_uuid, &reason).await {
            Ok(()) => PipelineOutcome::Failed { reason },
            Err(e) => {
                error!(
                    project = %project_uuid,
                    error = %e,
                    "标记分析失败时出错，记录停留在 processing"
                );
                PipelineOutcome::Stuck { reason }
            }
        }
    }
}

fn render_json(value: &Option<JsonValue>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "null".to_string(),
    }
}

/// 组装最终分析提示词：项目信息、文件摘要与压测结果
pub fn build_final_prompt(
    project: &Project,
    files: &[ProjectFile],
    test_results: &TestResults,
) -> String {
    let mut files_summary = String::from("Project files:\n");
    for file in files {
        let _ = writeln!(
            files_summary,
            "- {} (size: {} bytes)",
            file.filename,
            file.content.len()
        );
        if let Some(analysis) = &file.file_analysis {
            let _ = writeln!(files_summary, "  Analysis: {}", analysis);
        }
    }

    let test_summary = format!(
        "Test results:
- Successful calls: {}
- Failed calls: {}
- Response time p95: {}
- Response time p99: {}
- Nonfunctional requirements: {}
- Additional results: {}",
        test_results.successful_calls,
        test_results.failed_calls,
        render_json(&test_results.response_time_p95),
        render_json(&test_results.response_time_p99),
        render_json(&test_results.nonfunctional_requirements),
        render_json(&test_results.raw_results),
    );

    format!(
        "Analyze the performance testing results as an expert.
Explain the findings to the user in plain language.

Project information:
- Language: {language}
- Testing tool: {tool}
- Additional information: {info}

{files_summary}
{test_summary}

Provide the analysis as JSON with the following fields:
- summary: short summary
- performance_assessment: overall performance assessment (1-10)
- identified_issues: list of identified issues
- recommendations: list of improvement recommendations
- detailed_analysis: detailed analysis of the results
- code_quality_score: code quality score (1-10)
- load_test_score: load test results score (1-10)
- overall_score: overall project score (1-10)

Use plain language to explain technical questions.",
        language = project.language,
        tool = project.testing_tool,
        info = render_json(&project.project_info),
        files_summary = files_summary,
        test_summary = test_summary,
    )
}

/// 组装持久化的最终分析结构
pub fn assemble_payload(
    project: &Project,
    files_count: usize,
    test_results: &TestResults,
    answer: &AiAnswer,
) -> JsonValue {
    json!({
        "ai_analysis": answer.content,
        "project_info": {
            "tenant": project.tenant,
            "repo": project.repo,
            "language": project.language,
            "testing_tool": project.testing_tool,
        },
        "files_count": files_count,
        "test_summary": {
            "successful_calls": test_results.successful_calls,
            "failed_calls": test_results.failed_calls,
            "total_calls": test_results.total_calls(),
        },
        "analysis_metadata": {
            "analyzed_at": Utc::now(),
            "analysis_version": ANALYSIS_VERSION,
            "fallback": answer.is_fallback(),
        },
    })
}
