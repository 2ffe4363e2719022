use crate::{
    error::{AppError, AppResult},
    handlers::{
        AppState,
        validation::{parse_run_id, validate_string},
    },
    models::{
        AnalysisResult, AnalysisStatus, InitAnalyzeRequest, NewProject, Project, ProjectStatus,
        SendFileRequest, SendResultsRequest,
    },
    response::{ApiResponse, ResponseCode},
    services::EnqueueOutcome,
};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

/// 文件提交响应
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SendFileResponse {
    pub uuid: Uuid,
    pub filename: String,
    /// 文件大小（字节）
    pub file_size: usize,
    /// 单文件分析结果
    pub file_analysis: JsonValue,
}

/// 压测结果提交响应
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SendResultsResponse {
    pub uuid: Uuid,
    pub total_calls: i64,
    /// 最终分析是否已进入队列（队列满时为 false，可重新提交触发）
    pub analysis_queued: bool,
}

/// 分析结果查询响应
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnalysisResultResponse {
    pub uuid: Uuid,
    pub status: AnalysisStatus,
    pub final_analysis: Option<JsonValue>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<AnalysisResult> for AnalysisResultResponse {
    fn from(result: AnalysisResult) -> Self {
        Self {
            uuid: result.project_uuid,
            status: result.status,
            final_analysis: result.final_analysis,
            error_message: result.error_message,
            created_at: result.created_at,
            completed_at: result.completed_at,
        }
    }
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| AppError::bad_request(format!("请求体格式错误: {}", e.body_text())))
}

async fn ensure_project(state: &AppState, uuid: Uuid) -> AppResult<()> {
    if state.store.project_exists(uuid).await? {
        Ok(())
    } else {
        Err(AppError::not_found(format!("项目 {}", uuid)))
    }
}

/// 初始化分析运行
///
/// 创建项目及其 pending 状态的分析记录
#[utoipa::path(
    post,
    path = "/initAnalize/{tenant}/{repo}/{uuid}",
    tag = "分析流程",
    params(
        ("tenant" = String, Path, description = "租户"),
        ("repo" = String, Path, description = "仓库名"),
        ("uuid" = String, Path, description = "运行标识")
    ),
    request_body = InitAnalyzeRequest,
    responses(
        (status = 201, description = "项目创建成功", body = ApiResponse<Project>),
        (status = 400, description = "请求参数错误"),
        (status = 409, description = "运行标识已存在"),
        (status = 500, description = "服务器内部错误")
    )
)]
pub async fn init_analyze(
    State(state): State<AppState>,
    Path((tenant, repo, uuid)): Path<(String, String, String)>,
    payload: Result<Json<InitAnalyzeRequest>, JsonRejection>,
) -> AppResult<ApiResponse<Project>> {
    let request = json_body(payload)?;

    validate_string(&tenant, "tenant", 1, 255)?;
    validate_string(&repo, "repo", 1, 255)?;
    let uuid = parse_run_id(&uuid)?;
    validate_string(&request.language, "language", 1, 100)?;
    validate_string(&request.testing_tool, "testing_tool", 1, 100)?;

    if state.store.project_exists(uuid).await? {
        return Err(AppError::conflict(format!("运行标识 {} 的项目已存在", uuid)));
    }

    let project = state
        .store
        .create_project(NewProject {
            tenant,
            repo,
            uuid,
            language: request.language,
            testing_tool: request.testing_tool,
            project_info: request.project_info,
        })
        .await?;

    tracing::info!(
        project = %project.uuid,
        tenant = %project.tenant,
        repo = %project.repo,
        "项目初始化成功"
    );

    Ok(ApiResponse::with_code(
        ResponseCode::CREATED,
        project,
        "项目初始化成功".to_string(),
    ))
}

/// 提交源文件
///
/// 同步执行单文件分析，同名文件覆盖
#[utoipa::path(
    post,
    path = "/sendFile/{uuid}",
    tag = "分析流程",
    params(("uuid" = String, Path, description = "运行标识")),
    request_body = SendFileRequest,
    responses(
        (status = 200, description = "文件已保存并完成分析", body = ApiResponse<SendFileResponse>),
        (status = 400, description = "请求参数错误"),
        (status = 404, description = "项目不存在"),
        (status = 500, description = "服务器内部错误")
    )
)]
pub async fn send_file(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    payload: Result<Json<SendFileRequest>, JsonRejection>,
) -> AppResult<ApiResponse<SendFileResponse>> {
    let request = json_body(payload)?;
    let uuid = parse_run_id(&uuid)?;
    validate_string(&request.filename, "filename", 1, 500)?;
    if request.content.is_empty() {
        return Err(AppError::validation("content 不能为空"));
    }

    ensure_project(&state, uuid).await?;

    let file_analysis = state.analyzer.analyze_file(&request.content).await;
    let file = state
        .store
        .upsert_file(uuid, &request.filename, &request.content, &file_analysis)
        .await?;

    tracing::info!(
        project = %uuid,
        filename = %file.filename,
        size = file.content.len(),
        "文件已保存"
    );

    Ok(ApiResponse::success_with_message(
        SendFileResponse {
            uuid,
            filename: file.filename,
            file_size: file.content.len(),
            file_analysis,
        },
        "文件已接收并完成分析".to_string(),
    ))
}

/// 提交压测结果
///
/// 保存结果并触发最终分析（异步执行）
#[utoipa::path(
    post,
    path = "/sendResults/{uuid}",
    tag = "分析流程",
    params(("uuid" = String, Path, description = "运行标识")),
    request_body = SendResultsRequest,
    responses(
        (status = 200, description = "结果已保存，最终分析已触发", body = ApiResponse<SendResultsResponse>),
        (status = 400, description = "请求参数错误"),
        (status = 404, description = "项目不存在"),
        (status = 500, description = "服务器内部错误")
    )
)]
pub async fn send_results(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    payload: Result<Json<SendResultsRequest>, JsonRejection>,
) -> AppResult<ApiResponse<SendResultsResponse>> {
    let request = json_body(payload)?;
    let uuid = parse_run_id(&uuid)?;
    if request.successful_calls < 0 || request.failed_calls < 0 {
        return Err(AppError::validation("调用次数不能为负数"));
    }

    ensure_project(&state, uuid).await?;

    let stored = state
        .store
        .insert_test_results(request.into_new_results(uuid, Utc::now()))
        .await?;
    state
        .store
        .update_project_status(uuid, ProjectStatus::ResultsReceived)
        .await?;

    let outcome = state.analyzer.trigger_final_analysis(uuid);
    tracing::info!(
        project = %uuid,
        total_calls = stored.total_calls(),
        ?outcome,
        "压测结果已保存"
    );

    Ok(ApiResponse::success_with_message(
        SendResultsResponse {
            uuid,
            total_calls: stored.total_calls(),
            analysis_queued: outcome == EnqueueOutcome::Queued,
        },
        "压测结果已保存，最终分析已触发".to_string(),
    ))
}

/// 查询最终分析结果
///
/// pending/processing 返回 202，completed 返回 200，failed 返回 500
#[utoipa::path(
    get,
    path = "/getAnalizeResults/{uuid}",
    tag = "分析流程",
    params(("uuid" = String, Path, description = "运行标识")),
    responses(
        (status = 200, description = "分析已完成", body = ApiResponse<AnalysisResultResponse>),
        (status = 202, description = "分析进行中", body = ApiResponse<AnalysisResultResponse>),
        (status = 404, description = "分析记录不存在"),
        (status = 500, description = "分析失败", body = ApiResponse<AnalysisResultResponse>)
    )
)]
pub async fn get_analyze_results(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> AppResult<ApiResponse<AnalysisResultResponse>> {
    let uuid = parse_run_id(&uuid)?;
    let result = state
        .store
        .get_analysis_result(uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("项目 {} 的分析结果", uuid)))?;

    let response = match result.status {
        AnalysisStatus::Pending | AnalysisStatus::Processing => ApiResponse::with_code(
            ResponseCode::ACCEPTED,
            AnalysisResultResponse::from(result),
            "分析仍在进行中".to_string(),
        ),
        AnalysisStatus::Completed => ApiResponse::success_with_message(
            AnalysisResultResponse::from(result),
            "分析已完成".to_string(),
        ),
        AnalysisStatus::Failed => {
            let message = format!(
                "分析失败: {}",
                result.error_message.as_deref().unwrap_or("未知错误")
            );
            ApiResponse::error_with_data(
                ResponseCode::INTERNAL_ERROR,
                message,
                AnalysisResultResponse::from(result),
            )
        }
    };

    Ok(response)
}
