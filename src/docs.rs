use crate::{
    handlers::analysis::{AnalysisResultResponse, SendFileResponse, SendResultsResponse},
    models::{
        AnalysisStatus, InitAnalyzeRequest, Project, ProjectStatus, SendFileRequest,
        SendResultsRequest,
    },
    response::ApiResponse,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        // 分析流程API
        crate::handlers::analysis::init_analyze,
        crate::handlers::analysis::send_file,
        crate::handlers::analysis::send_results,
        crate::handlers::analysis::get_analyze_results,
        // 系统监控
        crate::handlers::system::health_check,
        crate::handlers::system::db_health_check,
        crate::handlers::system::ai_health_check,
    ),
    components(
        schemas(
            Project,
            ProjectStatus,
            AnalysisStatus,
            InitAnalyzeRequest,
            SendFileRequest,
            SendResultsRequest,
            SendFileResponse,
            SendResultsResponse,
            AnalysisResultResponse,
            ApiResponse<Project>,
            ApiResponse<SendFileResponse>,
            ApiResponse<SendResultsResponse>,
            ApiResponse<AnalysisResultResponse>,
        )
    ),
    tags(
        (name = "分析流程", description = "项目初始化、文件与压测结果提交、最终分析查询"),
        (name = "系统监控", description = "服务、数据库与 AI 服务健康状态")
    ),
    info(
        title = "Performance Analyzer API",
        version = "1.0.0",
        description = "性能测试结果 AI 分析服务 REST API 文档"
    ),
    servers(
        (url = "http://localhost:8000", description = "开发环境")
    )
)]
pub struct ApiDoc;
