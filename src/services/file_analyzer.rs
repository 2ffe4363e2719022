use chrono::Utc;
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use tracing::{debug, warn};

use super::ai_client::{AnalysisModel, FILE_ANALYSIS_MARKER};

/// 单文件分析器
///
/// 在文件提交时同步调用，返回的 JSON 由调用方随文件一起持久化。
#[derive(Clone)]
pub struct FileAnalyzer {
    model: Arc<dyn AnalysisModel>,
}

impl FileAnalyzer {
    pub fn new(model: Arc<dyn AnalysisModel>) -> Self {
        Self { model }
    }

    /// 分析文件内容，永不失败
    pub async fn analyze(&self, content: &str) -> JsonValue {
        let prompt = build_file_prompt(content);

        match self.model.query(&prompt).await {
            Ok(answer) => {
                debug!(
                    file_size = content.len(),
                    fallback = answer.is_fallback(),
                    "单文件分析完成"
                );
                json!({
                    "ai_response": answer.content,
                    "analyzed_at": Utc::now(),
                    "file_size": content.len(),
                    "analysis_type": "file_analysis",
                    "fallback": answer.is_fallback(),
                })
            }
            Err(e) => {
                warn!(error = %e, "单文件 AI 分析失败，保存错误信息");
                json!({
                    "error": "AI analysis failed",
                    "message": e.to_string(),
                    "analyzed_at": Utc::now(),
                    "file_size": content.len(),
                    "analysis_type": "file_analysis",
                })
            }
        }
    }
}

/// 单文件分析提示词，首行为单文件标记
pub fn build_file_prompt(content: &str) -> String {
    format!(
        "{marker}
Analyze the following source file as a performance testing expert.
List potential performance problems, bottlenecks and optimization recommendations.
Answer in JSON with the fields: issues, recommendations, performance_score (from 1 to 10).

Source file content:
{content}",
        marker = FILE_ANALYSIS_MARKER,
        content = content
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{AppError, AppResult},
        services::ai_client::{AiAnswer, AnswerSource, FallbackReason, fallback_answer},
    };

    struct EchoModel;

    #[async_trait::async_trait]
    impl AnalysisModel for EchoModel {
        async fn query(&self, prompt: &str) -> AppResult<AiAnswer> {
            Ok(AiAnswer {
                content: format!("echo:{}", prompt.len()),
                chunks: Vec::new(),
                source: AnswerSource::Model,
            })
        }
    }

    struct DownModel;

    #[async_trait::async_trait]
    impl AnalysisModel for DownModel {
        async fn query(&self, prompt: &str) -> AppResult<AiAnswer> {
            Ok(fallback_answer(prompt, FallbackReason::Transport))
        }
    }

    struct BrokenModel;

    #[async_trait::async_trait]
    impl AnalysisModel for BrokenModel {
        async fn query(&self, _prompt: &str) -> AppResult<AiAnswer> {
            Err(AppError::ai_service("boom"))
        }
    }

    #[test]
    fn test_prompt_carries_marker_and_content() {
        let prompt = build_file_prompt("fn main() {}");
        assert!(prompt.starts_with(FILE_ANALYSIS_MARKER));
        assert!(prompt.ends_with("fn main() {}"));
        assert!(prompt.contains("performance_score"));
    }

    #[tokio::test]
    async fn test_blob_wraps_model_answer() {
        let analyzer = FileAnalyzer::new(Arc::new(EchoModel));
        let blob = analyzer.analyze("SELECT * FROM orders").await;

        assert_eq!(blob["analysis_type"], "file_analysis");
        assert_eq!(blob["file_size"], 20);
        assert_eq!(blob["fallback"], false);
        assert!(blob["ai_response"].as_str().unwrap().starts_with("echo:"));
        assert!(blob.get("analyzed_at").is_some());
    }

    #[tokio::test]
    async fn test_ai_down_yields_canned_file_analysis() {
        let analyzer = FileAnalyzer::new(Arc::new(DownModel));
        let blob = analyzer.analyze("package main").await;

        assert_eq!(blob["fallback"], true);
        let canned: JsonValue =
            serde_json::from_str(blob["ai_response"].as_str().unwrap()).unwrap();
        assert_eq!(canned["analysis_type"], "file_analysis");
        assert!(canned.get("issues").is_some());
    }

    #[tokio::test]
    async fn test_model_error_is_recorded_not_raised() {
        let analyzer = FileAnalyzer::new(Arc::new(BrokenModel));
        let blob = analyzer.analyze("x").await;

        assert_eq!(blob["error"], "AI analysis failed");
        assert!(blob["message"].as_str().unwrap().contains("boom"));
        assert_eq!(blob["file_size"], 1);
    }
}
