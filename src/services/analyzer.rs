use serde_json::Value as JsonValue;
use std::sync::Arc;
use uuid::Uuid;

use crate::repositories::ProjectStore;

use super::{
    ai_client::AnalysisModel,
    analysis_queue::{AnalysisQueue, EnqueueOutcome},
    background_processor::BackgroundProcessor,
    file_analyzer::FileAnalyzer,
    final_analysis::FinalAnalysisPipeline,
};

/// 分析服务入口
///
/// 对外提供同步的单文件分析和异步的最终分析触发。
#[derive(Clone)]
pub struct Analyzer {
    files: FileAnalyzer,
    queue: AnalysisQueue,
}

impl Analyzer {
    /// 创建分析服务及其后台处理器，处理器需由调用方 spawn
    pub fn new(
        store: Arc<dyn ProjectStore>,
        model: Arc<dyn AnalysisModel>,
        queue_capacity: usize,
    ) -> (Self, BackgroundProcessor) {
        let (queue, receiver) = AnalysisQueue::bounded(queue_capacity);
        let pipeline = Arc::new(FinalAnalysisPipeline::new(store, model.clone()));

        let analyzer = Self {
            files: FileAnalyzer::new(model),
            queue,
        };
        (analyzer, BackgroundProcessor::new(receiver, pipeline))
    }

    pub async fn analyze_file(&self, content: &str) -> JsonValue {
        self.files.analyze(content).await
    }

    /// 触发最终分析，立即返回
    pub fn trigger_final_analysis(&self, project_uuid: Uuid) -> EnqueueOutcome {
        self.queue.enqueue(project_uuid)
    }

    pub fn queue(&self) -> &AnalysisQueue {
        &self.queue
    }
}
