use std::sync::Arc;
use tracing::{debug, error, info};

use super::{
    analysis_queue::AnalysisReceiver,
    final_analysis::{FinalAnalysisPipeline, PipelineOutcome},
};

/// 后台分析处理器
///
/// 单消费者循环：按入队顺序逐个执行最终分析，同一时刻最多一个运行。
/// 单次运行失败（包括 panic）不会终止循环。
pub struct BackgroundProcessor {
    receiver: AnalysisReceiver,
    pipeline: Arc<FinalAnalysisPipeline>,
}

impl BackgroundProcessor {
    pub fn new(receiver: AnalysisReceiver, pipeline: Arc<FinalAnalysisPipeline>) -> Self {
        Self { receiver, pipeline }
    }

    /// 启动处理循环，直到所有发送端释放
    pub async fn start(mut self) {
        info!("启动后台分析处理器");

        while let Some(project_uuid) = self.receiver.recv().await {
            info!(project = %project_uuid, "开始最终分析");

            let pipeline = self.pipeline.clone();
            let handle = tokio::spawn(async move { pipeline.run(project_uuid).await });

            match handle.await {
                Ok(PipelineOutcome::Completed { fallback }) => {
                    debug!(project = %project_uuid, fallback, "分析任务结束");
                }
                Ok(outcome) => {
                    debug!(project = %project_uuid, ?outcome, "分析任务未完成");
                }
                Err(e) => {
                    error!(project = %project_uuid, error = %e, "分析任务异常退出");
                }
            }
        }

        info!("分析队列已关闭，后台处理器退出");
    }
}
