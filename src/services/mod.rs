// 服务层模块
pub mod ai_client;
pub mod analysis_queue;
pub mod analyzer;
pub mod background_processor;
pub mod file_analyzer;
pub mod final_analysis;

pub use ai_client::{AiAnswer, AiClient, AnalysisModel, AnswerSource, FallbackReason};
pub use analysis_queue::{AnalysisQueue, AnalysisReceiver, EnqueueOutcome};
pub use analyzer::Analyzer;
pub use background_processor::BackgroundProcessor;
pub use file_analyzer::FileAnalyzer;
pub use final_analysis::{FinalAnalysisPipeline, PipelineOutcome};
