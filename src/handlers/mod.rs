pub mod analysis;
pub mod system;
pub mod validation;

use std::sync::Arc;

use crate::{
    config::Config,
    database::Database,
    repositories::ProjectStore,
    services::{AiClient, Analyzer},
};

pub use analysis::{get_analyze_results, init_analyze, send_file, send_results};
pub use system::{ai_health_check, db_health_check, health_check, service_info};

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    /// 项目存储（数据库或内存降级）
    pub store: Arc<dyn ProjectStore>,
    pub analyzer: Analyzer,
    pub ai_client: AiClient,
    /// 数据库连接，降级模式下为空
    pub database: Option<Database>,
    pub config: Config,
}
