use serde::{Deserialize, Serialize};
use std::time::Duration;

/// AI 查询服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// AI 服务基础URL
    pub base_url: String,
    /// 单次请求超时（秒），AI 推理可能较慢
    pub timeout_secs: u64,
    /// 检索相关性阈值
    pub threshold: i32,
    /// 系统提示词（为空则使用服务端默认值）
    pub system_prompt: String,
    /// 检索过滤表达式
    pub filter_expr: String,
    /// 返回的参考片段数量上限（0 表示服务端默认）
    pub top_k: i32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:1234".to_string(),
            timeout_secs: 120,
            threshold: 0,
            system_prompt: String::new(),
            filter_expr: String::new(),
            top_k: 0,
        }
    }
}

impl AiConfig {
    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("AI base_url 不能为空".to_string());
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("AI base_url 必须以 http:// 或 https:// 开头".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("AI 请求超时必须大于0".to_string());
        }

        if self.top_k < 0 {
            return Err("top_k 不能为负数".to_string());
        }

        Ok(())
    }

    /// 获取完整的API URL
    pub fn get_api_url(&self, endpoint: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let endpoint = endpoint.trim_start_matches('/');
        format!("{}/{}", base, endpoint)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
