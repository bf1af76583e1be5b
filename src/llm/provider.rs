//! 根据配置构建模型客户端
//!
//! API Key 由调用方通过 [`AppConfig::api_key`] 读取一次后传入；这里只负责选择后端。

use std::sync::Arc;

use crate::config::AppConfig;
use crate::core::PlannerError;
use crate::llm::{create_deepseek_client, LlmClient, OpenAiClient};

/// 只展示 Key 的前 5 个字符，便于确认加载的是哪一个
pub fn redact_key(key: &str) -> String {
    let prefix: String = key.chars().take(5).collect();
    format!("{}...", prefix)
}

/// 选择后端（deepseek / openai）并创建客户端；未知后端返回 Configuration 错误
pub fn build_llm(cfg: &AppConfig, api_key: &str) -> Result<Arc<dyn LlmClient>, PlannerError> {
    match cfg.llm.provider.to_lowercase().as_str() {
        "deepseek" => {
            let client = create_deepseek_client(Some(&cfg.llm.model), api_key);
            tracing::info!("Using DeepSeek LLM ({})", client.model());
            Ok(Arc::new(client))
        }
        "openai" => {
            let model = if cfg.llm.model.trim().is_empty() {
                "gpt-4o-mini"
            } else {
                cfg.llm.model.as_str()
            };
            tracing::info!("Using OpenAI LLM ({})", model);
            Ok(Arc::new(OpenAiClient::new(
                cfg.llm.base_url.as_deref(),
                model,
                api_key,
            )))
        }
        other => Err(PlannerError::Configuration(format!(
            "unknown llm provider: {}",
            other
        ))),
    }
}
