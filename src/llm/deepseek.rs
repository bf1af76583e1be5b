//! DeepSeek API 客户端（OpenAI 兼容格式）
//!
//! - Base URL: https://api.deepseek.com
//! - 默认模型: deepseek-chat

use crate::llm::OpenAiClient;

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEEPSEEK_CHAT: &str = "deepseek-chat";

/// 创建 DeepSeek 客户端；model 为空时使用 `DEEPSEEK_MODEL` 环境变量，再回退到 deepseek-chat
pub fn create_deepseek_client(model: Option<&str>, api_key: &str) -> OpenAiClient {
    let model = model
        .filter(|m| !m.trim().is_empty())
        .map(String::from)
        .or_else(|| std::env::var("DEEPSEEK_MODEL").ok())
        .unwrap_or_else(|| DEEPSEEK_CHAT.to_string());

    OpenAiClient::new(Some(DEEPSEEK_BASE_URL), &model, api_key)
}
