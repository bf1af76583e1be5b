//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / DeepSeek / Mock）实现 LlmClient::complete；
//! 多轮对话由 [`ChatSession`](crate::llm::ChatSession) 在其上维护历史。

use async_trait::async_trait;

use crate::core::PlannerError;
use crate::llm::Message;

/// LLM 客户端 trait：一次往返，返回首条回复文本
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 非流式完成；失败统一映射为 [`PlannerError::ModelCall`]
    async fn complete(&self, messages: &[Message]) -> Result<String, PlannerError>;

    /// 无状态单次调用（用于结构化抽取，不进入任何会话历史）
    async fn complete_once(&self, prompt: &str) -> Result<String, PlannerError> {
        self.complete(&[Message::user(prompt)]).await
    }
}
