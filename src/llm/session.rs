//! 多轮对话会话
//!
//! 在无状态的 LlmClient 之上保留最近 N 轮对话（user/assistant 对），超出时剪枝。
//! send 只有在模型成功回复后才把本轮写入历史，失败时历史保持不变。

use std::sync::Arc;

use crate::core::PlannerError;
use crate::llm::{LlmClient, Message};

/// 一个对话句柄：可选系统提示词 + 历史 + 共享的模型客户端
#[derive(Clone)]
pub struct ChatSession {
    llm: Arc<dyn LlmClient>,
    system_prompt: Option<String>,
    history: Vec<Message>,
    max_turns: usize,
}

impl ChatSession {
    pub fn new(llm: Arc<dyn LlmClient>, system_prompt: Option<String>, max_turns: usize) -> Self {
        Self {
            llm,
            system_prompt,
            history: Vec::new(),
            max_turns,
        }
    }

    /// 发送一条用户消息并返回回复
    pub async fn send(&mut self, text: &str) -> Result<String, PlannerError> {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        if let Some(system) = &self.system_prompt {
            messages.push(Message::system(system.clone()));
        }
        messages.extend(self.history.iter().cloned());
        messages.push(Message::user(text));

        let reply = self.llm.complete(&messages).await?;

        self.history.push(Message::user(text));
        self.history.push(Message::assistant(reply.clone()));
        self.prune();
        Ok(reply)
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// 超出 max_turns*2 时丢弃最旧的消息
    fn prune(&mut self) {
        let keep = self.max_turns * 2;
        if self.history.len() > keep {
            self.history.drain(..self.history.len() - keep);
        }
    }
}
