//! Mock LLM 客户端（用于测试，无需 API）
//!
//! 默认回显最后一条 User 消息（"Echo: ..."）；可预置脚本回复、注入一次失败，并记录每次调用收到的消息。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::PlannerError;
use crate::llm::{LlmClient, Message, Role};

#[derive(Debug, Default)]
pub struct MockLlmClient {
    scripted: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置回复，按顺序消费；用完后回到回显模式
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::default();
        for r in replies {
            mock.push_reply(r);
        }
        mock
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        if let Ok(mut q) = self.scripted.lock() {
            q.push_back(Ok(reply.into()));
        }
    }

    /// 下一次调用返回错误
    pub fn fail_next(&self, message: impl Into<String>) {
        if let Ok(mut q) = self.scripted.lock() {
            q.push_front(Err(message.into()));
        }
    }

    /// 每次调用收到的完整消息列表
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }

    /// 每次调用中最后一条 User 消息（即实际发出的提示词）
    pub fn prompts(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|msgs| last_user(msgs).map(String::from))
            .collect()
    }
}

fn last_user(messages: &[Message]) -> Option<&str> {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, PlannerError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(messages.to_vec());
        }

        let scripted = self.scripted.lock().ok().and_then(|mut q| q.pop_front());
        match scripted {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(e)) => Err(PlannerError::ModelCall(e)),
            None => Ok(format!("Echo: {}", last_user(messages).unwrap_or("(no input)"))),
        }
    }
}
