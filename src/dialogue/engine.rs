//! 对话引擎：一条用户输入 → 一个提示词 → 一次模型调用 → 一条回复
//!
//! 每轮流程：
//! 1. 以 `search:` 或 `/search ` 开头的输入走检索增强路径，本轮不做槽位抽取
//! 2. 否则抽取槽位并暂存到副本；宽松捕获只针对上一轮追问的槽位，开场白不会被当作目的地
//! 3. 仍有空槽位 → 追问下一个；全部填写 → 生成最终规划（之后每轮都重新规划）
//! 4. 模型调用成功后才提交暂存的槽位与日志；失败返回固定致歉文案，状态不变
//!
//! 引擎是每个会话独立的值，不持有任何进程级可变状态。

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::timeout;

use crate::core::PlannerError;
use crate::dialogue::{
    policy, ConversationLog, DialoguePhase, Extractor, PromptComposer, Slot, SlotStore, SlotUpdate,
    Speaker,
};
use crate::llm::{ChatSession, LlmClient};
use crate::search::SearchAugmenter;

pub const NOT_CONFIGURED_REPLY: &str = "AI service is not configured correctly.";
pub const APOLOGY_REPLY: &str = "I'm sorry, I encountered an error processing your request.";
pub const NO_RESULTS_REPLY: &str = "I could not retrieve web results right now. Please try again.";

/// 输入分类
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnKind {
    /// 显式搜索命令，携带去掉前缀后的查询
    Search(String),
    /// 普通对话轮次（参与槽位收集）
    Dialogue,
}

/// 识别 `search:` / `/search ` 前缀（忽略大小写与首尾空白）；前缀后为空时按普通轮次处理
pub fn classify(text: &str) -> TurnKind {
    let trimmed = text.trim();
    let lower = trimmed.to_lowercase();

    let query = if lower.starts_with("search:") {
        trimmed.split_once(':').map(|(_, rest)| rest)
    } else if lower.starts_with("/search ") {
        trimmed.split_once(' ').map(|(_, rest)| rest)
    } else {
        None
    };

    match query.map(str::trim) {
        Some(q) if !q.is_empty() => TurnKind::Search(q.to_string()),
        _ => TurnKind::Dialogue,
    }
}

/// 引擎运行参数
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub system_prompt: Option<String>,
    pub max_context_turns: usize,
    pub request_timeout_secs: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            system_prompt: None,
            max_context_turns: 20,
            request_timeout_secs: 60,
        }
    }
}

/// 已配置好模型时才存在的协作方
struct Backend {
    chat: ChatSession,
    extractor: Arc<dyn Extractor>,
    search: Option<SearchAugmenter>,
    request_timeout: Duration,
}

impl Backend {
    async fn send(&mut self, prompt: &str) -> Result<String, PlannerError> {
        tracing::debug!(prompt = %prompt, "sending prompt");
        timeout(self.request_timeout, self.chat.send(prompt))
            .await
            .map_err(|_| PlannerError::Timeout(self.request_timeout.as_secs(), "chat".into()))?
    }
}

/// 对外导出的会话快照（审计 / 回放）
#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub configured: bool,
    pub phase: DialoguePhase,
    pub slots: SlotStore,
    pub missing: Vec<Slot>,
    /// 上一轮回复在追问的槽位
    pub asking: Option<Slot>,
    pub log: ConversationLog,
}

pub struct ConversationEngine {
    backend: Option<Backend>,
    slots: SlotStore,
    asked: Option<Slot>,
    log: ConversationLog,
    composer: PromptComposer,
}

impl ConversationEngine {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        extractor: Arc<dyn Extractor>,
        search: Option<SearchAugmenter>,
        settings: EngineSettings,
    ) -> Self {
        let chat = ChatSession::new(llm, settings.system_prompt, settings.max_context_turns);
        Self {
            backend: Some(Backend {
                chat,
                extractor,
                search,
                request_timeout: Duration::from_secs(settings.request_timeout_secs),
            }),
            slots: SlotStore::new(),
            asked: None,
            log: ConversationLog::new(),
            composer: PromptComposer::new(),
        }
    }

    /// 模型未能配置：每轮都只返回 [`NOT_CONFIGURED_REPLY`]
    pub fn unconfigured() -> Self {
        Self {
            backend: None,
            slots: SlotStore::new(),
            asked: None,
            log: ConversationLog::new(),
            composer: PromptComposer::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    pub fn slots(&self) -> &SlotStore {
        &self.slots
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn phase(&self) -> DialoguePhase {
        policy::phase(&self.slots)
    }

    /// 上一轮回复追问的槽位；尚未追问或已进入规划时为 None
    pub fn asking(&self) -> Option<Slot> {
        self.asked
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            configured: self.is_configured(),
            phase: self.phase(),
            slots: self.slots.clone(),
            missing: policy::missing(&self.slots),
            asking: self.asked,
            log: self.log.clone(),
        }
    }

    /// 清空槽位、日志与模型对话历史，回到收集阶段
    pub fn reset(&mut self) {
        self.slots.clear();
        self.asked = None;
        self.log.clear();
        if let Some(backend) = self.backend.as_mut() {
            backend.chat.clear();
        }
    }

    /// 处理一条用户输入并返回回复文本；任何失败都以固定文案返回，不会向上抛错
    pub async fn handle_turn(&mut self, text: &str) -> String {
        let Self {
            backend,
            slots,
            asked,
            log,
            composer,
        } = self;
        let Some(backend) = backend.as_mut() else {
            tracing::warn!("model not configured, refusing turn");
            return NOT_CONFIGURED_REPLY.to_string();
        };

        match classify(text) {
            TurnKind::Search(query) => search_turn(backend, composer, log, text, &query).await,
            TurnKind::Dialogue => dialogue_turn(backend, composer, slots, asked, log, text).await,
        }
    }
}

async fn search_turn(
    backend: &mut Backend,
    composer: &PromptComposer,
    log: &mut ConversationLog,
    text: &str,
    query: &str,
) -> String {
    let results = match &backend.search {
        Some(search) => search.search(query, search.max_results()).await,
        None => {
            tracing::warn!("web search disabled");
            Vec::new()
        }
    };
    tracing::info!(query = %query, results = results.len(), "search turn");
    if results.is_empty() {
        return NO_RESULTS_REPLY.to_string();
    }

    let prompt = composer.search_augmented(query, &results);
    match backend.send(&prompt).await {
        Ok(reply) => {
            log.push(Speaker::User, text);
            log.push(Speaker::Agent, reply.clone());
            reply
        }
        Err(e) => {
            tracing::warn!(error = %e, "search-augmented call failed");
            APOLOGY_REPLY.to_string()
        }
    }
}

async fn dialogue_turn(
    backend: &mut Backend,
    composer: &PromptComposer,
    slots: &mut SlotStore,
    asked: &mut Option<Slot>,
    log: &mut ConversationLog,
    text: &str,
) -> String {
    let update = match backend.extractor.extract(text, slots, *asked).await {
        Ok(update) => update,
        Err(e) => {
            tracing::warn!(extractor = backend.extractor.name(), error = %e, "extraction failed, no new slots");
            SlotUpdate::new()
        }
    };

    let mut staged = slots.clone();
    let filled = staged.apply(&update);

    let (prompt, asking) = match policy::next_question(&staged) {
        Some(slot) => (composer.ask_next_slot(slot, &staged), Some(slot)),
        None => (composer.final_plan(&staged), None),
    };
    tracing::info!(
        filled = ?filled,
        asking = ?asking,
        "dialogue turn"
    );

    match backend.send(&prompt).await {
        Ok(reply) => {
            *slots = staged;
            *asked = asking;
            log.push(Speaker::User, text);
            log.push(Speaker::Agent, reply.clone());
            reply
        }
        Err(e) => {
            tracing::warn!(error = %e, "model call failed, turn discarded");
            APOLOGY_REPLY.to_string()
        }
    }
}
