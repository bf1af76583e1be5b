//! 槽位抽取：启发式（关键词 / 正则）与模型委托（JSON）两种策略
//!
//! 两种策略都只产出「空槽位」的更新，不会覆盖已有值。
//! 启发式对 destination / interests 没有判别词汇：当它们正是上一轮追问的槽位时，任何非空文本都被接受；
//! 开场白（尚未追问任何槽位）只认强模式。
//! 模型返回的文本只按 JSON 数据解析，解析失败视为无新信息。

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tokio::time::timeout;

use crate::config::ExtractorKind;
use crate::core::PlannerError;
use crate::dialogue::{Slot, SlotStore, SlotUpdate};
use crate::llm::LlmClient;

/// 抽取策略
#[async_trait]
pub trait Extractor: Send + Sync {
    fn name(&self) -> &str;

    /// 从一条用户输入中抽取槽位；只包含 current 中为空的槽位。
    /// asked 是上一轮回复里追问的槽位（开场或检索之后可能为 None）
    async fn extract(
        &self,
        text: &str,
        current: &SlotStore,
        asked: Option<Slot>,
    ) -> Result<SlotUpdate, PlannerError>;
}

/// 按配置创建抽取器
pub fn build_extractor(
    kind: ExtractorKind,
    llm: Arc<dyn LlmClient>,
    timeout_secs: u64,
) -> Arc<dyn Extractor> {
    match kind {
        ExtractorKind::Heuristic => Arc::new(HeuristicExtractor::new()),
        ExtractorKind::Model => Arc::new(ModelExtractor::new(llm, timeout_secs)),
    }
}

/// 去掉已填写的槽位
fn only_empty(update: SlotUpdate, current: &SlotStore) -> SlotUpdate {
    let mut out = SlotUpdate::new();
    for (slot, value) in update.iter() {
        if !current.is_filled(slot) {
            out.insert(slot, value);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// 启发式
// ---------------------------------------------------------------------------

const MONTHS: &str = "january|february|march|april|june|july|august|september|october|november|december|jan|feb|apr|jun|jul|aug|sept|sep|oct|nov|dec";
const NUMBER_WORDS: &str = "one|two|three|four|five|six|seven|eight|nine|ten";

fn budget_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(?:[$€£¥]\s?\d[\d,.]*\s*k?\b)|(?:\b\d[\d,.]*\s*k?\s*(?:usd|eur|gbp|dollars?|euros?|pounds?|bucks)\b)",
        )
        .expect("valid regex")
    })
}

fn budget_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:cheap|budget|affordable|luxury|luxurious|mid-range|moderate|backpacker|splurge)\b")
            .expect("valid regex")
    })
}

fn dates_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?i)\b(?:{months})\b|\bmay\s+\d|\b\d{{1,2}}(?:st|nd|rd|th)?\s+may\b|\b(?:in|early|mid|late|during)[-\s]+may\b|\b\d{{1,2}}/\d{{1,2}}(?:/\d{{2,4}})?\b|\b\d{{1,2}}[.-]\d{{1,2}}[.-]\d{{2,4}}\b|\b\d{{4}}-\d{{1,2}}-\d{{1,2}}\b|\b(?:summer|winter|spring|autumn|christmas|easter|new year|next week|next month|this weekend|next weekend)\b",
            months = MONTHS
        ))
        .expect("valid regex")
    })
}

fn duration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:\d+|a|one|two|three|four)\s+(?:days?|nights?|weeks?|months?)\b|\bweekend\b")
            .expect("valid regex")
    })
}

fn travelers_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?i)\b(?:\d+(?:\s*(?:-|to)\s*\d+)?|{numbers})\s+(?:people|persons|travell?ers|adults|kids|children|friends|guests|pax|of us)\b|\b(?:solo|alone|by myself|just me|couple|my partner|my wife|my husband|my family|honeymoon)\b",
            numbers = NUMBER_WORDS
        ))
        .expect("valid regex")
    })
}

fn count_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"(?i)\b(?:\d+|{numbers}|family|friends)\b", numbers = NUMBER_WORDS))
            .expect("valid regex")
    })
}

fn constraints_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:vegetarian|vegan|gluten|halal|kosher|allerg\w*|wheelchair|accessib\w*|mobility|visa|dietary|avoid\w*|no flights?|pets?)\b",
        )
        .expect("valid regex")
    })
}

fn negation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(?:no|none|nothing|nope|n/a)\b").expect("valid regex"))
}

fn has_digit(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
}

/// 关键词 / 模式匹配抽取，不调用模型
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicExtractor;

impl HeuristicExtractor {
    pub fn new() -> Self {
        Self
    }

    /// 同步版本，便于测试与复用
    pub fn extract_sync(&self, text: &str, current: &SlotStore, asked: Option<Slot>) -> SlotUpdate {
        let text = text.trim();
        let mut update = SlotUpdate::new();
        if text.is_empty() {
            return update;
        }
        let target = asked.filter(|slot| !current.is_filled(*slot));

        for slot in Slot::ALL {
            if current.is_filled(slot) {
                continue;
            }
            let is_target = target == Some(slot);
            if let Some(value) = match_slot(slot, text, is_target) {
                update.insert(slot, value);
            }
        }
        update
    }
}

/// 单个槽位的匹配；is_target 表示本轮输入是在回答该槽位的追问，此时接受更宽松的证据
fn match_slot(slot: Slot, text: &str, is_target: bool) -> Option<String> {
    match slot {
        // 无判别词汇：轮到它时接受任何文本
        Slot::Destination | Slot::Interests => is_target.then(|| text.to_string()),
        Slot::Budget => {
            if let Some(m) = budget_re().find(text) {
                return Some(m.as_str().trim().to_string());
            }
            let weak = has_digit(text) || budget_word_re().is_match(text);
            (is_target && weak).then(|| text.to_string())
        }
        Slot::Dates => {
            if dates_re().is_match(text) {
                return Some(text.to_string());
            }
            let weak = has_digit(text) || duration_re().is_match(text);
            (is_target && weak).then(|| text.to_string())
        }
        Slot::Travelers => {
            if let Some(m) = travelers_re().find(text) {
                return Some(m.as_str().trim().to_string());
            }
            (is_target && count_re().is_match(text)).then(|| text.to_string())
        }
        Slot::Constraints => {
            if constraints_re().is_match(text) {
                return Some(text.to_string());
            }
            (is_target && negation_re().is_match(text)).then(|| text.to_string())
        }
    }
}

#[async_trait]
impl Extractor for HeuristicExtractor {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn extract(
        &self,
        text: &str,
        current: &SlotStore,
        asked: Option<Slot>,
    ) -> Result<SlotUpdate, PlannerError> {
        Ok(self.extract_sync(text, current, asked))
    }
}

// ---------------------------------------------------------------------------
// 模型委托
// ---------------------------------------------------------------------------

pub const EXTRACTION_PROMPT: &str = "Extract trip-planning details from the user's message. \
Respond with ONLY a JSON object with exactly these keys: \"destination\", \"budget\", \"dates\", \
\"travelers\", \"interests\", \"constraints\". Use a string value for every detail the message states \
and null for anything it does not mention. Do not add explanations or Markdown.";

/// 从模型文本中取出 JSON 对象（```json 代码块或首个 { 到最后一个 }）
fn json_region(output: &str) -> &str {
    let trimmed = output.trim();
    if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        return rest.find("```").map(|end| rest[..end].trim()).unwrap_or(rest.trim());
    }
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => trimmed,
    }
}

/// 把模型回复解析为槽位更新：未知键忽略，null / 空串不计，数字与布尔转为字符串
pub fn parse_extraction(output: &str) -> Result<SlotUpdate, PlannerError> {
    let json = json_region(output);
    let map: serde_json::Map<String, Value> = serde_json::from_str(json)
        .map_err(|e| PlannerError::Extraction(format!("{}: {}", e, json)))?;

    let mut update = SlotUpdate::new();
    for (key, value) in map {
        let Some(slot) = Slot::from_name(&key) else {
            continue;
        };
        let value = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null | Value::Array(_) | Value::Object(_) => continue,
        };
        if value.trim().eq_ignore_ascii_case("null") {
            continue;
        }
        update.insert(slot, value);
    }
    Ok(update)
}

/// 让模型做结构化抽取（无状态单次调用，不进入对话历史）
pub struct ModelExtractor {
    llm: Arc<dyn LlmClient>,
    timeout: Duration,
}

impl ModelExtractor {
    pub fn new(llm: Arc<dyn LlmClient>, timeout_secs: u64) -> Self {
        Self {
            llm,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn prompt_for(text: &str) -> String {
        format!("{}\n\nUser message:\n{}", EXTRACTION_PROMPT, text)
    }
}

#[async_trait]
impl Extractor for ModelExtractor {
    fn name(&self) -> &str {
        "model"
    }

    async fn extract(
        &self,
        text: &str,
        current: &SlotStore,
        _asked: Option<Slot>,
    ) -> Result<SlotUpdate, PlannerError> {
        if text.trim().is_empty() {
            return Ok(SlotUpdate::new());
        }
        let prompt = Self::prompt_for(text);
        let raw = timeout(self.timeout, self.llm.complete_once(&prompt))
            .await
            .map_err(|_| PlannerError::Timeout(self.timeout.as_secs(), "extraction".into()))?
            .map_err(|e| PlannerError::Extraction(e.to_string()))?;
        tracing::debug!(raw = %raw, "model extraction reply");
        Ok(only_empty(parse_extraction(&raw)?, current))
    }
}
