//! 网页搜索协作方抽象
//!
//! 提供方返回原始条目（字段可能缺失），过滤与编号由 SearchAugmenter 负责。

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::PlannerError;

/// 提供方返回的原始条目（字段名沿用常见搜索 API：title / href / body）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSearchHit {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

impl RawSearchHit {
    pub fn new(title: &str, href: &str, body: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            href: Some(href.to_string()),
            body: Some(body.to_string()),
        }
    }
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn text_search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<RawSearchHit>, PlannerError>;
}

/// 固定结果的提供方（测试与离线使用）；记录收到的查询
#[derive(Debug, Default)]
pub struct StaticSearchProvider {
    hits: Vec<RawSearchHit>,
    error: Option<String>,
    queries: Mutex<Vec<(String, usize)>>,
}

impl StaticSearchProvider {
    pub fn new(hits: Vec<RawSearchHit>) -> Self {
        Self {
            hits,
            ..Self::default()
        }
    }

    /// 每次调用都失败
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// 收到的 (query, max_results)
    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SearchProvider for StaticSearchProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn text_search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<RawSearchHit>, PlannerError> {
        if let Ok(mut q) = self.queries.lock() {
            q.push((query.to_string(), max_results));
        }
        match &self.error {
            Some(e) => Err(PlannerError::Search(e.clone())),
            None => Ok(self.hits.clone()),
        }
    }
}
