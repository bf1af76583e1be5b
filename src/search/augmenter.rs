//! 检索增强：调用搜索提供方，过滤并规范化结果
//!
//! 只保留 title 与 url 均非空的条目，截断到 max_results，保持提供方顺序；
//! 提供方出错或超时一律返回空列表，调用方把空列表当作「没有可用结果」。

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::timeout;

use crate::search::{RawSearchHit, SearchProvider};

pub const DEFAULT_MAX_RESULTS: usize = 6;

/// 规范化后的结果；在序列中的位置（1 起）即引用编号
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

impl SearchResult {
    fn from_hit(hit: RawSearchHit) -> Option<Self> {
        let title = hit.title.unwrap_or_default().trim().to_string();
        let url = hit.href.unwrap_or_default().trim().to_string();
        if title.is_empty() || url.is_empty() {
            return None;
        }
        Some(Self {
            title,
            url,
            snippet: hit.body.unwrap_or_default().trim().to_string(),
        })
    }
}

/// 过滤原始条目（纯函数）
pub fn normalize_hits(hits: Vec<RawSearchHit>, max_results: usize) -> Vec<SearchResult> {
    hits.into_iter()
        .filter_map(SearchResult::from_hit)
        .take(max_results)
        .collect()
}

#[derive(Clone)]
pub struct SearchAugmenter {
    provider: Arc<dyn SearchProvider>,
    max_results: usize,
    timeout: Duration,
}

impl SearchAugmenter {
    pub fn new(provider: Arc<dyn SearchProvider>, max_results: usize, timeout_secs: u64) -> Self {
        Self {
            provider,
            max_results,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// 配置中的默认结果数
    pub fn max_results(&self) -> usize {
        self.max_results
    }

    pub async fn search(&self, query: &str, max_results: usize) -> Vec<SearchResult> {
        let outcome = timeout(self.timeout, self.provider.text_search(query, max_results)).await;
        match outcome {
            Ok(Ok(hits)) => {
                let raw = hits.len();
                let results = normalize_hits(hits, max_results);
                tracing::info!(
                    provider = self.provider.name(),
                    raw,
                    kept = results.len(),
                    "web search done"
                );
                results
            }
            Ok(Err(e)) => {
                tracing::warn!(provider = self.provider.name(), error = %e, "web search failed");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    timeout_secs = self.timeout.as_secs(),
                    "web search timed out"
                );
                Vec::new()
            }
        }
    }
}
