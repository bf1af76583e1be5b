//! DuckDuckGo HTML 搜索
//!
//! GET html.duckduckgo.com/html/?q=...，用正则从结果页抽出标题链接与摘要；
//! 标题与摘要去标签后交给 html2text 解码实体；跳转链接 (/l/?uddg=...) 还原为真实 URL，广告条目丢弃。

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use html2text::from_read;
use regex::Regex;
use reqwest::{Client, Url};

use crate::core::PlannerError;
use crate::search::{RawSearchHit, SearchProvider};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

fn title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<a[^>]*class="[^"]*result__a[^"]*"[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#)
            .expect("valid regex")
    })
}

fn snippet_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<(?:a|div|td)[^>]*class="[^"]*result__snippet[^"]*"[^>]*>(.*?)</(?:a|div|td)>"#)
            .expect("valid regex")
    })
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid regex"))
}

pub struct DuckDuckGoSearch {
    client: Client,
    endpoint: String,
}

impl DuckDuckGoSearch {
    pub fn new(endpoint: &str, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: endpoint.to_string(),
        }
    }
}

/// 去标签、解码实体、压缩空白
fn clean_fragment(fragment: &str) -> String {
    let stripped = tag_re().replace_all(fragment, "");
    let decoded = match from_read(stripped.as_bytes(), 10_000) {
        Ok(text) => text,
        Err(_) => stripped.to_string(),
    };
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 还原 DuckDuckGo 跳转链接；广告链接返回 None
fn resolve_href(raw: &str) -> Option<String> {
    let raw = raw.replace("&amp;", "&");
    let absolute = if raw.starts_with("//") {
        format!("https:{}", raw)
    } else {
        raw
    };
    let url = Url::parse(&absolute).ok()?;
    let is_ddg = url
        .host_str()
        .is_some_and(|h| h == "duckduckgo.com" || h.ends_with(".duckduckgo.com"));
    if !is_ddg {
        return Some(absolute);
    }
    if url.path() == "/y.js" {
        return None;
    }
    url.query_pairs()
        .find(|(k, _)| k == "uddg")
        .map(|(_, v)| v.into_owned())
}

/// 解析结果页：每个标题配对其后、下一个标题之前的第一段摘要
pub fn parse_results(html: &str, max_results: usize) -> Vec<RawSearchHit> {
    let titles: Vec<(usize, usize, String, String)> = title_re()
        .captures_iter(html)
        .filter_map(|c| {
            let whole = c.get(0)?;
            Some((
                whole.start(),
                whole.end(),
                c.get(1)?.as_str().to_string(),
                c.get(2)?.as_str().to_string(),
            ))
        })
        .collect();

    let snippets: Vec<(usize, String)> = snippet_re()
        .captures_iter(html)
        .filter_map(|c| Some((c.get(0)?.start(), c.get(1)?.as_str().to_string())))
        .collect();

    let mut hits = Vec::new();
    for (i, (_, end, href, title)) in titles.iter().enumerate() {
        let next_start = titles.get(i + 1).map(|t| t.0).unwrap_or(usize::MAX);
        let Some(href) = resolve_href(href) else {
            continue;
        };
        let body = snippets
            .iter()
            .find(|(pos, _)| *pos >= *end && *pos < next_start)
            .map(|(_, s)| clean_fragment(s))
            .unwrap_or_default();
        hits.push(RawSearchHit {
            title: Some(clean_fragment(title)),
            href: Some(href),
            body: Some(body),
        });
        if hits.len() >= max_results {
            break;
        }
    }
    hits
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn text_search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<RawSearchHit>, PlannerError> {
        tracing::info!(query = %query, "duckduckgo search");
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| PlannerError::Search(format!("Request failed: {}", e)))?;
        if !resp.status().is_success() {
            return Err(PlannerError::Search(format!("HTTP {}", resp.status())));
        }
        let body = resp
            .text()
            .await
            .map_err(|e| PlannerError::Search(format!("Read body: {}", e)))?;
        Ok(parse_results(&body, max_results))
    }
}
