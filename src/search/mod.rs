//! 网页搜索：提供方抽象（DuckDuckGo / 固定结果）与检索增强过滤

pub mod augmenter;
pub mod duckduckgo;
pub mod provider;

pub use augmenter::{normalize_hits, SearchAugmenter, SearchResult, DEFAULT_MAX_RESULTS};
pub use duckduckgo::DuckDuckGoSearch;
pub use provider::{RawSearchHit, SearchProvider, StaticSearchProvider};
