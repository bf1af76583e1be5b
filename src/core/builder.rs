//! 引擎工厂：统一的初始化逻辑
//!
//! 启动时读取一次 API Key（缺失即失败），构建共享的模型客户端、抽取策略与搜索提供方；
//! 之后每个会话通过 [`EngineFactory::create`] 得到独立的 ConversationEngine。

use std::sync::Arc;

use crate::config::AppConfig;
use crate::core::PlannerError;
use crate::dialogue::{build_extractor, ConversationEngine, EngineSettings, Extractor};
use crate::llm::{build_llm, redact_key, LlmClient};
use crate::search::{DuckDuckGoSearch, SearchAugmenter, SearchProvider};

/// 所有会话共享的协作方（只读），每个会话的可变状态在引擎内部
#[derive(Clone)]
pub struct EngineFactory {
    llm: Option<Arc<dyn LlmClient>>,
    extractor: Option<Arc<dyn Extractor>>,
    search: Option<SearchAugmenter>,
    settings: EngineSettings,
}

impl EngineFactory {
    /// 按配置构建；API Key 缺失返回 Configuration 错误。
    /// Key 存在但客户端无法构建时（如未知 provider）记录错误，之后的会话只返回「未配置」文案。
    pub fn from_config(cfg: &AppConfig) -> Result<Self, PlannerError> {
        let api_key = cfg.api_key()?;
        tracing::info!(key = %redact_key(&api_key), "API key loaded");

        let search: Option<Arc<dyn SearchProvider>> = if cfg.search.enabled {
            Some(Arc::new(DuckDuckGoSearch::new(
                &cfg.search.endpoint,
                cfg.search.timeout_secs,
            )))
        } else {
            None
        };

        match build_llm(cfg, &api_key) {
            Ok(llm) => Ok(Self::new(llm, search, cfg)),
            Err(e) => {
                tracing::error!(error = %e, "failed to configure model client");
                Ok(Self::unconfigured(cfg))
            }
        }
    }

    /// 直接注入模型与搜索提供方（测试或自定义后端）
    pub fn new(
        llm: Arc<dyn LlmClient>,
        search: Option<Arc<dyn SearchProvider>>,
        cfg: &AppConfig,
    ) -> Self {
        let extractor = build_extractor(cfg.dialogue.extractor, llm.clone(), cfg.llm.timeouts.request);
        tracing::info!(extractor = extractor.name(), "slot extractor selected");
        let search = search.map(|provider| {
            SearchAugmenter::new(provider, cfg.search.max_results, cfg.search.timeout_secs)
        });
        Self {
            llm: Some(llm),
            extractor: Some(extractor),
            search,
            settings: Self::settings_from(cfg),
        }
    }

    pub fn unconfigured(cfg: &AppConfig) -> Self {
        Self {
            llm: None,
            extractor: None,
            search: None,
            settings: Self::settings_from(cfg),
        }
    }

    fn settings_from(cfg: &AppConfig) -> EngineSettings {
        EngineSettings {
            system_prompt: cfg.system_prompt(),
            max_context_turns: cfg.app.max_context_turns,
            request_timeout_secs: cfg.llm.timeouts.request,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.llm.is_some()
    }

    /// 为一个新会话创建引擎
    pub fn create(&self) -> ConversationEngine {
        match (&self.llm, &self.extractor) {
            (Some(llm), Some(extractor)) => ConversationEngine::new(
                llm.clone(),
                extractor.clone(),
                self.search.clone(),
                self.settings.clone(),
            ),
            _ => ConversationEngine::unconfigured(),
        }
    }
}
