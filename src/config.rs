//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `WAYPOINT__*` 覆盖（双下划线表示嵌套，如 `WAYPOINT__LLM__PROVIDER=openai`）。
//! API Key 是唯一必需的密钥，由 [`AppConfig::api_key`] 在启动时读取一次。

use std::path::PathBuf;

use serde::Deserialize;

use crate::core::PlannerError;

/// 读取 API Key 的环境变量，按优先级排列
pub const API_KEY_ENV_VARS: [&str; 3] = ["WAYPOINT_API_KEY", "DEEPSEEK_API_KEY", "OPENAI_API_KEY"];

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub search: SearchSection,
    #[serde(default)]
    pub dialogue: DialogueSection,
}

/// [app] 段：应用名、对话历史轮数、会话过期时间
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    pub name: Option<String>,
    /// 每个会话保留给模型的对话轮数
    #[serde(default = "default_max_context_turns")]
    pub max_context_turns: usize,
    /// 会话闲置多久后可被清理（秒）
    #[serde(default = "default_session_timeout_secs")]
    pub session_timeout_secs: u64,
    /// 可选系统提示词；未设置时尝试读取 config/prompts/system.md
    pub system_prompt: Option<String>,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            max_context_turns: default_max_context_turns(),
            session_timeout_secs: default_session_timeout_secs(),
            system_prompt: None,
        }
    }
}

fn default_max_context_turns() -> usize {
    20
}

fn default_session_timeout_secs() -> u64 {
    1800
}

/// [llm] 段：后端选择、模型、超时
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    /// 后端：deepseek / openai
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    /// 一般通过环境变量提供；写在文件里时同样生效
    pub api_key: Option<String>,
    #[serde(default)]
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            api_key: None,
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

fn default_provider() -> String {
    "deepseek".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmTimeoutsSection {
    #[serde(default = "default_request_timeout")]
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self {
            request: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    60
}

/// [search] 段：网页搜索开关、结果数、超时、端点
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSection {
    #[serde(default = "default_search_enabled")]
    pub enabled: bool,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_search_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            enabled: default_search_enabled(),
            max_results: default_max_results(),
            timeout_secs: default_search_timeout_secs(),
            endpoint: default_search_endpoint(),
        }
    }
}

fn default_search_enabled() -> bool {
    true
}

fn default_max_results() -> usize {
    6
}

fn default_search_timeout_secs() -> u64 {
    15
}

fn default_search_endpoint() -> String {
    "https://html.duckduckgo.com/html/".to_string()
}

/// 槽位抽取策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorKind {
    /// 关键词 / 模式匹配，不调用模型
    #[default]
    Heuristic,
    /// 让模型返回 JSON 结构化结果
    Model,
}

/// [dialogue] 段
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DialogueSection {
    #[serde(default)]
    pub extractor: ExtractorKind,
}

impl AppConfig {
    /// 读取 API Key：配置文件优先，其次依次尝试 [`API_KEY_ENV_VARS`]；空白值视为缺失
    pub fn api_key(&self) -> Result<String, PlannerError> {
        self.llm
            .api_key
            .clone()
            .into_iter()
            .chain(API_KEY_ENV_VARS.iter().filter_map(|k| std::env::var(k).ok()))
            .map(|k| k.trim().to_string())
            .find(|k| !k.is_empty())
            .ok_or_else(|| {
                PlannerError::Configuration(format!(
                    "API key not found; set one of {} (a .env file is also read)",
                    API_KEY_ENV_VARS.join(", ")
                ))
            })
    }

    /// 系统提示词：配置 > config/prompts/system.md > 无
    pub fn system_prompt(&self) -> Option<String> {
        self.app.system_prompt.clone().or_else(|| {
            ["config/prompts/system.md", "../config/prompts/system.md"]
                .into_iter()
                .find_map(|p| std::fs::read_to_string(p).ok())
                .filter(|s| !s.trim().is_empty())
        })
    }
}

/// 从 config 目录加载配置，环境变量 WAYPOINT__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 WAYPOINT__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("WAYPOINT")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
