//! Waypoint - Rust 行程规划助手
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型、引擎工厂、会话管理
//! - **dialogue**: 槽位存储、抽取策略、完成度判定、提示词组装、对话引擎
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）与多轮会话
//! - **observability**: 日志初始化
//! - **search**: 网页搜索提供方与检索增强过滤

pub mod config;
pub mod core;
pub mod dialogue;
pub mod llm;
pub mod observability;
pub mod search;

pub use crate::core::{EngineFactory, PlannerError, SessionManager};
pub use dialogue::{ConversationEngine, Slot, SlotStore};
