//! 规划器错误类型
//!
//! 只有 Configuration 会向上抛出并阻止引擎构建；其余错误在各自组件内被恢复：
//! Extraction 视为「无新信息」，Search 视为空结果，ModelCall / Timeout 转为固定致歉文案。

use thiserror::Error;

/// 对话引擎运行过程中可能出现的错误
#[derive(Error, Debug)]
pub enum PlannerError {
    /// 缺少或无效的 API Key 等配置问题，构建阶段直接失败
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Model call error: {0}")]
    ModelCall(String),

    /// 外部调用超过配置的超时时间（模型或搜索）
    #[error("Timed out after {0}s: {1}")]
    Timeout(u64, String),
}

impl PlannerError {
    /// 是否属于构建期致命错误
    pub fn is_fatal(&self) -> bool {
        matches!(self, PlannerError::Configuration(_))
    }
}
