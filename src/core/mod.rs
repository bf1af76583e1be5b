//! 核心层：错误类型、引擎工厂、会话管理

pub mod builder;
pub mod error;
pub mod sessions;

pub use builder::EngineFactory;
pub use error::PlannerError;
pub use sessions::{Session, SessionId, SessionManager};
