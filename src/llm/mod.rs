//! LLM 层：消息类型、客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）、多轮会话

pub mod deepseek;
pub mod message;
pub mod mock;
pub mod openai;
pub mod provider;
pub mod session;
pub mod traits;

pub use deepseek::{create_deepseek_client, DEEPSEEK_CHAT};
pub use message::{Message, Role};
pub use mock::MockLlmClient;
pub use openai::OpenAiClient;
pub use provider::{build_llm, redact_key};
pub use session::ChatSession;
pub use traits::LlmClient;
