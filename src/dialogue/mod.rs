//! 对话层：槽位存储、对话日志、抽取策略、完成度判定、提示词组装与对话引擎

pub mod engine;
pub mod extractor;
pub mod log;
pub mod policy;
pub mod prompts;
pub mod slots;

pub use engine::{
    classify, ConversationEngine, EngineSettings, EngineSnapshot, TurnKind, APOLOGY_REPLY,
    NOT_CONFIGURED_REPLY, NO_RESULTS_REPLY,
};
pub use extractor::{
    build_extractor, parse_extraction, Extractor, HeuristicExtractor, ModelExtractor,
    EXTRACTION_PROMPT,
};
pub use log::{ConversationLog, Speaker, Turn};
pub use policy::{missing, next_question, DialoguePhase};
pub use prompts::{question_for, PromptComposer, SEARCH_SYSTEM_PROMPT};
pub use slots::{Slot, SlotStore, SlotUpdate};
