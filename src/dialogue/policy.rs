//! 完成度判定：还缺哪些槽位、下一个该问哪个
//!
//! 纯函数，只依赖槽位内容。

use serde::Serialize;

use crate::dialogue::{Slot, SlotStore};

/// 对话阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DialoguePhase {
    /// 至少一个槽位为空
    Collecting,
    /// 全部槽位已填，每轮重新生成规划
    Ready,
}

/// 按规范顺序列出为空的槽位
pub fn missing(slots: &SlotStore) -> Vec<Slot> {
    Slot::ALL
        .into_iter()
        .filter(|s| !slots.is_filled(*s))
        .collect()
}

/// 第一个为空的槽位；None 表示已全部填写
pub fn next_question(slots: &SlotStore) -> Option<Slot> {
    Slot::ALL.into_iter().find(|s| !slots.is_filled(*s))
}

pub fn phase(slots: &SlotStore) -> DialoguePhase {
    match next_question(slots) {
        Some(_) => DialoguePhase::Collecting,
        None => DialoguePhase::Ready,
    }
}
