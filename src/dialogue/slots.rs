//! 槽位与槽位存储
//!
//! 六个固定槽位，声明顺序即抽取检查顺序与提问顺序。
//! SlotStore 只接受「填空」：已有非空值的槽位不会被后续抽取覆盖。

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// 行程规划槽位（Ord 按声明顺序，即规范优先级）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Destination,
    Budget,
    Dates,
    Travelers,
    Interests,
    Constraints,
}

impl Slot {
    /// 规范顺序
    pub const ALL: [Slot; 6] = [
        Slot::Destination,
        Slot::Budget,
        Slot::Dates,
        Slot::Travelers,
        Slot::Interests,
        Slot::Constraints,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Slot::Destination => "destination",
            Slot::Budget => "budget",
            Slot::Dates => "dates",
            Slot::Travelers => "travelers",
            Slot::Interests => "interests",
            Slot::Constraints => "constraints",
        }
    }

    /// 按名称查找（大小写不敏感），未知名称返回 None
    pub fn from_name(name: &str) -> Option<Slot> {
        let name = name.trim().to_lowercase();
        Slot::ALL.into_iter().find(|s| s.as_str() == name)
    }

    /// 面向用户的标签
    pub fn label(&self) -> &'static str {
        match self {
            Slot::Destination => "Destination",
            Slot::Budget => "Budget",
            Slot::Dates => "Travel dates",
            Slot::Travelers => "Travelers",
            Slot::Interests => "Interests",
            Slot::Constraints => "Constraints",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一次抽取得到的部分槽位；只保存非空值
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SlotUpdate(BTreeMap<Slot, String>);

impl SlotUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// 去除首尾空白后为空的值被忽略；返回是否写入
    pub fn insert(&mut self, slot: Slot, value: impl Into<String>) -> bool {
        let value = value.into();
        let value = value.trim();
        if value.is_empty() {
            return false;
        }
        self.0.insert(slot, value.to_string());
        true
    }

    pub fn get(&self, slot: Slot) -> Option<&str> {
        self.0.get(&slot).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Slot, &str)> {
        self.0.iter().map(|(s, v)| (*s, v.as_str()))
    }
}

/// 当前会话的槽位值
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SlotStore {
    values: BTreeMap<Slot, String>,
}

impl SlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由 (槽位, 值) 列表构建，空值被忽略
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (Slot, &'a str)>) -> Self {
        let mut store = Self::new();
        for (slot, value) in pairs {
            store.fill(slot, value);
        }
        store
    }

    pub fn get(&self, slot: Slot) -> Option<&str> {
        self.values.get(&slot).map(String::as_str)
    }

    pub fn is_filled(&self, slot: Slot) -> bool {
        self.get(slot).is_some_and(|v| !v.is_empty())
    }

    /// 仅当槽位为空时写入；返回是否写入
    pub fn fill(&mut self, slot: Slot, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() || self.is_filled(slot) {
            return false;
        }
        self.values.insert(slot, value.to_string());
        true
    }

    /// 应用抽取结果（逐字段填空），返回实际写入的槽位
    pub fn apply(&mut self, update: &SlotUpdate) -> Vec<Slot> {
        update
            .iter()
            .filter_map(|(slot, value)| self.fill(slot, value).then_some(slot))
            .collect()
    }

    /// 按规范顺序遍历全部槽位
    pub fn iter(&self) -> impl Iterator<Item = (Slot, Option<&str>)> + '_ {
        Slot::ALL.into_iter().map(move |s| (s, self.get(s)))
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_order() {
        let names: Vec<&str> = Slot::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(
            names,
            ["destination", "budget", "dates", "travelers", "interests", "constraints"]
        );
        let mut sorted = Slot::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, Slot::ALL.to_vec());
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Slot::from_name(" Budget "), Some(Slot::Budget));
        assert_eq!(Slot::from_name("hotel"), None);
    }

    #[test]
    fn test_fill_never_overwrites() {
        let mut store = SlotStore::new();
        assert!(store.fill(Slot::Destination, "Bali"));
        assert!(!store.fill(Slot::Destination, "Lisbon"));
        assert_eq!(store.get(Slot::Destination), Some("Bali"));
    }

    #[test]
    fn test_blank_values_do_not_count() {
        let mut store = SlotStore::new();
        assert!(!store.fill(Slot::Budget, "   "));
        assert!(!store.is_filled(Slot::Budget));

        let mut update = SlotUpdate::new();
        assert!(!update.insert(Slot::Dates, ""));
        assert!(update.is_empty());
    }

    #[test]
    fn test_apply_reports_only_written_slots() {
        let mut store = SlotStore::from_pairs([(Slot::Destination, "Bali")]);
        let mut update = SlotUpdate::new();
        update.insert(Slot::Destination, "Rome");
        update.insert(Slot::Budget, "$2000");

        let written = store.apply(&update);
        assert_eq!(written, vec![Slot::Budget]);
        assert_eq!(store.get(Slot::Destination), Some("Bali"));
        assert_eq!(store.get(Slot::Budget), Some("$2000"));
    }

    #[test]
    fn test_serializes_as_named_map() {
        let store = SlotStore::from_pairs([(Slot::Travelers, "2"), (Slot::Destination, "Bali")]);
        let json = serde_json::to_string(&store).unwrap();
        assert_eq!(json, r#"{"destination":"Bali","travelers":"2"}"#);
    }
}
