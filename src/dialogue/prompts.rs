//! 提示词组装：追问下一个槽位、检索增强回答、最终行程规划
//!
//! 三个模板都是输入的纯函数；是否已到达可规划状态由调用方（CompletionPolicy）负责。

use crate::dialogue::{Slot, SlotStore};
use crate::search::SearchResult;

/// 检索增强模式下的系统指令，要求模型用 [n] 标注引用
pub const SEARCH_SYSTEM_PROMPT: &str = "You are an AI research assistant. Use the provided web search results \
to answer the user query. Synthesize concisely, cite sources inline like [1], [2] where relevant, \
and include a brief summary.";

/// 每个槽位的固定问句
pub fn question_for(slot: Slot) -> &'static str {
    match slot {
        Slot::Destination => "Where would you like to travel?",
        Slot::Budget => "What is your approximate budget for this trip?",
        Slot::Dates => "When are you planning to travel, and for how long?",
        Slot::Travelers => "How many people will be traveling?",
        Slot::Interests => "What kinds of activities or experiences interest you most?",
        Slot::Constraints => {
            "Do you have any constraints or special requirements (diet, mobility, visas)? Say \"none\" if not."
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PromptComposer;

impl PromptComposer {
    pub fn new() -> Self {
        Self
    }

    /// 让模型针对一个缺失槽位只问一个简短问题；已知槽位作为上下文附上
    pub fn ask_next_slot(&self, slot: Slot, slots: &SlotStore) -> String {
        let known: Vec<String> = slots
            .iter()
            .filter_map(|(s, v)| v.map(|v| format!("- {}: {}", s.label(), v)))
            .collect();
        let known = if known.is_empty() {
            "(nothing yet)".to_string()
        } else {
            known.join("\n")
        };

        format!(
            "You are a friendly travel-planning assistant collecting trip details from the user.\n\
             Details collected so far:\n{known}\n\n\
             Ask the user exactly ONE concise question about their {label} ({slot}). \
             Do not ask about anything else and do not start planning yet.\n\
             Suggested question: \"{question}\"",
            known = known,
            label = slot.label().to_lowercase(),
            slot = slot.as_str(),
            question = question_for(slot),
        )
    }

    /// 检索增强提示词：<system> 指令、<user_query> 原始问题、<web_results> 编号结果（1 起）
    pub fn search_augmented(&self, query: &str, results: &[SearchResult]) -> String {
        let refs_block = results
            .iter()
            .enumerate()
            .map(|(i, r)| format!("[{}] {} — {}\n{}", i + 1, r.title, r.url, r.snippet))
            .collect::<Vec<_>>()
            .join("\n\n");

        format!(
            "<system>\n{}\n</system>\n<user_query>\n{}\n</user_query>\n<web_results>\n{}\n</web_results>",
            SEARCH_SYSTEM_PROMPT, query, refs_block
        )
    }

    /// 最终规划提示词：嵌入全部槽位值
    pub fn final_plan(&self, slots: &SlotStore) -> String {
        let details = slots
            .iter()
            .map(|(s, v)| format!("- {}: {}", s.label(), v.unwrap_or_default()))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "You are an expert travel planner. Create a complete trip plan from the details below.\n\n\
             Trip details:\n{details}\n\n\
             Please provide:\n\
             1. Destination analysis: highlights, best areas to stay, and what to expect at that time of year.\n\
             2. A day-by-day itinerary that matches the travel dates and the travelers' interests.\n\
             3. Accommodation and activity suggestions that stay within the stated budget.\n\
             4. Practical travel tips, taking the stated constraints into account.\n\n\
             Present everything as a clearly structured write-up with headings and bullet points.",
            details = details
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(title: &str, url: &str, snippet: &str) -> SearchResult {
        SearchResult {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
        }
    }

    #[test]
    fn test_ask_prompt_targets_single_slot() {
        let composer = PromptComposer::new();
        let slots = SlotStore::from_pairs([(Slot::Destination, "Bali")]);
        let prompt = composer.ask_next_slot(Slot::Budget, &slots);

        assert!(prompt.contains("exactly ONE concise question"));
        assert!(prompt.contains("(budget)"));
        assert!(prompt.contains(question_for(Slot::Budget)));
        assert!(prompt.contains("- Destination: Bali"));
        assert!(!prompt.contains(question_for(Slot::Dates)));
    }

    #[test]
    fn test_ask_prompt_with_empty_store() {
        let prompt = PromptComposer::new().ask_next_slot(Slot::Destination, &SlotStore::new());
        assert!(prompt.contains("(nothing yet)"));
        assert!(prompt.contains("Where would you like to travel?"));
    }

    #[test]
    fn test_search_prompt_layout() {
        let results = vec![
            result("Top beaches", "https://a.example", "Kuta and Nusa Dua"),
            result("Bali guide", "https://b.example", ""),
        ];
        let prompt = PromptComposer::new().search_augmented("best beaches in Bali", &results);

        let expected = format!(
            "<system>\n{}\n</system>\n<user_query>\nbest beaches in Bali\n</user_query>\n<web_results>\n\
             [1] Top beaches — https://a.example\nKuta and Nusa Dua\n\n\
             [2] Bali guide — https://b.example\n\n</web_results>",
            SEARCH_SYSTEM_PROMPT
        );
        assert_eq!(prompt, expected);
        assert!(prompt.contains("cite sources inline like [1]"));
    }

    #[test]
    fn test_final_plan_embeds_every_value() {
        let slots = SlotStore::from_pairs([
            (Slot::Destination, "Bali"),
            (Slot::Budget, "$2000"),
            (Slot::Dates, "June"),
            (Slot::Travelers, "2"),
            (Slot::Interests, "beaches"),
            (Slot::Constraints, "none"),
        ]);
        let prompt = PromptComposer::new().final_plan(&slots);

        for (slot, value) in slots.iter() {
            let line = format!("- {}: {}", slot.label(), value.unwrap());
            assert!(prompt.contains(&line), "missing {}", line);
        }
        assert!(prompt.contains("itinerary"));
        assert!(prompt.contains("within the stated budget"));
        assert!(prompt.contains("travel tips"));
        assert!(prompt.contains("Destination analysis"));
    }
}
