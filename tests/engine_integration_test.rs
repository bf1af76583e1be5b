//! 对话引擎集成测试：完整的槽位收集流程、检索增强与失败策略

use std::sync::Arc;

use waypoint::config::AppConfig;
use waypoint::dialogue::{
    missing, next_question, ConversationEngine, DialoguePhase, EngineSettings, HeuristicExtractor,
    PromptComposer, Slot, SlotStore, Speaker, APOLOGY_REPLY, NOT_CONFIGURED_REPLY,
    SEARCH_SYSTEM_PROMPT,
};
use waypoint::llm::MockLlmClient;
use waypoint::search::{RawSearchHit, SearchAugmenter, SearchProvider, StaticSearchProvider};
use waypoint::EngineFactory;

fn engine(llm: Arc<MockLlmClient>, provider: Option<Arc<StaticSearchProvider>>) -> ConversationEngine {
    let search = provider.map(|p| SearchAugmenter::new(p as Arc<dyn SearchProvider>, 6, 5));
    ConversationEngine::new(
        llm,
        Arc::new(HeuristicExtractor::new()),
        search,
        EngineSettings::default(),
    )
}

fn full_slots() -> SlotStore {
    SlotStore::from_pairs([
        (Slot::Destination, "Bali"),
        (Slot::Budget, "$2000"),
        (Slot::Dates, "June"),
        (Slot::Travelers, "2"),
        (Slot::Interests, "beaches"),
        (Slot::Constraints, "none"),
    ])
}

#[tokio::test]
async fn test_planning_a_trip_asks_about_destination_only() {
    let llm = Arc::new(MockLlmClient::new());
    let mut engine = engine(llm.clone(), None);
    assert_eq!(missing(engine.slots()), Slot::ALL.to_vec());

    engine.handle_turn("Planning a trip").await;

    // 开场白不填任何槽位
    assert_eq!(engine.slots(), &SlotStore::new());
    assert_eq!(missing(engine.slots()), Slot::ALL.to_vec());

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("exactly ONE concise question"));
    assert!(prompts[0].contains("(destination)"));
    for slot in &Slot::ALL[1..] {
        assert!(!prompts[0].contains(&format!("({})", slot)), "asked about {}", slot);
    }
}

#[tokio::test]
async fn test_answer_to_destination_question_is_taken_verbatim() {
    let llm = Arc::new(MockLlmClient::new());
    let mut engine = engine(llm.clone(), None);

    engine.handle_turn("Planning a trip").await;
    // 宽松策略：回答目的地追问的任何文本都被接受
    engine.handle_turn("somewhere warm").await;
    assert_eq!(engine.slots().get(Slot::Destination), Some("somewhere warm"));
    assert!(llm.prompts()[1].contains("(budget)"));
}

#[tokio::test]
async fn test_full_collection_then_idempotent_replanning() {
    let llm = Arc::new(MockLlmClient::new());
    let mut engine = engine(llm.clone(), None);

    let turns = [
        ("Planning a trip", Some(Slot::Destination)),
        ("Bali", Some(Slot::Budget)),
        ("$2000", Some(Slot::Dates)),
        ("June", Some(Slot::Travelers)),
        ("2", Some(Slot::Interests)),
        ("beaches", Some(Slot::Constraints)),
        ("none", None),
    ];
    for (text, expected_next) in turns {
        engine.handle_turn(text).await;
        assert_eq!(next_question(engine.slots()), expected_next, "after {:?}", text);
        assert_eq!(engine.asking(), expected_next, "after {:?}", text);
    }
    assert_eq!(engine.slots(), &full_slots());
    assert_eq!(engine.phase(), DialoguePhase::Ready);

    let final_prompt = PromptComposer::new().final_plan(&full_slots());
    assert_eq!(llm.prompts().last(), Some(&final_prompt));

    // 就绪后每轮都重新生成同样的规划提示词，槽位不变
    engine.handle_turn("Paris instead, with $9000").await;
    assert_eq!(llm.prompts().last(), Some(&final_prompt));
    assert_eq!(engine.slots(), &full_slots());
    assert_eq!(engine.log().len(), 16);
}

#[tokio::test]
async fn test_budget_answer_with_party_range_leaves_dates_open() {
    let llm = Arc::new(MockLlmClient::new());
    let mut engine = engine(llm.clone(), None);

    engine.handle_turn("Planning a trip").await;
    engine.handle_turn("Bali").await;
    engine.handle_turn("about $2000 for 2-3 people").await;

    assert_eq!(engine.slots().get(Slot::Budget), Some("$2000"));
    assert_eq!(engine.slots().get(Slot::Travelers), Some("2-3 people"));
    assert!(!engine.slots().is_filled(Slot::Dates));
    assert_eq!(engine.asking(), Some(Slot::Dates));
}

#[tokio::test]
async fn test_ready_store_sends_final_plan_exactly_once() {
    let cfg = AppConfig::default();
    let llm = Arc::new(MockLlmClient::new());
    let factory = EngineFactory::new(llm.clone(), None, &cfg);
    let mut engine = factory.create();

    // 逐轮填满，最后一轮触发规划
    for text in ["Planning a trip", "Bali", "$2000", "June", "2", "beaches"] {
        engine.handle_turn(text).await;
    }
    let calls_before = llm.call_count();
    llm.push_reply("Here is your Bali plan");
    let reply = engine.handle_turn("none").await;
    assert_eq!(llm.call_count(), calls_before + 1);

    let prompt = llm.prompts().pop().unwrap();
    for value in ["Bali", "$2000", "June", "2", "beaches", "none"] {
        assert!(prompt.contains(value), "final prompt missing {}", value);
    }
    assert_eq!(reply, "Here is your Bali plan");

    let last = engine.log().turns().last().unwrap();
    assert_eq!(last.role, Speaker::Agent);
    assert_eq!(last.text, reply);
}

#[tokio::test]
async fn test_search_turn_bypasses_extraction() {
    let llm = Arc::new(MockLlmClient::with_replies(["Kuta and Nusa Dua [1]"]));
    let provider = Arc::new(StaticSearchProvider::new(vec![
        RawSearchHit::new("A", "u1", "b1"),
        RawSearchHit::new("", "u2", "b2"),
        RawSearchHit::new("C", "", "b4"),
    ]));
    let mut engine = engine(llm.clone(), Some(provider.clone()));

    let reply = engine.handle_turn("search: best beaches in Bali").await;
    assert_eq!(reply, "Kuta and Nusa Dua [1]");
    assert_eq!(
        provider.queries(),
        vec![("best beaches in Bali".to_string(), 6)]
    );
    // 本轮不做槽位抽取
    assert_eq!(engine.slots(), &SlotStore::new());

    let prompt = llm.prompts().pop().unwrap();
    assert_eq!(
        prompt,
        format!(
            "<system>\n{}\n</system>\n<user_query>\nbest beaches in Bali\n</user_query>\n<web_results>\n[1] A — u1\nb1\n</web_results>",
            SEARCH_SYSTEM_PROMPT
        )
    );
}

#[tokio::test]
async fn test_search_then_resume_collection() {
    let llm = Arc::new(MockLlmClient::new());
    let provider = Arc::new(StaticSearchProvider::new(vec![RawSearchHit::new(
        "Guide",
        "https://guide.example",
        "tips",
    )]));
    let mut engine = engine(llm.clone(), Some(provider));

    engine.handle_turn("Planning a trip").await;
    engine.handle_turn("Bali").await;
    engine.handle_turn("/search visa rules for Indonesia").await;
    assert_eq!(engine.asking(), Some(Slot::Budget));
    // 检索之后仍在回答预算追问：裸数字也算
    engine.handle_turn("2000").await;

    assert_eq!(engine.slots().get(Slot::Destination), Some("Bali"));
    assert_eq!(engine.slots().get(Slot::Budget), Some("2000"));
    assert_eq!(next_question(engine.slots()), Some(Slot::Dates));
    assert_eq!(engine.log().len(), 8);
}

#[tokio::test]
async fn test_failed_planning_call_keeps_previous_state() {
    let llm = Arc::new(MockLlmClient::new());
    let mut engine = engine(llm.clone(), None);
    for text in ["Planning a trip", "Bali", "$2000", "June", "2", "beaches"] {
        engine.handle_turn(text).await;
    }
    let before = engine.slots().clone();

    llm.fail_next("quota exceeded");
    assert_eq!(engine.handle_turn("none").await, APOLOGY_REPLY);
    assert_eq!(engine.slots(), &before);
    assert_eq!(engine.phase(), DialoguePhase::Collecting);
}

#[tokio::test]
async fn test_unconfigured_engine_never_touches_collaborators() {
    let provider = Arc::new(StaticSearchProvider::new(vec![RawSearchHit::new("A", "u1", "b1")]));
    let mut engine = ConversationEngine::unconfigured();

    for text in ["Planning a trip", "search: best beaches in Bali", "/search x"] {
        assert_eq!(engine.handle_turn(text).await, NOT_CONFIGURED_REPLY);
    }
    assert!(provider.queries().is_empty());
    assert_eq!(engine.slots(), &SlotStore::new());
    assert!(engine.log().is_empty());
}
