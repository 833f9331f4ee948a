//! QA suite for state persistence: round trips, absent collections,
//! and the append-only action log.

use chrono::Utc;
use daemon_core::{
    ActionRecord, ActionStatus, NetworkState, Quest, QuestRequirements, QuestRewards, StateStore,
    Trigger, TriggerCondition, TriggerId,
};
use gateway::GatewayConfig;
use serde_json::json;

fn populated_state() -> NetworkState {
    let mut state = NetworkState::new();
    state.create_trigger(Trigger::new(
        TriggerCondition::Condition {
            metric: daemon_core::Metric::OperativeCount,
            threshold: 5,
        },
        "expand_network",
    ));
    state.create_trigger(Trigger::new(
        TriggerCondition::AiDecision {
            directive: "watch for stagnation".to_string(),
        },
        "ai_decision",
    ));
    let q = state.create_quest(Quest::new(
        "Dead Drop",
        "Retrieve the package",
        3,
        QuestRewards { reputation: 120 },
        QuestRequirements {
            min_rank: 2,
            skills: vec!["fieldwork".to_string()],
        },
    ));
    let op = state.recruit("veteran", vec!["fieldwork".to_string()]);
    state.operatives[0].rank = 2;
    state.assign_quest(q, op).unwrap();
    state
}

#[tokio::test]
async fn round_trip_is_field_for_field() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::open(dir.path()).await.unwrap();

    let state = populated_state();
    store.save(&state).await.unwrap();
    let loaded = store.load().await.unwrap();

    assert_eq!(loaded.triggers, state.triggers);
    assert_eq!(loaded.quests, state.quests);
    assert_eq!(loaded.operatives, state.operatives);
}

#[tokio::test]
async fn absent_collections_load_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::open(dir.path()).await.unwrap();

    // Only quests on disk; the other two files are absent.
    let state = populated_state();
    store.save(&state).await.unwrap();
    std::fs::remove_file(dir.path().join("triggers.json")).unwrap();
    std::fs::remove_file(dir.path().join("operatives.json")).unwrap();

    let loaded = store.load().await.unwrap();
    assert!(loaded.triggers.is_empty());
    assert!(loaded.operatives.is_empty());
    assert_eq!(loaded.quests, state.quests);
}

#[tokio::test]
async fn action_log_appends_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::open(dir.path()).await.unwrap();

    for name in ["first", "second", "third"] {
        store
            .append_action(&ActionRecord {
                action_id: name.to_string(),
                trigger_id: Some(TriggerId::new()),
                timestamp: Utc::now(),
                status: ActionStatus::Executed,
                ai_generated_actions: vec![],
            })
            .await
            .unwrap();
    }

    let log = store.action_log().await.unwrap();
    let names: Vec<&str> = log.iter().map(|r| r.action_id.as_str()).collect();
    assert_eq!(names, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn archived_trigger_config_lands_beside_entities() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::open(dir.path()).await.unwrap();

    let id = TriggerId::new();
    let config = json!({"trigger": {"type": "time", "at": "09:00"}, "description": "daily"});
    store.archive_trigger_config(id, &config).await.unwrap();

    let path = dir.path().join(format!("trigger_{id}_config.json"));
    let raw = std::fs::read_to_string(path).unwrap();
    let reread: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(reread, config);
}

#[tokio::test]
async fn save_replaces_rather_than_merges() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::open(dir.path()).await.unwrap();

    let state = populated_state();
    store.save(&state).await.unwrap();

    let empty = NetworkState::new();
    store.save(&empty).await.unwrap();
    let loaded = store.load().await.unwrap();
    assert!(loaded.triggers.is_empty());
    assert!(loaded.quests.is_empty());
    assert!(loaded.operatives.is_empty());
}

#[test]
fn gateway_config_file_created_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ai_config.json");

    let config = GatewayConfig::load_or_create(&path).unwrap();
    assert!(path.exists());

    let reloaded = GatewayConfig::load_or_create(&path).unwrap();
    assert_eq!(reloaded.default_provider, config.default_provider);
    assert_eq!(reloaded.max_output_tokens, config.max_output_tokens);
}
