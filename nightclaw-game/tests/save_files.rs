use nightclaw_game::constants::{
    DEFEAT_NODE_ID, LOG_GAME_LOADED, LOG_SAVE_FAILED_PREFIX, LOG_SAVE_NOT_FOUND, NO_RETURN,
    SAVE_HEADER,
};
use nightclaw_game::{
    ConfigError, EngineConfig, FileStorage, GamePhase, GameSession, Item, ItemCategory,
    LoadOutcome, MemoryStorage, SaveError, SaveOutcome, SaveStorage, StoryGraph, StoryNode,
};
use std::path::PathBuf;
use std::sync::Arc;

fn graph() -> Arc<StoryGraph> {
    let mut builder = StoryGraph::builder();
    builder
        .add_node(StoryNode::new(1, "den", "1.png"))
        .add_node(StoryNode::new(2, "ridge", "2.png").rewarding(["Meat", "Herbs"]))
        .add_node(StoryNode::new(3, "river", "3.png"))
        .add_node(StoryNode::new(997, "fallen", "997.png"))
        .connect(1, "Climb", 2)
        .connect(2, "Wade", 3);
    Arc::new(builder.build().unwrap())
}

fn playing() -> GameSession {
    let config = EngineConfig {
        events: Vec::new(),
        ..EngineConfig::default()
    };
    let mut session = GameSession::new(graph(), config, 5);
    session.skip_intro();
    session
}

fn scratch_dir(tag: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    let dir = std::env::temp_dir().join(format!(
        "nightclaw-{tag}-{}-{nanos}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn save_then_load_restores_progress() {
    let storage = MemoryStorage::default();
    let mut session = playing();
    session.make_choice(0);
    session.stats_mut().reputation = 33;
    session.stats_mut().event_happened = true;
    let saved = session.record();

    assert_eq!(
        session.save(&storage, "x"),
        SaveOutcome::Saved {
            file_name: "x.txt".into()
        }
    );

    session.make_choice(0);
    session.rest();
    assert_ne!(session.record(), saved);

    assert_eq!(session.load(&storage, "x.txt"), LoadOutcome::Loaded);
    assert_eq!(session.record(), saved);
    assert_eq!(session.current_node_id(), Some(2));
    assert!(session.stats().event_happened);
    assert_eq!(session.log(), [LOG_GAME_LOADED]);
    assert_eq!(session.return_to(), NO_RETURN);
    assert!(session.undo_history().is_empty());
    assert_eq!(session.phase(), GamePhase::Gameplay);

    let herbs = session.inventory().get("Herbs").unwrap();
    assert_eq!(herbs.category, ItemCategory::Herb);
    assert_eq!(herbs.effect_value, 20);
}

#[test]
fn file_storage_writes_versioned_records() {
    let dir = scratch_dir("files");
    let storage = FileStorage::new(&dir);
    let mut session = playing();
    session.make_choice(0);

    assert!(matches!(
        session.save(&storage, "slot.txt"),
        SaveOutcome::Saved { .. }
    ));
    let text = std::fs::read_to_string(dir.join("slot.txt")).unwrap();
    assert!(text.starts_with(SAVE_HEADER));
    assert!(text.lines().last().unwrap().starts_with("checksum "));

    let mut other = playing();
    assert_eq!(other.load(&storage, "slot.txt"), LoadOutcome::Loaded);
    assert_eq!(other.record(), session.record());
    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn missing_save_leaves_state_alone() {
    let storage = MemoryStorage::default();
    let mut session = playing();
    session.make_choice(0);
    let before = session.record();

    assert_eq!(session.load(&storage, "nope.txt"), LoadOutcome::NotFound);
    assert_eq!(session.last_log(), Some(LOG_SAVE_NOT_FOUND));
    assert_eq!(session.record(), before);
    assert_eq!(session.undo_history().len(), 1);
}

#[test]
fn tampered_save_is_rejected() {
    let storage = MemoryStorage::default();
    let mut session = playing();
    session.save(&storage, "slot");
    let text = storage.get("slot.txt").unwrap();
    storage.insert("slot.txt", text.replacen("\n1\n", "\n3\n", 1));

    session.make_choice(0);
    let before = session.record();
    assert_eq!(
        session.load(&storage, "slot.txt"),
        LoadOutcome::Rejected(SaveError::ChecksumMismatch)
    );
    assert_eq!(session.record(), before);
    assert!(session.last_log().unwrap().starts_with(">> SAVE FILE UNREADABLE"));
}

#[test]
fn legacy_records_still_load() {
    let storage = MemoryStorage::default();
    storage.insert("old.txt", "3\n64 22 71 15 6\n1\nMeat\n0\n30\n2\n");
    storage.insert("older.txt", "2\n80 10 90 5 3\n0\n");

    let mut session = playing();
    assert_eq!(session.load(&storage, "old.txt"), LoadOutcome::Loaded);
    assert_eq!(session.current_node_id(), Some(3));
    assert_eq!(session.stats().health, 64);
    assert_eq!(session.stats().hunger, 22);
    assert_eq!(session.stats().energy, 71);
    assert_eq!(session.stats().day_count, 6);
    assert!(!session.stats().event_happened);
    assert_eq!(session.inventory().quantity_of("Meat"), 2);
    assert!(!session.inventory().has("Map"));

    assert_eq!(session.load(&storage, "older.txt"), LoadOutcome::Loaded);
    assert_eq!(session.current_node_id(), Some(2));
    assert!(session.inventory().is_empty());
}

#[test]
fn unknown_node_keeps_current_position() {
    let storage = MemoryStorage::default();
    storage.insert("far.txt", "4242\n150 -5 60 10 3\n0\n");
    let mut session = playing();
    session.make_choice(0);

    assert_eq!(session.load(&storage, "far.txt"), LoadOutcome::Loaded);
    assert_eq!(session.current_node_id(), Some(2));
    assert_eq!(session.stats().health, 100);
    assert_eq!(session.stats().hunger, 0);
}

#[test]
fn loading_a_defeat_lands_in_the_outro() {
    let storage = MemoryStorage::default();
    storage.insert("lost.txt", format!("{DEFEAT_NODE_ID}\n0 100 0 0 9\n0\n"));
    let mut session = playing();

    assert_eq!(session.load(&storage, "lost.txt"), LoadOutcome::Loaded);
    assert!(session.is_over());
    assert_eq!(session.phase(), GamePhase::Outro);
}

#[test]
fn multiline_item_name_fails_the_save_and_writes_nothing() {
    let storage = MemoryStorage::default();
    let mut session = playing();
    session
        .inventory_mut()
        .add(Item::new("Wolf\nFang", ItemCategory::Quest, 0, 1));

    match session.save(&storage, "x") {
        SaveOutcome::Failed { file_name, reason } => {
            assert_eq!(file_name, "x.txt");
            assert!(reason.contains("Wolf"));
        }
        other => panic!("expected a failed save, got {other:?}"),
    }
    assert!(storage.is_empty());
    assert!(session.last_log().unwrap().starts_with(LOG_SAVE_FAILED_PREFIX));
}

#[test]
fn tuning_with_multiline_item_names_is_rejected() {
    let json = r#"{ "catalog": { "Meat": { "category": "food" }, "Wolf\nFang": { "category": "quest" } }, "starting_items": [] }"#;
    match EngineConfig::from_json(json) {
        Err(ConfigError::Invalid(reason)) => assert!(reason.contains("catalog item name")),
        other => panic!("expected invalid tuning, got {other:?}"),
    }
}

#[test]
fn unwritable_target_reports_save_failed() {
    let dir = scratch_dir("readonly").join("missing-subdir");
    let storage = FileStorage::new(&dir);
    let mut session = playing();

    match session.save(&storage, "slot") {
        SaveOutcome::Failed { file_name, reason } => {
            assert_eq!(file_name, "slot.txt");
            assert!(!reason.is_empty());
        }
        other => panic!("expected a failed save, got {other:?}"),
    }
    assert!(session.last_log().unwrap().starts_with(LOG_SAVE_FAILED_PREFIX));
    assert_eq!(storage.read_record("slot.txt").unwrap(), None);
}
