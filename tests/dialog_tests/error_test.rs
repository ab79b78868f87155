use std::sync::Arc;

use adaptive_dialog::storage::{InMemoryScopeStorage, ScopeStorage, StorageKey};
use adaptive_dialog::{
    Action, Activity, Dialog, DialogError, DialogGraph, DialogManager, EngineConfig, Trigger,
};
use pretty_assertions::assert_eq;

fn manager_with(root: Dialog, config: EngineConfig) -> (DialogManager, Arc<InMemoryScopeStorage>) {
    let storage = Arc::new(InMemoryScopeStorage::new());
    let manager =
        DialogManager::new(DialogGraph::new(root).unwrap(), storage.clone()).with_config(config);
    (manager, storage)
}

#[tokio::test]
async fn test_step_limit() {
    let root = Dialog::new("chatty").with_trigger(Trigger::on_unknown_intent(
        (0..10).map(|i| Action::send_activity(format!("line {}", i))).collect(),
    ));
    let (manager, storage) = manager_with(
        root,
        EngineConfig {
            max_steps_per_turn: 5,
            ..EngineConfig::default()
        },
    );

    let result = manager.process_turn(Activity::message("talk")).await;
    assert_eq!(result.unwrap_err(), DialogError::StepLimitExceeded { limit: 5 });
    assert_eq!(storage.conversation_count(), 0);
}

#[tokio::test]
async fn test_stack_depth_limit() {
    let root = Dialog::new("recursive").with_trigger(Trigger::on_begin_dialog(vec![
        Action::send_activity("down"),
        Action::begin_dialog("recursive"),
    ]));
    let (manager, _) = manager_with(
        root,
        EngineConfig {
            max_stack_depth: 4,
            ..EngineConfig::default()
        },
    );

    let result = manager.process_turn(Activity::message("go")).await;
    assert_eq!(result.unwrap_err(), DialogError::StackDepthExceeded { limit: 4 });
}

#[tokio::test]
async fn test_unknown_dialog_reference_keeps_previous_state() {
    let root = Dialog::new("root")
        .auto_end_dialog(false)
        .with_trigger(Trigger::on_begin_dialog(vec![Action::send_activity("ready")]))
        .with_trigger(Trigger::on_unknown_intent(vec![
            Action::set_property("conversation.attempted", "true"),
            Action::begin_dialog("missing"),
        ]));
    let graph = DialogGraph::new(root).unwrap();
    assert!(matches!(
        graph.validate(),
        Err(DialogError::UnknownDialogReference(_))
    ));

    let storage = Arc::new(InMemoryScopeStorage::new());
    let manager = DialogManager::new(graph, storage.clone());
    let replies = manager.process_turn(Activity::message("hi")).await.unwrap();
    assert_eq!(replies[0].text.as_deref(), Some("ready"));

    let result = manager.process_turn(Activity::message("boom")).await;
    assert_eq!(
        result.unwrap_err(),
        DialogError::UnknownDialogReference("missing".to_string())
    );

    let snapshot = storage
        .load(&StorageKey::new("conversation", "user"))
        .await
        .unwrap();
    assert_eq!(snapshot.stack.len(), 1);
    assert!(snapshot
        .conversation
        .as_map()
        .is_some_and(|conversation| conversation.is_empty()));
}

#[tokio::test]
async fn test_invalid_graph_definitions() {
    let duplicate = DialogGraph::with_dialogs(Dialog::new("a"), vec![Dialog::new("a")]);
    assert_eq!(duplicate.unwrap_err(), DialogError::DuplicateDialog("a".to_string()));

    let bad_path = DialogGraph::new(
        Dialog::new("root").with_trigger(Trigger::on_begin_dialog(vec![Action::set_property(
            "name", "1",
        )])),
    )
    .unwrap();
    assert!(bad_path.validate().is_err());

    assert!(DialogGraph::from_json("{\"root\": 3}").is_err());
}
