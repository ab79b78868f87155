use std::sync::Arc;

use adaptive_dialog::storage::{
    InMemoryScopeStorage, MockScopeStorage, ScopeSnapshot, ScopeStorage, StorageError, StorageKey,
};
use adaptive_dialog::{
    Action, Activity, Dialog, DialogError, DialogGraph, DialogManager, EngineConfig, Trigger, Value,
};
use pretty_assertions::assert_eq;

use crate::TestConversation;

fn greeter() -> DialogGraph {
    DialogGraph::new(
        Dialog::new("greeter")
            .auto_end_dialog(false)
            .with_trigger(Trigger::on_begin_dialog(vec![
                Action::text_input("name?", "user.name"),
                Action::set_property("conversation.greeted", "true"),
                Action::send_activity("hi {user.name}"),
            ]))
            .with_trigger(Trigger::on_unknown_intent(vec![Action::send_activity(
                "still here, {user.name}",
            )])),
    )
    .unwrap()
}

#[tokio::test]
async fn test_state_survives_new_manager() {
    let storage = Arc::new(InMemoryScopeStorage::new());
    let first = DialogManager::new(greeter(), storage.clone());
    let replies = first.process_turn(Activity::message("hello")).await.unwrap();
    assert_eq!(replies[0].text.as_deref(), Some("name?"));

    // a fresh manager resumes the pending input from storage
    let second = DialogManager::new(greeter(), storage.clone());
    let replies = second.process_turn(Activity::message("Ada")).await.unwrap();
    assert_eq!(replies[0].text.as_deref(), Some("hi Ada"));

    let snapshot = storage
        .load(&StorageKey::new("conversation", "user"))
        .await
        .unwrap();
    assert_eq!(snapshot.user.as_map().and_then(|user| user.get("name")), Some(&Value::from("Ada")));
    assert_eq!(
        snapshot
            .conversation
            .as_map()
            .and_then(|conversation| conversation.get("greeted")),
        Some(&Value::Boolean(true))
    );
    assert_eq!(snapshot.stack.len(), 1);
}

#[tokio::test]
async fn test_user_scope_follows_user_across_conversations() {
    let flow = TestConversation::from_graph(greeter());

    let replies = flow
        .send(Activity::message("hello").with_conversation("a"))
        .await
        .unwrap();
    assert_eq!(replies, vec!["name?"]);
    let replies = flow
        .send(Activity::message("Ada").with_conversation("a"))
        .await
        .unwrap();
    assert_eq!(replies, vec!["hi Ada"]);

    // new conversation: new stack, but the name is already known
    let replies = flow
        .send(Activity::message("hello").with_conversation("b"))
        .await
        .unwrap();
    assert_eq!(replies, vec!["hi Ada"]);

    // another user in the same conversation gets their own stack
    let replies = flow
        .send(Activity::message("hello").with_conversation("b").with_user("bob"))
        .await
        .unwrap();
    assert_eq!(replies, vec!["name?"]);
    assert_eq!(flow.storage.conversation_count(), 3);
}

#[tokio::test]
async fn test_failed_turn_is_not_saved() {
    let mut storage = MockScopeStorage::new();
    storage
        .expect_load()
        .returning(|_| Ok(ScopeSnapshot::default()));
    storage.expect_save().times(0);

    let graph = DialogGraph::new(Dialog::new("root").with_trigger(Trigger::on_begin_dialog(
        vec![
            Action::set_property("user.touched", "true"),
            Action::send_activity("{1 / 0}"),
        ],
    )))
    .unwrap();
    let manager = DialogManager::new(graph, Arc::new(storage));

    let result = manager.process_turn(Activity::message("go")).await;
    assert!(matches!(result, Err(DialogError::Expression(_))));
}

#[tokio::test]
async fn test_storage_errors_surface() {
    let mut storage = MockScopeStorage::new();
    storage
        .expect_load()
        .returning(|_| Err(StorageError::Backend("disk on fire".to_string())));

    let manager = DialogManager::new(greeter(), Arc::new(storage));
    let result = manager.process_turn(Activity::message("go")).await;
    assert_eq!(
        result.unwrap_err(),
        DialogError::Storage(StorageError::Backend("disk on fire".to_string()))
    );
}

#[tokio::test]
async fn test_run_turn_without_storage() {
    let storage = Arc::new(InMemoryScopeStorage::new());
    let manager = DialogManager::new(greeter(), storage.clone()).with_config(EngineConfig {
        max_steps_per_turn: 50,
        ..EngineConfig::default()
    });

    let outcome = manager
        .run_turn(ScopeSnapshot::default(), Activity::message("hello"))
        .await
        .unwrap();
    assert_eq!(outcome.replies.len(), 1);
    assert_eq!(outcome.snapshot.stack.len(), 1);
    assert_eq!(storage.conversation_count(), 0);
}
