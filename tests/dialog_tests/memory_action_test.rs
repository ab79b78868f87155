use adaptive_dialog::dialog::SwitchCase;
use adaptive_dialog::{
    Action, Activity, ActivityType, ArrayChange, Dialog, InputSettings, PropertyKind, Trigger,
};
use pretty_assertions::assert_eq;

use crate::TestConversation;

fn add_item(prompt: &str) -> Action {
    Action::TextInput(InputSettings::new(prompt, "dialog.todo").always_prompt())
}

fn show_todos() -> Action {
    Action::send_activity("Your todos: {join(user.todos, ', ')}")
}

#[tokio::test]
async fn test_edit_array() {
    let flow = TestConversation::new(Dialog::new("planningTest").with_trigger(
        Trigger::on_begin_dialog(vec![
            add_item("Please add an item to todos."),
            Action::init_property("user.todos", PropertyKind::Array),
            Action::edit_array(ArrayChange::Push, "user.todos", Some("dialog.todo")),
            show_todos(),
            add_item("Please add an item to todos."),
            Action::edit_array(ArrayChange::Push, "user.todos", Some("dialog.todo")),
            show_todos(),
            add_item("Enter a item to remove."),
            Action::edit_array(ArrayChange::Remove, "user.todos", Some("dialog.todo")),
            show_todos(),
            add_item("Please add an item to todos."),
            Action::edit_array(ArrayChange::Push, "user.todos", Some("dialog.todo")),
            add_item("Please add an item to todos."),
            Action::edit_array(ArrayChange::Push, "user.todos", Some("dialog.todo")),
            show_todos(),
            Action::edit_array(ArrayChange::Pop, "user.todos", None),
            show_todos(),
            Action::edit_array(ArrayChange::Take, "user.todos", None),
            show_todos(),
            Action::edit_array(ArrayChange::Clear, "user.todos", None),
            show_todos(),
        ]),
    ));

    assert_eq!(flow.say("hi").await, vec!["Please add an item to todos."]);
    assert_eq!(
        flow.say("todo1").await,
        vec!["Your todos: todo1", "Please add an item to todos."]
    );
    assert_eq!(
        flow.say("todo2").await,
        vec!["Your todos: todo1, todo2", "Enter a item to remove."]
    );
    assert_eq!(
        flow.say("todo2").await,
        vec!["Your todos: todo1", "Please add an item to todos."]
    );
    assert_eq!(flow.say("todo3").await, vec!["Please add an item to todos."]);
    assert_eq!(
        flow.say("todo4").await,
        vec![
            "Your todos: todo1, todo3, todo4",
            "Your todos: todo1, todo3",
            "Your todos: todo3",
            "Your todos: ",
        ]
    );
}

#[tokio::test]
async fn test_edit_array_result_property() {
    let flow = TestConversation::new(Dialog::new("stack").with_trigger(
        Trigger::on_begin_dialog(vec![
            Action::set_property("dialog.items", "['a', 'b', 'c']"),
            Action::EditArray {
                change: ArrayChange::Pop,
                property: "dialog.items".to_string(),
                value: None,
                result_property: Some("dialog.popped".to_string()),
            },
            Action::EditArray {
                change: ArrayChange::Remove,
                property: "dialog.items".to_string(),
                value: Some("'z'".to_string()),
                result_property: Some("dialog.removed".to_string()),
            },
            Action::send_activity("{dialog.popped} {dialog.removed} {dialog.items}"),
        ]),
    ));

    assert_eq!(flow.say("go").await, vec!["c false a, b"]);
}

#[tokio::test]
async fn test_string_literal_in_expression() {
    let flow = TestConversation::new(
        Dialog::new("planningTest")
            .auto_end_dialog(false)
            .with_trigger(Trigger::on_unknown_intent(vec![
                Action::if_condition(
                    "user.name == null",
                    vec![Action::text_input("Hello, what is your name?", "user.name")],
                ),
                Action::if_condition(
                    "user.name == 'Carlos'",
                    vec![Action::send_activity("Hello carlin")],
                ),
                Action::send_activity("Hello {user.name}, nice to meet you!"),
            ])),
    );

    assert!(flow.conversation_update().await.is_empty());
    assert_eq!(flow.say("hi").await, vec!["Hello, what is your name?"]);
    assert_eq!(
        flow.say("Carlos").await,
        vec!["Hello carlin", "Hello Carlos, nice to meet you!"]
    );
}

#[tokio::test]
async fn test_switch_set_and_delete_property() {
    let flow = TestConversation::new(
        Dialog::new("router")
            .auto_end_dialog(false)
            .with_trigger(Trigger::on_message(vec![
                Action::set_property("conversation.count", "coalesce(conversation.count, 0) + 1"),
                Action::Switch {
                    condition: "toLower(turn.activity.text)".to_string(),
                    cases: vec![
                        SwitchCase {
                            value: "'red'".to_string(),
                            actions: vec![Action::send_activity("stop")],
                        },
                        SwitchCase {
                            value: "'green'".to_string(),
                            actions: vec![Action::send_activity("go")],
                        },
                    ],
                    default: vec![
                        Action::DeleteProperty {
                            property: "conversation.count".to_string(),
                        },
                        Action::send_activity("unknown color, count reset"),
                    ],
                },
                Action::send_activity("count={conversation.count}"),
            ])),
    );

    assert_eq!(flow.say("Red").await, vec!["stop", "count=1"]);
    assert_eq!(flow.say("green").await, vec!["go", "count=2"]);
    assert_eq!(
        flow.say("blue").await,
        vec!["unknown color, count reset", "count="]
    );
    assert_eq!(flow.say("green").await, vec!["go", "count=1"]);
}

#[tokio::test]
async fn test_log_action_emits_trace() {
    let flow = TestConversation::new(Dialog::new("logger").with_trigger(Trigger::on_message(
        vec![
            Action::LogAction {
                text: "heard {turn.activity.text}".to_string(),
                trace_activity: true,
            },
            Action::LogAction {
                text: "quiet".to_string(),
                trace_activity: false,
            },
        ],
    )));

    let replies = flow
        .manager
        .process_turn(Activity::message("hello"))
        .await
        .unwrap();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].activity_type, ActivityType::Trace);
    assert_eq!(replies[0].text.as_deref(), Some("heard hello"));
}
