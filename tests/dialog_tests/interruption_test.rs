use adaptive_dialog::{Action, Activity, Dialog, DialogGraph, Trigger};
use pretty_assertions::assert_eq;

use crate::{regex, TestConversation};

fn nested_recognizers() -> Dialog {
    let outer = Dialog::new("outer")
        .auto_end_dialog(false)
        .with_regex_recognizer(regex(&[("SideIntent", "side"), ("CancelIntent", "cancel")]))
        .with_trigger(Trigger::on_begin_dialog(vec![
            Action::text_input("name?", "user.name"),
            Action::send_activity("{user.name}"),
            Action::number_input("age?", "user.age"),
            Action::send_activity("{user.age}"),
        ]))
        .with_trigger(Trigger::on_intent(
            "SideIntent",
            vec![Action::send_activity("sideintent")],
        ))
        .with_trigger(Trigger::on_intent("CancelIntent", vec![Action::end_dialog()]))
        .with_trigger(Trigger::on_unknown_intent(vec![Action::send_activity(
            "outerWhat",
        )]));

    Dialog::new("root")
        .auto_end_dialog(false)
        .with_regex_recognizer(regex(&[("StartOuterIntent", "start"), ("RootIntent", "root")]))
        .with_trigger(Trigger::on_intent(
            "StartOuterIntent",
            vec![Action::begin_dialog("outer")],
        ))
        .with_trigger(Trigger::on_intent(
            "RootIntent",
            vec![Action::send_activity("rootintent")],
        ))
        .with_trigger(Trigger::on_unknown_intent(vec![Action::send_activity(
            "rootunknown",
        )]))
        .with_dialog(outer)
}

#[tokio::test]
async fn test_nested_recognizers() {
    let flow = TestConversation::new(nested_recognizers());

    assert_eq!(flow.say("start").await, vec!["name?"]);
    assert_eq!(flow.say("side").await, vec!["sideintent", "name?"]);
    assert_eq!(flow.say("root").await, vec!["rootintent", "name?"]);
    assert_eq!(flow.say("Carlos").await, vec!["Carlos", "age?"]);
    assert_eq!(flow.say("root").await, vec!["rootintent", "age?"]);
    assert_eq!(flow.say("side").await, vec!["sideintent", "age?"]);
    assert_eq!(flow.say("10").await, vec!["10"]);
    // outer is idle now, so its own catch-all answers
    assert_eq!(flow.say("ummm").await, vec!["outerWhat"]);
}

#[tokio::test]
async fn test_interrupting_intent_ends_child() {
    let flow = TestConversation::new(nested_recognizers());

    assert_eq!(flow.say("start").await, vec!["name?"]);
    // CancelIntent ends outer from inside its own interruption
    assert!(flow.say("cancel").await.is_empty());
    assert_eq!(flow.say("anything").await, vec!["rootunknown"]);
}

#[tokio::test]
async fn test_replace_plan_discards_children() {
    let form = Dialog::new("form").with_trigger(Trigger::on_begin_dialog(vec![
        Action::text_input("What is your email?", "dialog.email"),
        Action::send_activity("Thanks, {dialog.email}."),
    ]));
    let root = Dialog::new("root")
        .auto_end_dialog(false)
        .with_regex_recognizer(regex(&[
            ("SignupIntent", "(?i)sign ?up"),
            ("CancelIntent", "(?i)^cancel$"),
        ]))
        .with_trigger(Trigger::on_intent(
            "SignupIntent",
            vec![
                Action::begin_dialog("form"),
                Action::send_activity("You are signed up."),
            ],
        ))
        .with_trigger(
            Trigger::on_intent("CancelIntent", vec![Action::send_activity("Cancelled.")])
                .replacing_plan(),
        )
        .with_trigger(Trigger::on_unknown_intent(vec![Action::send_activity(
            "Say 'sign up' to begin.",
        )]))
        .with_dialog(form);
    let flow = TestConversation::from_graph(DialogGraph::new(root).unwrap());

    assert_eq!(flow.say("I want to sign up").await, vec!["What is your email?"]);
    assert_eq!(flow.say("cancel").await, vec!["Cancelled."]);
    assert_eq!(flow.say("hello").await, vec!["Say 'sign up' to begin."]);

    assert_eq!(flow.say("signup").await, vec!["What is your email?"]);
    assert_eq!(
        flow.say("me@example.com").await,
        vec!["Thanks, me@example.com.", "You are signed up."]
    );
}

#[tokio::test]
async fn test_guarded_interruption_keeps_pending_input() {
    let root = Dialog::new("root")
        .auto_end_dialog(false)
        .with_trigger(Trigger::on_begin_dialog(vec![
            Action::text_input("name?", "user.name"),
            Action::send_activity("hello {user.name}"),
        ]))
        .with_trigger(
            Trigger::on_message(vec![Action::send_activity("I am a bot.")])
                .with_guard("turn.activity.text == 'who are you?'"),
        );
    let flow = TestConversation::new(root);

    assert_eq!(flow.say("hi").await, vec!["name?"]);
    assert_eq!(flow.say("who are you?").await, vec!["I am a bot.", "name?"]);
    assert_eq!(flow.say("Carlos").await, vec!["hello Carlos"]);

    let replies = flow
        .send(Activity::message("who are you?"))
        .await
        .unwrap();
    assert_eq!(replies, vec!["I am a bot."]);
}
