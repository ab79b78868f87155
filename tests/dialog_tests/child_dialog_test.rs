use std::collections::BTreeMap;

use adaptive_dialog::{Action, Dialog, Trigger};
use pretty_assertions::assert_eq;

use crate::{regex, TestConversation};

fn joke_bot() -> Dialog {
    let greeting = Dialog::new("Greeting").with_trigger(Trigger::on_begin_dialog(vec![
        Action::if_else(
            "user.name == null",
            vec![
                Action::text_input("Hello, what is your name?", "user.name"),
                Action::send_activity("Hello {user.name}, nice to meet you!"),
            ],
            vec![Action::send_activity("Hello {user.name}, nice to see you again!")],
        ),
    ]));
    let tell_joke = Dialog::new("TellJokeDialog").with_trigger(Trigger::on_begin_dialog(vec![
        Action::send_activity("Why did the chicken cross the road?"),
        Action::EndTurn,
        Action::send_activity("To get to the other side"),
    ]));
    let inner = Dialog::new("innerDialog")
        .auto_end_dialog(false)
        .with_regex_recognizer(regex(&[
            ("JokeIntent", "(?i)joke"),
            ("GreetingIntent", "(?i)hi|hello"),
            ("GoodbyeIntent", "(?i)bye|goodbye|seeya|see ya"),
        ]))
        .with_trigger(Trigger::on_begin_dialog(vec![
            Action::begin_dialog("Greeting"),
            Action::send_activity("I'm a joke bot. To get started say 'tell me a joke'"),
        ]))
        .with_trigger(Trigger::on_intent(
            "JokeIntent",
            vec![Action::begin_dialog("TellJokeDialog")],
        ))
        .with_trigger(Trigger::on_intent(
            "GreetingIntent",
            vec![Action::begin_dialog("Greeting")],
        ))
        .with_trigger(Trigger::on_intent(
            "GoodbyeIntent",
            vec![
                Action::send_activity("See you later alligator!"),
                Action::end_dialog(),
            ],
        ))
        .with_trigger(Trigger::on_unknown_intent(vec![Action::send_activity(
            "Like I said, I'm a joke bot. To get started say 'tell me a joke'",
        )]))
        .with_dialog(greeting)
        .with_dialog(tell_joke);

    Dialog::new("outer")
        .auto_end_dialog(false)
        .with_regex_recognizer(regex(&[("BeginIntent", "(?i)begin"), ("HelpIntent", "(?i)help")]))
        .with_trigger(Trigger::on_begin_dialog(vec![Action::send_activity(
            "Hi, type 'begin' to start a dialog, type 'help' to get help.",
        )]))
        .with_trigger(Trigger::on_intent(
            "BeginIntent",
            vec![Action::begin_dialog("innerDialog")],
        ))
        .with_trigger(Trigger::on_intent(
            "HelpIntent",
            vec![Action::send_activity("help is coming")],
        ))
        .with_trigger(Trigger::on_unknown_intent(vec![Action::send_activity(
            "Hi, type 'begin' to start a dialog, type 'help' to get help.",
        )]))
        .with_dialog(inner)
}

#[tokio::test]
async fn test_begin_dialog() {
    let flow = TestConversation::new(joke_bot());

    assert_eq!(
        flow.say("hi").await,
        vec!["Hi, type 'begin' to start a dialog, type 'help' to get help."]
    );
    assert_eq!(flow.say("begin").await, vec!["Hello, what is your name?"]);
    assert_eq!(
        flow.say("Carlos").await,
        vec![
            "Hello Carlos, nice to meet you!",
            "I'm a joke bot. To get started say 'tell me a joke'",
        ]
    );
    assert_eq!(
        flow.say("tell me a joke").await,
        vec!["Why did the chicken cross the road?"]
    );
    assert_eq!(flow.say("Why?").await, vec!["To get to the other side"]);
    assert_eq!(flow.say("hi").await, vec!["Hello Carlos, nice to see you again!"]);
    assert_eq!(
        flow.say("Do you know a joke?").await,
        vec!["Why did the chicken cross the road?"]
    );
    assert_eq!(flow.say("Why?").await, vec!["To get to the other side"]);
    assert_eq!(
        flow.say("ummm").await,
        vec!["Like I said, I'm a joke bot. To get started say 'tell me a joke'"]
    );
    assert_eq!(flow.say("help").await, vec!["help is coming"]);
    assert_eq!(flow.say("bye").await, vec!["See you later alligator!"]);
    assert_eq!(
        flow.say("ummm").await,
        vec!["Hi, type 'begin' to start a dialog, type 'help' to get help."]
    );
}

#[tokio::test]
async fn test_dialog_options_and_result() {
    let double = Dialog::new("double").with_trigger(Trigger::on_begin_dialog(vec![
        Action::send_activity("doubling {dialog.number}"),
        Action::EndDialog {
            value: Some("dialog.number * 2".to_string()),
        },
        Action::send_activity("never sent"),
    ]));
    let root = Dialog::new("root")
        .with_trigger(Trigger::on_begin_dialog(vec![
            Action::set_property("dialog.start", "21"),
            Action::BeginDialog {
                dialog: "double".to_string(),
                options: BTreeMap::from([("number".to_string(), "dialog.start".to_string())]),
                result_property: Some("user.result".to_string()),
            },
            Action::send_activity("result {user.result}, start still {dialog.start}"),
        ]))
        .with_dialog(double);
    let flow = TestConversation::new(root);

    assert_eq!(
        flow.say("go").await,
        vec!["doubling 21", "result 42, start still 21"]
    );
}

#[tokio::test]
async fn test_replace_and_cancel_all_dialogs() {
    let second = Dialog::new("second").with_trigger(Trigger::on_begin_dialog(vec![
        Action::send_activity("second {dialog.from}"),
    ]));
    let first = Dialog::new("first").with_trigger(Trigger::on_begin_dialog(vec![
        Action::send_activity("first"),
        Action::ReplaceDialog {
            dialog: "second".to_string(),
            options: BTreeMap::from([("from".to_string(), "'first'".to_string())]),
        },
        Action::send_activity("never sent"),
    ]));
    let root = Dialog::new("root")
        .auto_end_dialog(false)
        .with_regex_recognizer(regex(&[("ResetIntent", "(?i)reset")]))
        .with_trigger(Trigger::on_begin_dialog(vec![
            Action::begin_dialog("first"),
            Action::send_activity("back in root"),
            Action::text_input("anything else?", "dialog.answer"),
        ]))
        .with_trigger(Trigger::on_intent(
            "ResetIntent",
            vec![Action::send_activity("resetting"), Action::CancelAllDialogs],
        ))
        .with_dialog(first)
        .with_dialog(second);
    let flow = TestConversation::new(root);

    assert_eq!(
        flow.say("start").await,
        vec!["first", "second first", "back in root", "anything else?"]
    );
    assert_eq!(flow.say("reset").await, vec!["resetting"]);
    // the stack was discarded, so the root starts over
    assert_eq!(
        flow.say("start").await,
        vec!["first", "second first", "back in root", "anything else?"]
    );
}
