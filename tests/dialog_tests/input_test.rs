use adaptive_dialog::{Action, ActivityType, Dialog, InputSettings, Trigger};
use pretty_assertions::assert_eq;

use crate::TestConversation;

#[tokio::test]
async fn test_text_input_skips_when_property_is_set() {
    let flow = TestConversation::new(Dialog::new("planningTest").with_trigger(
        Trigger::on_begin_dialog(vec![
            Action::text_input("Hello, what is your name?", "user.name"),
            Action::send_activity("Hello {user.name}, nice to meet you!"),
        ]),
    ));

    assert_eq!(flow.say("hi").await, vec!["Hello, what is your name?"]);
    assert_eq!(flow.say("Carlos").await, vec!["Hello Carlos, nice to meet you!"]);
    // user scope survives the root ending, so the prompt is skipped
    assert_eq!(flow.say("hi").await, vec!["Hello Carlos, nice to meet you!"]);
}

#[tokio::test]
async fn test_number_input_reprompts_until_valid() {
    let flow = TestConversation::new(Dialog::new("ages").with_trigger(
        Trigger::on_begin_dialog(vec![
            Action::NumberInput(
                InputSettings::new("age?", "dialog.age")
                    .with_invalid_prompt("Please give a number between 1 and 150.")
                    .with_validation("turn.value > 0 && turn.value < 150"),
            ),
            Action::send_activity("In ten years you will be {dialog.age + 10}."),
        ]),
    ));

    assert_eq!(flow.say("start").await, vec!["age?"]);
    assert_eq!(
        flow.say("ten").await,
        vec!["Please give a number between 1 and 150."]
    );
    assert_eq!(
        flow.say("200").await,
        vec!["Please give a number between 1 and 150."]
    );
    assert_eq!(
        flow.say("I am 32").await,
        vec!["In ten years you will be 42."]
    );
}

#[tokio::test]
async fn test_max_turn_count_assigns_default() {
    let flow = TestConversation::new(Dialog::new("colors").with_trigger(
        Trigger::on_begin_dialog(vec![
            Action::ConfirmInput(
                InputSettings::new("Do you like blue?", "dialog.likes_blue")
                    .with_max_turn_count(2)
                    .with_default_value("false"),
            ),
            Action::if_else(
                "dialog.likes_blue",
                vec![Action::send_activity("Blue it is.")],
                vec![Action::send_activity("Red then.")],
            ),
        ]),
    ));

    assert_eq!(flow.say("start").await, vec!["Do you like blue?"]);
    assert_eq!(flow.say("hmm").await, vec!["Do you like blue?"]);
    assert_eq!(flow.say("what?").await, vec!["Red then."]);
}

#[tokio::test]
async fn test_confirm_input() {
    let flow = TestConversation::new(Dialog::new("colors").with_trigger(
        Trigger::on_begin_dialog(vec![
            Action::confirm_input("Do you like blue?", "dialog.likes_blue"),
            Action::if_else(
                "dialog.likes_blue",
                vec![Action::send_activity("Blue it is.")],
                vec![Action::send_activity("Red then.")],
            ),
        ]),
    ));

    assert_eq!(flow.say("start").await, vec!["Do you like blue?"]);
    assert_eq!(flow.say("Yes, please").await, vec!["Blue it is."]);
}

#[tokio::test]
async fn test_always_prompt_and_non_message_activity() {
    let flow = TestConversation::new(
        Dialog::new("names").with_trigger(Trigger::on_begin_dialog(vec![
            Action::set_property("user.name", "'Carlos'"),
            Action::TextInput(
                InputSettings::new("What should I call you?", "user.name").always_prompt(),
            ),
            Action::send_activity("Hi {user.name}."),
        ])),
    );

    assert_eq!(flow.say("start").await, vec!["What should I call you?"]);
    // typing activities do not answer the prompt
    assert!(flow.send_type(ActivityType::Typing).await.is_empty());
    assert_eq!(flow.say("Charlie").await, vec!["Hi Charlie."]);
}
