use adaptive_dialog::recognizer::{
    IntentCandidate, MockRecognizer, RecognizerError, RecognizerResult,
};
use adaptive_dialog::{Action, Activity, ActivityType, Dialog, Trigger};
use pretty_assertions::assert_eq;

use crate::{regex, TestConversation};

fn echo(activity_type: ActivityType, text: &str) -> Trigger {
    Trigger::on_activity(activity_type, vec![Action::send_activity(text)])
}

#[tokio::test]
async fn test_activity_triggers() {
    let flow = TestConversation::new(
        Dialog::new("test")
            .auto_end_dialog(false)
            .with_regex_recognizer(regex(&[("JokeIntent", "joke")]))
            .with_trigger(echo(ActivityType::Custom("Custom".to_string()), "CustomActivityEvent"))
            .with_trigger(echo(ActivityType::Message, "MessageActivityEvent"))
            .with_trigger(echo(ActivityType::MessageDelete, "MessageDeleteActivityEvent"))
            .with_trigger(echo(ActivityType::MessageUpdate, "MessageUpdateActivityEvent"))
            .with_trigger(echo(ActivityType::MessageReaction, "MessageReactionActivityEvent"))
            .with_trigger(echo(ActivityType::ConversationUpdate, "ConversationUpdateActivityEvent"))
            .with_trigger(echo(ActivityType::EndOfConversation, "EndOfConversationActivityEvent"))
            .with_trigger(echo(ActivityType::Invoke, "InvokeActivityEvent"))
            .with_trigger(echo(ActivityType::Event, "EventActivityEvent"))
            .with_trigger(echo(ActivityType::Handoff, "HandoffActivityEvent"))
            .with_trigger(echo(ActivityType::Typing, "TypingActivityEvent"))
            .with_trigger(
                Trigger::on_message(vec![Action::send_activity("constraint")])
                    .with_guard("turn.activity.text == 'constraint'"),
            ),
    );

    assert_eq!(
        flow.conversation_update().await,
        vec!["ConversationUpdateActivityEvent"]
    );
    assert_eq!(flow.say("MessageActivityEvent").await, vec!["MessageActivityEvent"]);
    assert_eq!(flow.say("constraint").await, vec!["constraint"]);

    let cases = [
        (ActivityType::MessageUpdate, "MessageUpdateActivityEvent"),
        (ActivityType::MessageDelete, "MessageDeleteActivityEvent"),
        (ActivityType::MessageReaction, "MessageReactionActivityEvent"),
        (ActivityType::Typing, "TypingActivityEvent"),
        (ActivityType::EndOfConversation, "EndOfConversationActivityEvent"),
        (ActivityType::Event, "EventActivityEvent"),
        (ActivityType::Handoff, "HandoffActivityEvent"),
        (ActivityType::Invoke, "InvokeActivityEvent"),
        ("Custom".parse().unwrap(), "CustomActivityEvent"),
    ];
    for (activity_type, expected) in cases {
        assert_eq!(flow.send_type(activity_type).await, vec![expected]);
    }
}

#[tokio::test]
async fn test_activity_and_intent_triggers() {
    let flow = TestConversation::new(
        Dialog::new("test")
            .auto_end_dialog(false)
            .with_regex_recognizer(regex(&[("JokeIntent", "joke")]))
            .with_trigger(Trigger::on_intent(
                "JokeIntent",
                vec![Action::send_activity("chicken joke")],
            ))
            .with_trigger(
                Trigger::on_message(vec![Action::send_activity("abracadabra")])
                    .with_guard("turn.activity.text == 'magic'"),
            ),
    );

    assert_eq!(flow.say("tell me a joke").await, vec!["chicken joke"]);
    assert_eq!(flow.say("magic").await, vec!["abracadabra"]);
}

#[tokio::test]
async fn test_priority_breaks_ties() {
    let flow = TestConversation::new(
        Dialog::new("test")
            .auto_end_dialog(false)
            .with_regex_recognizer(regex(&[("A", "(?i)hello"), ("B", "(?i)hello")]))
            .with_trigger(Trigger::on_intent("A", vec![Action::send_activity("a")]))
            .with_trigger(
                Trigger::on_intent("B", vec![Action::send_activity("b")]).with_priority(5),
            ),
    );

    assert_eq!(flow.say("hello").await, vec!["b"]);
}

#[tokio::test]
async fn test_custom_recognizer_entities() {
    let mut recognizer = MockRecognizer::new();
    recognizer
        .expect_recognize()
        .withf(|activity: &Activity| activity.is_message())
        .returning(|activity| {
            let mut result = RecognizerResult::unknown(activity.text());
            if activity.text().contains("Paris") {
                result.candidates.push(IntentCandidate {
                    name: "BookFlight".to_string(),
                    score: 0.9,
                });
                result
                    .entities
                    .insert("city".to_string(), vec!["Paris".into()]);
            }
            Ok(result)
        });

    let flow = TestConversation::new(
        Dialog::new("travel")
            .auto_end_dialog(false)
            .with_recognizer(recognizer)
            .with_trigger(Trigger::on_intent(
                "BookFlight",
                vec![Action::send_activity(
                    "Booking a flight to {turn.recognized.entities.city[0]}.",
                )],
            ))
            .with_trigger(Trigger::on_unknown_intent(vec![Action::send_activity(
                "Where to?",
            )])),
    );

    assert_eq!(flow.say("fly me to Paris").await, vec!["Booking a flight to Paris."]);
    assert_eq!(flow.say("somewhere warm").await, vec!["Where to?"]);
}

#[tokio::test]
async fn test_failing_recognizer_degrades_to_unknown_intent() {
    let mut recognizer = MockRecognizer::new();
    recognizer
        .expect_recognize()
        .returning(|_| Err(RecognizerError::Unavailable("offline".to_string())));

    let flow = TestConversation::new(
        Dialog::new("travel")
            .with_recognizer(recognizer)
            .with_trigger(Trigger::on_intent("BookFlight", vec![Action::send_activity("booked")]))
            .with_trigger(Trigger::on_unknown_intent(vec![Action::send_activity(
                "Where to?",
            )])),
    );

    assert_eq!(flow.say("fly me to Paris").await, vec!["Where to?"]);
}
