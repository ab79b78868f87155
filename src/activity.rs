use core::fmt;
use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::memory::Value;

/// Kind of inbound or outbound activity. Unrecognized names are kept as `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActivityType {
    Message,
    ConversationUpdate,
    MessageUpdate,
    MessageDelete,
    MessageReaction,
    Typing,
    EndOfConversation,
    Event,
    Handoff,
    Invoke,
    Trace,
    Custom(String),
}

impl ActivityType {
    pub fn as_str(&self) -> &str {
        match self {
            ActivityType::Message => "message",
            ActivityType::ConversationUpdate => "conversationUpdate",
            ActivityType::MessageUpdate => "messageUpdate",
            ActivityType::MessageDelete => "messageDelete",
            ActivityType::MessageReaction => "messageReaction",
            ActivityType::Typing => "typing",
            ActivityType::EndOfConversation => "endOfConversation",
            ActivityType::Event => "event",
            ActivityType::Handoff => "handoff",
            ActivityType::Invoke => "invoke",
            ActivityType::Trace => "trace",
            ActivityType::Custom(name) => name,
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "message" => ActivityType::Message,
            "conversationUpdate" => ActivityType::ConversationUpdate,
            "messageUpdate" => ActivityType::MessageUpdate,
            "messageDelete" => ActivityType::MessageDelete,
            "messageReaction" => ActivityType::MessageReaction,
            "typing" => ActivityType::Typing,
            "endOfConversation" => ActivityType::EndOfConversation,
            "event" => ActivityType::Event,
            "handoff" => ActivityType::Handoff,
            "invoke" => ActivityType::Invoke,
            "trace" => ActivityType::Trace,
            other => ActivityType::Custom(other.to_string()),
        })
    }
}

impl From<String> for ActivityType {
    fn from(s: String) -> Self {
        match ActivityType::from_str(&s) {
            Ok(activity_type) => activity_type,
            Err(never) => match never {},
        }
    }
}

impl From<ActivityType> for String {
    fn from(activity_type: ActivityType) -> Self {
        activity_type.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelAccount {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChannelAccount {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

pub const DEFAULT_CONVERSATION_ID: &str = "conversation";
pub const DEFAULT_USER_ID: &str = "user";
pub const DEFAULT_BOT_ID: &str = "bot";

/// A single inbound or outbound event of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
    pub conversation_id: String,
    pub from: ChannelAccount,
    pub recipient: ChannelAccount,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members_added: Vec<ChannelAccount>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Activity {
    pub fn new(activity_type: ActivityType) -> Self {
        Self {
            activity_type,
            id: Some(uuid::Uuid::new_v4().to_string()),
            text: None,
            value: None,
            name: None,
            conversation_id: DEFAULT_CONVERSATION_ID.to_string(),
            from: ChannelAccount::new(DEFAULT_USER_ID),
            recipient: ChannelAccount::new(DEFAULT_BOT_ID),
            members_added: Vec::new(),
            timestamp: Some(Utc::now()),
        }
    }

    pub fn message(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::new(ActivityType::Message)
        }
    }

    pub fn conversation_update(members_added: Vec<ChannelAccount>) -> Self {
        Self {
            members_added,
            ..Self::new(ActivityType::ConversationUpdate)
        }
    }

    pub fn trace(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            name: Some("LogAction".to_string()),
            ..Self::new(ActivityType::Trace)
        }
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = conversation_id.into();
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.from = ChannelAccount::new(user_id);
        self
    }

    pub fn is_message(&self) -> bool {
        self.activity_type == ActivityType::Message
    }

    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }

    /// Outbound reply addressed back to the sender of this activity.
    pub fn reply(&self, text: impl Into<String>) -> Activity {
        self.reply_with(Activity::message(text))
    }

    pub fn reply_with(&self, mut activity: Activity) -> Activity {
        activity.conversation_id = self.conversation_id.clone();
        activity.from = self.recipient.clone();
        activity.recipient = self.from.clone();
        activity
    }

    /// Memory representation exposed as `turn.activity`.
    pub fn to_value(&self) -> Value {
        let mut map = BTreeMap::new();
        map.insert(
            "type".to_string(),
            Value::String(self.activity_type.to_string()),
        );
        map.insert(
            "text".to_string(),
            self.text.clone().map(Value::String).unwrap_or_default(),
        );
        map.insert("value".to_string(), self.value.clone().unwrap_or_default());
        map.insert(
            "name".to_string(),
            self.name.clone().map(Value::String).unwrap_or_default(),
        );
        map.insert(
            "conversationId".to_string(),
            Value::String(self.conversation_id.clone()),
        );
        map.insert("from".to_string(), Value::String(self.from.id.clone()));
        Value::Map(map)
    }
}
