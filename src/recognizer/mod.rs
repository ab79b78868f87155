mod regex_recognizer;

pub use regex_recognizer::{IntentPattern, RegexRecognizer};

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::activity::Activity;
use crate::memory::Value;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecognizerError {
    #[error("Invalid pattern for intent {intent}: {message}")]
    InvalidPattern { intent: String, message: String },
    #[error("Recognizer unavailable: {0}")]
    Unavailable(String),
}

pub type RecognizerResultOf<T> = Result<T, RecognizerError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentCandidate {
    pub name: String,
    pub score: f64,
}

/// Outcome of intent recognition. Zero candidates means the utterance is an unknown intent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecognizerResult {
    pub text: String,
    pub candidates: Vec<IntentCandidate>,
    pub entities: BTreeMap<String, Vec<Value>>,
}

impl RecognizerResult {
    pub fn unknown(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn has_intent(&self, name: &str) -> bool {
        self.candidates.iter().any(|c| c.name == name)
    }

    /// First value captured for an entity.
    pub fn entity(&self, name: &str) -> Option<&Value> {
        self.entities.get(name).and_then(|values| values.first())
    }

    pub fn top_intent(&self) -> Option<&IntentCandidate> {
        self.candidates.iter().fold(None, |best, candidate| match best {
            Some(best) if best.score >= candidate.score => Some(best),
            _ => Some(candidate),
        })
    }

    /// Memory representation exposed as `turn.recognized`.
    pub fn to_value(&self) -> Value {
        let mut map = BTreeMap::new();
        map.insert("text".to_string(), Value::String(self.text.clone()));
        let (intent, score) = match self.top_intent() {
            Some(top) => (Value::String(top.name.clone()), Value::Float(top.score)),
            None => (Value::Null, Value::Float(0.0)),
        };
        map.insert("intent".to_string(), intent);
        map.insert("score".to_string(), score);
        map.insert(
            "intents".to_string(),
            Value::Map(
                self.candidates
                    .iter()
                    .map(|c| (c.name.clone(), Value::Float(c.score)))
                    .collect(),
            ),
        );
        map.insert(
            "entities".to_string(),
            Value::Map(
                self.entities
                    .iter()
                    .map(|(name, values)| (name.clone(), Value::List(values.clone())))
                    .collect(),
            ),
        );
        Value::Map(map)
    }
}

/// Classifies an inbound activity into intent candidates.
#[mockall::automock]
#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn recognize(&self, activity: &Activity) -> RecognizerResultOf<RecognizerResult>;
}
