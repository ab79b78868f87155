use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    IntentCandidate, Recognizer, RecognizerError, RecognizerResult, RecognizerResultOf,
};
use crate::activity::Activity;
use crate::memory::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentPattern {
    pub intent: String,
    pub pattern: String,
}

/// Matches message text against an ordered list of patterns.
///
/// Every matching pattern yields a candidate with score 1.0 and named capture groups
/// become entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<IntentPattern>", into = "Vec<IntentPattern>")]
pub struct RegexRecognizer {
    intents: Vec<(IntentPattern, Regex)>,
}

impl RegexRecognizer {
    pub fn new() -> Self {
        Self {
            intents: Vec::new(),
        }
    }

    pub fn with_intent(
        mut self,
        intent: impl Into<String>,
        pattern: impl Into<String>,
    ) -> RecognizerResultOf<Self> {
        let pattern = IntentPattern {
            intent: intent.into(),
            pattern: pattern.into(),
        };
        let regex = Regex::new(&pattern.pattern).map_err(|e| RecognizerError::InvalidPattern {
            intent: pattern.intent.clone(),
            message: e.to_string(),
        })?;
        self.intents.push((pattern, regex));
        Ok(self)
    }

    pub fn patterns(&self) -> impl Iterator<Item = &IntentPattern> {
        self.intents.iter().map(|(pattern, _)| pattern)
    }

    pub fn recognize_text(&self, text: &str) -> RecognizerResult {
        let mut result = RecognizerResult::unknown(text);
        for (pattern, regex) in &self.intents {
            let Some(captures) = regex.captures(text) else {
                continue;
            };
            if !result.has_intent(&pattern.intent) {
                result.candidates.push(IntentCandidate {
                    name: pattern.intent.clone(),
                    score: 1.0,
                });
            }
            for name in regex.capture_names().flatten() {
                if let Some(m) = captures.name(name) {
                    result
                        .entities
                        .entry(name.to_string())
                        .or_default()
                        .push(Value::String(m.as_str().to_string()));
                }
            }
        }
        debug!(
            "recognized {:?} as {:?}",
            text,
            result
                .candidates
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
        );
        result
    }
}

impl Default for RegexRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<Vec<IntentPattern>> for RegexRecognizer {
    type Error = RecognizerError;

    fn try_from(patterns: Vec<IntentPattern>) -> Result<Self, Self::Error> {
        patterns
            .into_iter()
            .try_fold(RegexRecognizer::new(), |recognizer, p| {
                recognizer.with_intent(p.intent, p.pattern)
            })
    }
}

impl From<RegexRecognizer> for Vec<IntentPattern> {
    fn from(recognizer: RegexRecognizer) -> Self {
        recognizer.intents.into_iter().map(|(p, _)| p).collect()
    }
}

#[async_trait]
impl Recognizer for RegexRecognizer {
    async fn recognize(&self, activity: &Activity) -> RecognizerResultOf<RecognizerResult> {
        if !activity.is_message() {
            return Ok(RecognizerResult::unknown(""));
        }
        Ok(self.recognize_text(activity.text()))
    }
}
