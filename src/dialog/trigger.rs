use serde::{Deserialize, Serialize};

use super::action::Action;
use crate::activity::ActivityType;

/// What a trigger reacts to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "on", rename_all = "camelCase")]
pub enum TriggerCondition {
    /// Fires once when the owning dialog starts.
    BeginDialog,
    Activity {
        activity_type: ActivityType,
    },
    AnyActivity,
    Intent {
        intent: String,
    },
    /// Catch-all for messages nothing else handled.
    UnknownIntent,
}

impl TriggerCondition {
    /// Rank among activity triggers; higher is more specific.
    pub fn specificity(&self) -> u8 {
        match self {
            TriggerCondition::Activity { .. } => 3,
            TriggerCondition::AnyActivity => 2,
            TriggerCondition::Intent { .. } => 1,
            TriggerCondition::UnknownIntent | TriggerCondition::BeginDialog => 0,
        }
    }

    pub fn is_catch_all(&self) -> bool {
        matches!(self, TriggerCondition::UnknownIntent)
    }
}

/// How a fired trigger's actions enter the owning frame's plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::Display)]
pub enum PlanChange {
    /// Run ahead of whatever the frame was doing, then resume it.
    #[default]
    DoActions,
    /// Discard the remaining plan, including any suspended child dialogs.
    ReplacePlan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub condition: TriggerCondition,
    /// Expression that must be truthy for the trigger to fire. A passing guard
    /// outranks triggers without one.
    #[serde(default)]
    pub guard: Option<String>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub change: PlanChange,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Trigger {
    pub fn new(condition: TriggerCondition, actions: Vec<Action>) -> Self {
        Self {
            condition,
            guard: None,
            priority: 0,
            change: PlanChange::default(),
            actions,
        }
    }

    pub fn on_begin_dialog(actions: Vec<Action>) -> Self {
        Self::new(TriggerCondition::BeginDialog, actions)
    }

    pub fn on_intent(intent: impl Into<String>, actions: Vec<Action>) -> Self {
        Self::new(
            TriggerCondition::Intent {
                intent: intent.into(),
            },
            actions,
        )
    }

    pub fn on_unknown_intent(actions: Vec<Action>) -> Self {
        Self::new(TriggerCondition::UnknownIntent, actions)
    }

    pub fn on_activity(activity_type: ActivityType, actions: Vec<Action>) -> Self {
        Self::new(TriggerCondition::Activity { activity_type }, actions)
    }

    pub fn on_message(actions: Vec<Action>) -> Self {
        Self::on_activity(ActivityType::Message, actions)
    }

    pub fn on_conversation_update(actions: Vec<Action>) -> Self {
        Self::on_activity(ActivityType::ConversationUpdate, actions)
    }

    pub fn on_any_activity(actions: Vec<Action>) -> Self {
        Self::new(TriggerCondition::AnyActivity, actions)
    }

    pub fn with_guard(mut self, guard: impl Into<String>) -> Self {
        self.guard = Some(guard.into());
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn replacing_plan(mut self) -> Self {
        self.change = PlanChange::ReplacePlan;
        self
    }
}
