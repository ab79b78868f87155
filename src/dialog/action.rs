use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::memory::{ArrayChange, PropertyKind};

/// Declarative step of a dialog plan.
///
/// String fields named `condition`, `value` or `options` hold expressions; `activity`,
/// `prompt` and `text` hold templates; `property` fields hold scoped property paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Action {
    SendActivity {
        activity: String,
    },
    TextInput(InputSettings),
    NumberInput(InputSettings),
    ConfirmInput(InputSettings),
    IfCondition {
        condition: String,
        #[serde(default)]
        actions: Vec<Action>,
        #[serde(default)]
        else_actions: Vec<Action>,
    },
    Switch {
        condition: String,
        #[serde(default)]
        cases: Vec<SwitchCase>,
        #[serde(default)]
        default: Vec<Action>,
    },
    SetProperty {
        property: String,
        value: String,
    },
    DeleteProperty {
        property: String,
    },
    InitProperty {
        property: String,
        #[serde(rename = "type")]
        kind: PropertyKind,
    },
    EditArray {
        change: ArrayChange,
        property: String,
        #[serde(default)]
        value: Option<String>,
        #[serde(default)]
        result_property: Option<String>,
    },
    BeginDialog {
        dialog: String,
        #[serde(default)]
        options: BTreeMap<String, String>,
        #[serde(default)]
        result_property: Option<String>,
    },
    EndDialog {
        #[serde(default)]
        value: Option<String>,
    },
    ReplaceDialog {
        dialog: String,
        #[serde(default)]
        options: BTreeMap<String, String>,
    },
    CancelAllDialogs,
    EndTurn,
    LogAction {
        text: String,
        #[serde(default)]
        trace_activity: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchCase {
    /// Expression compared against the switch condition.
    pub value: String,
    #[serde(default)]
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum InputKind {
    Text,
    Number,
    Confirm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSettings {
    pub prompt: String,
    pub property: String,
    #[serde(default)]
    pub always_prompt: bool,
    #[serde(default)]
    pub invalid_prompt: Option<String>,
    #[serde(default)]
    pub max_turn_count: Option<u32>,
    /// Expression assigned once `max_turn_count` is exhausted.
    #[serde(default)]
    pub default_value: Option<String>,
    /// Conditions over `turn.value` that a converted input must satisfy.
    #[serde(default)]
    pub validations: Vec<String>,
}

impl InputSettings {
    pub fn new(prompt: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            property: property.into(),
            always_prompt: false,
            invalid_prompt: None,
            max_turn_count: None,
            default_value: None,
            validations: Vec::new(),
        }
    }

    pub fn always_prompt(mut self) -> Self {
        self.always_prompt = true;
        self
    }

    pub fn with_invalid_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.invalid_prompt = Some(prompt.into());
        self
    }

    pub fn with_max_turn_count(mut self, count: u32) -> Self {
        self.max_turn_count = Some(count);
        self
    }

    pub fn with_default_value(mut self, expression: impl Into<String>) -> Self {
        self.default_value = Some(expression.into());
        self
    }

    pub fn with_validation(mut self, condition: impl Into<String>) -> Self {
        self.validations.push(condition.into());
        self
    }
}

/// Broad category of an action, used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Capability {
    Output,
    Input,
    ControlFlow,
    Mutation,
    StackControl,
    Diagnostics,
}

impl Action {
    pub fn send_activity(activity: impl Into<String>) -> Self {
        Action::SendActivity {
            activity: activity.into(),
        }
    }

    pub fn text_input(prompt: impl Into<String>, property: impl Into<String>) -> Self {
        Action::TextInput(InputSettings::new(prompt, property))
    }

    pub fn number_input(prompt: impl Into<String>, property: impl Into<String>) -> Self {
        Action::NumberInput(InputSettings::new(prompt, property))
    }

    pub fn confirm_input(prompt: impl Into<String>, property: impl Into<String>) -> Self {
        Action::ConfirmInput(InputSettings::new(prompt, property))
    }

    pub fn if_condition(condition: impl Into<String>, actions: Vec<Action>) -> Self {
        Self::if_else(condition, actions, Vec::new())
    }

    pub fn if_else(
        condition: impl Into<String>,
        actions: Vec<Action>,
        else_actions: Vec<Action>,
    ) -> Self {
        Action::IfCondition {
            condition: condition.into(),
            actions,
            else_actions,
        }
    }

    pub fn set_property(property: impl Into<String>, value: impl Into<String>) -> Self {
        Action::SetProperty {
            property: property.into(),
            value: value.into(),
        }
    }

    pub fn edit_array(
        change: ArrayChange,
        property: impl Into<String>,
        value: Option<&str>,
    ) -> Self {
        Action::EditArray {
            change,
            property: property.into(),
            value: value.map(str::to_string),
            result_property: None,
        }
    }

    pub fn init_property(property: impl Into<String>, kind: PropertyKind) -> Self {
        Action::InitProperty {
            property: property.into(),
            kind,
        }
    }

    pub fn begin_dialog(dialog: impl Into<String>) -> Self {
        Action::BeginDialog {
            dialog: dialog.into(),
            options: BTreeMap::new(),
            result_property: None,
        }
    }

    pub fn end_dialog() -> Self {
        Action::EndDialog { value: None }
    }

    pub fn input(&self) -> Option<(InputKind, &InputSettings)> {
        match self {
            Action::TextInput(settings) => Some((InputKind::Text, settings)),
            Action::NumberInput(settings) => Some((InputKind::Number, settings)),
            Action::ConfirmInput(settings) => Some((InputKind::Confirm, settings)),
            _ => None,
        }
    }

    /// Nested action lists, in branch order. `Switch` lists its cases then the default.
    pub fn branches(&self) -> Vec<&[Action]> {
        match self {
            Action::IfCondition {
                actions,
                else_actions,
                ..
            } => vec![actions.as_slice(), else_actions.as_slice()],
            Action::Switch { cases, default, .. } => cases
                .iter()
                .map(|case| case.actions.as_slice())
                .chain(std::iter::once(default.as_slice()))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::SendActivity { .. } => "SendActivity",
            Action::TextInput(_) => "TextInput",
            Action::NumberInput(_) => "NumberInput",
            Action::ConfirmInput(_) => "ConfirmInput",
            Action::IfCondition { .. } => "IfCondition",
            Action::Switch { .. } => "Switch",
            Action::SetProperty { .. } => "SetProperty",
            Action::DeleteProperty { .. } => "DeleteProperty",
            Action::InitProperty { .. } => "InitProperty",
            Action::EditArray { .. } => "EditArray",
            Action::BeginDialog { .. } => "BeginDialog",
            Action::EndDialog { .. } => "EndDialog",
            Action::ReplaceDialog { .. } => "ReplaceDialog",
            Action::CancelAllDialogs => "CancelAllDialogs",
            Action::EndTurn => "EndTurn",
            Action::LogAction { .. } => "LogAction",
        }
    }

    pub fn capability(&self) -> Capability {
        match self {
            Action::SendActivity { .. } => Capability::Output,
            Action::TextInput(_) | Action::NumberInput(_) | Action::ConfirmInput(_) => {
                Capability::Input
            }
            Action::IfCondition { .. } | Action::Switch { .. } | Action::EndTurn => {
                Capability::ControlFlow
            }
            Action::SetProperty { .. }
            | Action::DeleteProperty { .. }
            | Action::InitProperty { .. }
            | Action::EditArray { .. } => Capability::Mutation,
            Action::BeginDialog { .. }
            | Action::EndDialog { .. }
            | Action::ReplaceDialog { .. }
            | Action::CancelAllDialogs => Capability::StackControl,
            Action::LogAction { .. } => Capability::Diagnostics,
        }
    }
}
