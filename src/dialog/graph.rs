use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::action::Action;
use super::trigger::{PlanChange, Trigger, TriggerCondition};
use crate::activity::Activity;
use crate::memory::{ArrayChange, PropertyPath};
use crate::recognizer::{Recognizer, RecognizerResult, RecognizerResultOf, RegexRecognizer};
use crate::{DialogError, DialogResult};

/// Index of a compiled action in the graph's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(pub usize);

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DialogRecognizer {
    Regex(RegexRecognizer),
    #[serde(skip)]
    Custom(Arc<dyn Recognizer>),
}

impl fmt::Debug for DialogRecognizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialogRecognizer::Regex(regex) => f.debug_tuple("Regex").field(regex).finish(),
            DialogRecognizer::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[async_trait]
impl Recognizer for DialogRecognizer {
    async fn recognize(&self, activity: &Activity) -> RecognizerResultOf<RecognizerResult> {
        match self {
            DialogRecognizer::Regex(regex) => regex.recognize(activity).await,
            DialogRecognizer::Custom(custom) => custom.recognize(activity).await,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Authoring form of a dialog. Nested `dialogs` are flattened into the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dialog {
    pub id: String,
    #[serde(default = "default_true")]
    pub auto_end_dialog: bool,
    #[serde(default)]
    pub recognizer: Option<DialogRecognizer>,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
    #[serde(default)]
    pub dialogs: Vec<Dialog>,
}

impl Dialog {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            auto_end_dialog: true,
            recognizer: None,
            triggers: Vec::new(),
            dialogs: Vec::new(),
        }
    }

    pub fn auto_end_dialog(mut self, auto_end: bool) -> Self {
        self.auto_end_dialog = auto_end;
        self
    }

    pub fn with_regex_recognizer(mut self, recognizer: RegexRecognizer) -> Self {
        self.recognizer = Some(DialogRecognizer::Regex(recognizer));
        self
    }

    pub fn with_recognizer<R: Recognizer + 'static>(mut self, recognizer: R) -> Self {
        self.recognizer = Some(DialogRecognizer::Custom(Arc::new(recognizer)));
        self
    }

    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    pub fn with_dialog(mut self, dialog: Dialog) -> Self {
        self.dialogs.push(dialog);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ActionNode {
    pub action: Action,
    /// Compiled nested lists, aligned with [`Action::branches`].
    pub branches: Vec<Vec<ActionId>>,
}

#[derive(Debug, Clone)]
pub struct CompiledTrigger {
    /// Declaration order within the dialog.
    pub index: usize,
    pub condition: TriggerCondition,
    pub guard: Option<String>,
    pub priority: i32,
    pub change: PlanChange,
    pub actions: Vec<ActionId>,
}

#[derive(Debug, Clone)]
pub struct CompiledDialog {
    pub id: String,
    pub auto_end_dialog: bool,
    pub recognizer: Option<DialogRecognizer>,
    pub triggers: Vec<CompiledTrigger>,
}

#[derive(Debug, Clone, Deserialize)]
struct GraphDefinition {
    root: Dialog,
    #[serde(default)]
    dialogs: Vec<Dialog>,
}

/// Immutable, shareable set of dialogs with one root.
#[derive(Debug, Clone)]
pub struct DialogGraph {
    root: String,
    dialogs: HashMap<String, CompiledDialog>,
    actions: Vec<ActionNode>,
}

impl DialogGraph {
    pub fn new(root: Dialog) -> DialogResult<Self> {
        Self::with_dialogs(root, Vec::new())
    }

    pub fn with_dialogs(root: Dialog, dialogs: Vec<Dialog>) -> DialogResult<Self> {
        let mut graph = Self {
            root: root.id.clone(),
            dialogs: HashMap::new(),
            actions: Vec::new(),
        };
        graph.add_dialog(root)?;
        for dialog in dialogs {
            graph.add_dialog(dialog)?;
        }
        debug!(
            "compiled dialog graph rooted at {} ({} dialogs, {} actions)",
            graph.root,
            graph.dialogs.len(),
            graph.actions.len()
        );
        Ok(graph)
    }

    /// Loads `{"root": {...}, "dialogs": [...]}`.
    pub fn from_json(source: &str) -> DialogResult<Self> {
        let definition: GraphDefinition = serde_json::from_str(source)
            .map_err(|e| DialogError::invalid_graph(format!("Failed to parse dialogs: {}", e)))?;
        Self::with_dialogs(definition.root, definition.dialogs)
    }

    fn add_dialog(&mut self, dialog: Dialog) -> DialogResult<()> {
        if self.dialogs.contains_key(&dialog.id) {
            return Err(DialogError::DuplicateDialog(dialog.id));
        }
        let mut triggers = Vec::with_capacity(dialog.triggers.len());
        for (index, trigger) in dialog.triggers.iter().enumerate() {
            triggers.push(CompiledTrigger {
                index,
                condition: trigger.condition.clone(),
                guard: trigger.guard.clone(),
                priority: trigger.priority,
                change: trigger.change,
                actions: self.compile_actions(&trigger.actions),
            });
        }
        self.dialogs.insert(
            dialog.id.clone(),
            CompiledDialog {
                id: dialog.id,
                auto_end_dialog: dialog.auto_end_dialog,
                recognizer: dialog.recognizer,
                triggers,
            },
        );
        for child in dialog.dialogs {
            self.add_dialog(child)?;
        }
        Ok(())
    }

    fn compile_actions(&mut self, actions: &[Action]) -> Vec<ActionId> {
        let mut ids = Vec::with_capacity(actions.len());
        for action in actions {
            let mut branches = Vec::new();
            for branch in action.branches() {
                branches.push(self.compile_actions(branch));
            }
            self.actions.push(ActionNode {
                action: action.clone(),
                branches,
            });
            ids.push(ActionId(self.actions.len() - 1));
        }
        ids
    }

    pub fn root_id(&self) -> &str {
        &self.root
    }

    pub fn contains(&self, id: &str) -> bool {
        self.dialogs.contains_key(id)
    }

    pub fn dialog(&self, id: &str) -> DialogResult<&CompiledDialog> {
        self.dialogs
            .get(id)
            .ok_or_else(|| DialogError::UnknownDialogReference(id.to_string()))
    }

    pub fn action(&self, id: ActionId) -> DialogResult<&ActionNode> {
        self.actions
            .get(id.0)
            .ok_or_else(|| DialogError::invalid_graph(format!("unknown action id {}", id.0)))
    }

    pub fn dialog_ids(&self) -> impl Iterator<Item = &str> {
        self.dialogs.keys().map(String::as_str)
    }

    /// Static checks that would otherwise only fail at runtime: dialog references,
    /// writable property paths and array edits that need a value.
    pub fn validate(&self) -> DialogResult<()> {
        for node in &self.actions {
            match &node.action {
                Action::BeginDialog { dialog, .. } | Action::ReplaceDialog { dialog, .. } => {
                    self.dialog(dialog)?;
                }
                Action::EditArray {
                    change,
                    property,
                    value,
                    ..
                } => {
                    check_writable(property)?;
                    if matches!(change, ArrayChange::Push | ArrayChange::Remove)
                        && value.is_none()
                    {
                        return Err(DialogError::invalid_graph(format!(
                            "EditArray {} on {} requires a value",
                            change, property
                        )));
                    }
                }
                Action::SetProperty { property, .. }
                | Action::DeleteProperty { property }
                | Action::InitProperty { property, .. } => check_writable(property)?,
                action => {
                    if let Some((_, settings)) = action.input() {
                        check_writable(&settings.property)?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn check_writable(property: &str) -> DialogResult<()> {
    PropertyPath::parse(property)?.require_scope()?;
    Ok(())
}
