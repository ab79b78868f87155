use std::collections::BTreeMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info};

use super::context::ActiveFrame;
use crate::activity::Activity;
use crate::config::EngineConfig;
use crate::dialog::{Action, ActionId, ActionNode, InputKind, InputSettings, StepState};
use crate::expression::ExpressionEvaluator;
use crate::memory::{MemoryRead, PropertyPath, Value};
use crate::render::TemplateRenderer;
use crate::{DialogError, DialogResult};

lazy_static! {
    static ref NUMBER: Regex = Regex::new(r"-?\d+(?:\.\d+)?").unwrap();
}

const CONFIRM_YES: &[&str] = &["yes", "y", "yeah", "yep", "sure", "ok", "true"];
const CONFIRM_NO: &[&str] = &["no", "n", "nope", "nah", "false"];

/// What the turn loop should do after an action ran.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionSignal {
    Advance,
    /// Replace the current step with these steps.
    Splice(Vec<ActionId>),
    /// Stop the turn; the current step stays pending.
    Suspend,
    Push {
        dialog_id: String,
        options: BTreeMap<String, Value>,
    },
    Pop(Option<Value>),
    Replace {
        dialog_id: String,
        options: BTreeMap<String, Value>,
    },
    CancelAll,
}

/// Runs individual actions against the active frame.
pub struct ActionExecutor {
    evaluator: ExpressionEvaluator,
    renderer: Arc<dyn TemplateRenderer>,
    config: EngineConfig,
}

impl ActionExecutor {
    pub fn new(
        evaluator: ExpressionEvaluator,
        renderer: Arc<dyn TemplateRenderer>,
        config: EngineConfig,
    ) -> Self {
        Self {
            evaluator,
            renderer,
            config,
        }
    }

    pub async fn execute(
        &self,
        node: &ActionNode,
        mut frame: ActiveFrame<'_>,
    ) -> DialogResult<ExecutionSignal> {
        debug!(
            "execute {} ({}) in state {:?}",
            node.action.name(),
            node.action.capability(),
            frame.step
        );
        match &node.action {
            Action::SendActivity { activity } => {
                self.send(&mut frame, activity).await?;
                Ok(ExecutionSignal::Advance)
            }
            Action::TextInput(settings) => {
                self.execute_input(InputKind::Text, settings, &mut frame).await
            }
            Action::NumberInput(settings) => {
                self.execute_input(InputKind::Number, settings, &mut frame).await
            }
            Action::ConfirmInput(settings) => {
                self.execute_input(InputKind::Confirm, settings, &mut frame).await
            }
            Action::IfCondition { condition, .. } => {
                let branch = if self.evaluator.evaluate_condition(condition, &frame.memory)? {
                    0
                } else {
                    1
                };
                Ok(ExecutionSignal::Splice(branch_of(node, branch)?))
            }
            Action::Switch {
                condition, cases, ..
            } => {
                let value = self.evaluator.evaluate_source(condition, &frame.memory)?;
                for (index, case) in cases.iter().enumerate() {
                    let candidate = self.evaluator.evaluate_source(&case.value, &frame.memory)?;
                    if candidate.loose_eq(&value) {
                        return Ok(ExecutionSignal::Splice(branch_of(node, index)?));
                    }
                }
                Ok(ExecutionSignal::Splice(branch_of(node, cases.len())?))
            }
            Action::SetProperty { property, value } => {
                let value = self.evaluator.evaluate_source(value, &frame.memory)?;
                frame.memory.set(&PropertyPath::parse(property)?, value)?;
                Ok(ExecutionSignal::Advance)
            }
            Action::DeleteProperty { property } => {
                frame.memory.delete(&PropertyPath::parse(property)?)?;
                Ok(ExecutionSignal::Advance)
            }
            Action::InitProperty { property, kind } => {
                frame
                    .memory
                    .init_property(&PropertyPath::parse(property)?, *kind)?;
                Ok(ExecutionSignal::Advance)
            }
            Action::EditArray {
                change,
                property,
                value,
                result_property,
            } => {
                let value = match value {
                    Some(expression) => {
                        Some(self.evaluator.evaluate_source(expression, &frame.memory)?)
                    }
                    None => None,
                };
                let result = frame
                    .memory
                    .edit_array(&PropertyPath::parse(property)?, *change, value)?;
                if let (Some(result_property), Some(result)) = (result_property, result) {
                    frame
                        .memory
                        .set(&PropertyPath::parse(result_property)?, result)?;
                }
                Ok(ExecutionSignal::Advance)
            }
            Action::BeginDialog {
                dialog, options, ..
            } => Ok(ExecutionSignal::Push {
                dialog_id: dialog.clone(),
                options: self.evaluate_options(options, &frame)?,
            }),
            Action::EndDialog { value } => {
                let result = match value {
                    Some(expression) => {
                        Some(self.evaluator.evaluate_source(expression, &frame.memory)?)
                    }
                    None => None,
                };
                Ok(ExecutionSignal::Pop(result))
            }
            Action::ReplaceDialog { dialog, options } => Ok(ExecutionSignal::Replace {
                dialog_id: dialog.clone(),
                options: self.evaluate_options(options, &frame)?,
            }),
            Action::CancelAllDialogs => Ok(ExecutionSignal::CancelAll),
            Action::EndTurn => match *frame.step {
                StepState::AwaitingEndTurn => {
                    if *frame.input_consumed {
                        // interrupted; keep waiting for a fresh turn
                        return Ok(ExecutionSignal::Suspend);
                    }
                    *frame.input_consumed = true;
                    *frame.step = StepState::Fresh;
                    Ok(ExecutionSignal::Advance)
                }
                _ => {
                    *frame.step = StepState::AwaitingEndTurn;
                    Ok(ExecutionSignal::Suspend)
                }
            },
            Action::LogAction {
                text,
                trace_activity,
            } => {
                let message = self.evaluator.render_template(text, &frame.memory)?;
                info!(target: "adaptive_dialog::log_action", "{}", message);
                if *trace_activity {
                    let trace = frame.activity.reply_with(Activity::trace(message));
                    frame.outbound.push(trace);
                }
                Ok(ExecutionSignal::Advance)
            }
        }
    }

    async fn send(&self, frame: &mut ActiveFrame<'_>, template: &str) -> DialogResult<()> {
        let message = self.renderer.render(template, &frame.memory.view()).await?;
        frame.send(message);
        Ok(())
    }

    fn evaluate_options(
        &self,
        options: &BTreeMap<String, String>,
        frame: &ActiveFrame<'_>,
    ) -> DialogResult<BTreeMap<String, Value>> {
        options
            .iter()
            .map(|(name, expression)| -> DialogResult<(String, Value)> {
                Ok((
                    name.clone(),
                    self.evaluator.evaluate_source(expression, &frame.memory)?,
                ))
            })
            .collect()
    }

    async fn execute_input(
        &self,
        kind: InputKind,
        settings: &InputSettings,
        frame: &mut ActiveFrame<'_>,
    ) -> DialogResult<ExecutionSignal> {
        let property = PropertyPath::parse(&settings.property)?;
        let attempts = match *frame.step {
            StepState::Fresh => {
                if !settings.always_prompt && !frame.memory.resolve(&property).is_null() {
                    debug!("{} already set; skipping {} input", property, kind);
                    return Ok(ExecutionSignal::Advance);
                }
                self.send(frame, &settings.prompt).await?;
                *frame.step = StepState::AwaitingInput { attempts: 0 };
                return Ok(ExecutionSignal::Suspend);
            }
            StepState::AwaitingInput { attempts } => attempts,
            ref other => {
                return Err(DialogError::internal(format!(
                    "input step in unexpected state {:?}",
                    other
                )))
            }
        };

        let Some(text) = frame.take_input().map(str::to_string) else {
            if frame.activity.is_message() {
                // the reply was used by an interruption
                self.send(frame, &settings.prompt).await?;
            }
            return Ok(ExecutionSignal::Suspend);
        };

        if let Some(value) = convert_input(kind, &text) {
            if self.validate(settings, &value, frame)? {
                frame.memory.set(&property, value)?;
                *frame.step = StepState::Fresh;
                return Ok(ExecutionSignal::Advance);
            }
        }
        debug!("rejected {} input {:?} for {}", kind, text, property);

        let attempts = attempts + 1;
        let max_turn_count = settings
            .max_turn_count
            .or(self.config.default_input_max_turn_count);
        if max_turn_count.is_some_and(|max| attempts >= max) {
            if let Some(default) = &settings.default_value {
                let value = self.evaluator.evaluate_source(default, &frame.memory)?;
                frame.memory.set(&property, value)?;
            }
            *frame.step = StepState::Fresh;
            return Ok(ExecutionSignal::Advance);
        }

        let prompt = settings
            .invalid_prompt
            .as_deref()
            .unwrap_or(&settings.prompt);
        self.send(frame, prompt).await?;
        *frame.step = StepState::AwaitingInput { attempts };
        Ok(ExecutionSignal::Suspend)
    }

    fn validate(
        &self,
        settings: &InputSettings,
        value: &Value,
        frame: &mut ActiveFrame<'_>,
    ) -> DialogResult<bool> {
        if settings.validations.is_empty() {
            return Ok(true);
        }
        frame
            .memory
            .set(&PropertyPath::parse("turn.value")?, value.clone())?;
        for validation in &settings.validations {
            if !self.evaluator.evaluate_condition(validation, &frame.memory)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn branch_of(node: &ActionNode, index: usize) -> DialogResult<Vec<ActionId>> {
    node.branches.get(index).cloned().ok_or_else(|| {
        DialogError::invalid_graph(format!(
            "{} has no branch {}",
            node.action.name(),
            index
        ))
    })
}

/// Converts raw reply text for an input kind. `None` means the reply is unusable.
fn convert_input(kind: InputKind, text: &str) -> Option<Value> {
    let text = text.trim();
    match kind {
        InputKind::Text => (!text.is_empty()).then(|| Value::String(text.to_string())),
        InputKind::Number => {
            let number = NUMBER.find(text)?.as_str();
            match number.parse::<i64>() {
                Ok(i) => Some(Value::Integer(i)),
                Err(_) => number.parse::<f64>().ok().map(Value::Float),
            }
        }
        InputKind::Confirm => {
            let lowered = text.to_lowercase();
            let word = lowered
                .split(|c: char| !c.is_alphanumeric())
                .find(|w| !w.is_empty())?;
            if CONFIRM_YES.contains(&word) {
                Some(Value::Boolean(true))
            } else if CONFIRM_NO.contains(&word) {
                Some(Value::Boolean(false))
            } else {
                None
            }
        }
    }
}
