use std::cmp::Reverse;

use tracing::{debug, warn};

use super::graph::{CompiledDialog, CompiledTrigger};
use super::trigger::TriggerCondition;
use crate::activity::Activity;
use crate::expression::ExpressionEvaluator;
use crate::memory::MemoryRead;
use crate::recognizer::RecognizerResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPhase {
    /// The owning dialog is starting; only lifecycle triggers apply.
    BeginDialog,
    /// An activity arrived. The catch-all only applies to an idle active frame.
    Activity { allow_catch_all: bool },
}

/// Picks the single trigger of a dialog that should fire.
///
/// Candidates are ranked by condition specificity, then by whether they carry a
/// passing guard, then by priority, then by declaration order.
#[derive(Debug, Clone, Default)]
pub struct TriggerSelector {
    evaluator: ExpressionEvaluator,
}

impl TriggerSelector {
    pub fn new(evaluator: ExpressionEvaluator) -> Self {
        Self { evaluator }
    }

    pub fn select<'d, M: MemoryRead + ?Sized>(
        &self,
        dialog: &'d CompiledDialog,
        phase: SelectionPhase,
        activity: &Activity,
        recognized: &RecognizerResult,
        memory: &M,
    ) -> Option<&'d CompiledTrigger> {
        let selected = dialog
            .triggers
            .iter()
            .filter(|trigger| {
                Self::condition_matches(&trigger.condition, phase, activity, recognized)
            })
            .filter(|trigger| self.guard_passes(dialog, trigger, memory))
            .max_by_key(|trigger| {
                (
                    trigger.condition.specificity(),
                    trigger.guard.is_some(),
                    trigger.priority,
                    Reverse(trigger.index),
                )
            });
        if let Some(trigger) = selected {
            debug!(
                "dialog {} selected trigger #{} ({:?})",
                dialog.id, trigger.index, trigger.condition
            );
        }
        selected
    }

    fn condition_matches(
        condition: &TriggerCondition,
        phase: SelectionPhase,
        activity: &Activity,
        recognized: &RecognizerResult,
    ) -> bool {
        match (phase, condition) {
            (SelectionPhase::BeginDialog, TriggerCondition::BeginDialog) => true,
            (SelectionPhase::BeginDialog, _) | (_, TriggerCondition::BeginDialog) => false,
            (_, TriggerCondition::Activity { activity_type }) => {
                &activity.activity_type == activity_type
            }
            (_, TriggerCondition::AnyActivity) => true,
            (_, TriggerCondition::Intent { intent }) => {
                activity.is_message() && recognized.has_intent(intent)
            }
            (SelectionPhase::Activity { allow_catch_all }, TriggerCondition::UnknownIntent) => {
                allow_catch_all && activity.is_message()
            }
        }
    }

    fn guard_passes<M: MemoryRead + ?Sized>(
        &self,
        dialog: &CompiledDialog,
        trigger: &CompiledTrigger,
        memory: &M,
    ) -> bool {
        let Some(guard) = &trigger.guard else {
            return true;
        };
        match self.evaluator.evaluate_condition(guard, memory) {
            Ok(passed) => passed,
            Err(e) => {
                warn!(
                    "guard `{}` of trigger #{} in dialog {} failed: {}",
                    guard, trigger.index, dialog.id, e
                );
                false
            }
        }
    }
}
