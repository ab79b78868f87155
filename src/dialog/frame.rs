use serde::{Deserialize, Serialize};

use super::graph::ActionId;
use crate::memory::Value;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::Display,
)]
pub enum FrameState {
    #[default]
    Starting,
    Running,
    /// Waiting for the next turn, either on a pending step or idle with an empty plan.
    Suspended,
    Ending,
}

/// Progress of one plan step. Anything other than `Fresh` is a pending marker that
/// resumes on a later turn.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum StepState {
    #[default]
    Fresh,
    /// Prompted; `attempts` counts rejected replies so far.
    AwaitingInput { attempts: u32 },
    AwaitingEndTurn,
    /// A child dialog started by this step is running above this frame.
    AwaitingChild,
    /// Child frames set aside by an interruption, restored once this step is reached again.
    Parked { frames: Vec<DialogFrame> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub action: ActionId,
    #[serde(default)]
    pub state: StepState,
}

impl PlanStep {
    pub fn fresh(action: ActionId) -> Self {
        Self {
            action,
            state: StepState::Fresh,
        }
    }
}

/// A running instance of a dialog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogFrame {
    pub dialog_id: String,
    pub instance_id: String,
    pub state: FrameState,
    /// Dialog scope; discarded when the frame is popped.
    pub scope: Value,
    pub plan: Vec<PlanStep>,
    pub cursor: usize,
}

impl DialogFrame {
    pub fn new(dialog_id: impl Into<String>, scope: Value) -> Self {
        Self {
            dialog_id: dialog_id.into(),
            instance_id: uuid::Uuid::new_v4().to_string(),
            state: FrameState::Starting,
            scope,
            plan: Vec::new(),
            cursor: 0,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.plan.len()
    }

    pub fn current_step(&self) -> Option<&PlanStep> {
        self.plan.get(self.cursor)
    }

    pub fn current_step_mut(&mut self) -> Option<&mut PlanStep> {
        self.plan.get_mut(self.cursor)
    }

    /// True when nothing is pending: the plan is exhausted or the next step has not started.
    pub fn is_idle(&self) -> bool {
        self.current_step().map_or(true, |step| step.state == StepState::Fresh)
    }

    pub fn advance(&mut self) {
        self.cursor += 1;
    }

    /// Replaces the current step with `steps`, which run next.
    pub fn splice_current(&mut self, steps: &[ActionId]) {
        let end = (self.cursor + 1).min(self.plan.len());
        self.plan
            .splice(self.cursor..end, steps.iter().copied().map(PlanStep::fresh));
    }

    fn drop_completed(&mut self) {
        self.plan.drain(..self.cursor.min(self.plan.len()));
        self.cursor = 0;
    }

    /// Inserts `steps` ahead of whatever the frame was doing.
    pub fn insert_ahead(&mut self, steps: &[ActionId]) {
        self.drop_completed();
        self.plan
            .splice(0..0, steps.iter().copied().map(PlanStep::fresh));
    }

    /// Discards the remaining plan and returns the steps that were dropped.
    pub fn replace_plan(&mut self, steps: &[ActionId]) -> Vec<PlanStep> {
        self.drop_completed();
        let dropped = std::mem::take(&mut self.plan);
        self.plan = steps.iter().copied().map(PlanStep::fresh).collect();
        dropped
    }
}

/// Ordered frames; the last frame is the active one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DialogStack {
    frames: Vec<DialogFrame>,
}

impl DialogStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[DialogFrame] {
        &self.frames
    }

    pub fn get(&self, index: usize) -> Option<&DialogFrame> {
        self.frames.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut DialogFrame> {
        self.frames.get_mut(index)
    }

    pub fn top(&self) -> Option<&DialogFrame> {
        self.frames.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut DialogFrame> {
        self.frames.last_mut()
    }

    pub fn push(&mut self, frame: DialogFrame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<DialogFrame> {
        self.frames.pop()
    }

    /// Removes and returns every frame above `index`, bottom first.
    pub fn detach_above(&mut self, index: usize) -> Vec<DialogFrame> {
        let start = (index + 1).min(self.frames.len());
        self.frames.split_off(start)
    }

    pub fn extend(&mut self, frames: Vec<DialogFrame>) {
        self.frames.extend(frames);
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Frame count including frames parked inside interrupted steps.
    pub fn total_depth(&self) -> usize {
        fn count(frames: &[DialogFrame]) -> usize {
            frames
                .iter()
                .map(|frame| {
                    1 + frame
                        .plan
                        .iter()
                        .map(|step| match &step.state {
                            StepState::Parked { frames } => count(frames),
                            _ => 0,
                        })
                        .sum::<usize>()
                })
                .sum()
        }
        count(&self.frames)
    }
}
