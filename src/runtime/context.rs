use std::collections::HashMap;

use tracing::debug;

use crate::activity::Activity;
use crate::dialog::{ActionId, DialogStack, StepState};
use crate::memory::{DialogMemory, MemoryScopes, MemoryView, Value};
use crate::recognizer::RecognizerResult;
use crate::render::RenderedMessage;
use crate::storage::ScopeSnapshot;
use crate::{DialogError, DialogResult};

/// Mutable state of one turn: loaded scopes, the working stack and collected replies.
#[derive(Debug)]
pub struct TurnContext {
    pub activity: Activity,
    pub scopes: MemoryScopes,
    pub stack: DialogStack,
    pub outbound: Vec<Activity>,
    /// Set once a trigger or an input has used this turn's activity.
    pub input_consumed: bool,
    recognitions: HashMap<String, RecognizerResult>,
    steps: usize,
}

/// Borrowed view of the active frame's current step.
pub struct ActiveFrame<'a> {
    pub action: ActionId,
    pub step: &'a mut StepState,
    pub memory: DialogMemory<'a>,
    pub activity: &'a Activity,
    pub input_consumed: &'a mut bool,
    pub outbound: &'a mut Vec<Activity>,
}

impl ActiveFrame<'_> {
    pub fn send(&mut self, message: RenderedMessage) {
        let activity = match message {
            RenderedMessage::Text(text) => self.activity.reply(text),
            RenderedMessage::Activity(activity) => self.activity.reply_with(activity),
        };
        debug!("outbound {}: {:?}", activity.activity_type, activity.text);
        self.outbound.push(activity);
    }

    /// Takes the turn's text if nothing else has used it.
    pub fn take_input(&mut self) -> Option<&str> {
        if *self.input_consumed || !self.activity.is_message() {
            return None;
        }
        *self.input_consumed = true;
        Some(self.activity.text())
    }
}

impl TurnContext {
    pub fn new(activity: Activity, snapshot: ScopeSnapshot) -> Self {
        let mut scopes = MemoryScopes::new(snapshot.user, snapshot.conversation);
        let mut turn = std::collections::BTreeMap::new();
        turn.insert("activity".to_string(), activity.to_value());
        scopes.turn = Value::Map(turn);
        Self {
            activity,
            scopes,
            stack: snapshot.stack,
            outbound: Vec::new(),
            input_consumed: false,
            recognitions: HashMap::new(),
            steps: 0,
        }
    }

    /// Counts one executed action against the per-turn limit.
    pub fn tick(&mut self, limit: usize) -> DialogResult<()> {
        self.steps += 1;
        if self.steps > limit {
            return Err(DialogError::StepLimitExceeded { limit });
        }
        Ok(())
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Memory as seen from the frame at `index`.
    pub fn view_at(&self, index: usize) -> MemoryView<'_> {
        self.scopes
            .view(self.stack.get(index).map(|frame| &frame.scope))
    }

    /// Memory of the top frame, for writes outside of action execution.
    pub fn top_memory(&mut self) -> DialogResult<DialogMemory<'_>> {
        let frame = self
            .stack
            .top_mut()
            .ok_or_else(|| DialogError::internal("dialog stack is empty"))?;
        Ok(DialogMemory::new(&mut self.scopes, &mut frame.scope))
    }

    pub fn active_frame(&mut self) -> DialogResult<ActiveFrame<'_>> {
        let TurnContext {
            activity,
            scopes,
            stack,
            outbound,
            input_consumed,
            ..
        } = self;
        let frame = stack
            .top_mut()
            .ok_or_else(|| DialogError::internal("dialog stack is empty"))?;
        let cursor = frame.cursor;
        let step = frame.plan.get_mut(cursor).ok_or_else(|| {
            DialogError::internal(format!(
                "dialog {} has no step at {}",
                frame.dialog_id, cursor
            ))
        })?;
        Ok(ActiveFrame {
            action: step.action,
            step: &mut step.state,
            memory: DialogMemory::new(scopes, &mut frame.scope),
            activity,
            input_consumed,
            outbound,
        })
    }

    pub fn recognition(&self, dialog_id: &str) -> Option<&RecognizerResult> {
        self.recognitions.get(dialog_id)
    }

    /// Caches a dialog's recognition for the turn and exposes it as `turn.recognized`.
    pub fn record_recognition(&mut self, dialog_id: &str, result: RecognizerResult) {
        if let Value::Map(turn) = &mut self.scopes.turn {
            turn.insert("recognized".to_string(), result.to_value());
        }
        self.recognitions.insert(dialog_id.to_string(), result);
    }

    pub fn finish(self) -> (ScopeSnapshot, Vec<Activity>) {
        (
            ScopeSnapshot {
                user: self.scopes.user,
                conversation: self.scopes.conversation,
                stack: self.stack,
            },
            self.outbound,
        )
    }
}
