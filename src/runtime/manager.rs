use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::context::TurnContext;
use super::executor::{ActionExecutor, ExecutionSignal};
use crate::activity::Activity;
use crate::config::EngineConfig;
use crate::dialog::{
    Action, CompiledDialog, CompiledTrigger, DialogFrame, DialogGraph, FrameState, PlanChange,
    SelectionPhase, StepState, TriggerSelector,
};
use crate::expression::ExpressionEvaluator;
use crate::memory::{PropertyPath, Value};
use crate::recognizer::{Recognizer, RecognizerResult};
use crate::render::{ExpressionTemplateRenderer, TemplateRenderer};
use crate::storage::{ScopeSnapshot, ScopeStorage, StorageKey};
use crate::{DialogError, DialogResult};

/// Result of running one turn against a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub snapshot: ScopeSnapshot,
    pub replies: Vec<Activity>,
}

/// Drives turns through a dialog graph and persists state between them.
pub struct DialogManager {
    graph: Arc<DialogGraph>,
    storage: Arc<dyn ScopeStorage>,
    config: EngineConfig,
    evaluator: ExpressionEvaluator,
    renderer: Arc<dyn TemplateRenderer>,
    selector: TriggerSelector,
    executor: ActionExecutor,
}

impl DialogManager {
    pub fn new(graph: DialogGraph, storage: Arc<dyn ScopeStorage>) -> Self {
        let config = EngineConfig::default();
        let evaluator = ExpressionEvaluator::new();
        let renderer: Arc<dyn TemplateRenderer> =
            Arc::new(ExpressionTemplateRenderer::new(evaluator.clone()));
        Self {
            graph: Arc::new(graph),
            storage,
            selector: TriggerSelector::new(evaluator.clone()),
            executor: ActionExecutor::new(evaluator.clone(), renderer.clone(), config.clone()),
            config,
            evaluator,
            renderer,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self.rebuild_executor();
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = renderer;
        self.rebuild_executor();
        self
    }

    fn rebuild_executor(&mut self) {
        self.executor = ActionExecutor::new(
            self.evaluator.clone(),
            self.renderer.clone(),
            self.config.clone(),
        );
    }

    pub fn graph(&self) -> &DialogGraph {
        &self.graph
    }

    pub fn evaluator(&self) -> &ExpressionEvaluator {
        &self.evaluator
    }

    /// Loads state for the activity's conversation and user, runs the turn and saves the
    /// result. Nothing is saved when the turn fails.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(conversation = %activity.conversation_id, user = %activity.from.id)
    )]
    pub async fn process_turn(&self, activity: Activity) -> DialogResult<Vec<Activity>> {
        let key = StorageKey::from(&activity);
        let snapshot = self.storage.load(&key).await?;
        let outcome = self.run_turn(snapshot, activity).await?;
        self.storage.save(&key, &outcome.snapshot).await?;
        Ok(outcome.replies)
    }

    /// Runs one turn against an explicit snapshot without touching storage.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(activity_type = %activity.activity_type, frames = snapshot.stack.len())
    )]
    pub async fn run_turn(
        &self,
        snapshot: ScopeSnapshot,
        activity: Activity,
    ) -> DialogResult<TurnOutcome> {
        let mut ctx = TurnContext::new(activity, snapshot);

        if ctx.stack.is_empty() {
            let root = self.graph.root_id().to_string();
            info!("starting root dialog {}", root);
            self.begin_dialog(&mut ctx, &root, BTreeMap::new()).await?;
        } else {
            self.route_activity(&mut ctx).await?;
        }
        self.continue_dialogs(&mut ctx).await?;

        debug!(
            "turn finished after {} steps with {} frames on the stack",
            ctx.steps(),
            ctx.stack.len()
        );
        let (snapshot, replies) = ctx.finish();
        Ok(TurnOutcome { snapshot, replies })
    }

    async fn recognize(&self, ctx: &mut TurnContext, dialog: &CompiledDialog) -> RecognizerResult {
        if let Some(cached) = ctx.recognition(&dialog.id) {
            return cached.clone();
        }
        let result = match &dialog.recognizer {
            Some(recognizer) if ctx.activity.is_message() => {
                match recognizer.recognize(&ctx.activity).await {
                    Ok(result) => result,
                    Err(e) => {
                        warn!("recognizer of dialog {} failed: {}", dialog.id, e);
                        RecognizerResult::unknown(ctx.activity.text())
                    }
                }
            }
            _ => RecognizerResult::unknown(ctx.activity.text()),
        };
        ctx.record_recognition(&dialog.id, result.clone());
        result
    }

    /// Pushes a new frame and seeds its plan from the dialog's triggers.
    async fn begin_dialog(
        &self,
        ctx: &mut TurnContext,
        dialog_id: &str,
        options: BTreeMap<String, Value>,
    ) -> DialogResult<()> {
        let dialog = self.graph.dialog(dialog_id)?;
        if ctx.stack.total_depth() >= self.config.max_stack_depth {
            return Err(DialogError::StackDepthExceeded {
                limit: self.config.max_stack_depth,
            });
        }
        if let Some(parent) = ctx.stack.top_mut() {
            parent.state = FrameState::Suspended;
        }
        ctx.stack.push(DialogFrame::new(dialog_id, Value::Map(options)));
        let index = ctx.stack.len() - 1;
        info!("began dialog {} at depth {}", dialog_id, index);

        let mut trigger = self.selector.select(
            dialog,
            SelectionPhase::BeginDialog,
            &ctx.activity,
            &RecognizerResult::default(),
            &ctx.view_at(index),
        );
        if trigger.is_none() && !ctx.input_consumed {
            let recognized = self.recognize(ctx, dialog).await;
            trigger = self.selector.select(
                dialog,
                SelectionPhase::Activity {
                    allow_catch_all: true,
                },
                &ctx.activity,
                &recognized,
                &ctx.view_at(index),
            );
            if trigger.is_some() {
                ctx.input_consumed = true;
            }
        }

        let frame = ctx
            .stack
            .top_mut()
            .ok_or_else(|| DialogError::internal("frame vanished after push"))?;
        if let Some(trigger) = trigger {
            frame.insert_ahead(&trigger.actions);
        }
        frame.state = FrameState::Running;
        Ok(())
    }

    /// Offers the activity to every frame from the root up; the first trigger that fires
    /// interrupts its frame. Otherwise the activity is left for the active frame.
    async fn route_activity(&self, ctx: &mut TurnContext) -> DialogResult<()> {
        for index in 0..ctx.stack.len() {
            let (dialog_id, idle) = match ctx.stack.get(index) {
                Some(frame) => (frame.dialog_id.clone(), frame.is_idle()),
                None => break,
            };
            let dialog = self.graph.dialog(&dialog_id)?;
            let is_top = index + 1 == ctx.stack.len();
            let recognized = self.recognize(ctx, dialog).await;
            let trigger = self.selector.select(
                dialog,
                SelectionPhase::Activity {
                    allow_catch_all: is_top && idle,
                },
                &ctx.activity,
                &recognized,
                &ctx.view_at(index),
            );
            if let Some(trigger) = trigger {
                info!(
                    "dialog {} handles {} with trigger #{}",
                    dialog_id, ctx.activity.activity_type, trigger.index
                );
                ctx.input_consumed = true;
                return self.interrupt(ctx, index, trigger);
            }
        }
        debug!("no trigger fired; resuming active dialog");
        Ok(())
    }

    fn interrupt(
        &self,
        ctx: &mut TurnContext,
        index: usize,
        trigger: &CompiledTrigger,
    ) -> DialogResult<()> {
        let parked = ctx.stack.detach_above(index);
        let frame = ctx
            .stack
            .top_mut()
            .ok_or_else(|| DialogError::internal("interrupted frame is missing"))?;
        match trigger.change {
            PlanChange::DoActions => {
                if !parked.is_empty() {
                    debug!("parking {} frames above {}", parked.len(), frame.dialog_id);
                    let step = frame.current_step_mut().ok_or_else(|| {
                        DialogError::internal("frames above a frame with nothing pending")
                    })?;
                    step.state = StepState::Parked { frames: parked };
                }
                frame.insert_ahead(&trigger.actions);
            }
            PlanChange::ReplacePlan => {
                let dropped = frame.replace_plan(&trigger.actions);
                info!(
                    "replaced plan of {}: cancelled {} frames and {} steps",
                    frame.dialog_id,
                    parked.len(),
                    dropped.len()
                );
            }
        }
        frame.state = FrameState::Running;
        Ok(())
    }

    /// Executes the active frame until the turn suspends or the stack empties.
    async fn continue_dialogs(&self, ctx: &mut TurnContext) -> DialogResult<()> {
        loop {
            let Some(frame) = ctx.stack.top() else {
                debug!("dialog stack is empty");
                return Ok(());
            };
            let dialog = self.graph.dialog(&frame.dialog_id)?;
            let Some(step) = frame.current_step() else {
                if dialog.auto_end_dialog {
                    self.end_active_dialog(ctx, None)?;
                    continue;
                }
                if let Some(frame) = ctx.stack.top_mut() {
                    frame.state = FrameState::Suspended;
                }
                return Ok(());
            };
            let action = step.action;
            match step.state {
                StepState::Parked { .. } => {
                    self.restore_parked(ctx)?;
                    continue;
                }
                StepState::AwaitingChild => {
                    return Err(DialogError::internal(format!(
                        "dialog {} waits on a child that is not on the stack",
                        dialog.id
                    )))
                }
                _ => {}
            }

            let node = self.graph.action(action)?;
            ctx.tick(self.config.max_steps_per_turn)?;
            let signal = self.executor.execute(node, ctx.active_frame()?).await?;
            debug!("{} -> {:?}", node.action.name(), signal);

            match signal {
                ExecutionSignal::Advance => self.with_top(ctx, |frame| frame.advance())?,
                ExecutionSignal::Splice(steps) => {
                    self.with_top(ctx, |frame| frame.splice_current(&steps))?
                }
                ExecutionSignal::Suspend => {
                    self.with_top(ctx, |frame| frame.state = FrameState::Suspended)?;
                    return Ok(());
                }
                ExecutionSignal::Push { dialog_id, options } => {
                    self.with_top(ctx, |frame| {
                        if let Some(step) = frame.current_step_mut() {
                            step.state = StepState::AwaitingChild;
                        }
                    })?;
                    self.begin_dialog(ctx, &dialog_id, options).await?;
                }
                ExecutionSignal::Pop(result) => self.end_active_dialog(ctx, result)?,
                ExecutionSignal::Replace { dialog_id, options } => {
                    self.graph.dialog(&dialog_id)?;
                    if let Some(replaced) = ctx.stack.pop() {
                        info!("dialog {} replaced by {}", replaced.dialog_id, dialog_id);
                    }
                    self.begin_dialog(ctx, &dialog_id, options).await?;
                }
                ExecutionSignal::CancelAll => {
                    info!("cancelling {} dialogs", ctx.stack.len());
                    ctx.stack.clear();
                    return Ok(());
                }
            }
        }
    }

    fn with_top<F: FnOnce(&mut DialogFrame)>(
        &self,
        ctx: &mut TurnContext,
        f: F,
    ) -> DialogResult<()> {
        let frame = ctx
            .stack
            .top_mut()
            .ok_or_else(|| DialogError::internal("dialog stack is empty"))?;
        f(frame);
        Ok(())
    }

    /// Pops the active frame and resumes its parent after the step that started it.
    fn end_active_dialog(&self, ctx: &mut TurnContext, result: Option<Value>) -> DialogResult<()> {
        let mut ended = ctx
            .stack
            .pop()
            .ok_or_else(|| DialogError::internal("no dialog to end"))?;
        ended.state = FrameState::Ending;
        info!("dialog {} ended", ended.dialog_id);

        let Some(parent) = ctx.stack.top_mut() else {
            return Ok(());
        };
        let parent_id = parent.dialog_id.clone();
        let step = parent
            .current_step_mut()
            .filter(|step| step.state == StepState::AwaitingChild)
            .ok_or_else(|| {
                DialogError::internal(format!(
                    "dialog {} is not waiting on {}",
                    parent_id, ended.dialog_id
                ))
            })?;
        step.state = StepState::Fresh;
        let action = step.action;

        if let (Action::BeginDialog {
            result_property: Some(property),
            ..
        }, Some(value)) = (&self.graph.action(action)?.action, result)
        {
            ctx.top_memory()?.set(&PropertyPath::parse(property)?, value)?;
        }
        self.with_top(ctx, |parent| {
            parent.advance();
            parent.state = FrameState::Running;
        })
    }

    fn restore_parked(&self, ctx: &mut TurnContext) -> DialogResult<()> {
        let frame = ctx
            .stack
            .top_mut()
            .ok_or_else(|| DialogError::internal("dialog stack is empty"))?;
        let step = frame
            .current_step_mut()
            .ok_or_else(|| DialogError::internal("no parked step"))?;
        let StepState::Parked { frames } =
            std::mem::replace(&mut step.state, StepState::AwaitingChild)
        else {
            return Err(DialogError::internal("current step is not parked"));
        };
        if frames.is_empty() {
            step.state = StepState::Fresh;
            frame.advance();
            return Ok(());
        }
        debug!("restoring {} frames above {}", frames.len(), frame.dialog_id);
        frame.state = FrameState::Suspended;
        ctx.stack.extend(frames);
        Ok(())
    }
}
