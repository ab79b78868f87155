//! Dialog definitions and their compiled, runtime-facing form.

mod action;
mod frame;
mod graph;
mod selector;
mod trigger;

pub use action::{Action, Capability, InputKind, InputSettings, SwitchCase};
pub use frame::{DialogFrame, DialogStack, FrameState, PlanStep, StepState};
pub use graph::{
    ActionId, ActionNode, CompiledDialog, CompiledTrigger, Dialog, DialogGraph, DialogRecognizer,
};
pub use selector::{SelectionPhase, TriggerSelector};
pub use trigger::{PlanChange, Trigger, TriggerCondition};

pub use crate::memory::{ArrayChange, PropertyKind};
