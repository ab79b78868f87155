pub mod activity;
pub mod config;
pub mod dialog;
pub mod error;
pub mod expression;
pub mod memory;
pub mod recognizer;
pub mod render;
pub mod runtime;
pub mod storage;

// Re-exports
pub use activity::{Activity, ActivityType, ChannelAccount};
pub use config::EngineConfig;
pub use dialog::{
    Action, ArrayChange, Dialog, DialogGraph, InputSettings, PlanChange, PropertyKind, Trigger,
    TriggerCondition,
};
pub use error::{DialogError, DialogResult};
pub use memory::Value;
pub use runtime::DialogManager;
