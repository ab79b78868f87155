//! Turn processing: routing activities through the dialog stack and executing plans.

mod context;
mod executor;
mod manager;

pub use context::{ActiveFrame, TurnContext};
pub use executor::{ActionExecutor, ExecutionSignal};
pub use manager::{DialogManager, TurnOutcome};
