use thiserror::Error;

use crate::expression::ExpressionError;
use crate::memory::MemoryError;
use crate::recognizer::RecognizerError;
use crate::storage::StorageError;

/// Errors surfaced by turn processing.
///
/// Recoverable conditions (guard failures, recognizer outages, unparsable user input)
/// never reach this type; they are logged and handled where they occur.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DialogError {
    #[error("Expression error: {0}")]
    Expression(#[from] ExpressionError),
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),
    #[error("Recognizer error: {0}")]
    Recognizer(#[from] RecognizerError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Config error: {0}")]
    Config(String),

    // structural
    #[error("Unknown dialog reference: {0}")]
    UnknownDialogReference(String),
    #[error("Duplicate dialog id: {0}")]
    DuplicateDialog(String),
    #[error("Invalid dialog graph: {0}")]
    InvalidGraph(String),
    #[error("Template not found: {template_id} ({language})")]
    TemplateNotFound {
        language: String,
        template_id: String,
    },
    #[error("Step limit of {limit} exceeded in a single turn")]
    StepLimitExceeded { limit: usize },
    #[error("Dialog stack depth limit of {limit} exceeded")]
    StackDepthExceeded { limit: usize },

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type DialogResult<T> = Result<T, DialogError>;

impl DialogError {
    pub fn internal<S: Into<String>>(message: S) -> Self {
        DialogError::Internal(message.into())
    }

    pub fn invalid_graph<S: Into<String>>(message: S) -> Self {
        DialogError::InvalidGraph(message.into())
    }

    /// Structural errors mean the dialog graph or the persisted stack cannot be trusted.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            DialogError::UnknownDialogReference(_)
                | DialogError::DuplicateDialog(_)
                | DialogError::InvalidGraph(_)
                | DialogError::StepLimitExceeded { .. }
                | DialogError::StackDepthExceeded { .. }
                | DialogError::Internal(_)
        )
    }
}
