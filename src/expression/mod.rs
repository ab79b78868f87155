mod ast;
mod evaluator;
mod functions;
mod parser;
mod template;

pub use ast::{BinaryOperator, Expression, UnaryOperator};
pub use evaluator::ExpressionEvaluator;
pub use parser::parse_expression;
pub use template::{Template, TemplatePart};

use thiserror::Error;

use crate::memory::MemoryError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Syntax error in `{source_text}`: {message}")]
    Syntax {
        source_text: String,
        message: String,
    },
    #[error("Unknown function: {0}")]
    UnknownFunction(String),
    #[error("Invalid argument for {function}: {message}")]
    InvalidArgument { function: String, message: String },
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),
}

pub type ExpressionResult<T> = Result<T, ExpressionError>;
