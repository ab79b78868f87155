mod path;
mod scope;
mod value;

pub use path::{PathSegment, PropertyPath, ScopeName};
pub(crate) use path::{parse_identifier, parse_path_segment, ParserResult};
pub use scope::{ArrayChange, DialogMemory, MemoryRead, MemoryScopes, MemoryView, PropertyKind};
pub use value::Value;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MemoryError {
    #[error("Invalid array operation {operation} on {path}: {reason}")]
    InvalidArrayOperation {
        operation: ArrayChange,
        path: String,
        reason: String,
    },
    #[error("Invalid property path: {0}")]
    InvalidPath(String),
    #[error("Property path does not name a writable scope: {0}")]
    UnknownScope(String),
    #[error("Cannot descend into {found} at segment {segment}")]
    NotAContainer { segment: String, found: String },
}

pub type MemoryResult<T> = Result<T, MemoryError>;
