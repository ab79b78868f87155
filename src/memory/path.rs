use core::fmt;
use std::str::FromStr;

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit1, multispace0},
    combinator::{all_consuming, map, map_res, recognize},
    error::{context, VerboseError},
    multi::many0,
    sequence::{delimited, pair, preceded},
    IResult,
};

use super::MemoryError;

pub(crate) type ParserResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

/// Named memory scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ScopeName {
    Dialog,
    Turn,
    User,
    Conversation,
}

impl ScopeName {
    /// Lookup order for paths that do not name a scope.
    pub const RESOLUTION_ORDER: [ScopeName; 4] = [
        ScopeName::Dialog,
        ScopeName::Turn,
        ScopeName::User,
        ScopeName::Conversation,
    ];

    /// Whether values in this scope survive the end of the turn.
    pub fn is_persistent(&self) -> bool {
        matches!(self, ScopeName::User | ScopeName::Conversation)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// A dotted property path such as `user.todos[0]`.
///
/// When the first segment names a scope it is lifted into `scope`; otherwise the path
/// is bare and resolves through [`ScopeName::RESOLUTION_ORDER`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    pub scope: Option<ScopeName>,
    pub segments: Vec<PathSegment>,
}

impl PropertyPath {
    pub fn parse(source: &str) -> Result<Self, MemoryError> {
        all_consuming(delimited(multispace0, parse_property_path, multispace0))(source)
            .map(|(_, path)| path)
            .map_err(|_| MemoryError::InvalidPath(source.to_string()))
    }

    pub fn from_parts(head: &str, rest: Vec<PathSegment>) -> Self {
        match ScopeName::from_str(head) {
            Ok(scope) => Self {
                scope: Some(scope),
                segments: rest,
            },
            Err(_) => {
                let mut segments = Vec::with_capacity(rest.len() + 1);
                segments.push(PathSegment::Key(head.to_string()));
                segments.extend(rest);
                Self {
                    scope: None,
                    segments,
                }
            }
        }
    }

    pub fn is_bare(&self) -> bool {
        self.scope.is_none()
    }

    /// Scope for writes. Bare paths are ambiguous and cannot be written.
    pub fn require_scope(&self) -> Result<ScopeName, MemoryError> {
        self.scope
            .ok_or_else(|| MemoryError::UnknownScope(self.to_string()))
    }
}

impl FromStr for PropertyPath {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        if let Some(scope) = self.scope {
            write!(f, "{}", scope)?;
            first = false;
        }
        for segment in &self.segments {
            match segment {
                PathSegment::Key(key) if first => write!(f, "{}", key)?,
                PathSegment::Key(key) => write!(f, ".{}", key)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
            first = false;
        }
        Ok(())
    }
}

#[tracing::instrument(level = "debug", skip(input))]
pub(crate) fn parse_identifier(input: &str) -> ParserResult<&str> {
    context(
        "identifier",
        recognize(pair(
            alt((alpha1, tag("_"), tag("$"))),
            many0(alt((alphanumeric1, tag("_")))),
        )),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
pub(crate) fn parse_path_segment(input: &str) -> ParserResult<PathSegment> {
    context(
        "path segment",
        alt((
            map(preceded(char('.'), parse_identifier), |key: &str| {
                PathSegment::Key(key.to_string())
            }),
            map(
                delimited(
                    pair(char('['), multispace0),
                    map_res(digit1, |digits: &str| digits.parse::<usize>()),
                    pair(multispace0, char(']')),
                ),
                PathSegment::Index,
            ),
        )),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_property_path(input: &str) -> ParserResult<PropertyPath> {
    context(
        "property path",
        map(
            pair(parse_identifier, many0(parse_path_segment)),
            |(head, rest)| PropertyPath::from_parts(head, rest),
        ),
    )(input)
}
