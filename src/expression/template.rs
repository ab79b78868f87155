use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, multispace0},
    combinator::{all_consuming, cut, map, value},
    error::{context, convert_error},
    multi::many0,
    sequence::{delimited, preceded, terminated},
};

use super::ast::Expression;
use super::evaluator::ExpressionEvaluator;
use super::parser::parse_or;
use super::{ExpressionError, ExpressionResult};
use crate::memory::{MemoryRead, ParserResult};

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Text(String),
    Expression(Expression),
}

/// Text with `{expression}` interpolations. `{{` and `}}` produce literal braces.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    parts: Vec<TemplatePart>,
}

impl Template {
    pub fn parse(source: &str) -> ExpressionResult<Self> {
        match all_consuming(many0(parse_part))(source) {
            Ok((_, parts)) => Ok(Self {
                parts: merge_text(parts),
            }),
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(ExpressionError::Syntax {
                source_text: source.to_string(),
                message: convert_error(source, e),
            }),
            Err(nom::Err::Incomplete(_)) => Err(ExpressionError::Syntax {
                source_text: source.to_string(),
                message: "incomplete template".to_string(),
            }),
        }
    }

    pub fn parts(&self) -> &[TemplatePart] {
        &self.parts
    }

    pub fn is_static(&self) -> bool {
        self.parts
            .iter()
            .all(|part| matches!(part, TemplatePart::Text(_)))
    }

    /// Null values render as empty text and lists are joined with `", "`.
    pub fn render<M: MemoryRead + ?Sized>(
        &self,
        evaluator: &ExpressionEvaluator,
        memory: &M,
    ) -> ExpressionResult<String> {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                TemplatePart::Text(text) => out.push_str(text),
                TemplatePart::Expression(expression) => {
                    out.push_str(&evaluator.evaluate(expression, memory)?.to_string())
                }
            }
        }
        Ok(out)
    }
}

fn merge_text(parts: Vec<TemplatePart>) -> Vec<TemplatePart> {
    let mut merged: Vec<TemplatePart> = Vec::with_capacity(parts.len());
    for part in parts {
        match (merged.last_mut(), part) {
            (Some(TemplatePart::Text(previous)), TemplatePart::Text(text)) => {
                previous.push_str(&text)
            }
            (_, part) => merged.push(part),
        }
    }
    merged
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_part(input: &str) -> ParserResult<TemplatePart> {
    alt((
        map(value("{", tag("{{")), |s: &str| TemplatePart::Text(s.to_string())),
        map(value("}", tag("}}")), |s: &str| TemplatePart::Text(s.to_string())),
        parse_interpolation,
        map(take_while1(|c| c != '{' && c != '}'), |s: &str| {
            TemplatePart::Text(s.to_string())
        }),
        map(tag("}"), |s: &str| TemplatePart::Text(s.to_string())),
    ))(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_interpolation(input: &str) -> ParserResult<TemplatePart> {
    context(
        "template interpolation",
        map(
            preceded(
                char('{'),
                cut(terminated(
                    delimited(multispace0, parse_or, multispace0),
                    char('}'),
                )),
            ),
            TemplatePart::Expression,
        ),
    )(input)
}
