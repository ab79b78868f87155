use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1, multispace0},
    combinator::{all_consuming, cut, map, map_res, opt, recognize, value},
    error::{context, convert_error, ErrorKind, ParseError, VerboseError},
    multi::{fold_many0, many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated},
};

use super::ast::{BinaryOperator, Expression, UnaryOperator};
use super::{ExpressionError, ExpressionResult};
use crate::memory::{parse_identifier, parse_path_segment, ParserResult, PropertyPath, Value};

/// Parses a complete expression such as `user.name == 'Carlos' && count(user.todos) > 0`.
pub fn parse_expression(source: &str) -> ExpressionResult<Expression> {
    match all_consuming(ws(parse_or))(source) {
        Ok((_, expression)) => Ok(expression),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(ExpressionError::Syntax {
            source_text: source.to_string(),
            message: convert_error(source, e),
        }),
        Err(nom::Err::Incomplete(_)) => Err(ExpressionError::Syntax {
            source_text: source.to_string(),
            message: "incomplete input".to_string(),
        }),
    }
}

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> ParserResult<'a, O>
where
    F: FnMut(&'a str) -> ParserResult<'a, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn binary_level<'a>(
    input: &'a str,
    operand: fn(&'a str) -> ParserResult<'a, Expression>,
    operator: fn(&'a str) -> ParserResult<'a, BinaryOperator>,
) -> ParserResult<'a, Expression> {
    let (input, first) = operand(input)?;
    fold_many0(
        pair(ws(operator), operand),
        move || first.clone(),
        |left, (op, right)| Expression::binary(op, left, right),
    )(input)
}

/// Entry point used by templates for `{...}` segments.
#[tracing::instrument(level = "debug", skip(input))]
pub(crate) fn parse_or(input: &str) -> ParserResult<Expression> {
    context("or expression", |i| {
        binary_level(i, parse_and, |i| value(BinaryOperator::Or, tag("||"))(i))
    })(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_and(input: &str) -> ParserResult<Expression> {
    context("and expression", |i| {
        binary_level(i, parse_equality, |i| value(BinaryOperator::And, tag("&&"))(i))
    })(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_equality(input: &str) -> ParserResult<Expression> {
    context("equality", |i| {
        binary_level(i, parse_comparison, |i| {
            alt((
                value(BinaryOperator::Equal, tag("==")),
                value(BinaryOperator::NotEqual, tag("!=")),
            ))(i)
        })
    })(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_comparison(input: &str) -> ParserResult<Expression> {
    context("comparison", |i| {
        binary_level(i, parse_additive, |i| {
            alt((
                value(BinaryOperator::LessThanEqual, tag("<=")),
                value(BinaryOperator::GreaterThanEqual, tag(">=")),
                value(BinaryOperator::LessThan, char('<')),
                value(BinaryOperator::GreaterThan, char('>')),
            ))(i)
        })
    })(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_additive(input: &str) -> ParserResult<Expression> {
    context("additive", |i| {
        binary_level(i, parse_multiplicative, |i| {
            alt((
                value(BinaryOperator::Add, char('+')),
                value(BinaryOperator::Subtract, char('-')),
            ))(i)
        })
    })(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_multiplicative(input: &str) -> ParserResult<Expression> {
    context("multiplicative", |i| {
        binary_level(i, parse_unary, |i| {
            alt((
                value(BinaryOperator::Multiply, char('*')),
                value(BinaryOperator::Divide, char('/')),
                value(BinaryOperator::Modulo, char('%')),
            ))(i)
        })
    })(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_unary(input: &str) -> ParserResult<Expression> {
    context(
        "unary",
        preceded(
            multispace0,
            alt((
                map(preceded(char('!'), parse_unary), |operand| Expression::Unary {
                    op: UnaryOperator::Not,
                    operand: Box::new(operand),
                }),
                map(preceded(char('-'), parse_unary), |operand| match operand {
                    Expression::Literal(Value::Integer(i)) => Expression::literal(-i),
                    Expression::Literal(Value::Float(f)) => Expression::literal(-f),
                    operand => Expression::Unary {
                        op: UnaryOperator::Negate,
                        operand: Box::new(operand),
                    },
                }),
                parse_primary,
            )),
        ),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_primary(input: &str) -> ParserResult<Expression> {
    context(
        "primary",
        alt((
            parse_number,
            map(|i| parse_quoted(i, '\''), |s: String| Expression::literal(s)),
            map(|i| parse_quoted(i, '"'), |s: String| Expression::literal(s)),
            parse_list,
            delimited(char('('), ws(parse_or), cut(char(')'))),
            parse_reference,
        )),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_number(input: &str) -> ParserResult<Expression> {
    context(
        "number",
        map_res(
            recognize(pair(digit1, opt(pair(char('.'), digit1)))),
            |digits: &str| {
                if digits.contains('.') {
                    digits.parse::<f64>().map(Expression::literal).map_err(|_| ())
                } else {
                    digits.parse::<i64>().map(Expression::literal).map_err(|_| ())
                }
            },
        ),
    )(input)
}

/// Single or double quoted string with backslash escapes.
fn parse_quoted(input: &str, quote: char) -> ParserResult<String> {
    let (body, _) = char(quote)(input)?;
    let mut out = String::new();
    let mut chars = body.char_indices();
    while let Some((offset, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, escaped)) => out.push(escaped),
                None => break,
            },
            c if c == quote => return Ok((&body[offset + c.len_utf8()..], out)),
            c => out.push(c),
        }
    }
    Err(nom::Err::Failure(VerboseError::from_error_kind(
        input,
        ErrorKind::Char,
    )))
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_list(input: &str) -> ParserResult<Expression> {
    context(
        "list",
        map(
            delimited(
                char('['),
                separated_list0(char(','), ws(parse_or)),
                preceded(multispace0, cut(char(']'))),
            ),
            Expression::List,
        ),
    )(input)
}

/// Function call, keyword literal or property path.
#[tracing::instrument(level = "debug", skip(input))]
fn parse_reference(input: &str) -> ParserResult<Expression> {
    let (rest, name) = parse_identifier(input)?;

    let (after_paren, open) = opt(preceded(multispace0, char('(')))(rest)?;
    if open.is_some() {
        let (rest, arguments) = context(
            "function call",
            cut(terminated(
                separated_list0(char(','), ws(parse_or)),
                preceded(multispace0, char(')')),
            )),
        )(after_paren)?;
        return Ok((
            rest,
            Expression::Call {
                function: name.to_string(),
                arguments,
            },
        ));
    }

    let (rest, segments) = many0(parse_path_segment)(rest)?;
    if segments.is_empty() {
        match name {
            "true" => return Ok((rest, Expression::literal(true))),
            "false" => return Ok((rest, Expression::literal(false))),
            "null" => return Ok((rest, Expression::Literal(Value::Null))),
            _ => {}
        }
    }
    Ok((rest, Expression::Path(PropertyPath::from_parts(name, segments))))
}
