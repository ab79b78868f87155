use super::{ExpressionError, ExpressionResult};
use crate::memory::Value;

fn invalid(function: &str, message: impl Into<String>) -> ExpressionError {
    ExpressionError::InvalidArgument {
        function: function.to_string(),
        message: message.into(),
    }
}

fn expect_arity(function: &str, args: &[Value], min: usize, max: usize) -> ExpressionResult<()> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            format!("{}", min)
        } else {
            format!("{} to {}", min, max)
        };
        return Err(invalid(
            function,
            format!("expected {} arguments, got {}", expected, args.len()),
        ));
    }
    Ok(())
}

fn text_of(value: &Value) -> String {
    value.to_string()
}

/// Dispatches a builtin function. Names are case sensitive.
pub(crate) fn call_builtin(function: &str, args: Vec<Value>) -> ExpressionResult<Value> {
    match function {
        "join" => {
            expect_arity(function, &args, 1, 2)?;
            let separator = args.get(1).map(text_of).unwrap_or_else(|| ", ".to_string());
            match &args[0] {
                Value::List(items) => Ok(Value::String(
                    items.iter().map(text_of).collect::<Vec<_>>().join(&separator),
                )),
                Value::Null => Ok(Value::String(String::new())),
                other => Err(invalid(
                    function,
                    format!("expected a list, got {}", other.type_name()),
                )),
            }
        }
        "count" | "length" => {
            expect_arity(function, &args, 1, 1)?;
            let len = match &args[0] {
                Value::Null => 0,
                Value::String(s) => s.chars().count(),
                Value::List(items) => items.len(),
                Value::Map(map) => map.len(),
                other => {
                    return Err(invalid(
                        function,
                        format!("cannot count a {}", other.type_name()),
                    ))
                }
            };
            Ok(Value::Integer(len as i64))
        }
        "concat" => {
            if !args.is_empty() && args.iter().all(|a| matches!(a, Value::List(_))) {
                let mut items = Vec::new();
                for arg in args {
                    if let Value::List(list) = arg {
                        items.extend(list);
                    }
                }
                return Ok(Value::List(items));
            }
            Ok(Value::String(args.iter().map(text_of).collect()))
        }
        "contains" => {
            expect_arity(function, &args, 2, 2)?;
            let found = match (&args[0], &args[1]) {
                (Value::List(items), needle) => items.iter().any(|item| item.loose_eq(needle)),
                (Value::String(haystack), needle) => haystack.contains(&text_of(needle)),
                (Value::Map(map), key) => map.contains_key(&text_of(key)),
                (Value::Null, _) => false,
                (other, _) => {
                    return Err(invalid(
                        function,
                        format!("cannot search a {}", other.type_name()),
                    ))
                }
            };
            Ok(Value::Boolean(found))
        }
        "exists" => {
            expect_arity(function, &args, 1, 1)?;
            Ok(Value::Boolean(!args[0].is_null()))
        }
        "empty" => {
            expect_arity(function, &args, 1, 1)?;
            let empty = match &args[0] {
                Value::Null => true,
                Value::String(s) => s.is_empty(),
                Value::List(items) => items.is_empty(),
                Value::Map(map) => map.is_empty(),
                _ => false,
            };
            Ok(Value::Boolean(empty))
        }
        "not" => {
            expect_arity(function, &args, 1, 1)?;
            Ok(Value::Boolean(!args[0].is_truthy()))
        }
        "if" => {
            expect_arity(function, &args, 3, 3)?;
            let mut args = args.into_iter();
            let condition = args.next().unwrap_or_default();
            let when_true = args.next().unwrap_or_default();
            let when_false = args.next().unwrap_or_default();
            Ok(if condition.is_truthy() {
                when_true
            } else {
                when_false
            })
        }
        "coalesce" => Ok(args.into_iter().find(|a| !a.is_null()).unwrap_or_default()),
        "toUpper" => {
            expect_arity(function, &args, 1, 1)?;
            Ok(Value::String(text_of(&args[0]).to_uppercase()))
        }
        "toLower" => {
            expect_arity(function, &args, 1, 1)?;
            Ok(Value::String(text_of(&args[0]).to_lowercase()))
        }
        "trim" => {
            expect_arity(function, &args, 1, 1)?;
            Ok(Value::String(text_of(&args[0]).trim().to_string()))
        }
        "string" => {
            expect_arity(function, &args, 1, 1)?;
            Ok(Value::String(text_of(&args[0])))
        }
        "int" => {
            expect_arity(function, &args, 1, 1)?;
            match &args[0] {
                Value::Integer(i) => Ok(Value::Integer(*i)),
                Value::Float(f) => Ok(Value::Integer(f.trunc() as i64)),
                Value::Boolean(b) => Ok(Value::Integer(i64::from(*b))),
                Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::Integer)
                    .map_err(|_| invalid(function, format!("cannot convert '{}' to int", s))),
                other => Err(invalid(
                    function,
                    format!("cannot convert {} to int", other.type_name()),
                )),
            }
        }
        "float" => {
            expect_arity(function, &args, 1, 1)?;
            match &args[0] {
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(Value::Float)
                    .map_err(|_| invalid(function, format!("cannot convert '{}' to float", s))),
                other => other.as_f64().map(Value::Float).ok_or_else(|| {
                    invalid(
                        function,
                        format!("cannot convert {} to float", other.type_name()),
                    )
                }),
            }
        }
        "first" | "last" => {
            expect_arity(function, &args, 1, 1)?;
            match &args[0] {
                Value::List(items) => {
                    let item = if function == "first" {
                        items.first()
                    } else {
                        items.last()
                    };
                    Ok(item.cloned().unwrap_or_default())
                }
                Value::Null => Ok(Value::Null),
                other => Err(invalid(
                    function,
                    format!("expected a list, got {}", other.type_name()),
                )),
            }
        }
        _ => Err(ExpressionError::UnknownFunction(function.to_string())),
    }
}
