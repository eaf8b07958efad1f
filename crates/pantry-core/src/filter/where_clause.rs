use std::cmp::Ordering;

use regex::{Regex, RegexBuilder};
use serde_json::Value;

use super::FilterError;
use crate::schema::Document;

/// A predicate over record documents.
#[derive(Debug, Clone, PartialEq)]
pub enum Where {
    And(Vec<Where>),
    Or(Vec<Where>),
    Field { path: String, condition: Condition },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(Value),
    Neq(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    Inq(Vec<Value>),
    Nin(Vec<Value>),
    Between(Value, Value),
    Like(Pattern),
    NotLike(Pattern),
    Regexp(Pattern),
}

/// A compiled `like`/`regexp` pattern. Equality compares the source text.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.regex.as_str() == other.regex.as_str()
    }
}

impl Pattern {
    /// SQL `LIKE` pattern: `%` matches any run, `_` one character,
    /// a backslash escapes the next character.
    pub fn like(source: &str, case_insensitive: bool) -> Result<Self, FilterError> {
        let mut translated = String::from("^");
        let mut chars = source.chars();
        while let Some(c) = chars.next() {
            match c {
                '%' => translated.push_str("(?s:.*)"),
                '_' => translated.push_str("(?s:.)"),
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        translated.push_str(&regex::escape(escaped.encode_utf8(&mut [0; 4])));
                    }
                }
                other => translated.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
            }
        }
        translated.push('$');
        Self::compile(source, &translated, case_insensitive)
    }

    /// Regular expression, either bare or written as `/pattern/flags`.
    /// The only honored flag is `i`.
    pub fn regexp(source: &str) -> Result<Self, FilterError> {
        if let Some(rest) = source.strip_prefix('/')
            && let Some(end) = rest.rfind('/')
        {
            let (pattern, flags) = (&rest[..end], &rest[end + 1..]);
            return Self::compile(source, pattern, flags.contains('i'));
        }
        Self::compile(source, source, false)
    }

    fn compile(source: &str, pattern: &str, case_insensitive: bool) -> Result<Self, FilterError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|e| FilterError::Regex {
                pattern: source.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

const OPERATORS: &[&str] = &[
    "eq", "neq", "gt", "gte", "lt", "lte", "inq", "nin", "between", "like", "nlike", "ilike",
    "nilike", "regexp",
];

impl Where {
    pub fn from_value(value: &Value) -> Result<Self, FilterError> {
        let obj = value.as_object().ok_or_else(|| FilterError::InvalidValue {
            field: "where".to_string(),
            reason: "must be an object".to_string(),
        })?;

        let mut clauses = Vec::new();
        for (key, v) in obj {
            match key.as_str() {
                "and" | "or" => {
                    let items = v.as_array().ok_or_else(|| FilterError::InvalidValue {
                        field: key.clone(),
                        reason: "must be an array of conditions".to_string(),
                    })?;
                    let parsed = items
                        .iter()
                        .map(Where::from_value)
                        .collect::<Result<Vec<_>, _>>()?;
                    clauses.push(if key == "and" {
                        Where::And(parsed)
                    } else {
                        Where::Or(parsed)
                    });
                }
                path => parse_field(path, v, &mut clauses)?,
            }
        }

        if clauses.len() == 1 {
            Ok(clauses.remove(0))
        } else {
            Ok(Where::And(clauses))
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Where::And(items) => items.iter().all(|w| w.matches(doc)),
            Where::Or(items) => items.iter().any(|w| w.matches(doc)),
            Where::Field { path, condition } => condition.matches(lookup(doc, path)),
        }
    }
}

fn parse_field(path: &str, value: &Value, out: &mut Vec<Where>) -> Result<(), FilterError> {
    let Some(ops) = value.as_object() else {
        out.push(Where::Field {
            path: path.to_string(),
            condition: Condition::Eq(value.clone()),
        });
        return Ok(());
    };

    if ops.is_empty() {
        return Err(FilterError::InvalidValue {
            field: path.to_string(),
            reason: "empty condition".to_string(),
        });
    }

    for (op, operand) in ops {
        if !OPERATORS.contains(&op.as_str()) {
            return Err(FilterError::UnknownOperator {
                field: path.to_string(),
                operator: op.clone(),
            });
        }
        out.push(Where::Field {
            path: path.to_string(),
            condition: parse_condition(path, op, operand)?,
        });
    }
    Ok(())
}

fn parse_condition(path: &str, op: &str, operand: &Value) -> Result<Condition, FilterError> {
    let invalid = |reason: &str| FilterError::InvalidValue {
        field: format!("{path}.{op}"),
        reason: reason.to_string(),
    };
    let text = || operand.as_str().ok_or_else(|| invalid("must be a string"));
    let list = || {
        operand
            .as_array()
            .cloned()
            .ok_or_else(|| invalid("must be an array"))
    };

    let condition = match op {
        "eq" => Condition::Eq(operand.clone()),
        "neq" => Condition::Neq(operand.clone()),
        "gt" => Condition::Gt(operand.clone()),
        "gte" => Condition::Gte(operand.clone()),
        "lt" => Condition::Lt(operand.clone()),
        "lte" => Condition::Lte(operand.clone()),
        "inq" => Condition::Inq(list()?),
        "nin" => Condition::Nin(list()?),
        "between" => match list()?.as_slice() {
            [low, high] => Condition::Between(low.clone(), high.clone()),
            _ => return Err(invalid("must be an array of two bounds")),
        },
        "like" => Condition::Like(Pattern::like(text()?, false)?),
        "ilike" => Condition::Like(Pattern::like(text()?, true)?),
        "nlike" => Condition::NotLike(Pattern::like(text()?, false)?),
        "nilike" => Condition::NotLike(Pattern::like(text()?, true)?),
        "regexp" => Condition::Regexp(Pattern::regexp(text()?)?),
        other => {
            return Err(FilterError::UnknownOperator {
                field: path.to_string(),
                operator: other.to_string(),
            });
        }
    };
    Ok(condition)
}

impl Condition {
    pub fn matches(&self, value: Option<&Value>) -> bool {
        let value = value.filter(|v| !v.is_null());
        match self {
            Condition::Eq(expected) => equals(value, expected),
            Condition::Neq(expected) => !equals(value, expected),
            Condition::Gt(bound) => ordered(value, bound, |o| o == Ordering::Greater),
            Condition::Gte(bound) => ordered(value, bound, |o| o != Ordering::Less),
            Condition::Lt(bound) => ordered(value, bound, |o| o == Ordering::Less),
            Condition::Lte(bound) => ordered(value, bound, |o| o != Ordering::Greater),
            Condition::Inq(options) => options.iter().any(|o| equals(value, o)),
            Condition::Nin(options) => !options.iter().any(|o| equals(value, o)),
            Condition::Between(low, high) => {
                ordered(value, low, |o| o != Ordering::Less)
                    && ordered(value, high, |o| o != Ordering::Greater)
            }
            Condition::Like(pattern) | Condition::Regexp(pattern) => value
                .and_then(Value::as_str)
                .is_some_and(|s| pattern.is_match(s)),
            Condition::NotLike(pattern) => !value
                .and_then(Value::as_str)
                .is_some_and(|s| pattern.is_match(s)),
        }
    }
}

/// Resolve a dotted path (`nutrition.kcal`) inside a document.
pub(crate) fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = doc.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            _ => return None,
        };
    }
    Some(current)
}

fn equals(value: Option<&Value>, expected: &Value) -> bool {
    match (value, expected) {
        (None, Value::Null) => true,
        (None, _) | (Some(_), Value::Null) => false,
        (Some(v), e) => v == e || compare(v, e) == Some(Ordering::Equal),
    }
}

fn ordered(value: Option<&Value>, bound: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    value.and_then(|v| compare(v, bound)).is_some_and(accept)
}

/// Order two JSON values the way a query compares them: numbers
/// numerically (numeric strings are coerced), timestamps chronologically,
/// other strings lexicographically. `None` when the values are not comparable.
pub(crate) fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::Number(x), Value::String(y)) => x.as_f64()?.partial_cmp(&y.trim().parse().ok()?),
        (Value::String(x), Value::Number(y)) => x.trim().parse::<f64>().ok()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => {
            match (x.parse::<jiff::Timestamp>(), y.parse::<jiff::Timestamp>()) {
                (Ok(tx), Ok(ty)) => Some(tx.cmp(&ty)),
                _ => Some(x.cmp(y)),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::String(y)) => y.parse::<bool>().ok().map(|y| x.cmp(&y)),
        _ => None,
    }
}
