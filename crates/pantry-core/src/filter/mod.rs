//! Query language for read and bulk-update operations.
//!
//! A [`Filter`] combines a [`Where`] predicate with projection, ordering
//! and pagination. Both are parsed from JSON values, which the HTTP layer
//! builds from either a JSON-encoded query parameter or bracket notation
//! (see [`query_string`]).

pub mod query_string;
mod where_clause;

use std::cmp::Ordering;

use serde_json::Value;
use thiserror::Error;

use crate::schema::Document;

pub use where_clause::{Condition, Pattern, Where};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("`{param}` is not valid JSON: {reason}")]
    Json { param: String, reason: String },

    #[error("malformed query key: {0}")]
    MalformedKey(String),

    #[error("unknown operator `{operator}` on `{field}`")]
    UnknownOperator { field: String, operator: String },

    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("invalid regular expression `{pattern}`: {reason}")]
    Regex { pattern: String, reason: String },

    #[error("unknown filter key `{0}`")]
    UnknownKey(String),

    #[error("`where` is not allowed in this filter")]
    WhereNotAllowed,

    #[error("model has no relations to include")]
    NoRelations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    /// Parse `"field"`, `"field ASC"` or `"field DESC"`.
    pub fn parse(spec: &str) -> Result<Self, FilterError> {
        let mut parts = spec.split_whitespace();
        let invalid = || FilterError::InvalidValue {
            field: "order".to_string(),
            reason: format!("`{spec}` is not `<field> [ASC|DESC]`"),
        };
        let field = parts.next().ok_or_else(invalid)?.to_string();
        let direction = match parts.next() {
            None => Direction::Asc,
            Some(d) if d.eq_ignore_ascii_case("asc") => Direction::Asc,
            Some(d) if d.eq_ignore_ascii_case("desc") => Direction::Desc,
            Some(_) => return Err(invalid()),
        };
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self { field, direction })
    }
}

/// Field projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fields {
    /// Keep only these properties.
    Include(Vec<String>),
    /// Drop these properties, keep everything else.
    Exclude(Vec<String>),
}

impl Fields {
    fn from_value(value: &Value) -> Result<Self, FilterError> {
        let invalid = |reason: &str| FilterError::InvalidValue {
            field: "fields".to_string(),
            reason: reason.to_string(),
        };
        match value {
            Value::Array(names) => names
                .iter()
                .map(|n| n.as_str().map(str::to_string).ok_or_else(|| invalid("names must be strings")))
                .collect::<Result<Vec<_>, _>>()
                .map(Fields::Include),
            Value::Object(flags) => {
                let mut include = Vec::new();
                let mut exclude = Vec::new();
                for (name, flag) in flags {
                    if truthy(flag).ok_or_else(|| invalid("flags must be booleans"))? {
                        include.push(name.clone());
                    } else {
                        exclude.push(name.clone());
                    }
                }
                if include.is_empty() {
                    Ok(Fields::Exclude(exclude))
                } else {
                    Ok(Fields::Include(include))
                }
            }
            _ => Err(invalid("must be an object or an array")),
        }
    }

    pub fn project(&self, mut doc: Document) -> Document {
        match self {
            Fields::Include(names) => {
                doc.retain(|key, _| names.iter().any(|n| n == key));
                doc
            }
            Fields::Exclude(names) => {
                for name in names {
                    doc.remove(name);
                }
                doc
            }
        }
    }
}

/// Query-string values arrive as text, so `"true"`/`"1"` count as booleans.
fn truthy(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_u64().map(|n| n != 0),
        Value::String(s) => match s.as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn count(key: &str, value: &Value) -> Result<usize, FilterError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| FilterError::InvalidValue {
            field: key.to_string(),
            reason: "must be a non-negative integer".to_string(),
        })
}

/// Where-clause plus projection, ordering and pagination.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub where_clause: Option<Where>,
    pub fields: Option<Fields>,
    pub order: Vec<OrderBy>,
    pub limit: Option<usize>,
    pub skip: Option<usize>,
}

impl Filter {
    pub fn from_value(value: &Value) -> Result<Self, FilterError> {
        let obj = value.as_object().ok_or_else(|| FilterError::InvalidValue {
            field: "filter".to_string(),
            reason: "must be an object".to_string(),
        })?;

        let mut filter = Filter::default();
        for (key, v) in obj {
            match key.as_str() {
                "where" => filter.where_clause = Some(Where::from_value(v)?),
                "fields" => filter.fields = Some(Fields::from_value(v)?),
                "order" => {
                    filter.order = match v {
                        Value::String(spec) => vec![OrderBy::parse(spec)?],
                        Value::Array(specs) => specs
                            .iter()
                            .map(|s| {
                                s.as_str().ok_or_else(|| FilterError::InvalidValue {
                                    field: "order".to_string(),
                                    reason: "entries must be strings".to_string(),
                                })
                                .and_then(OrderBy::parse)
                            })
                            .collect::<Result<Vec<_>, _>>()?,
                        _ => {
                            return Err(FilterError::InvalidValue {
                                field: "order".to_string(),
                                reason: "must be a string or an array of strings".to_string(),
                            });
                        }
                    };
                }
                "limit" => filter.limit = Some(count(key, v)?),
                "skip" | "offset" => filter.skip = Some(count(key, v)?),
                "include" => {
                    let empty = match v {
                        Value::Null => true,
                        Value::Array(items) => items.is_empty(),
                        Value::Object(items) => items.is_empty(),
                        _ => false,
                    };
                    if !empty {
                        return Err(FilterError::NoRelations);
                    }
                }
                other => return Err(FilterError::UnknownKey(other.to_string())),
            }
        }
        Ok(filter)
    }

    /// Parse a filter that may not carry a `where` clause; the caller
    /// supplies the selection itself (a lookup by id).
    pub fn excluding_where(value: &Value) -> Result<Self, FilterError> {
        if value.get("where").is_some() {
            return Err(FilterError::WhereNotAllowed);
        }
        Self::from_value(value)
    }

    pub fn with_where(where_clause: Where) -> Self {
        Self {
            where_clause: Some(where_clause),
            ..Self::default()
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.where_clause.as_ref().is_none_or(|w| w.matches(doc))
    }

    /// Select, order, paginate and project `docs`. Without an explicit
    /// order, records come back by ascending `id_field`.
    pub fn apply(&self, docs: Vec<Document>, id_field: &str) -> Vec<Document> {
        let mut selected: Vec<Document> = docs.into_iter().filter(|d| self.matches(d)).collect();

        let default_order;
        let order = if self.order.is_empty() {
            default_order = [OrderBy {
                field: id_field.to_string(),
                direction: Direction::Asc,
            }];
            &default_order[..]
        } else {
            &self.order[..]
        };
        selected.sort_by(|a, b| compare_by(order, a, b));

        selected
            .into_iter()
            .skip(self.skip.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .map(|doc| match &self.fields {
                Some(fields) => fields.project(doc),
                None => doc,
            })
            .collect()
    }
}

fn compare_by(order: &[OrderBy], a: &Document, b: &Document) -> Ordering {
    for key in order {
        let left = where_clause::lookup(a, &key.field).filter(|v| !v.is_null());
        let right = where_clause::lookup(b, &key.field).filter(|v| !v.is_null());
        let ordering = match (left, right) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(l), Some(r)) => where_clause::compare(l, r).unwrap_or(Ordering::Equal),
        };
        let ordering = match key.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
