use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// A record in its JSON object form, as stored and as sent on the wire.
pub type Document = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    String,
    Number,
    /// Non-negative integer that fits in a `u64`.
    Integer,
    /// RFC 3339 timestamp carried as a JSON string.
    Date,
}

impl PropertyKind {
    fn accepts(self, value: &Value) -> bool {
        match self {
            PropertyKind::String => value.is_string(),
            PropertyKind::Number => value.is_number(),
            PropertyKind::Integer => value.is_u64(),
            PropertyKind::Date => value
                .as_str()
                .is_some_and(|s| s.parse::<jiff::Timestamp>().is_ok()),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            PropertyKind::String => "a string",
            PropertyKind::Number => "a number",
            PropertyKind::Integer => "a non-negative integer",
            PropertyKind::Date => "an RFC 3339 timestamp",
        }
    }
}

/// Value generator for properties left unset at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultFn {
    Now,
}

#[derive(Debug, Clone)]
pub struct Property {
    pub name: &'static str,
    pub kind: PropertyKind,
    pub required: bool,
    pub id: bool,
    pub generated: bool,
    pub default: Option<DefaultFn>,
}

impl Property {
    pub fn new(name: &'static str, kind: PropertyKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            id: false,
            generated: false,
            default: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark this property as the identity key, assigned by the datastore.
    pub fn generated_id(mut self) -> Self {
        self.id = true;
        self.generated = true;
        self
    }

    pub fn default_fn(mut self, default: DefaultFn) -> Self {
        self.default = Some(default);
        self
    }
}

/// Which rules [`ModelSchema::validate`] applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// New record: generated id must be absent, required properties present.
    Create,
    /// Full overwrite: required properties present.
    Replace,
    /// Patch: only the properties present are checked.
    Partial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationCode {
    Missing,
    Type,
    Immutable,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub path: String,
    pub code: ViolationCode,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("the `{model}` instance is not valid: {}", summarize(.details))]
pub struct ValidationError {
    pub model: String,
    pub details: Vec<FieldViolation>,
}

impl ValidationError {
    pub fn single(
        model: impl Into<String>,
        path: impl Into<String>,
        code: ViolationCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            details: vec![FieldViolation {
                path: path.into(),
                code,
                message: message.into(),
            }],
        }
    }
}

fn summarize(details: &[FieldViolation]) -> String {
    details
        .iter()
        .map(|d| format!("`{}` {}", d.path, d.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Declarative description of a model: its properties, which of them are
/// required, and how defaults are produced.
#[derive(Debug, Clone)]
pub struct ModelSchema {
    name: &'static str,
    collection: &'static str,
    strict: bool,
    properties: Vec<Property>,
}

impl ModelSchema {
    pub fn new(name: &'static str, collection: &'static str) -> Self {
        Self {
            name,
            collection,
            strict: true,
            properties: Vec::new(),
        }
    }

    pub fn property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    /// A non-strict model accepts and persists properties it does not declare.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn collection(&self) -> &'static str {
        self.collection
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn id_property(&self) -> Option<&Property> {
        self.properties.iter().find(|p| p.id)
    }

    /// Check `doc` against the declared properties, collecting every
    /// violation rather than stopping at the first.
    pub fn validate(&self, doc: &Document, mode: ValidationMode) -> Result<(), ValidationError> {
        let mut details = Vec::new();

        for property in &self.properties {
            let value = doc.get(property.name).filter(|v| !v.is_null());

            if property.generated && mode == ValidationMode::Create && value.is_some() {
                details.push(FieldViolation {
                    path: property.name.to_string(),
                    code: ViolationCode::Immutable,
                    message: "is generated by the datastore and cannot be set".to_string(),
                });
                continue;
            }

            match value {
                None if property.required && !property.id => {
                    // A patch may omit a required property but cannot null it out.
                    let nulled = doc.contains_key(property.name);
                    if mode != ValidationMode::Partial || nulled {
                        details.push(FieldViolation {
                            path: property.name.to_string(),
                            code: ViolationCode::Missing,
                            message: "is required".to_string(),
                        });
                    }
                }
                // Nulling the id or a defaulted property would leave a
                // record that no longer decodes as the model.
                None if mode == ValidationMode::Partial
                    && doc.contains_key(property.name)
                    && (property.id || property.default.is_some()) =>
                {
                    details.push(FieldViolation {
                        path: property.name.to_string(),
                        code: if property.id {
                            ViolationCode::Immutable
                        } else {
                            ViolationCode::Type
                        },
                        message: "cannot be null".to_string(),
                    });
                }
                Some(v) if !property.kind.accepts(v) => {
                    details.push(FieldViolation {
                        path: property.name.to_string(),
                        code: ViolationCode::Type,
                        message: format!("must be {}", property.kind.describe()),
                    });
                }
                _ => {}
            }
        }

        if self.strict {
            for key in doc.keys() {
                if self.get(key).is_none() {
                    details.push(FieldViolation {
                        path: key.clone(),
                        code: ViolationCode::Unknown,
                        message: "is not a property of this model".to_string(),
                    });
                }
            }
        }

        if details.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                model: self.name.to_string(),
                details,
            })
        }
    }

    /// Fill every absent (or null) property that declares a default.
    pub fn apply_defaults(&self, doc: &mut Document, now: jiff::Timestamp) {
        for property in &self.properties {
            let Some(default) = property.default else {
                continue;
            };
            let unset = doc.get(property.name).is_none_or(Value::is_null);
            if unset {
                let value = match default {
                    DefaultFn::Now => Value::String(now.to_string()),
                };
                doc.insert(property.name.to_string(), value);
            }
        }
    }
}
