//! # Cast Pipeline
//!
//! Converts between the raw form an attribute is stored in and the form it is
//! read as. Casting runs on every write (`CastMode::Write`) and every read
//! (`CastMode::Read`) of a key that has a directive registered.
//!
//! Built-in directives:
//!
//! | Directive | Read | Write |
//! |-----------|------|-------|
//! | `boolean` | `"1"`/`"true"` → `true`, `"0"`/`"false"` → `false` | same |
//! | `number` | numeric coercion | same |
//! | `string` | string coercion | same |
//! | `collection` | wrap in [`Collection`] | unwrap a [`Collection`] back to an array |
//! | `datetime` | build a date-time with the configured constructor, `null` and unparseable values pass through | resolve the constructor, store raw |
//!
//! Anything else is supplied as a [`Cast::Custom`] caster.

use crate::framework::{Attributes, Collection, Config, Field, KernelError};
use indexmap::IndexMap;
use serde_json::{Number, Value};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Direction of a cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastMode {
    Read,
    Write,
}

/// A caller-supplied read/write transform pair.
pub trait AttributeCaster: Send + Sync {
    /// Transform the raw value into the form handed out on read.
    fn get(&self, key: &str, value: Value, attributes: &Attributes) -> Result<Value, KernelError>;

    /// Transform an incoming value into the form that gets stored.
    fn set(&self, key: &str, value: Value, attributes: &Attributes) -> Result<Value, KernelError>;
}

/// A cast directive.
#[derive(Clone)]
pub enum Cast {
    Boolean,
    Number,
    String,
    Collection,
    DateTime,
    Custom(Arc<dyn AttributeCaster>),
    /// A tag that parsed but has no handler. Dispatching it is an invariant violation.
    Unknown(String),
}

impl Cast {
    /// Parse a directive from its tag name.
    pub fn tag(name: &str) -> Self {
        match name {
            "boolean" => Cast::Boolean,
            "number" => Cast::Number,
            "string" => Cast::String,
            "collection" => Cast::Collection,
            "datetime" => Cast::DateTime,
            other => Cast::Unknown(other.to_string()),
        }
    }

    pub fn custom(caster: impl AttributeCaster + 'static) -> Self {
        Cast::Custom(Arc::new(caster))
    }

    pub fn name(&self) -> &str {
        match self {
            Cast::Boolean => "boolean",
            Cast::Number => "number",
            Cast::String => "string",
            Cast::Collection => "collection",
            Cast::DateTime => "datetime",
            Cast::Custom(_) => "custom",
            Cast::Unknown(tag) => tag,
        }
    }
}

impl fmt::Debug for Cast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cast({})", self.name())
    }
}

/// Directive table: at most one directive per key.
#[derive(Debug, Clone, Default)]
pub struct Casts {
    directives: IndexMap<String, Cast>,
}

impl Casts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(key, tag)` pairs.
    pub fn from_tags<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        pairs
            .into_iter()
            .map(|(key, tag)| (key.to_string(), Cast::tag(tag)))
            .collect()
    }

    pub fn with(mut self, key: impl Into<String>, cast: Cast) -> Self {
        self.directives.insert(key.into(), cast);
        self
    }

    pub fn has_cast(&self, key: &str) -> bool {
        self.directives.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Cast> {
        self.directives.get(key)
    }

    /// Shallow overlay: directives in `other` win on collision.
    pub fn merge(&mut self, other: Casts) {
        self.directives.extend(other.directives);
    }

    pub fn replace(&mut self, other: Casts) {
        self.directives = other.directives;
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.directives.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Run `value` through the directive registered for `key`.
    pub fn cast(
        &self,
        key: &str,
        value: Field,
        mode: CastMode,
        attributes: &Attributes,
        config: &Config,
    ) -> Result<Field, KernelError> {
        let Some(cast) = self.directives.get(key) else {
            return Ok(value);
        };

        match cast {
            Cast::Boolean => Ok(Field::Value(Value::Bool(to_boolean(key, value.into_raw()?)?))),
            Cast::Number => Ok(Field::Value(Value::Number(to_number(key, value.into_raw()?)?))),
            Cast::String => Ok(Field::Value(Value::String(to_string(value.into_raw()?)))),
            Cast::Collection => match (mode, value) {
                (CastMode::Read, Field::Collection(items)) => Ok(Field::Collection(items)),
                (CastMode::Read, other) => Ok(Field::Collection(match other.into_raw()? {
                    Value::Array(items) => items.into(),
                    Value::Null => Collection::new(),
                    single => vec![single].into(),
                })),
                (CastMode::Write, Field::Collection(items)) => {
                    Ok(Field::Value(Value::Array(items.into_vec())))
                }
                (CastMode::Write, other) => Ok(other),
            },
            Cast::DateTime => {
                let construct = config.datetime()?;
                match (mode, value) {
                    (_, Field::DateTime(dt)) => Ok(Field::DateTime(dt)),
                    (CastMode::Read, other) => match other.into_raw()? {
                        Value::Null => Ok(Field::Value(Value::Null)),
                        raw => match construct(&raw) {
                            Ok(dt) => Ok(Field::DateTime(dt)),
                            Err(reason) => {
                                debug!(key, %reason, "Date-time not constructed");
                                Ok(Field::Value(raw))
                            }
                        },
                    },
                    (CastMode::Write, other) => Ok(Field::Value(other.into_raw()?)),
                }
            }
            Cast::Custom(caster) => {
                let raw = value.into_raw()?;
                let out = match mode {
                    CastMode::Read => caster.get(key, raw, attributes)?,
                    CastMode::Write => caster.set(key, raw, attributes)?,
                };
                Ok(Field::Value(out))
            }
            Cast::Unknown(tag) => Err(KernelError::CastInvariant {
                key: key.to_string(),
                directive: tag.clone(),
            }),
        }
    }
}

impl FromIterator<(String, Cast)> for Casts {
    fn from_iter<I: IntoIterator<Item = (String, Cast)>>(iter: I) -> Self {
        Self {
            directives: iter.into_iter().collect(),
        }
    }
}

fn cast_failure(key: &str, target: &'static str, value: impl fmt::Display) -> KernelError {
    KernelError::CastFailure {
        key: key.to_string(),
        target,
        value: value.to_string(),
    }
}

fn to_boolean(key: &str, value: Value) -> Result<bool, KernelError> {
    let normalized = match &value {
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => normalize_number(n).to_string(),
        Value::String(s) => s.trim().to_lowercase(),
        _ => return Err(cast_failure(key, "boolean", &value)),
    };
    match normalized.as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(cast_failure(key, "boolean", value)),
    }
}

fn to_number(key: &str, value: Value) -> Result<Number, KernelError> {
    let parsed = match &value {
        Value::Number(n) => return Ok(normalize_number(n)),
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null => 0.0,
        Value::String(s) if s.trim().is_empty() => 0.0,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| cast_failure(key, "number", &value))?,
        _ => return Err(cast_failure(key, "number", &value)),
    };
    number_from_f64(parsed).ok_or_else(|| cast_failure(key, "number", value))
}

// Integral floats come back as integers so `"42"` reads as `42`.
fn number_from_f64(n: f64) -> Option<Number> {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Some(Number::from(n as i64))
    } else {
        Number::from_f64(n)
    }
}

fn normalize_number(n: &Number) -> Number {
    match n.as_f64() {
        Some(f) if !n.is_i64() && !n.is_u64() => number_from_f64(f).unwrap_or_else(|| n.clone()),
        _ => n.clone(),
    }
}

fn to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => to_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}
