//! # Kernel Configuration
//!
//! A small key/value store read by the cast pipeline and the fill step.
//! Records receive it as an `Arc<Config>` at construction and pass it on to the
//! records they materialize for relations, so the kernel never reaches for
//! global state.
//!
//! | Key | Type | Default |
//! |-----|------|---------|
//! | `attribute-casing` | `"camel"` or `"snake"` | `"camel"` |
//! | `datetime` | name of a registered constructor | `"chrono"` |

use crate::framework::KernelError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use heck::{ToLowerCamelCase, ToSnakeCase};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Builds a date-time out of a raw attribute value.
pub type DateTimeConstructor = fn(&Value) -> Result<DateTime<Utc>, String>;

/// Casing convention applied to attribute keys by `fill`/`force_fill`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Casing {
    #[default]
    Camel,
    Snake,
}

impl Casing {
    /// Recase `key` to this convention.
    pub fn apply(self, key: &str) -> String {
        match self {
            Casing::Camel => key.to_lower_camel_case(),
            Casing::Snake => key.to_snake_case(),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    values: IndexMap<String, Value>,
    constructors: HashMap<String, DateTimeConstructor>,
}

impl Config {
    pub const CASING: &'static str = "attribute-casing";
    pub const DATETIME: &'static str = "datetime";
    pub const DEFAULT_DATETIME: &'static str = "chrono";

    pub fn new() -> Self {
        let mut constructors: HashMap<String, DateTimeConstructor> = HashMap::new();
        constructors.insert(Self::DEFAULT_DATETIME.to_string(), parse_datetime);
        Self {
            values: IndexMap::new(),
            constructors,
        }
    }

    /// Load settings from a JSON object. Non-object input is rejected.
    pub fn from_value(settings: Value) -> Result<Self, KernelError> {
        let Value::Object(map) = settings else {
            return Err(KernelError::Configuration(
                "settings must be a JSON object".to_string(),
            ));
        };
        let mut config = Self::new();
        for (key, value) in map {
            config.set(key, value);
        }
        Ok(config)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.values.get(key).cloned().unwrap_or(default)
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn unset(&mut self, key: &str) -> &mut Self {
        self.values.shift_remove(key);
        self
    }

    /// Make a date-time constructor selectable through the `datetime` key.
    pub fn register_datetime(
        &mut self,
        name: impl Into<String>,
        constructor: DateTimeConstructor,
    ) -> &mut Self {
        self.constructors.insert(name.into(), constructor);
        self
    }

    /// The attribute casing convention.
    pub fn casing(&self) -> Result<Casing, KernelError> {
        match self.values.get(Self::CASING) {
            None => Ok(Casing::default()),
            Some(Value::String(s)) if s == "camel" => Ok(Casing::Camel),
            Some(Value::String(s)) if s == "snake" => Ok(Casing::Snake),
            Some(other) => Err(KernelError::Configuration(format!(
                "'{}' must be \"camel\" or \"snake\", found {other}",
                Self::CASING
            ))),
        }
    }

    /// The date-time constructor used by the `datetime` cast.
    pub fn datetime(&self) -> Result<DateTimeConstructor, KernelError> {
        let name = match self.values.get(Self::DATETIME) {
            None => Self::DEFAULT_DATETIME,
            Some(Value::String(name)) => name.as_str(),
            Some(other) => {
                return Err(KernelError::Configuration(format!(
                    "'{}' is not a callable date-time constructor: {other}",
                    Self::DATETIME
                )))
            }
        };
        self.constructors.get(name).copied().ok_or_else(|| {
            KernelError::Configuration(format!(
                "'{name}' is not a registered date-time constructor"
            ))
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.constructors.keys().collect();
        names.sort();
        f.debug_struct("Config")
            .field("values", &self.values)
            .field("constructors", &names)
            .finish()
    }
}

/// Default constructor: RFC 3339 strings, plain dates, `YYYY-MM-DD HH:MM:SS`,
/// or a millisecond Unix timestamp.
pub fn parse_datetime(value: &Value) -> Result<DateTime<Utc>, String> {
    match value {
        Value::String(s) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Ok(dt.with_timezone(&Utc));
            }
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Ok(Utc.from_utc_datetime(&naive));
            }
            if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                    return Ok(Utc.from_utc_datetime(&naive));
                }
            }
            Err(format!("'{s}' is not a recognised date"))
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
            .ok_or_else(|| format!("{n} is not a valid millisecond timestamp")),
        other => Err(format!("{other} cannot be read as a date")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.casing().unwrap(), Casing::Camel);
        assert!(config.datetime().is_ok());
        assert_eq!(config.get_or("missing", json!(1)), json!(1));
    }

    #[test]
    fn test_casing_from_settings() {
        let config = Config::from_value(json!({ "attribute-casing": "snake" })).unwrap();
        assert_eq!(config.casing().unwrap(), Casing::Snake);
        assert_eq!(Casing::Snake.apply("teamId"), "team_id");
        assert_eq!(Casing::Camel.apply("team_id"), "teamId");

        let bad = Config::from_value(json!({ "attribute-casing": "kebab" })).unwrap();
        assert!(matches!(bad.casing(), Err(KernelError::Configuration(_))));
    }

    #[test]
    fn test_unresolvable_datetime_constructor() {
        let mut config = Config::new();
        config.set(Config::DATETIME, 42);
        assert!(matches!(config.datetime(), Err(KernelError::Configuration(_))));

        config.set(Config::DATETIME, "moment");
        assert!(matches!(config.datetime(), Err(KernelError::Configuration(_))));

        config.register_datetime("moment", |_| Ok(Utc.timestamp_millis_opt(0).unwrap()));
        assert!(config.datetime().is_ok());

        config.unset(Config::DATETIME);
        assert!(!config.has(Config::DATETIME));
    }

    #[test]
    fn test_parse_datetime_formats() {
        let rfc = parse_datetime(&json!("2024-03-01T10:00:00Z")).unwrap();
        let plain = parse_datetime(&json!("2024-03-01 10:00:00")).unwrap();
        assert_eq!(rfc, plain);
        assert!(parse_datetime(&json!("2024-03-01")).is_ok());
        assert_eq!(parse_datetime(&json!(0)).unwrap().timestamp(), 0);
        assert!(parse_datetime(&json!("yesterday")).is_err());
        assert!(parse_datetime(&json!(true)).is_err());
    }

    #[test]
    fn test_non_object_settings_rejected() {
        assert!(Config::from_value(json!([1, 2])).is_err());
    }
}
