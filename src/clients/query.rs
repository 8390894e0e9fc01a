//! # Query Builder
//!
//! The minimal query surface relations need: an endpoint, equality
//! constraints and a list of relations to eager-load. A [`Query`] does not run
//! itself. A [`Transport`](crate::clients::Transport) executes it.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One `column = value` constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Where {
    pub column: String,
    pub operator: String,
    pub value: Value,
    pub boolean: String,
}

impl Where {
    pub fn equals(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            operator: "=".to_string(),
            value: value.into(),
            boolean: "and".to_string(),
        }
    }

    /// Whether `row` satisfies the constraint.
    pub fn matches(&self, row: &Value) -> bool {
        row.get(&self.column).is_some_and(|v| loosely_equal(v, &self.value))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    endpoint: String,
    wheres: Vec<Where>,
    with: Vec<String>,
}

impl Query {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) -> &mut Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Nest the endpoint one level: `teams` + `5` → `teams/5`.
    pub fn append_endpoint(&mut self, segment: &str) -> &mut Self {
        let segment = segment.trim_start_matches('/');
        if !self.endpoint.is_empty() && !self.endpoint.ends_with('/') {
            self.endpoint.push('/');
        }
        self.endpoint.push_str(segment);
        self
    }

    pub fn where_equals(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.wheres.push(Where::equals(column, value));
        self
    }

    /// Constrain `key_name` to `key`.
    pub fn where_key(&mut self, key_name: &str, key: impl Into<Value>) -> &mut Self {
        self.where_equals(key_name, key)
    }

    /// Eager-load `relations` along with the result.
    pub fn with<I>(&mut self, relations: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        for relation in relations {
            let relation = relation.into();
            if !self.with.contains(&relation) {
                self.with.push(relation);
            }
        }
        self
    }

    pub fn wheres(&self) -> &[Where] {
        &self.wheres
    }

    pub fn with_relations(&self) -> &[String] {
        &self.with
    }

    /// The wire form of the query.
    pub fn compile(&self) -> Value {
        json!({
            "endpoint": self.endpoint,
            "wheres": self.wheres,
            "with": self.with,
        })
    }
}

// Numbers compare by value and strings compare to numbers by their text, so
// `"5"` in a path matches `5` in a row.
fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => {
            s.parse::<f64>().ok() == n.as_f64()
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_endpoint() {
        let mut query = Query::new("teams");
        query.append_endpoint("5");
        assert_eq!(query.endpoint(), "teams/5");

        let mut trailing = Query::new("teams/");
        trailing.append_endpoint("/7");
        assert_eq!(trailing.endpoint(), "teams/7");
    }

    #[test]
    fn test_compile() {
        let mut query = Query::new("shifts");
        query.where_equals("userId", 1).with(["user", "user"]);
        assert_eq!(
            query.compile(),
            json!({
                "endpoint": "shifts",
                "wheres": [{ "column": "userId", "operator": "=", "value": 1, "boolean": "and" }],
                "with": ["user"],
            })
        );
    }

    #[test]
    fn test_where_matches_loosely() {
        let clause = Where::equals("id", "5");
        assert!(clause.matches(&json!({ "id": 5 })));
        assert!(!clause.matches(&json!({ "id": 6 })));
        assert!(!clause.matches(&json!({ "other": 5 })));
        assert!(Where::equals("kind", "a").matches(&json!({ "kind": "a" })));
    }
}
