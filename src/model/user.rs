use crate::framework::{Accessor, Casts, KernelError, Model, Mutator, Record, RelationDef};
use crate::model::{Comment, Shift, Team};
use serde_json::{json, Value};

/// A staff member.
///
/// # Model
/// - Belongs to a [`Team`] through `teamId`
/// - Has many [`Shift`]s
/// - Has many [`Comment`]s through the `commentable` morph
///
/// `displayName` is computed from `name` and `email`. Writes to `email` are
/// trimmed and lowercased.
#[derive(Debug, Clone, Copy)]
pub struct User;

impl Model for User {
    fn name(&self) -> &'static str {
        "User"
    }

    fn fillable(&self) -> &'static [&'static str] {
        &["name", "email", "teamId", "active", "tags", "joinedAt"]
    }

    fn guarded(&self) -> &'static [&'static str] {
        &["id", "role"]
    }

    fn casts(&self) -> Casts {
        Casts::from_tags([
            ("teamId", "number"),
            ("active", "boolean"),
            ("tags", "collection"),
            ("joinedAt", "datetime"),
        ])
    }

    fn relations(&self) -> Vec<RelationDef> {
        vec![
            RelationDef::belongs_to("team", &Team),
            RelationDef::has_many("shifts", &Shift),
            RelationDef::morph_many("comments", &Comment).key("commentable"),
        ]
    }

    fn accessor(&self, method: &str) -> Option<Accessor> {
        match method {
            "get_display_name_attribute" => Some(display_name),
            _ => None,
        }
    }

    fn mutator(&self, method: &str) -> Option<Mutator> {
        match method {
            "set_email_attribute" => Some(normalize_email),
            _ => None,
        }
    }

    fn methods(&self) -> &'static [&'static str] {
        &["save", "delete", "refresh"]
    }
}

fn display_name(user: &Record, _raw: Option<Value>) -> Result<Value, KernelError> {
    let name = user.get_raw_attributes().get("name").cloned().unwrap_or(Value::Null);
    let email = user.get_raw_attributes().get("email").cloned().unwrap_or(Value::Null);
    Ok(match (name.as_str(), email.as_str()) {
        (Some(name), Some(email)) => json!(format!("{name} <{email}>")),
        (Some(name), None) => json!(name),
        _ => Value::Null,
    })
}

fn normalize_email(user: &mut Record, value: Value) -> Result<(), KernelError> {
    let email = match value {
        Value::String(s) => Value::String(s.trim().to_lowercase()),
        other => other,
    };
    user.set_raw_attribute("email", email);
    Ok(())
}
