//! # The Model Trait
//!
//! A [`Model`] describes one remote resource type: its name, endpoint, primary
//! key, casts, guard lists, relations, accessors and mutators. Every entity
//! instance is a [`Record`] pointing at its model.
//!
//! Models are plain unit structs, so a `&'static dyn Model` is enough to refer
//! to one from a relation declaration:
//!
//! ```rust
//! use record_kernel::framework::{Model, RelationDef};
//!
//! struct Team;
//! struct Player;
//!
//! impl Model for Team {
//!     fn name(&self) -> &'static str { "Team" }
//! }
//!
//! impl Model for Player {
//!     fn name(&self) -> &'static str { "Player" }
//!     fn relations(&self) -> Vec<RelationDef> {
//!         vec![RelationDef::belongs_to("team", &Team)]
//!     }
//! }
//!
//! assert_eq!(Team.endpoint(), "teams");
//! assert!(Player.relation("team").is_some());
//! ```

use crate::framework::{Casts, KernelError, Record};
use heck::ToSnakeCase;
use serde_json::Value;
use std::fmt;

/// Reads a key on behalf of the store. Receives a copy of the raw value, if any.
pub type Accessor = fn(&Record, Option<Value>) -> Result<Value, KernelError>;

/// Writes a key on behalf of the store. Responsible for storing the value itself.
pub type Mutator = fn(&mut Record, Value) -> Result<(), KernelError>;

/// Method prefix relation names may carry.
pub const RELATION_PREFIX: char = '$';

/// The shape of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    BelongsTo,
    BelongsToMany,
    HasOne,
    HasMany,
    MorphOne,
    MorphMany,
    MorphTo,
}

impl RelationKind {
    /// Whether the relation resolves to a single record.
    pub fn is_singular(self) -> bool {
        matches!(
            self,
            RelationKind::BelongsTo
                | RelationKind::HasOne
                | RelationKind::MorphOne
                | RelationKind::MorphTo
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RelationKind::BelongsTo => "belongsTo",
            RelationKind::BelongsToMany => "belongsToMany",
            RelationKind::HasOne => "hasOne",
            RelationKind::HasMany => "hasMany",
            RelationKind::MorphOne => "morphOne",
            RelationKind::MorphMany => "morphMany",
            RelationKind::MorphTo => "morphTo",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declaration of one relation on a model.
///
/// `related` is `None` only for `morph_to`, which resolves against the owner's
/// own model.
#[derive(Clone, Copy)]
pub struct RelationDef {
    pub name: &'static str,
    pub kind: RelationKind,
    pub related: Option<&'static dyn Model>,
    /// Foreign key (or morph name for `morph_one`/`morph_many`) overriding the guessed one.
    pub key: Option<&'static str>,
}

impl RelationDef {
    fn new(name: &'static str, kind: RelationKind, related: Option<&'static dyn Model>) -> Self {
        Self {
            name,
            kind,
            related,
            key: None,
        }
    }

    pub fn belongs_to(name: &'static str, related: &'static dyn Model) -> Self {
        Self::new(name, RelationKind::BelongsTo, Some(related))
    }

    pub fn belongs_to_many(name: &'static str, related: &'static dyn Model) -> Self {
        Self::new(name, RelationKind::BelongsToMany, Some(related))
    }

    pub fn has_one(name: &'static str, related: &'static dyn Model) -> Self {
        Self::new(name, RelationKind::HasOne, Some(related))
    }

    pub fn has_many(name: &'static str, related: &'static dyn Model) -> Self {
        Self::new(name, RelationKind::HasMany, Some(related))
    }

    pub fn morph_one(name: &'static str, related: &'static dyn Model) -> Self {
        Self::new(name, RelationKind::MorphOne, Some(related))
    }

    pub fn morph_many(name: &'static str, related: &'static dyn Model) -> Self {
        Self::new(name, RelationKind::MorphMany, Some(related))
    }

    pub fn morph_to(name: &'static str) -> Self {
        Self::new(name, RelationKind::MorphTo, None)
    }

    pub fn key(mut self, key: &'static str) -> Self {
        self.key = Some(key);
        self
    }
}

impl fmt::Debug for RelationDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationDef")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("related", &self.related.map(|m| m.name()))
            .field("key", &self.key)
            .finish()
    }
}

/// Trait every remote resource type implements.
///
/// Only [`Model::name`] is required. The defaults give a model that talks to
/// `/<snake plural name>`, keys on `id`, has no casts, guards everything and
/// declares no relations.
pub trait Model: Send + Sync + 'static {
    /// Type name, e.g. `"User"`.
    fn name(&self) -> &'static str;

    /// Remote address of the resource collection.
    fn endpoint(&self) -> String {
        pluralize(&self.name().to_snake_case())
    }

    fn primary_key(&self) -> &'static str {
        "id"
    }

    fn casts(&self) -> Casts {
        Casts::new()
    }

    fn fillable(&self) -> &'static [&'static str] {
        &[]
    }

    fn guarded(&self) -> &'static [&'static str] {
        &["*"]
    }

    fn relations(&self) -> Vec<RelationDef> {
        Vec::new()
    }

    /// Look up an accessor by its conventional method name (see [`accessor_name`]).
    fn accessor(&self, _method: &str) -> Option<Accessor> {
        None
    }

    /// Look up a mutator by its conventional method name (see [`mutator_name`]).
    fn mutator(&self, _method: &str) -> Option<Mutator> {
        None
    }

    /// Plain (non-method) values the model exposes under a key.
    fn property(&self, _key: &str) -> Option<Value> {
        None
    }

    /// Keys that name methods. The accessor table never installs over or removes them.
    fn methods(&self) -> &'static [&'static str] {
        &[]
    }

    /// Find a relation declaration, accepting the `$` method prefix.
    fn relation(&self, name: &str) -> Option<RelationDef> {
        let name = strip_relation_prefix(name);
        self.relations().into_iter().find(|def| def.name == name)
    }
}

pub fn strip_relation_prefix(name: &str) -> &str {
    name.strip_prefix(RELATION_PREFIX).unwrap_or(name)
}

/// `full_name` → `get_full_name_attribute`.
pub fn accessor_name(key: &str) -> String {
    format!("get_{}_attribute", key.to_snake_case())
}

/// `full_name` → `set_full_name_attribute`.
pub fn mutator_name(key: &str) -> String {
    format!("set_{}_attribute", key.to_snake_case())
}

/// English plural good enough for resource endpoints.
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }
    let consonant_y = word.ends_with('y')
        && !word.ends_with("ay")
        && !word.ends_with("ey")
        && !word.ends_with("oy")
        && !word.ends_with("uy");
    if consonant_y {
        format!("{}ies", &word[..word.len() - 1])
    } else if ["s", "x", "z", "ch", "sh"].iter().any(|end| word.ends_with(end)) {
        format!("{word}es")
    } else {
        format!("{word}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare;

    impl Model for Bare {
        fn name(&self) -> &'static str {
            "ShiftCategory"
        }
    }

    struct Owner;

    impl Model for Owner {
        fn name(&self) -> &'static str {
            "Owner"
        }

        fn relations(&self) -> Vec<RelationDef> {
            vec![
                RelationDef::has_many("categories", &Bare),
                RelationDef::morph_to("ownable"),
            ]
        }
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Bare.endpoint(), "shift_categories");
        assert_eq!(Bare.primary_key(), "id");
        assert_eq!(Bare.guarded(), &["*"]);
        assert!(Bare.fillable().is_empty());
        assert!(Bare.casts().is_empty());
        assert!(Bare.relation("anything").is_none());
    }

    #[test]
    fn test_relation_lookup_strips_prefix() {
        let def = Owner.relation("$categories").unwrap();
        assert_eq!(def.kind, RelationKind::HasMany);
        assert_eq!(def.related.map(|m| m.name()), Some("ShiftCategory"));
        assert!(Owner.relation("ownable").unwrap().related.is_none());
    }

    #[test]
    fn test_kind_arity() {
        assert!(RelationKind::BelongsTo.is_singular());
        assert!(RelationKind::MorphTo.is_singular());
        assert!(!RelationKind::HasMany.is_singular());
        assert!(!RelationKind::BelongsToMany.is_singular());
        assert_eq!(RelationKind::MorphMany.to_string(), "morphMany");
    }

    #[test]
    fn test_naming_conventions() {
        assert_eq!(accessor_name("fullName"), "get_full_name_attribute");
        assert_eq!(mutator_name("full_name"), "set_full_name_attribute");
        assert_eq!(pluralize("team"), "teams");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("company"), "companies");
    }
}
