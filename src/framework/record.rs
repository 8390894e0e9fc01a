//! # Record: the Attribute Store
//!
//! A [`Record`] is one entity instance. It owns three maps:
//!
//! - **attributes**: current raw values, in insertion order
//! - **original**: the raw snapshot taken at the last sync point
//! - **relations**: loaded related records (see [`relation`](crate::framework::relation))
//!
//! Values go in through [`Record::set_attribute`] (cast on write) and come out
//! through [`Record::get_attribute`] (cast on read). Every value crossing the
//! boundary is a copy, so nothing handed out can alias the store.
//!
//! ## Dirty Tracking
//!
//! Changes are computed on demand by deep-comparing `attributes` against
//! `original`:
//!
//! | Query | Keys |
//! |-------|------|
//! | [`get_changes`](Record::get_changes) | in both, with different values |
//! | [`get_new_attributes`](Record::get_new_attributes) | only in attributes |
//! | [`get_deleted_attributes`](Record::get_deleted_attributes) | only in original |
//!
//! After [`sync_original`](Record::sync_original) all three are empty.

use crate::clients::Query;
use crate::framework::accessor::{AccessorTable, Slot};
use crate::framework::model::{accessor_name, mutator_name};
use crate::framework::{
    CastMode, Casts, Config, Field, GuardPolicy, KernelError, Model, Related, RelationKind,
};
use heck::ToSnakeCase;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Raw attribute map, in insertion order.
pub type Attributes = IndexMap<String, Value>;

#[derive(Clone)]
pub struct Record {
    pub(crate) model: &'static dyn Model,
    pub(crate) config: Arc<Config>,
    pub(crate) attributes: Attributes,
    pub(crate) original: Attributes,
    pub(crate) relations: IndexMap<String, Related>,
    pub(crate) casts: Casts,
    pub(crate) guard: GuardPolicy,
    pub(crate) accessors: AccessorTable,
    pub(crate) query: Query,
    pub(crate) relation_kind: Option<RelationKind>,
}

impl Record {
    /// An empty record of `model`.
    pub fn new(model: &'static dyn Model, config: Arc<Config>) -> Self {
        Self {
            model,
            config,
            attributes: Attributes::new(),
            original: Attributes::new(),
            relations: IndexMap::new(),
            casts: model.casts(),
            guard: GuardPolicy::new(model.fillable().iter().copied(), model.guarded().iter().copied()),
            accessors: AccessorTable::with_methods(model.methods()),
            query: Query::new(model.endpoint()),
            relation_kind: None,
        }
    }

    /// A record filled through the guard policy and synced.
    pub fn build(
        model: &'static dyn Model,
        config: Arc<Config>,
        data: Value,
    ) -> Result<Self, KernelError> {
        let mut record = Self::new(model, config);
        record.fill(data)?.sync_original();
        Ok(record)
    }

    /// A record force-filled from trusted (remote) data and synced.
    pub fn hydrate(
        model: &'static dyn Model,
        config: Arc<Config>,
        data: Value,
    ) -> Result<Self, KernelError> {
        let mut record = Self::new(model, config);
        record.force_fill(data)?.sync_original();
        Ok(record)
    }

    pub fn model(&self) -> &'static dyn Model {
        self.model
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Type name of the model, e.g. `"User"`.
    pub fn get_name(&self) -> &'static str {
        self.model.name()
    }

    pub fn get_key_name(&self) -> &'static str {
        self.model.primary_key()
    }

    /// Raw primary key value, if set and not null.
    pub fn get_key(&self) -> Option<Value> {
        self.attributes
            .get(self.get_key_name())
            .filter(|value| !value.is_null())
            .cloned()
    }

    pub fn endpoint(&self) -> &str {
        self.query.endpoint()
    }

    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) -> &mut Self {
        self.query.set_endpoint(endpoint);
        self
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut Query {
        &mut self.query
    }

    /// The kind of relation this instance was produced for, if any.
    pub fn relation_kind(&self) -> Option<RelationKind> {
        self.relation_kind
    }

    // Tags are write-once.
    pub(crate) fn tag_relation(&mut self, kind: RelationKind) {
        if self.relation_kind.is_none() {
            self.relation_kind = Some(kind);
        }
    }

    /// `<snake model name>_<primary key>` in the configured casing.
    pub fn guess_foreign_key_name(&self) -> Result<String, KernelError> {
        let raw = format!("{}_{}", self.get_name().to_snake_case(), self.get_key_name());
        Ok(self.config.casing()?.apply(&raw))
    }

    /// Same model and same non-null key.
    pub fn is(&self, other: &Record) -> bool {
        self.get_name() == other.get_name()
            && self.get_key().is_some()
            && self.get_key() == other.get_key()
    }

    pub fn is_not(&self, other: &Record) -> bool {
        !self.is(other)
    }

    /// A fresh, unsynced copy of the attributes without the primary key.
    pub fn replicate(&self) -> Record {
        let mut copy = Record::new(self.model, self.config.clone());
        copy.casts = self.casts.clone();
        copy.guard = self.guard.clone();
        copy.attributes = self
            .attributes
            .iter()
            .filter(|(key, _)| key.as_str() != self.get_key_name())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        for key in copy.attributes.keys() {
            copy.accessors.install(key, Slot::Attribute);
        }
        copy
    }

    // --- Casting ---

    pub fn casts(&self) -> &Casts {
        &self.casts
    }

    pub fn has_cast(&self, key: &str) -> bool {
        self.casts.has_cast(key)
    }

    pub fn merge_casts(&mut self, casts: Casts) -> &mut Self {
        self.casts.merge(casts);
        self
    }

    pub fn set_casts(&mut self, casts: Casts) -> &mut Self {
        self.casts.replace(casts);
        self
    }

    /// Run `value` through the cast registered for `key`, if any.
    pub fn cast_attribute(
        &self,
        key: &str,
        value: impl Into<Field>,
        mode: CastMode,
    ) -> Result<Field, KernelError> {
        self.casts
            .cast(key, value.into(), mode, &self.attributes, &self.config)
    }

    // --- Guarding ---

    pub fn guard(&self) -> &GuardPolicy {
        &self.guard
    }

    pub fn is_fillable(&self, key: &str) -> bool {
        self.guard.is_fillable(key)
    }

    pub fn is_guarded(&self, key: &str) -> bool {
        self.guard.is_guarded(key)
    }

    pub fn get_fillable_from_object(&self, data: Map<String, Value>) -> Map<String, Value> {
        self.guard.fillable_from(data)
    }

    pub fn set_fillable<I>(&mut self, keys: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.guard.set_fillable(keys);
        self
    }

    pub fn merge_fillable<I>(&mut self, keys: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.guard.merge_fillable(keys);
        self
    }

    pub fn set_guarded<I>(&mut self, keys: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.guard.set_guarded(keys);
        self
    }

    pub fn merge_guarded<I>(&mut self, keys: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.guard.merge_guarded(keys);
        self
    }

    // --- Reading ---

    /// Resolve `key`: accessor, then cast attribute, then loaded relation,
    /// then a plain model property.
    pub fn get_attribute(&self, key: &str) -> Result<Option<Field>, KernelError> {
        if let Some(accessor) = self.model.accessor(&accessor_name(key)) {
            let value = accessor(self, self.attributes.get(key).cloned())?;
            return Ok(Some(Field::Value(value)));
        }
        if let Some(raw) = self.attributes.get(key) {
            return self
                .cast_attribute(key, raw.clone(), CastMode::Read)
                .map(Some);
        }
        if self.relation_loaded(key) {
            return self.get_relation(key).map(|related| Some(Field::Relation(related)));
        }
        Ok(self.model.property(key).map(Field::Value))
    }

    /// [`get_attribute`](Record::get_attribute) with a fallback.
    pub fn get_attribute_or(
        &self,
        key: &str,
        default: impl Into<Field>,
    ) -> Result<Field, KernelError> {
        Ok(self.get_attribute(key)?.unwrap_or_else(|| default.into()))
    }

    pub fn get_attributes(&self) -> Result<IndexMap<String, Field>, KernelError> {
        self.project(self.attributes.keys())
    }

    pub fn get_raw_attributes(&self) -> Attributes {
        self.attributes.clone()
    }

    pub fn get_attribute_keys(&self) -> Vec<&str> {
        self.attributes.keys().map(String::as_str).collect()
    }

    pub fn get_raw_original(&self) -> Attributes {
        self.original.clone()
    }

    pub fn get_raw_original_value(&self, key: &str) -> Option<Value> {
        self.original.get(key).cloned()
    }

    /// Original value of `key`, cast for reading.
    pub fn get_original(&self, key: &str) -> Result<Option<Field>, KernelError> {
        self.original
            .get(key)
            .map(|raw| self.cast_attribute(key, raw.clone(), CastMode::Read))
            .transpose()
    }

    /// Cast values for the listed keys that are present.
    pub fn only<'a>(
        &self,
        keys: impl IntoIterator<Item = &'a str>,
    ) -> Result<IndexMap<String, Field>, KernelError> {
        let wanted: Vec<&str> = keys.into_iter().collect();
        self.project(self.attributes.keys().filter(|k| wanted.contains(&k.as_str())))
    }

    /// Cast values for the present keys not listed.
    pub fn except<'a>(
        &self,
        keys: impl IntoIterator<Item = &'a str>,
    ) -> Result<IndexMap<String, Field>, KernelError> {
        let skipped: Vec<&str> = keys.into_iter().collect();
        self.project(self.attributes.keys().filter(|k| !skipped.contains(&k.as_str())))
    }

    fn project<'a>(
        &self,
        keys: impl Iterator<Item = &'a String>,
    ) -> Result<IndexMap<String, Field>, KernelError> {
        let mut out = IndexMap::new();
        for key in keys {
            if let Some(field) = self.get_attribute(key)? {
                out.insert(key.clone(), field);
            }
        }
        Ok(out)
    }

    /// Copies of every attribute, then every relation, paired with its key.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> + '_ {
        let attributes = self
            .attributes
            .iter()
            .map(|(key, value)| (Field::Value(value.clone()), key.as_str()));
        let relations = self
            .relations
            .iter()
            .map(|(key, related)| (Field::Relation(related.clone()), key.as_str()));
        attributes.chain(relations)
    }

    // --- Writing ---

    /// Write `key`: mutator, then cast, then relation, then plain copy.
    pub fn set_attribute(
        &mut self,
        key: &str,
        value: impl Into<Field>,
    ) -> Result<&mut Self, KernelError> {
        let value = value.into();

        if let Some(mutator) = self.model.mutator(&mutator_name(key)) {
            trace!(model = self.get_name(), key, "Mutator");
            mutator(self, value.into_raw()?)?;
            self.accessors.install(key, Slot::Attribute);
            return Ok(self);
        }

        let stored = if self.casts.has_cast(key) {
            self.cast_attribute(key, value, CastMode::Write)?.into_raw()?
        } else if value.looks_relational() && self.relation_defined(key) {
            return self.add_relation(key, value);
        } else {
            value.into_raw()?
        };

        trace!(model = self.get_name(), key, "Set");
        self.attributes.insert(key.to_string(), stored);
        self.accessors.install(key, Slot::Attribute);
        Ok(self)
    }

    /// Store `value` as-is. Meant for mutators, which own the write.
    pub fn set_raw_attribute(&mut self, key: &str, value: Value) -> &mut Self {
        self.attributes.insert(key.to_string(), value);
        self.accessors.install(key, Slot::Attribute);
        self
    }

    /// Write the keys of `data` that pass the guard policy.
    pub fn fill(&mut self, data: Value) -> Result<&mut Self, KernelError> {
        let data = into_object(data, "fill")?;
        let offered = data.len();
        let fillable = self.guard.fillable_from(data);
        if fillable.len() < offered {
            debug!(
                model = self.get_name(),
                dropped = offered - fillable.len(),
                "Guarded keys dropped"
            );
        }
        self.write_all(fillable)
    }

    /// Write every key of `data`, ignoring the guard policy.
    pub fn force_fill(&mut self, data: Value) -> Result<&mut Self, KernelError> {
        let data = into_object(data, "force_fill")?;
        self.write_all(data)
    }

    fn write_all(&mut self, data: Map<String, Value>) -> Result<&mut Self, KernelError> {
        let casing = self.config.casing()?;
        debug!(model = self.get_name(), keys = data.len(), "Fill");
        for (key, value) in data {
            self.set_attribute(&casing.apply(&key), value)?;
        }
        Ok(self)
    }

    /// Remove `key`. Relations are unloaded instead; `original` is untouched.
    pub fn delete_attribute(&mut self, key: &str) -> &mut Self {
        if self.relation_defined(key) {
            return self.remove_relation(key);
        }
        trace!(model = self.get_name(), key, "Delete");
        self.attributes.shift_remove(key);
        self.accessors.uninstall(key);
        self
    }

    // --- Sync points ---

    /// Snapshot the current attributes as the original.
    pub fn sync_original(&mut self) -> &mut Self {
        self.original = self.attributes.clone();
        self
    }

    /// Snapshot only `keys`: present keys are copied, absent keys are dropped
    /// from the original.
    pub fn sync_original_keys<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) -> &mut Self {
        for key in keys {
            match self.attributes.get(key) {
                Some(value) => {
                    self.original.insert(key.to_string(), value.clone());
                }
                None => {
                    self.original.shift_remove(key);
                }
            }
        }
        self
    }

    /// Discard every change since the last sync.
    pub fn reset(&mut self) -> &mut Self {
        let stale: Vec<String> = self
            .attributes
            .keys()
            .filter(|key| !self.original.contains_key(*key))
            .cloned()
            .collect();
        for key in &stale {
            self.accessors.uninstall(key);
        }
        self.attributes = self.original.clone();
        for key in self.original.keys() {
            self.accessors.install(key, Slot::Attribute);
        }
        self
    }

    // --- Dirty tracking ---

    /// Keys present in both snapshots whose values differ, with current values.
    pub fn get_changes(&self, key: Option<&str>) -> Attributes {
        self.attributes
            .iter()
            .filter(|(k, _)| in_scope(k, key))
            .filter(|(k, v)| matches!(self.original.get(*k), Some(orig) if orig != *v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Keys only in the original, with their original values.
    pub fn get_deleted_attributes(&self, key: Option<&str>) -> Attributes {
        self.original
            .iter()
            .filter(|(k, _)| in_scope(k, key) && !self.attributes.contains_key(*k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Keys only in the current attributes.
    pub fn get_new_attributes(&self, key: Option<&str>) -> Attributes {
        self.attributes
            .iter()
            .filter(|(k, _)| in_scope(k, key) && !self.original.contains_key(*k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn has_changes(&self, key: Option<&str>) -> bool {
        !self.get_changes(key).is_empty()
            || !self.get_deleted_attributes(key).is_empty()
            || !self.get_new_attributes(key).is_empty()
    }

    pub fn is_dirty(&self, key: Option<&str>) -> bool {
        self.has_changes(key)
    }

    pub fn is_clean(&self, key: Option<&str>) -> bool {
        !self.has_changes(key)
    }

    // --- Serialization ---

    /// Cast attributes plus every loaded relation, each through its own `to_json`.
    pub fn to_json(&self) -> Result<Value, KernelError> {
        let mut out = Map::new();
        for (key, field) in self.get_attributes()? {
            out.insert(key, field.into_raw()?);
        }
        for (key, related) in &self.relations {
            out.insert(key.clone(), Field::Relation(related.clone()).into_raw()?);
        }
        Ok(Value::Object(out))
    }
}

fn in_scope(key: &str, scope: Option<&str>) -> bool {
    scope.map_or(true, |wanted| wanted == key)
}

pub(crate) fn into_object(data: Value, context: &str) -> Result<Map<String, Value>, KernelError> {
    match data {
        Value::Object(map) => Ok(map),
        _ => Err(KernelError::unexpected_shape(context, "an object")),
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("model", &self.get_name())
            .field("endpoint", &self.endpoint())
            .field("attributes", &self.attributes)
            .field("relations", &self.relations.keys().collect::<Vec<_>>())
            .field("relation_kind", &self.relation_kind)
            .finish()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = self.to_json().map_err(|_| fmt::Error)?;
        write!(f, "{json}")
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json()
            .map_err(<S::Error as serde::ser::Error>::custom)?
            .serialize(serializer)
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (Field, &'a str);
    type IntoIter = Box<dyn Iterator<Item = (Field, &'a str)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::{Accessor, Cast, Mutator, RelationDef};
    use serde_json::json;

    struct Profile;

    impl Model for Profile {
        fn name(&self) -> &'static str {
            "Profile"
        }

        fn fillable(&self) -> &'static [&'static str] {
            &["*"]
        }

        fn casts(&self) -> Casts {
            Casts::from_tags([("age", "number"), ("active", "boolean"), ("tags", "collection")])
        }

        fn accessor(&self, method: &str) -> Option<Accessor> {
            match method {
                "get_shout_attribute" => Some(shout),
                _ => None,
            }
        }

        fn mutator(&self, method: &str) -> Option<Mutator> {
            match method {
                "set_slug_attribute" => Some(slugify),
                _ => None,
            }
        }

        fn property(&self, key: &str) -> Option<Value> {
            (key == "kind").then(|| json!("profile"))
        }

        fn relations(&self) -> Vec<RelationDef> {
            vec![RelationDef::has_many("notes", &Note)]
        }
    }

    fn shout(_: &Record, raw: Option<Value>) -> Result<Value, KernelError> {
        let text = raw.and_then(|v| v.as_str().map(str::to_uppercase));
        Ok(json!(text.unwrap_or_default()))
    }

    fn slugify(record: &mut Record, value: Value) -> Result<(), KernelError> {
        let slug = value.as_str().unwrap_or_default().trim().replace(' ', "-");
        record.set_raw_attribute("slug", json!(slug.to_lowercase()));
        Ok(())
    }

    struct Note;

    impl Model for Note {
        fn name(&self) -> &'static str {
            "Note"
        }
    }

    fn profile() -> Record {
        Record::new(&Profile, Arc::new(Config::new()))
    }

    #[test]
    fn test_round_trip_without_cast() {
        let mut record = profile();
        for value in [json!("x"), json!(1.5), json!({ "nested": [1, 2] }), json!(null), json!([1, 2])] {
            record.set_attribute("free", value.clone()).unwrap();
            assert_eq!(record.get_attribute("free").unwrap().unwrap(), value);
        }
    }

    #[test]
    fn test_number_cast_on_write() {
        let mut record = profile();
        record.set_attribute("age", "42").unwrap();
        assert_eq!(record.get_attribute("age").unwrap().unwrap(), json!(42));
        assert_eq!(record.get_raw_attributes()["age"], json!(42));
    }

    #[test]
    fn test_cast_failure_propagates() {
        let mut record = profile();
        let err = record.set_attribute("active", "maybe").unwrap_err();
        assert!(matches!(err, KernelError::CastFailure { .. }));
        assert!(record.get_attribute("active").unwrap().is_none());
    }

    #[test]
    fn test_accessor_bypasses_cast() {
        let mut record = profile();
        record.set_attribute("shout", "hey").unwrap();
        assert_eq!(record.get_attribute("shout").unwrap().unwrap(), json!("HEY"));
        assert_eq!(record.get_raw_attributes()["shout"], json!("hey"));
    }

    #[test]
    fn test_mutator_owns_the_write() {
        let mut record = profile();
        record.set_attribute("slug", " Hello World ").unwrap();
        assert_eq!(record.get_attribute("slug").unwrap().unwrap(), json!("hello-world"));
        assert!(record.has("slug"));
    }

    #[test]
    fn test_fallbacks() {
        let record = profile();
        assert_eq!(record.get_attribute("kind").unwrap().unwrap(), json!("profile"));
        assert!(record.get_attribute("missing").unwrap().is_none());
        assert_eq!(record.get_attribute_or("missing", "dflt").unwrap(), json!("dflt"));
    }

    #[test]
    fn test_reads_are_copies() {
        let mut record = profile();
        record.set_attribute("data", json!({ "list": [1] })).unwrap();
        let mut copy = record.get_attribute("data").unwrap().unwrap().into_value().unwrap();
        copy["list"] = json!([9]);
        assert_eq!(record.get_raw_attributes()["data"], json!({ "list": [1] }));
    }

    #[test]
    fn test_dirty_tracking() {
        let mut record = Record::hydrate(&Profile, Arc::new(Config::new()), json!({ "name": "a", "age": 3 })).unwrap();
        assert!(record.is_clean(None));

        record.set_attribute("name", "b").unwrap();
        record.set_attribute("city", "c").unwrap();
        record.delete_attribute("age");

        assert_eq!(record.get_changes(None).keys().collect::<Vec<_>>(), ["name"]);
        assert_eq!(record.get_new_attributes(None)["city"], json!("c"));
        assert_eq!(record.get_deleted_attributes(None)["age"], json!(3));
        assert!(record.is_dirty(Some("age")));
        assert!(record.has_changes(Some("city")));
        assert!(record.is_clean(Some("other")));

        record.sync_original();
        assert!(record.is_clean(None));
        let first = record.get_raw_original();
        record.sync_original();
        assert!(!record.has_changes(None));
        assert_eq!(record.get_raw_original(), first);
    }

    #[test]
    fn test_sync_selected_keys() {
        let mut record = Record::hydrate(&Profile, Arc::new(Config::new()), json!({ "a": 1, "b": 2, "c": 3 })).unwrap();
        record.set_attribute("a", 10).unwrap();
        record.set_attribute("b", 20).unwrap();
        record.delete_attribute("c");

        record.sync_original_keys(["a", "c"]);
        assert_eq!(record.get_raw_original_value("a"), Some(json!(10)));
        assert_eq!(record.get_raw_original_value("b"), Some(json!(2)));
        assert_eq!(record.get_raw_original_value("c"), None);
        assert_eq!(record.get_changes(None).keys().collect::<Vec<_>>(), ["b"]);
    }

    #[test]
    fn test_reset_restores_synced_state() {
        let mut record = profile();
        record.force_fill(json!({ "name": "n", "age": 1 })).unwrap();
        record.sync_original();
        let synced = record.get_raw_original();

        record.set_attribute("name", "other").unwrap();
        record.set_attribute("extra", true).unwrap();
        record.delete_attribute("age");
        record.reset();

        assert_eq!(record.get_raw_attributes(), synced);
        assert!(!record.has("extra"));
        assert!(record.has("age"));
    }

    #[test]
    fn test_only_and_except() {
        let mut record = profile();
        record.force_fill(json!({ "age": "5", "name": "x", "city": "y" })).unwrap();

        let only = record.only(["age", "ghost"]).unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only["age"], json!(5));

        let except = record.except(["age"]).unwrap();
        assert_eq!(except.keys().collect::<Vec<_>>(), ["name", "city"]);
    }

    #[test]
    fn test_iteration_order_and_independence() {
        let mut record = profile();
        record.force_fill(json!({ "b": 1, "a": { "x": 1 } })).unwrap();
        record.add_relation("notes", json!([{ "id": 1 }])).unwrap();

        let keys: Vec<&str> = record.iter().map(|(_, key)| key).collect();
        assert_eq!(keys, ["b", "a", "notes"]);

        for (field, _) in &record {
            if let Field::Value(mut value) = field {
                value["mutated"] = json!(true);
            }
        }
        assert_eq!(record.get_raw_attributes()["a"], json!({ "x": 1 }));
    }

    #[test]
    fn test_force_fill_recases_keys() {
        let mut record = profile();
        record.force_fill(json!({ "first_name": "a" })).unwrap();
        assert_eq!(record.get_attribute_keys(), ["firstName"]);

        let mut config = Config::new();
        config.set(Config::CASING, "snake");
        let mut snake = Record::new(&Profile, Arc::new(config));
        snake.force_fill(json!({ "firstName": "a" })).unwrap();
        assert_eq!(snake.get_attribute_keys(), ["first_name"]);
    }

    #[test]
    fn test_fill_rejects_non_object() {
        let mut record = profile();
        assert!(matches!(
            record.fill(json!([1])),
            Err(KernelError::UnexpectedRemoteShape { .. })
        ));
    }

    #[test]
    fn test_instance_casts_override_model() {
        let mut record = profile();
        record.merge_casts(Casts::new().with("age", Cast::String));
        record.set_attribute("age", 7).unwrap();
        assert_eq!(record.get_attribute("age").unwrap().unwrap(), json!("7"));

        record.set_casts(Casts::new());
        assert!(!record.has_cast("active"));
    }

    #[test]
    fn test_identity_and_replicate() {
        let config = Arc::new(Config::new());
        let a = Record::hydrate(&Profile, config.clone(), json!({ "id": 1, "name": "a" })).unwrap();
        let b = Record::hydrate(&Profile, config.clone(), json!({ "id": 1 })).unwrap();
        let c = Record::hydrate(&Note, config, json!({ "id": 1 })).unwrap();
        assert!(a.is(&b));
        assert!(a.is_not(&c));

        let copy = a.replicate();
        assert!(copy.get_key().is_none());
        assert_eq!(copy.get_attribute_keys(), ["name"]);
        assert!(copy.get_raw_original().is_empty());
        assert_eq!(a.guess_foreign_key_name().unwrap(), "profileId");
    }

    #[test]
    fn test_to_json_and_display() {
        let mut record = profile();
        record
            .force_fill(json!({ "age": "3", "tags": ["a"], "notes": [{ "id": 1, "body": "n" }] }))
            .unwrap();
        let json = record.to_json().unwrap();
        assert_eq!(json, json!({ "age": 3, "tags": ["a"], "notes": [{ "id": 1, "body": "n" }] }));
        assert_eq!(record.to_string(), json.to_string());
        assert_eq!(serde_json::to_value(&record).unwrap(), json);
    }
}
