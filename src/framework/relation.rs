//! # Relation Resolver
//!
//! Relations are declared on the model with [`RelationDef`] and resolved
//! lazily on the record. Each relation name moves through three states:
//!
//! ```text
//! undefined ──(declared)──► defined-unloaded ──(add_relation / load)──► loaded
//!                                  ▲                                       │
//!                                  └───────────(remove_relation)───────────┘
//! ```
//!
//! [`Record::relation`] builds the query-scoped related instance:
//!
//! | Kind | Scope |
//! |------|-------|
//! | `belongs_to` | endpoint extended with `/<foreign key value>` |
//! | `belongs_to_many` | related primary key = foreign key value |
//! | `has_one` / `has_many` | foreign key = owner key |
//! | `morph_one` / `morph_many` | `<name>_type` = owner type, `<name>_id` = owner key |
//! | `morph_to` | owner endpoint with every owner relation eager-loaded |
//!
//! ## Loading
//!
//! [`Record::load`] is three steps, usable on their own so the record is not
//! borrowed while a fetch is in flight:
//!
//! 1. [`Record::load_request`] validates names and builds the query (sync)
//! 2. [`LoadRequest::fetch`] runs it on a [`Transport`] (async)
//! 3. [`Record::install`] materializes the payload (sync)

use crate::clients::{Query, Transport};
use crate::framework::accessor::Slot;
use crate::framework::model::strip_relation_prefix;
use crate::framework::{Field, KernelError, Model, Record, Related, RelationDef, RelationKind};
use serde_json::Value;
use tracing::{debug, info, warn};

impl Record {
    /// Whether the model declares a relation called `name`.
    pub fn relation_defined(&self, name: &str) -> bool {
        self.model.relation(name).is_some()
    }

    fn relation_def(&self, name: &str) -> Result<RelationDef, KernelError> {
        self.model
            .relation(name)
            .ok_or_else(|| KernelError::undefined_relation(self.get_name(), name))
    }

    /// Names of every relation the model declares.
    pub fn relation_names(&self) -> Vec<&'static str> {
        self.model.relations().iter().map(|def| def.name).collect()
    }

    /// The related instance for `name`, tagged with its kind and scoped for fetching.
    pub fn relation(&self, name: &str) -> Result<Record, KernelError> {
        let def = self.relation_def(name)?;
        let related = def.related.unwrap_or(self.model);
        match def.kind {
            RelationKind::BelongsTo => self.belongs_to(related, def.key),
            RelationKind::BelongsToMany => self.belongs_to_many(related, def.key),
            RelationKind::HasOne => self.has_one(related, def.key),
            RelationKind::HasMany => self.has_many(related, def.key),
            RelationKind::MorphOne => self.morph_one(related, def.key),
            RelationKind::MorphMany => self.morph_many(related, def.key),
            RelationKind::MorphTo => Ok(self.morph_to()),
        }
    }

    fn related_instance(&self, model: &'static dyn Model, kind: RelationKind) -> Record {
        let mut instance = Record::new(model, self.config.clone());
        instance.tag_relation(kind);
        instance
    }

    fn foreign_key_value(&self, key: &str) -> Result<Value, KernelError> {
        let value = self
            .get_attribute(key)?
            .map(Field::into_raw)
            .transpose()?
            .filter(|value| !value.is_null());
        value.ok_or_else(|| KernelError::MissingForeignKey {
            model: self.get_name().to_string(),
            key: key.to_string(),
        })
    }

    pub fn belongs_to(
        &self,
        related: &'static dyn Model,
        foreign_key: Option<&str>,
    ) -> Result<Record, KernelError> {
        let mut instance = self.related_instance(related, RelationKind::BelongsTo);
        let key = match foreign_key {
            Some(key) => key.to_string(),
            None => instance.guess_foreign_key_name()?,
        };
        let value = self.foreign_key_value(&key)?;
        instance.query.append_endpoint(&path_segment(&value));
        Ok(instance)
    }

    pub fn belongs_to_many(
        &self,
        related: &'static dyn Model,
        foreign_key: Option<&str>,
    ) -> Result<Record, KernelError> {
        let mut instance = self.related_instance(related, RelationKind::BelongsToMany);
        let key = match foreign_key {
            Some(key) => key.to_string(),
            None => instance.guess_foreign_key_name()?,
        };
        let value = self.foreign_key_value(&key)?;
        let primary_key = instance.get_key_name();
        instance.query.where_equals(primary_key, value);
        Ok(instance)
    }

    pub fn has_one(
        &self,
        related: &'static dyn Model,
        foreign_key: Option<&str>,
    ) -> Result<Record, KernelError> {
        self.has_related(related, foreign_key, RelationKind::HasOne)
    }

    pub fn has_many(
        &self,
        related: &'static dyn Model,
        foreign_key: Option<&str>,
    ) -> Result<Record, KernelError> {
        self.has_related(related, foreign_key, RelationKind::HasMany)
    }

    fn has_related(
        &self,
        related: &'static dyn Model,
        foreign_key: Option<&str>,
        kind: RelationKind,
    ) -> Result<Record, KernelError> {
        let key = match foreign_key {
            Some(key) => key.to_string(),
            None => self.guess_foreign_key_name()?,
        };
        let mut instance = self.related_instance(related, kind);
        instance
            .query
            .where_equals(key, self.get_key().unwrap_or(Value::Null));
        Ok(instance)
    }

    pub fn morph_one(
        &self,
        related: &'static dyn Model,
        morph_name: Option<&str>,
    ) -> Result<Record, KernelError> {
        Ok(self.morph_related(related, morph_name, RelationKind::MorphOne))
    }

    pub fn morph_many(
        &self,
        related: &'static dyn Model,
        morph_name: Option<&str>,
    ) -> Result<Record, KernelError> {
        Ok(self.morph_related(related, morph_name, RelationKind::MorphMany))
    }

    fn morph_related(
        &self,
        related: &'static dyn Model,
        morph_name: Option<&str>,
        kind: RelationKind,
    ) -> Record {
        let name = morph_name
            .map(str::to_string)
            .unwrap_or_else(|| self.get_name().to_lowercase());
        let mut instance = self.related_instance(related, kind);
        instance
            .query
            .where_equals(format!("{name}_type"), self.get_name())
            .where_equals(format!("{name}_id"), self.get_key().unwrap_or(Value::Null));
        instance
    }

    /// The owner's own type with every declared relation eager-loaded.
    pub fn morph_to(&self) -> Record {
        let mut instance = self.related_instance(self.model, RelationKind::MorphTo);
        instance.query.with(self.relation_names());
        instance
    }

    // --- Loaded relations ---

    pub fn relation_loaded(&self, name: &str) -> bool {
        self.relations.contains_key(strip_relation_prefix(name))
    }

    pub fn loaded_relation_keys(&self) -> Vec<&str> {
        self.relations.keys().map(String::as_str).collect()
    }

    /// A copy of the loaded relation `name`.
    pub fn get_relation(&self, name: &str) -> Result<Related, KernelError> {
        let def = self.relation_def(name)?;
        self.relations
            .get(def.name)
            .cloned()
            .ok_or_else(|| KernelError::RelationNotLoaded {
                model: self.get_name().to_string(),
                relation: def.name.to_string(),
            })
    }

    /// Store `value` as relation `name`.
    ///
    /// Records and collections are taken as they are. Raw objects or arrays of
    /// objects are first turned into records of the related model. Singular
    /// kinds keep one record, plural kinds keep a collection.
    pub fn add_relation(
        &mut self,
        name: &str,
        value: impl Into<Field>,
    ) -> Result<&mut Self, KernelError> {
        let (name, related) = self.prepare_relation(name, value.into())?;
        self.store_relation(name, related);
        Ok(self)
    }

    // `None` means the value held no records.
    fn prepare_relation(
        &self,
        name: &str,
        value: Field,
    ) -> Result<(&'static str, Option<Related>), KernelError> {
        let def = self.relation_def(name)?;
        let model = def.related.unwrap_or(self.model);
        let related = match value {
            Field::Relation(related) => related,
            Field::Value(raw) => self.materialize(model, def.name, raw)?,
            Field::Collection(items) => {
                self.materialize(model, def.name, Value::Array(items.into_vec()))?
            }
            Field::DateTime(_) => {
                return Err(KernelError::unexpected_shape(
                    def.name,
                    "an object or an array of objects",
                ))
            }
        };
        Ok((def.name, normalize(def.kind, related)))
    }

    fn store_relation(&mut self, name: &'static str, related: Option<Related>) {
        match related {
            Some(related) => {
                debug!(
                    model = self.get_name(),
                    relation = name,
                    count = related.len(),
                    "Relation added"
                );
                self.relations.insert(name.to_string(), related);
                self.accessors.install(name, Slot::Relation);
            }
            None => {
                debug!(model = self.get_name(), relation = name, "Empty relation");
                self.remove_relation(name);
            }
        }
    }

    /// Unload relation `name`. Method slots are left alone.
    pub fn remove_relation(&mut self, name: &str) -> &mut Self {
        let name = strip_relation_prefix(name);
        self.relations.shift_remove(name);
        self.accessors.uninstall(name);
        self
    }

    // Shape is checked in full before any record is built.
    fn materialize(
        &self,
        model: &'static dyn Model,
        name: &str,
        raw: Value,
    ) -> Result<Related, KernelError> {
        if !is_relational(&raw) {
            return Err(KernelError::unexpected_shape(
                name,
                "an object or an array of objects",
            ));
        }
        match raw {
            Value::Array(items) => items
                .into_iter()
                .map(|item| Record::hydrate(model, self.config.clone(), item))
                .collect::<Result<Vec<_>, _>>()
                .map(Related::from),
            object => Record::hydrate(model, self.config.clone(), object).map(Related::from),
        }
    }

    // --- Loading ---

    /// Validate `names` and build the fetch for the ones not loaded yet.
    ///
    /// Returns `None` when there is nothing to load.
    pub fn load_request(
        &self,
        names: &[&str],
        force_reload: bool,
    ) -> Result<Option<LoadRequest>, KernelError> {
        let mut pending: Vec<String> = Vec::new();
        for name in names.iter().map(|name| strip_relation_prefix(name)) {
            if force_reload || !self.relation_loaded(name) {
                if !pending.iter().any(|p| p == name) {
                    pending.push(name.to_string());
                }
            }
        }
        if let Some(undefined) = pending.iter().find(|name| !self.relation_defined(name)) {
            return Err(KernelError::undefined_relation(self.get_name(), undefined));
        }

        if pending.is_empty() {
            return Ok(None);
        }
        if pending.len() == 1 {
            let query = self.relation(&pending[0])?.query;
            return Ok(Some(LoadRequest {
                query,
                names: pending,
                combined: false,
            }));
        }

        let mut query = Query::new(self.endpoint());
        if let Some(key) = self.get_key() {
            query.append_endpoint(&path_segment(&key));
        }
        query.with(pending.iter().cloned());
        Ok(Some(LoadRequest {
            query,
            names: pending,
            combined: true,
        }))
    }

    /// Store the relations a fetched [`LoadResponse`] carries.
    pub fn install(&mut self, response: LoadResponse) -> Result<&mut Self, KernelError> {
        let LoadResponse { names, combined, payload } = response;
        if !combined {
            for name in &names {
                self.add_relation(name, payload.clone())?;
            }
            return Ok(self);
        }

        let Value::Object(mut object) = payload else {
            return Err(KernelError::unexpected_shape(
                format!("{} eager load", self.get_name()),
                "an object",
            ));
        };
        let mut found = Vec::with_capacity(names.len());
        for name in &names {
            match object.remove(name.as_str()) {
                Some(value) => found.push((name, value)),
                None => warn!(
                    model = self.get_name(),
                    relation = name.as_str(),
                    "Relation missing from response"
                ),
            }
        }
        if let Some((name, _)) = found.iter().find(|(_, value)| !is_relational(value)) {
            return Err(KernelError::unexpected_shape(
                name.as_str(),
                "an object or an array of objects",
            ));
        }

        let prepared = found
            .into_iter()
            .map(|(name, value)| self.prepare_relation(name, Field::Value(value)))
            .collect::<Result<Vec<_>, _>>()?;
        for (name, related) in prepared {
            self.store_relation(name, related);
        }
        Ok(self)
    }

    /// Fetch and install the relations in `names` not loaded yet.
    pub async fn load(
        &mut self,
        transport: &dyn Transport,
        names: &[&str],
        force_reload: bool,
    ) -> Result<&mut Self, KernelError> {
        let Some(request) = self.load_request(names, force_reload)? else {
            debug!(model = self.get_name(), "Nothing to load");
            return Ok(self);
        };
        info!(model = self.get_name(), relations = ?request.names, "Loading");
        let response = request.fetch(transport).await?;
        self.install(response)
    }
}

/// A validated, not yet executed relation fetch.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    query: Query,
    names: Vec<String>,
    combined: bool,
}

impl LoadRequest {
    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Whether several relations are fetched through one eager-load query.
    pub fn is_combined(&self) -> bool {
        self.combined
    }

    pub async fn fetch(self, transport: &dyn Transport) -> Result<LoadResponse, KernelError> {
        let payload = transport.execute(&self.query).await?;
        Ok(LoadResponse {
            names: self.names,
            combined: self.combined,
            payload,
        })
    }
}

/// Raw payload of a finished [`LoadRequest`].
#[derive(Debug, Clone)]
pub struct LoadResponse {
    names: Vec<String>,
    combined: bool,
    payload: Value,
}

impl LoadResponse {
    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

fn is_relational(value: &Value) -> bool {
    match value {
        Value::Object(_) => true,
        Value::Array(items) => items.iter().all(Value::is_object),
        _ => false,
    }
}

fn normalize(kind: RelationKind, related: Related) -> Option<Related> {
    match (kind.is_singular(), related) {
        (true, Related::One(record)) => Some(Related::One(record)),
        (true, Related::Many(records)) => records.into_iter().next().map(Related::from),
        (false, Related::One(record)) => Some(Related::from(vec![*record])),
        (false, Related::Many(records)) => Some(Related::Many(records)),
    }
}

fn path_segment(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
