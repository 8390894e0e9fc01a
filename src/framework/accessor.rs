//! # Accessor Table
//!
//! Every attribute and relation key is reachable through one uniform surface:
//! [`Record::get`], [`Record::set`], [`Record::has`] and [`Record::keys`].
//! Instead of defining properties at runtime, each record keeps an explicit
//! table of the keys it exposes and what backs them.
//!
//! Keys the model lists in [`Model::methods`](crate::framework::Model::methods)
//! are seeded as [`Slot::Method`]. Method slots are never overwritten by an
//! install and never dropped by an uninstall.

use crate::framework::{Field, KernelError, Record};
use indexmap::IndexMap;

/// What backs an exposed key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Attribute,
    Relation,
    Method,
}

#[derive(Debug, Clone, Default)]
pub struct AccessorTable {
    slots: IndexMap<String, Slot>,
}

impl AccessorTable {
    pub fn with_methods(methods: &[&str]) -> Self {
        Self {
            slots: methods
                .iter()
                .map(|name| (name.to_string(), Slot::Method))
                .collect(),
        }
    }

    /// Expose `key`. Returns `false` if a method already owns the key.
    pub fn install(&mut self, key: &str, slot: Slot) -> bool {
        match self.slots.get(key) {
            Some(Slot::Method) => false,
            _ => {
                self.slots.insert(key.to_string(), slot);
                true
            }
        }
    }

    /// Stop exposing `key`. Method slots stay.
    pub fn uninstall(&mut self, key: &str) -> bool {
        match self.slots.get(key) {
            Some(Slot::Method) | None => false,
            Some(_) => {
                self.slots.shift_remove(key);
                true
            }
        }
    }

    pub fn slot(&self, key: &str) -> Option<Slot> {
        self.slots.get(key).copied()
    }

    /// Exposed attribute and relation keys, in install order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slots
            .iter()
            .filter(|(_, slot)| **slot != Slot::Method)
            .map(|(key, _)| key.as_str())
    }
}

impl Record {
    /// Read any exposed key.
    pub fn get(&self, key: &str) -> Result<Option<Field>, KernelError> {
        match self.accessors.slot(key) {
            Some(Slot::Relation) => self.get_relation(key).map(|related| Some(related.into())),
            _ => self.get_attribute(key),
        }
    }

    /// Write any key. Relation slots take relation values, everything else
    /// goes through [`set_attribute`](Record::set_attribute).
    pub fn set(&mut self, key: &str, value: impl Into<Field>) -> Result<&mut Self, KernelError> {
        match self.accessors.slot(key) {
            Some(Slot::Relation) => self.add_relation(key, value),
            _ => self.set_attribute(key, value),
        }
    }

    /// Whether `key` is exposed as an attribute or relation.
    pub fn has(&self, key: &str) -> bool {
        matches!(
            self.accessors.slot(key),
            Some(Slot::Attribute) | Some(Slot::Relation)
        )
    }

    pub fn keys(&self) -> Vec<&str> {
        self.accessors.keys().collect()
    }

    pub fn slot(&self, key: &str) -> Option<Slot> {
        self.accessors.slot(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::{Config, Model, RelationDef};
    use serde_json::json;
    use std::sync::Arc;

    struct Task;

    impl Model for Task {
        fn name(&self) -> &'static str {
            "Task"
        }

        fn methods(&self) -> &'static [&'static str] {
            &["save"]
        }

        fn relations(&self) -> Vec<RelationDef> {
            vec![RelationDef::has_many("steps", &Step)]
        }
    }

    struct Step;

    impl Model for Step {
        fn name(&self) -> &'static str {
            "Step"
        }
    }

    #[test]
    fn test_table_protects_methods() {
        let mut table = AccessorTable::with_methods(&["save"]);
        assert!(!table.install("save", Slot::Attribute));
        assert!(!table.uninstall("save"));
        assert_eq!(table.slot("save"), Some(Slot::Method));

        assert!(table.install("title", Slot::Attribute));
        assert!(table.uninstall("title"));
        assert!(!table.uninstall("title"));
        assert_eq!(table.keys().count(), 0);
    }

    #[test]
    fn test_uniform_surface() {
        let mut task = Record::new(&Task, Arc::new(Config::new()));
        task.set("title", "write").unwrap();
        task.set("steps", json!([{ "id": 1 }, { "id": 2 }])).unwrap();

        assert_eq!(task.keys(), ["title", "steps"]);
        assert_eq!(task.slot("steps"), Some(Slot::Relation));
        assert_eq!(task.get("title").unwrap().unwrap(), json!("write"));
        let steps = task.get("steps").unwrap().unwrap();
        assert_eq!(steps.as_relation().unwrap().len(), 2);
        assert!(task.get("nothing").unwrap().is_none());
    }

    #[test]
    fn test_delete_keeps_method_slot() {
        let mut task = Record::new(&Task, Arc::new(Config::new()));
        task.set("save", "shadow").unwrap();
        assert_eq!(task.slot("save"), Some(Slot::Method));
        assert!(!task.has("save"));

        task.delete_attribute("save");
        assert_eq!(task.slot("save"), Some(Slot::Method));
        assert!(task.get_attribute("save").unwrap().is_none());
    }
}
