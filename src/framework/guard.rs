//! # Guard Policy
//!
//! Mass-assignment protection for [`Record::fill`](crate::framework::Record::fill).
//! `*` stands for every key. Fillable always beats guarded for the same key.
//! Nothing is fillable until a model says otherwise.

use serde_json::{Map, Value};

pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardPolicy {
    fillable: Vec<String>,
    guarded: Vec<String>,
}

impl GuardPolicy {
    pub fn new<F, G>(fillable: F, guarded: G) -> Self
    where
        F: IntoIterator,
        F::Item: Into<String>,
        G: IntoIterator,
        G::Item: Into<String>,
    {
        let mut policy = Self {
            fillable: Vec::new(),
            guarded: Vec::new(),
        };
        policy.merge_fillable(fillable);
        policy.merge_guarded(guarded);
        policy
    }

    pub fn fillable(&self) -> &[String] {
        &self.fillable
    }

    pub fn guarded(&self) -> &[String] {
        &self.guarded
    }

    pub fn is_fillable(&self, key: &str) -> bool {
        self.fillable.iter().any(|k| k == key || k == WILDCARD)
    }

    pub fn is_guarded(&self, key: &str) -> bool {
        self.guarded.iter().any(|k| k == key || k == WILDCARD) && !self.is_fillable(key)
    }

    /// The entries of `data` a bulk fill may write.
    pub fn fillable_from(&self, data: Map<String, Value>) -> Map<String, Value> {
        if self.fillable.iter().any(|k| k == WILDCARD) {
            return data;
        }
        data.into_iter()
            .filter(|(key, _)| !self.is_guarded(key))
            .collect()
    }

    pub fn set_fillable<I>(&mut self, keys: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.fillable.clear();
        self.merge_fillable(keys);
    }

    pub fn merge_fillable<I>(&mut self, keys: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        push_unique(&mut self.fillable, keys);
    }

    pub fn set_guarded<I>(&mut self, keys: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.guarded.clear();
        self.merge_guarded(keys);
    }

    pub fn merge_guarded<I>(&mut self, keys: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        push_unique(&mut self.guarded, keys);
    }
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self {
            fillable: Vec::new(),
            guarded: vec![WILDCARD.to_string()],
        }
    }
}

fn push_unique<I>(list: &mut Vec<String>, keys: I)
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    for key in keys {
        let key = key.into();
        if !list.contains(&key) {
            list.push(key);
        }
    }
}
