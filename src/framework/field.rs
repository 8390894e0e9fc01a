//! Values handed out by the record: raw JSON, cast collections and date-times,
//! and materialized relations.

use crate::framework::Record;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::ops::{Deref, DerefMut};

/// Ordered container used by the `collection` cast and for to-many relations.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    items: Vec<T>,
}

impl<T> Collection<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Vec<T>> for Collection<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<T> FromIterator<T> for Collection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T> Deref for Collection<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Vec<T> {
        &self.items
    }
}

impl<T> DerefMut for Collection<T> {
    fn deref_mut(&mut self) -> &mut Vec<T> {
        &mut self.items
    }
}

impl<T> IntoIterator for Collection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// A loaded relation value.
#[derive(Debug, Clone)]
pub enum Related {
    One(Box<Record>),
    Many(Collection<Record>),
}

impl Related {
    pub fn as_one(&self) -> Option<&Record> {
        match self {
            Related::One(record) => Some(record),
            Related::Many(_) => None,
        }
    }

    pub fn as_many(&self) -> Option<&Collection<Record>> {
        match self {
            Related::One(_) => None,
            Related::Many(records) => Some(records),
        }
    }

    /// Number of related records held.
    pub fn len(&self) -> usize {
        match self {
            Related::One(_) => 1,
            Related::Many(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Record> for Related {
    fn from(record: Record) -> Self {
        Related::One(Box::new(record))
    }
}

impl From<Vec<Record>> for Related {
    fn from(records: Vec<Record>) -> Self {
        Related::Many(records.into())
    }
}

impl From<Collection<Record>> for Related {
    fn from(records: Collection<Record>) -> Self {
        Related::Many(records)
    }
}

/// What a key resolves to when read through the record.
#[derive(Debug, Clone)]
pub enum Field {
    Value(Value),
    Collection(Collection<Value>),
    DateTime(DateTime<Utc>),
    Relation(Related),
}

impl Field {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Field::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Collection<Value>> {
        match self {
            Field::Collection(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTime<Utc>> {
        match self {
            Field::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn as_relation(&self) -> Option<&Related> {
        match self {
            Field::Relation(related) => Some(related),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Field::Value(value) => Some(value),
            _ => None,
        }
    }

    /// JSON form used for storage and serialization.
    ///
    /// Collections unwrap to arrays, date-times render as RFC 3339 and
    /// relations serialize through [`Record::to_json`].
    pub fn into_raw(self) -> Result<Value, crate::framework::KernelError> {
        Ok(match self {
            Field::Value(value) => value,
            Field::Collection(items) => Value::Array(items.into_vec()),
            Field::DateTime(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Field::Relation(Related::One(record)) => record.to_json()?,
            Field::Relation(Related::Many(records)) => Value::Array(
                records
                    .iter()
                    .map(Record::to_json)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        })
    }

    /// True for an object or an array whose elements are all objects.
    pub(crate) fn looks_relational(&self) -> bool {
        match self {
            Field::Relation(_) => true,
            Field::Value(Value::Object(_)) => true,
            Field::Value(Value::Array(items)) => items.iter().all(Value::is_object),
            Field::Collection(items) => items.iter().all(Value::is_object),
            _ => false,
        }
    }
}

impl From<Value> for Field {
    fn from(value: Value) -> Self {
        Field::Value(value)
    }
}

impl From<Collection<Value>> for Field {
    fn from(items: Collection<Value>) -> Self {
        Field::Collection(items)
    }
}

impl From<DateTime<Utc>> for Field {
    fn from(dt: DateTime<Utc>) -> Self {
        Field::DateTime(dt)
    }
}

impl From<Related> for Field {
    fn from(related: Related) -> Self {
        Field::Relation(related)
    }
}

impl From<Record> for Field {
    fn from(record: Record) -> Self {
        Field::Relation(record.into())
    }
}

impl From<Vec<Record>> for Field {
    fn from(records: Vec<Record>) -> Self {
        Field::Relation(records.into())
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Field::Value(Value::from(value))
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Field::Value(Value::from(value))
    }
}

impl From<bool> for Field {
    fn from(value: bool) -> Self {
        Field::Value(Value::from(value))
    }
}

impl From<i32> for Field {
    fn from(value: i32) -> Self {
        Field::Value(Value::from(value))
    }
}

impl From<i64> for Field {
    fn from(value: i64) -> Self {
        Field::Value(Value::from(value))
    }
}

impl From<f64> for Field {
    fn from(value: f64) -> Self {
        Field::Value(Value::from(value))
    }
}

impl PartialEq<Value> for Field {
    fn eq(&self, other: &Value) -> bool {
        matches!(self, Field::Value(value) if value == other)
    }
}
