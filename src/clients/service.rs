//! # In-Memory Record Service
//!
//! `MemoryService` is the server half of [`ServiceClient`]. It owns a set of
//! JSON tables keyed by endpoint and answers [`Query`] messages one at a time,
//! so the tables need no locking.
//!
//! ## Resolution
//!
//! | Endpoint | Result |
//! |----------|--------|
//! | `teams` | every row of `teams` matching the wheres, as an array |
//! | `teams/5` | the row whose primary key is `5`, as an object |
//!
//! Names in the query's `with` list are answered by hydrating the row as a
//! [`Record`] of the registered model and running that record's relation
//! query against the same tables. Eager loading is one level deep. A relation
//! whose target is missing is left out of the row.
//!
//! # Usage Pattern
//!
//! ```rust
//! use record_kernel::clients::{MemoryService, Query, Transport};
//! use record_kernel::framework::Config;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (mut service, client) = MemoryService::new(10);
//!     service.table("teams", vec![json!({ "id": 1, "name": "Night" })]);
//!     tokio::spawn(service.run(Arc::new(Config::new())));
//!
//!     let team = client.execute(&Query::new("teams/1")).await.unwrap();
//!     assert_eq!(team["name"], "Night");
//! }
//! ```

use crate::clients::{Query, ServiceClient, TransportError, TransportRequest, Where};
use crate::framework::{Config, Model, Record};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub struct MemoryService {
    receiver: mpsc::Receiver<TransportRequest>,
    tables: IndexMap<String, Vec<Value>>,
    models: IndexMap<String, &'static dyn Model>,
}

impl MemoryService {
    /// Creates the service and its client. The service must be driven by [`MemoryService::run`].
    pub fn new(buffer_size: usize) -> (Self, ServiceClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let service = Self {
            receiver,
            tables: IndexMap::new(),
            models: IndexMap::new(),
        };
        (service, ServiceClient::new(sender))
    }

    /// Replace the rows stored under `endpoint`.
    pub fn table(&mut self, endpoint: impl Into<String>, rows: Vec<Value>) -> &mut Self {
        self.tables.insert(endpoint.into(), rows);
        self
    }

    /// Register `model` so rows of its endpoint can eager-load relations.
    pub fn model(&mut self, model: &'static dyn Model) -> &mut Self {
        self.models.insert(model.endpoint(), model);
        self
    }

    /// Process queries until every client is dropped.
    ///
    /// `config` is used when rows are hydrated for eager loading.
    pub async fn run(mut self, config: Arc<Config>) {
        info!(tables = self.tables.len(), "Service started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                TransportRequest::Execute { query, respond_to } => {
                    debug!(endpoint = query.endpoint(), with = ?query.with_relations(), "Execute");
                    let result = self.resolve(&query, &config, true);
                    if let Err(e) = &result {
                        warn!(endpoint = query.endpoint(), error = %e, "Execute failed");
                    }
                    let _ = respond_to.send(result);
                }
            }
        }

        info!(tables = self.tables.len(), "Shutdown");
    }

    fn resolve(&self, query: &Query, config: &Arc<Config>, eager: bool) -> Result<Value, TransportError> {
        let (table, id) = split_endpoint(query.endpoint())?;
        let rows = self
            .tables
            .get(table)
            .ok_or_else(|| TransportError::NotFound(query.endpoint().to_string()))?;
        let model = self.models.get(table).copied();
        let relations: &[String] = if eager { query.with_relations() } else { &[] };

        let mut matching = rows
            .iter()
            .filter(|row| query.wheres().iter().all(|clause| clause.matches(row)));

        match id {
            Some(id) => {
                let key = Where::equals(model.map_or("id", |m| m.primary_key()), id);
                let row = matching
                    .find(|row| key.matches(row))
                    .ok_or_else(|| TransportError::NotFound(query.endpoint().to_string()))?;
                self.eager_load(row.clone(), model, relations, config)
            }
            None => matching
                .map(|row| self.eager_load(row.clone(), model, relations, config))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
        }
    }

    fn eager_load(
        &self,
        row: Value,
        model: Option<&'static dyn Model>,
        relations: &[String],
        config: &Arc<Config>,
    ) -> Result<Value, TransportError> {
        if relations.is_empty() {
            return Ok(row);
        }
        let model = model.ok_or_else(|| TransportError::Remote("no model registered for eager load".into()))?;
        let record = Record::hydrate(model, config.clone(), row.clone()).map_err(remote)?;
        let mut out = match row {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for name in relations {
            let related = record.relation(name).map_err(remote)?;
            match self.resolve(related.query(), config, false) {
                Ok(value) => {
                    out.insert(name.clone(), value);
                }
                Err(TransportError::NotFound(endpoint)) => {
                    debug!(relation = name.as_str(), endpoint = endpoint.as_str(), "Eager load target missing");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(Value::Object(out))
    }
}

fn split_endpoint(endpoint: &str) -> Result<(&str, Option<&str>), TransportError> {
    let mut segments = endpoint.trim_matches('/').split('/');
    let table = segments.next().unwrap_or_default();
    let id = segments.next();
    if segments.next().is_some() {
        return Err(TransportError::NotFound(endpoint.to_string()));
    }
    Ok((table, id))
}

fn remote(e: impl std::fmt::Display) -> TransportError {
    TransportError::Remote(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::Transport;
    use serde_json::json;

    fn spawn(tables: Vec<(&str, Vec<Value>)>) -> ServiceClient {
        let (mut service, client) = MemoryService::new(10);
        for (endpoint, rows) in tables {
            service.table(endpoint, rows);
        }
        tokio::spawn(service.run(Arc::new(Config::new())));
        client
    }

    #[tokio::test]
    async fn test_resolve_collection_and_row() {
        let client = spawn(vec![(
            "shifts",
            vec![json!({ "id": 1, "userId": 1 }), json!({ "id": 2, "userId": 2 })],
        )]);

        let mut query = Query::new("shifts");
        query.where_equals("userId", 2);
        assert_eq!(client.execute(&query).await.unwrap(), json!([{ "id": 2, "userId": 2 }]));

        let row = client.execute(&Query::new("shifts/1")).await.unwrap();
        assert_eq!(row["userId"], json!(1));
    }

    #[tokio::test]
    async fn test_not_found() {
        let client = spawn(vec![("shifts", vec![])]);
        assert!(matches!(
            client.execute(&Query::new("shifts/9")).await,
            Err(TransportError::NotFound(_))
        ));
        assert!(matches!(
            client.execute(&Query::new("teams")).await,
            Err(TransportError::NotFound(_))
        ));
        assert!(matches!(
            client.execute(&Query::new("shifts/1/extra")).await,
            Err(TransportError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_closed_service() {
        let (service, client) = MemoryService::new(1);
        drop(service);
        assert!(matches!(
            client.execute(&Query::new("teams")).await,
            Err(TransportError::ServiceClosed)
        ));
    }
}
