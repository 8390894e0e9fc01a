//! # Transport
//!
//! [`Transport`] is the seam between the kernel and whatever answers queries.
//! [`ServiceClient`] is the production implementation: it forwards each
//! [`Query`] over an mpsc channel to a [`MemoryService`](crate::clients::MemoryService)
//! and waits on a oneshot channel for the reply.

use crate::clients::Query;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

/// Errors raised while executing a query.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Service closed")]
    ServiceClosed,

    #[error("Service dropped response channel")]
    ServiceDropped,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Remote error: {0}")]
    Remote(String),
}

pub type Response = oneshot::Sender<Result<Value, TransportError>>;

/// Message sent from a [`ServiceClient`] to the service task.
#[derive(Debug)]
pub enum TransportRequest {
    Execute { query: Query, respond_to: Response },
}

/// Anything that can execute a [`Query`] and return raw JSON.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, query: &Query) -> Result<Value, TransportError>;
}

/// A cheap, cloneable handle to a running service.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    sender: mpsc::Sender<TransportRequest>,
}

impl ServiceClient {
    pub fn new(sender: mpsc::Sender<TransportRequest>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl Transport for ServiceClient {
    #[tracing::instrument(skip(self), fields(endpoint = query.endpoint()))]
    async fn execute(&self, query: &Query) -> Result<Value, TransportError> {
        tracing::debug!("Sending request");
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(TransportRequest::Execute {
                query: query.clone(),
                respond_to,
            })
            .await
            .map_err(|_| TransportError::ServiceClosed)?;
        response.await.map_err(|_| TransportError::ServiceDropped)?
    }
}
