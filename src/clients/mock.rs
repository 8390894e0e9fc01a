//! # Mock Transport & Testing Guide
//!
//! `MockTransport` answers queries from a queue of expectations instead of a
//! running service. It hands out the same [`ServiceClient`] the production
//! service does, so code under test cannot tell the difference.
//!
//! ## When to use Mocks vs the Memory Service
//!
//! | Feature | MockTransport | MemoryService |
//! |---------|---------------|---------------|
//! | **State** | None (expectations) | Real tables |
//! | **Assertions** | Exact queries received | Final record state |
//! | **Error Injection** | Easy (`return_err`) | Only `NotFound` |
//! | **Use Case** | Unit testing load logic | End-to-end flows |
//!
//! ## Example
//!
//! ```rust
//! use record_kernel::clients::mock::MockTransport;
//! use record_kernel::clients::{Query, Transport};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mock = MockTransport::new();
//!     mock.expect_execute("teams/5").return_ok(json!({ "id": 5 }));
//!
//!     let team = mock.client().execute(&Query::new("teams/5")).await.unwrap();
//!     assert_eq!(team["id"], 5);
//!     mock.verify();
//! }
//! ```

use crate::clients::{Query, ServiceClient, Transport, TransportError, TransportRequest};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// An expected query and the response to give it.
struct Expectation {
    endpoint: String,
    response: Result<Value, TransportError>,
}

/// A transport with expectation tracking for fluent testing.
///
/// Expectations are consumed in order. A query for a different endpoint than
/// the next expectation panics the background task, which the caller sees as
/// [`TransportError::ServiceDropped`].
pub struct MockTransport {
    client: ServiceClient,
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
    received: Arc<Mutex<Vec<Query>>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Creates a new mock transport with no expectations.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<TransportRequest>(100);
        let expectations = Arc::new(Mutex::new(VecDeque::new()));
        let received = Arc::new(Mutex::new(Vec::new()));
        let expectations_clone = expectations.clone();
        let received_clone = received.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let TransportRequest::Execute { query, respond_to } = request;
                let expectation = expectations_clone.lock().unwrap().pop_front();
                received_clone.lock().unwrap().push(query.clone());

                match expectation {
                    Some(Expectation { endpoint, response }) if endpoint == query.endpoint() => {
                        let _ = respond_to.send(response);
                    }
                    Some(Expectation { endpoint, .. }) => {
                        panic!("Expected query for '{endpoint}', got '{}'", query.endpoint());
                    }
                    None => {
                        panic!("Unexpected query for '{}'", query.endpoint());
                    }
                }
            }
        });

        Self {
            client: ServiceClient::new(sender),
            expectations,
            received,
            _handle: handle,
        }
    }

    /// Returns the client for use in tests.
    pub fn client(&self) -> ServiceClient {
        self.client.clone()
    }

    /// Expects a query against `endpoint`.
    pub fn expect_execute(&self, endpoint: impl Into<String>) -> ExecuteExpectationBuilder {
        ExecuteExpectationBuilder {
            endpoint: endpoint.into(),
            expectations: self.expectations.clone(),
        }
    }

    /// Every query received so far, in order.
    pub fn received(&self) -> Vec<Query> {
        self.received.lock().unwrap().clone()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let exps = self.expectations.lock().unwrap();
        if !exps.is_empty() {
            panic!("Not all expectations were met. {} remaining", exps.len());
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, query: &Query) -> Result<Value, TransportError> {
        self.client.execute(query).await
    }
}

/// Builder for `execute` expectations.
pub struct ExecuteExpectationBuilder {
    endpoint: String,
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
}

impl ExecuteExpectationBuilder {
    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, value: Value) {
        let mut exps = self.expectations.lock().unwrap();
        exps.push_back(Expectation {
            endpoint: self.endpoint,
            response: Ok(value),
        });
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: TransportError) {
        let mut exps = self.expectations.lock().unwrap();
        exps.push_back(Expectation {
            endpoint: self.endpoint,
            response: Err(error),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_returns_in_order() {
        let mock = MockTransport::new();
        mock.expect_execute("teams").return_ok(json!([]));
        mock.expect_execute("teams/1").return_err(TransportError::NotFound("teams/1".into()));

        assert_eq!(mock.execute(&Query::new("teams")).await.unwrap(), json!([]));
        assert!(matches!(
            mock.execute(&Query::new("teams/1")).await,
            Err(TransportError::NotFound(_))
        ));
        mock.verify();
        assert_eq!(mock.received().len(), 2);
    }

    #[tokio::test]
    async fn test_mismatch_drops_response() {
        let mock = MockTransport::new();
        mock.expect_execute("teams").return_ok(json!([]));
        assert!(matches!(
            mock.execute(&Query::new("users")).await,
            Err(TransportError::ServiceDropped)
        ));
    }

    #[tokio::test]
    #[should_panic(expected = "Not all expectations were met")]
    async fn test_verify_panics_on_leftovers() {
        let mock = MockTransport::new();
        mock.expect_execute("teams").return_ok(json!([]));
        mock.verify();
    }
}
