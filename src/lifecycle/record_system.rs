use crate::clients::{MemoryService, ServiceClient};
use crate::framework::{Config, Model};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

/// Owns the in-memory record service and the configuration records share.
///
/// `RecordSystem` is responsible for:
/// - **Lifecycle Management**: Starting and stopping the service task
/// - **Wiring**: Handing out [`ServiceClient`]s and the shared [`Config`]
///
/// # Example
///
/// ```ignore
/// let system = RecordSystem::builder()
///     .model(&User)
///     .table("users", rows)
///     .start(Config::new());
///
/// let mut user = Record::hydrate(&User, system.config(), row)?;
/// user.load(&system.client, &["team"], false).await?;
///
/// system.shutdown().await?;
/// ```
pub struct RecordSystem {
    /// Client for the memory service. Clone it freely.
    pub client: ServiceClient,

    config: Arc<Config>,
    handle: tokio::task::JoinHandle<()>,
}

/// Collects tables and models before the service starts.
pub struct RecordSystemBuilder {
    service: MemoryService,
    client: ServiceClient,
}

impl RecordSystemBuilder {
    pub fn model(mut self, model: &'static dyn Model) -> Self {
        self.service.model(model);
        self
    }

    pub fn table(mut self, endpoint: impl Into<String>, rows: Vec<Value>) -> Self {
        self.service.table(endpoint, rows);
        self
    }

    /// Spawn the service task. Records built from [`RecordSystem::config`]
    /// and the service's eager loads share `config`.
    pub fn start(self, config: Config) -> RecordSystem {
        let config = Arc::new(config);
        let handle = tokio::spawn(self.service.run(config.clone()));
        info!("Record system started");
        RecordSystem {
            client: self.client,
            config,
            handle,
        }
    }
}

impl RecordSystem {
    pub fn builder() -> RecordSystemBuilder {
        let (service, client) = MemoryService::new(32);
        RecordSystemBuilder { service, client }
    }

    pub fn config(&self) -> Arc<Config> {
        self.config.clone()
    }

    /// Drop the client and wait for the service to drain.
    ///
    /// Any clones of [`RecordSystem::client`] still alive keep the service
    /// running, so drop them first.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down record system...");
        drop(self.client);

        if let Err(e) = self.handle.await {
            error!("Service task failed: {:?}", e);
            return Err(format!("Service task failed: {:?}", e));
        }

        info!("Record system shutdown complete.");
        Ok(())
    }
}
