use std::sync::Arc;

use tokio::net::TcpListener;

use medreg_registry::Registry;
use medreg_store::{FsRecordStore, InMemoryStorageTree, RecordStore};

use crate::config::{ServerConfig, StorageConfig};
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::router::{build_router, build_router_with_cors};

/// Patient registry server.
#[derive(Debug)]
pub struct RegistryServer {
    config: ServerConfig,
    registry: Arc<Registry>,
}

impl RegistryServer {
    /// Open the configured store and create the registry over it.
    pub async fn new(config: ServerConfig) -> ServerResult<Self> {
        config.validate()?;
        let store = open_store(&config.storage, &config.registry.namespace).await?;
        let registry = Registry::open(config.registry.clone(), store).await?;
        Ok(Self {
            config,
            registry: Arc::new(registry),
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        let state = AppState::new(Arc::clone(&self.registry));
        if self.config.permissive_cors {
            build_router_with_cors(state)
        } else {
            build_router(state)
        }
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            capacity = self.config.registry.capacity,
            namespace = %self.config.registry.namespace,
            "medreg server listening on {}",
            self.config.bind_addr
        );
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

/// Open the record store for `namespace` on the configured backend.
pub async fn open_store(
    storage: &StorageConfig,
    namespace: &str,
) -> ServerResult<Arc<dyn RecordStore>> {
    let store: Arc<dyn RecordStore> = match storage {
        StorageConfig::Memory => Arc::new(InMemoryStorageTree::new().namespace(namespace)?),
        StorageConfig::Fs { root } => Arc::new(FsRecordStore::open(root, namespace).await?),
    };
    Ok(store)
}
