use aws_sdk_dynamodb::Client as DynamoClient;
use intern_atoms::store::{DeadlineStore, DocumentStore, DynamoDocumentStore, MemoryDocumentStore};
use std::sync::Arc;

use crate::config::{Config, StoreBackend};

/// Built once per cold start and shared by every invocation
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
}

impl AppState {
    pub async fn from_config(config: &Config) -> Self {
        let store: Arc<dyn DocumentStore> = match config.backend {
            StoreBackend::DynamoDb => {
                let aws_config = aws_config::load_from_env().await;
                let client = DynamoClient::new(&aws_config);
                tracing::info!(
                    "Using DynamoDB table {} (collection {})",
                    config.table_name,
                    config.collection_id
                );
                Arc::new(DeadlineStore::new(
                    DynamoDocumentStore::new(client, &config.table_name, &config.collection_id),
                    config.store_timeout,
                ))
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store; data does not survive the instance");
                Arc::new(DeadlineStore::new(MemoryDocumentStore::new(), config.store_timeout))
            }
        };

        Self { store }
    }

    pub fn with_store(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}
