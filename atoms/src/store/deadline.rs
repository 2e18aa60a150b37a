use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use super::document::{Document, DocumentList, Fields, StoreError};
use super::query::Query;
use super::DocumentStore;

/// Puts an upper bound on every call to the wrapped store.
/// Nothing is retried; a call that runs out of time is a `Timeout`.
#[derive(Debug, Clone)]
pub struct DeadlineStore<S> {
    inner: S,
    deadline: Duration,
}

impl<S> DeadlineStore<S> {
    pub fn new(inner: S, deadline: Duration) -> Self {
        Self { inner, deadline }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.deadline, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!("Store call exceeded {:?}", self.deadline);
                Err(StoreError::Timeout(self.deadline.as_millis() as u64))
            }
        }
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for DeadlineStore<S> {
    async fn list_documents(&self, queries: &[Query]) -> Result<DocumentList, StoreError> {
        self.bounded(self.inner.list_documents(queries)).await
    }

    async fn get_document(&self, id: &str) -> Result<Document, StoreError> {
        self.bounded(self.inner.get_document(id)).await
    }

    async fn create_document(&self, id: &str, fields: Fields) -> Result<Document, StoreError> {
        self.bounded(self.inner.create_document(id, fields)).await
    }

    async fn update_document(&self, id: &str, fields: Fields) -> Result<Document, StoreError> {
        self.bounded(self.inner.update_document(id, fields)).await
    }

    async fn delete_document(&self, id: &str) -> Result<(), StoreError> {
        self.bounded(self.inner.delete_document(id)).await
    }
}
