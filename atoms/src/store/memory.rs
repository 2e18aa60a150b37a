use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::document::{Document, DocumentList, Fields, StoreError};
use super::query::{evaluate, Query};
use super::DocumentStore;
use crate::clock;

/// In-process store. Keeps insertion order, which is what listing returns
/// when no ordering query is given.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    documents: Arc<RwLock<Vec<Document>>>,
    calls: Arc<AtomicUsize>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document as-is, bypassing validation (legacy shapes in tests)
    pub async fn insert_raw(&self, document: Document) {
        self.documents.write().await.push(document);
    }

    /// Number of store operations served so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list_documents(&self, queries: &[Query]) -> Result<DocumentList, StoreError> {
        self.touch();
        let snapshot = self.documents.read().await.clone();
        evaluate(snapshot, queries)
    }

    async fn get_document(&self, id: &str) -> Result<Document, StoreError> {
        self.touch();
        self.documents
            .read()
            .await
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    async fn create_document(&self, id: &str, fields: Fields) -> Result<Document, StoreError> {
        self.touch();
        let mut documents = self.documents.write().await;
        if documents.iter().any(|d| d.id == id) {
            return Err(StoreError::Conflict { id: id.to_string() });
        }

        let now = clock::now();
        let document = Document {
            id: id.to_string(),
            created_at: now.clone(),
            updated_at: now,
            fields,
        };
        documents.push(document.clone());
        Ok(document)
    }

    async fn update_document(&self, id: &str, fields: Fields) -> Result<Document, StoreError> {
        self.touch();
        let mut documents = self.documents.write().await;
        let document = documents
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;

        document.fields.extend(fields);
        document.updated_at = clock::now();
        Ok(document.clone())
    }

    async fn delete_document(&self, id: &str) -> Result<(), StoreError> {
        self.touch();
        let mut documents = self.documents.write().await;
        let before = documents.len();
        documents.retain(|d| d.id != id);
        if documents.len() == before {
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        Ok(())
    }
}
