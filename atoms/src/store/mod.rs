// Document store seam: everything above this module talks to a collection
// through `DocumentStore` and never sees the database client.
pub mod attributes;
pub mod deadline;
pub mod document;
pub mod dynamo;
pub mod memory;
pub mod query;

use async_trait::async_trait;

pub use deadline::DeadlineStore;
pub use document::{Document, DocumentList, Fields, StoreError};
pub use dynamo::DynamoDocumentStore;
pub use memory::MemoryDocumentStore;
pub use query::Query;

/// CRUD + query access to a single collection
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_documents(&self, queries: &[Query]) -> Result<DocumentList, StoreError>;

    async fn get_document(&self, id: &str) -> Result<Document, StoreError>;

    /// Fails with `Conflict` when the id is taken
    async fn create_document(&self, id: &str, fields: Fields) -> Result<Document, StoreError>;

    /// Overwrites only the given fields
    async fn update_document(&self, id: &str, fields: Fields) -> Result<Document, StoreError>;

    async fn delete_document(&self, id: &str) -> Result<(), StoreError>;
}
