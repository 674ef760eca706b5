use crate::core::{Key, StoreResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Schema-less persisted form of a record: a JSON object.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Document store contract - the single write the save protocol needs.
///
/// Implementations own atomicity, consistency, deadlines and retries for a
/// single write.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Writes `document` under `key`.
    ///
    /// For an incomplete key the store assigns an identifier. On success the
    /// returned key is always complete.
    async fn put(&self, key: Key, document: Document) -> StoreResult<Key>;
}

#[async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    async fn put(&self, key: Key, document: Document) -> StoreResult<Key> {
        (**self).put(key, document).await
    }
}

#[async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    async fn put(&self, key: Key, document: Document) -> StoreResult<Key> {
        (**self).put(key, document).await
    }
}

#[async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for Box<S> {
    async fn put(&self, key: Key, document: Document) -> StoreResult<Key> {
        (**self).put(key, document).await
    }
}
