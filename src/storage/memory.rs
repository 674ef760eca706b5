use super::config::MemoryStoreConfig;
use super::store::{Document, DocumentStore};
use crate::core::{Key, StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{Level, event};

/// Documents of one kind plus its identifier allocator.
struct KindTable {
    next_id: i64,
    documents: BTreeMap<i64, Document>,
}

impl KindTable {
    fn new(first_id: i64) -> Self {
        Self {
            next_id: first_id,
            documents: BTreeMap::new(),
        }
    }

    fn allocate(&mut self) -> StoreResult<i64> {
        let id = self.next_id;
        self.next_id = id
            .checked_add(1)
            .ok_or_else(|| StoreError::Unavailable("identifier space exhausted".to_string()))?;
        Ok(id)
    }

    /// Keeps future allocations clear of an explicitly written identifier.
    fn reserve(&mut self, id: i64) {
        if id >= self.next_id {
            self.next_id = id.saturating_add(1);
        }
    }
}

/// Document store kept entirely in memory.
///
/// Identifiers are allocated per kind, starting at
/// [`MemoryStoreConfig::first_id`]. Writing a complete key replaces any
/// document already stored under it.
pub struct MemoryStore {
    config: MemoryStoreConfig,
    kinds: RwLock<HashMap<String, KindTable>>,
    writes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            config: MemoryStoreConfig::default(),
            kinds: RwLock::new(HashMap::new()),
            writes: AtomicU64::new(0),
        }
    }

    pub fn with_config(config: MemoryStoreConfig) -> StoreResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            kinds: RwLock::new(HashMap::new()),
            writes: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &MemoryStoreConfig {
        &self.config
    }

    /// Document stored under a complete key.
    pub async fn get(&self, key: &Key) -> Option<Document> {
        if key.is_incomplete() {
            return None;
        }
        let kinds = self.kinds.read().await;
        kinds
            .get(key.kind())
            .and_then(|table| table.documents.get(&key.id()))
            .cloned()
    }

    /// Number of stored documents across all kinds.
    pub async fn len(&self) -> usize {
        let kinds = self.kinds.read().await;
        kinds.values().map(|table| table.documents.len()).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of successful writes since creation.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn put(&self, key: Key, document: Document) -> StoreResult<Key> {
        if key.kind().is_empty() {
            return Err(StoreError::InvalidKey(key, "kind must not be empty".to_string()));
        }

        let mut kinds = self.kinds.write().await;

        let replaces = key.is_complete()
            && kinds
                .get(key.kind())
                .is_some_and(|table| table.documents.contains_key(&key.id()));
        if !replaces {
            if let Some(max) = self.config.max_documents {
                let stored: usize = kinds.values().map(|table| table.documents.len()).sum();
                if stored >= max {
                    return Err(StoreError::CapacityExceeded(max));
                }
            }
        }

        let first_id = self.config.first_id;
        let table = kinds
            .entry(key.kind().to_string())
            .or_insert_with(|| KindTable::new(first_id));

        let id = if key.is_incomplete() {
            table.allocate()?
        } else {
            table.reserve(key.id());
            key.id()
        };
        table.documents.insert(id, document);
        drop(kinds);

        self.writes.fetch_add(1, Ordering::Relaxed);
        let stored = key.with_id(id);
        event!(Level::TRACE, key = %stored, replaced = replaces, "document stored");
        Ok(stored)
    }
}
