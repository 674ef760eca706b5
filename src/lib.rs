// ============================================================================
// docsave Library
// ============================================================================

//! Save typed records into a schema-less document store.
//!
//! [`save`] derives a key from the record's kind and identifier, runs the
//! optional before-save hook, writes through a [`DocumentStore`], copies the
//! store-assigned identifier back onto the record and runs the optional
//! after-save hook. [`save_struct`] does the same for plain structs that
//! derive [`Entity`](derive@Entity).
//!
//! # Examples
//!
//! ```
//! use docsave::{Entity, MemoryStore, save_struct};
//! use serde::Serialize;
//!
//! #[derive(Serialize, Entity)]
//! struct Person {
//!     #[serde(skip)]
//!     id: i64,
//!     name: String,
//!     age: i64,
//! }
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::new();
//! let mut person = Person { id: 0, name: "John".into(), age: 42 };
//!
//! let key = save_struct(&store, &mut person).await?;
//! assert_eq!(key.kind(), "Person");
//! assert_eq!(person.id, key.id());
//! # Ok::<(), docsave::SaveError>(())
//! # }).unwrap();
//! ```

extern crate self as docsave;

pub mod core;
pub mod persist;
pub mod prelude;
pub mod storage;

// Re-export main types for convenience
pub use crate::core::{
    AdaptError, IdentifierError, Key, Result, SaveError, StoreError, StoreResult, kind_of,
};
pub use persist::{
    AfterSave, BeforeSave, Entity, HookResult, PayloadHooks, Persistable, Record, StructRecord,
    adapt, adapt_ref, save, save_struct, save_struct_ref,
};
pub use storage::{Document, DocumentStore, MemoryStore, MemoryStoreConfig};

pub use docsave_derive::Entity;
