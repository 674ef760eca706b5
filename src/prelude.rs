//! Everything application code usually needs, in one import.

pub use crate::{
    AfterSave, BeforeSave, DocumentStore, Entity, HookResult, IdentifierError, Key, MemoryStore,
    PayloadHooks, Record, SaveError, save, save_struct, save_struct_ref,
};
