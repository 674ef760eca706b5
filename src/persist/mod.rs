//! Record contracts, the struct adapter, and the save protocol.

pub mod adapter;
pub mod contracts;
pub mod save;

pub use adapter::{Shape, StructRecord, adapt, adapt_ref, shape_of};
pub use contracts::{AfterSave, BeforeSave, Entity, HookResult, PayloadHooks, Persistable, Record};
pub use save::{save, save_struct, save_struct_ref};
