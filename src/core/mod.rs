pub mod error;
pub mod key;

pub use error::{AdaptError, IdentifierError, Result, SaveError, StoreError, StoreResult};
pub use key::{INCOMPLETE_ID, Key, kind_from_type_name, kind_of};
