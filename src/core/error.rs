use thiserror::Error;

use super::key::Key;

/// Raised when an identifier field and the store's `i64` identifiers disagree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("Identifier {value} in {type_name}.{field} is not a valid i64 identifier")]
    Unrepresentable {
        type_name: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Identifier {id} does not fit in {type_name}.{field}")]
    OutOfRange {
        type_name: &'static str,
        field: &'static str,
        id: i64,
    },
}

/// Raised when a value cannot be viewed as a structured record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdaptError {
    #[error("Can't save {type_name}: expected a struct with named fields, found {shape}")]
    Unsupported {
        type_name: &'static str,
        shape: &'static str,
    },

    #[error("Can't save {type_name}: {reason}")]
    Unserializable {
        type_name: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Identifier(#[from] IdentifierError),
}

/// Errors reported by a [`DocumentStore`](crate::storage::DocumentStore).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid key {0}: {1}")]
    InvalidKey(Key, String),

    #[error("Store returned incomplete key {0}")]
    IncompleteKey(Key),

    #[error("Store capacity of {0} documents exceeded")]
    CapacityExceeded(usize),

    #[error("Invalid store configuration: {0}")]
    InvalidConfig(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A store guarding its state with `std::sync` locks found one poisoned.
    /// `?` on a poisoned lock result produces this variant.
    #[error("Lock error: {0}")]
    LockError(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Errors returned by [`save`](crate::persist::save) and friends.
///
/// Every variant except [`SaveError::Identifier`] and [`SaveError::AfterSave`]
/// means the store was left untouched and the record's identifier was not
/// modified.
#[derive(Error, Debug)]
pub enum SaveError {
    #[error(transparent)]
    Adapt(#[from] AdaptError),

    #[error("BeforeSave hook failed: {0}")]
    BeforeSave(#[source] anyhow::Error),

    #[error("Failed to encode record of kind '{kind}': {source}")]
    Encode {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Record of kind '{kind}' must encode to an object, found {found}")]
    NotADocument { kind: String, found: &'static str },

    #[error("Store write failed: {0}")]
    Store(#[from] StoreError),

    /// The write committed, but the record cannot hold the assigned
    /// identifier. The after-save hook did not run.
    #[error("Saved as {key} but the identifier could not be stored: {source}")]
    Identifier {
        key: Key,
        #[source]
        source: IdentifierError,
    },

    /// The write committed and the identifier was assigned, but the
    /// after-save hook failed.
    #[error("Saved as {key} but AfterSave hook failed: {source}")]
    AfterSave {
        key: Key,
        #[source]
        source: anyhow::Error,
    },
}

impl SaveError {
    /// True when the store already holds the record.
    pub fn is_committed(&self) -> bool {
        matches!(
            self,
            SaveError::Identifier { .. } | SaveError::AfterSave { .. }
        )
    }

    /// The committed key of a partially successful save.
    pub fn committed_key(&self) -> Option<&Key> {
        match self {
            SaveError::Identifier { key, .. } | SaveError::AfterSave { key, .. } => Some(key),
            _ => None,
        }
    }

    /// The error a lifecycle hook returned, as the hook returned it.
    pub fn hook_error(&self) -> Option<&anyhow::Error> {
        match self {
            SaveError::BeforeSave(err) | SaveError::AfterSave { source: err, .. } => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SaveError>;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Lets store implementations use `?` on `std::sync` lock results.
impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("name is required")]
    struct MissingName;

    #[test]
    fn test_after_save_is_committed() {
        let err = SaveError::AfterSave {
            key: Key::complete("Person", 7),
            source: anyhow::Error::new(MissingName),
        };
        assert!(err.is_committed());
        assert_eq!(err.committed_key(), Some(&Key::complete("Person", 7)));
        assert_eq!(err.to_string(), "Saved as Person(7) but AfterSave hook failed: name is required");
    }

    #[test]
    fn test_hook_error_downcasts_to_hook_type() {
        let err = SaveError::BeforeSave(anyhow::Error::new(MissingName));
        assert!(!err.is_committed());
        assert!(err.committed_key().is_none());
        let hook = err.hook_error().unwrap();
        assert!(hook.downcast_ref::<MissingName>().is_some());
    }

    #[test]
    fn test_store_error_is_not_committed() {
        let err = SaveError::from(StoreError::Unavailable("connection reset".into()));
        assert!(!err.is_committed());
        assert!(err.hook_error().is_none());
        assert_eq!(err.to_string(), "Store write failed: Store unavailable: connection reset");
    }

    #[test]
    fn test_identifier_error_is_committed() {
        let err = SaveError::Identifier {
            key: Key::complete("Ticket", 300),
            source: IdentifierError::OutOfRange {
                type_name: "Ticket",
                field: "id",
                id: 300,
            },
        };
        assert!(err.is_committed());
        assert_eq!(err.committed_key(), Some(&Key::complete("Ticket", 300)));
        assert!(err.hook_error().is_none());
        assert_eq!(
            err.to_string(),
            "Saved as Ticket(300) but the identifier could not be stored: \
             Identifier 300 does not fit in Ticket.id"
        );
    }

    #[test]
    fn test_poisoned_lock_becomes_lock_error() {
        let lock = std::sync::Arc::new(std::sync::Mutex::new(0u32));
        let poisoner = lock.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        let err = StoreError::from(lock.lock().unwrap_err());
        assert!(matches!(err, StoreError::LockError(_)));
        assert!(err.to_string().starts_with("Lock error: "));
    }

    #[test]
    fn test_adapt_error_names_type() {
        let err = SaveError::from(AdaptError::Unsupported {
            type_name: "i64",
            shape: "number",
        });
        assert_eq!(
            err.to_string(),
            "Can't save i64: expected a struct with named fields, found number"
        );
    }
}
