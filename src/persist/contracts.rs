use crate::core::{IdentifierError, kind_of};
use serde::Serialize;

/// Outcome of a lifecycle hook. Hooks may fail with any error type.
pub type HookResult = anyhow::Result<()>;

/// Runs before the record is written. A failure aborts the save.
pub trait BeforeSave {
    fn before_save(&mut self) -> HookResult;
}

/// Runs after the write committed and the identifier was assigned.
pub trait AfterSave {
    fn after_save(&mut self) -> HookResult;
}

/// Values that can be encoded into the store's document form.
///
/// Implemented for every `Serialize` type; it exists so a record can hand out
/// its persisted view as a trait object.
pub trait Persistable {
    fn to_json(&self) -> serde_json::Result<serde_json::Value>;
}

impl<T: Serialize + ?Sized> Persistable for T {
    fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// Hook capabilities of a record's payload.
///
/// [`save`](super::save) consults these when the record itself returns no
/// hook, so a wrapper can keep identity while its payload owns the hooks.
pub trait PayloadHooks {
    fn before_save_hook(&mut self) -> Option<&mut dyn BeforeSave> {
        None
    }

    fn after_save_hook(&mut self) -> Option<&mut dyn AfterSave> {
        None
    }
}

/// Core contract for values [`save`](super::save) can persist.
///
/// Only identity and kind are required. Hooks and the persisted payload are
/// optional capabilities: return `Some` from the matching accessor to opt in.
/// A record's own hooks win over those its payload exposes through
/// [`Record::payload_hooks`].
///
/// # Examples
///
/// ```
/// use docsave::{AfterSave, HookResult, IdentifierError, Record};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Invoice {
///     #[serde(skip)]
///     id: i64,
///     total_cents: u64,
///     #[serde(skip)]
///     notified: bool,
/// }
///
/// impl AfterSave for Invoice {
///     fn after_save(&mut self) -> HookResult {
///         self.notified = true;
///         Ok(())
///     }
/// }
///
/// impl Record for Invoice {
///     fn id(&self) -> i64 {
///         self.id
///     }
///
///     fn set_id(&mut self, id: i64) -> Result<(), IdentifierError> {
///         self.id = id;
///         Ok(())
///     }
///
///     fn kind(&self) -> String {
///         "Invoice".to_string()
///     }
///
///     fn after_save_hook(&mut self) -> Option<&mut dyn AfterSave> {
///         Some(self)
///     }
/// }
/// ```
pub trait Record: Persistable {
    /// Current identifier; zero when none has been assigned.
    fn id(&self) -> i64;

    /// Stores the identifier assigned by the store.
    ///
    /// Fails when the record cannot represent `id`; the write has already
    /// committed by then.
    fn set_id(&mut self, id: i64) -> Result<(), IdentifierError>;

    /// Storage category of the record.
    fn kind(&self) -> String;

    /// Value to write instead of the record itself.
    fn payload(&self) -> Option<&dyn Persistable> {
        None
    }

    /// Hooks of the payload, used for each hook the record does not provide.
    fn payload_hooks(&mut self) -> Option<&mut dyn PayloadHooks> {
        None
    }

    fn before_save_hook(&mut self) -> Option<&mut dyn BeforeSave> {
        None
    }

    fn after_save_hook(&mut self) -> Option<&mut dyn AfterSave> {
        None
    }
}

/// Plain structs that [`adapt`](super::adapt) can turn into a [`Record`].
///
/// Usually derived with `#[derive(Entity)]`, which binds the identifier to a
/// field named `id` (or `ID`, or marked `#[entity(id)]`). Without such a field
/// the identifier reads as zero and writes are dropped.
///
/// The derived conversions are checked: an integer field narrower than `i64`
/// reports [`IdentifierError::OutOfRange`] instead of truncating.
pub trait Entity: Serialize {
    fn identifier(&self) -> Result<i64, IdentifierError> {
        Ok(0)
    }

    fn set_identifier(&mut self, _id: i64) -> Result<(), IdentifierError> {
        Ok(())
    }

    /// Kind shared by every value of this type.
    fn entity_kind() -> String {
        kind_of::<Self>()
    }

    fn before_save_hook(&mut self) -> Option<&mut dyn BeforeSave> {
        None
    }

    fn after_save_hook(&mut self) -> Option<&mut dyn AfterSave> {
        None
    }
}
