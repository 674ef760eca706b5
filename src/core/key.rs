use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier value that marks a key as incomplete.
pub const INCOMPLETE_ID: i64 = 0;

/// Address of a document: its kind plus an identifier, or the marker for
/// "not assigned yet".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key {
    kind: String,
    id: i64,
}

impl Key {
    /// Key referencing an existing identifier.
    ///
    /// An `id` of zero yields an incomplete key, since zero is never a valid
    /// assigned identifier.
    pub fn complete(kind: impl Into<String>, id: i64) -> Self {
        Self {
            kind: kind.into(),
            id,
        }
    }

    /// Key the store completes on write.
    pub fn incomplete(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: INCOMPLETE_ID,
        }
    }

    /// Zero yields an incomplete key, anything else a complete one.
    pub fn for_id(kind: impl Into<String>, id: i64) -> Self {
        if id == INCOMPLETE_ID {
            Self::incomplete(kind)
        } else {
            Self::complete(kind, id)
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Integer identifier; zero for incomplete keys.
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn is_incomplete(&self) -> bool {
        self.id == INCOMPLETE_ID
    }

    pub fn is_complete(&self) -> bool {
        !self.is_incomplete()
    }

    /// Completes an incomplete key with a store-assigned identifier.
    pub fn with_id(&self, id: i64) -> Self {
        Self {
            kind: self.kind.clone(),
            id,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_incomplete() {
            write!(f, "{}(?)", self.kind)
        } else {
            write!(f, "{}({})", self.kind, self.id)
        }
    }
}

/// Derives a kind from a declared type name.
///
/// Generic arguments are dropped first, then everything up to the last path
/// separator, so `app::model::Person` and `Person` both give `Person`, and
/// `app::Envelope<app::Person>` gives `Envelope`.
pub fn kind_from_type_name(type_name: &str) -> &str {
    let base = match type_name.find('<') {
        Some(idx) => &type_name[..idx],
        None => type_name,
    };
    let base = base.trim_start_matches('&').trim_start_matches("mut ");
    base.rsplit("::")
        .next()
        .and_then(|last| last.rsplit('.').next())
        .unwrap_or(base)
}

/// Kind for the type `T`.
pub fn kind_of<T: ?Sized>() -> String {
    kind_from_type_name(std::any::type_name::<T>()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    mod pkg {
        pub struct Person;
        pub struct Envelope<T>(pub T);
    }

    #[test]
    fn test_zero_id_is_incomplete() {
        let key = Key::for_id("Person", 0);
        assert!(key.is_incomplete());
        assert_eq!(key.kind(), "Person");
        assert_eq!(key.to_string(), "Person(?)");
    }

    #[test]
    fn test_non_zero_id_is_complete() {
        for id in [1, 42, -3, i64::MAX] {
            let key = Key::for_id("Person", id);
            assert!(key.is_complete(), "id {} should give a complete key", id);
            assert_eq!(key.id(), id);
        }
        assert_eq!(Key::complete("Person", 42).to_string(), "Person(42)");
    }

    #[test]
    fn test_with_id_keeps_kind() {
        let key = Key::incomplete("Order").with_id(9);
        assert_eq!(key, Key::complete("Order", 9));
    }

    #[test]
    fn test_kind_strips_module_path() {
        assert_eq!(kind_from_type_name("Person"), "Person");
        assert_eq!(kind_from_type_name("app::model::Person"), "Person");
        assert_eq!(kind_from_type_name("pkg.Person"), "Person");
        assert_eq!(kind_from_type_name("app::Envelope<app::Person>"), "Envelope");
        assert_eq!(kind_from_type_name("&mut app::Person"), "Person");
    }

    #[test]
    fn test_kind_of_is_stable() {
        assert_eq!(kind_of::<pkg::Person>(), "Person");
        assert_eq!(kind_of::<pkg::Person>(), kind_of::<pkg::Person>());
        assert_eq!(kind_of::<pkg::Envelope<pkg::Person>>(), "Envelope");
    }

    #[test]
    fn test_key_serde_shape() {
        let json = serde_json::to_value(Key::complete("Person", 5)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "Person", "id": 5}));
    }
}
