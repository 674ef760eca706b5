use super::adapter::{adapt, adapt_ref};
use super::contracts::{Entity, Record};
use crate::core::{Key, Result, SaveError, StoreError};
use crate::storage::{Document, DocumentStore};
use serde_json::Value;
use tracing::{Instrument, Level, event, info_span};

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Encodes the record's payload, or the record itself when it has none.
fn encode<R: Record + ?Sized>(record: &R, kind: &str) -> Result<Document> {
    let encoded = match record.payload() {
        Some(payload) => payload.to_json(),
        None => record.to_json(),
    };
    match encoded {
        Ok(Value::Object(document)) => Ok(document),
        Ok(other) => Err(SaveError::NotADocument {
            kind: kind.to_string(),
            found: json_type_name(&other),
        }),
        Err(source) => Err(SaveError::Encode {
            kind: kind.to_string(),
            source,
        }),
    }
}

/// Runs the record's before-save hook, or else its payload's. Returns whether
/// one ran.
fn run_before_save<R: Record + ?Sized>(record: &mut R) -> anyhow::Result<bool> {
    if let Some(hook) = record.before_save_hook() {
        hook.before_save()?;
        return Ok(true);
    }
    match record.payload_hooks().and_then(|hooks| hooks.before_save_hook()) {
        Some(hook) => hook.before_save().map(|()| true),
        None => Ok(false),
    }
}

fn run_after_save<R: Record + ?Sized>(record: &mut R) -> anyhow::Result<bool> {
    if let Some(hook) = record.after_save_hook() {
        hook.after_save()?;
        return Ok(true);
    }
    match record.payload_hooks().and_then(|hooks| hooks.after_save_hook()) {
        Some(hook) => hook.after_save().map(|()| true),
        None => Ok(false),
    }
}

/// Saves `record` into `store`, running its lifecycle hooks.
///
/// A record with identifier zero is written under an incomplete key and
/// receives the identifier the store assigns; any other identifier is written
/// under the complete key for it. The sequence is:
///
/// 1. before-save hook, whose failure aborts without writing
/// 2. exactly one [`DocumentStore::put`] of the payload (or the record)
/// 3. [`Record::set_id`] with the identifier of the returned key
/// 4. after-save hook
///
/// Each hook comes from the record, or from [`Record::payload_hooks`] when the
/// record has none. When the identifier cannot be stored or the after-save
/// hook fails the write has already committed, which
/// [`SaveError::is_committed`] reports.
pub async fn save<S, R>(store: &S, record: &mut R) -> Result<Key>
where
    S: DocumentStore + ?Sized,
    R: Record + ?Sized,
{
    let kind = record.kind();
    let key = Key::for_id(kind.as_str(), record.id());
    let span = info_span!(
        "docsave.save",
        kind = %kind,
        incomplete = key.is_incomplete()
    );

    async move {
        if run_before_save(&mut *record).map_err(SaveError::BeforeSave)? {
            event!(Level::DEBUG, "before-save hook ran");
        }

        let document = encode(&*record, &kind)?;

        let stored = store.put(key, document).await?;
        if stored.is_incomplete() {
            return Err(StoreError::IncompleteKey(stored).into());
        }
        event!(Level::DEBUG, key = %stored, "record written");

        if let Err(source) = record.set_id(stored.id()) {
            return Err(SaveError::Identifier {
                key: stored,
                source,
            });
        }

        match run_after_save(&mut *record) {
            Ok(true) => event!(Level::DEBUG, "after-save hook ran"),
            Ok(false) => {}
            Err(source) => {
                return Err(SaveError::AfterSave {
                    key: stored,
                    source,
                });
            }
        }

        Ok(stored)
    }
    .instrument(span)
    .await
}

/// Saves a plain struct: adapts it with [`adapt`] and delegates to [`save`].
///
/// The assigned identifier is written back into `value` when its type binds
/// one (see [`Entity`]).
pub async fn save_struct<S, T>(store: &S, value: &mut T) -> Result<Key>
where
    S: DocumentStore + ?Sized,
    T: Entity,
{
    let mut record = adapt(value)?;
    save(store, &mut record).await
}

/// Saves a struct the caller only lends out for reading.
///
/// The value is written exactly as [`save_struct`] would write it, but the
/// assigned identifier is only returned in the key, never stored back into
/// `value`, and the value's hooks do not run.
pub async fn save_struct_ref<S, T>(store: &S, value: &T) -> Result<Key>
where
    S: DocumentStore + ?Sized,
    T: Entity,
{
    let mut record = adapt_ref(value)?;
    save(store, &mut record).await
}
