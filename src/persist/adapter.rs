use super::contracts::{AfterSave, BeforeSave, Entity, Persistable, Record};
use crate::core::{AdaptError, IdentifierError};
use serde::ser::{self, Impossible, Serialize, Serializer};
use std::fmt;
use thiserror::Error;
use tracing::{Level, event};

/// Top-level shape of a value in serde's data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Bool,
    Integer,
    Float,
    Char,
    String,
    Bytes,
    Null,
    Unit,
    UnitStruct,
    UnitVariant,
    NewtypeVariant,
    Sequence,
    Tuple,
    TupleStruct,
    TupleVariant,
    Map,
    Struct,
    StructVariant,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Bool => "bool",
            Shape::Integer => "integer",
            Shape::Float => "float",
            Shape::Char => "char",
            Shape::String => "string",
            Shape::Bytes => "bytes",
            Shape::Null => "null",
            Shape::Unit => "unit",
            Shape::UnitStruct => "unit struct",
            Shape::UnitVariant => "unit variant",
            Shape::NewtypeVariant => "newtype variant",
            Shape::Sequence => "sequence",
            Shape::Tuple => "tuple",
            Shape::TupleStruct => "tuple struct",
            Shape::TupleVariant => "tuple variant",
            Shape::Map => "map",
            Shape::Struct => "struct",
            Shape::StructVariant => "struct variant",
        }
    }

    /// Whether values of this shape are addressable field-by-name.
    pub fn is_aggregate(&self) -> bool {
        matches!(self, Shape::Struct | Shape::Map)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compound shapes end the probe early through the error channel.
#[derive(Debug, Error)]
enum ProbeStop {
    #[error("found {0}")]
    Found(Shape),
    #[error("{0}")]
    Custom(String),
}

impl ser::Error for ProbeStop {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        ProbeStop::Custom(msg.to_string())
    }
}

/// Serializer that records what a value looks like without encoding it.
///
/// Newtype structs and `Some` are looked through, the way they are encoded.
struct ShapeProbe;

type Stop = Impossible<Shape, ProbeStop>;

impl Serializer for ShapeProbe {
    type Ok = Shape;
    type Error = ProbeStop;
    type SerializeSeq = Stop;
    type SerializeTuple = Stop;
    type SerializeTupleStruct = Stop;
    type SerializeTupleVariant = Stop;
    type SerializeMap = Stop;
    type SerializeStruct = Stop;
    type SerializeStructVariant = Stop;

    fn serialize_bool(self, _v: bool) -> Result<Shape, ProbeStop> {
        Ok(Shape::Bool)
    }

    fn serialize_i8(self, _v: i8) -> Result<Shape, ProbeStop> {
        Ok(Shape::Integer)
    }

    fn serialize_i16(self, _v: i16) -> Result<Shape, ProbeStop> {
        Ok(Shape::Integer)
    }

    fn serialize_i32(self, _v: i32) -> Result<Shape, ProbeStop> {
        Ok(Shape::Integer)
    }

    fn serialize_i64(self, _v: i64) -> Result<Shape, ProbeStop> {
        Ok(Shape::Integer)
    }

    fn serialize_i128(self, _v: i128) -> Result<Shape, ProbeStop> {
        Ok(Shape::Integer)
    }

    fn serialize_u8(self, _v: u8) -> Result<Shape, ProbeStop> {
        Ok(Shape::Integer)
    }

    fn serialize_u16(self, _v: u16) -> Result<Shape, ProbeStop> {
        Ok(Shape::Integer)
    }

    fn serialize_u32(self, _v: u32) -> Result<Shape, ProbeStop> {
        Ok(Shape::Integer)
    }

    fn serialize_u64(self, _v: u64) -> Result<Shape, ProbeStop> {
        Ok(Shape::Integer)
    }

    fn serialize_u128(self, _v: u128) -> Result<Shape, ProbeStop> {
        Ok(Shape::Integer)
    }

    fn serialize_f32(self, _v: f32) -> Result<Shape, ProbeStop> {
        Ok(Shape::Float)
    }

    fn serialize_f64(self, _v: f64) -> Result<Shape, ProbeStop> {
        Ok(Shape::Float)
    }

    fn serialize_char(self, _v: char) -> Result<Shape, ProbeStop> {
        Ok(Shape::Char)
    }

    fn serialize_str(self, _v: &str) -> Result<Shape, ProbeStop> {
        Ok(Shape::String)
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<Shape, ProbeStop> {
        Ok(Shape::Bytes)
    }

    fn serialize_none(self) -> Result<Shape, ProbeStop> {
        Ok(Shape::Null)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Shape, ProbeStop> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Shape, ProbeStop> {
        Ok(Shape::Unit)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Shape, ProbeStop> {
        Ok(Shape::UnitStruct)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> Result<Shape, ProbeStop> {
        Ok(Shape::UnitVariant)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Shape, ProbeStop> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Shape, ProbeStop> {
        Ok(Shape::NewtypeVariant)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Stop, ProbeStop> {
        Err(ProbeStop::Found(Shape::Sequence))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Stop, ProbeStop> {
        Err(ProbeStop::Found(Shape::Tuple))
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<Stop, ProbeStop> {
        Err(ProbeStop::Found(Shape::TupleStruct))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Stop, ProbeStop> {
        Err(ProbeStop::Found(Shape::TupleVariant))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Stop, ProbeStop> {
        Err(ProbeStop::Found(Shape::Map))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Stop, ProbeStop> {
        Err(ProbeStop::Found(Shape::Struct))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Stop, ProbeStop> {
        Err(ProbeStop::Found(Shape::StructVariant))
    }
}

/// Inspects the top-level shape of `value`.
///
/// Fails with [`AdaptError::Unserializable`] when the value's `Serialize`
/// impl reports an error before its shape is known.
pub fn shape_of<T: ?Sized + Serialize>(value: &T) -> Result<Shape, AdaptError> {
    match value.serialize(ShapeProbe) {
        Ok(shape) | Err(ProbeStop::Found(shape)) => Ok(shape),
        Err(ProbeStop::Custom(reason)) => Err(AdaptError::Unserializable {
            type_name: std::any::type_name::<T>(),
            reason,
        }),
    }
}

fn check_aggregate<T: Entity>(value: &T) -> Result<(), AdaptError> {
    let shape = shape_of(value)?;
    if shape.is_aggregate() {
        return Ok(());
    }
    Err(AdaptError::Unsupported {
        type_name: std::any::type_name::<T>(),
        shape: shape.as_str(),
    })
}

enum Target<'a, T> {
    Exclusive(&'a mut T),
    Shared(&'a T),
}

/// [`Record`] view over a plain [`Entity`].
///
/// The wrapped value is the persisted payload, and its hooks run as the
/// record's hooks. A view built by [`adapt_ref`] cannot write the assigned
/// identifier back and does not run hooks, since both need exclusive access.
pub struct StructRecord<'a, T: Entity> {
    target: Target<'a, T>,
    kind: String,
    id: i64,
}

impl<'a, T: Entity> StructRecord<'a, T> {
    pub fn value(&self) -> &T {
        match &self.target {
            Target::Exclusive(value) => &**value,
            Target::Shared(value) => *value,
        }
    }

    /// True when the assigned identifier reaches the caller's value.
    pub fn is_writable(&self) -> bool {
        matches!(self.target, Target::Exclusive(_))
    }
}

impl<T: Entity> Serialize for StructRecord<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}

impl<T: Entity> Record for StructRecord<'_, T> {
    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) -> Result<(), IdentifierError> {
        match &mut self.target {
            Target::Exclusive(value) => {
                value.set_identifier(id)?;
                self.id = value.identifier()?;
            }
            Target::Shared(_) => {
                event!(
                    Level::DEBUG,
                    kind = %self.kind,
                    id,
                    "read-only record view, identifier not written back"
                );
            }
        }
        Ok(())
    }

    fn kind(&self) -> String {
        self.kind.clone()
    }

    fn payload(&self) -> Option<&dyn Persistable> {
        Some(self.value())
    }

    fn before_save_hook(&mut self) -> Option<&mut dyn BeforeSave> {
        match &mut self.target {
            Target::Exclusive(value) => value.before_save_hook(),
            Target::Shared(_) => None,
        }
    }

    fn after_save_hook(&mut self) -> Option<&mut dyn AfterSave> {
        match &mut self.target {
            Target::Exclusive(value) => value.after_save_hook(),
            Target::Shared(_) => None,
        }
    }
}

/// Views a plain struct as a [`Record`].
///
/// Fails with [`AdaptError::Unsupported`] unless `value` serializes as a
/// struct or map, and with [`AdaptError::Identifier`] when its identifier
/// does not fit in an `i64`.
pub fn adapt<T: Entity>(value: &mut T) -> Result<StructRecord<'_, T>, AdaptError> {
    check_aggregate(&*value)?;
    let id = value.identifier()?;
    Ok(StructRecord {
        target: Target::Exclusive(value),
        kind: T::entity_kind(),
        id,
    })
}

/// Read-only variant of [`adapt`]: the identifier assigned on save is not
/// written back and hooks are skipped.
pub fn adapt_ref<T: Entity>(value: &T) -> Result<StructRecord<'_, T>, AdaptError> {
    check_aggregate(value)?;
    Ok(StructRecord {
        target: Target::Shared(value),
        kind: T::entity_kind(),
        id: value.identifier()?,
    })
}
