//! The values an attribute set can hold.

use crate::fragments::Fragments;
use crate::sequence::Sequence;
use dicom_attrs_core::header::{Length, VR};
use dicom_attrs_core::value::PrimitiveValue;
use dicom_attrs_encoding::convert::ValueCodec;
use dicom_attrs_encoding::encode::{self, padded_length, DicomWriter, EncodeOptions};
use dicom_attrs_encoding::SpecificCharacterSet;
use std::io::Write;
use tracing::warn;

/// The value of a data element.
///
/// The empty value, `Value::Primitive(PrimitiveValue::Empty)`,
/// marks an element which is present with a zero-length value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A primitive value, undecoded bytes or a native form.
    Primitive(PrimitiveValue),
    /// A sequence of items.
    Sequence(Sequence),
    /// Encapsulated fragments.
    Fragments(Fragments),
}

impl Default for Value {
    fn default() -> Self {
        Value::Primitive(PrimitiveValue::Empty)
    }
}

impl From<PrimitiveValue> for Value {
    fn from(value: PrimitiveValue) -> Self {
        Value::Primitive(value)
    }
}

impl From<Sequence> for Value {
    fn from(value: Sequence) -> Self {
        Value::Sequence(value)
    }
}

impl From<Fragments> for Value {
    fn from(value: Fragments) -> Self {
        Value::Fragments(value)
    }
}

impl Value {
    /// The empty value.
    pub const EMPTY: Value = Value::Primitive(PrimitiveValue::Empty);

    /// Whether this is a primitive value.
    pub fn primitive(&self) -> Option<&PrimitiveValue> {
        match self {
            Value::Primitive(v) => Some(v),
            _ => None,
        }
    }

    pub fn sequence(&self) -> Option<&Sequence> {
        match self {
            Value::Sequence(v) => Some(v),
            _ => None,
        }
    }

    pub fn sequence_mut(&mut self) -> Option<&mut Sequence> {
        match self {
            Value::Sequence(v) => Some(v),
            _ => None,
        }
    }

    pub fn fragments(&self) -> Option<&Fragments> {
        match self {
            Value::Fragments(v) => Some(v),
            _ => None,
        }
    }

    pub fn fragments_mut(&mut self) -> Option<&mut Fragments> {
        match self {
            Value::Fragments(v) => Some(v),
            _ => None,
        }
    }
}

/// The encoding parameters of the data set a value belongs to.
#[derive(Debug, Clone, Copy)]
pub struct EncodeContext<'a> {
    pub explicit_vr: bool,
    pub big_endian: bool,
    pub options: EncodeOptions,
    pub charset: &'a SpecificCharacterSet,
}

/// The capability of a value to be written to a sink.
///
/// Lengths are computed before anything is written,
/// so that definite lengths can be emitted in element headers.
pub trait EncodeValue {
    /// Whether this value is empty.
    fn is_empty(&self) -> bool;

    /// The number of bytes written by [`write_value`](EncodeValue::write_value),
    /// delimitation items included.
    fn calc_length(&self, vr: VR, ctx: &EncodeContext<'_>) -> u32;

    /// The value of the length field of the element header.
    fn length_field(&self, vr: VR, ctx: &EncodeContext<'_>) -> Length;

    /// Write the encoded value.
    fn write_value<W: Write>(
        &self,
        vr: VR,
        out: &mut DicomWriter<W>,
        ctx: &EncodeContext<'_>,
    ) -> encode::Result<()>;
}

/// Encode a primitive value, logging and writing an empty value
/// if it cannot be represented in its VR.
pub(crate) fn primitive_bytes(value: &PrimitiveValue, vr: VR, ctx: &EncodeContext<'_>) -> Vec<u8> {
    match vr
        .value_type()
        .to_bytes(value, ctx.big_endian, ctx.charset)
    {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Writing empty {} value: {}", vr, e);
            Vec::new()
        }
    }
}

impl EncodeValue for PrimitiveValue {
    fn is_empty(&self) -> bool {
        PrimitiveValue::is_empty(self)
    }

    fn calc_length(&self, vr: VR, ctx: &EncodeContext<'_>) -> u32 {
        match self {
            PrimitiveValue::Empty => 0,
            PrimitiveValue::Bytes(bytes) => padded_length(bytes.len()),
            _ => padded_length(primitive_bytes(self, vr, ctx).len()),
        }
    }

    fn length_field(&self, vr: VR, ctx: &EncodeContext<'_>) -> Length {
        Length(self.calc_length(vr, ctx))
    }

    fn write_value<W: Write>(
        &self,
        vr: VR,
        out: &mut DicomWriter<W>,
        ctx: &EncodeContext<'_>,
    ) -> encode::Result<()> {
        match self {
            PrimitiveValue::Empty => Ok(()),
            PrimitiveValue::Bytes(bytes) => out.write_value(vr, bytes),
            _ => out.write_value(vr, &primitive_bytes(self, vr, ctx)),
        }
    }
}

impl EncodeValue for Value {
    fn is_empty(&self) -> bool {
        match self {
            Value::Primitive(v) => v.is_empty(),
            Value::Sequence(v) => v.is_empty(),
            Value::Fragments(v) => v.is_empty(),
        }
    }

    fn calc_length(&self, vr: VR, ctx: &EncodeContext<'_>) -> u32 {
        match self {
            Value::Primitive(v) => v.calc_length(vr, ctx),
            Value::Sequence(v) => v.calc_length(vr, ctx),
            Value::Fragments(v) => v.calc_length(vr, ctx),
        }
    }

    fn length_field(&self, vr: VR, ctx: &EncodeContext<'_>) -> Length {
        match self {
            Value::Primitive(v) => v.length_field(vr, ctx),
            Value::Sequence(v) => v.length_field(vr, ctx),
            Value::Fragments(v) => v.length_field(vr, ctx),
        }
    }

    fn write_value<W: Write>(
        &self,
        vr: VR,
        out: &mut DicomWriter<W>,
        ctx: &EncodeContext<'_>,
    ) -> encode::Result<()> {
        match self {
            Value::Primitive(v) => v.write_value(vr, out, ctx),
            Value::Sequence(v) => v.write_value(vr, out, ctx),
            Value::Fragments(v) => v.write_value(vr, out, ctx),
        }
    }
}
