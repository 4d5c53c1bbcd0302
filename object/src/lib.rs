#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(
    missing_debug_implementations,
    unused_qualifications,
    unused_import_braces
)]
#![allow(clippy::derive_partial_eq_without_eq)]
//! This crate contains the in-memory attribute set of a DICOM object.
//!
//! An [`Attributes`] value is a set of data elements sorted by tag,
//! in which sequences hold nested attribute sets.
//! Values are kept as they were read or set, and converted on access
//! according to their value representation, the byte order of the set
//! and its Specific Character Set.
//!
//! # Examples
//!
//! Build a data set and read typed values back:
//!
//! ```
//! use dicom_attrs_core::{tags, VR};
//! use dicom_attrs_object::Attributes;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut attrs = Attributes::new();
//! attrs.set_string(tags::PATIENT_ID, VR::LO, "123")?;
//! attrs.set_string(tags::PIXEL_SPACING, VR::DS, "0.5\\0.25")?;
//!
//! assert_eq!(attrs.get_string(tags::PATIENT_ID).as_deref(), Some("123"));
//! assert_eq!(attrs.get_double_at(tags::PIXEL_SPACING, 1), Some(0.25));
//! # Ok(())
//! # }
//! ```
//!
//! Private elements are addressed by their creator,
//! whichever block the creator was given:
//!
//! ```
//! use dicom_attrs_core::{Tag, VR};
//! use dicom_attrs_object::Attributes;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut attrs = Attributes::new();
//! attrs.set_string(("ACME 1.0", Tag(0x0041, 0x1001)), VR::LO, "x")?;
//! assert_eq!(attrs.tags(), &[Tag(0x0041, 0x0010), Tag(0x0041, 0x1001)]);
//! assert_eq!(attrs.get_string(("ACME 1.0", Tag(0x0041, 0x1001))).as_deref(), Some("x"));
//! # Ok(())
//! # }
//! ```
//!
//! Data sets are encoded with a [`DicomWriter`](dicom_attrs_encoding::DicomWriter)
//! and decoded with a [`DicomReader`](dicom_attrs_encoding::DicomReader):
//!
//! ```
//! use dicom_attrs_core::{tags, DictionaryRegistry, VR};
//! use dicom_attrs_encoding::{DicomReader, EncodeOptions};
//! use dicom_attrs_object::Attributes;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut attrs = Attributes::new();
//! attrs.set_string(tags::PATIENT_ID, VR::LO, "123")?;
//! let bytes = attrs.to_bytes(true, false, EncodeOptions::default())?;
//!
//! let mut reader = DicomReader::explicit_le(&bytes[..]);
//! let read = Attributes::read_from(&mut reader, &DictionaryRegistry::new())?;
//! assert_eq!(read, attrs);
//! # Ok(())
//! # }
//! ```

pub mod attributes;
pub mod code;
pub mod coercion;
pub mod fragments;
pub mod iod;
pub mod issuer;
pub mod sequence;
pub mod validation;
pub mod value;

pub use attributes::{
    Attributes, AttributesVisitor, CopyMode, ElementKey, ReadError, Selection, WriteError,
};
pub use code::Code;
pub use coercion::{AttributesCoercion, MergeAttributes, NullifyAttributes, RemapUids};
pub use fragments::Fragments;
pub use iod::Iod;
pub use issuer::{IDWithIssuer, Issuer};
pub use sequence::Sequence;
pub use validation::ValidationResult;
pub use value::Value;

// re-export crates that are part of the public API
pub use dicom_attrs_core;
pub use dicom_attrs_encoding;
