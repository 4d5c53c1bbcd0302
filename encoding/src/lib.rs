#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(
    missing_debug_implementations,
    unused_qualifications,
    unused_import_braces
)]
//! DICOM encoding and decoding primitives for attribute sets.
//!
//! This crate provides the character set handling of DICOM text
//! ([`text`]), the conversion of primitive values between bytes,
//! strings and numbers for every value type ([`convert`]),
//! and the low-level reading and writing of data element headers
//! and values ([`decode`] and [`encode`]).
//!
//! All APIs are based on synchronous I/O.

pub mod convert;
pub mod decode;
pub mod encode;
pub mod text;

pub use convert::ValueCodec;
pub use decode::{DicomReader, Header};
pub use encode::{DicomWriter, EncodeOptions};
pub use text::{Charset, SpecificCharacterSet, TextCodec};
