#![crate_type = "lib"]
#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(
    missing_debug_implementations,
    unused_qualifications,
    unused_import_braces
)]

//! This is the core library of the attribute set model,
//! containing the concepts and data structures which do not depend
//! on character sets or on the attribute container itself.
//!
//! The current structure of this crate is as follows:
//!
//! - [`header`] comprises the data types of a data element header:
//!   tags, value representations, lengths and private tag arithmetic.
//! - [`value`] holds primitive values, the value type of each VR,
//!   and the string codecs for numbers, dates, times, ranges and person names.
//! - [`selector`] describes paths into nested attribute sets.
//! - [`dictionary`] describes data element dictionaries
//!   and the registry of standard and private dictionaries.
//! - [`tags`] lists constants for the standard elements used by this library.

pub mod dictionary;
pub mod header;
pub mod selector;
pub mod tags;
pub mod value;

pub use dictionary::{DataDictionary, DictionaryRegistry, TableDictionary};
pub use header::{Length, Tag, VR};
pub use selector::{AttributeSelector, ItemPointer, ValueSelector};
pub use value::{PrimitiveValue, ValueType, C};

// re-export crates that are part of the public API
pub use chrono;
pub use smallvec;
