//! Value types shared by every attribute set:
//! the primitive value storage, the value type classification of each VR,
//! and the parsing and formatting of numeric and temporal strings.

use smallvec::SmallVec;

pub mod numeric;
pub mod person_name;
pub mod range;
pub mod temporal;

pub use self::person_name::{PersonName, PersonNameComponent, PersonNameGroup};
pub use self::range::DateRange;
pub use self::temporal::{DateField, DatePrecision};

/// An aggregation of one or more elements in a value.
pub type C<T> = SmallVec<[T; 2]>;

/// The conversion class of a value representation.
///
/// Every VR maps to exactly one value type,
/// which defines how stored values are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Raw bytes (OB, UN).
    Byte,
    /// Signed 16-bit integers (SS).
    Short,
    /// Unsigned 16-bit integers (US, OW).
    UShort,
    /// Signed 32-bit integers (SL).
    Int,
    /// Unsigned 32-bit integers (UL, OL).
    UInt,
    /// Attribute tags, as pairs of unsigned 16-bit integers (AT).
    Tag,
    /// Signed 64-bit integers (SV).
    Long,
    /// Unsigned 64-bit integers (UV, OV).
    ULong,
    /// Single precision floating point numbers (FL, OF).
    Float,
    /// Double precision floating point numbers (FD, OD).
    Double,
    /// Strings restricted to the default repertoire (AE, AS, CS, UI).
    Ascii,
    /// Multi-valued strings in the specific character set (LO, SH, UC).
    String,
    /// Single-valued text in the specific character set (LT, ST, UT).
    Text,
    /// A single URI or URL (UR).
    Ur,
    /// Dates (DA).
    Da,
    /// Date-times (DT).
    Dt,
    /// Times (TM).
    Tm,
    /// Person names (PN).
    Pn,
    /// Decimal strings (DS).
    Ds,
    /// Integer strings (IS).
    Is,
    /// Sequences of items (SQ).
    Sequence,
}

impl ValueType {
    /// Whether values of this type are stored as text.
    pub fn is_string(self) -> bool {
        use ValueType::*;
        matches!(self, Ascii | String | Text | Ur | Da | Dt | Tm | Pn | Ds | Is)
    }

    /// Whether values of this type are fixed-width binary numbers.
    pub fn is_binary(self) -> bool {
        self.element_size() != 0
    }

    /// Whether this is the sequence value type.
    pub fn is_sequence(self) -> bool {
        self == ValueType::Sequence
    }

    /// The number of bytes per component for binary value types,
    /// or 0 for all other value types.
    pub fn element_size(self) -> usize {
        use ValueType::*;
        match self {
            Byte => 1,
            Short | UShort => 2,
            Int | UInt | Tag | Float => 4,
            Long | ULong | Double => 8,
            _ => 0,
        }
    }

    /// Whether values of this type have an integer interpretation.
    pub fn is_int_type(self) -> bool {
        use ValueType::*;
        matches!(self, Byte | Short | UShort | Int | UInt | Tag | Long | ULong | Is)
    }

    /// Whether values of this type have a floating point interpretation.
    pub fn is_float_type(self) -> bool {
        matches!(self, ValueType::Float | ValueType::Double | ValueType::Ds)
    }

    /// Whether values of this type are dates or times.
    pub fn is_temporal(self) -> bool {
        matches!(self, ValueType::Da | ValueType::Dt | ValueType::Tm)
    }

    /// Whether the text of this type is subject to
    /// the Specific Character Set of the data set.
    pub fn uses_specific_character_set(self) -> bool {
        matches!(self, ValueType::String | ValueType::Text | ValueType::Pn)
    }

    /// Whether a value of this type may have more than one component.
    pub fn is_multi_valued(self) -> bool {
        !matches!(self, ValueType::Text | ValueType::Ur | ValueType::Sequence)
    }

    /// The characters which reset the state of an ISO 2022 decoder
    /// when found in text of this type.
    pub fn delimiters(self) -> &'static str {
        match self {
            ValueType::Pn => "^=\\",
            ValueType::Text => "\r\n\t\u{c}",
            ValueType::Ur | ValueType::Sequence => "",
            _ => "\\",
        }
    }

    /// Whether leading spaces are insignificant in text of this type.
    pub fn trims_leading_spaces(self) -> bool {
        use ValueType::*;
        matches!(self, Ascii | String | Da | Dt | Tm | Ds | Is | Ur)
    }
}

/// A primitive value of a data element, either undecoded or decoded.
///
/// Values read from a source are kept as raw bytes in the byte order
/// of their data set and decoded on access.
/// Values set through the typed setters are kept in their native form.
/// The empty value is distinct from an absent element.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PrimitiveValue {
    /// The empty value (zero length).
    #[default]
    Empty,
    /// Raw bytes, as found in the encoded data set.
    Bytes(Vec<u8>),
    /// A sequence of strings.
    Strs(C<String>),
    /// A sequence of 32-bit integers.
    Ints(C<i32>),
    /// A sequence of 64-bit integers.
    Longs(C<i64>),
    /// A sequence of single precision floating point numbers.
    Floats(C<f32>),
    /// A sequence of double precision floating point numbers.
    Doubles(C<f64>),
}

impl PrimitiveValue {
    /// Create a value from raw bytes,
    /// normalizing a zero-length buffer to the empty value.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        if bytes.is_empty() {
            PrimitiveValue::Empty
        } else {
            PrimitiveValue::Bytes(bytes)
        }
    }

    /// Create a value from strings,
    /// normalizing a lack of strings or a single empty string to the empty value.
    pub fn from_strs<I, S>(strings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let strs: C<String> = strings.into_iter().map(Into::into).collect();
        if strs.is_empty() || (strs.len() == 1 && strs[0].is_empty()) {
            PrimitiveValue::Empty
        } else {
            PrimitiveValue::Strs(strs)
        }
    }

    /// Whether this is the empty value.
    pub fn is_empty(&self) -> bool {
        match self {
            PrimitiveValue::Empty => true,
            PrimitiveValue::Bytes(b) => b.is_empty(),
            PrimitiveValue::Strs(v) => v.is_empty(),
            PrimitiveValue::Ints(v) => v.is_empty(),
            PrimitiveValue::Longs(v) => v.is_empty(),
            PrimitiveValue::Floats(v) => v.is_empty(),
            PrimitiveValue::Doubles(v) => v.is_empty(),
        }
    }

    /// Whether this value still holds undecoded bytes.
    pub fn is_bytes(&self) -> bool {
        matches!(self, PrimitiveValue::Bytes(_))
    }

    /// Whether this value holds decoded strings.
    pub fn is_strs(&self) -> bool {
        matches!(self, PrimitiveValue::Strs(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::VR;

    #[test]
    fn empty_values_are_normalized() {
        assert_eq!(PrimitiveValue::from_bytes(vec![]), PrimitiveValue::Empty);
        assert_eq!(PrimitiveValue::from_strs(Vec::<String>::new()), PrimitiveValue::Empty);
        assert_eq!(PrimitiveValue::from_strs([""]), PrimitiveValue::Empty);
        assert!(!PrimitiveValue::from_strs(["", ""]).is_empty());
        assert!(PrimitiveValue::Ints(C::new()).is_empty());
    }

    #[test]
    fn value_type_classification() {
        assert!(VR::PN.value_type().uses_specific_character_set());
        assert!(!VR::UI.value_type().uses_specific_character_set());
        assert!(!VR::LT.is_multi_valued());
        assert!(VR::DS.is_multi_valued());
        assert_eq!(VR::PN.value_type().delimiters(), "^=\\");
        assert_eq!(VR::FD.value_type().element_size(), 8);
        assert!(VR::IS.value_type().is_int_type());
        assert!(VR::TM.is_temporal());
    }
}
