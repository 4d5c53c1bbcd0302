//! Conversion of primitive values between their stored forms.
//!
//! Each [`ValueType`] knows how to turn a [`PrimitiveValue`]
//! (raw bytes or a decoded native form) into bytes, strings,
//! integers or floating point numbers.
//! Binary value types read and write their components
//! in the byte order of the data set;
//! string value types decode text through the specific character set.

use crate::text::SpecificCharacterSet;
use byteordered::{ByteOrdered, Endianness};
use dicom_attrs_core::value::numeric::{
    format_ds, format_is, parse_ds, parse_ds_values, parse_is_values, IS_UNPARSEABLE,
};
use dicom_attrs_core::value::{PrimitiveValue, ValueType, C};
use num_traits::NumCast;
use snafu::{Backtrace, OptionExt, ResultExt, Snafu};

/// An error converting a value to another representation.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// The value type has no such representation.
    #[snafu(display("Cannot convert {:?} value to {}", value_type, requested))]
    UnsupportedOperation {
        value_type: ValueType,
        requested: &'static str,
        backtrace: Backtrace,
    },
    /// The stored value does not hold a valid value of its type.
    #[snafu(display("Malformed {:?} value: {}", value_type, message))]
    MalformedValue {
        value_type: ValueType,
        message: String,
        backtrace: Backtrace,
    },
    /// Writing a binary component failed.
    #[snafu(display("Could not write {:?} value", value_type))]
    WriteBinary {
        value_type: ValueType,
        source: std::io::Error,
        backtrace: Backtrace,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The byte order of a data set.
pub fn endianness(big_endian: bool) -> Endianness {
    if big_endian {
        Endianness::Big
    } else {
        Endianness::Little
    }
}

/// A converter of primitive values, implemented by each value type.
pub trait ValueCodec: Copy {
    /// Encode the value to bytes, without padding.
    fn to_bytes(
        self,
        value: &PrimitiveValue,
        big_endian: bool,
        cs: &SpecificCharacterSet,
    ) -> Result<Vec<u8>>;

    /// Obtain the string form of each component.
    fn to_strings(
        self,
        value: &PrimitiveValue,
        big_endian: bool,
        cs: &SpecificCharacterSet,
    ) -> Result<C<String>>;

    /// Obtain each component as a 32-bit integer.
    fn to_ints(self, value: &PrimitiveValue, big_endian: bool) -> Result<C<i32>>;

    /// Obtain each component as a 64-bit integer.
    fn to_longs(self, value: &PrimitiveValue, big_endian: bool) -> Result<C<i64>>;

    /// Obtain each component as a double precision number.
    fn to_doubles(self, value: &PrimitiveValue, big_endian: bool) -> Result<C<f64>>;

    /// Obtain each component as a single precision number.
    fn to_floats(self, value: &PrimitiveValue, big_endian: bool) -> Result<C<f32>> {
        Ok(self
            .to_doubles(value, big_endian)?
            .into_iter()
            .map(|v| v as f32)
            .collect())
    }

    /// Swap the byte order of every component of a raw value in place.
    fn toggle_endian(self, bytes: &mut [u8]);
}

/// The decoded value of a single binary component.
#[derive(Debug, Clone, Copy)]
enum Scalar {
    Int(i64),
    Float(f64),
}

impl Scalar {
    fn as_i64(self) -> i64 {
        match self {
            Scalar::Int(v) => v,
            Scalar::Float(v) => v as i64,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Scalar::Int(v) => v as f64,
            Scalar::Float(v) => v,
        }
    }
}

fn read_binary(vt: ValueType, bytes: &[u8], big_endian: bool) -> Result<Vec<Scalar>> {
    let size = vt.element_size();
    if size == 0 {
        return UnsupportedOperationSnafu {
            value_type: vt,
            requested: "binary components",
        }
        .fail();
    }
    if bytes.len() % size != 0 {
        return MalformedValueSnafu {
            value_type: vt,
            message: format!("length {} is not a multiple of {}", bytes.len(), size),
        }
        .fail();
    }
    let mut reader = ByteOrdered::runtime(bytes, endianness(big_endian));
    let io = |e: std::io::Error| {
        MalformedValueSnafu {
            value_type: vt,
            message: e.to_string(),
        }
        .build()
    };
    let n = bytes.len() / size;
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        let v = match vt {
            ValueType::Byte => Scalar::Int(<i64 as From<_>>::from(reader.read_u8().map_err(io)?)),
            ValueType::Short => Scalar::Int(<i64 as From<_>>::from(reader.read_i16().map_err(io)?)),
            ValueType::UShort => Scalar::Int(<i64 as From<_>>::from(reader.read_u16().map_err(io)?)),
            ValueType::Int => Scalar::Int(<i64 as From<_>>::from(reader.read_i32().map_err(io)?)),
            ValueType::UInt => Scalar::Int(<i64 as From<_>>::from(reader.read_u32().map_err(io)?)),
            ValueType::Tag => {
                let group = reader.read_u16().map_err(io)?;
                let element = reader.read_u16().map_err(io)?;
                Scalar::Int(<i64 as From<_>>::from((<u32 as From<_>>::from(group) << 16) | <u32 as From<_>>::from(element)))
            }
            ValueType::Long => Scalar::Int(reader.read_i64().map_err(io)?),
            ValueType::ULong => Scalar::Int(reader.read_u64().map_err(io)? as i64),
            ValueType::Float => Scalar::Float(<f64 as From<_>>::from(reader.read_f32().map_err(io)?)),
            ValueType::Double => Scalar::Float(reader.read_f64().map_err(io)?),
            _ => {
                return UnsupportedOperationSnafu {
                    value_type: vt,
                    requested: "binary components",
                }
                .fail()
            }
        };
        out.push(v);
    }
    Ok(out)
}

fn write_binary<I>(vt: ValueType, values: I, big_endian: bool) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = Scalar>,
{
    let mut out = Vec::new();
    let mut writer = ByteOrdered::runtime(&mut out, endianness(big_endian));
    for v in values {
        match vt {
            ValueType::Byte => writer.write_u8(v.as_i64() as u8),
            ValueType::Short => writer.write_i16(v.as_i64() as i16),
            ValueType::UShort => writer.write_u16(v.as_i64() as u16),
            ValueType::Int => writer.write_i32(v.as_i64() as i32),
            ValueType::UInt => writer.write_u32(v.as_i64() as u32),
            ValueType::Tag => {
                let tag = v.as_i64() as u32;
                writer
                    .write_u16((tag >> 16) as u16)
                    .and_then(|_| writer.write_u16(tag as u16))
            }
            ValueType::Long => writer.write_i64(v.as_i64()),
            ValueType::ULong => writer.write_u64(v.as_i64() as u64),
            ValueType::Float => writer.write_f32(v.as_f64() as f32),
            ValueType::Double => writer.write_f64(v.as_f64()),
            _ => Ok(()),
        }
        .context(WriteBinarySnafu { value_type: vt })?;
    }
    Ok(out)
}

/// Parse a string component of a binary value type.
fn parse_scalar(vt: ValueType, text: &str) -> Result<Scalar> {
    let text = text.trim();
    let parsed = match vt {
        ValueType::Float | ValueType::Double => parse_ds(text).map(Scalar::Float),
        ValueType::Tag => u32::from_str_radix(text, 16).ok().map(|t| Scalar::Int(t.into())),
        _ => text.parse::<i64>().ok().map(Scalar::Int),
    };
    parsed.context(MalformedValueSnafu {
        value_type: vt,
        message: format!("`{}` is not a number", text),
    })
}

fn native_scalars(value: &PrimitiveValue) -> Option<Vec<Scalar>> {
    Some(match value {
        PrimitiveValue::Ints(v) => v.iter().map(|&v| Scalar::Int(v.into())).collect(),
        PrimitiveValue::Longs(v) => v.iter().map(|&v| Scalar::Int(v)).collect(),
        PrimitiveValue::Floats(v) => v.iter().map(|&v| Scalar::Float(v.into())).collect(),
        PrimitiveValue::Doubles(v) => v.iter().map(|&v| Scalar::Float(v)).collect(),
        _ => return None,
    })
}

fn binary_scalars(vt: ValueType, value: &PrimitiveValue, big_endian: bool) -> Result<Vec<Scalar>> {
    match value {
        PrimitiveValue::Empty => Ok(Vec::new()),
        PrimitiveValue::Bytes(bytes) => read_binary(vt, bytes, big_endian),
        PrimitiveValue::Strs(strs) => strs.iter().map(|s| parse_scalar(vt, s)).collect(),
        other => Ok(native_scalars(other).unwrap_or_default()),
    }
}

fn format_scalar(vt: ValueType, v: Scalar) -> String {
    match (vt, v) {
        (ValueType::Tag, v) => format!("{:08X}", v.as_i64() as u32),
        (_, Scalar::Int(v)) => v.to_string(),
        (_, Scalar::Float(v)) => format_ds(v),
    }
}

/// Split decoded text into its components,
/// trimming the padding of each one.
pub fn split_text(vt: ValueType, text: &str) -> C<String> {
    let trim = |s: &str| -> String {
        let s = s.trim_end_matches(|c: char| c == ' ' || c == '\0');
        if vt.trims_leading_spaces() {
            s.trim_start_matches(' ').to_owned()
        } else {
            s.to_owned()
        }
    };
    if text.trim_matches(|c: char| c == ' ' || c == '\0').is_empty() {
        return C::new();
    }
    if vt.is_multi_valued() {
        text.split('\\').map(trim).collect()
    } else {
        std::iter::once(trim(text)).collect()
    }
}

fn charset_for(vt: ValueType, cs: &SpecificCharacterSet) -> &SpecificCharacterSet {
    if vt.uses_specific_character_set() {
        cs
    } else {
        SpecificCharacterSet::default_ref()
    }
}

fn string_components(
    vt: ValueType,
    value: &PrimitiveValue,
    cs: &SpecificCharacterSet,
) -> C<String> {
    match value {
        PrimitiveValue::Empty => C::new(),
        PrimitiveValue::Bytes(bytes) => {
            let text = charset_for(vt, cs).decode(bytes, vt.delimiters());
            split_text(vt, &text)
        }
        PrimitiveValue::Strs(strs) => strs.clone(),
        PrimitiveValue::Ints(v) => v.iter().map(|&v| format_is(v.into())).collect(),
        PrimitiveValue::Longs(v) => v.iter().map(|&v| format_is(v)).collect(),
        PrimitiveValue::Floats(v) => v.iter().map(|&v| format_ds(v.into())).collect(),
        PrimitiveValue::Doubles(v) => v.iter().map(|&v| format_ds(v)).collect(),
    }
}

fn cast<T: NumCast, U: NumCast + Copy>(vt: ValueType, v: U) -> Result<T> {
    T::from(v).context(MalformedValueSnafu {
        value_type: vt,
        message: "component out of range".to_owned(),
    })
}

impl ValueCodec for ValueType {
    fn to_bytes(
        self,
        value: &PrimitiveValue,
        big_endian: bool,
        cs: &SpecificCharacterSet,
    ) -> Result<Vec<u8>> {
        if let PrimitiveValue::Bytes(bytes) = value {
            return Ok(bytes.clone());
        }
        if value.is_empty() {
            return Ok(Vec::new());
        }
        if self.is_binary() {
            let scalars = binary_scalars(self, value, big_endian)?;
            return write_binary(self, scalars, big_endian);
        }
        if self.is_sequence() {
            return UnsupportedOperationSnafu {
                value_type: self,
                requested: "bytes",
            }
            .fail();
        }
        let strs = string_components(self, value, cs);
        let text = if self.is_multi_valued() {
            strs.join("\\")
        } else {
            strs.into_iter().next().unwrap_or_default()
        };
        Ok(charset_for(self, cs).encode(&text, self.delimiters()))
    }

    fn to_strings(
        self,
        value: &PrimitiveValue,
        big_endian: bool,
        cs: &SpecificCharacterSet,
    ) -> Result<C<String>> {
        if self.is_sequence() {
            return UnsupportedOperationSnafu {
                value_type: self,
                requested: "strings",
            }
            .fail();
        }
        if self.is_binary() {
            return match value {
                PrimitiveValue::Strs(strs) => Ok(strs.clone()),
                _ => Ok(binary_scalars(self, value, big_endian)?
                    .into_iter()
                    .map(|v| format_scalar(self, v))
                    .collect()),
            };
        }
        Ok(string_components(self, value, cs))
    }

    fn to_ints(self, value: &PrimitiveValue, big_endian: bool) -> Result<C<i32>> {
        if self.is_binary() {
            return binary_scalars(self, value, big_endian)?
                .into_iter()
                .map(|v| match (self, v) {
                    // unsigned 32-bit values and tags keep their bit pattern
                    (ValueType::UInt | ValueType::Tag, Scalar::Int(v)) => Ok(v as i32),
                    (_, Scalar::Int(v)) => cast(self, v),
                    (_, Scalar::Float(v)) => cast(self, v),
                })
                .collect();
        }
        match (self, value) {
            (_, PrimitiveValue::Ints(v)) => Ok(v.clone()),
            (ValueType::Is, _) | (ValueType::Ds, _) => {
                let strs = string_components(self, value, SpecificCharacterSet::default_ref());
                Ok(if self == ValueType::Is {
                    parse_is_values(strs.iter().map(String::as_str)).into_iter().collect()
                } else {
                    parse_ds_values(strs.iter().map(String::as_str))
                        .into_iter()
                        .map(|v| <i32 as NumCast>::from(v).unwrap_or(IS_UNPARSEABLE))
                        .collect()
                })
            }
            _ => UnsupportedOperationSnafu {
                value_type: self,
                requested: "integers",
            }
            .fail(),
        }
    }

    fn to_longs(self, value: &PrimitiveValue, big_endian: bool) -> Result<C<i64>> {
        if self.is_binary() {
            return binary_scalars(self, value, big_endian)?
                .into_iter()
                .map(|v| match v {
                    Scalar::Int(v) => Ok(v),
                    Scalar::Float(v) => cast(self, v),
                })
                .collect();
        }
        match (self, value) {
            (_, PrimitiveValue::Longs(v)) => Ok(v.clone()),
            (_, PrimitiveValue::Ints(v)) => Ok(v.iter().map(|&v| <i64 as From<_>>::from(v)).collect()),
            (ValueType::Is, _) => {
                let strs = string_components(self, value, SpecificCharacterSet::default_ref());
                Ok(strs
                    .iter()
                    .map(|s| {
                        dicom_attrs_core::value::numeric::parse_is(s)
                            .unwrap_or_else(|| <i64 as From<_>>::from(IS_UNPARSEABLE))
                    })
                    .collect())
            }
            (ValueType::Ds, _) => Ok(self
                .to_doubles(value, big_endian)?
                .into_iter()
                .map(|v| <i64 as NumCast>::from(v).unwrap_or(i64::MIN))
                .collect()),
            _ => UnsupportedOperationSnafu {
                value_type: self,
                requested: "long integers",
            }
            .fail(),
        }
    }

    fn to_doubles(self, value: &PrimitiveValue, big_endian: bool) -> Result<C<f64>> {
        if self.is_binary() {
            return Ok(binary_scalars(self, value, big_endian)?
                .into_iter()
                .map(Scalar::as_f64)
                .collect());
        }
        match (self, value) {
            (_, PrimitiveValue::Doubles(v)) => Ok(v.clone()),
            (_, PrimitiveValue::Floats(v)) => Ok(v.iter().map(|&v| <f64 as From<_>>::from(v)).collect()),
            (ValueType::Ds, _) | (ValueType::Is, _) => {
                let strs = string_components(self, value, SpecificCharacterSet::default_ref());
                Ok(parse_ds_values(strs.iter().map(String::as_str))
                    .into_iter()
                    .collect())
            }
            _ => UnsupportedOperationSnafu {
                value_type: self,
                requested: "floating point numbers",
            }
            .fail(),
        }
    }

    fn toggle_endian(self, bytes: &mut [u8]) {
        let unit = match self {
            ValueType::Tag => 2,
            other => other.element_size(),
        };
        if unit > 1 {
            for chunk in bytes.chunks_exact_mut(unit) {
                chunk.reverse();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_attrs_core::smallvec::smallvec;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn cs() -> &'static SpecificCharacterSet {
        SpecificCharacterSet::default_ref()
    }

    #[test]
    fn decimal_string_components() {
        let value = PrimitiveValue::Bytes(b"3.14\\-2.5 ".to_vec());
        assert_eq!(ValueType::Ds.to_doubles(&value, false).unwrap().as_slice(), &[3.14, -2.5]);
        let text = ValueType::Ds
            .to_bytes(&PrimitiveValue::Doubles(smallvec![3.14, -2.5]), false, cs())
            .unwrap();
        assert_eq!(text, b"3.14\\-2.5");
    }

    #[test]
    fn empty_decimal_string_has_no_components() {
        let value = PrimitiveValue::Bytes(b" ".to_vec());
        let doubles = ValueType::Ds.to_doubles(&value, false).unwrap();
        assert!(doubles.is_empty());
    }

    #[test]
    fn unparseable_integer_string_component() {
        let value = PrimitiveValue::from_strs(["1", "abc", "3"]);
        let ints = ValueType::Is.to_ints(&value, false).unwrap();
        assert_eq!(ints.as_slice(), &[1, IS_UNPARSEABLE, 3]);
    }

    #[rstest]
    #[case(ValueType::UShort, &[0x01, 0x02], false, 0x0201)]
    #[case(ValueType::UShort, &[0x01, 0x02], true, 0x0102)]
    #[case(ValueType::Short, &[0xFF, 0xFF], false, -1)]
    #[case(ValueType::UInt, &[0xFF, 0xFF, 0xFF, 0xFF], false, -1)]
    #[case(ValueType::Tag, &[0x10, 0x00, 0x20, 0x00], false, 0x0010_0020)]
    fn binary_ints(
        #[case] vt: ValueType,
        #[case] bytes: &[u8],
        #[case] big_endian: bool,
        #[case] expected: i32,
    ) {
        let value = PrimitiveValue::Bytes(bytes.to_vec());
        assert_eq!(vt.to_ints(&value, big_endian).unwrap().as_slice(), &[expected]);
    }

    #[test]
    fn tag_strings() {
        let value = PrimitiveValue::Ints(smallvec![0x0010_0020]);
        assert_eq!(
            ValueType::Tag.to_strings(&value, false, cs()).unwrap().as_slice(),
            &["00100020".to_owned()]
        );
        let bytes = ValueType::Tag
            .to_bytes(&PrimitiveValue::from_strs(["00100020"]), true, cs())
            .unwrap();
        assert_eq!(bytes, [0x00, 0x10, 0x00, 0x20]);
    }

    #[test]
    fn binary_components_follow_the_byte_order() {
        let value = PrimitiveValue::from_strs(["1", "513"]);
        assert_eq!(
            ValueType::UShort.to_bytes(&value, false, cs()).unwrap(),
            [1, 0, 1, 2]
        );
        assert_eq!(
            ValueType::UShort.to_bytes(&value, true, cs()).unwrap(),
            [0, 1, 2, 1]
        );
        let value = PrimitiveValue::from_strs(["-2"]);
        assert_eq!(
            ValueType::Int.to_bytes(&value, true, cs()).unwrap(),
            [0xFF, 0xFF, 0xFF, 0xFE]
        );
    }

    #[test]
    fn toggle_endian_swaps_components() {
        let mut bytes = [1, 2, 3, 4];
        ValueType::UInt.toggle_endian(&mut bytes);
        assert_eq!(bytes, [4, 3, 2, 1]);
        let mut bytes = [1, 2, 3, 4];
        ValueType::Tag.toggle_endian(&mut bytes);
        assert_eq!(bytes, [2, 1, 4, 3]);
        let mut bytes = [1, 2];
        ValueType::Byte.toggle_endian(&mut bytes);
        assert_eq!(bytes, [1, 2]);
    }

    #[test]
    fn strings_are_trimmed_and_split() {
        let value = PrimitiveValue::Bytes(b" ABC\\DEF ".to_vec());
        assert_eq!(
            ValueType::Ascii.to_strings(&value, false, cs()).unwrap().as_slice(),
            &["ABC".to_owned(), "DEF".to_owned()]
        );
        let value = PrimitiveValue::Bytes(b" line\\one ".to_vec());
        assert_eq!(
            ValueType::Text.to_strings(&value, false, cs()).unwrap().as_slice(),
            &[" line\\one".to_owned()]
        );
        let value = PrimitiveValue::Bytes(b"1.2.3\0".to_vec());
        assert_eq!(
            ValueType::Ascii.to_strings(&value, false, cs()).unwrap().as_slice(),
            &["1.2.3".to_owned()]
        );
    }

    #[test]
    fn unsupported_conversions() {
        let value = PrimitiveValue::from_strs(["DOE^JOHN"]);
        assert!(matches!(
            ValueType::Pn.to_ints(&value, false),
            Err(Error::UnsupportedOperation { .. })
        ));
        assert!(ValueType::Sequence.to_strings(&value, false, cs()).is_err());
        let value = PrimitiveValue::Bytes(vec![1, 2, 3]);
        assert!(matches!(
            ValueType::UShort.to_ints(&value, false),
            Err(Error::MalformedValue { .. })
        ));
    }
}
