//! Encoding data sets.
//!
//! Writing happens in two passes: the length of every element
//! is computed first, so that definite lengths and group lengths
//! can be emitted, then the elements are written in tag order.

use super::Attributes;
use crate::value::{EncodeValue, Value};
use dicom_attrs_core::value::PrimitiveValue;
use dicom_attrs_core::header::{Length, Tag, VR};
use dicom_attrs_encoding::encode::{self, header_length, DicomWriter, EncodeOptions};
use dicom_attrs_encoding::ValueCodec;
use snafu::{ResultExt, Snafu};
use std::io::Write;

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum WriteError {
    #[snafu(display("Could not write data set"))]
    Io {
        #[snafu(backtrace)]
        source: encode::Error,
    },
}

impl Attributes {
    /// The number of bytes [`write_to`](Attributes::write_to) produces
    /// for the elements of this data set.
    ///
    /// Group length elements held here are not counted,
    /// they are only written when `options` asks for them.
    pub fn calc_length(&self, options: EncodeOptions, explicit_vr: bool) -> u32 {
        let (total, groups) = self.element_lengths(options, explicit_vr);
        if options.group_length {
            // (gggg,0000) UL with a 4 byte value, in either VR mode
            total + 12 * groups.len() as u32
        } else {
            total
        }
    }

    /// The total length of the elements and the length of each group.
    fn element_lengths(&self, options: EncodeOptions, explicit_vr: bool) -> (u32, Vec<(u16, u32)>) {
        let ctx = self.encode_context(options, explicit_vr);
        let mut total = 0;
        let mut groups: Vec<(u16, u32)> = Vec::new();
        for (tag, vr, value) in self.iter() {
            if tag.is_group_length() {
                continue;
            }
            let len = header_length(vr, explicit_vr) + value.calc_length(vr, &ctx);
            match groups.last_mut() {
                Some((group, group_len)) if *group == tag.group() => *group_len += len,
                _ => groups.push((tag.group(), len)),
            }
            total += len;
        }
        (total, groups)
    }

    /// Write the elements of this data set, without any item header.
    pub(crate) fn write_elements<W: Write>(
        &self,
        out: &mut DicomWriter<W>,
        options: EncodeOptions,
    ) -> encode::Result<()> {
        let ctx = self.encode_context(options, out.is_explicit_vr());
        let groups = if options.group_length {
            self.element_lengths(options, out.is_explicit_vr()).1
        } else {
            Vec::new()
        };
        let mut groups = groups.into_iter().peekable();
        for (tag, vr, value) in self.iter() {
            if tag.is_group_length() {
                continue;
            }
            if let Some(&(group, group_len)) = groups.peek() {
                if group == tag.group() {
                    out.write_header(Tag(group, 0x0000), VR::UL, Length(4))?;
                    out.write_u32(group_len)?;
                    groups.next();
                }
            }
            out.write_header(tag, vr, value.length_field(vr, &ctx))?;
            value.write_value(vr, out, &ctx)?;
        }
        Ok(())
    }

    /// Write all elements of this data set.
    ///
    /// A data set whose byte order differs from the one of the writer
    /// is converted first. Elements keep their tags,
    /// so private blocks are written where they were reserved.
    pub fn write_to<W: Write>(&self, out: &mut DicomWriter<W>, options: EncodeOptions) -> Result<(), WriteError> {
        if out.is_big_endian() != self.big_endian {
            let mut converted = self.clone();
            converted.set_byte_order(out.is_big_endian());
            return converted.write_to(out, options);
        }
        self.write_elements(out, options).context(IoSnafu)?;
        out.flush().context(IoSnafu)
    }

    /// Swap the raw binary values of this data set and of its items
    /// to the given byte order.
    fn set_byte_order(&mut self, big_endian: bool) {
        if self.big_endian == big_endian {
            return;
        }
        self.big_endian = big_endian;
        for (vr, slot) in self.vrs.iter().zip(&mut self.slots) {
            match &mut slot.value {
                Value::Primitive(PrimitiveValue::Bytes(bytes)) if vr.value_type().is_binary() => {
                    vr.value_type().toggle_endian(bytes);
                    slot.strings = Default::default();
                    slot.numbers = Default::default();
                }
                Value::Sequence(seq) => {
                    for item in seq.iter_mut() {
                        item.set_byte_order(big_endian);
                    }
                }
                Value::Fragments(fragments) => *fragments = fragments.with_endianness(big_endian),
                Value::Primitive(_) => {}
            }
        }
        self.update_children();
    }

    /// Encode this data set into a new byte vector.
    pub fn to_bytes(&self, explicit_vr: bool, big_endian: bool, options: EncodeOptions) -> Result<Vec<u8>, WriteError> {
        let mut out = DicomWriter::new(Vec::new(), explicit_vr, big_endian);
        self.write_to(&mut out, options)?;
        Ok(out.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_attrs_core::tags;
    use pretty_assertions::assert_eq;

    #[test]
    fn explicit_little_endian_bytes() {
        let mut attrs = Attributes::new();
        attrs.set_string(tags::PATIENT_ID, VR::LO, "123").unwrap();
        attrs.set_int(tags::ROWS, VR::US, 2).unwrap();
        let bytes = attrs.to_bytes(true, false, EncodeOptions::default()).unwrap();
        assert_eq!(
            bytes,
            vec![
                0x10, 0x00, 0x20, 0x00, b'L', b'O', 4, 0, b'1', b'2', b'3', b' ', //
                0x28, 0x00, 0x10, 0x00, b'U', b'S', 2, 0, 2, 0,
            ]
        );
        assert_eq!(attrs.calc_length(EncodeOptions::default(), true), bytes.len() as u32);
    }

    #[test]
    fn group_lengths_are_derived() {
        let mut attrs = Attributes::new();
        attrs.set_bytes(Tag(0x0010, 0x0000), VR::UL, vec![0xFF; 4]).unwrap();
        attrs.set_string(tags::PATIENT_ID, VR::LO, "123").unwrap();
        attrs.set_int(tags::ROWS, VR::US, 2).unwrap();
        let options = EncodeOptions::default().with_group_length(true);
        let bytes = attrs.to_bytes(false, false, options).unwrap();
        assert_eq!(attrs.calc_length(options, false), bytes.len() as u32);
        assert_eq!(
            &bytes[..24],
            &[
                0x10, 0x00, 0x00, 0x00, 4, 0, 0, 0, 12, 0, 0, 0, //
                0x10, 0x00, 0x20, 0x00, 4, 0, 0, 0, b'1', b'2', b'3', b' ',
            ]
        );
        assert_eq!(&bytes[24..36], &[0x28, 0x00, 0x00, 0x00, 4, 0, 0, 0, 10, 0, 0, 0]);
    }

    #[test]
    fn sequence_lengths_match_written_bytes() {
        let mut attrs = Attributes::new();
        let seq = attrs.new_sequence(tags::REFERENCED_SERIES_SEQUENCE, 2).unwrap();
        seq.new_item()
            .set_string(tags::SERIES_INSTANCE_UID, VR::UI, "1.2.3")
            .unwrap();
        seq.new_item();
        attrs.new_sequence(tags::CONTENT_SEQUENCE, 0).unwrap();
        for options in [
            EncodeOptions::default(),
            EncodeOptions::defined_lengths(),
            EncodeOptions::default().with_undefined_item_length(false),
            EncodeOptions::defined_lengths().with_group_length(true),
        ] {
            for explicit_vr in [true, false] {
                let bytes = attrs.to_bytes(explicit_vr, false, options).unwrap();
                assert_eq!(attrs.calc_length(options, explicit_vr), bytes.len() as u32);
            }
        }
    }

    #[test]
    fn byte_order_follows_the_writer() {
        let mut attrs = Attributes::new();
        attrs.set_bytes(tags::ROWS, VR::US, vec![0x00, 0x02]).unwrap();
        let bytes = attrs.to_bytes(true, true, EncodeOptions::default()).unwrap();
        assert_eq!(bytes, vec![0x00, 0x28, 0x00, 0x10, b'U', b'S', 0, 2, 0x02, 0x00]);
    }

    #[test]
    fn byte_order_conversion_keeps_private_blocks() {
        let mut attrs = Attributes::new();
        attrs.set_string(Tag(0x0009, 0x0010), VR::LO, "UNUSED").unwrap();
        attrs.set_int(("ACME", Tag(0x0009, 0x0001)), VR::US, 2).unwrap();
        let seq = attrs.new_sequence(tags::CONTENT_SEQUENCE, 1).unwrap();
        seq.new_item().set_int(tags::ROWS, VR::US, 3).unwrap();
        assert_eq!(attrs.tags()[..2], [Tag(0x0009, 0x0010), Tag(0x0009, 0x0011)]);

        let bytes = attrs.to_bytes(true, true, EncodeOptions::default()).unwrap();
        let mut reader = dicom_attrs_encoding::DicomReader::new(&bytes[..], true, true);
        let read =
            Attributes::read_from(&mut reader, &dicom_attrs_core::DictionaryRegistry::new()).unwrap();
        assert_eq!(read.tags(), attrs.tags());
        assert_eq!(read.get_string(Tag(0x0009, 0x0010)).as_deref(), Some("UNUSED"));
        assert_eq!(read.get_int(("ACME", Tag(0x0009, 0x0001))), Some(2));
        assert_eq!(read.get_item(tags::CONTENT_SEQUENCE, 0).unwrap().get_int(tags::ROWS), Some(3));
        // the source keeps its own byte order
        assert!(!attrs.is_big_endian());
        assert_eq!(attrs.get_bytes(("ACME", Tag(0x0009, 0x0001))), Some(vec![2, 0]));
    }
}
