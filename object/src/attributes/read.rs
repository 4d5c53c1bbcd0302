//! Decoding data sets.
//!
//! Values are kept as the raw bytes found in the source,
//! in its byte order, and only decoded when they are requested.

use super::Attributes;
use crate::fragments::Fragments;
use crate::sequence::Sequence;
use crate::value::Value;
use dicom_attrs_core::dictionary::DictionaryRegistry;
use dicom_attrs_core::header::{Length, Tag, VR};
use dicom_attrs_core::tags;
use dicom_attrs_core::value::PrimitiveValue;
use dicom_attrs_encoding::decode::{self, DicomReader, Header};
use snafu::{Backtrace, OptionExt, ResultExt, Snafu};
use std::io::Read;

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum ReadError {
    #[snafu(display("Could not read data set"))]
    Io {
        #[snafu(backtrace)]
        source: decode::Error,
    },
    #[snafu(display("Unexpected end of source inside {}", context))]
    UnexpectedEnd {
        context: &'static str,
        backtrace: Backtrace,
    },
    #[snafu(display("Unexpected {} at position {}", tag, position))]
    UnexpectedTag {
        tag: Tag,
        position: u64,
        backtrace: Backtrace,
    },
    /// Undefined length sequences of VR UN are only supported in implicit VR.
    #[snafu(display("Unsupported undefined length for {} element {}", vr, tag))]
    UndefinedLength {
        tag: Tag,
        vr: VR,
        backtrace: Backtrace,
    },
}

/// Where the elements of a data set end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    /// At the end of the source.
    Source,
    /// At the given position.
    Position(u64),
    /// At an item delimitation item.
    Delimiter,
}

impl Attributes {
    /// Read a data set up to the end of the source.
    ///
    /// The VR of elements in implicit VR is looked up in `registry`,
    /// through the private dictionary of their creator for private elements.
    pub fn read_from<R: Read>(
        reader: &mut DicomReader<R>,
        registry: &DictionaryRegistry,
    ) -> Result<Attributes, ReadError> {
        let mut attrs = Attributes::with_endianness(reader.is_big_endian(), 16);
        attrs.read_elements(reader, registry, Bound::Source)?;
        Ok(attrs)
    }

    fn read_elements<R: Read>(
        &mut self,
        reader: &mut DicomReader<R>,
        registry: &DictionaryRegistry,
        bound: Bound,
    ) -> Result<(), ReadError> {
        loop {
            if let Bound::Position(end) = bound {
                if reader.position() >= end {
                    return Ok(());
                }
            }
            let Some(header) = reader.read_header().context(IoSnafu)? else {
                return match bound {
                    Bound::Source => Ok(()),
                    _ => UnexpectedEndSnafu { context: "item" }.fail(),
                };
            };
            if header.tag == tags::ITEM_DELIMITATION_ITEM && bound == Bound::Delimiter {
                return Ok(());
            }
            if header.tag.is_item_or_delimiter() {
                return UnexpectedTagSnafu {
                    tag: header.tag,
                    position: reader.position(),
                }
                .fail();
            }
            self.read_element(reader, registry, header)?;
        }
    }

    fn read_element<R: Read>(
        &mut self,
        reader: &mut DicomReader<R>,
        registry: &DictionaryRegistry,
        header: Header,
    ) -> Result<(), ReadError> {
        let tag = header.tag;
        let vr = match header.vr {
            Some(vr) => vr,
            None => {
                let creator = self.private_creator_of(tag);
                registry.vr_of(tag, creator.as_deref())
            }
        };
        if !header.length.is_undefined() && vr != VR::SQ {
            let bytes = reader.read_value(header.length.0).context(IoSnafu)?;
            let value = if bytes.is_empty() {
                PrimitiveValue::Empty
            } else {
                PrimitiveValue::Bytes(bytes)
            };
            self.insert_value(tag, vr, Value::Primitive(value));
            return Ok(());
        }
        match vr {
            VR::SQ => self.read_sequence(reader, registry, tag, header.length),
            // a sequence of unknown VR, always in implicit VR little endian
            VR::UN if tag != tags::PIXEL_DATA => {
                snafu::ensure!(
                    !reader.is_explicit_vr() && !reader.is_big_endian(),
                    UndefinedLengthSnafu { tag, vr }
                );
                self.read_sequence(reader, registry, tag, header.length)
            }
            _ => self.read_fragments(reader, tag, vr),
        }
    }

    fn read_sequence<R: Read>(
        &mut self,
        reader: &mut DicomReader<R>,
        registry: &DictionaryRegistry,
        tag: Tag,
        length: Length,
    ) -> Result<(), ReadError> {
        let creator = self.private_creator_of(tag);
        let mut seq = Sequence::new(tag, creator, self.child_owner(), 1);
        let end = length
            .get()
            .map(|len| reader.position() + u64::from(len));
        loop {
            if let Some(end) = end {
                if reader.position() >= end {
                    break;
                }
            }
            let header = reader
                .read_header()
                .context(IoSnafu)?
                .context(UnexpectedEndSnafu { context: "sequence" })?;
            if header.tag == tags::SEQUENCE_DELIMITATION_ITEM && end.is_none() {
                break;
            }
            if header.tag != tags::ITEM {
                return UnexpectedTagSnafu {
                    tag: header.tag,
                    position: reader.position(),
                }
                .fail();
            }
            let bound = match header.length.get() {
                Some(len) => Bound::Position(reader.position() + u64::from(len)),
                None => Bound::Delimiter,
            };
            seq.new_item().read_elements(reader, registry, bound)?;
        }
        self.insert_value(tag, VR::SQ, Value::Sequence(seq));
        Ok(())
    }

    fn read_fragments<R: Read>(&mut self, reader: &mut DicomReader<R>, tag: Tag, vr: VR) -> Result<(), ReadError> {
        let mut fragments = Fragments::new(vr, self.big_endian);
        loop {
            let header = reader
                .read_header()
                .context(IoSnafu)?
                .context(UnexpectedEndSnafu { context: "fragments" })?;
            if header.tag == tags::SEQUENCE_DELIMITATION_ITEM {
                break;
            }
            let length = match (header.tag == tags::ITEM, header.length.get()) {
                (true, Some(length)) => length,
                _ => {
                    return UnexpectedTagSnafu {
                        tag: header.tag,
                        position: reader.position(),
                    }
                    .fail()
                }
            };
            if length == 0 {
                fragments.push_empty();
            } else {
                fragments.push(reader.read_value(length).context(IoSnafu)?);
            }
        }
        self.insert_value(tag, vr, Value::Fragments(fragments));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_attrs_core::dictionary::TableDictionary;
    use dicom_attrs_encoding::encode::EncodeOptions;
    use pretty_assertions::assert_eq;

    fn sample() -> Attributes {
        let mut attrs = Attributes::new();
        attrs.set_specific_character_set(&["ISO_IR 100"]).unwrap();
        attrs.set_string(tags::PATIENT_NAME, VR::PN, "Müller^Hans").unwrap();
        attrs.set_string(tags::PATIENT_ID, VR::LO, "123").unwrap();
        attrs.set_int(tags::ROWS, VR::US, 512).unwrap();
        attrs.set_doubles(tags::PIXEL_SPACING, VR::DS, &[0.5, 0.25]).unwrap();
        let seq = attrs.new_sequence(tags::REFERENCED_SERIES_SEQUENCE, 2).unwrap();
        seq.new_item()
            .set_string(tags::SERIES_INSTANCE_UID, VR::UI, "1.2.3")
            .unwrap();
        seq.new_item();
        let fragments = attrs.new_fragments(tags::PIXEL_DATA, VR::OW, 2).unwrap();
        fragments.push_empty();
        fragments.push(vec![1, 2, 3, 4]);
        attrs
    }

    fn round_trip(explicit_vr: bool, big_endian: bool, options: EncodeOptions) -> Attributes {
        let bytes = sample().to_bytes(explicit_vr, big_endian, options).unwrap();
        let mut reader = DicomReader::new(&bytes[..], explicit_vr, big_endian);
        Attributes::read_from(&mut reader, &DictionaryRegistry::new()).unwrap()
    }

    #[test]
    fn round_trips_in_every_encoding() {
        for options in [EncodeOptions::default(), EncodeOptions::defined_lengths()] {
            for (explicit_vr, big_endian) in [(true, false), (false, false), (true, true)] {
                let read = round_trip(explicit_vr, big_endian, options);
                let mut expected = sample();
                if big_endian {
                    let mut converted = Attributes::with_endianness(true, 0);
                    converted.add_all(&expected).unwrap();
                    expected = converted;
                }
                assert_eq!(read, expected, "explicit {} big {}", explicit_vr, big_endian);
                assert_eq!(read.get_string(tags::PATIENT_NAME).as_deref(), Some("Müller^Hans"));
                assert_eq!(read.get_int(tags::ROWS), Some(512));
            }
        }
    }

    #[test]
    fn read_items_know_their_position() {
        let read = round_trip(true, false, EncodeOptions::default());
        let item = read.get_item(tags::REFERENCED_SERIES_SEQUENCE, 0).unwrap();
        assert_eq!(item.level(), 1);
        assert_eq!(item.get_string(tags::SERIES_INSTANCE_UID).as_deref(), Some("1.2.3"));
        let fragments = read.get_fragments(tags::PIXEL_DATA).unwrap();
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments.get(1), Some(&[1, 2, 3, 4][..]));
    }

    #[test]
    fn private_vr_lookup_in_implicit_vr() {
        let mut attrs = Attributes::new();
        attrs.set_int(("ACME", Tag(0x0009, 0x0001)), VR::US, 7).unwrap();
        let bytes = attrs.to_bytes(false, false, EncodeOptions::default()).unwrap();

        let registry = DictionaryRegistry::new()
            .with(TableDictionary::new_private("ACME").with_entry(Tag(0x0009, 0x0001), "Count", VR::US));
        let read = Attributes::read_from(&mut DicomReader::implicit_le(&bytes[..]), &registry).unwrap();
        assert_eq!(read.vr_of(("ACME", Tag(0x0009, 0x0001))), Some(VR::US));
        assert_eq!(read.get_int(("ACME", Tag(0x0009, 0x0001))), Some(7));

        let read = Attributes::read_from(&mut DicomReader::implicit_le(&bytes[..]), &DictionaryRegistry::new()).unwrap();
        assert_eq!(read.vr_of(("ACME", Tag(0x0009, 0x0001))), Some(VR::UN));
    }

    #[test]
    fn truncated_sources_fail() {
        let bytes = sample().to_bytes(true, false, EncodeOptions::default()).unwrap();
        let truncated = &bytes[..bytes.len() - 10];
        let result = Attributes::read_from(&mut DicomReader::explicit_le(truncated), &DictionaryRegistry::new());
        assert!(result.is_err());
    }

    #[test]
    fn stray_delimiters_are_rejected() {
        let bytes = [0xFE, 0xFF, 0x0D, 0xE0, 0, 0, 0, 0];
        let result = Attributes::read_from(&mut DicomReader::implicit_le(&bytes[..]), &DictionaryRegistry::new());
        assert!(matches!(result, Err(ReadError::UnexpectedTag { .. })));
    }
}
