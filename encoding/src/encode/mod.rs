//! This module contains the writing of data element headers and values.
//!
//! A [`DicomWriter`] writes tags, value representations, lengths
//! and value bytes to any [`Write`] sink,
//! in the byte order and VR mode of the data set being written.
//! Which lengths to write as undefined, and whether to emit group lengths,
//! is configured through [`EncodeOptions`].

use byteordered::{ByteOrdered, Endianness};
use dicom_attrs_core::header::{Length, Tag, VR};
use dicom_attrs_core::tags;
use snafu::{ensure, Backtrace, ResultExt, Snafu};
use std::io::{self, Write};

/// Module-level error type:
/// for errors which may occur while encoding DICOM data.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Failed to write the header's tag field: {}", source))]
    WriteTag {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to write the header's value representation: {}", source))]
    WriteVr {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to write the header's length field: {}", source))]
    WriteLength {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to write the value: {}", source))]
    WriteValue {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Value of {} ({}) is too long for its length field: {} bytes", tag, vr, length))]
    ValueTooLong {
        tag: Tag,
        vr: VR,
        length: u32,
        backtrace: Backtrace,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Options for the encoding of a data set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncodeOptions {
    /// Emit a group length element before the elements of each group.
    pub group_length: bool,
    /// Write sequences with elements with undefined length.
    pub undefined_sequence_length: bool,
    /// Write sequences without items with undefined length.
    pub undefined_empty_sequence_length: bool,
    /// Write items with undefined length.
    pub undefined_item_length: bool,
    /// Write items without elements with undefined length.
    pub undefined_empty_item_length: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            group_length: false,
            undefined_sequence_length: true,
            undefined_empty_sequence_length: false,
            undefined_item_length: true,
            undefined_empty_item_length: false,
        }
    }
}

impl EncodeOptions {
    /// Options writing every length explicitly.
    pub fn defined_lengths() -> Self {
        EncodeOptions {
            group_length: false,
            undefined_sequence_length: false,
            undefined_empty_sequence_length: false,
            undefined_item_length: false,
            undefined_empty_item_length: false,
        }
    }

    pub fn with_group_length(mut self, group_length: bool) -> Self {
        self.group_length = group_length;
        self
    }

    pub fn with_undefined_sequence_length(mut self, undefined: bool) -> Self {
        self.undefined_sequence_length = undefined;
        self
    }

    pub fn with_undefined_empty_sequence_length(mut self, undefined: bool) -> Self {
        self.undefined_empty_sequence_length = undefined;
        self
    }

    pub fn with_undefined_item_length(mut self, undefined: bool) -> Self {
        self.undefined_item_length = undefined;
        self
    }

    pub fn with_undefined_empty_item_length(mut self, undefined: bool) -> Self {
        self.undefined_empty_item_length = undefined;
        self
    }

    /// Whether a sequence with the given number of items
    /// is written with undefined length.
    pub fn undefined_sequence(&self, empty: bool) -> bool {
        if empty {
            self.undefined_empty_sequence_length
        } else {
            self.undefined_sequence_length
        }
    }

    /// Whether an item with or without elements
    /// is written with undefined length.
    pub fn undefined_item(&self, empty: bool) -> bool {
        if empty {
            self.undefined_empty_item_length
        } else {
            self.undefined_item_length
        }
    }
}

/// The length of an element header in the given VR mode.
pub fn header_length(vr: VR, explicit_vr: bool) -> u32 {
    if explicit_vr {
        vr.header_length()
    } else {
        8
    }
}

/// A writer of data element headers and values.
#[derive(Debug)]
pub struct DicomWriter<W> {
    to: ByteOrdered<W, Endianness>,
    explicit_vr: bool,
}

impl<W> DicomWriter<W>
where
    W: Write,
{
    /// Create a writer with the given VR mode and byte order.
    pub fn new(to: W, explicit_vr: bool, big_endian: bool) -> Self {
        let endianness = if big_endian {
            Endianness::Big
        } else {
            Endianness::Little
        };
        DicomWriter {
            to: ByteOrdered::runtime(to, endianness),
            explicit_vr,
        }
    }

    /// Create a writer for explicit VR little endian.
    pub fn explicit_le(to: W) -> Self {
        Self::new(to, true, false)
    }

    /// Create a writer for implicit VR little endian.
    pub fn implicit_le(to: W) -> Self {
        Self::new(to, false, false)
    }

    pub fn is_explicit_vr(&self) -> bool {
        self.explicit_vr
    }

    pub fn is_big_endian(&self) -> bool {
        self.to.endianness() == Endianness::Big
    }

    /// Write the header of a data element.
    ///
    /// Item and delimitation headers never carry a VR.
    pub fn write_header(&mut self, tag: Tag, vr: VR, length: Length) -> Result<()> {
        self.write_tag(tag)?;
        if tag.is_item_or_delimiter() || !self.explicit_vr {
            return self.to.write_u32(length.0).context(WriteLengthSnafu);
        }
        self.to.write_all(&vr.to_bytes()).context(WriteVrSnafu)?;
        if vr.header_length() == 12 {
            self.to.write_u16(0).context(WriteVrSnafu)?;
            self.to.write_u32(length.0).context(WriteLengthSnafu)
        } else {
            ensure!(
                length.0 <= u32::from(u16::MAX),
                ValueTooLongSnafu {
                    tag,
                    vr,
                    length: length.0
                }
            );
            self.to.write_u16(length.0 as u16).context(WriteLengthSnafu)
        }
    }

    /// Write an item header.
    pub fn write_item_header(&mut self, length: Length) -> Result<()> {
        self.write_header(tags::ITEM, VR::UN, length)
    }

    /// Write an item delimitation item.
    pub fn write_item_delimiter(&mut self) -> Result<()> {
        self.write_header(tags::ITEM_DELIMITATION_ITEM, VR::UN, Length(0))
    }

    /// Write a sequence delimitation item.
    pub fn write_sequence_delimiter(&mut self) -> Result<()> {
        self.write_header(tags::SEQUENCE_DELIMITATION_ITEM, VR::UN, Length(0))
    }

    /// Write value bytes, adding the padding byte of the VR
    /// if their length is odd.
    pub fn write_value(&mut self, vr: VR, bytes: &[u8]) -> Result<()> {
        self.to.write_all(bytes).context(WriteValueSnafu)?;
        if bytes.len() % 2 != 0 {
            self.to.write_u8(vr.padding_byte()).context(WriteValueSnafu)?;
        }
        Ok(())
    }

    /// Write a complete element with a primitive value.
    pub fn write_element(&mut self, tag: Tag, vr: VR, bytes: &[u8]) -> Result<()> {
        let length = padded_length(bytes.len());
        self.write_header(tag, vr, Length(length))?;
        self.write_value(vr, bytes)
    }

    /// Write a 32-bit unsigned integer value in the writer's byte order.
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.to.write_u32(value).context(WriteValueSnafu)
    }

    fn write_tag(&mut self, tag: Tag) -> Result<()> {
        self.to.write_u16(tag.group()).context(WriteTagSnafu)?;
        self.to.write_u16(tag.element()).context(WriteTagSnafu)
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        self.to.flush().context(WriteValueSnafu)
    }

    /// Retrieve the underlying sink.
    pub fn into_inner(self) -> W {
        self.to.into_inner()
    }
}

/// The length of a value of `len` bytes once padded to an even length.
pub fn padded_length(len: usize) -> u32 {
    ((len + 1) & !1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_le_short_header() {
        let mut writer = DicomWriter::explicit_le(Vec::new());
        writer
            .write_element(tags::PATIENT_ID, VR::LO, b"123")
            .unwrap();
        assert_eq!(
            writer.into_inner(),
            vec![0x10, 0x00, 0x20, 0x00, b'L', b'O', 0x04, 0x00, b'1', b'2', b'3', b' ']
        );
    }

    #[test]
    fn explicit_be_long_header() {
        let mut writer = DicomWriter::new(Vec::new(), true, true);
        writer
            .write_header(tags::PIXEL_DATA, VR::OB, Length::UNDEFINED)
            .unwrap();
        assert_eq!(
            writer.into_inner(),
            vec![0x7F, 0xE0, 0x00, 0x10, b'O', b'B', 0, 0, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn implicit_header_and_items() {
        let mut writer = DicomWriter::implicit_le(Vec::new());
        writer.write_header(Tag(0x0008, 0x0018), VR::UI, Length(2)).unwrap();
        writer.write_value(VR::UI, b"1").unwrap();
        writer.write_item_delimiter().unwrap();
        assert_eq!(
            writer.into_inner(),
            vec![
                0x08, 0x00, 0x18, 0x00, 2, 0, 0, 0, b'1', 0, //
                0xFE, 0xFF, 0x0D, 0xE0, 0, 0, 0, 0,
            ]
        );
    }

    #[test]
    fn short_length_overflow() {
        let mut writer = DicomWriter::explicit_le(Vec::new());
        let result = writer.write_header(tags::PATIENT_ID, VR::LO, Length(0x1_0000));
        assert!(matches!(result, Err(Error::ValueTooLong { .. })));
    }

    #[test]
    fn options() {
        let options = EncodeOptions::default();
        assert!(options.undefined_sequence(false));
        assert!(!options.undefined_sequence(true));
        let options = options.with_undefined_empty_item_length(true);
        assert!(options.undefined_item(true));
        assert!(!EncodeOptions::defined_lengths().undefined_item(false));
    }
}
