//! This module contains the reading of data element headers and values.
//!
//! A [`DicomReader`] reads element headers and raw value bytes
//! from any [`Read`] source. It does not interpret values:
//! building a data set from the headers is up to the caller.

use byteordered::{ByteOrdered, Endianness};
use dicom_attrs_core::header::{Length, Tag, VR};
use snafu::{Backtrace, ResultExt, Snafu};
use std::io::{self, Read};

/// Module-level error type:
/// for errors which may occur while decoding DICOM data.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Failed to read the header's tag field: {}", source))]
    ReadTag {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to read the header's value representation: {}", source))]
    ReadVr {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to read the header's reserved bytes: {}", source))]
    ReadReserved {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to read the header's element length field: {}", source))]
    ReadLength {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to read {} value bytes at position {}: {}", length, position, source))]
    ReadValue {
        length: u32,
        position: u64,
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Unknown value representation {:?} for {} at position {}", vr, tag, position))]
    UnknownVr {
        tag: Tag,
        vr: [u8; 2],
        position: u64,
        backtrace: Backtrace,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A data element header as found in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub tag: Tag,
    /// The value representation, `None` in implicit VR
    /// and for item and delimitation headers.
    pub vr: Option<VR>,
    pub length: Length,
}

/// A reader of data element headers and values.
#[derive(Debug)]
pub struct DicomReader<R> {
    from: ByteOrdered<R, Endianness>,
    explicit_vr: bool,
    position: u64,
}

impl<R> DicomReader<R>
where
    R: Read,
{
    /// Create a reader with the given VR mode and byte order.
    pub fn new(from: R, explicit_vr: bool, big_endian: bool) -> Self {
        let endianness = if big_endian {
            Endianness::Big
        } else {
            Endianness::Little
        };
        DicomReader {
            from: ByteOrdered::runtime(from, endianness),
            explicit_vr,
            position: 0,
        }
    }

    /// Create a reader for explicit VR little endian.
    pub fn explicit_le(from: R) -> Self {
        Self::new(from, true, false)
    }

    /// Create a reader for implicit VR little endian.
    pub fn implicit_le(from: R) -> Self {
        Self::new(from, false, false)
    }

    pub fn is_explicit_vr(&self) -> bool {
        self.explicit_vr
    }

    pub fn is_big_endian(&self) -> bool {
        self.from.endianness() == Endianness::Big
    }

    /// The number of bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Read the next header, or `None` if the source ended
    /// cleanly before it.
    pub fn read_header(&mut self) -> Result<Option<Header>> {
        let mut first = [0u8; 1];
        loop {
            match self.from.inner_mut().read(&mut first) {
                Ok(0) => return Ok(None),
                Ok(_) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e).context(ReadTagSnafu),
            }
        }
        let mut rest = [0u8; 3];
        self.from.read_exact(&mut rest).context(ReadTagSnafu)?;
        let bytes = [first[0], rest[0], rest[1], rest[2]];
        let mut tag_reader = ByteOrdered::runtime(&bytes[..], self.from.endianness());
        let group = tag_reader.read_u16().context(ReadTagSnafu)?;
        let element = tag_reader.read_u16().context(ReadTagSnafu)?;
        let tag = Tag(group, element);
        let start = self.position;
        self.position += 4;

        if tag.is_item_or_delimiter() || !self.explicit_vr {
            let length = self.from.read_u32().context(ReadLengthSnafu)?;
            self.position += 4;
            return Ok(Some(Header {
                tag,
                vr: None,
                length: Length(length),
            }));
        }

        let mut vr_bytes = [0u8; 2];
        self.from.read_exact(&mut vr_bytes).context(ReadVrSnafu)?;
        self.position += 2;
        let vr = VR::from_binary(vr_bytes).ok_or_else(|| {
            UnknownVrSnafu {
                tag,
                vr: vr_bytes,
                position: start,
            }
            .build()
        })?;
        let length = if vr.header_length() == 12 {
            self.from.read_u16().context(ReadReservedSnafu)?;
            let length = self.from.read_u32().context(ReadLengthSnafu)?;
            self.position += 6;
            length
        } else {
            let length = self.from.read_u16().context(ReadLengthSnafu)?;
            self.position += 2;
            u32::from(length)
        };
        Ok(Some(Header {
            tag,
            vr: Some(vr),
            length: Length(length),
        }))
    }

    /// Read `length` value bytes.
    pub fn read_value(&mut self, length: u32) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; length as usize];
        self.from.read_exact(&mut buf).context(ReadValueSnafu {
            length,
            position: self.position,
        })?;
        self.position += u64::from(length);
        Ok(buf)
    }

    /// Skip `length` value bytes.
    pub fn skip(&mut self, length: u32) -> Result<()> {
        let copied = io::copy(
            &mut self.from.inner_mut().by_ref().take(u64::from(length)),
            &mut io::sink(),
        )
        .context(ReadValueSnafu {
            length,
            position: self.position,
        })?;
        if copied < u64::from(length) {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof)).context(ReadValueSnafu {
                length,
                position: self.position,
            });
        }
        self.position += copied;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::DicomWriter;

    #[test]
    fn reads_what_was_written() {
        let mut writer = DicomWriter::new(Vec::new(), true, true);
        writer.write_element(Tag(0x0010, 0x0020), VR::LO, b"123").unwrap();
        writer.write_header(Tag(0x0008, 0x1140), VR::SQ, Length::UNDEFINED).unwrap();
        writer.write_item_header(Length(0)).unwrap();
        writer.write_sequence_delimiter().unwrap();
        let bytes = writer.into_inner();

        let mut reader = DicomReader::new(&bytes[..], true, true);
        let header = reader.read_header().unwrap().unwrap();
        assert_eq!(
            header,
            Header {
                tag: Tag(0x0010, 0x0020),
                vr: Some(VR::LO),
                length: Length(4)
            }
        );
        assert_eq!(reader.read_value(4).unwrap(), b"123 ");
        let header = reader.read_header().unwrap().unwrap();
        assert_eq!(header.vr, Some(VR::SQ));
        assert!(header.length.is_undefined());
        let header = reader.read_header().unwrap().unwrap();
        assert_eq!(header.tag, Tag(0xFFFE, 0xE000));
        assert_eq!(header.vr, None);
        let header = reader.read_header().unwrap().unwrap();
        assert_eq!(header.tag, Tag(0xFFFE, 0xE0DD));
        assert!(reader.read_header().unwrap().is_none());
        assert_eq!(reader.position() as usize, bytes.len());
    }

    #[test]
    fn implicit_headers() {
        let bytes = [0x10, 0x00, 0x10, 0x00, 4, 0, 0, 0, b'D', b'O', b'E', b' '];
        let mut reader = DicomReader::implicit_le(&bytes[..]);
        let header = reader.read_header().unwrap().unwrap();
        assert_eq!(header.tag, Tag(0x0010, 0x0010));
        assert_eq!(header.vr, None);
        reader.skip(4).unwrap();
        assert!(reader.read_header().unwrap().is_none());
    }

    #[test]
    fn truncated_input() {
        let bytes = [0x10, 0x00, 0x10];
        let mut reader = DicomReader::explicit_le(&bytes[..]);
        assert!(matches!(reader.read_header(), Err(Error::ReadTag { .. })));

        let bytes = [0x10, 0x00, 0x10, 0x00, b'L', b'O', 4, 0, b'A'];
        let mut reader = DicomReader::explicit_le(&bytes[..]);
        let header = reader.read_header().unwrap().unwrap();
        assert!(reader.read_value(header.length.0).is_err());
    }

    #[test]
    fn unknown_vr() {
        let bytes = [0x10, 0x00, 0x10, 0x00, b'x', b'x', 0, 0];
        let mut reader = DicomReader::explicit_le(&bytes[..]);
        assert!(matches!(reader.read_header(), Err(Error::UnknownVr { .. })));
    }
}
