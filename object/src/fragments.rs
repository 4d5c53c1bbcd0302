//! Encapsulated data, as a list of fragments sharing one VR.

use crate::value::{EncodeContext, EncodeValue};
use dicom_attrs_core::header::{Length, VR};
use dicom_attrs_core::value::PrimitiveValue;
use dicom_attrs_encoding::convert::ValueCodec;
use dicom_attrs_encoding::encode::{self, padded_length, DicomWriter};
use std::io::Write;

/// The fragments of an encapsulated value, such as compressed pixel data.
///
/// A zero-length fragment is kept as the empty value.
/// Fragments are always written with undefined length,
/// one item per fragment, followed by a sequence delimitation item.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragments {
    vr: VR,
    big_endian: bool,
    fragments: Vec<PrimitiveValue>,
}

impl Fragments {
    /// Create an empty list of fragments.
    pub fn new(vr: VR, big_endian: bool) -> Self {
        Self::with_capacity(vr, big_endian, 0)
    }

    pub fn with_capacity(vr: VR, big_endian: bool, capacity: usize) -> Self {
        Fragments {
            vr,
            big_endian,
            fragments: Vec::with_capacity(capacity),
        }
    }

    pub fn vr(&self) -> VR {
        self.vr
    }

    pub fn is_big_endian(&self) -> bool {
        self.big_endian
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Append a fragment.
    pub fn push(&mut self, bytes: Vec<u8>) {
        self.fragments.push(PrimitiveValue::from_bytes(bytes));
    }

    /// Append a zero-length fragment.
    pub fn push_empty(&mut self) {
        self.fragments.push(PrimitiveValue::Empty);
    }

    /// Retrieve the bytes of a fragment, empty for the empty value.
    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.fragments.get(index).map(fragment_bytes)
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.fragments.iter().map(fragment_bytes)
    }

    pub fn remove(&mut self, index: usize) -> Option<Vec<u8>> {
        if index < self.fragments.len() {
            Some(match self.fragments.remove(index) {
                PrimitiveValue::Bytes(bytes) => bytes,
                _ => Vec::new(),
            })
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.fragments.clear();
    }

    /// Obtain a copy in the given byte order.
    ///
    /// The first fragment holds the basic offset table,
    /// which is always a list of 32-bit offsets.
    pub fn with_endianness(&self, big_endian: bool) -> Fragments {
        let mut copy = self.clone();
        if big_endian != self.big_endian {
            for (i, fragment) in copy.fragments.iter_mut().enumerate() {
                if let PrimitiveValue::Bytes(bytes) = fragment {
                    if i == 0 {
                        VR::UL.value_type().toggle_endian(bytes);
                    } else {
                        self.vr.value_type().toggle_endian(bytes);
                    }
                }
            }
            copy.big_endian = big_endian;
        }
        copy
    }
}

fn fragment_bytes(fragment: &PrimitiveValue) -> &[u8] {
    match fragment {
        PrimitiveValue::Bytes(bytes) => bytes,
        _ => &[],
    }
}

impl EncodeValue for Fragments {
    fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    fn calc_length(&self, _vr: VR, _ctx: &EncodeContext<'_>) -> u32 {
        self.fragments
            .iter()
            .map(|f| 8 + padded_length(fragment_bytes(f).len()))
            .sum::<u32>()
            + 8
    }

    fn length_field(&self, _vr: VR, _ctx: &EncodeContext<'_>) -> Length {
        Length::UNDEFINED
    }

    fn write_value<W: Write>(
        &self,
        _vr: VR,
        out: &mut DicomWriter<W>,
        _ctx: &EncodeContext<'_>,
    ) -> encode::Result<()> {
        for fragment in &self.fragments {
            let bytes = fragment_bytes(fragment);
            out.write_item_header(Length(padded_length(bytes.len())))?;
            out.write_value(VR::OB, bytes)?;
        }
        out.write_sequence_delimiter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_length_fragments_are_empty_values() {
        let mut fragments = Fragments::new(VR::OB, false);
        fragments.push(Vec::new());
        fragments.push(vec![1, 2, 3]);
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments.get(0), Some(&[][..]));
        assert_eq!(fragments.get(1), Some(&[1, 2, 3][..]));
        assert_eq!(fragments.get(2), None);
    }

    #[test]
    fn toggle_endianness() {
        let mut fragments = Fragments::new(VR::OW, false);
        fragments.push(vec![0, 0, 0, 1]);
        fragments.push(vec![1, 2, 3, 4]);
        let be = fragments.with_endianness(true);
        assert!(be.is_big_endian());
        assert_eq!(be.get(0), Some(&[1, 0, 0, 0][..]));
        assert_eq!(be.get(1), Some(&[2, 1, 4, 3][..]));
    }

    #[test]
    fn written_with_delimiters() {
        let mut fragments = Fragments::new(VR::OB, false);
        fragments.push_empty();
        fragments.push(vec![0xAB; 3]);
        let charset = dicom_attrs_encoding::SpecificCharacterSet::default();
        let ctx = EncodeContext {
            explicit_vr: true,
            big_endian: false,
            options: Default::default(),
            charset: &charset,
        };
        let mut out = DicomWriter::explicit_le(Vec::new());
        fragments.write_value(VR::OB, &mut out, &ctx).unwrap();
        let bytes = out.into_inner();
        assert_eq!(bytes.len() as u32, fragments.calc_length(VR::OB, &ctx));
        assert_eq!(
            bytes,
            vec![
                0xFE, 0xFF, 0x00, 0xE0, 0, 0, 0, 0, //
                0xFE, 0xFF, 0x00, 0xE0, 4, 0, 0, 0, 0xAB, 0xAB, 0xAB, 0, //
                0xFE, 0xFF, 0xDD, 0xE0, 0, 0, 0, 0,
            ]
        );
    }
}
