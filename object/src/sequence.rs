//! Sequences of items.
//!
//! A [`Sequence`] exclusively owns its items.
//! Each item only records its position (the path of item pointers
//! from the root data set) and the context it inherits from the
//! data set owning the sequence, so no item refers back to a live parent.

use crate::attributes::{Attributes, Inherited};
use crate::value::{EncodeContext, EncodeValue};
use dicom_attrs_core::header::{Length, Tag, VR};
use dicom_attrs_core::selector::ItemPointer;
use dicom_attrs_encoding::encode::{self, DicomWriter};
use snafu::{ensure, Backtrace, Snafu};
use std::io::Write;

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// The item already belongs to a sequence.
    #[snafu(display("Item already contained by a sequence"))]
    AlreadyOwned { backtrace: Backtrace },
    /// The byte order of the item differs from the one of the sequence.
    #[snafu(display("Byte order of item does not match the data set"))]
    EndianMismatch { backtrace: Backtrace },
    #[snafu(display("Item index {} out of bounds for {} items", index, len))]
    IndexOutOfBounds {
        index: usize,
        len: usize,
        backtrace: Backtrace,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The position and context of the data set owning a sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Owner {
    pub pointers: Vec<ItemPointer>,
    pub big_endian: bool,
    pub inherited: Inherited,
}

/// An ordered list of items.
#[derive(Debug, Clone)]
pub struct Sequence {
    tag: Tag,
    private_creator: Option<String>,
    owner: Owner,
    items: Vec<Attributes>,
}

impl PartialEq for Sequence {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl Sequence {
    pub(crate) fn new(
        tag: Tag,
        private_creator: Option<String>,
        owner: Owner,
        capacity: usize,
    ) -> Self {
        Sequence {
            tag,
            private_creator,
            owner,
            items: Vec::with_capacity(capacity),
        }
    }

    /// The tag of the sequence element.
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// The private creator of the sequence element, if private.
    pub fn private_creator(&self) -> Option<&str> {
        self.private_creator.as_deref()
    }

    /// Whether the owning data set is encoded in big endian.
    pub fn is_big_endian(&self) -> bool {
        self.owner.big_endian
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Attributes> {
        self.items.get(index)
    }

    /// Retrieve an item for modification.
    ///
    /// Replacing the item wholesale through this reference
    /// does not update its position; use [`set`](Sequence::set) instead.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Attributes> {
        self.items.get_mut(index)
    }

    pub fn first(&self) -> Option<&Attributes> {
        self.items.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attributes> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Attributes> {
        self.items.iter_mut()
    }

    pub fn items(&self) -> &[Attributes] {
        &self.items
    }

    /// Append an item.
    ///
    /// The item must not belong to another sequence
    /// and must have the byte order of the owning data set.
    pub fn push(&mut self, item: Attributes) -> Result<()> {
        self.insert(self.items.len(), item)
    }

    /// Insert an item at the given position.
    pub fn insert(&mut self, index: usize, mut item: Attributes) -> Result<()> {
        ensure!(
            index <= self.items.len(),
            IndexOutOfBoundsSnafu {
                index,
                len: self.items.len()
            }
        );
        ensure!(!item.has_parent(), AlreadyOwnedSnafu);
        ensure!(
            item.is_big_endian() == self.owner.big_endian,
            EndianMismatchSnafu
        );
        item.attach(self.item_pointers(index), self.owner.inherited.clone());
        self.items.insert(index, item);
        self.reindex(index + 1);
        Ok(())
    }

    /// Append a new empty item, returning it.
    pub fn new_item(&mut self) -> &mut Attributes {
        let index = self.items.len();
        let mut item = Attributes::with_endianness(self.owner.big_endian, 0);
        item.attach(self.item_pointers(index), self.owner.inherited.clone());
        self.items.push(item);
        &mut self.items[index]
    }

    /// The first item, appending a new one if there is none.
    pub fn first_or_new_item(&mut self) -> &mut Attributes {
        if self.items.is_empty() {
            return self.new_item();
        }
        &mut self.items[0]
    }

    /// Replace the item at the given position, returning the former item.
    pub fn set(&mut self, index: usize, mut item: Attributes) -> Result<Attributes> {
        ensure!(
            index < self.items.len(),
            IndexOutOfBoundsSnafu {
                index,
                len: self.items.len()
            }
        );
        ensure!(!item.has_parent(), AlreadyOwnedSnafu);
        ensure!(
            item.is_big_endian() == self.owner.big_endian,
            EndianMismatchSnafu
        );
        item.attach(self.item_pointers(index), self.owner.inherited.clone());
        let mut old = std::mem::replace(&mut self.items[index], item);
        old.detach();
        Ok(old)
    }

    /// Remove the item at the given position, releasing it from this sequence.
    pub fn remove(&mut self, index: usize) -> Option<Attributes> {
        if index >= self.items.len() {
            return None;
        }
        let mut item = self.items.remove(index);
        item.detach();
        self.reindex(index);
        Some(item)
    }

    /// Remove all items, releasing each of them.
    pub fn clear(&mut self) {
        for item in &mut self.items {
            item.detach();
        }
        self.items.clear();
    }

    /// Remove all items, returning them released from this sequence.
    pub fn take_items(&mut self) -> Vec<Attributes> {
        let mut items = std::mem::take(&mut self.items);
        for item in &mut items {
            item.detach();
        }
        items
    }

    /// Update the position and context given to the items
    /// after the owning data set changed.
    pub(crate) fn set_owner(&mut self, owner: Owner) {
        self.owner = owner;
        for i in 0..self.items.len() {
            let pointers = self.item_pointers(i);
            let inherited = self.owner.inherited.clone();
            self.items[i].attach(pointers, inherited);
        }
    }

    /// Place this sequence at an element of a data set.
    pub(crate) fn bind(&mut self, tag: Tag, private_creator: Option<String>, owner: Owner) {
        self.tag = tag;
        self.private_creator = private_creator;
        self.set_owner(owner);
    }

    fn item_pointers(&self, index: usize) -> Vec<ItemPointer> {
        let mut pointers = self.owner.pointers.clone();
        pointers.push(ItemPointer {
            sequence_tag: self.tag,
            private_creator: self.private_creator.clone(),
            item_index: Some(index),
        });
        pointers
    }

    fn reindex(&mut self, from: usize) {
        for i in from..self.items.len() {
            let pointers = self.item_pointers(i);
            self.items[i].set_item_pointers(pointers);
        }
    }

    fn undefined_item(&self, item: &Attributes, ctx: &EncodeContext<'_>) -> bool {
        ctx.options.undefined_item(item.is_empty())
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a Attributes;
    type IntoIter = std::slice::Iter<'a, Attributes>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl EncodeValue for Sequence {
    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn calc_length(&self, _vr: VR, ctx: &EncodeContext<'_>) -> u32 {
        let mut len = 0;
        for item in &self.items {
            len += 8 + item.calc_length(ctx.options, ctx.explicit_vr);
            if self.undefined_item(item, ctx) {
                len += 8;
            }
        }
        if ctx.options.undefined_sequence(self.items.is_empty()) {
            len += 8;
        }
        len
    }

    fn length_field(&self, vr: VR, ctx: &EncodeContext<'_>) -> Length {
        if ctx.options.undefined_sequence(self.items.is_empty()) {
            Length::UNDEFINED
        } else {
            Length(self.calc_length(vr, ctx))
        }
    }

    fn write_value<W: Write>(
        &self,
        _vr: VR,
        out: &mut DicomWriter<W>,
        ctx: &EncodeContext<'_>,
    ) -> encode::Result<()> {
        for item in &self.items {
            if self.undefined_item(item, ctx) {
                out.write_item_header(Length::UNDEFINED)?;
                item.write_elements(out, ctx.options)?;
                out.write_item_delimiter()?;
            } else {
                out.write_item_header(Length(item.calc_length(ctx.options, ctx.explicit_vr)))?;
                item.write_elements(out, ctx.options)?;
            }
        }
        if ctx.options.undefined_sequence(self.items.is_empty()) {
            out.write_sequence_delimiter()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_attrs_core::tags;

    fn sequence_with(n: usize) -> Attributes {
        let mut attrs = Attributes::new();
        let seq = attrs
            .new_sequence(tags::REFERENCED_SERIES_SEQUENCE, n)
            .unwrap();
        for i in 0..n {
            seq.new_item()
                .set_string(tags::SERIES_INSTANCE_UID, VR::UI, &format!("1.2.{}", i))
                .unwrap();
        }
        attrs
    }

    #[test]
    fn items_know_their_position() {
        let attrs = sequence_with(2);
        let seq = attrs.get_sequence(tags::REFERENCED_SERIES_SEQUENCE).unwrap();
        let item = seq.get(1).unwrap();
        assert_eq!(item.item_index(), Some(1));
        assert_eq!(item.level(), 1);
        assert!(!item.is_root());
        assert_eq!(
            item.item_pointers(),
            &[ItemPointer::new(tags::REFERENCED_SERIES_SEQUENCE, 1)]
        );
    }

    #[test]
    fn owned_items_are_rejected() {
        let mut attrs = sequence_with(1);
        let seq = attrs
            .get_sequence_mut(tags::REFERENCED_SERIES_SEQUENCE)
            .unwrap();
        let stolen = std::mem::take(seq.get_mut(0).unwrap());
        assert!(matches!(seq.push(stolen), Err(Error::AlreadyOwned { .. })));
    }

    #[test]
    fn endianness_must_match() {
        let mut attrs = sequence_with(0);
        let seq = attrs
            .get_sequence_mut(tags::REFERENCED_SERIES_SEQUENCE)
            .unwrap();
        let item = Attributes::with_endianness(true, 0);
        assert!(matches!(seq.push(item), Err(Error::EndianMismatch { .. })));
    }

    #[test]
    fn removal_releases_and_reindexes() {
        let mut attrs = sequence_with(3);
        let seq = attrs
            .get_sequence_mut(tags::REFERENCED_SERIES_SEQUENCE)
            .unwrap();
        let removed = seq.remove(0).unwrap();
        assert!(removed.is_root());
        assert_eq!(seq.get(0).unwrap().item_index(), Some(0));
        assert_eq!(seq.get(1).unwrap().item_index(), Some(1));
        seq.push(removed).unwrap();
        assert_eq!(seq.get(2).unwrap().item_index(), Some(2));
        seq.clear();
        assert!(seq.is_empty());
    }
}
