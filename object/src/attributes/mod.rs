//! The attribute set container.
//!
//! [`Attributes`] keeps its elements in three parallel vectors
//! (tags, value representations and value slots) sorted by tag,
//! so that lookups are binary searches and iteration follows tag order.
//!
//! Private elements are addressed through an [`ElementKey`]
//! combining the tag with the private creator which reserved its block,
//! so that the concrete block an element landed in does not matter.
//!
//! Getters never fail on malformed data:
//! they return `None` and log the reason at debug level.
//! Setters validate the combination of VR and value
//! and return an error when it makes no sense.

mod copy;
mod diff;
mod matching;
mod read;
mod write;

pub use self::copy::{CopyMode, Selection};
pub use self::read::ReadError;
pub use self::write::WriteError;

use crate::fragments::Fragments;
use crate::sequence::{self, Owner, Sequence};
use crate::value::{EncodeContext, EncodeValue, Value};
use chrono::{DateTime, FixedOffset, Local};
use dicom_attrs_core::dictionary::{standard_dictionary, DataDictionary};
use dicom_attrs_core::header::{Tag, VR};
use dicom_attrs_core::selector::{AttributeSelector, ItemPointer, ValueSelector};
use dicom_attrs_core::tags;
use dicom_attrs_core::value::numeric::IS_UNPARSEABLE;
use dicom_attrs_core::value::temporal::{
    combine_date_time, format_temporal, format_timezone_offset, parse_da, parse_temporal,
    parse_timezone_offset, parse_tm,
};
use dicom_attrs_core::value::{DatePrecision, DateRange, PersonName, PrimitiveValue, ValueType, C};
use dicom_attrs_encoding::convert::{self, split_text, ValueCodec};
use dicom_attrs_encoding::encode::EncodeOptions;
use dicom_attrs_encoding::SpecificCharacterSet;
use once_cell::unsync::OnceCell;
use snafu::{ensure, Backtrace, OptionExt, ResultExt, Snafu};
use std::borrow::Cow;
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// All 240 private blocks of a group are taken.
    #[snafu(display("No free private block in group {:04X} for creator `{}`", group, creator))]
    PrivateBlockExhausted {
        group: u16,
        creator: String,
        backtrace: Backtrace,
    },
    #[snafu(display("Cannot store {} in {} element {}", kind, vr, tag))]
    IncompatibleValue {
        tag: Tag,
        vr: VR,
        kind: &'static str,
        backtrace: Backtrace,
    },
    #[snafu(display("Cannot reinterpret {} element {} as {}", from, tag, to))]
    IncompatibleVr {
        tag: Tag,
        from: VR,
        to: VR,
        backtrace: Backtrace,
    },
    #[snafu(display("Invalid {} value for {}", vr, tag))]
    InvalidValue {
        tag: Tag,
        vr: VR,
        #[snafu(backtrace)]
        source: convert::Error,
    },
    #[snafu(display("No such element {}", tag))]
    NoSuchElement { tag: Tag, backtrace: Backtrace },
    #[snafu(display("Invalid item operation on sequence {}", tag))]
    Item {
        tag: Tag,
        #[snafu(backtrace)]
        source: sequence::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The address of a data element:
/// a tag, plus the private creator for private elements.
///
/// With a creator, the low byte of a private tag is the offset
/// of the element in the block reserved by that creator,
/// so `(0041,0010)` and `(0041,1010)` name the same element.
/// Creator elements themselves are addressed by plain tags.
///
/// ```
/// # use dicom_attrs_core::Tag;
/// # use dicom_attrs_object::ElementKey;
/// let key: ElementKey = ("ACME 1.0", Tag(0x0041, 0x0010)).into();
/// assert_eq!(key.private_creator, Some("ACME 1.0"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementKey<'a> {
    pub private_creator: Option<&'a str>,
    pub tag: Tag,
}

impl<'a> ElementKey<'a> {
    pub fn new(tag: Tag) -> Self {
        ElementKey {
            private_creator: None,
            tag,
        }
    }

    pub fn private(private_creator: &'a str, tag: Tag) -> Self {
        ElementKey {
            private_creator: Some(private_creator),
            tag,
        }
    }
}

impl From<Tag> for ElementKey<'_> {
    fn from(tag: Tag) -> Self {
        ElementKey::new(tag)
    }
}

impl<'a> From<(&'a str, Tag)> for ElementKey<'a> {
    fn from((private_creator, tag): (&'a str, Tag)) -> Self {
        ElementKey::private(private_creator, tag)
    }
}

impl<'a> From<(Option<&'a str>, Tag)> for ElementKey<'a> {
    fn from((private_creator, tag): (Option<&'a str>, Tag)) -> Self {
        ElementKey {
            private_creator,
            tag,
        }
    }
}

impl<'a> From<&'a AttributeSelector> for ElementKey<'a> {
    fn from(selector: &'a AttributeSelector) -> Self {
        ElementKey {
            private_creator: selector.private_creator.as_deref(),
            tag: selector.tag,
        }
    }
}

impl<'a> From<&'a ItemPointer> for ElementKey<'a> {
    fn from(pointer: &'a ItemPointer) -> Self {
        ElementKey {
            private_creator: pointer.private_creator.as_deref(),
            tag: pointer.sequence_tag,
        }
    }
}

/// The context an item inherits from the data set owning its sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Inherited {
    pub charset: Option<SpecificCharacterSet>,
    pub timezone: Option<FixedOffset>,
    pub default_timezone: Option<FixedOffset>,
}

/// A stored value along with its decode caches.
///
/// The caches hold the decoded form of raw or textual values
/// and are internal: they never change what the value denotes.
#[derive(Debug, Clone, Default)]
pub(crate) struct Slot {
    pub value: Value,
    strings: OnceCell<C<String>>,
    numbers: OnceCell<PrimitiveValue>,
}

impl Slot {
    fn new(value: Value) -> Self {
        Slot {
            value,
            strings: OnceCell::new(),
            numbers: OnceCell::new(),
        }
    }
}

/// Callback for [`Attributes::accept`].
pub trait AttributesVisitor {
    /// Visit one element of `attrs`. Returning `false` stops the walk.
    fn visit(&mut self, attrs: &Attributes, tag: Tag, vr: VR, value: &Value) -> bool;
}

impl<F> AttributesVisitor for F
where
    F: FnMut(&Attributes, Tag, VR, &Value) -> bool,
{
    fn visit(&mut self, attrs: &Attributes, tag: Tag, vr: VR, value: &Value) -> bool {
        self(attrs, tag, vr, value)
    }
}

/// An ordered set of data elements, either a top-level data set
/// or an item of a sequence.
#[derive(Debug)]
pub struct Attributes {
    tags: Vec<Tag>,
    vrs: Vec<VR>,
    slots: Vec<Slot>,
    big_endian: bool,
    /// from (0008,0005)
    charset: Option<SpecificCharacterSet>,
    /// from (0008,0201)
    timezone: Option<FixedOffset>,
    default_timezone: Option<FixedOffset>,
    inherited: Inherited,
    /// the position within the root data set, if contained by a sequence
    parent: Option<Vec<ItemPointer>>,
}

impl Default for Attributes {
    fn default() -> Self {
        Attributes::new()
    }
}

impl Clone for Attributes {
    /// Deep copy. The copy does not belong to any sequence,
    /// but keeps the context inherited by the original.
    fn clone(&self) -> Self {
        let mut copy = Attributes {
            tags: self.tags.clone(),
            vrs: self.vrs.clone(),
            slots: self.slots.clone(),
            big_endian: self.big_endian,
            charset: self.charset.clone(),
            timezone: self.timezone,
            default_timezone: self.default_timezone,
            inherited: self.inherited.clone(),
            parent: None,
        };
        copy.update_children();
        copy
    }
}

impl PartialEq for Attributes {
    fn eq(&self, other: &Self) -> bool {
        self.tags == other.tags
            && self.vrs == other.vrs
            && (0..self.tags.len()).all(|i| diff::equal_values(self, i, other, i))
    }
}

impl Attributes {
    /// Create an empty little endian data set.
    pub fn new() -> Self {
        Self::with_endianness(false, 0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_endianness(false, capacity)
    }

    /// Create an empty data set with the given byte order
    /// for the raw values it will hold.
    pub fn with_endianness(big_endian: bool, capacity: usize) -> Self {
        Attributes {
            tags: Vec::with_capacity(capacity),
            vrs: Vec::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            big_endian,
            charset: None,
            timezone: None,
            default_timezone: None,
            inherited: Inherited::default(),
            parent: None,
        }
    }

    pub fn is_big_endian(&self) -> bool {
        self.big_endian
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// The tags of all elements, in ascending order.
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Iterate over all elements in tag order.
    pub fn iter(&self) -> impl Iterator<Item = (Tag, VR, &Value)> + '_ {
        self.tags
            .iter()
            .zip(&self.vrs)
            .zip(&self.slots)
            .map(|((&tag, &vr), slot)| (tag, vr, &slot.value))
    }

    // --- context ---

    /// The character sets in effect for this data set:
    /// its own Specific Character Set, or the one inherited
    /// from the data set owning it, or the default repertoire.
    pub fn specific_character_set(&self) -> &SpecificCharacterSet {
        self.charset
            .as_ref()
            .or(self.inherited.charset.as_ref())
            .unwrap_or_else(|| SpecificCharacterSet::default_ref())
    }

    /// The time zone declared by Timezone Offset From UTC,
    /// here or in an enclosing data set.
    pub fn timezone(&self) -> Option<FixedOffset> {
        self.timezone.or(self.inherited.timezone)
    }

    /// The time zone assumed for dates and times
    /// when no Timezone Offset From UTC is declared.
    pub fn default_timezone(&self) -> Option<FixedOffset> {
        self.default_timezone.or(self.inherited.default_timezone)
    }

    pub fn set_default_timezone(&mut self, timezone: Option<FixedOffset>) {
        self.default_timezone = timezone;
        self.update_children();
    }

    /// The time zone used to interpret dates and times:
    /// the declared one, else the default one, else the local one.
    pub fn resolved_timezone(&self) -> FixedOffset {
        self.timezone()
            .or_else(|| self.default_timezone())
            .unwrap_or_else(|| *Local::now().offset())
    }

    /// Set Timezone Offset From UTC (0008,0201).
    pub fn set_timezone_offset(&mut self, offset: FixedOffset) -> Result<Option<Value>> {
        self.set_string(
            tags::TIMEZONE_OFFSET_FROM_UTC,
            VR::SH,
            &format_timezone_offset(offset),
        )
    }

    /// Set Specific Character Set (0008,0005) from its defined terms.
    pub fn set_specific_character_set<S: AsRef<str>>(&mut self, codes: &[S]) -> Result<Option<Value>> {
        self.set_strings(tags::SPECIFIC_CHARACTER_SET, VR::CS, codes)
    }

    fn child_context(&self) -> Inherited {
        Inherited {
            charset: self.charset.clone().or_else(|| self.inherited.charset.clone()),
            timezone: self.timezone(),
            default_timezone: self.default_timezone(),
        }
    }

    pub(crate) fn child_owner(&self) -> Owner {
        Owner {
            pointers: self.item_pointers().to_vec(),
            big_endian: self.big_endian,
            inherited: self.child_context(),
        }
    }

    /// Re-read the character sets and time zone declared by this data set,
    /// after one of their elements changed.
    fn refresh_context(&mut self) {
        self.charset = self.search(tags::SPECIFIC_CHARACTER_SET).ok().and_then(|i| {
            let codes = self.strings_at(i)?;
            if codes.is_empty() {
                None
            } else {
                Some(SpecificCharacterSet::from_codes(&codes))
            }
        });
        self.timezone = self
            .search(tags::TIMEZONE_OFFSET_FROM_UTC)
            .ok()
            .and_then(|i| self.strings_at(i)?.first().cloned())
            .and_then(|text| {
                let offset = parse_timezone_offset(&text);
                if offset.is_none() {
                    warn!("Ignoring invalid Timezone Offset From UTC `{}`", text);
                }
                offset
            });
        self.invalidate_strings();
        self.update_children();
    }

    fn invalidate_strings(&mut self) {
        for slot in &mut self.slots {
            slot.strings = OnceCell::new();
        }
    }

    /// Pass the position and context of this data set down to its items.
    fn update_children(&mut self) {
        if !self.slots.iter().any(|s| matches!(s.value, Value::Sequence(_))) {
            return;
        }
        let owner = self.child_owner();
        for slot in &mut self.slots {
            if let Value::Sequence(seq) = &mut slot.value {
                seq.set_owner(owner.clone());
            }
        }
    }

    pub(crate) fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    pub(crate) fn attach(&mut self, pointers: Vec<ItemPointer>, inherited: Inherited) {
        self.parent = Some(pointers);
        if self.inherited != inherited {
            self.inherited = inherited;
            self.invalidate_strings();
        }
        self.update_children();
    }

    pub(crate) fn detach(&mut self) {
        self.parent = None;
        self.update_children();
    }

    pub(crate) fn set_item_pointers(&mut self, pointers: Vec<ItemPointer>) {
        self.parent = Some(pointers);
        self.update_children();
    }

    // --- navigation ---

    /// The path of items from the root data set to this one,
    /// empty for a root data set.
    pub fn item_pointers(&self) -> &[ItemPointer] {
        self.parent.as_deref().unwrap_or(&[])
    }

    /// The index of this item within its sequence.
    pub fn item_index(&self) -> Option<usize> {
        self.item_pointers().last().and_then(|p| p.item_index)
    }

    /// The nesting level, 0 for a root data set.
    pub fn level(&self) -> usize {
        self.item_pointers().len()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Follow a path of items down from this data set.
    /// Pointers without an item index select the first item.
    pub fn get_nested(&self, pointers: &[ItemPointer]) -> Option<&Attributes> {
        let mut current = self;
        for pointer in pointers {
            current = current
                .get_sequence(pointer)?
                .get(pointer.item_index.unwrap_or(0))?;
        }
        Some(current)
    }

    pub fn get_nested_mut(&mut self, pointers: &[ItemPointer]) -> Option<&mut Attributes> {
        let mut current = self;
        for pointer in pointers {
            current = current
                .get_sequence_mut(pointer)?
                .get_mut(pointer.item_index.unwrap_or(0))?;
        }
        Some(current)
    }

    /// Retrieve the string addressed by a value selector.
    pub fn select_string(&self, selector: &ValueSelector) -> Option<String> {
        self.get_nested(&selector.attribute.item_pointers)?
            .get_string_at(&selector.attribute, selector.value_index)
    }

    /// Walk the elements of this data set depth-first.
    /// Returns `false` if the visitor stopped the walk.
    pub fn accept<V>(&self, visitor: &mut V, visit_nested: bool) -> bool
    where
        V: AttributesVisitor + ?Sized,
    {
        for i in 0..self.tags.len() {
            let value = &self.slots[i].value;
            if !visitor.visit(self, self.tags[i], self.vrs[i], value) {
                return false;
            }
            if let (true, Value::Sequence(seq)) = (visit_nested, value) {
                for item in seq {
                    if !item.accept(visitor, true) {
                        return false;
                    }
                }
            }
        }
        true
    }

    // --- lookup ---

    pub(crate) fn search(&self, tag: Tag) -> std::result::Result<usize, usize> {
        self.tags.binary_search(&tag)
    }

    /// Resolve a key to the tag it is stored at,
    /// `None` if its private creator is not registered here.
    fn resolve(&self, key: ElementKey<'_>) -> Option<Tag> {
        match key.private_creator {
            Some(creator) if key.tag.is_private() => {
                let creator_tag = self.creator_tag(creator, key.tag.group())?;
                Some(key.tag.in_private_block(creator_tag))
            }
            _ => Some(key.tag),
        }
    }

    /// Resolve a key to the tag it is stored at,
    /// reserving a private block for its creator if needed.
    fn resolve_for_write(&mut self, key: ElementKey<'_>) -> Result<(Tag, Option<String>)> {
        match key.private_creator {
            Some(creator) if key.tag.is_private() => {
                let creator_tag = self.reserve_creator(creator, key.tag.group())?;
                Ok((key.tag.in_private_block(creator_tag), Some(creator.to_owned())))
            }
            _ => Ok((key.tag, self.private_creator_of(key.tag))),
        }
    }

    /// The position of the element with the given key, if present.
    pub fn index_of<'k>(&self, key: impl Into<ElementKey<'k>>) -> Option<usize> {
        let tag = self.resolve(key.into())?;
        self.search(tag).ok()
    }

    pub fn contains<'k>(&self, key: impl Into<ElementKey<'k>>) -> bool {
        self.index_of(key).is_some()
    }

    /// Whether the element is present with a non-empty value.
    pub fn contains_value<'k>(&self, key: impl Into<ElementKey<'k>>) -> bool {
        self.get_value(key).map_or(false, |v| !v.is_empty())
    }

    pub fn vr_of<'k>(&self, key: impl Into<ElementKey<'k>>) -> Option<VR> {
        self.index_of(key).map(|i| self.vrs[i])
    }

    pub fn get_value<'k>(&self, key: impl Into<ElementKey<'k>>) -> Option<&Value> {
        self.index_of(key).map(|i| &self.slots[i].value)
    }

    /// The tag of the creator element which reserved a block
    /// for `creator` in the given private group.
    pub fn creator_tag(&self, creator: &str, group: u16) -> Option<Tag> {
        let (start, end) = self.creator_range(group);
        (start..end)
            .find(|&i| self.creator_at(i).as_deref() == Some(creator.trim_end()))
            .map(|i| self.tags[i])
    }

    /// The private creator which reserved the block of a private element.
    pub fn private_creator_of(&self, tag: Tag) -> Option<String> {
        if !tag.is_private() || tag.is_private_creator() || tag.element() < 0x1000 {
            return None;
        }
        let index = self.search(tag.creator_tag()).ok()?;
        self.creator_at(index)
    }

    fn creator_range(&self, group: u16) -> (usize, usize) {
        let start = self.search(Tag(group, 0x0010)).unwrap_or_else(|i| i);
        let end = self.search(Tag(group, 0x0100)).unwrap_or_else(|i| i);
        (start, end)
    }

    fn creator_at(&self, index: usize) -> Option<String> {
        self.strings_at(index)?.first().cloned()
    }

    fn reserve_creator(&mut self, creator: &str, group: u16) -> Result<Tag> {
        if let Some(tag) = self.creator_tag(creator, group) {
            return Ok(tag);
        }
        let (start, end) = self.creator_range(group);
        let element = if end > start {
            self.tags[end - 1].element() + 1
        } else {
            0x0010
        };
        ensure!(
            element <= 0x00FF,
            PrivateBlockExhaustedSnafu {
                group,
                creator: creator.to_owned()
            }
        );
        let tag = Tag(group, element);
        self.insert_value(
            tag,
            VR::LO,
            Value::Primitive(PrimitiveValue::from_strs([creator.trim_end()])),
        );
        Ok(tag)
    }

    // --- storage ---

    /// Store a value at a concrete tag, returning its position
    /// and the value it replaced.
    pub(crate) fn insert_value(&mut self, tag: Tag, vr: VR, mut value: Value) -> (usize, Option<Value>) {
        if let Value::Sequence(seq) = &mut value {
            let creator = self.private_creator_of(tag);
            seq.bind(tag, creator, self.child_owner());
        }
        let (index, old) = match self.search(tag) {
            Ok(i) => {
                self.vrs[i] = vr;
                let old = std::mem::replace(&mut self.slots[i], Slot::new(value));
                (i, Some(old.value))
            }
            Err(i) => {
                self.tags.insert(i, tag);
                self.vrs.insert(i, vr);
                self.slots.insert(i, Slot::new(value));
                (i, None)
            }
        };
        if tag == tags::SPECIFIC_CHARACTER_SET || tag == tags::TIMEZONE_OFFSET_FROM_UTC {
            self.refresh_context();
        }
        (index, old)
    }

    fn remove_at(&mut self, index: usize) -> Value {
        let tag = self.tags.remove(index);
        self.vrs.remove(index);
        let slot = self.slots.remove(index);
        if tag == tags::SPECIFIC_CHARACTER_SET || tag == tags::TIMEZONE_OFFSET_FROM_UTC {
            self.refresh_context();
        }
        slot.value
    }

    fn check_primitive(&self, tag: Tag, vr: VR, value: PrimitiveValue, kind: &'static str) -> Result<PrimitiveValue> {
        let vt = vr.value_type();
        let compatible = match &value {
            PrimitiveValue::Empty => true,
            _ if vt.is_sequence() => false,
            PrimitiveValue::Bytes(_) => true,
            PrimitiveValue::Strs(strs) => {
                let text = strs.join("\\");
                let split = if vt.is_string() {
                    split_text(vt, &text)
                } else {
                    split_text(ValueType::Ascii, &text)
                };
                let value = PrimitiveValue::from_strs(split);
                if vt.is_string() {
                    return Ok(value);
                }
                // binary values given as text are stored encoded
                let bytes = vt
                    .to_bytes(&value, self.big_endian, SpecificCharacterSet::default_ref())
                    .context(InvalidValueSnafu { tag, vr })?;
                return Ok(PrimitiveValue::from_bytes(bytes));
            }
            PrimitiveValue::Ints(_) | PrimitiveValue::Longs(_) => {
                vt.is_binary() || matches!(vt, ValueType::Is | ValueType::Ds)
            }
            PrimitiveValue::Floats(_) | PrimitiveValue::Doubles(_) => {
                vt.is_binary() || vt == ValueType::Ds
            }
        };
        ensure!(compatible, IncompatibleValueSnafu { tag, vr, kind });
        Ok(value)
    }

    fn set_primitive(
        &mut self,
        key: ElementKey<'_>,
        vr: VR,
        value: PrimitiveValue,
        kind: &'static str,
    ) -> Result<Option<Value>> {
        let (tag, _) = self.resolve_for_write(key)?;
        let value = self.check_primitive(tag, vr, value, kind)?;
        Ok(self.insert_value(tag, vr, Value::Primitive(value)).1)
    }

    // --- setters ---

    /// Store a value of any kind, returning the value it replaced.
    ///
    /// Sequences must have the byte order of this data set,
    /// and fragments are converted to it.
    pub fn set_value<'k>(
        &mut self,
        key: impl Into<ElementKey<'k>>,
        vr: VR,
        value: Value,
    ) -> Result<Option<Value>> {
        let key = key.into();
        match value {
            Value::Primitive(v) => self.set_primitive(key, vr, v, "a primitive value"),
            Value::Sequence(seq) => {
                let (tag, _) = self.resolve_for_write(key)?;
                ensure!(
                    vr == VR::SQ,
                    IncompatibleValueSnafu {
                        tag,
                        vr,
                        kind: "a sequence"
                    }
                );
                if seq.is_big_endian() != self.big_endian && !seq.is_empty() {
                    return Err(sequence::Error::EndianMismatch {
                        backtrace: Backtrace::capture(),
                    })
                    .context(ItemSnafu { tag });
                }
                Ok(self.insert_value(tag, vr, Value::Sequence(seq)).1)
            }
            Value::Fragments(fragments) => {
                let (tag, _) = self.resolve_for_write(key)?;
                ensure!(
                    !vr.value_type().is_sequence() && !vr.value_type().is_string(),
                    IncompatibleValueSnafu {
                        tag,
                        vr,
                        kind: "fragments"
                    }
                );
                let fragments = fragments.with_endianness(self.big_endian);
                Ok(self.insert_value(tag, vr, Value::Fragments(fragments)).1)
            }
        }
    }

    /// Store the element with the empty value.
    pub fn set_null<'k>(&mut self, key: impl Into<ElementKey<'k>>, vr: VR) -> Result<Option<Value>> {
        let (tag, _) = self.resolve_for_write(key.into())?;
        Ok(self.insert_value(tag, vr, Value::EMPTY).1)
    }

    /// Store raw value bytes, in the byte order of this data set.
    pub fn set_bytes<'k>(&mut self, key: impl Into<ElementKey<'k>>, vr: VR, bytes: Vec<u8>) -> Result<Option<Value>> {
        self.set_primitive(key.into(), vr, PrimitiveValue::from_bytes(bytes), "bytes")
    }

    pub fn set_string<'k>(&mut self, key: impl Into<ElementKey<'k>>, vr: VR, value: &str) -> Result<Option<Value>> {
        self.set_strings(key, vr, &[value])
    }

    pub fn set_strings<'k, S: AsRef<str>>(
        &mut self,
        key: impl Into<ElementKey<'k>>,
        vr: VR,
        values: &[S],
    ) -> Result<Option<Value>> {
        let value = PrimitiveValue::from_strs(values.iter().map(|s| s.as_ref().to_owned()));
        self.set_primitive(key.into(), vr, value, "strings")
    }

    pub fn set_int<'k>(&mut self, key: impl Into<ElementKey<'k>>, vr: VR, value: i32) -> Result<Option<Value>> {
        self.set_ints(key, vr, &[value])
    }

    pub fn set_ints<'k>(&mut self, key: impl Into<ElementKey<'k>>, vr: VR, values: &[i32]) -> Result<Option<Value>> {
        self.set_primitive(key.into(), vr, PrimitiveValue::Ints(values.into()), "integers")
    }

    pub fn set_long<'k>(&mut self, key: impl Into<ElementKey<'k>>, vr: VR, value: i64) -> Result<Option<Value>> {
        self.set_longs(key, vr, &[value])
    }

    pub fn set_longs<'k>(&mut self, key: impl Into<ElementKey<'k>>, vr: VR, values: &[i64]) -> Result<Option<Value>> {
        self.set_primitive(key.into(), vr, PrimitiveValue::Longs(values.into()), "long integers")
    }

    pub fn set_float<'k>(&mut self, key: impl Into<ElementKey<'k>>, vr: VR, value: f32) -> Result<Option<Value>> {
        self.set_floats(key, vr, &[value])
    }

    pub fn set_floats<'k>(&mut self, key: impl Into<ElementKey<'k>>, vr: VR, values: &[f32]) -> Result<Option<Value>> {
        self.set_primitive(key.into(), vr, PrimitiveValue::Floats(values.into()), "floats")
    }

    pub fn set_double<'k>(&mut self, key: impl Into<ElementKey<'k>>, vr: VR, value: f64) -> Result<Option<Value>> {
        self.set_doubles(key, vr, &[value])
    }

    pub fn set_doubles<'k>(&mut self, key: impl Into<ElementKey<'k>>, vr: VR, values: &[f64]) -> Result<Option<Value>> {
        self.set_primitive(key.into(), vr, PrimitiveValue::Doubles(values.into()), "doubles")
    }

    /// Store a date, time or date-time with full precision.
    pub fn set_date<'k>(
        &mut self,
        key: impl Into<ElementKey<'k>>,
        vr: VR,
        value: &DateTime<FixedOffset>,
    ) -> Result<Option<Value>> {
        self.set_date_with_precision(key, vr, value, DatePrecision::default())
    }

    pub fn set_date_with_precision<'k>(
        &mut self,
        key: impl Into<ElementKey<'k>>,
        vr: VR,
        value: &DateTime<FixedOffset>,
        precision: DatePrecision,
    ) -> Result<Option<Value>> {
        self.set_dates(key, vr, std::slice::from_ref(value), precision)
    }

    pub fn set_dates<'k>(
        &mut self,
        key: impl Into<ElementKey<'k>>,
        vr: VR,
        values: &[DateTime<FixedOffset>],
        precision: DatePrecision,
    ) -> Result<Option<Value>> {
        let key = key.into();
        let strs: Option<Vec<String>> = values
            .iter()
            .map(|dt| format_temporal(vr, dt, precision))
            .collect();
        let strs = strs.context(IncompatibleValueSnafu {
            tag: key.tag,
            vr,
            kind: "dates",
        })?;
        self.set_primitive(key, vr, PrimitiveValue::from_strs(strs), "dates")
    }

    /// Store a date-time into a pair of DA and TM elements.
    pub fn set_date_time(
        &mut self,
        date_tag: Tag,
        time_tag: Tag,
        value: &DateTime<FixedOffset>,
    ) -> Result<()> {
        self.set_date(date_tag, VR::DA, value)?;
        self.set_date(time_tag, VR::TM, value)?;
        Ok(())
    }

    pub fn set_date_range<'k>(
        &mut self,
        key: impl Into<ElementKey<'k>>,
        vr: VR,
        range: &DateRange,
    ) -> Result<Option<Value>> {
        let key = key.into();
        ensure!(
            vr.is_temporal(),
            IncompatibleValueSnafu {
                tag: key.tag,
                vr,
                kind: "a date range"
            }
        );
        let text = range.to_dicom_string(vr, DatePrecision::default());
        self.set_primitive(key, vr, PrimitiveValue::from_strs([text]), "a date range")
    }

    pub fn set_person_name<'k>(&mut self, key: impl Into<ElementKey<'k>>, name: &PersonName) -> Result<Option<Value>> {
        self.set_string(key, VR::PN, &name.to_string())
    }

    /// Create an empty sequence, replacing any element at the key.
    pub fn new_sequence<'k>(&mut self, key: impl Into<ElementKey<'k>>, capacity: usize) -> Result<&mut Sequence> {
        let (tag, creator) = self.resolve_for_write(key.into())?;
        let seq = Sequence::new(tag, creator, self.child_owner(), capacity);
        let (index, _) = self.insert_value(tag, VR::SQ, Value::Sequence(seq));
        self.slots[index]
            .value
            .sequence_mut()
            .context(NoSuchElementSnafu { tag })
    }

    /// Retrieve the sequence at the key, creating it if absent
    /// or not a sequence.
    pub fn ensure_sequence<'k>(&mut self, key: impl Into<ElementKey<'k>>, capacity: usize) -> Result<&mut Sequence> {
        let key = key.into();
        match self.index_of(key) {
            Some(i) if self.slots[i].value.sequence().is_some() => {
                let tag = self.tags[i];
                self.slots[i]
                    .value
                    .sequence_mut()
                    .context(NoSuchElementSnafu { tag })
            }
            _ => self.new_sequence(key, capacity),
        }
    }

    /// Create an empty list of fragments, replacing any element at the key.
    pub fn new_fragments<'k>(
        &mut self,
        key: impl Into<ElementKey<'k>>,
        vr: VR,
        capacity: usize,
    ) -> Result<&mut Fragments> {
        let (tag, _) = self.resolve_for_write(key.into())?;
        let fragments = Fragments::with_capacity(vr, self.big_endian, capacity);
        let (index, _) = self.insert_value(tag, vr, Value::Fragments(fragments));
        self.slots[index]
            .value
            .fragments_mut()
            .context(NoSuchElementSnafu { tag })
    }

    /// Reinterpret the stored value of an element under another VR.
    ///
    /// Only the empty value, raw bytes and text kept as text
    /// can be reinterpreted.
    pub fn update_vr<'k>(&mut self, key: impl Into<ElementKey<'k>>, vr: VR) -> Result<()> {
        let key = key.into();
        let index = self.index_of(key).context(NoSuchElementSnafu { tag: key.tag })?;
        let from = self.vrs[index];
        if from == vr {
            return Ok(());
        }
        let compatible = match &self.slots[index].value {
            Value::Primitive(PrimitiveValue::Empty) => true,
            Value::Primitive(PrimitiveValue::Bytes(_)) => !vr.value_type().is_sequence(),
            Value::Primitive(PrimitiveValue::Strs(_)) => {
                from.value_type().is_string() && vr.value_type().is_string()
            }
            _ => false,
        };
        ensure!(
            compatible,
            IncompatibleVrSnafu {
                tag: self.tags[index],
                from,
                to: vr
            }
        );
        self.vrs[index] = vr;
        let value = std::mem::take(&mut self.slots[index].value);
        self.slots[index] = Slot::new(value);
        Ok(())
    }

    // --- removal ---

    /// Remove an element, returning its value.
    pub fn remove<'k>(&mut self, key: impl Into<ElementKey<'k>>) -> Option<Value> {
        let index = self.index_of(key)?;
        Some(self.remove_at(index))
    }

    /// Remove the element addressed by a selector,
    /// in every item its path reaches.
    pub fn remove_selected(&mut self, selector: &AttributeSelector) -> bool {
        fn walk(attrs: &mut Attributes, pointers: &[ItemPointer], selector: &AttributeSelector) -> bool {
            match pointers.split_first() {
                None => attrs.remove(selector).is_some(),
                Some((pointer, rest)) => {
                    let Some(seq) = attrs.get_sequence_mut(pointer) else {
                        return false;
                    };
                    match pointer.item_index {
                        Some(i) => seq.get_mut(i).map_or(false, |item| walk(item, rest, selector)),
                        None => seq
                            .iter_mut()
                            .fold(false, |acc, item| walk(item, rest, selector) || acc),
                    }
                }
            }
        }
        walk(self, &selector.item_pointers, selector)
    }

    /// Remove private elements, returning how many were removed.
    ///
    /// With a creator, only its blocks and creator elements are removed.
    /// With a group, only that group is considered.
    pub fn remove_private_attributes(&mut self, creator: Option<&str>, group: Option<u16>) -> usize {
        let before = self.tags.len();
        let blocks: Vec<Tag> = match creator {
            Some(creator) => {
                let groups: Vec<u16> = match group {
                    Some(g) => vec![g],
                    None => self.tags.iter().map(|t| t.group()).filter(|g| g & 1 == 1).collect(),
                };
                let mut blocks: Vec<Tag> = groups
                    .into_iter()
                    .filter_map(|g| self.creator_tag(creator, g))
                    .collect();
                blocks.dedup();
                blocks
            }
            None => Vec::new(),
        };
        let mut i = 0;
        while i < self.tags.len() {
            let tag = self.tags[i];
            let in_scope = tag.is_private()
                && group.map_or(true, |g| tag.group() == g)
                && (creator.is_none()
                    || blocks.iter().any(|&b| {
                        tag == b || (tag.group() == b.group() && tag.element() >> 8 == b.element())
                    }));
            if in_scope {
                self.remove_at(i);
            } else {
                i += 1;
            }
        }
        before - self.tags.len()
    }

    pub fn clear(&mut self) {
        self.tags.clear();
        self.vrs.clear();
        self.slots.clear();
        self.refresh_context();
    }

    // --- decoding ---

    fn primitive_at(&self, index: usize) -> Option<(ValueType, &PrimitiveValue)> {
        match &self.slots[index].value {
            Value::Primitive(v) => Some((self.vrs[index].value_type(), v)),
            _ => {
                debug!("{} is not a primitive value", self.tags[index]);
                None
            }
        }
    }

    fn degrade<T>(&self, index: usize, result: convert::Result<T>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                debug!("Cannot decode {} {}: {}", self.tags[index], self.vrs[index], e);
                None
            }
        }
    }

    /// The string components of a primitive value,
    /// decoded once and cached for text values.
    pub(crate) fn strings_at(&self, index: usize) -> Option<Cow<'_, C<String>>> {
        let (vt, value) = self.primitive_at(index)?;
        match value {
            PrimitiveValue::Strs(strs) if vt.is_string() => Some(Cow::Borrowed(strs)),
            PrimitiveValue::Bytes(_) if vt.is_string() => {
                let slot = &self.slots[index];
                if let Some(strs) = slot.strings.get() {
                    return Some(Cow::Borrowed(strs));
                }
                let strs = self.degrade(
                    index,
                    vt.to_strings(value, self.big_endian, self.specific_character_set()),
                )?;
                Some(Cow::Borrowed(slot.strings.get_or_init(|| strs)))
            }
            _ => self
                .degrade(
                    index,
                    vt.to_strings(value, self.big_endian, self.specific_character_set()),
                )
                .map(Cow::Owned),
        }
    }

    /// The parsed numbers of a DS or IS value, decoded once and cached.
    fn parsed_numbers(&self, index: usize) -> Option<&PrimitiveValue> {
        let (vt, value) = self.primitive_at(index)?;
        if !matches!(vt, ValueType::Ds | ValueType::Is)
            || !matches!(value, PrimitiveValue::Bytes(_) | PrimitiveValue::Strs(_))
        {
            return None;
        }
        Some(self.slots[index].numbers.get_or_init(|| {
            let parsed = if vt == ValueType::Is {
                vt.to_ints(value, self.big_endian).map(PrimitiveValue::Ints)
            } else {
                vt.to_doubles(value, self.big_endian).map(PrimitiveValue::Doubles)
            };
            parsed.unwrap_or_default()
        }))
    }

    fn ints_at(&self, index: usize) -> Option<C<i32>> {
        match self.parsed_numbers(index) {
            Some(PrimitiveValue::Ints(v)) => Some(v.clone()),
            Some(PrimitiveValue::Doubles(v)) => Some(
                v.iter()
                    .map(|&d| {
                        if d.is_finite() && d >= f64::from(i32::MIN) && d <= f64::from(i32::MAX) {
                            d as i32
                        } else {
                            IS_UNPARSEABLE
                        }
                    })
                    .collect(),
            ),
            _ => {
                let (vt, value) = self.primitive_at(index)?;
                self.degrade(index, vt.to_ints(value, self.big_endian))
            }
        }
    }

    fn longs_at(&self, index: usize) -> Option<C<i64>> {
        let (vt, value) = self.primitive_at(index)?;
        self.degrade(index, vt.to_longs(value, self.big_endian))
    }

    fn doubles_at(&self, index: usize) -> Option<C<f64>> {
        match self.parsed_numbers(index) {
            Some(PrimitiveValue::Doubles(v)) => Some(v.clone()),
            Some(PrimitiveValue::Ints(v)) => Some(
                v.iter()
                    .map(|&i| if i == IS_UNPARSEABLE { f64::NAN } else { f64::from(i) })
                    .collect(),
            ),
            _ => {
                let (vt, value) = self.primitive_at(index)?;
                self.degrade(index, vt.to_doubles(value, self.big_endian))
            }
        }
    }

    fn floats_at(&self, index: usize) -> Option<C<f32>> {
        let (vt, value) = self.primitive_at(index)?;
        if vt.is_binary() {
            self.degrade(index, vt.to_floats(value, self.big_endian))
        } else {
            self.doubles_at(index)
                .map(|v| v.into_iter().map(|d| d as f32).collect())
        }
    }

    fn is_numeric_string(&self, index: usize) -> bool {
        matches!(self.vrs[index].value_type(), ValueType::Ds | ValueType::Is)
    }

    /// The number of values of the element:
    /// 0 when absent or empty, the number of items of a sequence,
    /// and 1 for inline binary data and fragments.
    pub fn value_multiplicity<'k>(&self, key: impl Into<ElementKey<'k>>) -> usize {
        let Some(index) = self.index_of(key) else {
            return 0;
        };
        let vr = self.vrs[index];
        match &self.slots[index].value {
            v if v.is_empty() => 0,
            Value::Sequence(seq) => seq.len(),
            Value::Fragments(_) => 1,
            Value::Primitive(_) if vr.is_inline_binary() => 1,
            Value::Primitive(value) => {
                let vt = vr.value_type();
                match value {
                    PrimitiveValue::Bytes(bytes) if vt.is_binary() => bytes.len() / vt.element_size(),
                    PrimitiveValue::Ints(v) => v.len(),
                    PrimitiveValue::Longs(v) => v.len(),
                    PrimitiveValue::Floats(v) => v.len(),
                    PrimitiveValue::Doubles(v) => v.len(),
                    _ => self.strings_at(index).map_or(0, |s| s.len()),
                }
            }
        }
    }

    // --- getters ---

    /// All string components of the element.
    /// Present elements with the empty value yield no components.
    pub fn get_strings<'k>(&self, key: impl Into<ElementKey<'k>>) -> Option<C<String>> {
        let index = self.index_of(key)?;
        self.strings_at(index).map(Cow::into_owned)
    }

    /// The first string component of the element,
    /// `None` if absent or empty.
    pub fn get_string<'k>(&self, key: impl Into<ElementKey<'k>>) -> Option<String> {
        self.get_string_at(key, 0)
    }

    pub fn get_string_at<'k>(&self, key: impl Into<ElementKey<'k>>, index: usize) -> Option<String> {
        let i = self.index_of(key)?;
        let strs = self.strings_at(i)?;
        strs.get(index).filter(|s| !s.is_empty()).cloned()
    }

    /// All integer components. Unparseable integer string components
    /// are marked with `i32::MIN`.
    pub fn get_ints<'k>(&self, key: impl Into<ElementKey<'k>>) -> Option<C<i32>> {
        let index = self.index_of(key)?;
        self.ints_at(index)
    }

    pub fn get_int<'k>(&self, key: impl Into<ElementKey<'k>>) -> Option<i32> {
        self.get_int_at(key, 0)
    }

    pub fn get_int_at<'k>(&self, key: impl Into<ElementKey<'k>>, index: usize) -> Option<i32> {
        let i = self.index_of(key)?;
        let v = *self.ints_at(i)?.get(index)?;
        if v == IS_UNPARSEABLE && self.is_numeric_string(i) {
            debug!("Unparseable value of {}", self.tags[i]);
            return None;
        }
        Some(v)
    }

    pub fn get_longs<'k>(&self, key: impl Into<ElementKey<'k>>) -> Option<C<i64>> {
        let index = self.index_of(key)?;
        self.longs_at(index)
    }

    pub fn get_long<'k>(&self, key: impl Into<ElementKey<'k>>) -> Option<i64> {
        let i = self.index_of(key)?;
        let v = *self.longs_at(i)?.first()?;
        if self.is_numeric_string(i) && (v == i64::from(IS_UNPARSEABLE) || v == i64::MIN) {
            return None;
        }
        Some(v)
    }

    /// All double precision components. Unparseable decimal string
    /// components are marked with `NaN`.
    pub fn get_doubles<'k>(&self, key: impl Into<ElementKey<'k>>) -> Option<C<f64>> {
        let index = self.index_of(key)?;
        self.doubles_at(index)
    }

    pub fn get_double<'k>(&self, key: impl Into<ElementKey<'k>>) -> Option<f64> {
        self.get_double_at(key, 0)
    }

    pub fn get_double_at<'k>(&self, key: impl Into<ElementKey<'k>>, index: usize) -> Option<f64> {
        let i = self.index_of(key)?;
        let v = *self.doubles_at(i)?.get(index)?;
        if v.is_nan() && self.is_numeric_string(i) {
            debug!("Unparseable value of {}", self.tags[i]);
            return None;
        }
        Some(v)
    }

    pub fn get_floats<'k>(&self, key: impl Into<ElementKey<'k>>) -> Option<C<f32>> {
        let index = self.index_of(key)?;
        self.floats_at(index)
    }

    pub fn get_float<'k>(&self, key: impl Into<ElementKey<'k>>) -> Option<f32> {
        let i = self.index_of(key)?;
        let v = *self.floats_at(i)?.first()?;
        if v.is_nan() && self.is_numeric_string(i) {
            return None;
        }
        Some(v)
    }

    /// The value bytes in the byte order of this data set,
    /// without padding.
    pub fn get_bytes<'k>(&self, key: impl Into<ElementKey<'k>>) -> Option<Vec<u8>> {
        let index = self.index_of(key)?;
        let (vt, value) = self.primitive_at(index)?;
        self.degrade(
            index,
            vt.to_bytes(value, self.big_endian, self.specific_character_set()),
        )
    }

    /// The first date, time or date-time of the element.
    pub fn get_date<'k>(&self, key: impl Into<ElementKey<'k>>) -> Option<DateTime<FixedOffset>> {
        self.get_date_with_precision(key).map(|(dt, _)| dt)
    }

    /// The first temporal value of the element,
    /// along with the precision found in the text.
    pub fn get_date_with_precision<'k>(
        &self,
        key: impl Into<ElementKey<'k>>,
    ) -> Option<(DateTime<FixedOffset>, DatePrecision)> {
        let index = self.index_of(key)?;
        let text = self.strings_at(index)?.first().cloned()?;
        self.parse_temporal_at(index, &text)
    }

    pub fn get_dates<'k>(&self, key: impl Into<ElementKey<'k>>) -> Option<Vec<DateTime<FixedOffset>>> {
        let index = self.index_of(key)?;
        let strs = self.strings_at(index)?;
        strs.iter()
            .map(|text| self.parse_temporal_at(index, text).map(|(dt, _)| dt))
            .collect()
    }

    fn parse_temporal_at(&self, index: usize, text: &str) -> Option<(DateTime<FixedOffset>, DatePrecision)> {
        match parse_temporal(self.vrs[index], text, self.resolved_timezone(), false) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!("Invalid temporal value `{}` in {}: {}", text, self.tags[index], e);
                None
            }
        }
    }

    /// Combine a date element and a time element into one instant.
    /// An absent time yields midnight.
    pub fn get_date_time(&self, date_tag: Tag, time_tag: Tag) -> Option<DateTime<FixedOffset>> {
        let tz = self.resolved_timezone();
        let date_text = self.get_string(date_tag)?;
        let date = match parse_da(&date_text, tz, false) {
            Ok((date, _)) => date,
            Err(e) => {
                debug!("Invalid date `{}` in {}: {}", date_text, date_tag, e);
                return None;
            }
        };
        match self.get_string(time_tag) {
            None => Some(date),
            Some(time_text) => match parse_tm(&time_text, tz, false) {
                Ok((time, _)) => combine_date_time(&date, &time),
                Err(e) => {
                    debug!("Invalid time `{}` in {}: {}", time_text, time_tag, e);
                    Some(date)
                }
            },
        }
    }

    /// The range denoted by the first value of a temporal element.
    pub fn get_date_range<'k>(&self, key: impl Into<ElementKey<'k>>) -> Option<DateRange> {
        let index = self.index_of(key)?;
        let text = self.strings_at(index)?.first().cloned()?;
        match DateRange::parse(self.vrs[index], &text, self.resolved_timezone()) {
            Ok(range) => Some(range),
            Err(e) => {
                debug!("Invalid range `{}` in {}: {}", text, self.tags[index], e);
                None
            }
        }
    }

    /// Combine a date range element and a time range element into
    /// one range of instants. An absent time range spans whole days.
    pub fn get_date_time_range(&self, date_tag: Tag, time_tag: Tag) -> Option<DateRange> {
        let dates = self.get_date_range(date_tag)?;
        let Some(times) = self.get_date_range(time_tag) else {
            return Some(dates);
        };
        let combine = |d: Option<&DateTime<FixedOffset>>, t: Option<&DateTime<FixedOffset>>| match (d, t) {
            (Some(d), Some(t)) => combine_date_time(d, t),
            (d, _) => d.copied(),
        };
        DateRange::new(
            combine(dates.start(), times.start()),
            combine(dates.end(), times.end()),
        )
        .ok()
    }

    pub fn get_person_name<'k>(&self, key: impl Into<ElementKey<'k>>) -> Option<PersonName> {
        self.get_string(key).map(|s| PersonName::parse(&s))
    }

    pub fn get_sequence<'k>(&self, key: impl Into<ElementKey<'k>>) -> Option<&Sequence> {
        self.get_value(key)?.sequence()
    }

    pub fn get_sequence_mut<'k>(&mut self, key: impl Into<ElementKey<'k>>) -> Option<&mut Sequence> {
        let index = self.index_of(key)?;
        self.slots[index].value.sequence_mut()
    }

    /// An item of the sequence at the key.
    pub fn get_item<'k>(&self, key: impl Into<ElementKey<'k>>, index: usize) -> Option<&Attributes> {
        self.get_sequence(key)?.get(index)
    }

    pub fn get_item_mut<'k>(&mut self, key: impl Into<ElementKey<'k>>, index: usize) -> Option<&mut Attributes> {
        self.get_sequence_mut(key)?.get_mut(index)
    }

    pub fn get_fragments<'k>(&self, key: impl Into<ElementKey<'k>>) -> Option<&Fragments> {
        self.get_value(key)?.fragments()
    }

    pub fn get_fragments_mut<'k>(&mut self, key: impl Into<ElementKey<'k>>) -> Option<&mut Fragments> {
        let index = self.index_of(key)?;
        self.slots[index].value.fragments_mut()
    }

    pub(crate) fn encode_context(&self, options: EncodeOptions, explicit_vr: bool) -> EncodeContext<'_> {
        EncodeContext {
            explicit_vr,
            big_endian: self.big_endian,
            options,
            charset: self.specific_character_set(),
        }
    }

    fn fmt_level(&self, f: &mut fmt::Formatter<'_>, level: usize) -> fmt::Result {
        const MAX_WIDTH: usize = 64;
        let indent = ">".repeat(level);
        for (i, (tag, vr, value)) in self.iter().enumerate() {
            let keyword = if tag.is_private() {
                None
            } else {
                standard_dictionary().keyword_of(tag)
            };
            match value {
                Value::Sequence(seq) => {
                    writeln!(
                        f,
                        "{}{} {} #{} items {}",
                        indent,
                        tag,
                        vr,
                        seq.len(),
                        keyword.unwrap_or("")
                    )?;
                    for (n, item) in seq.iter().enumerate() {
                        writeln!(f, "{}>Item #{}", indent, n + 1)?;
                        item.fmt_level(f, level + 1)?;
                    }
                }
                Value::Fragments(fragments) => {
                    writeln!(
                        f,
                        "{}{} {} #{} fragments {}",
                        indent,
                        tag,
                        vr,
                        fragments.len(),
                        keyword.unwrap_or("")
                    )?;
                }
                Value::Primitive(_) => {
                    let strs = self.strings_at(i).unwrap_or_default();
                    let mut text = strs.join("\\");
                    if text.chars().count() > MAX_WIDTH {
                        text = text.chars().take(MAX_WIDTH).collect::<String>() + "...";
                    }
                    writeln!(
                        f,
                        "{}{} {} [{}] #{} {}",
                        indent,
                        tag,
                        vr,
                        text,
                        strs.len(),
                        keyword.unwrap_or("")
                    )?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_level(f, 0)
    }
}
