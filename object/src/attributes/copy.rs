//! Copying elements from one data set into another.
//!
//! All operations of the copy family share one engine:
//! the elements to copy are planned against the destination first,
//! so that the dry run variants (`test_*`) only need the plan,
//! and the plan is then applied.

use super::{diff, Attributes, ElementKey, Result};
use crate::sequence::Sequence;
use crate::value::{EncodeValue, Value};
use dicom_attrs_core::header::Tag;
use dicom_attrs_core::value::PrimitiveValue;
use dicom_attrs_encoding::convert::ValueCodec;

/// How the elements of a source data set are combined with a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CopyMode {
    /// Copy every selected element which differs from the destination.
    CopyAll,
    /// Copy only elements which are absent or empty in the destination.
    MergeIfAbsent,
    /// Copy every selected element which differs from the destination,
    /// reporting the replaced non-empty values.
    Update,
}

/// The elements of a source data set taking part in a copy.
#[derive(Debug, Clone, Copy)]
pub enum Selection<'a> {
    All,
    /// Only the listed tags.
    Tags(&'a [Tag]),
    /// Only the elements present in another data set.
    /// A non-empty sequence in the selection restricts the elements
    /// copied into each item to those of its first item.
    Attributes(&'a Attributes),
}

impl Default for Selection<'_> {
    fn default() -> Self {
        Selection::All
    }
}

impl<'a> From<&'a [Tag]> for Selection<'a> {
    fn from(tags: &'a [Tag]) -> Self {
        Selection::Tags(tags)
    }
}

impl<'a, const N: usize> From<&'a [Tag; N]> for Selection<'a> {
    fn from(tags: &'a [Tag; N]) -> Self {
        Selection::Tags(tags)
    }
}

impl<'a> From<&'a Attributes> for Selection<'a> {
    fn from(attrs: &'a Attributes) -> Self {
        Selection::Attributes(attrs)
    }
}

impl<'a> Selection<'a> {
    fn includes(&self, key: ElementKey<'_>) -> bool {
        match self {
            Selection::All => true,
            Selection::Tags(tags) => tags.contains(&key.tag),
            Selection::Attributes(attrs) => attrs.contains(key),
        }
    }

    /// The selection applying to the items of a selected sequence.
    fn nested(&self, key: ElementKey<'_>) -> Selection<'a> {
        match self {
            Selection::Attributes(attrs) => attrs
                .get_item(key, 0)
                .filter(|item| !item.is_empty())
                .map_or(Selection::All, Selection::Attributes),
            _ => Selection::All,
        }
    }
}

impl Attributes {
    /// Copy all elements of `other` into this data set.
    /// Returns whether anything changed.
    pub fn add_all(&mut self, other: &Attributes) -> Result<bool> {
        self.copy_with(other, CopyMode::CopyAll, Selection::All, None)
    }

    /// Copy the elements of `other` which are absent or empty here.
    pub fn merge(&mut self, other: &Attributes) -> Result<bool> {
        self.copy_with(other, CopyMode::MergeIfAbsent, Selection::All, None)
    }

    /// Copy the elements of `other` which differ from the ones here,
    /// saving the replaced non-empty values into `modified`.
    pub fn update(&mut self, other: &Attributes, modified: Option<&mut Attributes>) -> Result<bool> {
        self.copy_with(other, CopyMode::Update, Selection::All, modified)
    }

    pub fn add_selected<'s>(&mut self, other: &Attributes, selection: impl Into<Selection<'s>>) -> Result<bool> {
        self.copy_with(other, CopyMode::CopyAll, selection.into(), None)
    }

    pub fn merge_selected<'s>(&mut self, other: &Attributes, selection: impl Into<Selection<'s>>) -> Result<bool> {
        self.copy_with(other, CopyMode::MergeIfAbsent, selection.into(), None)
    }

    pub fn update_selected<'s>(
        &mut self,
        other: &Attributes,
        selection: impl Into<Selection<'s>>,
        modified: Option<&mut Attributes>,
    ) -> Result<bool> {
        self.copy_with(other, CopyMode::Update, selection.into(), modified)
    }

    /// Whether [`add_all`](Attributes::add_all) would change anything.
    pub fn test_add_all(&self, other: &Attributes) -> bool {
        !self.plan(other, CopyMode::CopyAll, Selection::All).is_empty()
    }

    pub fn test_merge(&self, other: &Attributes) -> bool {
        !self.plan(other, CopyMode::MergeIfAbsent, Selection::All).is_empty()
    }

    pub fn test_update(&self, other: &Attributes) -> bool {
        !self.plan(other, CopyMode::Update, Selection::All).is_empty()
    }

    pub fn test_add_selected<'s>(&self, other: &Attributes, selection: impl Into<Selection<'s>>) -> bool {
        !self.plan(other, CopyMode::CopyAll, selection.into()).is_empty()
    }

    pub fn test_merge_selected<'s>(&self, other: &Attributes, selection: impl Into<Selection<'s>>) -> bool {
        !self.plan(other, CopyMode::MergeIfAbsent, selection.into()).is_empty()
    }

    pub fn test_update_selected<'s>(&self, other: &Attributes, selection: impl Into<Selection<'s>>) -> bool {
        !self.plan(other, CopyMode::Update, selection.into()).is_empty()
    }

    /// Copy elements of `other` into this data set.
    ///
    /// Private creator elements are never copied by themselves:
    /// blocks are reserved here as the private elements referring
    /// to them are copied.
    /// `modified` only receives values in [`CopyMode::Update`].
    pub fn copy_with(
        &mut self,
        other: &Attributes,
        mode: CopyMode,
        selection: Selection<'_>,
        mut modified: Option<&mut Attributes>,
    ) -> Result<bool> {
        let plan = self.plan(other, mode, selection);
        for &index in &plan {
            let tag = other.tags[index];
            let creator = other.private_creator_of(tag);
            let key = ElementKey::from((creator.as_deref(), tag));
            if let (CopyMode::Update, Some(sink)) = (mode, modified.as_deref_mut()) {
                if let Some(original) = self.index_of(key) {
                    if !self.slots[original].value.is_empty() {
                        sink.copy_element(self, original, Selection::All)?;
                    }
                }
            }
            self.copy_element(other, index, selection.nested(key))?;
        }
        Ok(!plan.is_empty())
    }

    /// The positions of the elements of `other` a copy would write here.
    fn plan(&self, other: &Attributes, mode: CopyMode, selection: Selection<'_>) -> Vec<usize> {
        let mut plan = Vec::new();
        for index in 0..other.tags.len() {
            let tag = other.tags[index];
            if tag.is_private_creator() || tag.is_group_length() {
                continue;
            }
            let creator = other.private_creator_of(tag);
            let key = ElementKey::from((creator.as_deref(), tag));
            if !selection.includes(key) {
                continue;
            }
            if let Some(current) = self.index_of(key) {
                if mode == CopyMode::MergeIfAbsent && !self.slots[current].value.is_empty() {
                    continue;
                }
                if diff::equal_values(self, current, other, index) {
                    continue;
                }
            }
            plan.push(index);
        }
        plan
    }

    /// Copy one element of `source` here,
    /// reserving its private block if needed.
    pub(crate) fn copy_element(&mut self, source: &Attributes, index: usize, nested: Selection<'_>) -> Result<()> {
        let tag = source.tags[index];
        let creator = source.private_creator_of(tag);
        let (dest_tag, dest_creator) = self.resolve_for_write(ElementKey::from((creator.as_deref(), tag)))?;
        let value = match &source.slots[index].value {
            Value::Primitive(value) => Value::Primitive(self.convert_primitive(source, index, value)),
            Value::Sequence(seq) => {
                let mut copy = Sequence::new(dest_tag, dest_creator, self.child_owner(), seq.len());
                for item in seq {
                    copy.new_item()
                        .copy_with(item, CopyMode::CopyAll, nested, None)?;
                }
                Value::Sequence(copy)
            }
            Value::Fragments(fragments) => Value::Fragments(fragments.with_endianness(self.big_endian)),
        };
        self.insert_value(dest_tag, source.vrs[index], value);
        Ok(())
    }

    /// Adapt a primitive value of `source` to the byte order
    /// and character sets of this data set.
    fn convert_primitive(&self, source: &Attributes, index: usize, value: &PrimitiveValue) -> PrimitiveValue {
        let vt = source.vrs[index].value_type();
        match value {
            PrimitiveValue::Bytes(bytes) if vt.is_binary() && source.big_endian != self.big_endian => {
                let mut bytes = bytes.clone();
                vt.toggle_endian(&mut bytes);
                PrimitiveValue::Bytes(bytes)
            }
            PrimitiveValue::Bytes(_)
                if vt.uses_specific_character_set()
                    && source.specific_character_set() != self.specific_character_set() =>
            {
                match source.strings_at(index) {
                    Some(strs) => PrimitiveValue::from_strs(strs.iter().cloned()),
                    None => value.clone(),
                }
            }
            _ => value.clone(),
        }
    }

    /// A new data set with the elements of this one present in `selection`.
    ///
    /// Where the selection holds a non-empty value,
    /// the element must also have an equal value.
    pub fn filter(&self, selection: &Attributes) -> Result<Attributes> {
        let mut filtered = Attributes::with_endianness(self.big_endian, selection.len());
        for index in 0..self.tags.len() {
            let tag = self.tags[index];
            if tag.is_private_creator() {
                continue;
            }
            let creator = self.private_creator_of(tag);
            let key = ElementKey::from((creator.as_deref(), tag));
            let Some(selected) = selection.index_of(key) else {
                continue;
            };
            if !selection.slots[selected].value.is_empty()
                && !diff::equal_values(selection, selected, self, index)
            {
                continue;
            }
            filtered.copy_element(self, index, Selection::All)?;
        }
        Ok(filtered)
    }

    /// A new data set with the elements of this one at the given tags.
    pub fn select_tags(&self, tags: &[Tag]) -> Result<Attributes> {
        let mut selected = Attributes::with_endianness(self.big_endian, tags.len());
        selected.add_selected(self, tags)?;
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_attrs_core::header::VR;
    use dicom_attrs_core::tags;
    use pretty_assertions::assert_eq;

    fn patient() -> Attributes {
        let mut attrs = Attributes::new();
        attrs.set_string(tags::PATIENT_NAME, VR::PN, "Doe^John").unwrap();
        attrs.set_string(tags::PATIENT_ID, VR::LO, "123").unwrap();
        attrs.set_string(tags::PATIENT_SEX, VR::CS, "M").unwrap();
        attrs
    }

    #[test]
    fn merge_keeps_existing_values() {
        let mut dest = Attributes::new();
        dest.set_string(tags::PATIENT_ID, VR::LO, "999").unwrap();
        dest.set_null(tags::PATIENT_NAME, VR::PN).unwrap();
        assert!(dest.test_merge(&patient()));
        assert!(dest.merge(&patient()).unwrap());
        assert_eq!(dest.get_string(tags::PATIENT_ID).as_deref(), Some("999"));
        assert_eq!(dest.get_string(tags::PATIENT_NAME).as_deref(), Some("Doe^John"));
        assert_eq!(dest.get_string(tags::PATIENT_SEX).as_deref(), Some("M"));
    }

    #[test]
    fn merging_or_updating_with_itself_changes_nothing() {
        let mut attrs = patient();
        let same = attrs.clone();
        assert!(!attrs.test_merge(&same));
        assert!(!attrs.merge(&same).unwrap());
        let mut modified = Attributes::new();
        assert!(!attrs.update(&same, Some(&mut modified)).unwrap());
        assert!(modified.is_empty());
        assert_eq!(attrs, same);
    }

    #[test]
    fn update_reports_replaced_values() {
        let mut dest = patient();
        let mut source = Attributes::new();
        source.set_string(tags::PATIENT_ID, VR::LO, "456").unwrap();
        source.set_string(tags::PATIENT_BIRTH_DATE, VR::DA, "19700101").unwrap();
        let mut modified = Attributes::new();
        assert!(dest.update(&source, Some(&mut modified)).unwrap());
        assert_eq!(dest.get_string(tags::PATIENT_ID).as_deref(), Some("456"));
        assert_eq!(modified.tags(), &[tags::PATIENT_ID]);
        assert_eq!(modified.get_string(tags::PATIENT_ID).as_deref(), Some("123"));
    }

    #[test]
    fn dry_runs_leave_the_destination_alone() {
        let dest = Attributes::new();
        assert!(dest.test_add_all(&patient()));
        assert!(dest.test_update(&patient()));
        assert!(dest.test_add_selected(&patient(), &[tags::PATIENT_ID]));
        assert!(!dest.test_add_selected(&patient(), &[tags::STUDY_DATE]));
        assert!(dest.is_empty());
    }

    #[test]
    fn private_blocks_are_reserved_in_the_destination() {
        let mut source = Attributes::new();
        source
            .set_string(("ACME", Tag(0x0041, 0x0001)), VR::LO, "private")
            .unwrap();
        let mut dest = Attributes::new();
        dest.set_string(Tag(0x0041, 0x0010), VR::LO, "OTHER").unwrap();
        assert!(dest.add_all(&source).unwrap());
        assert_eq!(
            dest.get_string(("ACME", Tag(0x0041, 0x0001))).as_deref(),
            Some("private")
        );
        assert!(dest.contains(Tag(0x0041, 0x1101)));
    }

    #[test]
    fn sequences_are_deep_copied_with_nested_selection() {
        let mut source = Attributes::new();
        let item = source
            .new_sequence(tags::OTHER_PATIENT_IDS_SEQUENCE, 1)
            .unwrap()
            .new_item();
        item.set_string(tags::PATIENT_ID, VR::LO, "A").unwrap();
        item.set_string(tags::ISSUER_OF_PATIENT_ID, VR::LO, "X").unwrap();

        let mut selection = Attributes::new();
        selection
            .new_sequence(tags::OTHER_PATIENT_IDS_SEQUENCE, 1)
            .unwrap()
            .new_item()
            .set_null(tags::PATIENT_ID, VR::LO)
            .unwrap();

        let mut dest = Attributes::new();
        assert!(dest.add_selected(&source, &selection).unwrap());
        let copied = dest.get_item(tags::OTHER_PATIENT_IDS_SEQUENCE, 0).unwrap();
        assert_eq!(copied.tags(), &[tags::PATIENT_ID]);
        assert_eq!(copied.level(), 1);

        dest.get_item_mut(tags::OTHER_PATIENT_IDS_SEQUENCE, 0)
            .unwrap()
            .set_string(tags::PATIENT_ID, VR::LO, "B")
            .unwrap();
        let original = source.get_item(tags::OTHER_PATIENT_IDS_SEQUENCE, 0).unwrap();
        assert_eq!(original.get_string(tags::PATIENT_ID).as_deref(), Some("A"));
    }

    #[test]
    fn binary_values_change_byte_order() {
        let mut source = Attributes::with_endianness(true, 1);
        source.set_bytes(tags::ROWS, VR::US, vec![0x02, 0x00]).unwrap();
        let mut dest = Attributes::new();
        dest.add_all(&source).unwrap();
        assert_eq!(dest.get_bytes(tags::ROWS), Some(vec![0x00, 0x02]));
        assert_eq!(dest.get_int(tags::ROWS), Some(512));
    }

    #[test]
    fn text_is_decoded_when_character_sets_differ() {
        let mut source = Attributes::new();
        source.set_specific_character_set(&["ISO_IR 100"]).unwrap();
        source.set_bytes(tags::PATIENT_NAME, VR::PN, vec![b'M', 0xFC, b'l', b'l', b'e', b'r']).unwrap();
        let mut dest = Attributes::new();
        dest.set_specific_character_set(&["ISO_IR 192"]).unwrap();
        dest.add_selected(&source, &[tags::PATIENT_NAME]).unwrap();
        assert_eq!(dest.get_string(tags::PATIENT_NAME).as_deref(), Some("Müller"));
    }

    #[test]
    fn filter_gates_on_selection_values() {
        let attrs = patient();
        let mut selection = Attributes::new();
        selection.set_null(tags::PATIENT_NAME, VR::PN).unwrap();
        selection.set_string(tags::PATIENT_ID, VR::LO, "other").unwrap();
        selection.set_string(tags::PATIENT_SEX, VR::CS, "M").unwrap();
        let filtered = attrs.filter(&selection).unwrap();
        assert_eq!(filtered.tags(), &[tags::PATIENT_NAME, tags::PATIENT_SEX]);
    }

    #[test]
    fn select_tags_copies_only_the_listed_tags() {
        let selected = patient().select_tags(&[tags::PATIENT_ID, tags::STUDY_DATE]).unwrap();
        assert_eq!(selected.tags(), &[tags::PATIENT_ID]);
    }
}
