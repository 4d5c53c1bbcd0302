//! Comparing data sets.

use super::copy::Selection;
use super::{Attributes, ElementKey, Result};
use crate::value::{EncodeValue, Value};
use dicom_attrs_core::header::Tag;
use dicom_attrs_core::value::{PrimitiveValue, ValueType};
use dicom_attrs_encoding::convert::ValueCodec;

/// Compare the value at `i` in `a` with the value at `j` in `b`.
///
/// Numeric strings are compared by their parsed values,
/// falling back to their text when a component does not parse.
/// Binary values are compared byte for byte in the same byte order.
/// Text is compared after decoding with the character sets of each side.
pub(crate) fn equal_values(a: &Attributes, i: usize, b: &Attributes, j: usize) -> bool {
    let (x, y) = (&a.slots[i].value, &b.slots[j].value);
    if x.is_empty() || y.is_empty() {
        return x.is_empty() && y.is_empty();
    }
    let vr = a.vrs[i];
    if vr != b.vrs[j] {
        return false;
    }
    match (x, y) {
        (Value::Sequence(x), Value::Sequence(y)) => x == y,
        (Value::Fragments(x), Value::Fragments(y)) => {
            x.vr() == y.vr() && x.iter().eq(y.with_endianness(x.is_big_endian()).iter())
        }
        (Value::Primitive(_), Value::Primitive(_)) => {
            let vt = vr.value_type();
            match vt {
                ValueType::Ds | ValueType::Is => match (a.doubles_at(i), b.doubles_at(j)) {
                    (Some(m), Some(n))
                        if !m.iter().chain(n.iter()).any(|v| v.is_nan()) =>
                    {
                        m == n
                    }
                    _ => a.strings_at(i) == b.strings_at(j),
                },
                _ if vt.is_string() => a.strings_at(i) == b.strings_at(j),
                _ => {
                    let m = little_endian_bytes(a, i);
                    m.is_some() && m == little_endian_bytes(b, j)
                }
            }
        }
        _ => false,
    }
}

fn little_endian_bytes(attrs: &Attributes, index: usize) -> Option<Vec<u8>> {
    let vt = attrs.vrs[index].value_type();
    let value = attrs.slots[index].value.primitive()?;
    let mut bytes = match value {
        PrimitiveValue::Bytes(bytes) => bytes.clone(),
        _ => vt
            .to_bytes(value, attrs.big_endian, attrs.specific_character_set())
            .ok()?,
    };
    if attrs.big_endian {
        vt.toggle_endian(&mut bytes);
    }
    Some(bytes)
}

impl Attributes {
    /// Copy the elements of `other` which differ from the ones here,
    /// merging into the item of a sequence instead of replacing it
    /// when both sides hold exactly one item.
    pub fn update_recursive(&mut self, other: &Attributes) -> Result<bool> {
        let mut changed = false;
        for index in 0..other.tags.len() {
            let tag = other.tags[index];
            if tag.is_private_creator() || tag.is_group_length() {
                continue;
            }
            let creator = other.private_creator_of(tag);
            let key = ElementKey::from((creator.as_deref(), tag));
            let current = self.index_of(key);
            if let (Some(current), Value::Sequence(source)) = (current, &other.slots[index].value) {
                let single_items = source.len() == 1
                    && self.slots[current]
                        .value
                        .sequence()
                        .map_or(false, |seq| seq.len() == 1);
                if single_items {
                    let target = self.slots[current]
                        .value
                        .sequence_mut()
                        .and_then(|seq| seq.get_mut(0));
                    if let (Some(target), Some(item)) = (target, source.first()) {
                        changed |= target.update_recursive(item)?;
                        continue;
                    }
                }
            }
            if let Some(current) = current {
                if equal_values(self, current, other, index) {
                    continue;
                }
            }
            self.copy_element(other, index, Selection::All)?;
            changed = true;
        }
        Ok(changed)
    }

    /// The elements of `other` replacing a different value
    /// of a non-empty element here.
    ///
    /// Private elements of `other` whose creator has no block here
    /// are left out.
    pub fn get_modified(&self, other: &Attributes) -> Result<Attributes> {
        let mut modified = Attributes::with_endianness(other.big_endian, 0);
        for index in 0..other.tags.len() {
            let tag = other.tags[index];
            if tag.is_private_creator() || tag.is_group_length() {
                continue;
            }
            let creator = other.private_creator_of(tag);
            let Some(current) = self.index_of(ElementKey::from((creator.as_deref(), tag))) else {
                continue;
            };
            if self.slots[current].value.is_empty() || equal_values(self, current, other, index) {
                continue;
            }
            modified.copy_element(other, index, Selection::All)?;
        }
        Ok(modified)
    }

    /// The elements of this data set which `other` lacks
    /// or holds with a different value.
    ///
    /// Private elements whose creator has no block in `other`
    /// count as removed.
    pub fn get_removed_or_modified(&self, other: &Attributes) -> Result<Attributes> {
        let mut changed = Attributes::with_endianness(self.big_endian, 0);
        for index in 0..self.tags.len() {
            let tag = self.tags[index];
            if tag.is_private_creator() || tag.is_group_length() {
                continue;
            }
            let creator = self.private_creator_of(tag);
            let unchanged = other
                .index_of(ElementKey::from((creator.as_deref(), tag)))
                .map_or(false, |j| equal_values(self, index, other, j));
            if !unchanged {
                changed.copy_element(self, index, Selection::All)?;
            }
        }
        Ok(changed)
    }

    /// The tags of the elements present in both data sets
    /// with different values.
    pub fn diff_tags(&self, other: &Attributes) -> Vec<Tag> {
        self.tags
            .iter()
            .enumerate()
            .filter_map(|(i, &tag)| {
                let creator = self.private_creator_of(tag);
                let j = other.index_of(ElementKey::from((creator.as_deref(), tag)))?;
                (!equal_values(self, i, other, j)).then_some(tag)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_attrs_core::header::VR;
    use dicom_attrs_core::tags;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(VR::DS, "1.50", "1.5", true)]
    #[case(VR::DS, "1.5\\2", "1.5\\2.0", true)]
    #[case(VR::DS, "abc", "abc", true)]
    #[case(VR::DS, "abc", "1", false)]
    #[case(VR::IS, "007", "7", true)]
    #[case(VR::LO, "A", "A ", true)]
    #[case(VR::LO, "A", "B", false)]
    fn string_equality(#[case] vr: VR, #[case] x: &str, #[case] y: &str, #[case] equal: bool) {
        let mut a = Attributes::new();
        a.set_string(tags::SLICE_THICKNESS, vr, x).unwrap();
        let mut b = Attributes::new();
        b.set_bytes(tags::SLICE_THICKNESS, vr, y.as_bytes().to_vec()).unwrap();
        assert_eq!(equal_values(&a, 0, &b, 0), equal);
    }

    #[test]
    fn binary_equality_ignores_byte_order() {
        let mut a = Attributes::new();
        a.set_int(tags::ROWS, VR::US, 512).unwrap();
        let mut b = Attributes::with_endianness(true, 1);
        b.set_bytes(tags::ROWS, VR::US, vec![0x02, 0x00]).unwrap();
        assert!(equal_values(&a, 0, &b, 0));
    }

    fn with_sequence(values: &[&str]) -> Attributes {
        let mut attrs = Attributes::new();
        let seq = attrs
            .new_sequence(tags::REFERENCED_STUDY_SEQUENCE, values.len())
            .unwrap();
        for value in values {
            seq.new_item()
                .set_string(tags::REFERENCED_SOP_INSTANCE_UID, VR::UI, value)
                .unwrap();
        }
        attrs
    }

    #[test]
    fn update_recursive_merges_single_items() {
        let mut attrs = with_sequence(&["1.2.3"]);
        let mut other = Attributes::new();
        other
            .new_sequence(tags::REFERENCED_STUDY_SEQUENCE, 1)
            .unwrap()
            .new_item()
            .set_string(tags::REFERENCED_SOP_CLASS_UID, VR::UI, "1.2.840")
            .unwrap();
        assert!(attrs.update_recursive(&other).unwrap());
        let item = attrs.get_item(tags::REFERENCED_STUDY_SEQUENCE, 0).unwrap();
        assert_eq!(
            item.get_string(tags::REFERENCED_SOP_INSTANCE_UID).as_deref(),
            Some("1.2.3")
        );
        assert_eq!(
            item.get_string(tags::REFERENCED_SOP_CLASS_UID).as_deref(),
            Some("1.2.840")
        );
    }

    #[test]
    fn update_recursive_replaces_other_shapes() {
        let mut attrs = with_sequence(&["1.2.3"]);
        let other = with_sequence(&["4", "5"]);
        assert!(attrs.update_recursive(&other).unwrap());
        let seq = attrs.get_sequence(tags::REFERENCED_STUDY_SEQUENCE).unwrap();
        assert_eq!(seq.len(), 2);
        assert_eq!(seq, other.get_sequence(tags::REFERENCED_STUDY_SEQUENCE).unwrap());
        assert!(!attrs.update_recursive(&other).unwrap());
    }

    #[test]
    fn modified_and_removed() {
        let mut before = Attributes::new();
        before.set_string(tags::PATIENT_ID, VR::LO, "1").unwrap();
        before.set_string(tags::PATIENT_SEX, VR::CS, "F").unwrap();
        before.set_null(tags::PATIENT_AGE, VR::AS).unwrap();
        let mut after = Attributes::new();
        after.set_string(tags::PATIENT_ID, VR::LO, "2").unwrap();
        after.set_string(tags::PATIENT_AGE, VR::AS, "042Y").unwrap();

        let modified = before.get_modified(&after).unwrap();
        assert_eq!(modified.tags(), &[tags::PATIENT_ID]);
        assert_eq!(modified.get_string(tags::PATIENT_ID).as_deref(), Some("2"));

        let removed = before.get_removed_or_modified(&after).unwrap();
        assert_eq!(
            removed.tags(),
            &[tags::PATIENT_ID, tags::PATIENT_SEX, tags::PATIENT_AGE]
        );
        assert_eq!(removed.get_string(tags::PATIENT_ID).as_deref(), Some("1"));
        assert_eq!(before.diff_tags(&after), vec![tags::PATIENT_ID, tags::PATIENT_AGE]);
    }

    #[test]
    fn private_creators_resolve_across_blocks() {
        let mut a = Attributes::new();
        a.set_string(("ACME", Tag(0x0041, 0x0001)), VR::LO, "x").unwrap();
        let mut b = Attributes::new();
        b.set_string(Tag(0x0041, 0x0010), VR::LO, "OTHER").unwrap();
        b.set_string(("ACME", Tag(0x0041, 0x0001)), VR::LO, "y").unwrap();
        b.set_string(("NOBODY", Tag(0x0043, 0x0001)), VR::LO, "z").unwrap();

        let modified = a.get_modified(&b).unwrap();
        assert_eq!(modified.get_string(("ACME", Tag(0x0041, 0x0001))).as_deref(), Some("y"));
        assert!(modified.get_string(("NOBODY", Tag(0x0043, 0x0001))).is_none());

        let mut c = Attributes::new();
        c.set_string(("ACME", Tag(0x0041, 0x0001)), VR::LO, "x").unwrap();
        assert!(a.get_removed_or_modified(&c).unwrap().is_empty());
        assert!(!c.get_removed_or_modified(&Attributes::new()).unwrap().is_empty());
    }
}
