//! Coercion of data sets, as chains of steps.
//!
//! Each step may remap UIDs and change a data set in place,
//! then hands over to the next step of the chain.
//! Steps can record the original values of the elements they change.

use crate::attributes::{self, Attributes, CopyMode, ElementKey, Selection};
use dicom_attrs_core::header::VR;
use dicom_attrs_core::selector::{AttributeSelector, ItemPointer};
use snafu::{ResultExt, Snafu};
use std::collections::HashMap;

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Could not coerce data set"))]
    Coerce {
        #[snafu(backtrace)]
        source: attributes::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A step of a coercion chain.
pub trait AttributesCoercion: std::fmt::Debug {
    /// The UID replacing `uid`.
    fn remap_uid(&self, uid: &str) -> String {
        uid.to_owned()
    }

    /// Change `attrs` in place. When `modified` is given,
    /// the original values of changed elements are added to it,
    /// unless it already holds them.
    fn coerce(&self, attrs: &mut Attributes, modified: Option<&mut Attributes>) -> Result<()>;
}

impl<T: AttributesCoercion + ?Sized> AttributesCoercion for Box<T> {
    fn remap_uid(&self, uid: &str) -> String {
        (**self).remap_uid(uid)
    }

    fn coerce(&self, attrs: &mut Attributes, modified: Option<&mut Attributes>) -> Result<()> {
        (**self).coerce(attrs, modified)
    }
}

type Next = Option<Box<dyn AttributesCoercion>>;

fn next_remap(next: &Next, uid: String) -> String {
    match next {
        Some(next) => next.remap_uid(&uid),
        None => uid,
    }
}

fn next_coerce(next: &Next, attrs: &mut Attributes, modified: Option<&mut Attributes>) -> Result<()> {
    match next {
        Some(next) => next.coerce(attrs, modified),
        None => Ok(()),
    }
}

/// Add to `modified` the original values of the elements
/// which differ between `original` and `attrs`.
fn record_changes(original: Option<Attributes>, attrs: &Attributes, modified: Option<&mut Attributes>) -> Result<()> {
    if let (Some(original), Some(modified)) = (original, modified) {
        let changed = original.get_removed_or_modified(attrs).context(CoerceSnafu)?;
        modified.merge(&changed).context(CoerceSnafu)?;
    }
    Ok(())
}

/// Call `f` on every data set reached through `pointers`,
/// where a pointer without item index reaches all items.
fn for_each_item(
    attrs: &mut Attributes,
    pointers: &[ItemPointer],
    f: &mut dyn FnMut(&mut Attributes) -> attributes::Result<bool>,
) -> attributes::Result<bool> {
    let Some((pointer, rest)) = pointers.split_first() else {
        return f(attrs);
    };
    let Some(seq) = attrs.get_sequence_mut(ElementKey::from(pointer)) else {
        return Ok(false);
    };
    let mut changed = false;
    match pointer.item_index {
        Some(index) => {
            if let Some(item) = seq.get_mut(index) {
                changed = for_each_item(item, rest, f)?;
            }
        }
        None => {
            for item in seq.iter_mut() {
                changed |= for_each_item(item, rest, f)?;
            }
        }
    }
    Ok(changed)
}

/// Replaces the value of the selected elements with the empty value.
#[derive(Debug, Default)]
pub struct NullifyAttributes {
    selectors: Vec<AttributeSelector>,
    next: Next,
}

impl NullifyAttributes {
    pub fn new(selectors: Vec<AttributeSelector>) -> Self {
        NullifyAttributes {
            selectors,
            next: None,
        }
    }

    pub fn with_next(mut self, next: impl AttributesCoercion + 'static) -> Self {
        self.next = Some(Box::new(next));
        self
    }
}

impl AttributesCoercion for NullifyAttributes {
    fn remap_uid(&self, uid: &str) -> String {
        next_remap(&self.next, uid.to_owned())
    }

    fn coerce(&self, attrs: &mut Attributes, mut modified: Option<&mut Attributes>) -> Result<()> {
        let original = modified.is_some().then(|| attrs.clone());
        let mut changed = false;
        for selector in &self.selectors {
            let key = ElementKey::from(selector);
            changed |= for_each_item(attrs, &selector.item_pointers, &mut |item: &mut Attributes| {
                match item.vr_of(key) {
                    Some(vr) if item.contains_value(key) => {
                        item.set_null(key, vr)?;
                        Ok(true)
                    }
                    _ => Ok(false),
                }
            })
            .context(CoerceSnafu)?;
        }
        if changed {
            record_changes(original, attrs, modified.as_deref_mut())?;
        }
        next_coerce(&self.next, attrs, modified)
    }
}

/// Copies the elements of a template data set into the coerced one.
#[derive(Debug)]
pub struct MergeAttributes {
    template: Attributes,
    mode: CopyMode,
    next: Next,
}

impl MergeAttributes {
    /// Overwrite the elements which differ from the template.
    pub fn new(template: Attributes) -> Self {
        MergeAttributes {
            template,
            mode: CopyMode::Update,
            next: None,
        }
    }

    /// Set how the template is copied, such as only into absent elements
    /// with [`CopyMode::MergeIfAbsent`].
    pub fn with_mode(mut self, mode: CopyMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_next(mut self, next: impl AttributesCoercion + 'static) -> Self {
        self.next = Some(Box::new(next));
        self
    }
}

impl AttributesCoercion for MergeAttributes {
    fn remap_uid(&self, uid: &str) -> String {
        next_remap(&self.next, uid.to_owned())
    }

    fn coerce(&self, attrs: &mut Attributes, mut modified: Option<&mut Attributes>) -> Result<()> {
        match self.mode {
            CopyMode::Update => {
                attrs
                    .copy_with(&self.template, self.mode, Selection::All, modified.as_deref_mut())
                    .context(CoerceSnafu)?;
            }
            mode => {
                let original = modified.is_some().then(|| attrs.clone());
                let changed = attrs
                    .copy_with(&self.template, mode, Selection::All, None)
                    .context(CoerceSnafu)?;
                if changed {
                    record_changes(original, attrs, modified.as_deref_mut())?;
                }
            }
        }
        next_coerce(&self.next, attrs, modified)
    }
}

/// Replaces UIDs according to a map, in every UI element at any level.
#[derive(Debug, Default)]
pub struct RemapUids {
    uids: HashMap<String, String>,
    next: Next,
}

impl RemapUids {
    pub fn new(uids: HashMap<String, String>) -> Self {
        RemapUids { uids, next: None }
    }

    pub fn with_next(mut self, next: impl AttributesCoercion + 'static) -> Self {
        self.next = Some(Box::new(next));
        self
    }

    fn remap_own(&self, uid: &str) -> String {
        self.uids.get(uid).cloned().unwrap_or_else(|| uid.to_owned())
    }

    fn remap_in(&self, attrs: &mut Attributes) -> attributes::Result<bool> {
        let mut changed = false;
        for tag in attrs.tags().to_vec() {
            match attrs.vr_of(tag) {
                Some(VR::UI) => {
                    let Some(uids) = attrs.get_strings(tag) else {
                        continue;
                    };
                    let remapped: Vec<String> = uids.iter().map(|uid| self.remap_own(uid)).collect();
                    if remapped.iter().ne(uids.iter()) {
                        attrs.set_strings(tag, VR::UI, &remapped)?;
                        changed = true;
                    }
                }
                Some(VR::SQ) => {
                    if let Some(seq) = attrs.get_sequence_mut(tag) {
                        for item in seq.iter_mut() {
                            changed |= self.remap_in(item)?;
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(changed)
    }
}

impl AttributesCoercion for RemapUids {
    fn remap_uid(&self, uid: &str) -> String {
        next_remap(&self.next, self.remap_own(uid))
    }

    fn coerce(&self, attrs: &mut Attributes, mut modified: Option<&mut Attributes>) -> Result<()> {
        let original = modified.is_some().then(|| attrs.clone());
        if self.remap_in(attrs).context(CoerceSnafu)? {
            record_changes(original, attrs, modified.as_deref_mut())?;
        }
        next_coerce(&self.next, attrs, modified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_attrs_core::tags;
    use pretty_assertions::assert_eq;

    fn study() -> Attributes {
        let mut attrs = Attributes::new();
        attrs.set_string(tags::STUDY_INSTANCE_UID, VR::UI, "1.2.3").unwrap();
        attrs.set_string(tags::PATIENT_NAME, VR::PN, "Doe^John").unwrap();
        attrs.set_string(tags::PATIENT_ID, VR::LO, "123").unwrap();
        let seq = attrs.new_sequence(tags::REFERENCED_SERIES_SEQUENCE, 2).unwrap();
        for uid in ["1.2.3.1", "1.2.3.2"] {
            let item = seq.new_item();
            item.set_string(tags::SERIES_INSTANCE_UID, VR::UI, uid).unwrap();
            item.set_string(tags::SERIES_DESCRIPTION, VR::LO, "AX").unwrap();
        }
        attrs
    }

    #[test]
    fn nullify_selected_elements() {
        let mut attrs = study();
        let coercion = NullifyAttributes::new(vec![
            AttributeSelector::new(tags::PATIENT_NAME),
            AttributeSelector::new(tags::SERIES_DESCRIPTION)
                .with_item_pointers(vec![ItemPointer::new(tags::REFERENCED_SERIES_SEQUENCE, 1)]),
            AttributeSelector::new(tags::ACCESSION_NUMBER),
        ]);
        let mut modified = Attributes::new();
        coercion.coerce(&mut attrs, Some(&mut modified)).unwrap();

        assert!(attrs.contains(tags::PATIENT_NAME));
        assert!(!attrs.contains_value(tags::PATIENT_NAME));
        assert!(!attrs.contains(tags::ACCESSION_NUMBER));
        let seq = attrs.get_sequence(tags::REFERENCED_SERIES_SEQUENCE).unwrap();
        assert!(seq.get(0).unwrap().contains_value(tags::SERIES_DESCRIPTION));
        assert!(!seq.get(1).unwrap().contains_value(tags::SERIES_DESCRIPTION));

        assert_eq!(modified.tags(), &[tags::REFERENCED_SERIES_SEQUENCE, tags::PATIENT_NAME]);
        assert_eq!(modified.get_string(tags::PATIENT_NAME).as_deref(), Some("Doe^John"));
        assert_eq!(
            modified.get_sequence(tags::REFERENCED_SERIES_SEQUENCE),
            study().get_sequence(tags::REFERENCED_SERIES_SEQUENCE)
        );
    }

    #[test]
    fn merge_with_template() {
        let mut template = Attributes::new();
        template.set_string(tags::PATIENT_ID, VR::LO, "456").unwrap();
        template.set_string(tags::INSTITUTION_NAME, VR::LO, "Clinic").unwrap();

        let mut attrs = study();
        let mut modified = Attributes::new();
        MergeAttributes::new(template.clone())
            .coerce(&mut attrs, Some(&mut modified))
            .unwrap();
        assert_eq!(attrs.get_string(tags::PATIENT_ID).as_deref(), Some("456"));
        assert_eq!(attrs.get_string(tags::INSTITUTION_NAME).as_deref(), Some("Clinic"));
        assert_eq!(modified.tags(), &[tags::PATIENT_ID]);
        assert_eq!(modified.get_string(tags::PATIENT_ID).as_deref(), Some("123"));

        let mut attrs = study();
        let mut modified = Attributes::new();
        MergeAttributes::new(template)
            .with_mode(CopyMode::MergeIfAbsent)
            .coerce(&mut attrs, Some(&mut modified))
            .unwrap();
        assert_eq!(attrs.get_string(tags::PATIENT_ID).as_deref(), Some("123"));
        assert_eq!(attrs.get_string(tags::INSTITUTION_NAME).as_deref(), Some("Clinic"));
        assert!(modified.is_empty());
    }

    #[test]
    fn remap_uids_at_every_level() {
        let uids: HashMap<String, String> = [("1.2.3", "9.9"), ("1.2.3.2", "9.9.2")]
            .into_iter()
            .map(|(a, b)| (a.to_owned(), b.to_owned()))
            .collect();
        let mut attrs = study();
        let mut modified = Attributes::new();
        RemapUids::new(uids)
            .coerce(&mut attrs, Some(&mut modified))
            .unwrap();
        assert_eq!(attrs.get_string(tags::STUDY_INSTANCE_UID).as_deref(), Some("9.9"));
        let seq = attrs.get_sequence(tags::REFERENCED_SERIES_SEQUENCE).unwrap();
        let series: Vec<_> = seq
            .iter()
            .filter_map(|item| item.get_string(tags::SERIES_INSTANCE_UID))
            .collect();
        assert_eq!(series, vec!["1.2.3.1", "9.9.2"]);
        assert_eq!(
            modified.tags(),
            &[tags::REFERENCED_SERIES_SEQUENCE, tags::STUDY_INSTANCE_UID]
        );
        assert_eq!(modified.get_string(tags::STUDY_INSTANCE_UID).as_deref(), Some("1.2.3"));
    }

    #[test]
    fn chains_run_in_order() {
        let first: HashMap<String, String> = [("1".to_owned(), "2".to_owned())].into_iter().collect();
        let second: HashMap<String, String> = [("2".to_owned(), "3".to_owned())].into_iter().collect();
        let chain = RemapUids::new(first).with_next(
            NullifyAttributes::new(vec![AttributeSelector::new(tags::PATIENT_ID)])
                .with_next(RemapUids::new(second)),
        );
        assert_eq!(chain.remap_uid("1"), "3");
        assert_eq!(chain.remap_uid("5"), "5");

        let mut attrs = Attributes::new();
        attrs.set_string(tags::SOP_INSTANCE_UID, VR::UI, "1").unwrap();
        attrs.set_string(tags::PATIENT_ID, VR::LO, "123").unwrap();
        chain.coerce(&mut attrs, None).unwrap();
        assert_eq!(attrs.get_string(tags::SOP_INSTANCE_UID).as_deref(), Some("3"));
        assert!(!attrs.contains_value(tags::PATIENT_ID));
    }
}
