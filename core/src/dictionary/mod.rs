//! Data element dictionaries.
//!
//! A dictionary translates tags to keywords and value representations,
//! and vice versa. Private dictionaries are bound to a private creator
//! and identify their elements independently of the block
//! a creator was reserved at.
//!
//! Dictionaries are not discovered automatically:
//! the host application builds a [`DictionaryRegistry`]
//! with the standard dictionary and any private dictionaries it knows of,
//! and passes it to the operations which need it.

use crate::header::{Tag, VR};
use crate::tags;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::Debug;
use once_cell::sync::Lazy;

/// An entry of a data element dictionary.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DictionaryEntry {
    /// The element tag. For private dictionaries, the block byte is cleared.
    pub tag: Tag,
    /// The element keyword.
    pub keyword: Cow<'static, str>,
    /// The element's value representation.
    pub vr: VR,
}

/// Type trait for a dictionary of DICOM data elements.
///
/// The methods herein have no generic parameters,
/// so as to enable being used as a trait object.
pub trait DataDictionary: Debug {
    /// The private creator this dictionary is bound to,
    /// or `None` for the standard dictionary.
    fn private_creator(&self) -> Option<&str>;

    /// Fetch an entry by its tag.
    fn by_tag(&self, tag: Tag) -> Option<&DictionaryEntry>;

    /// Fetch an entry by its keyword.
    fn by_keyword(&self, keyword: &str) -> Option<&DictionaryEntry>;

    /// The value representation of the given element.
    fn vr_of(&self, tag: Tag) -> Option<VR> {
        self.by_tag(tag).map(|e| e.vr)
    }

    /// The keyword of the given element.
    fn keyword_of(&self, tag: Tag) -> Option<&str> {
        self.by_tag(tag).map(|e| e.keyword.as_ref())
    }

    /// The tag of the element with the given keyword.
    fn tag_for_keyword(&self, keyword: &str) -> Option<Tag> {
        self.by_keyword(keyword).map(|e| e.tag)
    }
}

/// A dictionary backed by an in-memory table.
#[derive(Debug, Default, Clone)]
pub struct TableDictionary {
    private_creator: Option<String>,
    entries: Vec<DictionaryEntry>,
    by_tag: HashMap<Tag, usize>,
    by_keyword: HashMap<String, usize>,
}

impl TableDictionary {
    /// Create an empty standard dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty private dictionary for the given creator.
    pub fn new_private(private_creator: impl Into<String>) -> Self {
        TableDictionary {
            private_creator: Some(private_creator.into()),
            ..Default::default()
        }
    }

    /// Add an entry, replacing any entry with the same tag.
    pub fn insert(&mut self, tag: Tag, keyword: impl Into<Cow<'static, str>>, vr: VR) {
        let tag = self.normalize(tag);
        let entry = DictionaryEntry {
            tag,
            keyword: keyword.into(),
            vr,
        };
        let keyword = entry.keyword.to_string();
        let index = match self.by_tag.get(&tag) {
            Some(&index) => {
                self.by_keyword.remove(self.entries[index].keyword.as_ref());
                self.entries[index] = entry;
                index
            }
            None => {
                self.entries.push(entry);
                self.entries.len() - 1
            }
        };
        self.by_tag.insert(tag, index);
        self.by_keyword.insert(keyword, index);
    }

    /// Builder-style variant of [`insert`](TableDictionary::insert).
    pub fn with_entry(mut self, tag: Tag, keyword: impl Into<Cow<'static, str>>, vr: VR) -> Self {
        self.insert(tag, keyword, vr);
        self
    }

    /// Iterate over all entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = &DictionaryEntry> {
        self.entries.iter()
    }

    fn normalize(&self, tag: Tag) -> Tag {
        if self.private_creator.is_some() {
            tag.without_private_block()
        } else {
            tag
        }
    }
}

impl DataDictionary for TableDictionary {
    fn private_creator(&self) -> Option<&str> {
        self.private_creator.as_deref()
    }

    fn by_tag(&self, tag: Tag) -> Option<&DictionaryEntry> {
        self.by_tag
            .get(&self.normalize(tag))
            .map(|&i| &self.entries[i])
    }

    fn by_keyword(&self, keyword: &str) -> Option<&DictionaryEntry> {
        self.by_keyword.get(keyword).map(|&i| &self.entries[i])
    }
}

static STANDARD: Lazy<TableDictionary> = Lazy::new(init_standard);

fn init_standard() -> TableDictionary {
    let mut dict = TableDictionary::new();
    for &(tag, keyword, vr) in tags::ENTRIES {
        dict.insert(tag, keyword, vr);
    }
    dict
}

/// Obtain the built-in table of well-known standard elements.
#[inline]
pub fn standard_dictionary() -> &'static TableDictionary {
    &STANDARD
}

/// A registry of the standard dictionary
/// and of private dictionaries keyed by private creator.
#[derive(Debug)]
pub struct DictionaryRegistry {
    standard: Box<dyn DataDictionary + Send + Sync>,
    private: HashMap<String, Box<dyn DataDictionary + Send + Sync>>,
}

impl Default for DictionaryRegistry {
    fn default() -> Self {
        DictionaryRegistry {
            standard: Box::new(standard_dictionary().clone()),
            private: HashMap::new(),
        }
    }
}

impl DictionaryRegistry {
    /// Create a registry with the built-in standard dictionary
    /// and no private dictionaries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with a custom standard dictionary.
    pub fn with_standard<D>(standard: D) -> Self
    where
        D: DataDictionary + Send + Sync + 'static,
    {
        DictionaryRegistry {
            standard: Box::new(standard),
            private: HashMap::new(),
        }
    }

    /// Register a dictionary. Dictionaries without a private creator
    /// replace the standard dictionary.
    pub fn register<D>(&mut self, dictionary: D)
    where
        D: DataDictionary + Send + Sync + 'static,
    {
        match dictionary.private_creator().map(str::to_owned) {
            Some(creator) => {
                self.private.insert(creator, Box::new(dictionary));
            }
            None => self.standard = Box::new(dictionary),
        }
    }

    /// Builder-style variant of [`register`](DictionaryRegistry::register).
    pub fn with<D>(mut self, dictionary: D) -> Self
    where
        D: DataDictionary + Send + Sync + 'static,
    {
        self.register(dictionary);
        self
    }

    /// Obtain the dictionary for the given private creator,
    /// or the standard dictionary if `None`.
    pub fn dictionary(&self, private_creator: Option<&str>) -> Option<&dyn DataDictionary> {
        match private_creator {
            None => Some(self.standard.as_ref() as &dyn DataDictionary),
            Some(creator) => self
                .private
                .get(creator)
                .map(|d| d.as_ref() as &dyn DataDictionary),
        }
    }

    /// Determine the VR of an element, defaulting to `UN`.
    ///
    /// Group length elements are always `UL`
    /// and private creator elements are always `LO`.
    pub fn vr_of(&self, tag: Tag, private_creator: Option<&str>) -> VR {
        if tag.is_group_length() {
            return VR::UL;
        }
        if tag.is_private_creator() {
            return VR::LO;
        }
        let creator = if tag.is_private() { private_creator } else { None };
        self.dictionary(creator)
            .and_then(|d| d.vr_of(tag))
            .unwrap_or(VR::UN)
    }

    /// Obtain the keyword of an element, if known.
    pub fn keyword_of(&self, tag: Tag, private_creator: Option<&str>) -> Option<&str> {
        let creator = if tag.is_private() { private_creator } else { None };
        self.dictionary(creator).and_then(|d| d.keyword_of(tag))
    }

    /// Obtain the tag of the element with the given keyword.
    pub fn tag_for_keyword(&self, keyword: &str, private_creator: Option<&str>) -> Option<Tag> {
        self.dictionary(private_creator)
            .and_then(|d| d.tag_for_keyword(keyword))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_lookup() {
        let dict = standard_dictionary();
        assert_eq!(dict.vr_of(tags::PATIENT_ID), Some(VR::LO));
        assert_eq!(dict.keyword_of(tags::PATIENT_NAME), Some("PatientName"));
        assert_eq!(dict.tag_for_keyword("Rows"), Some(tags::ROWS));
    }

    #[test]
    fn private_lookup_ignores_block() {
        let acme = TableDictionary::new_private("ACME").with_entry(Tag(0x0041, 0x1001), "AcmeFlag", VR::CS);
        let registry = DictionaryRegistry::new().with(acme);
        assert_eq!(registry.vr_of(Tag(0x0041, 0x1101), Some("ACME")), VR::CS);
        assert_eq!(registry.vr_of(Tag(0x0041, 0x1001), Some("OTHER")), VR::UN);
        assert_eq!(registry.vr_of(Tag(0x0041, 0x1001), None), VR::UN);
        assert_eq!(registry.keyword_of(Tag(0x0041, 0x10FF), Some("ACME")), None);
        assert_eq!(registry.vr_of(Tag(0x0041, 0x0010), None), VR::LO);
        assert_eq!(registry.vr_of(Tag(0x0041, 0x0000), None), VR::UL);
    }

    #[test]
    fn insert_replaces_by_tag() {
        let mut dict = TableDictionary::new();
        dict.insert(Tag(0x0009, 0x0001), "First", VR::LO);
        dict.insert(Tag(0x0009, 0x0001), "Second", VR::SH);
        assert_eq!(dict.tag_for_keyword("First"), None);
        assert_eq!(dict.vr_of(Tag(0x0009, 0x0001)), Some(VR::SH));
        assert_eq!(dict.entries().count(), 1);
    }
}
