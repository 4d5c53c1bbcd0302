//! Coded entries, as held by the items of code sequences.

use crate::attributes::{self, Attributes};
use dicom_attrs_core::header::VR;
use dicom_attrs_core::tags;
use snafu::{Backtrace, OptionExt, Snafu};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// The text is not of the form `(CV, CSD [CSV], "Meaning")`.
    #[snafu(display("Invalid code `{}`", text))]
    InvalidCode { text: String, backtrace: Backtrace },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Code values up to this length fit in a Code Value (SH) element.
const MAX_CODE_VALUE_LEN: usize = 16;

/// A coded entry: code value, coding scheme and code meaning.
///
/// ```
/// # use dicom_attrs_object::Code;
/// let code: Code = "(T-D1100, SRT, \"Head\")".parse().unwrap();
/// assert_eq!(code.value(), "T-D1100");
/// assert_eq!(code.coding_scheme_designator(), "SRT");
/// assert_eq!(code.to_string(), "(T-D1100, SRT, \"Head\")");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Code {
    value: String,
    coding_scheme_designator: String,
    coding_scheme_version: Option<String>,
    meaning: String,
}

impl Code {
    pub fn new(
        value: impl Into<String>,
        coding_scheme_designator: impl Into<String>,
        coding_scheme_version: Option<String>,
        meaning: impl Into<String>,
    ) -> Self {
        Code {
            value: value.into(),
            coding_scheme_designator: coding_scheme_designator.into(),
            coding_scheme_version,
            meaning: meaning.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn coding_scheme_designator(&self) -> &str {
        &self.coding_scheme_designator
    }

    pub fn coding_scheme_version(&self) -> Option<&str> {
        self.coding_scheme_version.as_deref()
    }

    pub fn meaning(&self) -> &str {
        &self.meaning
    }

    /// Whether the code value is a URN or URL.
    pub fn is_urn(&self) -> bool {
        self.value.contains(':')
    }

    /// Read a code from a code sequence item.
    ///
    /// The code value is taken from Code Value, Long Code Value or
    /// URN Code Value, in that order. Returns `None` if the item
    /// has no code value, no code meaning, or a non-URN code value
    /// without a coding scheme designator.
    pub fn from_item(item: &Attributes) -> Option<Code> {
        let value = item
            .get_string(tags::CODE_VALUE)
            .or_else(|| item.get_string(tags::LONG_CODE_VALUE))
            .or_else(|| item.get_string(tags::URN_CODE_VALUE))?;
        let meaning = item.get_string(tags::CODE_MEANING)?;
        let designator = match item.get_string(tags::CODING_SCHEME_DESIGNATOR) {
            Some(designator) => designator,
            None if value.contains(':') => String::new(),
            None => return None,
        };
        Some(Code {
            value,
            coding_scheme_designator: designator,
            coding_scheme_version: item.get_string(tags::CODING_SCHEME_VERSION),
            meaning,
        })
    }

    /// Read the codes held by the items of a code sequence,
    /// skipping items which do not carry a complete code.
    pub fn from_sequence(attrs: &Attributes, tag: dicom_attrs_core::Tag) -> Vec<Code> {
        attrs
            .get_sequence(tag)
            .map(|seq| seq.iter().filter_map(Code::from_item).collect())
            .unwrap_or_default()
    }

    /// Write this code into an item.
    ///
    /// Long values go to Long Code Value and URNs to URN Code Value.
    pub fn write_to_item(&self, item: &mut Attributes) -> attributes::Result<()> {
        if self.is_urn() {
            item.set_string(tags::URN_CODE_VALUE, VR::UR, &self.value)?;
        } else if self.value.len() > MAX_CODE_VALUE_LEN {
            item.set_string(tags::LONG_CODE_VALUE, VR::UC, &self.value)?;
        } else {
            item.set_string(tags::CODE_VALUE, VR::SH, &self.value)?;
        }
        if !self.coding_scheme_designator.is_empty() {
            item.set_string(
                tags::CODING_SCHEME_DESIGNATOR,
                VR::SH,
                &self.coding_scheme_designator,
            )?;
        }
        if let Some(version) = &self.coding_scheme_version {
            item.set_string(tags::CODING_SCHEME_VERSION, VR::SH, version)?;
        }
        item.set_string(tags::CODE_MEANING, VR::LO, &self.meaning)?;
        Ok(())
    }

    /// A new item holding this code.
    pub fn to_item(&self) -> attributes::Result<Attributes> {
        let mut item = Attributes::with_capacity(4);
        self.write_to_item(&mut item)?;
        Ok(item)
    }

    /// Whether both codes denote the same concept,
    /// regardless of their code meaning.
    ///
    /// A missing coding scheme version matches any version.
    pub fn equals_ignore_meaning(&self, other: &Code) -> bool {
        self.value == other.value
            && self.coding_scheme_designator == other.coding_scheme_designator
            && match (&self.coding_scheme_version, &other.coding_scheme_version) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}", self.value, self.coding_scheme_designator)?;
        if let Some(version) = &self.coding_scheme_version {
            write!(f, " [{}]", version)?;
        }
        write!(f, ", \"{}\")", self.meaning)
    }
}

impl FromStr for Code {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || InvalidCodeSnafu { text: s };
        let inner = s
            .trim()
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .with_context(invalid)?;
        let (value, rest) = inner.split_once(',').with_context(invalid)?;
        let (scheme, meaning) = rest.split_once(',').with_context(invalid)?;
        let meaning = meaning
            .trim()
            .strip_prefix('"')
            .and_then(|m| m.strip_suffix('"'))
            .with_context(invalid)?;
        let scheme = scheme.trim();
        let (designator, version) = match scheme.split_once('[') {
            Some((designator, version)) => {
                let version = version.strip_suffix(']').with_context(invalid)?;
                (designator.trim(), Some(version.trim().to_owned()))
            }
            None => (scheme, None),
        };
        let value = value.trim();
        if value.is_empty() || meaning.is_empty() || (designator.is_empty() && !value.contains(':')) {
            return invalid().fail();
        }
        Ok(Code::new(value, designator, version, meaning))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("(121322, DCM, \"Source image for image processing operation\")")]
    #[case("(99-1, 99LOCAL [1.0], \"Local, with comma\")")]
    #[case("(urn:oid:1.2.3, , \"By URN\")")]
    fn parse_and_format(#[case] text: &str) {
        let code: Code = text.parse().unwrap();
        assert_eq!(code.to_string(), text);
    }

    #[test]
    fn scheme_versions() {
        let code: Code = "(99-1, 99LOCAL [1.0], \"Local, with comma\")".parse().unwrap();
        assert_eq!(code.coding_scheme_designator(), "99LOCAL");
        assert_eq!(code.coding_scheme_version(), Some("1.0"));
        assert_eq!(code.meaning(), "Local, with comma");
    }

    #[rstest]
    #[case("121322, DCM, \"Meaning\"")]
    #[case("(121322, DCM)")]
    #[case("(121322, DCM, Meaning)")]
    #[case("(121322, , \"Meaning\")")]
    #[case("(121322, DCM [1.0, \"Meaning\")")]
    fn invalid_codes(#[case] text: &str) {
        assert!(text.parse::<Code>().is_err());
    }

    #[rstest]
    #[case("T-D1100", tags::CODE_VALUE)]
    #[case("A-CODE-VALUE-LONGER-THAN-16", tags::LONG_CODE_VALUE)]
    #[case("http://example.com/code", tags::URN_CODE_VALUE)]
    fn items_pick_the_code_value_element(#[case] value: &str, #[case] tag: dicom_attrs_core::Tag) {
        let code = Code::new(value, "SCT", None, "Something");
        let item = code.to_item().unwrap();
        assert_eq!(item.get_string(tag).as_deref(), Some(value));
        assert_eq!(Code::from_item(&item), Some(code));
    }

    #[test]
    fn incomplete_items_are_skipped() {
        let mut attrs = Attributes::new();
        let seq = attrs.new_sequence(tags::ANATOMIC_REGION_SEQUENCE, 2).unwrap();
        Code::new("T-D1100", "SRT", None, "Head")
            .write_to_item(seq.new_item())
            .unwrap();
        seq.new_item()
            .set_string(tags::CODE_VALUE, VR::SH, "T-D3000")
            .unwrap();
        let codes = Code::from_sequence(&attrs, tags::ANATOMIC_REGION_SEQUENCE);
        assert_eq!(codes, vec![Code::new("T-D1100", "SRT", None, "Head")]);
    }

    #[test]
    fn meaning_is_ignored_on_request() {
        let a = Code::new("T-D1100", "SRT", None, "Head");
        let b = Code::new("T-D1100", "SRT", Some("1.1".into()), "head");
        assert_ne!(a, b);
        assert!(a.equals_ignore_meaning(&b));
        assert!(!a.equals_ignore_meaning(&Code::new("T-D1100", "SCT", None, "Head")));
    }
}
