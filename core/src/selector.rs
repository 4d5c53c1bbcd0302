//! Structural paths into nested attribute sets.
//!
//! A selector names an element, possibly nested in sequence items,
//! and optionally one of its values. Selectors have a textual form
//! resembling XPath, used by declarative configuration:
//!
//! ```text
//! DicomAttribute[@tag="00400275"]/Item[@number="1"]/DicomAttribute[@tag="00321060"]/Value[@number="1"]
//! ```
//!
//! Item and value numbers are 1-based in the textual form
//! and 0-based in the API.

use crate::header::Tag;
use snafu::{ensure, Backtrace, OptionExt, Snafu};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Expected {} at position {}", expected, position))]
    Syntax {
        expected: &'static str,
        position: usize,
        backtrace: Backtrace,
    },
    #[snafu(display("Invalid tag `{}` at position {}", text, position))]
    InvalidTag {
        text: String,
        position: usize,
        backtrace: Backtrace,
    },
    #[snafu(display("Invalid number `{}` at position {}", text, position))]
    InvalidNumber {
        text: String,
        position: usize,
        backtrace: Backtrace,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A pointer to an item of a sequence, or to any item if no index is given.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemPointer {
    /// The tag of the sequence element.
    pub sequence_tag: Tag,
    /// The private creator of the sequence element, if private.
    pub private_creator: Option<String>,
    /// The 0-based index of the item, `None` for any item.
    pub item_index: Option<usize>,
}

impl ItemPointer {
    /// Point to an item of a standard sequence.
    pub fn new(sequence_tag: Tag, item_index: usize) -> Self {
        ItemPointer {
            sequence_tag,
            private_creator: None,
            item_index: Some(item_index),
        }
    }

    /// Point to an item of a private sequence.
    pub fn with_private_creator(
        sequence_tag: Tag,
        private_creator: impl Into<String>,
        item_index: Option<usize>,
    ) -> Self {
        ItemPointer {
            sequence_tag,
            private_creator: Some(private_creator.into()),
            item_index,
        }
    }

    /// Whether this pointer matches a concrete item position,
    /// taking an unspecified index as a wildcard.
    pub fn matches(&self, other: &ItemPointer) -> bool {
        self.sequence_tag == other.sequence_tag
            && self.private_creator == other.private_creator
            && (self.item_index.is_none() || self.item_index == other.item_index)
    }
}

/// A selector of a data element, possibly nested in sequence items.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeSelector {
    /// The tag of the selected element.
    pub tag: Tag,
    /// The private creator of the selected element, if private.
    pub private_creator: Option<String>,
    /// The path of items leading to the data set holding the element.
    pub item_pointers: Vec<ItemPointer>,
}

impl AttributeSelector {
    /// Select a top-level element.
    pub fn new(tag: Tag) -> Self {
        AttributeSelector {
            tag,
            private_creator: None,
            item_pointers: Vec::new(),
        }
    }

    /// Select a private element by creator.
    pub fn with_private_creator(mut self, private_creator: impl Into<String>) -> Self {
        self.private_creator = Some(private_creator.into());
        self
    }

    /// Select the element within the items reached by the given path.
    pub fn with_item_pointers(mut self, item_pointers: Vec<ItemPointer>) -> Self {
        self.item_pointers = item_pointers;
        self
    }

    /// The nesting level of the selected element.
    pub fn level(&self) -> usize {
        self.item_pointers.len()
    }

    /// Whether this selector matches an element with the given
    /// position, private creator and tag.
    pub fn matches(&self, item_pointers: &[ItemPointer], private_creator: Option<&str>, tag: Tag) -> bool {
        self.tag == tag
            && self.private_creator.as_deref() == private_creator
            && self.item_pointers.len() == item_pointers.len()
            && self
                .item_pointers
                .iter()
                .zip(item_pointers)
                .all(|(a, b)| a.matches(b))
    }
}

impl From<Tag> for AttributeSelector {
    fn from(tag: Tag) -> Self {
        AttributeSelector::new(tag)
    }
}

/// A selector of a single value of a data element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValueSelector {
    /// The selected element.
    pub attribute: AttributeSelector,
    /// The 0-based index of the selected value.
    pub value_index: usize,
}

impl ValueSelector {
    /// Select a value of an element.
    pub fn new(attribute: AttributeSelector, value_index: usize) -> Self {
        ValueSelector {
            attribute,
            value_index,
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn unescape(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn write_attribute(f: &mut fmt::Formatter, tag: Tag, private_creator: Option<&str>) -> fmt::Result {
    write!(f, "DicomAttribute[@tag=\"{:08X}\"", tag.to_u32())?;
    if let Some(creator) = private_creator {
        write!(f, " and @privateCreator=\"{}\"", escape(creator))?;
    }
    f.write_str("]")
}

impl fmt::Display for ItemPointer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_attribute(f, self.sequence_tag, self.private_creator.as_deref())?;
        if let Some(index) = self.item_index {
            write!(f, "/Item[@number=\"{}\"]", index + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for AttributeSelector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for pointer in &self.item_pointers {
            write!(f, "{}/", pointer)?;
        }
        write_attribute(f, self.tag, self.private_creator.as_deref())
    }
}

impl fmt::Display for ValueSelector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/Value[@number=\"{}\"]", self.attribute, self.value_index + 1)
    }
}

/// Cursor over the textual form of a selector.
struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn eat(&mut self, literal: &str) -> bool {
        if self.rest().starts_with(literal) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, literal: &'static str) -> Result<()> {
        ensure!(
            self.eat(literal),
            SyntaxSnafu {
                expected: literal,
                position: self.pos
            }
        );
        Ok(())
    }

    fn quoted(&mut self) -> Result<&'a str> {
        self.expect("\"")?;
        let end = self.rest().find('"').context(SyntaxSnafu {
            expected: "closing quote",
            position: self.pos,
        })?;
        let value = &self.rest()[..end];
        self.pos += end + 1;
        Ok(value)
    }

    fn number(&mut self) -> Result<usize> {
        let position = self.pos;
        let text = self.quoted()?;
        let n: usize = text.parse().ok().context(InvalidNumberSnafu { text, position })?;
        ensure!(n > 0, InvalidNumberSnafu { text, position });
        Ok(n - 1)
    }

    fn attribute(&mut self) -> Result<(Tag, Option<String>)> {
        self.expect("DicomAttribute[@tag=")?;
        let position = self.pos;
        let text = self.quoted()?;
        let tag = text
            .parse::<Tag>()
            .ok()
            .filter(|_| text.len() == 8)
            .context(InvalidTagSnafu { text, position })?;
        let creator = if self.eat(" and @privateCreator=") {
            Some(unescape(self.quoted()?))
        } else {
            None
        };
        self.expect("]")?;
        Ok((tag, creator))
    }

    fn selector(&mut self) -> Result<(AttributeSelector, Option<usize>)> {
        let mut item_pointers = Vec::new();
        loop {
            let (tag, private_creator) = self.attribute()?;
            if self.eat("/Item[@number=") {
                let index = self.number()?;
                self.expect("]")?;
                item_pointers.push(ItemPointer {
                    sequence_tag: tag,
                    private_creator,
                    item_index: Some(index),
                });
                self.expect("/")?;
                continue;
            }
            if self.rest().starts_with("/DicomAttribute") {
                self.pos += 1;
                item_pointers.push(ItemPointer {
                    sequence_tag: tag,
                    private_creator,
                    item_index: None,
                });
                continue;
            }
            let value_index = if self.eat("/Value[@number=") {
                let index = self.number()?;
                self.expect("]")?;
                Some(index)
            } else {
                None
            };
            ensure!(
                self.rest().is_empty(),
                SyntaxSnafu {
                    expected: "end of selector",
                    position: self.pos
                }
            );
            let selector = AttributeSelector {
                tag,
                private_creator,
                item_pointers,
            };
            return Ok((selector, value_index));
        }
    }
}

impl FromStr for AttributeSelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parser = Parser { text: s.trim(), pos: 0 };
        let (selector, value_index) = parser.selector()?;
        ensure!(
            value_index.is_none(),
            SyntaxSnafu {
                expected: "attribute selector without value number",
                position: 0usize
            }
        );
        Ok(selector)
    }
}

impl FromStr for ValueSelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parser = Parser { text: s.trim(), pos: 0 };
        let (attribute, value_index) = parser.selector()?;
        Ok(ValueSelector {
            attribute,
            value_index: value_index.unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_nested_value_selector() {
        let text = r#"DicomAttribute[@tag="00400275"]/Item[@number="2"]/DicomAttribute[@tag="00321060"]/Value[@number="1"]"#;
        let selector: ValueSelector = text.parse().unwrap();
        assert_eq!(selector.value_index, 0);
        assert_eq!(selector.attribute.tag, Tag(0x0032, 0x1060));
        assert_eq!(
            selector.attribute.item_pointers,
            vec![ItemPointer::new(Tag(0x0040, 0x0275), 1)]
        );
        assert_eq!(selector.to_string(), text);
    }

    #[test]
    fn private_creator_round_trip() {
        let selector = AttributeSelector::new(Tag(0x0041, 0x0010)).with_private_creator("ACME \"/\" Inc");
        let text = selector.to_string();
        assert_eq!(
            text,
            r#"DicomAttribute[@tag="00410010" and @privateCreator="ACME &quot;/&quot; Inc"]"#
        );
        assert_eq!(text.parse::<AttributeSelector>().unwrap(), selector);
    }

    #[test]
    fn any_item_pointer() {
        let text = r#"DicomAttribute[@tag="00081115"]/DicomAttribute[@tag="00081150"]"#;
        let selector: AttributeSelector = text.parse().unwrap();
        assert_eq!(selector.item_pointers[0].item_index, None);
        assert!(selector.matches(&[ItemPointer::new(Tag(0x0008, 0x1115), 3)], None, Tag(0x0008, 0x1150)));
        assert_eq!(selector.to_string(), text);
    }

    #[test]
    fn malformed_selectors() {
        assert!(matches!(
            "DicomAttribute[@tag=\"0010001\"]".parse::<AttributeSelector>(),
            Err(Error::InvalidTag { .. })
        ));
        assert!(matches!(
            "DicomAttribute[@tag=\"00100010\"]/Item[@number=\"0\"]/DicomAttribute[@tag=\"00100010\"]"
                .parse::<AttributeSelector>(),
            Err(Error::InvalidNumber { .. })
        ));
        assert!(matches!(
            "DicomAttribute[@tag=\"00100010\"".parse::<AttributeSelector>(),
            Err(Error::Syntax { position: 30, .. })
        ));
    }
}
