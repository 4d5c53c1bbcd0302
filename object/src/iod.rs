//! Information object definitions.
//!
//! An [`Iod`] lists rules on the data elements of a data set:
//! whether they are required, their VR, their value multiplicity,
//! the values or codes they may hold and the rules of their items.
//! Rules may be conditional on other elements of the data set.
//!
//! Definitions are read from XML:
//!
//! ```xml
//! <IOD>
//!   <DataElement tag="00080016" vr="UI" type="1" vm="1"/>
//!   <DataElement tag="00080060" vr="CS" type="1" vm="1">
//!     <Value>CT</Value>
//!     <Value>MR</Value>
//!   </DataElement>
//!   <DataElement tag="00280030" vr="DS" type="1C" vm="2">
//!     <If id="image"><Present tag="00280010"/></If>
//!   </DataElement>
//!   <DataElement tag="00081032" vr="SQ" type="3" vm="1-n">
//!     <Item>
//!       <DataElement tag="00080100" vr="SH" type="1" vm="1"/>
//!     </Item>
//!   </DataElement>
//! </IOD>
//! ```

use crate::attributes::Attributes;
use crate::code::Code;
use dicom_attrs_core::header::{Tag, VR};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use snafu::{Backtrace, OptionExt, ResultExt, Snafu};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Could not open IOD file {}", path.display()))]
    OpenFile {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },
    #[snafu(display("Malformed XML at position {}", position))]
    Xml {
        position: usize,
        source: quick_xml::Error,
        backtrace: Backtrace,
    },
    #[snafu(display("Missing attribute `{}` of <{}>", attribute, element))]
    MissingAttribute {
        element: String,
        attribute: &'static str,
        backtrace: Backtrace,
    },
    #[snafu(display("Invalid value `{}` for attribute `{}` of <{}>", value, attribute, element))]
    InvalidAttribute {
        element: String,
        attribute: &'static str,
        value: String,
        backtrace: Backtrace,
    },
    #[snafu(display("Unexpected <{}> at position {}", element, position))]
    UnexpectedElement {
        element: String,
        position: usize,
        backtrace: Backtrace,
    },
    #[snafu(display("Reference to unknown condition `{}`", id))]
    UnknownCondition { id: String, backtrace: Backtrace },
    #[snafu(display("Unexpected end of IOD"))]
    UnexpectedEof { backtrace: Backtrace },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The type of a data element, telling whether it is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// Not allowed.
    Type0,
    /// Required, with a value.
    Type1,
    /// Required, possibly empty.
    Type2,
    /// Optional.
    Type3,
}

/// A value multiplicity, such as `1`, `1-3`, `1-n` or `2-2n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Multiplicity {
    pub min: usize,
    /// `None` for no upper bound.
    pub max: Option<usize>,
    /// The number of values must be a multiple of this.
    pub step: usize,
}

impl Multiplicity {
    pub fn exactly(n: usize) -> Self {
        Multiplicity {
            min: n,
            max: Some(n),
            step: 1,
        }
    }

    pub fn contains(&self, n: usize) -> bool {
        n >= self.min && self.max.map_or(true, |max| n <= max) && n % self.step.max(1) == 0
    }

    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (min, max) = text.split_once('-').unwrap_or((text, text));
        let min: usize = min.trim().parse().ok()?;
        let max = max.trim();
        if let Some(factor) = max.strip_suffix(['n', 'N']) {
            let step = if factor.is_empty() { 1 } else { factor.parse().ok()? };
            return Some(Multiplicity { min, max: None, step });
        }
        let max: usize = max.parse().ok()?;
        (min <= max).then_some(Multiplicity {
            min,
            max: Some(max),
            step: 1,
        })
    }
}

/// An element addressed by a path of sequence tags,
/// each step going into the first item of the sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementPath {
    pub sequences: Vec<Tag>,
    pub tag: Tag,
    pub private_creator: Option<String>,
}

impl ElementPath {
    pub fn new(tag: Tag) -> Self {
        ElementPath {
            sequences: Vec::new(),
            tag,
            private_creator: None,
        }
    }

    /// Parse a path of the form `SSSSSSSS/.../TTTTTTTT`.
    fn parse(text: &str) -> Option<Self> {
        let mut tags = text
            .split('/')
            .map(|t| t.parse::<Tag>().ok())
            .collect::<Option<Vec<_>>>()?;
        let tag = tags.pop()?;
        Some(ElementPath {
            sequences: tags,
            tag,
            private_creator: None,
        })
    }

    /// The data set holding the addressed element.
    fn resolve<'a>(&self, attrs: &'a Attributes) -> Option<&'a Attributes> {
        self.sequences
            .iter()
            .try_fold(attrs, |attrs, &tag| attrs.get_item(tag, 0))
    }
}

/// A membership test on the value of an element.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberOf {
    pub path: ElementPath,
    pub vr: VR,
    /// The 1-based index of the value to test.
    pub value_number: usize,
    pub values: Vec<String>,
    /// For code sequences, the codes any item may hold.
    pub codes: Vec<Code>,
    /// Whether an absent value is a member.
    pub match_not_present: bool,
}

impl MemberOf {
    fn matches(&self, attrs: &Attributes) -> bool {
        let Some(attrs) = self.path.resolve(attrs) else {
            return self.match_not_present;
        };
        let key = (self.path.private_creator.as_deref(), self.path.tag);
        if self.vr == VR::SQ {
            let codes = Code::from_sequence(attrs, self.path.tag);
            if codes.is_empty() {
                return self.match_not_present;
            }
            return codes
                .iter()
                .any(|c| self.codes.iter().any(|code| code.equals_ignore_meaning(c)));
        }
        match attrs.get_string_at(key, self.value_number.saturating_sub(1)) {
            Some(value) => self.values.iter().any(|v| *v == value),
            None => self.match_not_present,
        }
    }
}

/// A predicate on a data set.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
    NAnd(Vec<Condition>),
    NOr(Vec<Condition>),
    /// The element is present with a value.
    Present(ElementPath),
    /// The element is absent or empty.
    NotPresent(ElementPath),
    MemberOf(MemberOf),
}

impl Condition {
    pub fn matches(&self, attrs: &Attributes) -> bool {
        match self {
            Condition::And(all) => all.iter().all(|c| c.matches(attrs)),
            Condition::Or(any) => any.iter().any(|c| c.matches(attrs)),
            Condition::Not(c) => !c.matches(attrs),
            Condition::NAnd(all) => !all.iter().all(|c| c.matches(attrs)),
            Condition::NOr(any) => !any.iter().any(|c| c.matches(attrs)),
            Condition::Present(path) => Self::is_present(path, attrs),
            Condition::NotPresent(path) => !Self::is_present(path, attrs),
            Condition::MemberOf(member) => member.matches(attrs),
        }
    }

    fn is_present(path: &ElementPath, attrs: &Attributes) -> bool {
        path.resolve(attrs)
            .map_or(false, |a| a.contains_value((path.private_creator.as_deref(), path.tag)))
    }
}

/// The condition of a conditional element,
/// identified so that its outcome is evaluated once per data set.
#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub id: Option<String>,
    pub condition: Condition,
}

impl If {
    /// Evaluate the condition, reusing the outcome recorded in `memo`
    /// for conditions with an id.
    pub fn evaluate(&self, attrs: &Attributes, memo: &mut HashMap<String, bool>) -> bool {
        if let Some(matched) = self.id.as_ref().and_then(|id| memo.get(id)) {
            return *matched;
        }
        let matched = self.condition.matches(attrs);
        if let Some(id) = &self.id {
            memo.insert(id.clone(), matched);
        }
        matched
    }
}

/// The rule on one data element.
#[derive(Debug, Clone, PartialEq)]
pub struct DataElement {
    pub tag: Tag,
    pub private_creator: Option<String>,
    pub vr: Option<VR>,
    pub element_type: ElementType,
    /// The number of values, or of items for sequences.
    pub vm: Option<Multiplicity>,
    /// The 1-based index of the value subject to `values`,
    /// or `None` for all values.
    pub value_number: Option<usize>,
    pub values: Vec<String>,
    /// For code sequences, the codes the items may hold.
    pub codes: Vec<Code>,
    pub condition: Option<If>,
    /// The rules on the items of a sequence.
    pub items: Option<Iod>,
}

impl DataElement {
    pub fn new(tag: Tag, vr: Option<VR>, element_type: ElementType) -> Self {
        DataElement {
            tag,
            private_creator: None,
            vr,
            element_type,
            vm: None,
            value_number: None,
            values: Vec::new(),
            codes: Vec::new(),
            condition: None,
            items: None,
        }
    }

    pub fn with_vm(mut self, vm: Multiplicity) -> Self {
        self.vm = Some(vm);
        self
    }

    pub fn with_values<S: Into<String>>(mut self, values: impl IntoIterator<Item = S>) -> Self {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_condition(mut self, condition: If) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_items(mut self, items: Iod) -> Self {
        self.items = Some(items);
        self
    }
}

/// A set of rules on the elements of a data set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Iod {
    elements: Vec<DataElement>,
}

impl Iod {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: DataElement) {
        self.elements.push(element);
    }

    pub fn elements(&self) -> &[DataElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Read a definition from XML text.
    pub fn parse(xml: &str) -> Result<Iod> {
        Iod::from_reader(xml.as_bytes())
    }

    /// Read a definition from an XML source.
    pub fn from_reader<R: BufRead>(source: R) -> Result<Iod> {
        Parser::new(source).parse_document()
    }

    /// Read a definition from a file, given as a path or a `file:` URI.
    pub fn load(location: impl AsRef<Path>) -> Result<Iod> {
        let location = location.as_ref();
        let path = location
            .to_str()
            .and_then(|s| s.strip_prefix("file://").or_else(|| s.strip_prefix("file:")))
            .map_or_else(|| location.to_path_buf(), PathBuf::from);
        let file = File::open(&path).context(OpenFileSnafu { path: &path })?;
        Iod::from_reader(BufReader::new(file))
    }
}

impl FromIterator<DataElement> for Iod {
    fn from_iter<T: IntoIterator<Item = DataElement>>(iter: T) -> Self {
        Iod {
            elements: iter.into_iter().collect(),
        }
    }
}

/// An XML element start, with its attributes.
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>, position: usize) -> Result<Self> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr
                .map_err(quick_xml::Error::from)
                .context(XmlSnafu { position })?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value().context(XmlSnafu { position })?;
            attributes.push((key, value.into_owned()));
        }
        Ok(Element { name, attributes })
    }

    fn get(&self, attribute: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == attribute)
            .map(|(_, value)| value.as_str())
    }

    fn require(&self, attribute: &'static str) -> Result<&str> {
        self.get(attribute).context(MissingAttributeSnafu {
            element: &self.name,
            attribute,
        })
    }

    fn invalid<T>(&self, attribute: &'static str, value: &str) -> Result<T> {
        InvalidAttributeSnafu {
            element: &self.name,
            attribute,
            value,
        }
        .fail()
    }

    fn tag(&self) -> Result<Tag> {
        let text = self.require("tag")?;
        text.parse().or_else(|_| self.invalid("tag", text))
    }

    fn path(&self) -> Result<ElementPath> {
        let text = self.require("tag")?;
        let mut path = ElementPath::parse(text).map_or_else(|| self.invalid("tag", text), Ok)?;
        path.private_creator = self.get("privateCreator").map(str::to_owned);
        Ok(path)
    }

    fn vr(&self) -> Result<Option<VR>> {
        match self.get("vr") {
            Some(text) => text.parse().map(Some).or_else(|_| self.invalid("vr", text)),
            None => Ok(None),
        }
    }

    fn value_number(&self) -> Result<Option<usize>> {
        match self.get("valueNumber") {
            Some(text) => match text.trim().parse::<usize>() {
                Ok(n) if n > 0 => Ok(Some(n)),
                _ => self.invalid("valueNumber", text),
            },
            None => Ok(None),
        }
    }
}

enum Node {
    Start(Element),
    End(String),
    Text(String),
    Eof,
}

struct Parser<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    /// Conditions with an id, for reference by later rules.
    conditions: HashMap<String, Condition>,
}

impl<R: BufRead> Parser<R> {
    fn new(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.expand_empty_elements(true).trim_text(true);
        Parser {
            reader,
            buf: Vec::new(),
            conditions: HashMap::new(),
        }
    }

    fn next(&mut self) -> Result<Node> {
        loop {
            self.buf.clear();
            let position = self.reader.buffer_position();
            match self
                .reader
                .read_event_into(&mut self.buf)
                .context(XmlSnafu { position })?
            {
                Event::Start(start) => return Ok(Node::Start(Element::from_start(&start, position)?)),
                Event::End(end) => {
                    return Ok(Node::End(
                        String::from_utf8_lossy(end.local_name().as_ref()).into_owned(),
                    ))
                }
                Event::Text(text) => {
                    let text = text.unescape().context(XmlSnafu { position })?;
                    if !text.trim().is_empty() {
                        return Ok(Node::Text(text.trim().to_owned()));
                    }
                }
                Event::CData(data) => {
                    return Ok(Node::Text(String::from_utf8_lossy(&data).trim().to_owned()))
                }
                Event::Eof => return Ok(Node::Eof),
                _ => {}
            }
        }
    }

    fn unexpected<T>(&self, element: impl Into<String>) -> Result<T> {
        UnexpectedElementSnafu {
            element,
            position: self.reader.buffer_position(),
        }
        .fail()
    }

    /// The next child element of `parent`, or `None` at its end.
    fn next_child(&mut self, parent: &str) -> Result<Option<Element>> {
        match self.next()? {
            Node::Start(element) => Ok(Some(element)),
            Node::End(name) if name == parent => Ok(None),
            Node::End(name) => self.unexpected(format!("/{}", name)),
            Node::Text(_) => self.unexpected(format!("text in {}", parent)),
            Node::Eof => UnexpectedEofSnafu.fail(),
        }
    }

    fn expect_end(&mut self, name: &str) -> Result<()> {
        match self.next_child(name)? {
            None => Ok(()),
            Some(child) => self.unexpected(child.name),
        }
    }

    /// The text content of an element without children.
    fn text(&mut self, name: &str) -> Result<String> {
        match self.next()? {
            Node::Text(text) => {
                self.expect_end(name)?;
                Ok(text)
            }
            Node::End(end) if end == name => Ok(String::new()),
            Node::Start(child) => self.unexpected(child.name),
            Node::End(end) => self.unexpected(format!("/{}", end)),
            Node::Eof => UnexpectedEofSnafu.fail(),
        }
    }

    fn parse_document(mut self) -> Result<Iod> {
        loop {
            match self.next()? {
                Node::Start(root) if root.name == "IOD" => return self.parse_iod("IOD"),
                Node::Start(other) => return self.unexpected(other.name),
                Node::Eof => return UnexpectedEofSnafu.fail(),
                _ => {}
            }
        }
    }

    fn parse_iod(&mut self, parent: &str) -> Result<Iod> {
        let mut iod = Iod::new();
        while let Some(child) = self.next_child(parent)? {
            if child.name != "DataElement" {
                return self.unexpected(child.name);
            }
            iod.push(self.parse_data_element(&child)?);
        }
        Ok(iod)
    }

    fn parse_data_element(&mut self, element: &Element) -> Result<DataElement> {
        let type_text = element.require("type")?;
        let element_type = match type_text.trim() {
            "0" => ElementType::Type0,
            "1" | "1C" => ElementType::Type1,
            "2" | "2C" => ElementType::Type2,
            "3" => ElementType::Type3,
            other => return element.invalid("type", other),
        };
        let vm = match element.get("vm").or_else(|| element.get("items")) {
            Some(text) => Some(Multiplicity::parse(text).map_or_else(|| element.invalid("vm", text), Ok)?),
            None => None,
        };
        let mut rule = DataElement::new(element.tag()?, element.vr()?, element_type);
        rule.private_creator = element.get("privateCreator").map(str::to_owned);
        rule.vm = vm;
        rule.value_number = element.value_number()?;

        while let Some(child) = self.next_child("DataElement")? {
            match child.name.as_str() {
                "Value" => rule.values.push(self.text("Value")?),
                "Code" => rule.codes.push(self.parse_code(&child)?),
                "If" => rule.condition = Some(self.parse_if(&child)?),
                "Item" => rule.items = Some(self.parse_iod("Item")?),
                _ => return self.unexpected(child.name),
            }
        }
        Ok(rule)
    }

    fn parse_code(&mut self, element: &Element) -> Result<Code> {
        let code = Code::new(
            element.require("codeValue")?,
            element.get("codingSchemeDesignator").unwrap_or_default(),
            element.get("codingSchemeVersion").map(str::to_owned),
            element.get("codeMeaning").unwrap_or_default(),
        );
        self.expect_end(&element.name)?;
        Ok(code)
    }

    fn parse_if(&mut self, element: &Element) -> Result<If> {
        let id = element.get("id").map(str::to_owned);
        if let Some(idref) = element.get("idref") {
            let condition = self
                .conditions
                .get(idref)
                .cloned()
                .context(UnknownConditionSnafu { id: idref })?;
            self.expect_end("If")?;
            return Ok(If {
                id: Some(idref.to_owned()),
                condition,
            });
        }
        let child = match self.next_child("If")? {
            Some(child) => child,
            None => return self.unexpected("/If"),
        };
        let condition = self.parse_condition(&child)?;
        self.expect_end("If")?;
        if let Some(id) = &id {
            self.conditions.insert(id.clone(), condition.clone());
        }
        Ok(If { id, condition })
    }

    fn parse_conditions(&mut self, parent: &str) -> Result<Vec<Condition>> {
        let mut conditions = Vec::new();
        while let Some(child) = self.next_child(parent)? {
            conditions.push(self.parse_condition(&child)?);
        }
        Ok(conditions)
    }

    fn parse_condition(&mut self, element: &Element) -> Result<Condition> {
        let name = element.name.as_str();
        Ok(match name {
            "And" => Condition::And(self.parse_conditions(name)?),
            "Or" => Condition::Or(self.parse_conditions(name)?),
            "NAnd" => Condition::NAnd(self.parse_conditions(name)?),
            "NOr" => Condition::NOr(self.parse_conditions(name)?),
            "Not" => {
                let mut inner = self.parse_conditions(name)?;
                if inner.len() != 1 {
                    return self.unexpected(name);
                }
                Condition::Not(Box::new(inner.remove(0)))
            }
            "Present" => {
                let path = element.path()?;
                self.expect_end(name)?;
                Condition::Present(path)
            }
            "NotPresent" => {
                let path = element.path()?;
                self.expect_end(name)?;
                Condition::NotPresent(path)
            }
            "MemberOf" => {
                let path = element.path()?;
                let vr = element.vr()?.unwrap_or(VR::CS);
                let value_number = element.value_number()?.unwrap_or(1);
                let match_not_present = element.get("matchNotPresent") == Some("true");
                let mut member = MemberOf {
                    path,
                    vr,
                    value_number,
                    values: Vec::new(),
                    codes: Vec::new(),
                    match_not_present,
                };
                while let Some(child) = self.next_child(name)? {
                    match child.name.as_str() {
                        "Value" => member.values.push(self.text("Value")?),
                        "Code" => member.codes.push(self.parse_code(&child)?),
                        _ => return self.unexpected(child.name),
                    }
                }
                Condition::MemberOf(member)
            }
            _ => return self.unexpected(name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_attrs_core::tags;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const IOD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<IOD>
  <DataElement tag="00080016" vr="UI" type="1" vm="1"/>
  <DataElement tag="00080060" vr="CS" type="1" vm="1">
    <Value>CT</Value>
    <Value>MR</Value>
  </DataElement>
  <DataElement tag="00280030" vr="DS" type="1C" vm="2">
    <If id="image"><Present tag="00280010"/></If>
  </DataElement>
  <DataElement tag="00280011" vr="US" type="1C" vm="1">
    <If idref="image"/>
  </DataElement>
  <DataElement tag="00081032" vr="SQ" type="3" vm="1-n">
    <Item>
      <DataElement tag="00080100" vr="SH" type="1" vm="1"/>
    </Item>
  </DataElement>
  <DataElement tag="00100040" vr="CS" type="2C">
    <If>
      <Or>
        <MemberOf tag="00080060" vr="CS"><Value>CT</Value></MemberOf>
        <NotPresent tag="00081032/00080100"/>
      </Or>
    </If>
  </DataElement>
</IOD>"#;

    #[test]
    fn parse_definitions() {
        let iod = Iod::parse(IOD).unwrap();
        assert_eq!(iod.len(), 6);
        let modality = &iod.elements()[1];
        assert_eq!(modality.tag, tags::MODALITY);
        assert_eq!(modality.element_type, ElementType::Type1);
        assert_eq!(modality.vm, Some(Multiplicity::exactly(1)));
        assert_eq!(modality.values, vec!["CT".to_owned(), "MR".to_owned()]);

        let spacing = &iod.elements()[2];
        let columns = &iod.elements()[3];
        assert_eq!(
            spacing.condition.as_ref().map(|c| &c.condition),
            Some(&Condition::Present(ElementPath::new(tags::ROWS)))
        );
        assert_eq!(spacing.condition, columns.condition);

        let items = iod.elements()[4].items.as_ref().unwrap();
        assert_eq!(items.elements()[0].tag, tags::CODE_VALUE);

        let sex = iod.elements()[5].condition.as_ref().unwrap();
        match &sex.condition {
            Condition::Or(any) => {
                assert!(matches!(&any[1], Condition::NotPresent(path)
                    if path.sequences == vec![tags::PROCEDURE_CODE_SEQUENCE]))
            }
            other => panic!("unexpected condition {:?}", other),
        }
    }

    #[rstest]
    #[case("<DataElement tag=\"00080016\" type=\"1\"/>")]
    #[case("<IOD><DataElement tag=\"0008\" type=\"1\"/></IOD>")]
    #[case("<IOD><DataElement tag=\"00080016\" type=\"4\"/></IOD>")]
    #[case("<IOD><DataElement tag=\"00080016\"/></IOD>")]
    #[case("<IOD><DataElement tag=\"00080016\" type=\"1\" vm=\"3-1\"/></IOD>")]
    #[case("<IOD><DataElement tag=\"00080016\" type=\"1C\"><If idref=\"nope\"/></DataElement></IOD>")]
    #[case("<IOD><DataElement tag=\"00080016\" type=\"1\">")]
    fn invalid_definitions(#[case] xml: &str) {
        assert!(Iod::parse(xml).is_err());
    }

    #[rstest]
    #[case("1", 1, true)]
    #[case("1", 2, false)]
    #[case("1-3", 3, true)]
    #[case("1-n", 7, true)]
    #[case("1-n", 0, false)]
    #[case("2-2n", 4, true)]
    #[case("2-2n", 3, false)]
    fn multiplicities(#[case] vm: &str, #[case] n: usize, #[case] expected: bool) {
        assert_eq!(Multiplicity::parse(vm).unwrap().contains(n), expected);
    }

    #[test]
    fn conditions_are_memoized_by_id() {
        let present = If {
            id: Some("rows".into()),
            condition: Condition::Present(ElementPath::new(tags::ROWS)),
        };
        let mut attrs = Attributes::new();
        let mut memo = HashMap::new();
        assert!(!present.evaluate(&attrs, &mut memo));
        attrs.set_int(tags::ROWS, VR::US, 1).unwrap();
        assert!(!present.evaluate(&attrs, &mut memo));
        assert!(present.evaluate(&attrs, &mut HashMap::new()));
    }

    #[test]
    fn member_of_values_and_absence() {
        let mut member = MemberOf {
            path: ElementPath::new(tags::MODALITY),
            vr: VR::CS,
            value_number: 1,
            values: vec!["CT".into()],
            codes: Vec::new(),
            match_not_present: false,
        };
        let mut attrs = Attributes::new();
        assert!(!member.matches(&attrs));
        member.match_not_present = true;
        assert!(member.matches(&attrs));
        attrs.set_string(tags::MODALITY, VR::CS, "MR").unwrap();
        assert!(!member.matches(&attrs));
        attrs.set_string(tags::MODALITY, VR::CS, "CT").unwrap();
        assert!(member.matches(&attrs));
    }

    #[test]
    fn member_of_codes() {
        let member = MemberOf {
            path: ElementPath::new(tags::ANATOMIC_REGION_SEQUENCE),
            vr: VR::SQ,
            value_number: 1,
            values: Vec::new(),
            codes: vec![Code::new("T-D1100", "SRT", None, "Head")],
            match_not_present: false,
        };
        let mut attrs = Attributes::new();
        let seq = attrs.new_sequence(tags::ANATOMIC_REGION_SEQUENCE, 1).unwrap();
        Code::new("T-D1100", "SRT", None, "Kopf")
            .write_to_item(seq.new_item())
            .unwrap();
        assert!(member.matches(&attrs));
    }
}
