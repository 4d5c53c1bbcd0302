//! Validating data sets against an information object definition.

use crate::attributes::{Attributes, ElementKey};
use crate::code::Code;
use crate::iod::{DataElement, ElementType, Iod};
use dicom_attrs_core::dictionary::{standard_dictionary, DataDictionary};
use dicom_attrs_core::header::{Tag, VR};
use std::collections::HashMap;
use std::fmt;

/// The reason a present element was found invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Invalid {
    /// The element has another VR.
    Vr,
    /// The number of values or items is out of range.
    Vm,
    /// A value is not among the allowed ones.
    Value,
    /// Some items of the sequence are invalid.
    Item,
    /// The sequence holds more items than allowed.
    MultipleItems,
    /// An item of a code sequence holds no allowed code.
    Code,
}

impl fmt::Display for Invalid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Invalid::Vr => "invalid VR",
            Invalid::Vm => "invalid multiplicity",
            Invalid::Value => "invalid value",
            Invalid::Item => "invalid item",
            Invalid::MultipleItems => "too many items",
            Invalid::Code => "invalid code",
        })
    }
}

/// A data element named by a rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementId {
    pub tag: Tag,
    pub private_creator: Option<String>,
}

impl ElementId {
    fn of(rule: &DataElement) -> Self {
        ElementId {
            tag: rule.tag,
            private_creator: rule.private_creator.clone(),
        }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag)?;
        match &self.private_creator {
            Some(creator) => write!(f, " [{}]", creator),
            None => match standard_dictionary().keyword_of(self.tag) {
                Some(keyword) => write!(f, " {}", keyword),
                None => Ok(()),
            },
        }
    }
}

/// A present element breaking a rule.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidAttribute {
    pub element: ElementId,
    pub reason: Invalid,
    /// The findings on invalid items, by item index.
    pub items: Vec<(usize, ValidationResult)>,
}

/// The findings of validating a data set against an [`Iod`].
///
/// Findings of each kind are accumulated independently;
/// an empty result means the data set is valid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    missing: Vec<ElementId>,
    missing_value: Vec<ElementId>,
    not_allowed: Vec<ElementId>,
    invalid: Vec<InvalidAttribute>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.missing.is_empty()
            && self.missing_value.is_empty()
            && self.not_allowed.is_empty()
            && self.invalid.is_empty()
    }

    /// Required elements which are absent.
    pub fn missing(&self) -> &[ElementId] {
        &self.missing
    }

    /// Type 1 elements which are present without a value.
    pub fn missing_value(&self) -> &[ElementId] {
        &self.missing_value
    }

    /// Type 0 elements which are present.
    pub fn not_allowed(&self) -> &[ElementId] {
        &self.not_allowed
    }

    pub fn invalid(&self) -> &[InvalidAttribute] {
        &self.invalid
    }

    fn add_invalid(&mut self, rule: &DataElement, reason: Invalid) {
        self.invalid.push(InvalidAttribute {
            element: ElementId::of(rule),
            reason,
            items: Vec::new(),
        });
    }

    fn fmt_level(&self, f: &mut fmt::Formatter<'_>, level: usize) -> fmt::Result {
        let indent = "  ".repeat(level);
        let lists = [
            ("Missing attributes", &self.missing),
            ("Missing attribute values", &self.missing_value),
            ("Not allowed attributes", &self.not_allowed),
        ];
        for (title, list) in lists {
            if list.is_empty() {
                continue;
            }
            writeln!(f, "{}{}:", indent, title)?;
            for id in list {
                writeln!(f, "{}  {}", indent, id)?;
            }
        }
        if !self.invalid.is_empty() {
            writeln!(f, "{}Invalid attributes:", indent)?;
            for attr in &self.invalid {
                writeln!(f, "{}  {}: {}", indent, attr.element, attr.reason)?;
                for (index, result) in &attr.items {
                    writeln!(f, "{}    Item #{}:", indent, index + 1)?;
                    result.fmt_level(f, level + 3)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_level(f, 0)
    }
}

impl Attributes {
    /// Check this data set against the rules of `iod`.
    ///
    /// Rules whose condition does not hold are skipped.
    /// Items of sequences are checked against the item rules
    /// of their element, each with its own conditions.
    pub fn validate(&self, iod: &Iod) -> ValidationResult {
        let mut result = ValidationResult::new();
        let mut conditions = HashMap::new();
        for rule in iod.elements() {
            self.validate_element(rule, &mut conditions, &mut result);
        }
        result
    }

    fn validate_element(
        &self,
        rule: &DataElement,
        conditions: &mut HashMap<String, bool>,
        result: &mut ValidationResult,
    ) {
        if let Some(condition) = &rule.condition {
            if !condition.evaluate(self, conditions) {
                return;
            }
        }
        let key = ElementKey::from((rule.private_creator.as_deref(), rule.tag));
        let present = self.contains(key);
        match (rule.element_type, present) {
            (ElementType::Type0, true) => {
                result.not_allowed.push(ElementId::of(rule));
                return;
            }
            (ElementType::Type1 | ElementType::Type2, false) => {
                result.missing.push(ElementId::of(rule));
                return;
            }
            (_, false) => return,
            _ => {}
        }
        let vm = self.value_multiplicity(key);
        if vm == 0 {
            if rule.element_type == ElementType::Type1 {
                result.missing_value.push(ElementId::of(rule));
            }
            return;
        }
        let vr = self.vr_of(key);
        if let Some(expected) = rule.vr {
            if vr != Some(expected) {
                result.add_invalid(rule, Invalid::Vr);
                return;
            }
        }
        if vr == Some(VR::SQ) {
            self.validate_items(rule, key, vm, result);
            return;
        }
        if let Some(multiplicity) = rule.vm {
            if !multiplicity.contains(vm) {
                result.add_invalid(rule, Invalid::Vm);
                return;
            }
        }
        if !rule.values.is_empty() {
            let values = self.get_strings(key).unwrap_or_default();
            let allowed = |v: &String| rule.values.contains(v);
            let valid = match rule.value_number {
                Some(n) => n.checked_sub(1).and_then(|i| values.get(i)).map_or(true, allowed),
                None => values.iter().all(allowed),
            };
            if !valid {
                result.add_invalid(rule, Invalid::Value);
            }
        }
    }

    fn validate_items(&self, rule: &DataElement, key: ElementKey<'_>, count: usize, result: &mut ValidationResult) {
        if let Some(multiplicity) = rule.vm {
            if multiplicity.max.map_or(false, |max| count > max) {
                result.add_invalid(rule, Invalid::MultipleItems);
                return;
            }
            if !multiplicity.contains(count) {
                result.add_invalid(rule, Invalid::Vm);
                return;
            }
        }
        let Some(seq) = self.get_sequence(key) else {
            return;
        };
        if !rule.codes.is_empty() {
            let allowed = seq.iter().all(|item| {
                Code::from_item(item).map_or(false, |code| {
                    rule.codes.iter().any(|c| c.equals_ignore_meaning(&code))
                })
            });
            if !allowed {
                result.add_invalid(rule, Invalid::Code);
                return;
            }
        }
        if let Some(iod) = &rule.items {
            let items: Vec<(usize, ValidationResult)> = seq
                .iter()
                .enumerate()
                .map(|(i, item)| (i, item.validate(iod)))
                .filter(|(_, r)| !r.is_valid())
                .collect();
            if !items.is_empty() {
                result.invalid.push(InvalidAttribute {
                    element: ElementId::of(rule),
                    reason: Invalid::Item,
                    items,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iod::Multiplicity;
    use dicom_attrs_core::tags;
    use pretty_assertions::assert_eq;

    const IOD: &str = r#"<IOD>
  <DataElement tag="00080016" vr="UI" type="1" vm="1"/>
  <DataElement tag="00080060" vr="CS" type="1" vm="1">
    <Value>CT</Value>
    <Value>MR</Value>
  </DataElement>
  <DataElement tag="00100010" vr="PN" type="2"/>
  <DataElement tag="00100040" vr="CS" type="0"/>
  <DataElement tag="00280030" vr="DS" type="1C" vm="2">
    <If id="image"><Present tag="00280010"/></If>
  </DataElement>
  <DataElement tag="00082218" vr="SQ" type="3" vm="1">
    <Code codeValue="T-D1100" codingSchemeDesignator="SRT" codeMeaning="Head"/>
    <Code codeValue="T-D3000" codingSchemeDesignator="SRT" codeMeaning="Chest"/>
  </DataElement>
  <DataElement tag="00081115" vr="SQ" type="1" vm="1-n">
    <Item>
      <DataElement tag="0020000E" vr="UI" type="1" vm="1"/>
    </Item>
  </DataElement>
</IOD>"#;

    fn valid() -> Attributes {
        let mut attrs = Attributes::new();
        attrs.set_string(tags::SOP_CLASS_UID, VR::UI, "1.2.840.10008.5.1.4.1.1.2").unwrap();
        attrs.set_string(tags::MODALITY, VR::CS, "CT").unwrap();
        attrs.set_null(tags::PATIENT_NAME, VR::PN).unwrap();
        attrs
            .new_sequence(tags::REFERENCED_SERIES_SEQUENCE, 1)
            .unwrap()
            .new_item()
            .set_string(tags::SERIES_INSTANCE_UID, VR::UI, "1.2.3")
            .unwrap();
        attrs
    }

    fn ids(list: &[ElementId]) -> Vec<Tag> {
        list.iter().map(|id| id.tag).collect()
    }

    fn reasons(result: &ValidationResult) -> Vec<(Tag, Invalid)> {
        result
            .invalid()
            .iter()
            .map(|a| (a.element.tag, a.reason))
            .collect()
    }

    #[test]
    fn valid_data_sets_have_no_findings() {
        let iod = Iod::parse(IOD).unwrap();
        let result = valid().validate(&iod);
        assert!(result.is_valid(), "{}", result);
        assert_eq!(result.to_string(), "");
    }

    #[test]
    fn findings_are_accumulated() {
        let iod = Iod::parse(IOD).unwrap();
        let mut attrs = valid();
        attrs.remove(tags::PATIENT_NAME);
        attrs.set_null(tags::SOP_CLASS_UID, VR::UI).unwrap();
        attrs.set_string(tags::PATIENT_SEX, VR::CS, "F").unwrap();
        attrs.set_string(tags::MODALITY, VR::CS, "US").unwrap();
        attrs.set_int(tags::ROWS, VR::US, 512).unwrap();
        attrs.set_double(tags::PIXEL_SPACING, VR::DS, 0.5).unwrap();

        let result = attrs.validate(&iod);
        assert_eq!(ids(result.missing()), vec![tags::PATIENT_NAME]);
        assert_eq!(ids(result.missing_value()), vec![tags::SOP_CLASS_UID]);
        assert_eq!(ids(result.not_allowed()), vec![tags::PATIENT_SEX]);
        assert_eq!(
            reasons(&result),
            vec![(tags::MODALITY, Invalid::Value), (tags::PIXEL_SPACING, Invalid::Vm)]
        );
    }

    #[test]
    fn conditions_gate_rules() {
        let iod = Iod::parse(IOD).unwrap();
        let mut attrs = valid();
        attrs.set_string(tags::PIXEL_SPACING, VR::LO, "0.5\\0.5").unwrap();
        assert!(attrs.validate(&iod).is_valid());

        attrs.set_int(tags::ROWS, VR::US, 512).unwrap();
        assert_eq!(reasons(&attrs.validate(&iod)), vec![(tags::PIXEL_SPACING, Invalid::Vr)]);
    }

    #[test]
    fn items_are_validated() {
        let iod = Iod::parse(IOD).unwrap();
        let mut attrs = valid();
        let seq = attrs.get_sequence_mut(tags::REFERENCED_SERIES_SEQUENCE).unwrap();
        seq.new_item();
        let result = attrs.validate(&iod);
        let invalid = result.invalid();
        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].reason, Invalid::Item);
        assert_eq!(invalid[0].items.len(), 1);
        assert_eq!(invalid[0].items[0].0, 1);
        assert_eq!(ids(invalid[0].items[0].1.missing()), vec![tags::SERIES_INSTANCE_UID]);
        assert!(result.to_string().contains("Item #2:"));

        attrs.new_sequence(tags::REFERENCED_SERIES_SEQUENCE, 0).unwrap();
        assert_eq!(
            ids(attrs.validate(&iod).missing_value()),
            vec![tags::REFERENCED_SERIES_SEQUENCE]
        );
    }

    #[test]
    fn code_sequences() {
        let iod = Iod::parse(IOD).unwrap();
        let mut attrs = valid();
        let seq = attrs.new_sequence(tags::ANATOMIC_REGION_SEQUENCE, 2).unwrap();
        Code::new("T-D1100", "SRT", None, "Kopf")
            .write_to_item(seq.new_item())
            .unwrap();
        assert!(attrs.validate(&iod).is_valid());

        let seq = attrs.get_sequence_mut(tags::ANATOMIC_REGION_SEQUENCE).unwrap();
        Code::new("T-D4000", "SRT", None, "Abdomen")
            .write_to_item(seq.new_item())
            .unwrap();
        assert_eq!(
            reasons(&attrs.validate(&iod)),
            vec![(tags::ANATOMIC_REGION_SEQUENCE, Invalid::MultipleItems)]
        );

        let seq = attrs.new_sequence(tags::ANATOMIC_REGION_SEQUENCE, 1).unwrap();
        Code::new("T-D4000", "SRT", None, "Abdomen")
            .write_to_item(seq.new_item())
            .unwrap();
        assert_eq!(
            reasons(&attrs.validate(&iod)),
            vec![(tags::ANATOMIC_REGION_SEQUENCE, Invalid::Code)]
        );
    }

    #[test]
    fn selected_value_numbers() {
        let mut rule = DataElement::new(tags::IMAGE_TYPE, Some(VR::CS), ElementType::Type1)
            .with_vm(Multiplicity {
                min: 2,
                max: None,
                step: 1,
            })
            .with_values(["ORIGINAL", "DERIVED"]);
        rule.value_number = Some(1);
        let iod: Iod = std::iter::once(rule).collect();

        let mut attrs = Attributes::new();
        attrs.set_strings(tags::IMAGE_TYPE, VR::CS, &["ORIGINAL", "PRIMARY"]).unwrap();
        assert!(attrs.validate(&iod).is_valid());
        attrs.set_strings(tags::IMAGE_TYPE, VR::CS, &["PRIMARY", "ORIGINAL"]).unwrap();
        assert_eq!(reasons(&attrs.validate(&iod)), vec![(tags::IMAGE_TYPE, Invalid::Value)]);
        attrs.set_string(tags::IMAGE_TYPE, VR::CS, "ORIGINAL").unwrap();
        assert_eq!(reasons(&attrs.validate(&iod)), vec![(tags::IMAGE_TYPE, Invalid::Vm)]);
    }
}
