//! Issuers of identifiers, and identifiers qualified by their issuer.

use crate::attributes::{self, Attributes};
use dicom_attrs_core::header::VR;
use dicom_attrs_core::tags;
use snafu::{ensure, Backtrace, Snafu};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Invalid issuer `{}`: {}", text, reason))]
    InvalidIssuer {
        text: String,
        reason: &'static str,
        backtrace: Backtrace,
    },
    #[snafu(display("Missing identifier in `{}`", text))]
    MissingId { text: String, backtrace: Backtrace },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_owned())
}

/// The authority issuing an identifier, in the form of an HL7 v2
/// hierarchic designator: a local namespace entity ID and/or a
/// universal entity ID with its type.
///
/// ```
/// # use dicom_attrs_object::Issuer;
/// let issuer: Issuer = "Hospital&1.2.40.0.13.1&ISO".parse().unwrap();
/// assert_eq!(issuer.local_namespace_entity_id(), Some("Hospital"));
/// assert_eq!(issuer.universal_entity_id_type(), Some("ISO"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Issuer {
    local_namespace_entity_id: Option<String>,
    universal_entity_id: Option<String>,
    universal_entity_id_type: Option<String>,
}

impl Issuer {
    /// An issuer known by a local namespace entity ID only.
    pub fn local(id: impl Into<String>) -> Self {
        Issuer {
            local_namespace_entity_id: Some(id.into()),
            universal_entity_id: None,
            universal_entity_id_type: None,
        }
    }

    /// An issuer known by a universal entity ID, and maybe a local one.
    pub fn universal(
        local_namespace_entity_id: Option<String>,
        universal_entity_id: impl Into<String>,
        universal_entity_id_type: impl Into<String>,
    ) -> Self {
        Issuer {
            local_namespace_entity_id,
            universal_entity_id: Some(universal_entity_id.into()),
            universal_entity_id_type: Some(universal_entity_id_type.into()),
        }
    }

    pub fn local_namespace_entity_id(&self) -> Option<&str> {
        self.local_namespace_entity_id.as_deref()
    }

    pub fn universal_entity_id(&self) -> Option<&str> {
        self.universal_entity_id.as_deref()
    }

    pub fn universal_entity_id_type(&self) -> Option<&str> {
        self.universal_entity_id_type.as_deref()
    }

    fn from_parts(
        local_namespace_entity_id: Option<String>,
        universal_entity_id: Option<String>,
        universal_entity_id_type: Option<String>,
    ) -> Option<Issuer> {
        if local_namespace_entity_id.is_none() && universal_entity_id.is_none() {
            return None;
        }
        Some(Issuer {
            local_namespace_entity_id,
            universal_entity_id,
            universal_entity_id_type,
        })
    }

    /// The issuer of the Patient ID of a data set,
    /// from Issuer of Patient ID and the first item of
    /// Issuer of Patient ID Qualifiers Sequence.
    pub fn from_issuer_of_patient_id(attrs: &Attributes) -> Option<Issuer> {
        let qualifiers = attrs.get_item(tags::ISSUER_OF_PATIENT_ID_QUALIFIERS_SEQUENCE, 0);
        Issuer::from_parts(
            attrs.get_string(tags::ISSUER_OF_PATIENT_ID),
            qualifiers.and_then(|item| item.get_string(tags::UNIVERSAL_ENTITY_ID)),
            qualifiers.and_then(|item| item.get_string(tags::UNIVERSAL_ENTITY_ID_TYPE)),
        )
    }

    /// An issuer held by the elements of an item,
    /// as in Issuer of Accession Number Sequence.
    pub fn from_item(item: &Attributes) -> Option<Issuer> {
        Issuer::from_parts(
            item.get_string(tags::LOCAL_NAMESPACE_ENTITY_ID),
            item.get_string(tags::UNIVERSAL_ENTITY_ID),
            item.get_string(tags::UNIVERSAL_ENTITY_ID_TYPE),
        )
    }

    /// Write this issuer into the elements of an item.
    pub fn write_to_item(&self, item: &mut Attributes) -> attributes::Result<()> {
        if let Some(id) = &self.local_namespace_entity_id {
            item.set_string(tags::LOCAL_NAMESPACE_ENTITY_ID, VR::UT, id)?;
        }
        if let Some(id) = &self.universal_entity_id {
            item.set_string(tags::UNIVERSAL_ENTITY_ID, VR::UT, id)?;
        }
        if let Some(kind) = &self.universal_entity_id_type {
            item.set_string(tags::UNIVERSAL_ENTITY_ID_TYPE, VR::CS, kind)?;
        }
        Ok(())
    }

    /// A new item holding this issuer.
    pub fn to_item(&self) -> attributes::Result<Attributes> {
        let mut item = Attributes::with_capacity(3);
        self.write_to_item(&mut item)?;
        Ok(item)
    }

    /// Write this issuer as the issuer of the Patient ID of a data set.
    pub fn write_issuer_of_patient_id(&self, attrs: &mut Attributes) -> attributes::Result<()> {
        if let Some(id) = &self.local_namespace_entity_id {
            attrs.set_string(tags::ISSUER_OF_PATIENT_ID, VR::LO, id)?;
        }
        if let Some(id) = &self.universal_entity_id {
            let qualifiers = attrs
                .ensure_sequence(tags::ISSUER_OF_PATIENT_ID_QUALIFIERS_SEQUENCE, 1)?
                .first_or_new_item();
            qualifiers.set_string(tags::UNIVERSAL_ENTITY_ID, VR::UT, id)?;
            if let Some(kind) = &self.universal_entity_id_type {
                qualifiers.set_string(tags::UNIVERSAL_ENTITY_ID_TYPE, VR::CS, kind)?;
            }
        }
        Ok(())
    }

    /// Whether both issuers may denote the same authority.
    ///
    /// At least one of the local or universal IDs must be known on both
    /// sides, and each ID known on both sides must be equal.
    pub fn matches(&self, other: &Issuer) -> bool {
        let local = match (&self.local_namespace_entity_id, &other.local_namespace_entity_id) {
            (Some(a), Some(b)) => Some(a == b),
            _ => None,
        };
        let universal = match (&self.universal_entity_id, &other.universal_entity_id) {
            (Some(a), Some(b)) => {
                Some(a == b && self.universal_entity_id_type == other.universal_entity_id_type)
            }
            _ => None,
        };
        match (local, universal) {
            (None, None) => false,
            (local, universal) => local.unwrap_or(true) && universal.unwrap_or(true),
        }
    }

    /// Complete the IDs this issuer lacks from a matching issuer.
    ///
    /// Returns whether anything was added.
    pub fn merge(&mut self, other: &Issuer) -> bool {
        if !self.matches(other) {
            return false;
        }
        let mut changed = false;
        if self.local_namespace_entity_id.is_none() && other.local_namespace_entity_id.is_some() {
            self.local_namespace_entity_id = other.local_namespace_entity_id.clone();
            changed = true;
        }
        if self.universal_entity_id.is_none() && other.universal_entity_id.is_some() {
            self.universal_entity_id = other.universal_entity_id.clone();
            self.universal_entity_id_type = other.universal_entity_id_type.clone();
            changed = true;
        }
        changed
    }
}

impl fmt::Display for Issuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(id) = &self.local_namespace_entity_id {
            f.write_str(id)?;
        }
        if let Some(id) = &self.universal_entity_id {
            write!(
                f,
                "&{}&{}",
                id,
                self.universal_entity_id_type.as_deref().unwrap_or_default()
            )?;
        }
        Ok(())
    }
}

impl FromStr for Issuer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('&').collect();
        ensure!(
            parts.len() == 1 || parts.len() == 3,
            InvalidIssuerSnafu {
                text: s,
                reason: "expected one or three components",
            }
        );
        let local = non_empty(parts[0]);
        let universal = parts.get(1).and_then(|p| non_empty(p));
        let kind = parts.get(2).and_then(|p| non_empty(p));
        ensure!(
            universal.is_some() || kind.is_none(),
            InvalidIssuerSnafu {
                text: s,
                reason: "universal entity ID type without universal entity ID",
            }
        );
        ensure!(
            universal.is_none() || kind.is_some(),
            InvalidIssuerSnafu {
                text: s,
                reason: "missing universal entity ID type",
            }
        );
        Issuer::from_parts(local, universal, kind).ok_or_else(|| {
            InvalidIssuerSnafu {
                text: s,
                reason: "no entity ID",
            }
            .build()
        })
    }
}

/// An identifier with its issuer and type, such as a patient ID.
///
/// The text form follows the HL7 v2 CX data type:
/// `ID^^^Issuer^Type`, with trailing empty components omitted.
///
/// ```
/// # use dicom_attrs_object::IDWithIssuer;
/// let pid: IDWithIssuer = "123^^^Hospital&1.2.3&ISO^MR".parse().unwrap();
/// assert_eq!(pid.id(), "123");
/// assert_eq!(pid.type_of_id(), Some("MR"));
/// assert_eq!(pid.to_string(), "123^^^Hospital&1.2.3&ISO^MR");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IDWithIssuer {
    id: String,
    type_of_id: Option<String>,
    issuer: Option<Issuer>,
}

impl IDWithIssuer {
    pub fn new(id: impl Into<String>, issuer: Option<Issuer>) -> Self {
        IDWithIssuer {
            id: id.into(),
            type_of_id: None,
            issuer,
        }
    }

    pub fn with_type_of_id(mut self, type_of_id: impl Into<String>) -> Self {
        self.type_of_id = Some(type_of_id.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The identifier type code, as in HL7 table 0203.
    pub fn type_of_id(&self) -> Option<&str> {
        self.type_of_id.as_deref()
    }

    pub fn issuer(&self) -> Option<&Issuer> {
        self.issuer.as_ref()
    }

    /// The Patient ID of a data set, with its issuer and type.
    pub fn from_patient(attrs: &Attributes) -> Option<IDWithIssuer> {
        let id = attrs.get_string(tags::PATIENT_ID)?;
        let type_of_id = attrs
            .get_item(tags::ISSUER_OF_PATIENT_ID_QUALIFIERS_SEQUENCE, 0)
            .and_then(|item| item.get_string(tags::IDENTIFIER_TYPE_CODE));
        Some(IDWithIssuer {
            id,
            type_of_id,
            issuer: Issuer::from_issuer_of_patient_id(attrs),
        })
    }

    /// All patient identifiers of a data set: the Patient ID
    /// followed by the ones of Other Patient IDs Sequence,
    /// without duplicates.
    pub fn patient_ids(attrs: &Attributes) -> Vec<IDWithIssuer> {
        let mut ids: Vec<IDWithIssuer> = Vec::new();
        let others = attrs
            .get_sequence(tags::OTHER_PATIENT_IDS_SEQUENCE)
            .into_iter()
            .flat_map(|seq| seq.iter());
        for pid in std::iter::once(attrs).chain(others).filter_map(IDWithIssuer::from_patient) {
            if !ids.contains(&pid) {
                ids.push(pid);
            }
        }
        ids
    }

    /// Write this identifier as the Patient ID of a data set,
    /// with its issuer and type.
    pub fn write_to_patient(&self, attrs: &mut Attributes) -> attributes::Result<()> {
        attrs.set_string(tags::PATIENT_ID, VR::LO, &self.id)?;
        if let Some(issuer) = &self.issuer {
            issuer.write_issuer_of_patient_id(attrs)?;
        }
        if let Some(type_of_id) = &self.type_of_id {
            attrs
                .ensure_sequence(tags::ISSUER_OF_PATIENT_ID_QUALIFIERS_SEQUENCE, 1)?
                .first_or_new_item()
                .set_string(tags::IDENTIFIER_TYPE_CODE, VR::CS, type_of_id)?;
        }
        Ok(())
    }

    /// Whether both identifiers may denote the same entity:
    /// equal IDs, with matching issuers when both have one.
    pub fn matches(&self, other: &IDWithIssuer) -> bool {
        self.id == other.id
            && match (&self.issuer, &other.issuer) {
                (Some(a), Some(b)) => a.matches(b),
                _ => true,
            }
    }
}

impl fmt::Display for IDWithIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)?;
        if self.issuer.is_none() && self.type_of_id.is_none() {
            return Ok(());
        }
        f.write_str("^^^")?;
        if let Some(issuer) = &self.issuer {
            write!(f, "{}", issuer)?;
        }
        if let Some(type_of_id) = &self.type_of_id {
            write!(f, "^{}", type_of_id)?;
        }
        Ok(())
    }
}

impl FromStr for IDWithIssuer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut components = s.splitn(5, '^');
        let id = components.next().and_then(non_empty);
        let Some(id) = id else {
            return MissingIdSnafu { text: s }.fail();
        };
        let issuer = match components.nth(2).and_then(non_empty) {
            Some(issuer) => Some(issuer.parse()?),
            None => None,
        };
        let type_of_id = components.next().and_then(non_empty);
        Ok(IDWithIssuer {
            id,
            type_of_id,
            issuer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("Hospital")]
    #[case("&1.2.40.0.13.1&ISO")]
    #[case("Hospital&1.2.40.0.13.1&ISO")]
    fn issuer_text_forms(#[case] text: &str) {
        let issuer: Issuer = text.parse().unwrap();
        assert_eq!(issuer.to_string(), text);
    }

    #[rstest]
    #[case("")]
    #[case("A&B")]
    #[case("A&1.2.3&")]
    #[case("A&&ISO")]
    #[case("A&B&C&D")]
    fn invalid_issuers(#[case] text: &str) {
        assert!(text.parse::<Issuer>().is_err());
    }

    #[rstest]
    #[case("Hospital", "Hospital", true)]
    #[case("Hospital", "Clinic", false)]
    #[case("Hospital", "&1.2.3&ISO", false)]
    #[case("Hospital&1.2.3&ISO", "&1.2.3&ISO", true)]
    #[case("Hospital&1.2.3&ISO", "Clinic&1.2.3&ISO", false)]
    #[case("&1.2.3&ISO", "&1.2.3&DNS", false)]
    fn issuer_matching(#[case] a: &str, #[case] b: &str, #[case] expected: bool) {
        let a: Issuer = a.parse().unwrap();
        let b: Issuer = b.parse().unwrap();
        assert_eq!(a.matches(&b), expected);
        assert_eq!(b.matches(&a), expected);
    }

    #[test]
    fn merge_completes_matching_issuers() {
        let mut issuer = Issuer::local("Hospital");
        assert!(!issuer.merge(&Issuer::universal(None, "1.2.3", "ISO")));
        assert!(issuer.merge(&Issuer::universal(Some("Hospital".into()), "1.2.3", "ISO")));
        assert_eq!(issuer.to_string(), "Hospital&1.2.3&ISO");
        assert!(!issuer.merge(&Issuer::local("Hospital")));
    }

    #[test]
    fn issuer_items() {
        let issuer = Issuer::universal(Some("Hospital".into()), "1.2.3", "ISO");
        let item = issuer.to_item().unwrap();
        assert_eq!(item.get_string(tags::UNIVERSAL_ENTITY_ID).as_deref(), Some("1.2.3"));
        assert_eq!(Issuer::from_item(&item), Some(issuer));
        assert_eq!(Issuer::from_item(&Attributes::new()), None);
    }

    #[rstest]
    #[case("123")]
    #[case("123^^^Hospital")]
    #[case("123^^^Hospital&1.2.3&ISO^MR")]
    #[case("123^^^^MR")]
    fn id_text_forms(#[case] text: &str) {
        let pid: IDWithIssuer = text.parse().unwrap();
        assert_eq!(pid.to_string(), text);
    }

    #[test]
    fn ids_need_a_value() {
        assert!("^^^Hospital".parse::<IDWithIssuer>().is_err());
    }

    #[test]
    fn patient_ids_round_trip() {
        let pid: IDWithIssuer = "123^^^Hospital&1.2.3&ISO^MR".parse().unwrap();
        let mut attrs = Attributes::new();
        pid.write_to_patient(&mut attrs).unwrap();
        assert_eq!(attrs.get_string(tags::ISSUER_OF_PATIENT_ID).as_deref(), Some("Hospital"));
        let qualifiers = attrs.get_sequence(tags::ISSUER_OF_PATIENT_ID_QUALIFIERS_SEQUENCE).unwrap();
        assert_eq!(qualifiers.len(), 1);
        assert_eq!(IDWithIssuer::from_patient(&attrs), Some(pid));
    }

    #[test]
    fn other_patient_ids_are_collected() {
        let mut attrs = Attributes::new();
        IDWithIssuer::new("123", Some(Issuer::local("A")))
            .write_to_patient(&mut attrs)
            .unwrap();
        let others = attrs.new_sequence(tags::OTHER_PATIENT_IDS_SEQUENCE, 2).unwrap();
        IDWithIssuer::new("456", Some(Issuer::local("B")))
            .write_to_patient(others.new_item())
            .unwrap();
        IDWithIssuer::new("123", Some(Issuer::local("A")))
            .write_to_patient(others.new_item())
            .unwrap();

        let ids = IDWithIssuer::patient_ids(&attrs);
        let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        assert_eq!(ids, vec!["123^^^A", "456^^^B"]);
    }

    #[test]
    fn id_matching_is_lenient_about_missing_issuers() {
        let a = IDWithIssuer::new("123", Some(Issuer::local("A")));
        assert!(a.matches(&IDWithIssuer::new("123", None)));
        assert!(!a.matches(&IDWithIssuer::new("123", Some(Issuer::local("B")))));
        assert!(!a.matches(&IDWithIssuer::new("124", None)));
    }
}
