//! Person names (PN) as three component groups of five components each.

use itertools::Itertools;
use std::fmt;
use std::str::FromStr;

/// A component group of a person name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersonNameGroup {
    /// Single-byte character representation.
    Alphabetic = 0,
    /// Ideographic characters.
    Ideographic = 1,
    /// Phonetic characters.
    Phonetic = 2,
}

/// A component of a person name group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersonNameComponent {
    #[allow(missing_docs)]
    FamilyName = 0,
    #[allow(missing_docs)]
    GivenName = 1,
    #[allow(missing_docs)]
    MiddleName = 2,
    #[allow(missing_docs)]
    NamePrefix = 3,
    #[allow(missing_docs)]
    NameSuffix = 4,
}

/// A DICOM person name.
///
/// Parsing is lenient: more than three groups are ignored,
/// and components beyond the fifth are appended to the name suffix.
/// Formatting always produces the normalized form,
/// with surrounding spaces removed and trailing empty
/// components and groups omitted.
///
/// ```
/// # use dicom_attrs_core::value::{PersonName, PersonNameComponent, PersonNameGroup};
/// let pn: PersonName = "Yamada^Tarou=山田^太郎=やまだ^たろう".parse().unwrap();
/// assert_eq!(
///     pn.get(PersonNameGroup::Ideographic, PersonNameComponent::FamilyName),
///     Some("山田"),
/// );
/// assert_eq!(pn.to_string(), "Yamada^Tarou=山田^太郎=やまだ^たろう");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PersonName {
    fields: [[Option<String>; 5]; 3],
}

impl PersonName {
    /// Create an empty person name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a person name from its DICOM string form.
    pub fn parse(s: &str) -> Self {
        let mut pn = PersonName::new();
        for (g, group) in s.split('=').take(3).enumerate() {
            for (c, comp) in group.split('^').enumerate() {
                let comp = comp.trim();
                if comp.is_empty() {
                    continue;
                }
                let index = c.min(4);
                match pn.fields[g][index].as_mut() {
                    Some(prev) if c >= 4 => {
                        prev.push(' ');
                        prev.push_str(comp);
                    }
                    _ => pn.fields[g][index] = Some(comp.to_owned()),
                }
            }
        }
        pn
    }

    /// Retrieve a single component.
    pub fn get(&self, group: PersonNameGroup, component: PersonNameComponent) -> Option<&str> {
        self.fields[group as usize][component as usize].as_deref()
    }

    /// Replace a single component. Blank values clear the component.
    pub fn set(
        &mut self,
        group: PersonNameGroup,
        component: PersonNameComponent,
        value: Option<&str>,
    ) {
        self.fields[group as usize][component as usize] = value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_owned);
    }

    /// Whether no component of any group is set.
    pub fn is_empty(&self) -> bool {
        self.fields.iter().flatten().all(Option::is_none)
    }

    /// Whether some component of the given group is set.
    pub fn contains(&self, group: PersonNameGroup) -> bool {
        self.fields[group as usize].iter().any(Option::is_some)
    }

    /// Format a single component group in its normalized form.
    pub fn group_to_string(&self, group: PersonNameGroup) -> String {
        let comps = &self.fields[group as usize];
        let last = comps.iter().rposition(Option::is_some).map_or(0, |i| i + 1);
        comps[..last]
            .iter()
            .map(|c| c.as_deref().unwrap_or(""))
            .join("^")
    }
}

impl FromStr for PersonName {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(PersonName::parse(s))
    }
}

impl fmt::Display for PersonName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use PersonNameGroup::*;
        let groups = [Alphabetic, Ideographic, Phonetic];
        let last = groups.iter().rposition(|g| self.contains(*g)).map_or(0, |i| i + 1);
        for (i, g) in groups[..last].iter().enumerate() {
            if i > 0 {
                f.write_str("=")?;
            }
            f.write_str(&self.group_to_string(*g))?;
        }
        Ok(())
    }
}
