//! Matching a data set against query keys.

use super::{Attributes, ElementKey};
use crate::value::{EncodeValue, Value};
use dicom_attrs_core::header::VR;
use dicom_attrs_core::tags;
use dicom_attrs_core::value::DateRange;
use regex::Regex;
use tracing::{debug, warn};

/// Compile a key value with `*` and `?` wildcards into an anchored pattern.
fn wildcard_pattern(key: &str, ignore_case: bool) -> Option<Regex> {
    let mut pattern = String::with_capacity(key.len() + 8);
    pattern.push_str(if ignore_case { "(?is)^" } else { "(?s)^" });
    let mut literal = [0u8; 4];
    for c in key.chars() {
        match c {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            c => pattern.push_str(&regex::escape(c.encode_utf8(&mut literal))),
        }
    }
    pattern.push('$');
    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            debug!("Ignoring matching key `{}`: {}", key, e);
            None
        }
    }
}

fn matches_text(key: &str, value: &str, ignore_case: bool) -> bool {
    if key.contains(['*', '?']) {
        wildcard_pattern(key, ignore_case).map_or(false, |re| re.is_match(value))
    } else if ignore_case {
        key.to_lowercase() == value.to_lowercase()
    } else {
        key == value
    }
}

impl Attributes {
    /// Whether this data set satisfies every non-empty key of `keys`.
    ///
    /// Text keys may hold `*` and `?` wildcards, and several key values
    /// match any of them. Temporal keys are ranges.
    /// A sequence key matches when any item here matches its first item.
    /// Keys without a value are universal.
    /// An absent or empty element here matches only if `match_no_value` is set.
    pub fn matches(&self, keys: &Attributes, ignore_pn_case: bool, match_no_value: bool) -> bool {
        for index in 0..keys.tags.len() {
            let tag = keys.tags[index];
            if tag == tags::SPECIFIC_CHARACTER_SET || tag.is_private_creator() || tag.is_group_length() {
                continue;
            }
            let value = &keys.slots[index].value;
            if value.is_empty() {
                continue;
            }
            let creator = keys.private_creator_of(tag);
            let key = ElementKey::from((creator.as_deref(), tag));
            let matched = match value {
                Value::Sequence(seq) => {
                    if seq.len() > 1 {
                        warn!("Matching only the first of {} items of {}", seq.len(), tag);
                    }
                    match (seq.first(), self.get_sequence(key)) {
                        (Some(item), _) if item.is_empty() => true,
                        (Some(item), Some(own)) if !own.is_empty() => own
                            .iter()
                            .any(|own| own.matches(item, ignore_pn_case, match_no_value)),
                        _ => match_no_value,
                    }
                }
                Value::Fragments(_) => true,
                Value::Primitive(_) => self.matches_key(keys, index, key, ignore_pn_case, match_no_value),
            };
            if !matched {
                return false;
            }
        }
        true
    }

    fn matches_key(
        &self,
        keys: &Attributes,
        index: usize,
        key: ElementKey<'_>,
        ignore_pn_case: bool,
        match_no_value: bool,
    ) -> bool {
        let Some(own) = self.index_of(key) else {
            return match_no_value;
        };
        if self.slots[own].value.is_empty() {
            return match_no_value;
        }
        let vr = keys.vrs[index];
        if vr.is_temporal() {
            return self.matches_range(keys, index, own);
        }
        let (Some(key_values), Some(values)) = (keys.strings_at(index), self.strings_at(own)) else {
            return false;
        };
        let ignore_case = ignore_pn_case && vr == VR::PN;
        if vr.value_type().is_string() {
            key_values.iter().any(|k| {
                if k.contains(['*', '?']) {
                    match wildcard_pattern(k, ignore_case) {
                        Some(re) => values.iter().any(|v| re.is_match(v)),
                        None => false,
                    }
                } else {
                    values.iter().any(|v| matches_text(k, v, ignore_case))
                }
            })
        } else {
            key_values.iter().any(|k| values.contains(k))
        }
    }

    fn matches_range(&self, keys: &Attributes, index: usize, own: usize) -> bool {
        let Some(key_values) = keys.strings_at(index) else {
            return false;
        };
        let Some(values) = self.strings_at(own) else {
            return false;
        };
        let (key_vr, vr) = (keys.vrs[index], self.vrs[own]);
        let (key_tz, tz) = (keys.resolved_timezone(), self.resolved_timezone());
        key_values.iter().any(|k| {
            let Ok(range) = DateRange::parse(key_vr, k, key_tz) else {
                debug!("Ignoring invalid range key `{}`", k);
                return false;
            };
            values.iter().any(|v| {
                DateRange::parse(vr, v, tz).map_or(false, |own| own.overlaps(&range))
            })
        })
    }
}
