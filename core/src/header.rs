//! Basic types for the header of a DICOM data element:
//! tags, value representations and value lengths.
//!
//! Private tag arithmetic is also provided here,
//! since it only depends on the numeric layout of a tag.

use crate::value::ValueType;
use snafu::{ensure, Backtrace, OptionExt, Snafu};
use std::fmt;
use std::str::{from_utf8, FromStr};

/// Idiomatic alias for a tag's group number.
pub type GroupNumber = u16;
/// Idiomatic alias for a tag's element number.
pub type ElementNumber = u16;

/// An error which may occur when parsing a tag from text.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum ParseTagError {
    /// The text is not in any of the recognized tag forms.
    #[snafu(display("Invalid tag `{}`", text))]
    InvalidTag { text: String, backtrace: Backtrace },
}

/// The data type for DICOM data element tags.
///
/// A tag is a pair of group and element numbers,
/// which can also be seen as a single 32-bit number
/// with the group number in the high 16 bits.
/// Tags are ordered by this 32-bit interpretation.
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Clone, Copy, Default)]
pub struct Tag(pub GroupNumber, pub ElementNumber);

impl Tag {
    /// Getter for the tag's group value.
    #[inline]
    pub fn group(self) -> GroupNumber {
        self.0
    }

    /// Getter for the tag's element value.
    #[inline]
    pub fn element(self) -> ElementNumber {
        self.1
    }

    /// Obtain the tag as a single 32-bit number.
    #[inline]
    pub fn to_u32(self) -> u32 {
        (u32::from(self.0) << 16) | u32::from(self.1)
    }

    /// Whether this tag belongs to a private (odd-numbered) group.
    #[inline]
    pub fn is_private(self) -> bool {
        self.0 & 1 != 0
    }

    /// Whether this tag is a private creator data element,
    /// which reserves a block of private elements
    /// in the range `(gggg,0010)` to `(gggg,00FF)`.
    #[inline]
    pub fn is_private_creator(self) -> bool {
        self.is_private() && self.1 & 0xFF00 == 0 && self.1 & 0x00F0 != 0
    }

    /// Whether this tag is a group length element `(gggg,0000)`.
    #[inline]
    pub fn is_group_length(self) -> bool {
        self.1 == 0
    }

    /// Whether this tag is one of the item or delimitation tags
    /// of group `FFFE`.
    #[inline]
    pub fn is_item_or_delimiter(self) -> bool {
        self.0 == 0xFFFE
    }

    /// Obtain the tag of the private creator element
    /// which reserves the block this private tag belongs to.
    ///
    /// The result is only meaningful for private tags
    /// which are not private creators themselves.
    #[inline]
    pub fn creator_tag(self) -> Tag {
        Tag(self.0, self.1 >> 8)
    }

    /// Place this private tag in the block reserved by the given
    /// private creator element, keeping the low byte of the element number.
    ///
    /// ```
    /// # use dicom_attrs_core::Tag;
    /// let tag = Tag(0x0041, 0x0010);
    /// assert_eq!(tag.in_private_block(Tag(0x0041, 0x0011)), Tag(0x0041, 0x1110));
    /// ```
    #[inline]
    pub fn in_private_block(self, creator: Tag) -> Tag {
        Tag(creator.0, ((creator.1 & 0xFF) << 8) | (self.1 & 0xFF))
    }

    /// Obtain the tag with the block byte of a private element cleared,
    /// as used by private dictionaries to identify an element
    /// independently of the block it was reserved at.
    #[inline]
    pub fn without_private_block(self) -> Tag {
        if self.is_private() && !self.is_private_creator() && self.1 >= 0x1000 {
            Tag(self.0, self.1 & 0x00FF)
        } else {
            self
        }
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Tag({:#06X?}, {:#06X?})", self.0, self.1)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({:04X},{:04X})", self.0, self.1)
    }
}

impl PartialEq<(u16, u16)> for Tag {
    fn eq(&self, other: &(u16, u16)) -> bool {
        self.0 == other.0 && self.1 == other.1
    }
}

impl From<(u16, u16)> for Tag {
    #[inline]
    fn from(value: (u16, u16)) -> Tag {
        Tag(value.0, value.1)
    }
}

impl From<u32> for Tag {
    #[inline]
    fn from(value: u32) -> Tag {
        Tag((value >> 16) as u16, value as u16)
    }
}

impl From<Tag> for u32 {
    #[inline]
    fn from(tag: Tag) -> u32 {
        tag.to_u32()
    }
}

/// Parse a tag from either the compact hexadecimal form `GGGGEEEE`
/// or the parenthesized form `(GGGG,EEEE)`.
impl FromStr for Tag {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let (group, element) = if let Some(inner) = text
            .strip_prefix('(')
            .and_then(|t| t.strip_suffix(')'))
        {
            inner.split_once(',').context(InvalidTagSnafu { text })?
        } else {
            ensure!(text.len() == 8 && text.is_ascii(), InvalidTagSnafu { text });
            (&text[..4], &text[4..])
        };
        let group = u16::from_str_radix(group.trim(), 16)
            .ok()
            .context(InvalidTagSnafu { text })?;
        let element = u16::from_str_radix(element.trim(), 16)
            .ok()
            .context(InvalidTagSnafu { text })?;
        Ok(Tag(group, element))
    }
}

/// A data element value length, as found in the element header.
///
/// The special value `0xFFFF_FFFF` stands for an undefined length,
/// in which case the value is terminated by a delimitation item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Length(pub u32);

impl Length {
    /// The undefined length.
    pub const UNDEFINED: Length = Length(0xFFFF_FFFF);

    /// Whether this length is undefined.
    #[inline]
    pub fn is_undefined(self) -> bool {
        self == Length::UNDEFINED
    }

    /// Obtain the length as a number of bytes, if defined.
    #[inline]
    pub fn get(self) -> Option<u32> {
        if self.is_undefined() {
            None
        } else {
            Some(self.0)
        }
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.get() {
            Some(len) => write!(f, "{}", len),
            None => f.write_str("U/L"),
        }
    }
}

/// An enum type for a DICOM value representation.
#[derive(Debug, Eq, PartialEq, Hash, Copy, Clone, Ord, PartialOrd)]
pub enum VR {
    /// Application Entity
    AE,
    /// Age String
    AS,
    /// Attribute Tag
    AT,
    /// Code String
    CS,
    /// Date
    DA,
    /// Decimal String
    DS,
    /// Date Time
    DT,
    /// Floating Point Single
    FL,
    /// Floating Point Double
    FD,
    /// Integer String
    IS,
    /// Long String
    LO,
    /// Long Text
    LT,
    /// Other Byte
    OB,
    /// Other Double
    OD,
    /// Other Float
    OF,
    /// Other Long
    OL,
    /// Other Very Long
    OV,
    /// Other Word
    OW,
    /// Person Name
    PN,
    /// Short String
    SH,
    /// Signed Long
    SL,
    /// Sequence of Items
    SQ,
    /// Signed Short
    SS,
    /// Short Text
    ST,
    /// Signed Very Long
    SV,
    /// Time
    TM,
    /// Unlimited Characters
    UC,
    /// Unique Identifier (UID)
    UI,
    /// Unsigned Long
    UL,
    /// Unknown
    UN,
    /// Universal Resource Identifier or Universal Resource Locator (URI/URL)
    UR,
    /// Unsigned Short
    US,
    /// Unlimited Text
    UT,
    /// Unsigned Very Long
    UV,
}

impl VR {
    /// Obtain the value representation corresponding to the given two bytes.
    /// Each byte should represent an alphabetic character in upper case.
    pub fn from_binary(chars: [u8; 2]) -> Option<Self> {
        from_utf8(chars.as_ref())
            .ok()
            .and_then(|s| VR::from_str(s).ok())
    }

    /// Retrieve a string representation of this VR.
    pub fn to_string(self) -> &'static str {
        use VR::*;
        match self {
            AE => "AE",
            AS => "AS",
            AT => "AT",
            CS => "CS",
            DA => "DA",
            DS => "DS",
            DT => "DT",
            FL => "FL",
            FD => "FD",
            IS => "IS",
            LO => "LO",
            LT => "LT",
            OB => "OB",
            OD => "OD",
            OF => "OF",
            OL => "OL",
            OV => "OV",
            OW => "OW",
            PN => "PN",
            SH => "SH",
            SL => "SL",
            SQ => "SQ",
            SS => "SS",
            ST => "ST",
            SV => "SV",
            TM => "TM",
            UC => "UC",
            UI => "UI",
            UL => "UL",
            UN => "UN",
            UR => "UR",
            US => "US",
            UT => "UT",
            UV => "UV",
        }
    }

    /// Retrieve a copy of this VR's byte representation.
    /// The function returns two alphabetic characters in upper case.
    pub fn to_bytes(self) -> [u8; 2] {
        let bytes = self.to_string().as_bytes();
        [bytes[0], bytes[1]]
    }

    /// The length of an explicit VR data element header with this VR.
    ///
    /// VRs with a 4-byte length field take 12 bytes, all others take 8.
    /// Implicit VR headers are always 8 bytes long.
    pub fn header_length(self) -> u32 {
        use VR::*;
        match self {
            OB | OD | OF | OL | OV | OW | SQ | SV | UC | UN | UR | UT | UV => 12,
            _ => 8,
        }
    }

    /// The byte used to pad a value of this VR to an even length.
    pub fn padding_byte(self) -> u8 {
        if self.value_type().is_string() && self != VR::UI {
            b' '
        } else {
            0
        }
    }

    /// The value type which governs how values of this VR
    /// are converted between bytes, strings and numbers.
    pub fn value_type(self) -> ValueType {
        use VR::*;
        match self {
            AE | AS | CS | UI => ValueType::Ascii,
            AT => ValueType::Tag,
            DA => ValueType::Da,
            DS => ValueType::Ds,
            DT => ValueType::Dt,
            FL | OF => ValueType::Float,
            FD | OD => ValueType::Double,
            IS => ValueType::Is,
            LO | SH | UC => ValueType::String,
            LT | ST | UT => ValueType::Text,
            OB | UN => ValueType::Byte,
            OL | UL => ValueType::UInt,
            OV | UV => ValueType::ULong,
            OW | US => ValueType::UShort,
            PN => ValueType::Pn,
            SL => ValueType::Int,
            SQ => ValueType::Sequence,
            SS => ValueType::Short,
            SV => ValueType::Long,
            TM => ValueType::Tm,
            UR => ValueType::Ur,
        }
    }

    /// Whether this VR may hold a value with more than one component.
    pub fn is_multi_valued(self) -> bool {
        self.value_type().is_multi_valued()
    }

    /// Whether values of this VR are inline binary data.
    pub fn is_inline_binary(self) -> bool {
        use VR::*;
        matches!(self, OB | OD | OF | OL | OV | OW | UN)
    }

    /// Whether values of this VR are dates or times.
    pub fn is_temporal(self) -> bool {
        self.value_type().is_temporal()
    }
}

/// Obtain the value representation corresponding to the given string.
/// The string should hold exactly two UTF-8 encoded alphabetic characters
/// in upper case, otherwise no match is made.
impl FromStr for VR {
    type Err = &'static str;

    fn from_str(string: &str) -> std::result::Result<Self, Self::Err> {
        use VR::*;
        match string {
            "AE" => Ok(AE),
            "AS" => Ok(AS),
            "AT" => Ok(AT),
            "CS" => Ok(CS),
            "DA" => Ok(DA),
            "DS" => Ok(DS),
            "DT" => Ok(DT),
            "FL" => Ok(FL),
            "FD" => Ok(FD),
            "IS" => Ok(IS),
            "LO" => Ok(LO),
            "LT" => Ok(LT),
            "OB" => Ok(OB),
            "OD" => Ok(OD),
            "OF" => Ok(OF),
            "OL" => Ok(OL),
            "OV" => Ok(OV),
            "OW" => Ok(OW),
            "PN" => Ok(PN),
            "SH" => Ok(SH),
            "SL" => Ok(SL),
            "SQ" => Ok(SQ),
            "SS" => Ok(SS),
            "ST" => Ok(ST),
            "SV" => Ok(SV),
            "TM" => Ok(TM),
            "UC" => Ok(UC),
            "UI" => Ok(UI),
            "UL" => Ok(UL),
            "UN" => Ok(UN),
            "UR" => Ok(UR),
            "US" => Ok(US),
            "UT" => Ok(UT),
            "UV" => Ok(UV),
            _ => Err("no such value representation"),
        }
    }
}

impl fmt::Display for VR {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(VR::to_string(*self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_from_u32_and_back() {
        let tag = Tag::from(0x0010_0020);
        assert_eq!(tag, Tag(0x0010, 0x0020));
        assert_eq!(tag.to_u32(), 0x0010_0020);
        assert!(Tag(0x0008, 0x0005) < Tag(0x0010, 0x0010));
    }

    #[test]
    fn tag_parsing() {
        assert_eq!("00100010".parse::<Tag>().unwrap(), Tag(0x0010, 0x0010));
        assert_eq!("(7FE0,0010)".parse::<Tag>().unwrap(), Tag(0x7FE0, 0x0010));
        assert!("0010001".parse::<Tag>().is_err());
        assert!("(0010;0010)".parse::<Tag>().is_err());
    }

    #[test]
    fn private_tag_arithmetic() {
        let creator = Tag(0x0041, 0x0010);
        assert!(creator.is_private_creator());
        assert!(!Tag(0x0041, 0x1001).is_private_creator());
        assert!(!Tag(0x0040, 0x0010).is_private_creator());
        assert_eq!(Tag(0x0041, 0x1001).creator_tag(), creator);
        assert_eq!(Tag(0x0041, 0x0001).in_private_block(creator), Tag(0x0041, 0x1001));
        assert_eq!(Tag(0x0041, 0x12AB).in_private_block(Tag(0x0041, 0x00FF)), Tag(0x0041, 0xFFAB));
        assert_eq!(Tag(0x0041, 0x12AB).without_private_block(), Tag(0x0041, 0x00AB));
    }

    #[test]
    fn vr_properties() {
        assert_eq!(VR::from_binary(*b"PN"), Some(VR::PN));
        assert_eq!(VR::from_binary(*b"XX"), None);
        assert_eq!(VR::OB.header_length(), 12);
        assert_eq!(VR::SQ.header_length(), 12);
        assert_eq!(VR::US.header_length(), 8);
        assert_eq!(VR::LO.padding_byte(), b' ');
        assert_eq!(VR::UI.padding_byte(), 0);
        assert_eq!(VR::OB.padding_byte(), 0);
        assert_eq!(VR::OW.value_type(), ValueType::UShort);
    }
}
