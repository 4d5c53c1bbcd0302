//! This module contains reusable components for encoding and decoding text in DICOM
//! data structures, including support for character repertoires.
//!
//! The Character Repertoires supported by DICOM are:
//! - ISO 8859
//! - JIS X 0201-1976 Code for Information Interchange
//! - JIS X 0208-1990 Code for the Japanese Graphic Character set for information interchange
//! - JIS X 0212-1990 Code of the supplementary Japanese Graphic Character set for information interchange
//! - KS X 1001 (registered as ISO-IR 149) for Korean Language
//! - TIS 620-2533 (1990) Thai Characters Code for Information Interchange
//! - ISO 10646-1, 10646-2, and their associated supplements and extensions for Unicode character set
//! - GB 18030
//! - GB2312
//!
//! A [`SpecificCharacterSet`] is built from the values of the
//! Specific Character Set (0008,0005) element.
//! With a single value, text is decoded and encoded with one code page.
//! With code extensions (ISO 2022), text switches between character sets
//! through escape sequences, see the [`iso2022`] module.

use encoding::all::{
    ASCII, GB18030, GBK, ISO_8859_1, ISO_8859_15, ISO_8859_2, ISO_8859_3, ISO_8859_4,
    ISO_8859_5, ISO_8859_6, ISO_8859_7, ISO_8859_8, UTF_8, WINDOWS_1254, WINDOWS_31J,
    WINDOWS_874, WINDOWS_949,
};
use encoding::{DecoderTrap, EncoderTrap, Encoding, EncodingRef};
use snafu::{Backtrace, Snafu};
use std::borrow::Cow;
use tracing::warn;

pub mod iso2022;

/// An error type for text encoding issues.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum EncodeTextError {
    /// The text has characters which the character set cannot represent.
    #[snafu(display("{}", message))]
    EncodeCustom {
        /// The error message in plain text.
        message: Cow<'static, str>,
        /// The generated backtrace, if available.
        backtrace: Backtrace,
    },
}

/// An error type for text decoding issues.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum DecodeTextError {
    /// The bytes are not valid in the character set.
    #[snafu(display("{}", message))]
    DecodeCustom {
        /// The error message in plain text.
        message: Cow<'static, str>,
        /// The generated backtrace, if available.
        backtrace: Backtrace,
    },
}

type EncodeResult<T> = Result<T, EncodeTextError>;
type DecodeResult<T> = Result<T, DecodeTextError>;

/// A holder of encoding and decoding mechanisms for text in DICOM content,
/// which according to the standard, depends on the specific character set.
pub trait TextCodec {
    /// Obtain the defined term (unique name) of the text encoding,
    /// which may be used as the value of a
    /// Specific Character Set (0008, 0005) element to refer to this codec.
    fn name(&self) -> &'static str;

    /// Decode the given byte buffer as a single string. The resulting string
    /// _may_ contain backslash characters ('\') to delimit individual values,
    /// and should be split later on if required.
    fn decode(&self, text: &[u8]) -> DecodeResult<String>;

    /// Encode a text value into a byte vector. The input string can
    /// feature multiple text values by using the backslash character ('\')
    /// as the value delimiter.
    fn encode(&self, text: &str) -> EncodeResult<Vec<u8>>;
}

impl<'a, T: ?Sized> TextCodec for &'a T
where
    T: TextCodec,
{
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn decode(&self, text: &[u8]) -> DecodeResult<String> {
        (**self).decode(text)
    }

    fn encode(&self, text: &str) -> EncodeResult<Vec<u8>> {
        (**self).encode(text)
    }
}

/// An enum type for all supported character sets.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum Charset {
    /// **ISO-IR 6**: the default character set.
    Default,
    /// **ISO-IR 100** (ISO-8859-1): Latin alphabet no. 1.
    IsoIr100,
    /// **ISO-IR 101** (ISO-8859-2): Latin alphabet no. 2.
    IsoIr101,
    /// **ISO-IR 109** (ISO-8859-3): Latin alphabet no. 3.
    IsoIr109,
    /// **ISO-IR 110** (ISO-8859-4): Latin alphabet no. 4.
    IsoIr110,
    /// **ISO-IR 144** (ISO-8859-5): Latin/Cyrillic.
    IsoIr144,
    /// **ISO-IR 127** (ISO-8859-6): Latin/Arabic.
    IsoIr127,
    /// **ISO-IR 126** (ISO-8859-7): Latin/Greek.
    IsoIr126,
    /// **ISO-IR 138** (ISO-8859-8): Latin/Hebrew.
    IsoIr138,
    /// **ISO-IR 148** (ISO-8859-9): Latin alphabet no. 5.
    IsoIr148,
    /// **ISO-IR 203** (ISO-8859-15): Latin alphabet no. 9.
    IsoIr203,
    /// **ISO-IR 166** (TIS 620-2533): Thai.
    IsoIr166,
    /// **ISO-IR 13** (JIS X 0201): Japanese katakana.
    IsoIr13,
    /// **ISO-IR 87** (JIS X 0208): Japanese kanji. Code extensions only.
    IsoIr87,
    /// **ISO-IR 159** (JIS X 0212): supplementary Japanese kanji.
    /// Code extensions only, decoding only.
    IsoIr159,
    /// **ISO-IR 149** (KS X 1001): Korean. Code extensions only.
    IsoIr149,
    /// **ISO-IR 58** (GB 2312): Simplified Chinese. Code extensions only.
    IsoIr58,
    /// **ISO-IR 192**: Unicode in UTF-8.
    IsoIr192,
    /// **GB18030**: Simplified Chinese.
    Gb18030,
    /// **GBK**: Simplified Chinese.
    Gbk,
}

impl Default for Charset {
    fn default() -> Self {
        Charset::Default
    }
}

impl Charset {
    /// Obtain the character set identified by the given defined term,
    /// along with whether the term is an ISO 2022 code extension term.
    ///
    /// ```
    /// # use dicom_attrs_encoding::text::Charset;
    /// assert_eq!(Charset::from_code("ISO_IR 100"), Some((Charset::IsoIr100, false)));
    /// assert_eq!(Charset::from_code("ISO 2022 IR 87"), Some((Charset::IsoIr87, true)));
    /// ```
    pub fn from_code(code: &str) -> Option<(Self, bool)> {
        use self::Charset::*;
        let code = code.trim();
        let charset = match code {
            "" | "ISO_IR 6" | "ISO 2022 IR 6" => Default,
            "ISO_IR 100" | "ISO 2022 IR 100" => IsoIr100,
            "ISO_IR 101" | "ISO 2022 IR 101" => IsoIr101,
            "ISO_IR 109" | "ISO 2022 IR 109" => IsoIr109,
            "ISO_IR 110" | "ISO 2022 IR 110" => IsoIr110,
            "ISO_IR 144" | "ISO 2022 IR 144" => IsoIr144,
            "ISO_IR 127" | "ISO 2022 IR 127" => IsoIr127,
            "ISO_IR 126" | "ISO 2022 IR 126" => IsoIr126,
            "ISO_IR 138" | "ISO 2022 IR 138" => IsoIr138,
            "ISO_IR 148" | "ISO 2022 IR 148" => IsoIr148,
            "ISO_IR 203" | "ISO 2022 IR 203" => IsoIr203,
            "ISO_IR 166" | "ISO 2022 IR 166" => IsoIr166,
            "ISO_IR 13" | "ISO 2022 IR 13" => IsoIr13,
            "ISO 2022 IR 87" => IsoIr87,
            "ISO 2022 IR 159" => IsoIr159,
            "ISO 2022 IR 149" => IsoIr149,
            "ISO 2022 IR 58" => IsoIr58,
            "ISO_IR 192" => IsoIr192,
            "GB18030" => Gb18030,
            "GBK" => Gbk,
            _ => return None,
        };
        Some((charset, code.starts_with("ISO 2022")))
    }

    /// The defined term of this character set,
    /// in its code extension form if `iso2022` is set and one exists.
    pub fn code(self, iso2022: bool) -> &'static str {
        use self::Charset::*;
        match (self, iso2022) {
            (Default, false) => "ISO_IR 6",
            (Default, true) => "ISO 2022 IR 6",
            (IsoIr100, false) => "ISO_IR 100",
            (IsoIr100, true) => "ISO 2022 IR 100",
            (IsoIr101, false) => "ISO_IR 101",
            (IsoIr101, true) => "ISO 2022 IR 101",
            (IsoIr109, false) => "ISO_IR 109",
            (IsoIr109, true) => "ISO 2022 IR 109",
            (IsoIr110, false) => "ISO_IR 110",
            (IsoIr110, true) => "ISO 2022 IR 110",
            (IsoIr144, false) => "ISO_IR 144",
            (IsoIr144, true) => "ISO 2022 IR 144",
            (IsoIr127, false) => "ISO_IR 127",
            (IsoIr127, true) => "ISO 2022 IR 127",
            (IsoIr126, false) => "ISO_IR 126",
            (IsoIr126, true) => "ISO 2022 IR 126",
            (IsoIr138, false) => "ISO_IR 138",
            (IsoIr138, true) => "ISO 2022 IR 138",
            (IsoIr148, false) => "ISO_IR 148",
            (IsoIr148, true) => "ISO 2022 IR 148",
            (IsoIr203, false) => "ISO_IR 203",
            (IsoIr203, true) => "ISO 2022 IR 203",
            (IsoIr166, false) => "ISO_IR 166",
            (IsoIr166, true) => "ISO 2022 IR 166",
            (IsoIr13, false) => "ISO_IR 13",
            (IsoIr13, true) => "ISO 2022 IR 13",
            (IsoIr87, _) => "ISO 2022 IR 87",
            (IsoIr159, _) => "ISO 2022 IR 159",
            (IsoIr149, _) => "ISO 2022 IR 149",
            (IsoIr58, _) => "ISO 2022 IR 58",
            (IsoIr192, _) => "ISO_IR 192",
            (Gb18030, _) => "GB18030",
            (Gbk, _) => "GBK",
        }
    }

    /// The code page implementing this character set.
    ///
    /// Multi-byte code extension sets map to the EUC form
    /// of their repertoire, which [`iso2022`] converts from and to 7 bits
    /// where needed.
    pub fn encoding(self) -> EncodingRef {
        use self::Charset::*;
        match self {
            Default => ISO_8859_1 as EncodingRef,
            IsoIr100 => ISO_8859_1 as EncodingRef,
            IsoIr101 => ISO_8859_2 as EncodingRef,
            IsoIr109 => ISO_8859_3 as EncodingRef,
            IsoIr110 => ISO_8859_4 as EncodingRef,
            IsoIr144 => ISO_8859_5 as EncodingRef,
            IsoIr127 => ISO_8859_6 as EncodingRef,
            IsoIr126 => ISO_8859_7 as EncodingRef,
            IsoIr138 => ISO_8859_8 as EncodingRef,
            IsoIr148 => WINDOWS_1254 as EncodingRef,
            IsoIr203 => ISO_8859_15 as EncodingRef,
            IsoIr166 => WINDOWS_874 as EncodingRef,
            IsoIr13 => WINDOWS_31J as EncodingRef,
            IsoIr87 | IsoIr159 => encoding::all::EUC_JP as EncodingRef,
            IsoIr149 => WINDOWS_949 as EncodingRef,
            IsoIr58 | Gbk => GBK as EncodingRef,
            IsoIr192 => UTF_8 as EncodingRef,
            Gb18030 => GB18030 as EncodingRef,
        }
    }

    /// Whether this character set may not be combined with code extensions.
    pub fn excludes_code_extensions(self) -> bool {
        matches!(self, Charset::IsoIr192 | Charset::Gb18030 | Charset::Gbk)
    }
}

impl TextCodec for Charset {
    fn name(&self) -> &'static str {
        self.code(false)
    }

    fn decode(&self, text: &[u8]) -> DecodeResult<String> {
        self.encoding()
            .decode(text, DecoderTrap::Replace)
            .map_err(|message| DecodeCustomSnafu { message }.build())
    }

    fn encode(&self, text: &str) -> EncodeResult<Vec<u8>> {
        let encoding = match self {
            Charset::Default => ASCII as EncodingRef,
            _ => self.encoding(),
        };
        encoding
            .encode(text, EncoderTrap::Strict)
            .map_err(|message| EncodeCustomSnafu { message }.build())
    }
}

/// The character set configuration of a data set,
/// as declared by its Specific Character Set (0008,0005) element.
///
/// Decoding never fails: undecodable bytes become replacement characters.
/// Encoding never fails either: characters which no declared
/// character set can represent become `?`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpecificCharacterSet {
    primary: Charset,
    extensions: Vec<Charset>,
    iso2022: bool,
}

impl Default for SpecificCharacterSet {
    fn default() -> Self {
        SpecificCharacterSet::DEFAULT
    }
}

impl SpecificCharacterSet {
    /// The default character repertoire (ISO-IR 6).
    pub const DEFAULT: SpecificCharacterSet = SpecificCharacterSet {
        primary: Charset::Default,
        extensions: Vec::new(),
        iso2022: false,
    };

    /// A shared reference to the default character repertoire.
    pub fn default_ref() -> &'static SpecificCharacterSet {
        static DEFAULT: SpecificCharacterSet = SpecificCharacterSet::DEFAULT;
        &DEFAULT
    }

    /// Create a character set configuration with a single character set.
    pub fn single(charset: Charset) -> Self {
        SpecificCharacterSet {
            primary: charset,
            extensions: Vec::new(),
            iso2022: false,
        }
    }

    /// Build the configuration from the values of the
    /// Specific Character Set element.
    ///
    /// Unrecognized terms are logged and replaced by the default repertoire.
    /// More than one value, or a single `ISO 2022` term,
    /// enables code extensions.
    pub fn from_codes<S: AsRef<str>>(codes: &[S]) -> Self {
        let mut iso2022 = codes.len() > 1;
        let mut charsets = Vec::with_capacity(codes.len());
        for (i, code) in codes.iter().enumerate() {
            match Charset::from_code(code.as_ref()) {
                Some((charset, ext)) => {
                    iso2022 |= ext;
                    if !charsets.contains(&charset) {
                        charsets.push(charset);
                    }
                }
                None if i == 0 => {
                    warn!("Unsupported character set `{}`, using the default repertoire", code.as_ref());
                    charsets.push(Charset::Default);
                }
                None => warn!("Unsupported code extension `{}` ignored", code.as_ref()),
            }
        }
        let mut charsets = charsets.into_iter();
        let primary = charsets.next().unwrap_or_default();
        if primary.excludes_code_extensions() {
            if codes.len() > 1 {
                warn!("{} does not allow code extensions, ignoring the rest", primary.code(false));
            }
            return SpecificCharacterSet::single(primary);
        }
        let extensions = charsets.filter(|c| !c.excludes_code_extensions()).collect();
        SpecificCharacterSet {
            primary,
            extensions,
            iso2022,
        }
    }

    /// The terms to store in the Specific Character Set element.
    pub fn to_codes(&self) -> Vec<&'static str> {
        if self.iso2022 && self.primary == Charset::Default && !self.extensions.is_empty() {
            std::iter::once("")
                .chain(self.extensions.iter().map(|c| c.code(true)))
                .collect()
        } else {
            std::iter::once(self.primary.code(self.iso2022))
                .chain(self.extensions.iter().map(|c| c.code(true)))
                .collect()
        }
    }

    /// The first declared character set.
    pub fn primary(&self) -> Charset {
        self.primary
    }

    /// All declared character sets, in declaration order.
    pub fn charsets(&self) -> impl Iterator<Item = Charset> + '_ {
        std::iter::once(self.primary).chain(self.extensions.iter().copied())
    }

    /// Whether text switches character sets through ISO 2022 escape sequences.
    pub fn is_iso2022(&self) -> bool {
        self.iso2022
    }

    /// Whether this is the default character repertoire.
    pub fn is_default(&self) -> bool {
        *self == SpecificCharacterSet::DEFAULT
    }

    /// Whether the text only holds characters of the default repertoire.
    pub fn is_ascii(text: &str) -> bool {
        text.is_ascii()
    }

    /// Decode text.
    ///
    /// `delimiters` are the characters at which an ISO 2022 decoder
    /// returns to its initial state, which depend on the value representation.
    pub fn decode(&self, bytes: &[u8], delimiters: &str) -> String {
        if self.iso2022 {
            return iso2022::decode(self, bytes, delimiters);
        }
        match self.primary.decode(bytes) {
            Ok(text) => text,
            Err(_) => String::from_utf8_lossy(bytes).into_owned(),
        }
    }

    /// Encode text.
    ///
    /// With code extensions, the text is encoded with the first declared
    /// character set if possible, otherwise component by component,
    /// switching between character sets at the `delimiters`.
    pub fn encode(&self, text: &str, delimiters: &str) -> Vec<u8> {
        if self.iso2022 {
            return iso2022::encode(self, text, delimiters);
        }
        match self.primary.encode(text) {
            Ok(bytes) => bytes,
            Err(_) => {
                let encoding = match self.primary {
                    Charset::Default => ASCII as EncodingRef,
                    other => other.encoding(),
                };
                encoding
                    .encode(text, EncoderTrap::Replace)
                    .unwrap_or_else(|_| text.bytes().map(|b| if b.is_ascii() { b } else { b'?' }).collect())
            }
        }
    }

    /// Whether the text can be encoded without replacement characters.
    pub fn can_encode(&self, text: &str) -> bool {
        if self.iso2022 {
            iso2022::can_encode(self, text)
        } else {
            self.primary.encode(text).is_ok()
        }
    }
}

impl TextCodec for SpecificCharacterSet {
    fn name(&self) -> &'static str {
        self.primary.code(self.iso2022)
    }

    fn decode(&self, text: &[u8]) -> DecodeResult<String> {
        Ok(SpecificCharacterSet::decode(self, text, "\\"))
    }

    fn encode(&self, text: &str) -> EncodeResult<Vec<u8>> {
        Ok(SpecificCharacterSet::encode(self, text, "\\"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_codec<T>(codec: T, string: &str, bytes: &[u8])
    where
        T: TextCodec,
    {
        assert_eq!(codec.encode(string).expect("encoding"), bytes);
        assert_eq!(codec.decode(bytes).expect("decoding"), string);
    }

    #[test]
    fn iso_ir_6_baseline() {
        test_codec(Charset::Default, "Smith^John", b"Smith^John");
        assert!(Charset::Default.encode("Simões").is_err());
    }

    #[test]
    fn iso_ir_192_baseline() {
        let codec = Charset::IsoIr192;
        test_codec(codec, "Simões^John", "Simões^John".as_bytes());
        test_codec(codec, "Иванков^Андрей", "Иванков^Андрей".as_bytes());
    }

    #[test]
    fn iso_ir_100_baseline() {
        let codec = Charset::IsoIr100;
        test_codec(codec, "Simões^João", b"Sim\xF5es^Jo\xE3o");
        test_codec(codec, "Günther^Hans", b"G\xfcnther^Hans");
    }

    #[test]
    fn iso_ir_144_baseline() {
        test_codec(
            Charset::IsoIr144,
            "Иванков^Андрей",
            b"\xb8\xd2\xd0\xdd\xda\xde\xd2^\xb0\xdd\xd4\xe0\xd5\xd9",
        );
    }

    #[test]
    fn from_codes() {
        let cs = SpecificCharacterSet::from_codes(&["ISO_IR 100"]);
        assert_eq!(cs.primary(), Charset::IsoIr100);
        assert!(!cs.is_iso2022());
        assert_eq!(cs.to_codes(), vec!["ISO_IR 100"]);

        let cs = SpecificCharacterSet::from_codes(&["", "ISO 2022 IR 87"]);
        assert_eq!(cs.primary(), Charset::Default);
        assert!(cs.is_iso2022());
        assert_eq!(cs.to_codes(), vec!["", "ISO 2022 IR 87"]);

        let cs = SpecificCharacterSet::from_codes(&["ISO_IR 192", "ISO 2022 IR 87"]);
        assert_eq!(cs, SpecificCharacterSet::single(Charset::IsoIr192));

        let cs = SpecificCharacterSet::from_codes(&["KLINGON"]);
        assert!(cs.is_default());
        assert!(SpecificCharacterSet::from_codes::<&str>(&[]).is_default());
    }

    #[test]
    fn unencodable_characters_are_replaced() {
        let cs = SpecificCharacterSet::single(Charset::IsoIr100);
        assert_eq!(cs.encode("Jo\u{e3}o \u{263a}", "\\"), b"Jo\xe3o ?");
        assert!(!cs.can_encode("\u{263a}"));
        assert_eq!(SpecificCharacterSet::DEFAULT.encode("Ã", "\\"), b"?");
    }

    #[test]
    fn default_decodes_latin1_bytes() {
        assert_eq!(SpecificCharacterSet::DEFAULT.decode(b"Sim\xF5es", "\\"), "Simões");
    }
}
