//! Text with ISO 2022 code extensions.
//!
//! Text starts in the state designated by the first declared
//! character set. Escape sequences designate another character set
//! to the G0 (7-bit) or G1 (8-bit) code element.
//! Writers return to the initial state before each value delimiter
//! and at the end of the text, and readers reset their state at
//! delimiters accordingly.

use super::{Charset, SpecificCharacterSet};
use encoding::{DecoderTrap, EncoderTrap};
use tracing::debug;

const ESC: u8 = 0x1B;

/// A character set designated to the G0 code element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum G0 {
    /// ISO-IR 6
    Ascii,
    /// ISO-IR 14, the Roman half of JIS X 0201.
    /// Decoded as ASCII.
    JisRoman,
    /// ISO-IR 87
    Jis0208,
    /// ISO-IR 159
    Jis0212,
}

impl G0 {
    fn escape(self) -> &'static [u8] {
        match self {
            G0::Ascii => b"\x1b(B",
            G0::JisRoman => b"\x1b(J",
            G0::Jis0208 => b"\x1b$B",
            G0::Jis0212 => b"\x1b$(D",
        }
    }

    fn is_multi_byte(self) -> bool {
        matches!(self, G0::Jis0208 | G0::Jis0212)
    }
}

/// The escape sequence designating a character set to G1, if it has one.
fn g1_escape(charset: Charset) -> Option<&'static [u8]> {
    use Charset::*;
    Some(match charset {
        IsoIr100 => b"\x1b-A",
        IsoIr101 => b"\x1b-B",
        IsoIr109 => b"\x1b-C",
        IsoIr110 => b"\x1b-D",
        IsoIr144 => b"\x1b-L",
        IsoIr127 => b"\x1b-G",
        IsoIr126 => b"\x1b-F",
        IsoIr138 => b"\x1b-H",
        IsoIr148 => b"\x1b-M",
        IsoIr203 => b"\x1b-b",
        IsoIr166 => b"\x1b-T",
        IsoIr13 => b"\x1b)I",
        IsoIr149 => b"\x1b$)C",
        IsoIr58 => b"\x1b$)A",
        _ => return None,
    })
}

enum Designation {
    G0(G0),
    G1(Charset),
}

/// Recognize an escape sequence at the start of `bytes`,
/// returning the designation and its length.
fn parse_escape(bytes: &[u8]) -> Option<(Designation, usize)> {
    for g0 in [G0::Ascii, G0::JisRoman, G0::Jis0208, G0::Jis0212] {
        let esc = g0.escape();
        if bytes.starts_with(esc) {
            return Some((Designation::G0(g0), esc.len()));
        }
    }
    use Charset::*;
    for charset in [
        IsoIr100, IsoIr101, IsoIr109, IsoIr110, IsoIr144, IsoIr127, IsoIr126, IsoIr138, IsoIr148,
        IsoIr203, IsoIr166, IsoIr13, IsoIr149, IsoIr58,
    ] {
        if let Some(esc) = g1_escape(charset) {
            if bytes.starts_with(esc) {
                return Some((Designation::G1(charset), esc.len()));
            }
        }
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct State {
    g0: G0,
    g1: Option<Charset>,
}

impl State {
    fn initial(cs: &SpecificCharacterSet) -> Self {
        let primary = cs.primary();
        State {
            g0: if primary == Charset::IsoIr13 {
                G0::JisRoman
            } else {
                G0::Ascii
            },
            g1: g1_escape(primary).map(|_| primary),
        }
    }

    fn single_byte_g0(initial: State) -> G0 {
        if initial.g0.is_multi_byte() {
            G0::Ascii
        } else {
            initial.g0
        }
    }
}

fn decode_run(state: State, bytes: &[u8], out: &mut String) {
    let mut start = 0;
    while start < bytes.len() {
        let high = bytes[start] >= 0x80;
        let end = bytes[start..]
            .iter()
            .position(|&b| (b >= 0x80) != high)
            .map_or(bytes.len(), |p| start + p);
        let chunk = &bytes[start..end];
        if high {
            let charset = state.g1.unwrap_or(Charset::IsoIr100);
            push_decoded(charset.encoding().decode(chunk, DecoderTrap::Replace), chunk, out);
        } else {
            match state.g0 {
                G0::Ascii | G0::JisRoman => out.extend(chunk.iter().map(|&b| b as char)),
                G0::Jis0208 => {
                    let euc: Vec<u8> = chunk.iter().map(|&b| b | 0x80).collect();
                    push_decoded(
                        Charset::IsoIr87.encoding().decode(&euc, DecoderTrap::Replace),
                        chunk,
                        out,
                    );
                }
                G0::Jis0212 => {
                    let euc: Vec<u8> = chunk
                        .chunks(2)
                        .flat_map(|pair| std::iter::once(0x8F).chain(pair.iter().map(|&b| b | 0x80)))
                        .collect();
                    push_decoded(
                        Charset::IsoIr159.encoding().decode(&euc, DecoderTrap::Replace),
                        chunk,
                        out,
                    );
                }
            }
        }
        start = end;
    }
}

fn push_decoded(
    result: Result<String, std::borrow::Cow<'static, str>>,
    raw: &[u8],
    out: &mut String,
) {
    match result {
        Ok(text) => out.push_str(&text),
        Err(_) => out.push_str(&String::from_utf8_lossy(raw)),
    }
}

/// Decode text with code extensions.
pub(crate) fn decode(cs: &SpecificCharacterSet, bytes: &[u8], delimiters: &str) -> String {
    let initial = State::initial(cs);
    let mut state = initial;
    let mut out = String::with_capacity(bytes.len());
    let mut run_start = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == ESC {
            decode_run(state, &bytes[run_start..i], &mut out);
            match parse_escape(&bytes[i..]) {
                Some((Designation::G0(g0), len)) => {
                    state.g0 = g0;
                    i += len;
                }
                Some((Designation::G1(charset), len)) => {
                    state.g1 = Some(charset);
                    i += len;
                }
                None => {
                    debug!("Unrecognized escape sequence at offset {}", i);
                    i += 1;
                }
            }
            run_start = i;
            continue;
        }
        if !state.g0.is_multi_byte() && b < 0x80 && delimiters.as_bytes().contains(&b) {
            decode_run(state, &bytes[run_start..i], &mut out);
            out.push(b as char);
            state = initial;
            i += 1;
            run_start = i;
            continue;
        }
        i += 1;
    }
    decode_run(state, &bytes[run_start..], &mut out);
    out
}

/// Encode text in a single character set,
/// in the form it takes within ISO 2022 text.
fn encode_in(charset: Charset, text: &str) -> Option<Vec<u8>> {
    match charset {
        Charset::Default => text.is_ascii().then(|| text.as_bytes().to_vec()),
        Charset::IsoIr159 => None,
        Charset::IsoIr87 => {
            let euc = charset.encoding().encode(text, EncoderTrap::Strict).ok()?;
            if euc.len() % 2 != 0 || !euc.iter().all(|b| (0xA1..=0xFE).contains(b)) {
                return None;
            }
            Some(euc.into_iter().map(|b| b & 0x7F).collect())
        }
        Charset::IsoIr13 => {
            let bytes = charset.encoding().encode(text, EncoderTrap::Strict).ok()?;
            bytes
                .iter()
                .all(|&b| b < 0x80 || (0xA1..=0xDF).contains(&b))
                .then_some(bytes)
        }
        Charset::IsoIr149 | Charset::IsoIr58 => {
            let bytes = charset.encoding().encode(text, EncoderTrap::Strict).ok()?;
            bytes
                .iter()
                .all(|&b| b < 0x80 || (0xA1..=0xFE).contains(&b))
                .then_some(bytes)
        }
        _ => charset.encoding().encode(text, EncoderTrap::Strict).ok(),
    }
}

struct Encoder<'a> {
    cs: &'a SpecificCharacterSet,
    initial: State,
    state: State,
    out: Vec<u8>,
}

impl<'a> Encoder<'a> {
    /// The character set in effect, tried first for every piece of text.
    fn active(&self) -> Charset {
        match self.state.g0 {
            G0::Jis0208 => Charset::IsoIr87,
            G0::Jis0212 => Charset::IsoIr159,
            _ => self.state.g1.unwrap_or_else(|| self.cs.primary()),
        }
    }

    fn try_emit(&mut self, text: &str) -> bool {
        let cs = self.cs;
        let candidates = std::iter::once(self.active()).chain(cs.charsets());
        for charset in candidates {
            if let Some(bytes) = encode_in(charset, text) {
                self.emit(charset, &bytes);
                return true;
            }
        }
        false
    }

    fn emit(&mut self, charset: Charset, bytes: &[u8]) {
        if charset == Charset::IsoIr87 {
            self.designate_g0(G0::Jis0208);
        } else {
            if bytes.iter().any(|&b| b < 0x80) && self.state.g0.is_multi_byte() {
                self.designate_g0(State::single_byte_g0(self.initial));
            }
            if bytes.iter().any(|&b| b >= 0x80) && self.state.g1 != Some(charset) {
                if let Some(esc) = g1_escape(charset) {
                    self.out.extend_from_slice(esc);
                    self.state.g1 = Some(charset);
                }
            }
        }
        self.out.extend_from_slice(bytes);
    }

    fn designate_g0(&mut self, g0: G0) {
        if self.state.g0 != g0 {
            self.out.extend_from_slice(g0.escape());
            self.state.g0 = g0;
        }
    }

    fn component(&mut self, text: &str) {
        if text.is_empty() || self.try_emit(text) {
            return;
        }
        let mut buf = [0u8; 4];
        for c in text.chars() {
            if !self.try_emit(c.encode_utf8(&mut buf)) {
                self.emit(Charset::Default, b"?");
            }
        }
    }

    fn restore(&mut self) {
        if self.state.g0 != self.initial.g0 {
            self.out.extend_from_slice(self.initial.g0.escape());
        }
        if self.state.g1 != self.initial.g1 {
            if let Some(esc) = self.initial.g1.and_then(g1_escape) {
                self.out.extend_from_slice(esc);
            }
        }
        self.state = self.initial;
    }
}

/// Encode text with code extensions.
pub(crate) fn encode(cs: &SpecificCharacterSet, text: &str, delimiters: &str) -> Vec<u8> {
    if let Some(bytes) = encode_in(cs.primary(), text) {
        return bytes;
    }
    let initial = State::initial(cs);
    let mut encoder = Encoder {
        cs,
        initial,
        state: initial,
        out: Vec::with_capacity(text.len() * 2),
    };
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if delimiters.contains(c) {
            encoder.component(&text[start..i]);
            encoder.restore();
            encoder.out.push(c as u8);
            start = i + c.len_utf8();
        }
    }
    encoder.component(&text[start..]);
    encoder.restore();
    encoder.out
}

/// Whether every character of the text has a declared character set.
pub(crate) fn can_encode(cs: &SpecificCharacterSet, text: &str) -> bool {
    let mut buf = [0u8; 4];
    text.chars()
        .all(|c| cs.charsets().any(|charset| encode_in(charset, c.encode_utf8(&mut buf)).is_some()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const JAPANESE_BYTES: &[u8] = b"Yamada^Tarou=\x1b$B;3ED\x1b(B^\x1b$BB@O:\x1b(B=\x1b$B$d$^$@\x1b(B^\x1b$B$?$m$&\x1b(B";
    const KOREAN_BYTES: &[u8] = b"Hong^Gildong=\x1b$)C\xfb\xf3^\x1b$)C\xd1\xce\xd4\xd7=\x1b$)C\xc8\xab^\x1b$)C\xb1\xe6\xb5\xbf";

    #[test]
    fn japanese_kanji() {
        let cs = SpecificCharacterSet::from_codes(&["", "ISO 2022 IR 87"]);
        let text = "Yamada^Tarou=山田^太郎=やまだ^たろう";
        assert_eq!(cs.decode(JAPANESE_BYTES, "^=\\"), text);
        assert_eq!(cs.encode(text, "^=\\"), JAPANESE_BYTES);
    }

    #[test]
    fn korean() {
        let cs = SpecificCharacterSet::from_codes(&["", "ISO 2022 IR 149"]);
        let text = "Hong^Gildong=洪^吉洞=홍^길동";
        assert_eq!(cs.decode(KOREAN_BYTES, "^=\\"), text);
        assert_eq!(cs.encode(text, "^=\\"), KOREAN_BYTES);
    }

    #[test]
    fn plain_text_stays_in_primary() {
        let cs = SpecificCharacterSet::from_codes(&["ISO 2022 IR 100", "ISO 2022 IR 87"]);
        assert_eq!(cs.encode("Günther", "\\"), b"G\xfcnther");
        assert_eq!(cs.decode(b"G\xfcnther", "\\"), "Günther");
    }

    #[test]
    fn unencodable_becomes_question_mark() {
        let cs = SpecificCharacterSet::from_codes(&["", "ISO 2022 IR 87"]);
        assert_eq!(cs.encode("A\u{263a}", "\\"), b"A?");
        assert!(!cs.can_encode("\u{263a}"));
        assert!(cs.can_encode("山田"));
    }

    #[test]
    fn unknown_escape_is_skipped() {
        let cs = SpecificCharacterSet::from_codes(&["", "ISO 2022 IR 87"]);
        assert_eq!(cs.decode(b"AB\x1b%GC", "\\"), "AB%GC");
    }
}
