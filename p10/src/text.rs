//! Decoding of DICOM text into UTF-8.
//!
//! All text read from a P10 stream is normalized to UTF-8; the original
//! character set is not preserved on write. The supported character sets are
//! the single-byte sets plus UTF-8; ISO 2022 code switching and the
//! multi-byte CJK sets are out of scope and decode through the default
//! repertoire with `?` substitution.

use std::borrow::Cow;

use encoding::all::{
    ISO_8859_1, ISO_8859_2, ISO_8859_3, ISO_8859_4, ISO_8859_5, ISO_8859_6, ISO_8859_7,
    ISO_8859_8,
};
use encoding::{DecoderTrap, Encoding};

/// A text decoding capability: one character set, one operation.
pub trait TextCodec {
    /// The defined term of the character set this codec decodes, as found
    /// in *(0008,0005) Specific Character Set*.
    fn name(&self) -> Cow<'static, str>;

    /// Decode the given bytes into UTF-8. Bytes with no mapping in the
    /// character set are replaced rather than rejected.
    fn decode(&self, text: &[u8]) -> String;
}

/// A specific character set as declared by *(0008,0005)*.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecificCharacterSet(CharsetImpl);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum CharsetImpl {
    /// The default character repertoire (ISO-IR 6).
    #[default]
    Default,
    /// ISO-IR 100 (ISO-8859-1, Latin alphabet No. 1)
    IsoIr100,
    /// ISO-IR 101 (ISO-8859-2, Latin alphabet No. 2)
    IsoIr101,
    /// ISO-IR 109 (ISO-8859-3, Latin alphabet No. 3)
    IsoIr109,
    /// ISO-IR 110 (ISO-8859-4, Latin alphabet No. 4)
    IsoIr110,
    /// ISO-IR 144 (ISO-8859-5, Cyrillic)
    IsoIr144,
    /// ISO-IR 127 (ISO-8859-6, Arabic)
    IsoIr127,
    /// ISO-IR 126 (ISO-8859-7, Greek)
    IsoIr126,
    /// ISO-IR 138 (ISO-8859-8, Hebrew)
    IsoIr138,
    /// ISO-IR 192 (Unicode in UTF-8)
    IsoIr192,
}

impl SpecificCharacterSet {
    /// The default character repertoire.
    pub const ISO_IR_6: SpecificCharacterSet = SpecificCharacterSet(CharsetImpl::Default);

    /// UTF-8.
    pub const ISO_IR_192: SpecificCharacterSet = SpecificCharacterSet(CharsetImpl::IsoIr192);

    /// Obtain the character set for the given value of
    /// *(0008,0005) Specific Character Set*. Multi-valued character sets
    /// select on the first value, as code switching is not supported.
    /// Returns `None` for codes outside the supported repertoire.
    pub fn from_code(code: &str) -> Option<SpecificCharacterSet> {
        let first = code.split('\\').next().unwrap_or("").trim();
        let charset = match first {
            "" | "ISO_IR 6" | "ISO 2022 IR 6" => CharsetImpl::Default,
            "ISO_IR 100" | "ISO 2022 IR 100" => CharsetImpl::IsoIr100,
            "ISO_IR 101" | "ISO 2022 IR 101" => CharsetImpl::IsoIr101,
            "ISO_IR 109" | "ISO 2022 IR 109" => CharsetImpl::IsoIr109,
            "ISO_IR 110" | "ISO 2022 IR 110" => CharsetImpl::IsoIr110,
            "ISO_IR 144" | "ISO 2022 IR 144" => CharsetImpl::IsoIr144,
            "ISO_IR 127" | "ISO 2022 IR 127" => CharsetImpl::IsoIr127,
            "ISO_IR 126" | "ISO 2022 IR 126" => CharsetImpl::IsoIr126,
            "ISO_IR 138" | "ISO 2022 IR 138" => CharsetImpl::IsoIr138,
            "ISO_IR 192" => CharsetImpl::IsoIr192,
            _ => return None,
        };
        Some(SpecificCharacterSet(charset))
    }

    /// Whether text in this character set is already valid UTF-8 and can be
    /// passed through without conversion.
    pub fn is_utf8_compatible(self) -> bool {
        matches!(self.0, CharsetImpl::IsoIr192)
    }
}

impl Default for SpecificCharacterSet {
    fn default() -> SpecificCharacterSet {
        SpecificCharacterSet::ISO_IR_6
    }
}

impl TextCodec for SpecificCharacterSet {
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(match self.0 {
            CharsetImpl::Default => "ISO_IR 6",
            CharsetImpl::IsoIr100 => "ISO_IR 100",
            CharsetImpl::IsoIr101 => "ISO_IR 101",
            CharsetImpl::IsoIr109 => "ISO_IR 109",
            CharsetImpl::IsoIr110 => "ISO_IR 110",
            CharsetImpl::IsoIr144 => "ISO_IR 144",
            CharsetImpl::IsoIr127 => "ISO_IR 127",
            CharsetImpl::IsoIr126 => "ISO_IR 126",
            CharsetImpl::IsoIr138 => "ISO_IR 138",
            CharsetImpl::IsoIr192 => "ISO_IR 192",
        })
    }

    fn decode(&self, text: &[u8]) -> String {
        match self.0 {
            CharsetImpl::Default => decode_default_repertoire(text),
            CharsetImpl::IsoIr100 => decode_with(ISO_8859_1, text),
            CharsetImpl::IsoIr101 => decode_with(ISO_8859_2, text),
            CharsetImpl::IsoIr109 => decode_with(ISO_8859_3, text),
            CharsetImpl::IsoIr110 => decode_with(ISO_8859_4, text),
            CharsetImpl::IsoIr144 => decode_with(ISO_8859_5, text),
            CharsetImpl::IsoIr127 => decode_with(ISO_8859_6, text),
            CharsetImpl::IsoIr126 => decode_with(ISO_8859_7, text),
            CharsetImpl::IsoIr138 => decode_with(ISO_8859_8, text),
            CharsetImpl::IsoIr192 => String::from_utf8_lossy(text).into_owned(),
        }
    }
}

fn decode_with<E: Encoding + ?Sized>(encoding: &E, text: &[u8]) -> String {
    encoding
        .decode(text, DecoderTrap::Replace)
        .unwrap_or_else(|_| decode_default_repertoire(text))
}

/// Decode bytes of the default repertoire, substituting anything outside
/// ASCII with a question mark. Invalid ISO-646 data has been observed in
/// the wild and must not derail the stream.
pub fn decode_default_repertoire(text: &[u8]) -> String {
    text.iter()
        .map(|&b| if b.is_ascii() { b as char } else { '?' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charset_codes() {
        assert_eq!(
            SpecificCharacterSet::from_code("ISO_IR 100"),
            Some(SpecificCharacterSet(CharsetImpl::IsoIr100))
        );
        assert_eq!(
            SpecificCharacterSet::from_code(""),
            Some(SpecificCharacterSet::ISO_IR_6)
        );
        // code switching selects on the first value
        assert_eq!(
            SpecificCharacterSet::from_code("ISO 2022 IR 100\\ISO 2022 IR 126"),
            Some(SpecificCharacterSet(CharsetImpl::IsoIr100))
        );
        assert_eq!(SpecificCharacterSet::from_code("ISO_IR 13"), None);
    }

    #[test]
    fn latin1_decoding() {
        let charset = SpecificCharacterSet::from_code("ISO_IR 100").unwrap();
        assert_eq!(charset.decode(b"M\xFCller"), "Müller");
    }

    #[test]
    fn default_repertoire_substitution() {
        assert_eq!(decode_default_repertoire(b"abc\x80def"), "abc?def");
    }

    #[test]
    fn utf8_passthrough() {
        let charset = SpecificCharacterSet::ISO_IR_192;
        assert!(charset.is_utf8_compatible());
        assert_eq!(charset.decode("山田".as_bytes()), "山田");
    }
}
