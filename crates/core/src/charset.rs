//! Active-charset tracking for `\'xx` hex escapes.
//!
//! RTF documents declare the 8-bit encoding of their escaped bytes either by
//! name (`\ansi`, `\mac`, `\pc`, `\pca`) or by Windows codepage number
//! (`\ansicpg1252`). [`CharsetResolver`] keeps the active encoding and turns
//! escaped byte values into characters.
//!
//! Windows, Mac and CJK codepages decode through `encoding_rs`. IBM PC (OEM)
//! codepages such as 437 and 850 are not WHATWG encodings; they use the
//! lookup tables of `oem_cp`.

use encoding_rs::Encoding;
use oem_cp::code_table as oem;

/// One of the four named charset directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedCharset {
    /// `\ansi`. Resolved through the `iso-8859-1` label, which `encoding_rs`
    /// treats as Windows-1252, so bytes 0x80 to 0x9F decode to printable
    /// characters rather than C1 controls.
    Ansi,
    /// `\mac`
    Mac,
    /// `\pc` (IBM PC code page 437)
    Pc,
    /// `\pca` (IBM PC code page 850)
    Pca,
}

impl NamedCharset {
    /// Encoding label the directive selects.
    pub fn label(self) -> &'static str {
        match self {
            NamedCharset::Ansi => "iso-8859-1",
            NamedCharset::Mac => "macintosh",
            NamedCharset::Pc => "cp437",
            NamedCharset::Pca => "cp850",
        }
    }

    /// Control word that selects this charset.
    pub fn keyword(self) -> &'static str {
        match self {
            NamedCharset::Ansi => "ansi",
            NamedCharset::Mac => "mac",
            NamedCharset::Pc => "pc",
            NamedCharset::Pca => "pca",
        }
    }
}

/// A charset request that could not be honored.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CharsetError {
    /// No encoding is available for the requested name or codepage.
    #[error("charset `{name}` is not supported")]
    Unsupported {
        /// The label or `cp<number>` that was requested.
        name: String,
    },
}

/// Upper half (0x80..=0xFF) of an OEM codepage.
#[derive(Clone, Copy, PartialEq, Eq)]
enum OemTable {
    Complete(&'static [char]),
    /// Undefined positions are `None`.
    Incomplete(&'static [Option<char>]),
}

/// An IBM PC codepage backed by an `oem_cp` decoding table.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct OemCodepage {
    name: &'static str,
    table: OemTable,
}

impl OemCodepage {
    /// Look up a supported OEM codepage by number.
    pub fn from_number(codepage: u32) -> Option<Self> {
        use OemTable::{Complete, Incomplete};
        let (name, table) = match codepage {
            437 => ("IBM437", Complete(&oem::DECODING_TABLE_CP437)),
            737 => ("IBM737", Complete(&oem::DECODING_TABLE_CP737)),
            775 => ("IBM775", Complete(&oem::DECODING_TABLE_CP775)),
            850 => ("IBM850", Complete(&oem::DECODING_TABLE_CP850)),
            852 => ("IBM852", Complete(&oem::DECODING_TABLE_CP852)),
            855 => ("IBM855", Complete(&oem::DECODING_TABLE_CP855)),
            857 => ("IBM857", Incomplete(&oem::DECODING_TABLE_CP857)),
            858 => ("IBM00858", Complete(&oem::DECODING_TABLE_CP858)),
            860 => ("IBM860", Complete(&oem::DECODING_TABLE_CP860)),
            861 => ("IBM861", Complete(&oem::DECODING_TABLE_CP861)),
            862 => ("IBM862", Complete(&oem::DECODING_TABLE_CP862)),
            863 => ("IBM863", Complete(&oem::DECODING_TABLE_CP863)),
            864 => ("IBM864", Incomplete(&oem::DECODING_TABLE_CP864)),
            865 => ("IBM865", Complete(&oem::DECODING_TABLE_CP865)),
            869 => ("IBM869", Complete(&oem::DECODING_TABLE_CP869)),
            _ => return None,
        };
        Some(Self { name, table })
    }

    /// Canonical name, e.g. `IBM437`.
    pub fn name(self) -> &'static str {
        self.name
    }

    fn decode(self, byte: u8) -> char {
        if byte.is_ascii() {
            return char::from(byte);
        }
        let index = usize::from(byte - 0x80);
        let decoded = match self.table {
            OemTable::Complete(table) => table.get(index).copied(),
            OemTable::Incomplete(table) => table.get(index).copied().flatten(),
        };
        decoded.unwrap_or(char::REPLACEMENT_CHARACTER)
    }
}

impl std::fmt::Debug for OemCodepage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("OemCodepage").field(&self.name).finish()
    }
}

/// Decoder for single escaped bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// A WHATWG encoding.
    Web(&'static Encoding),
    /// An IBM PC codepage.
    Oem(OemCodepage),
}

impl Charset {
    /// Name of the underlying encoding, for logs.
    pub fn name(self) -> &'static str {
        match self {
            Charset::Web(encoding) => encoding.name(),
            Charset::Oem(codepage) => codepage.name(),
        }
    }

    /// Decode one byte on its own. Bytes that only make sense as part of a
    /// multi-byte sequence, and positions the codepage leaves undefined,
    /// come out as U+FFFD.
    pub fn decode_byte(self, byte: u8) -> char {
        match self {
            Charset::Web(encoding) => {
                let bytes = [byte];
                let (decoded, _) = encoding.decode_without_bom_handling(&bytes);
                decoded
                    .chars()
                    .next()
                    .unwrap_or(char::REPLACEMENT_CHARACTER)
            }
            Charset::Oem(codepage) => codepage.decode(byte),
        }
    }
}

/// Map a Windows codepage number to an `encoding_rs` encoding.
pub fn encoding_for_codepage(codepage: u32) -> Option<&'static Encoding> {
    use encoding_rs::*;
    let encoding = match codepage {
        866 => IBM866,
        874 | 28601 => WINDOWS_874,
        932 => SHIFT_JIS,
        936 => GBK,
        949 => EUC_KR,
        950 => BIG5,
        1250 => WINDOWS_1250,
        1251 => WINDOWS_1251,
        1252 | 28591 => WINDOWS_1252,
        1253 => WINDOWS_1253,
        1254 | 28599 => WINDOWS_1254,
        1255 => WINDOWS_1255,
        1256 => WINDOWS_1256,
        1257 => WINDOWS_1257,
        1258 => WINDOWS_1258,
        10000 => MACINTOSH,
        10007 => X_MAC_CYRILLIC,
        20866 => KOI8_R,
        20932 => EUC_JP,
        21866 => KOI8_U,
        28592 => ISO_8859_2,
        28593 => ISO_8859_3,
        28594 => ISO_8859_4,
        28595 => ISO_8859_5,
        28596 => ISO_8859_6,
        28597 => ISO_8859_7,
        28598 => ISO_8859_8,
        28600 => ISO_8859_10,
        28603 => ISO_8859_13,
        28604 => ISO_8859_14,
        28605 => ISO_8859_15,
        28606 => ISO_8859_16,
        54936 => GB18030,
        65001 => UTF_8,
        _ => return None,
    };
    Some(encoding)
}

/// Map any supported codepage number to a charset.
pub fn charset_for_codepage(codepage: u32) -> Option<Charset> {
    encoding_for_codepage(codepage)
        .map(Charset::Web)
        .or_else(|| OemCodepage::from_number(codepage).map(Charset::Oem))
}

/// Tracks the active 8-bit encoding of a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharsetResolver {
    active: Option<Charset>,
}

impl CharsetResolver {
    /// A resolver with no active charset.
    pub fn new() -> Self {
        Self::default()
    }

    /// The active charset, if any.
    pub fn active(&self) -> Option<Charset> {
        self.active
    }

    /// Install a named charset. On failure the previous charset is kept.
    pub fn set_named(&mut self, named: NamedCharset) -> Result<Charset, CharsetError> {
        let charset = match named {
            NamedCharset::Ansi | NamedCharset::Mac => {
                Encoding::for_label(named.label().as_bytes()).map(Charset::Web)
            }
            NamedCharset::Pc => charset_for_codepage(437),
            NamedCharset::Pca => charset_for_codepage(850),
        }
        .ok_or_else(|| CharsetError::Unsupported {
            name: named.label().to_string(),
        })?;
        self.active = Some(charset);
        Ok(charset)
    }

    /// Install the charset for a codepage number. On failure the previous
    /// charset is kept.
    pub fn set_from_codepage(&mut self, codepage: u32) -> Result<Charset, CharsetError> {
        let charset =
            charset_for_codepage(codepage).ok_or_else(|| CharsetError::Unsupported {
                name: format!("cp{codepage}"),
            })?;
        self.active = Some(charset);
        Ok(charset)
    }

    /// Translate an escaped byte value to a character.
    ///
    /// With no active charset the byte is its own code point.
    pub fn translate(&self, byte: u8) -> char {
        match self.active {
            Some(charset) => charset.decode_byte(byte),
            None => char::from(byte),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_charset_is_identity() {
        let r = CharsetResolver::new();
        assert_eq!(r.translate(0x41), 'A');
        assert_eq!(r.translate(0xE9), 'é');
        assert_eq!(r.translate(0x80), '\u{80}');
    }

    #[test]
    fn codepage_1252_maps_high_bytes() {
        let mut r = CharsetResolver::new();
        r.set_from_codepage(1252).unwrap();
        assert_eq!(r.translate(0xE9), 'é');
        assert_eq!(r.translate(0x80), '€');
    }

    #[test]
    fn codepage_1251_is_cyrillic() {
        let mut r = CharsetResolver::new();
        r.set_from_codepage(1251).unwrap();
        assert_eq!(r.translate(0xC0), '\u{410}');
    }

    #[test]
    fn named_ansi_and_mac() {
        let mut r = CharsetResolver::new();
        assert_eq!(
            r.set_named(NamedCharset::Ansi).unwrap(),
            Charset::Web(encoding_rs::WINDOWS_1252)
        );
        assert_eq!(r.translate(0xE9), 'é');
        r.set_named(NamedCharset::Mac).unwrap();
        assert_eq!(r.translate(0x8E), 'é');
    }

    #[test]
    fn unsupported_keeps_previous_charset() {
        let mut r = CharsetResolver::new();
        r.set_from_codepage(1251).unwrap();
        let err = r.set_from_codepage(12345).unwrap_err();
        assert_eq!(
            err,
            CharsetError::Unsupported {
                name: "cp12345".into()
            }
        );
        assert_eq!(err.to_string(), "charset `cp12345` is not supported");
        assert_eq!(r.active(), Some(Charset::Web(encoding_rs::WINDOWS_1251)));
    }

    #[test]
    fn named_pc_charsets_use_oem_tables() {
        let mut r = CharsetResolver::new();
        assert_eq!(r.set_named(NamedCharset::Pc).unwrap().name(), "IBM437");
        assert_eq!(r.translate(0x82), '\u{e9}');
        assert_eq!(r.translate(0xB3), '\u{2502}');
        assert_eq!(r.translate(0x41), 'A');

        assert_eq!(r.set_named(NamedCharset::Pca).unwrap().name(), "IBM850");
        assert_eq!(r.translate(0x82), '\u{e9}');
        assert_eq!(r.translate(0xD5), '\u{131}');
    }

    #[test]
    fn oem_codepage_numbers() {
        let mut r = CharsetResolver::new();
        for cp in [437, 850, 852, 857, 860, 861, 862, 863, 864, 865, 869] {
            assert!(r.set_from_codepage(cp).is_ok(), "cp{cp}");
        }
        r.set_from_codepage(852).unwrap();
        assert_eq!(r.translate(0x82), '\u{e9}');
        r.set_from_codepage(862).unwrap();
        assert_eq!(r.translate(0x80), '\u{5d0}');
        r.set_from_codepage(866).unwrap();
        assert_eq!(r.active().map(Charset::name), Some("IBM866"));
        assert_eq!(r.translate(0x80), '\u{410}');
    }

    #[test]
    fn lone_lead_byte_is_replacement() {
        let mut r = CharsetResolver::new();
        r.set_from_codepage(932).unwrap();
        assert_eq!(r.translate(0x41), 'A');
        assert_eq!(r.translate(0x82), char::REPLACEMENT_CHARACTER);
    }
}
