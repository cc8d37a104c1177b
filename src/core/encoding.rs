//! Encoding classifier: lead byte → character byte length.
//!
//! Every encoding owns a 256-entry table so classification is a single index.
//! Unicode transport forms (UCS-2, UTF-16, UCS-4) are held internally as UTF-8
//! and share its table; only the reported endianness differs.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EncodingFlags: u16 {
        const EIGHT_BIT = 0x01;
        const DBCS = 0x02;
        const UNICODE = 0x04;
        const ENDIAN_B = 0x10;
        const ENDIAN_L = 0x20;
        const TWO_BYTE = 0x40;
        const FOUR_BYTE = 0x80;
        const TWO_WORD = 0x100;
        const LATIN1 = 0x200;
        const LATIN9 = 0x400;
        const MACROMAN = 0x800;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    EightBit,
    DoubleByte,
    Unicode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endianness {
    Big,
    Little,
}

/// Lead-byte layout of the supported double-byte code pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodePage {
    /// Shift-JIS.
    Cp932,
    EucJp,
    /// GBK / EUC-CN.
    Cp936,
    /// UHC / EUC-KR.
    Cp949,
    /// Big5.
    Cp950,
}

/// Longest character the classifier reports (a 31-bit UTF-8 sequence).
pub const MAX_CHAR_BYTES: usize = 6;

struct CanonEntry {
    name: &'static str,
    flags: EncodingFlags,
    code_page: Option<CodePage>,
}

const fn canon(name: &'static str, bits: u16, code_page: Option<CodePage>) -> CanonEntry {
    CanonEntry {
        name,
        flags: EncodingFlags::from_bits_truncate(bits),
        code_page,
    }
}

const ENC_CANON: &[CanonEntry] = &[
    canon("utf-8", 0x04, None),
    canon("ucs-2", 0x04 | 0x10 | 0x40, None),
    canon("ucs-2le", 0x04 | 0x20 | 0x40, None),
    canon("utf-16", 0x04 | 0x10 | 0x100, None),
    canon("utf-16le", 0x04 | 0x20 | 0x100, None),
    canon("ucs-4", 0x04 | 0x10 | 0x80, None),
    canon("ucs-4le", 0x04 | 0x20 | 0x80, None),
    canon("latin1", 0x01 | 0x200, None),
    canon("iso-8859-15", 0x01 | 0x400, None),
    canon("macroman", 0x01 | 0x800, None),
    canon("cp1252", 0x01, None),
    canon("koi8-r", 0x01, None),
    canon("cp932", 0x02, Some(CodePage::Cp932)),
    canon("euc-jp", 0x02, Some(CodePage::EucJp)),
    canon("cp936", 0x02, Some(CodePage::Cp936)),
    canon("cp949", 0x02, Some(CodePage::Cp949)),
    canon("cp950", 0x02, Some(CodePage::Cp950)),
];

const ENC_ALIASES: &[(&str, &str)] = &[
    ("utf8", "utf-8"),
    ("unicode", "ucs-2"),
    ("ucs2", "ucs-2"),
    ("ucs-2be", "ucs-2"),
    ("ucs2le", "ucs-2le"),
    ("utf16", "utf-16"),
    ("utf-16be", "utf-16"),
    ("utf16le", "utf-16le"),
    ("ucs4", "ucs-4"),
    ("ucs-4be", "ucs-4"),
    ("ucs4le", "ucs-4le"),
    ("iso-8859-1", "latin1"),
    ("iso8859-1", "latin1"),
    ("ansi", "latin1"),
    ("latin9", "iso-8859-15"),
    ("iso8859-15", "iso-8859-15"),
    ("mac", "macroman"),
    ("sjis", "cp932"),
    ("shift-jis", "cp932"),
    ("japan", "euc-jp"),
    ("gbk", "cp936"),
    ("euc-cn", "cp936"),
    ("prc", "cp936"),
    ("euc-kr", "cp949"),
    ("korea", "cp949"),
    ("big5", "cp950"),
    ("taiwan", "cp950"),
];

#[derive(Clone)]
pub struct Encoding {
    name: &'static str,
    flags: EncodingFlags,
    code_page: Option<CodePage>,
    table: [u8; 256],
}

impl std::fmt::Debug for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encoding")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("code_page", &self.code_page)
            .finish()
    }
}

impl PartialEq for Encoding {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Encoding {}

impl Encoding {
    pub fn utf8() -> Self {
        Self::from_canon(&ENC_CANON[0])
    }

    pub fn latin1() -> Self {
        Self::lookup("latin1").unwrap_or_else(Self::utf8)
    }

    /// Resolves an encoding name (case-insensitive, `_` treated as `-`).
    pub fn lookup(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
        let canonical = ENC_ALIASES
            .iter()
            .find(|(alias, _)| *alias == normalized)
            .map(|(_, target)| *target)
            .unwrap_or(normalized.as_str());
        ENC_CANON
            .iter()
            .find(|entry| entry.name == canonical)
            .map(Self::from_canon)
    }

    /// Like [`Encoding::lookup`], but unknown names degrade to an 8-bit encoding.
    pub fn from_name(name: &str) -> Self {
        match Self::lookup(name) {
            Some(enc) => enc,
            None => {
                tracing::warn!(encoding = name, "unknown encoding, using latin1");
                Self::latin1()
            }
        }
    }

    fn from_canon(entry: &CanonEntry) -> Self {
        Self {
            name: entry.name,
            flags: entry.flags,
            code_page: entry.code_page,
            table: build_table(entry.flags, entry.code_page),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn flags(&self) -> EncodingFlags {
        self.flags
    }

    pub fn code_page(&self) -> Option<CodePage> {
        self.code_page
    }

    pub fn family(&self) -> Family {
        if self.flags.contains(EncodingFlags::UNICODE) {
            Family::Unicode
        } else if self.flags.contains(EncodingFlags::DBCS) {
            Family::DoubleByte
        } else {
            Family::EightBit
        }
    }

    pub fn endianness(&self) -> Option<Endianness> {
        if self.flags.contains(EncodingFlags::ENDIAN_B) {
            Some(Endianness::Big)
        } else if self.flags.contains(EncodingFlags::ENDIAN_L) {
            Some(Endianness::Little)
        } else {
            None
        }
    }

    pub fn is_unicode(&self) -> bool {
        self.family() == Family::Unicode
    }

    /// Expected total length (1..=6) of the character that starts with `first`.
    #[inline]
    pub fn byte_len(&self, first: u8) -> usize {
        self.table[first as usize] as usize
    }
}

impl Default for Encoding {
    fn default() -> Self {
        Self::utf8()
    }
}

fn build_table(flags: EncodingFlags, code_page: Option<CodePage>) -> [u8; 256] {
    let mut table = [1u8; 256];
    if flags.contains(EncodingFlags::UNICODE) {
        for (b, len) in table.iter_mut().enumerate() {
            *len = match b {
                0xC0..=0xDF => 2,
                0xE0..=0xEF => 3,
                0xF0..=0xF7 => 4,
                0xF8..=0xFB => 5,
                0xFC..=0xFD => 6,
                // ASCII, stray continuation bytes and 0xFE/0xFF
                _ => 1,
            };
        }
    } else if let Some(code_page) = code_page {
        for (b, len) in table.iter_mut().enumerate() {
            *len = dbcs_lead_len(code_page, b as u8);
        }
    }
    table
}

fn dbcs_lead_len(code_page: CodePage, b: u8) -> u8 {
    match code_page {
        CodePage::Cp932 => match b {
            0x81..=0x9F | 0xE0..=0xFC => 2,
            _ => 1,
        },
        CodePage::EucJp => match b {
            0x8F => 3,
            0x8E | 0xA1..=0xFE => 2,
            _ => 1,
        },
        CodePage::Cp936 | CodePage::Cp949 | CodePage::Cp950 => match b {
            0x81..=0xFE => 2,
            _ => 1,
        },
    }
}

#[cfg(test)]
#[path = "../../tests/unit/core/encoding.rs"]
mod tests;
