//! Edit mode as validated facets, and the mapping scopes derived from it.

use bitflags::bitflags;
use thiserror::Error;

bitflags! {
    /// Mode scope of a mapping. Bit values follow the classic `State` layout.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MapModes: u16 {
        const NORMAL = 0x01;
        const VISUAL = 0x02;
        const OP_PENDING = 0x04;
        const CMDLINE = 0x08;
        const INSERT = 0x10;
        const LANGMAP = 0x20;
        const SELECT = 0x1000;
    }
}

impl MapModes {
    /// Modes of a plain `:map`.
    pub const NVO: Self = Self::NORMAL
        .union(Self::VISUAL)
        .union(Self::SELECT)
        .union(Self::OP_PENDING);

    pub const ALL_MODES: Self = Self::NVO
        .union(Self::CMDLINE)
        .union(Self::INSERT)
        .union(Self::LANGMAP);

    /// Parses a map-command mode prefix: `""`/`" "` (n+v+o), `n v x s o i c l !`.
    /// Several letters combine, e.g. `"nv"`.
    pub fn parse(value: &str) -> Option<Self> {
        let v = value.trim();
        if v.is_empty() {
            return Some(Self::NVO);
        }
        let mut modes = MapModes::empty();
        for ch in v.chars() {
            modes |= match ch {
                'n' => Self::NORMAL,
                'v' => Self::VISUAL | Self::SELECT,
                'x' => Self::VISUAL,
                's' => Self::SELECT,
                'o' => Self::OP_PENDING,
                'i' => Self::INSERT,
                'c' => Self::CMDLINE,
                'l' => Self::INSERT | Self::CMDLINE | Self::LANGMAP,
                '!' => Self::INSERT | Self::CMDLINE,
                _ => return None,
            };
        }
        Some(modes)
    }

    /// Short listing form, e.g. `"n"`, `"i"`, `"!"`, `" "`.
    pub fn letters(&self) -> String {
        if *self == Self::NVO {
            return " ".to_string();
        }
        if *self == (Self::INSERT | Self::CMDLINE) {
            return "!".to_string();
        }
        let mut out = String::new();
        let visual_select = Self::VISUAL | Self::SELECT;
        for (flag, letter) in [
            (Self::NORMAL, 'n'),
            (Self::OP_PENDING, 'o'),
            (Self::INSERT, 'i'),
            (Self::CMDLINE, 'c'),
            (Self::LANGMAP, 'l'),
        ] {
            if self.contains(flag) {
                out.push(letter);
            }
        }
        if self.contains(visual_select) {
            out.push('v');
        } else if self.contains(Self::VISUAL) {
            out.push('x');
        } else if self.contains(Self::SELECT) {
            out.push('s');
        }
        out
    }
}

/// Raw facet switches. Only combinations accepted by [`Mode::new`] become a `Mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Facets {
    pub normal: bool,
    pub visual: bool,
    pub operator_pending: bool,
    pub cmdline: bool,
    pub insert: bool,
    pub lang_map: bool,
    pub select: bool,
    pub replace: bool,
    pub virtual_replace: bool,
    pub show_match: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimaryMode {
    Normal,
    Visual,
    OperatorPending,
    CommandLine,
    Insert,
}

/// Mode change requested by a dispatched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeEffect {
    None,
    Normal,
    Visual,
    Select,
    OperatorPending,
    CommandLine,
    Insert,
    Replace,
    VirtualReplace,
    SetReplace(bool),
    SetLangMap(bool),
    SetShowMatch(bool),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModeError {
    #[error("invalid mode: {0}")]
    InvalidMode(&'static str),
    #[error("cannot apply {effect:?} in {from} mode: {reason}")]
    InvalidModeTransition {
        from: &'static str,
        effect: ModeEffect,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mode {
    facets: Facets,
}

impl Mode {
    pub fn new(facets: Facets) -> Result<Self, ModeError> {
        validate(&facets)?;
        Ok(Self { facets })
    }

    pub fn normal() -> Self {
        Self {
            facets: Facets {
                normal: true,
                ..Facets::default()
            },
        }
    }

    pub fn insert() -> Self {
        Self {
            facets: Facets {
                insert: true,
                ..Facets::default()
            },
        }
    }

    pub fn visual() -> Self {
        Self {
            facets: Facets {
                visual: true,
                ..Facets::default()
            },
        }
    }

    pub fn cmdline() -> Self {
        Self {
            facets: Facets {
                cmdline: true,
                ..Facets::default()
            },
        }
    }

    pub fn facets(&self) -> Facets {
        self.facets
    }

    pub fn primary(&self) -> PrimaryMode {
        let f = &self.facets;
        if f.insert {
            PrimaryMode::Insert
        } else if f.cmdline {
            PrimaryMode::CommandLine
        } else if f.visual {
            PrimaryMode::Visual
        } else if f.operator_pending {
            PrimaryMode::OperatorPending
        } else {
            PrimaryMode::Normal
        }
    }

    pub fn is_normal(&self) -> bool {
        self.facets.normal
    }

    pub fn is_insert(&self) -> bool {
        self.facets.insert
    }

    pub fn is_select(&self) -> bool {
        self.facets.select
    }

    pub fn is_replace(&self) -> bool {
        self.facets.replace
    }

    pub fn is_virtual_replace(&self) -> bool {
        self.facets.virtual_replace
    }

    pub fn lang_map(&self) -> bool {
        self.facets.lang_map
    }

    /// Whether printable keys resolve to characters rather than commands.
    pub fn accepts_text(&self) -> bool {
        self.facets.insert || self.facets.cmdline || self.facets.select
    }

    pub fn map_scope(&self) -> MapModes {
        let f = &self.facets;
        let mut scope = match self.primary() {
            PrimaryMode::Normal => MapModes::NORMAL,
            PrimaryMode::Visual if f.select => MapModes::SELECT,
            PrimaryMode::Visual => MapModes::VISUAL,
            PrimaryMode::OperatorPending => MapModes::OP_PENDING,
            PrimaryMode::CommandLine => MapModes::CMDLINE,
            PrimaryMode::Insert => MapModes::INSERT,
        };
        if f.lang_map {
            scope |= MapModes::LANGMAP;
        }
        scope
    }

    pub fn name(&self) -> &'static str {
        let f = &self.facets;
        match self.primary() {
            PrimaryMode::Insert if f.virtual_replace => "VREPLACE",
            PrimaryMode::Insert if f.replace => "REPLACE",
            PrimaryMode::Insert => "INSERT",
            PrimaryMode::CommandLine => "CMDLINE",
            PrimaryMode::Visual if f.select => "SELECT",
            PrimaryMode::Visual => "VISUAL",
            PrimaryMode::OperatorPending => "OP-PENDING",
            PrimaryMode::Normal => "NORMAL",
        }
    }

    /// Applies a mode effect. Invalid results leave `self` untouched.
    pub fn transition(&self, effect: ModeEffect) -> Result<Mode, ModeError> {
        let only = |set: fn(&mut Facets)| {
            let mut f = Facets::default();
            set(&mut f);
            f
        };
        let next = match effect {
            ModeEffect::None => return Ok(*self),
            ModeEffect::Normal => only(|f| f.normal = true),
            ModeEffect::Visual => only(|f| f.visual = true),
            ModeEffect::Select => only(|f| {
                f.visual = true;
                f.select = true;
            }),
            ModeEffect::OperatorPending => {
                if !self.facets.normal {
                    return Err(self.rejected(effect, "operators start from normal mode"));
                }
                only(|f| f.operator_pending = true)
            }
            ModeEffect::CommandLine => only(|f| f.cmdline = true),
            ModeEffect::Insert => only(|f| f.insert = true),
            ModeEffect::Replace => only(|f| {
                f.insert = true;
                f.replace = true;
            }),
            ModeEffect::VirtualReplace => only(|f| {
                f.insert = true;
                f.virtual_replace = true;
            }),
            ModeEffect::SetReplace(on) => Facets {
                replace: on,
                ..self.facets
            },
            ModeEffect::SetLangMap(on) => Facets {
                lang_map: on,
                ..self.facets
            },
            ModeEffect::SetShowMatch(on) => Facets {
                show_match: on,
                ..self.facets
            },
        };
        validate(&next).map_err(|err| match err {
            ModeError::InvalidMode(reason) => self.rejected(effect, reason),
            other => other,
        })?;
        Ok(Mode { facets: next })
    }

    fn rejected(&self, effect: ModeEffect, reason: &'static str) -> ModeError {
        ModeError::InvalidModeTransition {
            from: self.name(),
            effect,
            reason,
        }
    }
}

impl Default for Mode {
    fn default() -> Self {
        Self::normal()
    }
}

fn validate(f: &Facets) -> Result<(), ModeError> {
    let primaries = [f.normal, f.visual, f.operator_pending, f.cmdline, f.insert]
        .iter()
        .filter(|on| **on)
        .count();
    if primaries != 1 {
        return Err(ModeError::InvalidMode(
            "exactly one of normal, visual, operator-pending, cmdline, insert must be set",
        ));
    }
    if f.replace && f.virtual_replace {
        return Err(ModeError::InvalidMode(
            "replace and virtual replace are exclusive",
        ));
    }
    if (f.replace || f.virtual_replace) && !f.insert {
        return Err(ModeError::InvalidMode("replace requires insert"));
    }
    if f.show_match && !f.insert {
        return Err(ModeError::InvalidMode("showmatch requires insert"));
    }
    if f.lang_map && !(f.insert || f.cmdline) {
        return Err(ModeError::InvalidMode(
            "language mapping requires insert or cmdline",
        ));
    }
    if f.select && !f.visual {
        return Err(ModeError::InvalidMode("select requires visual"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/core/mode.rs"]
mod tests;
