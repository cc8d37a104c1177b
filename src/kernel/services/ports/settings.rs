use serde::{Deserialize, Serialize};

use crate::kernel::keymap::LocalPrecedence;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub encoding: String,
    /// Wait at most `timeoutlen` on an ambiguous mapping; `false` waits forever.
    pub timeout: bool,
    pub timeoutlen: u64,
    /// Wait for the rest of a multi-byte key; 0 flushes immediately.
    pub ttimeoutlen: u64,
    pub maxmapdepth: usize,
    pub local_precedence: LocalPrecedence,
    pub leader: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interrupt_key: Option<String>,
    pub mappings: Vec<MappingRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRule {
    /// Map-command mode letters: `""` (n+v+o), `n v x s o i c l !`.
    #[serde(default)]
    pub mode: String,
    pub lhs: String,
    #[serde(default)]
    pub rhs: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub noremap: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub script: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub nowait: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub unique: bool,
    /// Bind `lhs` to a registered function instead of `rhs` keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            encoding: "utf-8".to_string(),
            timeout: true,
            timeoutlen: 1000,
            ttimeoutlen: 50,
            maxmapdepth: 1000,
            local_precedence: LocalPrecedence::default(),
            leader: "\\".to_string(),
            interrupt_key: Some("<C-c>".to_string()),
            mappings: Vec::new(),
        }
    }
}
