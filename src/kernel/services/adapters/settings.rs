//! settings.json: loading, defaults, and turning settings into a session.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::core::encoding::Encoding;
use crate::core::mode::MapModes;
use crate::kernel::keymap::{MapError, MappingSpec, MappingTable, Remap};
use crate::kernel::notation::{Notation, NotationError};
use crate::kernel::resolver::ResolverConfig;
use crate::kernel::services::adapters::paths::get_config_dir;
use crate::kernel::services::ports::settings::{MappingRule, Settings};
use crate::kernel::session::{InputSession, SessionConfig};

const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid key notation: {0}")]
    Notation(#[from] NotationError),
    #[error("mapping #{index} ({lhs}): {source}")]
    Mapping {
        index: usize,
        lhs: String,
        #[source]
        source: MapError,
    },
}

pub fn get_settings_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join(SETTINGS_FILE))
}

/// Writes default settings if the file does not exist yet.
pub fn ensure_settings_file() -> std::io::Result<PathBuf> {
    let path = get_settings_path().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Cannot determine settings directory",
        )
    })?;
    write_default_settings(&path)?;
    Ok(path)
}

pub fn write_default_settings(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    if !path.exists() {
        let content =
            serde_json::to_string_pretty(&Settings::default()).unwrap_or_else(|_| "{}".to_string());
        std::fs::write(path, content)?;
    }
    Ok(())
}

pub fn load_settings(path: &Path) -> Result<Settings, SettingsError> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

pub fn notation(settings: &Settings) -> Result<Notation, SettingsError> {
    let encoding = Encoding::from_name(&settings.encoding);
    Ok(Notation::new(encoding).with_leader(&settings.leader)?)
}

pub fn resolver_config(settings: &Settings, notation: &Notation) -> Result<ResolverConfig, SettingsError> {
    let interrupt_key = match settings.interrupt_key.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(key) => Some(notation.parse(key)?).filter(|bytes| !bytes.is_empty()),
    };
    Ok(ResolverConfig {
        timeout: settings
            .timeout
            .then(|| Duration::from_millis(settings.timeoutlen)),
        max_depth: settings.maxmapdepth,
        interrupt_key,
    })
}

pub fn session_config(settings: &Settings) -> Result<SessionConfig, SettingsError> {
    let notation = notation(settings)?;
    Ok(SessionConfig {
        resolver: resolver_config(settings, &notation)?,
        encoding: notation.encoding().clone(),
        key_timeout: Some(Duration::from_millis(settings.ttimeoutlen)),
    })
}

pub fn mapping_spec(rule: &MappingRule, notation: &Notation) -> Result<MappingSpec, MapError> {
    let modes = MapModes::parse(&rule.mode).ok_or_else(|| MapError::InvalidModes(rule.mode.clone()))?;
    let lhs = notation.parse(&rule.lhs)?;
    let mut spec = match &rule.function {
        Some(name) => MappingSpec::function(lhs, name, modes),
        None => MappingSpec::new(lhs, notation.parse(&rule.rhs)?, modes),
    };
    if rule.script {
        spec = spec.remap(Remap::Script).script_local();
    } else if rule.noremap {
        spec = spec.noremap();
    }
    if rule.nowait {
        spec = spec.nowait();
    }
    if rule.unique {
        spec = spec.unique();
    }
    Ok(spec)
}

/// Installs every rule it can; failures are collected per rule.
pub fn apply_mappings(
    settings: &Settings,
    notation: &Notation,
    table: &mut MappingTable,
) -> Vec<SettingsError> {
    let mut errors = Vec::new();
    for (index, rule) in settings.mappings.iter().enumerate() {
        let result = mapping_spec(rule, notation).and_then(|spec| table.define(spec));
        if let Err(source) = result {
            tracing::warn!(index, lhs = %rule.lhs, error = %source, "mapping rule skipped");
            errors.push(SettingsError::Mapping {
                index,
                lhs: rule.lhs.clone(),
                source,
            });
        }
    }
    errors
}

/// Builds a session from settings. Rule errors do not stop the build.
pub fn build_session(settings: &Settings) -> Result<(InputSession, Vec<SettingsError>), SettingsError> {
    let notation = notation(settings)?;
    let config = session_config(settings)?;
    let mut table = MappingTable::with_precedence(settings.local_precedence);
    let errors = apply_mappings(settings, &notation, &mut table);
    Ok((InputSession::new(config, table), errors))
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/settings.rs"]
mod tests;
