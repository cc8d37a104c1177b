//! Per-platform config and data directories.
//!
//! - macOS: ~/Library/Application Support/keyweave
//! - Linux: $XDG_CONFIG_HOME/keyweave (config), $XDG_DATA_HOME/keyweave (data)
//! - Windows: %APPDATA%\keyweave

use std::path::PathBuf;

const APP_NAME: &str = "keyweave";
const LOG_DIR: &str = "logs";

pub fn get_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        app_support_dir()
    }

    #[cfg(target_os = "linux")]
    {
        xdg_dir("XDG_CONFIG_HOME", ".config")
    }

    #[cfg(target_os = "windows")]
    {
        appdata_dir()
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        None
    }
}

fn get_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        app_support_dir()
    }

    #[cfg(target_os = "linux")]
    {
        xdg_dir("XDG_DATA_HOME", ".local/share")
    }

    #[cfg(target_os = "windows")]
    {
        appdata_dir()
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        None
    }
}

#[cfg(target_os = "macos")]
fn app_support_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(|home| {
        PathBuf::from(home)
            .join("Library/Application Support")
            .join(APP_NAME)
    })
}

#[cfg(target_os = "linux")]
fn xdg_dir(var: &str, home_fallback: &str) -> Option<PathBuf> {
    match std::env::var(var) {
        Ok(dir) if !dir.is_empty() => Some(PathBuf::from(dir).join(APP_NAME)),
        _ => std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(home_fallback).join(APP_NAME)),
    }
}

#[cfg(target_os = "windows")]
fn appdata_dir() -> Option<PathBuf> {
    std::env::var("APPDATA")
        .ok()
        .map(|appdata| PathBuf::from(appdata).join(APP_NAME))
}

pub fn get_log_dir() -> Option<PathBuf> {
    get_data_dir().map(|p| p.join(LOG_DIR))
}

pub fn ensure_log_dir() -> std::io::Result<PathBuf> {
    let dir = get_log_dir().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Cannot determine log directory",
        )
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }

    Ok(dir)
}
