//! Service adapters: filesystem locations and settings loading.

pub mod paths;
pub mod settings;

pub use paths::{ensure_log_dir, get_config_dir, get_log_dir};
pub use settings::{
    apply_mappings, build_session, ensure_settings_file, get_settings_path, load_settings,
    SettingsError,
};
