pub mod location;
pub mod preferences;

pub use location::{resolve_config_path, CONFIG_ENV_VAR};
pub use preferences::{
    MarginPreferences, Preferences, PreferencesError, PreferencesStore, PrinterPreferences,
    TextPreferences,
};
