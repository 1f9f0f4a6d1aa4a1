use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Overrides the preferences file location.
pub const CONFIG_ENV_VAR: &str = "OUTPRINTER_CONFIG";

const APP_DIR: &str = "outprinter";
const FILE_NAME: &str = "preferences.json";

/// 決定偏好設定檔位置：明確路徑、環境變數，最後是 XDG 目錄。 / Picks the preferences file: explicit path, then the environment, then the XDG location.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    config_path_with(explicit, |key| env::var_os(key))
}

fn config_path_with<F>(explicit: Option<&Path>, var: F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<OsString>,
{
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let non_empty = |key: &str| var(key).filter(|value| !value.is_empty());
    if let Some(path) = non_empty(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }
    if let Some(base) = non_empty("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(base).join(APP_DIR).join(FILE_NAME));
    }
    non_empty("HOME").map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(FILE_NAME)
    })
}
