use dirs::config_dir;
use once_cell::sync::Lazy;
use std::{fs, path::Path, path::PathBuf};

static CONFIG_ROOT: Lazy<PathBuf> = Lazy::new(|| {
    let base = config_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    base.join("event-scanner")
});

pub fn config_root() -> PathBuf {
    CONFIG_ROOT.clone()
}

/// `EVENT_SCANNER_CONFIG` wins over the per-user config directory.
pub fn config_path() -> PathBuf {
    match std::env::var("EVENT_SCANNER_CONFIG") {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path.trim()),
        _ => config_root().join("config.json"),
    }
}

pub fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

pub fn redact(secret: Option<&str>) -> String {
    match secret {
        Some(value) if value.chars().count() > 4 => {
            format!("{}…", value.chars().take(4).collect::<String>())
        }
        Some(_) => "****".to_string(),
        None => "<unset>".to_string(),
    }
}
