use std::path::{Path, PathBuf};

const BASE_DIR_ENV: &str = "CAPTION_SERVER_DIR";

pub(crate) fn settings_dir() -> Option<PathBuf> {
    if let Some(dir) = base_dir_override() {
        return Some(dir);
    }
    default_base_dir()
}

/// Base image for a numeric id: `<dir>/<id>.jpg`.
pub fn image_asset_path(dir: &Path, image_id: i64) -> PathBuf {
    dir.join(image_file_name(image_id))
}

pub fn image_file_name(image_id: i64) -> String {
    format!("{}.jpg", image_id)
}

pub(crate) fn expand_path(value: &str) -> PathBuf {
    let home = std::env::var("HOME").ok();
    normalize_path(PathBuf::from(expand_tilde(value.trim(), home.as_deref())))
}

fn base_dir_override() -> Option<PathBuf> {
    std::env::var(BASE_DIR_ENV).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(expand_path(trimmed))
        }
    })
}

fn default_base_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".caption-server"))
        }
    })
}

fn normalize_path(path: PathBuf) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        normalized.push(component.as_os_str());
    }
    normalized
}

fn expand_tilde(value: &str, home: Option<&str>) -> String {
    if value == "~" || value.starts_with("~/") {
        if let Some(home) = home {
            let home = home.trim();
            if home.is_empty() {
                return value.to_string();
            }
            if value == "~" {
                return home.to_string();
            }
            return format!("{}{}", home, &value[1..]);
        }
    }
    value.to_string()
}
