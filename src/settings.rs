use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::caption::{DecodePolicy, StatOptions};
use crate::paths;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone)]
pub struct Settings {
    pub addr: String,
    pub images_dir: String,
    pub cache_control: String,
    pub font_path: Option<String>,
    pub font_family: String,
    pub fallback_families: Vec<String>,
    pub output_mime: String,
    pub stat_max_len: usize,
    pub stat_decode: DecodePolicy,
    pub debug_svg_path: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:3000".to_string(),
            images_dir: "mg".to_string(),
            cache_control: "public, max-age=600".to_string(),
            font_path: Some("font/Nanum.ttf".to_string()),
            font_family: "Nanum".to_string(),
            fallback_families: vec!["Arial".to_string(), "sans-serif".to_string()],
            output_mime: "image/png".to_string(),
            stat_max_len: 400,
            stat_decode: DecodePolicy::Once,
            debug_svg_path: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    server: Option<ServerSettings>,
    font: Option<FontSettings>,
    output: Option<OutputSettings>,
    stat: Option<StatSettings>,
    debug: Option<DebugSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSettings {
    addr: Option<String>,
    images_dir: Option<String>,
    cache_control: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FontSettings {
    path: Option<String>,
    family: Option<String>,
    fallback_families: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct OutputSettings {
    mime: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StatSettings {
    max_len: Option<usize>,
    decode: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DebugSettings {
    svg_path: Option<String>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    let defaults: SettingsFile =
        toml::from_str(DEFAULT_SETTINGS_TOML).with_context(|| "failed to parse bundled settings")?;
    settings.merge(defaults)?;

    let mut ordered_paths = vec![
        PathBuf::from("settings.toml"),
        PathBuf::from("settings.local.toml"),
    ];

    if let Some(home) = paths::settings_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            settings
                .merge_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
        }
    }

    Ok(settings)
}

impl Settings {
    pub fn merge_str(&mut self, content: &str) -> Result<()> {
        let parsed: SettingsFile = toml::from_str(content)?;
        self.merge(parsed)
    }

    fn merge(&mut self, incoming: SettingsFile) -> Result<()> {
        if let Some(server) = incoming.server {
            if let Some(addr) = non_empty(server.addr) {
                self.addr = addr;
            }
            if let Some(dir) = non_empty(server.images_dir) {
                self.images_dir = dir;
            }
            if let Some(value) = non_empty(server.cache_control) {
                self.cache_control = value;
            }
        }
        if let Some(font) = incoming.font {
            if let Some(path) = non_empty(font.path) {
                self.font_path = Some(path);
            }
            if let Some(family) = non_empty(font.family) {
                self.font_family = family;
            }
            if let Some(families) = font.fallback_families {
                let families = families
                    .into_iter()
                    .filter(|family| !family.trim().is_empty())
                    .collect::<Vec<_>>();
                if !families.is_empty() {
                    self.fallback_families = families;
                }
            }
        }
        if let Some(output) = incoming.output {
            if let Some(mime) = non_empty(output.mime) {
                if crate::caption::image_format_from_mime(&mime).is_none() {
                    return Err(anyhow!("unsupported output mime '{}'", mime));
                }
                self.output_mime = mime;
            }
        }
        if let Some(stat) = incoming.stat {
            if let Some(max_len) = stat.max_len {
                if max_len > 0 {
                    self.stat_max_len = max_len;
                }
            }
            if let Some(decode) = non_empty(stat.decode) {
                self.stat_decode = decode.parse()?;
            }
        }
        if let Some(debug) = incoming.debug {
            if let Some(path) = debug.svg_path {
                let path = path.trim();
                self.debug_svg_path = if path.is_empty() {
                    None
                } else {
                    Some(path.to_string())
                };
            }
        }
        Ok(())
    }

    pub fn stat_options(&self) -> StatOptions {
        StatOptions {
            decode: self.stat_decode,
            max_len: self.stat_max_len,
        }
    }

    pub fn images_dir_path(&self) -> PathBuf {
        paths::expand_path(&self.images_dir)
    }

    pub fn font_path_buf(&self) -> Option<PathBuf> {
        self.font_path.as_deref().map(paths::expand_path)
    }

    pub fn debug_svg_path_buf(&self) -> Option<PathBuf> {
        self.debug_svg_path.as_deref().map(paths::expand_path)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
