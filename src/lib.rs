use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

pub mod caption;
pub mod logging;
pub mod paths;
pub mod server;
pub mod settings;

use caption::{render_caption, CaptionParams, CaptionRequest, Compositor};

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub settings_path: Option<String>,
    pub addr: Option<String>,
    pub images_dir: Option<String>,
    pub font_path: Option<String>,
    pub render: Option<RenderConfig>,
}

/// One-shot render to a file instead of serving.
#[derive(Debug, Clone, Default)]
pub struct RenderConfig {
    pub output: String,
    pub params: CaptionParams,
}

pub async fn run(config: Config) -> Result<Option<String>> {
    let settings = load_settings_with_overrides(&config)?;
    if let Some(render) = config.render.as_ref() {
        let output = PathBuf::from(&render.output);
        let settings = settings.clone();
        let params = render.params.clone();
        let written = tokio::task::spawn_blocking(move || {
            render_to_file(&settings, &params, &output).map(|_| output)
        })
        .await
        .with_context(|| "render task failed")??;
        return Ok(Some(format!("wrote {}", written.display())));
    }
    server::run_server(settings).await?;
    Ok(None)
}

pub fn load_settings_with_overrides(config: &Config) -> Result<settings::Settings> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let mut settings = settings::load_settings(settings_path)?;
    if let Some(addr) = non_blank(config.addr.as_deref()) {
        settings.addr = addr.to_string();
    }
    if let Some(dir) = non_blank(config.images_dir.as_deref()) {
        settings.images_dir = dir.to_string();
    }
    if let Some(path) = non_blank(config.font_path.as_deref()) {
        settings.font_path = Some(path.to_string());
    }
    Ok(settings)
}

/// Renders the caption described by `params` and writes the encoded image
/// to `output`.
pub fn render_to_file(
    settings: &settings::Settings,
    params: &CaptionParams,
    output: &Path,
) -> Result<()> {
    let request = CaptionRequest::from_params(params, &settings.stat_options());
    let base_path = paths::image_asset_path(&settings.images_dir_path(), request.image_id);
    if !base_path.is_file() {
        return Err(anyhow!(
            "image not found: {}",
            paths::image_file_name(request.image_id)
        ));
    }
    let compositor = Compositor::new(settings.font_path_buf().as_deref());
    let bytes = render_caption(&base_path, &request, settings, &compositor)?;
    std::fs::write(output, bytes)
        .with_context(|| format!("failed to write image: {}", output.display()))?;
    Ok(())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
