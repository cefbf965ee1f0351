use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::{DynamicImage, ImageFormat, RgbaImage};
use resvg::render;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tiny_skia::Pixmap;
use tracing::{error, warn};
use usvg::{fontdb, Options, Tree};

use super::compose::build_overlay;
use super::font::{load_glyph_font, GlyphFont};
use super::overlay::{css_family_name, OverlayDocument};
use super::{CaptionRequest, ImageDimensions};
use crate::settings::Settings;

/// Rasterizes overlay markup and flattens it onto base images.
pub struct Compositor {
    fontdb: Arc<fontdb::Database>,
}

impl Compositor {
    /// System fonts plus the font asset at `font_path`, when it exists.
    pub fn new(font_path: Option<&Path>) -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        if let Some(path) = font_path.filter(|path| path.is_file()) {
            if let Err(err) = db.load_font_file(path) {
                warn!("failed to register font {}: {}", path.display(), err);
            }
        }
        Self {
            fontdb: Arc::new(db),
        }
    }

    pub fn rasterize(&self, svg: &str, dims: ImageDimensions) -> Result<RgbaImage> {
        let options = Options {
            fontdb: self.fontdb.clone(),
            ..Options::default()
        };
        let tree = Tree::from_str(svg, &options).with_context(|| "failed to parse overlay SVG")?;
        let mut pixmap = Pixmap::new(dims.width, dims.height)
            .ok_or_else(|| anyhow!("empty overlay size {}x{}", dims.width, dims.height))?;
        render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());
        let mut rgba = Vec::with_capacity(pixmap.data().len());
        for pixel in pixmap.pixels() {
            let color = pixel.demultiply();
            rgba.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
        }
        RgbaImage::from_raw(dims.width, dims.height, rgba)
            .ok_or_else(|| anyhow!("failed to build image buffer from overlay"))
    }

    /// Draws `svg` over the image at `base_path` and encodes as `output_mime`.
    pub fn composite(&self, base_path: &Path, svg: &str, output_mime: &str) -> Result<Vec<u8>> {
        let mut base = image::open(base_path)
            .with_context(|| format!("failed to decode image: {}", base_path.display()))?
            .to_rgba8();
        let (width, height) = base.dimensions();
        let overlay = self.rasterize(svg, ImageDimensions { width, height })?;
        image::imageops::overlay(&mut base, &overlay, 0, 0);
        encode_image(base, output_mime)
    }
}

pub fn read_dimensions(path: &Path) -> Result<ImageDimensions> {
    let (width, height) = image::image_dimensions(path)
        .with_context(|| format!("failed to read image metadata: {}", path.display()))?;
    Ok(ImageDimensions { width, height })
}

/// Full pipeline for one request: metadata, overlay layout, compositing.
pub fn render_caption(
    base_path: &Path,
    request: &CaptionRequest,
    settings: &Settings,
    compositor: &Compositor,
) -> Result<Vec<u8>> {
    let dims = read_dimensions(base_path)?;
    let font = load_glyph_font(settings.font_path_buf().as_deref());
    let family = font
        .as_ref()
        .and_then(|font| font.family())
        .unwrap_or(settings.font_family.as_str());
    let doc = build_overlay(
        request,
        dims,
        font.as_ref(),
        &font_family_list(family, &settings.fallback_families),
    );
    let svg = doc.to_svg();
    match compositor.composite(base_path, &svg, &settings.output_mime) {
        Ok(bytes) => Ok(bytes),
        Err(err) => {
            if let Some(path) = settings.debug_svg_path_buf() {
                write_debug_svg(&path, &doc, family, font.as_ref());
            }
            Err(err)
        }
    }
}

pub fn image_format_from_mime(mime: &str) -> Option<ImageFormat> {
    match mime {
        "image/png" => Some(ImageFormat::Png),
        "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
        _ => None,
    }
}

fn encode_image(image: RgbaImage, output_mime: &str) -> Result<Vec<u8>> {
    let format = image_format_from_mime(output_mime)
        .ok_or_else(|| anyhow!("unsupported output image mime '{}'", output_mime))?;
    let image = DynamicImage::ImageRgba8(image);
    let image = if format == ImageFormat::Jpeg {
        DynamicImage::ImageRgb8(image.to_rgb8())
    } else {
        image
    };
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), format)
        .with_context(|| "failed to encode captioned image")?;
    Ok(bytes)
}

fn font_family_list(primary: &str, fallbacks: &[String]) -> String {
    let mut families = vec![format!("'{}'", css_family_name(primary))];
    families.extend(fallbacks.iter().cloned());
    families.join(", ")
}

fn write_debug_svg(path: &Path, doc: &OverlayDocument, family: &str, font: Option<&GlyphFont>) {
    let svg = match font {
        Some(font) => doc.to_svg_with_embedded_font(family, &BASE64.encode(font.data())),
        None => doc.to_svg(),
    };
    match std::fs::write(path, svg) {
        Ok(()) => error!("compositing failed, overlay written to {}", path.display()),
        Err(err) => error!("failed to write debug overlay {}: {}", path.display(), err),
    }
}
