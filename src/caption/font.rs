use anyhow::{anyhow, Context, Result};
use std::fmt::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};
use ttf_parser::{name_id, Face, GlyphId, OutlineBuilder};

/// A parsed font used to turn strings into filled outline paths.
#[derive(Clone)]
pub struct GlyphFont {
    data: Arc<Vec<u8>>,
    face_index: u32,
    units_per_em: u16,
    family: Option<String>,
}

impl GlyphFont {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("failed to read font: {}", path.display()))?;
        Self::from_data(data)
            .map_err(|err| anyhow!("failed to parse font: {} ({})", path.display(), err))
    }

    pub fn from_data(data: Vec<u8>) -> Result<Self> {
        let count = ttf_parser::fonts_in_collection(&data).unwrap_or(1);
        for index in 0..count {
            let Ok(face) = Face::parse(&data, index) else {
                continue;
            };
            let units_per_em = face.units_per_em().max(1);
            let family = extract_family_name(&face);
            return Ok(Self {
                data: Arc::new(data),
                face_index: index,
                units_per_em,
                family,
            });
        }
        Err(anyhow!("failed to parse font data"))
    }

    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    /// SVG path data for `text` with its baseline starting at (`x`, `y`).
    /// Characters without outlines (spaces) only advance the pen, so the
    /// result may be empty.
    pub fn text_path(&self, text: &str, x: f64, y: f64, font_size: f64) -> Result<String> {
        let face = Face::parse(&self.data, self.face_index)
            .map_err(|err| anyhow!("failed to parse font face: {}", err))?;
        let scale = font_size / self.units_per_em as f64;
        let mut builder = PathDataBuilder {
            out: String::new(),
            origin_x: x,
            origin_y: y,
            scale,
        };
        let mut pen_x = x;
        let mut previous: Option<GlyphId> = None;
        for ch in text.chars() {
            let glyph = face.glyph_index(ch).unwrap_or(GlyphId(0));
            if let Some(left) = previous {
                pen_x += kerning(&face, left, glyph) as f64 * scale;
            }
            builder.origin_x = pen_x;
            let _ = face.outline_glyph(glyph, &mut builder);
            let advance = face.glyph_hor_advance(glyph).unwrap_or(0);
            pen_x += advance as f64 * scale;
            previous = Some(glyph);
        }
        Ok(builder.out)
    }
}

/// Loads the glyph font when the asset exists. A missing or unreadable font
/// is not an error: callers fall back to plain text runs.
pub fn load_glyph_font(path: Option<&Path>) -> Option<GlyphFont> {
    let path = path?;
    if !path.is_file() {
        debug!(path = %path.display(), "font asset not found, using text fallback");
        return None;
    }
    match GlyphFont::load(path) {
        Ok(font) => Some(font),
        Err(err) => {
            warn!("font load failed: {:#}", err);
            None
        }
    }
}

fn kerning(face: &Face<'_>, left: GlyphId, right: GlyphId) -> i16 {
    face.tables()
        .kern
        .and_then(|kern| {
            kern.subtables
                .into_iter()
                .filter(|subtable| subtable.horizontal && !subtable.variable)
                .find_map(|subtable| subtable.glyphs_kerning(left, right))
        })
        .unwrap_or(0)
}

fn extract_family_name(face: &Face<'_>) -> Option<String> {
    let mut fallback = None;
    for name in face.names() {
        if name.name_id == name_id::TYPOGRAPHIC_FAMILY {
            if let Some(value) = name.to_string() {
                return Some(value);
            }
        } else if name.name_id == name_id::FAMILY && fallback.is_none() {
            fallback = name.to_string();
        }
    }
    fallback
}

/// Emits font-unit outlines as absolute SVG commands in image space
/// (y grows downwards from the baseline).
struct PathDataBuilder {
    out: String,
    origin_x: f64,
    origin_y: f64,
    scale: f64,
}

impl PathDataBuilder {
    fn point(&mut self, x: f32, y: f32) {
        let px = self.origin_x + x as f64 * self.scale;
        let py = self.origin_y - y as f64 * self.scale;
        let _ = write!(self.out, "{} {}", format_coord(px), format_coord(py));
    }
}

impl OutlineBuilder for PathDataBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        self.out.push('M');
        self.point(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.out.push('L');
        self.point(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.out.push('Q');
        self.point(x1, y1);
        self.out.push(' ');
        self.point(x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.out.push('C');
        self.point(x1, y1);
        self.out.push(' ');
        self.point(x2, y2);
        self.out.push(' ');
        self.point(x, y);
    }

    fn close(&mut self) {
        self.out.push('Z');
    }
}

/// Two decimals at most, trailing zeros dropped.
fn format_coord(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    format!("{}", rounded)
}

#[cfg(test)]
pub(crate) fn fixture_font() -> GlyphFont {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSans.ttf");
    GlyphFont::load(&path).unwrap()
}
