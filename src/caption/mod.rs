mod compose;
mod font;
mod layout;
mod normalize;
mod overlay;
mod render;
mod strategy;

pub use compose::build_overlay;
pub use font::{load_glyph_font, GlyphFont};
pub use layout::{layout_body, wrap_text, BodyLine, LayoutGeometry};
pub use normalize::{
    decode_once, decode_strict, escape_xml, has_percent_escape, normalize_stat,
    truncate_with_ellipsis, DecodePolicy,
};
pub use overlay::{DrawDirective, OverlayDocument};
pub use render::{image_format_from_mime, read_dimensions, render_caption, Compositor};
pub use strategy::{GlyphPathRenderer, PlainTextRenderer, RenderChain, TextPlacement, TextRenderer};

pub const DEFAULT_IMAGE_ID: i64 = 1;
pub const DEFAULT_BODY_TEXT: &str = "안녕하세요";
pub const DEFAULT_STAT: &str = "stat";
pub const DEFAULT_FONT_SIZE: i64 = 28;

/// Raw caption parameters as they arrive from a query string or the CLI.
#[derive(Debug, Clone, Default)]
pub struct CaptionParams {
    pub img: Option<String>,
    pub text: Option<String>,
    pub name: Option<String>,
    pub stat: Option<String>,
    pub size: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatOptions {
    pub decode: DecodePolicy,
    pub max_len: usize,
}

impl Default for StatOptions {
    fn default() -> Self {
        Self {
            decode: DecodePolicy::Once,
            max_len: 400,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionRequest {
    pub image_id: i64,
    pub body_text: String,
    pub name: String,
    pub stat: String,
    pub font_size: i64,
}

impl Default for CaptionRequest {
    fn default() -> Self {
        Self {
            image_id: DEFAULT_IMAGE_ID,
            body_text: DEFAULT_BODY_TEXT.to_string(),
            name: String::new(),
            stat: DEFAULT_STAT.to_string(),
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

impl CaptionRequest {
    /// Applies defaults and stat normalization. Never fails.
    pub fn from_params(params: &CaptionParams, options: &StatOptions) -> Self {
        let image_id = parse_int_lenient(params.img.as_deref())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_IMAGE_ID);
        let font_size = parse_int_lenient(params.size.as_deref())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_FONT_SIZE);
        let body_text = non_empty(params.text.as_deref())
            .unwrap_or(DEFAULT_BODY_TEXT)
            .to_string();
        let name = params.name.clone().unwrap_or_default();
        let stat_raw = non_empty(params.stat.as_deref()).unwrap_or(DEFAULT_STAT);
        let stat = normalize_stat(stat_raw, options.decode, options.max_len);
        Self {
            image_id,
            body_text,
            name,
            stat,
            font_size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// Leading-digits integer parse: optional whitespace and sign, then digits.
/// Returns `None` when no digits lead the value or the number overflows.
pub fn parse_int_lenient(value: Option<&str>) -> Option<i64> {
    let value = value?.trim_start();
    let (negative, digits) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };
    let end = digits
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let parsed = digits[..end].parse::<i64>().ok()?;
    Some(if negative { -parsed } else { parsed })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}
