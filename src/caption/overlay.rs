use super::normalize::escape_xml;
use super::ImageDimensions;

const BOX_FILL: &str = "black";
const BOX_OPACITY: &str = "0.6";
const TEXT_FILL: &str = "white";

#[derive(Debug, Clone, PartialEq)]
pub enum DrawDirective {
    Rect {
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        radius: i64,
    },
    /// Filled glyph outlines; `d` is SVG path data.
    GlyphPath { d: String },
    /// Unescaped text drawn with the fallback font family.
    TextRun {
        x: i64,
        y: i64,
        font_size: i64,
        text: String,
    },
}

/// Ordered draw directives for one caption, serialized to SVG markup.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayDocument {
    dims: ImageDimensions,
    font_families: String,
    directives: Vec<DrawDirective>,
}

impl OverlayDocument {
    pub fn new(dims: ImageDimensions, font_families: impl Into<String>) -> Self {
        Self {
            dims,
            font_families: font_families.into(),
            directives: Vec::new(),
        }
    }

    pub fn push(&mut self, directive: DrawDirective) {
        self.directives.push(directive);
    }

    pub fn directives(&self) -> &[DrawDirective] {
        &self.directives
    }

    pub fn to_svg(&self) -> String {
        self.serialize(None)
    }

    /// Standalone markup with the font asset inlined as a base64 `@font-face`,
    /// for viewing the overlay outside the renderer.
    pub fn to_svg_with_embedded_font(&self, family: &str, font_base64: &str) -> String {
        let font_face = format!(
            "@font-face {{ font-family: '{}'; src: url('data:font/truetype;charset=utf-8;base64,{}') format('truetype'); }}",
            escape_xml(&css_family_name(family)),
            font_base64
        );
        self.serialize(Some(&font_face))
    }

    fn serialize(&self, font_face: Option<&str>) -> String {
        let mut svg = String::new();
        svg.push_str(&format!(
            r#"<svg width="{w}" height="{h}" xmlns="http://www.w3.org/2000/svg">"#,
            w = self.dims.width,
            h = self.dims.height
        ));
        svg.push('\n');
        svg.push_str("<defs><style>");
        if let Some(font_face) = font_face {
            svg.push_str(font_face);
            svg.push(' ');
        }
        svg.push_str(&format!(
            ".text {{ font-family: {}; font-weight: bold; }} .shadow {{ filter: drop-shadow(2px 2px 4px rgba(0,0,0,0.8)); }}",
            escape_xml(&self.font_families)
        ));
        svg.push_str("</style></defs>\n");
        for directive in &self.directives {
            push_directive(&mut svg, directive);
            svg.push('\n');
        }
        svg.push_str("</svg>");
        svg
    }
}

/// Drops quotes and backslashes so the name can sit inside single quotes.
pub(crate) fn css_family_name(name: &str) -> String {
    name.chars()
        .filter(|ch| !matches!(ch, '\'' | '"' | '\\'))
        .collect()
}

fn push_directive(svg: &mut String, directive: &DrawDirective) {
    match directive {
        DrawDirective::Rect {
            x,
            y,
            width,
            height,
            radius,
        } => svg.push_str(&format!(
            r#"<rect x="{x}" y="{y}" width="{w}" height="{h}" rx="{r}" ry="{r}" fill="{fill}" opacity="{opacity}"/>"#,
            x = x,
            y = y,
            w = width,
            h = height,
            r = radius,
            fill = BOX_FILL,
            opacity = BOX_OPACITY
        )),
        DrawDirective::GlyphPath { d } => svg.push_str(&format!(
            r#"<path d="{d}" fill="{fill}"/>"#,
            d = d,
            fill = TEXT_FILL
        )),
        DrawDirective::TextRun {
            x,
            y,
            font_size,
            text,
        } => svg.push_str(&format!(
            r#"<text x="{x}" y="{y}" font-size="{size}" fill="{fill}" class="text shadow">{text}</text>"#,
            x = x,
            y = y,
            size = font_size,
            fill = TEXT_FILL,
            text = escape_xml(text)
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> OverlayDocument {
        OverlayDocument::new(
            ImageDimensions {
                width: 100,
                height: 50,
            },
            "'Nanum', Arial, sans-serif",
        )
    }

    #[test]
    fn text_runs_are_escaped() {
        let mut doc = document();
        doc.push(DrawDirective::TextRun {
            x: 1,
            y: 2,
            font_size: 3,
            text: "<b>&'\"".to_string(),
        });
        let svg = doc.to_svg();
        assert!(svg.contains(
            r#"<text x="1" y="2" font-size="3" fill="white" class="text shadow">&lt;b&gt;&amp;&apos;&quot;</text>"#
        ));
    }

    #[test]
    fn directives_keep_insertion_order() {
        let mut doc = document();
        doc.push(DrawDirective::Rect {
            x: 0,
            y: 0,
            width: 10,
            height: 10,
            radius: 2,
        });
        doc.push(DrawDirective::GlyphPath {
            d: "M0 0L1 1Z".to_string(),
        });
        let svg = doc.to_svg();
        let rect = svg.find("<rect").unwrap();
        let path = svg.find("<path").unwrap();
        assert!(rect < path);
        assert!(svg.starts_with(r#"<svg width="100" height="50""#));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(doc.directives().len(), 2);
    }

    #[test]
    fn embedded_font_adds_font_face_rule() {
        let doc = document();
        assert!(!doc.to_svg().contains("@font-face"));
        let svg = doc.to_svg_with_embedded_font("Nanum", "AAAA");
        assert!(svg.contains("@font-face { font-family: 'Nanum'; src: url('data:font/truetype;charset=utf-8;base64,AAAA')"));
        let svg = doc.to_svg_with_embedded_font("It's Nanum", "AAAA");
        assert!(svg.contains("font-family: 'Its Nanum';"));
    }
}
