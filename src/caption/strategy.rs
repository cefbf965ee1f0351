use anyhow::{anyhow, Result};
use tracing::warn;

use super::font::GlyphFont;
use super::overlay::DrawDirective;

/// One string to draw with its baseline origin.
#[derive(Debug, Clone, Copy)]
pub struct TextPlacement<'a> {
    pub text: &'a str,
    pub x: i64,
    pub y: i64,
    pub font_size: i64,
}

pub trait TextRenderer {
    fn render(&self, placement: &TextPlacement<'_>) -> Result<DrawDirective>;
}

/// Glyph outlines from the font asset. Fails on empty outlines.
pub struct GlyphPathRenderer<'a> {
    font: &'a GlyphFont,
}

impl<'a> GlyphPathRenderer<'a> {
    pub fn new(font: &'a GlyphFont) -> Self {
        Self { font }
    }
}

impl TextRenderer for GlyphPathRenderer<'_> {
    fn render(&self, placement: &TextPlacement<'_>) -> Result<DrawDirective> {
        let d = self.font.text_path(
            placement.text,
            placement.x as f64,
            placement.y as f64,
            placement.font_size as f64,
        )?;
        if d.is_empty() {
            return Err(anyhow!("empty glyph path"));
        }
        Ok(DrawDirective::GlyphPath { d })
    }
}

pub struct PlainTextRenderer;

impl PlainTextRenderer {
    pub fn text_run(&self, placement: &TextPlacement<'_>) -> DrawDirective {
        DrawDirective::TextRun {
            x: placement.x,
            y: placement.y,
            font_size: placement.font_size,
            text: placement.text.to_string(),
        }
    }
}

impl TextRenderer for PlainTextRenderer {
    fn render(&self, placement: &TextPlacement<'_>) -> Result<DrawDirective> {
        Ok(self.text_run(placement))
    }
}

/// Glyph outlines when a font is loaded, plain text otherwise or when the
/// outline attempt fails. Decided per string, one fallback, no retry.
pub struct RenderChain<'a> {
    primary: Option<Box<dyn TextRenderer + 'a>>,
    fallback: PlainTextRenderer,
}

impl<'a> RenderChain<'a> {
    pub fn new(font: Option<&'a GlyphFont>) -> Self {
        Self {
            primary: font
                .map(|font| Box::new(GlyphPathRenderer::new(font)) as Box<dyn TextRenderer + 'a>),
            fallback: PlainTextRenderer,
        }
    }

    pub fn with_primary(primary: Box<dyn TextRenderer + 'a>) -> Self {
        Self {
            primary: Some(primary),
            fallback: PlainTextRenderer,
        }
    }

    pub fn render(&self, label: &str, placement: &TextPlacement<'_>) -> DrawDirective {
        if let Some(primary) = self.primary.as_ref() {
            match primary.render(placement) {
                Ok(directive) => return directive,
                Err(err) => warn!("{} path render failed: {:#}", label, err),
            }
        }
        self.fallback.text_run(placement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingRenderer;

    impl TextRenderer for FailingRenderer {
        fn render(&self, _placement: &TextPlacement<'_>) -> Result<DrawDirective> {
            Err(anyhow!("shaping failed"))
        }
    }

    struct FixedPathRenderer;

    impl TextRenderer for FixedPathRenderer {
        fn render(&self, _placement: &TextPlacement<'_>) -> Result<DrawDirective> {
            Ok(DrawDirective::GlyphPath {
                d: "M0 0Z".to_string(),
            })
        }
    }

    fn placement() -> TextPlacement<'static> {
        TextPlacement {
            text: "Sua",
            x: 60,
            y: 838,
            font_size: 36,
        }
    }

    #[test]
    fn without_font_renders_text_runs() {
        let chain = RenderChain::new(None);
        assert_eq!(
            chain.render("name", &placement()),
            DrawDirective::TextRun {
                x: 60,
                y: 838,
                font_size: 36,
                text: "Sua".to_string(),
            }
        );
    }

    #[test]
    fn failing_primary_falls_back_to_text() {
        let chain = RenderChain::with_primary(Box::new(FailingRenderer));
        assert!(matches!(
            chain.render("stat", &placement()),
            DrawDirective::TextRun { .. }
        ));
    }

    #[test]
    fn successful_primary_is_used() {
        let chain = RenderChain::with_primary(Box::new(FixedPathRenderer));
        assert_eq!(
            chain.render("line", &placement()),
            DrawDirective::GlyphPath {
                d: "M0 0Z".to_string()
            }
        );
    }
}
