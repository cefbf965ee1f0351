use super::font::GlyphFont;
use super::layout::{layout_body, LayoutGeometry};
use super::overlay::{DrawDirective, OverlayDocument};
use super::strategy::{RenderChain, TextPlacement};
use super::{CaptionRequest, ImageDimensions};

/// Lays out the caption box, name, stat and body for `request` over an
/// image of `dims`. Never fails: strings the font cannot draw become text runs.
pub fn build_overlay(
    request: &CaptionRequest,
    dims: ImageDimensions,
    font: Option<&GlyphFont>,
    font_families: &str,
) -> OverlayDocument {
    let geometry = LayoutGeometry::compute(dims, request.font_size, request.name.chars().count());
    let chain = RenderChain::new(font);
    let mut doc = OverlayDocument::new(dims, font_families);

    doc.push(DrawDirective::Rect {
        x: geometry.box_x,
        y: geometry.box_top,
        width: geometry.box_width,
        height: geometry.box_height,
        radius: geometry.box_radius,
    });

    if !request.name.is_empty() {
        doc.push(chain.render(
            "name",
            &TextPlacement {
                text: &request.name,
                x: geometry.text_x,
                y: geometry.name_y,
                font_size: geometry.name_size,
            },
        ));
    }

    doc.push(chain.render(
        "stat",
        &TextPlacement {
            text: &request.stat,
            x: geometry.stat_x,
            y: geometry.name_y,
            font_size: geometry.stat_font_size,
        },
    ));

    for line in layout_body(&request.body_text, &geometry) {
        doc.push(chain.render(
            "line",
            &TextPlacement {
                text: &line.text,
                x: geometry.text_x,
                y: line.y,
                font_size: geometry.font_size,
            },
        ));
    }

    doc
}
