use super::ImageDimensions;

const BOX_MARGIN: i64 = 20;
const BOX_PADDING: i64 = 30;
const BOX_RADIUS: i64 = 15;
const TEXT_PADDING: i64 = 40;
const LINE_GAP: i64 = 8;
const BODY_GAP: i64 = 5;
const BODY_BOTTOM_INSET: i64 = 15;
const STAT_GAP: i64 = 40;
const STAT_RIGHT_INSET: i64 = 10;
const BOX_HEIGHT_RATIO: f64 = 0.20;
const NAME_SCALE: f64 = 1.3;
const NAME_ASCENT: f64 = 0.8;
const STAT_SCALE: f64 = 0.6;
const CHAR_WIDTH_RATIO: f64 = 0.55;

/// Caption box geometry derived from the base image size and font size.
/// All coordinates are in image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutGeometry {
    pub font_size: i64,
    pub name_size: i64,
    pub stat_font_size: i64,
    pub line_height: i64,
    pub box_x: i64,
    pub box_top: i64,
    pub box_width: i64,
    pub box_height: i64,
    pub box_radius: i64,
    pub text_x: i64,
    pub name_y: i64,
    pub body_start_y: i64,
    pub body_limit_y: i64,
    pub max_chars_per_line: i64,
    pub stat_x: i64,
}

impl LayoutGeometry {
    /// `name_chars` is the character count of the name label; the stat
    /// label is anchored to its right. Any positive `font_size` is accepted;
    /// coordinates saturate at the `i64` bounds.
    pub fn compute(dims: ImageDimensions, font_size: i64, name_chars: usize) -> Self {
        let width = dims.width as i64;
        let height = dims.height as i64;

        let font_size_f = font_size as f64;
        let name_size = (font_size_f * NAME_SCALE).floor() as i64;
        let stat_font_size = (name_size as f64 * STAT_SCALE).floor() as i64;
        let line_height = font_size.saturating_add(LINE_GAP);

        let box_height = (height as f64 * BOX_HEIGHT_RATIO).floor() as i64;
        let box_top = height - box_height - BOX_MARGIN;
        let box_width = width - BOX_MARGIN * 2;

        let name_ascent = (name_size as f64 * NAME_ASCENT).floor() as i64;
        let name_y = (box_top + BOX_PADDING).saturating_add(name_ascent);
        let body_start_y = name_y.saturating_add(line_height).saturating_add(BODY_GAP);

        let max_width = box_width - TEXT_PADDING * 2;
        let char_width = font_size_f * CHAR_WIDTH_RATIO;
        let max_chars_per_line = (max_width as f64 / char_width).floor() as i64;

        let name_offset = (name_chars as f64 * name_size as f64 * CHAR_WIDTH_RATIO).floor() as i64;
        let stat_anchor = (BOX_MARGIN + TEXT_PADDING)
            .saturating_add(name_offset)
            .saturating_add(STAT_GAP);
        let stat_max_x = BOX_MARGIN + box_width - TEXT_PADDING - STAT_RIGHT_INSET;

        Self {
            font_size,
            name_size,
            stat_font_size,
            line_height,
            box_x: BOX_MARGIN,
            box_top,
            box_width,
            box_height,
            box_radius: BOX_RADIUS,
            text_x: BOX_MARGIN + TEXT_PADDING,
            name_y,
            body_start_y,
            body_limit_y: box_top + box_height - BODY_BOTTOM_INSET,
            max_chars_per_line,
            stat_x: stat_anchor.min(stat_max_x),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyLine {
    pub text: String,
    pub y: i64,
}

/// Greedy character-count wrap. Not width-measured.
pub fn wrap_text(text: &str, max_chars: i64) -> Vec<String> {
    if text.is_empty() || max_chars <= 0 {
        return vec![text.to_string()];
    }
    let max_chars = max_chars as usize;
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut count = 0usize;
    for ch in text.chars() {
        if count >= max_chars {
            lines.push(std::mem::take(&mut current));
            count = 0;
        }
        current.push(ch);
        count += 1;
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Splits on `\n`, wraps each paragraph and assigns baselines. Lines whose
/// baseline reaches the bottom inset of the box are dropped.
pub fn layout_body(text: &str, geometry: &LayoutGeometry) -> Vec<BodyLine> {
    let mut lines = Vec::new();
    let mut y = geometry.body_start_y;
    for paragraph in text.split('\n') {
        if paragraph.is_empty() {
            continue;
        }
        for line in wrap_text(paragraph, geometry.max_chars_per_line) {
            if y >= geometry.body_limit_y {
                return lines;
            }
            lines.push(BodyLine { text: line, y });
            y = y.saturating_add(geometry.line_height);
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> ImageDimensions {
        ImageDimensions { width, height }
    }

    #[test]
    fn geometry_for_reference_image() {
        let geometry = LayoutGeometry::compute(dims(800, 1000), 28, 3);
        assert_eq!(geometry.name_size, 36);
        assert_eq!(geometry.stat_font_size, 21);
        assert_eq!(geometry.line_height, 36);
        assert_eq!(geometry.box_height, 200);
        assert_eq!(geometry.box_top, 780);
        assert_eq!(geometry.box_width, 760);
        assert_eq!(geometry.name_y, 838);
        assert_eq!(geometry.body_start_y, 879);
        assert_eq!(geometry.body_limit_y, 965);
        assert_eq!(geometry.max_chars_per_line, 44);
        assert_eq!(geometry.text_x, 60);
        // 60 + floor(3 * 36 * 0.55) + 40
        assert_eq!(geometry.stat_x, 159);
    }

    #[test]
    fn stat_anchor_is_clamped_inside_box() {
        let geometry = LayoutGeometry::compute(dims(800, 1000), 28, 200);
        assert_eq!(geometry.stat_x, 20 + 760 - 40 - 10);
    }

    #[test]
    fn short_text_is_not_wrapped() {
        assert_eq!(wrap_text("hello", 5), vec!["hello"]);
        assert_eq!(wrap_text("hello", 44), vec!["hello"]);
    }

    #[test]
    fn degenerate_inputs_are_returned_unchanged() {
        assert_eq!(wrap_text("hello", 0), vec!["hello"]);
        assert_eq!(wrap_text("hello", -4), vec!["hello"]);
        assert_eq!(wrap_text("", 10), vec![""]);
    }

    #[test]
    fn long_text_splits_into_full_width_lines() {
        let text = "abcdefghijklmnopqrstuvwxyz";
        for max in 1..text.len() as i64 {
            let lines = wrap_text(text, max);
            assert_eq!(lines.concat(), text);
            let (last, full) = lines.split_last().unwrap();
            assert!(full.iter().all(|line| line.chars().count() == max as usize));
            assert!(!last.is_empty() && last.chars().count() <= max as usize);
        }
    }

    #[test]
    fn wrap_counts_characters_not_bytes() {
        assert_eq!(wrap_text("가나다라마", 2), vec!["가나", "다라", "마"]);
    }

    #[test]
    fn explicit_newlines_make_separate_lines() {
        let geometry = LayoutGeometry::compute(dims(800, 1000), 28, 0);
        let lines = layout_body("Line one\nLine two", &geometry);
        assert_eq!(
            lines,
            vec![
                BodyLine {
                    text: "Line one".to_string(),
                    y: 879
                },
                BodyLine {
                    text: "Line two".to_string(),
                    y: 915
                },
            ]
        );
    }

    #[test]
    fn empty_paragraphs_are_skipped() {
        let geometry = LayoutGeometry::compute(dims(800, 1000), 28, 0);
        let lines = layout_body("a\n\n\nb", &geometry);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].y, geometry.body_start_y + geometry.line_height);
    }

    #[test]
    fn overflowing_lines_are_dropped() {
        let geometry = LayoutGeometry::compute(dims(800, 1000), 28, 0);
        let text = "x".repeat(44 * 10);
        let lines = layout_body(&text, &geometry);
        // 879 and 915 fit below 965; 951 also fits; 987 does not.
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|line| line.y < geometry.body_limit_y));
    }

    #[test]
    fn huge_font_sizes_saturate_instead_of_overflowing() {
        for size in [5_000_000_000_000_000_000, i64::MAX] {
            let geometry = LayoutGeometry::compute(dims(800, 1000), size, 3);
            assert!(geometry.name_size > 0);
            assert!(geometry.name_y > geometry.box_top);
            assert!(geometry.body_start_y >= geometry.body_limit_y);
            assert_eq!(geometry.max_chars_per_line, 0);
            assert_eq!(geometry.stat_x, 20 + 760 - 40 - 10);
            assert!(layout_body("Line one\nLine two", &geometry).is_empty());
        }
    }

    #[test]
    fn body_baselines_saturate_on_tall_layouts() {
        let geometry = LayoutGeometry {
            body_start_y: i64::MAX - 10,
            body_limit_y: i64::MAX,
            line_height: 100,
            max_chars_per_line: 0,
            ..LayoutGeometry::compute(dims(800, 1000), 28, 0)
        };
        let lines = layout_body("a\nb\nc", &geometry);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].y, i64::MAX - 10);
    }

    #[test]
    fn tiny_image_disables_wrapping() {
        let geometry = LayoutGeometry::compute(dims(60, 400), 28, 0);
        assert!(geometry.max_chars_per_line <= 0);
        assert_eq!(wrap_text("no wrap here", geometry.max_chars_per_line), vec!["no wrap here"]);
    }
}
