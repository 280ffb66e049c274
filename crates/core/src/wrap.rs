//! Greedy word wrapping and line placement for text overlays.
//!
//! The export compositor wraps each overlay's text to its pixel width
//! before drawing. Measurement is behind the [`TextMeasurer`] seam so the
//! algorithm stays independent of any particular shaping engine; the
//! production measurer lives in the export crate.

/// Line height as a multiple of the computed font pixel size.
pub const LINE_HEIGHT_FACTOR: f64 = 1.2;

/// Measures rendered text width in pixels.
pub trait TextMeasurer {
    fn measure(&self, text: &str, font: &str, font_px: f64) -> f64;
}

/// Greedily wrap `text` to `max_width_px`.
///
/// Words are appended to the current line until adding the next word would
/// exceed the target width, then the line breaks. A single word wider than
/// the target gets its own line rather than being split. Whitespace runs
/// collapse to single spaces.
pub fn wrap_text(
    measurer: &dyn TextMeasurer,
    text: &str,
    font: &str,
    font_px: f64,
    max_width_px: f64,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if !current.is_empty() && measurer.measure(&candidate, font, font_px) > max_width_px {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// A wrapped line positioned in pixel space.
///
/// `center_x_px` is the line's horizontal center; `top_y_px` its top edge.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub center_x_px: f64,
    pub top_y_px: f64,
}

/// Stack wrapped lines below a top-center anchor with
/// [`LINE_HEIGHT_FACTOR`] spacing.
pub fn place_lines(lines: Vec<String>, anchor_center_x: f64, anchor_top_y: f64, font_px: f64) -> Vec<PlacedLine> {
    let line_height = font_px * LINE_HEIGHT_FACTOR;
    lines
        .into_iter()
        .enumerate()
        .map(|(index, text)| PlacedLine {
            text,
            center_x_px: anchor_center_x,
            top_y_px: anchor_top_y + index as f64 * line_height,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Fixed-advance measurer: every character is `advance` px wide.
    struct FixedAdvance {
        advance: f64,
    }

    impl TextMeasurer for FixedAdvance {
        fn measure(&self, text: &str, _font: &str, _font_px: f64) -> f64 {
            text.chars().count() as f64 * self.advance
        }
    }

    const FONT: &str = "Bebas Neue";

    #[test]
    fn short_text_stays_on_one_line() {
        let m = FixedAdvance { advance: 10.0 };
        let lines = wrap_text(&m, "hello", FONT, 16.0, 200.0);
        assert_eq!(lines, vec!["hello"]);
    }

    #[test]
    fn long_text_wraps_to_multiple_lines() {
        let m = FixedAdvance { advance: 10.0 };
        // 10 chars per line max; "taste the stars tonight" cannot fit one line.
        let lines = wrap_text(&m, "taste the stars tonight", FONT, 16.0, 100.0);
        assert!(lines.len() >= 2);
    }

    #[test]
    fn no_wrapped_line_exceeds_target_width() {
        let m = FixedAdvance { advance: 10.0 };
        let lines = wrap_text(&m, "one two three four five six", FONT, 16.0, 90.0);
        for line in &lines {
            assert!(
                m.measure(line, FONT, 16.0) <= 90.0,
                "line '{line}' exceeds width"
            );
        }
    }

    #[test]
    fn wrap_preserves_all_words_in_order() {
        let m = FixedAdvance { advance: 10.0 };
        let text = "one two three four five six";
        let lines = wrap_text(&m, text, FONT, 16.0, 90.0);
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn oversized_single_word_gets_own_line() {
        let m = FixedAdvance { advance: 10.0 };
        let lines = wrap_text(&m, "a incomprehensibilities b", FONT, 16.0, 50.0);
        assert_eq!(
            lines,
            vec!["a", "incomprehensibilities", "b"],
        );
    }

    #[test]
    fn empty_text_produces_no_lines() {
        let m = FixedAdvance { advance: 10.0 };
        assert!(wrap_text(&m, "", FONT, 16.0, 100.0).is_empty());
        assert!(wrap_text(&m, "   ", FONT, 16.0, 100.0).is_empty());
    }

    #[test]
    fn whitespace_runs_collapse() {
        let m = FixedAdvance { advance: 10.0 };
        let lines = wrap_text(&m, "a  b\tc", FONT, 16.0, 200.0);
        assert_eq!(lines, vec!["a b c"]);
    }

    // -- placement --

    #[test]
    fn lines_stack_at_1_2_line_height() {
        let placed = place_lines(
            vec!["one".to_string(), "two".to_string(), "three".to_string()],
            960.0,
            810.0,
            100.0,
        );
        assert_eq!(placed[0].top_y_px, 810.0);
        assert_eq!(placed[1].top_y_px, 930.0);
        assert_eq!(placed[2].top_y_px, 1050.0);
        assert!(placed.iter().all(|l| l.center_x_px == 960.0));
    }

    #[test]
    fn placement_of_empty_lines_is_empty() {
        assert!(place_lines(Vec::new(), 0.0, 0.0, 10.0).is_empty());
    }
}
