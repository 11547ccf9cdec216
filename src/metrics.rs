//! String measurement and line wrapping for the built-in Helvetica faces.
//!
//! Widths come from the standard Adobe AFM tables, in 1/1000 em. All
//! public functions take font sizes in points and return millimetres so the
//! layout code never has to think about PDF units.

use crate::canvas::FontWeight;

/// Points to millimetres.
pub const PT_TO_MM: f32 = 25.4 / 72.0;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.15;

/// Width used for characters outside the printable ASCII range.
const FALLBACK_WIDTH: u16 = 556;

// Printable ASCII, 0x20 (space) through 0x7E (tilde).
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    278, 278, 584, 584, 584, 556, 1015,
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    278, 278, 278, 469, 556, 333,
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

fn char_units(c: char, weight: FontWeight) -> u16 {
    let table = match weight {
        FontWeight::Normal => &HELVETICA,
        FontWeight::Bold => &HELVETICA_BOLD,
    };
    match c {
        ' '..='~' => table[c as usize - 0x20],
        '\u{2013}' => 556,
        '\u{2014}' | '\u{2026}' | '\u{2122}' => 1000,
        '\u{2018}' | '\u{2019}' => if weight == FontWeight::Bold { 278 } else { 222 },
        '\u{00A9}' | '\u{00AE}' => 737,
        '\u{00B0}' => 400,
        _ => FALLBACK_WIDTH,
    }
}

/// Width of `text` in em units (1/1000), before font size is applied.
pub fn string_units(text: &str, weight: FontWeight) -> u32 {
    text.chars().map(|c| char_units(c, weight) as u32).sum()
}

/// Width of `text` in millimetres at `size_pt`.
pub fn string_width(text: &str, weight: FontWeight, size_pt: f32) -> f32 {
    string_units(text, weight) as f32 / 1000.0 * size_pt * PT_TO_MM
}

/// Distance between consecutive baselines, in millimetres.
pub fn line_height(size_pt: f32) -> f32 {
    size_pt * LINE_HEIGHT_FACTOR * PT_TO_MM
}

/// Break `text` into lines no wider than `max_width` millimetres.
///
/// Explicit newlines always start a new line and an empty paragraph yields
/// an empty line, so the result is never empty. Words wider than the limit
/// are split between characters.
pub fn wrap_text(text: &str, max_width: f32, weight: FontWeight, size_pt: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let paragraph = paragraph.trim_end_matches('\r');
        if max_width <= 0.0 {
            lines.push(paragraph.to_string());
            continue;
        }

        let space = string_width(" ", weight, size_pt);
        let mut current = String::new();
        let mut current_width = 0.0;

        for word in paragraph.split_whitespace() {
            let word_width = string_width(word, weight, size_pt);

            if !current.is_empty() && current_width + space + word_width <= max_width {
                current.push(' ');
                current.push_str(word);
                current_width += space + word_width;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if word_width <= max_width {
                current.push_str(word);
                current_width = word_width;
            } else {
                current_width = 0.0;
                for c in word.chars() {
                    let w = string_width(c.encode_utf8(&mut [0; 4]), weight, size_pt);
                    if !current.is_empty() && current_width + w > max_width {
                        lines.push(std::mem::take(&mut current));
                        current_width = 0.0;
                    }
                    current.push(c);
                    current_width += w;
                }
            }
        }

        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_width_hello() {
        // H=722, e=556, l=222, l=222, o=556 = 2278 units at 12pt
        let width = string_width("Hello", FontWeight::Normal, 12.0);
        assert!((width - 2.278 * 12.0 * PT_TO_MM).abs() < 0.001);
    }

    #[test]
    fn test_bold_is_wider() {
        let regular = string_width("Budget", FontWeight::Normal, 10.0);
        let bold = string_width("Budget", FontWeight::Bold, 10.0);
        assert!(bold > regular);
    }

    #[test]
    fn test_wrap_respects_width() {
        let text = "The department requests approval to conduct a two day technical symposium for final year students";
        let lines = wrap_text(text, 50.0, FontWeight::Normal, 10.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(string_width(line, FontWeight::Normal, 10.0) <= 50.0);
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_wrap_is_idempotent() {
        let text = "Seminar on embedded systems\n\nvenue: main auditorium, seating for 300";
        let first = wrap_text(text, 40.0, FontWeight::Normal, 10.0);
        let second = wrap_text(text, 40.0, FontWeight::Normal, 10.0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_wrap_keeps_blank_paragraphs() {
        let lines = wrap_text("one\r\n\r\ntwo", 100.0, FontWeight::Normal, 10.0);
        assert_eq!(lines, vec!["one", "", "two"]);
    }

    #[test]
    fn test_wrap_empty_text_yields_one_line() {
        assert_eq!(wrap_text("", 100.0, FontWeight::Normal, 10.0), vec![String::new()]);
    }

    #[test]
    fn test_wrap_splits_long_word() {
        let word = "W".repeat(40);
        let lines = wrap_text(&word, 20.0, FontWeight::Bold, 10.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
        for line in &lines {
            assert!(string_width(line, FontWeight::Bold, 10.0) <= 20.0);
        }
    }
}
