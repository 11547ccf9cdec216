//! The drawing surface the layout code talks to.
//!
//! Coordinates are millimetres measured from the top-left corner of the
//! current page, font sizes are points. `PdfCanvas` (in `pdf.rs`) writes a
//! real document; `RecordingCanvas` keeps a log of every primitive so layouts
//! can be inspected without decoding a PDF.

use crate::error::AppError;
use crate::metrics;
use crate::model::ImageAsset;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Current text state of a canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub weight: FontWeight,
    pub size: f32,
    pub color: (u8, u8, u8),
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            weight: FontWeight::Normal,
            size: 16.0,
            color: (0, 0, 0),
        }
    }
}

pub trait Canvas {
    fn page_width(&self) -> f32;
    fn page_height(&self) -> f32;

    fn set_line_width(&mut self, width_mm: f32);
    fn set_font(&mut self, weight: FontWeight);
    fn set_font_size(&mut self, size_pt: f32);
    fn set_text_color(&mut self, r: u8, g: u8, b: u8);
    fn text_style(&self) -> TextStyle;

    fn rect(&mut self, x: f32, y: f32, width: f32, height: f32);
    fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32);

    /// Draw a single line of text with its baseline at `y`.
    fn text(&mut self, text: &str, x: f32, y: f32, align: TextAlign);

    fn image(
        &mut self,
        image: &ImageAsset,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Result<(), AppError>;

    fn add_page(&mut self);

    fn apply_style(&mut self, style: TextStyle) {
        self.set_font(style.weight);
        self.set_font_size(style.size);
        let (r, g, b) = style.color;
        self.set_text_color(r, g, b);
    }

    fn string_width(&self, text: &str) -> f32 {
        let style = self.text_style();
        metrics::string_width(text, style.weight, style.size)
    }

    fn split_text_to_size(&self, text: &str, max_width: f32) -> Vec<String> {
        let style = self.text_style();
        metrics::wrap_text(text, max_width, style.weight, style.size)
    }

    fn line_height(&self) -> f32 {
        metrics::line_height(self.text_style().size)
    }

    /// Draw pre-wrapped lines, the first baseline at `y`.
    fn text_lines(&mut self, lines: &[String], x: f32, y: f32) {
        let step = self.line_height();
        for (i, line) in lines.iter().enumerate() {
            self.text(line, x, y + step * i as f32, TextAlign::Left);
        }
    }
}

/// Left edge of a run of text of `width` anchored at `x`.
pub fn aligned_x(x: f32, width: f32, align: TextAlign) -> f32 {
    match align {
        TextAlign::Left => x,
        TextAlign::Center => x - width / 2.0,
        TextAlign::Right => x - width,
    }
}

// ============================================================================
// Recording Canvas
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Rect { x: f32, y: f32, width: f32, height: f32 },
    Line { x1: f32, y1: f32, x2: f32, y2: f32 },
    Text { text: String, x: f32, y: f32, align: TextAlign, style: TextStyle },
    Image { name: String, x: f32, y: f32, width: f32, height: f32 },
    AddPage,
}

/// A primitive together with the 1-based page it was drawn on.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub page: usize,
    pub op: DrawOp,
}

/// Canvas that keeps every drawing call in order.
#[derive(Debug)]
pub struct RecordingCanvas {
    width: f32,
    height: f32,
    style: TextStyle,
    line_width: f32,
    page: usize,
    fail_images: bool,
    ops: Vec<Recorded>,
}

impl RecordingCanvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            style: TextStyle::default(),
            line_width: 0.2,
            page: 1,
            fail_images: false,
            ops: Vec::new(),
        }
    }

    /// Make every `image` call fail, as a broken embed would.
    pub fn with_failing_images(mut self) -> Self {
        self.fail_images = true;
        self
    }

    pub fn ops(&self) -> &[Recorded] {
        &self.ops
    }

    pub fn page_count(&self) -> usize {
        self.page
    }

    pub fn line_width(&self) -> f32 {
        self.line_width
    }

    /// All text draws as `(page, text, x, y)`.
    pub fn texts(&self) -> impl Iterator<Item = (usize, &str, f32, f32)> {
        self.ops.iter().filter_map(|r| match &r.op {
            DrawOp::Text { text, x, y, .. } => Some((r.page, text.as_str(), *x, *y)),
            _ => None,
        })
    }

    /// First draw of exactly `needle`, if any.
    pub fn find_text(&self, needle: &str) -> Option<(usize, f32, f32)> {
        self.texts()
            .find(|(_, text, _, _)| *text == needle)
            .map(|(page, _, x, y)| (page, x, y))
    }

    pub fn count_text(&self, needle: &str) -> usize {
        self.texts().filter(|(_, text, _, _)| *text == needle).count()
    }

    fn push(&mut self, op: DrawOp) {
        self.ops.push(Recorded { page: self.page, op });
    }
}

impl Canvas for RecordingCanvas {
    fn page_width(&self) -> f32 {
        self.width
    }

    fn page_height(&self) -> f32 {
        self.height
    }

    fn set_line_width(&mut self, width_mm: f32) {
        self.line_width = width_mm;
    }

    fn set_font(&mut self, weight: FontWeight) {
        self.style.weight = weight;
    }

    fn set_font_size(&mut self, size_pt: f32) {
        self.style.size = size_pt;
    }

    fn set_text_color(&mut self, r: u8, g: u8, b: u8) {
        self.style.color = (r, g, b);
    }

    fn text_style(&self) -> TextStyle {
        self.style
    }

    fn rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.push(DrawOp::Rect { x, y, width, height });
    }

    fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.push(DrawOp::Line { x1, y1, x2, y2 });
    }

    fn text(&mut self, text: &str, x: f32, y: f32, align: TextAlign) {
        let style = self.style;
        self.push(DrawOp::Text {
            text: text.to_string(),
            x,
            y,
            align,
            style,
        });
    }

    fn image(
        &mut self,
        image: &ImageAsset,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Result<(), AppError> {
        if self.fail_images {
            return Err(AppError::ImageError(format!("{}: embed refused", image.name())));
        }
        self.push(DrawOp::Image {
            name: image.name().to_string(),
            x,
            y,
            width,
            height,
        });
        Ok(())
    }

    fn add_page(&mut self) {
        self.page += 1;
        self.push(DrawOp::AddPage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_x() {
        assert_eq!(aligned_x(100.0, 20.0, TextAlign::Left), 100.0);
        assert_eq!(aligned_x(100.0, 20.0, TextAlign::Center), 90.0);
        assert_eq!(aligned_x(100.0, 20.0, TextAlign::Right), 80.0);
    }

    #[test]
    fn test_text_lines_step_by_line_height() {
        let mut canvas = RecordingCanvas::new(210.0, 297.0);
        canvas.set_font_size(10.0);
        let step = canvas.line_height();
        canvas.text_lines(&["a".to_string(), "b".to_string()], 10.0, 50.0);

        let (_, _, y_a) = canvas.find_text("a").unwrap();
        let (_, _, y_b) = canvas.find_text("b").unwrap();
        assert_eq!(y_a, 50.0);
        assert!((y_b - y_a - step).abs() < 1e-4);
    }

    #[test]
    fn test_ops_record_page_numbers() {
        let mut canvas = RecordingCanvas::new(210.0, 297.0);
        canvas.text("first", 0.0, 0.0, TextAlign::Left);
        canvas.add_page();
        canvas.text("second", 0.0, 0.0, TextAlign::Left);

        assert_eq!(canvas.page_count(), 2);
        assert_eq!(canvas.find_text("first").unwrap().0, 1);
        assert_eq!(canvas.find_text("second").unwrap().0, 2);
    }

    #[test]
    fn test_apply_style_restores_state() {
        let mut canvas = RecordingCanvas::new(210.0, 297.0);
        let saved = TextStyle {
            weight: FontWeight::Bold,
            size: 12.0,
            color: (10, 20, 30),
        };
        canvas.apply_style(saved);
        assert_eq!(canvas.text_style(), saved);
    }
}
