//! Vertical layout cursor and the controller that opens and closes pages.
//!
//! Every page goes through the same life cycle: border drawn when the page is
//! opened, content laid out top to bottom, footer drawn when it is closed.
//! `Paginator` is the only place that appends pages, so each page gets
//! exactly one footer.

use crate::canvas::Canvas;
use crate::chrome::{draw_border, Footer};

/// Write position on the active page. Never moves up within a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutCursor {
    y: f32,
    page_index: usize,
    top: f32,
    limit: f32,
}

impl LayoutCursor {
    /// `limit` is the lowest y content may reach on any page.
    pub fn new(start_y: f32, top: f32, limit: f32) -> Self {
        Self {
            y: start_y,
            page_index: 1,
            top,
            limit,
        }
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    /// 1-based index of the active page.
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn top(&self) -> f32 {
        self.top
    }

    pub fn advance(&mut self, height: f32) {
        self.y += height.max(0.0);
    }

    pub fn remaining(&self) -> f32 {
        self.limit - self.y
    }

    pub fn fits(&self, height: f32) -> bool {
        self.y + height <= self.limit
    }

    pub fn at_top(&self) -> bool {
        self.y <= self.top
    }

    fn next_page(&mut self) {
        self.page_index += 1;
        self.y = self.top;
    }
}

/// Page and footer counts of a finished layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSummary {
    pub pages: usize,
    pub footers: usize,
}

pub struct Paginator<'a, C: Canvas> {
    canvas: &'a mut C,
    cursor: LayoutCursor,
    footer: Footer,
    footers: usize,
}

impl<'a, C: Canvas> Paginator<'a, C> {
    /// Take over the canvas's current (first) page and draw its border.
    pub fn begin(canvas: &'a mut C, footer: Footer, cursor: LayoutCursor) -> Self {
        draw_border(canvas);
        Self {
            canvas,
            cursor,
            footer,
            footers: 0,
        }
    }

    pub fn canvas(&mut self) -> &mut C {
        self.canvas
    }

    pub fn cursor(&self) -> LayoutCursor {
        self.cursor
    }

    pub fn y(&self) -> f32 {
        self.cursor.y
    }

    pub fn advance(&mut self, height: f32) {
        self.cursor.advance(height);
    }

    /// Move the cursor down to `y`; a target above the cursor is ignored.
    pub fn advance_to(&mut self, y: f32) {
        self.cursor.advance(y - self.cursor.y);
    }

    /// Start a new page unless `height` still fits on this one. A block taller
    /// than a whole page is left on a fresh page rather than breaking forever.
    /// Returns true when a page break happened.
    pub fn ensure_fits(&mut self, height: f32) -> bool {
        if self.cursor.fits(height) || self.cursor.at_top() {
            return false;
        }
        self.break_page();
        true
    }

    /// Start a new page regardless of the space left.
    pub fn force_break(&mut self) {
        self.break_page();
    }

    /// Close the last page and report what was produced.
    pub fn finish(mut self) -> PageSummary {
        self.close_page();
        PageSummary {
            pages: self.cursor.page_index,
            footers: self.footers,
        }
    }

    fn close_page(&mut self) {
        self.footer.draw(self.canvas);
        self.footers += 1;
    }

    fn break_page(&mut self) {
        self.close_page();
        let style = self.canvas.text_style();
        self.canvas.add_page();
        draw_border(self.canvas);
        self.canvas.apply_style(style);
        self.cursor.next_page();
        log::debug!(
            "Page break: now on page {} at y={:.1}mm",
            self.cursor.page_index,
            self.cursor.y
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DrawOp, FontWeight, RecordingCanvas};
    use crate::config::Institution;

    fn footer() -> Footer {
        Footer {
            identifier: "711521".to_string(),
            label: "Lab Record".to_string(),
            timestamp: "19/10/2026, 09:30:00".to_string(),
            credit: Institution::default().credit,
        }
    }

    #[test]
    fn test_cursor_advances_forward_only() {
        let mut cursor = LayoutCursor::new(60.0, 20.0, 277.0);
        cursor.advance(10.0);
        cursor.advance(-5.0);
        assert_eq!(cursor.y(), 70.0);
        assert_eq!(cursor.remaining(), 207.0);
        assert!(cursor.fits(207.0));
        assert!(!cursor.fits(207.5));
        assert!(!cursor.at_top());
    }

    #[test]
    fn test_ensure_fits_breaks_only_on_overflow() {
        let mut canvas = RecordingCanvas::new(210.0, 297.0);
        let mut pg = Paginator::begin(&mut canvas, footer(), LayoutCursor::new(250.0, 20.0, 277.0));

        assert!(!pg.ensure_fits(20.0));
        assert!(pg.ensure_fits(30.0));
        assert_eq!(pg.cursor().page_index(), 2);
        assert_eq!(pg.y(), 20.0);

        // Too tall for any page: stays on the fresh page
        assert!(!pg.ensure_fits(400.0));
        let summary = pg.finish();
        assert_eq!(summary, PageSummary { pages: 2, footers: 2 });
        assert_eq!(canvas.page_count(), 2);
    }

    #[test]
    fn test_one_footer_and_border_per_page() {
        let mut canvas = RecordingCanvas::new(210.0, 297.0);
        let mut pg = Paginator::begin(&mut canvas, footer(), LayoutCursor::new(60.0, 20.0, 277.0));
        pg.force_break();
        pg.force_break();
        let summary = pg.finish();

        assert_eq!(summary.pages, 3);
        assert_eq!(summary.footers, 3);
        assert_eq!(canvas.count_text("Lab Record"), 3);
        for page in 1..=3 {
            let footers = canvas
                .texts()
                .filter(|(p, text, _, _)| *p == page && *text == "Lab Record")
                .count();
            let borders = canvas
                .ops()
                .iter()
                .filter(|r| r.page == page && matches!(r.op, DrawOp::Rect { x, .. } if x == 6.0))
                .count();
            assert_eq!((footers, borders), (1, 1), "page {}", page);
        }
    }

    #[test]
    fn test_break_keeps_text_style() {
        let mut canvas = RecordingCanvas::new(210.0, 297.0);
        canvas.set_font(FontWeight::Bold);
        canvas.set_font_size(11.0);
        let mut pg = Paginator::begin(&mut canvas, footer(), LayoutCursor::new(60.0, 20.0, 277.0));
        pg.force_break();
        let style = pg.canvas().text_style();
        assert_eq!(style.weight, FontWeight::Bold);
        assert_eq!(style.size, 11.0);
        pg.finish();
    }

    #[test]
    fn test_advance_to_ignores_upward_moves() {
        let mut canvas = RecordingCanvas::new(210.0, 297.0);
        let mut pg = Paginator::begin(&mut canvas, footer(), LayoutCursor::new(60.0, 20.0, 277.0));
        pg.advance_to(100.0);
        pg.advance_to(80.0);
        assert_eq!(pg.y(), 100.0);
        pg.finish();
    }
}
