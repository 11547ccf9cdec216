//! Page chrome: outer border, institutional header block and footer.

use crate::canvas::{Canvas, FontWeight, TextAlign};
use crate::config::{CreditSegment, Institution};
use crate::error::RenderWarning;
use crate::model::ImageAsset;

// ============================================================================
// Constants
// ============================================================================

/// Border inset from every page edge, in mm
pub const MARGIN_MM: f32 = 6.0;
const BORDER_LINE_WIDTH: f32 = 0.6;

const HEADER_TOP: f32 = MARGIN_MM + 4.0;
const HEADER_HEIGHT: f32 = 38.0;
const LOGO_COL_WIDTH: f32 = 40.0;
const RIGHT_COL_WIDTH: f32 = 60.0;
/// Row hanging below the header block (academic year / identity value)
const EXTENSION_ROW_HEIGHT: f32 = 8.0;

/// Logo box inside the logo cell, relative to the cell's top-left corner
const LOGO_OFFSET_X: f32 = 6.0;
const LOGO_OFFSET_Y: f32 = 8.0;
const LOGO_MAX_WIDTH: f32 = 28.0;
const LOGO_MAX_HEIGHT: f32 = 22.0;

const FOOTER_FONT_SIZE: f32 = 8.0;
const CREDIT_FONT_SIZE: f32 = 7.0;
const FOOTER_TEXT_COLOR: (u8, u8, u8) = (90, 90, 90);

/// Y coordinate just below the header block, including its extension row.
pub const HEADER_BOTTOM: f32 = HEADER_TOP + HEADER_HEIGHT + EXTENSION_ROW_HEIGHT;

// ============================================================================
// Border
// ============================================================================

pub fn draw_border<C: Canvas>(canvas: &mut C) {
    let width = canvas.page_width();
    let height = canvas.page_height();
    canvas.set_line_width(BORDER_LINE_WIDTH);
    canvas.rect(
        MARGIN_MM,
        MARGIN_MM,
        width - MARGIN_MM * 2.0,
        height - MARGIN_MM * 2.0,
    );
}

// ============================================================================
// Header Block
// ============================================================================

/// Texts for the three-column header. Geometry is fixed; only the words vary
/// between document kinds.
#[derive(Debug, Clone)]
pub struct HeaderBlock {
    pub institute: String,
    pub location: String,
    pub category: String,
    pub title: String,
    pub year_line: String,
    pub doc_ref: String,
    pub date_label: String,
    pub date: String,
    pub identity_label: String,
    pub identity_value: String,
}

impl HeaderBlock {
    /// Header with the institution's name and location filled in.
    pub fn for_institution(institution: &Institution) -> Self {
        Self {
            institute: institution.name.clone(),
            location: institution.location.clone(),
            category: String::new(),
            title: String::new(),
            year_line: String::new(),
            doc_ref: String::new(),
            date_label: String::new(),
            date: String::new(),
            identity_label: String::new(),
            identity_value: String::new(),
        }
    }

    /// Draw the header. A logo that fails to embed is reported, not fatal.
    pub fn draw<C: Canvas>(&self, canvas: &mut C, logo: Option<&ImageAsset>) -> Option<RenderWarning> {
        let page_width = canvas.page_width();
        let middle_width = page_width - MARGIN_MM * 2.0 - LOGO_COL_WIDTH - RIGHT_COL_WIDTH;
        let top = HEADER_TOP;

        canvas.set_line_width(0.4);

        // Logo cell
        canvas.rect(MARGIN_MM, top, LOGO_COL_WIDTH, HEADER_HEIGHT);
        let warning = logo.and_then(|logo| {
            let (w, h) = fit_logo(logo);
            let x = MARGIN_MM + LOGO_OFFSET_X + (LOGO_MAX_WIDTH - w) / 2.0;
            let y = top + LOGO_OFFSET_Y + (LOGO_MAX_HEIGHT - h) / 2.0;
            canvas
                .image(logo, x, y, w, h)
                .err()
                .map(|e| RenderWarning::LogoEmbed(e.to_string()))
        });

        // Middle cell: four equal rows
        let middle_x = MARGIN_MM + LOGO_COL_WIDTH;
        let middle_center = middle_x + middle_width / 2.0;
        let row_h = HEADER_HEIGHT / 4.0;
        let middle_rows = [
            (&self.institute, 11.0, FontWeight::Bold),
            (&self.location, 9.0, FontWeight::Normal),
            (&self.category, 10.0, FontWeight::Bold),
            (&self.title, 10.0, FontWeight::Bold),
        ];
        for (i, (text, size, weight)) in middle_rows.into_iter().enumerate() {
            let row_top = top + row_h * i as f32;
            canvas.rect(middle_x, row_top, middle_width, row_h);
            canvas.set_font_size(size);
            canvas.set_font(weight);
            canvas.text(text, middle_center, row_top + row_h / 2.0 + 1.5, TextAlign::Center);
        }

        // Academic year row below the middle cell
        canvas.rect(middle_x, top + HEADER_HEIGHT, middle_width, EXTENSION_ROW_HEIGHT);
        canvas.set_font_size(9.0);
        canvas.set_font(FontWeight::Bold);
        canvas.text(&self.year_line, middle_center, top + HEADER_HEIGHT + 5.5, TextAlign::Center);

        // Right cell: three equal rows
        let right_x = middle_x + middle_width;
        let right_center = right_x + RIGHT_COL_WIDTH / 2.0;
        let right_h = HEADER_HEIGHT / 3.0;
        let labelled_rows = [
            ("Doc. Ref.", &self.doc_ref),
            (self.date_label.as_str(), &self.date),
        ];
        for (i, (label, value)) in labelled_rows.into_iter().enumerate() {
            let row_top = top + right_h * i as f32;
            canvas.rect(right_x, row_top, RIGHT_COL_WIDTH, right_h);
            canvas.set_font_size(9.0);
            canvas.set_font(FontWeight::Normal);
            canvas.text(label, right_center, row_top + right_h / 3.0 + 1.0, TextAlign::Center);
            canvas.set_font(FontWeight::Bold);
            canvas.text(value, right_center, row_top + right_h / 3.0 + 7.0, TextAlign::Center);
        }

        let identity_top = top + right_h * 2.0;
        canvas.rect(right_x, identity_top, RIGHT_COL_WIDTH, right_h);
        canvas.set_font_size(9.0);
        canvas.set_font(FontWeight::Bold);
        canvas.text(
            &self.identity_label,
            right_center,
            identity_top + right_h / 2.0 + 1.5,
            TextAlign::Center,
        );

        // Identity value hangs below the right cell
        canvas.rect(right_x, top + HEADER_HEIGHT, RIGHT_COL_WIDTH, EXTENSION_ROW_HEIGHT);
        canvas.set_font_size(8.0);
        canvas.set_font(FontWeight::Normal);
        canvas.text(
            &self.identity_value,
            right_center,
            top + HEADER_HEIGHT + 5.5,
            TextAlign::Center,
        );

        warning
    }
}

fn fit_logo(logo: &ImageAsset) -> (f32, f32) {
    let aspect = logo.width_px() as f32 / logo.height_px() as f32;
    if LOGO_MAX_WIDTH / LOGO_MAX_HEIGHT > aspect {
        // Height-constrained
        (LOGO_MAX_HEIGHT * aspect, LOGO_MAX_HEIGHT)
    } else {
        (LOGO_MAX_WIDTH, LOGO_MAX_WIDTH / aspect)
    }
}

// ============================================================================
// Footer
// ============================================================================

/// Per-page footer: identifier on the left, document label on the right,
/// generation time in the middle and the credit line above it.
#[derive(Debug, Clone)]
pub struct Footer {
    pub identifier: String,
    pub label: String,
    pub timestamp: String,
    pub credit: Vec<CreditSegment>,
}

impl Footer {
    pub fn draw<C: Canvas>(&self, canvas: &mut C) {
        let saved = canvas.text_style();
        let width = canvas.page_width();
        let baseline = canvas.page_height() - MARGIN_MM - 2.5;

        let (r, g, b) = FOOTER_TEXT_COLOR;
        canvas.set_text_color(r, g, b);
        canvas.set_font(FontWeight::Normal);
        canvas.set_font_size(FOOTER_FONT_SIZE);
        canvas.text(&self.identifier, MARGIN_MM + 4.0, baseline, TextAlign::Left);
        canvas.text(&self.timestamp, width / 2.0, baseline, TextAlign::Center);
        canvas.text(&self.label, width - MARGIN_MM - 4.0, baseline, TextAlign::Right);

        self.draw_credit(canvas, baseline - 4.0);

        canvas.apply_style(saved);
    }

    // Each fragment is measured in its own weight; the running x must advance
    // by exactly that width or the bold letters drift.
    fn draw_credit<C: Canvas>(&self, canvas: &mut C, baseline: f32) {
        canvas.set_font_size(CREDIT_FONT_SIZE);

        let mut total = 0.0;
        for segment in &self.credit {
            canvas.set_font(weight_of(segment));
            total += canvas.string_width(&segment.text);
        }

        let mut x = (canvas.page_width() - total) / 2.0;
        for segment in &self.credit {
            canvas.set_font(weight_of(segment));
            canvas.text(&segment.text, x, baseline, TextAlign::Left);
            x += canvas.string_width(&segment.text);
        }
    }
}

fn weight_of(segment: &CreditSegment) -> FontWeight {
    if segment.bold {
        FontWeight::Bold
    } else {
        FontWeight::Normal
    }
}
