//! Event approval letter layout.

use crate::canvas::{Canvas, FontWeight, TextAlign};
use crate::chrome::{Footer, HeaderBlock, HEADER_BOTTOM, MARGIN_MM};
use crate::error::AppError;
use crate::metrics::PT_TO_MM;
use crate::model::{ApprovalLetter, FreeTable, Particular, PARTICULAR_ROWS};
use crate::pagination::{LayoutCursor, Paginator};
use crate::{RenderContext, RenderReport};

// ============================================================================
// Constants
// ============================================================================

pub const DOCUMENT_LABEL: &str = "Event Approval Letter";
const DOCUMENT_TITLE: &str = "EVENT APPROVAL LETTER";

const TITLE_FONT_SIZE: f32 = 13.0;
const NORMAL_FONT_SIZE: f32 = 10.0;
const BUDGET_FONT_SIZE: f32 = 9.0;

/// Inset of the letter body from the border on both sides
const BODY_INSET: f32 = 10.0;
/// Padding between a cell edge and its text
const CELL_PADDING: f32 = 3.0;

/// From / Through / To table
const ADDRESS_TABLE_HEIGHT: f32 = 28.0;
const ADDRESS_TITLE_OFFSET: f32 = 8.0;
const ADDRESS_TEXT_OFFSET: f32 = 14.0;

/// Subject line sits this far below the address table's top edge
const SUBJECT_OFFSET: f32 = 38.0;
const SUBJECT_VALUE_INDENT: f32 = 18.0;
const SUBJECT_BOX_HEIGHT: f32 = 80.0;
const BODY_TEXT_OFFSET: f32 = 8.0;
const BODY_TABLE_GAP: f32 = 4.0;

/// Attached free-form table
const TABLE_ROW_HEIGHT: f32 = 7.0;
const TABLE_MIN_ROW_HEIGHT: f32 = 4.0;
const TABLE_FONT_SIZE: f32 = 8.0;
const TABLE_MIN_FONT_SIZE: f32 = 5.0;

/// Budget table, anchored to the page bottom
const BUDGET_TITLE_FROM_BOTTOM: f32 = 82.0;
const BUDGET_TOP_FROM_BOTTOM: f32 = 76.0;
const BUDGET_WIDTH: f32 = 120.0;
const BUDGET_ROW_HEIGHT: f32 = 8.0;
const SERIAL_COL_WIDTH: f32 = 18.0;
const PARTICULAR_COL_WIDTH: f32 = 72.0;
const BUDGET_TEXT_OFFSET: f32 = 6.0;

// ============================================================================
// Budget arithmetic
// ============================================================================

/// Parse a loosely formatted amount such as `"1,200.50"` or `"300 rupees"`.
///
/// Commas are dropped and the longest numeric prefix is read; anything that
/// does not start with a number counts as zero.
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw.chars().filter(|&c| c != ',').collect();
    let s = cleaned.trim_start();
    let bytes = s.as_bytes();
    let is_digit = |i: usize| i < bytes.len() && bytes[i].is_ascii_digit();

    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }

    let int_start = end;
    while is_digit(end) {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let mut j = end + 1;
        while is_digit(j) {
            j += 1;
        }
        let fraction = j - (end + 1);
        if digits + fraction > 0 {
            digits += fraction;
            end = j;
        }
    }

    if digits == 0 {
        return 0.0;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut j = end + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while is_digit(j) {
            j += 1;
        }
        if j > exp_start {
            end = j;
        }
    }

    s[..end]
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Sum of the parsed amounts of all budget rows.
///
/// A sum that overflows to infinity counts as zero, like a single amount would.
pub fn budget_total(particulars: &[Particular; PARTICULAR_ROWS]) -> f64 {
    let total: f64 = particulars.iter().map(|p| parse_amount(&p.amount)).sum();
    if total.is_finite() {
        total
    } else {
        log::warn!("Budget amounts overflow; total shown as 0");
        0.0
    }
}

/// Two decimals, never `-0.00`.
pub fn format_total(total: f64) -> String {
    format!("{:.2}", total + 0.0)
}

/// Row height for `rows` rows that should fit in `remaining` mm.
///
/// Rows keep their default height when they fit, otherwise shrink evenly,
/// but never below the readable minimum even if that overflows.
pub fn fit_row_height(rows: usize, remaining: f32) -> f32 {
    if rows == 0 || rows as f32 * TABLE_ROW_HEIGHT <= remaining {
        return TABLE_ROW_HEIGHT;
    }
    (remaining / rows as f32).max(TABLE_MIN_ROW_HEIGHT)
}

// ============================================================================
// Rendering
// ============================================================================

pub fn render<C: Canvas>(
    canvas: &mut C,
    letter: &ApprovalLetter,
    ctx: &RenderContext,
) -> Result<RenderReport, AppError> {
    let page_width = canvas.page_width();
    let page_height = canvas.page_height();
    let issue_date = ctx.issue_date();
    let mut warnings = ctx.warnings.clone();

    let footer = Footer {
        identifier: ctx.institution.approval_doc_ref.clone(),
        label: DOCUMENT_LABEL.to_string(),
        timestamp: ctx.timestamp(),
        credit: ctx.institution.credit.clone(),
    };
    let cursor = LayoutCursor::new(HEADER_BOTTOM, HEADER_BOTTOM, page_height - MARGIN_MM);
    let mut pg = Paginator::begin(canvas, footer, cursor);

    let header = HeaderBlock {
        category: ctx.institution.forms_label.clone(),
        title: DOCUMENT_TITLE.to_string(),
        year_line: format!("ACADEMIC YEAR: {}", ctx.institution.academic_session),
        doc_ref: ctx.institution.approval_doc_ref.clone(),
        date_label: "Issue No / Date".to_string(),
        date: issue_date.clone(),
        identity_label: "Department".to_string(),
        identity_value: letter.department.clone(),
        ..HeaderBlock::for_institution(&ctx.institution)
    };
    warnings.extend(header.draw(pg.canvas(), ctx.logo.as_ref()));

    let table_x = MARGIN_MM + BODY_INSET;
    let table_width = page_width - MARGIN_MM * 2.0 - BODY_INSET * 2.0;

    // Title and date
    let title_y = HEADER_BOTTOM + 6.0;
    let date_y = title_y + 8.0;
    {
        let canvas = pg.canvas();
        canvas.set_font_size(TITLE_FONT_SIZE);
        canvas.set_font(FontWeight::Bold);
        canvas.text(DOCUMENT_TITLE, page_width / 2.0, title_y, TextAlign::Center);

        canvas.set_font_size(NORMAL_FONT_SIZE);
        canvas.set_font(FontWeight::Normal);
        canvas.text(
            &format!("Date: {}", issue_date),
            page_width - MARGIN_MM - BODY_INSET,
            date_y,
            TextAlign::Right,
        );
    }

    let address_y = date_y + 8.0;
    draw_address_table(pg.canvas(), letter, table_x, address_y, table_width);
    pg.advance_to(address_y + ADDRESS_TABLE_HEIGHT);

    let subject_y = address_y + SUBJECT_OFFSET;
    let box_bottom = draw_subject_box(pg.canvas(), letter, table_x, subject_y, table_width);
    pg.advance_to(box_bottom);

    let total = draw_budget_table(pg.canvas(), &letter.particulars, page_width, page_height);
    pg.advance_to(page_height - BUDGET_TOP_FROM_BOTTOM + BUDGET_ROW_HEIGHT * 5.0);

    let summary = pg.finish();
    for warning in &warnings {
        log::warn!("{}", warning);
    }

    Ok(RenderReport {
        pages: summary.pages,
        footers: summary.footers,
        warnings,
        budget_total: Some(total),
    })
}

/// Fixed-height From / Through / To table. Long text is not clipped.
fn draw_address_table<C: Canvas>(canvas: &mut C, letter: &ApprovalLetter, x: f32, y: f32, width: f32) {
    let col_width = width / 3.0;

    canvas.set_line_width(0.4);
    canvas.rect(x, y, width, ADDRESS_TABLE_HEIGHT);
    canvas.line(x + col_width, y, x + col_width, y + ADDRESS_TABLE_HEIGHT);
    canvas.line(x + col_width * 2.0, y, x + col_width * 2.0, y + ADDRESS_TABLE_HEIGHT);

    let columns = [
        ("From", &letter.from),
        ("Through", &letter.through),
        ("To", &letter.to),
    ];

    canvas.set_font_size(NORMAL_FONT_SIZE);
    canvas.set_font(FontWeight::Bold);
    for (i, (title, _)) in columns.iter().enumerate() {
        let col_x = x + col_width * i as f32;
        canvas.text(title, col_x + col_width / 2.0, y + ADDRESS_TITLE_OFFSET, TextAlign::Center);
    }

    canvas.set_font(FontWeight::Normal);
    for (i, (_, value)) in columns.iter().enumerate() {
        let col_x = x + col_width * i as f32;
        let lines = canvas.split_text_to_size(value, col_width - CELL_PADDING * 2.0);
        canvas.text_lines(&lines, col_x + CELL_PADDING, y + ADDRESS_TEXT_OFFSET);
    }
}

/// Subject line, bordered body box and the optional attached table.
/// Returns the bottom edge of the box.
fn draw_subject_box<C: Canvas>(
    canvas: &mut C,
    letter: &ApprovalLetter,
    x: f32,
    y: f32,
    width: f32,
) -> f32 {
    canvas.set_font(FontWeight::Normal);
    canvas.text("Sub :", x, y + 4.0, TextAlign::Left);
    canvas.set_font(FontWeight::Bold);
    canvas.text(&letter.subject, x + SUBJECT_VALUE_INDENT, y + 4.0, TextAlign::Left);
    canvas.set_font(FontWeight::Normal);

    let box_y = y + 8.0;
    let box_bottom = box_y + SUBJECT_BOX_HEIGHT;
    canvas.rect(x, box_y, width, SUBJECT_BOX_HEIGHT);

    let inner_width = width - CELL_PADDING * 2.0;
    let body = canvas.split_text_to_size(&letter.body, inner_width);
    let body_y = box_y + BODY_TEXT_OFFSET;
    canvas.text_lines(&body, x + CELL_PADDING, body_y);

    if letter.has_table() {
        let table_y = body_y + body.len() as f32 * canvas.line_height() + BODY_TABLE_GAP;
        let remaining = box_bottom - 2.0 - table_y;
        draw_free_table(canvas, &letter.table, x + CELL_PADDING, table_y, inner_width, remaining);
    }

    box_bottom
}

fn draw_free_table<C: Canvas>(
    canvas: &mut C,
    table: &FreeTable,
    x: f32,
    y: f32,
    width: f32,
    remaining: f32,
) {
    let rows = table.row_count();
    let col_width = width / table.column_count().max(1) as f32;
    let row_height = fit_row_height(rows, remaining);
    let font_size =
        (TABLE_FONT_SIZE * row_height / TABLE_ROW_HEIGHT).clamp(TABLE_MIN_FONT_SIZE, TABLE_FONT_SIZE);

    if rows as f32 * row_height > remaining {
        log::warn!(
            "Attached table needs {:.1}mm but only {:.1}mm remain in the body box",
            rows as f32 * row_height,
            remaining
        );
    }

    canvas.set_line_width(0.2);
    canvas.set_font_size(font_size);
    let baseline_offset = row_height / 2.0 + font_size * PT_TO_MM * 0.35;

    for (r, row) in table.rows().iter().enumerate() {
        let row_y = y + row_height * r as f32;
        canvas.set_font(if r == 0 { FontWeight::Bold } else { FontWeight::Normal });
        for (c, cell) in row.iter().enumerate() {
            let cell_x = x + col_width * c as f32;
            canvas.rect(cell_x, row_y, col_width, row_height);
            let first_line = canvas
                .split_text_to_size(cell, col_width - 2.0)
                .into_iter()
                .next()
                .unwrap_or_default();
            canvas.text(&first_line, cell_x + 1.0, row_y + baseline_offset, TextAlign::Left);
        }
    }

    canvas.set_font_size(NORMAL_FONT_SIZE);
    canvas.set_font(FontWeight::Normal);
}

/// Draw the budget table and return the total it shows.
fn draw_budget_table<C: Canvas>(
    canvas: &mut C,
    particulars: &[Particular; PARTICULAR_ROWS],
    page_width: f32,
    page_height: f32,
) -> f64 {
    canvas.set_font_size(NORMAL_FONT_SIZE);
    canvas.set_font(FontWeight::Bold);
    canvas.text(
        "Event Budget",
        page_width / 2.0,
        page_height - BUDGET_TITLE_FROM_BOTTOM,
        TextAlign::Center,
    );

    let x = (page_width - BUDGET_WIDTH) / 2.0;
    let y = page_height - BUDGET_TOP_FROM_BOTTOM;
    let amount_col_x = x + SERIAL_COL_WIDTH + PARTICULAR_COL_WIDTH;
    let amount_col_width = BUDGET_WIDTH - SERIAL_COL_WIDTH - PARTICULAR_COL_WIDTH;
    let body_rows = PARTICULAR_ROWS as f32 + 1.0;

    // Header, particulars and total
    canvas.set_line_width(0.3);
    for row in 0..PARTICULAR_ROWS + 2 {
        canvas.rect(x, y + BUDGET_ROW_HEIGHT * row as f32, BUDGET_WIDTH, BUDGET_ROW_HEIGHT);
    }
    // Column separators stop above the total row
    canvas.line(
        x + SERIAL_COL_WIDTH,
        y,
        x + SERIAL_COL_WIDTH,
        y + BUDGET_ROW_HEIGHT * body_rows,
    );
    canvas.line(amount_col_x, y, amount_col_x, y + BUDGET_ROW_HEIGHT * body_rows);

    canvas.set_font_size(BUDGET_FONT_SIZE);
    let header_y = y + BUDGET_TEXT_OFFSET;
    canvas.text("S.No", x + SERIAL_COL_WIDTH / 2.0, header_y, TextAlign::Center);
    canvas.text("Particulars", x + SERIAL_COL_WIDTH + 6.0, header_y, TextAlign::Left);
    canvas.text("Amount", amount_col_x + amount_col_width / 2.0, header_y, TextAlign::Center);

    canvas.set_font(FontWeight::Normal);
    for (i, particular) in particulars.iter().enumerate() {
        let row_y = y + BUDGET_ROW_HEIGHT * (i + 1) as f32 + BUDGET_TEXT_OFFSET;
        let label = non_empty_or(&particular.label, "nil");
        let amount = non_empty_or(&particular.amount, "0");
        canvas.text(&format!("{}.", i + 1), x + 4.0, row_y, TextAlign::Left);
        canvas.text(label, x + SERIAL_COL_WIDTH + 6.0, row_y, TextAlign::Left);
        canvas.text(amount, amount_col_x + 6.0, row_y, TextAlign::Left);
    }

    let total = budget_total(particulars);
    let total_y = y + BUDGET_ROW_HEIGHT * body_rows + BUDGET_TEXT_OFFSET;
    canvas.set_font(FontWeight::Bold);
    canvas.text("Total", x + SERIAL_COL_WIDTH + 6.0, total_y, TextAlign::Left);
    canvas.text(&format_total(total), amount_col_x + 6.0, total_y, TextAlign::Left);

    total
}

// Whitespace-only values are kept as typed.
fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}
