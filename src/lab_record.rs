//! Lab record layout: details, aim, procedure, screenshots, marks and result.

use crate::canvas::{Canvas, FontWeight, TextAlign};
use crate::chrome::{Footer, HeaderBlock, HEADER_BOTTOM};
use crate::error::AppError;
use crate::images::{height_cap, place_images};
use crate::model::LabRecord;
use crate::pagination::{LayoutCursor, Paginator};
use crate::{RenderContext, RenderReport};

// ============================================================================
// Constants
// ============================================================================

pub const DOCUMENT_LABEL: &str = "Lab Record";
const DOCUMENT_TITLE: &str = "LAB RECORD";

/// Content column inset from the page edge
const CONTENT_INSET: f32 = 15.0;
/// First writable y on continuation pages
pub const TOP_MARGIN: f32 = 20.0;
const BOTTOM_MARGIN: f32 = 20.0;

const TITLE_FONT_SIZE: f32 = 13.0;
const SUBTITLE_FONT_SIZE: f32 = 12.0;
const HEADING_FONT_SIZE: f32 = 12.0;
const TEXT_FONT_SIZE: f32 = 11.0;

const HEADING_HEIGHT: f32 = 8.0;
/// Heading baseline below the cursor
pub const HEADING_BASELINE: f32 = 6.0;
const SECTION_GAP: f32 = 6.0;
/// Roll number / date row under the experiment title
const DETAILS_ROW_HEIGHT: f32 = 8.0;

const MARKS_ROW_HEIGHT: f32 = 8.0;
const SERIAL_COL_WIDTH: f32 = 15.0;
const MARKS_COL_WIDTH: f32 = 35.0;

/// Assessment components and their maximum marks
pub const MARKS_SPLIT_UP: [(&str, u32); 4] = [
    ("Aim & Procedure", 20),
    ("Program", 30),
    ("Output", 30),
    ("Viva Voce", 20),
];

// ============================================================================
// Rendering
// ============================================================================

pub fn render<C: Canvas>(
    canvas: &mut C,
    record: &LabRecord,
    ctx: &RenderContext,
) -> Result<RenderReport, AppError> {
    let page_width = canvas.page_width();
    let page_height = canvas.page_height();
    let content_width = page_width - CONTENT_INSET * 2.0;
    let image_cap = height_cap(page_height - TOP_MARGIN - BOTTOM_MARGIN);
    let date = ctx.issue_date();
    let mut warnings = ctx.warnings.clone();

    let footer = Footer {
        identifier: record.roll_no.clone(),
        label: DOCUMENT_LABEL.to_string(),
        timestamp: ctx.timestamp(),
        credit: ctx.institution.credit.clone(),
    };
    let cursor = LayoutCursor::new(HEADER_BOTTOM + 6.0, TOP_MARGIN, page_height - BOTTOM_MARGIN);
    let mut pg = Paginator::begin(canvas, footer, cursor);

    let header = HeaderBlock {
        category: ctx.institution.records_label.clone(),
        title: DOCUMENT_TITLE.to_string(),
        year_line: format!(
            "ACADEMIC YEAR: {} ({} YEAR)",
            ctx.institution.academic_session, record.academic_year
        ),
        doc_ref: ctx.institution.lab_doc_ref.clone(),
        date_label: "Date".to_string(),
        date: date.clone(),
        identity_label: "Roll No.".to_string(),
        identity_value: record.roll_no.clone(),
        ..HeaderBlock::for_institution(&ctx.institution)
    };
    warnings.extend(header.draw(pg.canvas(), ctx.logo.as_ref()));

    draw_details(&mut pg, record, &date, page_width, content_width);
    draw_section(&mut pg, "AIM:", &record.aim, content_width);
    draw_section(&mut pg, "PROCEDURE:", &record.procedure, content_width);

    pg.force_break();
    draw_heading(&mut pg, "PROGRAM:");
    place_images(&mut pg, &record.program_images, CONTENT_INSET, content_width, image_cap)?;

    pg.force_break();
    draw_heading(&mut pg, "OUTPUT:");
    place_images(&mut pg, &record.output_images, CONTENT_INSET, content_width, image_cap)?;

    pg.force_break();
    draw_heading(&mut pg, "MARKS SPLIT-UP:");
    draw_marks_table(&mut pg, content_width);
    draw_section(&mut pg, "RESULT:", &record.result, content_width);

    let summary = pg.finish();
    for warning in &warnings {
        log::warn!("{}", warning);
    }

    Ok(RenderReport {
        pages: summary.pages,
        footers: summary.footers,
        warnings,
        budget_total: None,
    })
}

fn draw_details<C: Canvas>(
    pg: &mut Paginator<'_, C>,
    record: &LabRecord,
    date: &str,
    page_width: f32,
    content_width: f32,
) {
    let y = pg.y();
    let canvas = pg.canvas();
    canvas.set_font(FontWeight::Bold);
    canvas.set_font_size(TITLE_FONT_SIZE);
    canvas.text(
        &format!("EXPERIMENT No. {}", record.exp_no),
        page_width / 2.0,
        y + 6.0,
        TextAlign::Center,
    );
    pg.advance(10.0);

    pg.canvas().set_font_size(SUBTITLE_FONT_SIZE);
    let title_lines = pg.canvas().split_text_to_size(&record.exp_title, content_width);
    let line_height = pg.canvas().line_height();
    for line in &title_lines {
        pg.ensure_fits(line_height);
        let y = pg.y();
        pg.canvas()
            .text(line, page_width / 2.0, y + line_height * 0.8, TextAlign::Center);
        pg.advance(line_height);
    }
    pg.advance(3.0);

    pg.ensure_fits(DETAILS_ROW_HEIGHT + SECTION_GAP);
    let y = pg.y();
    let canvas = pg.canvas();
    canvas.set_font(FontWeight::Normal);
    canvas.set_font_size(TEXT_FONT_SIZE);
    canvas.text(
        &format!("Roll No: {}", record.roll_no),
        CONTENT_INSET,
        y + 5.0,
        TextAlign::Left,
    );
    canvas.text(
        &format!("Date: {}", date),
        CONTENT_INSET + content_width,
        y + 5.0,
        TextAlign::Right,
    );
    canvas.set_line_width(0.3);
    canvas.line(
        CONTENT_INSET,
        y + DETAILS_ROW_HEIGHT,
        CONTENT_INSET + content_width,
        y + DETAILS_ROW_HEIGHT,
    );
    pg.advance(DETAILS_ROW_HEIGHT + SECTION_GAP);
}

/// Heading kept together with at least one line of what follows it.
fn draw_heading<C: Canvas>(pg: &mut Paginator<'_, C>, title: &str) {
    pg.canvas().set_font_size(TEXT_FONT_SIZE);
    let follow = pg.canvas().line_height();
    pg.ensure_fits(HEADING_HEIGHT + follow);

    let y = pg.y();
    let canvas = pg.canvas();
    canvas.set_font(FontWeight::Bold);
    canvas.set_font_size(HEADING_FONT_SIZE);
    canvas.text(title, CONTENT_INSET, y + HEADING_BASELINE, TextAlign::Left);
    pg.advance(HEADING_HEIGHT);
}

/// Wrapped paragraph, paginated line by line.
fn draw_paragraph<C: Canvas>(pg: &mut Paginator<'_, C>, text: &str, content_width: f32) {
    pg.canvas().set_font(FontWeight::Normal);
    pg.canvas().set_font_size(TEXT_FONT_SIZE);
    let lines = pg.canvas().split_text_to_size(text, content_width);
    let line_height = pg.canvas().line_height();

    for line in &lines {
        pg.ensure_fits(line_height);
        let y = pg.y();
        pg.canvas()
            .text(line, CONTENT_INSET, y + line_height * 0.8, TextAlign::Left);
        pg.advance(line_height);
    }
}

fn draw_section<C: Canvas>(pg: &mut Paginator<'_, C>, title: &str, text: &str, content_width: f32) {
    draw_heading(pg, title);
    draw_paragraph(pg, text, content_width);
    pg.advance(SECTION_GAP);
}

fn draw_marks_table<C: Canvas>(pg: &mut Paginator<'_, C>, content_width: f32) {
    let rows = MARKS_SPLIT_UP.len() + 2;
    pg.ensure_fits(MARKS_ROW_HEIGHT * rows as f32);

    let x = CONTENT_INSET;
    let y = pg.y();
    let description_width = content_width - SERIAL_COL_WIDTH - MARKS_COL_WIDTH * 2.0;
    let description_x = x + SERIAL_COL_WIDTH;
    let max_x = description_x + description_width;
    let awarded_x = max_x + MARKS_COL_WIDTH;
    let text_offset = MARKS_ROW_HEIGHT / 2.0 + 1.5;

    let canvas = pg.canvas();
    canvas.set_line_width(0.3);
    for row in 0..rows {
        canvas.rect(x, y + MARKS_ROW_HEIGHT * row as f32, content_width, MARKS_ROW_HEIGHT);
    }
    for col_x in [description_x, max_x, awarded_x] {
        canvas.line(col_x, y, col_x, y + MARKS_ROW_HEIGHT * rows as f32);
    }

    canvas.set_font_size(10.0);
    canvas.set_font(FontWeight::Bold);
    let header_y = y + text_offset;
    canvas.text("S.No", x + SERIAL_COL_WIDTH / 2.0, header_y, TextAlign::Center);
    canvas.text("Description", description_x + 3.0, header_y, TextAlign::Left);
    canvas.text("Max Marks", max_x + MARKS_COL_WIDTH / 2.0, header_y, TextAlign::Center);
    canvas.text("Marks Awarded", awarded_x + MARKS_COL_WIDTH / 2.0, header_y, TextAlign::Center);

    canvas.set_font(FontWeight::Normal);
    for (i, (component, max)) in MARKS_SPLIT_UP.iter().enumerate() {
        let row_y = y + MARKS_ROW_HEIGHT * (i + 1) as f32 + text_offset;
        canvas.text(&format!("{}.", i + 1), x + SERIAL_COL_WIDTH / 2.0, row_y, TextAlign::Center);
        canvas.text(component, description_x + 3.0, row_y, TextAlign::Left);
        canvas.text(&max.to_string(), max_x + MARKS_COL_WIDTH / 2.0, row_y, TextAlign::Center);
    }

    let total: u32 = MARKS_SPLIT_UP.iter().map(|(_, max)| max).sum();
    let total_y = y + MARKS_ROW_HEIGHT * (rows - 1) as f32 + text_offset;
    canvas.set_font(FontWeight::Bold);
    canvas.text("Total", description_x + 3.0, total_y, TextAlign::Left);
    canvas.text(&total.to_string(), max_x + MARKS_COL_WIDTH / 2.0, total_y, TextAlign::Center);

    pg.advance(MARKS_ROW_HEIGHT * rows as f32 + SECTION_GAP);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DrawOp, RecordingCanvas};
    use crate::config::Institution;
    use crate::model::{AcademicYear, ImageAsset};
    use ::image::DynamicImage;
    use chrono::NaiveDate;

    fn context() -> RenderContext {
        let generated_at = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap();
        RenderContext::new(Institution::default()).with_timestamp(generated_at)
    }

    fn record() -> LabRecord {
        LabRecord {
            roll_no: "711521BCS042".into(),
            exp_no: "4".into(),
            exp_title: "Implementation of Dijkstra's Shortest Path Algorithm".into(),
            academic_year: AcademicYear::Second,
            aim: "To find the shortest path from a source vertex to all other vertices.".into(),
            procedure: "1. Read the graph.\n2. Initialise distances.\n3. Relax edges using a priority queue.".into(),
            result: "The shortest paths were computed successfully.".into(),
            ..Default::default()
        }
    }

    fn screenshots(prefix: &str, count: usize, width: u32, height: u32) -> Vec<ImageAsset> {
        (0..count)
            .map(|i| {
                ImageAsset::new(format!("{}{}.png", prefix, i), DynamicImage::new_rgb8(width, height))
                    .unwrap()
            })
            .collect()
    }

    fn image_ops(canvas: &RecordingCanvas) -> Vec<(usize, String)> {
        canvas
            .ops()
            .iter()
            .filter_map(|r| match &r.op {
                DrawOp::Image { name, .. } => Some((r.page, name.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_record_without_images_still_breaks_sections() {
        let mut canvas = RecordingCanvas::new(210.0, 297.0);
        let report = render(&mut canvas, &record(), &context()).unwrap();

        assert_eq!(report.pages, 4);
        assert_eq!(report.footers, 4);
        assert!(image_ops(&canvas).is_empty());

        let (program_page, _, _) = canvas.find_text("PROGRAM:").unwrap();
        let (output_page, _, output_y) = canvas.find_text("OUTPUT:").unwrap();
        let (marks_page, _, _) = canvas.find_text("MARKS SPLIT-UP:").unwrap();
        assert_eq!((program_page, output_page, marks_page), (2, 3, 4));
        assert_eq!(output_y, TOP_MARGIN + HEADING_BASELINE);
    }

    #[test]
    fn test_footer_on_every_page_with_roll_number() {
        let mut record = record();
        record.program_images = screenshots("prog", 3, 900, 700);
        record.output_images = screenshots("out", 2, 900, 700);

        let mut canvas = RecordingCanvas::new(210.0, 297.0);
        let report = render(&mut canvas, &record, &context()).unwrap();

        assert_eq!(report.pages, canvas.page_count());
        assert_eq!(report.footers, report.pages);
        // Once per footer plus the header's roll number cell
        assert_eq!(canvas.count_text("711521BCS042"), report.pages + 1);
        for page in 1..=report.pages {
            let labels = canvas
                .texts()
                .filter(|(p, t, _, _)| *p == page && *t == DOCUMENT_LABEL)
                .count();
            assert_eq!(labels, 1, "page {}", page);
        }
    }

    #[test]
    fn test_images_keep_input_order() {
        let mut record = record();
        record.program_images = screenshots("prog", 3, 400, 300);
        record.output_images = screenshots("out", 2, 400, 300);

        let mut canvas = RecordingCanvas::new(210.0, 297.0);
        render(&mut canvas, &record, &context()).unwrap();

        let names: Vec<String> = image_ops(&canvas).into_iter().map(|(_, n)| n).collect();
        assert_eq!(names, ["prog0.png", "prog1.png", "prog2.png", "out0.png", "out1.png"]);

        let (output_page, _, output_y) = canvas.find_text("OUTPUT:").unwrap();
        let first_output = image_ops(&canvas)
            .into_iter()
            .find(|(_, n)| n == "out0.png")
            .unwrap();
        assert_eq!(first_output.0, output_page);
        assert_eq!(output_y, TOP_MARGIN + HEADING_BASELINE);
    }

    #[test]
    fn test_long_procedure_flows_onto_next_page() {
        let mut record = record();
        record.procedure = (1..=80)
            .map(|i| format!("{}. Step number {} of the procedure.", i, i))
            .collect::<Vec<_>>()
            .join("\n");

        let mut canvas = RecordingCanvas::new(210.0, 297.0);
        let report = render(&mut canvas, &record, &context()).unwrap();

        let (last_step_page, _, _) = canvas
            .find_text("80. Step number 80 of the procedure.")
            .unwrap();
        assert!(last_step_page >= 2);
        let (program_page, _, _) = canvas.find_text("PROGRAM:").unwrap();
        assert_eq!(program_page, last_step_page + 1);
        assert_eq!(report.pages, program_page + 2);

        // No text line may cross into the footer area
        for (_, text, _, y) in canvas.texts() {
            if text.ends_with("of the procedure.") {
                assert!(y <= 297.0 - BOTTOM_MARGIN);
            }
        }
    }

    #[test]
    fn test_long_title_paginates_before_details_row() {
        let mut record = record();
        record.exp_title = "Implementation of an extremely verbose experiment title ".repeat(120);
        let title_lines = crate::metrics::wrap_text(
            &record.exp_title,
            210.0 - CONTENT_INSET * 2.0,
            FontWeight::Bold,
            SUBTITLE_FONT_SIZE,
        );
        assert!(title_lines.len() > 60);

        let mut canvas = RecordingCanvas::new(210.0, 297.0);
        let report = render(&mut canvas, &record, &context()).unwrap();

        let limit = 297.0 - BOTTOM_MARGIN;
        let mut title_pages = Vec::new();
        for (page, text, _, y) in canvas.texts() {
            if title_lines.iter().any(|line| line == text) {
                assert!(y <= limit, "title line drawn at y={} on page {}", y, page);
                title_pages.push(page);
            }
        }
        assert!(title_pages.iter().any(|&p| p >= 2));

        let (roll_page, _, roll_y) = canvas.find_text("Roll No: 711521BCS042").unwrap();
        assert!(roll_y <= limit);
        assert!(roll_page >= *title_pages.last().unwrap());

        let (aim_page, _, _) = canvas.find_text("AIM:").unwrap();
        let (program_page, _, _) = canvas.find_text("PROGRAM:").unwrap();
        assert!(aim_page >= roll_page);
        assert!(program_page > aim_page);
        assert_eq!(report.pages, canvas.page_count());
    }

    #[test]
    fn test_marks_table_total() {
        let mut canvas = RecordingCanvas::new(210.0, 297.0);
        render(&mut canvas, &record(), &context()).unwrap();

        let (page, _, _) = canvas.find_text("Total").unwrap();
        assert_eq!(page, 4);
        assert!(canvas.find_text("100").is_some());
        assert!(canvas.find_text("Viva Voce").is_some());
        assert!(canvas.find_text("ACADEMIC YEAR: 2024 - 2025 (II YEAR)").is_some());
    }
}
