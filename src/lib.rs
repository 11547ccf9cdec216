//! Event approval letters and lab records as PDF.

pub mod approval;
pub mod canvas;
pub mod chrome;
pub mod config;
mod error;
pub mod images;
pub mod lab_record;
pub mod metrics;
pub mod model;
pub mod pagination;
mod pdf;

pub use config::Institution;
pub use error::{AppError, RenderWarning};
pub use model::{ApprovalLetter, FreeTable, ImageAsset, LabRecord, LabRecordSource, Particular};
pub use pdf::{PdfCanvas, A4_HEIGHT_MM, A4_WIDTH_MM};

use chrono::{Local, NaiveDateTime};
use std::time::Instant;

/// Everything a render needs besides the document itself.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub institution: Institution,
    pub logo: Option<ImageAsset>,
    /// Wall-clock time stamped into headers and footers
    pub generated_at: NaiveDateTime,
    /// Problems found while preparing the context, carried into the report
    pub warnings: Vec<RenderWarning>,
}

impl RenderContext {
    pub fn new(institution: Institution) -> Self {
        Self {
            institution,
            logo: None,
            generated_at: Local::now().naive_local(),
            warnings: Vec::new(),
        }
    }

    pub fn with_logo(mut self, logo: Option<ImageAsset>) -> Self {
        self.logo = logo;
        self
    }

    pub fn with_warning(mut self, warning: RenderWarning) -> Self {
        self.warnings.push(warning);
        self
    }

    pub fn with_timestamp(mut self, generated_at: NaiveDateTime) -> Self {
        self.generated_at = generated_at;
        self
    }

    /// `dd/mm/yyyy`
    pub fn issue_date(&self) -> String {
        self.generated_at.format("%d/%m/%Y").to_string()
    }

    pub fn timestamp(&self) -> String {
        self.generated_at.format("%d/%m/%Y, %H:%M:%S").to_string()
    }
}

/// What a layout run produced, apart from the drawing itself.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderReport {
    pub pages: usize,
    pub footers: usize,
    pub warnings: Vec<RenderWarning>,
    /// Sum of the budget rows; approval letters only
    pub budget_total: Option<f64>,
}

/// A finished document ready to be saved.
#[derive(Debug, Clone)]
pub struct GeneratedPdf {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub report: RenderReport,
}

/// Render an approval letter to PDF.
///
/// Missing fields are logged but do not stop generation.
pub fn generate_approval_letter(
    letter: &ApprovalLetter,
    ctx: &RenderContext,
) -> Result<GeneratedPdf, AppError> {
    let issues = letter.validate();
    if !issues.is_empty() {
        log::warn!(
            "Approval letter has empty fields: {}",
            model::describe_errors(&issues)
        );
    }

    let t0 = Instant::now();
    let mut canvas = PdfCanvas::new(approval::DOCUMENT_LABEL, A4_WIDTH_MM, A4_HEIGHT_MM)?;
    let report = approval::render(&mut canvas, letter, ctx)?;
    let bytes = canvas.into_bytes()?;

    log::info!(
        "Approval letter: {} page(s), total {:.2}, {} bytes in {:.1}ms",
        report.pages,
        report.budget_total.unwrap_or_default(),
        bytes.len(),
        t0.elapsed().as_secs_f64() * 1000.0
    );

    Ok(GeneratedPdf {
        file_name: letter.file_name(),
        bytes,
        report,
    })
}

/// Render a lab record to PDF. Required fields must be filled in.
pub fn generate_lab_record(record: &LabRecord, ctx: &RenderContext) -> Result<GeneratedPdf, AppError> {
    let issues = record.validate();
    if !issues.is_empty() {
        return Err(AppError::ValidationError(model::describe_errors(&issues)));
    }

    let t0 = Instant::now();
    let mut canvas = PdfCanvas::new(lab_record::DOCUMENT_LABEL, A4_WIDTH_MM, A4_HEIGHT_MM)?;
    let report = lab_record::render(&mut canvas, record, ctx)?;
    let bytes = canvas.into_bytes()?;

    log::info!(
        "Lab record: {} page(s), {} program / {} output image(s), {} bytes in {:.1}ms",
        report.pages,
        record.program_images.len(),
        record.output_images.len(),
        bytes.len(),
        t0.elapsed().as_secs_f64() * 1000.0
    );

    Ok(GeneratedPdf {
        file_name: record.file_name(),
        bytes,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_formats_dates() {
        let at = chrono::NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(7, 3, 9)
            .unwrap();
        let ctx = RenderContext::new(Institution::default()).with_timestamp(at);
        assert_eq!(ctx.issue_date(), "05/01/2026");
        assert_eq!(ctx.timestamp(), "05/01/2026, 07:03:09");
    }

    #[test]
    fn test_lab_record_validation_blocks_generation() {
        let ctx = RenderContext::new(Institution::default());
        let result = generate_lab_record(&LabRecord::default(), &ctx);
        assert!(matches!(result, Err(AppError::ValidationError(msg)) if msg.contains("roll_no")));
    }

    #[test]
    fn test_context_warnings_reach_the_report() {
        let warning = RenderWarning::LogoUnavailable("logo.png: not found".to_string());
        let ctx = RenderContext::new(Institution::default()).with_warning(warning.clone());

        let letter = generate_approval_letter(&ApprovalLetter::default(), &ctx).unwrap();
        assert_eq!(letter.report.warnings, vec![warning.clone()]);

        let record = LabRecord {
            roll_no: "711521".into(),
            exp_no: "1".into(),
            exp_title: "Linear search".into(),
            aim: "To search a list.".into(),
            ..Default::default()
        };
        let pdf = generate_lab_record(&record, &ctx).unwrap();
        assert_eq!(pdf.report.warnings, vec![warning]);
    }

    #[test]
    fn test_empty_approval_letter_still_generates() {
        let ctx = RenderContext::new(Institution::default());
        let pdf = generate_approval_letter(&ApprovalLetter::default(), &ctx).unwrap();
        assert_eq!(pdf.file_name, "Event_Approval_Letter_dept.pdf");
        assert!(pdf.bytes.starts_with(b"%PDF"));
        assert_eq!(pdf.report.budget_total, Some(0.0));
    }
}
