//! Document models for the two forms, plus the image assets they embed.

use ::image::DynamicImage;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Number of budget rows on an approval letter.
pub const PARTICULAR_ROWS: usize = 3;

/// Field name to message, for every field that failed validation.
pub type FieldErrors = BTreeMap<&'static str, &'static str>;

// ============================================================================
// Images
// ============================================================================

/// A decoded image with a display name.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    name: String,
    image: DynamicImage,
}

impl ImageAsset {
    pub fn new(name: impl Into<String>, image: DynamicImage) -> Result<Self, AppError> {
        let name = name.into();
        if image.width() == 0 || image.height() == 0 {
            return Err(AppError::ImageError(format!("{}: image has no pixels", name)));
        }
        Ok(Self { name, image })
    }

    pub fn open(path: &Path) -> Result<Self, AppError> {
        let bytes = std::fs::read(path)
            .map_err(|e| AppError::ImageError(format!("{}: {}", path.display(), e)))?;
        let image = ::image::load_from_memory(&bytes).map_err(|e| {
            AppError::ImageError(format!("{}: failed to decode image: {}", path.display(), e))
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::new(name, image)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn width_px(&self) -> u32 {
        self.image.width()
    }

    pub fn height_px(&self) -> u32 {
        self.image.height()
    }
}

// ============================================================================
// Free-form table
// ============================================================================

/// A rectangular grid of cells, never smaller than 1x1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Vec<String>>", into = "Vec<Vec<String>>")]
pub struct FreeTable {
    rows: Vec<Vec<String>>,
}

impl Default for FreeTable {
    fn default() -> Self {
        Self {
            rows: vec![vec![String::new()]],
        }
    }
}

impl From<Vec<Vec<String>>> for FreeTable {
    fn from(mut rows: Vec<Vec<String>>) -> Self {
        rows.retain(|row| !row.is_empty());
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        if columns == 0 {
            return Self::default();
        }
        for row in &mut rows {
            row.resize(columns, String::new());
        }
        Self { rows }
    }
}

impl From<FreeTable> for Vec<Vec<String>> {
    fn from(table: FreeTable) -> Self {
        table.rows
    }
}

impl FreeTable {
    /// Build a table from text pasted out of a spreadsheet or word processor.
    ///
    /// Cells are split on tabs if any line has one, then on `|`, then on runs
    /// of two or more spaces. Blank lines and Markdown separator rows are
    /// dropped.
    pub fn parse_pasted(text: &str) -> Self {
        let lines: Vec<&str> = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty())
            .collect();

        let rows: Vec<Vec<String>> = if lines.iter().any(|line| line.contains('\t')) {
            lines
                .iter()
                .map(|line| line.split('\t').map(|cell| cell.trim().to_string()).collect())
                .collect()
        } else if lines.iter().any(|line| line.contains('|')) {
            lines
                .iter()
                .filter(|line| !is_markdown_rule(line))
                .map(|line| {
                    let line = line.trim();
                    let line = line.strip_prefix('|').unwrap_or(line);
                    let line = line.strip_suffix('|').unwrap_or(line);
                    line.split('|').map(|cell| cell.trim().to_string()).collect()
                })
                .collect()
        } else {
            lines.iter().map(|line| split_on_wide_spaces(line)).collect()
        };

        Self::from(rows)
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// True when every cell is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.rows.iter().flatten().all(|cell| cell.trim().is_empty())
    }

    pub fn add_row(&mut self) {
        let columns = self.column_count();
        self.rows.push(vec![String::new(); columns]);
    }

    pub fn add_column(&mut self) {
        for row in &mut self.rows {
            row.push(String::new());
        }
    }

    /// Remove the last row. Does nothing when only one row is left.
    pub fn remove_row(&mut self) {
        if self.rows.len() > 1 {
            self.rows.pop();
        }
    }

    /// Remove the last column. Does nothing when only one column is left.
    pub fn remove_column(&mut self) {
        if self.column_count() > 1 {
            for row in &mut self.rows {
                row.pop();
            }
        }
    }

    /// Returns false when the cell is outside the grid.
    pub fn set_cell(&mut self, row: usize, column: usize, value: impl Into<String>) -> bool {
        match self.rows.get_mut(row).and_then(|r| r.get_mut(column)) {
            Some(cell) => {
                *cell = value.into();
                true
            }
            None => false,
        }
    }
}

fn is_markdown_rule(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.contains('-')
        && trimmed
            .chars()
            .all(|c| matches!(c, '|' | '-' | ':' | ' '))
}

fn split_on_wide_spaces(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut spaces = 0;

    for c in line.trim().chars() {
        if c == ' ' {
            spaces += 1;
            continue;
        }
        if spaces >= 2 {
            cells.push(std::mem::take(&mut current));
        } else if spaces == 1 {
            current.push(' ');
        }
        spaces = 0;
        current.push(c);
    }
    cells.push(current);
    cells
}

// ============================================================================
// Approval letter
// ============================================================================

/// One budget line item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Particular {
    #[serde(alias = "particular")]
    pub label: String,
    pub amount: String,
}

impl Particular {
    pub fn new(label: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            amount: amount.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalLetter {
    pub from: String,
    pub through: String,
    pub to: String,
    pub department: String,
    pub subject: String,
    pub body: String,
    #[serde(deserialize_with = "exactly_three_particulars")]
    pub particulars: [Particular; PARTICULAR_ROWS],
    pub attach_table: bool,
    pub table: FreeTable,
    pub table_file: String,
}

fn exactly_three_particulars<'de, D>(
    deserializer: D,
) -> Result<[Particular; PARTICULAR_ROWS], D::Error>
where
    D: Deserializer<'de>,
{
    let list: Vec<Particular> = Vec::deserialize(deserializer)?;
    let mut rows: [Particular; PARTICULAR_ROWS] = Default::default();
    for (slot, particular) in rows.iter_mut().zip(list) {
        *slot = particular;
    }
    Ok(rows)
}

impl ApprovalLetter {
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        serde_json::from_str(json).map_err(|e| AppError::InputError(format!("Invalid JSON: {}", e)))
    }

    /// Replace the attached table with one parsed from pasted text.
    pub fn attach_pasted_table(&mut self, source_name: impl Into<String>, text: &str) {
        self.table = FreeTable::parse_pasted(text);
        self.table_file = source_name.into();
        self.attach_table = true;
    }

    /// Whether the attached table should be drawn at all.
    pub fn has_table(&self) -> bool {
        self.attach_table && !self.table.is_blank()
    }

    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for (field, value) in [
            ("from", &self.from),
            ("to", &self.to),
            ("department", &self.department),
            ("subject", &self.subject),
            ("body", &self.body),
        ] {
            if value.trim().is_empty() {
                errors.insert(field, "is required");
            }
        }
        errors
    }

    pub fn file_name(&self) -> String {
        format!(
            "Event_Approval_Letter_{}.pdf",
            file_token(&self.department, "dept")
        )
    }
}

// ============================================================================
// Lab record
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AcademicYear {
    #[default]
    First,
    Second,
    Third,
    Fourth,
}

impl TryFrom<u8> for AcademicYear {
    type Error = String;

    fn try_from(year: u8) -> Result<Self, Self::Error> {
        match year {
            1 => Ok(Self::First),
            2 => Ok(Self::Second),
            3 => Ok(Self::Third),
            4 => Ok(Self::Fourth),
            other => Err(format!("academic year must be 1-4, got {}", other)),
        }
    }
}

impl From<AcademicYear> for u8 {
    fn from(year: AcademicYear) -> Self {
        match year {
            AcademicYear::First => 1,
            AcademicYear::Second => 2,
            AcademicYear::Third => 3,
            AcademicYear::Fourth => 4,
        }
    }
}

impl fmt::Display for AcademicYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let roman = match self {
            Self::First => "I",
            Self::Second => "II",
            Self::Third => "III",
            Self::Fourth => "IV",
        };
        f.write_str(roman)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LabRecord {
    pub roll_no: String,
    pub exp_no: String,
    pub exp_title: String,
    pub academic_year: AcademicYear,
    pub aim: String,
    pub procedure: String,
    pub result: String,
    pub program_images: Vec<ImageAsset>,
    pub output_images: Vec<ImageAsset>,
}

impl LabRecord {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for (field, value) in [
            ("roll_no", &self.roll_no),
            ("exp_no", &self.exp_no),
            ("exp_title", &self.exp_title),
            ("aim", &self.aim),
        ] {
            if value.trim().is_empty() {
                errors.insert(field, "is required");
            }
        }
        errors
    }

    pub fn file_name(&self) -> String {
        format!(
            "Lab_Record_{}_{}.pdf",
            file_token(&self.roll_no, "student"),
            file_token(&self.exp_no, "exp")
        )
    }
}

/// Lab record as written in a JSON file, with image paths instead of pixels.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LabRecordSource {
    pub roll_no: String,
    pub exp_no: String,
    pub exp_title: String,
    pub academic_year: AcademicYear,
    pub aim: String,
    pub procedure: String,
    pub result: String,
    pub program_images: Vec<PathBuf>,
    pub output_images: Vec<PathBuf>,
}

impl LabRecordSource {
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        serde_json::from_str(json).map_err(|e| AppError::InputError(format!("Invalid JSON: {}", e)))
    }

    /// Decode every image, resolving relative paths against `base_dir`.
    pub fn load(self, base_dir: &Path) -> Result<LabRecord, AppError> {
        let open_all = |paths: Vec<PathBuf>| -> Result<Vec<ImageAsset>, AppError> {
            paths
                .into_iter()
                .map(|p| ImageAsset::open(&base_dir.join(p)))
                .collect()
        };

        Ok(LabRecord {
            program_images: open_all(self.program_images)?,
            output_images: open_all(self.output_images)?,
            roll_no: self.roll_no,
            exp_no: self.exp_no,
            exp_title: self.exp_title,
            academic_year: self.academic_year,
            aim: self.aim,
            procedure: self.procedure,
            result: self.result,
        })
    }
}

/// Render field errors as `field is required, other is required`.
pub fn describe_errors(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{} {}", field, message))
        .collect::<Vec<_>>()
        .join(", ")
}

fn file_token(value: &str, fallback: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return fallback.to_string();
    }
    trimmed
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
