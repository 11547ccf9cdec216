//! Institution profile: the fixed text printed in every header and footer.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::AppError;

/// One run of the footer credit line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditSegment {
    pub text: String,
    #[serde(default)]
    pub bold: bool,
}

impl CreditSegment {
    pub fn new(text: &str, bold: bool) -> Self {
        Self {
            text: text.to_string(),
            bold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Institution {
    pub name: String,
    pub location: String,
    pub forms_label: String,
    pub records_label: String,
    pub academic_session: String,
    pub approval_doc_ref: String,
    pub lab_doc_ref: String,
    pub credit: Vec<CreditSegment>,
}

impl Default for Institution {
    fn default() -> Self {
        Self {
            name: "KGISL INSTITUTE OF TECHNOLOGY,".to_string(),
            location: "COIMBATORE -35, TN, INDIA".to_string(),
            forms_label: "ACADEMIC - FORMS".to_string(),
            records_label: "ACADEMIC - RECORDS".to_string(),
            academic_session: "2024 - 2025".to_string(),
            approval_doc_ref: "KITE/AC/AL/ 75".to_string(),
            lab_doc_ref: "KITE/AC/LR/ 12".to_string(),
            credit: vec![
                CreditSegment::new("co-", false),
                CreditSegment::new("K", true),
                CreditSegment::new("reate your ", false),
                CreditSegment::new("G", true),
                CreditSegment::new("enius", false),
            ],
        }
    }
}

impl Institution {
    /// Load a profile from JSON. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::InputError(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| AppError::InputError(format!("Invalid institution profile: {}", e)))
    }
}
