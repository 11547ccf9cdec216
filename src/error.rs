//! Error and warning types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to create PDF: {0}")]
    PdfError(String),
    #[error("Failed to read input: {0}")]
    InputError(String),
    #[error("Failed to load image: {0}")]
    ImageError(String),
    #[error("Missing required fields: {0}")]
    ValidationError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Non-fatal problems hit while rendering optional, cosmetic assets.
///
/// These are collected into the render report instead of aborting the
/// document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderWarning {
    #[error("Logo could not be embedded: {0}")]
    LogoEmbed(String),
    #[error("Logo could not be loaded: {0}")]
    LogoUnavailable(String),
}
