use thiserror::Error;

use super::EditOperation;
use crate::image_ref::ImageRefError;

pub type EditResult<T> = std::result::Result<T, EditError>;

#[derive(Debug, Error)]
pub enum EditError {
    #[error("invalid image reference: {0}")]
    Format(#[from] ImageRefError),
    #[error("{operation} expects {expected} image(s), got {actual}")]
    ArityMismatch {
        operation: EditOperation,
        expected: usize,
        actual: usize,
    },
    #[error("service returned HTTP {status}: {message}")]
    Service { status: u16, message: String },
    #[error("request failed: {message}")]
    Transport { message: String },
    #[error("unreadable service response: {message}")]
    InvalidResponse { message: String },
    #[error("the model did not return an image: {message}")]
    Declined { message: String },
}
