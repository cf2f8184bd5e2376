//! Core shared errors (renderer-agnostic).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("bounding box is empty or degenerate")]
    DegenerateBounds,
}

pub type CoreResult<T> = Result<T, CoreError>;
