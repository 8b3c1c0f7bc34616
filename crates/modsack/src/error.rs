use thiserror::Error;

use crate::id_set::UnitId;
use crate::solver::Problem;

#[derive(Error, Debug)]
pub enum SackError {
    // Bitmap errors
    #[error("unit id {id} is out of range for a bitmap of capacity {capacity}")]
    IdOutOfRange { id: UnitId, capacity: u32 },

    // Handle errors
    #[error("handle is not valid: its guard was cleared or dropped")]
    InvalidHandle,

    // Query errors
    #[error("queries belong to different universe generations")]
    GenerationMismatch,

    // Solver errors
    #[error("could not resolve module dependencies: {0}")]
    Unresolvable(Problem),

    // Config errors
    #[error("failed to parse module configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SackError>;
