use thiserror::Error;

/// Errors surfaced by the grid and engine APIs.
///
/// Every variant signals a caller mistake (a bad coordinate, a bad
/// configuration value) and is reported immediately instead of being
/// clamped. `step`, `undo`, `reset` and `seed_random` never fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("cell ({row}, {col}) is outside the {rows}x{cols} grid")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("invalid parameter {name}: {value} is outside its allowed range")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("grid dimensions must be at least 1x1, got {rows}x{cols}")]
    InvalidDimensions { rows: usize, cols: usize },

    #[error("snapshot is {rows}x{cols} but the engine grid is {expected_rows}x{expected_cols}")]
    SnapshotShape {
        rows: usize,
        cols: usize,
        expected_rows: usize,
        expected_cols: usize,
    },
}
