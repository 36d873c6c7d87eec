#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("board config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("grid must have at least one column and one row (got {nx}x{ny})")]
    EmptyGrid { nx: usize, ny: usize },
    #[error("snap distance must be positive and finite (got {0})")]
    SnapDistance(f64),
    #[error("scatter spacing must be a finite value of at least 1 (got {0})")]
    ScatterSpacing(f64),
}
