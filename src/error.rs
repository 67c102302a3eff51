use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("grid needs at least 2 points per axis, got {0}")]
    GridPoints(usize),
    #[error("{name} must be positive and finite, got {value}")]
    NonPositive { name: &'static str, value: f64 },
    #[error("{name} must be finite, got {value}")]
    NotFinite { name: &'static str, value: f64 },
    #[error("max order must be in 1..={max}, got {got}")]
    MaxOrder { got: u32, max: u32 },
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("image encode failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid image dimensions")]
    Dimensions,
}
