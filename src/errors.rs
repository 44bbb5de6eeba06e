pub type Result<T> = std::result::Result<T, BandscaleError>;

#[derive(thiserror::Error, Debug)]
pub enum BandscaleError {
    #[error("Selector `{selector}` matched no bands of image `{image}`")]
    Selection { selector: String, image: String },
    #[error(transparent)]
    InvalidSelector(#[from] regex::Error),
    #[error("Band `{band}` has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        band: String,
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("Band `{0}` already exists")]
    DuplicateBand(String),
    #[error("Band `{0}` not found")]
    MissingBand(String),
    #[error("Imagery source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("Date range {start}..{end} is empty")]
    InvalidDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },
    #[error("Collection has no images")]
    EmptyCollection,
    #[error("Invalid visualization parameters: {0}")]
    InvalidVisualization(String),
    #[error(transparent)]
    InvalidConfig(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    NdarrayError(#[from] ndarray::ShapeError),
}
