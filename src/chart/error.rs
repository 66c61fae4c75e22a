use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("resolution must be positive")]
    InvalidResolution,

    #[error("invalid sync data: {0}")]
    InvalidSync(String),

    #[error("time signature denominator {0} is not a power of two")]
    InvalidTimeSignature(u32),

    #[error("star power phrases must be sorted and non-overlapping")]
    OverlappingPhrases,
}
