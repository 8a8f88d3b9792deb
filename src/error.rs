//! Error type for composition and raster construction.

use thiserror::Error;

use crate::pixel_layout::ColorSpace;

/// Errors raised while configuring a composition or building its raster.
///
/// Every variant rejects a caller-supplied argument; none of them is a
/// transient failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositeError {
    #[error("unsupported color working space: {0:?}")]
    UnsupportedColorSpace(ColorSpace),

    #[error("a composite raster needs at least one source")]
    NoSources,

    #[error("result layout would need {bands} bands, at most 4 are supported")]
    TooManyBands { bands: usize },
}

impl CompositeError {
    /// `true` for errors caused by an invalid argument.
    pub fn is_invalid_argument(&self) -> bool {
        match self {
            CompositeError::UnsupportedColorSpace(_)
            | CompositeError::NoSources
            | CompositeError::TooManyBands { .. } => true,
        }
    }
}

pub type Result<T> = std::result::Result<T, CompositeError>;
