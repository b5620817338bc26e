use std::path::PathBuf;
use thiserror::Error;

/// Recoverable failures surfaced to the user during a session.
///
/// None of these end the session: the caller reports them and the
/// interaction loop keeps running with the previous state intact.
#[derive(Debug, Error)]
pub enum WhiteboardError {
    /// The path does not decode to an image.
    #[error("{} is not a readable image: {source}", .path.display())]
    InvalidInput {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Segmentation was requested without a usable rectangle.
    #[error("no region to segment, draw a rectangle around the object first")]
    DegenerateRegion,

    /// One side of the seed has too few pixels for the colour models.
    #[error(
        "not enough marked pixels to segment ({foreground} foreground, {background} background), \
         mark more with 0 or 1"
    )]
    InsufficientSamples { foreground: usize, background: usize },

    /// The vision backend rejected the call.
    #[error("vision backend error: {0}")]
    Vision(#[from] opencv::Error),

    /// The output file could not be written.
    #[error("failed to write {}: {source}", .path.display())]
    IoWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

pub type Result<T, E = WhiteboardError> = std::result::Result<T, E>;
