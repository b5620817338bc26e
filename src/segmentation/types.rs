use crate::error::Result;
use crate::state::mask::{LabelMask, SelectionRect};
use image::RgbImage;

/// What a refinement pass starts from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seed {
    /// Reset the mask: background outside the rectangle, probable
    /// foreground inside. The rectangle is already clipped to the image.
    Rect(SelectionRect),
    /// Continue from the labels already in the mask.
    Mask,
}

/// Trait for foreground/background segmentation backends
pub trait Segmenter {
    /// Run one refinement pass over `image`
    ///
    /// # Arguments
    /// * `image` - Pristine source raster
    /// * `labels` - Label grid, same dimensions as `image`
    /// * `seed` - Whether to initialise from a rectangle or from `labels`
    ///
    /// On success every probable cell of `labels` is rewritten. On error
    /// `labels` is left exactly as it was.
    fn refine(&mut self, image: &RgbImage, labels: &mut LabelMask, seed: Seed) -> Result<()>;

    /// Human readable backend name for logs
    fn name(&self) -> &'static str;
}
