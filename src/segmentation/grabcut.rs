use super::types::{Seed, Segmenter};
use crate::error::{Result, WhiteboardError};
use crate::state::mask::LabelMask;
use image::RgbImage;
use opencv::core::{Mat, Rect, Scalar, CV_64F};
use opencv::imgproc;
use opencv::prelude::*;

/// Mixture components per colour model in OpenCV's GrabCut. Its k-means
/// initialisation needs at least this many pixels on each side.
const GMM_COMPONENTS: usize = 5;

/// Length of the flattened GMM parameter row OpenCV keeps per model.
const MODEL_LEN: i32 = 13 * GMM_COMPONENTS as i32;

/// OpenCV GrabCut, one iteration per `refine` call
///
/// Label codes already match OpenCV's `GC_BGD`/`GC_FGD`/`GC_PR_BGD`/
/// `GC_PR_FGD`, so the mask is handed over byte for byte.
pub struct GrabCut {
    iterations: i32,
}

impl GrabCut {
    pub fn new() -> Self {
        Self { iterations: 1 }
    }
}

impl Default for GrabCut {
    fn default() -> Self {
        Self::new()
    }
}

impl Segmenter for GrabCut {
    fn refine(&mut self, image: &RgbImage, labels: &mut LabelMask, seed: Seed) -> Result<()> {
        let _span = tracing::debug_span!("grabcut_refine").entered();
        let (width, height) = image.dimensions();
        debug_assert_eq!((width, height), labels.dimensions());

        let total = (width * height) as usize;
        let (rect, mode, foreground) = match seed {
            Seed::Rect(r) => {
                if r.area() == 0 {
                    return Err(WhiteboardError::DegenerateRegion);
                }
                (
                    Rect::new(r.x, r.y, r.width, r.height),
                    imgproc::GC_INIT_WITH_RECT,
                    r.area() as usize,
                )
            }
            Seed::Mask => (Rect::default(), imgproc::GC_INIT_WITH_MASK, labels.selected_count()),
        };
        let background = total - foreground;
        if foreground < GMM_COMPONENTS || background < GMM_COMPONENTS {
            return Err(WhiteboardError::InsufficientSamples {
                foreground,
                background,
            });
        }

        // Channel order does not matter to the colour models, so RGB goes in as is
        let img = Mat::from_slice(image.as_raw())?;
        let img = img.reshape(3, height as i32)?;

        // Work on a copy so a failed pass leaves the caller's mask alone
        let codes = labels.codes().to_vec();
        let codes = Mat::from_slice(&codes)?;
        let mut mask = codes.reshape(1, height as i32)?.try_clone()?;

        let mut bgd_model = Mat::new_rows_cols_with_default(1, MODEL_LEN, CV_64F, Scalar::all(0.0))?;
        let mut fgd_model = Mat::new_rows_cols_with_default(1, MODEL_LEN, CV_64F, Scalar::all(0.0))?;

        imgproc::grab_cut(
            &img,
            &mut mask,
            rect,
            &mut bgd_model,
            &mut fgd_model,
            self.iterations,
            mode,
        )?;

        labels.set_codes(mask.data_bytes()?);
        tracing::debug!(
            "GrabCut pass: seed={:?}, foreground_samples={}, background_samples={}, probable_cells={}",
            seed,
            foreground,
            background,
            labels.labels().filter(|l| l.is_probable()).count()
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "opencv-grabcut"
    }
}
