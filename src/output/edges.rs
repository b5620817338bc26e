use crate::error::{Result, WhiteboardError};
use image::{imageops, GrayImage, RgbImage};
use opencv::core::{Mat, StsUnmatchedSizes};
use opencv::imgproc;
use opencv::prelude::*;

/// Canny hysteresis thresholds on OpenCV's L1 Sobel gradient scale.
pub const CANNY_LOW: f64 = 10.0;
pub const CANNY_HIGH: f64 = 250.0;

/// Sobel aperture used for the gradient.
const CANNY_APERTURE: i32 = 3;

/// Single-channel edge map of the segmented output: 255 on edges, 0 elsewhere.
///
/// The colour raster goes in directly; Canny takes the strongest gradient
/// across channels.
pub fn detect_edges(output: &RgbImage) -> Result<GrayImage> {
    let _span = tracing::debug_span!("detect_edges").entered();
    let (width, height) = output.dimensions();

    let mat = Mat::from_slice(output.as_raw())?;
    let mat = mat.reshape(3, height as i32)?;

    let mut edges = Mat::default();
    imgproc::canny(&mat, &mut edges, CANNY_LOW, CANNY_HIGH, CANNY_APERTURE, false)?;

    GrayImage::from_raw(width, height, edges.data_bytes()?.to_vec()).ok_or_else(|| {
        WhiteboardError::Vision(opencv::Error::new(
            StsUnmatchedSizes,
            format!("edge map is not {width}x{height}"),
        ))
    })
}

/// Photometric inverse: `255 - v` for every pixel.
pub fn invert(edges: &GrayImage) -> GrayImage {
    let mut inverted = edges.clone();
    imageops::invert(&mut inverted);
    inverted
}
