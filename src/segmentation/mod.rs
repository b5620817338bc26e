mod grabcut;
pub mod types;

pub use grabcut::GrabCut;
pub use types::{Seed, Segmenter};

/// Create the default segmentation backend (OpenCV GrabCut, one pass per call)
pub fn create_default_segmenter() -> Box<dyn Segmenter> {
    Box::new(GrabCut::new())
}
