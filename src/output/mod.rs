mod edges;
mod file;

pub use edges::{detect_edges, invert};
pub use file::FileSink;

use crate::error::Result;
use image::GrayImage;

/// Default artifact name, written to the current directory
pub const DEFAULT_OUTPUT: &str = "Whiteboard.png";

/// Trait for whiteboard output destinations
pub trait OutputSink {
    /// Write the rendered whiteboard image
    fn write_image(&mut self, image: &GrayImage) -> Result<()>;
}
