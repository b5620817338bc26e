use super::OutputSink;
use crate::error::{Result, WhiteboardError};
use image::GrayImage;
use std::path::{Path, PathBuf};

/// Writes the whiteboard to a file, overwriting any previous one
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl OutputSink for FileSink {
    fn write_image(&mut self, image: &GrayImage) -> Result<()> {
        // Encoding is picked from the extension
        image.save(&self.path).map_err(|source| WhiteboardError::IoWrite {
            path: self.path.clone(),
            source,
        })?;

        tracing::info!(
            "Saved {}x{} whiteboard to {}",
            image.width(),
            image.height(),
            self.path.display()
        );
        Ok(())
    }
}
