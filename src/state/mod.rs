pub mod mask;

use crate::error::{Result, WhiteboardError};
use crate::output::{self, FileSink, OutputSink};
use crate::segmentation::{self, Seed, Segmenter};
use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use mask::{Label, LabelMask, SeedMode, SelectionRect};
use std::path::{Path, PathBuf};

/// Outline colour of the selection rectangle on the working copy
pub const RECT_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

/// Outline width of the selection rectangle in pixels
pub const RECT_THICKNESS: i32 = 2;

/// All pixel and label data of one editing session
///
/// `source` is never touched after load. Annotations go to `working`,
/// and `display`/`output` are derived from `labels` and `working` by
/// `recompute_display`.
pub struct ImageState {
    path: PathBuf,
    source: RgbImage,
    working: RgbImage,
    labels: LabelMask,
    display: GrayImage,
    output: RgbImage,
    rect: SelectionRect,
    mode: SeedMode,
    segmenter: Box<dyn Segmenter>,
}

impl ImageState {
    /// Decode `path` and set up a session with the default segmenter
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|source| WhiteboardError::InvalidInput {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgb8();

        tracing::info!(
            "Loaded {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );

        let mut state = Self::from_image(image, segmentation::create_default_segmenter());
        state.path = path.to_path_buf();
        Ok(state)
    }

    pub fn from_image(image: RgbImage, segmenter: Box<dyn Segmenter>) -> Self {
        let (width, height) = image.dimensions();
        Self {
            path: PathBuf::new(),
            working: image.clone(),
            source: image,
            labels: LabelMask::new(width, height),
            display: GrayImage::new(width, height),
            output: RgbImage::new(width, height),
            rect: SelectionRect::default(),
            mode: SeedMode::NoRect,
            segmenter,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.source.dimensions()
    }

    #[cfg(test)]
    pub fn source(&self) -> &RgbImage {
        &self.source
    }

    pub fn working(&self) -> &RgbImage {
        &self.working
    }

    pub fn labels(&self) -> &LabelMask {
        &self.labels
    }

    pub fn display_mask(&self) -> &GrayImage {
        &self.display
    }

    pub fn output(&self) -> &RgbImage {
        &self.output
    }

    pub fn rect(&self) -> SelectionRect {
        self.rect
    }

    pub fn mode(&self) -> SeedMode {
        self.mode
    }

    /// Show a rectangle drag in progress: the working copy is rebuilt from
    /// the source so earlier previews do not pile up.
    pub fn preview_rect(&mut self, rect: SelectionRect) {
        self.working = self.source.clone();
        draw_outline(&mut self.working, rect);
        self.rect = rect;
        self.mode = SeedMode::Rect;
    }

    /// Finish a rectangle drag. The outline is drawn on top of whatever the
    /// working copy already shows.
    pub fn commit_rect(&mut self, rect: SelectionRect) {
        draw_outline(&mut self.working, rect);
        self.rect = rect;
        self.mode = SeedMode::Rect;
    }

    /// Paint a filled disc on both the working copy and the label mask.
    pub fn stamp(&mut self, center: (i32, i32), radius: i32, label: Label) {
        draw_filled_circle_mut(&mut self.working, center, radius, label.brush_color());
        self.labels.stamp_disc(center, radius, label);
    }

    /// Run one segmentation pass, seeded by the rectangle right after a drag
    /// and by the label mask afterwards. On error nothing changes.
    pub fn refine_segmentation(&mut self) -> Result<()> {
        let (width, height) = self.dimensions();
        let seed = match self.mode {
            SeedMode::NoRect => return Err(WhiteboardError::DegenerateRegion),
            SeedMode::Rect => Seed::Rect(
                self.rect
                    .clip(width, height)
                    .ok_or(WhiteboardError::DegenerateRegion)?,
            ),
            SeedMode::Mask => Seed::Mask,
        };

        tracing::debug!("Refining with {} from {:?}", self.segmenter.name(), seed);
        self.segmenter.refine(&self.source, &mut self.labels, seed)?;

        if self.mode == SeedMode::Rect {
            self.mode = SeedMode::Mask;
        }
        tracing::info!(
            "Segmentation updated: {} probable foreground, {} probable background",
            self.labels.count(Label::ProbableForeground),
            self.labels.count(Label::ProbableBackground)
        );
        Ok(())
    }

    /// Rebuild the display mask and the output raster from the current
    /// labels and working copy.
    pub fn recompute_display(&mut self) {
        self.display = self.labels.display_mask();
        self.output = self.working.clone();
        for (pixel, selected) in self.output.pixels_mut().zip(self.display.pixels()) {
            if selected[0] == 0 {
                *pixel = Rgb([0, 0, 0]);
            }
        }
    }

    /// Raw edge map of the current output raster
    pub fn detect_edges(&self) -> Result<GrayImage> {
        output::detect_edges(&self.output)
    }

    /// Edges dark on light: the whiteboard preview and export
    pub fn render_edges(&self) -> Result<GrayImage> {
        Ok(output::invert(&self.detect_edges()?))
    }

    /// Write `edges` verbatim to `path`, replacing any existing file
    pub fn save<P: AsRef<Path>>(edges: &GrayImage, path: P) -> Result<()> {
        FileSink::new(path).write_image(edges)
    }
}

fn draw_outline(canvas: &mut RgbImage, rect: SelectionRect) {
    // Corners are inclusive, so a zero-width drag still draws a line
    for t in 0..RECT_THICKNESS {
        let outline = Rect::at(rect.x - t, rect.y - t)
            .of_size((rect.width + 1 + 2 * t) as u32, (rect.height + 1 + 2 * t) as u32);
        draw_hollow_rect_mut(canvas, outline, RECT_COLOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::GrabCut;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records seeds and marks the seed rectangle (or the whole image) as
    /// probable foreground.
    struct RecordingSegmenter {
        seeds: Rc<RefCell<Vec<Seed>>>,
    }

    impl Segmenter for RecordingSegmenter {
        fn refine(&mut self, _image: &RgbImage, labels: &mut LabelMask, seed: Seed) -> Result<()> {
            self.seeds.borrow_mut().push(seed);
            if let Seed::Rect(rect) = seed {
                labels.fill(Label::Background);
                labels.fill_rect(rect, Label::ProbableForeground);
            }
            Ok(())
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    fn blank(width: u32, height: u32) -> ImageState {
        ImageState::from_image(
            RgbImage::from_pixel(width, height, Rgb([255, 255, 255])),
            Box::new(GrabCut::new()),
        )
    }

    fn assert_dimensions(state: &ImageState, width: u32, height: u32) {
        assert_eq!(state.labels().dimensions(), (width, height));
        assert_eq!(state.display_mask().dimensions(), (width, height));
        assert_eq!(state.working().dimensions(), (width, height));
        assert_eq!(state.output().dimensions(), (width, height));
    }

    #[test]
    fn test_load_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.png");
        RgbImage::from_pixel(12, 7, Rgb([10, 200, 30])).save(&path).unwrap();

        let state = ImageState::load(&path).unwrap();
        assert_eq!(state.dimensions(), (12, 7));
        assert_eq!(state.path(), path.as_path());
        assert_dimensions(&state, 12, 7);
        assert_eq!(state.mode(), SeedMode::NoRect);
        assert_eq!(state.rect(), SelectionRect::default());
        assert!(state.output().pixels().all(|p| p.0 == [0, 0, 0]));
        assert_eq!(state.working(), state.source());
    }

    #[test]
    fn test_load_rejects_missing_and_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.png");
        assert!(matches!(
            ImageState::load(&missing),
            Err(WhiteboardError::InvalidInput { .. })
        ));

        let garbage = dir.path().join("garbage.png");
        std::fs::write(&garbage, b"definitely not an image").unwrap();
        assert!(matches!(
            ImageState::load(&garbage),
            Err(WhiteboardError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_recompute_display_is_idempotent() {
        let mut state = blank(30, 20);
        state.commit_rect(SelectionRect::new(2, 2, 10, 10));
        state.stamp((5, 5), 2, Label::Foreground);

        state.recompute_display();
        let display = state.display_mask().clone();
        let output = state.output().clone();

        state.recompute_display();
        assert_eq!(state.display_mask(), &display);
        assert_eq!(state.output(), &output);
    }

    #[test]
    fn test_output_zeroes_unselected_pixels() {
        let mut state = blank(20, 20);
        state.stamp((10, 10), 2, Label::Foreground);
        state.recompute_display();

        assert_eq!(state.display_mask().get_pixel(10, 10)[0], 255);
        assert_eq!(state.output().get_pixel(10, 10).0, [255, 255, 255]);
        assert_eq!(state.display_mask().get_pixel(0, 0)[0], 0);
        assert_eq!(state.output().get_pixel(0, 0).0, [0, 0, 0]);
    }

    #[test]
    fn test_stamp_round_trip() {
        let mut state = blank(20, 20);
        state.stamp((7, 8), 2, Label::Foreground);
        state.recompute_display();
        assert_eq!(state.display_mask().get_pixel(7, 8)[0], 255);

        state.stamp((7, 8), 2, Label::Background);
        state.recompute_display();
        assert_eq!(state.display_mask().get_pixel(7, 8)[0], 0);
        assert_eq!(state.working().get_pixel(7, 8).0, [0, 0, 0]);
    }

    #[test]
    fn test_preview_resets_from_source() {
        let mut state = blank(40, 40);
        state.preview_rect(SelectionRect::new(5, 5, 10, 10));
        assert_eq!(state.working().get_pixel(5, 5), &RECT_COLOR);

        state.preview_rect(SelectionRect::new(20, 20, 10, 10));
        // Old outline is gone, new one is drawn
        assert_eq!(state.working().get_pixel(5, 5).0, [255, 255, 255]);
        assert_eq!(state.working().get_pixel(20, 20), &RECT_COLOR);
        assert_eq!(state.mode(), SeedMode::Rect);
        assert_eq!(state.rect(), SelectionRect::new(20, 20, 10, 10));
    }

    #[test]
    fn test_refine_without_rect_is_degenerate() {
        let mut state = blank(20, 20);
        let before = state.labels().clone();

        let err = state.refine_segmentation().unwrap_err();
        assert!(matches!(err, WhiteboardError::DegenerateRegion));
        assert_eq!(state.labels(), &before);
        assert_eq!(state.mode(), SeedMode::NoRect);
    }

    #[test]
    fn test_refine_with_zero_area_rect_keeps_state() {
        let mut state = blank(20, 20);
        state.commit_rect(SelectionRect::new(4, 4, 0, 9));
        let before = state.labels().clone();

        let err = state.refine_segmentation().unwrap_err();
        assert!(matches!(err, WhiteboardError::DegenerateRegion));
        assert_eq!(state.labels(), &before);
        assert_eq!(state.mode(), SeedMode::Rect);
    }

    #[test]
    fn test_rect_over_whole_image_reports_missing_background() {
        let mut state = blank(30, 30);
        state.commit_rect(SelectionRect::new(0, 0, 30, 30));
        let before = state.labels().clone();

        let err = state.refine_segmentation().unwrap_err();
        assert!(matches!(
            err,
            WhiteboardError::InsufficientSamples { background: 0, .. }
        ));
        assert_eq!(state.labels(), &before);
        assert_eq!(state.mode(), SeedMode::Rect);
    }

    #[test]
    fn test_seed_switches_from_rect_to_mask() {
        let seeds = Rc::new(RefCell::new(Vec::new()));
        let mut state = ImageState::from_image(
            RgbImage::new(50, 40),
            Box::new(RecordingSegmenter {
                seeds: Rc::clone(&seeds),
            }),
        );

        state.commit_rect(SelectionRect::new(40, 30, 30, 30));
        state.refine_segmentation().unwrap();
        state.refine_segmentation().unwrap();
        state.refine_segmentation().unwrap();

        assert_eq!(
            *seeds.borrow(),
            vec![
                Seed::Rect(SelectionRect::new(40, 30, 10, 10)),
                Seed::Mask,
                Seed::Mask
            ]
        );
        assert_eq!(state.mode(), SeedMode::Mask);

        // A new rectangle goes back to rectangle seeding
        state.commit_rect(SelectionRect::new(0, 0, 5, 5));
        state.refine_segmentation().unwrap();
        assert_eq!(
            seeds.borrow().last(),
            Some(&Seed::Rect(SelectionRect::new(0, 0, 5, 5)))
        );
    }

    #[test]
    fn test_blank_image_scenario() {
        let mut state = blank(100, 100);
        state.preview_rect(SelectionRect::from_corners((10, 10), (50, 60)));
        state.commit_rect(SelectionRect::from_corners((10, 10), (90, 90)));
        assert_eq!(state.mode(), SeedMode::Rect);

        state.refine_segmentation().unwrap();
        assert_eq!(state.mode(), SeedMode::Mask);
        assert_dimensions(&state, 100, 100);

        let rect = state.rect();
        let inside_nonzero = (rect.y..rect.y + rect.height)
            .flat_map(|y| (rect.x..rect.x + rect.width).map(move |x| (x, y)))
            .any(|(x, y)| state.labels().get(x as u32, y as u32).code() != 0);
        assert!(inside_nonzero);
        assert!(state.labels().labels().all(|l| l.code() <= 3));

        // Later passes stay in mask mode whether or not they succeed
        let _ = state.refine_segmentation();
        assert_eq!(state.mode(), SeedMode::Mask);
        state.recompute_display();
        assert_dimensions(&state, 100, 100);
    }

    #[test]
    fn test_render_edges_inverts_detector() {
        let mut state = blank(40, 40);
        state.stamp((20, 20), 8, Label::Foreground);
        state.recompute_display();

        let raw = state.detect_edges().unwrap();
        let rendered = state.render_edges().unwrap();
        assert_eq!(raw.dimensions(), rendered.dimensions());
        for (r, w) in raw.pixels().zip(rendered.pixels()) {
            assert_eq!(w[0], 255 - r[0]);
        }
    }

    #[test]
    fn test_repeated_saves_are_identical() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = blank(40, 40);
        state.stamp((20, 20), 6, Label::Foreground);
        state.recompute_display();

        let first = dir.path().join("first.png");
        let second = dir.path().join("second.png");
        ImageState::save(&state.render_edges().unwrap(), &first).unwrap();
        state.recompute_display();
        ImageState::save(&state.render_edges().unwrap(), &second).unwrap();

        assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
    }
}
