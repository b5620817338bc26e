use image::{GrayImage, Luma, Rgb};
use imageproc::drawing::draw_filled_circle_mut;

/// Per-pixel classification used by the segmenter and the brush.
///
/// The numeric codes are the ones the brush writes and the ones GrabCut
/// traditionally uses, so `Background`/`Foreground` are 0/1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Label {
    Background = 0,
    Foreground = 1,
    ProbableBackground = 2,
    ProbableForeground = 3,
}

impl Label {
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Label::Background),
            1 => Some(Label::Foreground),
            2 => Some(Label::ProbableBackground),
            3 => Some(Label::ProbableForeground),
            _ => None,
        }
    }

    /// Whether the pixel ends up in the display mask.
    pub const fn is_selected(self) -> bool {
        matches!(self, Label::Foreground | Label::ProbableForeground)
    }

    /// Probable labels are the ones a refinement pass is allowed to rewrite.
    pub const fn is_probable(self) -> bool {
        matches!(self, Label::ProbableBackground | Label::ProbableForeground)
    }

    /// Stroke colour on the working copy: black for background, white for
    /// foreground.
    pub const fn brush_color(self) -> Rgb<u8> {
        match self {
            Label::Background | Label::ProbableBackground => Rgb([0, 0, 0]),
            Label::Foreground | Label::ProbableForeground => Rgb([255, 255, 255]),
        }
    }
}

/// Four-valued label grid, one cell per raster pixel.
///
/// Stored as a `GrayImage` of label codes so brush stamps go through the
/// same rasteriser as the strokes painted on the working copy.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMask {
    codes: GrayImage,
}

impl LabelMask {
    /// A fresh mask, every cell `ProbableBackground`.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Label::ProbableBackground)
    }

    pub fn filled(width: u32, height: u32, label: Label) -> Self {
        Self {
            codes: GrayImage::from_pixel(width, height, Luma([label.code()])),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.codes.dimensions()
    }

    pub fn get(&self, x: u32, y: u32) -> Label {
        decode(self.codes.get_pixel(x, y)[0])
    }

    pub fn set(&mut self, x: u32, y: u32, label: Label) {
        self.codes.put_pixel(x, y, Luma([label.code()]));
    }

    #[cfg(test)]
    pub fn fill(&mut self, label: Label) {
        for p in self.codes.pixels_mut() {
            p[0] = label.code();
        }
    }

    /// Overwrite every cell inside `rect` (already clipped to the mask).
    #[cfg(test)]
    pub fn fill_rect(&mut self, rect: SelectionRect, label: Label) {
        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                self.set(x as u32, y as u32, label);
            }
        }
    }

    /// Write `label` into a filled disc; cells outside the grid are skipped.
    pub fn stamp_disc(&mut self, center: (i32, i32), radius: i32, label: Label) {
        draw_filled_circle_mut(&mut self.codes, center, radius, Luma([label.code()]));
    }

    /// Raw label codes in row-major order, one byte per cell.
    pub fn codes(&self) -> &[u8] {
        self.codes.as_raw()
    }

    /// Replace every cell from a row-major buffer of label codes.
    pub fn set_codes(&mut self, codes: &[u8]) {
        debug_assert_eq!(codes.len(), self.codes.len());
        for (dst, src) in self.codes.iter_mut().zip(codes) {
            *dst = *src;
        }
    }

    /// Number of cells that end up in the display mask.
    pub fn selected_count(&self) -> usize {
        self.labels().filter(|l| l.is_selected()).count()
    }

    /// Labels in row-major order.
    pub fn labels(&self) -> impl Iterator<Item = Label> + '_ {
        self.codes.pixels().map(|p| decode(p[0]))
    }

    pub fn count(&self, label: Label) -> usize {
        self.labels().filter(|l| *l == label).count()
    }

    /// Collapse to the binary display mask: 255 where selected, 0 elsewhere.
    pub fn display_mask(&self) -> GrayImage {
        let (width, height) = self.dimensions();
        GrayImage::from_fn(width, height, |x, y| {
            if self.get(x, y).is_selected() {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }
}

fn decode(code: u8) -> Label {
    debug_assert!(code <= 3, "label mask holds invalid code {code}");
    Label::from_code(code).unwrap_or(Label::Background)
}

/// Axis-aligned selection in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Default for SelectionRect {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 1,
            height: 1,
        }
    }
}

impl SelectionRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Box spanned by two drag endpoints, in either order.
    pub fn from_corners(a: (i32, i32), b: (i32, i32)) -> Self {
        Self {
            x: a.0.min(b.0),
            y: a.1.min(b.1),
            width: (a.0 - b.0).abs(),
            height: (a.1 - b.1).abs(),
        }
    }

    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    /// Intersect with a `width` x `height` image. `None` if nothing is left.
    pub fn clip(&self, width: u32, height: u32) -> Option<Self> {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = (self.x + self.width).min(width as i32);
        let y1 = (self.y + self.height).min(height as i32);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Self::new(x0, y0, x1 - x0, y1 - y0))
    }
}

/// Where the next refinement pass takes its seed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedMode {
    /// No rectangle has been dragged yet.
    #[default]
    NoRect,
    /// A rectangle is pending; the next pass initialises from it.
    Rect,
    /// A pass has run; later passes continue from the label mask.
    Mask,
}
