// Windows for the annotation loop.
// Input shows the working copy and receives the mouse, Output shows the
// masked image. The edge previews open the first time `s` is pressed.

use crate::annotate::PointerSample;
use anyhow::{anyhow, Result};
use image::{GrayImage, RgbImage};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

/// Update rate of the Input window. Each update waits at most this long
/// for input, which bounds the keyboard poll to a few milliseconds.
const KEY_POLL_FPS: usize = 250;

/// One window plus the packed 0x00RRGGBB buffer it shows
struct View {
    window: Window,
    pixels: Vec<u32>,
    width: usize,
    height: usize,
}

impl View {
    fn new(title: &str, width: u32, height: u32) -> Result<Self> {
        let (width, height) = (width as usize, height as usize);
        let window = Window::new(title, width, height, WindowOptions::default())
            .map_err(|e| anyhow!("Failed to open window {title}: {e}"))?;
        Ok(Self {
            window,
            pixels: vec![0u32; width * height],
            width,
            height,
        })
    }

    fn present(&mut self) -> Result<()> {
        self.window
            .update_with_buffer(&self.pixels, self.width, self.height)
            .map_err(|e| anyhow!("Failed to update window: {e}"))
    }
}

pub struct Viewer {
    input: View,
    output: View,
    edged: Option<View>,
    whiteboard: Option<View>,
}

impl Viewer {
    /// Open Input and Output side by side, sized to the image.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let mut output = View::new("Output", width, height)?;
        let mut input = View::new("Input", width, height)?;
        output.window.set_position(0, 90);
        input.window.set_position(width as isize + 10, 90);
        input.window.set_target_fps(KEY_POLL_FPS);

        Ok(Self {
            input,
            output,
            edged: None,
            whiteboard: None,
        })
    }

    /// False once the Input window has been closed.
    pub fn is_open(&self) -> bool {
        self.input.window.is_open()
    }

    pub fn set_input_title(&mut self, title: &str) {
        self.input.window.set_title(title);
    }

    /// Push the working copy and the output raster to their windows.
    pub fn present(&mut self, working: &RgbImage, output: &RgbImage) -> Result<()> {
        pack_rgb(working, &mut self.input.pixels);
        pack_rgb(output, &mut self.output.pixels);
        self.output.present()?;
        for view in [&mut self.edged, &mut self.whiteboard].into_iter().flatten() {
            view.present()?;
        }
        // Input last so its rate limit paces the loop
        self.input.present()
    }

    /// Show the raw edge map and the whiteboard, opening their windows on
    /// first use.
    pub fn show_edges(&mut self, edges: &GrayImage, whiteboard: &GrayImage) -> Result<()> {
        let (width, height) = edges.dimensions();
        let edged = ensure_view(&mut self.edged, "Edged Output", width, height)?;
        pack_gray(edges, &mut edged.pixels);

        let board = ensure_view(&mut self.whiteboard, "Whiteboard", width, height)?;
        pack_gray(whiteboard, &mut board.pixels);
        Ok(())
    }

    /// Keys pressed since the last update, across all windows, as the
    /// characters they type.
    pub fn typed_chars(&self) -> Vec<char> {
        let views = [Some(&self.input), Some(&self.output), self.edged.as_ref(), self.whiteboard.as_ref()];
        let mut chars = Vec::new();
        for view in views.into_iter().flatten() {
            let window = &view.window;
            let shift = window.is_key_down(Key::LeftShift) || window.is_key_down(Key::RightShift);
            chars.extend(
                window
                    .get_keys_pressed(KeyRepeat::No)
                    .into_iter()
                    .filter_map(|key| key_to_char(key, shift)),
            );
        }
        chars
    }

    /// Poll the mouse over the Input window.
    pub fn pointer(&self) -> PointerSample {
        let window = &self.input.window;
        PointerSample {
            pos: window
                .get_mouse_pos(MouseMode::Clamp)
                .map(|(x, y)| (x as i32, y as i32)),
            primary: window.get_mouse_down(MouseButton::Left),
            secondary: window.get_mouse_down(MouseButton::Right),
        }
    }
}

fn ensure_view<'a>(slot: &'a mut Option<View>, title: &str, width: u32, height: u32) -> Result<&'a mut View> {
    if slot.is_none() {
        *slot = Some(View::new(title, width, height)?);
    }
    slot.as_mut().ok_or_else(|| anyhow!("Window {title} is not open"))
}

/// Map the keys the loop cares about to the character they type.
fn key_to_char(key: Key, shift: bool) -> Option<char> {
    let c = match key {
        Key::Key0 => '0',
        Key::Key1 => '1',
        Key::N => 'n',
        Key::S => 's',
        Key::Escape => return Some('\u{1b}'),
        _ => return None,
    };
    if shift {
        // Shifted digits are symbols, shifted letters are capitals
        return c.is_ascii_alphabetic().then(|| c.to_ascii_uppercase());
    }
    Some(c)
}

fn pack_rgb(image: &RgbImage, out: &mut Vec<u32>) {
    out.clear();
    out.extend(image.pixels().map(|p| {
        let (r, g, b) = (p[0] as u32, p[1] as u32, p[2] as u32);
        (r << 16) | (g << 8) | b
    }));
}

fn pack_gray(image: &GrayImage, out: &mut Vec<u32>) {
    out.clear();
    out.extend(image.pixels().map(|p| {
        let v = p[0] as u32;
        (v << 16) | (v << 8) | v
    }));
}
