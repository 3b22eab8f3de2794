// Test patterns drawn by the preview window

use crate::palette::{argb, TRANSPARENT_INDEX};
use crate::surface::{Surface, SurfaceError};

/// Transparent-palette entry used for the overlay's drop shadow
pub const SHADOW_INDEX: u8 = 17;

/// Side length of the overlay's moving box
const BOX_SIZE: usize = 32;

/// Install the extra palette entries the overlay pattern uses
pub fn install_overlay_palette(overlay: &mut Surface) -> Result<(), SurfaceError> {
    overlay.set_palette_argb(SHADOW_INDEX, argb(0x80, 0x00, 0x00, 0x00));
    overlay.update_palette()
}

/// Diagonal bars cycling through the 16 base colors, scrolling with `frame`
pub fn draw_color_bars(surface: &mut Surface, frame: u64) {
    let (width, height, pitch) = (
        surface.width() as usize,
        surface.height() as usize,
        surface.pitch(),
    );
    let shift = frame as usize;
    let pixels = surface.pixels_mut();

    for y in 0..height {
        let row = &mut pixels[y * pitch..y * pitch + width];
        for (x, pixel) in row.iter_mut().enumerate() {
            *pixel = (((x + y + shift) / 16) % 16) as u8;
        }
    }
}

/// A white box with a shadow bouncing across a transparent overlay
pub fn draw_overlay(surface: &mut Surface, frame: u64) {
    let (width, height, pitch) = (
        surface.width() as usize,
        surface.height() as usize,
        surface.pitch(),
    );
    let pixels = surface.pixels_mut();
    pixels.fill(TRANSPARENT_INDEX);

    if width <= BOX_SIZE + 4 || height <= BOX_SIZE + 4 {
        return;
    }

    let bx = bounce(frame, width - BOX_SIZE - 4);
    let by = bounce(frame / 2, height - BOX_SIZE - 4);

    fill_box(pixels, pitch, bx + 4, by + 4, SHADOW_INDEX);
    fill_box(pixels, pitch, bx, by, 1);
}

fn fill_box(pixels: &mut [u8], pitch: usize, x: usize, y: usize, index: u8) {
    for row in y..y + BOX_SIZE {
        pixels[row * pitch + x..row * pitch + x + BOX_SIZE].fill(index);
    }
}

/// Triangle wave over 0..=range
fn bounce(t: u64, range: usize) -> usize {
    let period = 2 * range as u64;
    let phase = t % period.max(1);
    if phase <= range as u64 {
        phase as usize
    } else {
        (period - phase) as usize
    }
}
