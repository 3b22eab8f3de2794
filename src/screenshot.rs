// Screenshot functionality
//
// Composes the software compositor's display list and saves it as a PNG.

use crate::compositor::SoftwareCompositor;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Errors that can occur during screenshot operations
#[derive(Debug)]
pub enum ScreenshotError {
    /// I/O error
    Io(io::Error),

    /// PNG encoding error
    PngEncoding(png::EncodingError),
}

impl std::fmt::Display for ScreenshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScreenshotError::Io(e) => write!(f, "I/O error: {}", e),
            ScreenshotError::PngEncoding(e) => write!(f, "PNG encoding error: {}", e),
        }
    }
}

impl std::error::Error for ScreenshotError {}

impl From<io::Error> for ScreenshotError {
    fn from(e: io::Error) -> Self {
        ScreenshotError::Io(e)
    }
}

impl From<png::EncodingError> for ScreenshotError {
    fn from(e: png::EncodingError) -> Self {
        ScreenshotError::PngEncoding(e)
    }
}

/// Save a screenshot of what the display currently shows
///
/// # Arguments
///
/// * `compositor` - Compositor whose committed display list is captured
/// * `directory` - Directory to write into (created if missing)
///
/// # Returns
///
/// Result containing the path to the saved screenshot or an error
pub fn save_screenshot(
    compositor: &SoftwareCompositor,
    directory: &Path,
) -> Result<PathBuf, ScreenshotError> {
    fs::create_dir_all(directory)?;

    // Generate filename with timestamp
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S%.3f");
    let file_path = directory.join(format!("screenshot_{}.png", timestamp));

    let rgba = compositor.compose_to_vec();
    let rgb = rgba_to_rgb(&rgba);
    save_png(&file_path, &rgb, compositor.width(), compositor.height())?;

    log::info!("Screenshot saved to {}", file_path.display());
    Ok(file_path)
}

/// Drop the alpha channel of an RGBA frame
fn rgba_to_rgb(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for pixel in rgba.chunks_exact(4) {
        rgb.extend_from_slice(&pixel[..3]);
    }
    rgb
}

/// Save RGB data as a PNG file
///
/// # Arguments
///
/// * `path` - Path to save the PNG file
/// * `data` - RGB data (width × height × 3 bytes)
/// * `width` - Image width
/// * `height` - Image height
fn save_png(path: &Path, data: &[u8], width: u32, height: u32) -> Result<(), ScreenshotError> {
    let file = fs::File::create(path)?;
    let w = io::BufWriter::new(file);

    let mut encoder = png::Encoder::new(w, width, height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header()?;
    writer.write_image_data(data)?;

    Ok(())
}
