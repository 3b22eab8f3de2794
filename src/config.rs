// Configuration management
//
// Handles the display, preview window and per-surface settings, persisted
// as TOML.

use crate::layout::{Alignment, EdgePadding, LayoutParams, Rect, MAX_SUBPIXEL_COORD};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file path
const CONFIG_FILE: &str = "fblayer.toml";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FbConfig {
    /// Display settings
    pub display: DisplayConfig,

    /// Preview window settings
    pub preview: PreviewConfig,

    /// One entry per surface, in bank order
    pub surfaces: Vec<SurfaceConfig>,
}

/// Display settings for the software compositor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Display width in pixels
    pub width: u32,

    /// Display height in pixels
    pub height: u32,
}

/// Preview window settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Target frame rate in Hz
    pub target_fps: u32,

    /// Enable VSync
    pub vsync: bool,

    /// Render to the offscreen buffer and swap (false: draw straight to
    /// the visible buffer)
    pub sync_swap: bool,

    /// Screenshot directory
    pub screenshot_directory: PathBuf,
}

impl PreviewConfig {
    /// Get the frame duration for the target FPS
    pub fn frame_duration(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.target_fps.max(1) as u64)
    }
}

/// Settings for one surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceConfig {
    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Z-order on the display
    #[serde(default)]
    pub layer: i32,

    /// Use the transparent palette
    #[serde(default)]
    pub transparency: bool,

    /// Target aspect ratio (see `LayoutParams::aspect`)
    pub aspect: f64,

    /// Horizontal alignment
    #[serde(default)]
    pub h_align: Alignment,

    /// Horizontal alignment padding in pixels
    #[serde(default)]
    pub h_padding: i32,

    /// Vertical alignment
    #[serde(default)]
    pub v_align: Alignment,

    /// Vertical alignment padding in pixels
    #[serde(default)]
    pub v_padding: i32,

    /// Shift applied to centered images, (x, y)
    #[serde(default)]
    pub center_offset: [i32; 2],

    /// Display margins as fractions of the display size
    #[serde(default)]
    pub edges: EdgePadding,

    /// Region of the image to show (default: whole image)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_rect: Option<Rect>,
}

impl SurfaceConfig {
    /// Create a surface entry with default placement
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            layer: 0,
            transparency: false,
            aspect: 1.6,
            h_align: Alignment::Center,
            h_padding: 0,
            v_align: Alignment::Center,
            v_padding: 0,
            edges: EdgePadding::default(),
            center_offset: [0, 0],
            src_rect: None,
        }
    }

    /// Check the entry for values a surface would reject
    pub fn validate(&self) -> Result<(), String> {
        if self.aspect == 0.0 || !self.aspect.is_finite() {
            return Err(format!("aspect must be finite and non-zero, got {}", self.aspect));
        }
        let limit = MAX_SUBPIXEL_COORD as u32;
        if self.width == 0 || self.height == 0 || self.width > limit || self.height > limit {
            return Err(format!(
                "size {}x{} outside 1..={}",
                self.width, self.height, limit
            ));
        }
        if let Some(src) = self.src_rect {
            if !src.fits_subpixel() {
                return Err(format!("src_rect {:?} exceeds the 16.16 range", src));
            }
        }
        Ok(())
    }

    /// Layout inputs described by this entry
    pub fn layout(&self) -> LayoutParams {
        LayoutParams {
            aspect: self.aspect,
            h_align: self.h_align,
            h_padding: self.h_padding,
            v_align: self.v_align,
            v_padding: self.v_padding,
            edges: self.edges,
            center_offset_x: self.center_offset[0],
            center_offset_y: self.center_offset[1],
        }
    }
}

impl Default for FbConfig {
    fn default() -> Self {
        let main = SurfaceConfig::new(384, 272);

        let mut overlay = SurfaceConfig::new(384, 272);
        overlay.layer = 10;
        overlay.transparency = true;

        FbConfig {
            display: DisplayConfig {
                width: 800,
                height: 480,
            },
            preview: PreviewConfig {
                target_fps: 50,
                vsync: true,
                sync_swap: true,
                screenshot_directory: PathBuf::from("screenshots"),
            },
            surfaces: vec![main, overlay],
        }
    }
}

impl FbConfig {
    /// Load configuration from file or create default
    ///
    /// If the configuration file doesn't exist, creates a default configuration
    /// and saves it to the file.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            log::info!("Using default configuration ({})", e);
            let config = Self::default();
            if let Err(e) = config.save() {
                log::warn!("Could not write {}: {}", CONFIG_FILE, e);
            }
            config
        })
    }

    /// Load configuration from the default file
    pub fn load() -> Result<Self, io::Error> {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration from a specific file
    ///
    /// Surface entries are validated; a bad entry is an `InvalidData` error.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, io::Error> {
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every surface entry
    pub fn validate(&self) -> Result<(), io::Error> {
        for (index, surface) in self.surfaces.iter().enumerate() {
            surface.validate().map_err(|e| {
                io::Error::new(io::ErrorKind::InvalidData, format!("surface {}: {}", index, e))
            })?;
        }
        Ok(())
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<(), io::Error> {
        self.save_to(CONFIG_FILE)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), io::Error> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FbConfig::default();
        assert_eq!(config.display.width, 800);
        assert_eq!(config.display.height, 480);
        assert_eq!(config.surfaces.len(), 2);
        assert!(!config.surfaces[0].transparency);
        assert!(config.surfaces[1].transparency);
        assert!(config.surfaces[1].layer > config.surfaces[0].layer);
    }

    #[test]
    fn test_config_serialization() {
        let mut config = FbConfig::default();
        config.surfaces[0].src_rect = Some(Rect::new(8, 8, 320, 200));
        config.surfaces[0].h_align = Alignment::Start;

        let toml_str = toml::to_string(&config).expect("Failed to serialize");
        let deserialized: FbConfig = toml::from_str(&toml_str).expect("Failed to deserialize");

        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_sparse_surface_entry() {
        let toml_str = r#"
            [display]
            width = 640
            height = 480

            [preview]
            target_fps = 60
            vsync = false
            sync_swap = false
            screenshot_directory = "shots"

            [[surfaces]]
            width = 320
            height = 200
            aspect = -1.25
            v_align = "end"
        "#;

        let config: FbConfig = toml::from_str(toml_str).expect("Failed to parse");
        let surface = &config.surfaces[0];
        assert_eq!(surface.layer, 0);
        assert_eq!(surface.h_align, Alignment::Center);
        assert_eq!(surface.v_align, Alignment::End);
        assert_eq!(surface.src_rect, None);
        assert_eq!(surface.layout().aspect, -1.25);
    }

    #[test]
    fn test_layout_from_surface_config() {
        let mut surface = SurfaceConfig::new(320, 200);
        surface.center_offset = [4, -2];
        surface.h_padding = 7;

        let layout = surface.layout();
        assert_eq!(layout.center_offset_x, 4);
        assert_eq!(layout.center_offset_y, -2);
        assert_eq!(layout.h_padding, 7);
    }

    #[test]
    fn test_frame_duration() {
        let config = FbConfig::default();
        assert_eq!(config.preview.frame_duration().as_micros(), 20_000);
    }

    #[test]
    fn test_surface_validation() {
        assert!(FbConfig::default().validate().is_ok());

        let mut surface = SurfaceConfig::new(320, 200);
        surface.aspect = 0.0;
        assert!(surface.validate().is_err());

        let mut surface = SurfaceConfig::new(40000, 200);
        assert!(surface.validate().is_err());
        surface.width = 320;
        surface.src_rect = Some(Rect::from_size(40000, 1));
        assert!(surface.validate().is_err());
    }

    #[test]
    fn test_load_from_rejects_zero_aspect() {
        let mut config = FbConfig::default();
        config.surfaces[1].aspect = 0.0;

        let path = std::env::temp_dir()
            .join(format!("fblayer-zero-aspect-{}.toml", std::process::id()));
        config.save_to(&path).expect("Failed to write config");
        let err = FbConfig::load_from(&path).unwrap_err();
        let _ = fs::remove_file(&path);

        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("surface 1"));
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = FbConfig::load_from("does/not/exist.toml").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
