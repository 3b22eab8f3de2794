// fblayer library
// Double-buffered, indexed-color display surfaces on a compositor

// Public modules
pub mod bank;
pub mod compositor;
pub mod config;
pub mod layout;
pub mod palette;
pub mod preview;
pub mod screenshot;
pub mod surface;

// Re-export main types for convenience
pub use bank::SurfaceBank;
pub use compositor::{
    Compositor, CompositorCall, CompositorError, RecordingCompositor, SharedCompositor,
    SoftwareCompositor,
};
pub use config::{DisplayConfig, FbConfig, PreviewConfig, SurfaceConfig};
pub use layout::{compute_dest_rect, Alignment, EdgePadding, LayoutParams, Rect};
pub use palette::{PaletteMode, PaletteRegistry, SharedPalette};
pub use preview::{run_preview, PreviewWindow};
pub use screenshot::{save_screenshot, ScreenshotError};
pub use surface::{swap_surfaces, BufferIndex, Dimensions, Surface, SurfaceError};
