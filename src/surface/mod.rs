// Surface module - Double-buffered indexed-color display surfaces
//
// A surface owns:
// - a raw 8-bit pixel buffer the emulator renders into (rows `pitch` apart)
// - two picture resources on the compositor (ping-pong buffers)
// - while shown, one element of the compositor's display list
//
// Frame flow:
//   renderer -> pixels_mut() -> frame_ready(true) copies into the hidden
//   resource -> swap() repoints the element at it in one transaction
//
// The lifecycle lives in `resources.rs` (allocate / clear / free) and the
// presentation protocol in `present.rs` (show / hide / frame_ready / swap).

pub mod buffer;
pub mod error;
mod present;
mod resources;

pub use buffer::{BufferIndex, PingPong};
pub use error::SurfaceError;
pub use present::swap_surfaces;

use crate::compositor::{DisplayHandle, ElementHandle, ResourceHandle, SharedCompositor};
use crate::config::SurfaceConfig;
use crate::layout::{Alignment, EdgePadding, LayoutParams, Rect};
use crate::palette::{PaletteMode, SharedPalette};

/// Row alignment of the raw pixel buffer, in bytes
pub const PITCH_ALIGN: usize = 32;

/// Round `value` up to a multiple of `align` (a power of two)
#[inline]
pub const fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

/// Sizes involved in placing a surface on the display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dimensions {
    /// Display width in pixels
    pub display_width: i32,
    /// Display height in pixels
    pub display_height: i32,
    /// Width of the shown image region
    pub src_width: i32,
    /// Height of the shown image region
    pub src_height: i32,
    /// Width of the image on the display
    pub dest_width: i32,
    /// Height of the image on the display
    pub dest_height: i32,
}

/// A double-buffered, indexed-color surface on a compositor display
///
/// Dropping a surface hides it and frees its resources.
pub struct Surface {
    /// Compositor shared with the other surfaces of the display
    compositor: SharedCompositor,

    /// Palette tables shared with the other surfaces of the display
    palette: SharedPalette,

    /// Display the surface was allocated on
    display: Option<DisplayHandle>,

    /// Cached display bounds, refreshed by `allocate`
    display_width: i32,
    display_height: i32,

    /// Logical image size
    width: u32,
    height: u32,

    /// Row stride of `pixels` in bytes
    pitch: usize,

    /// Raw render target, `pitch * height` bytes
    pixels: Vec<u8>,

    /// The two picture resources; `Some` exactly while allocated
    resources: Option<PingPong<ResourceHandle>>,

    /// Resources whose release failed; retried by the next `free()`
    orphans: Vec<ResourceHandle>,

    /// Resource the element currently samples
    active: BufferIndex,

    /// Display-list element; `Some` exactly while showing
    element: Option<ElementHandle>,

    /// Shown region of the image, in whole pixels
    src_rect: Rect,

    /// Placement computed by the last `show()`
    dest_rect: Rect,

    /// Region copied by `frame_ready()`
    copy_rect: Rect,

    /// Z-order of the element
    layer: i32,

    /// Selects the palette table and alpha mode
    transparency: bool,

    /// Aspect, alignment and padding
    layout: LayoutParams,
}

impl Surface {
    /// Create an unallocated surface
    ///
    /// # Arguments
    /// * `compositor` - Compositor the surface will be shown on
    /// * `palette` - Palette registry shared by the display's surfaces
    pub fn new(compositor: SharedCompositor, palette: SharedPalette) -> Self {
        Self {
            compositor,
            palette,
            display: None,
            display_width: 0,
            display_height: 0,
            width: 0,
            height: 0,
            pitch: 0,
            pixels: Vec::new(),
            resources: None,
            orphans: Vec::new(),
            active: BufferIndex::A,
            element: None,
            src_rect: Rect::default(),
            dest_rect: Rect::default(),
            copy_rect: Rect::default(),
            layer: 0,
            transparency: false,
            layout: LayoutParams::new(),
        }
    }

    /// Whether buffer and resources exist
    pub fn is_allocated(&self) -> bool {
        self.resources.is_some()
    }

    /// Whether the surface is on the display list
    pub fn is_showing(&self) -> bool {
        self.element.is_some()
    }

    /// Image width in pixels (0 when unallocated)
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels (0 when unallocated)
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row stride of the pixel buffer in bytes (0 when unallocated)
    pub fn pitch(&self) -> usize {
        self.pitch
    }

    /// The raw pixel buffer
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// The raw pixel buffer, for rendering
    ///
    /// Row `y` starts at `y * pitch()`; bytes past `width()` in a row are
    /// padding and never shown.
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Buffer the display element currently samples
    pub fn active_buffer(&self) -> BufferIndex {
        self.active
    }

    /// Picture resource backing one of the buffers
    pub fn resource(&self, index: BufferIndex) -> Option<ResourceHandle> {
        self.resources.map(|r| r[index])
    }

    /// Display-list element while showing
    pub fn element(&self) -> Option<ElementHandle> {
        self.element
    }

    /// Z-order of the element
    pub fn layer(&self) -> i32 {
        self.layer
    }

    /// Whether the surface uses the transparent palette
    pub fn transparency(&self) -> bool {
        self.transparency
    }

    /// Current layout settings
    pub fn layout(&self) -> &LayoutParams {
        &self.layout
    }

    /// Shown region of the image
    pub fn src_rect(&self) -> Rect {
        self.src_rect
    }

    /// Placement computed by the last `show()`
    pub fn dest_rect(&self) -> Rect {
        self.dest_rect
    }

    /// Region copied by `frame_ready()`
    pub fn copy_rect(&self) -> Rect {
        self.copy_rect
    }

    /// Display, source and destination sizes
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            display_width: self.display_width,
            display_height: self.display_height,
            src_width: self.src_rect.width,
            src_height: self.src_rect.height,
            dest_width: self.dest_rect.width,
            dest_height: self.dest_rect.height,
        }
    }

    /// The palette registry this surface draws from
    pub fn palette(&self) -> &SharedPalette {
        &self.palette
    }

    /// The compositor this surface is shown on
    pub fn compositor(&self) -> &SharedCompositor {
        &self.compositor
    }

    // Configuration. Layout settings take effect on the next `show()`.

    /// Set the target aspect ratio
    ///
    /// # Panics
    /// Panics if `aspect` is zero or not finite
    pub fn set_aspect(&mut self, aspect: f64) {
        assert!(
            aspect != 0.0 && aspect.is_finite(),
            "aspect ratio must be finite and non-zero, got {}",
            aspect
        );
        self.layout.aspect = aspect;
    }

    /// Set horizontal alignment and its padding in pixels
    pub fn set_horizontal_alignment(&mut self, align: Alignment, padding: i32) {
        self.layout.h_align = align;
        self.layout.h_padding = padding;
    }

    /// Set vertical alignment and its padding in pixels
    pub fn set_vertical_alignment(&mut self, align: Alignment, padding: i32) {
        self.layout.v_align = align;
        self.layout.v_padding = padding;
    }

    /// Reserve display margins (fractions of the display size)
    pub fn set_edge_padding(&mut self, edges: EdgePadding) {
        self.layout.edges = edges;
    }

    /// Shift a centered image by (cx, cy) pixels
    pub fn set_center_offset(&mut self, cx: i32, cy: i32) {
        self.layout.center_offset_x = cx;
        self.layout.center_offset_y = cy;
    }

    /// Replace all layout settings at once
    pub fn set_layout(&mut self, layout: LayoutParams) {
        self.set_aspect(layout.aspect);
        self.layout = layout;
    }

    /// Select the region of the image that is shown
    ///
    /// Reset to the whole image by `allocate()`.
    ///
    /// # Panics
    /// Panics if the region cannot be expressed in 16.16 fixed point
    pub fn set_src_rect(&mut self, x: i32, y: i32, width: i32, height: i32) {
        let rect = Rect::new(x, y, width, height);
        assert!(
            rect.fits_subpixel(),
            "source region {:?} exceeds the 16.16 range",
            rect
        );
        self.src_rect = rect;
    }

    /// Select the region `frame_ready()` copies
    ///
    /// # Panics
    /// Panics if the surface is unallocated or the region leaves the image
    pub fn set_copy_rect(&mut self, rect: Rect) {
        assert!(self.is_allocated(), "set_copy_rect() on an unallocated surface");
        let bounds = Rect::from_size(self.width as i32, self.height as i32);
        assert!(
            !rect.is_empty() && bounds.contains_rect(&rect),
            "copy region {:?} outside {}x{} image",
            rect,
            self.width,
            self.height
        );
        self.copy_rect = rect;
    }

    /// Set the Z-order of the element
    pub fn set_layer(&mut self, layer: i32) {
        self.layer = layer;
    }

    /// Choose between the opaque and transparent palette
    ///
    /// # Panics
    /// Panics if the surface is allocated; the palette mode is fixed while
    /// resources exist
    pub fn set_transparency(&mut self, transparency: bool) {
        assert!(
            !self.is_allocated(),
            "transparency cannot change while resources are allocated"
        );
        self.transparency = transparency;
    }

    /// Allocate and configure the surface from a config entry
    ///
    /// # Returns
    /// The row pitch of the pixel buffer
    pub fn configure(&mut self, config: &SurfaceConfig) -> Result<usize, SurfaceError> {
        if self.is_allocated() {
            self.free()?;
        }
        self.set_transparency(config.transparency);
        self.set_layer(config.layer);
        self.set_layout(config.layout());

        let pitch = self.allocate(config.width, config.height)?;
        if let Some(src) = config.src_rect {
            self.set_src_rect(src.x, src.y, src.width, src.height);
        }
        Ok(pitch)
    }

    // Palette

    fn palette_mode(&self) -> PaletteMode {
        PaletteMode::for_transparency(self.transparency)
    }

    /// Write an entry of the shared opaque palette
    ///
    /// Takes effect on screen after `update_palette()`.
    ///
    /// # Panics
    /// Panics if this surface uses the transparent palette
    pub fn set_palette_rgb565(&mut self, index: u8, rgb565: u16) {
        assert!(
            !self.transparency,
            "RGB565 palette entry written to a transparent surface"
        );
        self.palette.borrow_mut().set_opaque(index, rgb565);
    }

    /// Write an entry of the shared transparent palette
    ///
    /// Takes effect on screen after `update_palette()`.
    ///
    /// # Panics
    /// Panics if this surface uses the opaque palette
    pub fn set_palette_argb(&mut self, index: u8, argb: u32) {
        assert!(
            self.transparency,
            "ARGB palette entry written to an opaque surface"
        );
        self.palette.borrow_mut().set_transparent(index, argb);
    }

    /// Upload this surface's palette table to both of its resources
    ///
    /// Does nothing while unallocated.
    pub fn update_palette(&mut self) -> Result<(), SurfaceError> {
        let Some(resources) = self.resources else {
            return Ok(());
        };

        let palette = self.palette.borrow();
        let table = palette.table(self.palette_mode());
        let mut compositor = self.compositor.borrow_mut();
        for &resource in resources.both() {
            compositor.set_resource_palette(resource, table)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pitch", &self.pitch)
            .field("resources", &self.resources)
            .field("active", &self.active)
            .field("element", &self.element)
            .field("layer", &self.layer)
            .field("transparency", &self.transparency)
            .finish_non_exhaustive()
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        if self.is_allocated() || !self.orphans.is_empty() {
            if let Err(e) = self.free() {
                log::error!("Failed to free surface on drop: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::RecordingCompositor;
    use crate::palette::PaletteRegistry;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn surface() -> Surface {
        let compositor = Rc::new(RefCell::new(RecordingCompositor::new(800, 480)));
        Surface::new(compositor, PaletteRegistry::shared())
    }

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 32), 0);
        assert_eq!(align_up(1, 32), 32);
        assert_eq!(align_up(32, 32), 32);
        assert_eq!(align_up(33, 32), 64);
        assert_eq!(align_up(384, 32), 384);
        assert_eq!(align_up(403, 32), 416);
    }

    #[test]
    fn test_new_surface_is_unallocated() {
        let s = surface();
        assert!(!s.is_allocated());
        assert!(!s.is_showing());
        assert_eq!(s.pitch(), 0);
        assert!(s.pixels().is_empty());
        assert_eq!(s.active_buffer(), BufferIndex::A);
        assert_eq!(s.resource(BufferIndex::A), None);
    }

    #[test]
    fn test_layout_setters() {
        let mut s = surface();
        s.set_aspect(-1.25);
        s.set_horizontal_alignment(Alignment::End, 4);
        s.set_vertical_alignment(Alignment::Start, 2);
        s.set_center_offset(1, -1);

        let layout = s.layout();
        assert_eq!(layout.aspect, -1.25);
        assert_eq!(layout.h_align, Alignment::End);
        assert_eq!(layout.h_padding, 4);
        assert_eq!(layout.v_align, Alignment::Start);
        assert_eq!(layout.v_padding, 2);
        assert_eq!((layout.center_offset_x, layout.center_offset_y), (1, -1));
    }

    #[test]
    #[should_panic(expected = "aspect ratio must be finite and non-zero")]
    fn test_zero_aspect_is_rejected() {
        let mut s = surface();
        s.set_aspect(0.0);
    }

    #[test]
    #[should_panic(expected = "exceeds the 16.16 range")]
    fn test_src_rect_beyond_subpixel_range_is_rejected() {
        let mut s = surface();
        s.set_src_rect(0, 0, 40000, 2);
    }

    #[test]
    #[should_panic(expected = "RGB565 palette entry written to a transparent surface")]
    fn test_rgb565_entry_on_transparent_surface() {
        let mut s = surface();
        s.set_transparency(true);
        s.set_palette_rgb565(1, 0xFFFF);
    }

    #[test]
    #[should_panic(expected = "ARGB palette entry written to an opaque surface")]
    fn test_argb_entry_on_opaque_surface() {
        let mut s = surface();
        s.set_palette_argb(1, 0xFFFFFFFF);
    }

    #[test]
    fn test_palette_writes_reach_shared_registry() {
        let mut opaque = surface();
        let mut transparent = Surface::new(
            Rc::clone(opaque.compositor()),
            Rc::clone(opaque.palette()),
        );
        transparent.set_transparency(true);

        opaque.set_palette_rgb565(20, 0x07E0);
        transparent.set_palette_argb(20, 0x8000FF00);

        let registry = opaque.palette().borrow();
        assert_eq!(registry.opaque(20), 0x07E0);
        assert_eq!(registry.transparent(20), 0x8000FF00);
    }

    #[test]
    fn test_update_palette_unallocated_is_noop() {
        let mut s = surface();
        assert!(s.update_palette().is_ok());
    }
}
