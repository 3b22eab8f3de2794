// Common test utilities for surface integration tests
//
// Builds surfaces on a recording compositor so tests can check both the
// surface state and the exact compositor calls it produced.

#![allow(dead_code)]

use fblayer::compositor::{CompositorCall, RecordingCompositor};
use fblayer::palette::{PaletteRegistry, SharedPalette};
use fblayer::Surface;
use std::cell::RefCell;
use std::rc::Rc;

/// Display width used by the tests
pub const DISPLAY_WIDTH: u32 = 800;

/// Display height used by the tests
pub const DISPLAY_HEIGHT: u32 = 480;

/// Recording compositor shared between a test and its surfaces
pub type SharedRecorder = Rc<RefCell<RecordingCompositor>>;

/// Create a recording compositor for an 800x480 display
pub fn recorder() -> SharedRecorder {
    Rc::new(RefCell::new(RecordingCompositor::new(
        DISPLAY_WIDTH,
        DISPLAY_HEIGHT,
    )))
}

/// Create an unallocated surface on `compositor`
pub fn surface_on(compositor: &SharedRecorder, palette: &SharedPalette) -> Surface {
    Surface::new(compositor.clone(), Rc::clone(palette))
}

/// Create a recorder and an allocated, hidden surface on it
///
/// # Arguments
///
/// * `width` - Image width
/// * `height` - Image height
pub fn allocated(width: u32, height: u32) -> (SharedRecorder, Surface) {
    let compositor = recorder();
    let mut surface = surface_on(&compositor, &PaletteRegistry::shared());
    surface.allocate(width, height).expect("Failed to allocate surface");
    (compositor, surface)
}

/// Create a recorder and an allocated, showing surface on it
pub fn showing(width: u32, height: u32) -> (SharedRecorder, Surface) {
    let (compositor, mut surface) = allocated(width, height);
    surface.show().expect("Failed to show surface");
    (compositor, surface)
}

/// Short name of a recorded call, for order assertions
pub fn call_name(call: &CompositorCall) -> &'static str {
    match call {
        CompositorCall::OpenDisplay { .. } => "open_display",
        CompositorCall::CreateResource { .. } => "create_resource",
        CompositorCall::DestroyResource { .. } => "destroy_resource",
        CompositorCall::WriteResource { .. } => "write_resource",
        CompositorCall::SetResourcePalette { .. } => "set_resource_palette",
        CompositorCall::BeginTransaction { .. } => "begin_transaction",
        CompositorCall::SubmitTransaction { .. } => "submit_transaction",
        CompositorCall::AbortTransaction { .. } => "abort_transaction",
        CompositorCall::AddElement { .. } => "add_element",
        CompositorCall::RemoveElement { .. } => "remove_element",
        CompositorCall::ChangeElementSource { .. } => "change_element_source",
    }
}

/// Names of every call recorded so far
pub fn call_names(compositor: &SharedRecorder) -> Vec<&'static str> {
    compositor.borrow().calls().iter().map(call_name).collect()
}
