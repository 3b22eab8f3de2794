// Compositor module - Capability interface to the display compositor
//
// Surfaces never talk to display hardware directly. Everything they need
// from the compositor is expressed by the `Compositor` trait:
// - opening the display and querying its bounds
// - creating, filling, re-paletting and destroying picture resources
// - atomic transactions that add, remove and re-source display elements
//
// Two implementations ship with the crate:
// - `SoftwareCompositor`: a software blitter that composes the display list
//   into an RGBA frame (used by the preview window and screenshots)
// - `RecordingCompositor`: a decorator that logs every call, for tests and
//   diagnostics

pub mod error;
pub mod recording;
pub mod software;

pub use error::CompositorError;
pub use recording::{CompositorCall, RecordedTransaction, RecordingCompositor};
pub use software::SoftwareCompositor;

use crate::layout::Rect;
use crate::palette::PaletteTable;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// Compositor shared between the surfaces of one display
///
/// The whole surface stack is single-threaded; `Rc<RefCell<_>>` keeps it
/// that way at compile time.
pub type SharedCompositor = Rc<RefCell<dyn Compositor>>;

/// Handle to an opened display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DisplayHandle(pub u32);

/// Handle to a picture resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceHandle(pub u32);

/// Handle to an element of the display list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementHandle(pub u32);

/// Handle to an open transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxnHandle(pub u32);

/// Pixel format of a picture resource
///
/// Only 8-bit palette indices are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormat {
    /// One byte per pixel, resolved through the resource palette
    Indexed8,
}

/// How an element blends with the layers beneath it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlphaMode {
    /// Every pixel replaces what is beneath it
    Opaque,
    /// Per-pixel alpha comes from the resource palette
    FromSource,
}

impl AlphaMode {
    /// Blending used by a surface with the given transparency flag
    pub fn for_transparency(transparency: bool) -> Self {
        if transparency {
            AlphaMode::FromSource
        } else {
            AlphaMode::Opaque
        }
    }
}

/// Everything needed to place a resource on the display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementDesc {
    /// Display the element belongs to
    pub display: DisplayHandle,
    /// Z-order; higher layers are drawn on top
    pub layer: i32,
    /// Placement on the display, in whole pixels
    pub dest: Rect,
    /// Resource sampled by the element
    pub resource: ResourceHandle,
    /// Sampled region of the resource, in 16.16 fixed point
    pub src: Rect,
    /// Blending mode
    pub alpha: AlphaMode,
}

/// Capability surface a display compositor must provide
///
/// Every call is synchronous. Element changes are only legal inside a
/// transaction and must become visible all at once when the transaction is
/// submitted; no partially applied transaction may ever be presented.
pub trait Compositor {
    /// Open the display (idempotent: repeated calls return the same handle)
    fn open_display(&mut self) -> Result<DisplayHandle, CompositorError>;

    /// Size of the display in pixels
    fn display_bounds(&self, display: DisplayHandle) -> Result<(u32, u32), CompositorError>;

    /// Create a picture resource
    fn create_resource(
        &mut self,
        format: ImageFormat,
        width: u32,
        height: u32,
    ) -> Result<ResourceHandle, CompositorError>;

    /// Destroy a picture resource
    fn destroy_resource(&mut self, resource: ResourceHandle) -> Result<(), CompositorError>;

    /// Copy a region of `pixels` into a resource
    ///
    /// `pixels` holds a whole image with rows `pitch` bytes apart; the
    /// pixels inside `rect` are copied to the same coordinates of the
    /// resource.
    fn write_resource(
        &mut self,
        resource: ResourceHandle,
        rect: Rect,
        pitch: usize,
        pixels: &[u8],
    ) -> Result<(), CompositorError>;

    /// Upload a palette to a resource
    fn set_resource_palette(
        &mut self,
        resource: ResourceHandle,
        palette: PaletteTable<'_>,
    ) -> Result<(), CompositorError>;

    /// Start a transaction
    fn begin_transaction(&mut self) -> Result<TxnHandle, CompositorError>;

    /// Apply a transaction atomically, blocking until it is on screen
    fn submit_transaction(&mut self, txn: TxnHandle) -> Result<(), CompositorError>;

    /// Discard a transaction and everything queued in it
    fn abort_transaction(&mut self, txn: TxnHandle) -> Result<(), CompositorError>;

    /// Queue a new element
    fn add_element(
        &mut self,
        txn: TxnHandle,
        desc: ElementDesc,
    ) -> Result<ElementHandle, CompositorError>;

    /// Queue removal of an element
    fn remove_element(
        &mut self,
        txn: TxnHandle,
        element: ElementHandle,
    ) -> Result<(), CompositorError>;

    /// Queue a change of the resource an element samples
    fn change_element_source(
        &mut self,
        txn: TxnHandle,
        element: ElementHandle,
        resource: ResourceHandle,
    ) -> Result<(), CompositorError>;
}

/// Run `ops` inside one transaction
///
/// The transaction is submitted if `ops` succeeds and aborted if it fails,
/// so no transaction is ever left open.
///
/// # Arguments
/// * `compositor` - Compositor to run the transaction on
/// * `ops` - Element operations to queue
///
/// # Returns
/// Whatever `ops` returned, once the transaction is on screen
pub fn run_transaction<C, T, F>(compositor: &mut C, ops: F) -> Result<T, CompositorError>
where
    C: Compositor + ?Sized,
    F: FnOnce(&mut C, TxnHandle) -> Result<T, CompositorError>,
{
    let txn = compositor.begin_transaction()?;
    match ops(compositor, txn) {
        Ok(value) => {
            compositor.submit_transaction(txn)?;
            Ok(value)
        }
        Err(e) => {
            if let Err(abort) = compositor.abort_transaction(txn) {
                log::error!("Failed to abort transaction {}: {}", txn.0, abort);
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alpha_mode_for_transparency() {
        assert_eq!(AlphaMode::for_transparency(true), AlphaMode::FromSource);
        assert_eq!(AlphaMode::for_transparency(false), AlphaMode::Opaque);
    }

    #[test]
    fn test_shared_compositor_coercion() {
        let concrete = Rc::new(RefCell::new(SoftwareCompositor::new(320, 200)));
        let shared: SharedCompositor = concrete.clone();

        let display = shared.borrow_mut().open_display().expect("open display");
        assert_eq!(shared.borrow().display_bounds(display), Ok((320, 200)));
        assert!(concrete.borrow().is_open());
    }

    #[test]
    fn test_run_transaction_submits_on_success() {
        let mut comp = SoftwareCompositor::new(8, 8);
        let value = run_transaction(&mut comp, |_, _| Ok(5)).unwrap();
        assert_eq!(value, 5);
        assert_eq!(comp.commit_count(), 1);
        assert_eq!(comp.open_transactions(), 0);
    }

    #[test]
    fn test_run_transaction_aborts_on_failure() {
        let mut comp = SoftwareCompositor::new(8, 8);
        let result: Result<(), _> = run_transaction(&mut comp, |c, txn| {
            c.change_element_source(txn, ElementHandle(3), ResourceHandle(4))
        });

        assert_eq!(result, Err(CompositorError::UnknownResource(ResourceHandle(4))));
        assert_eq!(comp.commit_count(), 0);
        assert_eq!(comp.open_transactions(), 0);
    }
}
