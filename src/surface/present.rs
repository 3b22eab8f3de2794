// Presentation - show / hide / frame_ready / swap
//
// Every display-list change goes through one compositor transaction so a
// frame is never shown half-updated. Swapping two surfaces together puts
// both source changes in the same transaction. A transaction whose element
// operations fail is aborted, never left open.

use super::{Surface, SurfaceError};
use crate::compositor::{run_transaction, AlphaMode, ElementDesc};
use crate::layout::compute_dest_rect;
use std::rc::Rc;

impl Surface {
    /// Put the surface on the display
    ///
    /// Layout settings are applied here; changes made while showing take
    /// effect on the next `hide()` / `show()` pair. Does nothing if already
    /// showing.
    ///
    /// # Panics
    /// Panics if the surface is unallocated
    pub fn show(&mut self) -> Result<(), SurfaceError> {
        let (display, resources) = match (self.display, self.resources) {
            (Some(display), Some(resources)) => (display, resources),
            _ => panic!("show() on an unallocated surface"),
        };
        if self.is_showing() {
            return Ok(());
        }

        let dest = compute_dest_rect(&self.layout, self.display_width, self.display_height);
        let desc = ElementDesc {
            display,
            layer: self.layer,
            dest,
            resource: resources[self.active],
            src: self.src_rect.to_subpixel(),
            alpha: AlphaMode::for_transparency(self.transparency),
        };

        let element = run_transaction(&mut *self.compositor.borrow_mut(), |c, txn| {
            c.add_element(txn, desc)
        })?;

        log::debug!(
            "Showing surface at {}x{}+{}+{} (layer {})",
            dest.width,
            dest.height,
            dest.x,
            dest.y,
            self.layer
        );

        self.dest_rect = dest;
        self.element = Some(element);
        Ok(())
    }

    /// Take the surface off the display
    ///
    /// Does nothing if not showing.
    pub fn hide(&mut self) -> Result<(), SurfaceError> {
        let Some(element) = self.element else {
            return Ok(());
        };

        run_transaction(&mut *self.compositor.borrow_mut(), |c, txn| {
            c.remove_element(txn, element)
        })?;

        self.element = None;
        Ok(())
    }

    /// Publish the pixel buffer into one of the resources
    ///
    /// Copies the copy region of the pixel buffer into the hidden resource
    /// (`to_offscreen == true`) or straight into the visible one. Neither
    /// visibility nor the active buffer changes.
    ///
    /// # Panics
    /// Panics if the surface is unallocated
    pub fn frame_ready(&mut self, to_offscreen: bool) -> Result<(), SurfaceError> {
        let Some(resources) = self.resources else {
            panic!("frame_ready() on an unallocated surface");
        };

        let target = if to_offscreen {
            self.active.other()
        } else {
            self.active
        };

        self.compositor.borrow_mut().write_resource(
            resources[target],
            self.copy_rect,
            self.pitch,
            &self.pixels,
        )?;
        log::trace!("Frame published to buffer {:?}", target);
        Ok(())
    }

    /// Show the hidden resource and make it the active one
    ///
    /// # Panics
    /// Panics if the surface is unallocated
    pub fn swap(&mut self) -> Result<(), SurfaceError> {
        swap_surfaces(self, None)
    }

    /// Publish the pixel buffer and, when `sync` is set, swap it in
    ///
    /// With `sync` the frame goes to the hidden resource and is swapped in
    /// atomically; without it the visible resource is overwritten in place.
    pub fn present_frame(&mut self, sync: bool) -> Result<(), SurfaceError> {
        self.frame_ready(sync)?;
        if sync {
            self.swap()?;
        }
        Ok(())
    }
}

/// Swap one or two surfaces in a single compositor transaction
///
/// Each surface's element is repointed at its hidden resource and its active
/// buffer flips. Hidden surfaces only flip. The active buffers change only
/// once the transaction has been submitted; on failure it is aborted and
/// nothing flips.
///
/// # Arguments
/// * `first` - Surface to swap
/// * `second` - Surface to swap in lock-step with `first`
///
/// # Panics
/// Panics if either surface is unallocated, or if the two surfaces are on
/// different compositors
pub fn swap_surfaces(
    first: &mut Surface,
    second: Option<&mut Surface>,
) -> Result<(), SurfaceError> {
    assert!(first.is_allocated(), "swap() on an unallocated surface");
    if let Some(second) = second.as_deref() {
        assert!(second.is_allocated(), "swap() on an unallocated surface");
        assert!(
            std::ptr::addr_eq(Rc::as_ptr(&first.compositor), Rc::as_ptr(&second.compositor)),
            "surfaces swapped together must share a compositor"
        );
    }

    let compositor = Rc::clone(&first.compositor);
    let mut surfaces: Vec<&mut Surface> = std::iter::once(first).chain(second).collect();

    run_transaction(&mut *compositor.borrow_mut(), |c, txn| {
        for surface in surfaces.iter() {
            if let (Some(element), Some(resources)) = (surface.element, surface.resources) {
                let hidden = resources[surface.active.other()];
                c.change_element_source(txn, element, hidden)?;
            }
        }
        Ok(())
    })?;

    for surface in surfaces.iter_mut() {
        surface.active = surface.active.other();
    }
    log::trace!("Swapped {} surface(s) in one transaction", surfaces.len());
    Ok(())
}
