// Surface lifecycle - allocate / clear / free
//
// Acquisition is all-or-nothing: if the display cannot be opened or either
// resource cannot be created, everything acquired so far is released and
// the surface stays unallocated.

use super::{align_up, BufferIndex, PingPong, Surface, SurfaceError, PITCH_ALIGN};
use crate::compositor::{CompositorError, ImageFormat};
use crate::layout::{Rect, MAX_SUBPIXEL_COORD};

impl Surface {
    /// Allocate the pixel buffer and both picture resources
    ///
    /// Frees any previous allocation first. The source and copy regions are
    /// reset to the whole image, buffer A becomes active and the surface's
    /// palette is uploaded to both resources.
    ///
    /// # Arguments
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    ///
    /// # Returns
    /// The row pitch of the pixel buffer (`width` rounded up to 32)
    ///
    /// Sizes the 16.16 source rectangle cannot express (above
    /// `MAX_SUBPIXEL_COORD`) are rejected before anything is released or
    /// acquired.
    pub fn allocate(&mut self, width: u32, height: u32) -> Result<usize, SurfaceError> {
        let alloc_err = |source: CompositorError| SurfaceError::Allocation {
            width,
            height,
            source,
        };

        let limit = MAX_SUBPIXEL_COORD as u32;
        if width > limit || height > limit {
            return Err(alloc_err(CompositorError::InvalidDimensions { width, height }));
        }

        if self.is_allocated() {
            self.free()?;
        }

        let resources = {
            let mut compositor = self.compositor.borrow_mut();

            let display = compositor.open_display().map_err(alloc_err)?;
            let (display_width, display_height) =
                compositor.display_bounds(display).map_err(alloc_err)?;

            let first = compositor
                .create_resource(ImageFormat::Indexed8, width, height)
                .map_err(alloc_err)?;
            let second = match compositor.create_resource(ImageFormat::Indexed8, width, height) {
                Ok(second) => second,
                Err(e) => {
                    if let Err(cleanup) = compositor.destroy_resource(first) {
                        log::error!("Failed to release resource {}: {}", first.0, cleanup);
                        self.orphans.push(first);
                    }
                    return Err(alloc_err(e));
                }
            };

            self.display = Some(display);
            self.display_width = display_width as i32;
            self.display_height = display_height as i32;
            PingPong::new(first, second)
        };

        let pitch = align_up(width as usize, PITCH_ALIGN);
        self.width = width;
        self.height = height;
        self.pitch = pitch;
        self.pixels = vec![0; pitch * height as usize];
        self.resources = Some(resources);
        self.active = BufferIndex::A;

        let full = Rect::from_size(width as i32, height as i32);
        self.src_rect = full;
        self.copy_rect = full;
        self.dest_rect = full;

        log::debug!(
            "Allocated {}x{} surface (pitch {}, resources {} / {})",
            width,
            height,
            pitch,
            resources[BufferIndex::A].0,
            resources[BufferIndex::B].0
        );

        self.update_palette()?;
        Ok(pitch)
    }

    /// Zero the whole pixel buffer, padding included
    ///
    /// The resources are not touched until the next `frame_ready()`.
    ///
    /// # Panics
    /// Panics if the surface is unallocated
    pub fn clear(&mut self) {
        assert!(self.is_allocated(), "clear() on an unallocated surface");
        self.pixels.fill(0);
    }

    /// Hide the surface and release its buffer and resources
    ///
    /// Safe to call on an unallocated surface. If hiding fails nothing is
    /// released and the surface stays allocated and showing. Otherwise every
    /// resource release is attempted and the first failure is returned;
    /// resources that could not be destroyed are kept and retried by the
    /// next `free()`.
    pub fn free(&mut self) -> Result<(), SurfaceError> {
        self.hide()?;

        let mut result = Ok(());
        let mut pending = std::mem::take(&mut self.orphans);
        if let Some(resources) = self.resources.take() {
            pending.extend(resources.both().into_iter().copied());
            log::debug!("Freeing {}x{} surface", self.width, self.height);
        }

        {
            let mut compositor = self.compositor.borrow_mut();
            for resource in pending {
                if let Err(e) = compositor.destroy_resource(resource) {
                    log::error!("Failed to destroy resource {}: {}", resource.0, e);
                    self.orphans.push(resource);
                    if result.is_ok() {
                        result = Err(e.into());
                    }
                }
            }
        }

        self.display = None;
        self.width = 0;
        self.height = 0;
        self.pitch = 0;
        self.pixels = Vec::new();
        self.active = BufferIndex::A;

        result
    }
}

#[cfg(test)]
mod tests {
    use crate::compositor::{
        run_transaction, AlphaMode, Compositor, CompositorCall, CompositorError, ElementDesc,
        RecordingCompositor,
    };
    use crate::layout::Rect;
    use crate::palette::PaletteRegistry;
    use crate::surface::{BufferIndex, Surface, SurfaceError};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn setup() -> (Rc<RefCell<RecordingCompositor>>, Surface) {
        let compositor = Rc::new(RefCell::new(RecordingCompositor::new(800, 480)));
        let surface = Surface::new(compositor.clone(), PaletteRegistry::shared());
        (compositor, surface)
    }

    #[test]
    fn test_allocate_sets_up_buffers() {
        let (compositor, mut s) = setup();
        let pitch = s.allocate(384, 272).unwrap();

        assert_eq!(pitch, 384);
        assert!(s.is_allocated());
        assert_eq!(s.pixels().len(), 384 * 272);
        assert_eq!(s.active_buffer(), BufferIndex::A);
        assert_ne!(s.resource(BufferIndex::A), s.resource(BufferIndex::B));
        assert_eq!(s.dimensions().display_width, 800);
        assert_eq!(s.dimensions().src_width, 384);

        let rec = compositor.borrow();
        assert_eq!(rec.inner().resource_count(), 2);
        assert_eq!(
            rec.count(|c| matches!(c, CompositorCall::SetResourcePalette { .. })),
            2
        );
    }

    #[test]
    fn test_pitch_is_aligned() {
        let (_compositor, mut s) = setup();
        assert_eq!(s.allocate(1, 1).unwrap(), 32);
        assert_eq!(s.allocate(403, 10).unwrap(), 416);
        assert_eq!(s.pixels().len(), 416 * 10);
    }

    #[test]
    fn test_oversized_allocation_is_rejected() {
        let (compositor, mut s) = setup();
        s.allocate(64, 64).unwrap();

        let err = s.allocate(40000, 2).unwrap_err();
        assert_eq!(
            err,
            SurfaceError::Allocation {
                width: 40000,
                height: 2,
                source: CompositorError::InvalidDimensions {
                    width: 40000,
                    height: 2
                },
            }
        );
        assert_eq!(s.width(), 64);
        assert_eq!(compositor.borrow().inner().resource_count(), 2);
    }

    #[test]
    fn test_reallocate_releases_previous_resources() {
        let (compositor, mut s) = setup();
        s.allocate(64, 64).unwrap();
        s.allocate(128, 32).unwrap();

        let rec = compositor.borrow();
        assert_eq!(rec.inner().resource_count(), 2);
        assert_eq!(
            rec.count(|c| matches!(c, CompositorCall::DestroyResource { .. })),
            2
        );
    }

    #[test]
    fn test_clear_zeroes_padding() {
        let (_compositor, mut s) = setup();
        s.allocate(40, 4).unwrap();
        s.pixels_mut().fill(0xAB);
        s.clear();
        assert_eq!(s.pixels().len(), 64 * 4);
        assert!(s.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    #[should_panic(expected = "clear() on an unallocated surface")]
    fn test_clear_unallocated_panics() {
        let (_compositor, mut s) = setup();
        s.clear();
    }

    #[test]
    fn test_second_resource_failure_leaks_nothing() {
        let (compositor, mut s) = setup();
        compositor.borrow_mut().fail_resource_creation_after(1);

        let err = s.allocate(64, 64).unwrap_err();
        assert!(matches!(err, SurfaceError::Allocation { width: 64, height: 64, .. }));
        assert!(!s.is_allocated());
        assert_eq!(compositor.borrow().inner().resource_count(), 0);
    }

    #[test]
    fn test_failed_hide_keeps_surface_allocated() {
        let (compositor, mut s) = setup();
        s.allocate(64, 64).unwrap();
        s.show().unwrap();
        compositor.borrow_mut().set_refuse_elements(true);

        assert!(s.free().is_err());
        assert!(s.is_allocated());
        assert!(s.is_showing());
        assert_eq!(compositor.borrow().inner().resource_count(), 2);
        assert_eq!(
            compositor
                .borrow()
                .count(|c| matches!(c, CompositorCall::DestroyResource { .. })),
            0
        );

        compositor.borrow_mut().set_refuse_elements(false);
        s.free().unwrap();
        assert!(!s.is_allocated());
        assert_eq!(compositor.borrow().inner().resource_count(), 0);
    }

    #[test]
    fn test_resource_still_in_use_is_retried_by_next_free() {
        let (compositor, mut s) = setup();
        s.allocate(64, 64).unwrap();
        let held = s.resource(BufferIndex::A).unwrap();

        // Another element keeps sampling resource A
        let element = {
            let mut rec = compositor.borrow_mut();
            let display = rec.open_display().unwrap();
            let desc = ElementDesc {
                display,
                layer: 0,
                dest: Rect::from_size(64, 64),
                resource: held,
                src: Rect::from_size(64, 64).to_subpixel(),
                alpha: AlphaMode::Opaque,
            };
            run_transaction(&mut *rec, |c, txn| c.add_element(txn, desc)).unwrap()
        };

        assert!(matches!(
            s.free(),
            Err(SurfaceError::Compositor(CompositorError::ResourceInUse(r))) if r == held
        ));
        assert!(!s.is_allocated());
        assert_eq!(compositor.borrow().inner().resource_count(), 1);

        run_transaction(&mut *compositor.borrow_mut(), |c, txn| {
            c.remove_element(txn, element)
        })
        .unwrap();
        s.free().unwrap();
        assert_eq!(compositor.borrow().inner().resource_count(), 0);
    }

    #[test]
    fn test_free_twice_is_harmless() {
        let (compositor, mut s) = setup();
        s.allocate(64, 64).unwrap();
        s.free().unwrap();
        s.free().unwrap();

        assert!(!s.is_allocated());
        assert_eq!(s.pitch(), 0);
        assert_eq!(compositor.borrow().inner().resource_count(), 0);
    }
}
