// Surface bank - The surfaces of one display
//
// All surfaces in a bank share one compositor and one palette registry.
// `frames_ready` publishes one or two surfaces and swaps them in a single
// transaction, so two video outputs of one machine present in lock-step.

use crate::compositor::SharedCompositor;
use crate::config::FbConfig;
use crate::palette::{PaletteRegistry, SharedPalette};
use crate::surface::{swap_surfaces, Surface, SurfaceError};
use std::rc::Rc;

/// The surfaces of one display
pub struct SurfaceBank {
    compositor: SharedCompositor,
    palette: SharedPalette,
    surfaces: Vec<Surface>,
}

impl SurfaceBank {
    /// Create an empty bank with a fresh palette registry
    pub fn new(compositor: SharedCompositor) -> Self {
        Self::with_palette(compositor, PaletteRegistry::shared())
    }

    /// Create an empty bank drawing from an existing palette registry
    pub fn with_palette(compositor: SharedCompositor, palette: SharedPalette) -> Self {
        Self {
            compositor,
            palette,
            surfaces: Vec::new(),
        }
    }

    /// Allocate and show one surface per config entry
    ///
    /// Surfaces appear in the bank in config order.
    pub fn from_config(
        compositor: SharedCompositor,
        config: &FbConfig,
    ) -> Result<Self, SurfaceError> {
        let mut bank = Self::new(compositor);
        for entry in &config.surfaces {
            let index = bank.add_surface();
            let surface = &mut bank.surfaces[index];
            surface.configure(entry)?;
            surface.show()?;
        }
        log::info!("Surface bank ready with {} surface(s)", bank.len());
        Ok(bank)
    }

    /// Add an unallocated surface and return its index
    pub fn add_surface(&mut self) -> usize {
        self.surfaces.push(Surface::new(
            Rc::clone(&self.compositor),
            Rc::clone(&self.palette),
        ));
        self.surfaces.len() - 1
    }

    /// Number of surfaces
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    /// Whether the bank has no surfaces
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Get a surface by index
    pub fn get(&self, index: usize) -> Option<&Surface> {
        self.surfaces.get(index)
    }

    /// Get a surface by index, mutably
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Surface> {
        self.surfaces.get_mut(index)
    }

    /// Iterate over the surfaces
    pub fn iter(&self) -> impl Iterator<Item = &Surface> {
        self.surfaces.iter()
    }

    /// The shared palette registry
    pub fn palette(&self) -> &SharedPalette {
        &self.palette
    }

    /// The shared compositor
    pub fn compositor(&self) -> &SharedCompositor {
        &self.compositor
    }

    /// Push the current palette tables to every allocated surface
    pub fn update_palettes(&mut self) -> Result<(), SurfaceError> {
        for surface in &mut self.surfaces {
            surface.update_palette()?;
        }
        Ok(())
    }

    /// Publish the frames of one or two surfaces
    ///
    /// With `sync` each frame goes to its surface's hidden resource and both
    /// surfaces are swapped in one transaction. Without it the visible
    /// resources are overwritten in place.
    ///
    /// # Arguments
    /// * `first` - Index of the first surface
    /// * `second` - Index of a surface to present in lock-step
    /// * `sync` - Swap after publishing
    ///
    /// # Panics
    /// Panics if an index is out of range, the two indices are equal, or a
    /// surface is unallocated
    pub fn frames_ready(
        &mut self,
        first: usize,
        second: Option<usize>,
        sync: bool,
    ) -> Result<(), SurfaceError> {
        let Some(second) = second else {
            return self.surfaces[first].present_frame(sync);
        };

        let (a, b) = self.pair_mut(first, second);
        a.frame_ready(sync)?;
        b.frame_ready(sync)?;
        if sync {
            swap_surfaces(a, Some(b))?;
        }
        Ok(())
    }

    fn pair_mut(&mut self, first: usize, second: usize) -> (&mut Surface, &mut Surface) {
        assert_ne!(first, second, "cannot present a surface in lock-step with itself");
        if first < second {
            let (lo, hi) = self.surfaces.split_at_mut(second);
            (&mut lo[first], &mut hi[0])
        } else {
            let (lo, hi) = self.surfaces.split_at_mut(first);
            (&mut hi[0], &mut lo[second])
        }
    }
}

impl std::fmt::Debug for SurfaceBank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceBank")
            .field("surfaces", &self.surfaces)
            .finish_non_exhaustive()
    }
}
