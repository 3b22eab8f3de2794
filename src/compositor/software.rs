// Software compositor - A CPU blitter implementing the Compositor trait
//
// Resources live in plain byte vectors with a private palette copy. The
// committed display list is only ever replaced wholesale when a
// transaction is submitted, so `compose()` can never observe a half
// applied transaction.
//
// Composition draws elements in ascending layer order (ties keep creation
// order) with nearest-neighbour scaling from the 16.16 source rectangle to
// the destination rectangle.

use super::{
    AlphaMode, Compositor, CompositorError, DisplayHandle, ElementDesc, ElementHandle,
    ImageFormat, ResourceHandle, TxnHandle,
};
use crate::layout::Rect;
use crate::palette::{OwnedPaletteTable, PaletteTable};
use std::collections::{BTreeMap, HashMap};

/// The single display this compositor drives
const DISPLAY: DisplayHandle = DisplayHandle(0);

/// A picture resource held in system memory
#[derive(Debug, Clone)]
struct SoftResource {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    palette: Option<OwnedPaletteTable>,
}

/// One queued display-list change
#[derive(Debug, Clone, Copy)]
enum TxnOp {
    Add(ElementHandle, ElementDesc),
    Remove(ElementHandle),
    ChangeSource(ElementHandle, ResourceHandle),
}

/// Software implementation of a display compositor
#[derive(Debug)]
pub struct SoftwareCompositor {
    /// Display width in pixels
    width: u32,

    /// Display height in pixels
    height: u32,

    /// Whether `open_display` has been called
    open: bool,

    /// Next handle value (shared by every handle kind)
    next_handle: u32,

    /// Live picture resources
    resources: HashMap<ResourceHandle, SoftResource>,

    /// Committed display list, keyed by handle (creation order)
    elements: BTreeMap<ElementHandle, ElementDesc>,

    /// Open transactions and their queued changes
    pending: HashMap<TxnHandle, Vec<TxnOp>>,

    /// Number of successfully submitted transactions
    commits: u64,
}

impl SoftwareCompositor {
    /// Create a compositor for a display of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            open: false,
            next_handle: 1,
            resources: HashMap::new(),
            elements: BTreeMap::new(),
            pending: HashMap::new(),
            commits: 0,
        }
    }

    /// Display width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Display height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the display has been opened
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Number of live resources
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Number of committed elements
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Number of transactions applied so far
    pub fn commit_count(&self) -> u64 {
        self.commits
    }

    /// Number of transactions begun but neither submitted nor aborted
    pub fn open_transactions(&self) -> usize {
        self.pending.len()
    }

    /// Contents of a resource (width * height palette indices)
    pub fn resource_pixels(&self, resource: ResourceHandle) -> Option<&[u8]> {
        self.resources.get(&resource).map(|r| r.pixels.as_slice())
    }

    /// Palette last uploaded to a resource
    pub fn resource_palette(&self, resource: ResourceHandle) -> Option<PaletteTable<'_>> {
        self.resources
            .get(&resource)
            .and_then(|r| r.palette.as_ref())
            .map(OwnedPaletteTable::as_table)
    }

    /// A committed element
    pub fn element(&self, element: ElementHandle) -> Option<&ElementDesc> {
        self.elements.get(&element)
    }

    /// All committed elements in creation order
    pub fn elements(&self) -> impl Iterator<Item = (ElementHandle, &ElementDesc)> {
        self.elements.iter().map(|(h, s)| (*h, s))
    }

    /// Compose the committed display list into an RGBA frame
    ///
    /// # Arguments
    /// * `frame` - Output buffer, at least `width * height * 4` bytes
    ///
    /// # Panics
    /// Panics if the output buffer is too small
    pub fn compose(&self, frame: &mut [u8]) {
        let size = self.width as usize * self.height as usize * 4;
        assert!(
            frame.len() >= size,
            "Output buffer too small for {}x{} frame",
            self.width,
            self.height
        );

        for pixel in frame[..size].chunks_exact_mut(4) {
            pixel.copy_from_slice(&[0x00, 0x00, 0x00, 0xFF]);
        }

        let mut order: Vec<&ElementDesc> = self.elements.values().collect();
        order.sort_by_key(|desc| desc.layer);

        for desc in order {
            self.blit(desc, frame);
        }
    }

    /// Compose into a freshly allocated RGBA frame
    pub fn compose_to_vec(&self) -> Vec<u8> {
        let mut frame = vec![0u8; self.width as usize * self.height as usize * 4];
        self.compose(&mut frame);
        frame
    }

    fn blit(&self, desc: &ElementDesc, frame: &mut [u8]) {
        let Some(resource) = self.resources.get(&desc.resource) else {
            return;
        };
        let Some(palette) = resource.palette.as_ref().map(OwnedPaletteTable::as_table) else {
            return;
        };
        let dest = desc.dest;
        let src = desc.src;
        if dest.is_empty() || src.is_empty() {
            return;
        }

        let x0 = dest.x.max(0);
        let x1 = dest.right().min(self.width as i32);
        let y0 = dest.y.max(0);
        let y1 = dest.bottom().min(self.height as i32);

        for y in y0..y1 {
            let sy = sample(src.y, src.height, y - dest.y, dest.height);
            if sy < 0 || sy >= resource.height as i64 {
                continue;
            }
            let row = sy as usize * resource.width as usize;

            for x in x0..x1 {
                let sx = sample(src.x, src.width, x - dest.x, dest.width);
                if sx < 0 || sx >= resource.width as i64 {
                    continue;
                }

                let rgba = palette.rgba(resource.pixels[row + sx as usize]);
                let alpha = match desc.alpha {
                    AlphaMode::Opaque => 0xFF,
                    AlphaMode::FromSource => rgba[3],
                };

                let offset = (y as usize * self.width as usize + x as usize) * 4;
                blend(&mut frame[offset..offset + 4], rgba, alpha);
            }
        }
    }

    fn alloc_handle(&mut self) -> u32 {
        let handle = self.next_handle;
        self.next_handle = self.next_handle.wrapping_add(1);
        handle
    }

    fn pending_mut(&mut self, txn: TxnHandle) -> Result<&mut Vec<TxnOp>, CompositorError> {
        self.pending
            .get_mut(&txn)
            .ok_or(CompositorError::UnknownTransaction(txn))
    }

    fn check_resource(&self, resource: ResourceHandle) -> Result<(), CompositorError> {
        if self.resources.contains_key(&resource) {
            Ok(())
        } else {
            Err(CompositorError::UnknownResource(resource))
        }
    }
}

/// Map a destination offset to a whole source pixel through a 16.16 span
#[inline]
fn sample(src_origin: i32, src_span: i32, dest_offset: i32, dest_span: i32) -> i64 {
    let fixed =
        src_origin as i64 + (dest_offset as i64 * src_span as i64) / dest_span as i64;
    fixed >> crate::layout::SUBPIXEL_SHIFT
}

/// Blend an RGBA color over an opaque destination pixel
#[inline]
fn blend(dst: &mut [u8], src: [u8; 4], alpha: u8) {
    match alpha {
        0x00 => {}
        0xFF => dst[..3].copy_from_slice(&src[..3]),
        a => {
            let a = a as u16;
            for i in 0..3 {
                dst[i] = ((src[i] as u16 * a + dst[i] as u16 * (255 - a)) / 255) as u8;
            }
        }
    }
    dst[3] = 0xFF;
}

impl Compositor for SoftwareCompositor {
    fn open_display(&mut self) -> Result<DisplayHandle, CompositorError> {
        self.open = true;
        Ok(DISPLAY)
    }

    fn display_bounds(&self, display: DisplayHandle) -> Result<(u32, u32), CompositorError> {
        if !self.open || display != DISPLAY {
            return Err(CompositorError::UnknownDisplay(display));
        }
        Ok((self.width, self.height))
    }

    fn create_resource(
        &mut self,
        format: ImageFormat,
        width: u32,
        height: u32,
    ) -> Result<ResourceHandle, CompositorError> {
        let ImageFormat::Indexed8 = format;
        if width == 0 || height == 0 {
            return Err(CompositorError::InvalidDimensions { width, height });
        }

        let handle = ResourceHandle(self.alloc_handle());
        self.resources.insert(
            handle,
            SoftResource {
                width,
                height,
                pixels: vec![0; width as usize * height as usize],
                palette: None,
            },
        );
        Ok(handle)
    }

    fn destroy_resource(&mut self, resource: ResourceHandle) -> Result<(), CompositorError> {
        self.check_resource(resource)?;
        if self.elements.values().any(|desc| desc.resource == resource) {
            return Err(CompositorError::ResourceInUse(resource));
        }
        self.resources.remove(&resource);
        Ok(())
    }

    fn write_resource(
        &mut self,
        resource: ResourceHandle,
        rect: Rect,
        pitch: usize,
        pixels: &[u8],
    ) -> Result<(), CompositorError> {
        let target = self
            .resources
            .get_mut(&resource)
            .ok_or(CompositorError::UnknownResource(resource))?;

        let bounds = Rect::from_size(target.width as i32, target.height as i32);
        if rect.is_empty() || !bounds.contains_rect(&rect) {
            return Err(CompositorError::RegionOutOfBounds {
                rect,
                width: target.width,
                height: target.height,
            });
        }

        let needed = (rect.bottom() as usize - 1) * pitch + rect.right() as usize;
        if pitch < rect.right() as usize || pixels.len() < needed {
            return Err(CompositorError::BufferTooSmall {
                needed,
                available: pixels.len(),
            });
        }

        let width = target.width as usize;
        let (x, w) = (rect.x as usize, rect.width as usize);
        for y in rect.y as usize..rect.bottom() as usize {
            let from = y * pitch + x;
            let to = y * width + x;
            target.pixels[to..to + w].copy_from_slice(&pixels[from..from + w]);
        }
        Ok(())
    }

    fn set_resource_palette(
        &mut self,
        resource: ResourceHandle,
        palette: PaletteTable<'_>,
    ) -> Result<(), CompositorError> {
        let target = self
            .resources
            .get_mut(&resource)
            .ok_or(CompositorError::UnknownResource(resource))?;
        target.palette = Some(palette.into());
        Ok(())
    }

    fn begin_transaction(&mut self) -> Result<TxnHandle, CompositorError> {
        let txn = TxnHandle(self.alloc_handle());
        self.pending.insert(txn, Vec::new());
        Ok(txn)
    }

    fn submit_transaction(&mut self, txn: TxnHandle) -> Result<(), CompositorError> {
        let ops = self
            .pending
            .remove(&txn)
            .ok_or(CompositorError::UnknownTransaction(txn))?;

        // Apply to a copy; the committed list changes only if every op succeeds
        let mut next = self.elements.clone();
        for op in ops {
            match op {
                TxnOp::Add(handle, desc) => {
                    self.check_resource(desc.resource)?;
                    next.insert(handle, desc);
                }
                TxnOp::Remove(handle) => {
                    next.remove(&handle)
                        .ok_or(CompositorError::UnknownElement(handle))?;
                }
                TxnOp::ChangeSource(handle, resource) => {
                    self.check_resource(resource)?;
                    let desc = next
                        .get_mut(&handle)
                        .ok_or(CompositorError::UnknownElement(handle))?;
                    desc.resource = resource;
                }
            }
        }

        self.elements = next;
        self.commits += 1;
        Ok(())
    }

    fn abort_transaction(&mut self, txn: TxnHandle) -> Result<(), CompositorError> {
        self.pending
            .remove(&txn)
            .map(|_| ())
            .ok_or(CompositorError::UnknownTransaction(txn))
    }

    fn add_element(
        &mut self,
        txn: TxnHandle,
        desc: ElementDesc,
    ) -> Result<ElementHandle, CompositorError> {
        if !self.open || desc.display != DISPLAY {
            return Err(CompositorError::UnknownDisplay(desc.display));
        }
        self.check_resource(desc.resource)?;
        self.pending_mut(txn)?;

        let handle = ElementHandle(self.alloc_handle());
        self.pending_mut(txn)?.push(TxnOp::Add(handle, desc));
        Ok(handle)
    }

    fn remove_element(
        &mut self,
        txn: TxnHandle,
        element: ElementHandle,
    ) -> Result<(), CompositorError> {
        self.pending_mut(txn)?.push(TxnOp::Remove(element));
        Ok(())
    }

    fn change_element_source(
        &mut self,
        txn: TxnHandle,
        element: ElementHandle,
        resource: ResourceHandle,
    ) -> Result<(), CompositorError> {
        self.check_resource(resource)?;
        self.pending_mut(txn)?
            .push(TxnOp::ChangeSource(element, resource));
        Ok(())
    }
}
