// Compositor errors

use super::{DisplayHandle, ElementHandle, ResourceHandle, TxnHandle};
use crate::layout::Rect;

/// Errors reported by a compositor backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompositorError {
    /// The display could not be opened
    DisplayUnavailable,

    /// The display handle does not refer to the opened display
    UnknownDisplay(DisplayHandle),

    /// The compositor refused to create a resource
    ResourceRefused { width: u32, height: u32 },

    /// Zero-sized resources are not allowed
    InvalidDimensions { width: u32, height: u32 },

    /// No such resource
    UnknownResource(ResourceHandle),

    /// The resource is still sampled by a committed element
    ResourceInUse(ResourceHandle),

    /// No such element
    UnknownElement(ElementHandle),

    /// No such open transaction
    UnknownTransaction(TxnHandle),

    /// The compositor refused to queue an element operation
    ElementRefused(TxnHandle),

    /// A write region does not fit inside the resource
    RegionOutOfBounds { rect: Rect, width: u32, height: u32 },

    /// The source buffer is too small for the requested write
    BufferTooSmall { needed: usize, available: usize },
}

impl std::fmt::Display for CompositorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompositorError::DisplayUnavailable => write!(f, "Display unavailable"),
            CompositorError::UnknownDisplay(d) => write!(f, "Unknown display {}", d.0),
            CompositorError::ResourceRefused { width, height } => {
                write!(f, "Compositor refused a {}x{} resource", width, height)
            }
            CompositorError::InvalidDimensions { width, height } => {
                write!(f, "Invalid resource dimensions {}x{}", width, height)
            }
            CompositorError::UnknownResource(r) => write!(f, "Unknown resource {}", r.0),
            CompositorError::ResourceInUse(r) => {
                write!(f, "Resource {} is still on the display", r.0)
            }
            CompositorError::UnknownElement(e) => write!(f, "Unknown element {}", e.0),
            CompositorError::UnknownTransaction(t) => write!(f, "Unknown transaction {}", t.0),
            CompositorError::ElementRefused(t) => {
                write!(f, "Element operation refused in transaction {}", t.0)
            }
            CompositorError::RegionOutOfBounds {
                rect,
                width,
                height,
            } => write!(
                f,
                "Region {}x{}+{}+{} outside {}x{} resource",
                rect.width, rect.height, rect.x, rect.y, width, height
            ),
            CompositorError::BufferTooSmall { needed, available } => write!(
                f,
                "Source buffer too small: need {} bytes, have {}",
                needed, available
            ),
        }
    }
}

impl std::error::Error for CompositorError {}
