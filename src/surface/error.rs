// Surface errors

use crate::compositor::CompositorError;

/// Errors that can occur while acquiring or presenting a surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// The display or the picture resources could not be acquired
    ///
    /// Nothing acquired by the failed call is left behind.
    Allocation {
        width: u32,
        height: u32,
        source: CompositorError,
    },

    /// A compositor call failed after allocation
    Compositor(CompositorError),
}

impl std::fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurfaceError::Allocation {
                width,
                height,
                source,
            } => write!(f, "Failed to allocate {}x{} surface: {}", width, height, source),
            SurfaceError::Compositor(e) => write!(f, "Compositor error: {}", e),
        }
    }
}

impl std::error::Error for SurfaceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SurfaceError::Allocation { source, .. } => Some(source),
            SurfaceError::Compositor(e) => Some(e),
        }
    }
}

impl From<CompositorError> for SurfaceError {
    fn from(e: CompositorError) -> Self {
        SurfaceError::Compositor(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_messages() {
        let err = SurfaceError::Allocation {
            width: 384,
            height: 272,
            source: CompositorError::DisplayUnavailable,
        };
        assert_eq!(
            err.to_string(),
            "Failed to allocate 384x272 surface: Display unavailable"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn test_from_compositor_error() {
        let err: SurfaceError = CompositorError::DisplayUnavailable.into();
        assert_eq!(err, SurfaceError::Compositor(CompositorError::DisplayUnavailable));
    }
}
