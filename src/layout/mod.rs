// Layout module - Letterbox/pillarbox placement of a surface on the display
//
// Given a target aspect ratio and the display bounds, the layout engine
// works out where a surface's image lands on screen:
// - one dimension fills the available area, the other follows the aspect
// - the derived dimension is clamped to the available area
// - the result is aligned (start / center / end) on each axis
//
// Everything here is pure; surfaces call `compute_dest_rect` on `show()`.

pub mod rect;

pub use rect::{Rect, MAX_SUBPIXEL_COORD, SUBPIXEL_SHIFT};

use serde::{Deserialize, Serialize};

/// Placement of the image along one axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Left / top edge, offset by the alignment padding
    Start,
    /// Centered, shifted by the center offset
    #[default]
    Center,
    /// Right / bottom edge, pulled in by the alignment padding
    End,
    /// Pinned to offset zero (any unrecognized raw value)
    Origin,
}

impl Alignment {
    /// Decode the raw -1 / 0 / 1 form used by the emulator front ends
    ///
    /// Values outside that set pin the image to offset zero.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            -1 => Alignment::Start,
            0 => Alignment::Center,
            1 => Alignment::End,
            _ => Alignment::Origin,
        }
    }

    /// Raw form of this alignment (`Origin` has no canonical value and maps to 2)
    pub fn as_raw(self) -> i32 {
        match self {
            Alignment::Start => -1,
            Alignment::Center => 0,
            Alignment::End => 1,
            Alignment::Origin => 2,
        }
    }

    /// Offset of a span of `size` inside `avail`
    fn offset(self, avail: i32, size: i32, padding: i32, center_offset: i32) -> i32 {
        match self {
            Alignment::Center => (avail - size) / 2 + center_offset,
            Alignment::Start => padding,
            Alignment::End => avail - size - padding,
            Alignment::Origin => 0,
        }
    }
}

/// Reserved display margins, as fractions of the display size
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgePadding {
    /// Fraction of the display width reserved on the left
    pub left: f64,
    /// Fraction of the display width reserved on the right
    pub right: f64,
    /// Fraction of the display height reserved on top
    pub top: f64,
    /// Fraction of the display height reserved at the bottom
    pub bottom: f64,
}

/// Inputs to the layout engine that belong to a surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    /// Target aspect ratio
    ///
    /// Positive: fill the available height, width = height * aspect.
    /// Negative: fill the available width, height = width / |aspect|.
    /// Zero is invalid.
    pub aspect: f64,

    /// Horizontal alignment
    pub h_align: Alignment,

    /// Horizontal alignment padding in pixels (Start / End only)
    pub h_padding: i32,

    /// Vertical alignment
    pub v_align: Alignment,

    /// Vertical alignment padding in pixels (Start / End only)
    pub v_padding: i32,

    /// Display margins
    pub edges: EdgePadding,

    /// Horizontal shift applied when centered
    pub center_offset_x: i32,

    /// Vertical shift applied when centered
    pub center_offset_y: i32,
}

impl LayoutParams {
    /// Default layout: aspect 1.6, centered on both axes, no padding
    pub fn new() -> Self {
        Self {
            aspect: 1.6,
            h_align: Alignment::Center,
            h_padding: 0,
            v_align: Alignment::Center,
            v_padding: 0,
            edges: EdgePadding::default(),
            center_offset_x: 0,
            center_offset_y: 0,
        }
    }

    /// Set the aspect ratio
    pub fn with_aspect(mut self, aspect: f64) -> Self {
        self.aspect = aspect;
        self
    }

    /// Set horizontal alignment and padding
    pub fn with_h_align(mut self, align: Alignment, padding: i32) -> Self {
        self.h_align = align;
        self.h_padding = padding;
        self
    }

    /// Set vertical alignment and padding
    pub fn with_v_align(mut self, align: Alignment, padding: i32) -> Self {
        self.v_align = align;
        self.v_padding = padding;
        self
    }
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute where a surface's image is placed on the display
///
/// # Arguments
/// * `params` - Aspect, alignment and padding settings
/// * `display_width` - Display width in pixels
/// * `display_height` - Display height in pixels
///
/// # Returns
/// The destination rectangle in whole display pixels
///
/// # Panics
/// Panics if `params.aspect` is zero or not finite
pub fn compute_dest_rect(params: &LayoutParams, display_width: i32, display_height: i32) -> Rect {
    let aspect = params.aspect;
    assert!(
        aspect != 0.0 && aspect.is_finite(),
        "aspect ratio must be finite and non-zero, got {}",
        aspect
    );

    let lpad = (display_width as f64 * params.edges.left) as i32;
    let rpad = (display_width as f64 * params.edges.right) as i32;
    let tpad = (display_height as f64 * params.edges.top) as i32;
    let bpad = (display_height as f64 * params.edges.bottom) as i32;

    let avail_width = display_width - lpad - rpad;
    let avail_height = display_height - tpad - bpad;

    let (width, height) = if aspect < 0.0 {
        let height = (avail_width as f64 / -aspect).round() as i32;
        (avail_width, height.min(avail_height))
    } else {
        let width = (avail_height as f64 * aspect).round() as i32;
        (width.min(avail_width), avail_height)
    };

    let x = params
        .h_align
        .offset(avail_width, width, params.h_padding, params.center_offset_x);
    let y = params
        .v_align
        .offset(avail_height, height, params.v_padding, params.center_offset_y);

    Rect::new(x + lpad, y + tpad, width, height)
}
