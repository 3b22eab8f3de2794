// Rectangles in display space

use serde::{Deserialize, Serialize};

/// Number of fractional bits in sub-pixel coordinates (16.16 fixed point)
pub const SUBPIXEL_SHIFT: u32 = 16;

/// Largest whole-pixel coordinate that still fits in 16.16 fixed point
pub const MAX_SUBPIXEL_COORD: i32 = i32::MAX >> SUBPIXEL_SHIFT;

/// Axis-aligned rectangle
///
/// Used both for whole-pixel rectangles (destinations, copy regions) and
/// for 16.16 fixed-point source rectangles; see [`Rect::to_subpixel`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width
    pub width: i32,
    /// Height
    pub height: i32,
}

impl Rect {
    /// Create a rectangle
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle anchored at the origin
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// True if every edge can be converted to 16.16 fixed point
    pub const fn fits_subpixel(&self) -> bool {
        const fn fits(v: i64) -> bool {
            v >= -(MAX_SUBPIXEL_COORD as i64) && v <= MAX_SUBPIXEL_COORD as i64
        }
        fits(self.x as i64)
            && fits(self.y as i64)
            && fits(self.width as i64)
            && fits(self.height as i64)
            && fits(self.x as i64 + self.width as i64)
            && fits(self.y as i64 + self.height as i64)
    }

    /// Convert whole-pixel coordinates to 16.16 fixed point
    ///
    /// Only meaningful for rectangles where [`Rect::fits_subpixel`] holds.
    pub const fn to_subpixel(self) -> Self {
        Self::new(
            self.x << SUBPIXEL_SHIFT,
            self.y << SUBPIXEL_SHIFT,
            self.width << SUBPIXEL_SHIFT,
            self.height << SUBPIXEL_SHIFT,
        )
    }

    /// Convert 16.16 fixed-point coordinates back to whole pixels (truncating)
    pub const fn from_subpixel(self) -> Self {
        Self::new(
            self.x >> SUBPIXEL_SHIFT,
            self.y >> SUBPIXEL_SHIFT,
            self.width >> SUBPIXEL_SHIFT,
            self.height >> SUBPIXEL_SHIFT,
        )
    }

    /// True if the rectangle covers no pixels
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Right edge (exclusive)
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Bottom edge (exclusive)
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// True if `other` lies entirely inside this rectangle
    pub const fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subpixel_conversion() {
        let rect = Rect::new(2, 3, 320, 200);
        let fixed = rect.to_subpixel();
        assert_eq!(fixed.x, 2 << 16);
        assert_eq!(fixed.width, 320 << 16);
        assert_eq!(fixed.from_subpixel(), rect);
    }

    #[test]
    fn test_fits_subpixel() {
        assert!(Rect::from_size(MAX_SUBPIXEL_COORD, 1).fits_subpixel());
        assert!(Rect::new(-100, 0, 200, 10).fits_subpixel());
        assert!(!Rect::from_size(MAX_SUBPIXEL_COORD + 1, 1).fits_subpixel());
        assert!(!Rect::new(MAX_SUBPIXEL_COORD, 0, 1, 1).fits_subpixel());
        assert!(!Rect::from_size(40000, 2).fits_subpixel());
    }

    #[test]
    fn test_contains_rect() {
        let outer = Rect::from_size(320, 200);
        assert!(outer.contains_rect(&Rect::new(10, 10, 100, 100)));
        assert!(outer.contains_rect(&outer));
        assert!(!outer.contains_rect(&Rect::new(300, 0, 40, 10)));
        assert!(!outer.contains_rect(&Rect::new(-1, 0, 10, 10)));
    }

    #[test]
    fn test_is_empty() {
        assert!(Rect::from_size(0, 10).is_empty());
        assert!(Rect::from_size(10, -1).is_empty());
        assert!(!Rect::from_size(1, 1).is_empty());
    }
}
