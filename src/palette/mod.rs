// Palette module - Shared color tables for indexed surfaces
//
// Every surface stores 8-bit palette indices. The compositor resolves them
// through one of two 256-entry tables:
// - an opaque RGB565 table, used by surfaces without transparency
// - an ARGB8888 table, used by surfaces with transparency
//
// One registry is shared by every surface of a display, the same way the
// video chip of the emulated machine owns one color table.

pub mod colors;

pub use colors::{
    argb, argb_to_rgba, rgb565, rgb565_to_rgba, BASE_COLORS, TRANSPARENT_INDEX,
};

use std::cell::RefCell;
use std::rc::Rc;

/// Number of entries in each palette table
pub const PALETTE_SIZE: usize = 256;

/// Palette registry shared between surfaces
pub type SharedPalette = Rc<RefCell<PaletteRegistry>>;

/// Which of the two tables a surface draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteMode {
    /// RGB565 entries, every pixel fully opaque
    Opaque,
    /// ARGB8888 entries, alpha taken from the palette
    Transparent,
}

impl PaletteMode {
    /// Select the mode matching a surface's transparency flag
    pub fn for_transparency(transparency: bool) -> Self {
        if transparency {
            PaletteMode::Transparent
        } else {
            PaletteMode::Opaque
        }
    }
}

/// Borrowed view of one palette table, as pushed to a picture resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteTable<'a> {
    /// Opaque 16-bit table
    Rgb565(&'a [u16; PALETTE_SIZE]),
    /// Transparent-capable 32-bit table
    Argb8888(&'a [u32; PALETTE_SIZE]),
}

impl PaletteTable<'_> {
    /// The mode this table belongs to
    pub fn mode(&self) -> PaletteMode {
        match self {
            PaletteTable::Rgb565(_) => PaletteMode::Opaque,
            PaletteTable::Argb8888(_) => PaletteMode::Transparent,
        }
    }

    /// Resolve a palette index to RGBA bytes
    #[inline]
    pub fn rgba(&self, index: u8) -> [u8; 4] {
        match self {
            PaletteTable::Rgb565(table) => rgb565_to_rgba(table[index as usize]),
            PaletteTable::Argb8888(table) => argb_to_rgba(table[index as usize]),
        }
    }
}

/// Owned copy of one palette table
///
/// Compositor backends keep one of these per picture resource, since the
/// hardware copies the palette on upload rather than referencing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnedPaletteTable {
    /// Opaque 16-bit table
    Rgb565(Box<[u16; PALETTE_SIZE]>),
    /// Transparent-capable 32-bit table
    Argb8888(Box<[u32; PALETTE_SIZE]>),
}

impl OwnedPaletteTable {
    /// Borrow the table
    pub fn as_table(&self) -> PaletteTable<'_> {
        match self {
            OwnedPaletteTable::Rgb565(table) => PaletteTable::Rgb565(table),
            OwnedPaletteTable::Argb8888(table) => PaletteTable::Argb8888(table),
        }
    }
}

impl From<PaletteTable<'_>> for OwnedPaletteTable {
    fn from(table: PaletteTable<'_>) -> Self {
        match table {
            PaletteTable::Rgb565(t) => OwnedPaletteTable::Rgb565(Box::new(*t)),
            PaletteTable::Argb8888(t) => OwnedPaletteTable::Argb8888(Box::new(*t)),
        }
    }
}

/// The two master color tables
///
/// Mutating a table does not reach the screen until each affected surface
/// calls `update_palette()`, which re-uploads the table to its resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteRegistry {
    /// Opaque table (RGB565)
    opaque: [u16; PALETTE_SIZE],

    /// Transparent-capable table (ARGB8888)
    transparent: [u32; PALETTE_SIZE],
}

impl PaletteRegistry {
    /// Create a registry holding the default tables
    ///
    /// Indices 0-15 carry the base colors in both tables. Index 16 of the
    /// transparent table is the fully transparent sentinel; all other
    /// entries start out black (opaque table) or zero (transparent table).
    pub fn new() -> Self {
        let mut opaque = [0u16; PALETTE_SIZE];
        let mut transparent = [0u32; PALETTE_SIZE];

        for (i, &(r, g, b)) in BASE_COLORS.iter().enumerate() {
            opaque[i] = rgb565(r, g, b);
            transparent[i] = argb(0xFF, r, g, b);
        }
        transparent[TRANSPARENT_INDEX as usize] = argb(0x00, 0x00, 0x00, 0x00);

        Self {
            opaque,
            transparent,
        }
    }

    /// Create a registry wrapped for sharing between surfaces
    pub fn shared() -> SharedPalette {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Write one entry of the opaque table
    pub fn set_opaque(&mut self, index: u8, rgb565: u16) {
        self.opaque[index as usize] = rgb565;
    }

    /// Write one entry of the transparent table
    pub fn set_transparent(&mut self, index: u8, argb: u32) {
        self.transparent[index as usize] = argb;
    }

    /// Read one entry of the opaque table
    pub fn opaque(&self, index: u8) -> u16 {
        self.opaque[index as usize]
    }

    /// Read one entry of the transparent table
    pub fn transparent(&self, index: u8) -> u32 {
        self.transparent[index as usize]
    }

    /// Borrow the table used by the given mode
    pub fn table(&self, mode: PaletteMode) -> PaletteTable<'_> {
        match mode {
            PaletteMode::Opaque => PaletteTable::Rgb565(&self.opaque),
            PaletteMode::Transparent => PaletteTable::Argb8888(&self.transparent),
        }
    }

    /// Restore both tables to their defaults
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for PaletteRegistry {
    fn default() -> Self {
        Self::new()
    }
}
