// Color packing - RGB565 / ARGB8888 helpers and the default base colors

/// Index of the fully transparent entry in the transparent table
pub const TRANSPARENT_INDEX: u8 = 16;

/// The 16 base colors installed at indices 0-15 of both tables
///
/// Each entry is (red, green, blue).
pub const BASE_COLORS: [(u8, u8, u8); 16] = [
    (0x00, 0x00, 0x00), // black
    (0xFF, 0xFF, 0xFF), // white
    (0xFF, 0x00, 0x00), // red
    (0x70, 0xA4, 0xB2), // cyan
    (0x6F, 0x3D, 0x86), // purple
    (0x58, 0x8D, 0x43), // green
    (0x35, 0x28, 0x79), // blue
    (0xB8, 0xC7, 0x6F), // yellow
    (0x6F, 0x4F, 0x25), // orange
    (0x43, 0x39, 0x00), // brown
    (0x9A, 0x67, 0x59), // light red
    (0x44, 0x44, 0x44), // dark grey
    (0x6C, 0x6C, 0x6C), // grey
    (0x9A, 0xD2, 0x84), // light green
    (0x6C, 0x5E, 0xB5), // light blue
    (0x95, 0x95, 0x95), // light grey
];

/// Pack 8-bit channels into RGB565
#[inline]
pub const fn rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 >> 3) << 11) | ((g as u16 >> 2) << 5) | (b as u16 >> 3)
}

/// Pack 8-bit channels into ARGB8888
#[inline]
pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> u32 {
    ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// Expand an RGB565 value to RGBA bytes (always opaque)
///
/// Channels are widened by replicating their high bits so that full
/// intensity maps to 0xFF.
#[inline]
pub fn rgb565_to_rgba(value: u16) -> [u8; 4] {
    let r5 = ((value >> 11) & 0x1F) as u8;
    let g6 = ((value >> 5) & 0x3F) as u8;
    let b5 = (value & 0x1F) as u8;

    [
        (r5 << 3) | (r5 >> 2),
        (g6 << 2) | (g6 >> 4),
        (b5 << 3) | (b5 >> 2),
        0xFF,
    ]
}

/// Split an ARGB8888 value into RGBA bytes
#[inline]
pub fn argb_to_rgba(value: u32) -> [u8; 4] {
    [
        ((value >> 16) & 0xFF) as u8,
        ((value >> 8) & 0xFF) as u8,
        (value & 0xFF) as u8,
        ((value >> 24) & 0xFF) as u8,
    ]
}
