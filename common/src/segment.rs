//! 7-segment glyphs and the 5-position layout of the thermostat display.
//!
//! Position 2 is the colon slot. Bit 7 of a glyph is the decimal point.

pub const DISPLAY_POSITIONS: usize = 5;
pub const DECIMAL_POINT: u8 = 0x80;
pub const GLYPH_SPACE: u8 = 0x00;
pub const GLYPH_MINUS: u8 = 0x40;
pub const GLYPH_H: u8 = 0x76;

/// 0-9, A-F, space, minus.
pub const CHARMAP: [u8; 18] = [
    0x3F, 0x06, 0x5B, 0x4F, 0x66, 0x6D, 0x7D, 0x07, 0x7F, 0x6F, 0x77, 0x7C, 0x39, 0x5E, 0x79,
    0x71, GLYPH_SPACE, GLYPH_MINUS,
];

pub type Frame = [u8; DISPLAY_POSITIONS];

pub fn digit(value: i32) -> u8 {
    CHARMAP[value.rem_euclid(10) as usize]
}

/// Tenths of a degree as `_d:d.d`. Values outside 30..=999 are not renderable.
pub fn temperature_frame(tenths: i32) -> Option<Frame> {
    if !(30..=999).contains(&tenths) {
        return None;
    }
    Some([
        GLYPH_SPACE,
        digit(tenths / 100),
        GLYPH_SPACE,
        digit(tenths / 10) | DECIMAL_POINT,
        digit(tenths),
    ])
}

/// Percent as `H _ : d d`. Values outside 0..=99 are not renderable.
pub fn humidity_frame(percent: i32) -> Option<Frame> {
    if !(0..=99).contains(&percent) {
        return None;
    }
    Some([
        GLYPH_H,
        GLYPH_SPACE,
        GLYPH_SPACE,
        digit(percent / 10),
        digit(percent),
    ])
}

pub fn placeholder_frame() -> Frame {
    [GLYPH_MINUS, GLYPH_MINUS, GLYPH_SPACE, GLYPH_MINUS, GLYPH_MINUS]
}

pub fn blank_frame() -> Frame {
    [GLYPH_SPACE; DISPLAY_POSITIONS]
}
