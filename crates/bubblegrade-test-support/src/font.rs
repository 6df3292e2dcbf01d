//! Minimal 5x7 stencil font covering the identifier alphabet (0-9, A-Z).
//!
//! Shared by the sheet builder (to print identifiers) and the stencil
//! classifier (to build match templates), so recognition in tests is
//! exact by construction.

use image::{GrayImage, Luma};

/// Glyph cell width in font units.
pub const GLYPH_W: u32 = 5;
/// Glyph cell height in font units.
pub const GLYPH_H: u32 = 7;

/// 5x7 row bitmaps, bit 4 is the leftmost column.
#[rustfmt::skip]
const GLYPHS: &[(char, [u8; 7])] = &[
    ('0', [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110]),
    ('1', [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
    ('2', [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111]),
    ('3', [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110]),
    ('4', [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010]),
    ('5', [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110]),
    ('6', [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110]),
    ('7', [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000]),
    ('8', [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110]),
    ('9', [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100]),
    ('A', [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
    ('B', [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110]),
    ('C', [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110]),
    ('D', [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100]),
    ('E', [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111]),
    ('F', [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000]),
    ('G', [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111]),
    ('H', [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
    ('I', [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
    ('J', [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100]),
    ('K', [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001]),
    ('L', [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111]),
    ('M', [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001]),
    ('N', [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001]),
    ('O', [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
    ('P', [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000]),
    ('Q', [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101]),
    ('R', [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001]),
    ('S', [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110]),
    ('T', [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100]),
    ('U', [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
    ('V', [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100]),
    ('W', [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010]),
    ('X', [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001]),
    ('Y', [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100]),
    ('Z', [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111]),
];

/// Returns the row bitmap for `c`, if it is in the identifier alphabet.
#[must_use]
pub fn glyph(c: char) -> Option<[u8; 7]> {
    let upper = c.to_ascii_uppercase();
    GLYPHS.iter().find(|(g, _)| *g == upper).map(|(_, rows)| *rows)
}

/// Every character the font covers, in label order.
#[must_use]
pub fn alphabet() -> Vec<char> {
    GLYPHS.iter().map(|(c, _)| *c).collect()
}

/// Draws `c` at `(x, y)` with each font unit scaled to a `scale` pixel square.
/// Unknown characters draw nothing.
pub fn draw_char(canvas: &mut GrayImage, c: char, x: u32, y: u32, scale: u32, ink: Luma<u8>) {
    let Some(rows) = glyph(c) else {
        return;
    };
    for (row, bits) in rows.iter().enumerate() {
        for col in 0..GLYPH_W {
            if bits >> (GLYPH_W - 1 - col) & 1 == 0 {
                continue;
            }
            #[allow(clippy::cast_possible_truncation)]
            let oy = y + row as u32 * scale;
            let ox = x + col * scale;
            for dy in 0..scale {
                for dx in 0..scale {
                    let (px, py) = (ox + dx, oy + dy);
                    if px < canvas.width() && py < canvas.height() {
                        canvas.put_pixel(px, py, ink);
                    }
                }
            }
        }
    }
}

/// Draws `text` left to right starting at `(x, y)`, with a two-unit gap
/// between characters.
pub fn draw_text(canvas: &mut GrayImage, text: &str, x: u32, y: u32, scale: u32, ink: Luma<u8>) {
    let advance = (GLYPH_W + 2) * scale;
    for (i, c) in text.chars().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let cx = x + i as u32 * advance;
        draw_char(canvas, c, cx, y, scale, ink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_alphabet_is_covered() {
        for c in ('0'..='9').chain('A'..='Z') {
            assert!(glyph(c).is_some(), "missing glyph for {c}");
        }
        assert_eq!(alphabet().len(), 36);
    }

    #[test]
    fn test_glyphs_are_pairwise_distinct() {
        let all = alphabet();
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(glyph(*a), glyph(*b), "{a} and {b} share a bitmap");
            }
        }
    }

    #[test]
    fn test_lowercase_maps_to_uppercase() {
        assert_eq!(glyph('a'), glyph('A'));
    }

    #[test]
    fn test_draw_char_marks_ink() {
        let mut canvas = GrayImage::from_pixel(40, 40, Luma([250u8]));
        draw_char(&mut canvas, 'H', 4, 4, 3, Luma([20u8]));
        let ink = canvas.pixels().filter(|p| p.0[0] < 128).count();
        // 'H' has 17 set units at a 3x3 scale.
        assert_eq!(ink, 17 * 9);
    }
}
