//! 3x5 bitmap font for printable ASCII, one `u16` per glyph.
//!
//! Bits 14..0 hold the five rows top to bottom, three bits per row with the
//! leftmost pixel in the high bit.

pub(crate) const GLYPH_WIDTH: i32 = 3;
pub(crate) const GLYPH_HEIGHT: i32 = 5;

const FIRST_PRINTABLE: u32 = 0x20;

const ASCII_GLYPHS: [u16; 95] = [
    0x0000, 0x2482, 0x5a00, 0x5f7d, 0x7ddf, 0x52a5, 0x2aab, 0x2400,
    0x1491, 0x4494, 0x0aa8, 0x05d0, 0x0014, 0x01c0, 0x0002, 0x12a4,
    0x7b6f, 0x2c97, 0x73e7, 0x73cf, 0x5bc9, 0x79cf, 0x79ef, 0x7292,
    0x7bef, 0x7bcf, 0x0410, 0x0414, 0x1511, 0x0e38, 0x4454, 0x72c2,
    0x7be7, 0x2bed, 0x6bae, 0x7927, 0x6b6e, 0x79a7, 0x79a4, 0x796f,
    0x5bed, 0x7497, 0x726f, 0x5bad, 0x4927, 0x5fed, 0x5ffd, 0x7b6f,
    0x6ba4, 0x7b79, 0x6bad, 0x79cf, 0x7492, 0x5b6f, 0x5b6a, 0x5bfd,
    0x5aad, 0x5a92, 0x72a7, 0x6926, 0x4889, 0x324b, 0x2a00, 0x0007,
    0x4400, 0x0e7f, 0x49ae, 0x0f27, 0x13ef, 0x0fa7, 0x39a4, 0x0f79,
    0x49ad, 0x2092, 0x106a, 0x4bad, 0x4927, 0x0ded, 0x0d6d, 0x0f6f,
    0x0d74, 0x0f79, 0x0d64, 0x0f8f, 0x2e93, 0x0b6f, 0x0b6a, 0x0b7a,
    0x0a95, 0x0b79, 0x0e57, 0x3593, 0x2492, 0x64d6, 0x0780,
];

pub(crate) fn glyph_bits(ch: char) -> Option<u16> {
    let index = (ch as u32).checked_sub(FIRST_PRINTABLE)?;
    ASCII_GLYPHS.get(index as usize).copied()
}

pub(crate) fn glyph_pixel(bits: u16, col: i32, row: i32) -> bool {
    let shift = (GLYPH_HEIGHT - 1 - row) * GLYPH_WIDTH + (GLYPH_WIDTH - 1 - col);
    bits & (1 << shift) != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_printable_ascii_character_has_a_glyph() {
        for code in 32u8..=126u8 {
            assert!(glyph_bits(char::from(code)).is_some(), "missing glyph {code}");
        }
    }

    #[test]
    fn control_and_non_ascii_characters_have_no_glyph() {
        assert!(glyph_bits('\n').is_none());
        assert!(glyph_bits('\u{7f}').is_none());
        assert!(glyph_bits('é').is_none());
    }

    #[test]
    fn dash_lights_only_the_middle_row() {
        let bits = glyph_bits('-').expect("dash glyph");
        for row in 0..GLYPH_HEIGHT {
            for col in 0..GLYPH_WIDTH {
                assert_eq!(glyph_pixel(bits, col, row), row == 2, "col {col} row {row}");
            }
        }
    }
}
