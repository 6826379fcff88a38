//! EXIF orientation correction.

use image::imageops;
use image::RgbaImage;

/// Apply the transform that brings an image stored with EXIF orientation
/// `code` upright.
///
/// # Panics
///
/// Panics if `code` is not a valid EXIF orientation (1 through 8).
pub fn apply(image: &RgbaImage, code: u32) -> RgbaImage {
    assert!(
        (1..=8).contains(&code),
        "EXIF orientation must be within 1..=8, got {}",
        code
    );

    // imageops rotations are clockwise.
    match code {
        2 => imageops::flip_horizontal(image),
        3 => imageops::rotate180(image),
        4 => imageops::flip_vertical(image),
        5 => imageops::flip_horizontal(&imageops::rotate90(image)),
        6 => imageops::rotate90(image),
        7 => imageops::flip_vertical(&imageops::rotate90(image)),
        8 => imageops::rotate270(image),
        _ => image.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const MARK: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLANK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    /// 3x2 image with only the top-left pixel marked.
    fn marked() -> RgbaImage {
        let mut img = RgbaImage::from_pixel(3, 2, BLANK);
        img.put_pixel(0, 0, MARK);
        img
    }

    fn mark_position(img: &RgbaImage) -> (u32, u32) {
        let (x, y, _) = img
            .enumerate_pixels()
            .find(|(_, _, p)| **p == MARK)
            .unwrap();
        (x, y)
    }

    #[test]
    fn test_orientation_marked_corner() {
        // (code, expected dimensions, expected position of the top-left mark)
        let cases = [
            (1, (3, 2), (0, 0)),
            (2, (3, 2), (2, 0)),
            (3, (3, 2), (2, 1)),
            (4, (3, 2), (0, 1)),
            (5, (2, 3), (0, 0)),
            (6, (2, 3), (1, 0)),
            (7, (2, 3), (1, 2)),
            (8, (2, 3), (0, 2)),
        ];

        for (code, dims, pos) in cases {
            let out = apply(&marked(), code);
            assert_eq!(out.dimensions(), dims, "dimensions for code {}", code);
            assert_eq!(mark_position(&out), pos, "mark position for code {}", code);
        }
    }

    #[test]
    fn test_identity_is_idempotent() {
        let once = apply(&marked(), 1);
        let twice = apply(&once, 1);
        assert_eq!(once, marked());
        assert_eq!(twice, marked());
    }

    #[test]
    fn test_flips_and_half_turn_are_involutions() {
        for code in [2, 3, 4] {
            assert_eq!(apply(&apply(&marked(), code), code), marked(), "code {}", code);
        }
    }

    #[test]
    fn test_quarter_turns_cancel_out() {
        assert_eq!(apply(&apply(&marked(), 6), 8), marked());
    }

    #[test]
    #[should_panic(expected = "EXIF orientation must be within 1..=8")]
    fn test_out_of_range_code_panics() {
        apply(&marked(), 9);
    }

    #[test]
    #[should_panic]
    fn test_zero_code_panics() {
        apply(&marked(), 0);
    }
}
