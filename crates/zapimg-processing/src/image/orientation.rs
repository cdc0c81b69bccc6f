//! EXIF orientation correction
//!
//! Uploaded photos frequently carry an EXIF orientation tag instead of
//! physically rotated pixels. The normalizer bakes the orientation into the
//! pixel data before re-encoding, so viewers that ignore EXIF still render
//! the image upright.

use image::{imageops, DynamicImage};

/// Read the EXIF orientation tag (1-8) from raw image data.
/// Returns 1 (normal) when there is no EXIF block or no orientation field.
pub fn read_exif_orientation(data: &[u8]) -> u8 {
    let mut cursor = std::io::Cursor::new(data);
    let reader = exif::Reader::new();

    match reader.read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(|v| v as u8)
            .filter(|v| (1..=8).contains(v))
            .unwrap_or(1),
        Err(_) => 1,
    }
}

/// Get rotation and flip operations needed for a given EXIF orientation
/// Returns (rotate_angle, flip_horizontal, flip_vertical)
pub fn get_orientation_transforms(orientation: u8) -> (Option<u16>, bool, bool) {
    match orientation {
        1 => (None, false, false),      // Normal
        2 => (None, true, false),       // Mirror horizontal
        3 => (Some(180), false, false), // Rotate 180
        4 => (None, false, true),       // Mirror vertical
        5 => (Some(270), true, false),  // Mirror horizontal + Rotate 270 CW
        6 => (Some(90), false, false),  // Rotate 90 CW
        7 => (Some(90), true, false),   // Mirror horizontal + Rotate 90 CW
        8 => (Some(270), false, false), // Rotate 270 CW
        _ => (None, false, false),      // Invalid, treat as normal
    }
}

/// Apply EXIF orientation correction to a decoded image.
pub fn apply_exif_orientation(mut img: DynamicImage, data: &[u8]) -> DynamicImage {
    let orientation = read_exif_orientation(data);
    let (rotate, flip_h, flip_v) = get_orientation_transforms(orientation);

    if orientation != 1 {
        tracing::debug!(
            orientation = orientation,
            rotate = ?rotate,
            flip_horizontal = flip_h,
            flip_vertical = flip_v,
            "Applying EXIF orientation"
        );
    }

    if let Some(angle) = rotate {
        img = rotate_by_angle(img, angle);
    }

    if flip_h {
        img = DynamicImage::ImageRgba8(imageops::flip_horizontal(&img.to_rgba8()));
    }
    if flip_v {
        img = DynamicImage::ImageRgba8(imageops::flip_vertical(&img.to_rgba8()));
    }

    img
}

/// Rotate image by 90, 180, or 270 degrees clockwise
fn rotate_by_angle(img: DynamicImage, angle: u16) -> DynamicImage {
    match angle {
        90 => DynamicImage::ImageRgba8(imageops::rotate90(&img.to_rgba8())),
        180 => DynamicImage::ImageRgba8(imageops::rotate180(&img.to_rgba8())),
        270 => DynamicImage::ImageRgba8(imageops::rotate270(&img.to_rgba8())),
        _ => img,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};

    #[test]
    fn test_orientation_transforms_all_values() {
        assert_eq!(get_orientation_transforms(1), (None, false, false));
        assert_eq!(get_orientation_transforms(2), (None, true, false));
        assert_eq!(get_orientation_transforms(3), (Some(180), false, false));
        assert_eq!(get_orientation_transforms(4), (None, false, true));
        assert_eq!(get_orientation_transforms(5), (Some(270), true, false));
        assert_eq!(get_orientation_transforms(6), (Some(90), false, false));
        assert_eq!(get_orientation_transforms(7), (Some(90), true, false));
        assert_eq!(get_orientation_transforms(8), (Some(270), false, false));
        // Out-of-range values are treated as normal
        assert_eq!(get_orientation_transforms(0), (None, false, false));
        assert_eq!(get_orientation_transforms(9), (None, false, false));
    }

    #[test]
    fn test_rotation_swaps_dimensions() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 2, Rgba([0, 0, 255, 255])));

        let rotated = rotate_by_angle(img.clone(), 90);
        assert_eq!(rotated.dimensions(), (2, 4));

        let rotated = rotate_by_angle(img.clone(), 180);
        assert_eq!(rotated.dimensions(), (4, 2));

        let rotated = rotate_by_angle(img.clone(), 270);
        assert_eq!(rotated.dimensions(), (2, 4));

        // Invalid angle returns the image unchanged
        let rotated = rotate_by_angle(img.clone(), 45);
        assert_eq!(rotated.dimensions(), (4, 2));
    }

    #[test]
    fn test_no_exif_means_normal_orientation() {
        // PNG without any EXIF data
        let img = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let mut buffer = Vec::new();
        image::DynamicImage::ImageRgba8(img.clone())
            .write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Png)
            .unwrap();

        assert_eq!(read_exif_orientation(&buffer), 1);

        let oriented =
            apply_exif_orientation(DynamicImage::ImageRgba8(img), &buffer);
        assert_eq!(oriented.dimensions(), (10, 10));
    }

    #[test]
    fn test_garbage_data_means_normal_orientation() {
        assert_eq!(read_exif_orientation(b"not an image at all"), 1);
        assert_eq!(read_exif_orientation(b""), 1);
    }
}
