//! Media fixtures for integration tests.

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// A small but real JPEG.
pub fn jpeg_fixture() -> Vec<u8> {
    let mut img = RgbaImage::new(64, 48);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        *pixel = Rgba([(x * 4) as u8, (y * 5) as u8, 128, 255]);
    }
    let mut buffer = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)
        .expect("encode jpeg fixture");
    buffer
}

/// A small but real PNG.
pub fn png_fixture() -> Vec<u8> {
    let img = RgbaImage::from_pixel(32, 32, Rgba([0, 200, 80, 255]));
    let mut buffer = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .expect("encode png fixture");
    buffer
}
