use std::io::Cursor;

use super::*;

fn encode_png(img: image::DynamicImage) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_rgb_png_keeps_three_channels() {
    let img = image::RgbImage::from_raw(2, 1, vec![1, 2, 3, 4, 5, 6]).unwrap();
    let decoded = decode_image(&encode_png(image::DynamicImage::ImageRgb8(img))).unwrap();
    assert_eq!((decoded.width, decoded.height), (2, 1));
    assert_eq!(decoded.channel_count, 3);
    assert_eq!(decoded.pixels, vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn decode_gray_and_rgba_channel_counts() {
    let gray = image::GrayImage::from_raw(1, 1, vec![77]).unwrap();
    let decoded = decode_image(&encode_png(image::DynamicImage::ImageLuma8(gray))).unwrap();
    assert_eq!(decoded.channel_count, 1);

    let rgba = image::RgbaImage::from_raw(1, 1, vec![100, 50, 200, 128]).unwrap();
    let decoded = decode_image(&encode_png(image::DynamicImage::ImageRgba8(rgba))).unwrap();
    assert_eq!(decoded.channel_count, 4);
    assert_eq!(decoded.pixels, vec![100, 50, 200, 128]);
}

#[test]
fn decode_garbage_is_fetch_error() {
    assert_eq!(decode_image(b"").unwrap_err().kind(), "fetch");
    assert_eq!(decode_image(b"<html>nope</html>").unwrap_err().kind(), "fetch");
}

#[test]
fn from_raw_rejects_bad_shapes() {
    assert!(DecodedImage::from_raw(0, 1, 3, vec![]).is_err());
    assert!(DecodedImage::from_raw(1, 1, 2, vec![0, 0]).is_err());
    assert!(DecodedImage::from_raw(2, 2, 3, vec![0; 11]).is_err());
    assert!(DecodedImage::from_raw(2, 2, 1, vec![0; 4]).is_ok());
}

#[test]
fn fallback_is_solid_and_full_size() {
    let fb = DecodedImage::fallback();
    assert_eq!((fb.width, fb.height), (FALLBACK_WIDTH, FALLBACK_HEIGHT));
    assert_eq!(fb.channel_count, 3);
    fb.validate().unwrap();
    assert!(fb.pixels.chunks_exact(3).all(|px| px == FALLBACK_RGB));
}

#[test]
fn to_rgba_expands_gray_and_rgb() {
    let gray = DecodedImage::from_raw(1, 1, 1, vec![9]).unwrap();
    assert_eq!(gray.to_rgba_image().unwrap().into_raw(), vec![9, 9, 9, 255]);
    let rgb = DecodedImage::from_raw(1, 1, 3, vec![1, 2, 3]).unwrap();
    assert_eq!(rgb.to_rgba_image().unwrap().into_raw(), vec![1, 2, 3, 255]);
}
