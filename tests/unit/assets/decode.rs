use std::io::Cursor;

use super::*;

fn gradient(w: u32, h: u32) -> image::RgbaImage {
    image::RgbaImage::from_fn(w, h, |x, y| {
        image::Rgba([(x * 255 / w.max(1)) as u8, (y * 255 / h.max(1)) as u8, 90, 255])
    })
}

fn encode_as(img: &image::RgbaImage, format: image::ImageFormat) -> Vec<u8> {
    let dyn_img = match format {
        image::ImageFormat::Jpeg => image::DynamicImage::ImageRgb8(
            image::DynamicImage::ImageRgba8(img.clone()).to_rgb8(),
        ),
        _ => image::DynamicImage::ImageRgba8(img.clone()),
    };
    let mut buf = Vec::new();
    dyn_img
        .write_to(&mut Cursor::new(&mut buf), format)
        .unwrap();
    buf
}

#[test]
fn decodes_every_supported_container() {
    let img = gradient(12, 8);
    let cases = [
        (image::ImageFormat::Png, SourceFormat::Png),
        (image::ImageFormat::Jpeg, SourceFormat::Jpeg),
        (image::ImageFormat::Gif, SourceFormat::Gif),
        (image::ImageFormat::WebP, SourceFormat::WebP),
    ];
    for (fmt, expected) in cases {
        let bytes = encode_as(&img, fmt);
        let src = decode_image(&bytes).unwrap();
        assert_eq!(src.format(), expected);
        assert_eq!((src.width(), src.height()), (12, 8), "{fmt:?}");
        assert_eq!(src.bytes(), bytes.as_slice());
        assert_eq!(src.raster().len(), 12 * 8 * 4);
    }
}

#[test]
fn png_pixels_are_kept_straight_alpha() {
    let img = image::RgbaImage::from_raw(1, 1, vec![100, 50, 200, 128]).unwrap();
    let bytes = encode_as(&img, image::ImageFormat::Png);
    let src = decode_image(&bytes).unwrap();
    assert_eq!(src.raster().as_raw().as_slice(), &[100, 50, 200, 128]);
}

#[test]
fn unknown_signature_is_unsupported() {
    let err = decode_image(b"definitely not an image").unwrap_err();
    assert!(matches!(err, RespimgError::UnsupportedFormat(_)), "{err}");

    let err = decode_image(&[]).unwrap_err();
    assert!(matches!(err, RespimgError::UnsupportedFormat(_)), "{err}");
}

#[test]
fn known_but_unaccepted_container_is_unsupported() {
    let bytes = encode_as(&gradient(4, 4), image::ImageFormat::Bmp);
    let err = decode_image(&bytes).unwrap_err();
    assert!(matches!(err, RespimgError::UnsupportedFormat(_)), "{err}");
}

#[test]
fn malformed_png_header_is_corrupt() {
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.extend_from_slice(&[0, 0, 0, 13, b'I', b'H', b'D', b'R', 0xff, 0xff]);
    let err = decode_image(&bytes).unwrap_err();
    assert!(matches!(err, RespimgError::CorruptInput(_)), "{err}");
}

#[test]
fn truncated_png_pixel_data_is_corrupt() {
    let bytes = encode_as(&gradient(64, 64), image::ImageFormat::Png);
    let truncated = &bytes[..bytes.len() / 2];
    let err = decode_image(truncated).unwrap_err();
    assert!(matches!(err, RespimgError::CorruptInput(_)), "{err}");
}

#[test]
fn decode_image_file_reports_missing_path() {
    let err = decode_image_file("target/does-not-exist/photo.jpg").unwrap_err();
    assert!(matches!(err, RespimgError::Other(_)));
    assert!(err.to_string().contains("read source image"));
}
