use super::*;

fn encode_png(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

#[test]
fn png_decodes_premultiplied() {
    let bytes = encode_png(3, 2, [255, 0, 0, 128]);
    let img = decode_image(&bytes).unwrap();
    assert_eq!((img.width, img.height), (3, 2));
    assert_eq!(img.pixel(0, 0), Some([128, 0, 0, 128]));
}

#[test]
fn garbage_bytes_are_an_error() {
    assert!(decode_image(b"not an image").is_err());
    assert!(rasterize_svg(b"<nope").is_err());
}

#[test]
fn svg_rasterizes_at_intrinsic_size() {
    let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="4">
        <rect width="8" height="4" fill="#00ff00"/></svg>"##;
    let img = rasterize_svg(svg).unwrap();
    assert_eq!((img.width, img.height), (8, 4));
    assert_eq!(img.pixel(4, 2), Some([0, 255, 0, 255]));
}

#[test]
fn each_decode_gets_a_fresh_id() {
    let bytes = encode_png(1, 1, [0, 0, 0, 255]);
    let a = decode_image(&bytes).unwrap();
    let b = decode_image(&bytes).unwrap();
    assert_ne!(a.id, b.id);
}
