use super::*;

fn repeat_px(px: [u8; 4], n: usize) -> Vec<u8> {
    px.iter().copied().cycle().take(n * 4).collect()
}

#[test]
fn over_opaque_src_replaces_dst() {
    let mut dst = repeat_px([10, 20, 30, 255], 4);
    let src = repeat_px([200, 100, 50, 255], 4);
    premul_over_in_place(&mut dst, &src).unwrap();
    assert_eq!(dst, src);
}

#[test]
fn normal_respects_opacity() {
    let mut dst = repeat_px([0, 0, 0, 255], 1);
    let src = repeat_px([255, 255, 255, 255], 1);
    composite_over(&mut dst, &src, 0.5, BlendMode::Normal).unwrap();
    assert_eq!(dst, vec![128, 128, 128, 255]);
    composite_over(&mut dst, &src, 0.0, BlendMode::Normal).unwrap();
    assert_eq!(dst, vec![128, 128, 128, 255]);
}

#[test]
fn multiply_and_screen_on_opaque_pixels() {
    let src = repeat_px([128, 255, 0, 255], 1);
    let mut m = repeat_px([255, 128, 128, 255], 1);
    composite_over(&mut m, &src, 1.0, BlendMode::Multiply).unwrap();
    assert_eq!(m, vec![128, 128, 0, 255]);

    let mut s = repeat_px([0, 128, 128, 255], 1);
    composite_over(&mut s, &src, 1.0, BlendMode::Screen).unwrap();
    assert_eq!(s, vec![128, 255, 128, 255]);
}

#[test]
fn blend_over_transparent_is_plain_source() {
    for mode in BlendMode::ALL {
        let mut dst = vec![0u8; 4];
        composite_over(&mut dst, &[100, 50, 25, 255], 1.0, mode).unwrap();
        assert_eq!(dst, vec![100, 50, 25, 255], "{mode:?}");
    }
}

#[test]
fn luminosity_keeps_gray_source_level() {
    let mut dst = repeat_px([255, 0, 0, 255], 1);
    composite_over(&mut dst, &[128, 128, 128, 255], 1.0, BlendMode::Luminosity).unwrap();
    let l = 0.3 * f32::from(dst[0]) + 0.59 * f32::from(dst[1]) + 0.11 * f32::from(dst[2]);
    assert!((l - 128.0).abs() < 2.0);
    assert!(dst[0] > dst[1]);
}

#[test]
fn hue_of_gray_source_desaturates() {
    let mut dst = repeat_px([255, 0, 0, 255], 1);
    composite_over(&mut dst, &[90, 90, 90, 255], 1.0, BlendMode::Hue).unwrap();
    assert_eq!(dst[0], dst[1]);
    assert_eq!(dst[1], dst[2]);
}

#[test]
fn mask_scales_all_channels() {
    let mut src = repeat_px([200, 100, 50, 200], 2);
    mask_alpha_in_place(&mut src, &[255, 0]).unwrap();
    assert_eq!(&src[..4], &[200, 100, 50, 200]);
    assert_eq!(&src[4..], &[0, 0, 0, 0]);
    assert!(mask_alpha_in_place(&mut src, &[1]).is_err());
}

#[test]
fn translate_moves_and_clears() {
    let mut src = vec![0u8; 3 * 3 * 4];
    src[..4].copy_from_slice(&[1, 2, 3, 4]);
    let out = translate_pixels(&src, 3, 3, 1, 2);
    let i = (2 * 3 + 1) * 4;
    assert_eq!(&out[i..i + 4], &[1, 2, 3, 4]);
    assert_eq!(&out[..4], &[0, 0, 0, 0]);
}

#[test]
fn outline_is_a_ring_around_coverage() {
    let mut plane = vec![0u8; 7 * 7];
    for y in 2..5 {
        for x in 2..5 {
            plane[y * 7 + x] = 255;
        }
    }
    let ring = outline_plane(&plane, 7, 7, 1);
    assert_eq!(ring[3 * 7 + 3], 0);
    assert_eq!(ring[3 * 7 + 1], 255);
    assert_eq!(ring[3 * 7 + 2], 255);
    assert_eq!(ring[0], 0);
}

#[test]
fn knockout_is_clipped_to_buffer() {
    let mut dst = vec![0u8; 4 * 4 * 4];
    knockout_rect(&mut dst, 4, 4, kurbo::Rect::new(-5.0, 3.0, 100.0, 9.0));
    assert_eq!(&dst[(3 * 4) * 4..(3 * 4) * 4 + 4], &[0, 0, 0, 255]);
    assert_eq!(&dst[..4], &[0, 0, 0, 0]);
}

#[test]
fn tint_keeps_coverage() {
    let out = tint_coverage(&[9, 9, 9, 128], [255, 0, 0, 255]);
    assert_eq!(out, vec![128, 0, 0, 128]);
}
