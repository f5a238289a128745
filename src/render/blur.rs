use crate::foundation::error::{VjError, VjResult};

/// Largest blur radius in pixels; shadow lengths beyond this are clamped.
pub const MAX_BLUR_RADIUS: u32 = 64;

/// Kernel radius and sigma for a canvas-style blur length (sigma is half of it).
pub fn blur_params(blur: f64) -> (u32, f32) {
    if !blur.is_finite() || blur <= 0.0 {
        return (0, 0.0);
    }
    let sigma = blur / 2.0;
    let radius = (sigma * 3.0).ceil().min(f64::from(MAX_BLUR_RADIUS)) as u32;
    (radius, sigma as f32)
}

/// Separable gaussian blur over premultiplied RGBA8, edges clamped.
pub fn blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> VjResult<Vec<u8>> {
    let expected = (width as usize)
        .saturating_mul(height as usize)
        .saturating_mul(4);
    if src.len() != expected {
        return Err(VjError::render("blur input size mismatch"));
    }
    let kernel = gaussian_kernel_q16(radius, sigma)?;
    if kernel.len() == 1 || width == 0 || height == 0 {
        return Ok(src.to_vec());
    }
    let mut tmp = vec![0u8; src.len()];
    let mut dst = vec![0u8; src.len()];
    horizontal_pass(src, &mut tmp, width, height, &kernel);
    vertical_pass(&tmp, &mut dst, width, height, &kernel);
    Ok(dst)
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> VjResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(VjError::validation("blur sigma must be finite and > 0"));
    }

    let r = radius as i32;
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(VjError::render("gaussian kernel sum is zero"));
    }

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }
    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i32 - radius).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y + ki as i32 - radius).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/render/blur.rs"]
mod tests;
