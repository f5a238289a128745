use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{VjError, VjResult};

static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Decoded raster in premultiplied RGBA8 form.
///
/// `id` is process-unique per decoded raster; backends use it as a texture cache key.
#[derive(Clone, Debug)]
pub struct RasterImage {
    pub id: u64,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl RasterImage {
    pub fn new(width: u32, height: u32, rgba8_premul: Vec<u8>) -> VjResult<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if rgba8_premul.len() != expected {
            return Err(VjError::media(format!(
                "raster data is {} bytes, expected {expected} for {width}x{height}",
                rgba8_premul.len()
            )));
        }
        Ok(Self {
            id: NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed),
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    /// Uniformly colored raster, used for synthetic media.
    pub fn solid(width: u32, height: u32, px: Rgba8Premul) -> VjResult<Self> {
        let n = (width as usize) * (height as usize);
        let mut data = Vec::with_capacity(n * 4);
        for _ in 0..n {
            data.extend_from_slice(&px.to_array());
        }
        Self::new(width, height, data)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let d = &self.rgba8_premul;
        Some([d[i], d[i + 1], d[i + 2], d[i + 3]])
    }
}
