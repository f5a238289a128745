use crate::compile::plan::FramePlan;
use crate::foundation::error::VjResult;

/// A rendered frame as RGBA8 pixels.
///
/// Frames are premultiplied alpha; the `premultiplied` flag keeps that explicit at API
/// boundaries (capture sinks and PNG export need straight alpha).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Straight-alpha copy of the pixel data.
    pub fn to_straight(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        if !self.premultiplied {
            return out;
        }
        for px in out.chunks_exact_mut(4) {
            let a = u32::from(px[3]);
            if a == 0 || a == 255 {
                continue;
            }
            for c in &mut px[..3] {
                *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        out
    }
}

/// A renderer that rasterizes a [`FramePlan`] into a [`FrameRGBA`].
pub trait RenderBackend {
    fn render_plan(&mut self, plan: &FramePlan) -> VjResult<FrameRGBA>;
}

/// Available backend kinds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackendKind {
    /// CPU raster backend powered by `vello_cpu`.
    #[default]
    Cpu,
}

/// Create a rendering backend implementation.
pub fn create_backend(kind: BackendKind) -> Box<dyn RenderBackend> {
    match kind {
        BackendKind::Cpu => Box::new(crate::render::cpu::CpuBackend::new()),
    }
}
