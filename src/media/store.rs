use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::media::catalog::MediaSource;
use crate::media::raster::RasterImage;

/// Cache of decoded stills (watermark, image overlays) keyed by source locator.
///
/// Failed sources are retried on every lookup and warned about once.
pub struct MediaStore {
    catalog: Arc<dyn MediaSource>,
    stills: HashMap<String, Arc<RasterImage>>,
    warned: HashSet<String>,
}

impl MediaStore {
    pub fn new(catalog: Arc<dyn MediaSource>) -> Self {
        Self {
            catalog,
            stills: HashMap::new(),
            warned: HashSet::new(),
        }
    }

    pub fn still(&mut self, source: &str) -> Option<Arc<RasterImage>> {
        if let Some(img) = self.stills.get(source) {
            return Some(img.clone());
        }
        let frame = match self.catalog.open(source) {
            Ok(spec) => spec.frame,
            Err(e) => {
                if self.warned.insert(source.to_owned()) {
                    tracing::warn!(source, error = %e, "still load failed; skipping");
                }
                None
            }
        };
        let img = frame?;
        self.warned.remove(source);
        self.stills.insert(source.to_owned(), img.clone());
        Some(img)
    }

    /// Drop cached stills whose source is not in `keep`.
    pub fn retain_sources(&mut self, keep: &HashSet<&str>) {
        self.stills.retain(|k, _| keep.contains(k.as_str()));
    }

    pub fn len(&self) -> usize {
        self.stills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stills.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/store.rs"]
mod tests;
