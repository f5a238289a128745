use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::foundation::error::{VjError, VjResult};
use crate::media::decode::load_image_file;
use crate::media::raster::RasterImage;
use crate::media::pcm::{Pcm, load_wav};
use crate::model::playlist::MediaKind;

/// What a player knows about an opened source.
#[derive(Clone, Debug, Default)]
pub struct MediaSpec {
    /// `None` for stills and for streams that never report a finite length.
    pub duration: Option<f64>,
    pub frame: Option<Arc<RasterImage>>,
    pub pcm: Option<Pcm>,
}

/// Resolves source locators into decoded media.
pub trait MediaSource: Send + Sync {
    fn open(&self, source: &str) -> VjResult<MediaSpec>;
}

/// Guess a media kind from a locator's extension.
pub fn guess_kind(source: &str) -> Option<MediaKind> {
    let ext = Path::new(source)
        .extension()
        .and_then(|e| e.to_str())?
        .to_ascii_lowercase();
    match ext.as_str() {
        "png" | "jpg" | "jpeg" | "gif" | "bmp" | "webp" | "svg" => Some(MediaKind::Image),
        "mp4" | "webm" | "mov" | "mkv" | "avi" => Some(MediaKind::Video),
        "wav" | "mp3" | "ogg" | "flac" | "m4a" => Some(MediaKind::Audio),
        _ => None,
    }
}

/// Media catalog: registered in-memory entries first, then files under `root`.
///
/// Files decode as stills (raster or SVG) or WAV audio. Entries registered with
/// [`Catalog::insert`] stand in for video streams in tests and headless runs.
#[derive(Debug, Default)]
pub struct Catalog {
    root: PathBuf,
    entries: RwLock<HashMap<String, MediaSpec>>,
}

impl Catalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert(&self, source: impl Into<String>, spec: MediaSpec) {
        if let Ok(mut map) = self.entries.write() {
            map.insert(source.into(), spec);
        }
    }

    pub fn remove(&self, source: &str) {
        if let Ok(mut map) = self.entries.write() {
            map.remove(source);
        }
    }

    fn resolve(&self, source: &str) -> PathBuf {
        let p = Path::new(source);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.root.join(p)
        }
    }
}

impl MediaSource for Catalog {
    fn open(&self, source: &str) -> VjResult<MediaSpec> {
        if let Ok(map) = self.entries.read()
            && let Some(spec) = map.get(source)
        {
            return Ok(spec.clone());
        }

        let path = self.resolve(source);
        match guess_kind(source) {
            Some(MediaKind::Image) => {
                let img = load_image_file(&path)?;
                Ok(MediaSpec {
                    duration: None,
                    frame: Some(Arc::new(img)),
                    pcm: None,
                })
            }
            Some(MediaKind::Audio) => {
                let pcm = load_wav(&path)?;
                Ok(MediaSpec {
                    duration: Some(pcm.duration_secs()),
                    frame: None,
                    pcm: Some(pcm),
                })
            }
            Some(MediaKind::Video) => Err(VjError::media(format!(
                "no video decoder for '{source}'; register it in the catalog"
            ))),
            None => Err(VjError::media(format!("unrecognized media type '{source}'"))),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/catalog.rs"]
mod tests;
