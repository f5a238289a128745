use crate::foundation::error::{VjError, VjResult};

/// Media category of a playlist or overlay source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
    Audio,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Image => "image",
            Self::Audio => "audio",
        }
    }
}

/// One entry of a playlist. Immutable once created.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MediaItem {
    pub id: String,
    /// Source locator (file path or any key the media factory understands).
    pub source: String,
    pub name: String,
    pub kind: MediaKind,
}

/// A media item before it has been given an id by the reducer.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MediaDraft {
    pub source: String,
    pub name: String,
    pub kind: MediaKind,
}

impl MediaDraft {
    pub fn new(source: impl Into<String>, kind: MediaKind) -> Self {
        let source = source.into();
        let name = std::path::Path::new(&source)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.clone());
        Self { source, name, kind }
    }
}

/// One of the two playback buffers per deck.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Slot {
    #[default]
    A,
    B,
}

impl Slot {
    pub fn toggle(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

/// Crossfade state of one deck.
///
/// `started_at` is measured on the deck's own clock: wall-clock milliseconds for the
/// background deck, audio-clock seconds for the audio deck.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TransitionState {
    #[default]
    Idle,
    Transitioning { progress: f64, started_at: f64 },
}

impl TransitionState {
    pub fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn progress(self) -> Option<f64> {
        match self {
            Self::Idle => None,
            Self::Transitioning { progress, .. } => Some(progress),
        }
    }
}

/// Ordered media queue with a precomputed successor.
///
/// `current` and `next` are `None` exactly when the list is empty. Otherwise both are valid
/// indices and `next != current` whenever the list has more than one item.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Playlist {
    pub items: Vec<MediaItem>,
    pub current: Option<usize>,
    pub next: Option<usize>,
    pub shuffle: bool,
}

/// Successor of `current` in a list of `len` items.
///
/// With shuffle on, a uniformly random index other than `current` is drawn.
pub fn successor(current: usize, len: usize, shuffle: bool, rng: &mut fastrand::Rng) -> usize {
    if len <= 1 {
        return 0;
    }
    if shuffle {
        let r = rng.usize(..len - 1);
        if r >= current { r + 1 } else { r }
    } else {
        (current + 1) % len
    }
}

impl Playlist {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn current_item(&self) -> Option<&MediaItem> {
        self.current.and_then(|i| self.items.get(i))
    }

    pub fn next_item(&self) -> Option<&MediaItem> {
        self.next.and_then(|i| self.items.get(i))
    }

    pub fn refresh_next(&mut self, rng: &mut fastrand::Rng) {
        self.next = self
            .current
            .map(|cur| successor(cur, self.items.len(), self.shuffle, rng));
    }

    pub fn set_shuffle(&mut self, on: bool, rng: &mut fastrand::Rng) {
        self.shuffle = on;
        self.refresh_next(rng);
    }

    pub fn append(&mut self, items: Vec<MediaItem>, rng: &mut fastrand::Rng) {
        if items.is_empty() {
            return;
        }
        self.items.extend(items);
        if self.current.is_none() {
            self.current = Some(0);
        }
        self.refresh_next(rng);
    }

    pub fn select(&mut self, index: usize, rng: &mut fastrand::Rng) -> VjResult<()> {
        if index >= self.items.len() {
            return Err(VjError::validation(format!(
                "playlist index {index} out of range (len {})",
                self.items.len()
            )));
        }
        self.current = Some(index);
        self.refresh_next(rng);
        Ok(())
    }

    /// Move the item at `from` to `to`; `current` follows the item it pointed at.
    pub fn reorder(&mut self, from: usize, to: usize, rng: &mut fastrand::Rng) -> VjResult<()> {
        let len = self.items.len();
        if from >= len || to >= len {
            return Err(VjError::validation(format!(
                "reorder {from} -> {to} out of range (len {len})"
            )));
        }
        let item = self.items.remove(from);
        self.items.insert(to, item);
        if let Some(cur) = self.current {
            let moved = if cur == from {
                to
            } else if from < cur && to >= cur {
                cur - 1
            } else if from > cur && to <= cur {
                cur + 1
            } else {
                cur
            };
            self.current = Some(moved);
        }
        self.refresh_next(rng);
        Ok(())
    }

    pub fn remove(&mut self, index: usize, rng: &mut fastrand::Rng) -> VjResult<MediaItem> {
        if index >= self.items.len() {
            return Err(VjError::validation(format!(
                "playlist index {index} out of range (len {})",
                self.items.len()
            )));
        }
        let removed = self.items.remove(index);
        if self.items.is_empty() {
            self.current = None;
            self.next = None;
            return Ok(removed);
        }
        self.current = match self.current {
            Some(cur) if index < cur => Some(cur - 1),
            Some(cur) if index == cur => Some(0),
            Some(cur) => Some(cur.min(self.items.len() - 1)),
            None => Some(0),
        };
        self.refresh_next(rng);
        Ok(removed)
    }

    /// Promote the precomputed successor to current and draw a new successor.
    pub fn advance(&mut self, rng: &mut fastrand::Rng) {
        if self.items.is_empty() {
            return;
        }
        self.current = Some(self.next.unwrap_or(0).min(self.items.len() - 1));
        self.refresh_next(rng);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/playlist.rs"]
mod tests;
