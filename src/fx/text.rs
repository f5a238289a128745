use std::borrow::Cow;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::error::{VjError, VjResult};

static NEXT_FACE_ID: AtomicU64 = AtomicU64::new(1);

/// Width per character, in ems, used when no face can be resolved.
const FALLBACK_ADVANCE_EM: f64 = 0.6;
const SHAPE_CACHE_CAP: usize = 512;

/// Raw font bytes plus the face index inside them.
#[derive(Clone, Debug)]
pub struct FontFace {
    /// Process-unique id, stable for the lifetime of the face; backends key caches on it.
    pub id: u64,
    pub data: Arc<Vec<u8>>,
    pub index: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedGlyph {
    pub id: u32,
    pub x: f32,
    pub y: f32,
}

/// One shaped, unwrapped line of text. Glyph positions are relative to the layout's
/// top-left corner with `y` on the baseline.
#[derive(Clone, Debug)]
pub struct ShapedText {
    pub content: String,
    pub font_size: f32,
    pub width: f64,
    pub height: f64,
    pub glyphs: Vec<PlacedGlyph>,
    pub font: Option<FontFace>,
}

impl ShapedText {
    fn measured_only(content: &str, size: f32) -> Self {
        let chars = content.chars().count() as f64;
        let size_f = f64::from(size);
        Self {
            content: content.to_owned(),
            font_size: size,
            width: chars * size_f * FALLBACK_ADVANCE_EM,
            height: size_f,
            glyphs: Vec::new(),
            font: None,
        }
    }
}

#[derive(Clone)]
struct ResolvedFace {
    face: FontFace,
    parley_family: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ShapeKey {
    family: String,
    size_bits: u32,
    content: String,
}

/// Stateful helper that resolves font families and shapes single-line text with Parley.
///
/// Families registered with [`TextEngine::register_font`] win; otherwise the system font
/// database is queried (bold weight, sans-serif fallback). With no usable face the engine
/// still measures text so hit regions stay meaningful.
pub struct TextEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    registered: HashMap<String, PathBuf>,
    resolved: HashMap<String, Option<ResolvedFace>>,
    system: Option<usvg::fontdb::Database>,
    use_system_fonts: bool,
    cache: HashMap<ShapeKey, Arc<ShapedText>>,
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new(true)
    }
}

impl TextEngine {
    pub fn new(use_system_fonts: bool) -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            registered: HashMap::new(),
            resolved: HashMap::new(),
            system: None,
            use_system_fonts,
            cache: HashMap::new(),
        }
    }

    /// Engine that only knows explicitly registered fonts.
    pub fn isolated() -> Self {
        Self::new(false)
    }

    /// Bind a family name to a font file. Later lookups of `family` use this file.
    pub fn register_font(&mut self, family: &str, path: impl Into<PathBuf>) {
        let key = family_key(family);
        self.registered.insert(key.clone(), path.into());
        self.resolved.remove(&key);
        self.cache.retain(|k, _| k.family != key);
    }

    /// Shape `content` at `size` pixels in `family`.
    pub fn shape(&mut self, content: &str, family: &str, size: f64) -> Arc<ShapedText> {
        let size = if size.is_finite() && size > 0.0 {
            size as f32
        } else {
            0.0
        };
        let key = ShapeKey {
            family: family_key(family),
            size_bits: size.to_bits(),
            content: content.to_owned(),
        };
        if let Some(hit) = self.cache.get(&key) {
            return Arc::clone(hit);
        }

        let shaped = if size <= 0.0 || content.is_empty() {
            ShapedText::measured_only(content, size)
        } else {
            match self.resolve(&key.family) {
                Some(face) => self.layout(content, size, &face),
                None => ShapedText::measured_only(content, size),
            }
        };

        if self.cache.len() >= SHAPE_CACHE_CAP {
            self.cache.clear();
        }
        let shaped = Arc::new(shaped);
        self.cache.insert(key, Arc::clone(&shaped));
        shaped
    }

    fn layout(&mut self, content: &str, size: f32, face: &ResolvedFace) -> ShapedText {
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, content, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(face.parley_family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::BOLD,
        ));

        let mut layout: parley::Layout<()> = builder.build(content);
        layout.break_all_lines(None);

        let mut glyphs = Vec::new();
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                glyphs.extend(run.glyphs().map(|g| PlacedGlyph {
                    id: u32::from(g.id),
                    x: g.x,
                    y: g.y,
                }));
            }
        }

        ShapedText {
            content: content.to_owned(),
            font_size: size,
            width: f64::from(layout.width()),
            height: f64::from(layout.height()).max(f64::from(size)),
            glyphs,
            font: Some(face.face.clone()),
        }
    }

    fn resolve(&mut self, key: &str) -> Option<ResolvedFace> {
        if let Some(hit) = self.resolved.get(key) {
            return hit.clone();
        }
        let found = match self.load_face_bytes(key) {
            Ok(Some((bytes, index))) => self.register_with_parley(bytes, index),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(family = key, error = %e, "font load failed");
                None
            }
        };
        if found.is_none() {
            tracing::warn!(family = key, "no font face available; text is measured but not drawn");
        }
        self.resolved.insert(key.to_owned(), found.clone());
        found
    }

    fn load_face_bytes(&mut self, key: &str) -> VjResult<Option<(Vec<u8>, u32)>> {
        if let Some(path) = self.registered.get(key) {
            let bytes = std::fs::read(path).map_err(|e| {
                VjError::media(format!("failed to read font '{}': {e}", path.display()))
            })?;
            return Ok(Some((bytes, 0)));
        }
        if !self.use_system_fonts {
            return Ok(None);
        }

        let db = self.system.get_or_insert_with(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            db
        });
        let families = [
            usvg::fontdb::Family::Name(key),
            usvg::fontdb::Family::SansSerif,
        ];
        let query = usvg::fontdb::Query {
            families: &families,
            weight: usvg::fontdb::Weight::BOLD,
            stretch: usvg::fontdb::Stretch::Normal,
            style: usvg::fontdb::Style::Normal,
        };
        let Some(id) = db.query(&query) else {
            return Ok(None);
        };
        Ok(db.with_face_data(id, |data, index| (data.to_vec(), index)))
    }

    fn register_with_parley(&mut self, bytes: Vec<u8>, index: u32) -> Option<ResolvedFace> {
        let data = Arc::new(bytes);
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(data.as_ref().clone()), None);
        let family_id = families.first().map(|(id, _)| *id)?;
        let parley_family = self.font_ctx.collection.family_name(family_id)?.to_string();
        Some(ResolvedFace {
            face: FontFace {
                id: NEXT_FACE_ID.fetch_add(1, Ordering::Relaxed),
                data,
                index,
            },
            parley_family,
        })
    }
}

fn family_key(family: &str) -> String {
    family.trim().to_owned()
}

#[cfg(test)]
#[path = "../../tests/unit/fx/text.rs"]
mod tests;
