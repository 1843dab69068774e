//! SVG to pixels, and pixels to PNG/JPEG bytes.

use std::path::PathBuf;
use std::sync::Arc;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, RgbaImage};
use resvg::tiny_skia::{Color, Pixmap, Transform};
use resvg::usvg::{self, fontdb};

use crate::error::{ExportFailed, Result};
use crate::layout::Measure;
use crate::style::Face;

pub const JPEG_QUALITY: u8 = 95;

/// Fonts available to the rasterizer. Loaded once and shared, so repeated
/// exports see the same faces.
#[derive(Clone)]
pub struct FontSet {
    db: Arc<fontdb::Database>,
}

impl std::fmt::Debug for FontSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSet").field("faces", &self.db.len()).finish()
    }
}

impl FontSet {
    /// No fonts at all; text renders as nothing.
    pub fn empty() -> Self {
        Self {
            db: Arc::new(fontdb::Database::new()),
        }
    }

    /// System fonts plus every font found under `extra_dirs`.
    pub fn load(extra_dirs: &[PathBuf]) -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        for dir in extra_dirs {
            if dir.is_dir() {
                db.load_fonts_dir(dir);
            } else {
                log::warn!("font directory {} does not exist", dir.display());
            }
        }
        if let Some(family) = fallback_family(&db) {
            log::debug!("sans-serif resolves to {}", family);
            db.set_sans_serif_family(family);
        }
        log::info!("loaded {} font faces", db.len());
        Self { db: Arc::new(db) }
    }

    pub fn face_count(&self) -> usize {
        self.db.len()
    }

    fn options(&self) -> usvg::Options<'static> {
        let mut opt = usvg::Options::default();
        opt.fontdb = Arc::clone(&self.db);
        opt
    }
}

/// Split a CSS `font-family` list into fontdb families.
fn css_families(list: &str) -> Vec<fontdb::Family<'_>> {
    list.split(',')
        .map(|name| name.trim().trim_matches(|c| c == '\'' || c == '"'))
        .filter(|name| !name.is_empty())
        .map(|name| match name {
            "serif" => fontdb::Family::Serif,
            "sans-serif" => fontdb::Family::SansSerif,
            "monospace" => fontdb::Family::Monospace,
            "cursive" => fontdb::Family::Cursive,
            "fantasy" => fontdb::Family::Fantasy,
            other => fontdb::Family::Name(other),
        })
        .collect()
}

/// Measures with the horizontal advances of the face `resvg` will pick.
/// Glyphs the face lacks, or a family with no match at all, fall back to the
/// style's average advance.
impl Measure for FontSet {
    fn width(&self, face: &Face, text: &str, size: f32, spacing: f32) -> f32 {
        let families = css_families(face.family);
        let query = fontdb::Query {
            families: &families,
            weight: fontdb::Weight(face.weight),
            stretch: fontdb::Stretch::Normal,
            style: fontdb::Style::Normal,
        };
        let ems = self.db.query(&query).and_then(|id| {
            self.db
                .with_face_data(id, |data, index| {
                    let parsed = ttf_parser::Face::parse(data, index).ok()?;
                    let per_em = f32::from(parsed.units_per_em());
                    if per_em <= 0.0 {
                        return None;
                    }
                    let sum = text
                        .chars()
                        .map(|c| {
                            parsed
                                .glyph_index(c)
                                .and_then(|g| parsed.glyph_hor_advance(g))
                                .map(|adv| f32::from(adv) / per_em)
                                .unwrap_or(face.advance)
                        })
                        .sum::<f32>();
                    Some(sum)
                })
                .flatten()
        });
        match ems {
            Some(ems) => (ems + spacing * text.chars().count() as f32) * size,
            None => face.measure(text, size, spacing),
        }
    }
}

/// The family that stands in for `sans-serif`: a common one if installed,
/// otherwise whatever face was loaded first.
fn fallback_family(db: &fontdb::Database) -> Option<String> {
    const PREFERRED: [&str; 4] = ["Arial", "Liberation Sans", "DejaVu Sans", "Noto Sans"];
    let has = |name: &str| {
        db.faces()
            .any(|face| face.families.iter().any(|(family, _)| family == name))
    };
    PREFERRED
        .iter()
        .find(|name| has(name))
        .map(|name| name.to_string())
        .or_else(|| {
            db.faces()
                .next()
                .and_then(|face| face.families.first().map(|(family, _)| family.clone()))
        })
}

/// Render `svg` onto an opaque white canvas of `width`×`height`.
pub fn rasterize(svg: &str, fonts: &FontSet, width: u32, height: u32) -> Result<Pixmap> {
    let tree = usvg::Tree::from_str(svg, &fonts.options())
        .map_err(|e| ExportFailed::Svg(e.to_string()))?;

    let mut pixmap = Pixmap::new(width, height).ok_or(ExportFailed::Canvas { width, height })?;
    pixmap.fill(Color::WHITE);

    let size = tree.size();
    let transform = Transform::from_scale(width as f32 / size.width(), height as f32 / size.height());
    resvg::render(&tree, transform, &mut pixmap.as_mut());
    Ok(pixmap)
}

fn to_image(pixmap: &Pixmap) -> Result<RgbaImage> {
    // The canvas is opaque, so premultiplied and straight alpha coincide.
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), pixmap.data().to_vec())
        .ok_or_else(|| ExportFailed::Encode("pixel buffer does not match canvas size".to_string()))
}

pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>> {
    let img = to_image(pixmap)?;
    let mut buf = Vec::new();
    img.write_with_encoder(PngEncoder::new(&mut buf))
        .map_err(|e| ExportFailed::Encode(e.to_string()))?;
    Ok(buf)
}

pub fn encode_jpeg(pixmap: &Pixmap, quality: u8) -> Result<Vec<u8>> {
    let rgb = DynamicImage::ImageRgba8(to_image(pixmap)?).to_rgb8();
    let mut buf = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))
        .map_err(|e| ExportFailed::Encode(e.to_string()))?;
    Ok(buf)
}
