use std::fs;
use std::path::{Path, PathBuf};

use dimov_core::CardRecord;

use crate::error::Result;
use crate::raster::{self, FontSet, JPEG_QUALITY};
use crate::style::CardStyle;
use crate::{layout, svg};

pub const BASE_NAME: &str = "dimov-logo";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Jpeg,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
        }
    }

    /// Accepts "png", "jpg" and "jpeg", case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Some(ExportFormat::Png),
            "jpg" | "jpeg" => Some(ExportFormat::Jpeg),
            _ => None,
        }
    }
}

pub fn file_name(format: ExportFormat) -> String {
    format!("{}.{}", BASE_NAME, format.extension())
}

/// Encode the card at its intrinsic size, measuring text with `fonts`.
/// Display scale never applies here.
pub fn export(
    record: &CardRecord,
    style: &CardStyle,
    format: ExportFormat,
    fonts: &FontSet,
) -> Result<Vec<u8>> {
    let markup = svg::to_svg(&layout::layout_with(record, style, fonts), 1.0);
    let pixmap = raster::rasterize(
        &markup,
        fonts,
        style.width.round() as u32,
        style.height.round() as u32,
    )?;
    let bytes = match format {
        ExportFormat::Png => raster::encode_png(&pixmap)?,
        ExportFormat::Jpeg => raster::encode_jpeg(&pixmap, JPEG_QUALITY)?,
    };
    log::debug!("exported {} ({} bytes)", file_name(format), bytes.len());
    Ok(bytes)
}

/// Write `bytes` as `dir/dimov-logo.<ext>`. The file appears complete or not
/// at all.
pub fn save(dir: &Path, format: ExportFormat, bytes: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name(format));
    let tmp = dir.join(format!(".{}.tmp", file_name(format)));
    if let Err(e) = fs::write(&tmp, bytes).and_then(|_| fs::rename(&tmp, &path)) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(path)
}
