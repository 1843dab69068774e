//! Rendering of the Dimov business card.
//!
//! The pipeline is `CardRecord` → [`layout::Scene`] → SVG markup → pixels.
//! Every step is a pure function of its inputs and the [`style::CardStyle`],
//! so one record always produces the same image.
//!
//! ```no_run
//! use dimov_core::CardRecord;
//! use dimov_render::{export, ExportFormat, FontSet, CardStyle};
//!
//! let fonts = FontSet::load(&[]);
//! let png = export(&CardRecord::default(), &CardStyle::default(), ExportFormat::Png, &fonts)?;
//! # Ok::<(), dimov_render::ExportFailed>(())
//! ```

pub mod error;
pub mod export;
pub mod layout;
pub mod raster;
pub mod style;
pub mod svg;

use dimov_core::CardRecord;

pub use error::{ExportFailed, Result};
pub use export::{export, file_name, save, ExportFormat};
pub use layout::{layout, layout_with, Estimate, Measure, Scene};
pub use raster::FontSet;
pub use style::CardStyle;

pub const INTRINSIC_WIDTH: f64 = 2243.0;
pub const INTRINSIC_HEIGHT: f64 = 341.0;

/// On-screen scale for a container `viewport_width` units wide:
/// `min(viewport_width / INTRINSIC_WIDTH, 1)`, never below zero.
pub fn display_scale(viewport_width: f64) -> f64 {
    if viewport_width.is_nan() {
        return 0.0;
    }
    (viewport_width / INTRINSIC_WIDTH).clamp(0.0, 1.0)
}

/// SVG preview of `record` at `scale`, clamped to `[0, 1]`.
pub fn preview_svg(record: &CardRecord, style: &CardStyle, scale: f64) -> String {
    let scale = if scale.is_nan() { 1.0 } else { scale.clamp(0.0, 1.0) };
    svg::to_svg(&layout(record, style), scale)
}
