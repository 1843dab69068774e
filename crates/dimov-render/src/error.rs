//! Error types for rendering and export

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExportFailed>;

#[derive(Error, Debug)]
pub enum ExportFailed {
    /// The generated markup could not be parsed
    #[error("SVG parsing failed: {0}")]
    Svg(String),

    #[error("cannot allocate a {width}x{height} canvas")]
    Canvas { width: u32, height: u32 },

    /// Image encoder rejected the pixels
    #[error("image encoding failed: {0}")]
    Encode(String),

    #[error("writing the image failed: {0}")]
    Io(#[from] std::io::Error),
}
