#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The scene has no stored visual to export.
    #[error("The scene has no visual data to export.")]
    MissingVisual,

    /// The story had no files at all to bundle.
    #[error("The story has no media files to download.")]
    NothingToExport,

    /// A raster image could not be decoded.
    #[error("Failed to decode image data: {0}")]
    Decode(String),

    /// The composite could not be encoded.
    #[error("Failed to encode the exported image: {0}")]
    Encode(String),

    /// A text overlay references a font family with no registered data.
    #[error("Font family '{0}' is not available for export")]
    Font(String),

    /// Shaping or rasterizing overlay text failed.
    #[error("Failed to lay out overlay text: {0}")]
    Layout(String),

    /// The canvas size fell outside what the rasterizer supports.
    #[error("Export canvas {width}x{height} is out of range")]
    CanvasSize { width: u32, height: u32 },

    /// Zip assembly failed.
    #[error("Failed to build the download archive: {0}")]
    Zip(String),

    /// Underlying I/O failure while writing archive entries.
    #[error("Failed to write archive data: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid aspect ratio or overlay value on the scene being exported.
    #[error(transparent)]
    Core(#[from] artie_core::error::CoreError),
}
