//! Error types shared by the reader, the matrix, the raster and the viewer.

use thiserror::Error;

/// Fatal errors. Data anomalies in the input are logged and skipped instead.
#[derive(Debug, Error)]
pub enum CmapError {
    /// Unreadable file, missing chain, or no residues to work with.
    #[error("{0}")]
    Input(String),

    /// Allocation of the distance store or the raster failed.
    #[error("couldn't allocate memory: {0}")]
    Resource(String),

    /// I/O error while exporting or driving the terminal.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// PNG encoding or writing failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, CmapError>;
