//! Terminal contact maps of protein chains.
//!
//! A PDB chain's alpha carbons become a triangular [`DistanceMatrix`], which
//! is rasterised into braille glyphs ([`ContactRaster`]) and shown through a
//! pannable [`Viewport`]. The matrix can also be exported as a contact list,
//! an EPS or SVG diagram, or a PNG image.

pub mod distmat;
pub mod error;
pub mod export;
pub mod keys;
pub mod pdb;
pub mod raster;
pub mod ruler;
pub mod tui;
pub mod viewport;

pub use distmat::{DistanceMatrix, PairDistance, MISSING_DISTANCE};
pub use error::{CmapError, Result};
pub use pdb::{CoordinateTable, Point3};
pub use raster::ContactRaster;
pub use viewport::Viewport;
