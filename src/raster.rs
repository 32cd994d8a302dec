//! Braille raster of a contact map.
//!
//! One screen cell covers a block of 4 rows × 2 columns of the N×N contact
//! matrix. Each of the eight residue pairs in the block maps to one braille
//! dot, so the cell's glyph is `U+2800` plus the sum of the dot weights of
//! the pairs in contact.

use crate::distmat::PairDistance;
use crate::error::{CmapError, Result};

/// Residue rows covered by one cell.
pub const CELL_ROWS: usize = 4;
/// Residue columns covered by one cell.
pub const CELL_COLS: usize = 2;

/// Braille dot weight for sub-position `[dx][dy]` of a cell.
const DOT_WEIGHTS: [[u8; CELL_ROWS]; CELL_COLS] = [[0x01, 0x02, 0x04, 0x40], [0x08, 0x10, 0x20, 0x80]];

const BRAILLE_BASE: u32 = 0x2800;

/// Packed contact state for one threshold. Row-major, `rows × cols` codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRaster {
    rows: usize,
    cols: usize,
    cells: Vec<u8>,
}

/// Cells needed to cover `nres` residues: `(rows, cols)`.
pub fn raster_extent(nres: usize) -> (usize, usize) {
    (nres.div_ceil(CELL_ROWS), nres.div_ceil(CELL_COLS))
}

/// Glyph code of the cell whose top-left residue pair is `(y0, x0)`.
///
/// Only sub-positions that index an existing residue are tested. On a
/// trailing half column the right-hand dots stay unset; on a short last row
/// so do the dots below the final residue.
fn cell_code<D: PairDistance + ?Sized>(dm: &D, y0: usize, x0: usize, threshold: f64) -> u8 {
    let n = dm.len();
    let mut code = 0u8;
    for (dx, weights) in DOT_WEIGHTS.iter().enumerate() {
        let x = x0 + dx;
        if x >= n {
            break;
        }
        for (dy, &weight) in weights.iter().enumerate() {
            let y = y0 + dy;
            if y >= n {
                break;
            }
            if dm.distance(y, x) <= threshold {
                code |= weight;
            }
        }
    }
    code
}

impl ContactRaster {
    /// Render the contact map of `dm` at `threshold`.
    ///
    /// # Errors
    ///
    /// `Resource` when the cell buffer can't be allocated.
    pub fn render<D: PairDistance + ?Sized>(dm: &D, threshold: f64) -> Result<Self> {
        let (rows, cols) = raster_extent(dm.len());
        let mut cells: Vec<u8> = Vec::new();
        cells
            .try_reserve_exact(rows * cols)
            .map_err(|e| CmapError::Resource(format!("contact raster {}x{}: {}", rows, cols, e)))?;

        for r in 0..rows {
            for c in 0..cols {
                cells.push(cell_code(dm, r * CELL_ROWS, c * CELL_COLS, threshold));
            }
        }

        Ok(ContactRaster { rows, cols, cells })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Packed dot bits of cell `(row, col)`.
    pub fn code(&self, row: usize, col: usize) -> u8 {
        self.cells[row * self.cols + col]
    }

    /// Displayable glyph of cell `(row, col)`; blank when no dot is set.
    pub fn glyph(&self, row: usize, col: usize) -> char {
        glyph_for(self.code(row, col))
    }

    /// Total number of set dots, i.e. ordered residue pairs in contact.
    pub fn dot_count(&self) -> usize {
        self.cells.iter().map(|c| c.count_ones() as usize).sum()
    }
}

pub fn glyph_for(code: u8) -> char {
    if code == 0 {
        return ' ';
    }
    char::from_u32(BRAILLE_BASE + code as u32).unwrap_or(' ')
}

/// Checkerboard shading for readability: blocks of 10 × 5 cells, i.e.
/// 20 × 20 residues. Purely cosmetic.
pub fn is_light_cell(row: usize, col: usize) -> bool {
    (col % 20 < 10 && row % 10 < 5) || (col % 20 >= 10 && row % 10 >= 5)
}
