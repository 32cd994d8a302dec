//! Pannable window onto the contact raster.
//!
//! Screen layout: row 0 is the status strip, row 1 the horizontal ruler,
//! column 0 (from row 2 down) the vertical ruler. The raster fills the rest.
//! Rulers scroll with the raster along their own axis only.

use crate::ruler;

/// Raster columns moved by one horizontal pan.
pub const PAN_STEP_X: isize = 10;
/// Raster rows moved by one vertical pan.
pub const PAN_STEP_Y: isize = 5;

/// Screen rows above the raster that never scroll.
const FIXED_ROWS: usize = 2;
/// Screen columns left of the raster that never scroll.
const FIXED_COLS: usize = 1;

#[derive(Debug, Clone)]
pub struct Viewport {
    x_offset: usize,
    y_offset: usize,
    raster_rows: usize,
    raster_cols: usize,
    term_rows: usize,
    term_cols: usize,
    hruler: String,
    vruler: Vec<char>,
}

impl Viewport {
    pub fn new(raster_rows: usize, raster_cols: usize, term_rows: usize, term_cols: usize) -> Self {
        let mut vp = Viewport {
            x_offset: 0,
            y_offset: 0,
            raster_rows,
            raster_cols,
            term_rows,
            term_cols,
            hruler: ruler::horizontal(raster_cols),
            vruler: ruler::vertical(raster_rows),
        };
        vp.clamp();
        vp
    }

    pub fn x_offset(&self) -> usize {
        self.x_offset
    }

    pub fn y_offset(&self) -> usize {
        self.y_offset
    }

    pub fn term_rows(&self) -> usize {
        self.term_rows
    }

    pub fn term_cols(&self) -> usize {
        self.term_cols
    }

    /// Largest horizontal offset; 0 when the raster is narrower than the screen.
    pub fn max_x(&self) -> usize {
        if self.raster_cols < self.term_cols {
            0
        } else {
            self.raster_cols + FIXED_COLS - self.term_cols
        }
    }

    /// Largest vertical offset; 0 when the raster is shorter than the screen.
    pub fn max_y(&self) -> usize {
        if self.raster_rows < self.term_rows {
            0
        } else {
            self.raster_rows + FIXED_ROWS - self.term_rows
        }
    }

    fn clamp(&mut self) {
        self.x_offset = self.x_offset.min(self.max_x());
        self.y_offset = self.y_offset.min(self.max_y());
    }

    /// New terminal extent, on entry and on every resize.
    pub fn reflow(&mut self, term_rows: usize, term_cols: usize) {
        self.term_rows = term_rows;
        self.term_cols = term_cols;
        self.clamp();
    }

    /// Move by a signed number of raster cells, then clamp.
    pub fn pan(&mut self, dx_cells: isize, dy_cells: isize) {
        self.x_offset = self.x_offset.saturating_add_signed(dx_cells);
        self.y_offset = self.y_offset.saturating_add_signed(dy_cells);
        self.clamp();
    }

    pub fn jump_start_x(&mut self) {
        self.x_offset = 0;
    }

    pub fn jump_end_x(&mut self) {
        self.x_offset = self.max_x();
    }

    pub fn jump_start_y(&mut self) {
        self.y_offset = 0;
    }

    pub fn jump_end_y(&mut self) {
        self.y_offset = self.max_y();
    }

    /// Adopt the extent of a freshly rendered raster, keeping the current
    /// offsets where they still fit.
    pub fn on_threshold_change(&mut self, raster_rows: usize, raster_cols: usize) {
        if raster_rows != self.raster_rows || raster_cols != self.raster_cols {
            self.raster_rows = raster_rows;
            self.raster_cols = raster_cols;
            self.hruler = ruler::horizontal(raster_cols);
            self.vruler = ruler::vertical(raster_rows);
        }
        self.clamp();
    }

    /// Raster cell shown at a screen position, if any.
    pub fn cell_at(&self, screen_row: usize, screen_col: usize) -> Option<(usize, usize)> {
        if screen_row < FIXED_ROWS || screen_col < FIXED_COLS {
            return None;
        }
        let r = self.y_offset + screen_row - FIXED_ROWS;
        let c = self.x_offset + screen_col - FIXED_COLS;
        (r < self.raster_rows && c < self.raster_cols).then_some((r, c))
    }

    /// The part of the horizontal ruler visible right of the vertical ruler.
    pub fn visible_hruler(&self) -> &str {
        let width = self.term_cols.saturating_sub(FIXED_COLS);
        let start = self.x_offset.min(self.hruler.len());
        let end = (start + width).min(self.hruler.len());
        &self.hruler[start..end]
    }

    /// Vertical ruler character for a screen row.
    pub fn vruler_at(&self, screen_row: usize) -> Option<char> {
        if screen_row < FIXED_ROWS {
            return None;
        }
        self.vruler.get(self.y_offset + screen_row - FIXED_ROWS).copied()
    }
}
