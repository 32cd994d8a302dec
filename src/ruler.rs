//! Axis rulers labelling every 20th residue alongside the raster.

/// Residues between two ruler labels.
const LABEL_EVERY: usize = 20;

/// Build a ruler of `limit` characters with labels 1, 21, 41, ... placed
/// every `cells_per_label` positions.
///
/// A label is only written while it fits entirely before `limit`.
fn ruler(limit: usize, cells_per_label: usize) -> Vec<char> {
    let mut s = vec![' '; limit];
    let mut residue = 1usize;
    let mut pos = 0usize;
    let mut label = residue.to_string();
    while pos + label.len() < limit {
        for (k, ch) in label.chars().enumerate() {
            s[pos + k] = ch;
        }
        residue += LABEL_EVERY;
        pos += cells_per_label;
        label = residue.to_string();
    }
    s
}

/// Horizontal ruler: one char per raster column (2 residues each).
pub fn horizontal(raster_cols: usize) -> String {
    ruler(raster_cols, LABEL_EVERY / 2).into_iter().collect()
}

/// Vertical ruler: one char per raster row (4 residues each). Labels are
/// written downward, one digit per row.
pub fn vertical(raster_rows: usize) -> Vec<char> {
    ruler(raster_rows, LABEL_EVERY / 4)
}
