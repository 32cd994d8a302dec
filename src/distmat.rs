//! Pairwise alpha-carbon distances stored as a single triangular arena.

use crate::error::{CmapError, Result};
use crate::pdb::{CoordinateTable, Point3};
use log::debug;
use rayon::prelude::*;

/// Distance reported for any pair involving a residue without coordinates.
/// Far beyond any biological contact threshold.
pub const MISSING_DISTANCE: f64 = 999.0;

/// Symmetric distance lookup over residue indices `0..len()`.
pub trait PairDistance {
    fn len(&self) -> usize;
    fn distance(&self, i: usize, j: usize) -> f64;
}

/// Distances for every unordered residue pair `(i, j)`, `i < j`.
///
/// Row `i` of the upper triangle holds `n - 1 - i` values and rows are laid
/// out back to back, so pair `(i, j)` lives at
/// `i * (2n - i - 1) / 2 + (j - i - 1)`.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    nres: usize,
    store: Vec<f64>,
    source_filename: Option<String>,
    source_chain: char,
    sequence: Option<String>,
}

fn euclid3d(a: &Point3, b: &Point3) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt()
}

impl DistanceMatrix {
    /// Build the matrix from a coordinate table.
    ///
    /// # Errors
    ///
    /// `Input` for an empty table, `Resource` when the triangular store can't
    /// be allocated.
    pub fn build(table: &CoordinateTable) -> Result<Self> {
        let n = table.len();
        if n == 0 {
            return Err(CmapError::Input("no residues to compare".to_string()));
        }

        let pairs = n * (n - 1) / 2;
        let mut store: Vec<f64> = Vec::new();
        store.try_reserve_exact(pairs).map_err(|e| {
            CmapError::Resource(format!("distance matrix for {} residues: {}", n, e))
        })?;
        store.resize(pairs, MISSING_DISTANCE);

        // Hand each worker a disjoint row of the triangle
        let mut rows: Vec<(usize, &mut [f64])> = Vec::with_capacity(n.saturating_sub(1));
        let mut rest = store.as_mut_slice();
        for i in 0..n.saturating_sub(1) {
            let (row, tail) = std::mem::take(&mut rest).split_at_mut(n - 1 - i);
            rows.push((i, row));
            rest = tail;
        }

        let coords = &table.coords;
        rows.into_par_iter().for_each(|(i, row)| {
            let Some(a) = coords[i].as_ref() else { return };
            for (k, slot) in row.iter_mut().enumerate() {
                if let Some(b) = coords[i + 1 + k].as_ref() {
                    *slot = euclid3d(a, b);
                }
            }
        });

        debug!("Computed {} pairwise distances for {} residues", pairs, n);

        Ok(DistanceMatrix {
            nres: n,
            store,
            source_filename: table.source_filename.clone(),
            source_chain: table.chain,
            sequence: table.sequence.clone(),
        })
    }

    #[inline]
    fn offset(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < j && j < self.nres);
        i * (2 * self.nres - i - 1) / 2 + (j - i - 1)
    }

    /// Residue pairs `(i, j)`, `i < j`, strictly closer than `threshold`,
    /// in increasing `(i, j)` order.
    pub fn contacts(&self, threshold: f64) -> impl Iterator<Item = (usize, usize)> + '_ {
        let n = self.nres;
        (0..n)
            .flat_map(move |i| (i + 1..n).map(move |j| (i, j)))
            .filter(move |&(i, j)| self.distance(i, j) < threshold)
    }

    pub fn source_filename(&self) -> Option<&str> {
        self.source_filename.as_deref()
    }

    pub fn source_chain(&self) -> char {
        self.source_chain
    }

    pub fn sequence(&self) -> Option<&str> {
        self.sequence.as_deref()
    }
}

impl PairDistance for DistanceMatrix {
    fn len(&self) -> usize {
        self.nres
    }

    fn distance(&self, i: usize, j: usize) -> f64 {
        if i == j {
            return 0.0;
        }
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        self.store[self.offset(lo, hi)].abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(points: &[Option<Point3>]) -> CoordinateTable {
        CoordinateTable::new(points.to_vec())
    }

    fn line_of(n: usize) -> CoordinateTable {
        table(&(0..n).map(|k| Some([k as f64, 0.0, 0.0])).collect::<Vec<_>>())
    }

    #[test]
    fn test_symmetry_and_identity() {
        let dm = DistanceMatrix::build(&line_of(9)).unwrap();
        for i in 0..9 {
            assert_eq!(dm.distance(i, i), 0.0);
            for j in 0..9 {
                assert_eq!(dm.distance(i, j), dm.distance(j, i));
                assert!((dm.distance(i, j) - (i as f64 - j as f64).abs()).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_offsets_cover_store_once() {
        let dm = DistanceMatrix::build(&line_of(7)).unwrap();
        let mut seen = vec![false; dm.store.len()];
        for i in 0..7 {
            for j in i + 1..7 {
                let k = dm.offset(i, j);
                assert!(!seen[k], "offset {} reused", k);
                seen[k] = true;
            }
        }
        assert!(seen.into_iter().all(|s| s));
    }

    #[test]
    fn test_missing_coordinates_use_sentinel() {
        let dm = DistanceMatrix::build(&table(&[
            Some([0.0, 0.0, 0.0]),
            None,
            Some([3.0, 4.0, 0.0]),
        ]))
        .unwrap();
        assert_eq!(dm.distance(0, 1), MISSING_DISTANCE);
        assert_eq!(dm.distance(2, 1), MISSING_DISTANCE);
        assert_eq!(dm.distance(1, 1), 0.0);
        assert!((dm.distance(0, 2) - 5.0).abs() < 1e-12);
        for t in [0.0, 8.0, 50.0, 998.9] {
            assert!(dm.distance(0, 1) > t);
        }
    }

    #[test]
    fn test_single_residue() {
        let dm = DistanceMatrix::build(&line_of(1)).unwrap();
        assert_eq!(dm.len(), 1);
        assert_eq!(dm.distance(0, 0), 0.0);
        assert_eq!(dm.contacts(8.0).count(), 0);
    }

    #[test]
    fn test_empty_table_is_input_error() {
        let err = DistanceMatrix::build(&table(&[])).unwrap_err();
        assert!(matches!(err, CmapError::Input(_)));
    }

    #[test]
    fn test_contacts_are_strict_and_ordered() {
        let dm = DistanceMatrix::build(&table(&[
            Some([0.0, 0.0, 0.0]),
            Some([1.0, 0.0, 0.0]),
            Some([2.0, 0.0, 0.0]),
        ]))
        .unwrap();
        let pairs: Vec<_> = dm.contacts(2.0).collect();
        assert_eq!(pairs, vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn test_provenance_is_carried() {
        let mut t = line_of(2);
        t.source_filename = Some("1abc.pdb".to_string());
        t.chain = 'B';
        t.sequence = Some("GA".to_string());
        let dm = DistanceMatrix::build(&t).unwrap();
        assert_eq!(dm.source_filename(), Some("1abc.pdb"));
        assert_eq!(dm.source_chain(), 'B');
        assert_eq!(dm.sequence(), Some("GA"));
    }
}
