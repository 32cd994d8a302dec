//! Fixed-width PDB reader producing the per-residue alpha-carbon table.
//!
//! The chain length and primary sequence come from `SEQRES` records; the
//! coordinates come from ` CA ` atoms of `ATOM` records in the requested
//! chain. Records are read as raw bytes, so non-UTF-8 text in other records
//! is harmless. When a residue is recorded more than once (alternate
//! locations, later models) the last record wins.

use crate::error::{CmapError, Result};
use log::{debug, info, warn};
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

pub type Point3 = [f64; 3];

/// Ordered, optionally sparse alpha-carbon coordinates, one per residue.
///
/// Index `i` holds residue `i + 1`. An entry is `None` when the file never
/// recorded a position for that residue.
#[derive(Debug, Clone)]
pub struct CoordinateTable {
    pub coords: Vec<Option<Point3>>,
    pub source_filename: Option<String>,
    pub chain: char,
    pub sequence: Option<String>,
}

impl CoordinateTable {
    /// A bare table without provenance, mostly useful for tests and callers
    /// that already hold coordinates.
    pub fn new(coords: Vec<Option<Point3>>) -> Self {
        CoordinateTable {
            coords,
            source_filename: None,
            chain: 'A',
            sequence: None,
        }
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Number of residues with a recorded position.
    pub fn resolved(&self) -> usize {
        self.coords.iter().filter(|c| c.is_some()).count()
    }
}

/// Declared length and sequence of one chain, from its SEQRES records.
#[derive(Debug, Clone, Default)]
struct ChainHeader {
    declared_len: usize,
    sequence: String,
}

/// SEQRES headers keyed by chain, plus the order chains were declared in.
#[derive(Debug, Default)]
struct SeqresTable {
    chains: FxHashMap<char, ChainHeader>,
    order: Vec<char>,
}

/// Read the coordinate table for `chain` (or the first declared chain) from
/// a PDB file on disk.
pub fn read_coordinates(path: &Path, chain: Option<char>) -> Result<CoordinateTable> {
    info!("Loading PDB file {:?}...", path);

    // First pass: SEQRES header
    let file = File::open(path).map_err(|e| unreadable(path, e))?;
    let seqres = scan_seqres(BufReader::new(file)).map_err(|e| unreadable(path, e))?;
    let (target, header) = select_chain(&seqres, chain)?;

    // Second pass: alpha carbons of the selected chain
    let file2 = File::open(path).map_err(|e| unreadable(path, e))?;
    let coords = scan_ca_atoms(BufReader::new(file2), target, header.declared_len)
        .map_err(|e| unreadable(path, e))?;

    let table = CoordinateTable {
        coords,
        source_filename: Some(path.display().to_string()),
        chain: target,
        sequence: Some(header.sequence.clone()),
    };
    require_resolved(&table)?;
    info!(
        "Chain {}: {} residues declared, {} with coordinates",
        target,
        table.len(),
        table.resolved()
    );
    Ok(table)
}

/// Same as [`read_coordinates`] but over PDB text already in memory.
pub fn parse_coordinates(text: impl AsRef<[u8]>, chain: Option<char>) -> Result<CoordinateTable> {
    let text = text.as_ref();
    let seqres = scan_seqres(text)?;
    let (target, header) = select_chain(&seqres, chain)?;
    let coords = scan_ca_atoms(text, target, header.declared_len)?;
    let table = CoordinateTable {
        coords,
        source_filename: None,
        chain: target,
        sequence: Some(header.sequence.clone()),
    };
    require_resolved(&table)?;
    Ok(table)
}

/// A chain without a single alpha carbon has nothing to draw.
fn require_resolved(table: &CoordinateTable) -> Result<()> {
    if table.resolved() == 0 {
        return Err(CmapError::Input(format!(
            "no usable CA atoms found for chain [{}]",
            table.chain
        )));
    }
    Ok(())
}

/// Newline-separated records, decoded leniently.
fn records<R: BufRead>(reader: R) -> impl Iterator<Item = io::Result<String>> {
    reader.split(b'\n').map(|bytes| {
        bytes.map(|mut b| {
            if b.last() == Some(&b'\r') {
                b.pop();
            }
            String::from_utf8_lossy(&b).into_owned()
        })
    })
}

fn unreadable(path: &Path, e: io::Error) -> CmapError {
    CmapError::Input(format!(
        "couldn't read coordinates from file [{}]: {}",
        path.display(),
        e
    ))
}

fn select_chain(seqres: &SeqresTable, chain: Option<char>) -> Result<(char, &ChainHeader)> {
    let target = match chain.or_else(|| seqres.order.first().copied()) {
        Some(c) => c,
        None => {
            return Err(CmapError::Input(
                "no SEQRES records found; cannot determine chain length".to_string(),
            ))
        }
    };
    let header = seqres.chains.get(&target).ok_or_else(|| {
        let declared: Vec<String> = seqres.order.iter().map(|c| c.to_string()).collect();
        CmapError::Input(format!(
            "chain [{}] not found (declared chains: {})",
            target,
            if declared.is_empty() { "none".to_string() } else { declared.join(", ") }
        ))
    })?;
    if header.declared_len == 0 {
        return Err(CmapError::Input(format!("chain [{}] declares zero residues", target)));
    }
    Ok((target, header))
}

/// Byte column of a fixed-width record as a char.
fn column(line: &str, idx: usize) -> Option<char> {
    line.as_bytes().get(idx).map(|&b| b as char)
}

/// Fixed-width field, clipped to the line; short lines give a short field.
fn field(line: &str, start: usize, end: usize) -> &str {
    let end = end.min(line.len());
    line.get(start.min(end)..end).unwrap_or("")
}

fn scan_seqres<R: BufRead>(reader: R) -> io::Result<SeqresTable> {
    let mut table = SeqresTable::default();

    for line in records(reader) {
        let line = line?;
        if line.starts_with("ATOM  ") || line.starts_with("HETATM") {
            // SEQRES is header-only
            break;
        }
        if !line.starts_with("SEQRES") {
            continue;
        }
        let Some(chain) = column(&line, 11) else { continue };
        let order = &mut table.order;
        let header = table.chains.entry(chain).or_insert_with(|| {
            order.push(chain);
            ChainHeader {
                declared_len: field(&line, 13, 17).trim().parse().unwrap_or(0),
                sequence: String::new(),
            }
        });
        let remaining = header.declared_len.saturating_sub(header.sequence.len());
        if remaining > 0 {
            read_seqres_residues(&line, remaining, &mut header.sequence);
        }
    }

    debug!("SEQRES chains: {:?}", table.order);
    Ok(table)
}

/// Append up to `limit` one-letter codes from one SEQRES record.
///
/// Each record carries at most 13 residues; the serial number tells how many
/// of the declared total precede this record.
fn read_seqres_residues(line: &str, limit: usize, out: &mut String) {
    let serial: usize = field(line, 7, 10).trim().parse().unwrap_or(0);
    let total: usize = field(line, 13, 17).trim().parse().unwrap_or(0);
    let offset = serial.saturating_sub(1) * 13;
    let recorded = total.saturating_sub(offset).min(13);

    let mut written = 0;
    while written < recorded && written < limit {
        let start = 19 + 4 * written;
        let Some(name) = line.get(start..start + 3) else { break };
        out.push(one_letter_code(name));
        written += 1;
    }
}

/// Convert a SEQRES residue name to its one-letter code.
///
/// Nucleotide names keep their leading blanks, as they appear right-justified
/// in the record.
fn one_letter_code(name: &str) -> char {
    match name {
        "ALA" => 'A',
        "ASX" => 'B',
        "CYS" => 'C',
        "ASP" => 'D',
        "GLU" => 'E',
        "PHE" => 'F',
        "GLY" => 'G',
        "HIS" => 'H',
        "ILE" => 'I',
        "LYS" => 'K',
        "LEU" => 'L',
        "MET" => 'M',
        "ASN" => 'N',
        "PRO" => 'P',
        "GLN" => 'Q',
        "ARG" => 'R',
        "SER" => 'S',
        "THR" => 'T',
        "VAL" => 'V',
        "TRP" => 'W',
        "XAA" => 'X',
        "TYR" => 'Y',
        "GLX" => 'Z',
        // Ribonucleotides
        "  A" => 'A',
        "  C" => 'C',
        "  G" => 'G',
        "  U" => 'U',
        // Deoxyribonucleotides
        " DA" => 'A',
        " DC" => 'C',
        " DG" => 'G',
        " DT" => 'T',
        _ => 'X',
    }
}

fn parse_point(line: &str) -> Option<Point3> {
    let x: f64 = field(line, 30, 38).trim().parse().ok()?;
    let y: f64 = field(line, 38, 46).trim().parse().ok()?;
    let z: f64 = field(line, 46, 54).trim().parse().ok()?;
    if x.is_finite() && y.is_finite() && z.is_finite() {
        Some([x, y, z])
    } else {
        None
    }
}

fn scan_ca_atoms<R: BufRead>(
    reader: R,
    chain: char,
    nres: usize,
) -> io::Result<Vec<Option<Point3>>> {
    let mut coords: Vec<Option<Point3>> = vec![None; nres];
    let mut skipped = 0usize;

    for line in records(reader) {
        let line = line?;
        if !line.starts_with("ATOM  ") {
            continue;
        }
        if field(&line, 12, 16) != " CA " || column(&line, 21) != Some(chain) {
            continue;
        }

        let resseq: i64 = field(&line, 22, 26).trim().parse().unwrap_or(0);
        if resseq <= 0 || resseq as usize > nres {
            warn!(
                "unexpected ATOM record found in chain {} [length {}]: {}",
                chain,
                nres,
                line.trim_end()
            );
            skipped += 1;
            continue;
        }

        let Some(point) = parse_point(&line) else {
            warn!("unreadable coordinates in ATOM record: {}", line.trim_end());
            skipped += 1;
            continue;
        };

        // Alternate locations and later models overwrite earlier records
        coords[resseq as usize - 1] = Some(point);
    }

    if skipped > 0 {
        debug!("Skipped {} ATOM records in chain {}", skipped, chain);
    }
    Ok(coords)
}
