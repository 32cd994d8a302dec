//! Contact-map exporters: text contact list, EPS, SVG and PNG.
//!
//! All of them enumerate unordered residue pairs `(i, j)`, `i < j`, with a
//! distance strictly below the threshold. The PNG is the exception and draws
//! the full symmetric matrix, like the terminal raster does.

use crate::distmat::{DistanceMatrix, PairDistance};
use crate::error::Result;
use image::{Rgb, RgbImage};
use log::{debug, info};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Points of drawing area for the EPS and SVG diagrams, whatever the chain length.
const DIAGRAM_SIDE: f64 = 72.0 * 6.0;
const FRAME_WIDTH: f64 = 1.0;
/// Room above the frame for the title lines.
const TITLE_SPACE: f64 = 40.0;
/// Longest PNG side in pixels before the per-residue scale is reduced.
const MAX_PNG_SIDE: usize = 4096;

const CONTACT_RGB: [u8; 3] = [44, 62, 80];
const BACKGROUND_RGB: [u8; 3] = [255, 255, 255];

/// Write the contact list: `#` header lines, then one tab-separated 1-based
/// pair per line.
pub fn write_contacts<W: Write>(out: &mut W, dm: &DistanceMatrix, threshold: f64) -> Result<()> {
    writeln!(out, "# contactlook v{}", env!("CARGO_PKG_VERSION"))?;
    if let Some(name) = dm.source_filename() {
        writeln!(out, "# source file: {}", name)?;
    }
    writeln!(out, "# source chain: {}", dm.source_chain())?;
    if let Some(seq) = dm.sequence() {
        writeln!(out, "# sequence: {}", seq)?;
    }
    writeln!(out, "# threshold: {:.6}", threshold)?;

    let mut count = 0usize;
    for (i, j) in dm.contacts(threshold) {
        writeln!(out, "{}\t{}", i + 1, j + 1)?;
        count += 1;
    }
    debug!("Wrote {} contacts", count);
    Ok(())
}

/// Geometry shared by the vector diagrams.
struct Diagram {
    boxw: f64,
    side: f64,
}

impl Diagram {
    fn new(nres: usize) -> Self {
        let boxw = DIAGRAM_SIDE / nres.max(1) as f64;
        Diagram {
            boxw,
            side: 2.0 * FRAME_WIDTH + nres as f64 * boxw,
        }
    }
}

fn escape_ps(s: &str) -> String {
    s.replace('\\', "\\\\").replace('(', "\\(").replace(')', "\\)")
}

/// Write an Encapsulated PostScript diagram. Row `i` runs top to bottom,
/// column `j` left to right, so contacts fill the upper-right triangle.
pub fn write_eps<W: Write>(out: &mut W, dm: &DistanceMatrix, threshold: f64) -> Result<()> {
    let n = dm.len();
    let d = Diagram::new(n);
    let xmax = d.side;
    let ymax = xmax + TITLE_SPACE;
    let inner = n as f64 * d.boxw + FRAME_WIDTH;

    writeln!(out, "%!PS-Adobe-3.0 EPSF-3.0")?;
    writeln!(out, "%%BoundingBox: 0 0 {} {}", xmax.ceil(), ymax.ceil())?;
    writeln!(out, "/Courier\n12 selectfont")?;
    writeln!(out, "5 {:.6} moveto", ymax - 15.0)?;
    writeln!(out, "(File: {}) show", escape_ps(dm.source_filename().unwrap_or("-")))?;
    writeln!(out, "5 {:.6} moveto", ymax - 30.0)?;
    writeln!(out, "(Threshold: {:.2}) show", threshold)?;

    // Frame
    writeln!(out, "gsave\n.75 .75 .75 setrgbcolor")?;
    writeln!(out, "newpath")?;
    writeln!(out, "{:.6} {:.6} moveto", FRAME_WIDTH / 2.0, FRAME_WIDTH / 2.0)?;
    writeln!(out, "0 {:.6} rlineto", inner)?;
    writeln!(out, "{:.6} 0 rlineto", inner)?;
    writeln!(out, "0 -{:.6} rlineto", inner)?;
    writeln!(out, "-{:.6} 0 rlineto", inner)?;
    writeln!(out, "closepath\n{:.6} setlinewidth\nstroke", FRAME_WIDTH)?;
    writeln!(out, "grestore")?;

    writeln!(
        out,
        "/square {{\n/y exch def\n/x exch def\nnewpath\nx y moveto\n0 {b:.6} rlineto\n{b:.6} 0 rlineto\n0 -{b:.6} rlineto\n-{b:.6} 0 rlineto\nclosepath\nfill\n}} def",
        b = d.boxw
    )?;

    for (i, j) in dm.contacts(threshold) {
        let x = FRAME_WIDTH + j as f64 * d.boxw;
        let y = xmax - FRAME_WIDTH - (i + 1) as f64 * d.boxw;
        writeln!(out, "{:.6} {:.6} square", x, y)?;
    }
    writeln!(out, "showpage")?;
    Ok(())
}

/// Escape special XML characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Render the diagram as SVG, same layout as the EPS with the y axis flipped.
pub fn render_svg(dm: &DistanceMatrix, threshold: f64) -> String {
    let n = dm.len();
    let d = Diagram::new(n);
    let width = d.side;
    let height = d.side + TITLE_SPACE;
    let inner = n as f64 * d.boxw + FRAME_WIDTH;

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
  .title {{ font-family: 'DejaVu Sans Mono', 'Courier New', monospace; font-size: 12px; }}
</style>
<rect width="100%" height="100%" fill="white"/>
"#,
        width, height, width, height
    ));
    svg.push_str(&format!(
        r#"<text x="5" y="15" class="title">File: {}</text>"#,
        escape_xml(dm.source_filename().unwrap_or("-"))
    ));
    svg.push('\n');
    svg.push_str(&format!(
        r#"<text x="5" y="30" class="title">Threshold: {:.2}</text>"#,
        threshold
    ));
    svg.push('\n');
    svg.push_str(&format!(
        r#"<rect x="{:.3}" y="{:.3}" width="{:.3}" height="{:.3}" fill="none" stroke="rgb(191,191,191)" stroke-width="{}"/>"#,
        FRAME_WIDTH / 2.0,
        TITLE_SPACE + FRAME_WIDTH / 2.0,
        inner,
        inner,
        FRAME_WIDTH
    ));
    svg.push('\n');

    for (i, j) in dm.contacts(threshold) {
        let x = FRAME_WIDTH + j as f64 * d.boxw;
        let y = TITLE_SPACE + FRAME_WIDTH + i as f64 * d.boxw;
        svg.push_str(&format!(
            r#"<rect x="{:.3}" y="{:.3}" width="{:.3}" height="{:.3}" fill="black"/>"#,
            x, y, d.boxw, d.boxw
        ));
        svg.push('\n');
    }

    svg.push_str("</svg>\n");
    svg
}

/// Rasterise the full symmetric contact matrix, `pixels_per_residue` pixels
/// per residue (reduced for long chains).
pub fn render_png(dm: &DistanceMatrix, threshold: f64, pixels_per_residue: u32) -> RgbImage {
    let n = dm.len();
    let max_scale = (MAX_PNG_SIDE / n.max(1)).max(1) as u32;
    let scale = pixels_per_residue.clamp(1, max_scale);
    if scale != pixels_per_residue {
        debug!("Reduced PNG scale from {} to {} px per residue", pixels_per_residue, scale);
    }

    let side = n as u32 * scale;
    let mut img = RgbImage::from_pixel(side, side, Rgb(BACKGROUND_RGB));
    for i in 0..n {
        for j in 0..n {
            if dm.distance(i, j) >= threshold {
                continue;
            }
            for py in 0..scale {
                for px in 0..scale {
                    img.put_pixel(j as u32 * scale + px, i as u32 * scale + py, Rgb(CONTACT_RGB));
                }
            }
        }
    }
    img
}

/// Write an EPS diagram to `path`.
pub fn save_eps(path: &Path, dm: &DistanceMatrix, threshold: f64) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_eps(&mut out, dm, threshold)?;
    out.flush()?;
    info!("Wrote postscript to file {:?}", path);
    Ok(())
}

/// Write the contact list to `path`.
pub fn save_contacts(path: &Path, dm: &DistanceMatrix, threshold: f64) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_contacts(&mut out, dm, threshold)?;
    out.flush()?;
    info!("Wrote contacts to file {:?}", path);
    Ok(())
}

/// Write an SVG or PNG image depending on the extension of `path`.
pub fn save_image(path: &Path, dm: &DistanceMatrix, threshold: f64, pixels_per_residue: u32) -> Result<()> {
    let is_svg = path
        .extension()
        .map(|ext| ext.to_ascii_lowercase() == "svg")
        .unwrap_or(false);

    if is_svg {
        info!("Rendering SVG...");
        std::fs::write(path, render_svg(dm, threshold))?;
    } else {
        info!("Rendering image...");
        render_png(dm, threshold, pixels_per_residue).save(path)?;
    }
    info!("Saved image to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdb::CoordinateTable;

    fn three_residues() -> DistanceMatrix {
        let mut table = CoordinateTable::new(vec![
            Some([0.0, 0.0, 0.0]),
            Some([1.0, 0.0, 0.0]),
            Some([10.0, 0.0, 0.0]),
        ]);
        table.source_filename = Some("toy.pdb".to_string());
        table.sequence = Some("GAV".to_string());
        DistanceMatrix::build(&table).unwrap()
    }

    #[test]
    fn test_contact_list_end_to_end() {
        let dm = three_residues();
        let mut buf = Vec::new();
        write_contacts(&mut buf, &dm, 2.0).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let body: Vec<&str> = text.lines().filter(|l| !l.starts_with('#')).collect();
        assert_eq!(body, vec!["1\t2"]);

        let header: Vec<&str> = text.lines().filter(|l| l.starts_with('#')).collect();
        assert!(header[0].starts_with("# contactlook v"));
        assert_eq!(header[1], "# source file: toy.pdb");
        assert_eq!(header[2], "# source chain: A");
        assert_eq!(header[3], "# sequence: GAV");
        assert_eq!(header[4], "# threshold: 2.000000");
    }

    #[test]
    fn test_contact_list_threshold_is_strict() {
        let dm = three_residues();
        let mut buf = Vec::new();
        write_contacts(&mut buf, &dm, 1.0).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().filter(|l| !l.starts_with('#')).count(), 0);
    }

    #[test]
    fn test_eps_draws_each_pair_once() {
        let dm = three_residues();
        let mut buf = Vec::new();
        write_eps(&mut buf, &dm, 20.0).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("%!PS-Adobe-3.0 EPSF-3.0\n"));
        assert!(text.contains("%%BoundingBox: 0 0 434 474"));
        assert!(text.contains("(File: toy.pdb) show"));
        assert!(text.contains("(Threshold: 20.00) show"));
        assert_eq!(text.lines().filter(|l| l.ends_with(" square")).count(), 3);
    }

    #[test]
    fn test_svg_draws_each_pair_once() {
        let dm = three_residues();
        let svg = render_svg(&dm, 2.0);
        assert!(svg.contains("File: toy.pdb"));
        assert_eq!(svg.matches(r#"fill="black""#).count(), 1);
        assert!(svg.ends_with("</svg>\n"));
    }

    #[test]
    fn test_png_is_symmetric() {
        let dm = three_residues();
        let img = render_png(&dm, 2.0, 2);
        assert_eq!(img.dimensions(), (6, 6));
        assert_eq!(img.get_pixel(2, 0), &Rgb(CONTACT_RGB));
        assert_eq!(img.get_pixel(0, 2), &Rgb(CONTACT_RGB));
        assert_eq!(img.get_pixel(4, 0), &Rgb(BACKGROUND_RGB));
        assert_eq!(img.get_pixel(5, 5), &Rgb(CONTACT_RGB));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape_ps("a(b)"), "a\\(b\\)");
        assert_eq!(escape_xml("<a&b>"), "&lt;a&amp;b&gt;");
    }
}
