//! Interactive terminal viewer.
//!
//! Single-threaded: block on the next terminal event, apply it, redraw.
//! Only threshold changes re-render the raster; a resize just reflows the
//! viewport.

use crate::distmat::{DistanceMatrix, PairDistance};
use crate::error::Result;
use crate::keys::{Command, KeyMap};
use crate::raster::{is_light_cell, ContactRaster};
use crate::viewport::{Viewport, PAN_STEP_X, PAN_STEP_Y};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, DisableLineWrap, EnableLineWrap, EndSynchronizedUpdate,
        EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Stdout, Write};
use std::panic::PanicHookInfo;
use std::sync::Arc;

/// Threshold change per `+`/`-` key press.
pub const THRESHOLD_STEP: f64 = 0.5;

/// Foreground/background pair for one kind of screen cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellStyle {
    pub fg: Color,
    pub bg: Color,
}

/// Colours of the viewer. `None` leaves the terminal's defaults.
#[derive(Debug, Clone)]
pub struct Palette {
    pub background: Option<CellStyle>,
    pub status: Option<CellStyle>,
    pub light: Option<CellStyle>,
    pub dark: Option<CellStyle>,
    pub ruler: Option<CellStyle>,
}

impl Palette {
    pub fn new(color: bool) -> Self {
        if color {
            Self::colored()
        } else {
            Self::plain()
        }
    }

    pub fn colored() -> Self {
        let grey = Color::Rgb { r: 64, g: 64, b: 64 };
        let sun_flower = Color::Rgb { r: 241, g: 196, b: 15 };
        let wet_asphalt = Color::Rgb { r: 52, g: 73, b: 94 };
        let midnight_blue = Color::Rgb { r: 44, g: 62, b: 80 };
        Palette {
            background: Some(CellStyle { fg: Color::White, bg: grey }),
            status: Some(CellStyle { fg: sun_flower, bg: grey }),
            light: Some(CellStyle { fg: Color::White, bg: wet_asphalt }),
            dark: Some(CellStyle { fg: Color::White, bg: midnight_blue }),
            ruler: Some(CellStyle { fg: Color::White, bg: grey }),
        }
    }

    pub fn plain() -> Self {
        Palette {
            background: None,
            status: None,
            light: None,
            dark: None,
            ruler: None,
        }
    }
}

type PanicHook = dyn Fn(&PanicHookInfo<'_>) + Send + Sync + 'static;

/// Runs `teardown` before the current panic hook until dropped, then puts
/// the previous hook back.
struct PanicTeardown {
    previous: Arc<Box<PanicHook>>,
}

impl PanicTeardown {
    fn install(teardown: fn()) -> Self {
        let previous: Arc<Box<PanicHook>> = Arc::new(std::panic::take_hook());
        let chained = Arc::clone(&previous);
        std::panic::set_hook(Box::new(move |info| {
            teardown();
            (**chained)(info);
        }));
        PanicTeardown { previous }
    }
}

impl Drop for PanicTeardown {
    fn drop(&mut self) {
        // The hook can't be swapped while unwinding
        if std::thread::panicking() {
            return;
        }
        let _ = std::panic::take_hook();
        let previous = Arc::clone(&self.previous);
        std::panic::set_hook(Box::new(move |info| (**previous)(info)));
    }
}

/// Restores the terminal when dropped, on every exit path.
struct TermGuard {
    out: Stdout,
    _panic: PanicTeardown,
}

impl TermGuard {
    fn new() -> io::Result<Self> {
        let panic = PanicTeardown::install(restore_terminal);

        let mut out = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(
            out,
            EnterAlternateScreen,
            DisableLineWrap,
            cursor::Hide,
            cursor::MoveTo(0, 0)
        )?;
        Ok(Self { out, _panic: panic })
    }
}

fn restore_terminal() {
    let _ = execute!(
        io::stdout(),
        EndSynchronizedUpdate,
        ResetColor,
        cursor::Show,
        EnableLineWrap,
        LeaveAlternateScreen
    );
    let _ = terminal::disable_raw_mode();
}

impl Drop for TermGuard {
    fn drop(&mut self) {
        let _ = self.out.flush();
        restore_terminal();
    }
}

/// Everything the viewer owns between two events.
pub struct Session<'a> {
    dm: &'a DistanceMatrix,
    raster: ContactRaster,
    viewport: Viewport,
    keys: KeyMap,
    threshold: f64,
    palette: Palette,
}

impl<'a> Session<'a> {
    pub fn new(
        dm: &'a DistanceMatrix,
        threshold: f64,
        palette: Palette,
        term_rows: usize,
        term_cols: usize,
    ) -> Result<Self> {
        let threshold = threshold.max(0.0);
        let raster = ContactRaster::render(dm, threshold)?;
        let viewport = Viewport::new(raster.rows(), raster.cols(), term_rows, term_cols);
        Ok(Session {
            dm,
            raster,
            viewport,
            keys: KeyMap::new(),
            threshold,
            palette,
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn raster(&self) -> &ContactRaster {
        &self.raster
    }

    /// Re-render the raster at a new threshold (floored at 0). Pan offsets
    /// are kept.
    fn set_threshold(&mut self, threshold: f64) -> Result<()> {
        self.threshold = threshold.max(0.0);
        self.raster = ContactRaster::render(self.dm, self.threshold)?;
        self.viewport
            .on_threshold_change(self.raster.rows(), self.raster.cols());
        Ok(())
    }

    /// Apply one command. Returns `false` once the session should end.
    pub fn apply(&mut self, cmd: Command) -> Result<bool> {
        match cmd {
            Command::Quit => return Ok(false),
            Command::PanLeft => self.viewport.pan(-PAN_STEP_X, 0),
            Command::PanRight => self.viewport.pan(PAN_STEP_X, 0),
            Command::PanUp => self.viewport.pan(0, -PAN_STEP_Y),
            Command::PanDown => self.viewport.pan(0, PAN_STEP_Y),
            Command::JumpStartX => self.viewport.jump_start_x(),
            Command::JumpEndX => self.viewport.jump_end_x(),
            Command::JumpStartY => self.viewport.jump_start_y(),
            Command::JumpEndY => self.viewport.jump_end_y(),
            Command::RaiseThreshold => self.set_threshold(self.threshold + THRESHOLD_STEP)?,
            Command::LowerThreshold => self.set_threshold(self.threshold - THRESHOLD_STEP)?,
        }
        Ok(true)
    }

    /// Feed one key press through the key map.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        match self.keys.feed(code) {
            Some(cmd) => self.apply(cmd),
            None => Ok(true),
        }
    }

    /// Reflow for a new terminal size. A resize also cancels a pending `g`.
    pub fn resize(&mut self, term_rows: usize, term_cols: usize) {
        self.keys.reset();
        self.viewport.reflow(term_rows, term_cols);
    }

    /// Status strip segments; the flag marks reversed text.
    fn status_segments(&self) -> Vec<(bool, String)> {
        vec![
            (false, "━".to_string()),
            (true, format!(" {} ", self.dm.source_filename().unwrap_or("-"))),
            (false, "━".to_string()),
            (true, format!(" Chain: {} ", self.dm.source_chain())),
            (false, "━".to_string()),
            (true, format!(" Residues: {} ", self.dm.len())),
            (false, "━".to_string()),
            (true, format!(" Threshold: {:2.2} ", self.threshold)),
        ]
    }

    fn draw_status<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let width = self.viewport.term_cols();
        let mut used = 0usize;
        queue!(out, cursor::MoveTo(0, 0))?;
        set_style(out, self.palette.status)?;
        for (reverse, text) in self.status_segments() {
            let room = width - used;
            if room == 0 {
                break;
            }
            let clipped: String = text.chars().take(room).collect();
            used += clipped.chars().count();
            if reverse {
                queue!(out, SetAttribute(Attribute::Reverse), Print(clipped), SetAttribute(Attribute::NoReverse))?;
            } else {
                queue!(out, Print(clipped))?;
            }
        }
        if used < width {
            queue!(out, Print("━".repeat(width - used)))?;
        }
        Ok(())
    }

    /// Styled characters of screen row `row` (below the status strip).
    fn screen_row(&self, row: usize) -> Vec<(Option<CellStyle>, char)> {
        let width = self.viewport.term_cols();
        let mut cells = Vec::with_capacity(width);
        if row == 1 {
            cells.push((self.palette.background, ' '));
            for ch in self.viewport.visible_hruler().chars() {
                cells.push((self.palette.ruler, ch));
            }
        } else {
            match self.viewport.vruler_at(row) {
                Some(ch) => cells.push((self.palette.ruler, ch)),
                None => cells.push((self.palette.background, ' ')),
            }
            for col in 1..width {
                match self.viewport.cell_at(row, col) {
                    Some((r, c)) => {
                        let style = if is_light_cell(r, c) {
                            self.palette.light
                        } else {
                            self.palette.dark
                        };
                        cells.push((style, self.raster.glyph(r, c)));
                    }
                    None => break,
                }
            }
        }
        cells.truncate(width);
        while cells.len() < width {
            cells.push((self.palette.background, ' '));
        }
        cells
    }

    /// Redraw the whole screen.
    pub fn draw<W: Write>(&self, out: &mut W) -> io::Result<()> {
        queue!(out, BeginSynchronizedUpdate)?;
        if self.viewport.term_rows() > 0 && self.viewport.term_cols() > 0 {
            self.draw_status(out)?;
            for row in 1..self.viewport.term_rows() {
                queue!(out, cursor::MoveTo(0, row as u16))?;
                let cells = self.screen_row(row);
                let mut start = 0;
                while start < cells.len() {
                    let style = cells[start].0;
                    let end = cells[start..]
                        .iter()
                        .position(|c| c.0 != style)
                        .map_or(cells.len(), |p| start + p);
                    let text: String = cells[start..end].iter().map(|c| c.1).collect();
                    set_style(out, style)?;
                    queue!(out, Print(text))?;
                    start = end;
                }
            }
        }
        queue!(out, ResetColor, EndSynchronizedUpdate)?;
        out.flush()
    }
}

fn set_style<W: Write>(out: &mut W, style: Option<CellStyle>) -> io::Result<()> {
    match style {
        Some(s) => queue!(out, SetForegroundColor(s.fg), SetBackgroundColor(s.bg)),
        None => queue!(out, ResetColor),
    }
}

/// Run the viewer until the user quits. Returns the final threshold.
pub fn run(dm: &DistanceMatrix, threshold: f64, palette: Palette) -> Result<f64> {
    let mut guard = TermGuard::new()?;
    let (cols, rows) = terminal::size()?;
    let mut session = Session::new(dm, threshold, palette, rows as usize, cols as usize)?;
    session.draw(&mut guard.out)?;

    loop {
        match event::read()? {
            Event::Key(k) if k.kind == KeyEventKind::Press => {
                if k.code == KeyCode::Char('c') && k.modifiers.contains(KeyModifiers::CONTROL) {
                    break;
                }
                if !session.handle_key(k.code)? {
                    break;
                }
            }
            Event::Resize(cols, rows) => session.resize(rows as usize, cols as usize),
            _ => continue,
        }
        session.draw(&mut guard.out)?;
    }

    Ok(session.threshold())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdb::CoordinateTable;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn matrix(n: usize) -> DistanceMatrix {
        let coords = (0..n).map(|k| Some([k as f64 * 3.8, 0.0, 0.0])).collect();
        DistanceMatrix::build(&CoordinateTable::new(coords)).unwrap()
    }

    #[test]
    fn test_threshold_floor_and_rerender() {
        let dm = matrix(40);
        let mut session = Session::new(&dm, 0.5, Palette::plain(), 24, 80).unwrap();
        let before = session.raster().dot_count();
        session.apply(Command::LowerThreshold).unwrap();
        session.apply(Command::LowerThreshold).unwrap();
        assert_eq!(session.threshold(), 0.0);
        for _ in 0..16 {
            session.apply(Command::RaiseThreshold).unwrap();
        }
        assert_eq!(session.threshold(), 8.0);
        assert!(session.raster().dot_count() > before);
    }

    #[test]
    fn test_threshold_change_keeps_pan() {
        let dm = matrix(600);
        let mut session = Session::new(&dm, 8.0, Palette::plain(), 24, 80).unwrap();
        session.apply(Command::PanRight).unwrap();
        session.apply(Command::PanDown).unwrap();
        session.apply(Command::RaiseThreshold).unwrap();
        assert_eq!(session.viewport().x_offset(), 10);
        assert_eq!(session.viewport().y_offset(), 5);
    }

    #[test]
    fn test_keys_drive_viewport() {
        let dm = matrix(600);
        let mut session = Session::new(&dm, 8.0, Palette::plain(), 24, 80).unwrap();
        assert!(session.handle_key(KeyCode::Char('G')).unwrap());
        assert_eq!(session.viewport().y_offset(), 150 - 24 + 2);
        session.handle_key(KeyCode::Char('g')).unwrap();
        session.handle_key(KeyCode::Char('g')).unwrap();
        assert_eq!(session.viewport().y_offset(), 0);
        assert!(session.handle_key(KeyCode::Char('$')).unwrap());
        assert_eq!(session.viewport().x_offset(), 300 - 80 + 1);
        assert!(!session.handle_key(KeyCode::Char('q')).unwrap());
    }

    #[test]
    fn test_resize_only_reflows() {
        let dm = matrix(600);
        let mut session = Session::new(&dm, 8.0, Palette::plain(), 24, 80).unwrap();
        session.apply(Command::JumpEndX).unwrap();
        let raster = session.raster().clone();
        session.resize(40, 200);
        assert_eq!(session.viewport().x_offset(), 300 - 200 + 1);
        assert_eq!(session.raster(), &raster);
    }

    #[test]
    fn test_resize_cancels_pending_chord() {
        let dm = matrix(600);
        let mut session = Session::new(&dm, 8.0, Palette::plain(), 24, 80).unwrap();
        session.handle_key(KeyCode::Char('G')).unwrap();
        session.handle_key(KeyCode::Char('g')).unwrap();
        session.resize(24, 80);
        session.handle_key(KeyCode::Char('g')).unwrap();
        assert_eq!(session.viewport().y_offset(), 128);
        session.handle_key(KeyCode::Char('g')).unwrap();
        assert_eq!(session.viewport().y_offset(), 0);
    }

    static TEARDOWNS: AtomicUsize = AtomicUsize::new(0);
    static HOOK_CALLS: AtomicUsize = AtomicUsize::new(0);

    fn count_teardown() {
        TEARDOWNS.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_panic_teardown_restores_previous_hook() {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(|_| {
            HOOK_CALLS.fetch_add(1, Ordering::SeqCst);
        }));

        let guard = PanicTeardown::install(count_teardown);
        assert!(std::panic::catch_unwind(|| panic!("inside")).is_err());
        drop(guard);
        assert!(std::panic::catch_unwind(|| panic!("after")).is_err());

        std::panic::set_hook(original);
        assert_eq!(TEARDOWNS.load(Ordering::SeqCst), 1);
        assert_eq!(HOOK_CALLS.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_draw_contains_status_and_glyphs() {
        let dm = matrix(12);
        let session = Session::new(&dm, 4.0, Palette::colored(), 10, 80).unwrap();
        let mut buf = Vec::new();
        session.draw(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains(" Residues: 12 "));
        assert!(text.contains(" Threshold: 4.00 "));
        assert!(text.contains(session.raster().glyph(0, 0)));
    }

    #[test]
    fn test_screen_row_width() {
        let dm = matrix(12);
        let session = Session::new(&dm, 4.0, Palette::plain(), 10, 40).unwrap();
        for row in 1..10 {
            assert_eq!(session.screen_row(row).len(), 40);
        }
        assert_eq!(session.screen_row(2)[0].1, '1');
    }
}
