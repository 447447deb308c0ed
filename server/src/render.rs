//! Per-viewer diff encoder.
//!
//! The board is drawn two cells per terminal row using half-block glyphs,
//! with the score sidebar occupying the leftmost [`SIDEBAR_WIDTH`] columns.
//! Each viewer keeps a [`Frame`] of the glyphs and colors last sent to it; a
//! render pass compares the current [`Scene`] against that frame and emits
//! only the cursor moves, color changes and glyphs needed to catch the
//! terminal up.

use crate::ansi;
use crate::grid::{Cell, Grid};
use crate::sidebar::Sidebar;
use crossterm::style::Color;
use shared::SIDEBAR_WIDTH;

pub const BLANK: char = ' ';
pub const UPPER_HALF: char = '▀';
pub const LOWER_HALF: char = '▄';
pub const FULL: char = '█';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Sidebar,
    Board,
}

/// What a single terminal cell should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub glyph: char,
    pub color: Color,
    /// Repaint even when the glyph matches the viewer's frame.
    pub forced: bool,
}

impl Tile {
    fn plain(glyph: char) -> Self {
        Tile {
            glyph,
            color: Color::White,
            forced: false,
        }
    }
}

fn cell_color(cell: Cell) -> Color {
    match cell {
        Cell::Owned(id) => ansi::player_color(id),
        Cell::Empty | Cell::Wall => Color::White,
    }
}

/// Read-only view of everything a viewer can see this tick.
pub struct Scene<'a> {
    grid: &'a Grid,
    sidebar: &'a Sidebar,
    sidebar_changed: bool,
}

impl<'a> Scene<'a> {
    /// `sidebar_changed` forces a repaint of all sidebar text, since colors
    /// can move between entries without any glyph changing.
    pub fn new(grid: &'a Grid, sidebar: &'a Sidebar, sidebar_changed: bool) -> Self {
        Self {
            grid,
            sidebar,
            sidebar_changed,
        }
    }

    /// Terminal columns covered by the scene.
    pub fn width(&self) -> usize {
        SIDEBAR_WIDTH + self.grid.width()
    }

    /// Terminal rows covered by the scene.
    pub fn height(&self) -> usize {
        self.grid.height() / 2
    }

    pub fn region(&self, col: usize) -> Region {
        if col < SIDEBAR_WIDTH {
            Region::Sidebar
        } else {
            Region::Board
        }
    }

    /// Maps a terminal cell of the scene to its glyph and color.
    pub fn tile(&self, col: usize, row: usize) -> Tile {
        match self.region(col) {
            Region::Sidebar => self.sidebar_tile(col, row),
            Region::Board => self.board_tile(col - SIDEBAR_WIDTH, row),
        }
    }

    fn sidebar_tile(&self, col: usize, row: usize) -> Tile {
        if col == 0 {
            return Tile::plain(FULL);
        }
        if row == 0 {
            return Tile::plain(UPPER_HALF);
        }
        if row + 1 == self.height() {
            return Tile::plain(LOWER_HALF);
        }
        let Some(line) = self.sidebar.line(row - 1) else {
            return Tile::plain(BLANK);
        };
        match (line.owner, line.text.get(col - 1)) {
            (Some(owner), Some(&glyph)) => Tile {
                glyph,
                color: ansi::player_color(owner),
                forced: self.sidebar_changed,
            },
            _ => Tile::plain(BLANK),
        }
    }

    fn board_tile(&self, x: usize, row: usize) -> Tile {
        let top = self.grid.get(x, row * 2).unwrap_or(Cell::Empty);
        let bottom = self.grid.get(x, row * 2 + 1).unwrap_or(Cell::Empty);

        let glyph = match (top.is_empty(), bottom.is_empty()) {
            (false, false) => FULL,
            (false, true) => UPPER_HALF,
            (true, false) => LOWER_HALF,
            (true, true) => BLANK,
        };
        // the bottom half draws in front
        let color = if bottom.is_empty() {
            cell_color(top)
        } else {
            cell_color(bottom)
        };
        Tile {
            glyph,
            color,
            forced: false,
        }
    }
}

/// The glyphs and colors a viewer's terminal is currently showing.
///
/// `None` marks a cell whose on-screen content is unknown; it is repainted on
/// the next pass whatever the scene holds.
#[derive(Debug, Clone)]
pub struct Frame {
    width: usize,
    height: usize,
    shown: Vec<Option<(char, Color)>>,
}

impl Frame {
    /// A frame matching a freshly cleared terminal.
    pub fn blank(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            shown: vec![Some((BLANK, Color::White)); width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Forgets what the terminal shows so the next pass repaints everything.
    pub fn invalidate(&mut self) {
        self.shown.iter_mut().for_each(|g| *g = None);
    }

    /// Encodes the changes needed to bring the terminal in line with
    /// `scene`, drawn with its top-left corner at terminal `origin`
    /// (zero-based column, row). Returns an empty buffer if nothing changed.
    pub fn diff(&mut self, scene: &Scene<'_>, origin: (usize, usize)) -> Vec<u8> {
        let width = self.width.min(scene.width());
        let height = self.height.min(scene.height());

        let mut out = Vec::new();
        let mut cursor: Option<(usize, usize)> = None;
        let mut last_color: Option<Color> = None;

        for row in 0..height {
            for col in 0..width {
                let tile = scene.tile(col, row);
                let slot = &mut self.shown[row * self.width + col];
                if *slot == Some((tile.glyph, tile.color)) && !tile.forced {
                    continue;
                }

                let at = (origin.0 + col, origin.1 + row);
                if cursor != Some(at) {
                    ansi::goto(&mut out, at.0, at.1);
                }
                if last_color != Some(tile.color) {
                    ansi::set_color(&mut out, tile.color);
                    last_color = Some(tile.color);
                }
                let mut utf8 = [0u8; 4];
                out.extend_from_slice(tile.glyph.encode_utf8(&mut utf8).as_bytes());

                // printing advances the cursor one column
                cursor = Some((at.0 + 1, at.1));
                *slot = Some((tile.glyph, tile.color));
            }
        }
        out
    }
}
