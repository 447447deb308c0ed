//! Text content of the score sidebar shown left of the board.

use crate::grid::PlayerId;

/// Rows used per player: three lines of text and a spacer.
pub const ENTRY_HEIGHT: usize = 4;

/// One connected player's sidebar block, in rank order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarEntry {
    pub id: PlayerId,
    pub rank: u32,
    pub name: String,
    pub status: String,
    pub kills: u32,
    pub deaths: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SidebarLine {
    pub owner: Option<PlayerId>,
    pub text: Vec<char>,
}

#[derive(Debug, Clone)]
pub struct Sidebar {
    lines: Vec<SidebarLine>,
}

impl Sidebar {
    /// `rows` is the number of text rows between the sidebar's top and
    /// bottom rules.
    pub fn new(rows: usize) -> Self {
        Self {
            lines: vec![SidebarLine::default(); rows],
        }
    }

    pub fn rows(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, row: usize) -> Option<&SidebarLine> {
        self.lines.get(row)
    }

    /// Lays out `entries` and reports whether any line changed.
    pub fn update(&mut self, entries: &[SidebarEntry]) -> bool {
        let mut lines = vec![SidebarLine::default(); self.lines.len()];

        for (i, entry) in entries.iter().enumerate() {
            let row = i * ENTRY_HEIGHT;
            // skip entries that would run past the bottom
            if row + ENTRY_HEIGHT - 1 >= lines.len() {
                break;
            }
            let texts = [
                format!(" #{} {}", entry.rank, entry.name),
                format!("  {}", entry.status),
                format!("  {} K/D {}", entry.kills, entry.deaths),
            ];
            for (offset, text) in texts.into_iter().enumerate() {
                lines[row + offset] = SidebarLine {
                    owner: Some(entry.id),
                    text: text.chars().collect(),
                };
            }
        }

        let changed = lines != self.lines;
        self.lines = lines;
        changed
    }
}
