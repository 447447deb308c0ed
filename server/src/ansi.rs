//! Terminal control sequences, rendered into byte buffers destined for a
//! remote session rather than the local tty.

use crate::grid::PlayerId;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::{Color, ResetColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use crossterm::Command;
use log::error;

const PALETTE: [Color; 6] = [
    Color::Blue,
    Color::Green,
    Color::Magenta,
    Color::Cyan,
    Color::Yellow,
    Color::Red,
];

/// Appends the ANSI form of `command` to `buf`.
pub fn push(buf: &mut Vec<u8>, command: impl Command) {
    let mut ansi = String::new();
    match command.write_ansi(&mut ansi) {
        Ok(()) => buf.extend_from_slice(ansi.as_bytes()),
        Err(e) => error!("Failed to encode terminal command: {}", e),
    }
}

/// Moves the cursor to a zero-based column/row.
pub fn goto(buf: &mut Vec<u8>, col: usize, row: usize) {
    push(buf, MoveTo(clamp_u16(col), clamp_u16(row)));
}

pub fn set_color(buf: &mut Vec<u8>, color: Color) {
    push(buf, SetForegroundColor(color));
}

fn clamp_u16(v: usize) -> u16 {
    v.min(u16::MAX as usize) as u16
}

/// Foreground color for a player's trail and sidebar entry.
pub fn player_color(id: PlayerId) -> Color {
    match id {
        0 => Color::White,
        id => PALETTE[(id as usize - 1) % PALETTE.len()],
    }
}

pub fn erase_screen() -> Vec<u8> {
    let mut buf = Vec::new();
    push(&mut buf, Clear(ClearType::All));
    buf
}

/// Sent once when a session joins the game.
pub fn greeting() -> Vec<u8> {
    let mut buf = Vec::new();
    push(&mut buf, ResetColor);
    push(&mut buf, Hide);
    buf
}

/// Restores the remote terminal before the connection is closed.
pub fn teardown() -> Vec<u8> {
    let mut buf = Vec::new();
    push(&mut buf, Show);
    push(&mut buf, Clear(ClearType::All));
    goto(&mut buf, 0, 0);
    push(&mut buf, ResetColor);
    buf
}

/// Clears the screen and asks for a larger terminal.
pub fn resize_prompt(need_cols: usize, need_rows: usize, cols: usize, rows: usize) -> Vec<u8> {
    let mut buf = erase_screen();
    goto(&mut buf, 4, 1);
    set_color(&mut buf, Color::White);
    buf.extend_from_slice(
        format!(
            "Please resize your terminal to {}x{} (+{}x+{})",
            need_cols,
            need_rows,
            need_cols.saturating_sub(cols),
            need_rows.saturating_sub(rows)
        )
        .as_bytes(),
    );
    buf
}
