//! Per-connection player entity and its readiness state machine.

use crate::ansi;
use crate::grid::PlayerId;
use crate::render::{Frame, Scene};
use shared::{Heading, SIDEBAR_WIDTH};
use std::time::{Duration, Instant};

/// Where a connection stands before it can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Joined, no terminal size seen yet.
    Connecting,
    /// Terminal too small for the board.
    AwaitingFit,
    /// Terminal fits and frames are being sent.
    Ready,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    /// Stable external identity used for persistence and duplicate checks.
    pub identity: String,
    pub name: String,
    pub x: usize,
    pub y: usize,
    pub heading: Heading,
    /// Applied at the next tick boundary.
    pub next_heading: Heading,
    pub cols: usize,
    pub rows: usize,
    pub readiness: Readiness,
    pub alive: bool,
    /// Dead and waiting for the trail to be cleared.
    pub waiting_respawn: bool,
    pub died_at: Option<Instant>,
    pub kills: u32,
    pub deaths: u32,
    pub session_deaths: u32,
    pub rank: u32,
    frame: Option<Frame>,
}

impl Player {
    pub fn new(id: PlayerId, identity: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            identity: identity.into(),
            name: name.into(),
            x: 0,
            y: 0,
            heading: Heading::Up,
            next_heading: Heading::Up,
            cols: 0,
            rows: 0,
            readiness: Readiness::Connecting,
            alive: false,
            waiting_respawn: false,
            died_at: None,
            kills: 0,
            deaths: 0,
            session_deaths: 0,
            rank: 0,
            frame: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.readiness == Readiness::Ready
    }

    /// Buffers a heading change for the next tick.
    ///
    /// Ignored unless the terminal is ready, and never accepts the exact
    /// reverse of the heading currently being travelled.
    pub fn steer(&mut self, heading: Heading) -> bool {
        if !self.is_ready() || heading == self.heading.opposite() {
            return false;
        }
        self.next_heading = heading;
        true
    }

    pub fn can_respawn(&self) -> bool {
        !self.alive && self.is_ready() && !self.waiting_respawn
    }

    /// Applies a terminal resize against the size the game needs and returns
    /// the bytes to send to the terminal.
    pub fn resize(&mut self, cols: usize, rows: usize, need_cols: usize, need_rows: usize) -> Vec<u8> {
        self.cols = cols;
        self.rows = rows;
        if cols >= need_cols && rows >= need_rows {
            self.frame = Some(Frame::blank(need_cols, need_rows));
            self.readiness = Readiness::Ready;
            ansi::erase_screen()
        } else {
            self.frame = None;
            self.readiness = Readiness::AwaitingFit;
            ansi::resize_prompt(need_cols, need_rows, cols, rows)
        }
    }

    /// Forces a full repaint on the next render.
    pub fn invalidate_frame(&mut self) {
        if let Some(frame) = self.frame.as_mut() {
            frame.invalidate();
        }
    }

    /// Diffs the scene against this player's last frame, centred in their
    /// terminal. Empty when not ready or nothing changed.
    pub fn render(&mut self, scene: &Scene<'_>) -> Vec<u8> {
        if !self.is_ready() {
            return Vec::new();
        }
        let (cols, rows) = (self.cols, self.rows);
        let Some(frame) = self.frame.as_mut() else {
            return Vec::new();
        };
        let origin = (
            cols.saturating_sub(frame.width()) / 2,
            rows.saturating_sub(frame.height()) / 2,
        );
        frame.diff(scene, origin)
    }

    /// Time left before the trail is cleared and respawn is allowed.
    pub fn respawn_remaining(&self, now: Instant, delay: Duration) -> Duration {
        match self.died_at {
            Some(died_at) if self.waiting_respawn => {
                delay.saturating_sub(now.saturating_duration_since(died_at))
            }
            _ => Duration::ZERO,
        }
    }

    /// Short status line for the sidebar.
    pub fn status(&self, now: Instant, delay: Duration) -> String {
        if !self.is_ready() {
            "not ready".to_string()
        } else if !self.alive && self.waiting_respawn {
            format!("dead {:.1}", self.respawn_remaining(now, delay).as_secs_f32())
        } else if !self.alive {
            "ready".to_string()
        } else {
            "playing".to_string()
        }
    }
}

/// Strips everything but ASCII letters, digits and `_` from a requested
/// display name and trims it to fit the sidebar.
pub fn sanitize_name(raw: &str, id: PlayerId) -> String {
    let max_len = SIDEBAR_WIDTH - 6;
    let name: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .take(max_len)
        .collect();
    if name.is_empty() {
        format!("player-{}", id)
    } else {
        name
    }
}
