//! Wire protocol and input grammar shared by the light-cycle server and its
//! terminal client.
//!
//! Client→server traffic is a stream of length-prefixed frames, each carrying a
//! bincode-encoded [`Packet`]. Server→client traffic is raw terminal bytes and
//! needs no framing.

use serde::{Deserialize, Serialize};

/// Smallest board edge accepted by the server.
pub const MIN_BOARD_DIM: usize = 32;
/// Largest board edge accepted by the server.
pub const MAX_BOARD_DIM: usize = 255;
/// Terminal columns reserved on the left for the score sidebar.
pub const SIDEBAR_WIDTH: usize = 14;
/// Upper bound on a single control frame body.
pub const MAX_FRAME_LEN: usize = 4096;

pub const ESC: u8 = 0x1b;
pub const CARRIAGE_RETURN: u8 = 13;
pub const END_OF_TEXT: u8 = 3;

/// One of the four cardinal movement directions.
///
/// The discriminants are the final byte of the matching ANSI arrow-key escape
/// sequence, so `Up`/`Down` and `Right`/`Left` form odd/even pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Heading {
    Up = b'A',
    Down = b'B',
    Right = b'C',
    Left = b'D',
}

impl Heading {
    pub const ALL: [Heading; 4] = [Heading::Up, Heading::Down, Heading::Right, Heading::Left];

    pub fn from_code(code: u8) -> Option<Heading> {
        match code {
            b'A' => Some(Heading::Up),
            b'B' => Some(Heading::Down),
            b'C' => Some(Heading::Right),
            b'D' => Some(Heading::Left),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// The exact reverse of this heading.
    pub fn opposite(self) -> Heading {
        match self {
            Heading::Up => Heading::Down,
            Heading::Down => Heading::Up,
            Heading::Right => Heading::Left,
            Heading::Left => Heading::Right,
        }
    }

    /// Unit step on the board; y grows downwards.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Heading::Up => (0, -1),
            Heading::Down => (0, 1),
            Heading::Right => (1, 0),
            Heading::Left => (-1, 0),
        }
    }

    /// The 3-byte arrow-key escape sequence for this heading.
    pub fn escape_sequence(self) -> [u8; 3] {
        [ESC, b'[', self.code()]
    }
}

/// A recognised chunk of raw terminal input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Steer(Heading),
    Respawn,
    Quit,
}

/// Parses one read of raw terminal bytes.
///
/// ETX anywhere at the start wins over everything else. Arrow keys are only
/// recognised as a complete 3-byte read. Anything else yields `None`.
pub fn parse_action(bytes: &[u8]) -> Option<Action> {
    let first = *bytes.first()?;
    if first == END_OF_TEXT {
        return Some(Action::Quit);
    }
    if let [ESC, b'[', code] = bytes {
        if let Some(heading) = Heading::from_code(*code) {
            return Some(Action::Steer(heading));
        }
    }
    if first == CARRIAGE_RETURN {
        return Some(Action::Respawn);
    }
    None
}

/// Extracts `(cols, rows)` from a window-change payload of two big-endian
/// u32 values. A short payload reads as a zero-sized terminal.
pub fn parse_dims(payload: &[u8]) -> (u32, u32) {
    if payload.len() < 8 {
        return (0, 0);
    }
    let cols = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
    let rows = u32::from_be_bytes([payload[4], payload[5], payload[6], payload[7]]);
    (cols, rows)
}

/// Inverse of [`parse_dims`].
pub fn dims_payload(cols: u32, rows: u32) -> Vec<u8> {
    let mut payload = Vec::with_capacity(8);
    payload.extend_from_slice(&cols.to_be_bytes());
    payload.extend_from_slice(&rows.to_be_bytes());
    payload
}

/// Control frames sent from a terminal client to the server.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum Packet {
    /// Must be the first frame on a connection.
    Hello {
        identity: String,
        name: String,
        cols: u32,
        rows: u32,
    },
    /// Raw terminal input bytes, one read's worth.
    Input { bytes: Vec<u8> },
    /// Terminal resize, payload as produced by [`dims_payload`].
    WindowChange { payload: Vec<u8> },
    Disconnect,
}

/// Serializes a packet into a length-prefixed frame.
pub fn encode_frame(packet: &Packet) -> Result<Vec<u8>, bincode::Error> {
    let body = bincode::serialize(packet)?;
    let mut frame = Vec::with_capacity(body.len() + 4);
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Deserializes a frame body (without its length prefix).
pub fn decode_frame(body: &[u8]) -> Result<Packet, bincode::Error> {
    bincode::deserialize(body)
}
