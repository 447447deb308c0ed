//! Keyboard and resize events translated into the frames the server expects

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use shared::{dims_payload, Heading, Packet, CARRIAGE_RETURN, END_OF_TEXT};

fn raw(bytes: Vec<u8>) -> Packet {
    Packet::Input { bytes }
}

fn steer(heading: Heading) -> Packet {
    raw(heading.escape_sequence().to_vec())
}

fn translate_key(key: &KeyEvent) -> Option<Packet> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('d') => Some(raw(vec![END_OF_TEXT])),
            _ => None,
        };
    }

    // Arrow keys, WASD and vi keys all steer
    match key.code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('k') => Some(steer(Heading::Up)),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('j') => Some(steer(Heading::Down)),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('l') => Some(steer(Heading::Right)),
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('h') => Some(steer(Heading::Left)),
        KeyCode::Enter | KeyCode::Char(' ') => Some(raw(vec![CARRIAGE_RETURN])),
        KeyCode::Char('q') | KeyCode::Esc => Some(raw(vec![END_OF_TEXT])),
        _ => None,
    }
}

/// Maps one terminal event to a frame for the server, if it means anything
/// to the game.
pub fn translate(event: &Event) -> Option<Packet> {
    match event {
        Event::Key(key) => translate_key(key),
        Event::Resize(cols, rows) => Some(Packet::WindowChange {
            payload: dims_payload(*cols as u32, *rows as u32),
        }),
        _ => None,
    }
}
