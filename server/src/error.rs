use crate::config::ConfigError;
use thiserror::Error;

/// Errors surfaced by the game server.
///
/// Only `Config` and `Transport` on bind are fatal; everything else is
/// contained to the session it arose on.
#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("the game is full")]
    CapacityExceeded,
    #[error("identity {0} already has an active session")]
    DuplicateSession(String),
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error("transport failure: {0}")]
    Transport(#[from] std::io::Error),
    #[error("codec failure: {0}")]
    Codec(#[from] bincode::Error),
}
