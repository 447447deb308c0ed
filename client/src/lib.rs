//! # Light-Cycle Terminal Client
//!
//! A thin terminal front-end for the light-cycle server. The server does all
//! of the drawing: it sends ready-made terminal bytes that the client writes
//! straight to stdout. The client's only jobs are to put the local terminal
//! in raw mode, turn key presses and window resizes into protocol frames,
//! and restore the terminal afterwards.
//!
//! ## Module Organization
//!
//! ### Input Module (`input`)
//! Maps crossterm events to frames:
//! - Arrow keys, WASD and hjkl steer
//! - Enter or Space asks to respawn
//! - `q`, Esc or Ctrl+C quits
//! - Window resizes are forwarded so the server can re-centre the board
//!
//! ### Network Module (`network`)
//! Owns the TCP connection, the raw-mode guard and the relay loop between
//! the socket, the keyboard and stdout.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::connect("127.0.0.1:2200", "alice@example", "alice").await?;
//!     client.run().await
//! }
//! ```

pub mod input;
pub mod network;
