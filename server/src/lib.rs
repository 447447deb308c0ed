//! # Light-Cycle Game Server Library
//!
//! The authoritative server for a multi-player terminal light-cycle game.
//! Every connected player steers a cursor that leaves a permanent trail on a
//! shared board; running into a wall or any trail ends that life, and the
//! owner of the trail gets the kill.
//!
//! ## Architecture
//!
//! ### Single Writer
//! One game task owns the whole [`game::GameState`]: the grid, every player
//! and the scoreboard. Connection tasks never touch it. They decode client
//! frames and forward joins, inputs and departures to the game task over a
//! channel, so all mutation happens in one place and in a fixed order.
//!
//! ### Tick, then Render
//! On a fixed interval the game task applies due trail cleanups, moves every
//! live player one cell in ascending id order, and rebuilds the ranking.
//! Only after the board has settled does it diff a frame for each ready
//! player and queue the bytes on that player's session.
//!
//! ### Non-Blocking Output
//! Each session owns a bounded outbound queue drained by its own writer
//! task. The game task never waits on a socket: a full queue drops that frame
//! and marks the player's view as unknown so the next frame repaints it.
//!
//! ## Module Organization
//!
//! - `config`, `error`: settings, validation and the error taxonomy
//! - `grid`, `id_pool`, `player`: the board, slot ids and per-player state
//! - `game`: the simulation loop
//! - `scoreboard`, `sidebar`, `notify`: ranking, its on-screen form, and
//!   leader announcements
//! - `render`, `ansi`: the per-viewer diff encoder and terminal commands
//! - `store`: score persistence
//! - `session`, `network`: TCP transport and the server loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::GameConfig;
//! use server::network::Server;
//! use server::store::MemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::new(
//!         "127.0.0.1:2200",
//!         GameConfig::default(),
//!         Arc::new(MemoryStore::new()),
//!         None,
//!     )
//!     .await?;
//!
//!     // Runs until Ctrl+C, then restores every client's terminal
//!     server
//!         .run(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod ansi;
pub mod config;
pub mod error;
pub mod game;
pub mod grid;
pub mod id_pool;
pub mod network;
pub mod notify;
pub mod player;
pub mod render;
pub mod scoreboard;
pub mod session;
pub mod sidebar;
pub mod store;
