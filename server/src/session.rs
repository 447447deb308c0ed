//! Per-connection plumbing: the lifecycle guard, the outbound byte queue, the
//! writer task and inbound frame decoding.

use crate::ansi;
use crate::error::GameError;
use log::debug;
use shared::{decode_frame, parse_action, parse_dims, Action, Heading, Packet, MAX_FRAME_LEN};
use std::io;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;

/// Frames that may wait for a slow client before new ones are dropped.
pub const OUTBOUND_CAPACITY: usize = 64;

/// Longest a single write may wait on a client that has stopped reading.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    Active = 0,
    Closing = 1,
    Closed = 2,
}

/// Tri-state close guard shared by every handle of one connection.
#[derive(Debug)]
pub struct Lifecycle(AtomicU8);

impl Lifecycle {
    pub fn new() -> Self {
        Self(AtomicU8::new(LifecycleState::Active as u8))
    }

    pub fn state(&self) -> LifecycleState {
        match self.0.load(Ordering::Acquire) {
            0 => LifecycleState::Active,
            1 => LifecycleState::Closing,
            _ => LifecycleState::Closed,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == LifecycleState::Active
    }

    /// Moves `Active -> Closing`. Only the first caller gets `true`.
    pub fn begin_close(&self) -> bool {
        self.0
            .compare_exchange(
                LifecycleState::Active as u8,
                LifecycleState::Closing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub fn finish_close(&self) {
        self.0.store(LifecycleState::Closed as u8, Ordering::Release);
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// What the writer sends before hanging up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Restore the terminal.
    Teardown,
    /// A plain message for a session that never joined.
    Reject(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushError {
    /// The client is not keeping up; this frame was dropped.
    Full,
    Closed,
}

/// Handle the game task holds for one connection.
#[derive(Debug, Clone)]
pub struct Session {
    serial: u64,
    lifecycle: Arc<Lifecycle>,
    outbound: mpsc::Sender<Vec<u8>>,
    shutdown: Arc<watch::Sender<Option<CloseReason>>>,
}

/// The writer task's half of a session.
#[derive(Debug)]
pub struct SessionIo {
    pub outbound: mpsc::Receiver<Vec<u8>>,
    pub shutdown: watch::Receiver<Option<CloseReason>>,
    pub lifecycle: Arc<Lifecycle>,
}

impl Session {
    /// `serial` is unique per connection for the process lifetime, so
    /// messages from a departed connection can't be mistaken for a later
    /// holder of the same player id.
    pub fn new(serial: u64) -> (Session, SessionIo) {
        let lifecycle = Arc::new(Lifecycle::new());
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(None);
        let session = Session {
            serial,
            lifecycle: Arc::clone(&lifecycle),
            outbound: outbound_tx,
            shutdown: Arc::new(shutdown_tx),
        };
        let io = SessionIo {
            outbound: outbound_rx,
            shutdown: shutdown_rx,
            lifecycle,
        };
        (session, io)
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Queues bytes without waiting.
    pub fn push(&self, bytes: Vec<u8>) -> Result<(), PushError> {
        if !self.lifecycle.is_active() {
            return Err(PushError::Closed);
        }
        match self.outbound.try_send(bytes) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(PushError::Full),
            Err(TrySendError::Closed(_)) => Err(PushError::Closed),
        }
    }

    /// Restores the client's terminal and closes the connection. Safe to call
    /// any number of times; returns `true` only for the call that closed it.
    pub fn close(&self) -> bool {
        self.close_with(CloseReason::Teardown)
    }

    /// Sends `message` and closes.
    pub fn reject(&self, message: &str) -> bool {
        self.close_with(CloseReason::Reject(message.as_bytes().to_vec()))
    }

    fn close_with(&self, reason: CloseReason) -> bool {
        if !self.lifecycle.begin_close() {
            return false;
        }
        self.shutdown.send_replace(Some(reason));
        true
    }

    /// Resolves once the session starts closing.
    pub fn shutdown_signal(&self) -> watch::Receiver<Option<CloseReason>> {
        self.shutdown.subscribe()
    }
}

/// Drains queued bytes into `writer` until the session closes, then sends the
/// farewell bytes and shuts the stream down.
pub async fn run_writer<W>(mut writer: W, mut io: SessionIo) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let result = write_loop(&mut writer, &mut io).await;
    io.lifecycle.begin_close();
    if let Err(e) = bounded(writer.shutdown()).await {
        debug!("Stream shutdown failed: {}", e);
    }
    io.lifecycle.finish_close();
    result
}

/// Fails with `TimedOut` instead of waiting on a stalled peer indefinitely.
async fn bounded<F>(io: F) -> io::Result<()>
where
    F: std::future::Future<Output = io::Result<()>>,
{
    match timeout(WRITE_TIMEOUT, io).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            "client stopped reading",
        )),
    }
}

async fn write_loop<W>(writer: &mut W, io: &mut SessionIo) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            biased;

            bytes = io.outbound.recv() => match bytes {
                Some(bytes) => bounded(writer.write_all(&bytes)).await?,
                None => return Ok(()),
            },

            changed = io.shutdown.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let reason = io.shutdown.borrow_and_update().clone();
                let Some(reason) = reason else {
                    continue;
                };
                while let Ok(bytes) = io.outbound.try_recv() {
                    bounded(writer.write_all(&bytes)).await?;
                }
                let farewell = match reason {
                    CloseReason::Teardown => ansi::teardown(),
                    CloseReason::Reject(message) => message,
                };
                bounded(writer.write_all(&farewell)).await?;
                bounded(writer.flush()).await?;
                return Ok(());
            }
        }
    }
}

/// Reads one length-prefixed frame. `Ok(None)` on a clean end of stream.
pub async fn read_packet<R>(reader: &mut R) -> Result<Option<Packet>, GameError>
where
    R: AsyncRead + Unpin,
{
    let len = match reader.read_u32().await {
        Ok(len) => len as usize,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if len > MAX_FRAME_LEN {
        return Err(GameError::MalformedInput(format!(
            "frame of {} bytes exceeds {}",
            len, MAX_FRAME_LEN
        )));
    }
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(decode_frame(&body)?))
}

/// The opening frame of a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hello {
    pub identity: String,
    pub name: String,
    pub cols: usize,
    pub rows: usize,
}

pub async fn read_hello<R>(reader: &mut R) -> Result<Hello, GameError>
where
    R: AsyncRead + Unpin,
{
    match read_packet(reader).await? {
        Some(Packet::Hello {
            identity,
            name,
            cols,
            rows,
        }) => {
            if identity.is_empty() {
                return Err(GameError::MalformedInput("empty identity".to_string()));
            }
            Ok(Hello {
                identity,
                name,
                cols: cols as usize,
                rows: rows as usize,
            })
        }
        Some(other) => Err(GameError::MalformedInput(format!(
            "expected hello, got {:?}",
            other
        ))),
        None => Err(GameError::Transport(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed before hello",
        ))),
    }
}

/// Input events forwarded to the game task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    Steer(Heading),
    Respawn,
    Resize { cols: usize, rows: usize },
    Quit,
}

/// Maps a frame after the handshake to an input event. Unrecognised input is
/// dropped.
pub fn interpret(packet: Packet) -> Option<Inbound> {
    match packet {
        Packet::Input { bytes } => parse_action(&bytes).map(|action| match action {
            Action::Steer(heading) => Inbound::Steer(heading),
            Action::Respawn => Inbound::Respawn,
            Action::Quit => Inbound::Quit,
        }),
        Packet::WindowChange { payload } => {
            if payload.len() < 8 {
                debug!("Short window change payload of {} bytes", payload.len());
            }
            let (cols, rows) = parse_dims(&payload);
            Some(Inbound::Resize {
                cols: cols as usize,
                rows: rows as usize,
            })
        }
        Packet::Disconnect => Some(Inbound::Quit),
        Packet::Hello { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{dims_payload, encode_frame};
    use tokio_test::io::Builder;

    #[test]
    fn test_lifecycle_closes_once() {
        let lifecycle = Lifecycle::new();
        assert!(lifecycle.is_active());
        assert!(lifecycle.begin_close());
        assert!(!lifecycle.begin_close());
        assert_eq!(lifecycle.state(), LifecycleState::Closing);
        lifecycle.finish_close();
        assert_eq!(lifecycle.state(), LifecycleState::Closed);
        assert!(!lifecycle.begin_close());
    }

    #[test]
    fn test_push_reports_full_queue() {
        let (session, _io) = Session::new(1);
        for _ in 0..OUTBOUND_CAPACITY {
            session.push(vec![b'x']).unwrap();
        }
        assert_eq!(session.push(vec![b'x']), Err(PushError::Full));
    }

    #[test]
    fn test_push_after_close_fails() {
        let (session, _io) = Session::new(1);
        assert!(session.close());
        assert!(!session.close());
        assert!(!session.reject("late"));
        assert_eq!(session.push(vec![b'x']), Err(PushError::Closed));
    }

    #[tokio::test]
    async fn test_writer_flushes_queue_then_tears_down() {
        let (session, io) = Session::new(1);
        session.push(b"frame".to_vec()).unwrap();
        session.close();

        let mock = Builder::new().write(b"frame").write(&ansi::teardown()).build();
        run_writer(mock, io).await.unwrap();
        assert_eq!(session.lifecycle().state(), LifecycleState::Closed);
    }

    #[tokio::test]
    async fn test_writer_sends_reject_message() {
        let (session, io) = Session::new(1);
        session.reject("This game is full.\r\n");

        let mock = Builder::new().write(b"This game is full.\r\n").build();
        run_writer(mock, io).await.unwrap();
        assert_eq!(session.lifecycle().state(), LifecycleState::Closed);
    }

    #[tokio::test]
    async fn test_writer_stops_when_session_dropped() {
        let (session, io) = Session::new(1);
        session.push(b"last".to_vec()).unwrap();
        let lifecycle = Arc::clone(&io.lifecycle);
        drop(session);

        let mock = Builder::new().write(b"last").build();
        run_writer(mock, io).await.unwrap();
        assert_eq!(lifecycle.state(), LifecycleState::Closed);
    }

    #[tokio::test]
    async fn test_writer_gives_up_on_stalled_peer() {
        let (session, io) = Session::new(1);
        session.push(vec![b'x'; 256]).unwrap();
        session.close();

        // the peer never reads, so the pipe fills after 16 bytes
        let (_peer, stalled) = tokio::io::duplex(16);
        let result = timeout(WRITE_TIMEOUT * 3, run_writer(stalled, io))
            .await
            .expect("writer blocked past its write timeout");

        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::TimedOut);
        assert_eq!(session.lifecycle().state(), LifecycleState::Closed);
    }

    #[tokio::test]
    async fn test_read_packets_until_eof() {
        let hello = Packet::Hello {
            identity: "abc".to_string(),
            name: "ann".to_string(),
            cols: 80,
            rows: 24,
        };
        let input = Packet::Input {
            bytes: vec![13],
        };
        let mut mock = Builder::new()
            .read(&encode_frame(&hello).unwrap())
            .read(&encode_frame(&input).unwrap())
            .build();

        assert_eq!(
            read_hello(&mut mock).await.unwrap(),
            Hello {
                identity: "abc".to_string(),
                name: "ann".to_string(),
                cols: 80,
                rows: 24,
            }
        );
        assert_eq!(read_packet(&mut mock).await.unwrap(), Some(input));
        assert_eq!(read_packet(&mut mock).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let len = (MAX_FRAME_LEN as u32 + 1).to_be_bytes();
        let mut mock = Builder::new().read(&len).build();
        assert!(matches!(
            read_packet(&mut mock).await,
            Err(GameError::MalformedInput(_))
        ));
    }

    #[tokio::test]
    async fn test_hello_must_come_first() {
        let mut mock = Builder::new()
            .read(&encode_frame(&Packet::Disconnect).unwrap())
            .build();
        assert!(matches!(
            read_hello(&mut mock).await,
            Err(GameError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_interpret_input() {
        let steer = Packet::Input {
            bytes: Heading::Left.escape_sequence().to_vec(),
        };
        assert_eq!(interpret(steer), Some(Inbound::Steer(Heading::Left)));
        assert_eq!(
            interpret(Packet::Input { bytes: vec![13] }),
            Some(Inbound::Respawn)
        );
        assert_eq!(
            interpret(Packet::Input { bytes: vec![3, 13] }),
            Some(Inbound::Quit)
        );
        assert_eq!(interpret(Packet::Input { bytes: b"xyz".to_vec() }), None);
        assert_eq!(interpret(Packet::Disconnect), Some(Inbound::Quit));
    }

    #[test]
    fn test_short_window_change_is_zero_sized() {
        assert_eq!(
            interpret(Packet::WindowChange {
                payload: dims_payload(120, 40)
            }),
            Some(Inbound::Resize {
                cols: 120,
                rows: 40
            })
        );
        assert_eq!(
            interpret(Packet::WindowChange {
                payload: vec![0, 0, 1]
            }),
            Some(Inbound::Resize { cols: 0, rows: 0 })
        );
    }
}
