use crate::input::translate;
use crossterm::event::{self, Event};
use crossterm::{cursor, execute, terminal};
use log::{debug, info, warn};
use shared::{encode_frame, Packet};
use std::io::{self, Write};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

/// Puts the local terminal in raw mode on an alternate screen and restores it
/// on drop, including when the session ends with an error.
pub struct TerminalGuard;

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        if let Err(e) = execute!(io::stdout(), terminal::EnterAlternateScreen) {
            let _ = terminal::disable_raw_mode();
            return Err(e);
        }
        Ok(TerminalGuard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

pub struct Client {
    stream: TcpStream,
    identity: String,
    name: String,
}

impl Client {
    pub async fn connect(
        server_addr: &str,
        identity: &str,
        name: &str,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        info!("Connecting to {}...", server_addr);
        let stream = TcpStream::connect(server_addr).await?;
        stream.set_nodelay(true)?;
        Ok(Client {
            stream,
            identity: identity.to_string(),
            name: name.to_string(),
        })
    }

    /// Plays until the server closes the connection.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let (cols, rows) = terminal::size()?;
        let _guard = TerminalGuard::enter()?;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        std::thread::spawn(move || loop {
            match event::read() {
                Ok(event) => {
                    if event_tx.send(event).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Terminal event error: {}", e);
                    break;
                }
            }
        });

        let hello = Packet::Hello {
            identity: self.identity,
            name: self.name,
            cols: cols as u32,
            rows: rows as u32,
        };
        let (reader, writer) = self.stream.into_split();
        relay(reader, writer, hello, event_rx, tokio::io::stdout()).await?;
        Ok(())
    }
}

/// Sends `hello`, then forwards translated terminal events to the server and
/// server bytes to `output` until the server hangs up.
pub async fn relay<R, W, O>(
    mut reader: R,
    mut writer: W,
    hello: Packet,
    mut events: mpsc::UnboundedReceiver<Event>,
    mut output: O,
) -> Result<u64, Box<dyn std::error::Error>>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    O: AsyncWrite + Unpin,
{
    writer.write_all(&encode_frame(&hello)?).await?;

    let mut buffer = [0u8; 8192];
    let mut received = 0u64;
    let mut events_open = true;

    loop {
        tokio::select! {
            result = reader.read(&mut buffer) => {
                let len = result?;
                if len == 0 {
                    debug!("Server closed the connection");
                    break;
                }
                received += len as u64;
                output.write_all(&buffer[..len]).await?;
                output.flush().await?;
            },

            event = events.recv(), if events_open => {
                match event {
                    Some(event) => {
                        if let Some(packet) = translate(&event) {
                            writer.write_all(&encode_frame(&packet)?).await?;
                        }
                    }
                    None => events_open = false,
                }
            },
        }
    }

    Ok(received)
}
