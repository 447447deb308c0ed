//! Server network layer: TCP sessions feeding the single game task

use crate::ansi;
use crate::config::GameConfig;
use crate::error::GameError;
use crate::game::{GameState, StoredScore, TickReport};
use crate::grid::PlayerId;
use crate::id_pool::IdPool;
use crate::notify::RankNotifier;
use crate::player::sanitize_name;
use crate::session::{
    interpret, read_hello, read_packet, run_writer, CloseReason, Inbound, LifecycleState,
    PushError, Session,
};
use crate::store::{ScoreRecord, ScoreStore};
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};

pub const FULL_MESSAGE: &str = "This game is full.\r\n";
pub const DUPLICATE_MESSAGE: &str = "You are already playing in another session.\r\n";

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
/// Messages that may queue for the game task before connection readers wait.
const INBOUND_CAPACITY: usize = 1000;
/// How long shutdown waits for writers to deliver their teardown bytes.
const TEARDOWN_GRACE: Duration = Duration::from_millis(300);

/// Messages sent from connection tasks to the game task
#[derive(Debug)]
pub enum ServerMessage {
    Join {
        id: PlayerId,
        identity: String,
        name: String,
        cols: usize,
        rows: usize,
        session: Session,
    },
    Inbound {
        id: PlayerId,
        serial: u64,
        event: Inbound,
    },
    Disconnect {
        id: PlayerId,
        serial: u64,
    },
}

/// Shared by every connection task.
#[derive(Clone)]
struct Acceptor {
    pool: Arc<IdPool>,
    server_tx: mpsc::Sender<ServerMessage>,
    serials: Arc<AtomicU64>,
}

/// Main server coordinating connections and the game simulation
pub struct Server {
    listener: Arc<TcpListener>,
    game: GameState,
    pool: Arc<IdPool>,
    store: Arc<dyn ScoreStore>,
    notifier: Option<Box<dyn RankNotifier>>,
    sessions: HashMap<PlayerId, Session>,
    tick_duration: Duration,

    server_tx: mpsc::Sender<ServerMessage>,
    server_rx: mpsc::Receiver<ServerMessage>,
    persist_tx: Option<mpsc::UnboundedSender<(String, ScoreRecord)>>,
    persist_task: Option<JoinHandle<()>>,
}

impl Server {
    pub async fn new(
        addr: &str,
        config: GameConfig,
        store: Arc<dyn ScoreStore>,
        notifier: Option<Box<dyn RankNotifier>>,
    ) -> Result<Self, GameError> {
        let tick_duration = config.tick;
        let pool = Arc::new(IdPool::new(config.max_players));
        let mut game = GameState::new(config, Arc::clone(&pool))?;
        match store.load_all() {
            Ok(records) => game.restore_scores(records),
            Err(e) => warn!("Could not restore scores: {}", e),
        }

        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let (server_tx, server_rx) = mpsc::channel(INBOUND_CAPACITY);
        let (persist_tx, persist_task) = spawn_persistence(Arc::clone(&store));

        Ok(Server {
            listener: Arc::new(listener),
            game,
            pool,
            store,
            notifier,
            sessions: HashMap::new(),
            tick_duration,
            server_tx,
            server_rx,
            persist_tx: Some(persist_tx),
            persist_task: Some(persist_task),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, GameError> {
        Ok(self.listener.local_addr()?)
    }

    /// Spawns task that accepts connections and runs their handshakes
    fn spawn_acceptor(&self) -> JoinHandle<()> {
        let listener = Arc::clone(&self.listener);
        let acceptor = Acceptor {
            pool: Arc::clone(&self.pool),
            server_tx: self.server_tx.clone(),
            serials: Arc::new(AtomicU64::new(1)),
        };

        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        debug!("Accepted connection from {}", addr);
                        let acceptor = acceptor.clone();
                        tokio::spawn(async move {
                            if let Err(e) = acceptor.handle_connection(stream, addr).await {
                                warn!("Connection from {} failed: {}", addr, e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        })
    }

    /// Main server loop. Ticks until `shutdown` resolves, then tears every
    /// session down.
    pub async fn run<F>(mut self, shutdown: F) -> Result<(), GameError>
    where
        F: Future<Output = ()>,
    {
        let acceptor = self.spawn_acceptor();
        let mut tick_interval = interval(self.tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!("Server started successfully");

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Server shutting down");
                    break;
                },

                _ = tick_interval.tick() => {
                    let started = Instant::now();
                    let report = self.game.tick(started);
                    self.after_tick(report);

                    // Periodic performance monitoring
                    let tick = self.game.tick_count();
                    if tick % 200 == 0 && !self.sessions.is_empty() {
                        debug!(
                            "Tick {}: {} players, {} free slots, tick took {:?}",
                            tick,
                            self.game.player_count(),
                            self.pool.available(),
                            started.elapsed()
                        );
                    }
                },

                // ticks come first so a flood of input can't delay them
                message = self.server_rx.recv() => {
                    // the server holds a sender, so this never ends
                    if let Some(message) = message {
                        self.handle_message(message);
                    }
                },
            }
        }

        acceptor.abort();
        self.teardown_all().await;
        Ok(())
    }

    fn handle_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::Join {
                id,
                identity,
                name,
                cols,
                rows,
                session,
            } => self.handle_join(id, identity, name, cols, rows, session),
            ServerMessage::Inbound { id, serial, event } => {
                if self.is_current(id, serial) {
                    self.handle_inbound(id, event);
                }
            }
            ServerMessage::Disconnect { id, serial } => {
                if self.is_current(id, serial) {
                    self.drop_player(id, Instant::now());
                }
            }
        }
    }

    fn is_current(&self, id: PlayerId, serial: u64) -> bool {
        self.sessions
            .get(&id)
            .map_or(false, |session| session.serial() == serial)
    }

    fn handle_join(
        &mut self,
        id: PlayerId,
        identity: String,
        name: String,
        cols: usize,
        rows: usize,
        session: Session,
    ) {
        let stored = match self.store.load(&identity) {
            Ok(Some(record)) => StoredScore::Found(record),
            Ok(None) => StoredScore::Missing,
            Err(e) => {
                warn!(
                    "Could not load score for player {} ({}), starting from zero: {}",
                    id, name, e
                );
                StoredScore::Unavailable
            }
        };

        if let Err(e) = self.game.add_player(id, &identity, &name, stored) {
            warn!("Rejecting player {} ({}): {}", id, name, e);
            session.reject(DUPLICATE_MESSAGE);
            // nothing of this id reached the grid
            self.pool.release(id);
            return;
        }

        let mut greeting = ansi::greeting();
        if let Some(fit) = self.game.resize(id, cols, rows) {
            greeting.extend(fit);
        }
        if let Err(e) = session.push(greeting) {
            debug!("Player {} ({}) gone before greeting: {:?}", id, name, e);
        }
        self.sessions.insert(id, session);
    }

    fn handle_inbound(&mut self, id: PlayerId, event: Inbound) {
        match event {
            Inbound::Steer(heading) => {
                self.game.steer(id, heading);
            }
            Inbound::Respawn => {
                self.game.respawn(id);
            }
            Inbound::Resize { cols, rows } => {
                if let Some(bytes) = self.game.resize(id, cols, rows) {
                    self.push_to(id, bytes);
                }
            }
            Inbound::Quit => self.drop_player(id, Instant::now()),
        }
    }

    /// Closes a session and schedules the player's removal.
    fn drop_player(&mut self, id: PlayerId, now: Instant) {
        if let Some(session) = self.sessions.remove(&id) {
            session.close();
        }
        if let Some(score) = self.game.remove_player(id, now) {
            self.persist(score);
        }
    }

    fn persist(&self, score: (String, ScoreRecord)) {
        let sent = self
            .persist_tx
            .as_ref()
            .map_or(false, |tx| tx.send(score).is_ok());
        if !sent {
            warn!("Score persistence has stopped");
        }
    }

    fn push_to(&mut self, id: PlayerId, bytes: Vec<u8>) {
        let Some(session) = self.sessions.get(&id) else {
            return;
        };
        match session.push(bytes) {
            Ok(()) => {}
            Err(PushError::Full) => {
                debug!("Player {} is lagging, dropping a frame", id);
                self.game.invalidate_frame(id);
            }
            Err(PushError::Closed) => {
                info!("Player {} connection closed", id);
                self.drop_player(id, Instant::now());
            }
        }
    }

    fn after_tick(&mut self, report: TickReport) {
        for id in &report.kicked {
            if let Some(session) = self.sessions.remove(id) {
                session.close();
            }
        }
        for score in report.dirty_scores.iter().cloned() {
            self.persist(score);
        }

        for (id, bytes) in self.game.render_frames(report.ranking_changed()) {
            self.push_to(id, bytes);
        }

        if let (Some(notifier), Some(ranking)) = (self.notifier.as_mut(), report.ranking.as_ref()) {
            notifier.on_rank_change(ranking);
        }
    }

    /// Closes every session, waits briefly for the writers to finish, and
    /// flushes outstanding scores.
    async fn teardown_all(&mut self) {
        let now = Instant::now();
        let ids: Vec<PlayerId> = self.sessions.keys().copied().collect();
        let mut closing: Vec<Session> = Vec::new();

        for id in ids {
            if let Some(session) = self.sessions.get(&id) {
                closing.push(session.clone());
            }
            self.drop_player(id, now);
        }
        // joins that were queued behind the shutdown
        while let Ok(message) = self.server_rx.try_recv() {
            if let ServerMessage::Join { id, session, .. } = message {
                session.close();
                self.pool.release(id);
                closing.push(session);
            }
        }

        let deadline = tokio::time::Instant::now() + TEARDOWN_GRACE;
        while closing
            .iter()
            .any(|s| s.lifecycle().state() != LifecycleState::Closed)
            && tokio::time::Instant::now() < deadline
        {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        info!("Closed {} sessions", closing.len());

        // closing the channel lets the writer finish its queue and exit
        self.persist_tx = None;
        if let Some(task) = self.persist_task.take() {
            if timeout(Duration::from_secs(2), task).await.is_err() {
                warn!("Timed out writing final scores");
            }
        }
    }
}

/// Writes scores one at a time off the async runtime.
fn spawn_persistence(
    store: Arc<dyn ScoreStore>,
) -> (mpsc::UnboundedSender<(String, ScoreRecord)>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<(String, ScoreRecord)>();
    let task = tokio::spawn(async move {
        while let Some((identity, record)) = rx.recv().await {
            let store = Arc::clone(&store);
            let result = tokio::task::spawn_blocking(move || store.save(&identity, &record)).await;
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Failed to save score: {}", e),
                Err(e) => error!("Score save task panicked: {}", e),
            }
        }
    });
    (tx, task)
}

impl Acceptor {
    async fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) -> Result<(), GameError> {
        stream.set_nodelay(true)?;
        let (read_half, write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        let hello = match timeout(HANDSHAKE_TIMEOUT, read_hello(&mut reader)).await {
            Ok(hello) => hello?,
            Err(_) => {
                return Err(GameError::MalformedInput(format!(
                    "no hello within {:?}",
                    HANDSHAKE_TIMEOUT
                )))
            }
        };

        let serial = self.serials.fetch_add(1, Ordering::Relaxed);
        let (session, io) = Session::new(serial);
        let writer = tokio::spawn(run_writer(write_half, io));

        let Some(id) = self.pool.acquire() else {
            session.reject(FULL_MESSAGE);
            let _ = writer.await;
            return Err(GameError::CapacityExceeded);
        };

        let name = sanitize_name(&hello.name, id);
        info!("Player {} ({}) connected from {}", id, name, addr);
        let join = ServerMessage::Join {
            id,
            identity: hello.identity,
            name,
            cols: hello.cols,
            rows: hello.rows,
            session: session.clone(),
        };
        if self.server_tx.send(join).await.is_err() {
            self.pool.release(id);
            session.close();
            let _ = writer.await;
            return Ok(());
        }

        run_reader(reader, id, serial, session.shutdown_signal(), &self.server_tx).await;

        let _ = self
            .server_tx
            .send(ServerMessage::Disconnect { id, serial })
            .await;
        session.close();
        match writer.await {
            Ok(Err(e)) => debug!("Player {} writer ended with {}", id, e),
            Err(e) => error!("Player {} writer task failed: {}", id, e),
            Ok(Ok(())) => {}
        }
        Ok(())
    }
}

/// Forwards decoded input to the game task until the stream ends, the
/// player quits, or the session is closed from the game side.
async fn run_reader<R>(
    mut reader: R,
    id: PlayerId,
    serial: u64,
    mut shutdown: watch::Receiver<Option<CloseReason>>,
    server_tx: &mpsc::Sender<ServerMessage>,
) where
    R: AsyncRead + Unpin,
{
    loop {
        let packet = tokio::select! {
            packet = read_packet(&mut reader) => packet,
            _ = shutdown.changed() => break,
        };

        match packet {
            Ok(Some(packet)) => match interpret(packet) {
                Some(Inbound::Quit) => {
                    debug!("Player {} quit", id);
                    break;
                }
                Some(event) => {
                    if server_tx
                        .send(ServerMessage::Inbound { id, serial, event })
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                None => debug!("Ignoring unexpected frame from player {}", id),
            },
            Ok(None) => break,
            Err(e) => {
                warn!("Player {} read failed: {}", id, e);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::LeaderAnnouncer;
    use crate::session::SessionIo;
    use crate::store::{MemoryStore, StoreError};
    use shared::{encode_frame, Heading, Packet};
    use std::io;
    use std::sync::Mutex;
    use tokio_test::io::Builder;

    fn frame(packet: Packet) -> Vec<u8> {
        encode_frame(&packet).unwrap()
    }

    async fn test_server(config: GameConfig) -> Server {
        Server::new("127.0.0.1:0", config, Arc::new(MemoryStore::new()), None)
            .await
            .unwrap()
    }

    fn join_player(server: &mut Server, identity: &str, serial: u64) -> (PlayerId, SessionIo) {
        let id = server.pool.acquire().unwrap();
        let (session, io) = Session::new(serial);
        server.handle_message(ServerMessage::Join {
            id,
            identity: identity.to_string(),
            name: identity.to_string(),
            cols: 200,
            rows: 60,
            session,
        });
        (id, io)
    }

    /// Restores one saved score at startup but fails every lookup.
    struct UnreachableStore;

    impl ScoreStore for UnreachableStore {
        fn load(&self, _identity: &str) -> Result<Option<ScoreRecord>, StoreError> {
            Err(StoreError::Io(io::Error::new(io::ErrorKind::Other, "offline")))
        }

        fn save(&self, _identity: &str, _record: &ScoreRecord) -> Result<(), StoreError> {
            Ok(())
        }

        fn load_all(&self) -> Result<Vec<(String, ScoreRecord)>, StoreError> {
            Ok(vec![(
                "abc".to_string(),
                ScoreRecord {
                    name: "ann".to_string(),
                    kills: 9,
                    deaths: 1,
                },
            )])
        }
    }

    #[tokio::test]
    async fn test_failed_score_load_starts_from_zero() {
        let mut server = Server::new(
            "127.0.0.1:0",
            GameConfig::default(),
            Arc::new(UnreachableStore),
            None,
        )
        .await
        .unwrap();

        let (id, _io) = join_player(&mut server, "abc", 1);
        let player = server.game.player(id).unwrap();
        assert_eq!((player.kills, player.deaths), (0, 0));
    }

    #[tokio::test]
    async fn test_reader_waits_when_game_is_behind() {
        let (session, _io) = Session::new(2);
        let (tx, mut rx) = mpsc::channel(1);
        let mock = Builder::new()
            .read(&frame(Packet::Input { bytes: vec![13] }))
            .read(&frame(Packet::Input { bytes: vec![13] }))
            .build();

        let reader = run_reader(mock, 1, 2, session.shutdown_signal(), &tx);
        tokio::pin!(reader);

        // one event fits in the queue; the second waits for the game task
        assert!(timeout(Duration::from_millis(50), &mut reader).await.is_err());
        assert!(rx.try_recv().is_ok());

        timeout(Duration::from_secs(1), &mut reader).await.unwrap();
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_kicked_player_session_is_closed() {
        let config = GameConfig {
            max_deaths: Some(1),
            ..GameConfig::default()
        };
        let delay = config.respawn_delay;
        let mut server = test_server(config).await;
        let (id, io) = join_player(&mut server, "abc", 1);
        server.game.spawn_at(id, 1, 5, Heading::Left);

        let now = Instant::now();
        let report = server.game.tick(now);
        assert_eq!(report.deaths, vec![id]);
        server.after_tick(report);
        assert_eq!(*io.shutdown.borrow(), None);

        let report = server.game.tick(now + delay);
        assert_eq!(report.kicked, vec![id]);
        server.after_tick(report);

        assert_eq!(*io.shutdown.borrow(), Some(CloseReason::Teardown));
        assert!(server.sessions.is_empty());
        assert_eq!(server.pool.available(), server.pool.capacity());
    }

    #[tokio::test]
    async fn test_rank_change_reaches_notifier() {
        let messages = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&messages);
        let announcer =
            LeaderAnnouncer::with_sink(move |m| sink.lock().unwrap().push(m.to_string()));
        let mut server = Server::new(
            "127.0.0.1:0",
            GameConfig::default(),
            Arc::new(MemoryStore::new()),
            Some(Box::new(announcer)),
        )
        .await
        .unwrap();

        let (a, _io_a) = join_player(&mut server, "ann", 1);
        let (b, _io_b) = join_player(&mut server, "bob", 2);
        // A moves up into (12, 10) just before B drives into it
        server.game.spawn_at(a, 12, 12, Heading::Up);
        server.game.spawn_at(b, 10, 10, Heading::Right);

        let now = Instant::now();
        let report = server.game.tick(now);
        assert!(report.ranking_changed());
        server.after_tick(report);
        assert!(messages.lock().unwrap().is_empty());

        let report = server.game.tick(now + Duration::from_millis(25));
        assert_eq!(report.deaths, vec![b]);
        server.after_tick(report);

        let messages = messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("ann has taken the lead!"));
        assert!(messages[0].contains("#1 ann 1 kills"));
    }

    #[tokio::test]
    async fn test_reader_forwards_events_until_quit() {
        let (session, _io) = Session::new(9);
        let (tx, mut rx) = mpsc::channel(16);
        let mock = Builder::new()
            .read(&frame(Packet::Input {
                bytes: Heading::Up.escape_sequence().to_vec(),
            }))
            .read(&frame(Packet::Input { bytes: b"zz".to_vec() }))
            .read(&frame(Packet::Input { bytes: vec![13] }))
            .read(&frame(Packet::Input { bytes: vec![3] }))
            .build();

        run_reader(mock, 4, 9, session.shutdown_signal(), &tx).await;

        let mut events = Vec::new();
        while let Ok(ServerMessage::Inbound { id, serial, event }) = rx.try_recv() {
            assert_eq!((id, serial), (4, 9));
            events.push(event);
        }
        assert_eq!(events, vec![Inbound::Steer(Heading::Up), Inbound::Respawn]);
    }

    #[tokio::test]
    async fn test_reader_stops_at_eof() {
        let (session, _io) = Session::new(1);
        let (tx, mut rx) = mpsc::channel(16);
        let mock = Builder::new().build();
        run_reader(mock, 1, 1, session.shutdown_signal(), &tx).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_join_and_stale_messages() {
        let mut server = test_server(GameConfig::default()).await;
        let id = server.pool.acquire().unwrap();
        let (session, mut io) = Session::new(5);

        server.handle_message(ServerMessage::Join {
            id,
            identity: "abc".to_string(),
            name: "ann".to_string(),
            cols: 200,
            rows: 60,
            session,
        });
        assert!(server.game.player(id).unwrap().is_ready());
        let greeting = io.outbound.try_recv().unwrap();
        assert!(greeting.starts_with(&ansi::greeting()));

        // a message from an older connection with the same id is ignored
        server.handle_message(ServerMessage::Disconnect { id, serial: 4 });
        assert!(server.game.player(id).is_some());

        server.handle_message(ServerMessage::Inbound {
            id,
            serial: 5,
            event: Inbound::Respawn,
        });
        assert!(server.game.player(id).unwrap().alive);

        server.handle_message(ServerMessage::Disconnect { id, serial: 5 });
        assert!(server.game.player(id).is_none());
        assert_eq!(*io.shutdown.borrow(), Some(CloseReason::Teardown));
    }

    #[tokio::test]
    async fn test_duplicate_identity_rejected_and_id_returned() {
        let config = GameConfig {
            max_players: 2,
            ..GameConfig::default()
        };
        let mut server = test_server(config).await;

        let first = server.pool.acquire().unwrap();
        let (session, _io1) = Session::new(1);
        server.handle_message(ServerMessage::Join {
            id: first,
            identity: "abc".to_string(),
            name: "ann".to_string(),
            cols: 200,
            rows: 60,
            session,
        });

        let second = server.pool.acquire().unwrap();
        let (session, io2) = Session::new(2);
        server.handle_message(ServerMessage::Join {
            id: second,
            identity: "abc".to_string(),
            name: "ann".to_string(),
            cols: 200,
            rows: 60,
            session,
        });

        assert_eq!(
            *io2.shutdown.borrow(),
            Some(CloseReason::Reject(DUPLICATE_MESSAGE.as_bytes().to_vec()))
        );
        assert!(server.game.player(second).is_none());
        assert_eq!(server.pool.available(), 1);
    }

    #[tokio::test]
    async fn test_full_queue_invalidates_frame() {
        let mut server = test_server(GameConfig::default()).await;
        let id = server.pool.acquire().unwrap();
        let (session, mut io) = Session::new(1);
        server.handle_message(ServerMessage::Join {
            id,
            identity: "abc".to_string(),
            name: "ann".to_string(),
            cols: 200,
            rows: 60,
            session,
        });
        let now = Instant::now();
        let report = server.game.tick(now);
        server.after_tick(report);

        // fill the queue; the next frame is dropped and the frame invalidated
        while server.sessions[&id].push(vec![0]).is_ok() {}
        server.push_to(id, b"dropped".to_vec());

        while io.outbound.try_recv().is_ok() {}
        let repaint = server.game.render_frames(false);
        assert_eq!(repaint.len(), 1);
        assert!(repaint[0].1.len() > 1000);
    }

    #[tokio::test]
    async fn test_closed_session_drops_player() {
        let mut server = test_server(GameConfig::default()).await;
        let id = server.pool.acquire().unwrap();
        let (session, io) = Session::new(1);
        server.handle_message(ServerMessage::Join {
            id,
            identity: "abc".to_string(),
            name: "ann".to_string(),
            cols: 200,
            rows: 60,
            session,
        });
        drop(io);

        server.push_to(id, b"frame".to_vec());
        assert!(server.game.player(id).is_none());
        assert!(server.sessions.is_empty());
    }
}
