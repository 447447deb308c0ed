use clap::Parser;
use log::{error, info};
use server::config::GameConfig;
use server::network::Server;
use server::notify::{LeaderAnnouncer, RankNotifier};
use server::store::FileStore;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "2200")]
    port: u16,

    /// Board width in cells (even, 32 to 255)
    #[arg(long, default_value = "60")]
    width: usize,

    /// Board height in cells (even, 32 to 255)
    #[arg(long, default_value = "60")]
    height: usize,

    /// Maximum concurrent players
    #[arg(long, default_value = "4")]
    players: usize,

    /// Milliseconds per simulation tick
    #[arg(long, default_value = "25")]
    tick_ms: u64,

    /// Milliseconds a dead player's trail stays before respawn is allowed
    #[arg(long, default_value = "1000")]
    delay_ms: u64,

    /// Disconnect a player after this many deaths in one session
    #[arg(long)]
    deaths: Option<u32>,

    /// Score database file
    #[arg(long, default_value = "tron.db")]
    db: String,

    /// Wipe all stored scores at startup
    #[arg(long)]
    db_reset: bool,

    /// Log an announcement whenever a new player takes the lead
    #[arg(long)]
    announce: bool,
}

impl Args {
    fn game_config(&self) -> GameConfig {
        GameConfig {
            width: self.width,
            height: self.height,
            max_players: self.players,
            tick: Duration::from_millis(self.tick_ms),
            respawn_delay: Duration::from_millis(self.delay_ms),
            max_deaths: self.deaths,
            ..GameConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let config = args.game_config();
    if let Err(e) = config.validate() {
        error!("{}", e);
        return Err(e.into());
    }

    info!(
        "Starting {}x{} game for up to {} players, {}ms ticks",
        config.width, config.height, config.max_players, args.tick_ms
    );

    let store = Arc::new(FileStore::open(&args.db, args.db_reset)?);
    let notifier: Option<Box<dyn RankNotifier>> = if args.announce {
        Some(Box::new(LeaderAnnouncer::new()))
    } else {
        None
    };

    let address = format!("{}:{}", args.host, args.port);
    let server = Server::new(&address, config, store, notifier).await?;

    server
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Received Ctrl+C, shutting down gracefully...");
        })
        .await?;

    Ok(())
}
