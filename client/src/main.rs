use clap::Parser;
use client::network::Client;
use log::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:2200")]
    server: String,

    /// Name shown on the scoreboard
    #[arg(short = 'n', long)]
    name: Option<String>,

    /// Stable identity that scores are saved under
    #[arg(short = 'i', long)]
    identity: Option<String>,
}

fn login_name() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "player".to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let identity = args.identity.unwrap_or_else(login_name);
    let name = args.name.unwrap_or_else(|| identity.clone());

    info!("Connecting to: {}", args.server);
    info!("Controls: arrows/WASD to steer, Enter to respawn, q to quit");

    let client = Client::connect(&args.server, &identity, &name).await?;
    client.run().await?;

    Ok(())
}
