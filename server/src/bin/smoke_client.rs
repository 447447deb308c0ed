//! Headless bot for exercising a running server: joins, steers at random,
//! respawns whenever it can, and reports how much output it received.

use rand::Rng;
use shared::{encode_frame, Heading, Packet, CARRIAGE_RETURN};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::interval;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let server_addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:2200".to_string());
    let bot_name = format!("bot{}", rand::thread_rng().gen_range(100..1000));

    println!("Connecting to {} as {}", server_addr, bot_name);
    let mut stream = TcpStream::connect(&server_addr).await?;
    let (mut read_half, mut write_half) = stream.split();

    let hello = Packet::Hello {
        identity: bot_name.clone(),
        name: bot_name,
        cols: 200,
        rows: 60,
    };
    write_half.write_all(&encode_frame(&hello)?).await?;

    let reader = async {
        let mut buf = [0u8; 4096];
        let mut total = 0usize;
        loop {
            match read_half.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => total += n,
            }
        }
        total
    };

    let driver = async {
        let mut ticker = interval(Duration::from_millis(100));
        for step in 0..100u32 {
            ticker.tick().await;
            let bytes = if step % 10 == 0 {
                vec![CARRIAGE_RETURN]
            } else {
                let heading = Heading::ALL[rand::thread_rng().gen_range(0..4)];
                heading.escape_sequence().to_vec()
            };
            let frame = encode_frame(&Packet::Input { bytes })?;
            write_half.write_all(&frame).await?;
        }
        println!("Sending disconnect request");
        write_half.write_all(&encode_frame(&Packet::Disconnect)?).await?;
        Ok::<(), Box<dyn std::error::Error>>(())
    };

    let (received, driven) = tokio::join!(reader, driver);
    driven?;
    println!("Received {} bytes of terminal output", received);
    println!("Smoke client finished");
    Ok(())
}
