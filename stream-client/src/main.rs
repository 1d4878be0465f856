// stream-client/src/main.rs
// Stream Client - main.rs

use std::io::Write;
use common::{setup_tracing, Config};
use stream_client::{CloseReason, StreamClient};
use tokio::io::{AsyncBufReadExt, BufReader};

#[actix::main]
async fn main() -> std::io::Result<()> {
    let config = Config::from_env();
    setup_tracing(&config.log_level);

    tracing::info!("Streaming answers from {}", config.relay_url);

    let mut client = StreamClient::from_config(&config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let query = line.trim();
        if query.is_empty() {
            continue;
        }

        let mut connection = client.send_message(query, |chunk| {
            if let Some(error) = chunk.error.as_deref() {
                tracing::error!("Chat failed: {} (status {:?})", error, chunk.status);
                return;
            }
            if let Some(data) = chunk.data.as_deref() {
                let mut stdout = std::io::stdout().lock();
                // Nothing useful to do if stdout is gone
                let _ = stdout.write_all(data.as_bytes());
                let _ = stdout.flush();
            }
        });

        let reason = connection.closed().await;
        println!();
        if reason != CloseReason::Done {
            tracing::warn!("Answer ended early: {:?}", reason);
        }
    }

    client.close();
    Ok(())
}
