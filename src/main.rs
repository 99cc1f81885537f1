use tracing::debug;

use rill::server::{Server, ServerConfig};

/// Entry point: parse flags, initialize logging, serve until terminated.
#[tokio::main]
async fn main() {
    let _ = tracing_subscriber::fmt()
        .try_init()
        .map_err(|err| debug!("failed to initialize global tracing: {}", err));

    let config = match ServerConfig::from_args(std::env::args()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to parse command line: {}", err);
            return;
        }
    };

    let server = Server::from_config(config);
    if let Err(err) = server.run().await {
        eprintln!("server error: {}", err);
    }
}
