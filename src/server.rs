//! Server configuration and the TCP accept loop.

use regex::Regex;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::client::ClientId;
use crate::connection::handle_connection;
use crate::executor::Executor;

/// Errors that can occur during command-line argument parsing.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum CliError {
    #[error("Invalid command line flag")]
    InvalidCommandLineFlag,
    #[error("Invalid port flag value")]
    InvalidPortFlagValue,
    #[error("Invalid host flag value")]
    InvalidHostFlagValue,
}

/// Listening configuration, parsed from the command line or built directly.
#[derive(Debug, PartialEq, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 6379,
        }
    }
}

impl ServerConfig {
    /// Parses `--host <addr>` and `--port <port>` flags.
    ///
    /// # Supported Arguments
    ///
    /// * `--host <addr>` - IPv4 address or hostname to bind (default: 0.0.0.0)
    /// * `--port <port>` - Port number to listen on (default: 6379)
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Result<Self, CliError> {
        let mut iter = args.into_iter().skip(1);
        let mut config = ServerConfig::default();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--host" => {
                    let Some(host) = iter.next() else {
                        return Err(CliError::InvalidCommandLineFlag);
                    };
                    config.host = validate_host(&host)?;
                }
                "--port" => {
                    let Some(port) = iter.next() else {
                        return Err(CliError::InvalidCommandLineFlag);
                    };
                    config.port = validate_port(&port)?;
                }
                _ => return Err(CliError::InvalidCommandLineFlag),
            }
        }

        Ok(config)
    }
}

fn validate_port(port: &str) -> Result<u16, CliError> {
    let port = port
        .parse::<u32>()
        .map_err(|_| CliError::InvalidPortFlagValue)?;

    if !(1..=65535).contains(&port) {
        return Err(CliError::InvalidPortFlagValue);
    }

    Ok(port as u16)
}

fn validate_host(host: &str) -> Result<String, CliError> {
    let ipv4_regex =
        Regex::new(r"^(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})$").expect("pattern is valid");
    let hostname_regex = Regex::new(r"^[a-zA-Z0-9\-\.]+$").expect("pattern is valid");

    let valid = if let Some(caps) = ipv4_regex.captures(host) {
        caps.iter().skip(1).all(|octet| {
            octet
                .map(|m| m.as_str().parse::<u16>().map(|v| v <= 255).unwrap_or(false))
                .unwrap_or(false)
        })
    } else {
        hostname_regex.is_match(host)
    };

    if !valid {
        return Err(CliError::InvalidHostFlagValue);
    }

    Ok(host.to_string())
}

/// The TCP front of the server: binds, accepts, and hands every connection
/// its own reader/writer pair while a single executor task owns the state.
#[derive(Debug, Clone)]
pub struct Server {
    host: String,
    port: u16,
}

impl Server {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Server {
            host: host.into(),
            port,
        }
    }

    pub fn from_config(config: ServerConfig) -> Self {
        Server::new(config.host, config.port)
    }

    /// Binds the configured address and serves until the process ends.
    pub async fn run(&self) -> std::io::Result<()> {
        let listener = TcpListener::bind((self.host.as_str(), self.port)).await?;
        info!(address = %listener.local_addr()?, "listening");
        Server::serve(listener).await
    }

    /// Accept loop over an already-bound listener (tests bind to an
    /// ephemeral port and pass it in).
    pub async fn serve(listener: TcpListener) -> std::io::Result<()> {
        let (events, requests) = mpsc::unbounded_channel();
        tokio::spawn(Executor::new().run(requests));

        let mut next_client = 0u64;
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    next_client += 1;
                    let client = ClientId(next_client);
                    info!(%client, %peer, "accepted connection");

                    let events = events.clone();
                    tokio::spawn(async move {
                        handle_connection(stream, client, events).await;
                    });
                }
                Err(err) => {
                    error!(%err, "failed to accept connection");
                }
            }
        }
    }
}
