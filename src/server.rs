use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use thiserror::Error;
use tokio::{net::TcpListener, sync::Mutex};
use tracing::{error, info};

use crate::{connection::handle_client_connection, key_value_store::KeyValueStore};

pub const DEFAULT_PORT: u16 = 6379;

#[derive(Error, Debug, PartialEq)]
pub enum CliError {
    #[error("Invalid command line flag '{0}'")]
    InvalidCommandLineFlag(String),
    #[error("Invalid command line flag value")]
    InvalidCommandLineFlagValue,
}

#[derive(Debug, PartialEq)]
pub struct RedisServer {
    pub port: u16,
}

impl RedisServer {
    /// Builds the server configuration from the process arguments, program name included.
    ///
    /// The only flag is `--port <1-65535>`, which defaults to 6379.
    pub fn new<I: IntoIterator<Item = String>>(command_line_args: I) -> Result<Self, CliError> {
        let mut iter = command_line_args.into_iter().skip(1);
        let mut port: Option<u16> = None;

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--port" => {
                    let Some(port_str) = iter.next() else {
                        return Err(CliError::InvalidCommandLineFlagValue);
                    };

                    let port_number = port_str
                        .parse::<u16>()
                        .map_err(|_| CliError::InvalidCommandLineFlagValue)?;

                    if port_number == 0 {
                        return Err(CliError::InvalidCommandLineFlagValue);
                    }

                    port = Some(port_number);
                }
                _ => return Err(CliError::InvalidCommandLineFlag(arg)),
            }
        }

        Ok(RedisServer {
            port: port.unwrap_or(DEFAULT_PORT),
        })
    }

    pub async fn bind(&self) -> anyhow::Result<TcpListener> {
        let address = SocketAddr::from(([0, 0, 0, 0], self.port));

        TcpListener::bind(address)
            .await
            .with_context(|| format!("Failed to bind to port {}", self.port))
    }

    /// Binds the configured port and serves clients until the process is stopped.
    pub async fn run(&self) -> anyhow::Result<()> {
        let listener = self.bind().await?;
        info!(port = self.port, "Listening for connections");

        serve(listener, Arc::new(Mutex::new(KeyValueStore::new()))).await;

        Ok(())
    }
}

/// Accepts connections on `listener`, serving each one on its own task.
pub async fn serve(listener: TcpListener, store: Arc<Mutex<KeyValueStore>>) {
    loop {
        match listener.accept().await {
            Ok((stream, address)) => {
                info!(client = %address, "Accepted new connection");

                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    handle_client_connection(stream, address.to_string(), store).await;
                });
            }
            Err(e) => {
                error!(error = %e, "Failed to accept connection");
            }
        }
    }
}
