use std::{net::SocketAddr, time::Duration};

use clap::{Args, Parser, Subcommand};

use crate::config::{ClientConfig, DEFAULT_SERVER_ADDR, ServerConfig};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the chat server holding the shared history.
    Server(ServerArgs),
    /// Connect to a chat server and chat from the terminal.
    Client(ClientArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Socket address the server should bind to. Use port 0 for an ephemeral port.
    #[arg(long, default_value = "127.0.0.1:1234")]
    pub listen: SocketAddr,
}

#[derive(Args, Debug, Clone)]
pub struct ClientArgs {
    /// Address of the chat server, as host:port.
    #[arg(long, default_value = DEFAULT_SERVER_ADDR)]
    pub server: String,

    /// Give up on a remote call after this many milliseconds. Waits forever when unset.
    #[arg(long)]
    pub call_timeout_ms: Option<u64>,
}

impl From<ServerArgs> for ServerConfig {
    fn from(args: ServerArgs) -> Self {
        Self {
            listen: args.listen,
        }
    }
}

impl From<ClientArgs> for ClientConfig {
    fn from(args: ClientArgs) -> Self {
        Self {
            server: args.server,
            call_timeout: args.call_timeout_ms.map(Duration::from_millis),
        }
    }
}
