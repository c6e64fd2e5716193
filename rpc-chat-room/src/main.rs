use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use rpc_chat_room::{
    cli::{Cli, Command},
    config::{ClientConfig, ServerConfig},
    server::ChatServer,
    session,
};

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout belongs to the chat display.
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Server(args) => {
            let config = ServerConfig::from(args);
            let server = ChatServer::bind(&config).await?;
            let addr = server.local_addr()?;
            println!("Chat server is running on {addr}");
            info!(%addr, "waiting for clients to connect");
            if let Err(err) = server.run_until_ctrl_c().await {
                warn!("chat server exited with error: {err:?}");
                return Err(err);
            }
        }
        Command::Client(args) => session::run(ClientConfig::from(args)).await?,
    }

    Ok(())
}
