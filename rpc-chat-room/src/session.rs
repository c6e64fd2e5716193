//! Interactive terminal session for a chat client.
//!
//! The session is generic over its input, output and [`ChatService`] so the
//! binary can wire it to stdin/stdout and a TCP connection while tests drive it
//! with in-memory buffers.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use crate::{
    client::{ChatService, RpcClient},
    config::ClientConfig,
    message::ChatMessage,
};

/// Typing this line ends the session.
pub const EXIT_TOKEN: &str = "exit";

const CLEAR_SCREEN: &str = "\x1b[H\x1b[2J";
const HEADER: &str = "--- Chat History ---";
const FOOTER: &str = "--------------------";
const EMPTY_PLACEHOLDER: &str = "No messages yet. Be the first to say something!";
const NAME_PROMPT: &str = "Please enter your name: ";
const MESSAGE_PROMPT: &str = "Enter message ('exit' to quit): ";

pub async fn run(config: ClientConfig) -> Result<()> {
    let client = RpcClient::connect(config.server.as_str(), config.call_timeout)
        .await
        .with_context(|| format!("failed to connect to {}", config.server))?;
    info!(server = %config.server, "connected");

    let mut stdout = tokio::io::stdout();
    stdout.write_all(b"Connected to the chat server.\n").await?;
    stdout.flush().await?;

    let mut session = ChatSession::new(client, BufReader::new(tokio::io::stdin()), stdout);
    session.run().await?;
    session.into_service().shutdown().await;

    Ok(())
}

pub struct ChatSession<S, R, W> {
    service: S,
    input: R,
    output: W,
    username: String,
}

impl<S, R, W> ChatSession<S, R, W>
where
    S: ChatService,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(service: S, input: R, output: W) -> Self {
        Self {
            service,
            input,
            output,
            username: String::new(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn into_service(self) -> S {
        self.service
    }

    /// Prompts for a name, shows the current history, then relays lines
    /// until the user types [`EXIT_TOKEN`] or input ends.
    pub async fn run(&mut self) -> Result<()> {
        self.write(NAME_PROMPT).await?;
        let Some(name) = self.read_line().await? else {
            return Ok(());
        };
        self.username = name;

        let initial = match self.service.history().await {
            Ok(messages) => messages,
            Err(error) => {
                warn!(%error, "failed to fetch initial history");
                Vec::new()
            }
        };
        render_history(&mut self.output, &initial).await?;

        while let Some(line) = self.read_line().await? {
            if line == EXIT_TOKEN {
                self.write("Disconnecting from chat. Goodbye!\n").await?;
                break;
            }
            if line.is_empty() {
                continue;
            }

            let message = ChatMessage::new(self.username.clone(), line);
            let history = self
                .service
                .append(message)
                .await
                .context("error calling remote procedure; server may have disconnected")?;
            render_history(&mut self.output, &history).await?;
        }

        Ok(())
    }

    async fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let bytes = self
            .input
            .read_line(&mut line)
            .await
            .context("failed to read from input")?;
        if bytes == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    async fn write(&mut self, text: &str) -> Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await?;
        Ok(())
    }
}

/// Clears the terminal and redraws the full history followed by the prompt.
pub async fn render_history<W>(output: &mut W, messages: &[ChatMessage]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut screen = String::new();
    screen.push_str(CLEAR_SCREEN);
    screen.push_str(HEADER);
    screen.push('\n');
    if messages.is_empty() {
        screen.push_str(EMPTY_PLACEHOLDER);
        screen.push('\n');
    }
    for message in messages {
        screen.push_str(&format!("[{}]: {}\n", message.author, message.content));
    }
    screen.push_str(FOOTER);
    screen.push('\n');
    screen.push_str(MESSAGE_PROMPT);

    output.write_all(screen.as_bytes()).await?;
    output.flush().await
}
