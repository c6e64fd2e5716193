use std::{future::Future, io, net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use tokio::{
    io::{AsyncBufRead, AsyncWrite, BufReader},
    net::{TcpListener, TcpStream},
    select,
};
use tracing::{debug, info, warn};

use crate::{
    config::ServerConfig,
    message::{ChatMessage, Request, Response, read_message, write_message},
    store::ChatStore,
};

pub struct ChatServer {
    listener: TcpListener,
    store: Arc<ChatStore>,
}

impl ChatServer {
    pub fn new(listener: TcpListener) -> Self {
        Self::with_store(listener, Arc::new(ChatStore::new()))
    }

    pub fn with_store(listener: TcpListener, store: Arc<ChatStore>) -> Self {
        Self { listener, store }
    }

    pub async fn bind(config: &ServerConfig) -> Result<Self> {
        let listener = TcpListener::bind(config.listen)
            .await
            .with_context(|| format!("failed to bind chat server to {}", config.listen))?;
        Ok(Self::new(listener))
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let ChatServer { listener, store } = self;
        tokio::pin!(shutdown);

        loop {
            select! {
                _ = &mut shutdown => {
                    info!(messages = store.len(), "chat server shutting down");
                    break;
                }
                accept_result = listener.accept() => {
                    handle_accept_result(accept_result, &store);
                }
            }
        }

        Ok(())
    }

    pub async fn run_until_ctrl_c(self) -> Result<()> {
        self.run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = ?err, "failed to install ctrl-c handler");
            }
        })
        .await
    }
}

fn handle_accept_result(result: io::Result<(TcpStream, SocketAddr)>, store: &Arc<ChatStore>) {
    match result {
        Ok((stream, peer)) => spawn_connection_handler(stream, peer, store),
        Err(err) => warn!(error = ?err, "failed to accept connection"),
    }
}

fn spawn_connection_handler(stream: TcpStream, peer: SocketAddr, store: &Arc<ChatStore>) {
    let store = Arc::clone(store);
    tokio::spawn(async move {
        info!(%peer, "client connected");
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);
        match serve_calls(&store, &mut reader, &mut writer).await {
            Ok(calls) => info!(%peer, calls, "client disconnected"),
            Err(err) => warn!(%peer, error = ?err, "client connection closed with error"),
        }
    });
}

/// Answers request lines until the peer closes its side, returning the number
/// of calls served. Calls on one connection are handled strictly in order.
pub async fn serve_calls<R, W>(store: &ChatStore, reader: &mut R, writer: &mut W) -> Result<u64>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut calls = 0;
    loop {
        let response = match read_message::<_, Request>(reader).await {
            Ok(Some(request)) => dispatch(store, request),
            Ok(None) => break,
            Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                debug!(error = %err, "rejecting malformed request");
                Response::Error {
                    message: format!("malformed request: {err}"),
                }
            }
            Err(err) => return Err(err).context("failed to read request"),
        };

        write_message(writer, &response)
            .await
            .context("failed to write reply")?;
        calls += 1;
    }

    Ok(calls)
}

fn dispatch(store: &ChatStore, request: Request) -> Response {
    match request {
        Request::AppendMessage { author, content } => {
            info!(%author, %content, "received message");
            Response::History {
                messages: store.append(ChatMessage { author, content }),
            }
        }
        Request::GetHistory => Response::History {
            messages: store.get_all(),
        },
    }
}
