use std::{future::Future, io, time::Duration};

use thiserror::Error;
use tokio::{
    io::{AsyncWriteExt, BufReader},
    net::{
        TcpStream, ToSocketAddrs,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
};
use tracing::{debug, warn};

use crate::message::{ChatMessage, Request, Response, read_message, write_message};

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("connection error: {0}")]
    Io(#[from] io::Error),
    #[error("server closed the connection")]
    Closed,
    #[error("server rejected the call: {0}")]
    Remote(String),
    #[error("no reply within {0:?}")]
    Timeout(Duration),
}

/// The two remote operations a chat client can issue.
pub trait ChatService {
    /// Appends `message` to the shared history and returns the whole history.
    fn append(
        &mut self,
        message: ChatMessage,
    ) -> impl Future<Output = Result<Vec<ChatMessage>, RpcError>> + Send;

    /// Fetches the whole history without changing it.
    fn history(&mut self) -> impl Future<Output = Result<Vec<ChatMessage>, RpcError>> + Send;
}

/// One TCP connection to a chat server. Calls are strictly sequential:
/// each request line is followed by exactly one reply line.
pub struct RpcClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    call_timeout: Option<Duration>,
}

impl RpcClient {
    pub async fn connect<A>(addr: A, call_timeout: Option<Duration>) -> io::Result<Self>
    where
        A: ToSocketAddrs,
    {
        let stream = TcpStream::connect(addr).await?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(reader),
            writer,
            call_timeout,
        })
    }

    pub async fn call(&mut self, request: &Request) -> Result<Vec<ChatMessage>, RpcError> {
        match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, self.round_trip(request))
                .await
                .map_err(|_| RpcError::Timeout(limit))?,
            None => self.round_trip(request).await,
        }
    }

    async fn round_trip(&mut self, request: &Request) -> Result<Vec<ChatMessage>, RpcError> {
        write_message(&mut self.writer, request).await?;
        match read_message::<_, Response>(&mut self.reader).await? {
            Some(Response::History { messages }) => {
                debug!(messages = messages.len(), "received history");
                Ok(messages)
            }
            Some(Response::Error { message }) => Err(RpcError::Remote(message)),
            None => Err(RpcError::Closed),
        }
    }

    pub async fn shutdown(mut self) {
        if let Err(error) = self.writer.shutdown().await {
            warn!(?error, "failed to shutdown client writer cleanly");
        }
    }
}

impl ChatService for RpcClient {
    async fn append(&mut self, message: ChatMessage) -> Result<Vec<ChatMessage>, RpcError> {
        self.call(&Request::from(message)).await
    }

    async fn history(&mut self) -> Result<Vec<ChatMessage>, RpcError> {
        self.call(&Request::GetHistory).await
    }
}
