use std::{collections::HashSet, net::SocketAddr, time::Duration};

use anyhow::Result;
use rpc_chat_room::{
    client::{ChatService, RpcClient},
    message::{ChatMessage, Response, read_message},
    server::ChatServer,
};
use tokio::{
    io::{AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    sync::oneshot,
    task::JoinHandle,
    time::timeout,
};

const CALL_TIMEOUT: Duration = Duration::from_secs(2);

struct RunningServer {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl RunningServer {
    async fn start() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let server = ChatServer::new(listener);

        let (shutdown, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let shutdown = async move {
                let _ = shutdown_rx.await;
            };
            let _ = server.run_until(shutdown).await;
        });

        Ok(Self {
            addr,
            shutdown,
            task,
        })
    }

    async fn client(&self) -> Result<RpcClient> {
        Ok(RpcClient::connect(self.addr, Some(CALL_TIMEOUT)).await?)
    }

    async fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = self.task.await;
    }
}

#[tokio::test]
async fn empty_server_returns_empty_history() -> Result<()> {
    let server = RunningServer::start().await?;
    let mut client = server.client().await?;

    assert!(client.history().await?.is_empty());

    client.shutdown().await;
    server.stop().await;
    Ok(())
}

#[tokio::test]
async fn two_clients_share_one_history() -> Result<()> {
    let server = RunningServer::start().await?;
    let alice_hi = ChatMessage::new("alice", "hi");
    let bob_hello = ChatMessage::new("bob", "hello");

    let mut alice = server.client().await?;
    assert!(alice.history().await?.is_empty());
    assert_eq!(alice.append(alice_hi.clone()).await?, vec![alice_hi.clone()]);
    assert_eq!(alice.history().await?, vec![alice_hi.clone()]);

    let mut bob = server.client().await?;
    assert_eq!(bob.history().await?, vec![alice_hi.clone()]);
    let both = vec![alice_hi.clone(), bob_hello.clone()];
    assert_eq!(bob.append(bob_hello.clone()).await?, both);

    assert_eq!(alice.history().await?, both);
    assert_eq!(bob.history().await?, both);

    alice.shutdown().await;
    bob.shutdown().await;
    server.stop().await;
    Ok(())
}

#[tokio::test]
async fn repeated_reads_match() -> Result<()> {
    let server = RunningServer::start().await?;
    let mut client = server.client().await?;
    client.append(ChatMessage::new("alice", "one")).await?;
    client.append(ChatMessage::new("alice", "two")).await?;

    let first = client.history().await?;
    let second = client.history().await?;
    assert_eq!(first, second);

    client.shutdown().await;
    server.stop().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_clients_lose_nothing() -> Result<()> {
    const CLIENTS: usize = 6;
    const PER_CLIENT: usize = 20;

    let server = RunningServer::start().await?;

    let mut tasks = Vec::new();
    for id in 0..CLIENTS {
        let mut client = server.client().await?;
        tasks.push(tokio::spawn(async move {
            for seq in 0..PER_CLIENT {
                let message = ChatMessage::new(format!("client-{id}"), seq.to_string());
                let history = client.append(message.clone()).await?;
                assert!(history.contains(&message));
            }
            client.shutdown().await;
            anyhow::Ok(())
        }));
    }
    for task in tasks {
        task.await??;
    }

    let mut reader = server.client().await?;
    let history = reader.history().await?;
    assert_eq!(history.len(), CLIENTS * PER_CLIENT);

    let unique: HashSet<_> = history.iter().cloned().collect();
    assert_eq!(unique.len(), CLIENTS * PER_CLIENT);
    for id in 0..CLIENTS {
        for seq in 0..PER_CLIENT {
            assert!(unique.contains(&ChatMessage::new(format!("client-{id}"), seq.to_string())));
        }
    }

    reader.shutdown().await;
    server.stop().await;
    Ok(())
}

#[tokio::test]
async fn malformed_request_keeps_connection_open() -> Result<()> {
    let server = RunningServer::start().await?;
    let stream = TcpStream::connect(server.addr).await?;
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    writer.write_all(b"{\"type\":\"delete_everything\"}\n").await?;
    let reply = timeout(CALL_TIMEOUT, read_message::<_, Response>(&mut reader))
        .await??
        .expect("server should answer a malformed request");
    assert!(matches!(reply, Response::Error { .. }), "unexpected reply: {reply:?}");

    writer.write_all(b"{\"type\":\"get_history\"}\n").await?;
    let reply = timeout(CALL_TIMEOUT, read_message::<_, Response>(&mut reader))
        .await??
        .expect("server should still answer");
    assert_eq!(reply, Response::History { messages: vec![] });

    writer.shutdown().await?;
    server.stop().await;
    Ok(())
}
