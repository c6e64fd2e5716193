//! Startup configuration for both processes.
//!
//! The defaults reproduce the fixed `localhost:1234` endpoint the chat room
//! has always used, so running either side without flags just works.

use std::{
    net::{Ipv4Addr, SocketAddr},
    time::Duration,
};

pub const DEFAULT_PORT: u16 = 1234;
pub const DEFAULT_SERVER_ADDR: &str = "localhost:1234";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// `host:port` of the chat server; resolved when connecting.
    pub server: String,
    /// Upper bound for a single remote call. `None` waits forever.
    pub call_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER_ADDR.to_string(),
            call_timeout: None,
        }
    }
}
