//! Two-process chat room over a line-delimited JSON remote-call protocol.
//!
//! A server keeps the whole conversation in memory and answers two calls:
//! append-a-message and fetch-the-history. Both return the complete history,
//! which is how clients learn about messages from everyone else.
//!
//! - [`cli`] parses the `server` and `client` subcommands.
//! - [`config`] holds the startup configuration both sides are built from.
//! - [`message`] defines [`message::ChatMessage`], the request/reply envelope
//!   and the async line framing.
//! - [`store`] is the lock-guarded, append-only history.
//! - [`server`] accepts TCP connections and serves calls against the store.
//! - [`client`] issues calls over one connection.
//! - [`session`] is the interactive terminal loop on top of [`client`].

pub mod cli;
pub mod client;
pub mod config;
pub mod message;
pub mod server;
pub mod session;
pub mod store;
