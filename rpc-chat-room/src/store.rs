//! In-memory chat history shared by every connection on the server.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::message::ChatMessage;

/// Append-only message log behind a single exclusive lock.
///
/// Reads take the same lock as writes, so every call is serialized and the
/// order of the history is the order in which callers acquired the lock.
/// Each call returns an owned copy, so the lock is never held while a reply
/// is being written to the network.
#[derive(Debug, Default)]
pub struct ChatStore {
    history: Mutex<Vec<ChatMessage>>,
}

impl ChatStore {
    pub fn new() -> Self {
        Self {
            history: Mutex::new(Vec::new()),
        }
    }

    /// Appends `message` and returns the full history including it.
    pub fn append(&self, message: ChatMessage) -> Vec<ChatMessage> {
        let mut history = self.lock();
        history.push(message);
        history.clone()
    }

    /// Returns the full history in append order.
    pub fn get_all(&self) -> Vec<ChatMessage> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A push either completes or never happens, so a poisoned vec is still valid.
    fn lock(&self) -> MutexGuard<'_, Vec<ChatMessage>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
