//! Sink for user-facing diagnostic messages.

use std::sync::Mutex;

/// Receives one formatted message per failed operation.
pub trait MessageSink: Send + Sync {
    fn add(&self, message: String);
}

/// Collects messages in memory, oldest first.
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Mutex<Vec<String>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(messages) => messages.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn clear(&self) {
        match self.messages.lock() {
            Ok(mut messages) => messages.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl MessageSink for MessageLog {
    fn add(&self, message: String) {
        match self.messages.lock() {
            Ok(mut messages) => messages.push(message),
            Err(poisoned) => poisoned.into_inner().push(message),
        }
    }
}
