//! In-memory conversation storage for multi-session callers.
//!
//! A turn needs exclusive access to its conversation; the store hands out one
//! lock per session key so concurrent sessions never share mutable state,
//! while the agent, registry, and clients stay shared and read-only.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::types::Conversation;

/// Conversations keyed by session id (e.g. `"tasks:<conversation_id>"`).
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Arc<tokio::sync::Mutex<Conversation>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the conversation for a key, creating it with the given system
    /// prompt on first use.
    pub fn get_or_create(
        &self,
        key: &str,
        system_prompt: &str,
    ) -> Arc<tokio::sync::Mutex<Conversation>> {
        let mut sessions = self.sessions.lock().expect("session map lock poisoned");
        sessions
            .entry(key.to_string())
            .or_insert_with(|| {
                Arc::new(tokio::sync::Mutex::new(Conversation::with_system(
                    system_prompt,
                )))
            })
            .clone()
    }

    /// Drop a session; returns whether it existed.
    pub fn remove(&self, key: &str) -> bool {
        self.sessions
            .lock()
            .expect("session map lock poisoned")
            .remove(key)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().expect("session map lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
