// src/sink.rs
//! Outbound message sink and the host pause predicate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc;

use crate::types::Message;

/// Receives relayed chirps. Must not block for long; it runs on the tick path.
pub trait MessageSink: Send + Sync {
    fn emit(&self, message: Message);
}

/// Host simulation pause state, polled once per tick.
pub trait PauseSource: Send + Sync {
    fn is_paused(&self) -> bool;
}

impl<F> PauseSource for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_paused(&self) -> bool {
        self()
    }
}

/// Toggleable pause flag for hosts that push their state.
#[derive(Debug, Default)]
pub struct PauseFlag(AtomicBool);

impl PauseFlag {
    pub fn new(paused: bool) -> Self {
        Self(AtomicBool::new(paused))
    }

    pub fn set_paused(&self, paused: bool) {
        self.0.store(paused, Ordering::Release);
    }
}

impl PauseSource for PauseFlag {
    fn is_paused(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Writes each chirp to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl MessageSink for LogSink {
    fn emit(&self, message: Message) {
        tracing::info!(
            target: "sink",
            item_id = %message.item_id,
            source = %message.source_label,
            author = %message.display_name,
            entity = ?message.entity_id,
            "chirp: {}",
            message.text
        );
    }
}

/// Forwards chirps to an async consumer (e.g. a UI task).
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Message>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl MessageSink for ChannelSink {
    fn emit(&self, message: Message) {
        if let Err(e) = self.tx.send(message) {
            tracing::debug!(target: "sink", item_id = %e.0.item_id, "receiver gone, chirp dropped");
        }
    }
}

// --- Test helper ---
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub messages: Mutex<Vec<Message>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MessageSink for RecordingSink {
    fn emit(&self, message: Message) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }
}
