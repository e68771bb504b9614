//! Event channel factories and handles.
//!
//! Factory functions for creating event channels with appropriate buffer
//! sizes for the event-driven architecture.

use tokio::sync::mpsc;

use super::types::{ExpiryFired, SessionEvent};

/// Default buffer size for event channels.
///
/// This provides enough buffer to handle bursts while keeping memory bounded.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for SessionEvent events.
pub type SessionEventSender = mpsc::Sender<SessionEvent>;
/// Receiver handle for SessionEvent events.
pub type SessionEventReceiver = mpsc::Receiver<SessionEvent>;

/// Sender handle for ExpiryFired events.
pub type ExpiryFiredSender = mpsc::Sender<ExpiryFired>;
/// Receiver handle for ExpiryFired events.
pub type ExpiryFiredReceiver = mpsc::Receiver<ExpiryFired>;

/// Create a new SessionEvent channel.
///
/// Returns a (sender, receiver) pair for SessionEvent events.
/// Multiple senders can be cloned from the returned sender.
pub fn session_event_channel() -> (SessionEventSender, SessionEventReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Create a new ExpiryFired channel.
///
/// Returns a (sender, receiver) pair for ExpiryFired events. The
/// scheduler holds the sender, the expiry watcher the receiver.
pub fn expiry_fired_channel() -> (ExpiryFiredSender, ExpiryFiredReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}
