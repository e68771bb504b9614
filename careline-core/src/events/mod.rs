pub mod channels;
pub mod types;

pub use channels::{
    DEFAULT_CHANNEL_BUFFER, ExpiryFiredReceiver, ExpiryFiredSender, SessionEventReceiver,
    SessionEventSender, expiry_fired_channel, session_event_channel,
};
pub use types::{ExpiryFired, SessionEvent};
