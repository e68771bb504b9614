pub mod event_dispatcher;
pub mod expiry_watcher;

pub use event_dispatcher::EventDispatcher;
pub use expiry_watcher::ExpiryWatcher;
