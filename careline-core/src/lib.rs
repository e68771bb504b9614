#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod availability;
pub mod config;
pub mod coordinator;
pub mod entities;
pub mod error;
pub mod events;
pub mod framework;
pub mod ledger;
pub mod notifier;
pub mod processors;
pub mod registry;
pub mod scheduler;
pub mod settlement;
