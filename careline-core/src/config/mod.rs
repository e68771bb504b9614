pub mod config_store;
pub mod matching;
pub mod settlement;

pub use config_store::{ConfigStore, ConfigWatcher};
pub use matching::MatchingConfig;
pub use settlement::SettlementConfig;
