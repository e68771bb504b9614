use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Runtime-tunable knobs of the matching state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// How long a responder has to accept or reject before the request is
    /// marked missed.
    #[serde(with = "humantime_secs")]
    pub response_timeout: Duration,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            response_timeout: Duration::from_secs(30),
        }
    }
}

/// Serialize the timeout as whole seconds in config files.
mod humantime_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_is_thirty_seconds() {
        assert_eq!(
            MatchingConfig::default().response_timeout,
            Duration::from_secs(30)
        );
    }

    #[test]
    fn timeout_round_trips_as_seconds() {
        let config = MatchingConfig {
            response_timeout: Duration::from_secs(45),
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"response_timeout":45}"#);
        let parsed: MatchingConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
