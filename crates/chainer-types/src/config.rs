//! Engine configuration types.
//!
//! `EngineConfig` is the `chainer.toml` document that tunes how the chain
//! engine runs actions. All fields have defaults, so an empty file is valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for the chain engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    /// Deadline applied to every up/down action, in seconds. `None` means
    /// actions only stop early on an explicit cancel signal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_timeout_secs: Option<u64>,

    /// Emit an `InProgress` notification before each action runs.
    #[serde(default)]
    pub announce_steps: bool,
}

impl EngineConfig {
    /// The per-action deadline, if one is configured. A zero value is
    /// treated as "no deadline".
    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}
