// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Settings shared by all drivers of a session.
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverSettings {
    /// Prefix of generated instrument names, `{prefix}_{device_type}_{serial}`.
    pub name_prefix: String,
    /// Lock channel lists once construction has populated them.
    pub lock_channel_lists: bool,
    /// Expose the nodetree leaves as parameters.
    pub init_parameters: bool,
    pub diagnostics: bool,
}

impl Default for DriverSettings {
    fn default() -> Self {
        DriverSettings {
            name_prefix: "zi".to_string(),
            lock_channel_lists: false,
            init_parameters: true,
            diagnostics: false,
        }
    }
}

impl DriverSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: DriverSettings = serde_json::from_str(json)
            .map_err(|e| Error::new(format!("Invalid driver settings: {e}")))?;
        if settings.name_prefix.is_empty() {
            return Err(Error::new("Invalid driver settings: `name_prefix` must not be empty"));
        }
        Ok(settings)
    }
}

/// Timeout and polling interval handed to wait-for-completion operations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollSettings {
    pub timeout: Duration,
    pub sleep_time: Duration,
}

impl PollSettings {
    /// Sequencers, scopes and the PQSC execution engine.
    pub const SEQUENCER: PollSettings =
        PollSettings::new(Duration::from_secs(10), Duration::from_millis(5));
    /// Result loggers of readout and spectroscopy.
    pub const RESULT_LOGGER: PollSettings =
        PollSettings::new(Duration::from_secs(10), Duration::from_millis(50));
    /// Reference clock and ZSync link checks.
    pub const LINK: PollSettings =
        PollSettings::new(Duration::from_secs(30), Duration::from_secs(1));
    pub const COMPENSATION: PollSettings =
        PollSettings::new(Duration::from_secs(20), Duration::from_millis(500));

    pub const fn new(timeout: Duration, sleep_time: Duration) -> Self {
        PollSettings {
            timeout,
            sleep_time,
        }
    }
}
