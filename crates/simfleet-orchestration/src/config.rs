//! Pool configuration record.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use simfleet_core::constants::DEFAULT_MAX_SLOTS;
use simfleet_core::SimError;

/// Simulator directory inside a slot root on a standard wine install.
pub const DEFAULT_SIM_DIR: &str = "drive_c/Program Files (x86)/Scaps3309";

/// Command used to launch the simulator. Every `#` is replaced with the slot
/// root; the script file name is appended as the last argument.
pub const DEFAULT_COMMAND: &str = "WINEDEBUG=-all WINEPREFIX=# xvfb-run -a wine \
                                   #/drive_c/'Program Files (x86)'/Scaps3309/scaps3310.exe";

/// Everything a pool needs to locate and launch its slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Directory holding one `proc<i>` root per slot.
    pub exec_dir: PathBuf,
    /// Simulator directory relative to a slot root; holds `script/` and
    /// `results/`.
    pub sim_dir: PathBuf,
    /// Launch command template.
    pub command: String,
    /// Upper bound on the number of slots a pool may use.
    pub max_slots: usize,
    /// Pause after the last worker exits before the batch is declared done.
    pub settle_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            exec_dir: PathBuf::from("."),
            sim_dir: PathBuf::from(DEFAULT_SIM_DIR),
            command: DEFAULT_COMMAND.to_string(),
            max_slots: DEFAULT_MAX_SLOTS,
            settle_ms: 0,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Check that `slots` fits this configuration.
    pub fn validate(&self, slots: usize) -> Result<(), SimError> {
        if slots == 0 {
            return Err(SimError::Config("a pool needs at least one slot".into()));
        }
        if slots > self.max_slots {
            return Err(SimError::Config(format!(
                "{slots} slots exceeds the configured maximum of {}; raise max_slots or use fewer slots",
                self.max_slots
            )));
        }
        if self.command.trim().is_empty() {
            return Err(SimError::Config("simulator command is empty".into()));
        }
        Ok(())
    }

    /// Load a configuration from a JSON file. Absent fields take defaults.
    pub fn load(path: &Path) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path).map_err(|e| SimError::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| SimError::Serialization(e.to_string()))
    }
}
