//! Slot layout.
//!
//! Slot `i` lives at `<exec_dir>/proc<i>`. The simulator directory inside it
//! holds a `script/` directory the worker writes into and a `results/`
//! directory the simulator saves into.

use std::path::{Path, PathBuf};

use simfleet_core::constants::{RESULT_FILE_NAME, SCRIPT_FILE_NAME};

use crate::config::PoolConfig;

/// One fixed execution environment, owned by exactly one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    index: usize,
    root: PathBuf,
    sim_root: PathBuf,
}

impl Slot {
    /// Lay out slot `index` under the configured execution directory.
    #[must_use]
    pub fn new(config: &PoolConfig, index: usize) -> Self {
        let root = config.exec_dir.join(format!("proc{index}"));
        let sim_root = root.join(&config.sim_dir);
        Self {
            index,
            root,
            sim_root,
        }
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Slot root (the wine prefix).
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn script_dir(&self) -> PathBuf {
        self.sim_root.join("script")
    }

    #[must_use]
    pub fn script_path(&self) -> PathBuf {
        self.script_dir().join(SCRIPT_FILE_NAME)
    }

    #[must_use]
    pub fn result_dir(&self) -> PathBuf {
        self.sim_root.join("results")
    }

    #[must_use]
    pub fn result_path(&self) -> PathBuf {
        self.result_dir().join(RESULT_FILE_NAME)
    }

    /// Shell command line that runs the simulator in this slot.
    #[must_use]
    pub fn command_line(&self, template: &str) -> String {
        let root = self.root.to_string_lossy();
        format!("{} {SCRIPT_FILE_NAME}", template.replace('#', &root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PoolConfig {
        PoolConfig {
            exec_dir: PathBuf::from("/srv/sim"),
            sim_dir: PathBuf::from("app"),
            ..PoolConfig::default()
        }
    }

    #[test]
    fn layout() {
        let slot = Slot::new(&config(), 2);
        assert_eq!(slot.index(), 2);
        assert_eq!(slot.root(), Path::new("/srv/sim/proc2"));
        assert_eq!(
            slot.script_path(),
            PathBuf::from("/srv/sim/proc2/app/script").join(SCRIPT_FILE_NAME)
        );
        assert_eq!(
            slot.result_path(),
            PathBuf::from("/srv/sim/proc2/app/results").join(RESULT_FILE_NAME)
        );
    }

    #[test]
    fn slots_never_share_files() {
        let a = Slot::new(&config(), 0);
        let b = Slot::new(&config(), 1);
        assert_ne!(a.script_path(), b.script_path());
        assert_ne!(a.result_path(), b.result_path());
    }

    #[test]
    fn command_line_substitutes_every_placeholder() {
        let slot = Slot::new(&config(), 1);
        let line = slot.command_line("WINEPREFIX=# wine #/bin/sim.exe");
        assert_eq!(
            line,
            format!("WINEPREFIX=/srv/sim/proc1 wine /srv/sim/proc1/bin/sim.exe {SCRIPT_FILE_NAME}")
        );
    }
}
