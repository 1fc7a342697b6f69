//! Single-job executor bound to a slot.
//!
//! A run writes the job's script into the slot, launches the simulator
//! against it, closes the result file with the end-of-data line and hands
//! the file to the parser.

use std::fs::{self, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Arc;

use simfleet_core::constants::{END_OF_DATA_LINE, RESULT_FILE_NAME};
use simfleet_core::job::{Job, JobId};
use simfleet_core::parser::OutputParser;
use simfleet_core::script::ScriptBuilder;
use simfleet_core::SimError;

use crate::config::PoolConfig;
use crate::interfaces::JobRunner;
use crate::slot::Slot;

/// Runs jobs through the external simulator.
pub struct SlotWorker<P> {
    script: Arc<dyn ScriptBuilder>,
    parser: P,
    command: String,
}

impl<P: OutputParser> SlotWorker<P> {
    #[must_use]
    pub fn new(config: &PoolConfig, script: Arc<dyn ScriptBuilder>, parser: P) -> Self {
        Self {
            script,
            parser,
            command: config.command.clone(),
        }
    }

    /// Write the job's script into the slot and clear any stale result.
    fn stage(&self, slot: &Slot, job: &Job) -> Result<(), SimError> {
        let body = self.script.build(&job.parameters)?;
        let script = format!("{body}\nsave results.iv {RESULT_FILE_NAME}\n");

        for dir in [slot.script_dir(), slot.result_dir()] {
            fs::create_dir_all(&dir).map_err(|e| SimError::io(&dir, e))?;
        }
        let script_path = slot.script_path();
        fs::write(&script_path, script).map_err(|e| SimError::io(&script_path, e))?;

        let result_path = slot.result_path();
        match fs::remove_file(&result_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SimError::io(&result_path, e)),
        }
    }

    /// Launch the simulator and wait for it. There is no timeout.
    fn invoke(&self, slot: &Slot, id: JobId) -> Result<(), SimError> {
        let line = slot.command_line(&self.command);
        tracing::debug!(
            slot = slot.index(),
            job = %id,
            script = self.script.name(),
            command = %line,
            "launching simulator"
        );

        let output = Command::new("sh")
            .arg("-c")
            .arg(&line)
            .current_dir(slot.root())
            .env("SIMFLEET_SLOT", slot.index().to_string())
            .env("SIMFLEET_SLOT_ROOT", slot.root())
            .stdin(Stdio::null())
            .output()
            .map_err(|source| SimError::Spawn {
                slot: slot.index(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stdout.trim().is_empty() {
            tracing::debug!(slot = slot.index(), job = %id, stdout = %stdout.trim(), "simulator output");
        }

        if !output.status.success() {
            return Err(SimError::SimulatorExit {
                slot: slot.index(),
                code: output.status.code(),
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(())
    }
}

impl<P: OutputParser> JobRunner for SlotWorker<P> {
    type Output = P::Output;

    fn run(&self, slot: &Slot, job: &Job) -> Result<P::Output, SimError> {
        self.stage(slot, job)?;
        self.invoke(slot, job.id)?;

        let result_path = slot.result_path();
        append_end_marker(&result_path)?;
        self.parser.parse(&result_path)
    }
}

/// Append the end-of-data line to a result file, so the parser always finds
/// a closing marker for the last block.
pub fn append_end_marker(path: &Path) -> Result<(), SimError> {
    let mut file = match OpenOptions::new().read(true).append(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(SimError::MissingOutput(path.to_path_buf()));
        }
        Err(e) => return Err(SimError::io(path, e)),
    };
    let io_err = |e: io::Error| SimError::io(path, e);

    // A leading newline only when needed: an extra blank line would shift
    // the last block's footer window.
    let mut line = String::new();
    if file.metadata().map_err(io_err)?.len() > 0 {
        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1)).map_err(io_err)?;
        file.read_exact(&mut last).map_err(io_err)?;
        if last[0] != b'\n' {
            line.push('\n');
        }
    }
    line.push_str(END_OF_DATA_LINE);
    file.write_all(line.as_bytes()).map_err(io_err)
}
