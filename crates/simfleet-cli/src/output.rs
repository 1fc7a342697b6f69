//! CLI output formatting and result files.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use simfleet_core::job::JobId;
use simfleet_core::SimError;

/// Format a duration for display.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 0.001 {
        format!("{:.2}µs", secs * 1_000_000.0)
    } else if secs < 1.0 {
        format!("{:.2}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{secs:.3}s")
    } else if secs < 3600.0 {
        let mins = (secs / 60.0).floor() as u64;
        let remaining = secs - (mins as f64 * 60.0);
        format!("{mins}m{remaining:.1}s")
    } else {
        let hours = (secs / 3600.0).floor() as u64;
        let mins = ((secs - hours as f64 * 3600.0) / 60.0).floor() as u64;
        format!("{hours}h{mins:02}m")
    }
}

/// Format a number with thousand separators.
#[must_use]
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Serialize a batch's outputs, keyed by job id, as MessagePack.
///
/// Struct fields are written by name so the file can be read without this
/// crate's type definitions.
pub fn write_results<O: Serialize>(path: &Path, outputs: &BTreeMap<JobId, O>) -> Result<(), SimError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| SimError::io(parent, e))?;
    }
    let bytes =
        rmp_serde::to_vec_named(outputs).map_err(|e| SimError::Serialization(e.to_string()))?;
    fs::write(path, bytes).map_err(|e| SimError::io(path, e))?;
    tracing::debug!(path = %path.display(), entries = outputs.len(), "results written");
    Ok(())
}
