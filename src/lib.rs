//! Shared fixtures for the workspace integration tests.
//!
//! The fake simulator stands in for the real device simulator: it reads the
//! script it is handed, and writes a one-block result file whose first
//! current point is minus the requested temperature.

use std::fs;
use std::io;
use std::path::Path;

use simfleet_core::job::{Job, ParameterSet};
use simfleet_orchestration::config::PoolConfig;

/// Shell script with the simulator's calling convention: slot root first,
/// script file name second. Exits 2 without writing a result when the
/// sweep's stop voltage is 13.
pub const FAKE_SIMULATOR: &str = r#"#!/bin/sh
root="$1"
script="$root/sim/script/$2"
name=$(sed -n 's/^save results.iv //p' "$script")
temp=$(sed -n 's/^action workingpoint.temperature //p' "$script")
if grep -q '^action iv.stopv 13' "$script"; then
  echo "convergence failure" >&2
  exit 2
fi
{
  printf 'SCAPS result\n'
  printf 'v(V)\tjtot(mA/cm2)\n'
  printf '\n'
  printf '0.00\t-%s\n' "$temp"
  printf '0.02\t-19.5\n'
  printf '\n\n\n'
  printf 'solar cell parameters deduced from calculated IV-curve:\n'
} > "$root/sim/results/$name"
"#;

/// Install the fake simulator in `dir` and return a pool configuration that
/// runs it, with slot roots under `dir/slots`.
pub fn fake_pool_config(dir: &Path) -> io::Result<PoolConfig> {
    let script = dir.join("fake_sim.sh");
    fs::write(&script, FAKE_SIMULATOR)?;
    Ok(PoolConfig {
        exec_dir: dir.join("slots"),
        sim_dir: "sim".into(),
        command: format!("sh {} #", script.display()),
        max_slots: 8,
        settle_ms: 0,
    })
}

/// Parameters for a sweep at `temperature` up to `v_max`.
#[must_use]
pub fn sweep(temperature: f64, v_max: f64) -> ParameterSet {
    ParameterSet::new()
        .with("def", "CdTe-base.def")
        .with("T_l", temperature)
        .with("ill_l", 108.0)
        .with("V_max", v_max)
}

/// `count` jobs with ids from `first`, temperatures 280, 281, ...
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn sweep_jobs(first: u64, count: u64) -> Vec<Job> {
    (0..count)
        .map(|i| Job::new(first + i, sweep(280.0 + i as f64, 0.5)))
        .collect()
}
