//! Application configuration from CLI flags and environment.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use simfleet_core::constants::DEFAULT_MAX_SLOTS;
use simfleet_core::SimError;
use simfleet_orchestration::config::PoolConfig;

/// simfleet: run batches of device simulations across a fixed pool of
/// simulator slots.
#[derive(Parser, Debug)]
#[command(name = "simfleet", version, about)]
pub struct AppConfig {
    /// Batch document: JSON object mapping input id to parameters.
    #[arg(
        short,
        long,
        env = "SIMFLEET_INPUTS",
        required_unless_present = "completion"
    )]
    pub inputs: Option<PathBuf>,

    /// First input id to run.
    #[arg(short, long, default_value = "0", env = "SIMFLEET_START")]
    pub start: u64,

    /// Number of inputs to run from `--start` (0 runs every id from there on).
    #[arg(short = 'n', long, default_value = "0", env = "SIMFLEET_COUNT")]
    pub count: u64,

    /// Node index, recorded in output file names.
    #[arg(long, default_value = "0", env = "SIMFLEET_NODE")]
    pub node: u32,

    /// Split the selected inputs into this many sequential batches.
    #[arg(short, long, default_value = "1", env = "SIMFLEET_BATCHES")]
    pub batches: usize,

    /// Number of simulator slots to run in parallel.
    #[arg(long, default_value_t = DEFAULT_MAX_SLOTS, env = "SIMFLEET_SLOTS")]
    pub slots: usize,

    /// Upper bound on `--slots` (overrides the pool config file).
    #[arg(long, env = "SIMFLEET_MAX_SLOTS")]
    pub max_slots: Option<usize>,

    /// Directory holding one `proc<i>` root per slot.
    #[arg(long, env = "SIMFLEET_EXEC_DIR")]
    pub exec_dir: Option<PathBuf>,

    /// Simulator directory relative to a slot root.
    #[arg(long, env = "SIMFLEET_SIM_DIR")]
    pub sim_dir: Option<PathBuf>,

    /// Simulator launch command; every `#` becomes the slot root.
    #[arg(long, env = "SIMFLEET_COMMAND")]
    pub command: Option<String>,

    /// Pause after a batch's last worker exits (e.g. "5s", "500ms").
    #[arg(long, env = "SIMFLEET_SETTLE")]
    pub settle: Option<String>,

    /// JSON pool configuration; flags override its fields.
    #[arg(long, env = "SIMFLEET_POOL_CONFIG")]
    pub pool_config: Option<PathBuf>,

    /// Directory result files are written to.
    #[arg(short, long, default_value = ".", env = "SIMFLEET_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Time a random sample of this many inputs instead of running the batch.
    #[arg(long, value_name = "N")]
    pub time_sample: Option<usize>,

    /// Exit with an error if any input produced no output.
    #[arg(long)]
    pub strict: bool,

    /// Quiet mode (no progress display).
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose output; also raises the default log level to INFO.
    #[arg(short, long)]
    pub verbose: bool,

    /// Generate shell completion.
    #[arg(long, value_enum)]
    pub completion: Option<clap_complete::Shell>,
}

impl AppConfig {
    /// Parse CLI arguments.
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Pool configuration: the `--pool-config` file (or defaults) with any
    /// pool flags applied on top.
    pub fn pool_config(&self) -> Result<PoolConfig, SimError> {
        let mut pool = match &self.pool_config {
            Some(path) => PoolConfig::load(path)?,
            None => PoolConfig::default(),
        };
        if let Some(dir) = &self.exec_dir {
            pool.exec_dir.clone_from(dir);
        }
        if let Some(dir) = &self.sim_dir {
            pool.sim_dir.clone_from(dir);
        }
        if let Some(command) = &self.command {
            pool.command.clone_from(command);
        }
        if let Some(max) = self.max_slots {
            pool.max_slots = max;
        }
        if let Some(settle) = &self.settle {
            let delay = parse_duration(settle)
                .ok_or_else(|| SimError::Config(format!("invalid settle duration {settle:?}")))?;
            pool.settle_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        }
        Ok(pool)
    }
}

/// Parse a duration string like "5m", "1h", "30s", "250ms". A bare number is
/// seconds.
fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        let n: u64 = ms.parse().ok()?;
        Some(Duration::from_millis(n))
    } else if let Some(mins) = s.strip_suffix('m') {
        let n: u64 = mins.parse().ok()?;
        Some(Duration::from_secs(n.checked_mul(60)?))
    } else if let Some(hours) = s.strip_suffix('h') {
        let n: u64 = hours.parse().ok()?;
        Some(Duration::from_secs(n.checked_mul(3600)?))
    } else if let Some(secs) = s.strip_suffix('s') {
        let n: u64 = secs.parse().ok()?;
        Some(Duration::from_secs(n))
    } else {
        let n: u64 = s.parse().ok()?;
        Some(Duration::from_secs(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> AppConfig {
        AppConfig::try_parse_from(std::iter::once("simfleet").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn parse_duration_formats() {
        assert_eq!(parse_duration("5m"), Some(Duration::from_secs(300)));
        assert_eq!(parse_duration("1h"), Some(Duration::from_secs(3600)));
        assert_eq!(parse_duration("30s"), Some(Duration::from_secs(30)));
        assert_eq!(parse_duration("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration("7"), Some(Duration::from_secs(7)));
        assert_eq!(parse_duration("soon"), None);
    }

    #[test]
    fn parse_duration_rejects_overflow() {
        assert_eq!(parse_duration(&format!("{}m", u64::MAX)), None);
        assert_eq!(parse_duration(&format!("{}h", u64::MAX / 60)), None);
    }

    #[test]
    fn defaults() {
        let config = parse(&["--inputs", "in.json"]);
        assert_eq!(config.start, 0);
        assert_eq!(config.count, 0);
        assert_eq!(config.batches, 1);
        assert_eq!(config.slots, DEFAULT_MAX_SLOTS);
        assert_eq!(config.pool_config().unwrap(), PoolConfig::default());
    }

    #[test]
    fn inputs_required_without_completion() {
        let args = ["simfleet", "--slots", "2"];
        assert!(AppConfig::try_parse_from(args).is_err());
        assert!(AppConfig::try_parse_from(["simfleet", "--completion", "bash"]).is_ok());
    }

    #[test]
    fn flags_override_pool_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("pool.json");
        std::fs::write(&file, r#"{"exec_dir": "/srv/a", "max_slots": 8, "command": "run #"}"#)
            .unwrap();
        let file_arg = file.to_string_lossy().into_owned();

        let config = parse(&[
            "-i",
            "in.json",
            "--pool-config",
            &file_arg,
            "--exec-dir",
            "/srv/b",
            "--settle",
            "250ms",
        ]);
        let pool = config.pool_config().unwrap();
        assert_eq!(pool.exec_dir, PathBuf::from("/srv/b"));
        assert_eq!(pool.max_slots, 8);
        assert_eq!(pool.command, "run #");
        assert_eq!(pool.settle_ms, 250);
    }

    #[test]
    fn bad_settle_is_a_config_error() {
        let config = parse(&["-i", "in.json", "--settle", "a while"]);
        assert!(matches!(config.pool_config(), Err(SimError::Config(_))));
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        assert!(AppConfig::try_parse_from(["simfleet", "-i", "x", "-q", "-v"]).is_err());
    }
}
