//! Command-script generation for the external device simulator.
//!
//! A script is a newline-joined, ordered list of directives. The vocabulary
//! and order are fixed by the simulator; builders only fill in values.

use crate::constants::{DEFAULT_SWEEP_START, DEFAULT_SWEEP_STEP};
use crate::error::SimError;
use crate::job::ParameterSet;

/// Turns a parameter set into simulator script text.
///
/// Implementations must be pure and deterministic: the same parameters
/// always produce byte-identical text. Missing required keys are errors,
/// never silent defaults.
pub trait ScriptBuilder: Send + Sync {
    /// Build a complete script, ending with the `calculate` directive.
    fn build(&self, params: &ParameterSet) -> Result<String, SimError>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

/// Illuminated I-V sweep: load a device definition, set the working point,
/// sweep the bias voltage and calculate.
///
/// Required keys: `def`, `T_l`, `ill_l`, `V_max`. Optional: `V_start`
/// (default 0 V) and `V_step` (default 0.02 V).
#[derive(Debug, Clone, Default)]
pub struct IvSweepScript;

impl IvSweepScript {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Render a number the way the simulator's reference scripts do (`%f`).
fn fixed(v: f64) -> String {
    format!("{v:.6}")
}

impl ScriptBuilder for IvSweepScript {
    fn build(&self, params: &ParameterSet) -> Result<String, SimError> {
        let definition = params.text("def")?;
        let temperature = params.number("T_l")?;
        let illumination = params.number("ill_l")?;
        let stop = params.number("V_max")?;
        let start = params.number_or("V_start", DEFAULT_SWEEP_START)?;
        let step = params.number_or("V_step", DEFAULT_SWEEP_STEP)?;

        let lines = [
            "//Script file generated by simfleet".to_string(),
            "set quitscript.quitSCAPS".to_string(),
            format!("load definitionfile {definition}"),
            "set errorhandling.overwritefile".to_string(),
            format!("action workingpoint.temperature {}", fixed(temperature)),
            format!("action intensity.T {}", fixed(illumination)),
            format!("action iv.startv {}", fixed(start)),
            format!("action iv.stopv {}", fixed(stop)),
            format!("action iv.increment {}", fixed(step)),
            "action iv.doiv".to_string(),
            "calculate".to_string(),
        ];
        Ok(lines.join("\n"))
    }

    fn name(&self) -> &str {
        "iv-sweep"
    }
}
