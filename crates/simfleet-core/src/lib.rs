//! # simfleet-core
//!
//! Core library for simfleet: the job model handed to worker slots, the
//! command-script builder for the external device simulator, and the parser
//! that turns a simulator result file into I-V curves.

pub mod batch;
pub mod constants;
pub mod error;
pub mod job;
pub mod parser;
pub mod progress;
pub mod script;

// Re-exports
pub use batch::BatchDocument;
pub use constants::{
    exit_codes, DEFAULT_MAX_SLOTS, END_MARKER, END_OF_DATA_LINE, RESULT_FILE_NAME,
    SCRIPT_FILE_NAME, START_MARKER,
};
pub use error::SimError;
pub use job::{Dispatch, Job, JobId, ParamValue, ParameterSet};
pub use parser::{IvCurve, IvCurveParser, OutputParser, RowWindow};
pub use progress::{JobOutcome, ProgressUpdate};
pub use script::{IvSweepScript, ScriptBuilder};
