//! Graders (components E, F, G): turn a compiled submission plus a test
//! case into a `CaseResult`.
//!
//! A grader owns launching the submission (and, for communication
//! problems, a manager and sibling user processes), merging sandbox
//! outcomes into `CaseResult`, and invoking the configured checker --
//! pure (§4.B) or bridged (§4.D).

pub mod communication;
pub mod signature;
pub mod standard;

use crate::checker::{Checker, CheckerOptions};
use crate::config::Config;
use crate::contrib::ContribKind;
use crate::error::JudgeError;
use crate::result::CheckerResult;

/// How a case's output is judged, selected by the problem's `checker`
/// config string (spec §4.E step 4, §4.D).
#[derive(Clone)]
pub enum CheckerSelector {
    /// A pure comparator: `standard`, `linecount`, `identical`, `floats`,
    /// `floatsrel`.
    Pure(Checker, CheckerOptions),
    /// An external checker/interactor compiled and invoked by the
    /// bridged runner.
    Bridged(BridgedConfig),
}

/// Everything the bridged checker runner needs that's fixed per-problem
/// (as opposed to per-case, like `point_value`/`batch_no`).
#[derive(Clone)]
pub struct BridgedConfig {
    pub contrib: ContribKind,
    pub files: Vec<String>,
    pub problem_dir: std::path::PathBuf,
    pub generator_time_limit_ms: u32,
    pub generator_memory_limit_mb: u32,
    pub treat_checker_points_as_percentage: bool,
    pub input_name: Option<String>,
    pub output_name: Option<String>,
}

/// Per-problem grading configuration, independent of any one case.
#[derive(Clone)]
pub struct ProblemGraderConfig {
    pub checker: CheckerSelector,
    /// `wall_time_factor * time_limit` is the sandbox wall-clock limit
    /// (spec §4.E step 2).
    pub wall_time_factor: f64,
    /// Max bytes captured from the submission's stdout before OLE fires.
    pub output_limit_length: usize,
}

/// Clamp a bridged checker's awarded points into `[0, point_value]` when
/// `Config::clamp_partial_credit` is set; otherwise pass through
/// unmodified (spec §9 Open Question (i): themis deliberately does not
/// range-check its multiplier in the original source).
pub fn apply_partial_credit_policy(
    mut result: CheckerResult,
    point_value: f64,
    config: &Config,
) -> CheckerResult {
    if config.clamp_partial_credit {
        result.points = result.points.clamp(0.0, point_value);
    }
    result
}

pub(crate) fn internal_missing_config(what: &str) -> JudgeError {
    JudgeError::internal(format!("missing required grader config: {what}"))
}
