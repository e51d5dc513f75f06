//! Contrib modules: translate a finished external checker/interactor
//! process into a verdict with partial credit (component C).
//!
//! Each module owns exit-code semantics and three argument-format
//! templates (checker, interactor, validator). The upstream `InternalError`
//! exception used as control flow becomes `JudgeError::Internal` here;
//! `run_parse_return_code` is the `catch_internal_error` adapter that
//! turns a stray `Internal` error into the generic "Checker exitcode N"
//! result instead of aborting the case outright.

pub mod cms;
pub mod default;
pub mod testlib;
pub mod themis;

use crate::error::JudgeError;
use crate::helper_errors::{translate, ProcessOutcome};
use crate::result::CheckerResult;

/// Everything a contrib module needs to interpret a finished auxiliary
/// process, independent of which sandbox ran it.
pub struct ParseContext<'a> {
    pub exit_code: i32,
    pub point_value: f64,
    /// Checker's stdout, decoded lossily (spec calls this `feedback`).
    pub feedback: &'a str,
    /// Checker's stderr, decoded lossily (spec calls this `extended_feedback`).
    pub extended_feedback: &'a str,
    pub name: &'a str,
    /// Raw stderr bytes, used only to render the internal-error guard's
    /// diagnostic text.
    pub stderr: &'a [u8],
    pub treat_checker_points_as_percentage: bool,
    /// Populated only when the process's exit code is not one a contrib
    /// module recognises; used to delegate to the helper-file translator.
    pub process: ProcessOutcome,
}

/// A contrib module's catch-all for an exit code it doesn't assign
/// meaning to: delegate to the helper-file translator (spec §4.G); if
/// that reports nothing (a "successful" but unrecognised code), the
/// caller still has no verdict to give, so this is always an error.
pub(crate) fn unrecognised_exit_code(ctx: &ParseContext) -> JudgeError {
    match translate(&ctx.process) {
        Some(message) => JudgeError::Internal(message),
        None => JudgeError::Internal(format!(
            "{} exited with unrecognised code {}",
            ctx.name, ctx.exit_code
        )),
    }
}

/// The three argument templates a contrib module exposes, using the
/// named placeholders `{input_file}`, `{output_file}`, `{answer_file}`,
/// `{batch_no}` (spec §6).
pub struct ArgsFormat {
    pub checker: &'static str,
    pub interactor: &'static str,
    pub validator: &'static str,
}

pub trait ContribModule {
    fn name(&self) -> &'static str;
    fn args_format(&self) -> ArgsFormat;
    fn parse_return_code(&self, ctx: &ParseContext) -> Result<CheckerResult, JudgeError>;
}

/// Closed registry of contrib kinds, selected by the problem's
/// `type` config string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContribKind {
    Default,
    Testlib,
    Cms,
    Themis,
}

impl ContribKind {
    pub fn by_name(name: &str) -> Option<ContribKind> {
        match name {
            "default" => Some(ContribKind::Default),
            "testlib" => Some(ContribKind::Testlib),
            "cms" => Some(ContribKind::Cms),
            "themis" => Some(ContribKind::Themis),
            _ => None,
        }
    }

    pub fn args_format(&self) -> ArgsFormat {
        match self {
            ContribKind::Default => default::DefaultContrib.args_format(),
            ContribKind::Testlib => testlib::TestlibContrib.args_format(),
            ContribKind::Cms => cms::CmsContrib.args_format(),
            ContribKind::Themis => themis::ThemisContrib.args_format(),
        }
    }

    fn parse_return_code_raw(&self, ctx: &ParseContext) -> Result<CheckerResult, JudgeError> {
        match self {
            ContribKind::Default => default::DefaultContrib.parse_return_code(ctx),
            ContribKind::Testlib => testlib::TestlibContrib.parse_return_code(ctx),
            ContribKind::Cms => cms::CmsContrib.parse_return_code(ctx),
            ContribKind::Themis => themis::ThemisContrib.parse_return_code(ctx),
        }
    }
}

/// The `catch_internal_error` adapter: run a contrib module's
/// `parse_return_code`, and if it reports an internal error, fold that
/// into the generic "Checker exitcode N" result instead of propagating
/// it as a hard failure. Any other error kind propagates unchanged --
/// only `Internal` is a contrib-boundary control-flow signal.
pub fn run_parse_return_code(kind: ContribKind, ctx: &ParseContext) -> Result<CheckerResult, JudgeError> {
    match kind.parse_return_code_raw(ctx) {
        Ok(result) => Ok(result),
        Err(JudgeError::Internal(detail)) => Ok(CheckerResult::failed(
            format!("Checker exitcode {}", ctx.exit_code),
            detail,
        )),
        Err(other) => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_resolves_known_names() {
        assert_eq!(ContribKind::by_name("testlib"), Some(ContribKind::Testlib));
        assert_eq!(ContribKind::by_name("unknown"), None);
    }

    fn ctx(exit_code: i32) -> ParseContext<'static> {
        ParseContext {
            exit_code,
            point_value: 10.0,
            feedback: "",
            extended_feedback: "",
            name: "checker",
            stderr: b"",
            treat_checker_points_as_percentage: false,
            process: ProcessOutcome {
                name: "checker".to_string(),
                timed_out: false,
                memory_exceeded: false,
                protection_fault: None,
                exit_code: Some(exit_code),
                signal: None,
                stderr_feedback: None,
                time_limit_secs: 1.0,
                memory_limit_kb: 65536,
            },
        }
    }

    #[test]
    fn unrecognised_exit_code_becomes_generic_checker_exitcode_result() {
        // default only recognises 0 (AC) and 1 (WA); exit 5 is unmapped
        // and becomes an internal error, adapted into a "Checker exitcode"
        // result by `run_parse_return_code` instead of propagating.
        let result = run_parse_return_code(ContribKind::Default, &ctx(5)).unwrap();
        assert!(!result.passed);
        assert_eq!(result.points, 0.0);
        assert_eq!(result.feedback.as_deref(), Some("Checker exitcode 5"));
    }
}
