//! Error kinds for the grading core.
//!
//! Replaces the upstream `InternalError`/`CompileError`-as-exceptions
//! control flow with explicit sum types: a contrib module that would have
//! raised `InternalError` instead returns `Err(JudgeError::Internal(..))`,
//! and the outer `catch_internal_error` guard becomes a `.map_err`/`match`
//! adapter at the contrib boundary (see `contrib::run_parse_return_code`).

use thiserror::Error;

/// Errors surfaced while grading a single case or compiling a submission.
#[derive(Debug, Error, Clone)]
pub enum JudgeError {
    /// A pure checker panicked or failed to parse its inputs. The case
    /// continues: this becomes `CheckerResult::failed("Checker error", ..)`.
    #[error("checker error: {0}")]
    Checker(String),

    /// Contrib parse failure, unknown contrib/checker type, missing
    /// config, or a malformed partial-credit token. Aborts the current
    /// case with the IE flag set.
    #[error("internal error: {0}")]
    Internal(String),

    /// An auxiliary process (checker/interactor/validator) died
    /// abnormally; see `helper_errors::translate`.
    #[error("helper-file failure: {0}")]
    HelperFile(String),

    /// The submission or an auxiliary program failed to compile. The
    /// submission terminates; no cases run.
    #[error("compile error: {0}")]
    Compile(String),
}

impl JudgeError {
    pub fn internal(msg: impl Into<String>) -> Self {
        JudgeError::Internal(msg.into())
    }

    pub fn checker(msg: impl Into<String>) -> Self {
        JudgeError::Checker(msg.into())
    }

    pub fn compile(msg: impl Into<String>) -> Self {
        JudgeError::Compile(msg.into())
    }
}
