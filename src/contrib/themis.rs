//! The `themis` contrib module: exit `0`=AC. On AC the last line of
//! extended feedback (checker stderr) is a float multiplier of the case's
//! point value. Every other exit code delegates to the helper-file error
//! translator (spec §4.G) rather than owning its own exit-code table.

use crate::error::JudgeError;
use crate::result::CheckerResult;

use super::{unrecognised_exit_code, ArgsFormat, ContribModule, ParseContext};

mod exit_codes {
    pub const AC: i32 = 0;
}

/// Deliberately unclamped: the source does not range-check the
/// multiplier it reads off the last extended-feedback line (see
/// DESIGN.md, Open Question on themis partial credit). A rogue checker
/// can award more or less than `point_value`; that is preserved rather
/// than silently clamped.
fn last_line_multiplier(extended_feedback: &str) -> Option<f64> {
    extended_feedback
        .lines()
        .filter(|l| !l.trim().is_empty())
        .last()?
        .trim()
        .parse()
        .ok()
}

pub struct ThemisContrib;

impl ContribModule for ThemisContrib {
    fn name(&self) -> &'static str {
        "themis"
    }

    fn args_format(&self) -> ArgsFormat {
        ArgsFormat {
            checker: "",
            interactor: "",
            validator: "",
        }
    }

    fn parse_return_code(&self, ctx: &ParseContext) -> Result<CheckerResult, JudgeError> {
        if ctx.exit_code != exit_codes::AC {
            return Err(unrecognised_exit_code(ctx));
        }

        let multiplier = last_line_multiplier(ctx.extended_feedback).ok_or_else(|| {
            JudgeError::internal(format!(
                "themis checker exited AC but its last feedback line isn't a float: {:?}",
                ctx.extended_feedback
            ))
        })?;

        let awarded = multiplier * ctx.point_value;
        Ok(CheckerResult::new(awarded >= 1e-6, awarded)
            .with_extended_feedback(ctx.extended_feedback.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper_errors::ProcessOutcome;

    fn ctx(exit_code: i32, extended: &'static str) -> ParseContext<'static> {
        ParseContext {
            exit_code,
            point_value: 10.0,
            feedback: "",
            extended_feedback: extended,
            name: "checker",
            stderr: extended.as_bytes(),
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
    fn full_multiplier_is_ac() {
        let result = ThemisContrib.parse_return_code(&ctx(0, "ok\n1.0\n")).unwrap();
        assert!(result.passed);
        assert_eq!(result.points, 10.0);
    }

    #[test]
    fn sub_threshold_multiplier_is_not_passed() {
        let result = ThemisContrib.parse_return_code(&ctx(0, "0.0000001\n")).unwrap();
        assert!(!result.passed);
    }

    #[test]
    fn multiplier_above_one_is_not_clamped() {
        let result = ThemisContrib.parse_return_code(&ctx(0, "1.5\n")).unwrap();
        assert_eq!(result.points, 15.0);
    }

    #[test]
    fn non_ac_delegates_to_helper_translator() {
        let mut c = ctx(1, "");
        c.process.exit_code = Some(1);
        let err = ThemisContrib.parse_return_code(&c).unwrap_err();
        assert!(matches!(err, JudgeError::Internal(_)));
    }
}
