//! The `default` contrib module: AC on exit 0, WA on exit 1, anything
//! else is a helper-file failure.

use crate::error::JudgeError;
use crate::result::CheckerResult;

use super::{unrecognised_exit_code, ArgsFormat, ContribModule, ParseContext};

pub struct DefaultContrib;

impl ContribModule for DefaultContrib {
    fn name(&self) -> &'static str {
        "default"
    }

    fn args_format(&self) -> ArgsFormat {
        ArgsFormat {
            checker: "{input_file} {answer_file} {output_file}",
            interactor: "{input_file} {answer_file} {output_file}",
            validator: "",
        }
    }

    fn parse_return_code(&self, ctx: &ParseContext) -> Result<CheckerResult, JudgeError> {
        match ctx.exit_code {
            0 => Ok(CheckerResult::new(true, ctx.point_value)
                .with_extended_feedback(ctx.extended_feedback.to_string())),
            1 => Ok(CheckerResult::new(false, 0.0)
                .with_extended_feedback(ctx.extended_feedback.to_string())),
            _ => Err(unrecognised_exit_code(ctx)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper_errors::ProcessOutcome;

    fn ctx(exit_code: i32) -> ParseContext<'static> {
        ParseContext {
            exit_code,
            point_value: 10.0,
            feedback: "",
            extended_feedback: "all good",
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
    fn exit_zero_is_ac() {
        let result = DefaultContrib.parse_return_code(&ctx(0)).unwrap();
        assert!(result.passed);
        assert_eq!(result.points, 10.0);
    }

    #[test]
    fn exit_one_is_wa() {
        let result = DefaultContrib.parse_return_code(&ctx(1)).unwrap();
        assert!(!result.passed);
        assert_eq!(result.points, 0.0);
    }

    #[test]
    fn other_exit_codes_are_internal_errors() {
        assert!(DefaultContrib.parse_return_code(&ctx(2)).is_err());
    }
}
