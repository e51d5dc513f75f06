//! The `testlib` contrib module: exit codes `0`=AC, `1`=WA, `2`=PE, `3`=IE,
//! `7`=PARTIAL. On `PARTIAL` a `points <f>` line is read from stderr.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::JudgeError;
use crate::result::CheckerResult;

use super::{unrecognised_exit_code, ArgsFormat, ContribModule, ParseContext};

fn points_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^points\s+([-+]?[0-9]*\.?[0-9]+([eE][-+]?[0-9]+)?)").unwrap()
    })
}

pub struct TestlibContrib;

mod exit_codes {
    pub const AC: i32 = 0;
    pub const WA: i32 = 1;
    pub const PE: i32 = 2;
    pub const IE: i32 = 3;
    pub const PARTIAL: i32 = 7;
}

impl ContribModule for TestlibContrib {
    fn name(&self) -> &'static str {
        "testlib"
    }

    fn args_format(&self) -> ArgsFormat {
        ArgsFormat {
            checker: "{input_file} {answer_file} {output_file}",
            interactor: "{input_file} {output_file} {answer_file}",
            validator: "--group st{batch_no}",
        }
    }

    fn parse_return_code(&self, ctx: &ParseContext) -> Result<CheckerResult, JudgeError> {
        match ctx.exit_code {
            exit_codes::AC => Ok(CheckerResult::new(true, ctx.point_value)
                .with_extended_feedback(ctx.extended_feedback.to_string())),
            exit_codes::WA => Ok(CheckerResult::new(false, 0.0)
                .with_extended_feedback(ctx.extended_feedback.to_string())),
            exit_codes::PE => Ok(CheckerResult::new(false, 0.0)
                .with_feedback("Presentation Error")
                .with_extended_feedback(ctx.extended_feedback.to_string())),
            exit_codes::IE => Err(JudgeError::internal(format!(
                "testlib checker reported an internal error: {}",
                ctx.extended_feedback
            ))),
            exit_codes::PARTIAL => {
                let captures = points_re().captures(ctx.extended_feedback).ok_or_else(|| {
                    JudgeError::internal(format!(
                        "testlib checker exited PARTIAL without a 'points <f>' line in stderr: {:?}",
                        ctx.extended_feedback
                    ))
                })?;
                let raw: f64 = captures[1].parse().map_err(|_| {
                    JudgeError::internal(format!(
                        "testlib checker's 'points' line did not parse as a float: {:?}",
                        &captures[1]
                    ))
                })?;

                let awarded = if ctx.treat_checker_points_as_percentage {
                    if !(0.0..=100.0).contains(&raw) {
                        return Err(JudgeError::internal(format!(
                            "testlib checker's 'points' percentage {} is outside [0, 100]",
                            raw
                        )));
                    }
                    raw * ctx.point_value / 100.0
                } else {
                    if !(0.0..=ctx.point_value).contains(&raw) {
                        return Err(JudgeError::internal(format!(
                            "testlib checker's 'points' value {} is outside [0, {}]",
                            raw, ctx.point_value
                        )));
                    }
                    raw
                };

                Ok(CheckerResult::new(true, awarded)
                    .with_extended_feedback(ctx.extended_feedback.to_string()))
            }
            _ => Err(unrecognised_exit_code(ctx)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper_errors::ProcessOutcome;

    fn ctx(exit_code: i32, extended_feedback: &'static str, as_pct: bool) -> ParseContext<'static> {
        ParseContext {
            exit_code,
            point_value: 100.0,
            feedback: "",
            extended_feedback,
            name: "checker",
            stderr: extended_feedback.as_bytes(),
            treat_checker_points_as_percentage: as_pct,
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
    fn partial_as_raw_points() {
        let result = TestlibContrib
            .parse_return_code(&ctx(7, "points 42\n", false))
            .unwrap();
        assert!(result.passed);
        assert_eq!(result.points, 42.0);
    }

    #[test]
    fn partial_as_percentage() {
        let result = TestlibContrib
            .parse_return_code(&ctx(7, "points 42\n", true))
            .unwrap();
        assert!(result.passed);
        assert_eq!(result.points, 42.0);
    }

    #[test]
    fn one_point_zero_partial_as_fraction_of_one() {
        // spec scenario 5: point_value=1.0, treat as raw points.
        let result = TestlibContrib
            .parse_return_code(&ParseContext {
                point_value: 1.0,
                ..ctx(7, "points 0.5\n", false)
            })
            .unwrap();
        assert!(result.passed);
        assert_eq!(result.points, 0.5);
    }

    #[test]
    fn presentation_error_on_exit_two() {
        let result = TestlibContrib.parse_return_code(&ctx(2, "bad format", false)).unwrap();
        assert!(!result.passed);
        assert_eq!(result.feedback.as_deref(), Some("Presentation Error"));
    }

    #[test]
    fn internal_error_on_exit_three() {
        assert!(TestlibContrib.parse_return_code(&ctx(3, "assertion failed", false)).is_err());
    }

    #[test]
    fn partial_without_points_line_is_internal_error() {
        assert!(TestlibContrib.parse_return_code(&ctx(7, "no points here", false)).is_err());
    }

    #[test]
    fn partial_accepts_scientific_notation() {
        let result = TestlibContrib
            .parse_return_code(&ctx(7, "points 5e1\n", false))
            .unwrap();
        assert!(result.passed);
        assert_eq!(result.points, 50.0);
    }

    #[test]
    fn partial_points_above_point_value_is_internal_error() {
        assert!(TestlibContrib
            .parse_return_code(&ctx(7, "points 500\n", false))
            .is_err());
    }

    #[test]
    fn partial_percentage_above_100_is_internal_error() {
        assert!(TestlibContrib
            .parse_return_code(&ctx(7, "points 150\n", true))
            .is_err());
    }

    #[test]
    fn partial_zero_points_still_passes() {
        let result = TestlibContrib
            .parse_return_code(&ctx(7, "points 0\n", false))
            .unwrap();
        assert!(result.passed);
        assert_eq!(result.points, 0.0);
    }
}
