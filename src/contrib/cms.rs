//! The `cms` contrib module: exit `0`=AC, `1`=WA. On AC the feedback
//! (checker stdout) carries a float in `[0, 1]` awarded as a fraction of
//! the case's point value.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::JudgeError;
use crate::result::CheckerResult;

use super::{ArgsFormat, ContribModule, ParseContext};

fn fraction_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(-?[0-9]*\.?[0-9]+)").unwrap())
}

mod exit_codes {
    pub const AC: i32 = 0;
}

/// Sentinel translate-phrases CMS checkers emit in extended feedback,
/// mapped to canonical English.
const TRANSLATIONS: &[(&str, &str)] = &[
    ("translate:success", "Output is correct"),
    ("translate:wrong", "Output isn't correct"),
    ("translate:partial", "Output is partially correct"),
];

/// Strip each sentinel phrase found anywhere in `extended_feedback`, and
/// report the canonical English for the last one matched as `feedback`.
/// Returns `(feedback, extended_feedback)`, either `None` if nothing
/// applies / nothing is left after stripping.
fn translate_sentinels(text: &str) -> (Option<String>, Option<String>) {
    let mut feedback = None;
    let mut remaining = text.to_string();
    for (sentinel, canonical) in TRANSLATIONS {
        if remaining.contains(sentinel) {
            feedback = Some((*canonical).to_string());
            remaining = remaining.replace(sentinel, "");
        }
    }
    let remaining = remaining.trim();
    let extended_feedback = if remaining.is_empty() {
        None
    } else {
        Some(remaining.to_string())
    };
    (feedback, extended_feedback)
}

pub struct CmsContrib;

impl ContribModule for CmsContrib {
    fn name(&self) -> &'static str {
        "cms"
    }

    fn args_format(&self) -> ArgsFormat {
        ArgsFormat {
            checker: "{input_file} {answer_file} {output_file}",
            interactor: "{input_file} {answer_file} {output_file}",
            validator: "",
        }
    }

    fn parse_return_code(&self, ctx: &ParseContext) -> Result<CheckerResult, JudgeError> {
        let (translated_feedback, translated_extended_feedback) =
            translate_sentinels(ctx.extended_feedback);

        match ctx.exit_code {
            exit_codes::AC => {
                let fraction: f64 = fraction_re()
                    .captures(ctx.feedback)
                    .and_then(|c| c.get(1))
                    .and_then(|m| m.as_str().parse().ok())
                    .ok_or_else(|| {
                        JudgeError::internal(format!(
                            "cms checker exited AC without a parseable fraction in feedback: {:?}",
                            ctx.feedback
                        ))
                    })?;
                if !(0.0..=1.0).contains(&fraction) {
                    return Err(JudgeError::internal(format!(
                        "cms checker's partial points {} is outside [0, 1]",
                        fraction
                    )));
                }
                let mut result =
                    CheckerResult::new(fraction != 0.0, fraction * ctx.point_value);
                result.feedback = translated_feedback;
                result.extended_feedback = translated_extended_feedback;
                Ok(result)
            }
            _ => {
                let mut result = CheckerResult::new(false, 0.0)
                    .with_feedback(format!("Checker exitcode {}", ctx.exit_code));
                result.extended_feedback = translated_extended_feedback;
                Ok(result)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper_errors::ProcessOutcome;

    fn ctx(exit_code: i32, feedback: &'static str, extended: &'static str) -> ParseContext<'static> {
        ParseContext {
            exit_code,
            point_value: 10.0,
            feedback,
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
    fn full_credit_on_fraction_one() {
        let result = CmsContrib.parse_return_code(&ctx(0, "1.0", "translate:success")).unwrap();
        assert!(result.passed);
        assert_eq!(result.points, 10.0);
        assert_eq!(result.feedback.as_deref(), Some("Output is correct"));
        assert_eq!(result.extended_feedback, None);
    }

    #[test]
    fn partial_fraction_scales_points() {
        let result = CmsContrib.parse_return_code(&ctx(0, "0.5", "half credit")).unwrap();
        assert!(result.passed);
        assert_eq!(result.points, 5.0);
        assert_eq!(result.extended_feedback.as_deref(), Some("half credit"));
    }

    #[test]
    fn zero_fraction_is_not_passed() {
        let result = CmsContrib.parse_return_code(&ctx(0, "0.0", "translate:wrong")).unwrap();
        assert!(!result.passed);
        assert_eq!(result.points, 0.0);
        assert_eq!(result.feedback.as_deref(), Some("Output isn't correct"));
    }

    #[test]
    fn wa_is_always_zero_points() {
        let result = CmsContrib.parse_return_code(&ctx(1, "", "translate:wrong")).unwrap();
        assert!(!result.passed);
        assert_eq!(result.feedback.as_deref(), Some("Checker exitcode 1"));
        assert_eq!(result.extended_feedback, None);
    }

    #[test]
    fn unparseable_ac_feedback_is_internal_error() {
        assert!(CmsContrib.parse_return_code(&ctx(0, "not a number", "")).is_err());
    }

    #[test]
    fn out_of_range_fraction_is_internal_error() {
        assert!(CmsContrib.parse_return_code(&ctx(0, "1.5", "")).is_err());
    }
}
