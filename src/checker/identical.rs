//! Byte-exact comparator with an optional presentation-error fallback.

use super::standard::standard;
use crate::result::CheckerResult;

/// Byte-exact; if unequal but `standard` would pass, report a
/// presentation error instead of a flat wrong answer (suppressible via
/// `pe_allowed = false`).
pub fn identical(
    process_output: &[u8],
    judge_output: &[u8],
    point_value: f64,
    pe_allowed: bool,
) -> CheckerResult {
    if process_output == judge_output {
        return CheckerResult::new(true, point_value);
    }

    if pe_allowed && standard(process_output, judge_output, point_value).passed {
        return CheckerResult::new(false, 0.0)
            .with_feedback("Presentation Error, check your whitespace");
    }

    CheckerResult::new(false, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_passes() {
        let result = identical(b"a\nb\nc", b"a\nb\nc", 10.0, true);
        assert!(result.passed);
    }

    #[test]
    fn whitespace_only_difference_is_pe_when_allowed() {
        let result = identical(b"a\nb\nc\n", b"a\nb\nc", 10.0, true);
        assert!(!result.passed);
        assert_eq!(
            result.feedback.as_deref(),
            Some("Presentation Error, check your whitespace")
        );
    }

    #[test]
    fn whitespace_only_difference_is_plain_wa_when_pe_disallowed() {
        let result = identical(b"a\nb\nc\n", b"a\nb\nc", 10.0, false);
        assert!(!result.passed);
        assert_eq!(result.feedback, None);
    }

    #[test]
    fn genuinely_different_content_is_wa_not_pe() {
        let result = identical(b"a\nb\nd", b"a\nb\nc", 10.0, true);
        assert!(!result.passed);
        assert_eq!(result.feedback, None);
    }
}
