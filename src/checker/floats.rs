//! Float-tolerant line/token comparator (`floats` and `floatsrel`).

use crate::format_feedback::ordinal;
use crate::result::CheckerResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMode {
    Absolute,
    Relative,
    Default,
}

pub fn verify_absolute(p: f64, j: f64, eps: f64) -> bool {
    (p - j).abs() <= eps
}

pub fn error_absolute(p: f64, j: f64) -> f64 {
    (p - j).abs()
}

pub fn verify_relative(p: f64, j: f64, eps: f64) -> bool {
    let p1 = (j * (1.0 - eps)).min(j * (1.0 + eps));
    let p2 = (j * (1.0 - eps)).max(j * (1.0 + eps));
    p1 <= p && p <= p2
}

pub fn error_relative(p: f64, j: f64) -> f64 {
    let absolute = (p - j).abs();
    if j.abs() > 1e-9 {
        (absolute / j).abs()
    } else {
        absolute
    }
}

pub fn verify_default(p: f64, j: f64, eps: f64) -> bool {
    verify_absolute(p, j, eps) || (j.abs() >= eps && (1.0 - p / j).abs() <= eps)
}

pub fn error_default(p: f64, j: f64) -> f64 {
    let absolute = (p - j).abs();
    if j.abs() > 1e-9 {
        absolute.min((absolute / j).abs())
    } else {
        absolute
    }
}

fn verify(mode: ErrorMode, p: f64, j: f64, eps: f64) -> bool {
    match mode {
        ErrorMode::Absolute => verify_absolute(p, j, eps),
        ErrorMode::Relative => verify_relative(p, j, eps),
        ErrorMode::Default => verify_default(p, j, eps),
    }
}

fn error(mode: ErrorMode, p: f64, j: f64) -> f64 {
    match mode {
        ErrorMode::Absolute => error_absolute(p, j),
        ErrorMode::Relative => error_relative(p, j),
        ErrorMode::Default => error_default(p, j),
    }
}

/// Non-empty lines, split on any `\r` or `\n`.
fn non_empty_lines(s: &str) -> Vec<&str> {
    s.split(['\r', '\n']).filter(|l| !l.is_empty()).collect()
}

pub struct FloatCheckOptions {
    pub point_value: f64,
    pub precision: u32,
    pub error_mode: ErrorMode,
}

impl Default for FloatCheckOptions {
    fn default() -> Self {
        Self {
            point_value: 0.0,
            precision: 6,
            error_mode: ErrorMode::Default,
        }
    }
}

pub fn floats_check(
    process_output: &[u8],
    judge_output: &[u8],
    opts: &FloatCheckOptions,
) -> CheckerResult {
    let process = String::from_utf8_lossy(process_output);
    let judge = String::from_utf8_lossy(judge_output);

    let process_lines = non_empty_lines(&process);
    let judge_lines = non_empty_lines(&judge);

    if process_lines.len() != judge_lines.len() {
        return CheckerResult::new(false, 0.0)
            .with_feedback("Presentation Error")
            .with_extended_feedback(format!(
                "Judge output's has {} non-empty line(s), participant's output has {}",
                judge_lines.len(),
                process_lines.len()
            ));
    }

    let epsilon = 10f64.powi(-(opts.precision as i32));
    let display_precision = (opts.precision + 2) as usize;
    let mut token_count = 0usize;

    for (line_no, (judge_line, process_line)) in
        judge_lines.iter().zip(process_lines.iter()).enumerate()
    {
        let judge_tokens: Vec<&str> = judge_line.split_whitespace().collect();
        let process_tokens: Vec<&str> = process_line.split_whitespace().collect();

        if judge_tokens.len() != process_tokens.len() {
            return CheckerResult::new(false, 0.0)
                .with_feedback("Presentation Error")
                .with_extended_feedback(format!(
                    "{} line differs, judge's output has {} token(s), participant's output has {}",
                    ordinal(line_no + 1),
                    judge_tokens.len(),
                    process_tokens.len()
                ));
        }

        for (judge_token, process_token) in judge_tokens.iter().zip(process_tokens.iter()) {
            token_count += 1;
            let judge_float: Option<f64> = judge_token.parse().ok();

            let j = match judge_float {
                None => {
                    if judge_token == process_token {
                        continue;
                    }
                    return CheckerResult::new(false, 0.0).with_extended_feedback(format!(
                        "{} token differs - expected: '{}', found: '{}'",
                        ordinal(token_count),
                        judge_token,
                        process_token
                    ));
                }
                Some(j) => j,
            };

            let process_float: Option<f64> = process_token.parse().ok();
            let p = match process_float {
                None => {
                    return CheckerResult::new(false, 0.0).with_extended_feedback(format!(
                        "{} token differs - expected float: '{}', found: '{}'",
                        ordinal(token_count),
                        judge_token,
                        process_token
                    ));
                }
                Some(p) => p,
            };

            if p.is_nan() || !verify(opts.error_mode, p, j, epsilon) {
                return CheckerResult::new(false, 0.0).with_extended_feedback(format!(
                    "{} number differs - expected: '{:.*}', found: '{:.*}', error = '{:.*}'",
                    ordinal(token_count),
                    display_precision,
                    j,
                    display_precision,
                    p,
                    display_precision,
                    error(opts.error_mode, p, j)
                ));
            }
        }
    }

    CheckerResult::new(true, opts.point_value)
        .with_extended_feedback(format!("{} token(s)", token_count))
}

pub fn floats(process_output: &[u8], judge_output: &[u8], point_value: f64) -> CheckerResult {
    floats_check(
        process_output,
        judge_output,
        &FloatCheckOptions {
            point_value,
            ..Default::default()
        },
    )
}

pub fn floatsrel(process_output: &[u8], judge_output: &[u8], point_value: f64) -> CheckerResult {
    floats_check(
        process_output,
        judge_output,
        &FloatCheckOptions {
            point_value,
            error_mode: ErrorMode::Relative,
            ..Default::default()
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reflexivity() {
        for j in [0.0, 1.0, -3.5, 1e9, 1e-9] {
            assert!(verify_default(j, j, 1e-6));
        }
    }

    #[test]
    fn nan_is_always_rejected() {
        assert!(!verify_absolute(f64::NAN, 1.0, 1e-6));
        assert!(!verify_relative(f64::NAN, 1.0, 1e-6));
        assert!(!verify_default(f64::NAN, 1.0, 1e-6));
    }

    #[test]
    fn relative_mode_accepts_small_relative_error() {
        let result = floatsrel(b"1.0000001\n", b"1.0000000\n", 10.0);
        assert!(result.passed);
    }

    #[test]
    fn mismatched_line_count_is_presentation_error() {
        let result = floats(b"1 2\n", b"1\n2\n", 10.0);
        assert!(!result.passed);
        assert_eq!(result.feedback.as_deref(), Some("Presentation Error"));
        let extended = result.extended_feedback.unwrap();
        assert!(extended.contains('2'));
        assert!(extended.contains('1'));
    }

    #[test]
    fn non_float_tokens_must_match_exactly() {
        let result = floats(b"abc\n", b"abc\n", 10.0);
        assert!(result.passed);
        let result = floats(b"abd\n", b"abc\n", 10.0);
        assert!(!result.passed);
    }
}
