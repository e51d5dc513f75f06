//! Whitespace-tolerant token and line comparators.

use crate::result::CheckerResult;

/// Split on any run of whitespace, dropping empty tokens; equal token
/// sequences pass regardless of spacing or line breaks.
pub fn standard(process_output: &[u8], judge_output: &[u8], point_value: f64) -> CheckerResult {
    let process = String::from_utf8_lossy(process_output);
    let judge = String::from_utf8_lossy(judge_output);

    let process_tokens: Vec<&str> = process.split_whitespace().collect();
    let judge_tokens: Vec<&str> = judge.split_whitespace().collect();

    CheckerResult::from_bool(process_tokens == judge_tokens, point_value)
}

/// Split on line terminators, discard trailing blank lines, then compare
/// line-by-line after trimming trailing whitespace from each line.
pub fn linecount(process_output: &[u8], judge_output: &[u8], point_value: f64) -> CheckerResult {
    let process = String::from_utf8_lossy(process_output);
    let judge = String::from_utf8_lossy(judge_output);

    let passed = trimmed_lines(&process) == trimmed_lines(&judge);
    CheckerResult::from_bool(passed, point_value)
}

fn trimmed_lines(s: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = s.lines().map(|l| l.trim_end()).collect();
    while matches!(lines.last(), Some(l) if l.is_empty()) {
        lines.pop();
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_is_whitespace_invariant() {
        let result = standard(b" 1  2 3 \n\n", b"1 2 3\n", 10.0);
        assert!(result.passed);
        assert_eq!(result.points, 10.0);
    }

    #[test]
    fn standard_rejects_token_mismatch() {
        let result = standard(b"1 2 4", b"1 2 3", 10.0);
        assert!(!result.passed);
        assert_eq!(result.points, 0.0);
    }

    #[test]
    fn linecount_trims_trailing_whitespace_and_blank_lines() {
        let result = linecount(b"a \nb\n\n", b"a\nb", 5.0);
        assert!(result.passed);
    }

    #[test]
    fn linecount_rejects_different_line_content() {
        let result = linecount(b"a\nc\n", b"a\nb\n", 5.0);
        assert!(!result.passed);
    }
}
