//! Pure checkers: `(process_output, judge_output, options) -> CheckerResult`.
//!
//! These never spawn a process; `bridged` (component D) is the seam where
//! an external checker program is compiled and run, with its exit state
//! interpreted by a `contrib` module (component C).

pub mod floats;
pub mod identical;
pub mod standard;

use crate::result::CheckerResult;
use floats::ErrorMode;

/// Options recognised by the stock checkers (spec's external checker
/// contract, §6).
#[derive(Debug, Clone)]
pub struct CheckerOptions {
    pub point_value: f64,
    pub precision: u32,
    pub error_mode: ErrorMode,
    pub pe_allowed: bool,
    pub feedback: bool,
    pub treat_checker_points_as_percentage: bool,
}

impl Default for CheckerOptions {
    fn default() -> Self {
        Self {
            point_value: 0.0,
            precision: 6,
            error_mode: ErrorMode::Default,
            pe_allowed: true,
            feedback: true,
            treat_checker_points_as_percentage: false,
        }
    }
}

/// Closed set of built-in comparators, selected by the case's `checker`
/// config string. An unrecognised string is not handled here -- that
/// falls through to the bridged external-checker path (component D),
/// the open interface for external comparators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checker {
    Standard,
    LineCount,
    Identical,
    Floats,
    FloatsRel,
}

impl Checker {
    /// Look up a checker by its registry name, as used in case config.
    pub fn by_name(name: &str) -> Option<Checker> {
        match name {
            "standard" => Some(Checker::Standard),
            "linecount" => Some(Checker::LineCount),
            "identical" => Some(Checker::Identical),
            "floats" => Some(Checker::Floats),
            "floatsrel" => Some(Checker::FloatsRel),
            _ => None,
        }
    }

    pub fn check(
        &self,
        process_output: &[u8],
        judge_output: &[u8],
        opts: &CheckerOptions,
    ) -> CheckerResult {
        match self {
            Checker::Standard => standard::standard(process_output, judge_output, opts.point_value),
            Checker::LineCount => {
                standard::linecount(process_output, judge_output, opts.point_value)
            }
            Checker::Identical => identical::identical(
                process_output,
                judge_output,
                opts.point_value,
                opts.pe_allowed,
            ),
            Checker::Floats | Checker::FloatsRel => {
                let error_mode = if *self == Checker::FloatsRel {
                    ErrorMode::Relative
                } else {
                    opts.error_mode
                };
                floats::floats_check(
                    process_output,
                    judge_output,
                    &floats::FloatCheckOptions {
                        point_value: opts.point_value,
                        precision: opts.precision,
                        error_mode,
                    },
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_resolves_known_names() {
        assert_eq!(Checker::by_name("standard"), Some(Checker::Standard));
        assert_eq!(Checker::by_name("floatsrel"), Some(Checker::FloatsRel));
        assert_eq!(Checker::by_name("not-a-checker"), None);
    }

    #[test]
    fn dispatch_matches_direct_call() {
        let opts = CheckerOptions {
            point_value: 5.0,
            ..Default::default()
        };
        let result = Checker::Standard.check(b"1 2 3", b" 1 2  3 ", &opts);
        assert!(result.passed);
        assert_eq!(result.points, 5.0);
    }
}
