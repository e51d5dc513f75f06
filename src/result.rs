//! Per-case result model.
//!
//! `Result` is created at case start, mutated only by the owning grader,
//! and handed off read-only once the case finishes. `ResultFlag` bits are
//! fixed by the controller contract, so their numeric values must never
//! be renumbered.

use serde::{Deserialize, Serialize};

/// Bitset over the case outcome. Absence of every bit denotes AC; the
/// hard-failure bits (TLE/MLE/OLE/RTE/IR) are sticky once set -- a grader
/// never clears one after it has been OR'd in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResultFlag(pub u16);

impl ResultFlag {
    pub const AC: u16 = 0;
    pub const WA: u16 = 1 << 0;
    pub const TLE: u16 = 1 << 1;
    pub const MLE: u16 = 1 << 2;
    pub const OLE: u16 = 1 << 3;
    pub const RTE: u16 = 1 << 4;
    pub const IR: u16 = 1 << 5;
    pub const IE: u16 = 1 << 6;
    pub const SC: u16 = 1 << 7;

    pub fn none() -> Self {
        ResultFlag(0)
    }

    pub fn is_ac(&self) -> bool {
        self.0 == Self::AC
    }

    pub fn has(&self, bit: u16) -> bool {
        self.0 & bit != 0
    }

    pub fn set(&mut self, bit: u16) {
        self.0 |= bit;
    }

    pub fn union(self, other: ResultFlag) -> ResultFlag {
        ResultFlag(self.0 | other.0)
    }
}

/// Voluntary/involuntary context switch counters, when the sandbox reports
/// them.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ContextSwitches {
    pub voluntary: u64,
    pub involuntary: u64,
}

/// One case's outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResult {
    pub result_flag: ResultFlag,
    /// CPU time, seconds.
    pub execution_time: f64,
    /// Wall-clock time, seconds.
    pub wall_clock_time: f64,
    /// Peak memory, KB.
    pub max_memory: u64,
    pub points: f64,
    pub total_points: f64,
    #[serde(with = "serde_bytes_as_string")]
    pub proc_output: Vec<u8>,
    pub feedback: Option<String>,
    pub extended_feedback: Option<String>,
    pub context_switches: ContextSwitches,
    pub runtime_version: Option<String>,
}

impl CaseResult {
    pub fn new(total_points: f64) -> Self {
        Self {
            result_flag: ResultFlag::none(),
            execution_time: 0.0,
            wall_clock_time: 0.0,
            max_memory: 0,
            points: 0.0,
            total_points,
            proc_output: Vec::new(),
            feedback: None,
            extended_feedback: None,
            context_switches: ContextSwitches::default(),
            runtime_version: None,
        }
    }

    /// Fold a sibling process's result into this one, per the communication
    /// grader's aggregation rule (spec §4.F): CPU time sums, wall time
    /// takes the max, memory sums, flags OR together.
    pub fn merge(&mut self, other: &CaseResult) {
        self.execution_time += other.execution_time;
        self.wall_clock_time = self.wall_clock_time.max(other.wall_clock_time);
        self.max_memory += other.max_memory;
        self.result_flag = self.result_flag.union(other.result_flag);
    }

    /// Apply a checker verdict: OR the AC/WA bit in, copy points and
    /// feedback. Called only when no hard flag is already set.
    pub fn apply_checker(&mut self, checker: &CheckerResult) {
        self.result_flag
            .set(if checker.passed { ResultFlag::AC } else { ResultFlag::WA });
        self.points = checker.points;
        self.feedback = checker.feedback.clone();
        self.extended_feedback = checker.extended_feedback.clone();
    }
}

/// Value returned by a checker or contrib module.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckerResult {
    pub passed: bool,
    pub points: f64,
    pub feedback: Option<String>,
    pub extended_feedback: Option<String>,
}

impl CheckerResult {
    pub fn new(passed: bool, points: f64) -> Self {
        Self {
            passed,
            points,
            feedback: None,
            extended_feedback: None,
        }
    }

    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = Some(feedback.into());
        self
    }

    pub fn with_extended_feedback(mut self, extended: impl Into<String>) -> Self {
        self.extended_feedback = Some(extended.into());
        self
    }

    /// A boolean return from a pure checker coerces to this: full points
    /// on pass, zero otherwise (spec §4.E step 4).
    pub fn from_bool(passed: bool, point_value: f64) -> Self {
        CheckerResult::new(passed, if passed { point_value } else { 0.0 })
    }

    pub fn failed(feedback: impl Into<String>, extended_feedback: impl Into<String>) -> Self {
        CheckerResult::new(false, 0.0)
            .with_feedback(feedback)
            .with_extended_feedback(extended_feedback)
    }
}

/// `proc_output`/feedback bytes are frequently not valid UTF-8 (binary
/// submission output); store as a lossily-decoded string in JSON and keep
/// the raw bytes in memory everywhere else.
mod serde_bytes_as_string {
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&String::from_utf8_lossy(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        Ok(s.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ac_has_no_flag_bits() {
        assert!(ResultFlag::none().is_ac());
        let mut flag = ResultFlag::none();
        flag.set(ResultFlag::WA);
        assert!(!flag.is_ac());
    }

    #[test]
    fn merge_sums_time_and_memory_maxes_wall_clock() {
        let mut a = CaseResult::new(100.0);
        a.execution_time = 0.7;
        a.wall_clock_time = 0.8;
        a.max_memory = 1000;

        let mut b = CaseResult::new(100.0);
        b.execution_time = 0.6;
        b.wall_clock_time = 0.5;
        b.max_memory = 2000;
        b.result_flag.set(ResultFlag::RTE);

        a.merge(&b);

        assert!((a.execution_time - 1.3).abs() < 1e-9);
        assert!((a.wall_clock_time - 0.8).abs() < 1e-9);
        assert_eq!(a.max_memory, 3000);
        assert!(a.result_flag.has(ResultFlag::RTE));
    }

    #[test]
    fn apply_checker_sets_ac_bit_on_pass() {
        let mut result = CaseResult::new(10.0);
        result.apply_checker(&CheckerResult::new(true, 10.0));
        assert!(result.result_flag.is_ac());
        assert_eq!(result.points, 10.0);
    }
}
