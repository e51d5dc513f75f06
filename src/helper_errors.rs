//! Helper-file error translator (component G's supporting piece).
//!
//! Given a finished auxiliary process (checker, interactor, validator,
//! manager) that did not exit cleanly, produce a human-readable internal
//! failure message. The ptrace-based syscall filter that would report a
//! disallowed-syscall fault lives outside this crate; the
//! `protection_fault` branch is kept for contract fidelity but our own
//! auxiliary-process outcomes never populate it.
use nix::sys::signal::Signal;

/// What actually happened to the finished process, as reported by the
/// sandbox/trusted runner -- independent of which contrib module is
/// asking.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub name: String,
    pub timed_out: bool,
    pub memory_exceeded: bool,
    pub protection_fault: Option<(i64, String)>,
    pub exit_code: Option<i32>,
    pub signal: Option<i32>,
    pub stderr_feedback: Option<String>,
    pub time_limit_secs: f64,
    pub memory_limit_kb: u64,
}

fn portable_signal_name(signal: i32) -> String {
    match Signal::try_from(signal) {
        Ok(sig) => sig.as_str().to_string(),
        Err(_) => format!("signal {}", signal),
    }
}

/// Returns `Some(message)` describing the failure, or `None` if the
/// process actually succeeded and there is nothing to translate.
pub fn translate(outcome: &ProcessOutcome) -> Option<String> {
    if outcome.timed_out {
        return Some(format!(
            "{} timed out (> {} seconds)",
            outcome.name, outcome.time_limit_secs
        ));
    }

    if outcome.memory_exceeded {
        return Some(format!(
            "{} ran out of memory (> {} KB)",
            outcome.name, outcome.memory_limit_kb
        ));
    }

    if let Some((syscall, ref callname)) = outcome.protection_fault {
        return Some(format!(
            "{} invoked disallowed syscall {} ({})",
            outcome.name, syscall, callname
        ));
    }

    if let Some(code) = outcome.exit_code {
        if code != 0 {
            let mut message = format!("{} exited with nonzero code {}", outcome.name, code);
            if let Some(ref feedback) = outcome.stderr_feedback {
                if !feedback.is_empty() {
                    message.push_str(&format!(" with feedback {}", feedback));
                }
            }
            return Some(message);
        }
        return None;
    }

    if let Some(signal) = outcome.signal {
        return Some(format!(
            "{} exited with {}",
            outcome.name,
            portable_signal_name(signal)
        ));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(name: &str) -> ProcessOutcome {
        ProcessOutcome {
            name: name.to_string(),
            timed_out: false,
            memory_exceeded: false,
            protection_fault: None,
            exit_code: Some(0),
            signal: None,
            stderr_feedback: None,
            time_limit_secs: 1.0,
            memory_limit_kb: 65536,
        }
    }

    #[test]
    fn success_translates_to_none() {
        assert!(translate(&base("checker")).is_none());
    }

    #[test]
    fn tle_is_reported_first() {
        let mut outcome = base("checker");
        outcome.timed_out = true;
        outcome.exit_code = None;
        assert_eq!(
            translate(&outcome).unwrap(),
            "checker timed out (> 1 seconds)"
        );
    }

    #[test]
    fn nonzero_exit_includes_feedback() {
        let mut outcome = base("checker");
        outcome.exit_code = Some(2);
        outcome.stderr_feedback = Some("assertion failed".to_string());
        assert_eq!(
            translate(&outcome).unwrap(),
            "checker exited with nonzero code 2 with feedback assertion failed"
        );
    }

    #[test]
    fn death_by_signal_uses_portable_name() {
        let mut outcome = base("checker");
        outcome.exit_code = None;
        outcome.signal = Some(11); // SIGSEGV
        let message = translate(&outcome).unwrap();
        assert!(message.contains("checker exited with"));
        assert!(message.to_uppercase().contains("SEGV"));
    }
}
