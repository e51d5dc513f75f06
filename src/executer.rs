use anyhow::Context;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionStatus {
    /// Program exited normally with given exit code
    Exited(i32),
    /// Time limit exceeded
    TimeLimitExceeded,
    /// Memory limit exceeded
    MemoryLimitExceeded,
    /// Killed by signal
    Signaled(i32),
    /// Runtime error (crash, etc.)
    RuntimeError,
    /// System/internal error
    SystemError,
}

#[derive(Debug)]
pub struct ExecutionOutcome {
    /// Execution status
    pub status: ExecutionStatus,
    /// CPU time used in milliseconds
    pub time_ms: u32,
    /// Memory used in KB
    pub memory_kb: u32,
    /// Stdout content (as string, may have UTF-8 conversion losses)
    pub stdout: String,
    /// Stdout content (as raw bytes, preserves binary data)
    pub stdout_bytes: Vec<u8>,
    /// Stderr content
    pub stderr: String,
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, ExecutionStatus::Exited(0))
    }

    /// Get exit code from status (0 if not applicable)
    pub fn exit_code(&self) -> i32 {
        match self.status {
            ExecutionStatus::Exited(code) => code,
            _ => -1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionLimits {
    /// Time limit in milliseconds
    pub time_ms: u32,
    /// Memory limit in MB
    pub memory_mb: u32,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            time_ms: 1000,
            memory_mb: 512,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionSpec {
    pub work_dir: std::path::PathBuf,
    pub command: Vec<String>,
    pub limits: ExecutionLimits,
    pub stdin: Option<String>,
    /// Directory to copy output files to after sandboxed execution
    pub copy_out_dir: Option<std::path::PathBuf>,
}

impl ExecutionSpec {
    pub fn new(work_dir: impl Into<std::path::PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            command: vec![],
            limits: ExecutionLimits::default(),
            stdin: None,
            copy_out_dir: None,
        }
    }
    pub fn with_command(mut self, command: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.command = command.into_iter().map(Into::into).collect();
        self
    }
    pub fn with_limits(mut self, limits: ExecutionLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }

    pub fn with_copy_out_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.copy_out_dir = Some(dir.into());
        self
    }
}

/// Run a trusted program (checker, validator, interactor) directly, without
/// an isolate box. Used for the checker/contrib and validator pipelines,
/// which trust their own auxiliary binaries and only need timing, not a
/// full resource sandbox.
pub async fn execute_trusted(spec: &ExecutionSpec) -> anyhow::Result<ExecutionOutcome> {
    if spec.command.is_empty() {
        return Err(anyhow::anyhow!("No command specified for execution"));
    }

    let program = &spec.command[0];
    let args = &spec.command[1..];

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(&spec.work_dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().context("failed to spawn trusted program")?;

    if let Some(input) = &spec.stdin {
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input.as_bytes()).await?;
        }
    } else {
        drop(child.stdin.take());
    }

    let timeout_secs = ((spec.limits.time_ms as f64) / 1000.0).ceil().max(1.0) as u64;
    let output = tokio::time::timeout(
        std::time::Duration::from_secs(timeout_secs),
        child.wait_with_output(),
    )
    .await;

    let output = match output {
        Ok(res) => res.context("failed to wait for trusted program")?,
        Err(_) => {
            return Ok(ExecutionOutcome {
                status: ExecutionStatus::TimeLimitExceeded,
                time_ms: spec.limits.time_ms,
                memory_kb: 0,
                stdout: String::new(),
                stdout_bytes: Vec::new(),
                stderr: String::new(),
            });
        }
    };

    let exit_code = output.status.code();
    let status = match exit_code {
        Some(code) => ExecutionStatus::Exited(code),
        None => {
            #[cfg(unix)]
            {
                use std::os::unix::process::ExitStatusExt;
                ExecutionStatus::Signaled(output.status.signal().unwrap_or(0))
            }
            #[cfg(not(unix))]
            {
                ExecutionStatus::RuntimeError
            }
        }
    };

    if let Some(ref dir) = spec.copy_out_dir {
        let _ = dir; // trusted runs execute directly in work_dir, nothing to copy back
    }

    Ok(ExecutionOutcome {
        status,
        time_ms: 0,
        memory_kb: 0,
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stdout_bytes: output.stdout,
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}
