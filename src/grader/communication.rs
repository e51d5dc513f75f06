//! Communication grader (component F): coordinate one manager process and
//! `N` user processes over `2N` named pipes, merge their results, and
//! delegate the verdict to the manager-as-checker.

use std::fs::OpenOptions;
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::PathBuf;
use std::process::Stdio;

use nix::sys::stat::Mode;
use nix::unistd::mkfifo;
use tempfile::TempDir;

use crate::config::Config;
use crate::contrib::{run_parse_return_code, ContribKind, ParseContext};
use crate::error::JudgeError;
use crate::helper_errors::ProcessOutcome;
use crate::result::{CaseResult, ResultFlag};
use crate::sandbox::{calculate_box_id, IoSpec, IsolateBox, IsolateStatus, Limits, SandboxOutcome};

use super::{apply_partial_credit_policy, CheckerSelector, ProblemGraderConfig};

/// Per-user-process binary location, owned so it can move into a spawned
/// task.
#[derive(Clone)]
pub struct UserProcess {
    pub work_dir: PathBuf,
    pub run_command: Vec<String>,
}

/// Everything the communication grader needs for one case.
pub struct CommunicationInput {
    pub base_box_id: u32,
    pub manager_work_dir: PathBuf,
    pub manager_run_command: Vec<String>,
    pub manager_memory_limit_mb: u32,
    pub users: Vec<UserProcess>,
    pub stdin_path: Option<PathBuf>,
    pub judge_output: Vec<u8>,
    pub time_limit_ms: u32,
    pub memory_limit_mb: u32,
    pub point_value: f64,
    pub contrib: ContribKind,
}

struct FifoPair {
    _dir: TempDir,
    u_to_m: PathBuf,
    m_to_u: PathBuf,
}

fn make_fifo_pair(index: usize) -> Result<FifoPair, JudgeError> {
    let dir = TempDir::new()
        .map_err(|e| JudgeError::internal(format!("failed to create FIFO directory: {e}")))?;
    std::fs::set_permissions(dir.path(), std::fs::Permissions::from_mode(0o700))
        .map_err(|e| JudgeError::internal(format!("failed to chmod FIFO directory: {e}")))?;

    let u_to_m = dir.path().join(format!("u{}_to_m", index));
    let m_to_u = dir.path().join(format!("m_to_u{}", index));

    let mode = Mode::from_bits_truncate(0o666);
    mkfifo(&u_to_m, mode)
        .map_err(|e| JudgeError::internal(format!("mkfifo {:?} failed: {e}", u_to_m)))?;
    mkfifo(&m_to_u, mode)
        .map_err(|e| JudgeError::internal(format!("mkfifo {:?} failed: {e}", m_to_u)))?;

    Ok(FifoPair { _dir: dir, u_to_m, m_to_u })
}

/// Open a FIFO end from a blocking thread -- `open()` on a FIFO blocks
/// until the peer opens the other end, so this must never run on the
/// async executor's own thread (spec §5 "Suspension points").
async fn open_read(path: PathBuf) -> Result<std::fs::File, JudgeError> {
    tokio::task::spawn_blocking(move || std::fs::File::open(&path))
        .await
        .map_err(|e| JudgeError::internal(format!("FIFO open task panicked: {e}")))?
        .map_err(|e| JudgeError::internal(format!("failed to open FIFO for read: {e}")))
}

async fn open_write_truncate(path: PathBuf) -> Result<std::fs::File, JudgeError> {
    tokio::task::spawn_blocking(move || {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o644)
            .open(&path)
    })
    .await
    .map_err(|e| JudgeError::internal(format!("FIFO open task panicked: {e}")))?
    .map_err(|e| JudgeError::internal(format!("failed to open FIFO for write: {e}")))
}

fn sandbox_status_flag(status: &IsolateStatus, exit_code: i32) -> Option<u16> {
    match status {
        IsolateStatus::TimeOut => Some(ResultFlag::TLE),
        IsolateStatus::Signal(_) => Some(ResultFlag::IR),
        IsolateStatus::RuntimeError => Some(ResultFlag::RTE),
        IsolateStatus::InternalError => Some(ResultFlag::IE),
        IsolateStatus::Ok if exit_code != 0 => Some(ResultFlag::RTE),
        IsolateStatus::Ok => None,
    }
}

/// Run one user process against its pre-opened FIFO stdin/stdout, return
/// its own `CaseResult` parsed from sandbox meta (no checker invocation --
/// only the manager is checked, spec §4.F "Verdict").
async fn run_user(
    box_id: u32,
    user: UserProcess,
    limits: Limits,
    stdin: std::fs::File,
    stdout: std::fs::File,
    point_value: f64,
) -> Result<CaseResult, JudgeError> {
    let isolate_box = IsolateBox::new(box_id, true)
        .await
        .map_err(|e| JudgeError::internal(format!("failed to init user sandbox box: {e}")))?;
    isolate_box
        .copy_dir_in(&user.work_dir)
        .await
        .map_err(|e| JudgeError::internal(format!("failed to stage user binary: {e}")))?;

    let outcome = isolate_box
        .run_with_stdio(
            &user.run_command,
            &limits,
            Stdio::from(stdin),
            Stdio::from(stdout),
        )
        .await
        .map_err(|e| JudgeError::internal(format!("failed to launch user process: {e}")))?;
    isolate_box
        .cleanup()
        .await
        .map_err(|e| JudgeError::internal(format!("failed to clean up user sandbox box: {e}")))?;

    let mut result = CaseResult::new(point_value);
    result.execution_time = (outcome.meta.time_ms as f64) / 1000.0;
    result.wall_clock_time = (outcome.meta.wall_time_ms as f64) / 1000.0;
    result.max_memory = outcome.meta.memory_kb as u64;
    result.context_switches.voluntary = outcome.meta.csw_voluntary;
    result.context_switches.involuntary = outcome.meta.csw_involuntary;
    result.extended_feedback = Some(outcome.stderr);

    if let Some(bit) = sandbox_status_flag(&outcome.meta.status, outcome.meta.exit_code) {
        result.result_flag.set(bit);
    }

    Ok(result)
}

async fn run_manager(
    box_id: u32,
    work_dir: PathBuf,
    command: Vec<String>,
    limits: Limits,
    io: IoSpec,
) -> Result<SandboxOutcome, JudgeError> {
    let isolate_box = IsolateBox::new(box_id, true)
        .await
        .map_err(|e| JudgeError::internal(format!("failed to init manager sandbox box: {e}")))?;
    isolate_box
        .copy_dir_in(&work_dir)
        .await
        .map_err(|e| JudgeError::internal(format!("failed to stage manager binary: {e}")))?;

    let outcome = isolate_box
        .run(&command, &limits, &io)
        .await
        .map_err(|e| JudgeError::internal(format!("failed to launch manager: {e}")));
    isolate_box
        .cleanup()
        .await
        .map_err(|e| JudgeError::internal(format!("failed to clean up manager sandbox box: {e}")))?;

    outcome
}

/// Grade one communication case.
pub async fn grade_case(
    input: CommunicationInput,
    config: &ProblemGraderConfig,
    worker_config: &Config,
) -> Result<CaseResult, JudgeError> {
    let n = input.users.len();
    if n == 0 {
        return Err(JudgeError::internal(
            "communication grader needs num_processes >= 1",
        ));
    }

    // Setup: one FIFO pair per user (spec §4.F "Setup").
    let mut fifos = Vec::with_capacity(n);
    for i in 0..n {
        fifos.push(make_fifo_pair(i)?);
    }

    let manager_args: Vec<String> = fifos
        .iter()
        .flat_map(|pair| {
            vec![
                pair.u_to_m.to_string_lossy().into_owned(),
                pair.m_to_u.to_string_lossy().into_owned(),
            ]
        })
        .collect();

    let time_limit_secs = input.time_limit_ms as f64 / 1000.0;
    let manager_time_ms = (n as f64 * (time_limit_secs + 1.0) * 1000.0) as u32;
    let manager_box_id = calculate_box_id(input.base_box_id, 0);
    let manager_limits = Limits {
        time_ms: manager_time_ms,
        memory_mb: input.manager_memory_limit_mb,
        wall_time_ms: Some(manager_time_ms * 2 + 1000),
        ..Limits::default()
    };

    let mut manager_command = input.manager_run_command.clone();
    manager_command.extend(manager_args);

    let mut manager_io = IoSpec::new().with_stderr_file("manager_stderr.txt");
    if let Some(stdin_path) = &input.stdin_path {
        manager_io = manager_io.with_stdin(stdin_path);
    }

    // Launch order: manager first, so each user's FIFO open (which blocks
    // until the peer opens it) has a peer to rendezvous with. Both the
    // manager and every user process then run concurrently as spawned
    // tasks -- that concurrency is what lets the FIFO rendezvous proceed
    // at all.
    let manager_handle = tokio::spawn(run_manager(
        manager_box_id,
        input.manager_work_dir.clone(),
        manager_command,
        manager_limits,
        manager_io,
    ));

    let wall_time_ms = (config.wall_time_factor * input.time_limit_ms as f64) as u32;
    let user_limits = Limits {
        time_ms: input.time_limit_ms,
        memory_mb: input.memory_limit_mb,
        wall_time_ms: Some(wall_time_ms),
        ..Limits::default()
    };

    let mut user_handles = Vec::with_capacity(n);
    for (i, pair) in fifos.iter().enumerate() {
        let stdin_file = open_read(pair.m_to_u.clone()).await?;
        let stdout_file = open_write_truncate(pair.u_to_m.clone()).await?;
        let box_id = calculate_box_id(input.base_box_id, (i + 1) as u32);
        user_handles.push(tokio::spawn(run_user(
            box_id,
            input.users[i].clone(),
            user_limits.clone(),
            stdin_file,
            stdout_file,
            input.point_value,
        )));
        // `Stdio::from` above took ownership of the opened fds; the
        // parent holds no copies left to close.
    }

    let manager_outcome = manager_handle
        .await
        .map_err(|e| JudgeError::internal(format!("manager task panicked: {e}")))??;

    let mut user_results = Vec::with_capacity(n);
    for handle in user_handles {
        let result = handle
            .await
            .map_err(|e| JudgeError::internal(format!("user task panicked: {e}")))??;
        user_results.push(result);
    }

    // FIFO directories drop (and are removed) here, unconditionally, once
    // `fifos` goes out of scope at function end -- on every path, since
    // both awaits above return through `?` only after the tasks finish.

    // Aggregate CPU time and memory come from the user processes only --
    // the manager's own resource usage doesn't count against the
    // submission (spec §8 property 6). `proc_output` and wall-clock time
    // are the manager's, since it's the manager that speaks the checker
    // protocol and the pipeline runs for as long as the slowest party.
    let mut result = CaseResult::new(input.point_value);
    result.proc_output = manager_outcome.stdout.clone().into_bytes();
    result.wall_clock_time = (manager_outcome.meta.wall_time_ms as f64) / 1000.0;

    for user_result in &user_results {
        result.merge(user_result);
    }

    if result.execution_time > time_limit_secs {
        result.result_flag.set(ResultFlag::TLE);
    }

    if sandbox_status_flag(&manager_outcome.meta.status, manager_outcome.meta.exit_code).is_some() {
        result.result_flag.set(ResultFlag::IE);
    }

    if !result.result_flag.is_ac() {
        return Ok(result);
    }

    let verdict = match &config.checker {
        CheckerSelector::Pure(checker, opts) if matches!(checker, crate::checker::Checker::Standard) => {
            let ctx = ParseContext {
                exit_code: manager_outcome.meta.exit_code,
                point_value: input.point_value,
                feedback: &String::from_utf8_lossy(&result.proc_output),
                extended_feedback: &manager_outcome.stderr,
                name: "manager",
                stderr: manager_outcome.stderr.as_bytes(),
                treat_checker_points_as_percentage: opts.treat_checker_points_as_percentage,
                process: ProcessOutcome {
                    name: "manager".to_string(),
                    timed_out: manager_outcome.meta.status == IsolateStatus::TimeOut,
                    memory_exceeded: false,
                    protection_fault: None,
                    exit_code: Some(manager_outcome.meta.exit_code),
                    signal: None,
                    stderr_feedback: Some(manager_outcome.stderr.trim().to_string())
                        .filter(|s| !s.is_empty()),
                    time_limit_secs: manager_time_ms as f64 / 1000.0,
                    memory_limit_kb: input.manager_memory_limit_mb as u64 * 1024,
                },
            };
            run_parse_return_code(input.contrib, &ctx)?
        }
        CheckerSelector::Pure(checker, opts) => {
            let mut opts = opts.clone();
            opts.point_value = input.point_value;
            checker.check(&result.proc_output, &input.judge_output, &opts)
        }
        CheckerSelector::Bridged(_) => {
            return Err(JudgeError::internal(
                "communication grader's non-standard checker path does not support bridged checkers",
            ));
        }
    };

    let verdict = apply_partial_credit_policy(verdict, input.point_value, worker_config);
    result.apply_checker(&verdict);

    Ok(result)
}
