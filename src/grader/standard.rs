//! Standard grader (component E): launch the submission once per case,
//! then invoke the configured checker on its captured output.

use std::path::Path;

use crate::bridged::{self, BridgedCheckerJob, BridgedRole};
use crate::compiler::CheckerCompiler;
use crate::config::Config;
use crate::error::JudgeError;
use crate::result::{CaseResult, ResultFlag};
use crate::sandbox::{IoSpec, IsolateBox, IsolateStatus, Limits};

use super::{apply_partial_credit_policy, CheckerSelector, ProblemGraderConfig};

/// Everything one case launch needs beyond the problem-level grading
/// config.
pub struct CaseInput<'a> {
    pub box_id: u32,
    pub work_dir: &'a Path,
    pub run_command: &'a [String],
    pub stdin_path: Option<&'a Path>,
    pub judge_output: &'a [u8],
    pub time_limit_ms: u32,
    pub memory_limit_mb: u32,
    pub point_value: f64,
    pub problem_id: i64,
    pub batch_no: Option<u32>,
}

/// Run the submission once under sandbox limits and fold the raw sandbox
/// outcome into a fresh `CaseResult`, setting hard flags from
/// TLE/MLE/OLE/RTE/IR/signal before any checker runs (spec §4.E steps
/// 2-3).
async fn launch(
    input: &CaseInput<'_>,
    config: &ProblemGraderConfig,
) -> Result<(CaseResult, Vec<u8>), JudgeError> {
    let mut result = CaseResult::new(input.point_value);

    let isolate_box = IsolateBox::new(input.box_id, true)
        .await
        .map_err(|e| JudgeError::internal(format!("failed to init sandbox box: {e}")))?;
    isolate_box
        .copy_dir_in(input.work_dir)
        .await
        .map_err(|e| JudgeError::internal(format!("failed to stage submission: {e}")))?;

    let wall_time_ms = (config.wall_time_factor * input.time_limit_ms as f64) as u32;
    let limits = Limits {
        time_ms: input.time_limit_ms,
        memory_mb: input.memory_limit_mb,
        wall_time_ms: Some(wall_time_ms),
        ..Limits::default()
    };

    let mut io = IoSpec::new().with_stderr_file("stderr.txt");
    if let Some(stdin_path) = input.stdin_path {
        io = io.with_stdin(stdin_path);
    }

    let outcome = isolate_box
        .run(input.run_command, &limits, &io)
        .await
        .map_err(|e| JudgeError::internal(format!("failed to launch submission: {e}")))?;
    isolate_box
        .cleanup()
        .await
        .map_err(|e| JudgeError::internal(format!("failed to clean up sandbox box: {e}")))?;

    result.execution_time = (outcome.meta.time_ms as f64) / 1000.0;
    result.wall_clock_time = (outcome.meta.wall_time_ms as f64) / 1000.0;
    result.max_memory = outcome.meta.memory_kb as u64;
    result.context_switches.voluntary = outcome.meta.csw_voluntary;
    result.context_switches.involuntary = outcome.meta.csw_involuntary;
    result.extended_feedback = Some(outcome.stderr.clone());

    let memory_limit_kb = input.memory_limit_mb as u64 * 1024;
    if result.max_memory > memory_limit_kb {
        result.result_flag.set(ResultFlag::MLE);
    }

    match outcome.meta.status {
        IsolateStatus::TimeOut => result.result_flag.set(ResultFlag::TLE),
        IsolateStatus::Signal(_) => result.result_flag.set(ResultFlag::IR),
        IsolateStatus::RuntimeError => result.result_flag.set(ResultFlag::RTE),
        IsolateStatus::InternalError => result.result_flag.set(ResultFlag::IE),
        IsolateStatus::Ok if outcome.meta.exit_code != 0 => result.result_flag.set(ResultFlag::RTE),
        IsolateStatus::Ok => {}
    }

    let mut proc_output = outcome.stdout.into_bytes();
    if proc_output.len() > config.output_limit_length {
        proc_output.truncate(config.output_limit_length);
        result.result_flag.set(ResultFlag::OLE);
    }
    result.proc_output = proc_output.clone();

    Ok((result, proc_output))
}

/// Grade one case: launch, then (absent a hard flag) check.
pub async fn grade_case(
    input: &CaseInput<'_>,
    config: &ProblemGraderConfig,
    checker_compiler: &CheckerCompiler,
    worker_config: &Config,
) -> Result<CaseResult, JudgeError> {
    let (mut result, proc_output) = launch(input, config).await?;

    if result.result_flag.is_ac() {
        let checker_result = match &config.checker {
            CheckerSelector::Pure(checker, opts) => {
                let mut opts = opts.clone();
                opts.point_value = input.point_value;
                checker.check(&proc_output, input.judge_output, &opts)
            }
            CheckerSelector::Bridged(bridged_config) => {
                let job = BridgedCheckerJob {
                    contrib: bridged_config.contrib,
                    role: BridgedRole::Checker,
                    files: &bridged_config.files,
                    problem_dir: &bridged_config.problem_dir,
                    problem_id: input.problem_id,
                    point_value: input.point_value,
                    generator_time_limit_ms: bridged_config.generator_time_limit_ms,
                    generator_memory_limit_mb: bridged_config.generator_memory_limit_mb,
                    treat_checker_points_as_percentage: bridged_config
                        .treat_checker_points_as_percentage,
                    batch_no: input.batch_no,
                    input_name: bridged_config.input_name.clone(),
                    output_name: bridged_config.output_name.clone(),
                };
                let judge_input = match input.stdin_path {
                    Some(path) => tokio::fs::read(path).await.map_err(|e| {
                        JudgeError::internal(format!("failed to read case input {:?}: {e}", path))
                    })?,
                    None => Vec::new(),
                };
                bridged::check(
                    &job,
                    &proc_output,
                    input.judge_output,
                    &judge_input,
                    checker_compiler,
                    worker_config.trusted_timeout_secs,
                )
                .await?
            }
        };
        let checker_result =
            apply_partial_credit_policy(checker_result, input.point_value, worker_config);
        result.apply_checker(&checker_result);
    }

    Ok(result)
}
