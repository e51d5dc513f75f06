//! Outer judge loop: pick a grader, compile the submission once, then walk
//! its cases in order, enforcing batch and short-circuit semantics before
//! handing verdicts back to the caller (spec §2 "Data flow", §5).
//!
//! Mirrors the shape of a per-submission job/result pair the teacher's own
//! `judger.rs` used (`JudgeJob` in, `JudgeResult` out), generalised to
//! dispatch across the standard/communication/signature graders instead of
//! a single ICPC/special-judge split, and to carry the exact controller
//! field names (spec §6) on every testcase record.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::checker::{Checker, CheckerOptions};
use crate::compiler::{compile_user_code, CheckerCompiler};
use crate::config::Config;
use crate::contrib::ContribKind;
use crate::grader::communication::{CommunicationInput, UserProcess};
use crate::grader::signature::{compile_harness, SignatureFamily, SignatureSpec};
use crate::grader::standard::CaseInput;
use crate::grader::{self, BridgedConfig, CheckerSelector, ProblemGraderConfig};
use crate::languages::get_language_config;
use crate::result::{CaseResult, ResultFlag};
use crate::sandbox::calculate_box_id;
use crate::storage::StorageClient;

/// Which grader (spec §2 components E/F/G) a problem uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraderKind {
    Standard,
    Communication,
    Signature,
}

/// One case, read-only input to the grading loop (spec §3 TestCase).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestcaseSpec {
    pub id: i64,
    pub input_path: String,
    pub output_path: String,
    pub point_value: f64,
    /// Cases sharing a `batch_no` are awarded as a unit: fail any, lose
    /// all (GLOSSARY "Batch"). `None` is its own singleton batch.
    #[serde(default)]
    pub batch_no: Option<u32>,
}

/// The problem's checker selection, serialised form of
/// `grader::CheckerSelector` -- a registry name plus the bits each side
/// might need (spec §6 "Checker plugin contract" / "Contrib module
/// contract").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckerConfig {
    /// A pure checker name (`standard`/`linecount`/`identical`/`floats`/
    /// `floatsrel`) or a contrib kind name (`default`/`testlib`/`cms`/
    /// `themis`) for the bridged path.
    pub checker: String,
    #[serde(default = "default_precision")]
    pub precision: u32,
    #[serde(default = "default_pe_allowed")]
    pub pe_allowed: bool,
    #[serde(default)]
    pub treat_checker_points_as_percentage: bool,
    /// Bridged only: storage paths of candidate checker sources.
    #[serde(default)]
    pub checker_files: Vec<String>,
    #[serde(default = "default_generator_time_limit_ms")]
    pub generator_time_limit_ms: u32,
    #[serde(default = "default_generator_memory_limit_mb")]
    pub generator_memory_limit_mb: u32,
    /// themis only.
    #[serde(default)]
    pub input_name: Option<String>,
    #[serde(default)]
    pub output_name: Option<String>,
}

fn default_precision() -> u32 {
    6
}
fn default_pe_allowed() -> bool {
    true
}
fn default_generator_time_limit_ms() -> u32 {
    10_000
}
fn default_generator_memory_limit_mb() -> u32 {
    256
}
fn default_wall_time_factor() -> f64 {
    3.0
}
fn default_output_limit_length() -> usize {
    10 * 1024 * 1024
}

/// Problem config knobs shared across every case (spec §4.E step 2,
/// §4.F "Launch order").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingTunables {
    #[serde(default = "default_wall_time_factor")]
    pub wall_time_factor: f64,
    #[serde(default = "default_output_limit_length")]
    pub output_limit_length: usize,
    #[serde(default)]
    pub manager_memory_limit_mb: Option<u32>,
}

impl Default for GradingTunables {
    fn default() -> Self {
        Self {
            wall_time_factor: default_wall_time_factor(),
            output_limit_length: default_output_limit_length(),
            manager_memory_limit_mb: None,
        }
    }
}

/// Communication-grader-only config: the manager's source and how many
/// user processes to launch (spec §4.F).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunicationSpec {
    pub manager_source_path: String,
    pub num_processes: usize,
}

/// Signature-grader-only config: judge-authored header/entry sources
/// (spec §4.F "Signature grading path").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureJobSpec {
    pub header_path: String,
    pub header_name: String,
    pub entry_path: String,
    pub entry_name: String,
    #[serde(default)]
    pub allow_main: bool,
}

/// Judge job received from the queue (spec §3 Submission).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeJob {
    pub submission_id: i64,
    pub problem_id: i64,
    pub language: String,
    pub source_path: String,
    pub time_limit_ms: u32,
    pub memory_limit_mb: u32,
    /// Skip remaining cases in a batch once one fails (GLOSSARY
    /// "Short-circuit").
    #[serde(default)]
    pub short_circuit: bool,
    pub grader: GraderKind,
    pub checker: CheckerConfig,
    #[serde(default)]
    pub tunables: GradingTunables,
    #[serde(default)]
    pub communication: Option<CommunicationSpec>,
    #[serde(default)]
    pub signature: Option<SignatureJobSpec>,
    pub testcases: Vec<TestcaseSpec>,
}

/// One case's verdict, field names fixed by the controller protocol
/// (spec §6 `"test-case-status"`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestcaseResult {
    pub position: usize,
    pub status: String,
    pub time: f64,
    pub points: f64,
    #[serde(rename = "total-points")]
    pub total_points: f64,
    pub memory: u64,
    pub output: String,
    #[serde(rename = "extended-feedback")]
    pub extended_feedback: Option<String>,
    pub feedback: Option<String>,
    #[serde(rename = "voluntary-context-switches")]
    pub voluntary_context_switches: u64,
    #[serde(rename = "involuntary-context-switches")]
    pub involuntary_context_switches: u64,
    #[serde(rename = "runtime-version")]
    pub runtime_version: Option<String>,
}

/// Priority order for rendering a (possibly multi-bit) `ResultFlag` as
/// the single `status` string the controller expects -- IE first since
/// it means the grading core itself gave up, SC last since it's purely
/// informational next to a real hard flag.
fn status_string(flag: ResultFlag) -> &'static str {
    const PRIORITY: &[(u16, &str)] = &[
        (ResultFlag::IE, "IE"),
        (ResultFlag::TLE, "TLE"),
        (ResultFlag::MLE, "MLE"),
        (ResultFlag::OLE, "OLE"),
        (ResultFlag::RTE, "RTE"),
        (ResultFlag::IR, "IR"),
        (ResultFlag::WA, "WA"),
        (ResultFlag::SC, "SC"),
    ];
    for (bit, name) in PRIORITY {
        if flag.has(*bit) {
            return name;
        }
    }
    "AC"
}

fn to_testcase_result(position: usize, case: &CaseResult) -> TestcaseResult {
    TestcaseResult {
        position,
        status: status_string(case.result_flag).to_string(),
        time: case.execution_time,
        points: case.points,
        total_points: case.total_points,
        memory: case.max_memory,
        output: String::from_utf8_lossy(&case.proc_output).into_owned(),
        extended_feedback: case.extended_feedback.clone(),
        feedback: case.feedback.clone(),
        voluntary_context_switches: case.context_switches.voluntary,
        involuntary_context_switches: case.context_switches.involuntary,
        runtime_version: case.runtime_version.clone(),
    }
}

fn skipped_case(total_points: f64) -> CaseResult {
    let mut case = CaseResult::new(total_points);
    case.result_flag.set(ResultFlag::SC);
    case.feedback = Some("Skipped".to_string());
    case
}

/// Overall judge result for one submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeResult {
    pub submission_id: i64,
    pub testcases: Vec<TestcaseResult>,
    pub compile_error: Option<String>,
}

impl JudgeResult {
    pub fn compile_error(submission_id: i64, message: impl Into<String>) -> Self {
        Self {
            submission_id,
            testcases: Vec::new(),
            compile_error: Some(message.into()),
        }
    }

    /// Catch-all for a job that failed before any case could be graded
    /// (missing config, storage failure, panic) -- the worker's own
    /// internal error, not a verdict on the submission's code.
    pub fn system_error(submission_id: i64, message: impl Into<String>) -> Self {
        Self::compile_error(submission_id, format!("internal error: {}", message.into()))
    }
}

fn resolve_checker_options(config: &CheckerConfig) -> CheckerOptions {
    CheckerOptions {
        precision: config.precision,
        pe_allowed: config.pe_allowed,
        treat_checker_points_as_percentage: config.treat_checker_points_as_percentage,
        ..CheckerOptions::default()
    }
}

/// Resolve `job.checker` into a `CheckerSelector`, downloading bridged
/// checker sources into `problem_dir` when the name isn't one of the
/// pure registry's (spec §4.D step 1 "Resolve files").
async fn resolve_checker_selector(
    config: &CheckerConfig,
    storage: &StorageClient,
    problem_dir: &Path,
) -> anyhow::Result<CheckerSelector> {
    if let Some(checker) = Checker::by_name(&config.checker) {
        return Ok(CheckerSelector::Pure(checker, resolve_checker_options(config)));
    }

    let contrib = ContribKind::by_name(&config.checker)
        .ok_or_else(|| anyhow::anyhow!("unknown checker/contrib type {:?}", config.checker))?;

    tokio::fs::create_dir_all(problem_dir).await?;
    let mut files = Vec::with_capacity(config.checker_files.len());
    for storage_path in &config.checker_files {
        let name = Path::new(storage_path)
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("malformed checker file path {:?}", storage_path))?
            .to_string_lossy()
            .into_owned();
        let content = storage.download(storage_path).await?;
        tokio::fs::write(problem_dir.join(&name), &content).await?;
        files.push(name);
    }

    Ok(CheckerSelector::Bridged(BridgedConfig {
        contrib,
        files,
        problem_dir: problem_dir.to_path_buf(),
        generator_time_limit_ms: config.generator_time_limit_ms,
        generator_memory_limit_mb: config.generator_memory_limit_mb,
        treat_checker_points_as_percentage: config.treat_checker_points_as_percentage,
        input_name: config.input_name.clone(),
        output_name: config.output_name.clone(),
    }))
}

/// Compile the submission once, returning the directory holding the
/// runnable binary and the command to invoke it.
async fn compile_submission(
    job: &JudgeJob,
    storage: &StorageClient,
    worker_config: &Config,
    source: &str,
) -> Result<(PathBuf, Vec<String>), JudgeResult> {
    let box_id = calculate_box_id(job.submission_id as u32, 999);

    if job.grader == GraderKind::Signature {
        let spec_job = job.signature.as_ref().ok_or_else(|| {
            JudgeResult::compile_error(job.submission_id, "signature grader is missing its handler config")
        })?;
        let family = SignatureFamily::from_language(&job.language).ok_or_else(|| {
            JudgeResult::compile_error(
                job.submission_id,
                format!("language {} has no signature grader harness", job.language),
            )
        })?;

        let header_content = storage
            .download_string(&spec_job.header_path)
            .await
            .map_err(|e| JudgeResult::compile_error(job.submission_id, format!("failed to fetch signature header: {e}")))?;
        let entry_content = storage
            .download_string(&spec_job.entry_path)
            .await
            .map_err(|e| JudgeResult::compile_error(job.submission_id, format!("failed to fetch signature entry point: {e}")))?;

        let spec = SignatureSpec {
            family,
            header_name: spec_job.header_name.clone(),
            header_content,
            entry_name: spec_job.entry_name.clone(),
            entry_content,
            allow_main: spec_job.allow_main,
        };

        let work_dir = std::env::temp_dir().join(format!("judge_{}_submission", job.submission_id));
        return compile_harness(box_id, &work_dir, source, job.problem_id, &spec, worker_config)
            .await
            .map_err(|e| JudgeResult::compile_error(job.submission_id, e.to_string()));
    }

    let lang_config = get_language_config(&job.language).ok_or_else(|| {
        JudgeResult::compile_error(job.submission_id, format!("unsupported language {}", job.language))
    })?;

    let work_dir = std::env::temp_dir().join(format!("judge_{}_submission", job.submission_id));
    tokio::fs::create_dir_all(&work_dir)
        .await
        .map_err(|e| JudgeResult::compile_error(job.submission_id, format!("failed to create work dir: {e}")))?;
    tokio::fs::write(work_dir.join(&lang_config.source_file), source)
        .await
        .map_err(|e| JudgeResult::compile_error(job.submission_id, format!("failed to write source: {e}")))?;

    let result = compile_user_code(box_id, &work_dir, &lang_config)
        .await
        .map_err(|e| JudgeResult::compile_error(job.submission_id, e.to_string()))?;

    if !result.success {
        return Err(JudgeResult::compile_error(
            job.submission_id,
            result.message.unwrap_or_else(|| "compilation failed".to_string()),
        ));
    }

    Ok((work_dir, lang_config.run_command))
}

/// Compile the communication problem's manager, cached the same way as a
/// bridged checker -- it's judge-authored code compiled once and reused
/// across submissions (spec §4.F "Launch order" step 1).
async fn compile_manager(
    job: &JudgeJob,
    spec: &CommunicationSpec,
    storage: &StorageClient,
    checker_compiler: &CheckerCompiler,
) -> anyhow::Result<(PathBuf, Vec<String>)> {
    let source = storage.download_string(&spec.manager_source_path).await?;
    let binary_path = checker_compiler
        .get_or_compile(&source, job.problem_id, &["COMMUNICATION_MANAGER"])
        .await?;
    let work_dir = binary_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("manager binary has no parent directory"))?
        .to_path_buf();
    let binary_name = binary_path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("manager binary has no file name"))?
        .to_string_lossy()
        .into_owned();
    Ok((work_dir, vec![format!("./{}", binary_name)]))
}

/// Grade one case under the standard grader.
async fn grade_standard_case(
    job: &JudgeJob,
    case_idx: usize,
    tc: &TestcaseSpec,
    work_dir: &Path,
    run_command: &[String],
    judge_output: &[u8],
    stdin_path: &Path,
    grader_config: &ProblemGraderConfig,
    checker_compiler: &CheckerCompiler,
    worker_config: &Config,
) -> Result<CaseResult, String> {
    let input = CaseInput {
        box_id: calculate_box_id(job.submission_id as u32, case_idx as u32),
        work_dir,
        run_command,
        stdin_path: Some(stdin_path),
        judge_output,
        time_limit_ms: job.time_limit_ms,
        memory_limit_mb: job.memory_limit_mb,
        point_value: tc.point_value,
        problem_id: job.problem_id,
        batch_no: tc.batch_no,
    };

    grader::standard::grade_case(&input, grader_config, checker_compiler, worker_config)
        .await
        .map_err(|e| e.to_string())
}

/// Grade one case under the communication grader.
#[allow(clippy::too_many_arguments)]
async fn grade_communication_case(
    job: &JudgeJob,
    tc: &TestcaseSpec,
    manager_work_dir: &Path,
    manager_run_command: &[String],
    submission_work_dir: &Path,
    submission_run_command: &[String],
    num_processes: usize,
    judge_output: Vec<u8>,
    stdin_path: Option<PathBuf>,
    grader_config: &ProblemGraderConfig,
    worker_config: &Config,
    contrib: ContribKind,
) -> Result<CaseResult, String> {
    let users = (0..num_processes)
        .map(|_| UserProcess {
            work_dir: submission_work_dir.to_path_buf(),
            run_command: submission_run_command.to_vec(),
        })
        .collect();

    let input = CommunicationInput {
        // `grade_case` derives each process's own box id from this via
        // `calculate_box_id(base_box_id, slot)`; cases run sequentially
        // within a submission (spec §5), so reusing the submission id
        // across cases is safe -- each box is cleaned up before reuse.
        base_box_id: job.submission_id as u32,
        manager_work_dir: manager_work_dir.to_path_buf(),
        manager_run_command: manager_run_command.to_vec(),
        manager_memory_limit_mb: job
            .tunables
            .manager_memory_limit_mb
            .unwrap_or(job.memory_limit_mb),
        users,
        stdin_path,
        judge_output,
        time_limit_ms: job.time_limit_ms,
        memory_limit_mb: job.memory_limit_mb,
        point_value: tc.point_value,
        contrib,
    };

    grader::communication::grade_case(input, grader_config, worker_config)
        .await
        .map_err(|e| e.to_string())
}

/// Download a case's input to a temp file and its expected output into
/// memory.
async fn fetch_case_io(
    storage: &StorageClient,
    tc: &TestcaseSpec,
    tmp_dir: &Path,
    case_idx: usize,
) -> anyhow::Result<(PathBuf, Vec<u8>)> {
    let input_bytes = storage.download(&tc.input_path).await?;
    let input_path = tmp_dir.join(format!("case_{}_input.txt", case_idx));
    tokio::fs::write(&input_path, &input_bytes).await?;
    let output_bytes = storage.download(&tc.output_path).await?;
    Ok((input_path, output_bytes))
}

/// Group cases into ordered batches (spec GLOSSARY "Batch"). A `None`
/// `batch_no` is its own singleton batch, preserving submission order
/// either way.
fn group_into_batches(testcases: &[TestcaseSpec]) -> Vec<Vec<usize>> {
    let mut batches: Vec<Vec<usize>> = Vec::new();
    for (idx, tc) in testcases.iter().enumerate() {
        match tc.batch_no {
            None => batches.push(vec![idx]),
            Some(n) => match batches
                .iter_mut()
                .rev()
                .find(|batch| testcases[batch[0]].batch_no == Some(n))
            {
                Some(batch) => batch.push(idx),
                None => batches.push(vec![idx]),
            },
        }
    }
    batches
}

/// Process one judge job end to end: compile, then grade every case in
/// batch/short-circuit order (spec §2 "Data flow", §5 "Ordering
/// guarantees").
pub async fn process_judge_job(
    job: &JudgeJob,
    storage: &StorageClient,
    checker_compiler: &CheckerCompiler,
    worker_config: &Config,
) -> anyhow::Result<JudgeResult> {
    info!(
        "Grading submission {} (problem {}, grader {:?})",
        job.submission_id, job.problem_id, job.grader
    );

    let source = storage.download_string(&job.source_path).await?;

    let (submission_work_dir, submission_run_command) =
        match compile_submission(job, storage, worker_config, &source).await {
            Ok(pair) => pair,
            Err(result) => return Ok(result),
        };

    let problem_dir =
        std::env::temp_dir().join(format!("judge_{}_problem_{}", job.submission_id, job.problem_id));
    let checker_selector = resolve_checker_selector(&job.checker, storage, &problem_dir).await?;
    let grader_config = ProblemGraderConfig {
        checker: checker_selector,
        wall_time_factor: job.tunables.wall_time_factor,
        output_limit_length: job.tunables.output_limit_length,
    };

    let manager = if job.grader == GraderKind::Communication {
        let spec = job
            .communication
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("communication grader is missing its handler config"))?;
        Some((spec, compile_manager(job, spec, storage, checker_compiler).await?))
    } else {
        None
    };

    let tmp_dir = std::env::temp_dir().join(format!("judge_{}_cases", job.submission_id));
    tokio::fs::create_dir_all(&tmp_dir).await?;

    let batches = group_into_batches(&job.testcases);
    let mut results: Vec<Option<CaseResult>> = vec![None; job.testcases.len()];

    for batch in &batches {
        let mut batch_failed = false;

        for &idx in batch {
            let tc = &job.testcases[idx];

            if job.short_circuit && batch_failed {
                results[idx] = Some(skipped_case(tc.point_value));
                continue;
            }

            let case_result = match grade_one_case(
                job,
                idx,
                tc,
                storage,
                &tmp_dir,
                &submission_work_dir,
                &submission_run_command,
                manager.as_ref(),
                &grader_config,
                checker_compiler,
                worker_config,
            )
            .await
            {
                Ok(result) => result,
                Err(message) => {
                    warn!(
                        "Case {} of submission {} failed internally: {}",
                        tc.id, job.submission_id, message
                    );
                    let mut result = CaseResult::new(tc.point_value);
                    result.result_flag.set(ResultFlag::IE);
                    result.feedback = Some(message);
                    result
                }
            };

            if !case_result.result_flag.is_ac() {
                batch_failed = true;
            }
            results[idx] = Some(case_result);
        }

        // Batch semantics: fail any case, lose all points for the batch
        // (GLOSSARY "Batch"), even cases graded before the failure.
        if batch_failed {
            for &idx in batch {
                if let Some(result) = results[idx].as_mut() {
                    result.points = 0.0;
                }
            }
        }
    }

    let testcases = results
        .into_iter()
        .enumerate()
        .map(|(idx, result)| {
            to_testcase_result(idx, &result.expect("every case index is graded or skipped above"))
        })
        .collect();

    Ok(JudgeResult {
        submission_id: job.submission_id,
        testcases,
        compile_error: None,
    })
}

#[allow(clippy::too_many_arguments)]
async fn grade_one_case(
    job: &JudgeJob,
    idx: usize,
    tc: &TestcaseSpec,
    storage: &StorageClient,
    tmp_dir: &Path,
    submission_work_dir: &Path,
    submission_run_command: &[String],
    manager: Option<&(&CommunicationSpec, (PathBuf, Vec<String>))>,
    grader_config: &ProblemGraderConfig,
    checker_compiler: &CheckerCompiler,
    worker_config: &Config,
) -> Result<CaseResult, String> {
    let (input_path, judge_output) = fetch_case_io(storage, tc, tmp_dir, idx)
        .await
        .map_err(|e| format!("failed to fetch case input/output: {e}"))?;

    match job.grader {
        GraderKind::Standard | GraderKind::Signature => {
            grade_standard_case(
                job,
                idx,
                tc,
                submission_work_dir,
                submission_run_command,
                &judge_output,
                &input_path,
                grader_config,
                checker_compiler,
                worker_config,
            )
            .await
        }
        GraderKind::Communication => {
            let (spec, (manager_work_dir, manager_run_command)) =
                manager.expect("communication grader always resolves a manager before grading cases");
            let contrib = match &grader_config.checker {
                CheckerSelector::Bridged(bridged) => bridged.contrib,
                CheckerSelector::Pure(_, _) => ContribKind::Default,
            };
            grade_communication_case(
                job,
                tc,
                manager_work_dir,
                manager_run_command,
                submission_work_dir,
                submission_run_command,
                spec.num_processes,
                judge_output,
                Some(input_path),
                grader_config,
                worker_config,
                contrib,
            )
            .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tc(id: i64, batch_no: Option<u32>) -> TestcaseSpec {
        TestcaseSpec {
            id,
            input_path: format!("in/{}", id),
            output_path: format!("out/{}", id),
            point_value: 10.0,
            batch_no,
        }
    }

    #[test]
    fn status_string_prefers_ie_over_other_bits() {
        let mut flag = ResultFlag::none();
        flag.set(ResultFlag::WA);
        flag.set(ResultFlag::IE);
        assert_eq!(status_string(flag), "IE");
    }

    #[test]
    fn status_string_is_ac_when_no_bits_set() {
        assert_eq!(status_string(ResultFlag::none()), "AC");
    }

    #[test]
    fn batches_group_matching_batch_numbers_in_order() {
        let cases = vec![tc(1, Some(1)), tc(2, Some(1)), tc(3, None), tc(4, Some(2))];
        let batches = group_into_batches(&cases);
        assert_eq!(batches, vec![vec![0, 1], vec![2], vec![3]]);
    }

    #[test]
    fn batches_keep_non_adjacent_same_numbered_cases_together() {
        let cases = vec![tc(1, Some(1)), tc(2, Some(2)), tc(3, Some(1))];
        let batches = group_into_batches(&cases);
        assert_eq!(batches, vec![vec![0, 2], vec![1]]);
    }

    #[test]
    fn skipped_case_carries_sc_flag_and_zero_points() {
        let case = skipped_case(10.0);
        assert!(case.result_flag.has(ResultFlag::SC));
        assert_eq!(case.points, 0.0);
        assert_eq!(case.total_points, 10.0);
    }
}
