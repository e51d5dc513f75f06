//! Bridged checker runner (component D): compile an external checker
//! against a cached binary, invoke it with file arguments (or, for
//! themis, via stdin), and hand its exit state to a contrib module.
//!
//! All temporary files and scratch directories created here are
//! `tempfile` values; they're released on every exit path -- including
//! early returns on error -- by `Drop`, never by an explicit cleanup
//! call the caller could skip.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::{NamedTempFile, TempDir};

use crate::compiler::CheckerCompiler;
use crate::contrib::{run_parse_return_code, ArgsFormat, ContribKind, ParseContext};
use crate::error::JudgeError;
use crate::helper_errors::{translate, ProcessOutcome};
use crate::result::CheckerResult;
use crate::runner::trusted::TrustedRunner;
use crate::runner::{RunStatus, Runner};

/// Which argument template to render. A bridged auxiliary program can
/// also run as an interactor or validator, each with its own template
/// (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgedRole {
    Checker,
    Interactor,
    Validator,
}

/// Everything the bridged runner needs to resolve, compile, and invoke
/// an external checker/interactor/validator for one case.
pub struct BridgedCheckerJob<'a> {
    pub contrib: ContribKind,
    pub role: BridgedRole,
    /// Candidate source file names for the auxiliary program, relative
    /// to `problem_dir`. The runner prefers C/C++.
    pub files: &'a [String],
    pub problem_dir: &'a Path,
    pub problem_id: i64,
    pub point_value: f64,
    pub generator_time_limit_ms: u32,
    pub generator_memory_limit_mb: u32,
    pub treat_checker_points_as_percentage: bool,
    pub batch_no: Option<u32>,
    /// themis only: the file names the checker expects inside the
    /// scratch directories it reads paths for from stdin. Missing either
    /// one when `contrib == Themis` is an internal failure (spec §4.D
    /// edge policy).
    pub input_name: Option<String>,
    pub output_name: Option<String>,
}

const CPP_EXTENSIONS: &[&str] = &["cpp", "cxx", "cc"];

/// Resolve `files` to an absolute path rooted at the problem directory,
/// preferring C++ (any accepted extension) over plain C when both are
/// present -- "newer standard preferred" in spec prose, applied here as
/// "prefer the C++ compiler frontend over the C one".
fn resolve_source(problem_dir: &Path, files: &[String]) -> Result<PathBuf, JudgeError> {
    let ext_rank = |f: &String| -> Option<u8> {
        let ext = Path::new(f).extension()?.to_str()?;
        if CPP_EXTENSIONS.contains(&ext) {
            Some(0)
        } else if ext == "c" {
            Some(1)
        } else {
            None
        }
    };

    let mut candidates: Vec<(&String, u8)> =
        files.iter().filter_map(|f| ext_rank(f).map(|r| (f, r))).collect();
    candidates.sort_by_key(|(_, rank)| *rank);

    let (chosen, _) = candidates.into_iter().next().ok_or_else(|| {
        JudgeError::internal(format!(
            "no C/C++ checker source found among configured files {:?}",
            files
        ))
    })?;

    Ok(problem_dir.join(chosen))
}

/// `-DTHEMIS`/`-DCMS` compile flags the contrib type requires (spec
/// §4.D step 1).
fn contrib_defines(contrib: ContribKind) -> Vec<&'static str> {
    match contrib {
        ContribKind::Themis => vec!["THEMIS"],
        ContribKind::Cms => vec!["CMS"],
        ContribKind::Default | ContribKind::Testlib => vec![],
    }
}

fn template_for(args_format: &ArgsFormat, role: BridgedRole) -> &'static str {
    match role {
        BridgedRole::Checker => args_format.checker,
        BridgedRole::Interactor => args_format.interactor,
        BridgedRole::Validator => args_format.validator,
    }
}

/// Render `{input_file}`/`{output_file}`/`{answer_file}`/`{batch_no}`
/// placeholders into a shell-quoted argv, per spec §6's exact argument
/// strings.
fn render_args(
    template: &str,
    input_file: &Path,
    output_file: &Path,
    answer_file: &Path,
    batch_no: Option<u32>,
) -> Result<Vec<String>, JudgeError> {
    let mut rendered = template
        .replace("{input_file}", &shell_words::quote(&input_file.to_string_lossy()))
        .replace("{output_file}", &shell_words::quote(&output_file.to_string_lossy()))
        .replace(
            "{answer_file}",
            &shell_words::quote(&answer_file.to_string_lossy()),
        );
    if let Some(n) = batch_no {
        rendered = rendered.replace("{batch_no}", &n.to_string());
    }
    shell_words::split(&rendered)
        .map_err(|e| JudgeError::internal(format!("malformed args_format_string {:?}: {e}", template)))
}

async fn write_scratch(content: &[u8]) -> Result<NamedTempFile, JudgeError> {
    let file = tokio::task::spawn_blocking(NamedTempFile::new)
        .await
        .map_err(|e| JudgeError::internal(format!("scratch file task panicked: {e}")))?
        .map_err(|e| JudgeError::internal(format!("failed to create scratch file: {e}")))?;
    tokio::fs::write(file.path(), content)
        .await
        .map_err(|e| JudgeError::internal(format!("failed to write scratch file: {e}")))?;
    Ok(file)
}

/// Holds whichever scratch resources a contrib kind needs alive for the
/// duration of the checker's run; dropped -- deleting them -- once
/// `check` returns.
enum Scratch {
    Files(NamedTempFile, NamedTempFile, NamedTempFile),
    Dirs(TempDir, TempDir),
}

async fn scratch_dir(mode: u32) -> Result<TempDir, JudgeError> {
    let dir = tokio::task::spawn_blocking(TempDir::new)
        .await
        .map_err(|e| JudgeError::internal(format!("scratch dir task panicked: {e}")))?
        .map_err(|e| JudgeError::internal(format!("failed to create scratch directory: {e}")))?;
    tokio::fs::set_permissions(dir.path(), std::fs::Permissions::from_mode(mode))
        .await
        .map_err(|e| JudgeError::internal(format!("failed to chmod scratch directory: {e}")))?;
    Ok(dir)
}

/// Run the bridged checker for one case and return its verdict.
///
/// `judge_input`/`judge_output`/`process_output` are the case's input,
/// expected answer, and the submission's captured output, respectively.
pub async fn check(
    job: &BridgedCheckerJob<'_>,
    process_output: &[u8],
    judge_output: &[u8],
    judge_input: &[u8],
    compiler: &CheckerCompiler,
    trusted_timeout_secs: u64,
) -> Result<CheckerResult, JudgeError> {
    let source_path = resolve_source(job.problem_dir, job.files)?;
    let source_content = tokio::fs::read_to_string(&source_path).await.map_err(|e| {
        JudgeError::internal(format!("failed to read checker source {:?}: {e}", source_path))
    })?;

    let defines = contrib_defines(job.contrib);
    let binary_path = compiler
        .get_or_compile(&source_content, job.problem_id, &defines)
        .await
        .map_err(|e| JudgeError::Compile(e.to_string()))?;

    let args_format = job.contrib.args_format();
    let template = template_for(&args_format, job.role);

    // themis reads two scratch-directory paths from stdin instead of
    // receiving file arguments via argv (spec §4.D step 3).
    let (argv, stdin, _scratch): (Vec<String>, Option<String>, Scratch) =
        if matches!(job.contrib, ContribKind::Themis) {
            let input_name = job
                .input_name
                .as_deref()
                .ok_or_else(|| JudgeError::internal("themis checker job is missing input_name"))?;
            let output_name = job
                .output_name
                .as_deref()
                .ok_or_else(|| JudgeError::internal("themis checker job is missing output_name"))?;

            let test_data_dir = scratch_dir(0o700).await?;
            let user_output_dir = scratch_dir(0o700).await?;

            tokio::fs::write(test_data_dir.path().join(input_name), judge_input)
                .await
                .map_err(|e| JudgeError::internal(format!("failed to write themis input: {e}")))?;
            tokio::fs::write(test_data_dir.path().join(output_name), judge_output)
                .await
                .map_err(|e| JudgeError::internal(format!("failed to write themis answer: {e}")))?;
            tokio::fs::write(user_output_dir.path().join(output_name), process_output)
                .await
                .map_err(|e| JudgeError::internal(format!("failed to write themis output: {e}")))?;

            let stdin = format!(
                "{}/\n{}/\n",
                test_data_dir.path().display(),
                user_output_dir.path().display()
            );

            (Vec::new(), Some(stdin), Scratch::Dirs(test_data_dir, user_output_dir))
        } else {
            let input_file = write_scratch(judge_input).await?;
            let answer_file = write_scratch(judge_output).await?;
            let output_file = write_scratch(process_output).await?;

            let argv = render_args(
                template,
                input_file.path(),
                output_file.path(),
                answer_file.path(),
                job.batch_no,
            )?;

            (argv, None, Scratch::Files(input_file, answer_file, output_file))
        };

    let mut command = vec![binary_path.to_string_lossy().into_owned()];
    command.extend(argv);

    let runner = TrustedRunner::new(trusted_timeout_secs.max(1));
    let limits = crate::runner::RunLimits::new(job.generator_time_limit_ms, job.generator_memory_limit_mb);
    let cmd = crate::runner::CommandSpec::from_vec(&command);
    let outcome = runner
        .run(&cmd, &limits, stdin.as_deref())
        .await
        .map_err(|e| JudgeError::internal(format!("failed to launch bridged checker: {e}")))?;

    let exit_code = match outcome.status {
        RunStatus::Exited(code) => code,
        other => {
            let process = ProcessOutcome {
                name: "checker".to_string(),
                timed_out: matches!(other, RunStatus::TimeLimitExceeded),
                memory_exceeded: matches!(other, RunStatus::MemoryLimitExceeded),
                protection_fault: None,
                exit_code: None,
                signal: match other {
                    RunStatus::Signaled(sig) => Some(sig),
                    _ => None,
                },
                stderr_feedback: Some(outcome.stderr.trim().to_string()).filter(|s| !s.is_empty()),
                time_limit_secs: (job.generator_time_limit_ms as f64) / 1000.0,
                memory_limit_kb: (job.generator_memory_limit_mb as u64) * 1024,
            };
            let message = translate(&process)
                .unwrap_or_else(|| format!("checker ended abnormally: {:?}", other));
            return Err(JudgeError::HelperFile(message));
        }
    };

    let ctx = ParseContext {
        exit_code,
        point_value: job.point_value,
        feedback: &outcome.stdout,
        extended_feedback: &outcome.stderr,
        name: "checker",
        stderr: outcome.stderr.as_bytes(),
        treat_checker_points_as_percentage: job.treat_checker_points_as_percentage,
        process: ProcessOutcome {
            name: "checker".to_string(),
            timed_out: false,
            memory_exceeded: false,
            protection_fault: None,
            exit_code: Some(exit_code),
            signal: None,
            stderr_feedback: Some(outcome.stderr.trim().to_string()).filter(|s| !s.is_empty()),
            time_limit_secs: (job.generator_time_limit_ms as f64) / 1000.0,
            memory_limit_kb: (job.generator_memory_limit_mb as u64) * 1024,
        },
    };

    run_parse_return_code(job.contrib, &ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_source_prefers_cpp_over_c() {
        let dir = std::path::Path::new("/problems/42");
        let files = vec!["checker.c".to_string(), "checker.cpp".to_string()];
        let resolved = resolve_source(dir, &files).unwrap();
        assert_eq!(resolved, dir.join("checker.cpp"));
    }

    #[test]
    fn resolve_source_rejects_non_cpp_files() {
        let dir = std::path::Path::new("/problems/42");
        let files = vec!["checker.py".to_string()];
        assert!(resolve_source(dir, &files).is_err());
    }

    #[test]
    fn render_args_fills_named_placeholders_in_order() {
        let argv = render_args(
            "{input_file} {answer_file} {output_file}",
            Path::new("/tmp/in"),
            Path::new("/tmp/out"),
            Path::new("/tmp/ans"),
            None,
        )
        .unwrap();
        assert_eq!(argv, vec!["/tmp/in", "/tmp/ans", "/tmp/out"]);
    }

    #[test]
    fn render_args_substitutes_batch_no() {
        let argv = render_args(
            "--group st{batch_no}",
            Path::new("/tmp/in"),
            Path::new("/tmp/out"),
            Path::new("/tmp/ans"),
            Some(3),
        )
        .unwrap();
        assert_eq!(argv, vec!["--group", "st3"]);
    }

    #[test]
    fn contrib_defines_are_type_specific() {
        assert_eq!(contrib_defines(ContribKind::Themis), vec!["THEMIS"]);
        assert_eq!(contrib_defines(ContribKind::Cms), vec!["CMS"]);
        assert!(contrib_defines(ContribKind::Default).is_empty());
    }
}
