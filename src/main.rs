//! Judge worker entry point: dequeue a job, grade or validate it, store
//! the result. Mirrors the teacher's own `main.rs` loop, narrowed to the
//! `judge`/`validate` job kinds this core implements (spec §1 Non-goals).

use tracing_subscriber::EnvFilter;

use grading_core::compiler::CheckerCompiler;
use grading_core::config::Config;
use grading_core::judger::{process_judge_job, JudgeResult};
use grading_core::redis_manager::RedisManager;
use grading_core::sandbox;
use grading_core::storage::StorageClient;
use grading_core::validator::{process_validate_job, ValidateResult, ValidatorManager};
use grading_core::WorkerJob;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("judge=info")),
        )
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env();
    grading_core::languages::init_languages()?;

    let mut redis = RedisManager::from_env().await?;
    let worker_id = redis.worker_id();
    sandbox::init_config(worker_id);
    sandbox::ensure_cgroups_available().await?;

    let storage = StorageClient::from_env().await?;
    let checker_compiler = CheckerCompiler::new(&config.testlib_path, &config.compile_cache_dir);
    let validator_manager = ValidatorManager::new(&config);

    tracing::info!("Judge worker {} ready", worker_id);

    loop {
        let job = match redis.pop_job().await {
            Ok(job) => job,
            Err(e) => {
                tracing::error!("Failed to pop job: {}", e);
                continue;
            }
        };

        match job {
            WorkerJob::Judge(judge_job) => {
                let submission_id = judge_job.submission_id;
                let result = match process_judge_job(&judge_job, &storage, &checker_compiler, &config).await {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::error!("Submission {} failed: {}", submission_id, e);
                        JudgeResult::system_error(submission_id, e.to_string())
                    }
                };
                if let Err(e) = redis.store_judge_result(&result).await {
                    tracing::error!("Failed to store judge result for {}: {}", submission_id, e);
                }
                tracing::info!("Finished grading submission {}", submission_id);
            }
            WorkerJob::Validate(validate_job) => {
                let problem_id = validate_job.problem_id;
                let result = match process_validate_job(&validate_job, &storage, &validator_manager).await
                {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::error!("Validation for problem {} failed: {}", problem_id, e);
                        ValidateResult {
                            problem_id,
                            success: false,
                            testcase_results: Vec::new(),
                            error_message: Some(e.to_string()),
                        }
                    }
                };
                if let Err(e) = redis.store_validate_result(&result).await {
                    tracing::error!("Failed to store validate result for {}: {}", problem_id, e);
                }
                tracing::info!("Finished validating problem {}", problem_id);
            }
        }
    }
}
