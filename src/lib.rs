//! Judge worker grading core: per-case lifecycle, checker/contrib plugin
//! system, communication grader.

pub mod bridged;
pub mod checker;
pub mod compiler;
pub mod config;
pub mod contrib;
pub mod dispatcher;
pub mod error;
pub mod executer;
pub mod format_feedback;
pub mod grader;
pub mod helper_errors;
pub mod judger;
pub mod languages;
pub mod redis_manager;
pub mod result;
pub mod runner;
pub mod sandbox;
pub mod storage;
pub mod validator;

use serde::{Deserialize, Serialize};

/// Job variants read off the queue. Surrounding job kinds the worker also
/// handles in production -- anigma, anigma_task1, playground -- are
/// external collaborators out of scope for the grading core (spec §1).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "job_type")]
pub enum WorkerJob {
    #[serde(rename = "judge")]
    Judge(judger::JudgeJob),
    #[serde(rename = "validate")]
    Validate(validator::ValidateJob),
}
