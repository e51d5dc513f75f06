//! Signature grader harness (component G): generate the glue that lets a
//! judge-authored entry point call into the submission's functions instead
//! of the submission owning `main` (spec §4.F "Signature grading path").
//!
//! For C/C++, the submission's `main` is renamed out of the way (unless
//! `allow_main`) and prefixed with an `#include` of the problem's header;
//! the judge's entry-point file supplies the real `main`, compiled under
//! `-DSIGNATURE_GRADER`. For Java, whichever side doesn't own `main`
//! becomes an auxiliary source compiled alongside the one that does.
//! Grounded in `dmoj`'s `graders/signature.py` and `graders/communication.py`
//! (`_generate_binary`/`_generate_manager_binary`).

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::compiler::compile_in_sandbox;
use crate::config::Config;
use crate::error::JudgeError;
use crate::sandbox::get_config;

/// Which compiled-language family a signature problem's submission
/// belongs to; each has its own harness assembly rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureFamily {
    Cpp,
    Java,
}

impl SignatureFamily {
    pub fn from_language(language: &str) -> Option<SignatureFamily> {
        match language {
            "c" | "cpp" | "cpp11" | "cpp14" | "cpp17" | "cpp20" => Some(SignatureFamily::Cpp),
            "java" | "java8" | "java11" | "java17" => Some(SignatureFamily::Java),
            _ => None,
        }
    }
}

/// A problem's signature-grading configuration (spec §6 `handler_data`).
#[derive(Debug, Clone)]
pub struct SignatureSpec {
    pub family: SignatureFamily,
    /// Header exposed to the submission: a `.h`/`.hpp` file for C/C++, or
    /// the entry point's own `.java` source (compiled as an aux class)
    /// for Java.
    pub header_name: String,
    pub header_content: String,
    /// The judge-authored file supplying the real `main`, unless
    /// `allow_main` flips which side owns it.
    pub entry_name: String,
    pub entry_content: String,
    /// When true, the submission itself keeps `main` and the judge's file
    /// becomes the auxiliary source instead (signature.py's `allow_main`).
    pub allow_main: bool,
}

/// A staged harness ready to hand to `compile_in_sandbox`: the files to
/// write into the compile work directory and the command to compile them.
pub struct Harness {
    pub files: Vec<(String, String)>,
    pub compile_cmd: Vec<String>,
    pub binary_name: String,
}

fn build_cpp_harness(submission_source: &str, problem_id: i64, spec: &SignatureSpec) -> Harness {
    let mut prefix = format!("#include \"{}\"\n", spec.header_name);
    if !spec.allow_main {
        prefix.push_str(&format!(
            "#define main main_{}\n",
            Uuid::new_v4().simple()
        ));
    }

    let submission_file = format!("{}_submission.cpp", problem_id);
    let submission_content = format!("{}{}", prefix, submission_source);

    let files = vec![
        (submission_file.clone(), submission_content),
        (spec.header_name.clone(), spec.header_content.clone()),
        (spec.entry_name.clone(), spec.entry_content.clone()),
    ];

    let binary_name = "signature_harness".to_string();
    let compile_cmd = vec![
        "g++".to_string(),
        "-O2".to_string(),
        "-std=c++17".to_string(),
        "-DSIGNATURE_GRADER".to_string(),
        "-o".to_string(),
        binary_name.clone(),
        submission_file,
        spec.entry_name.clone(),
    ];

    Harness { files, compile_cmd, binary_name }
}

/// Java can't rename `main` away with a macro, so whichever side the
/// problem names as owning it keeps its class name and the other source
/// is compiled alongside as a plain auxiliary class (signature.py: if
/// `allow_main`, the submission owns `main` and `header`/`entry` become
/// the judge's library class; otherwise the judge's entry point owns
/// `main` and the submission is the library class).
fn build_java_harness(submission_source: &str, spec: &SignatureSpec) -> Harness {
    let submission_file = format!("{}.java", submission_class_name(submission_source));

    let files = vec![
        (submission_file.clone(), submission_source.to_string()),
        (spec.header_name.clone(), spec.header_content.clone()),
        (spec.entry_name.clone(), spec.entry_content.clone()),
    ];

    let main_class = if spec.allow_main {
        submission_class_name(submission_source)
    } else {
        java_class_name_from_file(&spec.entry_name)
    };

    Harness {
        files,
        compile_cmd: vec![
            "javac".to_string(),
            "-d".to_string(),
            ".".to_string(),
            submission_file,
            spec.header_name.clone(),
            spec.entry_name.clone(),
        ],
        binary_name: main_class,
    }
}

fn submission_class_name(source: &str) -> String {
    for line in source.lines() {
        let line = line.trim();
        if let Some(rest) = line
            .strip_prefix("public class ")
            .or_else(|| line.strip_prefix("class "))
        {
            if let Some(name) = rest.split(|c: char| !c.is_alphanumeric() && c != '_').next() {
                if !name.is_empty() {
                    return name.to_string();
                }
            }
        }
    }
    "Submission".to_string()
}

fn java_class_name_from_file(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string())
}

/// Stage a signature harness into `work_dir` and compile it (trusted time
/// and memory limits come from the global compile config, same as every
/// other auxiliary compile). Returns the run command for the compiled
/// binary -- `java -cp . <MainClass>` for Java, `./<binary>` for C/C++.
pub async fn compile_harness(
    box_id: u32,
    work_dir: &Path,
    submission_source: &str,
    problem_id: i64,
    spec: &SignatureSpec,
    _worker_config: &Config,
) -> Result<(PathBuf, Vec<String>), JudgeError> {
    let harness = match spec.family {
        SignatureFamily::Cpp => build_cpp_harness(submission_source, problem_id, spec),
        SignatureFamily::Java => build_java_harness(submission_source, spec),
    };

    tokio::fs::create_dir_all(work_dir)
        .await
        .map_err(|e| JudgeError::internal(format!("failed to create harness dir: {e}")))?;
    for (name, content) in &harness.files {
        tokio::fs::write(work_dir.join(name), content)
            .await
            .map_err(|e| JudgeError::internal(format!("failed to write harness file {name}: {e}")))?;
    }

    let sandbox_config = get_config();
    let result = compile_in_sandbox(
        box_id,
        work_dir,
        &harness.compile_cmd,
        sandbox_config.compile_time_limit_ms,
        sandbox_config.compile_memory_limit_mb,
    )
    .await
    .map_err(|e| JudgeError::compile(format!("signature harness compile failed: {e}")))?;

    if !result.success {
        return Err(JudgeError::compile(
            result.message.unwrap_or_else(|| "signature harness compile failed".to_string()),
        ));
    }

    let run_command = match spec.family {
        SignatureFamily::Cpp => vec![format!("./{}", harness.binary_name)],
        SignatureFamily::Java => vec![
            "java".to_string(),
            "-cp".to_string(),
            ".".to_string(),
            harness.binary_name.clone(),
        ],
    };

    Ok((work_dir.to_path_buf(), run_command))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(allow_main: bool) -> SignatureSpec {
        SignatureSpec {
            family: SignatureFamily::Cpp,
            header_name: "fern.h".to_string(),
            header_content: "int fern(int n);\n".to_string(),
            entry_name: "judge.cpp".to_string(),
            entry_content: "int main() { return 0; }\n".to_string(),
            allow_main,
        }
    }

    #[test]
    fn cpp_harness_renames_main_unless_allowed() {
        let harness = build_cpp_harness("int main() { return fern(1); }", 42, &spec(false));
        let submission = &harness.files[0].1;
        assert!(submission.contains("#include \"fern.h\""));
        assert!(submission.contains("#define main main_"));
    }

    #[test]
    fn cpp_harness_leaves_main_alone_when_allowed() {
        let harness = build_cpp_harness("int main() { return 0; }", 42, &spec(true));
        let submission = &harness.files[0].1;
        assert!(!submission.contains("#define main"));
    }

    #[test]
    fn cpp_harness_names_submission_file_by_problem_id() {
        let harness = build_cpp_harness("", 7, &spec(false));
        assert_eq!(harness.files[0].0, "7_submission.cpp");
    }

    #[test]
    fn java_class_name_extracted_from_public_class_declaration() {
        let source = "import java.util.*;\npublic class Fern {\n    public static void main(String[] a) {}\n}\n";
        assert_eq!(submission_class_name(source), "Fern");
    }

    #[test]
    fn java_class_name_falls_back_when_unparseable() {
        assert_eq!(submission_class_name("// no class here"), "Submission");
    }
}
