//! `hdlgrade verify`: check problem definitions against their reference
//! solutions.
//!
//! Problems are independent, so they are loaded and graded in parallel.
//! Output is printed in the order the files were given.

use std::path::{Path, PathBuf};

use hdlgrade_grader::{verify_problem, EvaluationResult, GradeSummary, Grader, Problem};
use rayon::prelude::*;

use crate::report::result_line;
use crate::{GlobalArgs, VerifyArgs};

/// The verdict for one problem file.
#[derive(Debug)]
pub struct Outcome {
    /// The problem file.
    pub path: PathBuf,
    /// The problem id and its results, or why it could not be graded.
    pub verdict: Result<(String, Vec<EvaluationResult>), String>,
}

impl Outcome {
    /// Returns `true` when the reference solution passed every test case.
    pub fn is_ok(&self) -> bool {
        matches!(&self.verdict, Ok((_, results)) if GradeSummary::from_results(results).all_passed())
    }
}

/// Loads and grades one problem file.
pub fn verify_file(grader: &Grader, path: &Path) -> Outcome {
    let verdict = Problem::load(path)
        .and_then(|problem| {
            let results = verify_problem(grader, &problem)?;
            Ok((problem.id, results))
        })
        .map_err(|e| e.to_string());
    Outcome {
        path: path.to_path_buf(),
        verdict,
    }
}

/// Runs the `hdlgrade verify` command.
///
/// Returns exit code 0 if every problem's solution passes its test cases.
pub fn run(args: &VerifyArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let outcomes: Vec<Outcome> = args
        .problems
        .par_iter()
        .map(|path| verify_file(&global.grader(path), path))
        .collect();

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    for outcome in &outcomes {
        match &outcome.verdict {
            Ok((id, results)) => {
                let summary = GradeSummary::from_results(results);
                if summary.all_passed() {
                    if !global.quiet {
                        println!("ok     {id} ({} vectors)", summary.total);
                    }
                } else {
                    println!("FAILED {id}: {summary}");
                    for result in results.iter().filter(|r| !r.passed) {
                        println!("       {}", result_line(result));
                    }
                }
            }
            Err(message) => println!("error  {}: {message}", outcome.path.display()),
        }
    }
    if !global.quiet {
        println!(
            "   Result: {} of {} problem(s) verified",
            outcomes.len() - failed,
            outcomes.len()
        );
    }
    tracing::info!(problems = outcomes.len(), failed, "verification finished");

    Ok(if failed == 0 { 0 } else { 1 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdlgrade_config::HdlgradeConfig;

    const XOR: &str = r#"{
        "id": "p010",
        "title": "XOR Gate",
        "testCases": [
            {"inputs": {"a": "0", "b": "1"}, "outputs": {"out": "1"}, "description": "a=0, b=1"},
            {"inputs": {"a": "1", "b": "1"}, "outputs": {"out": "0"}, "description": "a=1, b=1"}
        ],
        "solution": "module xor_gate(input a, input b, output out);\n  assign out = a ^ b;\nendmodule"
    }"#;

    fn global() -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            color: false,
            config: HdlgradeConfig::default(),
        }
    }

    #[test]
    fn good_problem_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xor.json");
        std::fs::write(&path, XOR).unwrap();
        let outcome = verify_file(&Grader::default(), &path);
        assert!(outcome.is_ok(), "{outcome:?}");
        assert_eq!(run(&VerifyArgs { problems: vec![path] }, &global()).unwrap(), 0);
    }

    #[test]
    fn inconsistent_problem_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, XOR.replace("a ^ b", "a | b")).unwrap();
        let outcome = verify_file(&Grader::default(), &path);
        assert!(!outcome.is_ok());
        assert_eq!(run(&VerifyArgs { problems: vec![path] }, &global()).unwrap(), 1);
    }

    #[test]
    fn unreadable_problem_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("xor.json");
        std::fs::write(&good, XOR).unwrap();
        let missing = dir.path().join("missing.json");
        let outcome = verify_file(&Grader::default(), &missing);
        assert!(outcome.verdict.is_err());
        let args = VerifyArgs {
            problems: vec![good, missing],
        };
        assert_eq!(run(&args, &global()).unwrap(), 1);
    }
}
