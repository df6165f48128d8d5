//! `hdlgrade grade`: grade a submission against test vectors.
//!
//! 1. Read the source and the vectors file
//! 2. Compile, printing warnings or the compile errors to stderr
//! 3. Grade every vector (or fail them all when compilation failed)
//! 4. Print one line per vector and a summary, or one JSON document

use hdlgrade_common::ContentHash;
use hdlgrade_grader::{compile_error, fail_all, load_vectors, GradeSummary};
use hdlgrade_verilog::compile;

use crate::report::{render_text, result_line, results_json};
use crate::{GlobalArgs, GradeArgs, ReportFormat};

/// Runs the `hdlgrade grade` command.
///
/// Returns exit code 0 if every vector passed, 1 otherwise.
pub fn run(args: &GradeArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(&args.source)?;
    let vectors = load_vectors(&args.vectors)?;
    let format = global.format(args.format);
    let grader = global.grader(&args.source);
    let hash = ContentHash::from_bytes(source.as_bytes());
    tracing::debug!(source = %args.source.display(), hash = %hash.short(), "grading submission");

    let results = match compile(&source, &grader.compile_options()) {
        Ok(compiled) => {
            if !global.quiet && format == ReportFormat::Text && !compiled.warnings.is_empty() {
                eprintln!(
                    "{}",
                    render_text(&compiled.warnings, &compiled.source_db, global.color)
                );
            }
            grader.grade_module(&compiled.module, &vectors)
        }
        Err(failure) => {
            if format == ReportFormat::Text {
                eprintln!(
                    "{}",
                    render_text(&failure.diagnostics, &failure.source_db, global.color)
                );
            }
            fail_all(&compile_error(&failure), &vectors)
        }
    };

    let summary = GradeSummary::from_results(&results);
    match format {
        ReportFormat::Text => {
            for result in &results {
                if !global.quiet || !result.passed {
                    println!("{}", result_line(result));
                }
            }
            if !global.quiet {
                println!("{summary}");
            }
        }
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&results_json(hash, &results))?);
        }
    }

    Ok(if summary.all_passed() { 0 } else { 1 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdlgrade_config::HdlgradeConfig;
    use std::path::{Path, PathBuf};

    fn global() -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            color: false,
            config: HdlgradeConfig::default(),
        }
    }

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    const VECTORS: &str = r#"[
        {"description": "0 0", "inputs": {"a": "0", "b": "0"}, "outputs": {"out": "0"}},
        {"description": "1 1", "inputs": {"a": "1", "b": "1"}, "outputs": {"out": "1"}}
    ]"#;

    #[test]
    fn passing_submission_exits_zero() {
        let dir = tempfile::tempdir().unwrap();
        let args = GradeArgs {
            source: write(
                dir.path(),
                "and.v",
                "module and_gate(input a, input b, output out);\n  assign out = a & b;\nendmodule\n",
            ),
            vectors: write(dir.path(), "vectors.json", VECTORS),
            format: Some(ReportFormat::Json),
        };
        assert_eq!(run(&args, &global()).unwrap(), 0);
    }

    #[test]
    fn wrong_submission_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let args = GradeArgs {
            source: write(
                dir.path(),
                "and.v",
                "module and_gate(input a, input b, output out);\n  assign out = a | b;\nendmodule\n",
            ),
            vectors: write(dir.path(), "vectors.json", VECTORS),
            format: None,
        };
        assert_eq!(run(&args, &global()).unwrap(), 1);
    }

    #[test]
    fn broken_submission_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let args = GradeArgs {
            source: write(dir.path(), "and.v", "module and_gate(input a, output out);\n"),
            vectors: write(dir.path(), "vectors.json", VECTORS),
            format: Some(ReportFormat::Text),
        };
        assert_eq!(run(&args, &global()).unwrap(), 1);
    }

    #[test]
    fn missing_files_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let args = GradeArgs {
            source: dir.path().join("missing.v"),
            vectors: write(dir.path(), "vectors.json", VECTORS),
            format: None,
        };
        assert!(run(&args, &global()).is_err());

        let args = GradeArgs {
            source: write(dir.path(), "and.v", "module m(input a, output y); assign y = a; endmodule"),
            vectors: write(dir.path(), "bad.json", "{not json"),
            format: None,
        };
        assert!(run(&args, &global()).is_err());
    }
}
