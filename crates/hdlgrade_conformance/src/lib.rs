//! Conformance test helpers for the hdlgrade pipeline.
//!
//! Provides shared functions that run submission text through compile and
//! grade and return structured results for assertion in integration tests.

#![warn(missing_docs)]

use hdlgrade_grader::{compile_and_grade, EvaluationResult, GradeError, GradeSummary};
use hdlgrade_verilog::{compile, CompileOptions};

pub use hdlgrade_diagnostics::ErrorKind;
pub use hdlgrade_grader::TestVector;

/// Result of grading a submission.
pub struct GradeOutcome {
    /// One result per vector.
    pub results: Vec<EvaluationResult>,
    /// Pass/fail counts.
    pub summary: GradeSummary,
}

impl GradeOutcome {
    /// The error shared by every result, if compilation failed.
    pub fn fatal_error(&self) -> Option<&GradeError> {
        let first = self.results.first()?.error.as_ref()?;
        self.results
            .iter()
            .all(|r| r.error.as_ref() == Some(first) && r.actual.is_none())
            .then_some(first)
    }

    /// Output `port` of vector `index`, if it was evaluated.
    pub fn actual(&self, index: usize, port: &str) -> Option<&str> {
        self.results
            .get(index)?
            .actual
            .as_ref()?
            .get(port)
            .map(String::as_str)
    }
}

/// Grades `source` against `vectors`.
pub fn grade(source: &str, vectors: &[TestVector]) -> GradeOutcome {
    let results = compile_and_grade(source, vectors);
    let summary = GradeSummary::from_results(&results);
    GradeOutcome { results, summary }
}

/// Builds the exhaustive truth table of single-bit `inputs`.
///
/// `f` receives the input bits in the order of `inputs` and returns the
/// expected value of every output in `outputs`, as bit strings.
pub fn truth_table(
    inputs: &[&str],
    outputs: &[&str],
    f: impl Fn(&[u64]) -> Vec<String>,
) -> Vec<TestVector> {
    (0..1u64 << inputs.len())
        .map(|row| {
            let bits: Vec<u64> = (0..inputs.len())
                .map(|i| (row >> (inputs.len() - 1 - i)) & 1)
                .collect();
            let expected = f(&bits);
            let ins: Vec<(String, String)> = inputs
                .iter()
                .zip(&bits)
                .map(|(name, bit)| (name.to_string(), bit.to_string()))
                .collect();
            let description = ins
                .iter()
                .map(|(name, bit)| format!("{name}={bit}"))
                .collect::<Vec<_>>()
                .join(", ");
            TestVector {
                description,
                inputs: ins.into_iter().collect(),
                expected_outputs: outputs
                    .iter()
                    .map(|name| name.to_string())
                    .zip(expected)
                    .collect(),
            }
        })
        .collect()
}

/// Renders `value` as a binary string of `width` bits.
pub fn bits(value: u64, width: usize) -> String {
    format!("{value:0width$b}")
}

/// The kind of the first compile error, or `None` if `source` compiles.
pub fn compile_error_kind(source: &str) -> Option<ErrorKind> {
    compile(source, &CompileOptions::default())
        .err()
        .and_then(|failure| failure.first_error().and_then(|d| d.kind()))
}

/// The codes of the warnings of a submission that compiles.
pub fn warning_codes(source: &str) -> Vec<String> {
    match compile(source, &CompileOptions::default()) {
        Ok(compiled) => compiled.warnings.iter().map(|w| w.code.to_string()).collect(),
        Err(failure) => panic!("expected {source:?} to compile: {failure}"),
    }
}

/// Asserts every vector passed, listing the failures otherwise.
pub fn assert_all_pass(outcome: &GradeOutcome) {
    let failures: Vec<_> = outcome.results.iter().filter(|r| !r.passed).collect();
    assert!(
        failures.is_empty(),
        "{} of {} vectors failed: {}",
        failures.len(),
        outcome.summary.total,
        serde_json::to_string_pretty(&failures).unwrap_or_default()
    );
}
