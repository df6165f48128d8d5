//! Test vectors and per-vector results.

use hdlgrade_diagnostics::ErrorKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Port name to textual value, e.g. `{"a": "1010"}`.
pub type Binding = BTreeMap<String, String>;

/// One named input snapshot and the outputs it should produce.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TestVector {
    /// Human-readable description shown next to the verdict.
    #[serde(default)]
    pub description: String,
    /// Values for the input ports.
    #[serde(default)]
    pub inputs: Binding,
    /// Values the output ports must take. Only listed outputs are compared.
    #[serde(alias = "outputs")]
    pub expected_outputs: Binding,
}

impl TestVector {
    /// Creates a vector from `(port, value)` pairs.
    pub fn new(
        description: impl Into<String>,
        inputs: &[(&str, &str)],
        expected_outputs: &[(&str, &str)],
    ) -> Self {
        let collect = |pairs: &[(&str, &str)]| {
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect()
        };
        Self {
            description: description.into(),
            inputs: collect(inputs),
            expected_outputs: collect(expected_outputs),
        }
    }
}

/// Why a vector failed without producing outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeError {
    /// The error classification.
    pub kind: ErrorKind,
    /// What went wrong, with a source position for compile errors.
    pub message: String,
}

impl GradeError {
    /// Creates an error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for GradeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// The verdict for one test vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Position of the vector in the submitted list.
    pub index: usize,
    /// Whether every expected output matched.
    pub passed: bool,
    /// The vector's description.
    pub description: String,
    /// The vector's expected outputs, as given.
    pub expected: Binding,
    /// Every output port as a bit string, absent when evaluation failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<Binding>,
    /// The failure, absent when evaluation succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<GradeError>,
}

impl EvaluationResult {
    /// A failed result carrying `error` for the vector at `index`.
    pub fn failed(index: usize, vector: &TestVector, error: GradeError) -> Self {
        Self {
            index,
            passed: false,
            description: vector.description.clone(),
            expected: vector.expected_outputs.clone(),
            actual: None,
            error: Some(error),
        }
    }
}

/// Pass/fail counts over a result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GradeSummary {
    /// Number of vectors.
    pub total: usize,
    /// Vectors that passed.
    pub passed: usize,
    /// Vectors that failed.
    pub failed: usize,
}

impl GradeSummary {
    /// Counts `results`.
    pub fn from_results(results: &[EvaluationResult]) -> Self {
        let passed = results.iter().filter(|r| r.passed).count();
        Self {
            total: results.len(),
            passed,
            failed: results.len() - passed,
        }
    }

    /// Returns `true` when no vector failed.
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for GradeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} failed, {} total",
            self.passed, self.failed, self.total
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_outputs_alias() {
        let json = r#"{"inputs": {"a": "1"}, "outputs": {"y": "0"}, "description": "a=1"}"#;
        let vector: TestVector = serde_json::from_str(json).unwrap();
        assert_eq!(vector.expected_outputs["y"], "0");
        assert_eq!(vector.description, "a=1");

        let json = r#"{"inputs": {}, "expected_outputs": {"y": "1"}}"#;
        let vector: TestVector = serde_json::from_str(json).unwrap();
        assert_eq!(vector.expected_outputs["y"], "1");
        assert!(vector.description.is_empty());
    }

    #[test]
    fn result_json_is_snake_case() {
        let vector = TestVector::new("missing b", &[("a", "1")], &[("y", "1")]);
        let result = EvaluationResult::failed(
            2,
            &vector,
            GradeError::new(ErrorKind::MissingInputError, "Missing input value for port: b"),
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["index"], 2);
        assert_eq!(json["passed"], false);
        assert_eq!(json["error"]["kind"], "missing_input_error");
        assert!(json.get("actual").is_none());
    }

    #[test]
    fn summary_counts() {
        let vector = TestVector::default();
        let mut ok = EvaluationResult::failed(0, &vector, GradeError::new(ErrorKind::SyntaxError, "x"));
        ok.passed = true;
        let bad = EvaluationResult::failed(1, &vector, GradeError::new(ErrorKind::SyntaxError, "x"));
        let summary = GradeSummary::from_results(&[ok, bad]);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.passed, 1);
        assert!(!summary.all_passed());
        assert_eq!(summary.to_string(), "1 passed, 1 failed, 2 total");
        assert!(GradeSummary::from_results(&[]).all_passed());
    }

    #[test]
    fn grade_error_display() {
        let err = GradeError::new(ErrorKind::EvaluationError, "division by zero");
        assert_eq!(err.to_string(), "EvaluationError: division by zero");
    }
}
