//! Problem definitions and vector files.
//!
//! A problem is a JSON object in camelCase with its test cases and,
//! optionally, a reference solution:
//!
//! ```json
//! {
//!   "id": "p007",
//!   "title": "NAND Gate Implementation",
//!   "difficulty": "easy",
//!   "testCases": [{"inputs": {"a": "1", "b": "1"}, "outputs": {"out": "0"}}],
//!   "solution": "module nand_gate(...); ... endmodule"
//! }
//! ```

use crate::grader::Grader;
use crate::vector::{EvaluationResult, TestVector};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors loading problems or vector files.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The content is not valid JSON of the expected shape.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The problem has no reference solution to verify.
    #[error("problem '{id}' has no reference solution")]
    NoSolution {
        /// The problem id.
        id: String,
    },
}

/// How hard a problem is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Introductory.
    Easy,
    /// Intermediate.
    Medium,
    /// Advanced.
    Hard,
}

/// A gradable exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    /// Stable identifier, e.g. `p007`.
    pub id: String,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Difficulty, if rated.
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    /// Grouping such as "Logic Gates".
    #[serde(default)]
    pub category: String,
    /// Points awarded for solving it.
    #[serde(default)]
    pub points: Option<u32>,
    /// Problem statement.
    #[serde(default)]
    pub description: String,
    /// Requirements listed to the learner.
    #[serde(default)]
    pub constraints: Vec<String>,
    /// Template the learner starts from.
    #[serde(default)]
    pub starter_code: String,
    /// The vectors submissions are graded against.
    pub test_cases: Vec<TestVector>,
    /// A reference solution that passes every test case.
    #[serde(default)]
    pub solution: Option<String>,
}

impl Problem {
    /// Parses a problem from JSON text.
    pub fn from_json(text: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads a problem file.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        Self::from_json(&read(path)?)
    }
}

fn read(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses test vectors from either a JSON array of vectors or a problem
/// object, whose `testCases` are used.
pub fn parse_vectors(text: &str) -> Result<Vec<TestVector>, LoadError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    if value.is_array() {
        Ok(serde_json::from_value(value)?)
    } else {
        let problem: Problem = serde_json::from_value(value)?;
        Ok(problem.test_cases)
    }
}

/// Reads a vectors file; see [`parse_vectors`].
pub fn load_vectors(path: &Path) -> Result<Vec<TestVector>, LoadError> {
    parse_vectors(&read(path)?)
}

/// Grades a problem's reference solution against its own test cases.
///
/// Any failing result means the problem definition is inconsistent.
pub fn verify_problem(
    grader: &Grader,
    problem: &Problem,
) -> Result<Vec<EvaluationResult>, LoadError> {
    let solution = problem.solution.as_deref().ok_or_else(|| LoadError::NoSolution {
        id: problem.id.clone(),
    })?;
    tracing::debug!(id = problem.id.as_str(), vectors = problem.test_cases.len(), "verifying problem");
    Ok(grader.grade(solution, &problem.test_cases))
}
