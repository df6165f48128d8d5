//! Grading of hardware module submissions against test vectors.
//!
//! [`compile_and_grade`] is the whole pipeline in one call: compile the
//! submission, evaluate it once per [`TestVector`], and compare the outputs
//! with radix-normalized equality. It returns exactly one
//! [`EvaluationResult`] per vector, in order, and never panics on malformed
//! submissions or vectors.
//!
//! ```
//! use hdlgrade_grader::{compile_and_grade, TestVector};
//!
//! let source = "module and_gate(input a, input b, output out);\n  assign out = a & b;\nendmodule";
//! let vectors = [TestVector::new("both high", &[("a", "1"), ("b", "1")], &[("out", "1")])];
//! let results = compile_and_grade(source, &vectors);
//! assert!(results[0].passed);
//! ```

#![warn(missing_docs)]

pub mod compare;
pub mod grader;
pub mod problem;
pub mod vector;

pub use compare::values_match;
pub use grader::{compile_and_grade, compile_error, fail_all, GradeOptions, Grader};
pub use problem::{load_vectors, parse_vectors, verify_problem, Difficulty, LoadError, Problem};
pub use vector::{Binding, EvaluationResult, GradeError, GradeSummary, TestVector};
