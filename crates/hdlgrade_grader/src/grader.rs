//! The grading harness.
//!
//! A submission is compiled once. If compilation fails, every vector fails
//! with the first compile error. Otherwise each vector is evaluated on its
//! own: a vector-scoped failure such as a missing input never affects the
//! vectors around it.

use crate::compare::values_match;
use crate::vector::{Binding, EvaluationResult, GradeError, TestVector};
use hdlgrade_common::{Radix, Value};
use hdlgrade_diagnostics::ErrorKind;
use hdlgrade_ir::Module;
use hdlgrade_sim::{evaluate_with_trace, NoTrace, SignalValues, TraceSink, TracingSink};
use hdlgrade_verilog::{compile, CompileFailure, CompileOptions, ParseLimits};
use std::path::PathBuf;

/// Grader settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeOptions {
    /// Bounds applied while compiling.
    pub limits: ParseLimits,
    /// Forward evaluation events to `tracing` at `trace` level.
    pub trace: bool,
    /// Name used for the submission in diagnostics.
    pub file_name: PathBuf,
}

impl Default for GradeOptions {
    fn default() -> Self {
        Self {
            limits: ParseLimits::default(),
            trace: false,
            file_name: PathBuf::from("submission.v"),
        }
    }
}

/// Compiles submissions and grades them against test vectors.
#[derive(Debug, Clone, Default)]
pub struct Grader {
    options: GradeOptions,
}

impl Grader {
    /// Creates a grader.
    pub fn new(options: GradeOptions) -> Self {
        Self { options }
    }

    /// The grader's settings.
    pub fn options(&self) -> &GradeOptions {
        &self.options
    }

    /// Options for [`compile`] derived from these settings.
    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            file_name: self.options.file_name.clone(),
            limits: self.options.limits,
        }
    }

    /// Compiles `source` and grades it against `vectors`.
    ///
    /// Always returns one result per vector, in order.
    pub fn grade(&self, source: &str, vectors: &[TestVector]) -> Vec<EvaluationResult> {
        match compile(source, &self.compile_options()) {
            Ok(compiled) => self.grade_module(&compiled.module, vectors),
            Err(failure) => {
                let error = compile_error(&failure);
                tracing::debug!(kind = %error.kind, "submission rejected");
                fail_all(&error, vectors)
            }
        }
    }

    /// Grades an already compiled module.
    pub fn grade_module(&self, module: &Module, vectors: &[TestVector]) -> Vec<EvaluationResult> {
        let results: Vec<_> = vectors
            .iter()
            .enumerate()
            .map(|(index, vector)| self.grade_vector(module, index, vector))
            .collect();
        tracing::debug!(
            module = module.name_str(),
            vectors = results.len(),
            passed = results.iter().filter(|r| r.passed).count(),
            "graded submission"
        );
        results
    }

    fn grade_vector(&self, module: &Module, index: usize, vector: &TestVector) -> EvaluationResult {
        let outputs = bind_inputs(module, &vector.inputs).and_then(|inputs| {
            let mut tracing_sink = TracingSink;
            let mut silent = NoTrace;
            let trace: &mut dyn TraceSink = if self.options.trace {
                &mut tracing_sink
            } else {
                &mut silent
            };
            evaluate_with_trace(module, &inputs, trace)
                .map_err(|err| GradeError::new(err.kind(), err.to_string()))
        });
        let actual = match outputs {
            Ok(outputs) => to_binding(&outputs),
            Err(error) => return EvaluationResult::failed(index, vector, error),
        };
        let passed = vector.expected_outputs.iter().all(|(name, expected)| {
            actual
                .get(name)
                .is_some_and(|value| values_match(expected, value))
        });
        EvaluationResult {
            index,
            passed,
            description: vector.description.clone(),
            expected: vector.expected_outputs.clone(),
            actual: Some(actual),
            error: None,
        }
    }
}

/// Compiles `source` and grades it against `vectors` with default settings.
pub fn compile_and_grade(source: &str, vectors: &[TestVector]) -> Vec<EvaluationResult> {
    Grader::default().grade(source, vectors)
}

/// Fails every vector with the same error.
pub fn fail_all(error: &GradeError, vectors: &[TestVector]) -> Vec<EvaluationResult> {
    vectors
        .iter()
        .enumerate()
        .map(|(index, vector)| EvaluationResult::failed(index, vector, error.clone()))
        .collect()
}

/// The grading error for a failed compile: the first error's kind, and its
/// message prefixed with the line and column.
pub fn compile_error(failure: &CompileFailure) -> GradeError {
    let Some(first) = failure.first_error() else {
        return GradeError::new(ErrorKind::SyntaxError, "compilation failed");
    };
    let kind = first.kind().unwrap_or(ErrorKind::SyntaxError);
    let message = if first.primary_span.is_dummy() {
        first.message.clone()
    } else {
        let at = failure.source_db.resolve_span(first.primary_span);
        format!(
            "line {}, column {}: {}",
            at.start_line, at.start_col, first.message
        )
    };
    GradeError::new(kind, message)
}

/// Parses the vector's values for the module's input ports.
///
/// Names that are not input ports are skipped.
fn bind_inputs(module: &Module, inputs: &Binding) -> Result<SignalValues, GradeError> {
    let mut bound = SignalValues::new();
    for (name, text) in inputs {
        if !module.port_by_name(name).is_some_and(|p| p.is_input()) {
            tracing::debug!(name = name.as_str(), "ignoring value for a name that is not an input");
            continue;
        }
        let value = Value::parse_literal(text, Radix::Binary).map_err(|err| {
            GradeError::new(
                ErrorKind::EvaluationError,
                format!("invalid value for input '{name}': {err}"),
            )
        })?;
        bound.insert(name.clone(), value);
    }
    Ok(bound)
}

fn to_binding(outputs: &SignalValues) -> Binding {
    outputs
        .iter()
        .map(|(name, value)| (name.clone(), value.to_bit_string()))
        .collect()
}
