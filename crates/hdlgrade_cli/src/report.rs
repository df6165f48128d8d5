//! Shared rendering of diagnostics and grading results.

use hdlgrade_common::ContentHash;
use hdlgrade_diagnostics::{Diagnostic, DiagnosticRenderer, JsonRenderer, TerminalRenderer};
use hdlgrade_grader::{Binding, EvaluationResult, GradeSummary};
use hdlgrade_source::SourceDb;

/// Renders diagnostics for a terminal, one block per diagnostic.
pub fn render_text(diagnostics: &[Diagnostic], source_db: &SourceDb, color: bool) -> String {
    let renderer = TerminalRenderer::new(color);
    diagnostics
        .iter()
        .map(|diag| renderer.render(diag, source_db))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders diagnostics as a JSON array.
pub fn diagnostics_json(diagnostics: &[Diagnostic], source_db: &SourceDb) -> serde_json::Value {
    let renderer = JsonRenderer::new(true);
    serde_json::Value::Array(
        diagnostics
            .iter()
            .map(|diag| renderer.to_value(diag, source_db))
            .collect(),
    )
}

/// Counts errors and warnings.
pub fn count(diagnostics: &[Diagnostic]) -> (usize, usize) {
    let errors = diagnostics.iter().filter(|d| d.severity.is_error()).count();
    (errors, diagnostics.len() - errors)
}

fn binding(values: &Binding) -> String {
    values
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One line per vector, e.g. `FAIL #2 a=1, b=0: expected out=1, got out=0`.
pub fn result_line(result: &EvaluationResult) -> String {
    let verdict = if result.passed { "PASS" } else { "FAIL" };
    let mut line = format!("{verdict} #{}", result.index);
    if !result.description.is_empty() {
        line.push(' ');
        line.push_str(&result.description);
    }
    if result.passed {
        return line;
    }
    match (&result.error, &result.actual) {
        (Some(error), _) => line.push_str(&format!(": {error}")),
        (None, Some(actual)) => line.push_str(&format!(
            ": expected {}, got {}",
            binding(&result.expected),
            binding(actual)
        )),
        (None, None) => {}
    }
    line
}

/// The JSON document printed by `grade --format json`.
pub fn results_json(source: ContentHash, results: &[EvaluationResult]) -> serde_json::Value {
    serde_json::json!({
        "source_hash": source.to_string(),
        "results": results,
        "summary": GradeSummary::from_results(results),
    })
}
