//! Front end for the graded Verilog subset.
//!
//! [`compile`] turns submission text into an immutable [`Module`] in four
//! stages, stopping at the first stage that reports an error:
//!
//! - **Lexer** ([`lexer`]): tokens with spans; comments and a few compiler
//!   directives are skipped.
//! - **Syntax validator** ([`validate`]): balanced `module`/`endmodule` and
//!   `begin`/`end`, and missing `;` terminators, checked on the token stream
//!   so that malformed input fails fast with one precise diagnostic.
//! - **Parser** ([`parser`]): recursive descent with binding-power
//!   expression parsing and error recovery, producing an [`ast::SourceText`].
//! - **Builder** ([`builder`]): port extraction, name resolution, constant
//!   selects and the module-level checks, producing the [`Module`].

#![warn(missing_docs)]

/// Parse tree types.
pub mod ast;
/// Lowering from the parse tree to the module representation.
pub mod builder;
mod expr;
/// Lexical analysis.
pub mod lexer;
/// Recursive descent parser.
pub mod parser;
/// Port extraction from module headers and declarations.
pub mod ports;
mod stmt;
/// Token types.
pub mod token;
/// Structural checks run before parsing.
pub mod validate;

pub use token::{Token, TokenKind};

use hdlgrade_common::Interner;
use hdlgrade_diagnostics::{Diagnostic, DiagnosticSink};
use hdlgrade_ir::Module;
use hdlgrade_source::{FileId, SourceDb};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Bounds on pathological input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseLimits {
    /// Deepest allowed expression nesting.
    pub max_expression_depth: usize,
    /// Most assignments allowed in one module.
    pub max_statements: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_expression_depth: 256,
            max_statements: 4096,
        }
    }
}

/// Options for [`compile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Name shown in rendered diagnostics.
    pub file_name: PathBuf,
    /// Input bounds.
    pub limits: ParseLimits,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            file_name: PathBuf::from("submission.v"),
            limits: ParseLimits::default(),
        }
    }
}

/// A successfully compiled submission.
#[derive(Debug)]
pub struct Compiled {
    /// The module, ready for evaluation.
    pub module: Module,
    /// Warnings reported along the way.
    pub warnings: Vec<Diagnostic>,
    /// The submission text, for rendering the warnings.
    pub source_db: SourceDb,
    /// The submission's file in `source_db`.
    pub file_id: FileId,
}

/// A submission that failed to compile.
#[derive(Debug)]
pub struct CompileFailure {
    /// Every diagnostic reported, in emission order, warnings included.
    pub diagnostics: Vec<Diagnostic>,
    /// The submission text, for rendering the diagnostics.
    pub source_db: SourceDb,
    /// The submission's file in `source_db`.
    pub file_id: FileId,
}

impl CompileFailure {
    /// The first error in emission order.
    pub fn first_error(&self) -> Option<&Diagnostic> {
        self.diagnostics.iter().find(|d| d.severity.is_error())
    }

    /// Number of errors.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity.is_error())
            .count()
    }
}

impl fmt::Display for CompileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.first_error() {
            Some(first) => {
                let at = self.source_db.resolve_span(first.primary_span);
                write!(
                    f,
                    "{at}: {}[{}]: {}",
                    first.severity, first.code, first.message
                )?;
                let more = self.error_count() - 1;
                if more > 0 {
                    write!(f, " (and {more} more)")?;
                }
                Ok(())
            }
            None => f.write_str("compilation failed"),
        }
    }
}

impl std::error::Error for CompileFailure {}

/// Compiles submission text into a [`Module`].
///
/// Each stage reports into one sink; the pipeline stops after the first
/// stage that reported an error, so a structural problem never produces a
/// cascade of parse errors.
pub fn compile(source: &str, options: &CompileOptions) -> Result<Compiled, CompileFailure> {
    let mut source_db = SourceDb::new();
    let file_id = source_db.add_source(options.file_name.clone(), source.to_string());
    let sink = DiagnosticSink::new();

    // Lexical errors are held back so that a structural problem, when
    // there is one, is the first error reported.
    let lex_sink = DiagnosticSink::new();
    let tokens = lexer::lex(source, file_id, &lex_sink);
    for problem in validate::validate_structure(&tokens, source) {
        sink.emit(problem);
    }
    for diag in lex_sink.take_all() {
        sink.emit(diag);
    }
    if sink.has_errors() {
        tracing::debug!(errors = sink.error_count(), "structural validation failed");
        return Err(failure(&sink, source_db, file_id));
    }

    let interner = Interner::new();
    let ast = parser::Parser::new(
        tokens,
        source,
        &interner,
        &sink,
        options.limits.max_expression_depth,
    )
    .parse_source_text();
    if sink.has_errors() {
        tracing::debug!(errors = sink.error_count(), "parsing failed");
        return Err(failure(&sink, source_db, file_id));
    }

    match builder::build_module(&ast, interner, &sink, &options.limits) {
        Some(module) if !sink.has_errors() => {
            let warnings = sink.take_all();
            tracing::debug!(
                module = module.name_str(),
                warnings = warnings.len(),
                "compiled submission"
            );
            Ok(Compiled {
                module,
                warnings,
                source_db,
                file_id,
            })
        }
        _ => {
            tracing::debug!(errors = sink.error_count(), "module checks failed");
            Err(failure(&sink, source_db, file_id))
        }
    }
}

fn failure(sink: &DiagnosticSink, source_db: SourceDb, file_id: FileId) -> CompileFailure {
    CompileFailure {
        diagnostics: sink.take_all(),
        source_db,
        file_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdlgrade_diagnostics::ErrorKind;

    fn compile_default(source: &str) -> Result<Compiled, CompileFailure> {
        compile(source, &CompileOptions::default())
    }

    fn first_kind(source: &str) -> ErrorKind {
        let failure = compile_default(source).expect_err("expected a failure");
        failure
            .first_error()
            .and_then(|d| d.kind())
            .expect("expected an error kind")
    }

    #[test]
    fn structural_errors_come_before_lexical_ones() {
        let failure = compile_default("module m(input a, output y);\n  assign y = a \\ a;\n")
            .expect_err("expected a failure");
        assert_eq!(failure.error_count(), 2);
        let first = failure.first_error().expect("an error");
        assert_eq!(first.kind(), Some(ErrorKind::StructuralError));
        assert!(failure
            .diagnostics
            .iter()
            .any(|d| d.message == "unrecognized character '\\'"));
    }

    #[test]
    fn compiles_and_gate() {
        let compiled = compile_default(
            "module and_gate(input a, input b, output out);\n  assign out = a & b;\nendmodule\n",
        )
        .unwrap();
        assert_eq!(compiled.module.name_str(), "and_gate");
        assert_eq!(compiled.module.inputs().count(), 2);
        assert_eq!(compiled.module.outputs().count(), 1);
        assert!(compiled.warnings.is_empty());
    }

    #[test]
    fn structural_errors_stop_before_parsing() {
        let failure = compile_default("module m(input a, output y);\n  assign y = a\nendmodule\n")
            .expect_err("missing semicolon");
        assert_eq!(failure.diagnostics.len(), 1);
        assert_eq!(
            failure.first_error().and_then(|d| d.kind()),
            Some(ErrorKind::StructuralError)
        );
        assert_eq!(
            first_kind("module m(input a, output y);\n assign y = a;\n"),
            ErrorKind::StructuralError
        );
    }

    #[test]
    fn each_stage_reports_its_kind() {
        assert_eq!(
            first_kind("module m(input a, output y);\n always @* begin if (a) y = 1; end\nendmodule"),
            ErrorKind::UnsupportedConstructError
        );
        assert_eq!(
            first_kind("module m(input a, output y);\n assign y = a &;\nendmodule"),
            ErrorKind::SyntaxError
        );
        assert_eq!(
            first_kind("module m(input a, output y);\n assign y = b;\nendmodule"),
            ErrorKind::UnknownIdentifierError
        );
        assert_eq!(
            first_kind("module m(input a, output y);\nendmodule"),
            ErrorKind::UnassignedOutputError
        );
        assert_eq!(
            first_kind("module m(input [0:3] a, output y);\n assign y = a[0];\nendmodule"),
            ErrorKind::PortDeclarationError
        );
    }

    #[test]
    fn warnings_are_kept_on_success() {
        let compiled = compile_default(
            "module dff(input clk, input d, output reg q);\n always @(posedge clk) q <= d;\nendmodule",
        )
        .unwrap();
        let codes: Vec<_> = compiled.warnings.iter().map(|w| w.code.to_string()).collect();
        assert_eq!(codes, ["W201", "W202"]);
    }

    #[test]
    fn failure_display_has_location() {
        let failure = compile_default("module m(input a, output y);\n assign y = b;\nendmodule")
            .expect_err("unknown identifier");
        assert_eq!(
            failure.to_string(),
            "submission.v:2:13: error[E104]: unknown identifier 'b'"
        );
    }

    #[test]
    fn expression_depth_limit_is_configurable() {
        let source = format!(
            "module m(input a, output y);\n assign y = {}a{};\nendmodule",
            "(".repeat(40),
            ")".repeat(40)
        );
        assert!(compile_default(&source).is_ok());
        let options = CompileOptions {
            limits: ParseLimits {
                max_expression_depth: 16,
                ..ParseLimits::default()
            },
            ..CompileOptions::default()
        };
        let failure = compile(&source, &options).expect_err("too deep");
        assert_eq!(failure.error_count(), 1);
        assert_eq!(
            failure.first_error().and_then(|d| d.kind()),
            Some(ErrorKind::SyntaxError)
        );
    }

    #[test]
    fn module_is_shareable_across_threads() {
        let compiled = compile_default("module m(input a, output y); assign y = ~a; endmodule").unwrap();
        let module = std::sync::Arc::new(compiled.module);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let module = std::sync::Arc::clone(&module);
                std::thread::spawn(move || module.outputs().count())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }
    }
}
