//! Diagnostic creation, error classification, and rendering.
//!
//! Every problem found while compiling a submission is a [`Diagnostic`]
//! carrying a [`DiagnosticCode`]. Error codes map one-to-one onto the
//! [`ErrorKind`] taxonomy reported to graders. The thread-safe
//! [`DiagnosticSink`] accumulates diagnostics during a compile, and the
//! [`DiagnosticRenderer`] implementations format them for terminals or JSON.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod sink;

pub use code::{Category, DiagnosticCode, ErrorKind};
pub use diagnostic::{Diagnostic, Label, LabelStyle, Replacement, Severity, SuggestedFix};
pub use renderer::{DiagnosticRenderer, JsonRenderer, TerminalRenderer};
pub use sink::DiagnosticSink;
