//! Evaluation of compiled hdlgrade modules.
//!
//! A [`Module`](hdlgrade_ir::Module) is evaluated as a pure function from
//! input values to output values: one pass over the statements in
//! declaration order, with no time, events or state carried between calls.
//! See [`evaluator`] for the width rules.

#![warn(missing_docs)]

pub mod error;
pub mod evaluator;
pub mod table;
pub mod trace;

pub use error::EvalError;
pub use evaluator::{evaluate, evaluate_with_trace, SignalValues};
pub use table::SignalTable;
pub use trace::{NoTrace, RecordedEvent, RecordingTrace, TraceEvent, TraceSink, TracingSink};
