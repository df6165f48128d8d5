//! Evaluation error types.
//!
//! Every failure of a single evaluation is an [`EvalError`]. Each variant
//! maps onto the grading taxonomy through [`EvalError::kind`].

use hdlgrade_diagnostics::ErrorKind;

/// Errors that can occur while evaluating a module against one binding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    /// A declared input has no value in the binding.
    #[error("Missing input value for port: {port}")]
    MissingInput {
        /// The unbound input port.
        port: String,
    },

    /// A bound input value needs more bits than its port has.
    #[error("value {value} for input '{port}' does not fit in {width} bit(s)")]
    InputTooWide {
        /// The input port.
        port: String,
        /// The value as given.
        value: String,
        /// The declared port width.
        width: u32,
    },

    /// A signal was read before any statement wrote it in this pass.
    #[error("'{name}' is read before it is assigned")]
    ReadBeforeWrite {
        /// The signal name.
        name: String,
    },

    /// Division or modulo with a zero divisor.
    #[error("division by zero")]
    DivisionByZero,

    /// A bit or part select outside the selected value.
    #[error("bit {index} of '{name}' is outside its {width}-bit value")]
    IndexOutOfRange {
        /// The selected signal.
        name: String,
        /// The offending bit position.
        index: u64,
        /// Width of the value that was selected from.
        width: u32,
    },

    /// A concatenation wider than the widest supported value.
    #[error("concatenation is {width} bits wide; at most 64 bits are supported")]
    ConcatTooWide {
        /// The total width of the parts.
        width: u32,
    },

    /// An output port was never written.
    #[error("output port '{port}' was never assigned")]
    UnassignedOutput {
        /// The undriven output port.
        port: String,
    },

    /// Any other evaluation failure.
    #[error("evaluation error: {reason}")]
    Evaluation {
        /// Description of what went wrong.
        reason: String,
    },
}

impl EvalError {
    /// Returns the grading error kind for this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EvalError::MissingInput { .. } => ErrorKind::MissingInputError,
            EvalError::UnassignedOutput { .. } => ErrorKind::UnassignedOutputError,
            EvalError::InputTooWide { .. }
            | EvalError::ReadBeforeWrite { .. }
            | EvalError::DivisionByZero
            | EvalError::IndexOutOfRange { .. }
            | EvalError::ConcatTooWide { .. }
            | EvalError::Evaluation { .. } => ErrorKind::EvaluationError,
        }
    }
}
