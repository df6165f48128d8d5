//! Diagnostic codes and the error-kind taxonomy they map onto.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a diagnostic code, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Error diagnostics, prefixed with `E`.
    Error,
    /// Warning diagnostics, prefixed with `W`.
    Warning,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
        }
    }
}

/// A structured diagnostic code: a category prefix and a number.
///
/// Displayed as the prefix followed by a zero-padded 3-digit number,
/// e.g. `E103` or `W202`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }

    /// Returns the error kind for an error code, or `None` for warnings and
    /// unknown numbers.
    pub fn kind(self) -> Option<ErrorKind> {
        if self.category != Category::Error {
            return None;
        }
        ErrorKind::ALL.into_iter().find(|k| k.code() == self)
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

/// Edge-triggered sensitivity evaluated as a single combinational pass.
pub const W_EDGE_SENSITIVITY: DiagnosticCode = DiagnosticCode::new(Category::Warning, 201);
/// Nonblocking assignment evaluated with blocking semantics.
pub const W_NONBLOCKING: DiagnosticCode = DiagnosticCode::new(Category::Warning, 202);
/// A signal read in a behavioral block is missing from its sensitivity list.
pub const W_INCOMPLETE_SENSITIVITY: DiagnosticCode = DiagnosticCode::new(Category::Warning, 203);
/// An input port is never read.
pub const W_UNUSED_INPUT: DiagnosticCode = DiagnosticCode::new(Category::Warning, 204);

/// The classification reported for a failed compile or a failed vector.
///
/// The first six kinds are fatal to a whole submission. `MissingInputError`
/// and `EvaluationError` only fail the vector that triggered them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Unbalanced `module`/`endmodule` or `begin`/`end`, a missing `;`, or
    /// too many statements.
    StructuralError,
    /// A port list or port range that cannot be resolved.
    PortDeclarationError,
    /// Tokens outside the grammar or malformed literals.
    SyntaxError,
    /// An expression names something never declared.
    UnknownIdentifierError,
    /// A declared output is never driven.
    UnassignedOutputError,
    /// A construct outside the supported subset.
    UnsupportedConstructError,
    /// A test vector omits a declared input.
    MissingInputError,
    /// A runtime failure while evaluating one vector.
    EvaluationError,
}

impl ErrorKind {
    /// Every kind, in code order.
    pub const ALL: [ErrorKind; 8] = [
        ErrorKind::StructuralError,
        ErrorKind::PortDeclarationError,
        ErrorKind::SyntaxError,
        ErrorKind::UnknownIdentifierError,
        ErrorKind::UnassignedOutputError,
        ErrorKind::UnsupportedConstructError,
        ErrorKind::MissingInputError,
        ErrorKind::EvaluationError,
    ];

    /// Returns the diagnostic code used when this kind is reported.
    pub const fn code(self) -> DiagnosticCode {
        let number = match self {
            ErrorKind::StructuralError => 101,
            ErrorKind::PortDeclarationError => 102,
            ErrorKind::SyntaxError => 103,
            ErrorKind::UnknownIdentifierError => 104,
            ErrorKind::UnassignedOutputError => 105,
            ErrorKind::UnsupportedConstructError => 106,
            ErrorKind::MissingInputError => 201,
            ErrorKind::EvaluationError => 202,
        };
        DiagnosticCode::new(Category::Error, number)
    }

    /// Returns `true` if this kind rejects the whole submission rather than
    /// a single vector.
    pub fn is_fatal(self) -> bool {
        !matches!(
            self,
            ErrorKind::MissingInputError | ErrorKind::EvaluationError
        )
    }

    /// Returns the kind's name as shown to learners.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::StructuralError => "StructuralError",
            ErrorKind::PortDeclarationError => "PortDeclarationError",
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::UnknownIdentifierError => "UnknownIdentifierError",
            ErrorKind::UnassignedOutputError => "UnassignedOutputError",
            ErrorKind::UnsupportedConstructError => "UnsupportedConstructError",
            ErrorKind::MissingInputError => "MissingInputError",
            ErrorKind::EvaluationError => "EvaluationError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
