//! Structured diagnostic messages with severity, codes, labels, and fixes.

use crate::code::{DiagnosticCode, ErrorKind};
use hdlgrade_source::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The severity level of a diagnostic, ordered from least to most severe.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A suggestion that does not indicate a problem.
    Help,
    /// Additional context.
    Note,
    /// A likely mistake that does not stop grading.
    Warning,
    /// A problem that rejects the submission.
    Error,
}

impl Severity {
    /// Returns `true` if this severity is [`Error`](Severity::Error).
    pub fn is_error(self) -> bool {
        self == Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Help => write!(f, "help"),
            Severity::Note => write!(f, "note"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// The visual style of a diagnostic label.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum LabelStyle {
    /// The main location, underlined with `^`.
    Primary,
    /// Related context, underlined with `-`.
    Secondary,
}

/// An annotated source span within a diagnostic.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Label {
    /// The source span this label annotates.
    pub span: Span,
    /// The message displayed next to the underline.
    pub message: String,
    /// Primary or secondary.
    pub style: LabelStyle,
}

impl Label {
    /// Creates a primary label.
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Primary,
        }
    }

    /// Creates a secondary label.
    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Secondary,
        }
    }
}

/// A text replacement that is part of a [`SuggestedFix`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    /// The span to replace. An empty span is an insertion point.
    pub span: Span,
    /// The text to put there.
    pub new_text: String,
}

/// A machine-applicable edit attached to a diagnostic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedFix {
    /// What the fix does.
    pub message: String,
    /// The edits that implement it.
    pub replacements: Vec<Replacement>,
}

impl SuggestedFix {
    /// A fix that inserts `text` at `at`.
    pub fn insert(message: impl Into<String>, at: Span, text: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            replacements: vec![Replacement {
                span: at,
                new_text: text.into(),
            }],
        }
    }
}

/// A structured diagnostic message.
///
/// Each diagnostic has a severity and code, a primary message and span, and
/// optionally labels, notes, help text, and a suggested fix.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level.
    pub severity: Severity,
    /// The code identifying the kind of problem.
    pub code: DiagnosticCode,
    /// The main message.
    pub message: String,
    /// Where the problem was detected.
    pub primary_span: Span,
    /// Additional annotated spans.
    pub labels: Vec<Label>,
    /// Explanatory footnotes.
    pub notes: Vec<String>,
    /// Actionable suggestions.
    pub help: Vec<String>,
    /// An auto-applicable fix, if one exists.
    pub fix: Option<SuggestedFix>,
}

impl Diagnostic {
    /// Creates an error diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::with_severity(Severity::Error, code, message.into(), span)
    }

    /// Creates a warning diagnostic.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::with_severity(Severity::Warning, code, message.into(), span)
    }

    /// Creates an error diagnostic with the code of `kind`.
    pub fn of_kind(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self::error(kind.code(), message, span)
    }

    fn with_severity(severity: Severity, code: DiagnosticCode, message: String, span: Span) -> Self {
        Self {
            severity,
            code,
            message,
            primary_span: span,
            labels: Vec::new(),
            notes: Vec::new(),
            help: Vec::new(),
            fix: None,
        }
    }

    /// Returns the error kind of this diagnostic, if it is an error.
    pub fn kind(&self) -> Option<ErrorKind> {
        if self.severity.is_error() {
            self.code.kind()
        } else {
            None
        }
    }

    /// Adds a label.
    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    /// Adds a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Adds a help message.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }

    /// Sets the suggested fix.
    pub fn with_fix(mut self, fix: SuggestedFix) -> Self {
        self.fix = Some(fix);
        self
    }
}
