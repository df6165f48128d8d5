//! Diagnostic rendering for terminals and machine consumers.

use crate::diagnostic::{Diagnostic, LabelStyle, Severity};
use hdlgrade_source::SourceDb;

/// Formats one diagnostic as a string.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic.
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String;
}

/// Renders diagnostics in a rustc-style terminal format.
///
/// ```text
/// error[E101]: missing ';' after assignment
///  --> half_adder.v:2:20
///   |
/// 2 |   assign sum = a ^ b
///   |                    ^ statement ends here
///   = help: insert ';'
/// ```
pub struct TerminalRenderer {
    /// Whether to emit ANSI color codes.
    pub color: bool,
}

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[1;31m";
const YELLOW: &str = "\x1b[1;33m";
const BLUE: &str = "\x1b[1;34m";
const CYAN: &str = "\x1b[1;36m";

impl TerminalRenderer {
    /// Creates a terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, style: &str, text: &str) -> String {
        if self.color {
            format!("{style}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn severity_style(severity: Severity) -> &'static str {
        match severity {
            Severity::Error => RED,
            Severity::Warning => YELLOW,
            Severity::Note | Severity::Help => CYAN,
        }
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String {
        let mut out = String::new();
        let style = Self::severity_style(diag.severity);

        out.push_str(&format!(
            "{}{}\n",
            self.paint(style, &format!("{}[{}]", diag.severity, diag.code)),
            self.paint(BOLD, &format!(": {}", diag.message)),
        ));

        let mut gutter = String::from("  ");
        if !diag.primary_span.is_dummy() {
            let resolved = source_db.resolve_span(diag.primary_span);
            let file = source_db.get_file(diag.primary_span.file);
            let line_num = resolved.start_line.to_string();
            gutter = " ".repeat(line_num.len());

            out.push_str(&format!("{gutter}{} {resolved}\n", self.paint(BLUE, "-->")));
            out.push_str(&format!("{gutter} {}\n", self.paint(BLUE, "|")));
            out.push_str(&format!(
                "{} {}\n",
                self.paint(BLUE, &format!("{line_num} |")),
                file.line_text(diag.primary_span.start)
            ));

            let line_len = file.line_text(diag.primary_span.start).len() as u32;
            let col = resolved.start_col.saturating_sub(1);
            let underline_len = if resolved.end_line == resolved.start_line {
                diag.primary_span.len()
            } else {
                line_len.saturating_sub(col)
            }
            .max(1) as usize;
            let primary_msg = diag
                .labels
                .iter()
                .find(|l| l.style == LabelStyle::Primary)
                .map(|l| format!(" {}", l.message))
                .unwrap_or_default();
            out.push_str(&format!(
                "{gutter} {} {}{}\n",
                self.paint(BLUE, "|"),
                " ".repeat(col as usize),
                self.paint(style, &format!("{}{primary_msg}", "^".repeat(underline_len))),
            ));
        }

        for label in diag.labels.iter().filter(|l| l.style == LabelStyle::Secondary) {
            if label.span.is_dummy() {
                continue;
            }
            let resolved = source_db.resolve_span(label.span);
            out.push_str(&format!("{gutter} = note: {} ({resolved})\n", label.message));
        }
        for note in &diag.notes {
            out.push_str(&format!("{gutter} = note: {note}\n"));
        }
        for help in &diag.help {
            out.push_str(&format!("{gutter} = help: {help}\n"));
        }
        if let Some(fix) = &diag.fix {
            out.push_str(&format!("{gutter} = help: {}\n", fix.message));
        }

        out
    }
}

/// Renders each diagnostic as one JSON object with resolved positions.
///
/// Fields: `severity`, `code`, `kind` (null for warnings), `message`, and
/// when the span is real `file`, `line`, `column`, `end_line`, `end_column`;
/// plus `notes`, `help` and `fix`.
#[derive(Default)]
pub struct JsonRenderer {
    /// Whether to pretty-print.
    pub pretty: bool,
}

impl JsonRenderer {
    /// Creates a JSON renderer.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Builds the JSON value for a diagnostic.
    pub fn to_value(&self, diag: &Diagnostic, source_db: &SourceDb) -> serde_json::Value {
        let mut obj = serde_json::json!({
            "severity": diag.severity,
            "code": diag.code.to_string(),
            "kind": diag.kind(),
            "message": diag.message,
            "notes": diag.notes,
            "help": diag.help,
            "fix": diag.fix.as_ref().map(|f| serde_json::json!({
                "message": f.message,
                "edits": f.replacements.iter().map(|r| serde_json::json!({
                    "start": r.span.start,
                    "end": r.span.end,
                    "text": r.new_text,
                })).collect::<Vec<_>>(),
            })),
        });
        if !diag.primary_span.is_dummy() {
            let resolved = source_db.resolve_span(diag.primary_span);
            obj["file"] = resolved.file_path.display().to_string().into();
            obj["line"] = resolved.start_line.into();
            obj["column"] = resolved.start_col.into();
            obj["end_line"] = resolved.end_line.into();
            obj["end_column"] = resolved.end_col.into();
        }
        obj
    }
}

impl DiagnosticRenderer for JsonRenderer {
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String {
        let value = self.to_value(diag, source_db);
        let rendered = if self.pretty {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        };
        rendered.unwrap_or_default()
    }
}
