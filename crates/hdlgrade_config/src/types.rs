//! Configuration types deserialized from `hdlgrade.toml`.

use serde::{Deserialize, Serialize};

/// The top-level configuration parsed from `hdlgrade.toml`.
///
/// Every section is optional; a missing section takes its defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HdlgradeConfig {
    /// Bounds on pathological submissions.
    pub limits: LimitsConfig,
    /// How results and diagnostics are printed.
    pub output: OutputConfig,
    /// Evaluation tracing.
    pub trace: TraceConfig,
}

/// Bounds applied while compiling a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Deepest allowed expression nesting.
    pub max_expression_depth: usize,
    /// Most assignments allowed in one module.
    pub max_statements: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_expression_depth: 256,
            max_statements: 4096,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Result format.
    pub format: OutputFormat,
    /// When to color terminal output.
    pub color: ColorChoice,
}

/// Result format for the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON document.
    Json,
}

/// When to emit ANSI color codes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    /// Color when writing to a terminal.
    #[default]
    Auto,
    /// Always color.
    Always,
    /// Never color.
    Never,
}

/// Evaluation trace settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Forward every evaluation step to the log at `trace` level.
    pub enabled: bool,
}
