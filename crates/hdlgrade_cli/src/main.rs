//! hdlgrade CLI, the command-line front end of the hdlgrade grader.
//!
//! Provides `hdlgrade grade` for grading a submission against test vectors,
//! `hdlgrade check` for compiling a submission and printing its diagnostics,
//! and `hdlgrade verify` for checking that problem definitions are solvable
//! by their own reference solutions.

#![warn(missing_docs)]

mod check;
mod grade;
mod report;
mod verify;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use hdlgrade_config::{HdlgradeConfig, OutputFormat};
use hdlgrade_grader::{GradeOptions, Grader};
use hdlgrade_verilog::ParseLimits;

/// Grades Verilog submissions against test vectors.
#[derive(Parser, Debug)]
#[command(name = "hdlgrade", version, about = "Verilog subset grader")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Control colored output. Defaults to the configuration file's setting.
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorArg>,

    /// Path to a custom `hdlgrade.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Grade a submission against test vectors.
    Grade(GradeArgs),
    /// Compile a submission and print its diagnostics.
    Check(CheckArgs),
    /// Grade each problem's reference solution against its own test cases.
    Verify(VerifyArgs),
}

/// Arguments for `hdlgrade grade`.
#[derive(Parser, Debug)]
pub struct GradeArgs {
    /// The Verilog source file.
    pub source: PathBuf,

    /// JSON file with an array of test vectors, or a problem definition.
    #[arg(long)]
    pub vectors: PathBuf,

    /// Output format for results.
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormat>,
}

/// Arguments for `hdlgrade check`.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// The Verilog source file.
    pub source: PathBuf,

    /// Output format for diagnostics.
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormat>,
}

/// Arguments for `hdlgrade verify`.
#[derive(Parser, Debug)]
pub struct VerifyArgs {
    /// Problem definition files.
    #[arg(required = true)]
    pub problems: Vec<PathBuf>,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorArg {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Result and diagnostic output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => ReportFormat::Text,
            OutputFormat::Json => ReportFormat::Json,
        }
    }
}

/// Global settings derived from CLI flags and the configuration file.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// The resolved configuration.
    pub config: HdlgradeConfig,
}

impl GlobalArgs {
    /// The output format: the flag when given, else the configured one.
    pub fn format(&self, flag: Option<ReportFormat>) -> ReportFormat {
        flag.unwrap_or_else(|| self.config.output.format.into())
    }

    /// A grader configured from the resolved settings.
    pub fn grader(&self, file_name: &Path) -> Grader {
        let limits = &self.config.limits;
        Grader::new(GradeOptions {
            limits: ParseLimits {
                max_expression_depth: limits.max_expression_depth,
                max_statements: limits.max_statements,
            },
            trace: self.config.trace.enabled,
            file_name: file_name.to_path_buf(),
        })
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let result = resolve_globals(&cli).and_then(|global| match cli.command {
        Command::Grade(ref args) => grade::run(args, &global),
        Command::Check(ref args) => check::run(args, &global),
        Command::Verify(ref args) => verify::run(args, &global),
    });

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

fn log_level(quiet: bool, verbose: u8) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn init_logging(quiet: bool, verbose: u8) {
    tracing_subscriber::fmt()
        .with_env_filter(log_level(quiet, verbose))
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_globals(cli: &Cli) -> Result<GlobalArgs, Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let config = hdlgrade_config::resolve_config(cli.config.as_deref(), &cwd)?;
    let choice = cli.color.unwrap_or(match config.output.color {
        hdlgrade_config::ColorChoice::Auto => ColorArg::Auto,
        hdlgrade_config::ColorChoice::Always => ColorArg::Always,
        hdlgrade_config::ColorChoice::Never => ColorArg::Never,
    });
    let color = match choice {
        ColorArg::Auto => std::io::stderr().is_terminal(),
        ColorArg::Always => true,
        ColorArg::Never => false,
    };
    Ok(GlobalArgs {
        quiet: cli.quiet,
        color,
        config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_grade() {
        let cli = Cli::parse_from(["hdlgrade", "grade", "and.v", "--vectors", "and.json"]);
        match cli.command {
            Command::Grade(ref args) => {
                assert_eq!(args.source, PathBuf::from("and.v"));
                assert_eq!(args.vectors, PathBuf::from("and.json"));
                assert!(args.format.is_none());
            }
            _ => panic!("expected Grade command"),
        }
    }

    #[test]
    fn grade_requires_vectors() {
        assert!(Cli::try_parse_from(["hdlgrade", "grade", "and.v"]).is_err());
    }

    #[test]
    fn parse_check_json() {
        let cli = Cli::parse_from(["hdlgrade", "check", "and.v", "--format", "json"]);
        match cli.command {
            Command::Check(ref args) => {
                assert_eq!(args.format, Some(ReportFormat::Json));
            }
            _ => panic!("expected Check command"),
        }
    }

    #[test]
    fn parse_verify_many() {
        let cli = Cli::parse_from(["hdlgrade", "verify", "p1.json", "p2.json"]);
        match cli.command {
            Command::Verify(ref args) => assert_eq!(args.problems.len(), 2),
            _ => panic!("expected Verify command"),
        }
        assert!(Cli::try_parse_from(["hdlgrade", "verify"]).is_err());
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from([
            "hdlgrade",
            "-vv",
            "--color",
            "never",
            "--config",
            "ci.toml",
            "check",
            "a.v",
        ]);
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
        assert_eq!(cli.color, Some(ColorArg::Never));
        assert_eq!(cli.config, Some(PathBuf::from("ci.toml")));
    }

    #[test]
    fn log_levels() {
        assert_eq!(log_level(false, 0), "warn");
        assert_eq!(log_level(false, 1), "info");
        assert_eq!(log_level(false, 2), "debug");
        assert_eq!(log_level(false, 7), "trace");
        assert_eq!(log_level(true, 3), "error");
    }

    #[test]
    fn flags_override_configured_format() {
        let mut config = HdlgradeConfig::default();
        config.output.format = OutputFormat::Json;
        let global = GlobalArgs {
            quiet: false,
            color: false,
            config,
        };
        assert_eq!(global.format(None), ReportFormat::Json);
        assert_eq!(global.format(Some(ReportFormat::Text)), ReportFormat::Text);
    }

    #[test]
    fn grader_uses_configured_limits() {
        let mut config = HdlgradeConfig::default();
        config.limits.max_statements = 3;
        config.trace.enabled = true;
        let global = GlobalArgs {
            quiet: false,
            color: false,
            config,
        };
        let grader = global.grader(Path::new("sub.v"));
        assert_eq!(grader.options().limits.max_statements, 3);
        assert!(grader.options().trace);
        assert_eq!(grader.options().file_name, PathBuf::from("sub.v"));
    }
}
