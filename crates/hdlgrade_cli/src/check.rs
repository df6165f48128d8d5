//! `hdlgrade check`: compile a submission and print every diagnostic.

use hdlgrade_verilog::compile;

use crate::report::{count, diagnostics_json, render_text};
use crate::{CheckArgs, GlobalArgs, ReportFormat};

/// Runs the `hdlgrade check` command.
///
/// Returns exit code 0 if the submission compiles, 1 if it has errors.
/// Warnings never fail the check.
pub fn run(args: &CheckArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(&args.source)?;
    let grader = global.grader(&args.source);

    let (diagnostics, source_db, compiled) = match compile(&source, &grader.compile_options()) {
        Ok(compiled) => (compiled.warnings, compiled.source_db, true),
        Err(failure) => (failure.diagnostics, failure.source_db, false),
    };
    let (errors, warnings) = count(&diagnostics);

    match global.format(args.format) {
        ReportFormat::Text => {
            let shown: Vec<_> = if global.quiet {
                diagnostics
                    .iter()
                    .filter(|d| d.severity.is_error())
                    .cloned()
                    .collect()
            } else {
                diagnostics.clone()
            };
            if !shown.is_empty() {
                eprintln!("{}", render_text(&shown, &source_db, global.color));
            }
            if !global.quiet {
                eprintln!("   Result: {errors} error(s), {warnings} warning(s)");
            }
        }
        ReportFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&diagnostics_json(&diagnostics, &source_db))?
            );
        }
    }

    Ok(if compiled { 0 } else { 1 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdlgrade_config::HdlgradeConfig;

    fn check(source: &str) -> i32 {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub.v");
        std::fs::write(&path, source).unwrap();
        let args = CheckArgs {
            source: path,
            format: Some(ReportFormat::Json),
        };
        let global = GlobalArgs {
            quiet: true,
            color: false,
            config: HdlgradeConfig::default(),
        };
        run(&args, &global).unwrap()
    }

    #[test]
    fn clean_submission() {
        assert_eq!(check("module m(input a, output y); assign y = ~a; endmodule"), 0);
    }

    #[test]
    fn warnings_do_not_fail() {
        assert_eq!(
            check("module dff(input clk, input d, output reg q); always @(posedge clk) q <= d; endmodule"),
            0
        );
    }

    #[test]
    fn errors_fail() {
        assert_eq!(check("module m(input a, output y); assign y = b; endmodule"), 1);
    }
}
