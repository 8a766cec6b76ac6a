//! Darwin Core schema CLI
//!
//! Command-line interface for checking schemas and validating occurrence records.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use dwca_schema::{
    lint, load_document, load_schema, LintResult, Severity, ValidateOptions, Validator,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dwca-schema")]
#[command(about = "Validate Darwin Core occurrence records against a rule schema")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(long, short, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a document against a schema
    Validate {
        /// Document file (JSON, or YAML with a .yaml/.yml extension)
        document: PathBuf,

        /// Schema file (JSON, or YAML with a .yaml/.yml extension)
        #[arg(long, short)]
        schema: PathBuf,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,

        /// Strict mode: reject fields the schema does not declare (default: false)
        #[arg(long, default_value_t = false, action = ArgAction::Set)]
        strict: bool,
    },

    /// Check schema files for malformed rules
    Check {
        /// File or directory to check
        path: PathBuf,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Suppress progress output, only show errors
        #[arg(long, short)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Validate {
            document,
            schema,
            json,
            strict,
        } => run_validate(&document, &schema, json, strict),

        Commands::Check {
            path,
            format,
            strict,
            quiet,
        } => run_check(&path, &format, strict, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Logs go to stderr so stdout stays parseable.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_validate(
    document_path: &Path,
    schema_path: &Path,
    json_output: bool,
    strict: bool,
) -> Result<(), u8> {
    let schema = load_schema(schema_path).map_err(|e| {
        report_error(json_output, &format!("loading schema: {}", e));
        e.exit_code() as u8
    })?;

    let document = load_document(document_path).map_err(|e| {
        report_error(json_output, &format!("loading document: {}", e));
        e.exit_code() as u8
    })?;

    let validator = Validator::new(schema).with_options(ValidateOptions::new().strict(strict));
    let outcome = validator.validate(&document);

    if json_output {
        println!("{}", serde_json::json!(outcome));
    } else if outcome.valid {
        println!("Valid");
    } else {
        eprintln!("Validation failed:");
        for (field, messages) in &outcome.errors {
            for message in messages {
                eprintln!("  {}: {}", field, message);
            }
        }
    }

    if outcome.valid {
        Ok(())
    } else {
        Err(1)
    }
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", serde_json::json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}

fn run_check(path: &Path, format: &str, strict: bool, quiet: bool) -> Result<(), u8> {
    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(2);
    }

    let result = lint(path, strict);

    if format == "json" {
        let output = serde_json::to_string_pretty(&result).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", output);
    } else {
        print_check_report(&result, quiet);
    }

    if result.passed() {
        Ok(())
    } else {
        Err(1)
    }
}

/// One line per field; quiet mode keeps only lines that would fail the run.
fn print_check_report(result: &LintResult, quiet: bool) {
    let shown = |severity: Severity| !quiet || severity == Severity::Error || result.strict;
    let width = result
        .files
        .iter()
        .flat_map(|f| f.fields.iter().map(|field| field.name.len()))
        .max()
        .unwrap_or(0);

    for report in &result.files {
        if quiet && report.worst().map_or(true, |s| !shown(s)) {
            continue;
        }
        println!("{}", report.file.display());

        for problem in &report.problems {
            println!("  {} {}", problem.code, problem.message);
        }
        for field in &report.fields {
            if field.diagnostics.is_empty() {
                if !quiet {
                    println!("  {:<width$}  ok ({} rules)", field.name, field.rules);
                }
                continue;
            }
            for diagnostic in field.diagnostics.iter().filter(|d| shown(d.severity)) {
                println!(
                    "  {:<width$}  {} {}",
                    field.name, diagnostic.code, diagnostic.message
                );
            }
        }
    }

    println!(
        "{}: checked {} field(s) in {} file(s): {} error(s), {} warning(s)",
        if result.passed() { "PASS" } else { "FAIL" },
        result.fields_checked,
        result.files_checked,
        result.errors,
        result.warnings
    );
}
