//! `check` command: compile schema files field by field without a document.
//!
//! Codes: `E001` unreadable file, `E002` malformed rule or schema shape,
//! `W001` keyword that neither these rules nor a typical base validator knows.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::loader::load_file;
use crate::schema::compile_field;
use crate::types::json_type_name;

/// Keywords a Cerberus-style base validator handles itself.
const BASE_KEYWORDS: &[&str] = &[
    "required",
    "nullable",
    "empty",
    "allowed",
    "forbidden",
    "type",
    "min",
    "max",
    "minlength",
    "maxlength",
    "regex",
    "dependencies",
    "excludes",
    "schema",
    "default",
    "coerce",
    "readonly",
];

const SCHEMA_EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

/// How serious a diagnostic is. Ordered so the worst of a set is its maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// One finding about a schema file or one of its fields.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: &'static str,
    /// Offending keyword inside the field, when one can be named.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    pub message: String,
}

impl Diagnostic {
    fn error(code: &'static str, message: String) -> Self {
        Self {
            severity: Severity::Error,
            code,
            keyword: None,
            message,
        }
    }
}

/// Check result of one schema field.
#[derive(Debug, Clone, Serialize)]
pub struct FieldReport {
    pub name: String,
    /// Number of custom rules that compiled.
    pub rules: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl FieldReport {
    pub fn worst(&self) -> Option<Severity> {
        self.diagnostics.iter().map(|d| d.severity).max()
    }
}

/// Check result of one schema file: problems with the file as a whole, then
/// one report per field.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file: PathBuf,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub problems: Vec<Diagnostic>,
    pub fields: Vec<FieldReport>,
}

impl FileReport {
    /// Every diagnostic of the file, whole-file problems first.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.problems
            .iter()
            .chain(self.fields.iter().flat_map(|f| f.diagnostics.iter()))
    }

    pub fn worst(&self) -> Option<Severity> {
        self.diagnostics().map(|d| d.severity).max()
    }
}

/// Totals over every checked file.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: PathBuf,
    pub strict: bool,
    pub files_checked: usize,
    pub fields_checked: usize,
    /// Fields (plus unreadable files) that fail under the chosen strictness.
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub files: Vec<FileReport>,
}

impl LintResult {
    fn from_reports(path: &Path, strict: bool, files: Vec<FileReport>) -> Self {
        let threshold = if strict {
            Severity::Warning
        } else {
            Severity::Error
        };
        let fails = |worst: Option<Severity>| worst.is_some_and(|s| s >= threshold);

        let mut result = Self {
            path: path.to_path_buf(),
            strict,
            files_checked: files.len(),
            fields_checked: 0,
            failed: 0,
            errors: 0,
            warnings: 0,
            files: Vec::new(),
        };
        for report in &files {
            result.fields_checked += report.fields.len();
            result.failed += report.fields.iter().filter(|f| fails(f.worst())).count();
            if report.problems.iter().any(|p| p.severity >= threshold) {
                result.failed += 1;
            }
            for diagnostic in report.diagnostics() {
                match diagnostic.severity {
                    Severity::Error => result.errors += 1,
                    Severity::Warning => result.warnings += 1,
                }
            }
        }
        result.files = files;
        result
    }

    /// True when nothing failed: no errors, and no warnings in strict mode.
    pub fn passed(&self) -> bool {
        self.failed == 0
    }
}

/// Check a schema file, or every `.json`/`.yaml`/`.yml` file below a directory.
///
/// With `strict`, fields carrying only warnings count as failed.
pub fn lint(path: &Path, strict: bool) -> LintResult {
    let reports = collect_schema_files(path)
        .iter()
        .map(|file| lint_file(file, path))
        .collect();
    LintResult::from_reports(path, strict, reports)
}

/// Check one schema file.
///
/// Unlike `Schema::from_value`, every field is compiled so all broken rules
/// are reported, not just the first.
pub fn lint_file(file: &Path, base_path: &Path) -> FileReport {
    let mut report = FileReport {
        file: file
            .strip_prefix(base_path)
            .ok()
            .filter(|relative| !relative.as_os_str().is_empty())
            .unwrap_or(file)
            .to_path_buf(),
        problems: Vec::new(),
        fields: Vec::new(),
    };

    match load_file(file) {
        Ok(Value::Object(fields)) => {
            report.fields = fields
                .iter()
                .map(|(name, rules)| check_field(name, rules))
                .collect();
        }
        Ok(other) => report.problems.push(Diagnostic::error(
            "E002",
            format!(
                "schema must be a mapping of field names to rules, got {}",
                json_type_name(&other)
            ),
        )),
        Err(e) => report
            .problems
            .push(Diagnostic::error("E001", format!("syntax error: {}", e))),
    }

    tracing::debug!(
        file = %file.display(),
        fields = report.fields.len(),
        "schema file checked"
    );
    report
}

fn check_field(name: &str, rules: &Value) -> FieldReport {
    match compile_field(name, rules) {
        Ok(compiled) => FieldReport {
            name: name.to_string(),
            rules: compiled.rules.len(),
            diagnostics: compiled
                .base_keywords
                .keys()
                .filter(|keyword| !BASE_KEYWORDS.contains(&keyword.as_str()))
                .map(|keyword| Diagnostic {
                    severity: Severity::Warning,
                    code: "W001",
                    keyword: Some(keyword.clone()),
                    message: format!("unrecognised keyword '{}'", keyword),
                })
                .collect(),
        },
        Err(e) => FieldReport {
            name: name.to_string(),
            rules: 0,
            diagnostics: vec![Diagnostic::error("E002", e.to_string())],
        },
    }
}

fn is_schema_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SCHEMA_EXTENSIONS.contains(&e))
}

/// Schema files at or below `root`, sorted.
fn collect_schema_files(root: &Path) -> Vec<PathBuf> {
    let mut pending = vec![root.to_path_buf()];
    let mut files = Vec::new();

    while let Some(path) = pending.pop() {
        if path.is_dir() {
            match std::fs::read_dir(&path) {
                Ok(entries) => pending.extend(entries.flatten().map(|entry| entry.path())),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping directory"),
            }
        } else if is_schema_file(&path) {
            files.push(path);
        }
    }

    files.sort();
    files
}
