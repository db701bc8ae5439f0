// 📋 Batch Validation - fixture files and bulk checks
// One candidate IBAN per line; blank lines and '#' comments are skipped.
// Unsupported countries are tallied as advisory, never as invalid.

use crate::error::{ErrorKind, ValidationError};
use crate::iban::{IbanParser, ParsedIban};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// ============================================================================
// ENTRY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Valid { iban: ParsedIban },
    Unsupported { country_code: String, message: String },
    Invalid { kind: ErrorKind, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchEntry {
    /// File path, or a caller-chosen label for in-memory input
    pub source: String,

    /// 1-based line number within the source
    pub line: usize,

    /// Input as written, before normalization
    pub input: String,

    pub outcome: Outcome,
}

impl BatchEntry {
    pub fn is_valid(&self) -> bool {
        matches!(self.outcome, Outcome::Valid { .. })
    }
}

// ============================================================================
// SUMMARY & REPORT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub unsupported: usize,
}

impl BatchSummary {
    pub fn summary(&self) -> String {
        format!(
            "{} IBANs: {} valid, {} invalid, {} unsupported country (double-check externally)",
            self.total, self.valid, self.invalid, self.unsupported
        )
    }

    pub fn all_valid(&self) -> bool {
        self.valid == self.total
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub generated_at: DateTime<Utc>,
    pub summary: BatchSummary,
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn new() -> Self {
        BatchReport {
            generated_at: Utc::now(),
            summary: BatchSummary::default(),
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: BatchEntry) {
        self.summary.total += 1;
        match entry.outcome {
            Outcome::Valid { .. } => self.summary.valid += 1,
            Outcome::Unsupported { .. } => self.summary.unsupported += 1,
            Outcome::Invalid { .. } => self.summary.invalid += 1,
        }
        self.entries.push(entry);
    }

    pub fn extend(&mut self, other: BatchReport) {
        for entry in other.entries {
            self.push(entry);
        }
    }

    pub fn invalid_entries(&self) -> impl Iterator<Item = &BatchEntry> {
        self.entries.iter().filter(|e| !e.is_valid())
    }

    /// Write one CSV row per entry
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);

        for entry in &self.entries {
            wtr.serialize(CsvRow::from(entry))
                .context("Failed to write CSV row")?;
        }

        wtr.flush().context("Failed to flush CSV report")?;
        Ok(())
    }

    pub fn write_csv_file(&self, path: &Path) -> Result<()> {
        let file = fs::File::create(path)
            .with_context(|| format!("Failed to create CSV report: {:?}", path))?;
        self.write_csv(file)
    }
}

impl Default for BatchReport {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    source: &'a str,
    line: usize,
    input: &'a str,
    status: &'static str,
    code: &'a str,
    printable: &'a str,
    error_kind: &'static str,
    message: &'a str,
}

impl<'a> From<&'a BatchEntry> for CsvRow<'a> {
    fn from(entry: &'a BatchEntry) -> Self {
        let (status, code, printable, error_kind, message) = match &entry.outcome {
            Outcome::Valid { iban } => ("valid", iban.code(), iban.printable(), "", ""),
            Outcome::Unsupported { message, .. } => (
                "unsupported",
                "",
                "",
                ErrorKind::UnsupportedCountry.as_str(),
                message.as_str(),
            ),
            Outcome::Invalid { kind, message } => ("invalid", "", "", kind.as_str(), message.as_str()),
        };

        CsvRow {
            source: &entry.source,
            line: entry.line,
            input: &entry.input,
            status,
            code,
            printable,
            error_kind,
            message,
        }
    }
}

// ============================================================================
// BATCH VALIDATOR
// ============================================================================

pub struct BatchValidator<'a> {
    parser: IbanParser<'a>,
}

impl<'a> BatchValidator<'a> {
    pub fn new(parser: IbanParser<'a>) -> Self {
        BatchValidator { parser }
    }

    /// Validate a single candidate into a report entry
    pub fn check(&self, source: &str, line: usize, input: &str) -> BatchEntry {
        let outcome = match self.parser.parse(input) {
            Ok(iban) => Outcome::Valid { iban },
            Err(err) => {
                let message = err.to_string();
                match err {
                    ValidationError::UnsupportedCountry { country_code } => {
                        Outcome::Unsupported { country_code, message }
                    }
                    other => Outcome::Invalid {
                        kind: other.kind(),
                        message,
                    },
                }
            }
        };

        BatchEntry {
            source: source.to_string(),
            line,
            input: input.to_string(),
            outcome,
        }
    }

    /// Validate a list of inputs held in memory; nothing is skipped
    pub fn check_all<I, S>(&self, source: &str, inputs: I) -> BatchReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = BatchReport::new();
        for (index, input) in inputs.into_iter().enumerate() {
            report.push(self.check(source, index + 1, input.as_ref()));
        }
        report
    }

    /// Validate line-oriented input, skipping blank lines and '#' comments
    pub fn check_reader<R: Read>(&self, source: &str, reader: R) -> Result<BatchReport> {
        let mut report = BatchReport::new();

        for (index, line) in BufReader::new(reader).lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {} of {}", index + 1, source))?;
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            report.push(self.check(source, index + 1, &line));
        }

        Ok(report)
    }

    pub fn check_file(&self, path: &Path) -> Result<BatchReport> {
        let file = fs::File::open(path)
            .with_context(|| format!("Failed to open IBAN file: {:?}", path))?;
        let report = self.check_reader(&path.display().to_string(), file)?;
        debug!(path = %path.display(), "{}", report.summary.summary());
        Ok(report)
    }

    /// Validate a file, or every non-hidden file below a directory in sorted order
    pub fn check_path(&self, path: &Path) -> Result<BatchReport> {
        let mut report = BatchReport::new();

        for file in collect_files(path)? {
            report.extend(self.check_file(&file)?);
        }

        info!(path = %path.display(), "{}", report.summary.summary());
        Ok(report)
    }
}

impl Default for BatchValidator<'static> {
    fn default() -> Self {
        BatchValidator::new(IbanParser::default())
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// A named path is followed even if it is a symlink; below it, symlinked
/// directories are skipped so a link back up the tree cannot loop.
fn collect_files(path: &Path) -> Result<Vec<PathBuf>> {
    let metadata = fs::metadata(path).with_context(|| format!("Failed to stat {:?}", path))?;
    if !metadata.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    walk_dir(path, &mut files)?;
    Ok(files)
}

fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let mut children: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {:?}", dir))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<_>>()
        .with_context(|| format!("Failed to list directory {:?}", dir))?;
    children.sort();

    for child in children.into_iter().filter(|c| !is_hidden(c)) {
        let link = fs::symlink_metadata(&child)
            .with_context(|| format!("Failed to stat {:?}", child))?;

        if link.is_dir() {
            walk_dir(&child, files)?;
        } else if link.file_type().is_symlink() {
            // Symlinked files are read; symlinked directories and dangling links are not
            match fs::metadata(&child) {
                Ok(target) if target.is_file() => files.push(child),
                _ => debug!(path = %child.display(), "skipping symlink"),
            }
        } else {
            files.push(child);
        }
    }

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = "\
# Dutch accounts
NL91 ABNA 0417 1643 00

NL30ABNA0517552265
ZZ30ABNA0517552264
";

    #[test]
    fn test_check_reader_skips_comments_and_blanks() {
        let validator = BatchValidator::default();
        let report = validator.check_reader("fixture", FIXTURE.as_bytes()).unwrap();

        assert_eq!(report.summary.total, 3);
        assert_eq!(report.summary.valid, 1);
        assert_eq!(report.summary.invalid, 1);
        assert_eq!(report.summary.unsupported, 1);
        assert!(!report.summary.all_valid());

        let lines: Vec<usize> = report.entries.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![2, 4, 5]);
    }

    #[test]
    fn test_outcomes() {
        let validator = BatchValidator::default();

        let unsupported = validator.check("mem", 1, "zz30 abna 0517 5522 64");
        assert!(matches!(
            unsupported.outcome,
            Outcome::Unsupported { ref country_code, .. } if country_code == "ZZ"
        ));

        let invalid = validator.check("mem", 2, "1234567890");
        assert!(matches!(
            invalid.outcome,
            Outcome::Invalid { kind: ErrorKind::MalformedHeader, .. }
        ));
    }

    #[test]
    fn test_check_all_keeps_every_input() {
        let validator = BatchValidator::default();
        let report = validator.check_all("api", ["DE89370400440532013000", "", "# not skipped"]);

        assert_eq!(report.summary.total, 3);
        assert_eq!(report.summary.valid, 1);
        assert_eq!(report.invalid_entries().count(), 2);
    }

    #[test]
    fn test_write_csv() {
        let validator = BatchValidator::default();
        let report = validator.check_all("api", ["GB82WEST12345698765432", "NL30ABNA0517552265"]);

        let mut out = Vec::new();
        report.write_csv(&mut out).unwrap();
        let csv = String::from_utf8(out).unwrap();
        let rows: Vec<&str> = csv.lines().collect();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], "source,line,input,status,code,printable,error_kind,message");
        assert!(rows[1].starts_with("api,1,GB82WEST12345698765432,valid,GB82WEST12345698765432,GB82 WEST 1234 5698 7654 32"));
        assert!(rows[2].contains("invalid"));
        assert!(rows[2].contains("checksum_invalid"));
    }

    #[test]
    fn test_report_json_tags_status() {
        let validator = BatchValidator::default();
        let report = validator.check_all("api", ["BE68539007547034"]);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["summary"]["valid"], 1);
        assert_eq!(json["entries"][0]["outcome"]["status"], "valid");
        assert_eq!(json["entries"][0]["outcome"]["iban"]["country_code"], "BE");
    }

    #[test]
    fn test_check_path_walks_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "NL91ABNA0417164300\n").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("b.txt"), "# comment\nBE68539007547034\n").unwrap();
        fs::write(dir.path().join(".hidden"), "garbage\n").unwrap();

        let report = BatchValidator::default().check_path(dir.path()).unwrap();

        assert_eq!(report.summary.total, 2);
        assert!(report.summary.all_valid());
        assert!(report.entries[0].source.ends_with("a.txt"));
        assert!(report.entries[1].source.ends_with("b.txt"));
        assert_eq!(report.entries[1].line, 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_check_path_skips_symlinked_directories() {
        use std::os::unix::fs::symlink;

        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "NL91ABNA0417164300\n").unwrap();
        symlink(".", dir.path().join("loop")).unwrap();
        symlink(dir.path().join("a.txt"), dir.path().join("b.txt")).unwrap();
        symlink(dir.path().join("gone"), dir.path().join("dangling")).unwrap();

        let report = BatchValidator::default().check_path(dir.path()).unwrap();

        // a.txt directly and through the b.txt file link; loop and dangling skipped
        assert_eq!(report.summary.total, 2);
        assert!(report.summary.all_valid());
        assert!(report.entries[0].source.ends_with("a.txt"));
        assert!(report.entries[1].source.ends_with("b.txt"));
    }

    #[test]
    fn test_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = BatchValidator::default().check_path(&dir.path().join("missing"));
        assert!(result.is_err());
    }
}
