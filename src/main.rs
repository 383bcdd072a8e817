//! Command line front end.
//!
//! Usage: statement-import [--config <file>] <statement.txt>...
//!
//! Reads text dumps of bank statements (converted from PDF by an external
//! tool), extracts them with the registered rule sets and prints one JSON
//! report on stdout. A file that cannot be read is listed as a failure and
//! the remaining files are still imported; a file no rule set recognizes is
//! only listed.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Extraction or read errors and `stopOnError` is set
//!   2 - Invalid arguments

use anyhow::Result;
use serde::Serialize;
use statement_import::config::ImportConfig;
use statement_import::pdf_import::{parse_file, BankExtractor, ParseResult};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

const USAGE: &str = "Usage: statement-import [--config <file>] <statement.txt>...";

struct Args {
    config: Option<PathBuf>,
    files: Vec<PathBuf>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Option<Args> {
    let mut config = None;
    let mut files = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => config = Some(PathBuf::from(args.next()?)),
            "--help" | "-h" => return None,
            _ => files.push(PathBuf::from(arg)),
        }
    }

    if files.is_empty() {
        return None;
    }
    Some(Args { config, files })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileFailure {
    file: String,
    error: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    results: Vec<ParseResult>,
    failures: Vec<FileFailure>,
    unrecognized: Vec<String>,
}

impl Report {
    fn has_errors(&self) -> bool {
        !self.failures.is_empty() || self.results.iter().any(|r| !r.errors.is_empty())
    }
}

fn import_files(files: &[PathBuf], extractors: &[BankExtractor]) -> Report {
    let mut report = Report::default();

    for file in files {
        match parse_file(file, extractors) {
            Ok(Some(result)) => report.results.push(result),
            Ok(None) => {
                log::info!("Import: no bank rule set recognized {}", file.display());
                report.unrecognized.push(file.display().to_string());
            }
            Err(e) => {
                log::error!("Import: cannot import {}: {}", file.display(), e);
                report.failures.push(FileFailure {
                    file: file.display().to_string(),
                    error: e.to_string(),
                });
            }
        }
    }
    report
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(args) = parse_args(env::args().skip(1)) else {
        eprintln!("{}", USAGE);
        return Ok(ExitCode::from(2));
    };

    let config = match &args.config {
        Some(path) => ImportConfig::load(path)?,
        None => ImportConfig::default(),
    };
    let extractors = config.extractors()?;

    let report = import_files(&args.files, &extractors);
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.has_errors() && config.stop_on_error {
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(list: &[&str]) -> Option<Args> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_args() {
        let parsed = args(&["--config", "import.json", "a.txt", "b.txt"]).unwrap();
        assert_eq!(parsed.config, Some(PathBuf::from("import.json")));
        assert_eq!(parsed.files.len(), 2);

        assert!(args(&[]).is_none());
        assert!(args(&["--config"]).is_none());
        assert!(args(&["--help", "a.txt"]).is_none());
    }

    fn statement(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_unreadable_file_does_not_stop_the_batch() {
        let good = statement(
            "Deutsche Postbank AG
Dividendengutschrift
Stück 12 JOHNSON & JOHNSON US4781601046 (853260)
Zahlbarkeitstag 09.03.2021
Ausmachender Betrag 8,64+ EUR",
        );
        let files = vec![
            PathBuf::from("/nonexistent/statement.txt"),
            good.path().to_path_buf(),
        ];
        let extractors = ImportConfig::default().extractors().unwrap();
        let report = import_files(&files, &extractors);

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].file, "/nonexistent/statement.txt");
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].items.len(), 2);
        assert!(report.has_errors());
    }

    #[test]
    fn test_unrecognized_file_is_not_an_error() {
        let other = statement("Sehr geehrte Kundin, anbei Ihre neue Karte.");
        let files = vec![other.path().to_path_buf()];
        let extractors = ImportConfig::default().extractors().unwrap();
        let report = import_files(&files, &extractors);

        assert!(report.results.is_empty());
        assert_eq!(report.unrecognized.len(), 1);
        assert!(!report.has_errors());
    }
}
