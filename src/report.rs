//! Defines the [`BuildReport`], the accumulator that every pipeline stage
//! records per-file outcomes into. A report is created by
//! [`crate::build::build_site`] and passed by `&mut` to each stage; there is
//! no global state.

use std::fmt;
use std::path::{Path, PathBuf};

/// The errors recorded against a single source file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileErrors {
    /// The source file the errors belong to.
    pub file: PathBuf,

    /// Human-readable error messages, e.g. `title: Title is required and
    /// must be a string`.
    pub errors: Vec<String>,
}

/// Aggregated outcome of a build: how many posts were rendered, how many
/// drafts were skipped, and which files failed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// The number of post pages written.
    pub processed: usize,

    /// The number of drafts skipped.
    pub skipped: usize,

    /// Per-file errors. Each failing file is excluded from the published
    /// set.
    pub errors: Vec<FileErrors>,
}

impl BuildReport {
    pub fn record_processed(&mut self) {
        self.processed += 1;
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    /// Records `errors` against `file`. Messages for the same file are
    /// merged into one entry.
    pub fn record_errors(&mut self, file: &Path, errors: Vec<String>) {
        match self.errors.iter_mut().find(|entry| entry.file == file) {
            Some(entry) => entry.errors.extend(errors),
            None => self.errors.push(FileErrors {
                file: file.to_owned(),
                errors,
            }),
        }
    }

    /// A build succeeds when no per-file error was recorded.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for BuildReport {
    /// Displays the report as the multi-line summary printed by the CLI.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Processed: {}", self.processed)?;
        write!(f, "Skipped: {}", self.skipped)?;
        if !self.errors.is_empty() {
            write!(f, "\n\nErrors ({}):", self.errors.len())?;
            for entry in &self.errors {
                write!(f, "\n  {}:", entry.file.display())?;
                for message in &entry.errors {
                    write!(f, "\n    - {}", message)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_empty_report_is_success() {
        let report = BuildReport::default();
        assert!(report.is_success());
        assert_eq!(0, report.processed);
        assert_eq!(0, report.skipped);
    }

    #[test]
    fn test_record_errors_merges_same_file() {
        let mut report = BuildReport::default();
        let file = Path::new("content/posts/2024/03/05/ja/hello.md");
        report.record_errors(file, vec!["title: missing".to_owned()]);
        report.record_errors(file, vec!["slug: duplicate".to_owned()]);
        report.record_errors(
            Path::new("content/posts/2024/03/06/ja/other.md"),
            vec!["date: bad".to_owned()],
        );

        assert!(!report.is_success());
        assert_eq!(2, report.errors.len());
        assert_eq!(
            vec!["title: missing".to_owned(), "slug: duplicate".to_owned()],
            report.errors[0].errors
        );
    }

    #[test]
    fn test_display_lists_errors() {
        let mut report = BuildReport::default();
        report.record_processed();
        report.record_skipped();
        report.record_errors(Path::new("a.md"), vec!["date: bad".to_owned()]);

        let text = report.to_string();
        assert!(text.starts_with("Processed: 1\nSkipped: 1"));
        assert!(text.contains("Errors (1):"));
        assert!(text.contains("  a.md:\n    - date: bad"));
    }
}
