//! Defines the [`Parser`], which extracts [`Post`] records from source files
//! without rendering them. Each file goes through the same steps:
//!
//! 1. Split the frontmatter fence (`---`) from the markdown body
//! 2. Deserialize the YAML frontmatter
//! 3. Normalize the `date` field (exactly once, here)
//! 4. Skip drafts (no validation is performed on them)
//! 5. Validate ([`crate::validate`])
//! 6. Build the [`Post`]
//!
//! Failures are recorded into the caller's [`BuildReport`] and the file is
//! excluded; a single bad post never aborts the build.

use crate::config::Languages;
use crate::post::Post;
use crate::report::BuildReport;
use crate::validate::{validate, DateField, Frontmatter, ValidationErrors};
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use serde_yaml::Value as Yaml;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

const MARKDOWN_EXTENSION: &str = "md";

/// Extracts [`Post`]s from source files.
pub struct Parser<'a> {
    languages: &'a Languages,
}

impl<'a> Parser<'a> {
    /// Constructs a new parser for the configured `languages`.
    pub fn new(languages: &'a Languages) -> Parser<'a> {
        Parser { languages }
    }

    /// Discovers every source file beneath `posts_directory` and extracts
    /// the published posts, in discovery order. Per-file failures and
    /// skipped drafts are recorded into `report`.
    pub fn parse_posts(&self, posts_directory: &Path, report: &mut BuildReport) -> Result<Vec<Post>> {
        Ok(discover(posts_directory)?
            .iter()
            .filter_map(|path| self.extract(path, report))
            .collect())
    }

    /// Extracts a single post. Returns `None` for drafts and for files that
    /// fail to parse or validate; the outcome is recorded into `report`.
    pub fn extract(&self, source_path: &Path, report: &mut BuildReport) -> Option<Post> {
        let extraction = std::fs::read_to_string(source_path)
            .map_err(Error::from)
            .and_then(|input| parse_post(source_path, &input, self.languages));
        match extraction {
            Ok(Extraction::Post(post)) => Some(post),
            Ok(Extraction::Draft) => {
                info!("Skipping draft: {}", source_path.display());
                report.record_skipped();
                None
            }
            Ok(Extraction::Invalid(errors)) => {
                report.record_errors(source_path, errors.messages());
                None
            }
            Err(err) => {
                report.record_errors(source_path, vec![err.to_string()]);
                None
            }
        }
    }
}

/// The outcome of extracting one well-formed source document.
#[derive(Debug)]
pub enum Extraction {
    Post(Post),

    /// `draft: true`; excluded from every later stage.
    Draft,

    /// The frontmatter parsed but failed validation.
    Invalid(ValidationErrors),
}

/// Parses the contents of the source file at `source_path`. Structural
/// problems (missing fences, malformed YAML) are errors; rule violations
/// are reported as [`Extraction::Invalid`].
pub fn parse_post(source_path: &Path, input: &str, languages: &Languages) -> Result<Extraction> {
    let (yaml, body) = split_frontmatter(input)?;
    let raw: RawFrontmatter = match yaml.trim().is_empty() {
        true => RawFrontmatter::default(),
        false => serde_yaml::from_str(yaml)?,
    };

    if raw.draft == Some(Yaml::Bool(true)) {
        return Ok(Extraction::Draft);
    }

    let slug = source_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| Error::InvalidFileName(source_path.to_owned()))?
        .to_owned();

    match validate(&raw.normalize(), source_path, languages) {
        Ok(metadata) => Ok(Extraction::Post(Post {
            source_path: source_path.to_owned(),
            lang: metadata.lang,
            date: metadata.date,
            slug,
            title: metadata.title,
            description: metadata.description,
            tags: metadata.tags,
            raw_content: body.to_owned(),
        })),
        Err(errors) => Ok(Extraction::Invalid(errors)),
    }
}

/// Splits a document into its YAML frontmatter and markdown body. The
/// document must open with a `---` line and the frontmatter ends at the
/// next `---` line.
pub fn split_frontmatter(input: &str) -> Result<(&str, &str)> {
    const FENCE: &str = "---";
    let input = input.trim_start_matches('\u{feff}');
    let mut lines = input.split_inclusive('\n');

    let yaml_start = match lines.next() {
        Some(first) if first.trim_end() == FENCE => first.len(),
        _ => return Err(Error::FrontmatterMissingStartFence),
    };

    let mut offset = yaml_start;
    for line in lines {
        if line.trim_end() == FENCE {
            return Ok((&input[yaml_start..offset], &input[offset + line.len()..]));
        }
        offset += line.len();
    }
    Err(Error::FrontmatterMissingEndFence)
}

/// Recursively lists the markdown files beneath `posts_directory` in file
/// name order. A missing directory yields an empty list.
pub fn discover(posts_directory: &Path) -> Result<Vec<PathBuf>> {
    if !posts_directory.is_dir() {
        warn!("Posts directory not found: {}", posts_directory.display());
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for result in WalkDir::new(posts_directory).sort_by_file_name() {
        let entry = result?;
        if entry.file_type().is_file()
            && entry.path().extension().map_or(false, |ext| ext == MARKDOWN_EXTENSION)
        {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// The frontmatter as written. Fields stay loosely typed so that a wrong
/// type is reported by the validator instead of failing deserialization.
#[derive(Deserialize, Default)]
struct RawFrontmatter {
    #[serde(default)]
    title: Option<Yaml>,

    #[serde(default)]
    description: Option<Yaml>,

    #[serde(default)]
    date: Option<Yaml>,

    #[serde(default)]
    lang: Option<Yaml>,

    #[serde(default)]
    tags: Option<Yaml>,

    #[serde(default)]
    draft: Option<Yaml>,
}

impl RawFrontmatter {
    fn normalize(self) -> Frontmatter {
        Frontmatter {
            title: self.title,
            description: self.description,
            date: normalize_date(self.date),
            lang: self.lang,
            tags: self.tags,
        }
    }
}

/// Reduces timestamps to the calendar date they were written in. Plain
/// strings pass through untouched for the validator to check.
fn normalize_date(date: Option<Yaml>) -> DateField {
    match date {
        None | Some(Yaml::Null) => DateField::Missing,
        Some(Yaml::String(text)) => {
            let text = text.trim();
            if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
                return DateField::Text(timestamp.naive_local().date().format("%Y-%m-%d").to_string());
            }
            for format in &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
                if let Ok(timestamp) = NaiveDateTime::parse_from_str(text, format) {
                    return DateField::Text(timestamp.date().format("%Y-%m-%d").to_string());
                }
            }
            DateField::Text(text.to_owned())
        }
        Some(_) => DateField::NotText,
    }
}

/// Represents the result of a [`Post`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a source file.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post source file is missing its starting frontmatter
    /// fence (`---`).
    FrontmatterMissingStartFence,

    /// Returned when a post source file is missing its terminal frontmatter
    /// fence (`---` i.e., the starting fence was found but the ending one was
    /// missing).
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when a source file name isn't valid UTF-8.
    InvalidFileName(PathBuf),

    /// Returned for I/O errors reading a source file.
    Io(std::io::Error),

    /// Returned for I/O errors walking the posts directory.
    WalkDir(walkdir::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingStartFence => {
                write!(f, "frontmatter: Post must begin with `---`")
            }
            Error::FrontmatterMissingEndFence => {
                write!(f, "frontmatter: Missing closing `---`")
            }
            Error::DeserializeYaml(err) => write!(f, "frontmatter: {}", err),
            Error::InvalidFileName(path) => write!(f, "invalid file name: {:?}", path),
            Error::Io(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontmatterMissingStartFence => None,
            Error::FrontmatterMissingEndFence => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::InvalidFileName(_) => None,
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator while walking the posts directory.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    fn languages() -> Languages {
        Languages {
            default: "ja".to_owned(),
            supported: vec!["ja".to_owned(), "en".to_owned()],
            multilingual: true,
        }
    }

    const HELLO: &str = "---
title: Hello
description: A greeting
date: 2024-03-05
lang: ja
tags: [rust, blog]
---
# Hello

World
";

    const PATH: &str = "content/posts/2024/03/05/ja/hello.md";

    #[test]
    fn test_split_frontmatter() -> Result<()> {
        let (yaml, body) = split_frontmatter("---\ntitle: a---b\n---\nbody\n")?;
        assert_eq!("title: a---b\n", yaml);
        assert_eq!("body\n", body);
        Ok(())
    }

    #[test]
    fn test_split_frontmatter_crlf() -> Result<()> {
        let (yaml, body) = split_frontmatter("---\r\ntitle: x\r\n---\r\nbody")?;
        assert_eq!("title: x\r\n", yaml);
        assert_eq!("body", body);
        Ok(())
    }

    #[test]
    fn test_split_frontmatter_missing_fences() {
        assert!(matches!(
            split_frontmatter("# no frontmatter"),
            Err(Error::FrontmatterMissingStartFence)
        ));
        assert!(matches!(
            split_frontmatter("---\ntitle: x\n"),
            Err(Error::FrontmatterMissingEndFence)
        ));
    }

    #[test]
    fn test_parse_post() -> Result<()> {
        match parse_post(Path::new(PATH), HELLO, &languages())? {
            Extraction::Post(post) => {
                assert_eq!(PathBuf::from(PATH), post.source_path);
                assert_eq!("ja", post.lang);
                assert_eq!("2024-03-05", post.date);
                assert_eq!("hello", post.slug);
                assert_eq!("Hello", post.title);
                assert_eq!("A greeting", post.description);
                assert_eq!(vec!["rust".to_owned(), "blog".to_owned()], post.tags);
                assert_eq!("# Hello\n\nWorld\n", post.raw_content);
            }
            other => panic!("wanted a post, found {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_parse_draft_skips_validation() -> Result<()> {
        let input = "---\ndraft: true\n---\nunfinished\n";
        assert!(matches!(
            parse_post(Path::new(PATH), input, &languages())?,
            Extraction::Draft
        ));
        Ok(())
    }

    #[test]
    fn test_draft_with_mistyped_fields_is_still_a_draft() -> Result<()> {
        let input = "---\ndraft: true\ntags: rust\ndate: 5\n---\n";
        assert!(matches!(
            parse_post(Path::new(PATH), input, &languages())?,
            Extraction::Draft
        ));
        Ok(())
    }

    #[test]
    fn test_parse_invalid() -> Result<()> {
        let input = HELLO.replace("date: 2024-03-05", "date: 2024-03-06");
        match parse_post(Path::new(PATH), &input, &languages())? {
            Extraction::Invalid(errors) => assert_eq!(
                vec![
                    "date: Folder date (2024-03-05) does not match frontmatter date (2024-03-06)"
                        .to_owned()
                ],
                errors.messages()
            ),
            other => panic!("wanted validation errors, found {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        let input = "---\ntitle: [unclosed\n---\nbody\n";
        assert!(matches!(
            parse_post(Path::new(PATH), input, &languages()),
            Err(Error::DeserializeYaml(_))
        ));
    }

    #[test]
    fn test_normalize_date() {
        let text = |s: &str| Some(Yaml::String(s.to_owned()));
        assert_eq!(DateField::Missing, normalize_date(None));
        assert_eq!(DateField::Missing, normalize_date(Some(Yaml::Null)));
        assert_eq!(DateField::NotText, normalize_date(Some(Yaml::Bool(true))));
        assert_eq!(
            DateField::Text("2024-03-05".to_owned()),
            normalize_date(text("2024-03-05"))
        );
        assert_eq!(
            DateField::Text("2024-03-05".to_owned()),
            normalize_date(text("2024-03-05 23:30:00"))
        );
        assert_eq!(
            DateField::Text("2024-03-05".to_owned()),
            normalize_date(text("2024-03-05T08:00:00+09:00"))
        );
        assert_eq!(
            DateField::Text("March 5".to_owned()),
            normalize_date(text("March 5"))
        );
    }

    #[test]
    fn test_extract_records_outcomes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let post_dir = dir.path().join("posts/2024/03/05/ja");
        fs::create_dir_all(&post_dir).expect("mkdir");
        fs::write(post_dir.join("hello.md"), HELLO).expect("write");
        fs::write(post_dir.join("draft.md"), "---\ndraft: true\ntags: rust\n---\n")
            .expect("write");
        fs::write(post_dir.join("broken.md"), "no fence").expect("write");

        let languages = languages();
        let parser = Parser::new(&languages);
        let mut report = BuildReport::default();
        let posts = parser
            .parse_posts(&dir.path().join("posts"), &mut report)
            .expect("posts directory is readable");

        assert_eq!(1, posts.len());
        assert_eq!("hello", posts[0].slug);
        assert_eq!(1, report.skipped);
        assert_eq!(0, report.processed);
        assert_eq!(1, report.errors.len());
        assert_eq!(post_dir.join("broken.md"), report.errors[0].file);
        assert_eq!(
            vec!["frontmatter: Post must begin with `---`".to_owned()],
            report.errors[0].errors
        );
    }

    #[test]
    fn test_discover_missing_directory() -> Result<()> {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(discover(&dir.path().join("missing"))?.is_empty());
        Ok(())
    }

    #[test]
    fn test_discover_sorts_by_file_name() -> Result<()> {
        let dir = tempfile::tempdir().expect("tempdir");
        let day = dir.path().join("2024/01/02/en");
        fs::create_dir_all(&day).expect("mkdir");
        for name in &["b.md", "a.md", "notes.txt", "c.md"] {
            fs::write(day.join(name), "").expect("write");
        }
        let names: Vec<String> = discover(dir.path())?
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(vec!["a.md", "b.md", "c.md"], names);
        Ok(())
    }
}
