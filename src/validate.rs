//! Validates normalized frontmatter against structural and cross-field rules.
//! Validation is pure and never short-circuits: every rule runs and every
//! failure is reported.

use crate::config::Languages;
use crate::url::normalize_separators;
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde_yaml::Value as Yaml;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

static DATE_PATTERN: OnceLock<Regex> = OnceLock::new();
static FOLDER_DATE_PATTERN: OnceLock<Regex> = OnceLock::new();
static FOLDER_LANG_PATTERN: OnceLock<Regex> = OnceLock::new();

fn date_pattern() -> &'static Regex {
    DATE_PATTERN.get_or_init(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").unwrap())
}

fn folder_date_pattern() -> &'static Regex {
    FOLDER_DATE_PATTERN.get_or_init(|| {
        Regex::new(r"(?:^|/)([0-9]{4})/([0-9]{2})/([0-9]{2})/(?:[a-z]{2}/)?[^/]+\.md$").unwrap()
    })
}

fn folder_lang_pattern() -> &'static Regex {
    FOLDER_LANG_PATTERN.get_or_init(|| {
        Regex::new(r"(?:^|/)[0-9]{4}/[0-9]{2}/[0-9]{2}/([a-z]{2})/[^/]+\.md$").unwrap()
    })
}

/// The `date` field after normalization.
#[derive(Clone, Debug, PartialEq)]
pub enum DateField {
    Missing,

    /// A string, reduced to `YYYY-MM-DD` if it was a timestamp.
    Text(String),

    /// A value that isn't a string at all (e.g. a number or a list).
    NotText,
}

impl Default for DateField {
    fn default() -> Self {
        DateField::Missing
    }
}

/// Frontmatter whose date has been normalized but whose fields have not yet
/// been checked. Values keep their YAML type so type errors can be reported
/// per field.
#[derive(Clone, Debug, Default)]
pub struct Frontmatter {
    pub title: Option<Yaml>,
    pub description: Option<Yaml>,
    pub date: DateField,
    pub lang: Option<Yaml>,
    pub tags: Option<Yaml>,
}

/// Frontmatter that passed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Metadata {
    pub title: String,
    pub description: String,
    pub date: String,
    pub lang: String,
    pub tags: Vec<String>,
}

/// A single failed rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every rule that failed for one document, in rule order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Each error rendered as `field: message`.
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.messages().join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Validates `frontmatter` for the document at `source_path`.
pub fn validate(
    frontmatter: &Frontmatter,
    source_path: &Path,
    languages: &Languages,
) -> Result<Metadata, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let title = required_string(&frontmatter.title).or_else(|| {
        errors.push("title", "Title is required and must be a string");
        None
    });
    let description = required_string(&frontmatter.description).or_else(|| {
        errors.push("description", "Description is required and must be a string");
        None
    });
    let date = validate_date(&frontmatter.date, &mut errors);
    let lang = validate_lang(&frontmatter.lang, languages, &mut errors);
    let tags = validate_tags(&frontmatter.tags, &mut errors);

    let path = normalize_separators(source_path);
    if let (Some(caps), DateField::Text(date)) =
        (folder_date_pattern().captures(&path), &frontmatter.date)
    {
        let folder_date = format!("{}-{}-{}", &caps[1], &caps[2], &caps[3]);
        if folder_date != *date {
            errors.push(
                "date",
                format!(
                    "Folder date ({}) does not match frontmatter date ({})",
                    folder_date, date
                ),
            );
        }
    }
    if languages.multilingual {
        if let (Some(caps), Some(Yaml::String(lang))) =
            (folder_lang_pattern().captures(&path), &frontmatter.lang)
        {
            if &caps[1] != lang {
                errors.push(
                    "lang",
                    format!(
                        "Folder language ({}) does not match frontmatter language ({})",
                        &caps[1], lang
                    ),
                );
            }
        }
    }

    match (title, description, date, lang, tags) {
        (Some(title), Some(description), Some(date), Some(lang), Some(tags))
            if errors.is_empty() =>
        {
            Ok(Metadata {
                title,
                description,
                date,
                lang,
                tags,
            })
        }
        _ => Err(errors),
    }
}

fn required_string(value: &Option<Yaml>) -> Option<String> {
    match value {
        Some(Yaml::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn validate_date(date: &DateField, errors: &mut ValidationErrors) -> Option<String> {
    match date {
        DateField::Missing => {
            errors.push("date", "Date is required");
            None
        }
        DateField::NotText => {
            errors.push("date", "Date must be a string in YYYY-MM-DD format");
            None
        }
        DateField::Text(text) if !date_pattern().is_match(text) => {
            errors.push("date", "Date must be in YYYY-MM-DD format");
            None
        }
        DateField::Text(text) => match is_calendar_date(text) {
            true => Some(text.clone()),
            false => {
                errors.push("date", "Date is not a valid calendar date");
                None
            }
        },
    }
}

/// Round-trips year, month and day through a calendar date and checks
/// that they survive unchanged. `text` must already match `YYYY-MM-DD`.
fn is_calendar_date(text: &str) -> bool {
    let year = text[0..4].parse::<i32>();
    let month = text[5..7].parse::<u32>();
    let day = text[8..10].parse::<u32>();
    match (year, month, day) {
        (Ok(year), Ok(month), Ok(day)) => match NaiveDate::from_ymd_opt(year, month, day) {
            Some(date) => date.year() == year && date.month() == month && date.day() == day,
            None => false,
        },
        _ => false,
    }
}

fn validate_lang(
    lang: &Option<Yaml>,
    languages: &Languages,
    errors: &mut ValidationErrors,
) -> Option<String> {
    match lang {
        None | Some(Yaml::Null) => match languages.multilingual {
            true => {
                errors.push("lang", "Language is required");
                None
            }
            false => Some(languages.default.clone()),
        },
        Some(Yaml::String(lang)) if !languages.multilingual && *lang != languages.default => {
            errors.push(
                "lang",
                format!(
                    "Language `{}` must be `{}` on a single-language site",
                    lang, languages.default
                ),
            );
            None
        }
        Some(Yaml::String(lang)) if languages.is_supported(lang) => Some(lang.clone()),
        Some(Yaml::String(lang)) => {
            errors.push(
                "lang",
                format!(
                    "Language `{}` is not one of the supported languages ({})",
                    lang,
                    languages.supported.join(", ")
                ),
            );
            None
        }
        Some(_) => {
            errors.push("lang", "Language must be a string");
            None
        }
    }
}

fn validate_tags(tags: &Option<Yaml>, errors: &mut ValidationErrors) -> Option<Vec<String>> {
    match tags {
        None | Some(Yaml::Null) => return Some(Vec::new()),
        Some(Yaml::Sequence(items)) => {
            let tags: Option<Vec<String>> = items
                .iter()
                .map(|item| match item {
                    Yaml::String(tag) => Some(tag.clone()),
                    _ => None,
                })
                .collect();
            if tags.is_some() {
                return tags;
            }
        }
        Some(_) => {}
    }
    errors.push("tags", "Tags must be a list of strings");
    None
}
