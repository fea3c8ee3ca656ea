//! Defines the [`Post`] type, the immutable record produced for every
//! published source document by [`crate::parser`].

use chrono::NaiveDate;
use std::path::PathBuf;

/// A published post. Drafts never become a `Post`; see
/// [`crate::parser::Extraction`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Post {
    /// The source file. This is the post's identity until language pairs
    /// are resolved.
    pub source_path: PathBuf,

    /// One of the configured supported languages.
    pub lang: String,

    /// The normalized `YYYY-MM-DD` date. Equal to the date encoded in
    /// `source_path`.
    pub date: String,

    /// The source file stem, used verbatim in output URLs.
    pub slug: String,

    pub title: String,
    pub description: String,

    /// Tags in source order.
    pub tags: Vec<String>,

    /// The markdown body, not yet rendered.
    pub raw_content: String,
}

impl Post {
    /// The source file stem. Posts with equal dates and stems in different
    /// languages are translations of each other.
    pub fn stem(&self) -> &str {
        self.source_path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&self.slug)
    }

    /// The date in long form, e.g. `March 5, 2024`.
    pub fn formatted_date(&self) -> String {
        match NaiveDate::parse_from_str(&self.date, "%Y-%m-%d") {
            Ok(date) => date.format("%B %-d, %Y").to_string(),
            Err(_) => self.date.clone(),
        }
    }
}

/// Builds a published post at `posts/{date path}/{lang}/{slug}.md`.
#[cfg(test)]
pub(crate) fn fixture(lang: &str, date: &str, slug: &str) -> Post {
    Post {
        source_path: PathBuf::from(format!(
            "content/posts/{}/{}/{}.md",
            date.replace('-', "/"),
            lang,
            slug
        )),
        lang: lang.to_owned(),
        date: date.to_owned(),
        slug: slug.to_owned(),
        title: format!("{} ({})", slug, lang),
        description: format!("About {}", slug),
        tags: Vec::new(),
        raw_content: format!("# {}\n\nBody of {}.\n", slug, slug),
    }
}
