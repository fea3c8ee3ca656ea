//! Templating and writing HTML pages to disk: one page per post, one index
//! page per language, and the root redirect.

use crate::config::Config;
use crate::markdown::MarkdownRenderer;
use crate::post::Post;
use crate::postlist::{PostListItem, SiteIndex};
use crate::template::{self, TemplateRenderer};
use crate::url::SiteUrls;
use crate::value::{self, list, optional_text, Object};
use chrono::{Datelike, Utc};
use gtmpl::Value;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// UI strings used by the built-in templates, for languages the project's
/// `i18n` table doesn't cover.
fn default_strings(lang: &str) -> &'static [(&'static str, &'static str)] {
    match lang {
        "ja" => &[
            ("recent_posts", "最近の投稿"),
            ("latest_post", "最新の投稿"),
            ("original_article", "元の記事"),
        ],
        _ => &[
            ("recent_posts", "Recent Posts"),
            ("latest_post", "Latest Post"),
            ("original_article", "Original article"),
        ],
    }
}

/// Responsible for templating and writing HTML pages to disk from [`Post`]
/// sources.
pub struct Writer<'a> {
    pub config: &'a Config,

    /// Derived from the site's domain and base path.
    pub urls: SiteUrls,

    pub templates: &'a dyn TemplateRenderer,
    pub markdown: &'a dyn MarkdownRenderer,
}

impl<'a> Writer<'a> {
    pub fn new(
        config: &'a Config,
        templates: &'a dyn TemplateRenderer,
        markdown: &'a dyn MarkdownRenderer,
    ) -> Writer<'a> {
        Writer {
            config,
            urls: config.site.urls(),
            templates,
            markdown,
        }
    }

    /// Renders `post` and writes it to
    /// `{output}/{lang}/posts/YYYY/MM/DD/{slug}/index.html`.
    pub fn write_post(&self, post: &Post, index: &SiteIndex) -> Result<PathBuf> {
        let layout = self.config.languages.layout();
        let location = layout
            .derive(&post.source_path)
            .ok_or_else(|| Error::UnderivablePath(post.source_path.clone()))?;

        let alternates = index
            .pairs
            .alternates(post, index.languages(), &layout)
            .into_iter()
            .map(|link| {
                Value::from(
                    Object::new()
                        .text("lang", &link.lang)
                        .text("href", &self.urls.href(&link.url))
                        .value("translated", link.translated),
                )
            });
        let original = match index.pairs.original(post, &self.config.languages.default, &layout) {
            Some(item) => self.link(&item),
            None => Value::Nil,
        };

        let context = self
            .page(&post.lang)
            .text("title", &post.title)
            .text("description", &post.description)
            .text("canonical_url", &self.urls.canonical(&location.fragment()))
            .value(
                "post",
                Object::new()
                    .text("title", &post.title)
                    .text("description", &post.description)
                    .text("date", &post.date)
                    .text("formatted_date", &post.formatted_date())
                    .value("tags", list(post.tags.iter().map(|tag| value::text(tag)))),
            )
            .html("content", self.markdown.render(&post.raw_content))
            .value("sidebar", self.sidebar(index, &post.lang))
            .value("alternates", list(alternates))
            .value("original", original);

        let path = location.output_path(&self.config.output_directory);
        write_file(&path, &self.templates.render(template::POST, context.into())?)?;
        Ok(path)
    }

    /// Renders the index page for `lang`: the site description section, the
    /// latest post in full and the sidebar.
    pub fn write_index(
        &self,
        lang: &str,
        index: &SiteIndex,
        site_description: Option<&str>,
    ) -> Result<PathBuf> {
        let layout = self.config.languages.layout();
        let latest = index
            .latest(lang)
            .and_then(|post| layout.derive(&post.source_path).map(|loc| (post, loc)));
        let latest = match latest {
            Some((post, location)) => Value::from(
                Object::new()
                    .text("title", &post.title)
                    .text("date", &post.date)
                    .text("formatted_date", &post.formatted_date())
                    .text("href", &self.urls.href(&location.fragment()))
                    .html("content", self.markdown.render(&post.raw_content)),
            ),
            None => Value::Nil,
        };
        let site_description_html = site_description
            .map(|markdown| self.markdown.render(markdown))
            .unwrap_or_default();

        let context = self
            .page(lang)
            .text("title", &self.config.site.name)
            .text("description", &self.config.site.description)
            .text("canonical_url", &self.urls.lang_index(lang))
            .html("site_description_html", site_description_html)
            .value("latest", latest)
            .value("sidebar", self.sidebar(index, lang));

        let path = self.config.output_directory.join(lang).join("index.html");
        write_file(&path, &self.templates.render(template::INDEX, context.into())?)?;
        Ok(path)
    }

    /// Writes the root `index.html`, which redirects to the default
    /// language's index.
    pub fn write_redirect(&self) -> Result<PathBuf> {
        let target = self.urls.href(&format!("{}/", self.config.languages.default));
        let context = Object::new()
            .text("site_name", &self.config.site.name)
            .text("target", &target);
        let path = self.config.output_directory.join("index.html");
        write_file(&path, &self.templates.render(template::REDIRECT, context.into())?)?;
        Ok(path)
    }

    /// Fields shared by post and index pages.
    fn page(&self, lang: &str) -> Object {
        let site = &self.config.site;
        let og_image = site.og_image.as_deref().map(|image| self.urls.absolutize(image));
        Object::new()
            .text("lang", lang)
            .text("site_name", &site.name)
            .text("author", &site.author)
            .text("base_path", &site.base_path)
            .text("home", &self.urls.href(&format!("{}/", lang)))
            .text("rss_href", &self.urls.href(&format!("{}/rss.xml", lang)))
            .text("year", &Utc::now().year().to_string())
            .value("og_image", optional_text(og_image.as_deref()))
            .value("t", self.strings(lang))
    }

    /// The UI strings for `lang`: built-in defaults overlaid with the
    /// project's `i18n` table.
    fn strings(&self, lang: &str) -> Value {
        let mut strings: HashMap<&str, &str> = default_strings(lang).iter().copied().collect();
        if let Some(overrides) = self.config.site.i18n.get(lang) {
            for (key, text) in overrides {
                strings.insert(key, text);
            }
        }
        strings
            .into_iter()
            .fold(Object::new(), |object, (key, text)| object.text(key, text))
            .into()
    }

    fn sidebar(&self, index: &SiteIndex, lang: &str) -> Value {
        list(index.sidebar(lang).iter().map(|item| {
            Value::from(
                Object::new()
                    .text("title", &item.title)
                    .text("date", &item.date)
                    .text("href", &self.urls.href(&item.url)),
            )
        }))
    }

    fn link(&self, item: &PostListItem) -> Value {
        Object::new()
            .text("title", &item.title)
            .text("href", &self.urls.href(&item.url))
            .into()
    }
}

/// Writes `contents` to `path`, creating parent directories as needed.
pub fn write_file(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, contents)
}

/// The result of a fallible page-writing operation.
type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error during templating.
    Template(template::Error),

    /// An error writing the output files.
    Io(io::Error),

    /// Returned when a post's source path doesn't encode its output
    /// location.
    UnderivablePath(PathBuf),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<template::Error> for Error {
    /// Converts a [`template::Error`] into an [`Error`]. This allows us to
    /// use the `?` operator for fallible template operations.
    fn from(err: template::Error) -> Error {
        Error::Template(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::UnderivablePath(path) => write!(
                f,
                "Could not derive an output path from '{}'",
                path.display()
            ),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::UnderivablePath(_) => None,
        }
    }
}
