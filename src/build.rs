//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: extracting the posts
//! ([`crate::parser`]), deriving the shared indices ([`crate::postlist`]),
//! rendering post and index pages ([`crate::write`]), and generating the
//! feeds, sitemaps and crawler files.
//!
//! Problems with an individual post are recorded in the returned
//! [`BuildReport`] and the build carries on without it. Anything that
//! affects the site as a whole is an [`Error`].

use crate::config::Config;
use crate::feed::{self, write_feed, FeedConfig};
use crate::markdown::{CommonMark, MarkdownRenderer};
use crate::parser::{self, Parser};
use crate::post::Post;
use crate::postlist::{feed_entries, sitemap_entries, SiteIndex};
use crate::report::BuildReport;
use crate::sitemap::{self, robots_txt, write_sitemap, write_sitemap_index};
use crate::template::{self, TemplateRenderer, Theme};
use crate::write::{self, write_file, Writer};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The file beneath `{sections}/{lang}/` holding a language's site
/// description.
const SITE_DESCRIPTION_FILE: &str = "site-descriptions.md";

/// The phases of a build, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Init,
    ExtractAll,
    RenderPosts,
    RenderIndexes,
    RenderFeeds,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Stage::Init => "init",
            Stage::ExtractAll => "extract",
            Stage::RenderPosts => "render posts",
            Stage::RenderIndexes => "render indexes",
            Stage::RenderFeeds => "render feeds",
            Stage::Done => "done",
        })
    }
}

fn enter(stage: Stage) {
    info!(%stage, "Build stage");
}

/// Builds the site described by `config` using its theme (or the built-in
/// templates) and CommonMark rendering.
pub fn build_site(config: &Config) -> Result<BuildReport> {
    let theme = Theme::load(config.theme_directory.as_deref())?;
    build_site_with(config, &theme, &CommonMark)
}

/// Builds the site with the given renderers.
pub fn build_site_with(
    config: &Config,
    templates: &dyn TemplateRenderer,
    markdown: &dyn MarkdownRenderer,
) -> Result<BuildReport> {
    let mut report = BuildReport::default();
    let output = &config.output_directory;

    enter(Stage::Init);
    std::fs::create_dir_all(output)?;

    enter(Stage::ExtractAll);
    let posts = Parser::new(&config.languages).parse_posts(&config.posts_directory, &mut report)?;
    let posts = remove_duplicates(posts, &mut report);
    info!("Extracted {} posts", posts.len());

    let layout = config.languages.layout();
    let index = SiteIndex::build(&posts, &config.languages, config.sidebar_max_items);
    let writer = Writer::new(config, templates, markdown);

    enter(Stage::RenderPosts);
    for post in &posts {
        match writer.write_post(post, &index) {
            Ok(path) => {
                debug!("Rendered {} to {}", post.source_path.display(), path.display());
                report.record_processed();
            }
            Err(err) => report.record_errors(&post.source_path, vec![err.to_string()]),
        }
    }

    enter(Stage::RenderIndexes);
    for lang in index.languages() {
        let description = load_site_description(&config.sections_directory, lang)?;
        let path = writer.write_index(lang, &index, description.as_deref())?;
        info!("Wrote {}", path.display());
    }
    let path = writer.write_redirect()?;
    info!("Wrote {}", path.display());

    enter(Stage::RenderFeeds);
    let urls = config.site.urls();
    for lang in index.languages() {
        let recent = index.recent(lang);

        let path = output.join(lang).join("sitemap.xml");
        let entries = sitemap_entries(recent, &layout);
        write_sitemap(&urls, lang, &entries, create(&path)?)?;
        info!("Wrote {} with {} URLs", path.display(), entries.len() + 1);

        let path = output.join(lang).join("rss.xml");
        let entries = feed_entries(recent, config.rss_max_items, &layout);
        let feed_config = FeedConfig {
            title: &config.site.name,
            description: &config.site.description,
            author: &config.site.author,
            lang,
            urls: &urls,
        };
        write_feed(&feed_config, &entries, create(&path)?)?;
        info!("Wrote {} with {} items", path.display(), entries.len());
    }

    let path = output.join("sitemap.xml");
    write_sitemap_index(&urls, index.languages(), create(&path)?)?;
    info!("Wrote {}", path.display());

    write_file(&output.join("robots.txt"), &robots_txt(&config.site.name, &urls))?;
    write_file(&output.join(".nojekyll"), "")?;
    info!("Wrote robots.txt and .nojekyll");

    enter(Stage::Done);
    Ok(report)
}

/// Keeps the first post for each `(lang, date, slug)`; later ones would
/// overwrite its output and are recorded as errors instead.
fn remove_duplicates(posts: Vec<Post>, report: &mut BuildReport) -> Vec<Post> {
    let mut seen: HashMap<(String, String, String), PathBuf> = HashMap::new();
    let mut unique = Vec::with_capacity(posts.len());
    for post in posts {
        let key = (post.lang.clone(), post.date.clone(), post.slug.clone());
        match seen.get(&key) {
            Some(first) => report.record_errors(
                &post.source_path,
                vec![format!(
                    "Duplicate post: {} {} `{}` is already defined by {}",
                    post.lang,
                    post.date,
                    post.slug,
                    first.display()
                )],
            ),
            None => {
                seen.insert(key, post.source_path.clone());
                unique.push(post);
            }
        }
    }
    unique
}

/// Reads `{sections}/{lang}/site-descriptions.md`. A missing file is
/// logged and treated as an empty section.
pub fn load_site_description(sections_directory: &Path, lang: &str) -> Result<Option<String>> {
    let path = sections_directory.join(lang).join(SITE_DESCRIPTION_FILE);
    if !path.is_file() {
        warn!("Site description not found: {}", path.display());
        return Ok(None);
    }
    Ok(Some(std::fs::read_to_string(path)?))
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during discovery,
/// templating, writing pages, feeds and sitemaps, and other I/O.
#[derive(Debug)]
pub enum Error {
    /// Returned when the posts directory can't be walked.
    Parse(parser::Error),

    /// Returned for errors loading the theme.
    Template(template::Error),

    /// Returned for errors writing index or redirect pages.
    Write(write::Error),

    /// Returned for errors writing a feed.
    Feed(feed::Error),

    /// Returned for errors writing a sitemap.
    Sitemap(sitemap::Error),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => err.fmt(f),
            Error::Template(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::Feed(err) => err.fmt(f),
            Error::Sitemap(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(err) => Some(err),
            Error::Template(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::Feed(err) => Some(err),
            Error::Sitemap(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<parser::Error> for Error {
    /// Converts [`parser::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: parser::Error) -> Error {
        Error::Parse(err)
    }
}

impl From<template::Error> for Error {
    /// Converts [`template::Error`]s into [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: template::Error) -> Error {
        Error::Template(err)
    }
}

impl From<write::Error> for Error {
    /// Converts [`write::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: write::Error) -> Error {
        Error::Write(err)
    }
}

impl From<feed::Error> for Error {
    /// Converts [`feed::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: feed::Error) -> Error {
        Error::Feed(err)
    }
}

impl From<sitemap::Error> for Error {
    /// Converts [`sitemap::Error`]s into [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: sitemap::Error) -> Error {
        Error::Sitemap(err)
    }
}
