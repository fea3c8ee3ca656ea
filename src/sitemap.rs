//! Sitemap protocol 0.9 documents and `robots.txt`.
//!
//! Each language gets a `<urlset>` at `{lang}/sitemap.xml`; the root
//! `sitemap.xml` is a `<sitemapindex>` pointing at them, which is what
//! `robots.txt` advertises.

use crate::feed::push_text;
use crate::postlist::Entry;
use crate::url::SiteUrls;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use std::fmt;
use std::io::Write;

const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Writes the `<urlset>` for one language: its index page followed by each
/// entry. `entries` must be sorted newest first.
pub fn write_sitemap<W: Write>(urls: &SiteUrls, lang: &str, entries: &[Entry], w: W) -> Result<()> {
    let mut writer = start(w, "urlset")?;

    push_url(
        &mut writer,
        &urls.lang_index(lang),
        entries.first().map(|newest| newest.post.date.as_str()),
        "daily",
        "1.0",
    )?;
    for entry in entries {
        push_url(
            &mut writer,
            &urls.canonical(&entry.location.fragment()),
            Some(&entry.post.date),
            "monthly",
            "0.8",
        )?;
    }

    finish(writer, "urlset")
}

/// Writes the root `<sitemapindex>` listing each language's sitemap.
pub fn write_sitemap_index<W: Write>(urls: &SiteUrls, langs: &[String], w: W) -> Result<()> {
    let mut writer = start(w, "sitemapindex")?;
    for lang in langs {
        writer.write_event(Event::Start(BytesStart::new("sitemap")))?;
        push_text(&mut writer, "loc", &urls.canonical(&format!("{}/sitemap.xml", lang)))?;
        writer.write_event(Event::End(BytesEnd::new("sitemap")))?;
    }
    finish(writer, "sitemapindex")
}

/// The contents of `robots.txt`: allow everything and point at the root
/// sitemap.
pub fn robots_txt(site_name: &str, urls: &SiteUrls) -> String {
    format!(
        "# robots.txt for {}\n\nUser-agent: *\nAllow: /\n\nSitemap: {}/sitemap.xml\n",
        site_name,
        urls.base_url()
    )
}

fn start<W: Write>(w: W, root: &str) -> Result<Writer<W>> {
    let mut writer = Writer::new_with_indent(w, b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    let mut element = BytesStart::new(root);
    element.push_attribute(("xmlns", SITEMAP_NAMESPACE));
    writer.write_event(Event::Start(element))?;
    Ok(writer)
}

fn finish<W: Write>(mut writer: Writer<W>, root: &str) -> Result<()> {
    writer.write_event(Event::End(BytesEnd::new(root)))?;
    let mut w = writer.into_inner();
    w.write_all(b"\n")?;
    w.flush()?;
    Ok(())
}

fn push_url<W: Write>(
    writer: &mut Writer<W>,
    loc: &str,
    lastmod: Option<&str>,
    changefreq: &str,
    priority: &str,
) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new("url")))?;
    push_text(writer, "loc", loc)?;
    if let Some(lastmod) = lastmod {
        push_text(writer, "lastmod", lastmod)?;
    }
    push_text(writer, "changefreq", changefreq)?;
    push_text(writer, "priority", priority)?;
    writer.write_event(Event::End(BytesEnd::new("url")))?;
    Ok(())
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem writing a sitemap.
#[derive(Debug)]
pub enum Error {
    /// Returned when there is a generic I/O error.
    Io(std::io::Error),

    /// Returned when there is an error serializing the XML.
    Xml(quick_xml::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(f),
            Error::Xml(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Xml(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator when writing sitemaps.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<quick_xml::Error> for Error {
    /// Converts [`quick_xml::Error`]s into [`Error`]. This allows us to use
    /// the `?` operator when writing sitemaps.
    fn from(err: quick_xml::Error) -> Error {
        Error::Xml(err)
    }
}
