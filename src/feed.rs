//! Support for creating RSS 2.0 feeds from a list of posts.

use crate::postlist::Entry;
use crate::url::SiteUrls;
use chrono::{NaiveDate, ParseError};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fmt;
use std::io::Write;

const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";

/// Bundled configuration for creating a feed.
pub struct FeedConfig<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub author: &'a str,
    pub lang: &'a str,
    pub urls: &'a SiteUrls,
}

impl FeedConfig<'_> {
    /// The feed's own URL, `{base_url}/{lang}/rss.xml`.
    pub fn self_link(&self) -> String {
        self.urls.canonical(&format!("{}/rss.xml", self.lang))
    }
}

/// Writes an RSS channel with one item per entry. `entries` must already be
/// sorted newest first and truncated to the feed's size; `lastBuildDate` is
/// taken from the first entry.
pub fn write_feed<W: Write>(config: &FeedConfig, entries: &[Entry], w: W) -> Result<()> {
    let mut writer = Writer::new_with_indent(w, b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    rss.push_attribute(("xmlns:atom", ATOM_NAMESPACE));
    writer.write_event(Event::Start(rss))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;

    push_text(&mut writer, "title", config.title)?;
    push_text(&mut writer, "link", &config.urls.lang_index(config.lang))?;
    push_text(&mut writer, "description", config.description)?;
    push_text(&mut writer, "language", config.lang)?;
    if let Some(newest) = entries.first() {
        push_text(&mut writer, "lastBuildDate", &rfc822(&newest.post.date)?)?;
    }

    let self_link = config.self_link();
    let mut atom_link = BytesStart::new("atom:link");
    atom_link.push_attribute(("href", self_link.as_str()));
    atom_link.push_attribute(("rel", "self"));
    atom_link.push_attribute(("type", "application/rss+xml"));
    writer.write_event(Event::Empty(atom_link))?;

    for entry in entries {
        let link = config.urls.canonical(&entry.location.fragment());
        writer.write_event(Event::Start(BytesStart::new("item")))?;
        push_text(&mut writer, "title", &entry.post.title)?;
        push_text(&mut writer, "link", &link)?;

        let mut guid = BytesStart::new("guid");
        guid.push_attribute(("isPermaLink", "true"));
        writer.write_event(Event::Start(guid))?;
        writer.write_event(Event::Text(BytesText::new(&link)))?;
        writer.write_event(Event::End(BytesEnd::new("guid")))?;

        push_text(&mut writer, "pubDate", &rfc822(&entry.post.date)?)?;
        push_text(&mut writer, "author", config.author)?;
        if !entry.post.description.is_empty() {
            push_text(&mut writer, "description", &entry.post.description)?;
        }
        writer.write_event(Event::End(BytesEnd::new("item")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;
    let mut w = writer.into_inner();
    w.write_all(b"\n")?;
    w.flush()?;
    Ok(())
}

/// Formats a `YYYY-MM-DD` date as UTC midnight in RFC 822 form, e.g.
/// `Tue, 05 Mar 2024 00:00:00 GMT`.
pub fn rfc822(date: &str) -> Result<String> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")?;
    Ok(date.format("%a, %d %b %Y 00:00:00 GMT").to_string())
}

pub(crate) fn push_text<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    text: &str,
) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed. Variants inlude I/O, XML, and
/// date parsing issues.
#[derive(Debug)]
pub enum Error {
    /// Returned when there is a generic I/O error.
    Io(std::io::Error),

    /// Returned when there is an error serializing the XML.
    Xml(quick_xml::Error),

    /// Returned when there is an issue parsing a post's date.
    DateTimeParse(ParseError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(f),
            Error::Xml(err) => err.fmt(f),
            Error::DateTimeParse(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Xml(err) => Some(err),
            Error::DateTimeParse(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator in fallible feed operations.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<quick_xml::Error> for Error {
    /// Converts [`quick_xml::Error`]s into [`Error`]. This allows us to use
    /// the `?` operator in fallible feed operations.
    fn from(err: quick_xml::Error) -> Error {
        Error::Xml(err)
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use the `?`
    /// operator in fallible feed operations.
    fn from(err: ParseError) -> Error {
        Error::DateTimeParse(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::{fixture, Post};
    use crate::postlist::feed_entries;
    use crate::url::PathLayout;

    #[test]
    fn test_rfc822() -> Result<()> {
        assert_eq!("Tue, 05 Mar 2024 00:00:00 GMT", rfc822("2024-03-05")?);
        assert!(rfc822("2024-02-30").is_err());
        Ok(())
    }

    #[test]
    fn test_write_feed() -> Result<()> {
        let mut newer = fixture("en", "2024-03-05", "hello");
        newer.title = "Fish & <Chips>".to_owned();
        let older = fixture("en", "2024-01-01", "first");
        let recent: Vec<&Post> = vec![&newer, &older];
        let entries = feed_entries(&recent, 10, &PathLayout::Multilingual);

        let urls = SiteUrls::new("blog.example.com", "/blog");
        let config = FeedConfig {
            title: "Test Blog",
            description: "Notes",
            author: "Tester",
            lang: "en",
            urls: &urls,
        };
        let mut output = Vec::new();
        write_feed(&config, &entries, &mut output)?;
        let xml = String::from_utf8(output).expect("utf-8");

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#), "{}", xml);
        assert!(xml.contains(r#"xmlns:atom="http://www.w3.org/2005/Atom""#), "{}", xml);
        assert!(xml.contains("<language>en</language>"), "{}", xml);
        assert!(
            xml.contains("<lastBuildDate>Tue, 05 Mar 2024 00:00:00 GMT</lastBuildDate>"),
            "{}",
            xml
        );
        assert!(
            xml.contains(r#"<atom:link href="https://blog.example.com/blog/en/rss.xml" rel="self" type="application/rss+xml"/>"#),
            "{}",
            xml
        );
        assert!(xml.contains("<title>Fish &amp; &lt;Chips&gt;</title>"), "{}", xml);
        assert!(
            xml.contains(r#"<guid isPermaLink="true">https://blog.example.com/blog/en/posts/2024/03/05/hello/</guid>"#),
            "{}",
            xml
        );
        assert_eq!(2, xml.matches("<item>").count());
        assert!(xml.find("hello/</link>") < xml.find("first/</link>"));
        Ok(())
    }

    /// Accepts every write but fails to flush, like a buffered file whose
    /// final write hits a full disk.
    struct FlushFails;

    impl Write for FlushFails {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
        }
    }

    #[test]
    fn test_write_feed_reports_flush_failure() {
        let urls = SiteUrls::new("example.com", "");
        let config = FeedConfig {
            title: "t",
            description: "d",
            author: "a",
            lang: "ja",
            urls: &urls,
        };
        assert!(matches!(
            write_feed(&config, &[], FlushFails),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_empty_feed_has_no_build_date() -> Result<()> {
        let urls = SiteUrls::new("example.com", "");
        let config = FeedConfig {
            title: "t",
            description: "d",
            author: "a",
            lang: "ja",
            urls: &urls,
        };
        let mut output = Vec::new();
        write_feed(&config, &[], &mut output)?;
        let xml = String::from_utf8(output).expect("utf-8");
        assert!(!xml.contains("lastBuildDate"));
        assert!(!xml.contains("<item>"));
        Ok(())
    }
}
