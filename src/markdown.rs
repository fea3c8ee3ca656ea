//! Converts post bodies and site description sections from markdown to
//! HTML.

use pulldown_cmark::*;

/// Renders markdown to an HTML fragment.
pub trait MarkdownRenderer {
    fn render(&self, markdown: &str) -> String;
}

/// A [`MarkdownRenderer`] for CommonMark plus footnotes, tables,
/// strikethrough, task lists and smart punctuation.
#[derive(Clone, Copy, Debug, Default)]
pub struct CommonMark;

impl MarkdownRenderer for CommonMark {
    fn render(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_SMART_PUNCTUATION);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_TASKLISTS);

        let mut html = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(
            &mut html,
            Parser::new_ext(markdown, options).map(demote_headings),
        );
        html
    }
}

// The page title is the only h1, so `#` in a body becomes h2.
fn demote_headings(ev: Event) -> Event {
    match ev {
        Event::Start(Tag::Heading(level)) => Event::Start(Tag::Heading(demote(level))),
        Event::End(Tag::Heading(level)) => Event::End(Tag::Heading(demote(level))),
        _ => ev,
    }
}

fn demote(level: u32) -> u32 {
    (level + 1).min(6)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_headings_are_demoted() {
        let html = CommonMark.render("# Title\n\n###### Deep\n");
        assert_eq!("<h2>Title</h2>\n<h6>Deep</h6>\n", html);
    }

    #[test]
    fn test_extensions() {
        let html = CommonMark.render("~~gone~~ and \"quoted\"\n\n| a |\n|---|\n| 1 |\n");
        assert!(html.contains("<del>gone</del>"), "{}", html);
        assert!(html.contains("\u{201c}quoted\u{201d}"), "{}", html);
        assert!(html.contains("<table>"), "{}", html);
    }

    #[test]
    fn test_inline_html_passes_through() {
        let html = CommonMark.render("<div class=\"note\">hi</div>\n");
        assert_eq!("<div class=\"note\">hi</div>\n", html);
    }
}
