//! Page templates. Themes are Go-style templates (via [`gtmpl`]) loaded from
//! `{theme_directory}/{name}.html`; any template a theme doesn't provide
//! falls back to a built-in default.

use gtmpl::{Template, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// The template for a single post page.
pub const POST: &str = "post";

/// The template for a language's index page.
pub const INDEX: &str = "index";

/// The template for the root page, which redirects to the default language.
pub const REDIRECT: &str = "redirect";

const NAMES: [&str; 3] = [POST, INDEX, REDIRECT];

/// Renders a named template against a context.
pub trait TemplateRenderer {
    fn render(&self, name: &str, context: Value) -> Result<String>;
}

/// The set of parsed page templates.
pub struct Theme {
    templates: HashMap<&'static str, Template>,
}

impl Theme {
    /// Loads the page templates from `theme_directory`, using the built-in
    /// default for each one the directory lacks.
    pub fn load(theme_directory: Option<&Path>) -> Result<Theme> {
        let mut templates = HashMap::new();
        for name in NAMES.iter().copied() {
            let source = match theme_directory.map(|dir| dir.join(format!("{}.html", name))) {
                Some(path) if path.is_file() => {
                    std::fs::read_to_string(&path)
                        .map_err(|err| Error::OpenTemplateFile { path, err })?
                }
                _ => builtin(name).to_owned(),
            };
            templates.insert(name, parse_template(name, &source)?);
        }
        Ok(Theme { templates })
    }

    /// The built-in templates only.
    pub fn builtin() -> Result<Theme> {
        Theme::load(None)
    }
}

impl TemplateRenderer for Theme {
    fn render(&self, name: &str, context: Value) -> Result<String> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| Error::UnknownTemplate(name.to_owned()))?;
        let context =
            gtmpl::Context::from(context).map_err(|err| Error::Execute(err.to_string()))?;
        let mut output: Vec<u8> = Vec::new();
        template
            .execute(&mut output, &context)
            .map_err(|err| Error::Execute(err.to_string()))?;
        Ok(String::from_utf8(output)?)
    }
}

fn parse_template(name: &str, source: &str) -> Result<Template> {
    let mut template = Template::default();
    template
        .parse(source)
        .map_err(|err| Error::ParseTemplate(format!("{}: {}", name, err)))?;
    Ok(template)
}

fn builtin(name: &str) -> &'static str {
    match name {
        POST => POST_TEMPLATE,
        INDEX => INDEX_TEMPLATE,
        _ => REDIRECT_TEMPLATE,
    }
}

const POST_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="{{.lang}}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{.title}} | {{.site_name}}</title>
<meta name="description" content="{{.description}}">
<link rel="canonical" href="{{.canonical_url}}">
<link rel="alternate" type="application/rss+xml" title="{{.site_name}}" href="{{.rss_href}}">
{{range .alternates}}{{if .translated}}<link rel="alternate" hreflang="{{.lang}}" href="{{.href}}">
{{end}}{{end}}<meta property="og:type" content="article">
<meta property="og:title" content="{{.title}}">
<meta property="og:description" content="{{.description}}">
<meta property="og:url" content="{{.canonical_url}}">
<meta property="og:site_name" content="{{.site_name}}">
{{if .og_image}}<meta property="og:image" content="{{.og_image}}">
{{end}}</head>
<body>
<header><a href="{{.home}}">{{.site_name}}</a></header>
<main>
<article>
<h1>{{.post.title}}</h1>
<p class="post-meta"><time datetime="{{.post.date}}">{{.post.formatted_date}}</time></p>
{{if .original}}<p class="original">{{.t.original_article}}: <a href="{{.original.href}}">{{.original.title}}</a></p>
{{end}}{{.content}}
{{if .post.tags}}<ul class="tags">{{range .post.tags}}<li>{{.}}</li>{{end}}</ul>
{{end}}</article>
<nav class="languages">{{range .alternates}}<a href="{{.href}}" hreflang="{{.lang}}">{{.lang}}</a> {{end}}</nav>
</main>
<aside>
<h2>{{.t.recent_posts}}</h2>
<ul>{{range .sidebar}}
<li><a href="{{.href}}">{{.title}}</a> <time datetime="{{.date}}">{{.date}}</time></li>{{end}}
</ul>
</aside>
<footer>&copy; {{.year}} {{.author}}</footer>
</body>
</html>
"#;

const INDEX_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="{{.lang}}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{.site_name}}</title>
<meta name="description" content="{{.description}}">
<link rel="canonical" href="{{.canonical_url}}">
<link rel="alternate" type="application/rss+xml" title="{{.site_name}}" href="{{.rss_href}}">
<meta property="og:type" content="website">
<meta property="og:title" content="{{.site_name}}">
<meta property="og:description" content="{{.description}}">
<meta property="og:url" content="{{.canonical_url}}">
{{if .og_image}}<meta property="og:image" content="{{.og_image}}">
{{end}}</head>
<body>
<header><a href="{{.home}}">{{.site_name}}</a></header>
<main>
<section class="site-description">{{.site_description_html}}</section>
{{if .latest}}<article>
<h1><a href="{{.latest.href}}">{{.latest.title}}</a></h1>
<p class="post-meta"><time datetime="{{.latest.date}}">{{.latest.formatted_date}}</time></p>
{{.latest.content}}
</article>
{{end}}</main>
<aside>
<h2>{{.t.recent_posts}}</h2>
<ul>{{range .sidebar}}
<li><a href="{{.href}}">{{.title}}</a> <time datetime="{{.date}}">{{.date}}</time></li>{{end}}
</ul>
</aside>
<footer>&copy; {{.year}} {{.author}}</footer>
</body>
</html>
"#;

const REDIRECT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{{.site_name}}</title>
<link rel="canonical" href="{{.target}}">
<meta http-equiv="refresh" content="0; url={{.target}}">
</head>
<body>
<p><a href="{{.target}}">{{.site_name}}</a></p>
</body>
</html>
"#;

/// The result of a template operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading or executing a template.
#[derive(Debug)]
pub enum Error {
    /// Returned when there is a problem opening a theme's template file.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned when there is a problem parsing a template.
    ParseTemplate(String),

    /// Returned when a template fails against its context.
    Execute(String),

    /// Returned when rendering a template that was never loaded.
    UnknownTemplate(String),

    /// Returned when a template produces invalid UTF-8.
    Utf8(std::string::FromUtf8Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate(err) => write!(f, "Parsing template {}", err),
            Error::Execute(err) => write!(f, "Executing template: {}", err),
            Error::UnknownTemplate(name) => write!(f, "Unknown template `{}`", name),
            Error::Utf8(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::ParseTemplate(_) => None,
            Error::Execute(_) => None,
            Error::UnknownTemplate(_) => None,
            Error::Utf8(err) => Some(err),
        }
    }
}

impl From<std::string::FromUtf8Error> for Error {
    /// Converts a [`std::string::FromUtf8Error`] into an [`Error`].
    fn from(err: std::string::FromUtf8Error) -> Error {
        Error::Utf8(err)
    }
}
