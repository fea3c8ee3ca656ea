//! Pure functions mapping source paths to output paths and canonical URLs.
//!
//! A post's source path encodes its identity:
//! `.../YYYY/MM/DD/<lang>/<slug>.md` for multi-language sites, or
//! `.../YYYY/MM/DD/<slug>.md` for single-language ones. From that identity
//! we derive the output file
//! `{output}/{lang}/posts/YYYY/MM/DD/{slug}/index.html` and the canonical
//! URL `https://{domain}{base_path}/{lang}/posts/YYYY/MM/DD/{slug}/`.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use url::Url;

static MULTILINGUAL_PATTERN: OnceLock<Regex> = OnceLock::new();
static MONOLINGUAL_PATTERN: OnceLock<Regex> = OnceLock::new();
static OUTPUT_PATTERN: OnceLock<Regex> = OnceLock::new();

fn multilingual_pattern() -> &'static Regex {
    MULTILINGUAL_PATTERN.get_or_init(|| {
        Regex::new(r"([0-9]{4})/([0-9]{2})/([0-9]{2})/([a-z]{2})/([^/]+)\.md$").unwrap()
    })
}

fn monolingual_pattern() -> &'static Regex {
    MONOLINGUAL_PATTERN
        .get_or_init(|| Regex::new(r"([0-9]{4})/([0-9]{2})/([0-9]{2})/([^/]+)\.md$").unwrap())
}

fn output_pattern() -> &'static Regex {
    OUTPUT_PATTERN.get_or_init(|| {
        Regex::new(r"([a-z]{2})/posts/([0-9]{4})/([0-9]{2})/([0-9]{2})/([^/]+)/index\.html$").unwrap()
    })
}

/// Renders `path` with forward slashes regardless of platform.
pub fn normalize_separators(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// The identity of a post as encoded in its path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PostLocation {
    pub lang: String,
    pub year: String,
    pub month: String,
    pub day: String,
    pub slug: String,
}

impl PostLocation {
    /// The `YYYY-MM-DD` date encoded in the path.
    pub fn date(&self) -> String {
        format!("{}-{}-{}", self.year, self.month, self.day)
    }

    /// The site-relative URL fragment, e.g.
    /// `ja/posts/2024/03/05/hello/`. Never begins with a slash.
    pub fn fragment(&self) -> String {
        format!(
            "{}/posts/{}/{}/{}/{}/",
            self.lang, self.year, self.month, self.day, self.slug
        )
    }

    /// The output file for this post beneath `output_root`.
    pub fn output_path(&self, output_root: &Path) -> PathBuf {
        output_root
            .join(&self.lang)
            .join("posts")
            .join(&self.year)
            .join(&self.month)
            .join(&self.day)
            .join(&self.slug)
            .join("index.html")
    }

    /// Recovers a location from a path produced by
    /// [`PostLocation::output_path`].
    pub fn from_output_path(path: &Path) -> Option<PostLocation> {
        let normalized = normalize_separators(path);
        let caps = output_pattern().captures(&normalized)?;
        Some(PostLocation {
            lang: caps[1].to_owned(),
            year: caps[2].to_owned(),
            month: caps[3].to_owned(),
            day: caps[4].to_owned(),
            slug: caps[5].to_owned(),
        })
    }
}

/// How source paths are laid out beneath the posts directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathLayout {
    /// `YYYY/MM/DD/<lang>/<slug>.md`
    Multilingual,

    /// `YYYY/MM/DD/<slug>.md`; every post is in the contained language.
    Monolingual(String),
}

impl PathLayout {
    /// Derives a [`PostLocation`] from a source path. Returns `None` when
    /// the path doesn't follow the layout; callers log and drop the item.
    pub fn derive(&self, source_path: &Path) -> Option<PostLocation> {
        let normalized = normalize_separators(source_path);
        match self {
            PathLayout::Multilingual => {
                let caps = multilingual_pattern().captures(&normalized)?;
                Some(PostLocation {
                    year: caps[1].to_owned(),
                    month: caps[2].to_owned(),
                    day: caps[3].to_owned(),
                    lang: caps[4].to_owned(),
                    slug: caps[5].to_owned(),
                })
            }
            PathLayout::Monolingual(lang) => {
                let caps = monolingual_pattern().captures(&normalized)?;
                Some(PostLocation {
                    year: caps[1].to_owned(),
                    month: caps[2].to_owned(),
                    day: caps[3].to_owned(),
                    lang: lang.clone(),
                    slug: caps[4].to_owned(),
                })
            }
        }
    }
}

/// Builds absolute and site-relative URLs for a site served from
/// `https://{domain}{base_path}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiteUrls {
    domain: String,
    base_path: String,
}

impl SiteUrls {
    /// `base_path` must already be normalized (empty, or a leading slash
    /// and no trailing slash).
    pub fn new(domain: &str, base_path: &str) -> SiteUrls {
        SiteUrls {
            domain: domain.to_owned(),
            base_path: base_path.to_owned(),
        }
    }

    /// `https://{domain}{base_path}` without a trailing slash.
    pub fn base_url(&self) -> String {
        format!("https://{}{}", self.domain, self.base_path)
    }

    /// The absolute URL for a site-relative fragment.
    pub fn canonical(&self, fragment: &str) -> String {
        format!("{}/{}", self.base_url(), fragment)
    }

    /// The absolute URL of a language's index page.
    pub fn lang_index(&self, lang: &str) -> String {
        format!("{}/{}/", self.base_url(), lang)
    }

    /// The root-relative link for a fragment, used for in-site navigation.
    pub fn href(&self, fragment: &str) -> String {
        format!("{}/{}", self.base_path, fragment)
    }

    /// Makes an image reference absolute. Absolute URLs pass through
    /// unchanged, protocol-relative ones (`//host/...`) get `https:`, and
    /// anything else is treated as a path on the site's domain.
    pub fn absolutize(&self, image: &str) -> String {
        match Url::parse(image) {
            Ok(_) => image.to_owned(),
            Err(_) if image.starts_with("//") => format!("https:{}", image),
            Err(_) if image.starts_with('/') => format!("https://{}{}", self.domain, image),
            Err(_) => format!("https://{}/{}", self.domain, image),
        }
    }
}
