//! Loads the project configuration from `polyblog.yaml`. The project file
//! is searched for in the given directory and then in each of its ancestors.
//! All paths in the project file are relative to the directory containing
//! it.

use crate::url::{PathLayout, SiteUrls};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// The name of the project file.
pub const PROJECT_FILE: &str = "polyblog.yaml";

fn default_multilingual() -> bool {
    true
}

#[derive(Deserialize)]
struct Project {
    site_name: String,
    site_description: String,
    site_domain: String,
    base_path: String,
    author: String,
    sidebar_max_items: usize,
    rss_max_items: usize,

    /// Required, but dates are always rendered at UTC midnight.
    #[serde(rename = "timezone")]
    _timezone: String,

    default_lang: String,
    supported_langs: Vec<String>,

    #[serde(default = "default_multilingual")]
    multilingual: bool,

    #[serde(default)]
    og_image: Option<String>,

    #[serde(default)]
    i18n: HashMap<String, HashMap<String, String>>,

    #[serde(default)]
    content_directory: Option<PathBuf>,

    #[serde(default)]
    theme_directory: Option<PathBuf>,
}

/// Site-wide metadata made available to every template.
#[derive(Clone, Debug)]
pub struct Site {
    pub name: String,
    pub description: String,

    /// The bare domain, e.g. `blog.example.com`.
    pub domain: String,

    /// Either empty or `/segment[/segment...]` without a trailing slash.
    pub base_path: String,
    pub author: String,

    /// The default OGP image, relative to the domain or absolute.
    pub og_image: Option<String>,

    /// UI strings keyed by language, then by string name.
    pub i18n: HashMap<String, HashMap<String, String>>,
}

impl Site {
    pub fn urls(&self) -> SiteUrls {
        SiteUrls::new(&self.domain, &self.base_path)
    }
}

/// The configured languages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Languages {
    /// The primary language. Posts in any other language are translations,
    /// and the root `index.html` redirects here.
    pub default: String,

    /// Every language a post may be written in, in display order.
    pub supported: Vec<String>,

    /// Whether source paths carry a language segment
    /// (`YYYY/MM/DD/<lang>/<slug>.md`) and posts must declare `lang`.
    pub multilingual: bool,
}

impl Languages {
    pub fn is_supported(&self, lang: &str) -> bool {
        self.supported.iter().any(|l| l == lang)
    }

    /// The source path layout implied by these languages.
    pub fn layout(&self) -> PathLayout {
        match self.multilingual {
            true => PathLayout::Multilingual,
            false => PathLayout::Monolingual(self.default.clone()),
        }
    }
}

/// The fully resolved configuration for a build.
#[derive(Clone, Debug)]
pub struct Config {
    pub site: Site,
    pub languages: Languages,
    pub sidebar_max_items: usize,
    pub rss_max_items: usize,

    /// `{content_directory}/posts`, holding `YYYY/MM/DD/[lang/]slug.md`.
    pub posts_directory: PathBuf,

    /// `{content_directory}/sections`, holding
    /// `{lang}/site-descriptions.md`.
    pub sections_directory: PathBuf,

    /// Holds `post.html`, `index.html` and `redirect.html` overrides. When
    /// `None`, the built-in templates are used.
    pub theme_directory: Option<PathBuf>,

    pub output_directory: PathBuf,
}

impl Config {
    /// Searches `dir` and its ancestors for [`PROJECT_FILE`] and loads it.
    /// Without an explicit `output_directory`, output goes to `dist` next to
    /// the project file.
    pub fn from_directory(dir: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.is_file() {
            return Config::from_project_file(&path, output_directory);
        }
        match dir.parent() {
            Some(parent) => Config::from_directory(parent, output_directory),
            None => Err(Error::NotFound),
        }
    }

    /// Loads the configuration from the project file at `path`.
    pub fn from_project_file(path: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let contents = std::fs::read_to_string(path).map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?;
        let project_root = path.parent().unwrap_or_else(|| Path::new("."));
        Config::from_yaml(&contents, project_root, output_directory).map_err(|err| match err {
            Error::Yaml { path: None, err } => Error::Yaml {
                path: Some(path.to_owned()),
                err,
            },
            err => err,
        })
    }

    /// Parses and validates project YAML. Paths are resolved against
    /// `project_root`.
    pub fn from_yaml(
        yaml: &str,
        project_root: &Path,
        output_directory: Option<&Path>,
    ) -> Result<Config> {
        let project: Project =
            serde_yaml::from_str(yaml).map_err(|err| Error::Yaml { path: None, err })?;

        if project.supported_langs.is_empty() {
            return Err(Error::Invalid(
                "`supported_langs` must list at least one language".to_owned(),
            ));
        }
        for lang in &project.supported_langs {
            if !is_language_code(lang) {
                return Err(Error::Invalid(format!(
                    "language `{}` must be two lowercase letters",
                    lang
                )));
            }
        }
        if !project.supported_langs.contains(&project.default_lang) {
            return Err(Error::Invalid(format!(
                "`default_lang` `{}` is not one of `supported_langs`",
                project.default_lang
            )));
        }
        if project.site_domain.is_empty()
            || project.site_domain.contains("://")
            || project.site_domain.contains('/')
        {
            return Err(Error::Invalid(format!(
                "`site_domain` must be a bare domain name, found `{}`",
                project.site_domain
            )));
        }

        let content_directory =
            project_root.join(project.content_directory.unwrap_or_else(|| PathBuf::from("content")));
        let theme_directory = match project.theme_directory {
            Some(dir) => Some(project_root.join(dir)),
            None => Some(project_root.join("theme")).filter(|dir| dir.is_dir()),
        };

        Ok(Config {
            site: Site {
                name: project.site_name,
                description: project.site_description,
                domain: project.site_domain,
                base_path: normalize_base_path(&project.base_path),
                author: project.author,
                og_image: project.og_image,
                i18n: project.i18n,
            },
            languages: Languages {
                default: project.default_lang,
                supported: project.supported_langs,
                multilingual: project.multilingual,
            },
            sidebar_max_items: project.sidebar_max_items,
            rss_max_items: project.rss_max_items,
            posts_directory: content_directory.join("posts"),
            sections_directory: content_directory.join("sections"),
            theme_directory,
            output_directory: output_directory
                .map(Path::to_path_buf)
                .unwrap_or_else(|| project_root.join("dist")),
        })
    }
}

fn is_language_code(lang: &str) -> bool {
    lang.len() == 2 && lang.bytes().all(|b| b.is_ascii_lowercase())
}

/// Normalizes `base_path` to `""` or `/a/b` (leading slash, no trailing
/// slash).
fn normalize_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim().trim_matches('/');
    match trimmed.is_empty() {
        true => String::new(),
        false => format!("/{}", trimmed),
    }
}

/// The result of loading a configuration.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a fatal configuration problem.
#[derive(Debug)]
pub enum Error {
    /// Returned when no project file exists in the directory or any
    /// ancestor.
    NotFound,

    /// Returned when the project file exists but can't be read.
    Open { path: PathBuf, err: std::io::Error },

    /// Returned when the project file isn't valid YAML or lacks a required
    /// field.
    Yaml {
        path: Option<PathBuf>,
        err: serde_yaml::Error,
    },

    /// Returned when a field is present but its value is unusable.
    Invalid(String),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotFound => write!(
                f,
                "Could not find `{}` in any parent directory",
                PROJECT_FILE
            ),
            Error::Open { path, err } => {
                write!(f, "Opening project file '{}': {}", path.display(), err)
            }
            Error::Yaml {
                path: Some(path),
                err,
            } => write!(f, "Loading configuration '{}': {}", path.display(), err),
            Error::Yaml { path: None, err } => write!(f, "Loading configuration: {}", err),
            Error::Invalid(message) => write!(f, "Invalid configuration: {}", message),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::NotFound => None,
            Error::Open { path: _, err } => Some(err),
            Error::Yaml { path: _, err } => Some(err),
            Error::Invalid(_) => None,
        }
    }
}

#[cfg(test)]
pub(crate) const TEST_PROJECT: &str = r#"
site_name: Test Blog
site_description: Notes & things
site_domain: blog.example.com
base_path: /blog/
author: Tester
sidebar_max_items: 5
rss_max_items: 10
timezone: Asia/Tokyo
default_lang: ja
supported_langs: [ja, en]
og_image: /images/ogp.png
"#;

/// Builds a configuration rooted at `root` from [`TEST_PROJECT`].
#[cfg(test)]
pub(crate) fn test_config(root: &Path) -> Config {
    Config::from_yaml(TEST_PROJECT, root, None).expect("test project parses")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_yaml() -> Result<()> {
        let config = Config::from_yaml(TEST_PROJECT, Path::new("/site"), Some(Path::new("/out")))?;
        assert_eq!("Test Blog", config.site.name);
        assert_eq!("/blog", config.site.base_path);
        assert_eq!("ja", config.languages.default);
        assert_eq!(vec!["ja".to_owned(), "en".to_owned()], config.languages.supported);
        assert!(config.languages.multilingual);
        assert_eq!(PathBuf::from("/site/content/posts"), config.posts_directory);
        assert_eq!(PathBuf::from("/site/content/sections"), config.sections_directory);
        assert_eq!(PathBuf::from("/out"), config.output_directory);
        assert_eq!(5, config.sidebar_max_items);
        Ok(())
    }

    #[test]
    fn test_missing_required_field_is_fatal() {
        let yaml = TEST_PROJECT.replace("author: Tester\n", "");
        match Config::from_yaml(&yaml, Path::new("/site"), None) {
            Err(Error::Yaml { err, .. }) => assert!(err.to_string().contains("author")),
            other => panic!("wanted a YAML error, found {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_timezone_is_required() {
        let yaml = TEST_PROJECT.replace("timezone: Asia/Tokyo\n", "");
        match Config::from_yaml(&yaml, Path::new("/site"), None) {
            Err(Error::Yaml { err, .. }) => assert!(err.to_string().contains("timezone")),
            other => panic!("wanted a YAML error, found {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_default_lang_must_be_supported() {
        let yaml = TEST_PROJECT.replace("default_lang: ja", "default_lang: fr");
        assert!(matches!(
            Config::from_yaml(&yaml, Path::new("/site"), None),
            Err(Error::Invalid(_))
        ));
    }

    #[test]
    fn test_language_codes_are_two_lowercase_letters() {
        let yaml = TEST_PROJECT.replace("[ja, en]", "[ja, EN]");
        assert!(matches!(
            Config::from_yaml(&yaml, Path::new("/site"), None),
            Err(Error::Invalid(_))
        ));
    }

    #[test]
    fn test_normalize_base_path() {
        assert_eq!("", normalize_base_path(""));
        assert_eq!("", normalize_base_path("/"));
        assert_eq!("/blog", normalize_base_path("blog"));
        assert_eq!("/blog/sub", normalize_base_path("/blog/sub/"));
    }

    #[test]
    fn test_from_directory_searches_ancestors() -> Result<()> {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(PROJECT_FILE), TEST_PROJECT).expect("write project");
        let nested = dir.path().join("content").join("posts");
        std::fs::create_dir_all(&nested).expect("mkdir");

        let config = Config::from_directory(&nested, None)?;
        assert_eq!(dir.path().join("content").join("posts"), config.posts_directory);
        assert_eq!(dir.path().join("dist"), config.output_directory);
        Ok(())
    }
}
