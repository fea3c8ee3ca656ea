//! Derived, read-only views over the published posts: recency-sorted lists,
//! sidebars, translation pairs and the entry lists behind feeds and
//! sitemaps. Everything here is computed once, before rendering starts.

use crate::config::Languages;
use crate::post::Post;
use crate::url::{PathLayout, PostLocation};
use std::collections::HashMap;
use tracing::warn;

/// A link to a post as shown in sidebars and language indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostListItem {
    pub title: String,
    pub date: String,

    /// The site-relative fragment, e.g. `ja/posts/2024/03/05/hello/`.
    pub url: String,
    pub lang: String,
}

/// A link to the same post in another language.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlternateLink {
    pub lang: String,

    /// The counterpart's fragment, or `{lang}/` when no translation exists.
    pub url: String,

    /// Whether `url` points at an actual translation.
    pub translated: bool,
}

/// A post paired with its derived location.
#[derive(Clone, Debug)]
pub struct Entry<'p> {
    pub post: &'p Post,
    pub location: PostLocation,
}

fn derive(post: &Post, layout: &PathLayout) -> Option<PostLocation> {
    let location = layout.derive(&post.source_path);
    if location.is_none() {
        warn!(
            "Could not derive a URL from {}; leaving it out",
            post.source_path.display()
        );
    }
    location
}

/// Maps `post` to a list item, or `None` (with a warning) when its path
/// doesn't follow `layout`.
pub fn list_item(post: &Post, layout: &PathLayout) -> Option<PostListItem> {
    derive(post, layout).map(|location| PostListItem {
        title: post.title.clone(),
        date: post.date.clone(),
        url: location.fragment(),
        lang: post.lang.clone(),
    })
}

/// Sorts newest first. The sort is stable, so posts sharing a date keep
/// their relative order.
pub fn sort_recent(posts: &mut [&Post]) {
    posts.sort_by(|a, b| b.date.cmp(&a.date));
}

/// The `max_items` most recent posts, restricted to `lang` when given. Posts
/// whose path doesn't follow `layout` still count towards `max_items`.
pub fn build_sidebar(
    posts: &[Post],
    lang: Option<&str>,
    max_items: usize,
    layout: &PathLayout,
) -> Vec<PostListItem> {
    let mut filtered: Vec<&Post> = posts
        .iter()
        .filter(|post| lang.map_or(true, |lang| post.lang == lang))
        .collect();
    sort_recent(&mut filtered);
    filtered
        .into_iter()
        .take(max_items)
        .filter_map(|post| list_item(post, layout))
        .collect()
}

/// Whether `a` and `b` are translations of each other.
pub fn is_language_pair(a: &Post, b: &Post) -> bool {
    a.lang != b.lang && a.date == b.date && a.stem() == b.stem()
}

/// Translation lookup keyed by `(date, stem)`.
pub struct LanguagePairs<'a> {
    index: HashMap<(String, String), Vec<&'a Post>>,
}

impl<'a> LanguagePairs<'a> {
    pub fn new(posts: &'a [Post]) -> LanguagePairs<'a> {
        let mut index: HashMap<(String, String), Vec<&'a Post>> = HashMap::new();
        for post in posts {
            index
                .entry((post.date.clone(), post.stem().to_owned()))
                .or_default()
                .push(post);
        }
        LanguagePairs { index }
    }

    /// The translation of `post` into `lang`, if one was published.
    pub fn counterpart(&self, post: &Post, lang: &str) -> Option<&'a Post> {
        self.index
            .get(&(post.date.clone(), post.stem().to_owned()))?
            .iter()
            .copied()
            .find(|other| other.lang == lang && is_language_pair(post, other))
    }

    /// One link per language in `langs` other than the post's own. Pass
    /// only languages whose `{lang}/` index exists.
    pub fn alternates(
        &self,
        post: &Post,
        langs: &[String],
        layout: &PathLayout,
    ) -> Vec<AlternateLink> {
        langs
            .iter()
            .filter(|lang| **lang != post.lang)
            .map(|lang| {
                let found = self
                    .counterpart(post, lang)
                    .and_then(|other| layout.derive(&other.source_path));
                match found {
                    Some(location) => AlternateLink {
                        lang: lang.clone(),
                        url: location.fragment(),
                        translated: true,
                    },
                    None => AlternateLink {
                        lang: lang.clone(),
                        url: format!("{}/", lang),
                        translated: false,
                    },
                }
            })
            .collect()
    }

    /// For a translation, the post in the `primary` language it translates.
    pub fn original(
        &self,
        post: &Post,
        primary: &str,
        layout: &PathLayout,
    ) -> Option<PostListItem> {
        if post.lang == primary {
            return None;
        }
        self.counterpart(post, primary)
            .and_then(|original| list_item(original, layout))
    }
}

/// Indices shared by every render step.
pub struct SiteIndex<'a> {
    pub pairs: LanguagePairs<'a>,
    languages: Vec<String>,
    recent: HashMap<String, Vec<&'a Post>>,
    sidebars: HashMap<String, Vec<PostListItem>>,
}

impl<'a> SiteIndex<'a> {
    pub fn build(posts: &'a [Post], languages: &Languages, sidebar_max_items: usize) -> SiteIndex<'a> {
        let layout = languages.layout();
        let mut recent: HashMap<String, Vec<&'a Post>> = HashMap::new();
        for post in posts {
            recent.entry(post.lang.clone()).or_default().push(post);
        }
        for list in recent.values_mut() {
            sort_recent(list);
        }

        let with_posts: Vec<String> = languages
            .supported
            .iter()
            .filter(|lang| recent.contains_key(*lang))
            .cloned()
            .collect();
        let sidebars = with_posts
            .iter()
            .map(|lang| {
                let sidebar = build_sidebar(posts, Some(lang), sidebar_max_items, &layout);
                (lang.clone(), sidebar)
            })
            .collect();

        SiteIndex {
            pairs: LanguagePairs::new(posts),
            languages: with_posts,
            recent,
            sidebars,
        }
    }

    /// Languages with at least one published post, in configured order.
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn sidebar(&self, lang: &str) -> &[PostListItem] {
        self.sidebars.get(lang).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Posts in `lang`, newest first.
    pub fn recent(&self, lang: &str) -> &[&'a Post] {
        self.recent.get(lang).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn latest(&self, lang: &str) -> Option<&'a Post> {
        self.recent(lang).first().copied()
    }
}

/// Pairs each post with its location, dropping (with a warning) those whose
/// path doesn't follow `layout`.
fn locate<'p>(posts: &[&'p Post], layout: &PathLayout) -> Vec<Entry<'p>> {
    posts
        .iter()
        .filter_map(|&post| derive(post, layout).map(|location| Entry { post, location }))
        .collect()
}

/// The newest `max_items` posts of a recency-sorted list, for a feed.
pub fn feed_entries<'p>(recent: &[&'p Post], max_items: usize, layout: &PathLayout) -> Vec<Entry<'p>> {
    locate(&recent[..max_items.min(recent.len())], layout)
}

/// Every post of a recency-sorted list, for a sitemap.
pub fn sitemap_entries<'p>(recent: &[&'p Post], layout: &PathLayout) -> Vec<Entry<'p>> {
    locate(recent, layout)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::fixture;
    use std::path::PathBuf;

    fn languages() -> Languages {
        Languages {
            default: "ja".to_owned(),
            supported: vec!["ja".to_owned(), "en".to_owned(), "fr".to_owned()],
            multilingual: true,
        }
    }

    #[test]
    fn test_sort_recent_is_stable() {
        let a = fixture("ja", "2024-01-01", "a");
        let b = fixture("ja", "2024-03-01", "b");
        let c = fixture("ja", "2024-01-01", "c");
        let d = fixture("ja", "2024-01-01", "d");
        let mut posts = vec![&a, &b, &c, &d];
        sort_recent(&mut posts);
        let slugs: Vec<&str> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(vec!["b", "a", "c", "d"], slugs);
    }

    #[test]
    fn test_sidebar_length() {
        let posts = vec![
            fixture("ja", "2024-01-01", "one"),
            fixture("ja", "2024-01-02", "two"),
            fixture("ja", "2024-01-03", "three"),
            fixture("en", "2024-01-04", "four"),
        ];
        let layout = PathLayout::Multilingual;
        assert_eq!(2, build_sidebar(&posts, Some("ja"), 2, &layout).len());
        assert_eq!(3, build_sidebar(&posts, Some("ja"), 10, &layout).len());
        assert_eq!(1, build_sidebar(&posts, Some("en"), 10, &layout).len());
        assert_eq!(0, build_sidebar(&posts, Some("fr"), 10, &layout).len());
        assert_eq!(4, build_sidebar(&posts, None, 10, &layout).len());

        let sidebar = build_sidebar(&posts, Some("ja"), 1, &layout);
        assert_eq!(
            PostListItem {
                title: "three (ja)".to_owned(),
                date: "2024-01-03".to_owned(),
                url: "ja/posts/2024/01/03/three/".to_owned(),
                lang: "ja".to_owned(),
            },
            sidebar[0]
        );
    }

    #[test]
    fn test_sidebar_drops_underivable_paths() {
        let mut stray = fixture("ja", "2024-05-05", "stray");
        stray.source_path = PathBuf::from("content/posts/stray.md");
        let posts = vec![stray, fixture("ja", "2024-01-01", "ok")];
        let sidebar = build_sidebar(&posts, Some("ja"), 10, &PathLayout::Multilingual);
        assert_eq!(1, sidebar.len());
        assert_eq!("ok (ja)", sidebar[0].title);
    }

    #[test]
    fn test_underivable_paths_count_towards_the_limit() {
        let mut stray = fixture("ja", "2024-05-05", "stray");
        stray.source_path = PathBuf::from("content/posts/stray.md");
        let posts = vec![stray, fixture("ja", "2024-01-01", "ok")];
        let layout = PathLayout::Multilingual;
        assert!(build_sidebar(&posts, Some("ja"), 1, &layout).is_empty());

        let recent: Vec<&Post> = posts.iter().collect();
        assert!(feed_entries(&recent, 1, &layout).is_empty());
        assert_eq!(1, feed_entries(&recent, 2, &layout).len());
    }

    #[test]
    fn test_language_pairs() {
        let posts = vec![
            fixture("ja", "2024-03-05", "hello"),
            fixture("en", "2024-03-05", "hello"),
            fixture("en", "2024-03-06", "hello"),
        ];
        let layout = PathLayout::Multilingual;
        let pairs = LanguagePairs::new(&posts);

        assert!(is_language_pair(&posts[0], &posts[1]));
        assert!(!is_language_pair(&posts[0], &posts[2]));
        assert_eq!(Some(&posts[1]), pairs.counterpart(&posts[0], "en"));
        assert_eq!(None, pairs.counterpart(&posts[2], "ja"));

        let alternates = pairs.alternates(&posts[0], &languages().supported, &layout);
        assert_eq!(
            vec![
                AlternateLink {
                    lang: "en".to_owned(),
                    url: "en/posts/2024/03/05/hello/".to_owned(),
                    translated: true,
                },
                AlternateLink {
                    lang: "fr".to_owned(),
                    url: "fr/".to_owned(),
                    translated: false,
                },
            ],
            alternates
        );
    }

    #[test]
    fn test_original() {
        let posts = vec![
            fixture("ja", "2024-03-05", "hello"),
            fixture("en", "2024-03-05", "hello"),
            fixture("en", "2024-03-07", "lonely"),
        ];
        let layout = PathLayout::Multilingual;
        let pairs = LanguagePairs::new(&posts);

        let original = pairs.original(&posts[1], "ja", &layout).expect("has original");
        assert_eq!("ja/posts/2024/03/05/hello/", original.url);
        assert_eq!(None, pairs.original(&posts[0], "ja", &layout));
        assert_eq!(None, pairs.original(&posts[2], "ja", &layout));
    }

    #[test]
    fn test_site_index() {
        let posts = vec![
            fixture("en", "2024-01-01", "old"),
            fixture("en", "2024-02-01", "new"),
            fixture("ja", "2024-01-15", "only"),
        ];
        let index = SiteIndex::build(&posts, &languages(), 1);
        assert_eq!(&["ja".to_owned(), "en".to_owned()], index.languages());
        assert_eq!(1, index.sidebar("en").len());
        assert!(index.sidebar("fr").is_empty());
        assert_eq!(2, index.recent("en").len());
        assert_eq!(Some("new"), index.latest("en").map(|p| p.slug.as_str()));
        assert_eq!(None, index.latest("fr"));
    }

    #[test]
    fn test_feed_entries_truncates() {
        let posts = vec![
            fixture("en", "2024-01-03", "c"),
            fixture("en", "2024-01-02", "b"),
            fixture("en", "2024-01-01", "a"),
        ];
        let recent: Vec<&Post> = posts.iter().collect();
        let layout = PathLayout::Multilingual;
        let feed = feed_entries(&recent, 2, &layout);
        assert_eq!(2, feed.len());
        assert_eq!("c", feed[0].location.slug);
        assert_eq!("c", feed[0].post.slug);
        assert_eq!(3, sitemap_entries(&recent, &layout).len());
    }
}
