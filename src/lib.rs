//! The library code for the `polyblog` static site generator. Posts live at
//! `content/posts/YYYY/MM/DD/<lang>/<slug>.md` and a build runs in two
//! distinct steps:
//!
//! 1. Extracting posts from source files on disk ([`crate::parser`])
//! 2. Converting the posts into output files on disk ([`crate::write`],
//!    [`crate::feed`], [`crate::sitemap`])
//!
//! Between the two, the read-only indices every page needs are computed once
//! ([`crate::postlist`]): per-language sidebars, recency-sorted post lists
//! and translation pairs. Translations of a post share its date and file
//! stem, so each page can link to its counterparts in the other languages.
//!
//! A post that fails to parse, validate or render is recorded in the
//! [`crate::report::BuildReport`] and left out of the site; the build
//! itself only fails for problems that affect every page.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod feed;
pub mod markdown;
pub mod parser;
pub mod post;
pub mod postlist;
pub mod report;
pub mod sitemap;
pub mod template;
pub mod url;
pub mod validate;
pub mod value;
pub mod write;
