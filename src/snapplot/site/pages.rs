//! Template contexts for the built pages.
//!
//! Every page gets `site` (the full [`SiteConfig`], unknown keys included),
//! `collections` (visible collections, for navigation), `root` (the relative
//! prefix back to the output root) and `page_title`. Index and gallery pages add
//! `entries`; the gallery adds `collection`; detail pages add `entry`.

use crate::config::SiteConfig;
use crate::highlight::{highlight, Language};
use crate::markdown;
use crate::model::{date_format, CollectionEntry, CollectionMeta};
use crate::naming::extension_of;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use tracing::warn;

/// Relative prefix from a page `depth` directories below the output root.
pub fn root_prefix(depth: usize) -> String {
    "../".repeat(depth)
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionView {
    pub name: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    /// Rendered `_index.md` body.
    pub content: String,
    pub url: String,
    pub count: usize,
    #[serde(skip)]
    pub layout: Option<String>,
}

impl CollectionView {
    pub fn new(name: &str, meta: CollectionMeta, body: &str, count: usize) -> Self {
        Self {
            name: name.to_string(),
            title: meta.title,
            description: meta.description,
            tags: meta.tags,
            content: markdown::to_html(body),
            url: format!("{}/", name),
            count,
            layout: meta.layout,
        }
    }
}

/// Context names computed by the builder. Front matter keys with these names
/// are not passed through to templates.
const RESERVED_KEYS: &[&str] = &[
    "title", "slug", "collection", "collection_title", "url", "date", "author", "description",
    "tags", "plot_image", "code_file", "function_name", "filename", "auto_generated",
    "code_html", "language", "content",
];

/// What cards and listings show of an entry.
#[derive(Debug, Clone, Serialize)]
pub struct EntryView {
    pub title: String,
    pub slug: String,
    pub collection: String,
    pub collection_title: String,
    pub url: String,
    pub date: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub plot_image: Option<String>,
    pub code_file: Option<String>,
    pub function_name: Option<String>,
    pub filename: Option<String>,
    pub auto_generated: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl EntryView {
    pub fn new(entry: &CollectionEntry, collection_title: &str, config: &SiteConfig) -> Self {
        let meta = &entry.meta;
        Self {
            title: meta.title.clone(),
            slug: entry.slug.clone(),
            collection: entry.collection.clone(),
            collection_title: collection_title.to_string(),
            url: entry.url(),
            date: date_format::to_string(&entry.date),
            author: meta
                .author
                .clone()
                .or_else(|| config.default_author().map(str::to_string)),
            description: meta.description.clone(),
            tags: meta.tags.clone(),
            plot_image: meta.plot_image.clone(),
            code_file: meta.code_file.clone(),
            function_name: meta.function_name.clone(),
            filename: meta.filename.clone(),
            auto_generated: meta.auto_generated,
            extra: meta
                .extra
                .iter()
                .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        }
    }
}

/// A detail page's entry: the listing fields plus code and body.
#[derive(Debug, Clone, Serialize)]
pub struct EntryDetail {
    #[serde(flatten)]
    pub view: EntryView,
    pub code_html: Option<String>,
    pub language: &'static str,
    pub content: String,
}

impl EntryDetail {
    /// Reads the entry's code file, if any. An unreadable code file is logged and
    /// the page renders without source.
    pub fn load(entry: &CollectionEntry, view: EntryView) -> Self {
        let mut language = Language::Plain;
        let code_html = entry.meta.code_file.as_ref().and_then(|name| {
            let path = entry.dir.join(name);
            match fs::read_to_string(&path) {
                Ok(code) => {
                    language = extension_of(&path)
                        .map(|ext| Language::from_extension(&ext))
                        .unwrap_or(Language::Plain);
                    Some(highlight(&code, language))
                }
                Err(e) => {
                    warn!("Cannot read code file {}: {}", path.display(), e);
                    None
                }
            }
        });

        Self {
            view,
            code_html,
            language: language.name(),
            content: markdown::to_html(&entry.body),
        }
    }
}

#[derive(Serialize)]
pub struct IndexPage<'a> {
    pub site: &'a SiteConfig,
    pub collections: &'a [CollectionView],
    pub root: String,
    pub page_title: &'a str,
    pub entries: &'a [EntryView],
}

#[derive(Serialize)]
pub struct GalleryPage<'a> {
    pub site: &'a SiteConfig,
    pub collections: &'a [CollectionView],
    pub root: String,
    pub page_title: &'a str,
    pub collection: &'a CollectionView,
    pub entries: &'a [EntryView],
}

#[derive(Serialize)]
pub struct DetailPage<'a> {
    pub site: &'a SiteConfig,
    pub collections: &'a [CollectionView],
    pub root: String,
    pub page_title: &'a str,
    pub entry: &'a EntryDetail,
}

/// One line of `entries.json`.
#[derive(Debug, Clone, Serialize)]
pub struct ManifestEntry<'a> {
    pub collection: &'a str,
    pub slug: &'a str,
    pub title: &'a str,
    pub date: &'a str,
    pub tags: &'a [String],
    pub url: &'a str,
}

impl<'a> From<&'a EntryView> for ManifestEntry<'a> {
    fn from(view: &'a EntryView) -> Self {
        Self {
            collection: &view.collection,
            slug: &view.slug,
            title: &view.title,
            date: &view.date,
            tags: &view.tags,
            url: &view.url,
        }
    }
}
