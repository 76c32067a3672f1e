use super::frontmatter;
use crate::config::{SiteConfig, COLLECTIONS_DIR};
use crate::error::{Result, SnapError};
use crate::model::{CollectionEntry, CollectionMeta, EntryMeta};
use crate::naming::{extension_of, title_from_name};
use crate::timestamp::parse_prefix;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Metadata file of an entry.
pub const ENTRY_FILE: &str = "index.md";
/// Metadata file of a collection.
pub const COLLECTION_FILE: &str = "_index.md";

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp"];
pub const CODE_EXTENSIONS: &[&str] = &["py", "rs", "ipynb", "r", "jl", "txt"];

/// Names starting with one of these are never collections or entries.
const RESERVED_PREFIXES: &[char] = &['_', '.'];

/// Result of loading every entry of one collection.
#[derive(Debug, Default)]
pub struct CollectionLoad {
    pub entries: Vec<CollectionEntry>,
    /// Entry directories that could not be loaded, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
}

/// File-based metadata store rooted at a site directory.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(site_root: impl Into<PathBuf>) -> Self {
        Self {
            root: site_root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn collections_dir(&self) -> PathBuf {
        self.root.join(COLLECTIONS_DIR)
    }

    pub fn collection_dir(&self, collection: &str) -> PathBuf {
        self.collections_dir().join(collection)
    }

    pub fn entry_dir(&self, collection: &str, slug: &str) -> PathBuf {
        self.collection_dir(collection).join(slug)
    }

    /// Names of all collection directories, sorted.
    pub fn list_collections(&self) -> Result<Vec<String>> {
        list_visible_dirs(&self.collections_dir())
    }

    /// Loads every entry of a collection in directory-name order.
    ///
    /// Directories without metadata or a recognizable image are ignored. An entry
    /// whose header cannot be parsed degrades to auto-generated metadata when it
    /// has an image, and is reported in `skipped` otherwise.
    pub fn load_collection(&self, collection: &str) -> Result<CollectionLoad> {
        let mut load = CollectionLoad::default();
        for slug in list_visible_dirs(&self.collection_dir(collection))? {
            let dir = self.entry_dir(collection, &slug);
            match self.load_entry(collection, &slug) {
                Ok(Some(entry)) => load.entries.push(entry),
                Ok(None) => debug!("Ignoring {}: no metadata or image", dir.display()),
                Err(e) => {
                    warn!("Skipping entry {}: {}", dir.display(), e);
                    load.skipped.push((dir, e.to_string()));
                }
            }
        }
        Ok(load)
    }

    /// Loads one entry directory.
    ///
    /// Returns `Ok(None)` when the directory holds neither an `index.md` nor an image.
    pub fn load_entry(&self, collection: &str, slug: &str) -> Result<Option<CollectionEntry>> {
        let dir = self.entry_dir(collection, slug);
        let index = dir.join(ENTRY_FILE);
        let image = find_file(&dir, IMAGE_EXTENSIONS)?;

        let (mut meta, body) = if index.is_file() {
            let document = fs::read_to_string(&index)?;
            match frontmatter::parse::<EntryMeta>(&index, &document) {
                Ok(parsed) => parsed,
                Err(e) if image.is_some() => {
                    warn!("{}; using generated metadata", e);
                    (auto_meta(slug), String::new())
                }
                Err(e) => return Err(e),
            }
        } else if image.is_some() {
            debug!("Generating metadata for {}", dir.display());
            (auto_meta(slug), String::new())
        } else {
            return Ok(None);
        };

        if meta.title.trim().is_empty() {
            meta.title = title_from_name(slug);
        }
        if meta.plot_image.is_none() {
            meta.plot_image = image.as_deref().and_then(file_name);
        }
        if meta.code_file.is_none() {
            meta.code_file = find_file(&dir, CODE_EXTENSIONS)?
                .as_deref()
                .and_then(file_name);
        }

        let date = meta
            .date
            .or_else(|| parse_prefix(slug))
            .or_else(|| image.as_deref().and_then(modified_time))
            .unwrap_or_else(Utc::now);
        if meta.auto_generated {
            meta.date = Some(date);
        }

        Ok(Some(CollectionEntry {
            collection: collection.to_string(),
            slug: slug.to_string(),
            dir,
            meta,
            body,
            date,
        }))
    }

    /// Writes an entry's `index.md`, creating its directory. Returns the directory.
    pub fn save_entry(
        &self,
        collection: &str,
        slug: &str,
        meta: &EntryMeta,
        body: &str,
    ) -> Result<PathBuf> {
        let dir = self.entry_dir(collection, slug);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(ENTRY_FILE), frontmatter::compose(meta, body)?)?;
        Ok(dir)
    }

    /// Display metadata and rendered-body source for a collection.
    ///
    /// `_index.md` wins over the site config, which wins over defaults derived
    /// from the collection name. A malformed `_index.md` is logged and ignored.
    pub fn collection_meta(&self, name: &str, config: &SiteConfig) -> (CollectionMeta, String) {
        let path = self.collection_dir(name).join(COLLECTION_FILE);
        if path.is_file() {
            let parsed = fs::read_to_string(&path)
                .map_err(SnapError::from)
                .and_then(|doc| frontmatter::parse::<CollectionMeta>(&path, &doc));
            match parsed {
                Ok((mut meta, body)) => {
                    let fallback = configured_meta(name, config);
                    if meta.title.trim().is_empty() {
                        meta.title = fallback.title;
                    }
                    if meta.description.trim().is_empty() {
                        meta.description = fallback.description;
                    }
                    return (meta, body);
                }
                Err(e) => warn!("Ignoring collection metadata: {}", e),
            }
        }
        (configured_meta(name, config), String::new())
    }

    pub fn save_collection_meta(&self, name: &str, meta: &CollectionMeta, body: &str) -> Result<()> {
        let dir = self.collection_dir(name);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(COLLECTION_FILE), frontmatter::compose(meta, body)?)?;
        Ok(())
    }
}

fn configured_meta(name: &str, config: &SiteConfig) -> CollectionMeta {
    let declared = config.collections.get(name);
    let title = declared
        .map(|c| c.title.clone())
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| title_from_name(name));
    let description = declared
        .map(|c| c.description.clone())
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| format!("Plot collection for {}", name));

    CollectionMeta {
        title,
        description,
        ..Default::default()
    }
}

fn auto_meta(slug: &str) -> EntryMeta {
    EntryMeta {
        title: title_from_name(slug),
        auto_generated: true,
        ..Default::default()
    }
}

/// Sorted names of subdirectories not starting with a reserved prefix.
/// A missing directory has no children.
fn list_visible_dirs(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if name.starts_with(RESERVED_PREFIXES) {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

/// First file in `dir` with one of `extensions`, by extension priority then name.
fn find_file(dir: &Path, extensions: &[&str]) -> Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    for wanted in extensions {
        if let Some(found) = files
            .iter()
            .find(|p| extension_of(p).as_deref() == Some(*wanted))
        {
            return Ok(Some(found.clone()));
        }
    }
    Ok(None)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}

fn modified_time(path: &Path) -> Option<DateTime<Utc>> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Utc>::from)
}
