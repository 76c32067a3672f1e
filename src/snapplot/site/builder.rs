use super::pages::{
    root_prefix, CollectionView, DetailPage, EntryDetail, EntryView, GalleryPage, IndexPage,
    ManifestEntry,
};
use super::templates::{self, GALLERY_LAYOUT, INDEX_LAYOUT, PLOT_LAYOUT};
use crate::config::{
    SiteConfig, ASSETS_DIR, COLLECTIONS_DIR, DATA_DIR, INCLUDES_DIR, LAYOUTS_DIR,
};
use crate::error::{Result, SnapError};
use crate::model::CollectionEntry;
use crate::store::fs::ENTRY_FILE;
use crate::store::FileStore;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use stencil::Renderer;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub const PAGE_FILE: &str = "index.html";
pub const MANIFEST_FILE: &str = "entries.json";
const STYLESHEET_FILE: &str = "style.css";

/// Outcome of a successful build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub output: PathBuf,
    /// Entries rendered to detail pages.
    pub entries: usize,
    pub collections: usize,
    /// HTML pages written: index, galleries and detail pages.
    pub pages: usize,
    /// Entry directories left out, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
}

/// Narrows an entry listing. Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub collection: Option<String>,
    pub tag: Option<String>,
    pub author: Option<String>,
}

impl EntryFilter {
    pub fn collection(mut self, name: &str) -> Self {
        self.collection = Some(name.to_string());
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    pub fn author(mut self, author: &str) -> Self {
        self.author = Some(author.to_string());
        self
    }

    pub fn matches(&self, entry: &CollectionEntry) -> bool {
        self.collection
            .as_deref()
            .map_or(true, |c| entry.collection == c)
            && self.tag.as_deref().map_or(true, |t| entry.meta.has_tag(t))
            && self
                .author
                .as_deref()
                .map_or(true, |a| entry.meta.author.as_deref() == Some(a))
    }
}

/// Entries of the visible collections, newest first.
#[derive(Debug, Default)]
struct SiteContent {
    collections: Vec<String>,
    entries: Vec<CollectionEntry>,
    skipped: Vec<(PathBuf, String)>,
}

/// Reads a site root and renders it as static HTML.
pub struct SiteBuilder {
    store: FileStore,
    config: SiteConfig,
}

impl SiteBuilder {
    /// Opens a site. Fails with [`SnapError::MissingConfig`] when the root has no
    /// `_config.yml`.
    pub fn open(site_root: impl Into<PathBuf>) -> Result<Self> {
        let store = FileStore::new(site_root);
        let config = SiteConfig::load(store.root())?;
        Ok(Self { store, config })
    }

    pub fn root(&self) -> &Path {
        self.store.root()
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Every entry of every visible collection, newest first. Entries with equal
    /// dates keep their directory order.
    pub fn entries(&self) -> Result<Vec<CollectionEntry>> {
        Ok(self.load()?.entries)
    }

    /// Entries passing `filter`, newest first. Filtering on a collection that
    /// has no directory is [`SnapError::UnknownCollection`].
    pub fn entries_matching(&self, filter: &EntryFilter) -> Result<Vec<CollectionEntry>> {
        if let Some(name) = &filter.collection {
            if !self.store.collection_dir(name).is_dir() {
                return Err(SnapError::UnknownCollection(name.clone()));
            }
        }
        Ok(self
            .entries()?
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect())
    }

    fn load(&self) -> Result<SiteContent> {
        let mut content = SiteContent::default();
        for name in self.store.list_collections()? {
            if !self.config.is_visible(&name) {
                debug!("Collection {} has output disabled", name);
                continue;
            }
            let load = self.store.load_collection(&name)?;
            content.entries.extend(load.entries);
            content.skipped.extend(load.skipped);
            content.collections.push(name);
        }
        content.entries.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(content)
    }

    /// Renders the site into `output`, replacing whatever was there.
    ///
    /// Missing configuration, an `output` that contains the site sources, and
    /// any failure to write the output are errors. A broken entry is skipped and
    /// listed in the report.
    pub fn build(&self, output: &Path) -> Result<BuildReport> {
        check_output(self.root(), output)?;
        let content = self.load()?;
        let renderer = templates::site_renderer(self.root())?;

        if output.exists() {
            debug!("Clearing {}", output.display());
            fs::remove_dir_all(output)?;
        }
        fs::create_dir_all(output)?;

        self.copy_assets(output)?;
        for entry in &content.entries {
            copy_entry_files(entry, &output.join(&entry.collection).join(&entry.slug))?;
        }

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for entry in &content.entries {
            *counts.entry(entry.collection.as_str()).or_default() += 1;
        }
        let collections: Vec<CollectionView> = content
            .collections
            .iter()
            .map(|name| {
                let (meta, body) = self.store.collection_meta(name, &self.config);
                CollectionView::new(name, meta, &body, counts.get(name.as_str()).copied().unwrap_or(0))
            })
            .collect();
        let titles: HashMap<&str, &str> = collections
            .iter()
            .map(|c| (c.name.as_str(), c.title.as_str()))
            .collect();

        let views: Vec<EntryView> = content
            .entries
            .iter()
            .map(|e| {
                let title = titles.get(e.collection.as_str()).copied().unwrap_or(e.collection.as_str());
                EntryView::new(e, title, &self.config)
            })
            .collect();

        let mut pages = 0;

        let latest = &views[..views.len().min(self.config.index_limit)];
        let index = IndexPage {
            site: &self.config,
            collections: &collections,
            root: root_prefix(0),
            page_title: "Home",
            entries: latest,
        };
        write_page(&renderer, INDEX_LAYOUT, &index, &output.join(PAGE_FILE))?;
        pages += 1;

        for collection in &collections {
            let entries: Vec<EntryView> = views
                .iter()
                .filter(|v| v.collection == collection.name)
                .cloned()
                .collect();
            let page = GalleryPage {
                site: &self.config,
                collections: &collections,
                root: root_prefix(1),
                page_title: &collection.title,
                collection,
                entries: &entries,
            };
            let layout = pick_layout(&renderer, collection.layout.as_deref(), GALLERY_LAYOUT);
            write_page(&renderer, &layout, &page, &output.join(&collection.name).join(PAGE_FILE))?;
            pages += 1;
        }

        for (entry, view) in content.entries.iter().zip(&views) {
            let detail = EntryDetail::load(entry, view.clone());
            let page = DetailPage {
                site: &self.config,
                collections: &collections,
                root: root_prefix(2),
                page_title: &view.title,
                entry: &detail,
            };
            let requested = entry
                .meta
                .layout
                .as_deref()
                .or(Some(self.config.defaults.layout.as_str()));
            let layout = pick_layout(&renderer, requested, PLOT_LAYOUT);
            let path = output.join(&entry.collection).join(&entry.slug).join(PAGE_FILE);
            write_page(&renderer, &layout, &page, &path)?;
            pages += 1;
        }

        let manifest: Vec<ManifestEntry> = views.iter().map(ManifestEntry::from).collect();
        fs::write(output.join(MANIFEST_FILE), serde_json::to_string_pretty(&manifest)?)?;

        info!(
            "Built {} entries across {} collections into {}",
            views.len(),
            collections.len(),
            output.display()
        );
        Ok(BuildReport {
            output: output.to_path_buf(),
            entries: views.len(),
            collections: collections.len(),
            pages,
            skipped: content.skipped,
        })
    }

    /// Copies `assets/` into the output, or writes the theme stylesheet when the
    /// site has none.
    fn copy_assets(&self, output: &Path) -> Result<()> {
        let source = self.root().join(ASSETS_DIR);
        let target = output.join(ASSETS_DIR);
        if source.is_dir() {
            copy_tree(&source, &target, |_| true)?;
        } else {
            fs::create_dir_all(&target)?;
            fs::write(
                target.join(STYLESHEET_FILE),
                templates::stylesheet(self.config.template),
            )?;
        }
        Ok(())
    }
}

/// Builds the site at `site_root` into `output_dir`.
pub fn build(site_root: impl Into<PathBuf>, output_dir: &Path) -> Result<BuildReport> {
    SiteBuilder::open(site_root)?.build(output_dir)
}

fn copy_entry_files(entry: &CollectionEntry, target: &Path) -> Result<()> {
    let index = entry.dir.join(ENTRY_FILE);
    copy_tree(&entry.dir, target, |path| path != index)
}

/// Recursively copies the files under `source` for which `include` is true.
fn copy_tree(source: &Path, target: &Path, include: impl Fn(&Path) -> bool) -> Result<()> {
    fs::create_dir_all(target)?;
    for item in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let item = item.map_err(|e| {
            SnapError::Io(e.into_io_error().unwrap_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop")
            }))
        })?;
        let path = item.path();
        let Ok(relative) = path.strip_prefix(source) else {
            continue;
        };
        let dest = target.join(relative);
        if item.file_type().is_dir() {
            fs::create_dir_all(&dest)?;
        } else if include(path) {
            fs::copy(path, &dest)?;
        }
    }
    Ok(())
}

fn pick_layout(renderer: &Renderer, requested: Option<&str>, fallback: &str) -> String {
    match requested.map(templates::layout_file) {
        Some(name) if renderer.has_template(&name) => name,
        Some(name) => {
            warn!("Layout {} not found, using {}", name, fallback);
            fallback.to_string()
        }
        None => fallback.to_string(),
    }
}

fn write_page<T: Serialize>(renderer: &Renderer, layout: &str, page: &T, path: &Path) -> Result<()> {
    let html = renderer.render(layout, page)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, html)?;
    Ok(())
}

/// Site directories a build reads from and must never clear.
const SOURCE_DIRS: &[&str] = &[COLLECTIONS_DIR, ASSETS_DIR, LAYOUTS_DIR, INCLUDES_DIR, DATA_DIR];

/// Refuses output directories whose removal would delete site sources: the
/// root, its ancestors, and anything at or below a source directory.
fn check_output(site_root: &Path, output: &Path) -> Result<()> {
    let root = absolute(site_root);
    let out = absolute(output);
    let inside_sources = SOURCE_DIRS.iter().any(|dir| out.starts_with(root.join(dir)));
    if root.starts_with(&out) || inside_sources {
        return Err(SnapError::UnsafeOutput(output.to_path_buf()));
    }
    Ok(())
}

/// Canonical form of a path that may not exist yet.
fn absolute(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => absolute(parent).join(name),
        _ => std::env::current_dir()
            .and_then(fs::canonicalize)
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntryMeta;
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::TempDir;

    fn site() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("site");
        SiteConfig::new("Test Site").save(&root).unwrap();
        (dir, root)
    }

    fn add_entry(root: &Path, collection: &str, slug: &str, minutes: i64, tags: &[&str]) {
        let store = FileStore::new(root);
        let mut meta = EntryMeta::new(slug);
        meta.date = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes));
        meta.tags = tags.iter().map(|t| t.to_string()).collect();
        meta.plot_image = Some("plot.png".to_string());
        let dir = store.save_entry(collection, slug, &meta, "").unwrap();
        fs::write(dir.join("plot.png"), b"png").unwrap();
    }

    #[test]
    fn test_open_without_config() {
        let dir = TempDir::new().unwrap();
        let err = SiteBuilder::open(dir.path()).err().unwrap();
        assert!(matches!(err, SnapError::MissingConfig(_)));
    }

    #[test]
    fn test_entries_newest_first_with_stable_ties() {
        let (_dir, root) = site();
        add_entry(&root, "a", "old", 0, &[]);
        add_entry(&root, "a", "tie1", 10, &[]);
        add_entry(&root, "b", "tie2", 10, &[]);
        add_entry(&root, "b", "new", 20, &[]);

        let builder = SiteBuilder::open(&root).unwrap();
        let slugs: Vec<String> = builder.entries().unwrap().into_iter().map(|e| e.slug).collect();
        assert_eq!(slugs, vec!["new", "tie1", "tie2", "old"]);
    }

    #[test]
    fn test_entries_matching() {
        let (_dir, root) = site();
        add_entry(&root, "a", "one", 0, &["ml"]);
        add_entry(&root, "b", "two", 1, &["ml", "stats"]);
        add_entry(&root, "b", "three", 2, &[]);

        let builder = SiteBuilder::open(&root).unwrap();
        let by_tag = builder.entries_matching(&EntryFilter::default().tag("ml")).unwrap();
        assert_eq!(by_tag.len(), 2);
        let narrowed = builder
            .entries_matching(&EntryFilter::default().tag("ml").collection("b"))
            .unwrap();
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].slug, "two");
    }

    #[test]
    fn test_hidden_collection_not_built() {
        let (_dir, root) = site();
        let mut config = SiteConfig::load(&root).unwrap();
        config.declare_collection("drafts", "Drafts", "");
        config.collections.get_mut("drafts").unwrap().output = false;
        config.save(&root).unwrap();
        add_entry(&root, "drafts", "wip", 0, &[]);
        add_entry(&root, "plots", "done", 0, &[]);

        let out = root.parent().unwrap().join("out");
        let report = build(&root, &out).unwrap();
        assert_eq!(report.entries, 1);
        assert_eq!(report.collections, 1);
        assert!(!out.join("drafts").exists());
    }

    #[test]
    fn test_refuses_to_clear_site_root() {
        let (dir, root) = site();
        let builder = SiteBuilder::open(&root).unwrap();
        assert!(matches!(builder.build(&root), Err(SnapError::UnsafeOutput(_))));
        assert!(matches!(builder.build(dir.path()), Err(SnapError::UnsafeOutput(_))));
        assert!(root.join("_config.yml").exists());
    }

    #[test]
    fn test_refuses_output_inside_sources() {
        let (_dir, root) = site();
        add_entry(&root, "plots", "keep", 0, &[]);
        let builder = SiteBuilder::open(&root).unwrap();
        for out in [
            root.join("collections"),
            root.join("collections/plots/out"),
            root.join("assets"),
            root.join("_layouts"),
            root.join("_includes/site"),
            root.join("_data"),
        ] {
            let err = builder.build(&out).unwrap_err();
            assert!(matches!(err, SnapError::UnsafeOutput(_)), "{}", out.display());
        }
        assert!(root.join("collections/plots/keep/index.md").is_file());
    }

    #[test]
    fn test_entries_matching_unknown_collection() {
        let (_dir, root) = site();
        add_entry(&root, "plots", "p", 0, &[]);
        let builder = SiteBuilder::open(&root).unwrap();
        let err = builder
            .entries_matching(&EntryFilter::default().collection("missing"))
            .unwrap_err();
        assert!(matches!(err, SnapError::UnknownCollection(name) if name == "missing"));
    }

    #[test]
    fn test_output_inside_site_is_allowed() {
        let (_dir, root) = site();
        add_entry(&root, "plots", "p", 0, &[]);
        let report = build(&root, &root.join("docs")).unwrap();
        assert_eq!(report.entries, 1);
        assert!(root.join("docs").join(PAGE_FILE).exists());
    }

    #[test]
    fn test_unknown_entry_layout_falls_back() {
        let (_dir, root) = site();
        let store = FileStore::new(&root);
        let mut meta = EntryMeta::new("Odd");
        meta.layout = Some("fancy".to_string());
        store.save_entry("plots", "odd", &meta, "").unwrap();

        let out = root.parent().unwrap().join("out");
        build(&root, &out).unwrap();
        let html = fs::read_to_string(out.join("plots/odd/index.html")).unwrap();
        assert!(html.contains("<h1>Odd</h1>"));
    }

    #[test]
    fn test_site_layout_used_for_entry() {
        let (_dir, root) = site();
        fs::create_dir_all(root.join("_layouts")).unwrap();
        fs::write(root.join("_layouts/wide.html"), "WIDE {{ entry.title }} {{ root }}").unwrap();
        let store = FileStore::new(&root);
        let mut meta = EntryMeta::new("Wide");
        meta.layout = Some("wide".to_string());
        store.save_entry("plots", "w", &meta, "").unwrap();

        let out = root.parent().unwrap().join("out");
        build(&root, &out).unwrap();
        let html = fs::read_to_string(out.join("plots/w/index.html")).unwrap();
        assert_eq!(html, "WIDE Wide ../../");
    }

    #[test]
    fn test_assets_copied_or_stylesheet_written() {
        let (_dir, root) = site();
        let out = root.parent().unwrap().join("out");
        build(&root, &out).unwrap();
        assert!(out.join("assets/style.css").exists());

        fs::create_dir_all(root.join("assets/img")).unwrap();
        fs::write(root.join("assets/img/logo.svg"), "<svg/>").unwrap();
        build(&root, &out).unwrap();
        assert!(out.join("assets/img/logo.svg").exists());
        assert!(!out.join("assets/style.css").exists());
    }
}
