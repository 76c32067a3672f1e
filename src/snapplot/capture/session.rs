use super::options::CaptureOptions;
use super::page;
use crate::config::SiteConfig;
use crate::error::{Result, SnapError};
use crate::model::{CaptureRecord, EntryMeta};
use crate::naming::{
    code_file_name, entry_slug, page_file_name, plot_file_name, sanitize_filename,
    snapshot_dir_name,
};
use crate::publish::{NamedFile, PublishRequest};
use crate::site::{self, CollectionOptions};
use crate::source::{self, CallSite, FsSourceResolver, SourceResolver};
use crate::store::FileStore;
use crate::surface::RenderSurface;
use crate::timestamp::{next_token, Token};
use std::fs;
use std::mem;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What one capture wrote, and what it could not.
#[derive(Debug, Clone)]
pub struct CaptureReport {
    pub token: Token,
    /// The `snapshot_<stem>` directory.
    pub dir: PathBuf,
    pub code: Option<PathBuf>,
    pub image: Option<PathBuf>,
    pub page: Option<PathBuf>,
    /// Entry directory inside the site, in site mode.
    pub entry_dir: Option<PathBuf>,
    pub record: CaptureRecord,
    pub warnings: Vec<String>,
}

impl CaptureReport {
    /// True when every step succeeded.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Files written to the snapshot directory, code first.
    pub fn files(&self) -> Vec<&Path> {
        [&self.code, &self.image, &self.page]
            .into_iter()
            .flatten()
            .map(PathBuf::as_path)
            .collect()
    }
}

/// One capture in progress.
///
/// The token is drawn when the session begins, so every file of the capture
/// shares it. The capture is recorded by [`finish`](Self::finish), or when the
/// session is dropped without finishing. A session dropped while its thread is
/// panicking records nothing.
///
/// ```rust,no_run
/// use snapplot::capture::{CaptureOptions, CaptureSession};
/// use snapplot::surface::ImageSlot;
///
/// let figure = ImageSlot::new();
/// let session = CaptureSession::begin(
///     CaptureOptions::new().title("Sine"),
///     snapplot::call_site!("plot_sine"),
///     &figure,
/// );
/// figure.present(vec![0x89, b'P', b'N', b'G']);
/// let report = session.finish();
/// assert_eq!(report.files().len(), 3);
/// ```
pub struct CaptureSession<'a> {
    options: CaptureOptions,
    site: CallSite,
    surface: &'a dyn RenderSurface,
    resolver: &'a dyn SourceResolver,
    token: Token,
    dir: PathBuf,
    warnings: Vec<String>,
    finished: bool,
}

impl<'a> CaptureSession<'a> {
    /// Starts a capture that reads the caller's source from disk.
    pub fn begin(options: CaptureOptions, site: CallSite, surface: &'a dyn RenderSurface) -> Self {
        Self::begin_with_resolver(options, site, surface, &FsSourceResolver)
    }

    pub fn begin_with_resolver(
        options: CaptureOptions,
        site: CallSite,
        surface: &'a dyn RenderSurface,
        resolver: &'a dyn SourceResolver,
    ) -> Self {
        let token = next_token();
        let dir = options.output_dir.join(snapshot_dir_name(&site.file));
        let mut session = Self {
            options,
            site,
            surface,
            resolver,
            token,
            dir,
            warnings: Vec::new(),
            finished: false,
        };

        if let Err(e) = fs::create_dir_all(&session.dir) {
            let dir = session.dir.display().to_string();
            session.warn(format!("Could not create snapshot directory {}: {}", dir, e));
        }
        debug!("Capture {} started for {}", session.token, session.site.function);
        session
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn snapshot_dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the capture and returns what was written.
    pub fn finish(mut self) -> CaptureReport {
        self.finished = true;
        self.record()
    }

    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }

    fn record(&mut self) -> CaptureReport {
        let resolved = source::resolve(&self.site, self.resolver);
        debug!("Resolved source of {} ({:?})", self.site.function, resolved.origin);
        let ext = self.site.extension();

        let code_path = self.dir.join(code_file_name(&self.token, &ext));
        let code = match fs::write(&code_path, &resolved.text) {
            Ok(()) => Some(code_path),
            Err(e) => {
                self.warn(format!("Could not write code file {}: {}", code_path.display(), e));
                None
            }
        };

        let image = if self.surface.has_content() {
            let path = self
                .dir
                .join(plot_file_name(&self.token, self.surface.extension()));
            match self.surface.save(&path, self.options.dpi, self.options.crop) {
                Ok(()) => Some(path),
                Err(e) => {
                    self.warn(format!("Could not save plot {}: {}", path.display(), e));
                    None
                }
            }
        } else {
            debug!("No figure to save for capture {}", self.token);
            None
        };

        let record = CaptureRecord {
            token: self.token.clone(),
            function_name: self.site.function.clone(),
            file_name: self.site.file_name(),
            source: resolved.text,
            image,
            title: self
                .options
                .title
                .clone()
                .unwrap_or_else(|| page::default_title(&self.site.function)),
            author: self.options.author.clone(),
            notes: self.options.notes.clone(),
        };

        let page_path = self.dir.join(page_file_name(&self.token));
        let page = match page::render_page(&record, &ext)
            .and_then(|html| fs::write(&page_path, html).map_err(SnapError::from))
        {
            Ok(()) => Some(page_path),
            Err(e) => {
                self.warn(format!("Could not write page {}: {}", page_path.display(), e));
                None
            }
        };

        let entry_dir = match self.options.site.clone() {
            Some(root) if SiteConfig::exists(&root) => {
                match self.file_entry(&root, &record, &ext) {
                    Ok(dir) => {
                        self.rebuild_site(&root);
                        Some(dir)
                    }
                    Err(e) => {
                        self.warn(format!("Could not add capture to site {}: {}", root.display(), e));
                        None
                    }
                }
            }
            Some(root) => {
                self.warn(format!(
                    "No site configuration at {}; capture not added to a collection",
                    root.display()
                ));
                None
            }
            None => None,
        };

        let mut report = CaptureReport {
            token: self.token.clone(),
            dir: self.dir.clone(),
            code,
            image: record.image.clone(),
            page,
            entry_dir,
            record,
            warnings: Vec::new(),
        };
        self.publish(&report);
        report.warnings = mem::take(&mut self.warnings);

        info!(
            "Captured {} from {} ({} files)",
            report.token,
            report.record.function_name,
            report.files().len()
        );
        report
    }

    /// Materializes the capture as an entry of the configured collection.
    fn file_entry(&self, root: &Path, record: &CaptureRecord, ext: &str) -> Result<PathBuf> {
        let collection = sanitize_filename(&self.options.collection);
        let mut config = SiteConfig::load(root)?;
        if !config.collections.contains_key(&collection) {
            site::create_collection(root, &collection, &CollectionOptions::default())?;
            config = SiteConfig::load(root)?;
        }

        let store = FileStore::new(root);
        let title = self
            .options
            .title
            .clone()
            .unwrap_or_else(|| record.function_name.clone());
        let slug = entry_slug(&self.token, &title);
        let dir = store.entry_dir(&collection, &slug);
        fs::create_dir_all(&dir)?;

        let code_file = format!("code.{}", ext);
        fs::write(dir.join(&code_file), &record.source)?;

        let plot_image = match &record.image {
            Some(image) => {
                let name = format!("plot.{}", self.surface.extension());
                fs::copy(image, dir.join(&name))?;
                Some(name)
            }
            None if self.surface.has_content() => {
                let name = format!("plot.{}", self.surface.extension());
                self.surface
                    .save(&dir.join(&name), self.options.dpi, self.options.crop)?;
                Some(name)
            }
            None => None,
        };

        let mut meta = EntryMeta::new(title);
        meta.date = Some(record.captured_at());
        meta.author = record
            .author
            .clone()
            .or_else(|| config.default_author().map(str::to_string));
        meta.description = self.options.description.clone();
        meta.tags = self.options.tags.clone();
        meta.plot_image = plot_image;
        meta.code_file = Some(code_file);
        meta.function_name = Some(record.function_name.clone());
        meta.filename = Some(record.file_name.clone());
        if let Some(notes) = &record.notes {
            meta.extra
                .insert("notes".to_string(), serde_yaml::Value::String(notes.clone()));
        }

        let mut body = String::new();
        if let Some(description) = &self.options.description {
            body.push_str(description);
            body.push_str("\n\n");
        }
        body.push_str(&format!(
            "Generated from `{}` in `{}`.",
            record.function_name, record.file_name
        ));

        let dir = store.save_entry(&collection, &slug, &meta, &body)?;
        info!("Added {} to collection {}", slug, collection);
        Ok(dir)
    }

    fn rebuild_site(&mut self, root: &Path) {
        if !self.options.auto_build {
            return;
        }
        let result = SiteConfig::load(root)
            .and_then(|config| site::build(root, &config.build_path(root)));
        match result {
            Ok(report) => debug!("Rebuilt site into {}", report.output.display()),
            Err(e) => self.warn(format!("Could not rebuild site {}: {}", root.display(), e)),
        }
    }

    fn publish(&mut self, report: &CaptureReport) {
        let Some(publisher) = self.options.publisher.clone() else {
            return;
        };
        let request = PublishRequest {
            token: report.token.clone(),
            title: report.record.title.clone(),
            author: report.record.author.clone(),
            description: self.options.description.clone(),
            collection: self
                .options
                .site
                .as_ref()
                .map(|_| self.options.collection.clone()),
            tags: self.options.tags.clone(),
            files: report.files().into_iter().map(NamedFile::from_path).collect(),
        };
        if let Err(e) = publisher.publish(&request) {
            self.warn(format!("Publishing capture {} failed: {}", report.token, e));
        }
    }
}

impl Drop for CaptureSession<'_> {
    fn drop(&mut self) {
        if self.finished || std::thread::panicking() {
            return;
        }
        self.finished = true;
        self.record();
    }
}

/// Runs `f` inside a capture session and returns its value unchanged.
///
/// The capture is recorded after `f` returns; documentation failures are logged
/// and never reach the caller.
pub fn capture<T>(
    options: CaptureOptions,
    site: CallSite,
    surface: &dyn RenderSurface,
    f: impl FnOnce() -> T,
) -> T {
    let session = CaptureSession::begin(options, site, surface);
    let value = f();
    session.finish();
    value
}
