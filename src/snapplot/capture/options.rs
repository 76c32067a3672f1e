use crate::publish::Publisher;
use crate::surface::CropMode;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Environment variable overriding the default snapshot directory.
pub const OUTPUT_DIR_ENV: &str = "SNAPPLOT_OUTPUT_DIR";
pub const DEFAULT_OUTPUT_DIR: &str = "snapshots";
pub const DEFAULT_COLLECTION: &str = "plots";
pub const DEFAULT_DPI: u32 = 300;

/// Settings of one capture.
///
/// Setting [`site`](Self::site) additionally files the capture as an entry of a
/// site collection.
#[derive(Clone)]
pub struct CaptureOptions {
    pub output_dir: PathBuf,
    pub title: Option<String>,
    pub author: Option<String>,
    pub notes: Option<String>,
    pub dpi: u32,
    pub crop: CropMode,
    pub site: Option<PathBuf>,
    pub collection: String,
    pub tags: Vec<String>,
    pub description: Option<String>,
    /// Rebuild the site into its `build_dir` after filing the entry.
    pub auto_build: bool,
    pub publisher: Option<Arc<dyn Publisher>>,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        let output_dir = env::var_os(OUTPUT_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        Self {
            output_dir,
            title: None,
            author: None,
            notes: None,
            dpi: DEFAULT_DPI,
            crop: CropMode::default(),
            site: None,
            collection: DEFAULT_COLLECTION.to_string(),
            tags: Vec::new(),
            description: None,
            auto_build: false,
            publisher: None,
        }
    }
}

impl fmt::Debug for CaptureOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureOptions")
            .field("output_dir", &self.output_dir)
            .field("title", &self.title)
            .field("author", &self.author)
            .field("notes", &self.notes)
            .field("dpi", &self.dpi)
            .field("crop", &self.crop)
            .field("site", &self.site)
            .field("collection", &self.collection)
            .field("tags", &self.tags)
            .field("description", &self.description)
            .field("auto_build", &self.auto_build)
            .field("publisher", &self.publisher.is_some())
            .finish()
    }
}

impl CaptureOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn crop(mut self, crop: CropMode) -> Self {
        self.crop = crop;
        self
    }

    pub fn site(mut self, root: impl Into<PathBuf>) -> Self {
        self.site = Some(root.into());
        self
    }

    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.collection = name.into();
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            self = self.tag(tag);
        }
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn auto_build(mut self, enabled: bool) -> Self {
        self.auto_build = enabled;
        self
    }

    pub fn publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }
}
