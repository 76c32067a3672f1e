use crate::error::{Result, SnapError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "_config.yml";
pub const COLLECTIONS_DIR: &str = "collections";
pub const LAYOUTS_DIR: &str = "_layouts";
pub const INCLUDES_DIR: &str = "_includes";
pub const DATA_DIR: &str = "_data";
pub const ASSETS_DIR: &str = "assets";

const DEFAULT_BUILD_DIR: &str = "docs";
const DEFAULT_INDEX_LIMIT: usize = 12;
const DEFAULT_LAYOUT: &str = "plot";

/// Stylesheet family used when a site has no `assets/` of its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Scientific,
    Minimal,
}

/// Site-level configuration, stored in `<site root>/_config.yml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub author: String,

    #[serde(default)]
    pub template: Theme,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_repo: Option<String>,

    /// Output directory used by auto-builds, relative to the site root.
    #[serde(default = "default_build_dir")]
    pub build_dir: String,

    /// Number of latest entries shown on the index page.
    #[serde(default = "default_index_limit")]
    pub index_limit: usize,

    #[serde(default)]
    pub collections: BTreeMap<String, CollectionConfig>,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// Per-collection settings declared in the site config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionConfig {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Whether the collection is rendered at all.
    #[serde(default = "default_true")]
    pub output: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default = "default_layout")]
    pub layout: String,
}

fn default_build_dir() -> String {
    DEFAULT_BUILD_DIR.to_string()
}

fn default_index_limit() -> usize {
    DEFAULT_INDEX_LIMIT
}

fn default_layout() -> String {
    DEFAULT_LAYOUT.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            author: None,
            layout: default_layout(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self::new("Plot Gallery")
    }
}

impl SiteConfig {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: "A collection of plots and visualizations".to_string(),
            author: String::new(),
            template: Theme::default(),
            github_repo: None,
            build_dir: default_build_dir(),
            index_limit: DEFAULT_INDEX_LIMIT,
            collections: BTreeMap::new(),
            defaults: Defaults::default(),
            extra: BTreeMap::new(),
        }
    }

    pub fn path(site_root: &Path) -> PathBuf {
        site_root.join(CONFIG_FILENAME)
    }

    pub fn exists(site_root: &Path) -> bool {
        Self::path(site_root).is_file()
    }

    /// Loads `_config.yml` from the site root. A missing file is an error.
    pub fn load<P: AsRef<Path>>(site_root: P) -> Result<Self> {
        let config_path = Self::path(site_root.as_ref());
        if !config_path.is_file() {
            return Err(SnapError::MissingConfig(config_path));
        }

        let content = fs::read_to_string(&config_path)?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, site_root: P) -> Result<()> {
        let site_root = site_root.as_ref();
        if !site_root.exists() {
            fs::create_dir_all(site_root)?;
        }

        let content = serde_yaml::to_string(self)?;
        fs::write(Self::path(site_root), content)?;
        Ok(())
    }

    /// Adds or replaces a collection declaration.
    pub fn declare_collection(&mut self, name: &str, title: &str, description: &str) {
        self.collections.insert(
            name.to_string(),
            CollectionConfig {
                title: title.to_string(),
                description: description.to_string(),
                output: true,
            },
        );
    }

    /// False only for collections declared with `output: false`.
    pub fn is_visible(&self, collection: &str) -> bool {
        self.collections
            .get(collection)
            .map(|c| c.output)
            .unwrap_or(true)
    }

    /// Author used for entries that do not name one.
    pub fn default_author(&self) -> Option<&str> {
        self.defaults
            .author
            .as_deref()
            .filter(|a| !a.is_empty())
            .or_else(|| Some(self.author.as_str()).filter(|a| !a.is_empty()))
    }

    pub fn build_path(&self, site_root: &Path) -> PathBuf {
        site_root.join(&self.build_dir)
    }
}
