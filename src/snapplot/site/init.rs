use super::templates::{self, INCLUDES, LAYOUTS};
use crate::config::{
    SiteConfig, Theme, ASSETS_DIR, COLLECTIONS_DIR, DATA_DIR, INCLUDES_DIR, LAYOUTS_DIR,
};
use crate::error::{Result, SnapError};
use crate::model::CollectionMeta;
use crate::naming::{sanitize_filename, title_from_name};
use crate::store::FileStore;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const DEFAULT_AUTHOR: &str = "Research Team";

/// Settings for a new site. Unset fields are derived from the directory name.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    pub title: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub theme: Theme,
    pub github_repo: Option<String>,
}

/// Settings for a new collection. Unset fields are derived from its name.
#[derive(Debug, Clone, Default)]
pub struct CollectionOptions {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

/// Creates the skeleton of a site at `root`.
///
/// ```text
/// <root>/
/// ├── _config.yml
/// ├── _layouts/       default page layouts, editable
/// ├── _includes/      default partials, editable
/// ├── _data/
/// ├── assets/style.css
/// └── collections/
/// ```
///
/// Fails with [`SnapError::SiteExists`] if `root` exists and is not empty.
pub fn init_site(root: &Path, options: &InitOptions) -> Result<SiteConfig> {
    if root.exists() && fs::read_dir(root)?.next().is_some() {
        return Err(SnapError::SiteExists(root.to_path_buf()));
    }

    let name = root
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("site")
        .to_string();
    let author = options
        .author
        .clone()
        .unwrap_or_else(|| DEFAULT_AUTHOR.to_string());

    let mut config = SiteConfig::new(
        options
            .title
            .clone()
            .unwrap_or_else(|| format!("{} Plots", title_from_name(&name))),
    );
    config.description = options
        .description
        .clone()
        .unwrap_or_else(|| format!("Data science plots and analysis for {}", name));
    config.author = author.clone();
    config.template = options.theme;
    config.github_repo = options.github_repo.clone();
    config.defaults.author = Some(author);

    for dir in [LAYOUTS_DIR, INCLUDES_DIR, DATA_DIR, ASSETS_DIR, COLLECTIONS_DIR] {
        fs::create_dir_all(root.join(dir))?;
    }
    write_all(&root.join(LAYOUTS_DIR), LAYOUTS)?;
    write_all(&root.join(INCLUDES_DIR), INCLUDES)?;
    fs::write(
        root.join(ASSETS_DIR).join("style.css"),
        templates::stylesheet(options.theme),
    )?;
    config.save(root)?;

    info!("Initialized site {} at {}", config.title, root.display());
    Ok(config)
}

fn write_all(dir: &Path, files: &[(&str, &str)]) -> Result<()> {
    for (name, source) in files {
        fs::write(dir.join(name), source)?;
    }
    Ok(())
}

/// Declares a collection: writes `collections/<name>/_index.md` and records the
/// collection in `_config.yml`. Returns the collection directory.
///
/// The name is sanitized for use as a directory name. Requires an existing site
/// configuration. Declaring an existing collection rewrites its metadata and
/// keeps its entries.
pub fn create_collection(root: &Path, name: &str, options: &CollectionOptions) -> Result<PathBuf> {
    let mut config = SiteConfig::load(root)?;
    let name = sanitize_filename(name);

    let title = options
        .title
        .clone()
        .unwrap_or_else(|| title_from_name(&name));
    let description = options
        .description
        .clone()
        .unwrap_or_else(|| format!("Plot collection for {}", name));

    let meta = CollectionMeta {
        title: title.clone(),
        description: description.clone(),
        tags: options.tags.clone(),
        created: Some(Utc::now()),
        layout: Some("gallery".to_string()),
        ..Default::default()
    };
    let body = format!("# {}\n\n{}", title, description);

    let store = FileStore::new(root);
    store.save_collection_meta(&name, &meta, &body)?;

    config.declare_collection(&name, &title, &description);
    config.save(root)?;

    info!("Created collection {}", name);
    Ok(store.collection_dir(&name))
}
