//! Handing finished captures to an external service.
//!
//! A capture calls its [`Publisher`] once, after its files are written, and
//! ignores the outcome apart from logging a warning. Network publishing is left
//! to implementations outside this crate; [`ArchivePublisher`] bundles the files
//! into a local `.tar.gz`.

use crate::error::{Result, SnapError};
use crate::naming::{CODE_SUFFIX, PAGE_SUFFIX, PLOT_SUFFIX};
use crate::timestamp::{Token, TOKEN_LEN};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

/// Name of the metadata file inside an archive.
pub const ARCHIVE_MANIFEST: &str = "snapshot.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedFile {
    pub name: String,
    #[serde(skip)]
    pub path: PathBuf,
}

impl NamedFile {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Uses the file name of `path` as the name.
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::new(name, path)
    }
}

/// One capture's files and descriptive metadata.
#[derive(Debug, Clone, Serialize)]
pub struct PublishRequest {
    pub token: Token,
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub collection: Option<String>,
    pub tags: Vec<String>,
    pub files: Vec<NamedFile>,
}

/// Accepts a set of named files. Called fire-and-forget by captures.
pub trait Publisher {
    fn publish(&self, request: &PublishRequest) -> Result<()>;
}

/// Writes each request to `<dest>/<token>.tar.gz` together with a
/// `snapshot.json` describing it.
#[derive(Debug, Clone)]
pub struct ArchivePublisher {
    dest: PathBuf,
}

impl ArchivePublisher {
    pub fn new(dest: impl Into<PathBuf>) -> Self {
        Self { dest: dest.into() }
    }

    pub fn archive_path(&self, token: &Token) -> PathBuf {
        self.dest.join(format!("{}.tar.gz", token))
    }
}

impl Publisher for ArchivePublisher {
    fn publish(&self, request: &PublishRequest) -> Result<()> {
        fs::create_dir_all(&self.dest)?;
        let path = self.archive_path(&request.token);
        let enc = GzEncoder::new(File::create(&path)?, Compression::default());
        let mut tar = tar::Builder::new(enc);

        let manifest = serde_json::to_vec_pretty(request)?;
        let mut header = tar::Header::new_gnu();
        header.set_size(manifest.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        tar.append_data(&mut header, ARCHIVE_MANIFEST, manifest.as_slice())?;

        for file in &request.files {
            tar.append_path_with_name(&file.path, &file.name)?;
        }

        tar.into_inner()?.finish()?;
        info!("Archived snapshot {} to {}", request.token, path.display());
        Ok(())
    }
}

/// The code, plot and page files of one capture in a snapshot directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFiles {
    pub token: Token,
    pub code: PathBuf,
    pub plot: Option<PathBuf>,
    pub page: Option<PathBuf>,
}

impl SnapshotFiles {
    pub fn named_files(&self) -> Vec<NamedFile> {
        std::iter::once(&self.code)
            .chain(self.plot.as_ref())
            .chain(self.page.as_ref())
            .map(|p| NamedFile::from_path(p))
            .collect()
    }
}

/// Finds the most recent capture in a `snapshot_<stem>` directory.
///
/// The newest `<token>_code.*` file decides the capture; its plot and page are
/// optional. A directory without code files is an error.
pub fn discover_snapshot_files(dir: &Path) -> Result<SnapshotFiles> {
    let mut newest: Option<(Token, PathBuf)> = None;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let (Some(prefix), Some(rest)) = (name.get(..TOKEN_LEN), name.get(TOKEN_LEN..)) else {
            continue;
        };
        if !path.is_file() {
            continue;
        }
        if !rest.starts_with(&format!("{}.", CODE_SUFFIX)) {
            continue;
        }
        let Ok(token) = prefix.parse::<Token>() else {
            continue;
        };
        if newest.as_ref().map_or(true, |(t, _)| token > *t) {
            newest = Some((token, path));
        }
    }

    let (token, code) = newest.ok_or_else(|| {
        SnapError::Publish(format!("no capture code file found in {}", dir.display()))
    })?;

    let plot_prefix = format!("{}{}.", token, PLOT_SUFFIX);
    let mut plot = None;
    let mut names: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect();
    names.sort();
    for path in names {
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(&plot_prefix))
        {
            plot = Some(path);
            break;
        }
    }

    let page = dir.join(format!("{}{}", token, PAGE_SUFFIX));
    let page = page.is_file().then_some(page);

    Ok(SnapshotFiles {
        token,
        code,
        plot,
        page,
    })
}
