//! # Static Site Builder
//!
//! Turns a site root into a static HTML site. The build is purely file driven:
//! it reads `_config.yml` and the collection directories, never the state of a
//! running capture, so a site can be rebuilt from accumulated history at any time.
//!
//! ## Output Layout
//!
//! ```text
//! <output>/
//! ├── index.html                       # latest entries + collection cards
//! ├── entries.json                     # manifest of every rendered entry
//! ├── assets/style.css
//! └── <collection>/
//!     ├── index.html                   # gallery, newest first
//!     └── <entry slug>/
//!         ├── index.html               # detail page
//!         ├── plot.png
//!         └── code.py
//! ```
//!
//! Links are relative, with the prefix computed from the page depth: `""` on the
//! index, `"../"` on galleries and `"../../"` on detail pages. The output is
//! deleted and rewritten on every build and contains no build timestamp, so
//! building unchanged inputs twice produces identical files.
//!
//! ## Templates
//!
//! Pages are rendered with [`stencil`]. The embedded defaults (`default.html`,
//! `gallery.html`, `plot.html` and the `header`, `footer` and `plot-card`
//! partials) are overridden by files of the same name in the site's `_layouts/`
//! and `_includes/`. See [`pages`] for the data each template receives.

pub mod builder;
pub mod init;
pub mod pages;
pub mod templates;

pub use builder::{build, BuildReport, EntryFilter, SiteBuilder};
pub use init::{create_collection, init_site, CollectionOptions, InitOptions};
