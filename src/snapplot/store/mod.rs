//! # Metadata Store
//!
//! Collection entries are plain directories of files. The store reads and writes
//! the small records that describe them.
//!
//! ## Storage Format
//!
//! ```text
//! <site root>/
//! ├── _config.yml                         # SiteConfig
//! └── collections/
//!     └── <name>/
//!         ├── _index.md                   # Collection title, description, body
//!         └── <token>_<title>/
//!             ├── index.md                # EntryMeta header + markdown body
//!             ├── plot.png
//!             └── code.py
//! ```
//!
//! Every metadata file is markdown with a YAML header (see [`frontmatter`]).
//! Names starting with `_` or `.` are reserved and never listed as collections
//! or entries.
//!
//! ## Auto-generated Entries
//!
//! A directory with an image but no `index.md` is still an entry: its title is
//! derived from the directory name and its date from the token prefix of the name,
//! falling back to the image's modification time. This lets plots dropped into a
//! collection by hand appear in the site without writing metadata.

pub mod frontmatter;
pub mod fs;

pub use fs::{CollectionLoad, FileStore};
