//! # snapplot
//!
//! snapplot keeps a record of how plots were made. Each capture stores the code
//! that drew a figure, the figure itself, and an HTML page showing both. Captures
//! can be filed into collections of a site, which builds into a static gallery.
//!
//! ## The Two Halves
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Capture (capture/)                                         │
//! │  - Resolves the caller's source through a SourceResolver    │
//! │  - Saves the figure of a RenderSurface                      │
//! │  - Never fails: problems become warnings                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ writes entries
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Store (store/)                                             │
//! │  - collections/<name>/<entry>/index.md + artifact files     │
//! │  - Front matter header, markdown body                       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ read by
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Site (site/)                                               │
//! │  - Index, galleries and detail pages from files alone       │
//! │  - Errors stop the build and name the missing precondition  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The site build has no dependency on a running capture, so a site can be
//! rebuilt from accumulated history at any time.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use snapplot::{capture, call_site, CaptureOptions};
//! use snapplot::surface::ImageSlot;
//!
//! let figure = ImageSlot::new();
//! let points = capture(
//!     CaptureOptions::new().title("Sine wave").site("my-site"),
//!     call_site!("plot_sine"),
//!     &figure,
//!     || {
//!         let points: Vec<f64> = (0..100).map(|i| (i as f64 / 10.0).sin()).collect();
//!         // draw `points` with a plotting library, then hand over the encoded image
//!         figure.present(Vec::<u8>::new());
//!         points
//!     },
//! );
//! assert_eq!(points.len(), 100);
//!
//! snapplot::build("my-site", std::path::Path::new("my-site/docs")).unwrap();
//! ```
//!
//! ## Module Overview
//!
//! - [`capture`]: Capture sessions and options
//! - [`source`]: Call sites and source text resolution
//! - [`surface`]: The rendering surface collaborator
//! - [`timestamp`]: Sortable, unique capture tokens
//! - [`store`]: Collection entries on disk
//! - [`site`]: Site initialization and static build
//! - [`config`]: Site configuration (`_config.yml`)
//! - [`publish`]: Fire-and-forget publishing of captures
//! - [`highlight`], [`markdown`]: HTML fragments for pages
//! - [`logging`]: Optional `tracing` subscriber setup
//! - [`error`]: Error types

pub mod capture;
pub mod config;
pub mod error;
pub mod highlight;
pub mod logging;
pub mod markdown;
pub mod model;
pub mod naming;
pub mod publish;
pub mod site;
pub mod source;
pub mod store;
pub mod surface;
pub mod timestamp;

pub use capture::{capture, CaptureOptions, CaptureReport, CaptureSession};
pub use config::SiteConfig;
pub use error::{Result, SnapError};
pub use model::{CaptureRecord, CollectionEntry, EntryMeta};
pub use publish::{ArchivePublisher, Publisher};
pub use site::{build, create_collection, init_site, BuildReport, SiteBuilder};
pub use source::CallSite;
pub use surface::{CropMode, RenderSurface};
