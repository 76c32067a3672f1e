//! # Capturing Plotting Code
//!
//! A capture documents one call of a plotting function. It writes three files
//! into `<output_dir>/snapshot_<caller stem>/`, all prefixed with the same token:
//!
//! ```text
//! 20241201_143022_123_code.py        the caller's function, or its file
//! 20241201_143022_123_plot.png       only if the surface had a figure
//! 20241201_143022_123_snapshot.html  code and plot side by side
//! ```
//!
//! With [`CaptureOptions::site`] set, the capture is also filed as an entry of a
//! site collection (see [`crate::store`]) and the site is optionally rebuilt.
//!
//! Two entry points share one implementation:
//!
//! - [`capture`] wraps a closure and passes its return value through.
//! - [`CaptureSession`] is a scoped object: begin it, draw, then `finish` it
//!   (or let it drop).
//!
//! Nothing here returns an error. Failures are logged with `tracing::warn!` and
//! collected in [`CaptureReport::warnings`], so documentation problems never
//! change what the instrumented code does.

mod options;
pub mod page;
mod session;

pub use options::{CaptureOptions, DEFAULT_COLLECTION, DEFAULT_DPI, DEFAULT_OUTPUT_DIR, OUTPUT_DIR_ENV};
pub use session::{capture, CaptureReport, CaptureSession};
