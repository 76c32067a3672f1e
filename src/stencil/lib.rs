//! # Stencil - HTML Template Rendering
//!
//! A thin layer over [minijinja](https://docs.rs/minijinja) for rendering HTML pages
//! from serializable data.
//!
//! ## The Problem
//!
//! Static pages mix trusted markup (layouts, pre-rendered markdown, highlighted code)
//! with untrusted text (titles, notes, tags typed by users). Building them with
//! `format!` invites escaping bugs, and every page type ends up re-implementing the
//! same date formatting and slug helpers.
//!
//! ## The Solution
//!
//! Stencil separates concerns:
//! - **Templates** define structure using Jinja2 syntax (via minijinja)
//! - **Escaping** is on by default for every `.html` / `.xml` template; trusted
//!   fragments opt out with the `safe` filter
//! - **Filters** cover what page templates need beyond minijinja's builtins:
//!   `dateformat` and `slugify`
//!
//! ## Quick Example
//!
//! ```rust
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Card {
//!     title: String,
//!     date: String,
//! }
//!
//! let template = r#"<h3>{{ title }}</h3><span>{{ date | dateformat("%b %d, %Y") }}</span>"#;
//! let card = Card { title: "Sine <wave>".into(), date: "2024-12-01T14:30:22Z".into() };
//! let html = stencil::render(template, &card).unwrap();
//! assert_eq!(html, "<h3>Sine &lt;wave&gt;</h3><span>Dec 01, 2024</span>");
//! ```
//!
//! ## Renderer for Multiple Templates
//!
//! Sites have layouts that include partials. Use [`Renderer`] to register them by
//! name; `{% include "header.html" %}` resolves against the same registry. Templates
//! loaded later under an existing name replace the earlier one, which is how a site
//! overrides the embedded defaults with its own `_layouts/` directory:
//!
//! ```rust
//! use serde::Serialize;
//!
//! let mut renderer = stencil::Renderer::new();
//! renderer.add_template("header.html", "<h1>{{ title }}</h1>").unwrap();
//! renderer
//!     .add_template("page.html", r#"{% include "header.html" %}<p>{{ body }}</p>"#)
//!     .unwrap();
//!
//! #[derive(Serialize)]
//! struct Page { title: String, body: String }
//!
//! let html = renderer
//!     .render("page.html", &Page { title: "Home".into(), body: "a & b".into() })
//!     .unwrap();
//! assert_eq!(html, "<h1>Home</h1><p>a &amp; b</p>");
//! ```

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use minijinja::value::Value;
use minijinja::{AutoEscape, Environment, ErrorKind, Output, State};
use serde::Serialize;
use std::fs;
use std::path::Path;

pub use minijinja::Error;

/// Format used by `dateformat` when the template passes no explicit format.
pub const DEFAULT_DATE_FORMAT: &str = "%B %d, %Y";

/// Name under which [`render`] registers its one-shot template.
const INLINE_TEMPLATE: &str = "_inline.html";

/// Renders a one-off template string with HTML escaping enabled.
///
/// The template is compiled on every call. Use [`Renderer`] when the same templates
/// are rendered repeatedly or include each other.
pub fn render<T: Serialize>(template: &str, data: &T) -> Result<String, Error> {
    let mut env = new_environment();
    env.add_template_owned(INLINE_TEMPLATE.to_string(), template.to_string())?;
    let tmpl = env.get_template(INLINE_TEMPLATE)?;
    tmpl.render(data)
}

/// A renderer with pre-registered, named templates.
///
/// Template names matter: names ending in `.html`, `.htm` or `.xml` are
/// auto-escaped, anything else renders raw.
pub struct Renderer {
    env: Environment<'static>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            env: new_environment(),
        }
    }

    /// Registers a named template, replacing any template with the same name.
    ///
    /// The template is compiled immediately; syntax errors are returned here
    /// rather than at render time.
    pub fn add_template(&mut self, name: &str, source: &str) -> Result<(), Error> {
        self.env
            .add_template_owned(name.to_string(), source.to_string())
    }

    /// Registers every file in `dir` as a template named after its file name.
    ///
    /// Files are loaded in name order. A missing directory is not an error and
    /// loads nothing. Returns the names that were registered.
    pub fn load_dir(&mut self, dir: &Path) -> Result<Vec<String>, Error> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let entries = fs::read_dir(dir).map_err(|e| io_error(dir, e))?;
        for entry in entries {
            let path = entry.map_err(|e| io_error(dir, e))?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();

        let mut loaded = Vec::with_capacity(files.len());
        for path in files {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let source = fs::read_to_string(&path).map_err(|e| io_error(&path, e))?;
            self.add_template(name, &source)?;
            loaded.push(name.to_string());
        }
        Ok(loaded)
    }

    /// Returns true if a template with the given name is registered.
    pub fn has_template(&self, name: &str) -> bool {
        self.env.get_template(name).is_ok()
    }

    /// Makes a value available to every template under `name`.
    pub fn add_global<T: Serialize>(&mut self, name: &str, value: &T) {
        self.env.add_global(
            name.to_string(),
            minijinja::Value::from_serialize(value),
        );
    }

    /// Renders a registered template with the given data.
    ///
    /// # Errors
    ///
    /// Returns an error if the template name is not found or rendering fails.
    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String, Error> {
        let tmpl = self.env.get_template(name)?;
        tmpl.render(data)
    }
}

/// Converts text to a lowercase, URL-friendly slug.
///
/// Characters other than letters, digits, underscores, whitespace and hyphens are
/// dropped; runs of whitespace and hyphens collapse to a single hyphen.
pub fn slugify(text: &str) -> String {
    let kept: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();

    let mut slug = String::with_capacity(kept.len());
    let mut pending_dash = false;
    for c in kept.trim().chars() {
        if c == '-' || c.is_whitespace() {
            pending_dash = true;
            continue;
        }
        if pending_dash && !slug.is_empty() {
            slug.push('-');
        }
        pending_dash = false;
        slug.extend(c.to_lowercase());
    }
    slug
}

/// Formats a date string with a strftime pattern.
///
/// Accepts RFC 3339 timestamps, naive ISO date-times and plain `YYYY-MM-DD`
/// dates (both read as UTC). Text that is not a recognizable date is returned
/// unchanged so that a hand-written date never breaks a page.
pub fn format_date(value: &str, format: &str) -> Result<String, Error> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            format!("invalid date format {:?}", format),
        ));
    }

    match parse_date(value) {
        Some(date) => Ok(date.format(format).to_string()),
        None => Ok(value.to_string()),
    }
}

/// Escapes the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Parses the date shapes accepted by [`format_date`].
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn new_environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|name| {
        if name.ends_with(".html") || name.ends_with(".htm") || name.ends_with(".xml") {
            AutoEscape::Html
        } else {
            AutoEscape::None
        }
    });
    env.set_formatter(html_formatter);
    register_filters(&mut env);
    env
}

/// Escapes like minijinja's default formatter but leaves `/` alone, so relative
/// URLs stay readable in the generated markup.
fn html_formatter(out: &mut Output<'_>, state: &State<'_, '_>, value: &Value) -> Result<(), Error> {
    let escape = matches!(state.auto_escape(), AutoEscape::Html)
        && !value.is_safe()
        && !value.is_undefined()
        && !value.is_none();
    if !escape {
        return minijinja::escape_formatter(out, state, value);
    }
    out.write_str(&escape_html(&value.to_string()))
        .map_err(|_| Error::new(ErrorKind::WriteFailure, "failed to write output"))
}

/// Registers the `dateformat` and `slugify` filters on a minijinja environment.
fn register_filters(env: &mut Environment<'static>) {
    env.add_filter(
        "dateformat",
        |value: String, format: Option<String>| -> Result<String, Error> {
            format_date(&value, format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT))
        },
    );
    env.add_filter("slugify", |value: String| -> String { slugify(&value) });
}

fn io_error(path: &Path, err: std::io::Error) -> Error {
    Error::new(
        ErrorKind::InvalidOperation,
        format!("cannot read templates from {}", path.display()),
    )
    .with_source(err)
}
