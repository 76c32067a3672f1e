use crate::config::{Theme, INCLUDES_DIR, LAYOUTS_DIR};
use crate::error::Result;
use std::path::Path;
use stencil::Renderer;
use tracing::debug;

pub const INDEX_LAYOUT: &str = "default.html";
pub const GALLERY_LAYOUT: &str = "gallery.html";
pub const PLOT_LAYOUT: &str = "plot.html";

/// Value of the `generator` global available to every template.
pub const GENERATOR: &str = "snapplot";

/// Page layouts, installed into `_layouts/` by `init_site`.
pub const LAYOUTS: &[(&str, &str)] = &[
    (INDEX_LAYOUT, include_str!("templates/default.html")),
    (GALLERY_LAYOUT, include_str!("templates/gallery.html")),
    (PLOT_LAYOUT, include_str!("templates/plot.html")),
];

/// Partials, installed into `_includes/` by `init_site`.
pub const INCLUDES: &[(&str, &str)] = &[
    ("header.html", include_str!("templates/header.html")),
    ("footer.html", include_str!("templates/footer.html")),
    ("plot-card.html", include_str!("templates/plot-card.html")),
];

const SCIENTIFIC_CSS: &str = include_str!("templates/scientific.css");
const MINIMAL_CSS: &str = include_str!("templates/minimal.css");

pub fn stylesheet(theme: Theme) -> &'static str {
    match theme {
        Theme::Scientific => SCIENTIFIC_CSS,
        Theme::Minimal => MINIMAL_CSS,
    }
}

/// Builds the renderer for a site: embedded defaults first, then the site's
/// `_includes/` and `_layouts/`, so a site file replaces the default of the
/// same name.
pub fn site_renderer(site_root: &Path) -> Result<Renderer> {
    let mut renderer = Renderer::new();
    for (name, source) in INCLUDES.iter().chain(LAYOUTS) {
        renderer.add_template(name, source)?;
    }

    for dir in [INCLUDES_DIR, LAYOUTS_DIR] {
        let loaded = renderer.load_dir(&site_root.join(dir))?;
        if !loaded.is_empty() {
            debug!("Loaded {} templates from {}: {:?}", loaded.len(), dir, loaded);
        }
    }

    renderer.add_global("generator", &GENERATOR);
    Ok(renderer)
}

/// Template file name for a layout named in front matter (`plot` or `plot.html`).
pub fn layout_file(layout: &str) -> String {
    if layout.ends_with(".html") {
        layout.to_string()
    } else {
        format!("{}.html", layout)
    }
}
