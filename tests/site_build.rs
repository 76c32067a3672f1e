use chrono::{Duration, TimeZone, Utc};
use snapplot::model::EntryMeta;
use snapplot::site::{build, create_collection, init_site, CollectionOptions, EntryFilter, InitOptions, SiteBuilder};
use snapplot::store::FileStore;
use snapplot::{SiteConfig, SnapError};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// A site with collections `alpha` (3 entries) and `beta` (5 entries).
fn sample_site(root: &Path) {
    init_site(
        root,
        &InitOptions {
            title: Some("Lab Notebook".to_string()),
            author: Some("Ada".to_string()),
            ..Default::default()
        },
    )
    .unwrap();

    let store = FileStore::new(root);
    let base = Utc.with_ymd_and_hms(2024, 12, 1, 9, 0, 0).unwrap();
    for (collection, count) in [("alpha", 3), ("beta", 5)] {
        create_collection(root, collection, &CollectionOptions::default()).unwrap();
        for i in 0..count {
            let offset = if collection == "alpha" { i * 2 } else { i * 2 + 1 };
            let mut meta = EntryMeta::new(format!("{} plot {}", collection, i));
            meta.date = Some(base + Duration::hours(offset));
            meta.tags = vec![collection.to_string(), format!("n{}", i)];
            meta.plot_image = Some("plot.png".to_string());
            meta.code_file = Some("code.py".to_string());
            meta.function_name = Some(format!("plot_{}", i));
            meta.filename = Some("analysis.py".to_string());

            let slug = format!("entry_{}", i);
            let dir = store
                .save_entry(collection, &slug, &meta, "Some *notes* on the plot.")
                .unwrap();
            fs::write(dir.join("plot.png"), PNG).unwrap();
            fs::write(dir.join("code.py"), format!("def plot_{}():\n    return {}\n", i, i)).unwrap();
        }
    }
}

fn snapshot(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(dir)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let relative = e.path().strip_prefix(dir).unwrap().to_path_buf();
            (relative, fs::read(e.path()).unwrap())
        })
        .collect()
}

fn read(path: PathBuf) -> String {
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {}", path.display(), e))
}

#[test]
fn test_build_renders_index_galleries_and_details() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().join("site");
    sample_site(&root);
    let out = temp_dir.path().join("out");

    let report = build(&root, &out).unwrap();
    assert_eq!(report.entries, 8);
    assert_eq!(report.collections, 2);
    assert_eq!(report.pages, 11);
    assert!(report.skipped.is_empty());

    let index = read(out.join("index.html"));
    assert_eq!(index.matches(r#"class="plot-card""#).count(), 8);
    assert!(index.contains("3 plots"));
    assert!(index.contains("5 plots"));
    assert!(index.contains("Lab Notebook"));

    let alpha = read(out.join("alpha/index.html"));
    let beta = read(out.join("beta/index.html"));
    assert_eq!(alpha.matches(r#"class="plot-card""#).count(), 3);
    assert_eq!(beta.matches(r#"class="plot-card""#).count(), 5);

    let details: Vec<_> = WalkDir::new(&out)
        .min_depth(3)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_name() == "index.html")
        .collect();
    assert_eq!(details.len(), 8);
    for collection in ["alpha", "beta"] {
        let entry = out.join(collection).join("entry_0");
        assert!(entry.join("plot.png").is_file());
        assert!(entry.join("code.py").is_file());
        assert!(!entry.join("index.md").exists());
    }
}

#[test]
fn test_index_and_galleries_are_newest_first() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().join("site");
    sample_site(&root);
    let out = temp_dir.path().join("out");
    build(&root, &out).unwrap();

    let index = read(out.join("index.html"));
    let newest = index.find("beta plot 4").unwrap();
    let oldest = index.find("alpha plot 0").unwrap();
    assert!(newest < oldest);

    let alpha = read(out.join("alpha/index.html"));
    let positions: Vec<usize> = (0..3)
        .map(|i| alpha.find(&format!("alpha plot {}", i)).unwrap())
        .collect();
    assert!(positions[2] < positions[1] && positions[1] < positions[0]);
}

#[test]
fn test_index_limit_caps_latest_entries() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().join("site");
    sample_site(&root);
    let mut config = SiteConfig::load(&root).unwrap();
    config.index_limit = 4;
    config.save(&root).unwrap();

    let out = temp_dir.path().join("out");
    build(&root, &out).unwrap();
    let index = read(out.join("index.html"));
    assert_eq!(index.matches(r#"class="plot-card""#).count(), 4);
    assert!(index.contains("5 plots"));
}

#[test]
fn test_rebuild_is_byte_identical() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().join("site");
    sample_site(&root);
    fs::create_dir_all(root.join("collections/alpha/loose_figure")).unwrap();
    fs::write(root.join("collections/alpha/loose_figure/figure.png"), PNG).unwrap();
    let out = temp_dir.path().join("out");

    build(&root, &out).unwrap();
    let first = snapshot(&out);
    fs::write(out.join("stale.html"), "left over").unwrap();
    build(&root, &out).unwrap();
    let second = snapshot(&out);

    assert_eq!(first, second);
    assert!(!out.join("stale.html").exists());
}

#[test]
fn test_links_are_relative_to_page_depth() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().join("site");
    sample_site(&root);
    let out = temp_dir.path().join("out");
    build(&root, &out).unwrap();

    let index = read(out.join("index.html"));
    assert!(index.contains(r#"href="assets/style.css""#));
    assert!(index.contains(r#"href="alpha/entry_0/""#));
    assert!(index.contains(r#"src="alpha/entry_0/plot.png""#));

    let gallery = read(out.join("alpha/index.html"));
    assert!(gallery.contains(r#"href="../assets/style.css""#));
    assert!(gallery.contains(r#"href="../alpha/entry_0/""#));
    assert!(gallery.contains(r#"href="../index.html""#));

    let detail = read(out.join("alpha/entry_0/index.html"));
    assert!(detail.contains(r#"href="../../assets/style.css""#));
    assert!(detail.contains(r#"href="../../alpha/""#));
    assert!(detail.contains(r#"src="plot.png""#));
}

#[test]
fn test_detail_page_shows_code_and_markdown_body() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().join("site");
    sample_site(&root);
    let out = temp_dir.path().join("out");
    build(&root, &out).unwrap();

    let detail = read(out.join("beta/entry_2/index.html"));
    assert!(detail.contains("<title>beta plot 2 - Lab Notebook</title>"));
    assert!(detail.contains("<em>notes</em>"));
    assert!(detail.contains("language-python"));
    assert!(detail.contains("plot_2"));
    assert!(detail.contains("by Ada"));
    assert!(detail.contains(r#"<span class="tag">n2</span>"#));
}

#[test]
fn test_image_without_metadata_gets_auto_title() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().join("site");
    sample_site(&root);
    let dir = root.join("collections/beta/my_cool_plot");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("figure.png"), PNG).unwrap();

    let out = temp_dir.path().join("out");
    let report = build(&root, &out).unwrap();
    assert_eq!(report.entries, 9);

    let gallery = read(out.join("beta/index.html"));
    assert!(gallery.contains("My Cool Plot"));
    assert!(out.join("beta/my_cool_plot/figure.png").is_file());
    assert!(out.join("beta/my_cool_plot/index.html").is_file());
}

#[test]
fn test_auto_generated_entry_is_dated_by_prefix() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().join("site");
    sample_site(&root);
    let dir = root.join("collections/alpha/20250717_152701_random_walk");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("walk.png"), PNG).unwrap();

    let entries = SiteBuilder::open(&root).unwrap().entries().unwrap();
    let first = &entries[0];
    assert_eq!(first.slug, "20250717_152701_random_walk");
    assert!(first.is_auto_generated());
    assert_eq!(first.date, Utc.with_ymd_and_hms(2025, 7, 17, 15, 27, 1).unwrap());
}

#[test]
fn test_malformed_header_is_skipped() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().join("site");
    sample_site(&root);
    let dir = root.join("collections/alpha/broken");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("index.md"), "---\ntitle: [unclosed\n---\n\nBody").unwrap();

    let out = temp_dir.path().join("out");
    let report = build(&root, &out).unwrap();
    assert_eq!(report.entries, 8);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].0, dir);
    assert!(!out.join("alpha/broken").exists());
}

#[test]
fn test_hidden_collection_is_not_built() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().join("site");
    sample_site(&root);
    let mut config = SiteConfig::load(&root).unwrap();
    config.collections.get_mut("alpha").unwrap().output = false;
    config.save(&root).unwrap();

    let out = temp_dir.path().join("out");
    let report = build(&root, &out).unwrap();
    assert_eq!(report.entries, 5);
    assert_eq!(report.collections, 1);
    assert!(!out.join("alpha").exists());
    assert!(!read(out.join("index.html")).contains("alpha plot"));
}

#[test]
fn test_manifest_lists_entries_in_display_order() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().join("site");
    sample_site(&root);
    let out = temp_dir.path().join("out");
    build(&root, &out).unwrap();

    let manifest: serde_json::Value = serde_json::from_str(&read(out.join("entries.json"))).unwrap();
    let entries = manifest.as_array().unwrap();
    assert_eq!(entries.len(), 8);
    assert_eq!(entries[0]["title"], "beta plot 4");
    assert_eq!(entries[0]["url"], "beta/entry_4/");
    assert_eq!(entries[7]["title"], "alpha plot 0");
}

#[test]
fn test_entries_matching_filters() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().join("site");
    sample_site(&root);
    let builder = SiteBuilder::open(&root).unwrap();

    let alpha = builder
        .entries_matching(&EntryFilter::default().collection("alpha"))
        .unwrap();
    assert_eq!(alpha.len(), 3);

    let tagged = builder
        .entries_matching(&EntryFilter::default().tag("n1"))
        .unwrap();
    assert_eq!(tagged.len(), 2);

    let nobody = builder
        .entries_matching(&EntryFilter::default().author("Grace"))
        .unwrap();
    assert!(nobody.is_empty());
}

#[test]
fn test_site_templates_override_defaults() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().join("site");
    sample_site(&root);
    fs::write(
        root.join("_layouts/gallery.html"),
        "<h1>{{ collection.title }}</h1>{% for entry in entries %}[{{ entry.title }}]{% endfor %}",
    )
    .unwrap();

    let out = temp_dir.path().join("out");
    build(&root, &out).unwrap();
    assert_eq!(
        read(out.join("alpha/index.html")),
        "<h1>Alpha</h1>[alpha plot 2][alpha plot 1][alpha plot 0]"
    );
}

#[test]
fn test_missing_config_is_an_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(temp_dir.path().join("collections/alpha")).unwrap();
    let err = build(temp_dir.path(), &temp_dir.path().join("out")).unwrap_err();
    assert!(matches!(err, SnapError::MissingConfig(_)));
    assert!(!temp_dir.path().join("out").exists());
}

#[test]
fn test_refuses_to_wipe_site_root() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().join("site");
    sample_site(&root);

    let err = build(&root, &root).unwrap_err();
    assert!(matches!(err, SnapError::UnsafeOutput(_)));
    let err = build(&root, temp_dir.path()).unwrap_err();
    assert!(matches!(err, SnapError::UnsafeOutput(_)));
    assert!(root.join("_config.yml").is_file());
}

#[test]
fn test_refuses_to_wipe_site_sources() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().join("site");
    sample_site(&root);

    for out in [root.join("collections"), root.join("assets"), root.join("_layouts")] {
        let err = build(&root, &out).unwrap_err();
        assert!(matches!(err, SnapError::UnsafeOutput(_)), "{}", out.display());
    }

    let mut config = SiteConfig::load(&root).unwrap();
    config.build_dir = "collections".to_string();
    config.save(&root).unwrap();
    let err = build(&root, &config.build_path(&root)).unwrap_err();
    assert!(matches!(err, SnapError::UnsafeOutput(_)));

    assert!(root.join("collections/alpha/entry_0/index.md").is_file());
    assert!(root.join("assets/style.css").is_file());
    assert_eq!(SiteBuilder::open(&root).unwrap().entries().unwrap().len(), 8);
}

#[test]
fn test_front_matter_url_keeps_local_links() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().join("site");
    sample_site(&root);
    let dir = root.join("collections/alpha/cited");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("index.md"),
        "---\ntitle: Cited plot\ndate: 2030-01-01T00:00:00Z\nurl: https://doi.example/x\nslug: other\n---\n\nBody",
    )
    .unwrap();

    let out = temp_dir.path().join("out");
    build(&root, &out).unwrap();
    let index = read(out.join("index.html"));
    assert!(index.contains(r#"href="alpha/cited/""#));
    assert!(!index.contains("doi.example"));
    assert!(out.join("alpha/cited/index.html").is_file());
}
