use snapplot::config::Theme;
use snapplot::site::{build, create_collection, init_site, CollectionOptions, InitOptions};
use snapplot::{SiteConfig, SnapError};
use std::fs;

#[test]
fn test_fresh_site_builds_empty_gallery() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().join("climate-study");
    let config = init_site(&root, &InitOptions::default()).unwrap();
    assert_eq!(config.title, "Climate Study Plots");

    create_collection(
        &root,
        "Ocean Temps",
        &CollectionOptions {
            description: Some("Sea surface temperature runs".to_string()),
            ..Default::default()
        },
    )
    .unwrap();

    let out = config.build_path(&root);
    let report = build(&root, &out).unwrap();
    assert_eq!(report.entries, 0);
    assert_eq!(report.collections, 1);
    assert_eq!(report.pages, 2);

    let index = fs::read_to_string(out.join("index.html")).unwrap();
    assert!(index.contains("No plots yet."));
    assert!(index.contains("0 plots"));
    assert!(index.contains(r#"href="Ocean-Temps/""#));
    assert!(index.contains("Sea surface temperature runs"));

    let gallery = fs::read_to_string(out.join("Ocean-Temps/index.html")).unwrap();
    assert!(gallery.contains("<h1>Ocean Temps</h1>"));
    assert!(out.join("assets/style.css").is_file());
    assert!(out.join("entries.json").is_file());
}

#[test]
fn test_theme_and_metadata_persist() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().join("site");
    init_site(
        &root,
        &InitOptions {
            title: Some("Minimal Lab".to_string()),
            description: Some("Small plots".to_string()),
            author: Some("Grace".to_string()),
            theme: Theme::Minimal,
            github_repo: Some("lab/plots".to_string()),
        },
    )
    .unwrap();

    let config = SiteConfig::load(&root).unwrap();
    assert_eq!(config.title, "Minimal Lab");
    assert_eq!(config.template, Theme::Minimal);
    assert_eq!(config.default_author(), Some("Grace"));
    assert_eq!(config.github_repo.as_deref(), Some("lab/plots"));

    let out = temp_dir.path().join("out");
    build(&root, &out).unwrap();
    let footer = fs::read_to_string(out.join("index.html")).unwrap();
    assert!(footer.contains("Grace"));
    assert!(footer.contains("snapplot"));
}

#[test]
fn test_init_twice_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().join("site");
    init_site(&root, &InitOptions::default()).unwrap();
    let err = init_site(&root, &InitOptions::default()).unwrap_err();
    assert!(matches!(err, SnapError::SiteExists(_)));
}

#[test]
fn test_unknown_config_keys_survive_collection_creation() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().join("site");
    init_site(&root, &InitOptions::default()).unwrap();

    let path = root.join("_config.yml");
    let mut yaml = fs::read_to_string(&path).unwrap();
    yaml.push_str("analytics_id: UA-123\n");
    fs::write(&path, yaml).unwrap();

    create_collection(&root, "runs", &CollectionOptions::default()).unwrap();
    let config = SiteConfig::load(&root).unwrap();
    assert!(config.collections.contains_key("runs"));
    assert_eq!(
        config.extra.get("analytics_id").and_then(|v| v.as_str()),
        Some("UA-123")
    );
}
