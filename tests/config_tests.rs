use masonry_gallery::config::Configuration;
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn parse_kebab_case_config() {
    let yaml = r#"
catalog-path: "/data/images.json"
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.catalog_path, PathBuf::from("/data/images.json"));
    assert_eq!(cfg.page_limit, 14);
    assert_eq!(cfg.search_debounce, Duration::from_millis(500));
    assert!((cfg.scroll_threshold - 200.0).abs() < f32::EPSILON);
    assert!((cfg.swipe_threshold - 50.0).abs() < f32::EPSILON);
    assert_eq!(cfg.priority_tiles, 7);
    assert_eq!(cfg.shuffle_seed, None);
}

#[test]
fn parse_humantime_durations() {
    let yaml = r#"
search-debounce: 250ms
simulated-latency: 1s
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.search_debounce, Duration::from_millis(250));
    assert_eq!(cfg.simulated_latency, Duration::from_secs(1));
}

#[test]
fn parse_column_breakpoints() {
    let yaml = r#"
columns:
  medium-min-width: 600
  narrow: 1
  extra-wide: 8
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    let cfg = cfg.validated().unwrap();
    assert_eq!(cfg.columns.column_count(Some(500.0)), 1);
    assert_eq!(cfg.columns.column_count(Some(620.0)), 4);
    assert_eq!(cfg.columns.column_count(Some(2000.0)), 8);
}

#[test]
fn parse_with_shuffle_seed() {
    let yaml = r#"
shuffle-seed: 7
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.shuffle_seed, Some(7));
}

#[test]
fn zero_page_limit_is_rejected() {
    let yaml = r#"
page-limit: 0
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    let err = cfg.validated().unwrap_err();
    assert!(err.to_string().contains("page-limit"));
}

#[test]
fn zero_debounce_is_rejected() {
    let yaml = r#"
search-debounce: 0s
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert!(cfg.validated().is_err());
}

#[test]
fn unordered_breakpoints_are_rejected() {
    let yaml = r#"
columns:
  wide-min-width: 2000
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    let err = cfg.validated().unwrap_err();
    assert!(format!("{err:#}").contains("columns"));
}

#[test]
fn loads_from_yaml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gallery.yaml");
    std::fs::write(
        &path,
        "catalog-path: catalog.json\npage-limit: 20\nswipe-threshold: 80\n",
    )
    .unwrap();
    let cfg = Configuration::from_yaml_file(&path)
        .unwrap()
        .validated()
        .unwrap();
    assert_eq!(cfg.page_limit, 20);
    assert!((cfg.swipe_threshold - 80.0).abs() < f32::EPSILON);
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Configuration::from_yaml_file(dir.path().join("absent.yaml")).is_err());
}
