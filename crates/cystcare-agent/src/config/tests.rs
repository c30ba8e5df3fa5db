use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_empty_file_gives_defaults() {
    let config = Config::from_toml_str("").unwrap();
    assert_eq!(config.model.bundle_path, PathBuf::from("models/cyst_bundle.json"));
    assert_eq!(config.logging.filter, "cystcare=info,warn");
    assert_eq!(config.batch.workers, 4);
    assert!(config.data.reference_tables.is_none());
}

#[test]
fn test_partial_sections_keep_defaults() {
    let config = Config::from_toml_str(
        r#"
        [data]
        charges_csv = "/srv/kenyatta/charges.csv"
        reference_tables = "/srv/kenyatta/reference.yaml"
        "#,
    )
    .unwrap();
    assert_eq!(config.data.inventory_csv, PathBuf::from("data/inventory.csv"));
    assert_eq!(config.data.charges_csv, PathBuf::from("/srv/kenyatta/charges.csv"));

    let sources = config.sources();
    assert_eq!(sources.reference_tables, Some(PathBuf::from("/srv/kenyatta/reference.yaml")));
}

#[test]
fn test_zero_workers_rejected() {
    assert!(Config::from_toml_str("[batch]\nworkers = 0").is_err());
}

#[test]
fn test_explicit_missing_file_is_error() {
    assert!(Config::load(Some(Path::new("/nonexistent/cystcare.toml"))).is_err());
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cystcare.toml");
    std::fs::write(&path, "[model]\nbundle_path = \"bundle.json\"\n[batch]\nworkers = 2\n").unwrap();
    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.model.bundle_path, PathBuf::from("bundle.json"));
    assert_eq!(config.batch.workers, 2);
}
