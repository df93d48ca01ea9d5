use std::fs;

use tempfile::TempDir;

use opttree::{
    OptionStore,
    persistence::{self, Format, PersistenceError},
};

use crate::helpers::simulation_store;

#[test]
fn test_write_and_load_by_extension() {
    let dir = TempDir::new().unwrap();
    let tree = simulation_store();

    for file in ["run.json", "run.xml", "run.flml"] {
        let path = dir.path().join(file);
        tree.write_options(&path).unwrap();
        assert!(path.exists());

        let loaded = OptionStore::load_options(&path).unwrap();
        assert_eq!(loaded, tree, "{file}");
    }

    let json = fs::read_to_string(dir.path().join("run.json")).unwrap();
    assert!(json.trim_start().starts_with('{'));
    let flml = fs::read_to_string(dir.path().join("run.flml")).unwrap();
    assert!(flml.starts_with("<?xml"));
}

#[test]
fn test_explicit_format_overrides_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("options.txt");
    let tree = simulation_store();

    persistence::store_as(&tree, &path, Format::Json).unwrap();
    assert_eq!(persistence::load_as(&path, Format::Json).unwrap(), tree);

    // Detected as XML from the extension, so the JSON text does not parse
    let err = persistence::load(&path).unwrap_err();
    assert!(err.is_persistence_error());
    assert!(!err.is_io_error());
}

#[test]
fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = OptionStore::load_options(dir.path().join("absent.xml")).unwrap_err();
    assert!(err.is_io_error());
    assert!(err.to_string().contains("absent.xml"));
}

#[test]
fn test_write_to_missing_directory() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("no_such_dir").join("run.xml");
    let err = simulation_store().write_options(&path).unwrap_err();
    assert!(err.is_io_error());
}

#[test]
fn test_load_invalid_files() {
    let dir = TempDir::new().unwrap();
    let cases = [
        ("broken.json", "{ not json"),
        ("version.json", r#"{"_v": 9, "root": {"name": "options"}}"#),
        ("broken.xml", "<options><a></options>"),
        ("text.xml", "<options>loose text</options>"),
        ("empty.xml", ""),
    ];

    for (file, content) in cases {
        let path = dir.path().join(file);
        fs::write(&path, content).unwrap();
        let err = OptionStore::load_options(&path).unwrap_err();
        assert!(err.is_persistence_error(), "{file}: {err}");
        assert!(!err.is_io_error(), "{file}: {err}");
    }
}

#[test]
fn test_unwritable_tree_leaves_no_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.xml");

    let mut tree = OptionStore::new();
    tree.add_node("/integer_value").unwrap();
    let err = tree.write_options(&path).unwrap_err();
    assert!(matches!(
        err,
        opttree::Error::Persistence(PersistenceError::Unrepresentable { .. })
    ));
    assert!(!path.exists());

    // The same tree is fine as JSON
    let json = dir.path().join("bad.json");
    tree.write_options(&json).unwrap();
    assert_eq!(OptionStore::load_options(&json).unwrap(), tree);
}
