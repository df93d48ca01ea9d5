use opttree::store::{OptionError, OptionStore};

use crate::helpers::simulation_store;

#[test]
fn test_root_is_reachable_by_empty_path() {
    let store = OptionStore::new();
    assert_eq!(store.resolve("").unwrap().name(), "options");
    assert_eq!(store.resolve("/").unwrap().name(), "options");
    assert!(store.have_option(""));
    assert_eq!(store.sibling_count(""), 1);
}

#[test]
fn test_bare_name_resolves_to_first_sibling() {
    let store = simulation_store();
    assert_eq!(store.get::<String>("/phase/name"), Ok("water".to_string()));
    assert_eq!(store.get::<String>("/phase[0]/name"), Ok("water".to_string()));
    assert_eq!(store.get::<String>("/phase[2]/name"), Ok("oil".to_string()));
}

#[test]
fn test_redundant_slashes_are_ignored() {
    let store = simulation_store();
    assert_eq!(store.get::<f64>("simulation/timestep"), Ok(0.01));
    assert_eq!(store.get::<f64>("//simulation//timestep/"), Ok(0.01));
}

#[test]
fn test_unresolved_paths() {
    let store = simulation_store();

    let err = store.resolve("/simulation/missing").unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.path(), Some("/simulation/missing"));

    assert!(store.resolve("/phase[3]").unwrap_err().is_not_found());
    assert!(!store.have_option("/phase[3]"));
}

#[test]
fn test_malformed_paths() {
    let store = simulation_store();
    for path in ["/phase[", "/phase[x]", "/phase[1]x", "/[0]", "/phase]"] {
        let err = store.resolve(path).unwrap_err();
        assert!(
            matches!(err, OptionError::InvalidPath { .. }),
            "{path} gave {err:?}"
        );
        assert!(err.is_not_found());
        assert!(!store.have_option(path));
        assert_eq!(store.sibling_count(path), 0);
    }
}

#[test]
fn test_child_count_counts_distinct_names() {
    let store = simulation_store();
    // simulation, mesh, phase (x3), output
    assert_eq!(store.root().children().len(), 6);
    assert_eq!(store.child_count("/"), Ok(4));
    assert_eq!(store.child_count("/simulation"), Ok(3));
    assert_eq!(store.child_count("/simulation/timestep"), Ok(0));
    assert!(store.child_count("/nowhere").unwrap_err().is_not_found());
}

#[test]
fn test_nth_child_name_in_insertion_order() {
    let store = simulation_store();
    let names: Vec<String> = (0..store.child_count("").unwrap())
        .map(|i| store.nth_child_name("", i).unwrap())
        .collect();
    assert_eq!(names, vec!["simulation", "mesh", "phase", "output"]);

    let err = store.nth_child_name("", 4).unwrap_err();
    assert!(err.is_index_error());
    assert!(matches!(
        err,
        OptionError::IndexOutOfRange { index: 4, count: 4, .. }
    ));
    assert!(store.nth_child_name("/nowhere", 0).unwrap_err().is_not_found());
}

#[test]
fn test_sibling_count() {
    let store = simulation_store();
    assert_eq!(store.sibling_count("/phase"), 3);
    // The final index is ignored
    assert_eq!(store.sibling_count("/phase[2]"), 3);
    assert_eq!(store.sibling_count("/phase[7]"), 3);
    assert_eq!(store.sibling_count("/simulation/timestep"), 1);
    assert_eq!(store.sibling_count("/simulation/missing"), 0);
    assert_eq!(store.sibling_count("/missing/child"), 0);
}

#[test]
fn test_option_paths_are_canonical() {
    let store = simulation_store();
    let paths = store.option_paths();
    assert_eq!(
        paths,
        vec![
            "/simulation",
            "/simulation/timestep",
            "/simulation/dimension",
            "/simulation/domain",
            "/simulation/domain/extents",
            "/mesh",
            "/mesh/extent",
            "/phase[0]",
            "/phase[0]/name",
            "/phase[1]",
            "/phase[1]/name",
            "/phase[2]",
            "/phase[2]/name",
            "/output",
            "/output/fields",
        ]
    );
    for path in &paths {
        assert!(store.have_option(path), "{path}");
    }
}
