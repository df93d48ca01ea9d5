use opttree::{
    persistence::{self, Format},
    store::{Matrix, OptionStore},
};

use crate::helpers::simulation_store;

const FORMATS: [Format; 2] = [Format::Json, Format::Xml];

#[test]
fn test_store_load_store_is_stable() {
    let tree = simulation_store();
    for format in FORMATS {
        let first = persistence::to_string(&tree, format).unwrap();
        let loaded = persistence::from_str(&first, format).unwrap();
        assert_eq!(loaded, tree, "{format}");

        let second = persistence::to_string(&loaded, format).unwrap();
        assert_eq!(first, second, "{format}");
    }
}

#[test]
fn test_round_trip_preserves_order_and_attributes() {
    let mut tree = OptionStore::new();
    tree.add_node("/zeta").unwrap();
    tree.add_node("/alpha").unwrap();
    tree.set_option("/item[0]", 1i64).unwrap();
    tree.add_node("/middle").unwrap();
    tree.set_option("/item[1]", 2i64).unwrap();
    tree.set_attribute("/item[1]", "units", "m/s").unwrap();
    tree.set_attribute("/item[1]", "b", "<&>").unwrap();
    tree.set_attribute("/", "version", "2").unwrap();

    for format in FORMATS {
        let text = persistence::to_string(&tree, format).unwrap();
        let loaded = persistence::from_str(&text, format).unwrap();

        let names: Vec<&str> = loaded.root().children().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "item", "middle", "item"], "{format}");
        assert_eq!(loaded.get::<i64>("/item[1]"), Ok(2));
        assert_eq!(loaded.attribute("/item[1]", "b"), Ok(Some("<&>")));
        assert_eq!(loaded.attribute("/", "version"), Ok(Some("2")));
    }
}

#[test]
fn test_round_trip_edge_values() {
    let mut tree = OptionStore::with_root_name("config");
    tree.set_option("/big", i64::MAX).unwrap();
    tree.set_option("/small", i64::MIN).unwrap();
    tree.set_option("/tiny", f64::MIN_POSITIVE).unwrap();
    tree.set_option("/third", 1.0 / 3.0).unwrap();
    tree.set_option("/empty_string", "").unwrap();
    tree.set_option("/spaces", "  padded  ").unwrap();
    tree.set_option("/multiline", "line one\nline two").unwrap();
    tree.set_option("/empty_vector", Vec::<f64>::new()).unwrap();
    tree.set_option("/strings", vec!["", "a b", "c"]).unwrap();
    tree.set_option(
        "/string_grid",
        Matrix::from_rows(vec![
            vec!["a".to_string(), "b".to_string()],
            vec!["c".to_string(), "d".to_string()],
        ])
        .unwrap(),
    )
    .unwrap();

    for format in FORMATS {
        let text = persistence::to_string(&tree, format).unwrap();
        let loaded = persistence::from_str(&text, format).unwrap();
        assert_eq!(loaded, tree, "{format}");
        assert_eq!(loaded.root().name(), "config");
    }
}

#[test]
fn test_edits_after_load_behave_like_the_original() {
    let tree = simulation_store();
    for format in FORMATS {
        let text = persistence::to_string(&tree, format).unwrap();
        let mut loaded = persistence::from_str(&text, format).unwrap();
        let mut original = tree.clone();

        for store in [&mut loaded, &mut original] {
            store.delete_node("/phase[0]").unwrap();
            store.set_option("/phase[2]/name", "sand").unwrap();
        }
        assert_eq!(loaded, original, "{format}");
    }
}
