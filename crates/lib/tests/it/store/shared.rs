use std::thread;

use opttree::SharedOptionStore;

use crate::helpers::simulation_store;

#[test]
fn test_readers_see_writes_from_other_threads() {
    let shared = SharedOptionStore::new(simulation_store());

    let writer = {
        let shared = shared.clone();
        thread::spawn(move || {
            shared.write(|store| store.set_option("/simulation/timestep", 0.02))
        })
    };
    writer.join().unwrap().unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let shared = shared.clone();
            thread::spawn(move || shared.read(|store| store.get::<f64>("/simulation/timestep")))
        })
        .collect();
    for reader in readers {
        assert_eq!(reader.join().unwrap(), Ok(0.02));
    }
}

#[test]
fn test_snapshot_is_independent() {
    let shared = SharedOptionStore::new(simulation_store());
    let snapshot = shared.snapshot();

    shared.write(|store| store.delete_node("/phase[0]")).unwrap();
    assert_eq!(snapshot.sibling_count("/phase"), 3);
    assert_eq!(shared.read(|store| store.sibling_count("/phase")), 2);
}
