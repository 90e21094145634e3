use anyl_core::AppError;
use anyl_core::fingerprint::fingerprint;
use anyl_test::Sandbox;
use std::collections::HashSet;
use std::fs;

#[test]
fn test_registry_lifecycle() {
    let sandbox = Sandbox::new();
    let mut registry = sandbox.registry();
    let mut issued = HashSet::new();

    // 1. Import two games
    let a = sandbox.game("A.exe", b"game a");
    let b = sandbox.game("index.html", b"<html>b</html>");
    let id_a = registry.add(&a, None).unwrap();
    let id_b = registry.add(&b, Some("Browser Game")).unwrap();
    assert!(issued.insert(id_a.clone()));
    assert!(issued.insert(id_b.clone()));

    // 2. Rename, select, repath
    registry.rename(&id_a, "Game A").unwrap();
    registry.select(&id_a).unwrap();
    let moved = sandbox.game("A-moved.exe", b"game a, moved");
    registry.repath(&id_a, &moved).unwrap();
    assert_eq!(
        registry.get(&id_a).unwrap().fingerprint,
        fingerprint(&moved).unwrap()
    );

    // 3. Everything survives a restart
    let reopened = sandbox.registry();
    assert_eq!(reopened.list(), registry.list());
    assert_eq!(reopened.last_selected_id(), Some(&id_a));

    // 4. Remove the selected game
    registry.remove(&id_a).unwrap();
    assert!(registry.last_selected_id().is_none());
    assert!(matches!(
        registry.select(&id_a),
        Err(AppError::NotFound { .. })
    ));

    // 5. New ids never reuse old ones, even after a restart
    let mut reopened = sandbox.registry();
    assert_eq!(reopened.len(), 1);
    let c = sandbox.game("C.exe", b"game c");
    assert!(issued.insert(reopened.add(&c, None).unwrap()));
}

#[test]
fn test_document_shape() {
    let sandbox = Sandbox::new();
    let mut registry = sandbox.registry();
    let path = sandbox.game("A.exe", b"bytes");
    let id = registry.add(&path, None).unwrap();
    registry.select(&id).unwrap();

    let raw = fs::read_to_string(sandbox.data_file("games.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let entry = &json["entries"][0];
    assert_eq!(entry["id"], id.as_str());
    assert_eq!(entry["name"], "A");
    assert_eq!(entry["fingerprint"].as_str().unwrap().len(), 64);
    assert_eq!(json["lastSelectedId"], id.as_str());
}

#[test]
fn test_save_load_is_byte_stable() {
    let sandbox = Sandbox::new();
    let mut registry = sandbox.registry();
    for (file, bytes) in [("x.exe", "x"), ("y.html", "y"), ("z.exe", "z")] {
        registry.add(&sandbox.game(file, bytes.as_bytes()), None).unwrap();
    }

    let store = sandbox.store();
    store.save(&store.load().unwrap()).unwrap();
    let first = fs::read(store.document_path()).unwrap();
    store.save(&store.load().unwrap()).unwrap();
    let second = fs::read(store.document_path()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_corrupt_store_is_reported_not_repaired() {
    let sandbox = Sandbox::new();
    let mut registry = sandbox.registry();
    registry.add(&sandbox.game("A.exe", b"a"), None).unwrap();

    let document = sandbox.data_file("games.json");
    fs::write(&document, "{\"entries\": [ {\"id\": ").unwrap();

    match anyl_core::GameRegistry::open(sandbox.store()) {
        Err(AppError::CorruptStore { path, .. }) => assert_eq!(path, document),
        other => panic!("expected CorruptStore, got {:?}", other.map(|r| r.len())),
    }
    assert!(registry.reload().is_err());
    assert_eq!(registry.len(), 1);
    assert_eq!(
        fs::read_to_string(&document).unwrap(),
        "{\"entries\": [ {\"id\": "
    );

    // Only an explicit discard clears it.
    sandbox.store().discard().unwrap();
    assert!(sandbox.registry().is_empty());
}
