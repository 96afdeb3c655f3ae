use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use taxatree::error::TaxaError;
use taxatree::model::NewTaxon;
use taxatree::store::{DEFAULT_STORE_DIR, Store};

fn temp_store(temp: &tempfile::TempDir) -> Store {
    Store::new_with_path(Utf8PathBuf::from_path_buf(temp.path().join(DEFAULT_STORE_DIR)).unwrap())
}

#[test]
fn layout_paths() {
    let store = Store::new().unwrap();
    assert!(store.root().ends_with(DEFAULT_STORE_DIR));
    assert!(store.catalog_path().ends_with("catalog.json"));
}

#[test]
fn missing_catalog_loads_empty() {
    let temp = tempfile::tempdir().unwrap();
    let store = temp_store(&temp);
    assert!(!store.exists());
    assert!(store.load().unwrap().is_empty());
}

#[test]
fn transaction_saves_on_success() {
    let temp = tempfile::tempdir().unwrap();
    let store = temp_store(&temp);
    let id = store
        .transaction(|catalog| catalog.insert_taxon(NewTaxon::new("Vespa crabro", "vespa-crabro")))
        .unwrap();

    let catalog = store.load().unwrap();
    let taxon = catalog.taxon(id).unwrap();
    assert_eq!(taxon.slug, "vespa-crabro");
    assert_eq!(taxon.branch_length, Some(1.0));
    assert_eq!(catalog.roots(), &[id]);
}

#[test]
fn failed_transaction_keeps_previous_state() {
    let temp = tempfile::tempdir().unwrap();
    let store = temp_store(&temp);
    store
        .transaction(|catalog| catalog.insert_taxon(NewTaxon::new("Vespa", "vespa")))
        .unwrap();
    let before = std::fs::read_to_string(store.catalog_path().as_std_path()).unwrap();

    let err = store
        .transaction(|catalog| {
            catalog.insert_taxon(NewTaxon::new("Polistes", "polistes"))?;
            catalog.insert_taxon(NewTaxon::new("Vespa", "vespa"))
        })
        .unwrap_err();
    assert_matches!(err, TaxaError::DuplicateSlug(_));

    let after = std::fs::read_to_string(store.catalog_path().as_std_path()).unwrap();
    assert_eq!(before, after);
    assert_eq!(store.load().unwrap().len(), 1);
}

#[test]
fn corrupt_catalog_is_reported() {
    let temp = tempfile::tempdir().unwrap();
    let store = temp_store(&temp);
    store.ensure_root().unwrap();
    std::fs::write(store.catalog_path().as_std_path(), b"{not json").unwrap();
    assert_matches!(store.load(), Err(TaxaError::StoreCorrupt(_)));
}

#[test]
fn clear_removes_store_directory() {
    let temp = tempfile::tempdir().unwrap();
    let store = temp_store(&temp);
    assert!(!store.clear().unwrap());
    store
        .transaction(|catalog| catalog.insert_taxon(NewTaxon::new("Vespa", "vespa")))
        .unwrap();
    assert!(store.clear().unwrap());
    assert!(!store.root().as_std_path().exists());
}
