use assert_matches::assert_matches;

use taxatree::config::{Config, ConfigLoader, DatabaseEntry, DatabaseEntryObject};
use taxatree::domain::{MergeStrategy, TreeFormat};
use taxatree::error::TaxaError;

#[test]
fn parse_config_entries() {
    let config = Config {
        schema_version: Some(2),
        store: Some("/tmp/taxa".to_string()),
        default_format: Some(TreeFormat::Newick),
        default_branch_length: Some(0.5),
        merge_strategy: Some(MergeStrategy::Relink),
        taxonomy_databases: vec![
            DatabaseEntry::Shorthand("ITIS".to_string()),
            DatabaseEntry::Detailed(DatabaseEntryObject {
                name: "NCBI Taxonomy".to_string(),
                slug: Some("ncbi".to_string()),
                url: Some("https://www.ncbi.nlm.nih.gov/taxonomy".to_string()),
            }),
        ],
    };

    let resolved = ConfigLoader::resolve_config(config).unwrap();
    assert_eq!(resolved.schema_version, 2);
    assert_eq!(resolved.store, "/tmp/taxa");
    assert_eq!(resolved.default_format, TreeFormat::Newick);
    assert_eq!(resolved.default_branch_length, 0.5);
    assert_eq!(resolved.merge_strategy, MergeStrategy::Relink);
    assert_eq!(resolved.taxonomy_databases[0].slug, "itis");
    assert_eq!(resolved.taxonomy_databases[1].slug, "ncbi");
    assert_eq!(
        resolved.taxonomy_databases[1].url,
        "https://www.ncbi.nlm.nih.gov/taxonomy"
    );
}

#[test]
fn reads_json_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("taxatree.json");
    std::fs::write(
        &path,
        r#"{
  "schema_version": 1,
  "default_format": "nexus",
  "merge_strategy": "abort",
  "taxonomy_databases": ["ITIS", {"name": "Catalogue of Life", "url": "https://www.catalogueoflife.org/"}]
}"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(path.to_str()).unwrap();
    assert_eq!(resolved.default_format, TreeFormat::Nexus);
    assert_eq!(resolved.default_branch_length, 1.0);
    assert_eq!(resolved.taxonomy_databases.len(), 2);
    assert_eq!(resolved.taxonomy_databases[1].slug, "catalogue-of-life");
}

#[test]
fn explicit_missing_file_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("absent.json");
    assert_matches!(
        ConfigLoader::resolve(path.to_str()),
        Err(TaxaError::ConfigRead(_))
    );
}

#[test]
fn invalid_values_are_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("taxatree.json");
    std::fs::write(&path, r#"{"merge_strategy": "squash"}"#).unwrap();
    assert_matches!(
        ConfigLoader::resolve(path.to_str()),
        Err(TaxaError::ConfigParse(_))
    );

    let config = Config {
        default_branch_length: Some(-1.0),
        ..Config::default()
    };
    assert_matches!(
        ConfigLoader::resolve_config(config),
        Err(TaxaError::ConfigParse(_))
    );
}
