use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use taxatree::catalog::Catalog;
use taxatree::domain::{MergeStrategy, TreeFormat};
use taxatree::error::TaxaError;
use taxatree::export::Exporter;
use taxatree::import::Importer;
use taxatree::store::Store;

fn fixture(name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn temp_store(temp: &tempfile::TempDir, name: &str) -> Store {
    let root = Utf8PathBuf::from_path_buf(temp.path().join(name)).unwrap();
    Store::new_with_path(root)
}

fn write(temp: &tempfile::TempDir, name: &str, content: &str) -> Utf8PathBuf {
    let path = Utf8PathBuf::from_path_buf(temp.path().join(name)).unwrap();
    std::fs::write(path.as_std_path(), content).unwrap();
    path
}

fn assert_wasp_lineage(catalog: &Catalog) {
    assert_eq!(catalog.len(), 13);
    assert_eq!(catalog.roots().len(), 1);
    let root = catalog.taxon(catalog.roots()[0]).unwrap();
    assert_eq!(root.name, "Animalia");
    let leaf = catalog.get_by_natural_key("vespa-crabro").unwrap();
    assert!(leaf.is_leaf());
    assert_eq!(catalog.level(leaf.id), 12);
    assert_eq!(catalog.ancestors(leaf.id)[0], root.id);
}

fn names_in_order(catalog: &Catalog) -> Vec<String> {
    catalog.taxa().iter().map(|taxon| taxon.name.clone()).collect()
}

#[test]
fn phyloxml_fixture_imports_with_metadata() {
    let temp = tempfile::tempdir().unwrap();
    let store = temp_store(&temp, "store");

    let summary = Importer::new()
        .import_file(&store, &fixture("wasps.xml"), TreeFormat::Phyloxml)
        .unwrap();
    assert_eq!(summary.roots, vec!["animalia".to_string()]);
    assert_eq!(summary.created, 13);

    let catalog = store.load().unwrap();
    assert_wasp_lineage(&catalog);
    for taxon in catalog.taxa() {
        assert_eq!(catalog.records_for(taxon.id).count(), 1, "{}", taxon.name);
        assert_eq!(catalog.citations_for(taxon.id).count(), 1, "{}", taxon.name);
    }

    let root = catalog.get_by_natural_key("animalia").unwrap();
    let points: Vec<_> = catalog.points_for(root.id).collect();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].place_name, "worldwide");
    assert_eq!((points[0].latitude, points[0].longitude), (1.0, -1.0));
    let vespa = catalog.get_by_natural_key("vespa").unwrap();
    assert_eq!(catalog.points_for(vespa.id).count(), 0);
    assert!(catalog.record_by_natural_key("202423", "itis", "animalia").is_ok());
}

#[test]
fn newick_round_trip_keeps_structure() {
    let temp = tempfile::tempdir().unwrap();
    let first = temp_store(&temp, "first");
    Importer::new()
        .import_file(&first, &fixture("wasps.xml"), TreeFormat::Phyloxml)
        .unwrap();
    let original = first.load().unwrap();

    let exported = Utf8PathBuf::from_path_buf(temp.path().join("wasps.tree")).unwrap();
    let clades = Exporter::new(&original)
        .root_by_slug("animalia")
        .unwrap()
        .save(TreeFormat::Newick, &exported)
        .unwrap();
    assert_eq!(clades, 13);

    let second = temp_store(&temp, "second");
    Importer::new()
        .import_file(&second, &exported, TreeFormat::Newick)
        .unwrap();
    let reimported = second.load().unwrap();
    assert_wasp_lineage(&reimported);
    assert_eq!(names_in_order(&reimported), names_in_order(&original));
}

#[test]
fn phyloxml_round_trip_keeps_metadata() {
    let temp = tempfile::tempdir().unwrap();
    let mut original = Catalog::new();
    let text = std::fs::read_to_string(fixture("wasps.xml").as_std_path()).unwrap();
    Importer::new()
        .import_str(&mut original, &text, TreeFormat::Phyloxml)
        .unwrap();

    let rendered = Exporter::new(&original)
        .root_by_slug("animalia")
        .unwrap()
        .render(TreeFormat::Phyloxml)
        .unwrap();
    let path = write(&temp, "wasps-out.xml", &rendered);

    let store = temp_store(&temp, "store");
    Importer::new()
        .import_file(&store, &path, TreeFormat::Phyloxml)
        .unwrap();
    let reimported = store.load().unwrap();
    assert_wasp_lineage(&reimported);
    let crabro = reimported.get_by_natural_key("vespa-crabro").unwrap();
    assert_eq!(crabro.rank.as_deref(), Some("species"));
    let citation = reimported.citations_for(crabro.id).next().unwrap();
    assert_eq!(citation.description, "Vespa crabro in Catalogue of Life");
    assert_eq!(citation.doi, "10.5962/bhl.title.554");
    let root = reimported.get_by_natural_key("animalia").unwrap();
    assert_eq!(reimported.points_for(root.id).count(), 1);
}

#[test]
fn nexus_round_trip_keeps_structure() {
    let mut original = Catalog::new();
    let text = std::fs::read_to_string(fixture("wasps.xml").as_std_path()).unwrap();
    Importer::new()
        .import_str(&mut original, &text, TreeFormat::Phyloxml)
        .unwrap();
    let nexus = Exporter::new(&original)
        .root_by_slug("animalia")
        .unwrap()
        .render(TreeFormat::Nexus)
        .unwrap();
    assert!(nexus.contains("Dimensions ntax=1;"));

    let mut reimported = Catalog::new();
    Importer::new()
        .import_str(&mut reimported, &nexus, TreeFormat::Nexus)
        .unwrap();
    assert_wasp_lineage(&reimported);
}

#[test]
fn conflict_leaves_store_untouched() {
    let temp = tempfile::tempdir().unwrap();
    let store = temp_store(&temp, "store");
    let path = write(&temp, "dupes.tree", "((Vespa,Polistes)Vespidae,Vespa)Hymenoptera;");

    let err = Importer::new()
        .import_file(&store, &path, TreeFormat::Newick)
        .unwrap_err();
    assert_matches!(err, TaxaError::MergeConflict { ref name } if name == "Vespa");
    assert!(!store.exists());
    assert!(store.load().unwrap().is_empty());
}

#[test]
fn conflict_with_existing_taxon_keeps_previous_import() {
    let temp = tempfile::tempdir().unwrap();
    let store = temp_store(&temp, "store");
    let first = write(&temp, "first.tree", "(Vespa,Polistes)Vespidae;");
    let second = write(&temp, "second.tree", "(Dolichovespula,Vespa)Vespinae;");

    let importer = Importer::new();
    importer.import_file(&store, &first, TreeFormat::Newick).unwrap();
    let err = importer
        .import_file(&store, &second, TreeFormat::Newick)
        .unwrap_err();
    assert_matches!(err, TaxaError::MergeConflict { .. });

    let catalog = store.load().unwrap();
    assert_eq!(catalog.len(), 3);
    assert!(catalog.taxon_by_slug("dolichovespula").is_none());
    assert!(catalog.taxon_by_slug("vespinae").is_none());
}

#[test]
fn relinking_the_same_file_reuses_nodes() {
    let temp = tempfile::tempdir().unwrap();
    let store = temp_store(&temp, "store");
    let importer = Importer::new().with_merge_strategy(MergeStrategy::Relink);
    let path = fixture("wasps.xml");

    importer.import_file(&store, &path, TreeFormat::Phyloxml).unwrap();
    let before = store.load().unwrap();
    let summary = importer.import_file(&store, &path, TreeFormat::Phyloxml).unwrap();
    assert_eq!(summary.created, 0);
    assert_eq!(summary.relinked, 13);

    let after = store.load().unwrap();
    assert_wasp_lineage(&after);
    assert_eq!(after.roots(), before.roots());
    assert_eq!(names_in_order(&after), names_in_order(&before));
    let root = after.get_by_natural_key("animalia").unwrap();
    assert_eq!(after.citations_for(root.id).count(), 1);
}

#[test]
fn relinking_moves_shared_nodes_to_latest_structure() {
    let mut catalog = Catalog::new();
    let importer = Importer::new().with_merge_strategy(MergeStrategy::Relink);
    importer
        .import_str(&mut catalog, "((Vespa)Vespinae)Vespidae;", TreeFormat::Newick)
        .unwrap();
    importer
        .import_str(&mut catalog, "(Vespa)Hornets;", TreeFormat::Newick)
        .unwrap();

    let vespa = catalog.get_by_natural_key("vespa").unwrap();
    let hornets = catalog.get_by_natural_key("hornets").unwrap();
    assert_eq!(vespa.parent, Some(hornets.id));
    let vespinae = catalog.get_by_natural_key("vespinae").unwrap();
    assert!(vespinae.is_leaf());
    assert_eq!(catalog.len(), 4);
}

#[test]
fn relinking_into_own_subtree_fails_and_rolls_back() {
    let mut catalog = Catalog::new();
    let importer = Importer::new().with_merge_strategy(MergeStrategy::Relink);
    importer
        .import_str(&mut catalog, "(Vespinae)Vespidae;", TreeFormat::Newick)
        .unwrap();
    let err = importer
        .import_str(&mut catalog, "((Vespidae)Extra)Vespidae;", TreeFormat::Newick)
        .unwrap_err();
    assert_matches!(err, TaxaError::InvalidMove { .. });
    assert_eq!(catalog.len(), 2);
    assert!(catalog.taxon_by_slug("extra").is_none());
}

#[test]
fn unnamed_clades_become_distinct_taxa() {
    let mut catalog = Catalog::new();
    Importer::new()
        .import_str(&mut catalog, "(,);", TreeFormat::Newick)
        .unwrap();
    let mut slugs: Vec<_> = catalog.taxa().iter().map(|taxon| taxon.slug.clone()).collect();
    slugs.sort();
    assert_eq!(slugs, vec!["none", "none-1", "none-2"]);

    Importer::new()
        .import_str(&mut catalog, "(,);", TreeFormat::Newick)
        .unwrap();
    assert_eq!(catalog.len(), 6);
    assert_eq!(catalog.roots().len(), 2);
}

#[test]
fn free_text_distribution_is_appended() {
    let mut catalog = Catalog::new();
    let xml = r#"<phyloxml>
  <phylogeny rooted="true">
    <clade>
      <name>Vespa crabro</name>
      <distribution><desc>Europe</desc></distribution>
      <distribution><desc>North America</desc></distribution>
    </clade>
  </phylogeny>
</phyloxml>"#;
    Importer::new()
        .import_str(&mut catalog, xml, TreeFormat::Phyloxml)
        .unwrap();
    let taxon = catalog.get_by_natural_key("vespa-crabro").unwrap();
    assert_eq!(taxon.distribution, "Europe North America");
    assert_eq!(catalog.points_for(taxon.id).count(), 0);
}

#[test]
fn parse_errors_leave_store_untouched() {
    let temp = tempfile::tempdir().unwrap();
    let store = temp_store(&temp, "store");
    let path = write(&temp, "broken.tree", "(Vespa,Polistes");
    let err = Importer::new()
        .import_file(&store, &path, TreeFormat::Newick)
        .unwrap_err();
    assert_matches!(err, TaxaError::Parse(_));
    assert!(!store.exists());
}

#[test]
fn missing_export_root_is_unsupported() {
    let catalog = Catalog::new();
    let exporter = Exporter::new(&catalog);
    assert_matches!(
        exporter.render(TreeFormat::Phyloxml),
        Err(TaxaError::UnsupportedAssignment(_))
    );
    assert_matches!(
        Exporter::new(&catalog).root_by_slug("animalia"),
        Err(TaxaError::TaxonNotFound(_))
    );
}
