//! Realizes parsed phylogenies as taxa in the catalog.
//!
//! Every clade becomes (or, under [`MergeStrategy::Relink`], reuses) one
//! taxon and is then moved under the taxon of its parent clade. A whole
//! import runs as a single unit of work: any error leaves the catalog as it
//! was before the call.

use camino::Utf8Path;
use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::clade::{Clade, Phylogeny};
use crate::domain::{MergeStrategy, TreeFormat, validate_rank};
use crate::error::TaxaError;
use crate::formats;
use crate::model::{DEFAULT_BRANCH_LENGTH, NewTaxon, TaxonId, TaxonomyDatabase};
use crate::slug::{slugify, slugify_unique};
use crate::store::Store;

/// Name given to clades that carry neither a name nor a scientific name.
pub const FALLBACK_NAME: &str = "none";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Slugs of the taxa the imported trees are rooted on.
    pub roots: Vec<String>,
    pub created: usize,
    pub relinked: usize,
}

#[derive(Debug, Clone)]
pub struct Importer {
    merge_strategy: MergeStrategy,
    default_branch_length: f64,
    databases: Vec<TaxonomyDatabase>,
}

impl Default for Importer {
    fn default() -> Self {
        Self::new()
    }
}

impl Importer {
    pub fn new() -> Self {
        Self {
            merge_strategy: MergeStrategy::default(),
            default_branch_length: DEFAULT_BRANCH_LENGTH,
            databases: Vec::new(),
        }
    }

    pub fn with_merge_strategy(mut self, merge_strategy: MergeStrategy) -> Self {
        self.merge_strategy = merge_strategy;
        self
    }

    pub fn with_default_branch_length(mut self, branch_length: f64) -> Self {
        self.default_branch_length = branch_length;
        self
    }

    /// Databases created (if absent) before any clade is imported.
    pub fn with_databases(mut self, databases: Vec<TaxonomyDatabase>) -> Self {
        self.databases = databases;
        self
    }

    pub fn merge_strategy(&self) -> MergeStrategy {
        self.merge_strategy
    }

    /// Parses `path` and imports it into the store in one transaction.
    pub fn import_file(
        &self,
        store: &Store,
        path: &Utf8Path,
        format: TreeFormat,
    ) -> Result<ImportSummary, TaxaError> {
        let input = std::fs::read_to_string(path.as_std_path())
            .map_err(|err| TaxaError::Filesystem(format!("read {path}: {err}")))?;
        let trees = formats::read_str(format, &input)?;
        let summary = store.transaction(|catalog| self.import_phylogenies(catalog, &trees))?;
        info!(
            %path,
            %format,
            created = summary.created,
            relinked = summary.relinked,
            "phylogeny imported"
        );
        Ok(summary)
    }

    /// Parses `input` and imports it into `catalog`.
    pub fn import_str(
        &self,
        catalog: &mut Catalog,
        input: &str,
        format: TreeFormat,
    ) -> Result<ImportSummary, TaxaError> {
        let trees = formats::read_str(format, input)?;
        self.import_phylogenies(catalog, &trees)
    }

    /// Imports every tree as a root of the forest. All or nothing.
    pub fn import_phylogenies(
        &self,
        catalog: &mut Catalog,
        trees: &[Phylogeny],
    ) -> Result<ImportSummary, TaxaError> {
        catalog.atomically(|working| {
            for database in &self.databases {
                working.get_or_create_database(&database.name, &database.slug, &database.url);
            }
            let mut summary = ImportSummary::default();
            for tree in trees {
                let root = self.import_clade(working, &tree.root, None, &mut summary)?;
                summary.roots.push(working.require(root)?.slug.clone());
            }
            Ok(summary)
        })
    }

    /// Creates or reuses the taxon for `clade`, moves it under `parent` and
    /// recurses into the child clades in order.
    pub fn import_clade(
        &self,
        catalog: &mut Catalog,
        clade: &Clade,
        parent: Option<TaxonId>,
        summary: &mut ImportSummary,
    ) -> Result<TaxonId, TaxaError> {
        let name = effective_name(clade);
        let key = slugify(&name);

        let id = if name == FALLBACK_NAME || key.is_empty() {
            let slug = slugify_unique(FALLBACK_NAME, |candidate| catalog.slug_exists(candidate));
            self.create_taxon(catalog, clade, name, slug, summary)?
        } else if let Some(existing) = catalog.taxon_by_slug(&key) {
            match self.merge_strategy {
                MergeStrategy::Abort => {
                    return Err(TaxaError::MergeConflict {
                        name: existing.name.clone(),
                    });
                }
                MergeStrategy::Relink => {
                    debug!(slug = %existing.slug, "relinking existing taxon");
                    summary.relinked += 1;
                    existing.id
                }
            }
        } else {
            self.create_taxon(catalog, clade, name, key, summary)?
        };

        catalog.move_to(id, parent)?;

        for child in &clade.clades {
            self.import_clade(catalog, child, Some(id), summary)?;
        }
        Ok(id)
    }

    fn create_taxon(
        &self,
        catalog: &mut Catalog,
        clade: &Clade,
        name: String,
        slug: String,
        summary: &mut ImportSummary,
    ) -> Result<TaxonId, TaxaError> {
        let branch_length = clade.branch_length.unwrap_or(self.default_branch_length);
        let mut new = NewTaxon::new(name, slug).with_branch_length(Some(branch_length));
        if let Some(rank) = clade_rank(clade) {
            new = new.with_rank(rank);
        }
        let id = catalog.insert_taxon(new)?;
        import_metadata(catalog, id, clade)?;
        summary.created += 1;
        debug!(slug = %catalog.require(id)?.slug, "created taxon");
        Ok(id)
    }
}

/// The clade's own name, else the first taxonomy's scientific name, else
/// [`FALLBACK_NAME`].
pub fn effective_name(clade: &Clade) -> String {
    fn present(value: Option<&str>) -> Option<&str> {
        value.map(str::trim).filter(|value| !value.is_empty())
    }
    present(clade.name.as_deref())
        .or_else(|| {
            present(
                clade
                    .taxonomies
                    .first()
                    .and_then(|taxonomy| taxonomy.scientific_name.as_deref()),
            )
        })
        .unwrap_or(FALLBACK_NAME)
        .to_string()
}

/// First taxonomy rank that belongs to the rank vocabulary.
fn clade_rank(clade: &Clade) -> Option<String> {
    clade
        .taxonomies
        .iter()
        .filter_map(|taxonomy| taxonomy.rank.as_deref())
        .find_map(|rank| match validate_rank(rank) {
            Ok(rank) => Some(rank),
            Err(_) => {
                debug!(rank, "ignoring unknown rank");
                None
            }
        })
}

/// Imports taxonomy records, distributions and references of a freshly
/// created taxon.
fn import_metadata(catalog: &mut Catalog, id: TaxonId, clade: &Clade) -> Result<(), TaxaError> {
    for taxonomy in &clade.taxonomies {
        let Some(taxonomy_id) = &taxonomy.id else {
            continue;
        };
        let provider = match taxonomy_id.provider.as_deref() {
            Some(provider) if !provider.is_empty() && !taxonomy_id.value.is_empty() => provider,
            _ => continue,
        };
        let slug = slugify(provider);
        catalog.get_or_create_database(provider, &slug, "");
        catalog.add_record(
            id,
            &slug,
            &taxonomy_id.value,
            taxonomy.uri.as_deref().unwrap_or_default(),
        )?;
    }

    for distribution in &clade.distributions {
        let desc = distribution.desc.as_deref().unwrap_or_default();
        if distribution.points.is_empty() {
            if !desc.is_empty() {
                catalog.update_taxon(id, |taxon| {
                    if taxon.distribution.is_empty() {
                        taxon.distribution = desc.to_string();
                    } else {
                        taxon.distribution = format!("{} {desc}", taxon.distribution);
                    }
                })?;
            }
            continue;
        }
        for point in &distribution.points {
            catalog.add_point(id, point.lat, point.long, desc)?;
        }
    }

    for reference in &clade.references {
        catalog.add_citation(
            reference.desc.as_deref().unwrap_or_default(),
            "",
            reference.doi.as_deref().unwrap_or_default(),
            &[id],
        )?;
    }
    Ok(())
}
