//! Builds a [`Phylogeny`] from a subtree of the catalog and writes it out.

use camino::Utf8Path;
use tracing::info;

use crate::catalog::Catalog;
use crate::clade::{Clade, CladeDate, Distribution, Phylogeny, Point, Reference, Taxonomy, TaxonomyId};
use crate::domain::{TreeFormat, validate_rank};
use crate::error::TaxaError;
use crate::formats;
use crate::model::{DEFAULT_BRANCH_LENGTH, Taxon, TaxonId};
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct Exporter<'a> {
    catalog: &'a Catalog,
    root: Option<TaxonId>,
    default_branch_length: f64,
    rank_filter: Option<String>,
}

impl<'a> Exporter<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            root: None,
            default_branch_length: DEFAULT_BRANCH_LENGTH,
            rank_filter: None,
        }
    }

    pub fn with_default_branch_length(mut self, branch_length: f64) -> Self {
        self.default_branch_length = branch_length;
        self
    }

    /// Keeps only descendants of the given rank; the root is always kept.
    pub fn with_rank_filter(mut self, rank: &str) -> Result<Self, TaxaError> {
        self.rank_filter = Some(validate_rank(rank)?);
        Ok(self)
    }

    /// Assigns the export root. Only taxa stored in the catalog qualify.
    pub fn set_root(&mut self, id: TaxonId) -> Result<(), TaxaError> {
        if self.catalog.taxon(id).is_none() {
            return Err(TaxaError::UnsupportedAssignment(format!(
                "{id} is not a taxon of this catalog"
            )));
        }
        self.root = Some(id);
        Ok(())
    }

    pub fn with_root(mut self, id: TaxonId) -> Result<Self, TaxaError> {
        self.set_root(id)?;
        Ok(self)
    }

    pub fn root_by_slug(mut self, slug: &str) -> Result<Self, TaxaError> {
        let id = self.catalog.get_by_natural_key(slug)?.id;
        self.set_root(id)?;
        Ok(self)
    }

    pub fn root(&self) -> Option<&Taxon> {
        self.root.and_then(|id| self.catalog.taxon(id))
    }

    pub fn phylogeny(&self) -> Result<Phylogeny, TaxaError> {
        let root = self.root().ok_or_else(|| {
            TaxaError::UnsupportedAssignment("no export root assigned".to_string())
        })?;
        let clade = self.clade_for_taxon(root.id)?;
        Ok(Phylogeny::new(clade).with_name(root.name.clone()))
    }

    pub fn render(&self, format: TreeFormat) -> Result<String, TaxaError> {
        let phylogeny = self.phylogeny()?;
        formats::write_str(format, std::slice::from_ref(&phylogeny))
    }

    pub fn save(&self, format: TreeFormat, path: &Utf8Path) -> Result<usize, TaxaError> {
        let phylogeny = self.phylogeny()?;
        let clades = phylogeny.root.count();
        let text = formats::write_str(format, std::slice::from_ref(&phylogeny))?;
        Store::write_bytes_atomic(path, text.as_bytes())?;
        info!(%path, %format, clades, "phylogeny exported");
        Ok(clades)
    }

    /// Marshals `id` and its retained descendants into a clade tree.
    pub fn clade_for_taxon(&self, id: TaxonId) -> Result<Clade, TaxaError> {
        let taxon = self.catalog.require(id)?;
        let mut clade = Clade::named(taxon.name.clone())
            .with_branch_length(taxon.branch_length.unwrap_or(self.default_branch_length));

        if taxon.appearance_date.is_set() {
            let date = &taxon.appearance_date;
            clade.date = Some(CladeDate {
                unit: Some(date.unit.code().to_string()),
                desc: (!date.annotation.is_empty()).then(|| date.annotation.clone()),
                minimum: date.min.map(f64::from),
                maximum: date.max.map(f64::from),
            });
        }

        for record in self.catalog.records_for(id) {
            let database = self.catalog.database(&record.database);
            let provider = database
                .map(|database| database.name.clone())
                .unwrap_or_else(|| record.database.clone());
            let uri = if record.url.is_empty() {
                database.map(|database| database.url.clone()).unwrap_or_default()
            } else {
                record.url.clone()
            };
            clade.taxonomies.push(Taxonomy {
                id: Some(TaxonomyId {
                    value: record.record_id.clone(),
                    provider: Some(provider),
                }),
                uri: (!uri.is_empty()).then_some(uri),
                ..Taxonomy::default()
            });
        }

        if let Some(rank) = &taxon.rank {
            match clade.taxonomies.first_mut() {
                Some(taxonomy) => taxonomy.rank = Some(rank.clone()),
                None => clade.taxonomies.push(Taxonomy {
                    rank: Some(rank.clone()),
                    ..Taxonomy::default()
                }),
            }
        }

        if !taxon.distribution.is_empty() {
            clade.distributions.push(Distribution {
                desc: Some(taxon.distribution.clone()),
                points: Vec::new(),
            });
        }
        for point in self.catalog.points_for(id) {
            clade.distributions.push(Distribution {
                desc: (!point.place_name.is_empty()).then(|| point.place_name.clone()),
                points: vec![Point::wgs84(point.latitude, point.longitude)],
            });
        }

        for citation in self.catalog.citations_for(id) {
            let desc = [citation.description.as_str(), citation.url.as_str()]
                .into_iter()
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            clade.references.push(Reference {
                desc: (!desc.is_empty()).then_some(desc),
                doi: (!citation.doi.is_empty()).then(|| citation.doi.clone()),
            });
        }

        clade.clades = self.retained_children(id)?;
        Ok(clade)
    }

    /// Children of `id` in stored order. Under a rank filter, a child of a
    /// different rank is replaced by its own retained children.
    fn retained_children(&self, id: TaxonId) -> Result<Vec<Clade>, TaxaError> {
        let mut clades = Vec::new();
        for child in self.catalog.children(id) {
            let keep = match &self.rank_filter {
                None => true,
                Some(rank) => self.catalog.require(*child)?.rank.as_deref() == Some(rank.as_str()),
            };
            if keep {
                clades.push(self.clade_for_taxon(*child)?);
            } else {
                clades.extend(self.retained_children(*child)?);
            }
        }
        Ok(clades)
    }
}
