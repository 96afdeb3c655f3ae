//! In-memory relational tables for taxa and their metadata.
//!
//! Taxa form a forest stored as an adjacency list: every taxon keeps its
//! parent and an ordered list of children, and the catalog keeps the ordered
//! list of roots. Sibling order is insertion order. The catalog never deletes
//! taxa; reshaping happens only through [`Catalog::move_to`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::TaxaError;
use crate::model::{
    Citation, CitationId, DistributionPoint, NewTaxon, Taxon, TaxonId, TaxonomyDatabase,
    TaxonomyRecord,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    next_taxon_id: u64,
    #[serde(default)]
    next_citation_id: u64,
    #[serde(default)]
    taxa: BTreeMap<TaxonId, Taxon>,
    #[serde(default)]
    roots: Vec<TaxonId>,
    #[serde(default)]
    databases: Vec<TaxonomyDatabase>,
    #[serde(default)]
    records: Vec<TaxonomyRecord>,
    #[serde(default)]
    points: Vec<DistributionPoint>,
    #[serde(default)]
    citations: Vec<Citation>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.taxa.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taxa.is_empty()
    }

    /// Runs `f` against a working copy and keeps the result only on success.
    pub fn atomically<T, F>(&mut self, f: F) -> Result<T, TaxaError>
    where
        F: FnOnce(&mut Catalog) -> Result<T, TaxaError>,
    {
        let mut working = self.clone();
        let value = f(&mut working)?;
        *self = working;
        Ok(value)
    }

    // ------------------------------------------------------------------
    // taxa
    // ------------------------------------------------------------------

    /// Inserts a taxon as the last root of the forest.
    pub fn insert_taxon(&mut self, new: NewTaxon) -> Result<TaxonId, TaxaError> {
        if self.slug_exists(&new.slug) {
            return Err(TaxaError::DuplicateSlug(new.slug));
        }
        self.next_taxon_id += 1;
        let id = TaxonId::new(self.next_taxon_id);
        let now = chrono::Utc::now().to_rfc3339();
        let taxon = Taxon {
            id,
            name: new.name,
            slug: new.slug,
            rank: new.rank,
            author: String::new(),
            year_of_description: None,
            common_name: String::new(),
            tagline: String::new(),
            description: String::new(),
            ecology: String::new(),
            distribution: String::new(),
            appearance_date: Default::default(),
            color: String::new(),
            body_length: Default::default(),
            branch_length: new.branch_length,
            parent: None,
            children: Vec::new(),
            date_created: now.clone(),
            date_modified: now,
        };
        self.taxa.insert(id, taxon);
        self.roots.push(id);
        Ok(id)
    }

    pub fn taxon(&self, id: TaxonId) -> Option<&Taxon> {
        self.taxa.get(&id)
    }

    pub fn require(&self, id: TaxonId) -> Result<&Taxon, TaxaError> {
        self.taxa
            .get(&id)
            .ok_or_else(|| TaxaError::TaxonNotFound(id.to_string()))
    }

    /// Applies `edit` to a stored taxon and bumps its modification time.
    pub fn update_taxon<F>(&mut self, id: TaxonId, edit: F) -> Result<(), TaxaError>
    where
        F: FnOnce(&mut Taxon),
    {
        let taxon = self
            .taxa
            .get_mut(&id)
            .ok_or_else(|| TaxaError::TaxonNotFound(id.to_string()))?;
        edit(taxon);
        taxon.date_modified = chrono::Utc::now().to_rfc3339();
        Ok(())
    }

    pub fn taxon_by_slug(&self, slug: &str) -> Option<&Taxon> {
        self.taxa.values().find(|taxon| taxon.slug == slug)
    }

    pub fn get_by_natural_key(&self, slug: &str) -> Result<&Taxon, TaxaError> {
        self.taxon_by_slug(slug)
            .ok_or_else(|| TaxaError::TaxonNotFound(slug.to_string()))
    }

    pub fn slug_exists(&self, slug: &str) -> bool {
        self.taxon_by_slug(slug).is_some()
    }

    /// All taxa in forest order (roots in order, each tree depth-first).
    pub fn taxa(&self) -> Vec<&Taxon> {
        self.roots
            .iter()
            .flat_map(|root| self.descendants(*root))
            .filter_map(|id| self.taxa.get(&id))
            .collect()
    }

    // ------------------------------------------------------------------
    // tree primitives
    // ------------------------------------------------------------------

    pub fn roots(&self) -> &[TaxonId] {
        &self.roots
    }

    pub fn children(&self, id: TaxonId) -> &[TaxonId] {
        self.taxa
            .get(&id)
            .map(|taxon| taxon.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, id: TaxonId) -> Option<TaxonId> {
        self.taxa.get(&id).and_then(|taxon| taxon.parent)
    }

    pub fn is_root(&self, id: TaxonId) -> bool {
        self.taxa.get(&id).map(Taxon::is_root).unwrap_or(false)
    }

    pub fn is_leaf(&self, id: TaxonId) -> bool {
        self.taxa.get(&id).map(Taxon::is_leaf).unwrap_or(false)
    }

    /// `id` and everything below it, depth-first pre-order.
    pub fn descendants(&self, id: TaxonId) -> Vec<TaxonId> {
        let mut ordered = Vec::new();
        if !self.taxa.contains_key(&id) {
            return ordered;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            ordered.push(current);
            for child in self.children(current).iter().rev() {
                stack.push(*child);
            }
        }
        ordered
    }

    /// Ancestors from the root down to the direct parent.
    pub fn ancestors(&self, id: TaxonId) -> Vec<TaxonId> {
        let mut chain = Vec::new();
        let mut current = self.parent(id);
        while let Some(parent) = current {
            chain.push(parent);
            current = self.parent(parent);
        }
        chain.reverse();
        chain
    }

    pub fn level(&self, id: TaxonId) -> usize {
        self.ancestors(id).len()
    }

    pub fn is_descendant_of(&self, id: TaxonId, ancestor: TaxonId) -> bool {
        let mut current = self.parent(id);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parent(parent);
        }
        false
    }

    /// Moves `id` (with its subtree) to the end of `parent`'s children, or to
    /// the end of the root list when `parent` is `None`.
    pub fn move_to(&mut self, id: TaxonId, parent: Option<TaxonId>) -> Result<(), TaxaError> {
        let taxon = self.require(id)?;
        let old_parent = taxon.parent;
        if let Some(target) = parent {
            let target_taxon = self.require(target)?;
            if target == id || self.is_descendant_of(target, id) {
                return Err(TaxaError::InvalidMove {
                    taxon: self.taxa[&id].slug.clone(),
                    parent: target_taxon.slug.clone(),
                });
            }
        }

        match old_parent {
            Some(old) => {
                if let Some(old_taxon) = self.taxa.get_mut(&old) {
                    old_taxon.children.retain(|child| *child != id);
                }
            }
            None => self.roots.retain(|root| *root != id),
        }

        match parent {
            Some(target) => {
                if let Some(target_taxon) = self.taxa.get_mut(&target) {
                    target_taxon.children.push(id);
                }
            }
            None => self.roots.push(id),
        }

        self.update_taxon(id, |taxon| taxon.parent = parent)
    }

    // ------------------------------------------------------------------
    // taxonomy databases and records
    // ------------------------------------------------------------------

    pub fn databases(&self) -> &[TaxonomyDatabase] {
        &self.databases
    }

    pub fn database(&self, slug: &str) -> Option<&TaxonomyDatabase> {
        self.databases.iter().find(|database| database.slug == slug)
    }

    /// Returns the database with `slug`, creating it when absent.
    pub fn get_or_create_database(&mut self, name: &str, slug: &str, url: &str) -> &TaxonomyDatabase {
        let position = match self.databases.iter().position(|db| db.slug == slug) {
            Some(position) => position,
            None => {
                self.databases.push(TaxonomyDatabase {
                    name: name.to_string(),
                    slug: slug.to_string(),
                    url: url.to_string(),
                });
                self.databases.len() - 1
            }
        };
        &self.databases[position]
    }

    /// Adds a record unless the (taxon, database, record id) triple exists.
    /// Returns whether a record was created.
    pub fn add_record(
        &mut self,
        taxon: TaxonId,
        database: &str,
        record_id: &str,
        url: &str,
    ) -> Result<bool, TaxaError> {
        self.require(taxon)?;
        if self.database(database).is_none() {
            return Err(TaxaError::TaxonNotFound(format!("database {database}")));
        }
        let exists = self.records.iter().any(|record| {
            record.taxon == taxon && record.database == database && record.record_id == record_id
        });
        if exists {
            return Ok(false);
        }
        self.records.push(TaxonomyRecord {
            taxon,
            database: database.to_string(),
            record_id: record_id.to_string(),
            url: url.to_string(),
        });
        Ok(true)
    }

    pub fn records_for(&self, taxon: TaxonId) -> impl Iterator<Item = &TaxonomyRecord> {
        self.records.iter().filter(move |record| record.taxon == taxon)
    }

    pub fn record_by_natural_key(
        &self,
        record_id: &str,
        database_slug: &str,
        taxon_slug: &str,
    ) -> Result<&TaxonomyRecord, TaxaError> {
        let taxon = self.get_by_natural_key(taxon_slug)?;
        self.records
            .iter()
            .find(|record| {
                record.taxon == taxon.id
                    && record.database == database_slug
                    && record.record_id == record_id
            })
            .ok_or_else(|| {
                TaxaError::TaxonNotFound(format!("{record_id}@{database_slug} for {taxon_slug}"))
            })
    }

    // ------------------------------------------------------------------
    // distribution points
    // ------------------------------------------------------------------

    pub fn add_point(
        &mut self,
        taxon: TaxonId,
        latitude: f64,
        longitude: f64,
        place_name: &str,
    ) -> Result<(), TaxaError> {
        self.require(taxon)?;
        self.points.push(DistributionPoint {
            taxon,
            latitude,
            longitude,
            place_name: place_name.to_string(),
        });
        Ok(())
    }

    pub fn points_for(&self, taxon: TaxonId) -> impl Iterator<Item = &DistributionPoint> {
        self.points.iter().filter(move |point| point.taxon == taxon)
    }

    pub fn point_by_natural_key(
        &self,
        latitude: f64,
        longitude: f64,
        taxon_slug: &str,
    ) -> Result<&DistributionPoint, TaxaError> {
        let taxon = self.get_by_natural_key(taxon_slug)?;
        self.points
            .iter()
            .find(|point| {
                point.taxon == taxon.id && point.latitude == latitude && point.longitude == longitude
            })
            .ok_or_else(|| {
                TaxaError::TaxonNotFound(format!("point {latitude},{longitude} for {taxon_slug}"))
            })
    }

    // ------------------------------------------------------------------
    // citations
    // ------------------------------------------------------------------

    pub fn add_citation(
        &mut self,
        description: &str,
        url: &str,
        doi: &str,
        taxa: &[TaxonId],
    ) -> Result<CitationId, TaxaError> {
        for taxon in taxa {
            self.require(*taxon)?;
        }
        self.next_citation_id += 1;
        let id = CitationId::new(self.next_citation_id);
        self.citations.push(Citation {
            id,
            description: description.to_string(),
            url: url.to_string(),
            doi: doi.to_string(),
            taxa: taxa.to_vec(),
        });
        Ok(id)
    }

    /// Links an existing citation to one more taxon.
    pub fn cite(&mut self, citation: CitationId, taxon: TaxonId) -> Result<(), TaxaError> {
        self.require(taxon)?;
        let entry = self
            .citations
            .iter_mut()
            .find(|entry| entry.id == citation)
            .ok_or_else(|| TaxaError::TaxonNotFound(format!("citation {citation:?}")))?;
        if !entry.taxa.contains(&taxon) {
            entry.taxa.push(taxon);
        }
        Ok(())
    }

    pub fn citations_for(&self, taxon: TaxonId) -> impl Iterator<Item = &Citation> {
        self.citations
            .iter()
            .filter(move |citation| citation.taxa.contains(&taxon))
    }
}
