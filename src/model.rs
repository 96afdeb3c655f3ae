use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{AppearanceDateUnit, BodyLengthUnit};

pub const DEFAULT_BRANCH_LENGTH: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxonId(u64);

impl TaxonId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaxonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CitationId(u64);

impl CitationId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }
}

/// A phylogenetic taxon occupying one position in a tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxon {
    pub id: TaxonId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub year_of_description: Option<i16>,
    #[serde(default)]
    pub common_name: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ecology: String,
    #[serde(default)]
    pub distribution: String,
    #[serde(default)]
    pub appearance_date: AppearanceDate,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub body_length: BodyLength,
    pub branch_length: Option<f64>,
    pub parent: Option<TaxonId>,
    #[serde(default)]
    pub children: Vec<TaxonId>,
    pub date_created: String,
    pub date_modified: String,
}

impl Taxon {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn appearance_date(&self) -> String {
        self.appearance_date.to_string()
    }

    pub fn body_length(&self) -> Option<String> {
        self.body_length
            .value
            .map(|value| format!("{value}{}", self.body_length.unit))
    }
}

impl fmt::Display for Taxon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppearanceDate {
    pub min: Option<i16>,
    pub max: Option<i16>,
    #[serde(default)]
    pub unit: AppearanceDateUnit,
    #[serde(default)]
    pub annotation: String,
}

impl AppearanceDate {
    pub fn is_set(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }
}

impl fmt::Display for AppearanceDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = self.unit.label();
        match (self.min, self.max) {
            (Some(min), Some(max)) => write!(f, "{min} \u{2012} {max} {unit}"),
            (Some(value), None) | (None, Some(value)) => write!(f, "{value} {unit}"),
            (None, None) => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyLength {
    pub value: Option<i16>,
    #[serde(default)]
    pub unit: BodyLengthUnit,
}

/// Fields for a taxon that does not exist yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTaxon {
    pub name: String,
    pub slug: String,
    pub rank: Option<String>,
    pub branch_length: Option<f64>,
}

impl NewTaxon {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            rank: None,
            branch_length: Some(DEFAULT_BRANCH_LENGTH),
        }
    }

    pub fn with_rank(mut self, rank: impl Into<String>) -> Self {
        self.rank = Some(rank.into());
        self
    }

    pub fn with_branch_length(mut self, branch_length: Option<f64>) -> Self {
        self.branch_length = branch_length;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyDatabase {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub url: String,
}

impl fmt::Display for TaxonomyDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyRecord {
    pub taxon: TaxonId,
    pub database: String,
    pub record_id: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionPoint {
    pub taxon: TaxonId,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub place_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub id: CitationId,
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub doi: String,
    #[serde(default)]
    pub taxa: Vec<TaxonId>,
}

impl fmt::Display for Citation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.doi.is_empty() {
            write!(f, "{}", self.description)
        } else {
            write!(f, "{} ({})", self.description, self.doi)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appearance_date_rendering() {
        let mut date = AppearanceDate::default();
        assert_eq!(date.to_string(), "");
        date.max = Some(65);
        assert_eq!(date.to_string(), "65 million years ago");
        date.min = Some(50);
        assert_eq!(date.to_string(), "50 \u{2012} 65 million years ago");
    }

    #[test]
    fn citation_display_includes_doi() {
        let citation = Citation {
            id: CitationId::new(1),
            description: "Linnaeus 1758".to_string(),
            url: String::new(),
            doi: "10.5962/bhl.title.542".to_string(),
            taxa: Vec::new(),
        };
        assert_eq!(citation.to_string(), "Linnaeus 1758 (10.5962/bhl.title.542)");
    }
}
