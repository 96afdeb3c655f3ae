use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::TaxaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TreeFormat {
    Phyloxml,
    Nexus,
    Newick,
}

impl TreeFormat {
    pub const ALL: [TreeFormat; 3] = [TreeFormat::Phyloxml, TreeFormat::Nexus, TreeFormat::Newick];

    pub fn name(self) -> &'static str {
        match self {
            TreeFormat::Phyloxml => "phyloxml",
            TreeFormat::Nexus => "nexus",
            TreeFormat::Newick => "newick",
        }
    }

    /// Canonical file extension written on export.
    pub fn extension(self) -> &'static str {
        match self {
            TreeFormat::Phyloxml => "xml",
            TreeFormat::Nexus => "nex",
            TreeFormat::Newick => "tree",
        }
    }

    pub fn from_extension(extension: &str) -> Result<Self, TaxaError> {
        match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "xml" | "phyloxml" => Ok(TreeFormat::Phyloxml),
            "nex" | "nexus" | "nxs" => Ok(TreeFormat::Nexus),
            "tree" | "nwk" | "newick" => Ok(TreeFormat::Newick),
            _ => Err(TaxaError::UnknownFormat(extension.to_string())),
        }
    }

    pub fn from_path(path: &camino::Utf8Path) -> Result<Self, TaxaError> {
        let extension = path
            .extension()
            .ok_or_else(|| TaxaError::UnknownFormat(path.to_string()))?;
        Self::from_extension(extension)
    }
}

impl fmt::Display for TreeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for TreeFormat {
    type Err = TaxaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "phyloxml" => Ok(TreeFormat::Phyloxml),
            "nexus" => Ok(TreeFormat::Nexus),
            "newick" => Ok(TreeFormat::Newick),
            _ => Err(TaxaError::UnknownFormat(value.to_string())),
        }
    }
}

/// What the importer does when a clade resolves to an existing taxon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Fail with a merge conflict and roll the whole import back.
    #[default]
    Abort,
    /// Reuse the existing taxon and move it under the imported parent.
    Relink,
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeStrategy::Abort => write!(f, "abort"),
            MergeStrategy::Relink => write!(f, "relink"),
        }
    }
}

impl FromStr for MergeStrategy {
    type Err = TaxaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(MergeStrategy::Abort),
            "relink" => Ok(MergeStrategy::Relink),
            _ => Err(TaxaError::InvalidMergeStrategy(value.to_string())),
        }
    }
}

/// Rank vocabulary accepted by PhyloXML taxonomies.
pub const TAXON_RANKS: &[&str] = &[
    "domain",
    "superkingdom",
    "kingdom",
    "subkingdom",
    "branch",
    "infrakingdom",
    "superphylum",
    "phylum",
    "subphylum",
    "infraphylum",
    "microphylum",
    "superdivision",
    "division",
    "subdivision",
    "infradivision",
    "superclass",
    "class",
    "subclass",
    "infraclass",
    "superlegion",
    "legion",
    "sublegion",
    "infralegion",
    "supercohort",
    "cohort",
    "subcohort",
    "infracohort",
    "superorder",
    "order",
    "suborder",
    "superfamily",
    "family",
    "subfamily",
    "supertribe",
    "tribe",
    "subtribe",
    "infratribe",
    "genus",
    "subgenus",
    "superspecies",
    "species",
    "subspecies",
    "variety",
    "subvariety",
    "form",
    "subform",
    "cultivar",
    "strain",
    "section",
    "subsection",
    "unknown",
    "other",
];

pub fn validate_rank(rank: &str) -> Result<String, TaxaError> {
    let normalized = rank.trim().to_ascii_lowercase();
    if TAXON_RANKS.contains(&normalized.as_str()) {
        Ok(normalized)
    } else {
        Err(TaxaError::InvalidRank(rank.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppearanceDateUnit {
    Bya,
    #[default]
    Mya,
    Tya,
    Hya,
    Ya,
}

impl AppearanceDateUnit {
    pub fn code(self) -> &'static str {
        match self {
            AppearanceDateUnit::Bya => "bya",
            AppearanceDateUnit::Mya => "mya",
            AppearanceDateUnit::Tya => "tya",
            AppearanceDateUnit::Hya => "hya",
            AppearanceDateUnit::Ya => "ya",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AppearanceDateUnit::Bya => "billion years ago",
            AppearanceDateUnit::Mya => "million years ago",
            AppearanceDateUnit::Tya => "thousand years ago",
            AppearanceDateUnit::Hya => "hundred years ago",
            AppearanceDateUnit::Ya => "years ago",
        }
    }
}

impl FromStr for AppearanceDateUnit {
    type Err = TaxaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bya" => Ok(AppearanceDateUnit::Bya),
            "mya" => Ok(AppearanceDateUnit::Mya),
            "tya" => Ok(AppearanceDateUnit::Tya),
            "hya" => Ok(AppearanceDateUnit::Hya),
            "ya" => Ok(AppearanceDateUnit::Ya),
            _ => Err(TaxaError::InvalidRank(format!("date unit {value}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyLengthUnit {
    #[serde(rename = "\u{03bc}m")]
    Micrometre,
    #[default]
    #[serde(rename = "mm")]
    Millimetre,
    #[serde(rename = "cm")]
    Centimetre,
    #[serde(rename = "m")]
    Metre,
}

impl fmt::Display for BodyLengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyLengthUnit::Micrometre => write!(f, "\u{03bc}m"),
            BodyLengthUnit::Millimetre => write!(f, "mm"),
            BodyLengthUnit::Centimetre => write!(f, "cm"),
            BodyLengthUnit::Metre => write!(f, "m"),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn format_names_are_case_insensitive() {
        assert_eq!("PhyloXML".parse::<TreeFormat>().unwrap(), TreeFormat::Phyloxml);
        assert_eq!(" newick ".parse::<TreeFormat>().unwrap(), TreeFormat::Newick);
        let err = "fasta".parse::<TreeFormat>().unwrap_err();
        assert_matches!(err, TaxaError::UnknownFormat(_));
    }

    #[test]
    fn rank_validation() {
        assert_eq!(validate_rank("Genus").unwrap(), "genus");
        assert_matches!(validate_rank("clade"), Err(TaxaError::InvalidRank(_)));
    }
}
