use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::{MergeStrategy, TreeFormat};
use crate::error::TaxaError;
use crate::model::{DEFAULT_BRANCH_LENGTH, TaxonomyDatabase};
use crate::slug::slugify;
use crate::store::DEFAULT_STORE_DIR;

pub const DEFAULT_CONFIG_FILE: &str = "taxatree.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub store: Option<String>,
    #[serde(default)]
    pub default_format: Option<TreeFormat>,
    #[serde(default)]
    pub default_branch_length: Option<f64>,
    #[serde(default)]
    pub merge_strategy: Option<MergeStrategy>,
    #[serde(default)]
    pub taxonomy_databases: Vec<DatabaseEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum DatabaseEntry {
    Shorthand(String),
    Detailed(DatabaseEntryObject),
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DatabaseEntryObject {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub store: Utf8PathBuf,
    pub default_format: TreeFormat,
    pub default_branch_length: f64,
    pub merge_strategy: MergeStrategy,
    pub taxonomy_databases: Vec<TaxonomyDatabase>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            schema_version: 1,
            store: Utf8PathBuf::from(DEFAULT_STORE_DIR),
            default_format: TreeFormat::Phyloxml,
            default_branch_length: DEFAULT_BRANCH_LENGTH,
            merge_strategy: MergeStrategy::default(),
            taxonomy_databases: Vec::new(),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads `path`, or `taxatree.json` in the working directory when no path
    /// is given. Only an explicit path is required to exist.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, TaxaError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(ResolvedConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| TaxaError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| TaxaError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, TaxaError> {
        let defaults = ResolvedConfig::default();
        let schema_version = config.schema_version.unwrap_or(defaults.schema_version);

        let default_branch_length = config
            .default_branch_length
            .unwrap_or(defaults.default_branch_length);
        if !default_branch_length.is_finite() || default_branch_length < 0.0 {
            return Err(TaxaError::ConfigParse(format!(
                "default_branch_length must be a non-negative number, got {default_branch_length}"
            )));
        }

        let taxonomy_databases = config
            .taxonomy_databases
            .into_iter()
            .map(|entry| match entry {
                DatabaseEntry::Shorthand(name) => database(name, None, None),
                DatabaseEntry::Detailed(obj) => database(obj.name, obj.slug, obj.url),
            })
            .collect::<Result<Vec<_>, TaxaError>>()?;

        Ok(ResolvedConfig {
            schema_version,
            store: config.store.map(Utf8PathBuf::from).unwrap_or(defaults.store),
            default_format: config.default_format.unwrap_or(defaults.default_format),
            default_branch_length,
            merge_strategy: config.merge_strategy.unwrap_or(defaults.merge_strategy),
            taxonomy_databases,
        })
    }
}

fn database(
    name: String,
    slug: Option<String>,
    url: Option<String>,
) -> Result<TaxonomyDatabase, TaxaError> {
    let slug = slug.unwrap_or_else(|| slugify(&name));
    if slug.is_empty() {
        return Err(TaxaError::ConfigParse(format!(
            "taxonomy database {name:?} has no usable slug"
        )));
    }
    Ok(TaxonomyDatabase {
        name,
        slug,
        url: url.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config_shorthand() {
        let config = Config {
            taxonomy_databases: vec![DatabaseEntry::Shorthand("NCBI Taxonomy".to_string())],
            ..Config::default()
        };

        let resolved = ConfigLoader::resolve_config(config).unwrap();
        assert_eq!(resolved.schema_version, 1);
        assert_eq!(resolved.store, DEFAULT_STORE_DIR);
        assert_eq!(resolved.default_format, TreeFormat::Phyloxml);
        assert_eq!(resolved.merge_strategy, MergeStrategy::Abort);
        assert_eq!(resolved.taxonomy_databases[0].slug, "ncbi-taxonomy");
        assert_eq!(resolved.taxonomy_databases[0].url, "");
    }
}
