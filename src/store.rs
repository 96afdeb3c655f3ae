use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::Builder;
use tracing::debug;

use crate::catalog::Catalog;
use crate::error::TaxaError;

pub const DEFAULT_STORE_DIR: &str = ".taxatree";
const CATALOG_FILE: &str = "catalog.json";

/// Directory-backed persistence for a [`Catalog`].
#[derive(Debug, Clone)]
pub struct Store {
    root: Utf8PathBuf,
}

impl Store {
    pub fn new() -> Result<Self, TaxaError> {
        let cwd = std::env::current_dir().map_err(|err| TaxaError::Filesystem(err.to_string()))?;
        let root = Utf8PathBuf::from_path_buf(cwd.join(DEFAULT_STORE_DIR))
            .map_err(|_| TaxaError::Filesystem("invalid store path".to_string()))?;
        Ok(Self { root })
    }

    pub fn new_with_path(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn catalog_path(&self) -> Utf8PathBuf {
        self.root.join(CATALOG_FILE)
    }

    pub fn exists(&self) -> bool {
        self.catalog_path().as_std_path().exists()
    }

    pub fn ensure_root(&self) -> Result<(), TaxaError> {
        fs::create_dir_all(self.root.as_std_path())
            .map_err(|err| TaxaError::Filesystem(err.to_string()))
    }

    /// Reads the catalog; a store that was never written is empty.
    pub fn load(&self) -> Result<Catalog, TaxaError> {
        let path = self.catalog_path();
        if !path.as_std_path().exists() {
            return Ok(Catalog::new());
        }
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|err| TaxaError::Filesystem(format!("read {path}: {err}")))?;
        serde_json::from_str(&content).map_err(|err| TaxaError::StoreCorrupt(err.to_string()))
    }

    pub fn save(&self, catalog: &Catalog) -> Result<(), TaxaError> {
        let content = serde_json::to_vec_pretty(catalog)
            .map_err(|err| TaxaError::Filesystem(err.to_string()))?;
        Self::write_bytes_atomic(&self.catalog_path(), &content)?;
        debug!(path = %self.catalog_path(), taxa = catalog.len(), "catalog saved");
        Ok(())
    }

    /// Loads the catalog, applies `f` and saves only if `f` succeeds.
    pub fn transaction<T, F>(&self, f: F) -> Result<T, TaxaError>
    where
        F: FnOnce(&mut Catalog) -> Result<T, TaxaError>,
    {
        let mut catalog = self.load()?;
        let value = f(&mut catalog)?;
        self.save(&catalog)?;
        Ok(value)
    }

    pub fn clear(&self) -> Result<bool, TaxaError> {
        if self.root.as_std_path().exists() {
            fs::remove_dir_all(self.root.as_std_path())
                .map_err(|err| TaxaError::Filesystem(err.to_string()))?;
            return Ok(true);
        }
        Ok(false)
    }

    pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), TaxaError> {
        let parent = path
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .unwrap_or_else(|| Utf8Path::new("."));
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| TaxaError::Filesystem(err.to_string()))?;
        let mut temp = Builder::new()
            .prefix(".taxatree-write")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| TaxaError::Filesystem(err.to_string()))?;
        temp.write_all(content)
            .map_err(|err| TaxaError::Filesystem(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| TaxaError::Filesystem(err.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths() {
        let store = Store::new().unwrap();
        assert!(store.root().ends_with(DEFAULT_STORE_DIR));
        assert!(store.catalog_path().ends_with(".taxatree/catalog.json"));
    }
}
