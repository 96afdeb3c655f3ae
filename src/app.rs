use std::time::{Duration, Instant};

use camino::Utf8Path;
use serde::Serialize;

use crate::config::ResolvedConfig;
use crate::domain::{MergeStrategy, TreeFormat};
use crate::error::TaxaError;
use crate::export::Exporter;
use crate::import::Importer;
use crate::model::TaxonId;
use crate::store::Store;

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub format: Option<TreeFormat>,
    pub merge_strategy: Option<MergeStrategy>,
}

#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub format: Option<TreeFormat>,
    pub rank: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    pub path: String,
    pub format: String,
    pub merge_strategy: String,
    pub roots: Vec<String>,
    pub created: usize,
    pub relinked: usize,
    pub total_taxa: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportResult {
    pub root: String,
    pub path: String,
    pub format: String,
    pub rank: Option<String>,
    pub clades: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListResult {
    pub roots: Vec<ListEntry>,
    pub total_taxa: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListEntry {
    pub slug: String,
    pub name: String,
    pub rank: Option<String>,
    pub taxa: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct InfoResult {
    pub slug: String,
    pub name: String,
    pub rank: Option<String>,
    pub common_name: Option<String>,
    pub author: Option<String>,
    pub year_of_description: Option<i16>,
    pub distribution: Option<String>,
    pub appearance_date: Option<String>,
    pub body_length: Option<String>,
    pub branch_length: Option<f64>,
    pub ancestors: Vec<String>,
    pub children: Vec<String>,
    pub descendants: usize,
    pub records: Vec<RecordEntry>,
    pub points: Vec<PointEntry>,
    pub citations: Vec<String>,
    pub date_created: String,
    pub date_modified: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordEntry {
    pub database: String,
    pub record_id: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PointEntry {
    pub latitude: f64,
    pub longitude: f64,
    pub place_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClearResult {
    pub cleared: bool,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[derive(Debug, Clone)]
pub struct App {
    store: Store,
    config: ResolvedConfig,
}

impl App {
    pub fn new(store: Store, config: ResolvedConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// An explicit format wins, then the file extension, then the
    /// configured default.
    pub fn resolve_format(&self, path: &Utf8Path, format: Option<TreeFormat>) -> TreeFormat {
        format
            .or_else(|| TreeFormat::from_path(path).ok())
            .unwrap_or(self.config.default_format)
    }

    pub fn import(
        &self,
        path: &Utf8Path,
        options: ImportOptions,
        sink: &dyn ProgressSink,
    ) -> Result<ImportResult, TaxaError> {
        let started = Instant::now();
        let format = self.resolve_format(path, options.format);
        let merge_strategy = options.merge_strategy.unwrap_or(self.config.merge_strategy);
        sink.event(ProgressEvent {
            message: format!("phase=Parse; reading {path} as {format}"),
            elapsed: None,
        });

        let importer = Importer::new()
            .with_merge_strategy(merge_strategy)
            .with_default_branch_length(self.config.default_branch_length)
            .with_databases(self.config.taxonomy_databases.clone());
        let summary = importer.import_file(&self.store, path, format)?;
        let total_taxa = self.store.load()?.len();

        sink.event(ProgressEvent {
            message: format!(
                "phase=Store; created {} taxa, relinked {}",
                summary.created, summary.relinked
            ),
            elapsed: Some(started.elapsed()),
        });

        Ok(ImportResult {
            path: path.to_string(),
            format: format.to_string(),
            merge_strategy: merge_strategy.to_string(),
            roots: summary.roots,
            created: summary.created,
            relinked: summary.relinked,
            total_taxa,
        })
    }

    pub fn export(
        &self,
        slug: &str,
        path: &Utf8Path,
        options: ExportOptions,
        sink: &dyn ProgressSink,
    ) -> Result<ExportResult, TaxaError> {
        let started = Instant::now();
        let format = self.resolve_format(path, options.format);
        sink.event(ProgressEvent {
            message: format!("phase=Resolve; looking up {slug}"),
            elapsed: None,
        });

        let catalog = self.store.load()?;
        let mut exporter = Exporter::new(&catalog)
            .with_default_branch_length(self.config.default_branch_length)
            .root_by_slug(slug)?;
        if let Some(rank) = options.rank.as_deref() {
            exporter = exporter.with_rank_filter(rank)?;
        }
        let clades = exporter.save(format, path)?;

        sink.event(ProgressEvent {
            message: format!("phase=Write; {clades} clades written to {path}"),
            elapsed: Some(started.elapsed()),
        });

        Ok(ExportResult {
            root: slug.to_string(),
            path: path.to_string(),
            format: format.to_string(),
            rank: options.rank,
            clades,
        })
    }

    pub fn list(&self, sink: &dyn ProgressSink) -> Result<ListResult, TaxaError> {
        sink.event(ProgressEvent {
            message: "phase=Resolve; scanning catalog".to_string(),
            elapsed: None,
        });

        let catalog = self.store.load()?;
        let roots = catalog
            .roots()
            .iter()
            .filter_map(|id| catalog.taxon(*id))
            .map(|taxon| ListEntry {
                slug: taxon.slug.clone(),
                name: taxon.name.clone(),
                rank: taxon.rank.clone(),
                taxa: catalog.descendants(taxon.id).len(),
            })
            .collect();

        Ok(ListResult {
            roots,
            total_taxa: catalog.len(),
        })
    }

    pub fn info(&self, slug: &str, sink: &dyn ProgressSink) -> Result<InfoResult, TaxaError> {
        sink.event(ProgressEvent {
            message: format!("phase=Resolve; looking up {slug}"),
            elapsed: None,
        });

        let catalog = self.store.load()?;
        let taxon = catalog.get_by_natural_key(slug)?;
        let slugs = |ids: &[TaxonId]| -> Vec<String> {
            ids.iter()
                .filter_map(|id| catalog.taxon(*id))
                .map(|taxon| taxon.slug.clone())
                .collect()
        };

        let records = catalog
            .records_for(taxon.id)
            .map(|record| RecordEntry {
                database: catalog
                    .database(&record.database)
                    .map(|database| database.name.clone())
                    .unwrap_or_else(|| record.database.clone()),
                record_id: record.record_id.clone(),
                url: non_empty(&record.url),
            })
            .collect();
        let points = catalog
            .points_for(taxon.id)
            .map(|point| PointEntry {
                latitude: point.latitude,
                longitude: point.longitude,
                place_name: non_empty(&point.place_name),
            })
            .collect();
        let citations = catalog
            .citations_for(taxon.id)
            .map(|citation| citation.to_string())
            .collect();

        Ok(InfoResult {
            slug: taxon.slug.clone(),
            name: taxon.name.clone(),
            rank: taxon.rank.clone(),
            common_name: non_empty(&taxon.common_name),
            author: non_empty(&taxon.author),
            year_of_description: taxon.year_of_description,
            distribution: non_empty(&taxon.distribution),
            appearance_date: non_empty(&taxon.appearance_date()),
            body_length: taxon.body_length(),
            branch_length: taxon.branch_length,
            ancestors: slugs(&catalog.ancestors(taxon.id)),
            children: slugs(catalog.children(taxon.id)),
            descendants: catalog.descendants(taxon.id).len().saturating_sub(1),
            records,
            points,
            citations,
            date_created: taxon.date_created.clone(),
            date_modified: taxon.date_modified.clone(),
        })
    }

    pub fn clear(&self, sink: &dyn ProgressSink) -> Result<ClearResult, TaxaError> {
        sink.event(ProgressEvent {
            message: format!("phase=Store; clearing {}", self.store.root()),
            elapsed: None,
        });
        let cleared = self.store.clear()?;
        Ok(ClearResult { cleared })
    }
}
