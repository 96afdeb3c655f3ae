use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use taxatree::app::{App, ExportOptions, ImportOptions};
use taxatree::config::ConfigLoader;
use taxatree::domain::{MergeStrategy, TreeFormat};
use taxatree::error::TaxaError;
use taxatree::output::{HumanOutput, JsonOutput, OutputMode};
use taxatree::store::Store;

#[derive(Parser)]
#[command(name = "taxatree")]
#[command(about = "Phylogenetic taxonomy store with PhyloXML, Nexus and Newick import/export")]
#[command(version, author)]
struct Cli {
    /// Store directory (overrides the config file)
    #[arg(long, global = true)]
    store: Option<Utf8PathBuf>,

    /// Config file (default: ./taxatree.json if present)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Import a phylogeny file into the store")]
    Import(ImportArgs),
    #[command(about = "Export the subtree rooted at a taxon")]
    Export(ExportArgs),
    #[command(about = "List root taxa")]
    List,
    #[command(about = "Show taxon details")]
    Info(InfoArgs),
    #[command(about = "Remove the store")]
    Clear,
}

#[derive(Args)]
struct ImportArgs {
    path: Utf8PathBuf,

    #[arg(long)]
    format: Option<TreeFormat>,

    #[arg(long)]
    merge: Option<MergeStrategy>,
}

#[derive(Args)]
struct ExportArgs {
    slug: String,

    path: Utf8PathBuf,

    #[arg(long)]
    format: Option<TreeFormat>,

    /// Keep only descendants of this rank
    #[arg(long)]
    rank: Option<String>,
}

#[derive(Args)]
struct InfoArgs {
    slug: String,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<TaxaError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &TaxaError) -> u8 {
    match error {
        TaxaError::TaxonNotFound(_) => 2,
        TaxaError::MergeConflict { .. } => 3,
        TaxaError::Parse(_) => 4,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let store_root = cli.store.clone().unwrap_or_else(|| config.store.clone());
    let app = App::new(Store::new_with_path(store_root), config);

    match cli.command {
        Commands::Import(args) => run_import(args, &app, output_mode),
        Commands::Export(args) => run_export(args, &app, output_mode),
        Commands::List => run_list(&app, output_mode),
        Commands::Info(args) => run_info(args, &app, output_mode),
        Commands::Clear => run_clear(&app, output_mode),
    }
}

fn run_import(args: ImportArgs, app: &App, output_mode: OutputMode) -> miette::Result<()> {
    let options = ImportOptions {
        format: args.format,
        merge_strategy: args.merge,
    };
    match output_mode {
        OutputMode::Json => {
            let result = app.import(&args.path, options, &JsonOutput)?;
            JsonOutput::print_import(&result).into_diagnostic()
        }
        OutputMode::Human => {
            let result = app.import(&args.path, options, &HumanOutput)?;
            HumanOutput::print_import(&result).into_diagnostic()
        }
    }
}

fn run_export(args: ExportArgs, app: &App, output_mode: OutputMode) -> miette::Result<()> {
    let options = ExportOptions {
        format: args.format,
        rank: args.rank,
    };
    match output_mode {
        OutputMode::Json => {
            let result = app.export(&args.slug, &args.path, options, &JsonOutput)?;
            JsonOutput::print_export(&result).into_diagnostic()
        }
        OutputMode::Human => {
            let result = app.export(&args.slug, &args.path, options, &HumanOutput)?;
            HumanOutput::print_export(&result).into_diagnostic()
        }
    }
}

fn run_list(app: &App, output_mode: OutputMode) -> miette::Result<()> {
    match output_mode {
        OutputMode::Json => {
            let result = app.list(&JsonOutput)?;
            JsonOutput::print_list(&result).into_diagnostic()
        }
        OutputMode::Human => {
            let result = app.list(&HumanOutput)?;
            HumanOutput::print_list(&result).into_diagnostic()
        }
    }
}

fn run_info(args: InfoArgs, app: &App, output_mode: OutputMode) -> miette::Result<()> {
    match output_mode {
        OutputMode::Json => {
            let result = app.info(&args.slug, &JsonOutput)?;
            JsonOutput::print_info(&result).into_diagnostic()
        }
        OutputMode::Human => {
            let result = app.info(&args.slug, &HumanOutput)?;
            HumanOutput::print_info(&result).into_diagnostic()
        }
    }
}

fn run_clear(app: &App, output_mode: OutputMode) -> miette::Result<()> {
    match output_mode {
        OutputMode::Json => {
            let result = app.clear(&JsonOutput)?;
            JsonOutput::print_clear(&result).into_diagnostic()
        }
        OutputMode::Human => {
            let result = app.clear(&HumanOutput)?;
            HumanOutput::print_clear(&result).into_diagnostic()
        }
    }
}
