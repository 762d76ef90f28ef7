//! persona-digest - persona-styled article summaries
//!
//! This is the main entry point for the persona-digest binary.
//! `generate` summarizes a directory of markdown articles through a text
//! generation API; the publishing commands aggregate every summary record
//! and rewrite an index document, render a gallery or export a JSON API.

mod aggregate;
mod batch;
mod cli;
mod config;
mod error;
mod llm;
mod logging;
mod persona;
mod publish;
mod summary;
mod text;
mod version;

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};

use crate::aggregate::{Aggregator, KeyStrategy, UnifiedCatalog};
use crate::batch::{discover_articles, BatchOrchestrator};
use crate::cli::{Cli, Commands, ConfigSubcommand};
use crate::config::{expand_path, AppConfig};
use crate::error::{Error, Result};
use crate::logging::LogGuards;
use crate::persona::PersonaMode;
use crate::publish::{ApiExporter, GalleryRenderer, IndexMerger};
use crate::version::BuildInfo;

/// Characters of a persona description shown by `personas`
const DIRECTORY_DESCRIPTION_CHARS: usize = 200;

fn main() {
    // Parse CLI arguments first (before logging, so we know verbosity)
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprint!("{}", e.format_for_terminal());
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    let (verbose, quiet) = (cli.verbose, cli.quiet);

    match cli.command {
        Commands::Version => {
            version::print_version();
            Ok(())
        }
        Commands::Config { subcommand } => {
            // Config commands use minimal logging
            logging::init_simple(tracing::Level::WARN)?;
            handle_config_command(subcommand)
        }
        Commands::Generate {
            config,
            mode,
            personas,
            workers,
            limit,
            all,
            input,
            output,
        } => {
            let mut cfg = AppConfig::load(config.as_deref())?;
            apply_generate_overrides(
                &mut cfg,
                GenerateOverrides {
                    mode,
                    personas,
                    workers,
                    limit: if all { Some(0) } else { limit },
                    input,
                    output,
                },
            )?;
            let _log_guards = start_logging(&cfg, verbose, quiet)?;
            run_generate(&cfg)
        }
        Commands::MergeIndex {
            config,
            index,
            dirs,
            dry_run,
        } => {
            let cfg = AppConfig::load(config.as_deref())?;
            let _log_guards = start_logging(&cfg, verbose, quiet)?;
            run_merge_index(&cfg, index, &dirs, dry_run)
        }
        Commands::Gallery { config, output, dirs } => {
            let cfg = AppConfig::load(config.as_deref())?;
            let _log_guards = start_logging(&cfg, verbose, quiet)?;
            run_gallery(&cfg, output, &dirs)
        }
        Commands::ExportApi { config, output, dirs } => {
            let cfg = AppConfig::load(config.as_deref())?;
            let _log_guards = start_logging(&cfg, verbose, quiet)?;
            run_export_api(&cfg, output, &dirs)
        }
        Commands::Personas { config, dirs } => {
            let cfg = AppConfig::load(config.as_deref())?;
            let _log_guards = start_logging(&cfg, verbose, quiet)?;
            run_personas(&cfg, &dirs)
        }
    }
}

/// Initialize logging from configuration and log the build
fn start_logging(config: &AppConfig, verbose: u8, quiet: bool) -> Result<LogGuards> {
    // The guards must be kept alive for the lifetime of the command
    let guards = logging::init_logging(&config.logging, verbose, quiet)?;

    let build = BuildInfo::current();
    info!(
        version = %build.full_version(),
        target = %build.target,
        profile = %build.profile,
        "Starting persona-digest"
    );
    Ok(guards)
}

// ─────────────────────────────────────────────────────────────────
// generate
// ─────────────────────────────────────────────────────────────────

/// Command-line values that take precedence over the configuration
struct GenerateOverrides {
    mode: Option<PersonaMode>,
    personas: Option<usize>,
    workers: Option<usize>,
    limit: Option<usize>,
    input: Option<String>,
    output: Option<String>,
}

fn apply_generate_overrides(config: &mut AppConfig, overrides: GenerateOverrides) -> Result<()> {
    let settings = &mut config.generation;
    if let Some(mode) = overrides.mode {
        settings.mode = mode;
    }
    if let Some(count) = overrides.personas {
        settings.persona_count = count;
    }
    if let Some(workers) = overrides.workers {
        settings.workers = workers;
    }
    if let Some(limit) = overrides.limit {
        settings.limit = limit;
    }
    if let Some(input) = overrides.input {
        settings.input_dir = expand_path(&input);
    }
    if let Some(output) = overrides.output {
        settings.output_dir = expand_path(&output);
    }
    config.validate()
}

fn run_generate(config: &AppConfig) -> Result<()> {
    let settings = &config.generation;
    info!(
        input = %settings.input_dir,
        output = %settings.output_dir,
        mode = %settings.mode,
        persona_count = settings.persona_count,
        workers = settings.workers,
        limit = settings.limit,
        provider = %config.llm.provider,
        model = %config.llm.model,
        "Configuration loaded"
    );

    let articles = discover_articles(&config.input_dir(), &settings.exclude, settings.limit)?;
    if articles.is_empty() {
        warn!(input = %settings.input_dir, "No markdown articles found");
        println!("No markdown articles found under {}", settings.input_dir);
        return Ok(());
    }

    let client = llm::build_generator(&config.llm)?;
    let orchestrator = BatchOrchestrator::from_config(client, config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(settings.workers.clamp(1, 16))
        .thread_name("persona-digest")
        .build()
        .map_err(|e| Error::Internal(format!("Failed to create async runtime: {}", e)))?;

    let report = runtime.block_on(orchestrator.run(articles))?;

    println!();
    println!("Batch Results ({} mode):", report.index.mode);
    println!("  Articles processed:   {}", report.index.processed_articles);
    println!("  Articles failed:      {}", report.index.failed_files.len());
    println!("  Summaries written:    {}", report.summaries_written());
    println!("  Persona fallbacks:    {}", report.fallback_articles());
    println!("  Generation requests:  {}", report.generator.requests);
    println!("  Tokens used:          {}", report.generator.total_tokens);
    println!("  Duration:             {:.2}s", report.elapsed_secs);
    println!("  Batch index:          {}", report.index_path.display());

    Ok(())
}

// ─────────────────────────────────────────────────────────────────
// Publishing commands
// ─────────────────────────────────────────────────────────────────

/// Aggregate the summary directories given on the command line, or the
/// configured ones when none were given.
fn load_catalog(config: &AppConfig, dirs: &[String], strategy: KeyStrategy) -> UnifiedCatalog {
    let dirs: Vec<PathBuf> = if dirs.is_empty() {
        config.summary_dirs()
    } else {
        dirs.iter().map(|d| PathBuf::from(expand_path(d))).collect()
    };
    let catalog = Aggregator::new(strategy).load_all(&dirs);

    for skipped in catalog.skipped() {
        warn!(file = %skipped.path.display(), reason = %skipped.reason, "Skipped summary record");
    }
    if catalog.is_empty() {
        warn!(dirs = ?dirs, "No summary records found");
    }
    catalog
}

fn run_merge_index(config: &AppConfig, index: Option<String>, dirs: &[String], dry_run: bool) -> Result<()> {
    let catalog = load_catalog(config, dirs, KeyStrategy::NormalizedTitle);
    let path = PathBuf::from(match index {
        Some(p) => expand_path(&p),
        None => config.publish.index_path.clone(),
    });

    let merger = IndexMerger::new(&catalog, config.publish.max_index_personas)?;
    let outcome = merger.merge_file(&path, dry_run)?;
    let report = outcome.report;

    if dry_run {
        print!("{}", outcome.document);
        eprintln!(
            "Dry run: {} sections would be updated ({} by partial title match, {} already summarized, {} unmatched)",
            report.updated, report.partial, report.already_summarized, report.unmatched
        );
    } else {
        println!("Record files loaded:   {}", catalog.files_loaded());
        println!("Articles aggregated:   {}", catalog.len());
        println!("Sections updated:      {}", report.updated);
        println!("Partial title matches: {}", report.partial);
        println!("Already summarized:    {}", report.already_summarized);
        println!("Unmatched sections:    {}", report.unmatched);
        if outcome.written {
            println!("Updated {}", path.display());
        }
    }
    Ok(())
}

fn run_gallery(config: &AppConfig, output: Option<String>, dirs: &[String]) -> Result<()> {
    let catalog = load_catalog(config, dirs, KeyStrategy::NormalizedTitle);
    let path = PathBuf::from(match output {
        Some(p) => expand_path(&p),
        None => config.publish.gallery_path.clone(),
    });

    let renderer = GalleryRenderer::new(Some(config.input_dir()));
    let report = renderer.write(&catalog, &path)?;
    println!(
        "Gallery with {} articles in {} categories written to {}",
        report.articles,
        report.categories,
        path.display()
    );
    Ok(())
}

fn run_export_api(config: &AppConfig, output: Option<String>, dirs: &[String]) -> Result<()> {
    let catalog = load_catalog(config, dirs, KeyStrategy::Slug);
    let dir = PathBuf::from(match output {
        Some(p) => expand_path(&p),
        None => config.publish.api_dir.clone(),
    });

    let report = ApiExporter::new(&dir).export(&catalog)?;
    println!(
        "API exported to {}: {} articles, {} personas, {} categories ({} files)",
        dir.display(),
        report.articles,
        report.personas,
        report.categories,
        report.files_written
    );
    Ok(())
}

fn run_personas(config: &AppConfig, dirs: &[String]) -> Result<()> {
    let catalog = load_catalog(config, dirs, KeyStrategy::NormalizedTitle);
    let directory = catalog.persona_directory();

    println!("Found {} personas across {} articles", directory.len(), catalog.len());
    for entry in &directory {
        println!();
        println!("{} ({})", entry.display_name, entry.name);
        println!("  Articles: {}", entry.article_count);
        if !entry.description.is_empty() {
            println!("  {}", entry.short_description(DIRECTORY_DESCRIPTION_CHARS));
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────
// config
// ─────────────────────────────────────────────────────────────────

/// Handle configuration subcommands
fn handle_config_command(subcommand: ConfigSubcommand) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show { config } => {
            let mut cfg = AppConfig::load(config.as_deref())?;
            if !cfg.llm.api_key.is_empty() {
                cfg.llm.api_key = "***".to_string();
            }
            println!("{}", toml::to_string_pretty(&cfg)?);
        }
        ConfigSubcommand::Init { path, force } => {
            let written = config::init_config(path.as_deref(), force)?;
            println!("Configuration written to {}", written.display());
        }
        ConfigSubcommand::Validate { config } => {
            AppConfig::load(config.as_deref())?;
            println!("Configuration is valid.");
        }
    }

    Ok(())
}
