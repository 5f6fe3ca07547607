//! malimg-features CLI - texture feature extraction for malware images.
//!
//! Usage:
//!   malimg-features extract --dataset data_prepared --output .
//!   malimg-features extract --config features.toml --size 128x128 --jobs 4
//!   malimg-features list
//!   malimg-features info glcm

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use malimg_features::prelude::*;

#[derive(Parser)]
#[command(name = "malimg-features")]
#[command(version, about = "Texture feature extraction for malware-image datasets")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract features and write the master table and its subsets
    Extract(ExtractArgs),
    /// List the available extractors
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show details about one extractor
    Info {
        /// Extractor id (e.g. glcm)
        extractor: String,
    },
}

#[derive(clap::Args)]
struct ExtractArgs {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dataset folder with one sub-folder per class
    #[arg(short, long)]
    dataset: Option<PathBuf>,

    /// Output folder receiving features/ and arff/
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Normalized image size, e.g. 256x256
    #[arg(long, value_parser = parse_size)]
    size: Option<(u32, u32)>,

    /// Only process files matching this glob (e.g. "*.png")
    #[arg(long)]
    pattern: Option<String>,

    /// Worker threads (0 = all cores)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Process images one at a time
    #[arg(long)]
    sequential: bool,

    /// Only write the master CSV
    #[arg(long)]
    no_subsets: bool,
}

fn parse_size(s: &str) -> std::result::Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    let w = w.trim().parse().map_err(|e| format!("bad width '{}': {}", w, e))?;
    let h = h.trim().parse().map_err(|e| format!("bad height '{}': {}", h, e))?;
    Ok((w, h))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match cli.command {
        Command::Extract(args) => extract(args),
        Command::List { json } => list_extractors(json),
        Command::Info { extractor } => extractor_info(&extractor),
    }
}

fn build_config(args: &ExtractArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(dataset) = &args.dataset {
        config.dataset.root = dataset.clone();
    }
    if let Some(output) = &args.output {
        config.output.root = output.clone();
    }
    if let Some((width, height)) = args.size {
        config.image.width = width;
        config.image.height = height;
    }
    if let Some(pattern) = &args.pattern {
        config.dataset.pattern = Some(pattern.clone());
    }
    if let Some(jobs) = args.jobs {
        config.execution.threads = jobs;
    }
    if args.sequential {
        config.execution.parallel = false;
    }
    if args.no_subsets {
        config.output.write_subsets = false;
    }

    if let Err(e) = config.validate() {
        match e.suggested_fix() {
            Some(fix) => bail!("{} ({})", e, fix),
            None => bail!("{}", e),
        }
    }
    Ok(config)
}

fn extract(args: ExtractArgs) -> Result<()> {
    let config = build_config(&args)?;

    let options = ExtractionOptions::from_config(&config).with_progress(|update| {
        if let ProgressUpdate::Completed {
            total_duration_ms,
            images_processed,
            images_skipped,
        } = update
        {
            log::info!(
                "Extracted {} images ({} skipped) in {:.1}s",
                images_processed,
                images_skipped,
                total_duration_ms as f64 / 1000.0
            );
        }
    });

    let report = match run_pipeline(&config, Some(options)) {
        Ok(report) => report,
        Err(FeatureError::Dataset(e)) => match e.suggested_fix() {
            Some(fix) => bail!("{} ({})", e, fix),
            None => bail!("{}", e),
        },
        Err(e) => return Err(e.into()),
    };

    println!(
        "✅ {} rows x {} features from {} classes",
        report.stats.images_processed, report.columns, report.stats.classes
    );
    if !report.skipped.is_empty() {
        println!("⚠️  {} images skipped", report.skipped.len());
    }
    println!(
        "🏁 Wrote {} files under {}",
        report.written.total_files(),
        config.output.root.display()
    );
    Ok(())
}

fn list_extractors(json: bool) -> Result<()> {
    let registry = ExtractorRegistry::with_builtins();

    if json {
        let metadata: Vec<&ExtractorMetadata> = registry.entries().map(|(_, e)| &e.metadata).collect();
        println!("{}", serde_json::to_string_pretty(&metadata)?);
        return Ok(());
    }

    println!("Available extractors ({} total, {} columns):", registry.len(), registry.enabled_column_count());
    println!();

    for family in FeatureFamily::all() {
        let ids = registry.extractors_by_family(family);
        if ids.is_empty() {
            continue;
        }
        println!("  📁 {}", family.display_name());
        for id in ids {
            if let Some(metadata) = registry.get_metadata(id) {
                println!(
                    "      • {} - {} ({} columns)",
                    metadata.id, metadata.description, metadata.column_count
                );
            }
        }
        println!();
    }
    Ok(())
}

fn extractor_info(id: &str) -> Result<()> {
    let registry = ExtractorRegistry::with_builtins();

    let Some(metadata) = registry.get_metadata(id) else {
        bail!("Extractor not found: {}. Use 'list' to see available extractors.", id);
    };

    println!("Extractor: {}", metadata.name);
    println!("ID: {}", metadata.id);
    println!("Family: {}", metadata.family.display_name());
    println!();
    println!("Description:");
    println!("  {}", metadata.description);
    println!();

    if !metadata.parameters.is_empty() {
        println!("Parameters:");
        for (name, value) in &metadata.parameters {
            println!("  • {} = {}", name, value);
        }
        println!();
    }

    let columns = registry.column_names(id).unwrap_or_default();
    println!("Columns ({}):", columns.len());
    for column in columns {
        println!("  • {}", column);
    }
    Ok(())
}
