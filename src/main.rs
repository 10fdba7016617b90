use anyhow::{Context, Result};
use std::path::PathBuf;

use photoindex::classify::{Classifier, OnnxClassifier};
use photoindex::config::Config;
use photoindex::db::{CatalogStore, SqliteCatalog};
use photoindex::geo::{Geocoder, Nominatim};
use photoindex::index::TreeIndexer;
use photoindex::logging;

#[derive(Debug, Default)]
struct Args {
    config_path: Option<PathBuf>,
    originals_path: Option<PathBuf>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("photoindex {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--config" | "-c" | "--originals" | "-o" => {
                let Some(value) = args.get(i + 1) else {
                    eprintln!("Error: {} requires a path argument", args[i]);
                    std::process::exit(1);
                };
                let path = PathBuf::from(value);
                if matches!(args[i].as_str(), "--config" | "-c") {
                    parsed.config_path = Some(path);
                } else {
                    parsed.originals_path = Some(path);
                }
                i += 1;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    parsed
}

fn print_help() {
    println!(
        r#"photoindex - index a photo originals tree into a catalog

USAGE:
    photoindex [OPTIONS]

OPTIONS:
    --config, -c PATH      Path to config file
    --originals, -o PATH   Originals directory (overrides the config file)
    --version, -V          Show version
    --help, -h             Show this help message

ENVIRONMENT:
    PHOTOINDEX_CONFIG      Path to config file (overrides default location)
    PHOTOINDEX_LOG         Log filter (trace, debug, info, warn, error)

Config file location: $XDG_CONFIG_HOME/photoindex/config.toml"#
    );
}

fn main() -> Result<()> {
    let args = parse_args();

    let mut config = match args.config_path {
        Some(path) => Config::load_from(&path)?,
        None => Config::load()?,
    };
    if let Some(originals) = args.originals_path {
        config.originals_path = originals;
    }

    logging::init(&config.logging)?;

    let catalog = SqliteCatalog::open(&config.database.sqlite_path)
        .with_context(|| format!("Failed to open catalog {}", config.database.sqlite_path.display()))?;
    catalog.initialize().context("Failed to initialize catalog schema")?;
    tracing::info!(path = ?config.database.sqlite_path, "Catalog opened");

    let classifier = config
        .classifier
        .enabled
        .then(|| OnnxClassifier::new(config.classifier.clone()));
    let geocoder = config
        .geocoder
        .enabled
        .then(|| Nominatim::new(&config.geocoder));

    let indexer = TreeIndexer::new(
        &catalog,
        classifier.as_ref().map(|c| c as &dyn Classifier),
        geocoder.as_ref().map(|g| g as &dyn Geocoder),
        &config.originals_path,
        &config.thumbnails.path,
    );

    tracing::info!(originals = ?config.originals_path, "Indexing originals");
    let indexed = indexer.index_all();
    let summary = indexed.summary();
    let stats = catalog.stats()?;

    println!(
        "Indexed {} files: {} added, {} updated, {} failed",
        indexed.len(),
        summary.added,
        summary.updated,
        summary.failed
    );
    println!(
        "Catalog: {} photos, {} files, {} tags, {} cameras, {} lenses, {} locations, {} countries",
        stats.photos,
        stats.files,
        stats.tags,
        stats.cameras,
        stats.lenses,
        stats.locations,
        stats.countries
    );

    Ok(())
}
