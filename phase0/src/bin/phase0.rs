//! Phase 0 instrument mode selector
//!
//! Loads the imaging and spectroscopy catalogs, validates the observer's
//! request and prints the matching configurations, best first.
//!
//! ```text
//! phase0 --mode imaging --filter r,g --iq 0.5
//! phase0 --mode spectroscopy --wave 2.2 --res 3000 --fpu ifu --format json
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use phase0::args::{OutputFormat, Phase0Args};
use phase0::filters::eligible_modes;
use phase0::report::{render_catalog_order, render_json, render_table};
use phase0::{recommend, Catalog, Category, MatchConfig};

fn load_table(path: Option<&Path>, category: Category) -> Result<Catalog> {
    match path {
        Some(path) => Catalog::load_from_file(path, category)
            .with_context(|| format!("Failed to load {category} catalog from {}", path.display())),
        None => Catalog::builtin_table(category)
            .with_context(|| format!("Built-in {category} catalog is malformed")),
    }
}

fn main() -> Result<()> {
    let args = Phase0Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let config = match &args.config {
        Some(path) => MatchConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => MatchConfig::default(),
    };

    let imaging = load_table(args.imaging_catalog.as_deref(), Category::Imaging)?;
    let spectroscopy = load_table(args.spectroscopy_catalog.as_deref(), Category::Spectroscopy)?;
    let catalog = imaging.merge(spectroscopy);
    log::info!(
        "Catalog: {} imaging modes, {} spectroscopy modes",
        catalog.count(Category::Imaging),
        catalog.count(Category::Spectroscopy)
    );

    let request = args.to_request().context("Invalid request")?;
    log::debug!("Request: {request:?}");

    if args.catalog_order {
        if request.category() != Category::Imaging {
            log::warn!("--catalog-order only applies to imaging, ranking instead");
        } else {
            let eligible = eligible_modes(&catalog, &request, &config);
            print!("{}", render_catalog_order(&catalog, &eligible));
            return Ok(());
        }
    }

    let recommendations = recommend(&catalog, &request, &config);
    match args.format {
        OutputFormat::Table => print!(
            "{}",
            render_table(&catalog, request.category(), &recommendations)
        ),
        OutputFormat::Json => println!(
            "{}",
            render_json(&catalog, &recommendations).context("Failed to serialize results")?
        ),
    }

    Ok(())
}
