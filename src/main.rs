use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::level_filters::LevelFilter;

use display_assets::LibraryBuilder;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the catalog describing the library (.ron or .json)
    #[arg(short, long, default_value = "config/catalog.ron")]
    config: PathBuf,
    /// Log more detail; repeat for per-frame and per-glyph output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Args {
    fn log_level(&self) -> LevelFilter {
        match (self.quiet, self.verbose) {
            (true, _) => LevelFilter::WARN,
            (false, 0) => LevelFilter::INFO,
            (false, 1) => LevelFilter::DEBUG,
            (false, _) => LevelFilter::TRACE,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .with_target(false)
        .init();

    let builder = LibraryBuilder::from_catalog_file(&args.config)
        .with_context(|| format!("Failed to load catalog {}", args.config.display()))?;
    let report = builder.build().context("Failed to build asset library")?;

    for collision in &report.collisions {
        eprintln!(
            "! {} contains {} more than once ({})",
            collision.file,
            collision.id,
            collision.paths.join(", ")
        );
    }

    if !report.failures.is_empty() {
        for failure in &report.failures {
            eprintln!("! {}: {}", failure.path.display(), failure.error);
        }
        bail!(
            "{} of {} assets failed to encode",
            report.failures.len(),
            report.failures.len() + report.records
        );
    }

    println!(
        "Ok. {} assets in {} files under {}",
        report.records,
        report.files.len(),
        report.build_dir.display()
    );
    Ok(())
}
