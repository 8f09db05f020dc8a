//! Offline report of related products for every product in a catalog file.
//!
//! Computes the full pairwise similarity matrix once and prints the top
//! matches per product, the same ranking the API serves for each id.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use related_products::{
    recommender::{Recommendations, Recommender, RecommenderConfig, TopKMode},
    services::InMemoryCatalog,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "similarity_report", about = "Print related products for a catalog file")]
struct Args {
    /// JSON array of products
    catalog: PathBuf,

    /// Related products listed per product
    #[arg(short = 'k', long, default_value_t = 4)]
    top_k: usize,

    /// Leave descriptions out of the feature text
    #[arg(long)]
    no_description: bool,

    /// Count the product itself against `top_k`, as the legacy batch job did
    #[arg(long)]
    candidates: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "related_products=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let catalog = InMemoryCatalog::from_file(&args.catalog)
        .with_context(|| format!("Failed to load catalog {}", args.catalog.display()))?;
    let products = catalog.snapshot()?;

    let recommender = Recommender::new(RecommenderConfig {
        top_k: args.top_k,
        top_k_mode: if args.candidates {
            TopKMode::Candidates
        } else {
            TopKMode::Survivors
        },
        include_description: !args.no_description,
    });

    let fitted = recommender
        .fit(products)
        .context("Failed to vectorize catalog")?;
    println!(
        "{} {} products, {} terms",
        style("Fitted").green().bold(),
        fitted.len(),
        fitted.vocabulary_size()
    );

    let progress = ProgressBar::new(fitted.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rows")
            .progress_chars("#>-"),
    );
    let matrix = fitted.similarity_matrix_with_progress(|_| progress.inc(1));
    progress.finish_and_clear();

    for (index, product) in fitted.products().iter().enumerate() {
        println!(
            "\n{} {} {}",
            style(&product.id).dim(),
            style(&product.name).bold(),
            style(format!("[{}]", product.category)).cyan()
        );

        match fitted.related_from(&matrix, index, args.top_k) {
            Recommendations::Ranked(items) if !items.is_empty() => {
                for item in items {
                    println!(
                        "    {:.3}  {}  {}",
                        item.score,
                        style(&item.product.id).dim(),
                        item.product.name
                    );
                }
            }
            _ => println!("    {}", style("no related products").yellow()),
        }
    }

    Ok(())
}
