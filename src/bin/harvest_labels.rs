//! Harvests display labels for every entity referenced by a Turtle subgraph,
//! fetching them in batches from the public entity API.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use log::info;

use kindred::dataset::{
    extract_entity_ids, label_prelude, label_triple, LabelHarvestClient, LABEL_BATCH_SIZE,
};

/// Fetch display labels for a Turtle subgraph.
#[derive(Parser)]
#[command(name = "kindred-harvest-labels", version)]
struct Cli {
    /// Turtle subgraph whose entities need labels
    input: PathBuf,
    /// Turtle label file to write
    output: PathBuf,
    /// Entity API endpoint
    #[arg(long, default_value = "https://www.wikidata.org/w/api.php")]
    api_url: String,
    /// Label language to harvest
    #[arg(long, default_value = "en")]
    language: String,
}

fn run(cli: &Cli) -> Result<(), String> {
    info!("Extracting entity ids...");
    let text = fs::read_to_string(&cli.input)
        .map_err(|err| format!("failed to read {}: {err}", cli.input.display()))?;
    let ids: Vec<String> = extract_entity_ids(&text).into_iter().collect();
    info!("Found {} unique entity ids.", ids.len());

    let client = LabelHarvestClient::new(&cli.api_url, &cli.language);
    let mut labels: BTreeMap<String, String> = BTreeMap::new();
    for (batch_index, batch) in ids.chunks(LABEL_BATCH_SIZE).enumerate() {
        // A skipped batch is already logged by the client; keep harvesting.
        if let Some(batch_labels) = client.fetch_batch(batch) {
            labels.extend(batch_labels);
        }
        info!(
            "batch {}/{}: {} labels so far",
            batch_index + 1,
            ids.len().div_ceil(LABEL_BATCH_SIZE),
            labels.len()
        );
    }
    info!("Retrieved {} labels.", labels.len());

    let output = File::create(&cli.output)
        .map_err(|err| format!("failed to create {}: {err}", cli.output.display()))?;
    let mut writer = BufWriter::new(output);
    writer
        .write_all(label_prelude().as_bytes())
        .map_err(|err| format!("failed to write {}: {err}", cli.output.display()))?;
    for (id, label) in &labels {
        writer
            .write_all(label_triple(id, label, &cli.language).as_bytes())
            .map_err(|err| format!("failed to write {}: {err}", cli.output.display()))?;
    }
    writer
        .flush()
        .map_err(|err| format!("failed to write {}: {err}", cli.output.display()))?;

    info!("Wrote {}.", cli.output.display());
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let mut clog = colog::default_builder();
    clog.filter(None, log::LevelFilter::Info);
    clog.init();

    if let Err(reason) = run(&cli) {
        log::error!("label harvesting failed: {reason}");
        std::process::exit(1);
    }
}
