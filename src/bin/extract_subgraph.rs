//! Filters a tab-separated triple dump down to the subjects belonging to a
//! target population class.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use log::{info, warn};

use kindred::dataset::{collect_population_subjects, parse_triple_line};

/// Extract the population subgraph from a triple dump.
#[derive(Parser)]
#[command(name = "kindred-extract-subgraph", version)]
struct Cli {
    /// Tab-separated triple dump to filter
    input: PathBuf,
    /// Filtered dump to write
    output: PathBuf,
    /// Relation used for the instance-of membership check
    #[arg(long, default_value = "P31")]
    instance_property: String,
    /// Class the kept subjects must be an instance of
    #[arg(long, default_value = "Q5")]
    population_class: String,
}

fn run(cli: &Cli) -> Result<(), String> {
    let first_pass = File::open(&cli.input)
        .map_err(|err| format!("failed to open {}: {err}", cli.input.display()))?;
    let subjects = collect_population_subjects(
        BufReader::new(first_pass),
        &cli.instance_property,
        &cli.population_class,
    )
    .map_err(|err| format!("failed to read {}: {err}", cli.input.display()))?;
    info!(
        "Found {} {} entities.",
        subjects.len(),
        cli.population_class
    );

    let second_pass = File::open(&cli.input)
        .map_err(|err| format!("failed to open {}: {err}", cli.input.display()))?;
    let output = File::create(&cli.output)
        .map_err(|err| format!("failed to create {}: {err}", cli.output.display()))?;
    let mut writer = BufWriter::new(output);

    let mut kept_lines = 0usize;
    for line in BufReader::new(second_pass).lines() {
        let line = line.map_err(|err| format!("failed to read {}: {err}", cli.input.display()))?;
        let Some((subject, _, _)) = parse_triple_line(&line) else {
            if !line.trim().is_empty() {
                warn!("skipping malformed line: {line}");
            }
            continue;
        };
        if subjects.contains(subject) {
            writeln!(writer, "{}", line.trim_end())
                .map_err(|err| format!("failed to write {}: {err}", cli.output.display()))?;
            kept_lines += 1;
        }
    }
    writer
        .flush()
        .map_err(|err| format!("failed to write {}: {err}", cli.output.display()))?;

    info!("There are {} lines in {}.", kept_lines, cli.output.display());
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let mut clog = colog::default_builder();
    clog.filter(None, log::LevelFilter::Info);
    clog.init();

    if let Err(reason) = run(&cli) {
        log::error!("subgraph extraction failed: {reason}");
        std::process::exit(1);
    }
}
