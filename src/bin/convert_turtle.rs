//! Converts a tab-separated triple dump into Turtle syntax suitable for
//! loading into the graph store.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use log::{info, warn};

use kindred::dataset::{parse_triple_line, triple_to_turtle, turtle_prelude};

/// Convert a filtered triple dump to Turtle.
#[derive(Parser)]
#[command(name = "kindred-convert-turtle", version)]
struct Cli {
    /// Tab-separated triple dump to convert
    input: PathBuf,
    /// Turtle file to write
    output: PathBuf,
}

fn run(cli: &Cli) -> Result<(), String> {
    let input = File::open(&cli.input)
        .map_err(|err| format!("failed to open {}: {err}", cli.input.display()))?;
    let output = File::create(&cli.output)
        .map_err(|err| format!("failed to create {}: {err}", cli.output.display()))?;
    let mut writer = BufWriter::new(output);

    writer
        .write_all(turtle_prelude().as_bytes())
        .map_err(|err| format!("failed to write {}: {err}", cli.output.display()))?;

    let mut triple_count = 0usize;
    for line in BufReader::new(input).lines() {
        let line = line.map_err(|err| format!("failed to read {}: {err}", cli.input.display()))?;
        let Some((subject, predicate, object)) = parse_triple_line(&line) else {
            if !line.trim().is_empty() {
                warn!("skipping malformed line: {line}");
            }
            continue;
        };
        writer
            .write_all(triple_to_turtle(subject, predicate, object).as_bytes())
            .map_err(|err| format!("failed to write {}: {err}", cli.output.display()))?;
        triple_count += 1;
    }
    writer
        .flush()
        .map_err(|err| format!("failed to write {}: {err}", cli.output.display()))?;

    info!(
        "Turtle file with {} triples written to: {}.",
        triple_count,
        cli.output.display()
    );
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let mut clog = colog::default_builder();
    clog.filter(None, log::LevelFilter::Info);
    clog.init();

    if let Err(reason) = run(&cli) {
        log::error!("turtle conversion failed: {reason}");
        std::process::exit(1);
    }
}
