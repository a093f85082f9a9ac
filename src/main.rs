use clap::Parser;
use log::{debug, info};

use kindred::config::{sanitize_config, Config};
use kindred::entity_search::LabelSearchClient;
use kindred::graph_client::SparqlClient;
use kindred::image_probe::LinkedDataImageSource;
use kindred::ranking_pipeline::{PipelineOutcome, RankingPipeline};
use kindred::similarity::HttpSimilarityOracle;

const CONFIG_FILE_NAME: &str = "kindred.toml";

/// Find and rank people similar to a subject in the person knowledge graph.
#[derive(Parser)]
#[command(name = "kindred", version)]
struct Cli {
    /// Subject name, e.g. "Albert Einstein" (a raw identifier also works)
    subject: String,
    /// Comma-separated attribute keys to match on, e.g. "P19, P106"
    #[arg(short, long)]
    attributes: String,
    /// How many similar people to report
    #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u8).range(1..=20))]
    limit: u8,
    /// Log per-request detail
    #[arg(short, long)]
    verbose: bool,
}

fn load_config() -> Config {
    let Some(config_dir) = dirs::config_dir() else {
        info!("no config directory available, using built-in defaults");
        return Config::default();
    };
    let config_file = config_dir.join(CONFIG_FILE_NAME);

    if !config_file.exists() {
        let default_config = Config::default();
        info!(
            "Config file not found. Creating default config. path={}",
            config_file.display()
        );
        match toml::to_string(&default_config) {
            Ok(config_text) => {
                if let Err(err) = std::fs::write(&config_file, config_text) {
                    log::error!(
                        "Failed to persist default config to {}: {}",
                        config_file.display(),
                        err
                    );
                }
            }
            Err(err) => log::error!("Failed to serialize default config: {}", err),
        }
        return default_config;
    }

    let config_content = std::fs::read_to_string(&config_file).unwrap_or_default();
    sanitize_config(toml::from_str::<Config>(&config_content).unwrap_or_default())
}

fn main() {
    let cli = Cli::parse();

    let mut clog = colog::default_builder();
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    clog.filter(None, level);
    clog.init();

    let config = load_config();
    debug!("endpoints: {:?}", config.endpoints);

    let search = LabelSearchClient::new(
        &config.endpoints.label_search_url,
        &config.matching.label_language,
    );
    let graph = SparqlClient::new(&config.endpoints.graph_store_url);
    let linked_data = SparqlClient::new(&config.endpoints.linked_data_sparql_url);
    let oracle = HttpSimilarityOracle::new(&config.endpoints.similarity_oracle_url);
    let images = LinkedDataImageSource::new(
        &linked_data,
        &config.scoring.resource_namespace,
        &config.images,
    );

    let attribute_keys: Vec<String> = cli
        .attributes
        .split(',')
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .collect();

    let pipeline = RankingPipeline::new(&search, &graph, &oracle, &images, &config);
    match pipeline.run(&cli.subject, &attribute_keys, usize::from(cli.limit)) {
        Ok(PipelineOutcome::SubjectNotFound) => {
            println!("Could not find '{}' in the knowledge graph.", cli.subject);
        }
        Ok(PipelineOutcome::NoMatchingAttributes) => {
            println!("No matching attribute values found for '{}'.", cli.subject);
        }
        Ok(PipelineOutcome::Ranked(results)) => {
            println!("Top {} similar people to {}:", results.len(), cli.subject);
            for (index, entry) in results.iter().enumerate() {
                println!(
                    "{}. {}  (similarity: {:.4})",
                    index + 1,
                    entry.label,
                    entry.score
                );
                if let Some(image_url) = &entry.image_url {
                    println!("   image: {image_url}");
                }
            }
        }
        Err(reason) => {
            log::error!("pipeline failed: {reason}");
            std::process::exit(1);
        }
    }
}
