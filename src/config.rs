//! Persistent application configuration model and defaults.

/// Root configuration persisted to `kindred.toml`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Config {
    /// Remote service endpoints.
    #[serde(default)]
    pub endpoints: EndpointConfig,
    #[serde(default)]
    /// Candidate matching behavior.
    pub matching: MatchingConfig,
    #[serde(default)]
    /// Similarity scoring behavior.
    pub scoring: ScoringConfig,
    #[serde(default)]
    /// Image lookup and displayability probing behavior.
    pub images: ImageConfig,
}

/// Remote service endpoint URLs, fixed at startup.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct EndpointConfig {
    /// SPARQL repository holding the person subgraph.
    #[serde(default = "default_graph_store_url")]
    pub graph_store_url: String,
    /// Free-text entity search API.
    #[serde(default = "default_label_search_url")]
    pub label_search_url: String,
    /// Public linked-data SPARQL endpoint used for image lookups.
    #[serde(default = "default_linked_data_sparql_url")]
    pub linked_data_sparql_url: String,
    /// Semantic similarity oracle endpoint.
    #[serde(default = "default_similarity_oracle_url")]
    pub similarity_oracle_url: String,
}

/// Candidate matching preferences.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct MatchingConfig {
    /// Upper bound on candidates returned by one match query.
    #[serde(default = "default_candidate_cap")]
    pub candidate_cap: u32,
    /// Class every candidate must be an instance of.
    #[serde(default = "default_population_class")]
    pub population_class: String,
    /// Relation used for the instance-of membership check.
    #[serde(default = "default_instance_property")]
    pub instance_property: String,
    /// Language a candidate must carry a display label in.
    #[serde(default = "default_label_language")]
    pub label_language: String,
}

/// Similarity scoring preferences.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ScoringConfig {
    /// Score assigned when the oracle fails for a candidate pair.
    #[serde(default)]
    pub similarity_sentinel: f64,
    /// Namespace prepended to derived resource references.
    #[serde(default = "default_resource_namespace")]
    pub resource_namespace: String,
}

/// Image lookup preferences.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ImageConfig {
    /// Displayability probe timeout, in seconds.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u32,
    /// Upper bound on probed image payload size, in megabytes.
    #[serde(default = "default_probe_max_payload_mb")]
    pub probe_max_payload_mb: u32,
}

fn default_graph_store_url() -> String {
    "http://localhost:7200/repositories/human_similarity".to_string()
}

fn default_label_search_url() -> String {
    "https://www.wikidata.org/w/api.php".to_string()
}

fn default_linked_data_sparql_url() -> String {
    "https://dbpedia.org/sparql".to_string()
}

fn default_similarity_oracle_url() -> String {
    "http://localhost:8400/similarity".to_string()
}

fn default_candidate_cap() -> u32 {
    100
}

fn default_population_class() -> String {
    "Q5".to_string()
}

fn default_instance_property() -> String {
    "P31".to_string()
}

fn default_label_language() -> String {
    "en".to_string()
}

fn default_resource_namespace() -> String {
    "http://dbpedia.org/resource/".to_string()
}

fn default_probe_timeout_secs() -> u32 {
    5
}

fn default_probe_max_payload_mb() -> u32 {
    8
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            graph_store_url: default_graph_store_url(),
            label_search_url: default_label_search_url(),
            linked_data_sparql_url: default_linked_data_sparql_url(),
            similarity_oracle_url: default_similarity_oracle_url(),
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            candidate_cap: default_candidate_cap(),
            population_class: default_population_class(),
            instance_property: default_instance_property(),
            label_language: default_label_language(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            similarity_sentinel: 0.0,
            resource_namespace: default_resource_namespace(),
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            probe_timeout_secs: default_probe_timeout_secs(),
            probe_max_payload_mb: default_probe_max_payload_mb(),
        }
    }
}

/// Clamps loaded configuration into ranges the pipeline can operate with.
pub fn sanitize_config(config: Config) -> Config {
    let clamped_cap = config.matching.candidate_cap.clamp(1, 10_000);
    let clamped_sentinel = if config.scoring.similarity_sentinel.is_finite() {
        config.scoring.similarity_sentinel.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let clamped_probe_timeout = config.images.probe_timeout_secs.clamp(1, 60);
    let clamped_probe_payload = config.images.probe_max_payload_mb.clamp(1, 64);

    Config {
        endpoints: config.endpoints,
        matching: MatchingConfig {
            candidate_cap: clamped_cap,
            ..config.matching
        },
        scoring: ScoringConfig {
            similarity_sentinel: clamped_sentinel,
            ..config.scoring
        },
        images: ImageConfig {
            probe_timeout_secs: clamped_probe_timeout,
            probe_max_payload_mb: clamped_probe_payload,
        },
    }
}
