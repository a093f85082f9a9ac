//! Pairwise semantic similarity scoring via the external oracle.

use std::time::Duration;

/// Derives the linked-data resource reference for a display label:
/// trimmed, spaces replaced with underscores, URL-escaped, prefixed with the
/// configured resource namespace.
pub fn resource_reference(namespace: &str, label: &str) -> String {
    let slug = label.trim().replace(' ', "_");
    format!("{namespace}{}", urlencoding::encode(&slug))
}

/// Interface to a service scoring the similarity of two resource references.
pub trait SimilarityOracle: Send + Sync {
    /// Returns a similarity in [0,1], or a failure reason. Callers decide
    /// how a failure degrades; this interface never substitutes defaults.
    fn similarity(&self, reference_a: &str, reference_b: &str) -> Result<f64, String>;
}

#[derive(Debug, serde::Deserialize)]
struct SimilarityResponse {
    similarity: f64,
}

/// Similarity oracle client backed by an HTTP endpoint.
pub struct HttpSimilarityOracle {
    endpoint: String,
    http_client: ureq::Agent,
}

impl HttpSimilarityOracle {
    /// Creates a client bound to one oracle endpoint URL.
    pub fn new(endpoint: &str) -> Self {
        let http_client = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(Duration::from_secs(15))
            .timeout_write(Duration::from_secs(15))
            .build();
        Self {
            endpoint: endpoint.trim().trim_end_matches('/').to_string(),
            http_client,
        }
    }
}

impl SimilarityOracle for HttpSimilarityOracle {
    fn similarity(&self, reference_a: &str, reference_b: &str) -> Result<f64, String> {
        let url = format!(
            "{}?a={}&b={}",
            self.endpoint,
            urlencoding::encode(reference_a),
            urlencoding::encode(reference_b)
        );
        let response = self
            .http_client
            .get(&url)
            .call()
            .map_err(|err| format!("similarity request failed: {err}"))?;
        let parsed: SimilarityResponse = response
            .into_json()
            .map_err(|err| format!("similarity response parse failed: {err}"))?;
        if !parsed.similarity.is_finite() || !(0.0..=1.0).contains(&parsed.similarity) {
            return Err(format!(
                "similarity out of range: {}",
                parsed.similarity
            ));
        }
        Ok(parsed.similarity)
    }
}

/// Scores two display labels by deriving resource references and delegating
/// to the oracle.
pub struct SimilarityScorer<'a> {
    oracle: &'a dyn SimilarityOracle,
    resource_namespace: &'a str,
}

impl<'a> SimilarityScorer<'a> {
    pub fn new(oracle: &'a dyn SimilarityOracle, resource_namespace: &'a str) -> Self {
        Self {
            oracle,
            resource_namespace,
        }
    }

    /// Scores `label_a` against `label_b`. Failures propagate; the pipeline
    /// maps them to the configured sentinel.
    pub fn score(&self, label_a: &str, label_b: &str) -> Result<f64, String> {
        let reference_a = resource_reference(self.resource_namespace, label_a);
        let reference_b = resource_reference(self.resource_namespace, label_b);
        self.oracle.similarity(&reference_a, &reference_b)
    }
}
