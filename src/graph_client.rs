//! SPARQL SELECT client abstraction and `ureq`-backed implementation.

use std::collections::HashMap;
use std::time::Duration;

/// One value bound to a query variable in a solution row.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct BoundValue {
    pub value: String,
}

#[derive(Debug, serde::Deserialize)]
struct SelectResults {
    #[serde(default)]
    bindings: Vec<HashMap<String, BoundValue>>,
}

#[derive(Debug, serde::Deserialize)]
struct SelectResponse {
    results: SelectResults,
}

/// One solution row of a SELECT result. Absence of a binding is not an error.
#[derive(Debug, Clone, Default)]
pub struct SolutionRow {
    bindings: HashMap<String, BoundValue>,
}

impl SolutionRow {
    /// Returns the value bound to `variable`, if the row binds it.
    pub fn value(&self, variable: &str) -> Option<&str> {
        self.bindings.get(variable).map(|bound| bound.value.as_str())
    }

    /// Iterates over every (variable, value) binding in the row.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings
            .iter()
            .map(|(variable, bound)| (variable.as_str(), bound.value.as_str()))
    }

    #[cfg(test)]
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let bindings = pairs
            .iter()
            .map(|(variable, value)| {
                (
                    (*variable).to_string(),
                    BoundValue {
                        value: (*value).to_string(),
                    },
                )
            })
            .collect();
        Self { bindings }
    }
}

/// Interface to a service answering SPARQL SELECT queries.
pub trait GraphQueryService: Send + Sync {
    fn select(&self, query: &str) -> Result<Vec<SolutionRow>, String>;
}

/// SPARQL endpoint client backed by `ureq`.
pub struct SparqlClient {
    endpoint: String,
    http_client: ureq::Agent,
}

impl SparqlClient {
    /// Creates a client bound to one SPARQL endpoint URL.
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

    fn query_url(&self, query: &str) -> String {
        format!("{}?query={}", self.endpoint, urlencoding::encode(query))
    }
}

impl GraphQueryService for SparqlClient {
    fn select(&self, query: &str) -> Result<Vec<SolutionRow>, String> {
        let url = self.query_url(query);
        let response = self
            .http_client
            .get(&url)
            .set("Accept", "application/sparql-results+json")
            .call()
            .map_err(|err| format!("SPARQL request failed ({}): {err}", self.endpoint))?;
        let parsed: SelectResponse = response
            .into_json()
            .map_err(|err| format!("SPARQL response parse failed ({}): {err}", self.endpoint))?;
        Ok(parsed
            .results
            .bindings
            .into_iter()
            .map(|bindings| SolutionRow { bindings })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{SelectResponse, SolutionRow, SparqlClient};

    #[test]
    fn test_select_response_parses_rows_and_missing_bindings() {
        let body = r#"{
            "head": {"vars": ["person", "label"]},
            "results": {"bindings": [
                {
                    "person": {"type": "uri", "value": "http://www.wikidata.org/entity/Q937"},
                    "label": {"type": "literal", "xml:lang": "en", "value": "Albert Einstein"}
                },
                {
                    "person": {"type": "uri", "value": "http://www.wikidata.org/entity/Q7251"}
                }
            ]}
        }"#;
        let parsed: SelectResponse = serde_json::from_str(body).expect("valid result body");
        let rows: Vec<SolutionRow> = parsed
            .results
            .bindings
            .into_iter()
            .map(|bindings| SolutionRow { bindings })
            .collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].value("label"), Some("Albert Einstein"));
        assert_eq!(rows[1].value("person"), Some("http://www.wikidata.org/entity/Q7251"));
        assert_eq!(rows[1].value("label"), None);
    }

    #[test]
    fn test_empty_results_parse_to_no_rows() {
        let body = r#"{"head": {"vars": []}, "results": {"bindings": []}}"#;
        let parsed: SelectResponse = serde_json::from_str(body).expect("valid result body");
        assert!(parsed.results.bindings.is_empty());
    }

    #[test]
    fn test_query_url_escapes_query_text() {
        let client = SparqlClient::new("http://localhost:7200/repositories/people/");
        let url = client.query_url("SELECT * WHERE { ?s ?p ?o }");
        assert!(url.starts_with("http://localhost:7200/repositories/people?query=SELECT"));
        assert!(!url.contains('{'));
        assert!(!url.contains(' '));
    }
}
