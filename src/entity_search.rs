//! Label-to-identifier resolution against the entity search service.

use std::time::Duration;

use log::debug;

/// One match returned by the label-search service.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct EntityHit {
    pub id: String,
}

#[derive(Debug, serde::Deserialize)]
struct SearchResponse {
    #[serde(default)]
    search: Vec<EntityHit>,
}

/// Interface to a service mapping free text to candidate entity identifiers.
pub trait EntitySearchService: Send + Sync {
    /// Returns matches ordered by service-side relevance.
    fn search(&self, text: &str) -> Result<Vec<EntityHit>, String>;
}

/// Entity search client backed by a `wbsearchentities`-style API.
pub struct LabelSearchClient {
    api_url: String,
    language: String,
    http_client: ureq::Agent,
}

impl LabelSearchClient {
    /// Creates a client bound to one search API URL and label language.
    pub fn new(api_url: &str, language: &str) -> Self {
        let http_client = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(Duration::from_secs(15))
            .timeout_write(Duration::from_secs(15))
            .build();
        Self {
            api_url: api_url.trim().trim_end_matches('/').to_string(),
            language: language.to_string(),
            http_client,
        }
    }

    fn search_url(&self, text: &str) -> String {
        format!(
            "{}?action=wbsearchentities&language={}&format=json&search={}",
            self.api_url,
            urlencoding::encode(&self.language),
            urlencoding::encode(text)
        )
    }
}

impl EntitySearchService for LabelSearchClient {
    fn search(&self, text: &str) -> Result<Vec<EntityHit>, String> {
        let url = self.search_url(text);
        let response = self
            .http_client
            .get(&url)
            .call()
            .map_err(|err| format!("entity search request failed: {err}"))?;
        let parsed: SearchResponse = response
            .into_json()
            .map_err(|err| format!("entity search response parse failed: {err}"))?;
        Ok(parsed.search)
    }
}

/// Returns true if `label` is already a canonical entity or relation
/// identifier: a case-insensitive `P`/`Q` prefix followed only by digits.
pub fn is_canonical_identifier(label: &str) -> bool {
    let mut chars = label.chars();
    let Some(prefix) = chars.next() else {
        return false;
    };
    if !matches!(prefix, 'P' | 'p' | 'Q' | 'q') {
        return false;
    }
    let rest = chars.as_str();
    !rest.is_empty() && rest.bytes().all(|byte| byte.is_ascii_digit())
}

/// Resolves a free-text label to a canonical identifier. First match wins;
/// no disambiguation.
pub struct EntityResolver<'a> {
    search: &'a dyn EntitySearchService,
}

impl<'a> EntityResolver<'a> {
    pub fn new(search: &'a dyn EntitySearchService) -> Self {
        Self { search }
    }

    /// Maps `label` to an identifier, or `Ok(None)` if the service has no
    /// match. Labels that already are identifiers bypass the service call.
    pub fn resolve(&self, label: &str) -> Result<Option<String>, String> {
        let trimmed = label.trim();
        if is_canonical_identifier(trimmed) {
            debug!("label '{trimmed}' is already a canonical identifier");
            return Ok(Some(trimmed.to_string()));
        }
        let hits = self.search.search(trimmed)?;
        Ok(hits.into_iter().next().map(|hit| hit.id))
    }
}
