//! Dataset preparation helpers: triple-dump filtering, Turtle conversion,
//! and bulk label harvesting from the public entity API.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::io::BufRead;
use std::num::NonZeroU32;
use std::sync::OnceLock;
use std::time::Duration;

use governor::state::NotKeyed;
use governor::{Quota, RateLimiter};
use log::{info, warn};
use regex::Regex;

use crate::vocab::{entity_uri, property_uri, DIRECT_PROPERTY_NS, ENTITY_NS, RDFS_NS};

/// Identifiers fetched per entity-API request.
pub const LABEL_BATCH_SIZE: usize = 50;
/// Attempts per batch before it is skipped.
pub const LABEL_BATCH_MAX_RETRIES: u32 = 3;
/// Fixed backoff between batch retries.
pub const LABEL_BATCH_RETRY_BACKOFF: Duration = Duration::from_secs(5);

/// Splits one dump line into (subject, predicate, object). Lines are three
/// tab-separated identifier tokens; anything else is malformed.
pub fn parse_triple_line(line: &str) -> Option<(&str, &str, &str)> {
    let mut parts = line.trim().split('\t');
    let subject = parts.next()?;
    let predicate = parts.next()?;
    let object = parts.next()?;
    if subject.is_empty() || predicate.is_empty() || object.is_empty() || parts.next().is_some() {
        return None;
    }
    Some((subject, predicate, object))
}

/// Collects every subject asserted to be an instance of `population_class`.
pub fn collect_population_subjects<R: BufRead>(
    reader: R,
    instance_property: &str,
    population_class: &str,
) -> std::io::Result<HashSet<String>> {
    let mut subjects = HashSet::new();
    for line in reader.lines() {
        let line = line?;
        let Some((subject, predicate, object)) = parse_triple_line(&line) else {
            continue;
        };
        if predicate == instance_property && object == population_class {
            subjects.insert(subject.to_string());
        }
    }
    Ok(subjects)
}

/// Prefix block emitted at the top of converted Turtle files.
pub fn turtle_prelude() -> String {
    format!("@prefix wd: <{ENTITY_NS}> .\n@prefix wdt: <{DIRECT_PROPERTY_NS}> .\n\n")
}

/// Prefix block emitted at the top of harvested label files.
pub fn label_prelude() -> String {
    format!("@prefix rdfs: <{RDFS_NS}> .\n@prefix wd: <{ENTITY_NS}> .\n\n")
}

/// Renders one dump triple as a Turtle statement with full URIs.
pub fn triple_to_turtle(subject: &str, predicate: &str, object: &str) -> String {
    format!(
        "<{}> <{}> <{}> .\n",
        entity_uri(subject),
        property_uri(predicate),
        entity_uri(object)
    )
}

fn escape_label(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Renders one harvested label as a Turtle statement.
pub fn label_triple(id: &str, label: &str, language: &str) -> String {
    format!(
        "<{}> rdfs:label \"{}\"@{} .\n",
        entity_uri(id),
        escape_label(label),
        language
    )
}

/// Extracts every entity identifier referenced by a Turtle document, sorted
/// and deduplicated.
pub fn extract_entity_ids(text: &str) -> BTreeSet<String> {
    static ENTITY_ID: OnceLock<Regex> = OnceLock::new();
    let pattern = ENTITY_ID.get_or_init(|| Regex::new(r"entity/(Q\d+)").expect("valid pattern"));
    pattern
        .captures_iter(text)
        .map(|captures| captures[1].to_string())
        .collect()
}

#[derive(Debug, serde::Deserialize)]
struct LabelValue {
    value: String,
}

#[derive(Debug, serde::Deserialize)]
struct EntityRecord {
    #[serde(default)]
    labels: HashMap<String, LabelValue>,
}

#[derive(Debug, serde::Deserialize)]
struct EntitiesResponse {
    #[serde(default)]
    entities: HashMap<String, EntityRecord>,
}

/// Batched label fetcher against a `wbgetentities`-style API, paced by a
/// rate limiter and retried with fixed backoff.
pub struct LabelHarvestClient {
    api_url: String,
    language: String,
    http_client: ureq::Agent,
    request_limiter:
        RateLimiter<NotKeyed, governor::state::InMemoryState, governor::clock::DefaultClock>,
}

impl LabelHarvestClient {
    /// Creates a harvester bound to one entity API URL and label language.
    pub fn new(api_url: &str, language: &str) -> Self {
        let http_client = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(Duration::from_secs(30))
            .timeout_write(Duration::from_secs(30))
            .build();
        Self {
            api_url: api_url.trim().trim_end_matches('/').to_string(),
            language: language.to_string(),
            http_client,
            request_limiter: RateLimiter::direct(
                Quota::with_period(Duration::from_secs(1))
                    .expect("valid limiter period")
                    .allow_burst(NonZeroU32::new(1).expect("non-zero limiter burst")),
            ),
        }
    }

    fn batch_url(&self, ids: &[String]) -> String {
        format!(
            "{}?action=wbgetentities&ids={}&format=json&props=labels&languages={}",
            self.api_url,
            urlencoding::encode(&ids.join("|")),
            urlencoding::encode(&self.language)
        )
    }

    fn wait_for_request_slot(&self) {
        while self.request_limiter.check().is_err() {
            std::thread::sleep(Duration::from_millis(100));
        }
    }

    fn fetch_batch_once(&self, ids: &[String]) -> Result<BTreeMap<String, String>, String> {
        self.wait_for_request_slot();
        let url = self.batch_url(ids);
        let response = self
            .http_client
            .get(&url)
            .call()
            .map_err(|err| format!("label batch request failed: {err}"))?;
        let parsed: EntitiesResponse = response
            .into_json()
            .map_err(|err| format!("label batch parse failed: {err}"))?;

        let mut labels = BTreeMap::new();
        for id in ids {
            let label = parsed
                .entities
                .get(id)
                .and_then(|record| record.labels.get(&self.language))
                .map(|value| value.value.clone());
            if let Some(label) = label {
                labels.insert(id.clone(), label);
            }
        }
        Ok(labels)
    }

    /// Fetches labels for one batch, retrying transient failures with fixed
    /// backoff. Returns `None` when the batch is skipped after exhausting
    /// retries; identifiers with no label in the target language are simply
    /// absent from the result.
    pub fn fetch_batch(&self, ids: &[String]) -> Option<BTreeMap<String, String>> {
        let mut attempts = 0;
        loop {
            match self.fetch_batch_once(ids) {
                Ok(labels) => return Some(labels),
                Err(reason) => {
                    attempts += 1;
                    if attempts >= LABEL_BATCH_MAX_RETRIES {
                        warn!("skipping batch of {} after {attempts} attempts: {reason}", ids.len());
                        return None;
                    }
                    info!(
                        "label batch failed (attempt {attempts}/{LABEL_BATCH_MAX_RETRIES}), retrying: {reason}"
                    );
                    std::thread::sleep(LABEL_BATCH_RETRY_BACKOFF);
                }
            }
        }
    }
}
