//! End-to-end similar-person ranking pipeline.
//!
//! Linear flow: resolve subject → fetch its attributes → match candidates →
//! exclude the subject → score → sort → truncate → attach verified images.
//! Resolution, fetching, and matching are load-bearing and abort the run on
//! failure; similarity and images are enrichments and degrade per entry.

use log::{debug, info, warn};

use crate::attribute_lookup::AttributeLookup;
use crate::candidate_match::CandidateMatch;
use crate::config::Config;
use crate::entity_search::{EntityResolver, EntitySearchService};
use crate::graph_client::GraphQueryService;
use crate::image_probe::ImageSource;
use crate::similarity::{SimilarityOracle, SimilarityScorer};

/// Smallest accepted result limit.
pub const MIN_RESULT_LIMIT: usize = 1;
/// Largest accepted result limit.
pub const MAX_RESULT_LIMIT: usize = 20;

/// One ranked entry of the final result.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedPerson {
    pub label: String,
    pub score: f64,
    pub image_url: Option<String>,
}

/// Terminal outcome of one pipeline invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// The subject label resolved to no identifier.
    SubjectNotFound,
    /// The subject has none of the requested attributes.
    NoMatchingAttributes,
    /// Candidates ranked by similarity, best first.
    Ranked(Vec<RankedPerson>),
}

/// Orchestrates the resolution, matching, scoring, and image stages.
pub struct RankingPipeline<'a> {
    search: &'a dyn EntitySearchService,
    graph: &'a dyn GraphQueryService,
    oracle: &'a dyn SimilarityOracle,
    images: &'a dyn ImageSource,
    config: &'a Config,
}

impl<'a> RankingPipeline<'a> {
    pub fn new(
        search: &'a dyn EntitySearchService,
        graph: &'a dyn GraphQueryService,
        oracle: &'a dyn SimilarityOracle,
        images: &'a dyn ImageSource,
        config: &'a Config,
    ) -> Self {
        Self {
            search,
            graph,
            oracle,
            images,
            config,
        }
    }

    fn attach_image(&self, label: &str) -> Option<String> {
        let candidate_url = match self.images.find_image(label) {
            Ok(found) => found,
            Err(reason) => {
                debug!("image lookup failed for '{label}': {reason}");
                None
            }
        };
        candidate_url.filter(|url| self.images.is_displayable(url))
    }

    /// Runs the full pipeline for one subject. `limit` is clamped to
    /// [MIN_RESULT_LIMIT, MAX_RESULT_LIMIT].
    pub fn run(
        &self,
        subject_label: &str,
        attribute_keys: &[String],
        limit: usize,
    ) -> Result<PipelineOutcome, String> {
        let limit = limit.clamp(MIN_RESULT_LIMIT, MAX_RESULT_LIMIT);

        let resolver = EntityResolver::new(self.search);
        let Some(subject_id) = resolver.resolve(subject_label)? else {
            info!("subject '{subject_label}' not found");
            return Ok(PipelineOutcome::SubjectNotFound);
        };
        info!("subject '{subject_label}' resolved to {subject_id}");

        let lookup = AttributeLookup::new(self.graph);
        let constraints = lookup.fetch(&subject_id, attribute_keys)?;
        if constraints.is_empty() {
            info!("subject {subject_id} has none of the requested attributes");
            return Ok(PipelineOutcome::NoMatchingAttributes);
        }
        info!(
            "matching on {} attribute(s): {}",
            constraints.len(),
            constraints
                .keys()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );

        let matcher = CandidateMatch::new(self.graph, &self.config.matching);
        let mut candidates = matcher.find(&constraints)?;
        info!("matched {} candidate(s)", candidates.len());

        // The subject trivially matches its own attributes.
        candidates.retain(|candidate| candidate.id != subject_id);

        let scorer = SimilarityScorer::new(self.oracle, &self.config.scoring.resource_namespace);
        let sentinel = self.config.scoring.similarity_sentinel;
        let mut scored: Vec<RankedPerson> = candidates
            .into_iter()
            .map(|candidate| {
                let score = match scorer.score(&candidate.label, subject_label) {
                    Ok(score) => score,
                    Err(reason) => {
                        warn!(
                            "similarity unavailable for '{}', using sentinel: {reason}",
                            candidate.label
                        );
                        sentinel
                    }
                };
                RankedPerson {
                    label: candidate.label,
                    score,
                    image_url: None,
                }
            })
            .collect();

        // Stable sort: ties keep original match order.
        scored.sort_by(|left, right| {
            right
                .score
                .partial_cmp(&left.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);

        for entry in &mut scored {
            entry.image_url = self.attach_image(&entry.label);
        }

        Ok(PipelineOutcome::Ranked(scored))
    }
}
