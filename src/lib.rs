//! # kindred
//!
//! Finds and ranks people similar to a named subject in a Wikidata-derived
//! knowledge graph. The subject's label is resolved to a canonical
//! identifier, candidates sharing a chosen set of attributes are matched in
//! the graph store, each candidate is scored against the subject by an
//! external semantic-similarity oracle, and the ranked result is decorated
//! with verified illustrative images.
//!
//! The crate also ships the dataset toolchain that produces the person
//! subgraph the pipeline queries: dump filtering, Turtle conversion, and
//! bulk label harvesting.

pub mod attribute_lookup;
pub mod candidate_match;
pub mod config;
pub mod dataset;
pub mod entity_search;
pub mod graph_client;
pub mod image_probe;
pub mod ranking_pipeline;
pub mod similarity;
pub mod vocab;

pub use config::Config;
pub use ranking_pipeline::{PipelineOutcome, RankedPerson, RankingPipeline};
