//! Attribute-constrained candidate matching against the graph store.

use std::collections::BTreeMap;

use log::debug;

use crate::config::MatchingConfig;
use crate::graph_client::GraphQueryService;
use crate::vocab::local_name;

/// One matched entity with its display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedPerson {
    pub id: String,
    pub label: String,
}

/// Finds entities satisfying every attribute constraint.
pub struct CandidateMatch<'a> {
    graph: &'a dyn GraphQueryService,
    settings: &'a MatchingConfig,
}

impl<'a> CandidateMatch<'a> {
    pub fn new(graph: &'a dyn GraphQueryService, settings: &'a MatchingConfig) -> Self {
        Self { graph, settings }
    }

    fn build_query(&self, constraints: &BTreeMap<String, String>) -> String {
        let mut filters = vec![format!(
            "?person wdt:{} wd:{} .",
            self.settings.instance_property, self.settings.population_class
        )];
        for (key, value) in constraints {
            filters.push(format!("?person wdt:{key} <{value}> ."));
        }
        format!(
            "PREFIX wd: <http://www.wikidata.org/entity/>\n\
             PREFIX wdt: <http://www.wikidata.org/prop/direct/>\n\
             PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>\n\
             SELECT DISTINCT ?person ?label WHERE {{\n  {}\n  \
             ?person rdfs:label ?label .\n  \
             FILTER(LANG(?label) = '{}')\n}} LIMIT {}",
            filters.join("\n  "),
            self.settings.label_language,
            self.settings.candidate_cap
        )
    }

    /// Returns up to `candidate_cap` entities that are instances of the
    /// configured population class, satisfy every constraint, and carry a
    /// display label in the configured language. No ordering guarantee.
    pub fn find(
        &self,
        constraints: &BTreeMap<String, String>,
    ) -> Result<Vec<MatchedPerson>, String> {
        if constraints.is_empty() {
            debug!("empty constraint set, match query suppressed");
            return Ok(Vec::new());
        }

        let query = self.build_query(constraints);
        debug!("candidate query:\n{query}");
        let rows = self.graph.select(&query)?;

        Ok(rows
            .iter()
            .filter_map(|row| {
                let person = row.value("person")?;
                let label = row.value("label")?;
                Some(MatchedPerson {
                    id: local_name(person).to_string(),
                    label: label.to_string(),
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::{CandidateMatch, MatchedPerson};
    use crate::config::MatchingConfig;
    use crate::graph_client::{GraphQueryService, SolutionRow};

    struct RecordingGraph {
        rows: Vec<SolutionRow>,
        calls: AtomicUsize,
        last_query: Mutex<String>,
    }

    impl RecordingGraph {
        fn new(rows: Vec<SolutionRow>) -> Self {
            Self {
                rows,
                calls: AtomicUsize::new(0),
                last_query: Mutex::new(String::new()),
            }
        }
    }

    impl GraphQueryService for RecordingGraph {
        fn select(&self, query: &str) -> Result<Vec<SolutionRow>, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_query.lock().expect("query lock") = query.to_string();
            Ok(self.rows.clone())
        }
    }

    fn constraints() -> BTreeMap<String, String> {
        BTreeMap::from([
            (
                "P19".to_string(),
                "http://www.wikidata.org/entity/Q2079".to_string(),
            ),
            (
                "P106".to_string(),
                "http://www.wikidata.org/entity/Q169470".to_string(),
            ),
        ])
    }

    #[test]
    fn test_find_parses_identifier_from_uri_tail() {
        let graph = RecordingGraph::new(vec![
            SolutionRow::from_pairs(&[
                ("person", "http://www.wikidata.org/entity/Q937"),
                ("label", "Albert Einstein"),
            ]),
            SolutionRow::from_pairs(&[
                ("person", "http://www.wikidata.org/entity/Q7251"),
                ("label", "Alan Turing"),
            ]),
        ]);
        let settings = MatchingConfig::default();
        let matcher = CandidateMatch::new(&graph, &settings);
        let matches = matcher.find(&constraints()).expect("query succeeds");
        assert_eq!(
            matches,
            vec![
                MatchedPerson {
                    id: "Q937".to_string(),
                    label: "Albert Einstein".to_string(),
                },
                MatchedPerson {
                    id: "Q7251".to_string(),
                    label: "Alan Turing".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_find_skips_rows_missing_person_or_label() {
        let graph = RecordingGraph::new(vec![
            SolutionRow::from_pairs(&[("person", "http://www.wikidata.org/entity/Q937")]),
            SolutionRow::from_pairs(&[("label", "Nameless")]),
        ]);
        let settings = MatchingConfig::default();
        let matcher = CandidateMatch::new(&graph, &settings);
        let matches = matcher.find(&constraints()).expect("query succeeds");
        assert!(matches.is_empty());
    }

    #[test]
    fn test_find_with_empty_constraints_issues_no_query() {
        let graph = RecordingGraph::new(Vec::new());
        let settings = MatchingConfig::default();
        let matcher = CandidateMatch::new(&graph, &settings);
        let matches = matcher.find(&BTreeMap::new()).expect("suppressed query");
        assert!(matches.is_empty());
        assert_eq!(graph.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_query_carries_population_constraints_language_and_cap() {
        let graph = RecordingGraph::new(Vec::new());
        let settings = MatchingConfig {
            candidate_cap: 25,
            ..MatchingConfig::default()
        };
        let matcher = CandidateMatch::new(&graph, &settings);
        matcher.find(&constraints()).expect("query succeeds");

        let query = graph.last_query.lock().expect("query lock").clone();
        assert!(query.contains("?person wdt:P31 wd:Q5 ."));
        assert!(query.contains("?person wdt:P19 <http://www.wikidata.org/entity/Q2079> ."));
        assert!(query.contains("?person wdt:P106 <http://www.wikidata.org/entity/Q169470> ."));
        assert!(query.contains("FILTER(LANG(?label) = 'en')"));
        assert!(query.trim_end().ends_with("LIMIT 25"));
    }
}
