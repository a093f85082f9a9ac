//! Attribute fetching for a single resolved entity.

use std::collections::BTreeMap;

use log::debug;

use crate::graph_client::GraphQueryService;

const VALUE_VARIABLE_PREFIX: &str = "val_";

/// Returns the normalized form of `key` if it matches the attribute-identifier
/// pattern (case-insensitive `P` prefix followed only by digits), `None`
/// otherwise. Caller input is free text; non-conforming keys are dropped, not
/// rejected.
pub fn normalize_attribute_key(key: &str) -> Option<String> {
    let trimmed = key.trim();
    let mut chars = trimmed.chars();
    if !matches!(chars.next(), Some('P' | 'p')) {
        return None;
    }
    let rest = chars.as_str();
    if rest.is_empty() || !rest.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    Some(format!("P{rest}"))
}

/// Fetches current attribute values for one entity from the graph store.
pub struct AttributeLookup<'a> {
    graph: &'a dyn GraphQueryService,
}

impl<'a> AttributeLookup<'a> {
    pub fn new(graph: &'a dyn GraphQueryService) -> Self {
        Self { graph }
    }

    fn build_query(id: &str, keys: &[String]) -> String {
        let clauses: Vec<String> = keys
            .iter()
            .map(|key| format!("OPTIONAL {{ wd:{id} wdt:{key} ?{VALUE_VARIABLE_PREFIX}{key} }}"))
            .collect();
        format!(
            "PREFIX wd: <http://www.wikidata.org/entity/>\n\
             PREFIX wdt: <http://www.wikidata.org/prop/direct/>\n\
             SELECT * WHERE {{\n  {}\n}}",
            clauses.join("\n  ")
        )
    }

    /// Returns the value of each requested attribute the entity has. Keys not
    /// matching the attribute pattern are dropped silently; with no retained
    /// keys no query is issued. Only the first solution row is consumed, so
    /// multi-valued attributes keep exactly one value.
    pub fn fetch(&self, id: &str, keys: &[String]) -> Result<BTreeMap<String, String>, String> {
        let retained: Vec<String> = keys
            .iter()
            .filter_map(|key| normalize_attribute_key(key))
            .collect();
        if retained.is_empty() {
            debug!("no well-formed attribute keys for '{id}', skipping query");
            return Ok(BTreeMap::new());
        }

        let query = Self::build_query(id, &retained);
        debug!("attribute query for '{id}':\n{query}");
        let rows = self.graph.select(&query)?;

        let mut values = BTreeMap::new();
        if let Some(first_row) = rows.first() {
            for (variable, value) in first_row.iter() {
                if let Some(key) = variable.strip_prefix(VALUE_VARIABLE_PREFIX) {
                    values.insert(key.to_string(), value.to_string());
                }
            }
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::{normalize_attribute_key, AttributeLookup};
    use crate::graph_client::{GraphQueryService, SolutionRow};

    struct FixedGraph {
        rows: Vec<SolutionRow>,
        calls: AtomicUsize,
    }

    impl FixedGraph {
        fn new(rows: Vec<SolutionRow>) -> Self {
            Self {
                rows,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl GraphQueryService for FixedGraph {
        fn select(&self, _query: &str) -> Result<Vec<SolutionRow>, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.rows.clone())
        }
    }

    #[test]
    fn test_attribute_key_normalization() {
        assert_eq!(normalize_attribute_key("P19").as_deref(), Some("P19"));
        assert_eq!(normalize_attribute_key(" p106 ").as_deref(), Some("P106"));
        assert_eq!(normalize_attribute_key("Q5"), None);
        assert_eq!(normalize_attribute_key("birthplace"), None);
        assert_eq!(normalize_attribute_key("P"), None);
        assert_eq!(normalize_attribute_key("P1x9"), None);
        assert_eq!(normalize_attribute_key(""), None);
    }

    #[test]
    fn test_fetch_with_no_wellformed_keys_issues_no_query() {
        let graph = FixedGraph::new(Vec::new());
        let lookup = AttributeLookup::new(&graph);
        let values = lookup
            .fetch("Q937", &["birthplace".to_string(), "Q5".to_string()])
            .expect("short-circuit never fails");
        assert!(values.is_empty());
        assert_eq!(graph.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_fetch_maps_first_row_and_drops_variable_prefix() {
        let graph = FixedGraph::new(vec![
            SolutionRow::from_pairs(&[
                ("val_P19", "http://www.wikidata.org/entity/Q2079"),
                ("val_P106", "http://www.wikidata.org/entity/Q169470"),
            ]),
            SolutionRow::from_pairs(&[("val_P19", "http://www.wikidata.org/entity/Q64")]),
        ]);
        let lookup = AttributeLookup::new(&graph);
        let values = lookup
            .fetch("Q937", &["P19".to_string(), "p106".to_string()])
            .expect("query succeeds");
        assert_eq!(graph.calls.load(Ordering::SeqCst), 1);
        assert_eq!(values.len(), 2);
        assert_eq!(
            values.get("P19").map(String::as_str),
            Some("http://www.wikidata.org/entity/Q2079")
        );
        assert_eq!(
            values.get("P106").map(String::as_str),
            Some("http://www.wikidata.org/entity/Q169470")
        );
    }

    #[test]
    fn test_fetch_missing_attribute_is_absent_not_error() {
        let graph = FixedGraph::new(vec![SolutionRow::from_pairs(&[(
            "val_P19",
            "http://www.wikidata.org/entity/Q2079",
        )])]);
        let lookup = AttributeLookup::new(&graph);
        let values = lookup
            .fetch("Q937", &["P19".to_string(), "P106".to_string()])
            .expect("query succeeds");
        assert_eq!(values.len(), 1);
        assert!(values.contains_key("P19"));
        assert!(!values.contains_key("P106"));
    }

    #[test]
    fn test_fetch_with_no_rows_returns_empty_map() {
        let graph = FixedGraph::new(Vec::new());
        let lookup = AttributeLookup::new(&graph);
        let values = lookup
            .fetch("Q937", &["P19".to_string()])
            .expect("query succeeds");
        assert!(values.is_empty());
        assert_eq!(graph.calls.load(Ordering::SeqCst), 1);
    }
}
