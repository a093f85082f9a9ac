//! RDF namespace constants and URI helpers shared by query builders and the
//! dataset toolchain.

/// Entity namespace of the source knowledge graph.
pub const ENTITY_NS: &str = "http://www.wikidata.org/entity/";
/// Direct-property namespace of the source knowledge graph.
pub const DIRECT_PROPERTY_NS: &str = "http://www.wikidata.org/prop/direct/";
/// Label namespace used for display labels.
pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";

/// Renders an entity identifier as a full URI.
pub fn entity_uri(id: &str) -> String {
    format!("{ENTITY_NS}{id}")
}

/// Renders a relation identifier as a full direct-property URI.
pub fn property_uri(id: &str) -> String {
    format!("{DIRECT_PROPERTY_NS}{id}")
}

/// Returns the final path segment of a resource URI, which is the canonical
/// identifier for entities in the source graph.
pub fn local_name(uri: &str) -> &str {
    uri.rsplit('/').next().unwrap_or(uri)
}

#[cfg(test)]
mod tests {
    use super::{entity_uri, local_name, property_uri};

    #[test]
    fn test_uri_rendering() {
        assert_eq!(entity_uri("Q937"), "http://www.wikidata.org/entity/Q937");
        assert_eq!(
            property_uri("P19"),
            "http://www.wikidata.org/prop/direct/P19"
        );
    }

    #[test]
    fn test_local_name_takes_final_segment() {
        assert_eq!(local_name("http://www.wikidata.org/entity/Q937"), "Q937");
        assert_eq!(local_name("Q937"), "Q937");
        assert_eq!(local_name(""), "");
    }
}
