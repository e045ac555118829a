//! Prompt construction and SPARQL extraction for §4.14's translate step.

use mimir_domain::ontology::{ParsedOntology, PropertyKind};

/// Builds the completion prompt from the ontology's declared classes and
/// properties plus the question. When `retry_error` is `Some`, it's the
/// validator's rejection message from the first attempt, appended so the
/// model can correct itself.
pub fn build_prompt(ontology: &ParsedOntology, question: &str, retry_error: Option<&str>) -> String {
    let mut out = String::new();
    out.push_str("You translate natural-language questions into SPARQL SELECT queries over an RDF graph.\n\n");

    out.push_str("Classes:\n");
    for class in &ontology.classes {
        out.push_str(&format!("- {} ({})\n", class.label, class.uri));
    }

    out.push_str("\nProperties:\n");
    for property in &ontology.properties {
        let kind = match property.kind {
            PropertyKind::Object => "object",
            PropertyKind::Datatype => "datatype",
        };
        let domain = property.domain.as_deref().unwrap_or("?");
        let range = property.range.as_deref().unwrap_or("?");
        out.push_str(&format!("- {} ({kind}, domain {domain}, range {range})\n", property.label));
    }

    out.push_str(&format!("\nQuestion: {question}\n"));
    out.push_str("Respond with exactly one SPARQL SELECT query in a fenced ```sparql code block. Every WHERE clause must be wrapped in a GRAPH block.\n");

    if let Some(err) = retry_error {
        out.push_str(&format!("\nThe previous query was rejected: {err}\nReturn a corrected query.\n"));
    }

    out
}

/// Pulls the first SPARQL query out of a model response: prefers a fenced
/// ```sparql block, falling back to the first line starting with SELECT or
/// ASK if no fence is present.
pub fn extract_sparql(response: &str) -> Option<String> {
    if let Some(start) = response.find("```sparql") {
        let after_fence = &response[start + "```sparql".len()..];
        if let Some(end) = after_fence.find("```") {
            let body = after_fence[..end].trim();
            if !body.is_empty() {
                return Some(body.to_string());
            }
        }
    }

    response
        .lines()
        .map(str::trim)
        .find(|line| {
            let upper = line.to_uppercase();
            upper.starts_with("SELECT") || upper.starts_with("ASK")
        })
        .map(|line| line.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimir_domain::ontology::{OntologyClass, OntologyProperty};

    fn sample_ontology() -> ParsedOntology {
        ParsedOntology {
            classes: vec![OntologyClass { uri: "http://ex/Widget".into(), label: "Widget".into() }],
            properties: vec![OntologyProperty {
                uri: "http://ex/hasPart".into(),
                label: "hasPart".into(),
                kind: PropertyKind::Object,
                domain: Some("http://ex/Widget".into()),
                range: Some("http://ex/Widget".into()),
            }],
            triples: Vec::new(),
        }
    }

    #[test]
    fn prompt_includes_classes_properties_and_question() {
        let prompt = build_prompt(&sample_ontology(), "how many widgets are there?", None);
        assert!(prompt.contains("Widget"));
        assert!(prompt.contains("hasPart"));
        assert!(prompt.contains("how many widgets are there?"));
        assert!(!prompt.contains("rejected"));
    }

    #[test]
    fn prompt_appends_retry_error_when_present() {
        let prompt = build_prompt(&sample_ontology(), "q", Some("missing GRAPH clause"));
        assert!(prompt.contains("rejected"));
        assert!(prompt.contains("missing GRAPH clause"));
    }

    #[test]
    fn extracts_query_from_fenced_block() {
        let response = "Here you go:\n```sparql\nSELECT * WHERE { GRAPH <g> { ?s ?p ?o } }\n```\nDone.";
        let extracted = extract_sparql(response).unwrap();
        assert!(extracted.starts_with("SELECT"));
    }

    #[test]
    fn falls_back_to_bare_select_line_without_a_fence() {
        let response = "SELECT * WHERE { GRAPH <g> { ?s ?p ?o } }";
        assert_eq!(extract_sparql(response).unwrap(), response);
    }

    #[test]
    fn returns_none_when_nothing_resembles_a_query() {
        assert!(extract_sparql("I'm not sure how to answer that.").is_none());
    }
}
