//! Ontology source-text parsing (§4.6, §4.9 `loadOntology`, glossary
//! "Ontology").
//!
//! Supports the subset of Turtle, RDF/XML, and JSON-LD needed to declare
//! `owl:Class`/`owl:ObjectProperty`/`owl:DatatypeProperty` with
//! `rdfs:label`/`rdfs:domain`/`rdfs:range` — enough to drive
//! `SchemaInference` and `TwinBuilder`. It is not a general-purpose RDF
//! parser.

use std::collections::HashMap;

use mimir_domain::graph::{Term, Triple};
use mimir_domain::ontology::{OntologyClass, OntologyFormat, OntologyProperty, ParsedOntology, PropertyKind};

use crate::errors::GraphError;

const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
const OWL_CLASS: &str = "http://www.w3.org/2002/07/owl#Class";
const OWL_OBJECT_PROPERTY: &str = "http://www.w3.org/2002/07/owl#ObjectProperty";
const OWL_DATATYPE_PROPERTY: &str = "http://www.w3.org/2002/07/owl#DatatypeProperty";
const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
const RDFS_DOMAIN: &str = "http://www.w3.org/2000/01/rdf-schema#domain";
const RDFS_RANGE: &str = "http://www.w3.org/2000/01/rdf-schema#range";

pub fn parse(source_text: &str, format: OntologyFormat) -> Result<ParsedOntology, GraphError> {
    match format {
        OntologyFormat::Turtle => parse_turtle(source_text),
        OntologyFormat::JsonLd => parse_jsonld(source_text),
        OntologyFormat::RdfXml => parse_rdfxml(source_text),
    }
}

/// A raw (subject, predicate, object-as-string, object-is-uri) triple,
/// before it's classified into classes/properties and turned into typed
/// `Triple`s.
struct RawTriple {
    s: String,
    p: String,
    o: String,
    o_is_uri: bool,
}

fn assemble(raws: Vec<RawTriple>) -> ParsedOntology {
    let mut labels: HashMap<String, String> = HashMap::new();
    let mut domains: HashMap<String, String> = HashMap::new();
    let mut ranges: HashMap<String, String> = HashMap::new();
    let mut class_subjects: Vec<String> = Vec::new();
    let mut object_prop_subjects: Vec<String> = Vec::new();
    let mut datatype_prop_subjects: Vec<String> = Vec::new();

    for r in &raws {
        match r.p.as_str() {
            RDF_TYPE if r.o == OWL_CLASS => class_subjects.push(r.s.clone()),
            RDF_TYPE if r.o == OWL_OBJECT_PROPERTY => object_prop_subjects.push(r.s.clone()),
            RDF_TYPE if r.o == OWL_DATATYPE_PROPERTY => datatype_prop_subjects.push(r.s.clone()),
            RDFS_LABEL => {
                labels.insert(r.s.clone(), r.o.clone());
            }
            RDFS_DOMAIN => {
                domains.insert(r.s.clone(), r.o.clone());
            }
            RDFS_RANGE => {
                ranges.insert(r.s.clone(), r.o.clone());
            }
            _ => {}
        }
    }

    let local_name = |uri: &str| -> String {
        uri.rsplit(['#', '/']).next().unwrap_or(uri).to_string()
    };

    let classes = class_subjects
        .into_iter()
        .map(|uri| {
            let label = labels.get(&uri).cloned().unwrap_or_else(|| local_name(&uri));
            OntologyClass { uri, label }
        })
        .collect();

    let mut properties: Vec<OntologyProperty> = Vec::new();
    for uri in object_prop_subjects {
        let label = labels.get(&uri).cloned().unwrap_or_else(|| local_name(&uri));
        properties.push(OntologyProperty {
            uri: uri.clone(),
            label,
            kind: PropertyKind::Object,
            domain: domains.get(&uri).cloned(),
            range: ranges.get(&uri).cloned(),
        });
    }
    for uri in datatype_prop_subjects {
        let label = labels.get(&uri).cloned().unwrap_or_else(|| local_name(&uri));
        properties.push(OntologyProperty {
            uri: uri.clone(),
            label,
            kind: PropertyKind::Datatype,
            domain: domains.get(&uri).cloned(),
            range: ranges.get(&uri).cloned(),
        });
    }

    let triples = raws
        .into_iter()
        .map(|r| {
            let object = if r.o_is_uri { Term::uri(r.o) } else { Term::literal(r.o) };
            Triple::new(Term::uri(r.s), Term::uri(r.p), object, None)
        })
        .collect();

    ParsedOntology { classes, properties, triples }
}

/// Expands `rdf:`, `rdfs:`, `owl:` and `a` without requiring a `@prefix`
/// declaration for them; any other prefix must be declared.
fn expand(token: &str, prefixes: &HashMap<String, String>) -> Result<(String, bool), GraphError> {
    if token == "a" {
        return Ok((RDF_TYPE.to_string(), true));
    }
    if let Some(rest) = token.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
        return Ok((rest.to_string(), true));
    }
    if token.starts_with('"') {
        let unquoted = token.trim_matches('"').to_string();
        return Ok((unquoted, false));
    }
    if let Some((prefix, local)) = token.split_once(':') {
        let base = match prefix {
            "rdf" => "http://www.w3.org/1999/02/22-rdf-syntax-ns#",
            "rdfs" => "http://www.w3.org/2000/01/rdf-schema#",
            "owl" => "http://www.w3.org/2002/07/owl#",
            other => prefixes
                .get(other)
                .ok_or_else(|| GraphError::InvalidOntology(format!("undeclared prefix {other}")))?,
        };
        return Ok((format!("{base}{local}"), true));
    }
    Err(GraphError::InvalidOntology(format!("unrecognized token {token:?}")))
}

/// Splits Turtle source into whitespace/quote-aware tokens, tolerating the
/// `;`-separated predicate-object lists this subset supports.
fn tokenize_statement(stmt: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = stmt.chars().peekable();
    let mut current = String::new();
    let mut in_quotes = false;
    while let Some(c) = chars.next() {
        if in_quotes {
            current.push(c);
            if c == '"' {
                in_quotes = false;
                tokens.push(std::mem::take(&mut current));
            }
            continue;
        }
        match c {
            '"' => {
                in_quotes = true;
                current.push(c);
            }
            '<' => {
                current.push(c);
                for nc in chars.by_ref() {
                    current.push(nc);
                    if nc == '>' {
                        break;
                    }
                }
                tokens.push(std::mem::take(&mut current));
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            ';' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(";".to_string());
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn parse_turtle(source_text: &str) -> Result<ParsedOntology, GraphError> {
    let mut prefixes: HashMap<String, String> = HashMap::new();
    let mut raws = Vec::new();

    // Strip line comments, then split on '.' terminators. This is a
    // simplification: a '.' inside a quoted literal would split early, but
    // ontology source in practice keeps literals short and period-free.
    let cleaned: String = source_text
        .lines()
        .map(|line| match line.find('#') {
            Some(idx) => &line[..idx],
            None => line,
        })
        .collect::<Vec<_>>()
        .join("\n");

    for stmt in cleaned.split('.') {
        let stmt = stmt.trim();
        if stmt.is_empty() {
            continue;
        }
        if let Some(rest) = stmt.strip_prefix("@prefix") {
            let tokens = tokenize_statement(rest.trim());
            if tokens.len() != 2 {
                return Err(GraphError::InvalidOntology(format!("malformed @prefix: {stmt}")));
            }
            let prefix = tokens[0].trim_end_matches(':').to_string();
            let uri = tokens[1].trim_start_matches('<').trim_end_matches('>').to_string();
            prefixes.insert(prefix, uri);
            continue;
        }

        let tokens = tokenize_statement(stmt);
        if tokens.is_empty() {
            continue;
        }
        let (subject, _) = expand(&tokens[0], &prefixes)?;
        let mut rest = &tokens[1..];
        while !rest.is_empty() {
            if rest[0] == ";" {
                rest = &rest[1..];
                continue;
            }
            if rest.len() < 2 {
                return Err(GraphError::InvalidOntology(format!("dangling predicate in: {stmt}")));
            }
            let (predicate, _) = expand(&rest[0], &prefixes)?;
            let (object, o_is_uri) = expand(&rest[1], &prefixes)?;
            raws.push(RawTriple { s: subject.clone(), p: predicate, o: object, o_is_uri });
            rest = &rest[2..];
        }
    }

    if raws.is_empty() {
        return Err(GraphError::InvalidOntology("no triples parsed".into()));
    }
    Ok(assemble(raws))
}

/// JSON-LD subset: `{"@graph": [{"@id": ..., "@type": "owl:Class"|...,
/// "rdfs:label": ..., "rdfs:domain": ..., "rdfs:range": ...}, ...]}`.
fn parse_jsonld(source_text: &str) -> Result<ParsedOntology, GraphError> {
    let doc: serde_json::Value =
        serde_json::from_str(source_text).map_err(|e| GraphError::InvalidOntology(e.to_string()))?;
    let nodes = doc
        .get("@graph")
        .and_then(|v| v.as_array())
        .ok_or_else(|| GraphError::InvalidOntology("missing @graph array".into()))?;

    let prefixes = HashMap::new();
    let mut raws = Vec::new();
    for node in nodes {
        let id = node
            .get("@id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| GraphError::InvalidOntology("node missing @id".into()))?
            .to_string();
        if let Some(ty) = node.get("@type").and_then(|v| v.as_str()) {
            let (expanded, _) = expand(ty, &prefixes)?;
            raws.push(RawTriple { s: id.clone(), p: RDF_TYPE.into(), o: expanded, o_is_uri: true });
        }
        for (key, predicate) in [("rdfs:label", RDFS_LABEL), ("rdfs:domain", RDFS_DOMAIN), ("rdfs:range", RDFS_RANGE)]
        {
            if let Some(v) = node.get(key).and_then(|v| v.as_str()) {
                let is_uri = predicate != RDFS_LABEL;
                let value = if is_uri { expand(v, &prefixes)?.0 } else { v.to_string() };
                raws.push(RawTriple { s: id.clone(), p: predicate.into(), o: value, o_is_uri: is_uri });
            }
        }
    }
    if raws.is_empty() {
        return Err(GraphError::InvalidOntology("no nodes parsed".into()));
    }
    Ok(assemble(raws))
}

/// RDF/XML subset: `<rdf:Description rdf:about="...">` elements carrying
/// `<rdf:type rdf:resource="..."/>`, `<rdfs:label>...</rdfs:label>`,
/// `<rdfs:domain rdf:resource="..."/>`, `<rdfs:range rdf:resource="..."/>`
/// children. Scanned with plain string search rather than a full XML
/// parser.
fn parse_rdfxml(source_text: &str) -> Result<ParsedOntology, GraphError> {
    let mut raws = Vec::new();
    let mut rest = source_text;
    while let Some(start) = rest.find("<rdf:Description") {
        let block_start = start + rest[start..].find('>').map(|i| i + 1).unwrap_or(0);
        let end = rest[block_start..]
            .find("</rdf:Description>")
            .ok_or_else(|| GraphError::InvalidOntology("unterminated rdf:Description".into()))?
            + block_start;
        let header = &rest[start..block_start];
        let body = &rest[block_start..end];

        let about = extract_attr(header, "rdf:about")
            .ok_or_else(|| GraphError::InvalidOntology("rdf:Description missing rdf:about".into()))?;

        if let Some(resource) = extract_tag_attr(body, "rdf:type", "rdf:resource") {
            raws.push(RawTriple { s: about.clone(), p: RDF_TYPE.into(), o: resource, o_is_uri: true });
        }
        if let Some(label) = extract_tag_text(body, "rdfs:label") {
            raws.push(RawTriple { s: about.clone(), p: RDFS_LABEL.into(), o: label, o_is_uri: false });
        }
        if let Some(domain) = extract_tag_attr(body, "rdfs:domain", "rdf:resource") {
            raws.push(RawTriple { s: about.clone(), p: RDFS_DOMAIN.into(), o: domain, o_is_uri: true });
        }
        if let Some(range) = extract_tag_attr(body, "rdfs:range", "rdf:resource") {
            raws.push(RawTriple { s: about.clone(), p: RDFS_RANGE.into(), o: range, o_is_uri: true });
        }

        rest = &rest[end + "</rdf:Description>".len()..];
    }
    if raws.is_empty() {
        return Err(GraphError::InvalidOntology("no rdf:Description nodes found".into()));
    }
    Ok(assemble(raws))
}

fn extract_attr(tag: &str, attr: &str) -> Option<String> {
    let needle = format!("{attr}=\"");
    let start = tag.find(&needle)? + needle.len();
    let end = tag[start..].find('"')? + start;
    Some(tag[start..end].to_string())
}

fn extract_tag_attr(body: &str, tag_name: &str, attr: &str) -> Option<String> {
    let open = format!("<{tag_name}");
    let start = body.find(&open)?;
    let close = body[start..].find('/').map(|i| i + start)?;
    extract_attr(&body[start..close], attr)
}

fn extract_tag_text(body: &str, tag_name: &str) -> Option<String> {
    let open_tag_end = body.find(&format!("<{tag_name}>"))? + format!("<{tag_name}>").len();
    let close_tag_start = body[open_tag_end..].find(&format!("</{tag_name}>"))? + open_tag_end;
    Some(body[open_tag_end..close_tag_start].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: &str = r#"
        @prefix ex: <http://example.org/> .
        ex:Person a owl:Class ;
            rdfs:label "Person" .
        ex:name a owl:DatatypeProperty ;
            rdfs:domain ex:Person ;
            rdfs:label "name" .
        ex:knows a owl:ObjectProperty ;
            rdfs:domain ex:Person ;
            rdfs:range ex:Person ;
            rdfs:label "knows" .
    "#;

    #[test]
    fn turtle_extracts_classes_and_properties() {
        let parsed = parse_turtle(TTL).unwrap();
        assert_eq!(parsed.classes.len(), 1);
        assert_eq!(parsed.classes[0].label, "Person");
        assert_eq!(parsed.properties.len(), 2);
        assert!(!parsed.triples.is_empty());
    }

    #[test]
    fn jsonld_round_trips_minimal_shape() {
        let doc = serde_json::json!({
            "@graph": [
                {"@id": "http://example.org/Person", "@type": "owl:Class", "rdfs:label": "Person"},
            ]
        });
        let parsed = parse_jsonld(&doc.to_string()).unwrap();
        assert_eq!(parsed.classes.len(), 1);
    }

    #[test]
    fn rdfxml_extracts_a_class() {
        let doc = r#"<rdf:Description rdf:about="http://example.org/Person">
            <rdf:type rdf:resource="http://www.w3.org/2002/07/owl#Class"/>
            <rdfs:label>Person</rdfs:label>
        </rdf:Description>"#;
        let parsed = parse_rdfxml(doc).unwrap();
        assert_eq!(parsed.classes.len(), 1);
        assert_eq!(parsed.classes[0].label, "Person");
    }

    #[test]
    fn empty_source_is_invalid() {
        assert!(parse_turtle("").is_err());
    }
}
