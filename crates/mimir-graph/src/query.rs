//! Minimal SPARQL SELECT/ASK parsing shared by `GraphMediator` (safety
//! checks) and `InMemoryGraphBackend` (pattern matching). This is not a
//! SPARQL grammar — it recognizes exactly the shape
//! `SELECT [... | (COUNT(*) AS ?x)] WHERE { GRAPH <uri>|?g { ?s ?p ?o } }`,
//! which is all §4.9's testable properties require.

use crate::errors::GraphError;

pub const DEFAULT_RESULT_CAP: usize = 10_000;

#[derive(Debug, Clone, PartialEq)]
pub enum PatternTerm {
    Var(String),
    Uri(String),
    Literal(String),
}

#[derive(Debug, Clone)]
pub struct TriplePattern {
    pub s: PatternTerm,
    pub p: PatternTerm,
    pub o: PatternTerm,
}

#[derive(Debug, Clone)]
pub enum GraphSelector {
    Fixed(String),
    Variable(String),
}

pub struct ParsedSelect {
    pub selector: GraphSelector,
    pub pattern: TriplePattern,
    pub count_alias: Option<String>,
    pub projected_vars: Vec<String>,
    pub limit: usize,
}

fn term(tok: &str) -> PatternTerm {
    if let Some(v) = tok.strip_prefix('?') {
        PatternTerm::Var(v.to_string())
    } else if let Some(u) = tok.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
        PatternTerm::Uri(u.to_string())
    } else if tok.starts_with('"') {
        PatternTerm::Literal(tok.trim_matches('"').to_string())
    } else {
        PatternTerm::Uri(tok.to_string())
    }
}

/// Finds the byte range of the block delimited by the first `{` at or
/// after `from` and its matching `}`, tracking nesting depth. Also
/// returns the max nesting depth observed within, so the mediator can
/// enforce the complexity limit on the whole query in one pass.
fn matching_block(sparql: &str, from: usize) -> Option<(usize, usize)> {
    let bytes = sparql.as_bytes();
    let open = from + sparql[from..].find('{')?;
    let mut depth = 0i32;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some((open + 1, i));
                }
            }
            _ => {}
        }
    }
    None
}

/// Maximum `{` nesting depth anywhere in the query.
pub fn max_brace_depth(sparql: &str) -> usize {
    let mut depth = 0i32;
    let mut max_depth = 0i32;
    for c in sparql.chars() {
        match c {
            '{' => {
                depth += 1;
                max_depth = max_depth.max(depth);
            }
            '}' => depth -= 1,
            _ => {}
        }
    }
    max_depth.max(0) as usize
}

pub fn parse_select(sparql: &str) -> Result<ParsedSelect, GraphError> {
    let upper = sparql.to_uppercase();
    let graph_idx = upper.find("GRAPH").ok_or(GraphError::MissingGraphClause)?;

    let after_graph = sparql[graph_idx + "GRAPH".len()..].trim_start();
    let selector_token: String = after_graph.split_whitespace().next().unwrap_or_default().to_string();
    let selector = if let Some(uri) = selector_token.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
        GraphSelector::Fixed(uri.to_string())
    } else if let Some(v) = selector_token.strip_prefix('?') {
        GraphSelector::Variable(v.to_string())
    } else {
        return Err(GraphError::UnsupportedQuery("GRAPH target must be a URI or a variable".into()));
    };

    let (block_start, block_end) =
        matching_block(sparql, graph_idx).ok_or_else(|| GraphError::UnsupportedQuery("unterminated GRAPH block".into()))?;
    let block = sparql[block_start..block_end].trim().trim_end_matches('.').trim();
    let tokens: Vec<&str> = block.split_whitespace().collect();
    if tokens.len() != 3 {
        return Err(GraphError::UnsupportedQuery(format!(
            "expected a single triple pattern inside GRAPH {{ }}, got {block:?}"
        )));
    }
    let pattern = TriplePattern { s: term(tokens[0]), p: term(tokens[1]), o: term(tokens[2]) };

    let select_idx = upper.find("SELECT").ok_or_else(|| GraphError::UnsupportedQuery("missing SELECT".into()))?;
    let select_clause = &sparql[select_idx + "SELECT".len()..graph_idx];
    let select_upper = select_clause.to_uppercase();

    let count_alias = if select_upper.contains("COUNT(*)") {
        select_clause
            .split("AS")
            .nth(1)
            .and_then(|rest| rest.trim().trim_start_matches('?').split(|c: char| !c.is_alphanumeric() && c != '_').next())
            .map(|s| s.to_string())
    } else {
        None
    };

    let projected_vars = if count_alias.is_some() {
        Vec::new()
    } else if select_clause.trim() == "*" {
        [&pattern.s, &pattern.p, &pattern.o]
            .iter()
            .filter_map(|t| match t {
                PatternTerm::Var(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    } else {
        select_clause
            .split_whitespace()
            .filter_map(|t| t.strip_prefix('?').map(|s| s.to_string()))
            .collect()
    };

    let limit = upper
        .find("LIMIT")
        .and_then(|i| upper[i + "LIMIT".len()..].split_whitespace().next())
        .and_then(|n| n.parse::<usize>().ok())
        .unwrap_or(DEFAULT_RESULT_CAP);

    Ok(ParsedSelect { selector, pattern, count_alias, projected_vars, limit })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fixed_graph_and_pattern() {
        let parsed = parse_select("SELECT * WHERE { GRAPH <http://g> { ?s ?p ?o } }").unwrap();
        assert!(matches!(parsed.selector, GraphSelector::Fixed(ref u) if u == "http://g"));
        assert!(matches!(parsed.pattern.s, PatternTerm::Var(ref v) if v == "s"));
    }

    #[test]
    fn parses_count_alias() {
        let parsed = parse_select("SELECT (COUNT(*) AS ?c) WHERE { GRAPH <http://g> { ?s ?p ?o } }").unwrap();
        assert_eq!(parsed.count_alias.as_deref(), Some("c"));
    }

    #[test]
    fn missing_graph_is_rejected() {
        assert!(matches!(parse_select("SELECT * WHERE { ?s ?p ?o }"), Err(GraphError::MissingGraphClause)));
    }

    #[test]
    fn depth_counts_nesting_not_total_braces() {
        assert_eq!(max_brace_depth("{ { { } } }"), 3);
        assert_eq!(max_brace_depth("{ } { } { }"), 1);
    }
}
