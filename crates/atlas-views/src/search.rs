//! Global search over the gene and ontology-term indexes.

use serde::Serialize;

use atlas_common::artifacts::{GeneHit, GeneIndex, OntologyIndex, TermHit};

use crate::{cmp_f64, needle};

pub const DEFAULT_SEARCH_LIMIT: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Prefix,
    Substring,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneMatch<'a> {
    pub gene: &'a str,
    pub kind: MatchKind,
    pub hits: &'a [GeneHit],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermMatch<'a> {
    pub term: &'a str,
    /// Lowest p-value among the term's hits
    pub best_p: f64,
    pub hits: &'a [TermHit],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults<'a> {
    pub query: String,
    pub genes: Vec<GeneMatch<'a>>,
    pub terms: Vec<TermMatch<'a>>,
}

/// Gene names containing `query`, case-insensitively.
///
/// Exact matches come first, then prefix matches, then other substring
/// matches; each group is alphabetical.
pub fn search_genes<'a>(index: &'a GeneIndex, query: &str, limit: usize) -> Vec<GeneMatch<'a>> {
    let Some(q) = needle(Some(query)) else {
        return Vec::new();
    };

    let mut found: Vec<(GeneMatch<'a>, String)> = index
        .0
        .iter()
        .filter_map(|(gene, hits)| {
            let lower = gene.to_lowercase();
            let kind = if lower == q {
                MatchKind::Exact
            } else if lower.starts_with(&q) {
                MatchKind::Prefix
            } else if lower.contains(&q) {
                MatchKind::Substring
            } else {
                return None;
            };
            Some((GeneMatch { gene, kind, hits }, lower))
        })
        .collect();

    found.sort_by(|(a, a_lower), (b, b_lower)| {
        a.kind
            .cmp(&b.kind)
            .then_with(|| a_lower.cmp(b_lower))
            .then_with(|| a.gene.cmp(&b.gene))
    });
    found.into_iter().take(limit).map(|(m, _)| m).collect()
}

/// Ontology terms containing `query`, case-insensitively, most significant
/// first.
pub fn search_terms<'a>(index: &'a OntologyIndex, query: &str, limit: usize) -> Vec<TermMatch<'a>> {
    let Some(q) = needle(Some(query)) else {
        return Vec::new();
    };

    let mut found: Vec<TermMatch<'a>> = index
        .0
        .iter()
        .filter(|(term, _)| term.to_lowercase().contains(&q))
        .map(|(term, hits)| TermMatch {
            term,
            best_p: hits.iter().map(|h| h.p_value).fold(f64::INFINITY, f64::min),
            hits,
        })
        .collect();

    found.sort_by(|a, b| cmp_f64(a.best_p, b.best_p).then_with(|| a.term.cmp(&b.term)));
    found.truncate(limit);
    found
}

pub fn search<'a>(
    genes: &'a GeneIndex,
    terms: &'a OntologyIndex,
    query: &str,
    limit: usize,
) -> SearchResults<'a> {
    SearchResults {
        query: query.trim().to_string(),
        genes: search_genes(genes, query, limit),
        terms: search_terms(terms, query, limit),
    }
}
