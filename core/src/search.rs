//! Query evaluation over a built index.
//!
//! A [`SearchEngine`] only exists once its index has been built, so there is
//! no way to search an unindexed corpus. The engine is immutable afterwards
//! and can be shared across threads behind an `Arc` without locking.
//!
//! Scoring, per matching document `d` and distinct query term `t`:
//!
//! ```text
//! idf(t) * ( (k1 + 1) * tf / (tf + k1 * (1 - b + b * rest(d) / avg_len)) + title_bonus * [t in title(d)] )
//! ```
//!
//! with `idf(t) = ln(1 + N / df(t))` and `rest(d)` the number of tokens of `d`
//! that match no query term. The frequency part is zero when `t` only occurs
//! in the title. Every factor is non-negative and `rest(d)` does not move when
//! a matching occurrence is added, so adding a match never lowers a score.
//! Documents matching no query term in body or title are never ranked.

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;

use crate::config::SearchConfig;
use crate::document::{DocId, Document, DocumentStore};
use crate::error::{IndexError, QueryError, StartupError};
use crate::index::{InvertedIndex, TermId};
use crate::normalize::normalize;
use crate::snippet;
use crate::tokenizer::tokenize_normalized;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub document_id: DocId,
    pub title: String,
    pub snippet: String,
    pub source_ref: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    /// Matching documents before the `top_k` cut.
    pub total_hits: usize,
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct EngineStats {
    pub documents: usize,
    pub terms: usize,
}

#[derive(Debug)]
pub struct SearchEngine {
    store: DocumentStore,
    index: InvertedIndex,
    config: SearchConfig,
}

/// Distinct stemmed terms of a query, sorted, paired with their id when the corpus knows them.
struct ParsedQuery {
    terms: Vec<String>,
    known: Vec<TermId>,
}

impl SearchEngine {
    /// Index `store` with the default [`SearchConfig`].
    pub fn build(store: DocumentStore) -> Result<Self, IndexError> {
        let index = InvertedIndex::build(&store)?;
        Ok(Self { store, index, config: SearchConfig::default() })
    }

    pub fn with_config(store: DocumentStore, config: SearchConfig) -> Result<Self, StartupError> {
        config.validate()?;
        let index = InvertedIndex::build(&store)?;
        Ok(Self { store, index, config })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats { documents: self.store.len(), terms: self.index.num_terms() }
    }

    pub fn document(&self, id: DocId) -> Option<&Document> {
        self.store.get(id)
    }

    /// Ranked hits for `query`, at most `top_k` of them (clamped to the configured maximum).
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>, QueryError> {
        self.search_with_stats(query, top_k).map(|r| r.hits)
    }

    pub fn search_with_stats(&self, query: &str, top_k: usize) -> Result<SearchResults, QueryError> {
        let start = Instant::now();
        let parsed = self.parse(query)?;
        let mut scored = self.score(&parsed.known);
        let total_hits = scored.len();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(self.config.clamp_top_k(top_k));

        let terms: Vec<&str> = parsed.terms.iter().map(String::as_str).collect();
        let hits: Vec<SearchHit> = scored
            .into_iter()
            .filter_map(|(doc_id, score)| {
                let doc = self.store.get(doc_id)?;
                let snippet = snippet::extract(&doc.text, &terms, self.config.snippet_before, self.config.snippet_after);
                Some(SearchHit { document_id: doc_id, title: doc.title.clone(), snippet, source_ref: doc.source_ref.clone(), score })
            })
            .collect();

        tracing::debug!(
            terms = parsed.terms.len(),
            known = parsed.known.len(),
            total_hits,
            returned = hits.len(),
            took_us = start.elapsed().as_micros() as u64,
            "search"
        );
        Ok(SearchResults { total_hits, hits })
    }

    fn parse(&self, query: &str) -> Result<ParsedQuery, QueryError> {
        let normalized = normalize(query);
        if normalized.is_empty() {
            return Err(QueryError::Empty);
        }
        let mut terms: Vec<String> = tokenize_normalized(&normalized).into_iter().map(|t| t.term).collect();
        if terms.is_empty() {
            return Err(QueryError::NoTerms { query: query.trim().to_string() });
        }
        terms.sort();
        terms.dedup();
        let known = terms.iter().filter_map(|t| self.index.term_id(t)).collect();
        Ok(ParsedQuery { terms, known })
    }

    /// Score every document containing at least one of `terms` in its body or title. Unordered.
    fn score(&self, terms: &[TermId]) -> Vec<(DocId, f64)> {
        // BTreeMap keeps float accumulation order fixed, so repeated queries score identically.
        let mut matches: BTreeMap<DocId, Vec<(TermId, u32)>> = BTreeMap::new();
        for &tid in terms {
            for p in self.index.postings(tid) {
                matches.entry(p.doc_id).or_default().push((tid, p.tf));
            }
            for &doc_id in self.index.title_docs(tid) {
                let hits = matches.entry(doc_id).or_default();
                if hits.last().map(|&(t, _)| t) != Some(tid) {
                    hits.push((tid, 0));
                }
            }
        }

        let n = f64::from(self.index.num_docs());
        let avg_len = self.index.avg_doc_len();
        let SearchConfig { k1, b, title_bonus, .. } = self.config;

        matches
            .into_iter()
            .map(|(doc_id, hits)| {
                let matched: u32 = hits.iter().map(|(_, tf)| tf).sum();
                let rest = f64::from(self.index.doc_len(doc_id).saturating_sub(matched));
                let norm = k1 * (1.0 - b + b * rest / avg_len);
                let score: f64 = hits
                    .iter()
                    .map(|&(tid, tf)| {
                        let idf = (1.0 + n / f64::from(self.index.df(tid).max(1))).ln();
                        let freq = if tf > 0 {
                            let tf = f64::from(tf);
                            (k1 + 1.0) * tf / (tf + norm)
                        } else {
                            0.0
                        };
                        let bonus = if self.index.title_has(doc_id, tid) { title_bonus } else { 0.0 };
                        idf * (freq + bonus)
                    })
                    .sum();
                (doc_id, score)
            })
            // A title-only match with no title bonus configured is not a match.
            .filter(|&(_, score)| score > 0.0)
            .collect()
    }
}
