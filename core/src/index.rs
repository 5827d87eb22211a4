use std::collections::HashMap;

use crate::document::{DocId, DocumentStore};
use crate::error::IndexError;
use crate::tokenizer::{tokenize, tokenize_normalized};

pub type TermId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub doc_id: DocId,
    pub tf: u32,
}

/// Term -> (document, term frequency) lookup, built in one pass over the store.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    dictionary: HashMap<String, TermId>,
    postings: Vec<Vec<Posting>>, // by term id, each sorted by doc_id
    title_docs: Vec<Vec<DocId>>,  // by term id, sorted
    doc_freqs: Vec<u32>,          // by term id, body or title
    doc_lens: Vec<u32>,
    title_terms: Vec<Vec<TermId>>, // by doc id, sorted
    avg_doc_len: f64,
}

impl InvertedIndex {
    pub fn build(store: &DocumentStore) -> Result<Self, IndexError> {
        if store.is_empty() {
            return Err(IndexError::EmptyCorpus);
        }

        let mut index = Self::default();
        let mut total_len: u64 = 0;
        for doc in store.iter() {
            let tokens = tokenize_normalized(&doc.text);
            let mut tf_counts: HashMap<TermId, u32> = HashMap::new();
            for token in &tokens {
                let tid = index.intern(&token.term);
                *tf_counts.entry(tid).or_insert(0) += 1;
            }
            let mut title: Vec<TermId> = tokenize(&doc.title)
                .into_iter()
                .map(|(term, _)| index.intern(&term))
                .collect();
            title.sort_unstable();
            title.dedup();

            // Docs are visited in id order, so every per-term list stays sorted.
            for &tid in &title {
                index.title_docs[tid as usize].push(doc.id);
                if !tf_counts.contains_key(&tid) {
                    index.doc_freqs[tid as usize] += 1;
                }
            }
            for (tid, tf) in tf_counts {
                index.postings[tid as usize].push(Posting { doc_id: doc.id, tf });
                index.doc_freqs[tid as usize] += 1;
            }
            index.title_terms.push(title);

            let len = tokens.len() as u32;
            total_len += u64::from(len);
            index.doc_lens.push(len);
        }

        index.avg_doc_len = (total_len as f64 / store.len() as f64).max(1.0);
        tracing::info!(num_docs = store.len(), num_terms = index.dictionary.len(), "index built");
        Ok(index)
    }

    fn intern(&mut self, term: &str) -> TermId {
        if let Some(&tid) = self.dictionary.get(term) {
            return tid;
        }
        let tid = self.postings.len() as TermId;
        self.dictionary.insert(term.to_string(), tid);
        self.postings.push(Vec::new());
        self.title_docs.push(Vec::new());
        self.doc_freqs.push(0);
        tid
    }

    pub fn term_id(&self, term: &str) -> Option<TermId> {
        self.dictionary.get(term).copied()
    }

    pub fn postings(&self, tid: TermId) -> &[Posting] {
        self.postings.get(tid as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Documents whose title contains the term.
    pub fn title_docs(&self, tid: TermId) -> &[DocId] {
        self.title_docs.get(tid as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of documents containing the term in their body or title.
    pub fn df(&self, tid: TermId) -> u32 {
        self.doc_freqs.get(tid as usize).copied().unwrap_or(0)
    }

    pub fn doc_len(&self, doc_id: DocId) -> u32 {
        self.doc_lens.get(doc_id as usize).copied().unwrap_or(0)
    }

    pub fn title_has(&self, doc_id: DocId, tid: TermId) -> bool {
        self.title_terms
            .get(doc_id as usize)
            .is_some_and(|terms| terms.binary_search(&tid).is_ok())
    }

    pub fn num_docs(&self) -> u32 {
        self.doc_lens.len() as u32
    }

    pub fn num_terms(&self) -> usize {
        self.dictionary.len()
    }

    pub fn avg_doc_len(&self) -> f64 {
        self.avg_doc_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::InputDoc;

    fn store(bodies: &[(&str, &str)]) -> DocumentStore {
        DocumentStore::from_inputs(bodies.iter().map(|(title, body)| InputDoc {
            id: None,
            title: title.to_string(),
            body: body.to_string(),
            source_ref: None,
        }))
        .unwrap()
    }

    #[test]
    fn empty_store_cannot_be_indexed() {
        let err = InvertedIndex::build(&DocumentStore::default()).unwrap_err();
        assert_eq!(err, IndexError::EmptyCorpus);
    }

    #[test]
    fn records_term_frequencies_per_document() {
        let index = InvertedIndex::build(&store(&[("A", "refund refund invoice"), ("B", "invoice")])).unwrap();
        let refund = index.term_id("refund").unwrap();
        let invoice = index.term_id("invoic").unwrap();
        assert_eq!(index.postings(refund), &[Posting { doc_id: 0, tf: 2 }]);
        assert_eq!(index.postings(invoice), &[Posting { doc_id: 0, tf: 1 }, Posting { doc_id: 1, tf: 1 }]);
        assert_eq!(index.df(invoice), 2);
        assert_eq!(index.doc_len(0), 3);
        assert_eq!(index.num_docs(), 2);
    }

    #[test]
    fn title_terms_are_tracked_when_indexed() {
        let index = InvertedIndex::build(&store(&[("Refund API", "refund flow"), ("Other", "refund")])).unwrap();
        let refund = index.term_id("refund").unwrap();
        assert!(index.title_has(0, refund));
        assert!(!index.title_has(1, refund));
        assert_eq!(index.title_docs(refund), &[0]);
        assert_eq!(index.df(refund), 2);
    }

    #[test]
    fn title_only_terms_are_interned() {
        let index = InvertedIndex::build(&store(&[("Refund API", "refund flow"), ("Webhooks", "receive events")])).unwrap();
        let api = index.term_id("api").unwrap();
        assert!(index.postings(api).is_empty());
        assert_eq!(index.title_docs(api), &[0]);
        assert_eq!(index.df(api), 1);
        let webhook = index.term_id("webhook").unwrap();
        assert_eq!(index.title_docs(webhook), &[1]);
    }

    #[test]
    fn unknown_terms_have_no_postings() {
        let index = InvertedIndex::build(&store(&[("A", "alpha")])).unwrap();
        assert!(index.postings(42).is_empty());
        assert_eq!(index.df(42), 0);
    }
}
