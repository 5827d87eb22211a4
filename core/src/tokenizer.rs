use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;

use crate::normalize::normalize;

lazy_static! {
    // Letters/digits, with inner apostrophes or underscores kept: "runner's", "invoice_id".
    // Everything else delimits, so "refund.create" is two words.
    static ref RE: Regex = Regex::new(r"(?u)[\p{L}\p{N}]+(?:['_][\p{L}\p{N}]+)*").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// A stemmed term plus where it came from in the (already normalized) input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub term: String,
    /// Word position, counting stopwords.
    pub position: usize,
    /// Byte span of the source word.
    pub start: usize,
    pub end: usize,
}

/// Tokenize text into (term, position): full normalization, stopword removal, and stemming.
pub fn tokenize(text: &str) -> Vec<(String, usize)> {
    tokenize_normalized(&normalize(text))
        .into_iter()
        .map(|t| (t.term, t.position))
        .collect()
}

/// Tokenize text that has already been through [`normalize`]. Spans index into `text`.
pub fn tokenize_normalized(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for (position, mat) in RE.find_iter(text).enumerate() {
        let word = mat.as_str();
        if is_stopword(word) { continue; }
        let term = STEMMER.stem(word).to_string();
        tokens.push(Token { term, position, start: mat.start(), end: mat.end() });
    }
    tokens
}
