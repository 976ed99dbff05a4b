use std::collections::{BTreeSet, HashMap};

use crate::config::ScoringParams;

/// Dense ids for the distinct tokens of one block, assigned in sorted token
/// order so ids do not depend on draft order.
#[derive(Debug, Clone, Default)]
pub struct TokenVocabulary {
    ids: HashMap<String, u32>,
    tokens: Vec<String>,
}

impl TokenVocabulary {
    /// Interns every sequence and returns the vocabulary with the encoded streams.
    pub fn encode_all<'a, I>(sequences: I) -> (Self, Vec<Vec<u32>>)
    where
        I: IntoIterator<Item = &'a [String]>,
    {
        let sequences: Vec<&[String]> = sequences.into_iter().collect();
        let distinct: BTreeSet<&str> = sequences
            .iter()
            .flat_map(|tokens| tokens.iter().map(String::as_str))
            .collect();
        let tokens: Vec<String> = distinct.into_iter().map(str::to_string).collect();
        let ids: HashMap<String, u32> = tokens
            .iter()
            .enumerate()
            .map(|(id, token)| (token.clone(), id as u32))
            .collect();
        let vocab = Self { ids, tokens };
        let encoded = sequences
            .iter()
            .map(|tokens| tokens.iter().filter_map(|token| vocab.id(token)).collect())
            .collect();
        (vocab, encoded)
    }

    pub fn id(&self, token: &str) -> Option<u32> {
        self.ids.get(token).copied()
    }

    pub fn token(&self, id: u32) -> &str {
        self.tokens.get(id as usize).map_or("", String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Normalized Levenshtein similarities memoized for the lifetime of one
/// alignment call. Keys are unordered id pairs.
#[derive(Debug)]
pub struct SimilarityMemo<'v> {
    vocab: &'v TokenVocabulary,
    table: HashMap<(u32, u32), f64>,
    hits: usize,
}

impl<'v> SimilarityMemo<'v> {
    pub fn new(vocab: &'v TokenVocabulary) -> Self {
        Self {
            vocab,
            table: HashMap::new(),
            hits: 0,
        }
    }

    pub fn similarity(&mut self, a: u32, b: u32) -> f64 {
        if a == b {
            return 1.0;
        }
        let key = if a < b { (a, b) } else { (b, a) };
        if let Some(&value) = self.table.get(&key) {
            self.hits += 1;
            return value;
        }
        let value = strsim::normalized_levenshtein(self.vocab.token(a), self.vocab.token(b));
        self.table.insert(key, value);
        value
    }

    pub fn cached_pairs(&self) -> usize {
        self.table.len()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }
}

/// Substitution scores over interned tokens.
#[derive(Debug)]
pub struct TokenScorer<'v> {
    scoring: ScoringParams,
    near_match_similarity: f64,
    memo: SimilarityMemo<'v>,
}

impl<'v> TokenScorer<'v> {
    pub fn new(vocab: &'v TokenVocabulary, scoring: ScoringParams, near_match_similarity: f64) -> Self {
        Self {
            scoring,
            near_match_similarity,
            memo: SimilarityMemo::new(vocab),
        }
    }

    pub fn gap_score(&self) -> i32 {
        self.scoring.gap_score
    }

    pub fn mismatch_score(&self) -> i32 {
        self.scoring.mismatch_score
    }

    #[inline]
    pub fn score(&mut self, a: u32, b: u32) -> i32 {
        if a == b {
            self.scoring.match_score
        } else if self.memo.similarity(a, b) >= self.near_match_similarity {
            self.scoring.near_match_score
        } else {
            self.scoring.mismatch_score
        }
    }

    pub fn memo(&self) -> &SimilarityMemo<'v> {
        &self.memo
    }
}
