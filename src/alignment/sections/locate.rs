use std::collections::HashMap;

use super::SplitPoint;
use crate::alignment::needleman_wunsch::{global_align, AlignStep};
use crate::alignment::similarity::{TokenScorer, TokenVocabulary};
use crate::alignment::tokenization::tokenize_with_mapping;
use crate::config::AlignerConfig;

/// Normalized tokens of a whole draft with the section position each one starts at.
pub(super) struct SectionTokens {
    tokens: Vec<String>,
    owners: Vec<SplitPoint>,
    /// Index of the first token of every section.
    section_starts: Vec<usize>,
}

impl SectionTokens {
    pub(super) fn collect(texts: &[String]) -> Self {
        let mut tokens = Vec::new();
        let mut owners = Vec::new();
        let mut section_starts = Vec::with_capacity(texts.len());
        for (section, text) in texts.iter().enumerate() {
            section_starts.push(tokens.len());
            let tokenized = tokenize_with_mapping("", text);
            for (token, position) in tokenized
                .tokens
                .into_iter()
                .zip(tokenized.mapping.token_positions)
            {
                tokens.push(token);
                owners.push(SplitPoint {
                    section,
                    offset: position.start_char,
                });
            }
        }
        Self {
            tokens,
            owners,
            section_starts,
        }
    }

    pub(super) fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Position of token `index`, or the end of the draft past the last token.
    fn point_at(&self, index: usize, texts: &[String]) -> SplitPoint {
        match self.owners.get(index) {
            Some(&point) => point,
            None => SplitPoint {
                section: texts.len().saturating_sub(1),
                offset: texts.last().map_or(0, String::len),
            },
        }
    }
}

/// Dice coefficient over token multisets, `2 * common / (|a| + |b|)`.
pub(super) fn token_overlap(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let mut remaining: HashMap<&str, usize> = HashMap::new();
    for token in a {
        *remaining.entry(token.as_str()).or_insert(0) += 1;
    }
    let mut common = 0usize;
    for token in b {
        if let Some(count) = remaining.get_mut(token.as_str()) {
            if *count > 0 {
                *count -= 1;
                common += 1;
            }
        }
    }
    2.0 * common as f64 / (a.len() + b.len()) as f64
}

/// Aligns both drafts token by token and lands each target section's first
/// token on the current draft. A target token aligned to a gap lands on the
/// next current token.
pub(super) fn locate_by_alignment(
    target: &SectionTokens,
    current: &SectionTokens,
    current_texts: &[String],
    config: &AlignerConfig,
) -> Vec<SplitPoint> {
    let (vocab, encoded) =
        TokenVocabulary::encode_all([target.tokens.as_slice(), current.tokens.as_slice()]);
    let (a, b) = (&encoded[0], &encoded[1]);
    let mut scorer = TokenScorer::new(&vocab, config.scoring, config.near_match_similarity);
    let gap_score = scorer.gap_score();
    let alignment = global_align(a.len(), b.len(), gap_score, |i, j| scorer.score(a[i], b[j]));

    let mut landing = vec![b.len(); a.len()];
    let mut consumed = 0usize;
    for step in alignment.steps {
        match step {
            AlignStep::Pair(i, j) => {
                landing[i] = j;
                consumed = j + 1;
            }
            AlignStep::OnlyA(i) => landing[i] = consumed,
            AlignStep::OnlyB(j) => consumed = j + 1,
        }
    }

    target
        .section_starts
        .iter()
        .enumerate()
        .map(|(target_idx, &start)| {
            if target_idx == 0 {
                return SplitPoint::ORIGIN;
            }
            let token = landing.get(start).copied().unwrap_or(b.len());
            current.point_at(token, current_texts)
        })
        .collect()
}
