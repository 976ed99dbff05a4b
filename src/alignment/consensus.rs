use crate::types::{
    AlignedSequence, ConsensusMetadata, FormattedSequence, SequenceMetadata, SkipReason,
    CONSENSUS_DRAFT_ID, GAP,
};

pub const GENERATION_METHOD: &str = "type2_most_common";
pub const MIN_CONSENSUS_DRAFTS: usize = 2;

/// Majority-vote sequence built from the display tokens of real drafts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusSequence {
    pub sequence: AlignedSequence,
    /// Non-gap consensus tokens joined by single spaces.
    pub text: String,
    pub source_drafts: Vec<String>,
}

impl ConsensusSequence {
    pub fn into_formatted(self) -> FormattedSequence {
        let token_count = self.sequence.non_gap_tokens().count();
        let metadata = SequenceMetadata::Consensus(ConsensusMetadata {
            generation_method: GENERATION_METHOD.to_string(),
            source_drafts: self.source_drafts,
            token_count,
            text_length: self.text.chars().count(),
        });
        FormattedSequence {
            draft_id: self.sequence.draft_id,
            tokens: self.sequence.tokens,
            original_to_alignment: self.sequence.original_to_alignment,
            exact_text: self.text,
            formatting_applied: true,
            metadata,
        }
    }
}

/// Picks the most frequent non-gap token of every column.
///
/// Drafts named `consensus` are ignored. Ties go to the token seen first in
/// draft order; a column where every draft is gapped stays a gap. Fewer than
/// two real drafts is not an error, the block is simply skipped.
pub fn generate_consensus(
    sequences: &[(&str, &[String])],
) -> Result<ConsensusSequence, SkipReason> {
    let voters: Vec<(&str, &[String])> = sequences
        .iter()
        .copied()
        .filter(|(draft_id, _)| *draft_id != CONSENSUS_DRAFT_ID)
        .collect();
    if voters.len() < MIN_CONSENSUS_DRAFTS {
        return Err(SkipReason::InsufficientDrafts {
            available: voters.len(),
        });
    }

    let length = voters
        .iter()
        .map(|(_, tokens)| tokens.len())
        .max()
        .unwrap_or(0);
    let tokens: Vec<String> = (0..length)
        .map(|column| {
            majority_token(voters.iter().filter_map(|(_, tokens)| tokens.get(column)))
                .unwrap_or(GAP)
                .to_string()
        })
        .collect();
    let text = tokens
        .iter()
        .filter(|token| *token != GAP)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");

    Ok(ConsensusSequence {
        sequence: AlignedSequence {
            draft_id: CONSENSUS_DRAFT_ID.to_string(),
            original_to_alignment: (0..length as i64).collect(),
            tokens,
        },
        text,
        source_drafts: voters
            .iter()
            .map(|(draft_id, _)| draft_id.to_string())
            .collect(),
    })
}

fn majority_token<'a>(column: impl Iterator<Item = &'a String>) -> Option<&'a str> {
    let mut tally: Vec<(&str, usize)> = Vec::new();
    for token in column.map(String::as_str).filter(|token| *token != GAP) {
        match tally.iter_mut().find(|(seen, _)| *seen == token) {
            Some((_, count)) => *count += 1,
            None => tally.push((token, 1)),
        }
    }
    let mut best: Option<(&str, usize)> = None;
    for (token, count) in tally {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((token, count));
        }
    }
    best.map(|(token, _)| token)
}
