use super::column_sources;
use crate::types::{AlignedSequence, FormatMapping, GAP};

/// One diff-table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayCell {
    /// The draft's aligned token, or the gap marker.
    pub token: String,
    /// Source spelling of the formatted token behind `token`.
    pub original_text: Option<String>,
}

impl DisplayCell {
    pub fn is_gap(&self) -> bool {
        self.token == GAP
    }
}

/// Type 2 rendering of one aligned sequence. Read-only over `aligned`.
pub fn display_cells(aligned: &AlignedSequence, mapping: Option<&FormatMapping>) -> Vec<DisplayCell> {
    let sources = column_sources(&aligned.original_to_alignment, aligned.len());
    aligned
        .tokens
        .iter()
        .zip(sources)
        .map(|(token, source)| {
            let original_text = if token == GAP {
                None
            } else {
                source
                    .and_then(|idx| mapping.and_then(|mapping| mapping.position(idx)))
                    .map(|position| position.original_text.clone())
            };
            DisplayCell {
                token: token.clone(),
                original_text,
            }
        })
        .collect()
}

/// Consensus analyzer: for every draft and column, how many other drafts
/// hold the same token (ASCII case-insensitive). Gap cells count zero.
pub fn agreement_counts(sequences: &[&AlignedSequence]) -> Vec<Vec<usize>> {
    sequences
        .iter()
        .enumerate()
        .map(|(row, sequence)| {
            sequence
                .tokens
                .iter()
                .enumerate()
                .map(|(column, token)| {
                    if token == GAP {
                        return 0;
                    }
                    sequences
                        .iter()
                        .enumerate()
                        .filter(|&(other, _)| other != row)
                        .filter_map(|(_, other)| other.tokens.get(column))
                        .filter(|other| *other != GAP && other.eq_ignore_ascii_case(token))
                        .count()
                })
                .collect()
        })
        .collect()
}
