use crate::alignment::confidence::score_block;
use crate::alignment::consensus::generate_consensus;
use crate::config::AlignerConfig;
use crate::types::{
    AlignedSequence, BlockAlignment, ConsensusOutcome, DraftMetadata, FormatMapping,
    FormattedBlock, FormattedSequence, SequenceMetadata, SkipReason,
};

pub mod display;
pub mod exact;

/// For every column, the index of the first pre-alignment token placed there.
pub(crate) fn column_sources(original_to_alignment: &[i64], column_count: usize) -> Vec<Option<usize>> {
    let mut sources = vec![None; column_count];
    for (token_idx, &column) in original_to_alignment.iter().enumerate() {
        let Ok(column) = usize::try_from(column) else {
            continue;
        };
        if let Some(slot) = sources.get_mut(column) {
            slot.get_or_insert(token_idx);
        }
    }
    sources
}

/// Turns one aligned block into display tokens, exact text and, when enabled
/// and enough drafts are present, a consensus row appended last.
///
/// `mappings` is indexed like `block.aligned_sequences`; a missing entry
/// degrades that draft to space-joined tokens.
pub fn format_block(
    block: &BlockAlignment,
    mappings: &[Option<&FormatMapping>],
    config: &AlignerConfig,
) -> FormattedBlock {
    let rows: Vec<&AlignedSequence> = block.aligned_sequences.iter().collect();
    let agreement = display::agreement_counts(&rows);

    let mut aligned_sequences: Vec<FormattedSequence> = block
        .aligned_sequences
        .iter()
        .zip(agreement)
        .enumerate()
        .map(|(idx, (sequence, agreement))| {
            let mapping = mappings.get(idx).copied().flatten();
            format_sequence(block.block_id, sequence, mapping, agreement)
        })
        .collect();

    let consensus = if config.generate_consensus {
        let voters: Vec<(&str, &[String])> = block
            .aligned_sequences
            .iter()
            .map(|sequence| (sequence.draft_id.as_str(), sequence.tokens.as_slice()))
            .collect();
        match generate_consensus(&voters) {
            Ok(consensus) => {
                aligned_sequences.push(consensus.into_formatted());
                ConsensusOutcome::Generated
            }
            Err(reason) => {
                tracing::warn!(
                    block_id = block.block_id,
                    ?reason,
                    "consensus skipped"
                );
                ConsensusOutcome::Skipped { reason }
            }
        }
    } else {
        ConsensusOutcome::Skipped {
            reason: SkipReason::Disabled,
        }
    };

    FormattedBlock {
        block_id: block.block_id,
        aligned_sequences,
        alignment_length: block.alignment_length,
        draft_count: block.draft_count,
        consensus,
        confidence: score_block(&rows, &config.confidence),
        stats: block.stats.clone(),
    }
}

fn format_sequence(
    block_id: u32,
    sequence: &AlignedSequence,
    mapping: Option<&FormatMapping>,
    agreement: Vec<usize>,
) -> FormattedSequence {
    let exact = exact::reconstruct(&sequence.tokens, mapping, &sequence.original_to_alignment);
    if let Some(reason) = exact.fallback {
        tracing::warn!(
            block_id,
            draft_id = %sequence.draft_id,
            ?reason,
            "exact formatting fell back to joined tokens"
        );
    }
    let source_text = display::display_cells(sequence, mapping)
        .into_iter()
        .map(|cell| cell.original_text)
        .collect();
    let gap_count = sequence.gap_count();
    let metadata = DraftMetadata {
        original_token_count: sequence.original_to_alignment.len(),
        aligned_token_count: sequence.len() - gap_count,
        gap_count,
        exact_text_length: exact.text.chars().count(),
        agreement,
        source_text,
        duplicate_spans_skipped: exact.duplicate_spans_skipped,
        dangling_columns: exact.dangling_columns,
        fallback: exact.fallback,
        reconstruction_exact: mapping.is_some_and(|mapping| mapping.original_text == exact.text),
    };

    FormattedSequence {
        draft_id: sequence.draft_id.clone(),
        tokens: sequence.tokens.clone(),
        original_to_alignment: sequence.original_to_alignment.clone(),
        formatting_applied: exact.fallback.is_none(),
        exact_text: exact.text,
        metadata: SequenceMetadata::Draft(metadata),
    }
}
