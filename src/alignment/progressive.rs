use crate::alignment::needleman_wunsch::{global_align, AlignStep};
use crate::alignment::similarity::{TokenScorer, TokenVocabulary};
use crate::config::AlignerConfig;
use crate::error::AlignmentError;
use crate::types::{AlignedSequence, BlockAlignment, BlockStats, SequenceInput, GAP, UNALIGNED};

/// Token index each draft contributes to one column, by draft position in the block.
type Column = Vec<Option<usize>>;

/// Progressive multiple alignment of one block.
///
/// The longest stream (first on ties) is the reference. Every other stream is
/// aligned end-to-end against it; reference tokens become anchor columns and
/// tokens a draft inserts between two anchors are merged into the insertion
/// columns of that slot, opening new columns only where no existing one fits.
pub fn align_block(
    block_id: u32,
    sequences: &[SequenceInput<'_>],
    config: &AlignerConfig,
) -> Result<BlockAlignment, AlignmentError> {
    let (vocab, encoded) = TokenVocabulary::encode_all(sequences.iter().map(|seq| seq.tokens));
    let mut scorer = TokenScorer::new(&vocab, config.scoring, config.near_match_similarity);

    let columns = merge_columns(&encoded, &mut scorer);
    let alignment_length = columns.len();
    let aligned_sequences = materialize(sequences, &columns);
    check_column_counts(block_id, alignment_length, &aligned_sequences)?;

    let stats = block_stats(sequences, &aligned_sequences, vocab.len());
    tracing::debug!(
        block_id,
        draft_count = sequences.len(),
        alignment_length,
        vocabulary = vocab.len(),
        gap_count = stats.gap_count,
        memo_pairs = scorer.memo().cached_pairs(),
        memo_hits = scorer.memo().hits(),
        "aligned block"
    );

    Ok(BlockAlignment {
        block_id,
        aligned_sequences,
        alignment_length,
        draft_count: sequences.len(),
        stats,
    })
}

/// Index of the longest stream, first one on ties.
fn reference_index(encoded: &[Vec<u32>]) -> usize {
    encoded
        .iter()
        .enumerate()
        .fold(0, |best, (idx, tokens)| {
            if tokens.len() > encoded[best].len() {
                idx
            } else {
                best
            }
        })
}

fn merge_columns(encoded: &[Vec<u32>], scorer: &mut TokenScorer<'_>) -> Vec<Column> {
    let draft_count = encoded.len();
    if draft_count == 0 {
        return Vec::new();
    }
    let reference = reference_index(encoded);
    let reference_tokens = &encoded[reference];
    let reference_len = reference_tokens.len();

    let mut anchors: Vec<Column> = (0..reference_len)
        .map(|idx| {
            let mut column = vec![None; draft_count];
            column[reference] = Some(idx);
            column
        })
        .collect();
    // slots[k] holds insertion columns placed before anchor k (after the last for k == len).
    let mut slots: Vec<Vec<Column>> = vec![Vec::new(); reference_len + 1];

    for (row, tokens) in encoded.iter().enumerate() {
        if row == reference {
            continue;
        }
        let gap_score = scorer.gap_score();
        let pairwise = global_align(reference_len, tokens.len(), gap_score, |i, j| {
            scorer.score(reference_tokens[i], tokens[j])
        });

        let mut insertions: Vec<(usize, Vec<usize>)> = Vec::new();
        let mut slot = 0usize;
        for step in pairwise.steps {
            match step {
                AlignStep::Pair(i, j) => {
                    anchors[i][row] = Some(j);
                    slot = i + 1;
                }
                AlignStep::OnlyA(i) => slot = i + 1,
                AlignStep::OnlyB(j) => match insertions.last_mut() {
                    Some((last_slot, run)) if *last_slot == slot => run.push(j),
                    _ => insertions.push((slot, vec![j])),
                },
            }
        }
        for (slot, run) in insertions {
            merge_insertions(&mut slots[slot], row, &run, encoded, scorer);
        }
    }

    let inserted_total: usize = slots.iter().map(Vec::len).sum();
    let mut columns = Vec::with_capacity(reference_len + inserted_total);
    let mut anchors = anchors.into_iter();
    for inserted in slots {
        columns.extend(inserted);
        if let Some(anchor) = anchors.next() {
            columns.push(anchor);
        }
    }
    columns.retain(|column| column.iter().any(Option::is_some));
    columns
}

/// Aligns a run of inserted tokens from `row` against the insertion columns
/// already present in one slot.
fn merge_insertions(
    slot: &mut Vec<Column>,
    row: usize,
    run: &[usize],
    encoded: &[Vec<u32>],
    scorer: &mut TokenScorer<'_>,
) {
    let draft_count = encoded.len();
    let fresh = |token_idx: usize| {
        let mut column = vec![None; draft_count];
        column[row] = Some(token_idx);
        column
    };
    if slot.is_empty() {
        slot.extend(run.iter().map(|&token_idx| fresh(token_idx)));
        return;
    }

    let existing = std::mem::take(slot);
    let tokens = &encoded[row];
    let gap_score = scorer.gap_score();
    let alignment = global_align(existing.len(), run.len(), gap_score, |c, r| {
        profile_score(&existing[c], encoded, tokens[run[r]], scorer)
    });

    let mut existing = existing.into_iter();
    for step in alignment.steps {
        match step {
            AlignStep::Pair(_, r) => {
                if let Some(mut column) = existing.next() {
                    column[row] = Some(run[r]);
                    slot.push(column);
                }
            }
            AlignStep::OnlyA(_) => slot.extend(existing.next()),
            AlignStep::OnlyB(r) => slot.push(fresh(run[r])),
        }
    }
}

/// Best score of `token` against any token already in the column.
fn profile_score(
    column: &Column,
    encoded: &[Vec<u32>],
    token: u32,
    scorer: &mut TokenScorer<'_>,
) -> i32 {
    let mut best: Option<i32> = None;
    for (row, cell) in column.iter().enumerate() {
        if let Some(idx) = *cell {
            let score = scorer.score(encoded[row][idx], token);
            best = Some(best.map_or(score, |current| current.max(score)));
        }
    }
    best.unwrap_or_else(|| scorer.mismatch_score())
}

fn materialize(sequences: &[SequenceInput<'_>], columns: &[Column]) -> Vec<AlignedSequence> {
    sequences
        .iter()
        .enumerate()
        .map(|(row, sequence)| {
            let mut tokens = Vec::with_capacity(columns.len());
            let mut original_to_alignment = vec![UNALIGNED; sequence.tokens.len()];
            for (column_idx, column) in columns.iter().enumerate() {
                match column[row] {
                    Some(token_idx) => {
                        tokens.push(sequence.tokens[token_idx].clone());
                        original_to_alignment[token_idx] = column_idx as i64;
                    }
                    None => tokens.push(GAP.to_string()),
                }
            }
            debug_assert!(
                original_to_alignment
                    .windows(2)
                    .all(|pair| pair[0] < pair[1]),
                "alignment reordered tokens of draft {}",
                sequence.draft_id
            );
            AlignedSequence {
                draft_id: sequence.draft_id.to_string(),
                tokens,
                original_to_alignment,
            }
        })
        .collect()
}

pub(crate) fn check_column_counts(
    block_id: u32,
    expected: usize,
    sequences: &[AlignedSequence],
) -> Result<(), AlignmentError> {
    for sequence in sequences {
        if sequence.len() != expected {
            tracing::error!(
                block_id,
                draft_id = %sequence.draft_id,
                expected,
                actual = sequence.len(),
                "aligned sequences disagree on column count"
            );
            return Err(AlignmentError::column_mismatch(
                block_id,
                sequence.draft_id.clone(),
                expected,
                sequence.len(),
            ));
        }
    }
    Ok(())
}

fn block_stats(
    sequences: &[SequenceInput<'_>],
    aligned: &[AlignedSequence],
    unique_tokens: usize,
) -> BlockStats {
    let counts: Vec<usize> = sequences.iter().map(|seq| seq.tokens.len()).collect();
    let avg_tokens = if counts.is_empty() {
        0.0
    } else {
        counts.iter().sum::<usize>() as f64 / counts.len() as f64
    };
    BlockStats {
        min_tokens: counts.iter().copied().min().unwrap_or(0),
        max_tokens: counts.iter().copied().max().unwrap_or(0),
        avg_tokens,
        unique_tokens,
        gap_count: aligned.iter().map(AlignedSequence::gap_count).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(drafts: &[&[&str]]) -> Vec<Vec<String>> {
        drafts
            .iter()
            .map(|tokens| tokens.iter().map(|token| token.to_string()).collect())
            .collect()
    }

    fn run(drafts: &[&[&str]]) -> BlockAlignment {
        let streams = owned(drafts);
        let ids: Vec<String> = (0..streams.len()).map(|idx| format!("d{idx}")).collect();
        let inputs: Vec<SequenceInput<'_>> = streams
            .iter()
            .zip(&ids)
            .map(|(tokens, id)| SequenceInput {
                draft_id: id,
                tokens,
            })
            .collect();
        align_block(1, &inputs, &AlignerConfig::default()).expect("alignment succeeds")
    }

    fn rows(block: &BlockAlignment) -> Vec<Vec<&str>> {
        block
            .aligned_sequences
            .iter()
            .map(|seq| seq.tokens.iter().map(String::as_str).collect())
            .collect()
    }

    #[test]
    fn no_drafts_no_columns() {
        let block = run(&[]);
        assert_eq!(block.alignment_length, 0);
        assert!(block.aligned_sequences.is_empty());
    }

    #[test]
    fn single_draft_is_identity() {
        let block = run(&[&["beginning", "at", "the", "corner"]]);
        let seq = &block.aligned_sequences[0];
        assert_eq!(seq.tokens, ["beginning", "at", "the", "corner"]);
        assert_eq!(seq.original_to_alignment, [0, 1, 2, 3]);
        assert_eq!(block.stats.gap_count, 0);
    }

    #[test]
    fn identical_streams_align_without_gaps() {
        let tokens: &[&str] = &["n", "4", "00", "w", "1638", "feet"];
        let block = run(&[tokens, tokens]);
        assert_eq!(block.alignment_length, 6);
        assert_eq!(block.stats.gap_count, 0);
        assert_eq!(rows(&block)[0], rows(&block)[1]);
    }

    #[test]
    fn shorter_draft_receives_gap() {
        let block = run(&[&["thence", "north", "along", "line"], &["thence", "along", "line"]]);
        assert_eq!(
            rows(&block),
            vec![
                vec!["thence", "north", "along", "line"],
                vec!["thence", "-", "along", "line"],
            ]
        );
        assert_eq!(
            block.aligned_sequences[1].original_to_alignment,
            [0, 2, 3]
        );
    }

    #[test]
    fn substitutions_share_a_column() {
        let block = run(&[
            &["foo", "bar"],
            &["foo", "baz", "qux"],
            &["foo", "bar", "qux"],
        ]);
        assert_eq!(
            rows(&block),
            vec![
                vec!["foo", "bar", "-"],
                vec!["foo", "baz", "qux"],
                vec!["foo", "bar", "qux"],
            ]
        );
    }

    #[test]
    fn insertions_from_several_drafts_share_columns() {
        let block = run(&[
            &["a", "b", "c", "d", "e", "f"],
            &["a", "x", "b", "c", "d", "e"],
            &["a", "x", "b", "c", "d", "f"],
        ]);
        assert_eq!(
            rows(&block),
            vec![
                vec!["a", "-", "b", "c", "d", "e", "f"],
                vec!["a", "x", "b", "c", "d", "e", "-"],
                vec!["a", "x", "b", "c", "d", "-", "f"],
            ]
        );
    }

    #[test]
    fn empty_draft_is_all_gaps() {
        let block = run(&[&[], &["lot", "4"]]);
        assert_eq!(block.alignment_length, 2);
        assert_eq!(rows(&block)[0], vec!["-", "-"]);
        assert!(block.aligned_sequences[0].original_to_alignment.is_empty());
    }

    #[test]
    fn columns_are_equal_length_and_never_all_gaps() {
        let block = run(&[
            &["the", "north", "half", "of", "lot", "4"],
            &["north", "half", "lot", "four"],
            &["the", "n", "half", "of", "the", "lot", "4", "only"],
        ]);
        let l = block.alignment_length;
        for seq in &block.aligned_sequences {
            assert_eq!(seq.len(), l);
            assert!(seq
                .original_to_alignment
                .windows(2)
                .all(|pair| pair[0] < pair[1]));
            for &column in &seq.original_to_alignment {
                assert!(column >= 0);
                assert_ne!(seq.tokens[column as usize], GAP);
            }
        }
        for column in 0..l {
            assert!(block
                .aligned_sequences
                .iter()
                .any(|seq| !seq.is_gap(column)));
        }
    }

    #[test]
    fn reference_is_first_longest() {
        let encoded = vec![vec![1, 2], vec![1, 2, 3], vec![3, 2, 1]];
        assert_eq!(reference_index(&encoded), 1);
    }

    #[test]
    fn column_count_mismatch_is_an_error() {
        let sequences = vec![
            AlignedSequence {
                draft_id: "a".to_string(),
                tokens: vec!["x".to_string(), "y".to_string()],
                original_to_alignment: vec![0, 1],
            },
            AlignedSequence {
                draft_id: "b".to_string(),
                tokens: vec!["x".to_string()],
                original_to_alignment: vec![0],
            },
        ];
        let err = check_column_counts(7, 2, &sequences).expect_err("lengths differ");
        assert!(matches!(
            err,
            AlignmentError::AlignmentColumnMismatch {
                block_id: 7,
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn stats_summarize_token_counts() {
        let block = run(&[&["a", "b", "c"], &["a", "c"]]);
        assert_eq!(block.stats.min_tokens, 2);
        assert_eq!(block.stats.max_tokens, 3);
        assert!((block.stats.avg_tokens - 2.5).abs() < 1e-12);
        assert_eq!(block.stats.unique_tokens, 3);
        assert_eq!(block.stats.gap_count, 1);
    }
}
