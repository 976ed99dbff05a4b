use std::collections::HashSet;

use super::column_sources;
use crate::types::{FallbackReason, FormatMapping, TextSpan, TokenPosition, GAP};

/// Type 1 output for one draft section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactReconstruction {
    pub text: String,
    pub fallback: Option<FallbackReason>,
    /// Columns that resolved to a span already emitted by an unrelated token.
    pub duplicate_spans_skipped: usize,
    /// Non-gap columns with no token or no mapped position behind them.
    pub dangling_columns: usize,
}

impl ExactReconstruction {
    fn fallback(aligned_tokens: &[String], reason: FallbackReason) -> Self {
        let text = aligned_tokens
            .iter()
            .filter(|token| *token != GAP)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            text,
            fallback: Some(reason),
            duplicate_spans_skipped: 0,
            dangling_columns: 0,
        }
    }
}

/// Rebuilds the literal source text of a draft section from its aligned tokens.
///
/// Every non-gap column resolves to the first normalized token placed in it
/// and from there to that token's source span. Each span is emitted once,
/// spans are put back in source order, and the source text between
/// consecutive spans is copied verbatim. Text before the first span and after
/// the last one is kept when those spans are part of the output.
pub fn reconstruct(
    aligned_tokens: &[String],
    mapping: Option<&FormatMapping>,
    original_to_alignment: &[i64],
) -> ExactReconstruction {
    let Some(mapping) = mapping else {
        return ExactReconstruction::fallback(aligned_tokens, FallbackReason::MissingFormatMapping);
    };
    if mapping.token_count() == 0 {
        // Nothing survived normalization; the source text is its own reconstruction.
        return ExactReconstruction {
            text: mapping.original_text.clone(),
            fallback: None,
            duplicate_spans_skipped: 0,
            dangling_columns: 0,
        };
    }
    if original_to_alignment.is_empty() {
        return ExactReconstruction::fallback(aligned_tokens, FallbackReason::EmptyAlignmentMap);
    }

    let sources = column_sources(original_to_alignment, aligned_tokens.len());
    let mut seen: HashSet<TextSpan> = HashSet::new();
    let mut emitted: Vec<&TokenPosition> = Vec::new();
    let mut duplicate_spans_skipped = 0usize;
    let mut dangling_columns = 0usize;

    for (column, token) in aligned_tokens.iter().enumerate() {
        if token == GAP {
            continue;
        }
        let Some(position) = sources[column].and_then(|idx| mapping.position(idx)) else {
            dangling_columns += 1;
            continue;
        };
        let span = position.span();
        if seen.insert(span) {
            emitted.push(position);
            continue;
        }
        let sibling = position.token_index > 0
            && mapping
                .position(position.token_index - 1)
                .is_some_and(|previous| previous.span() == span);
        if !sibling {
            duplicate_spans_skipped += 1;
        }
    }

    emitted.sort_by_key(|position| position.start_char);
    let source = mapping.original_text.as_str();
    let mut text = String::with_capacity(source.len());

    if let Some(first) = emitted.first() {
        if mapping.first_span() == Some(first.span()) {
            text.push_str(source.get(..first.start_char).unwrap_or_default());
        }
    }
    for (idx, position) in emitted.iter().enumerate() {
        text.push_str(&position.original_text);
        if let Some(next) = emitted.get(idx + 1) {
            text.push_str(
                source
                    .get(position.end_char..next.start_char)
                    .unwrap_or(position.trailing_whitespace.as_str()),
            );
        }
    }
    if let Some(last) = emitted.last() {
        if mapping.last_span() == Some(last.span()) {
            text.push_str(source.get(last.end_char..).unwrap_or_default());
        }
    }

    if duplicate_spans_skipped > 0 || dangling_columns > 0 {
        tracing::debug!(
            draft_id = %mapping.draft_id,
            duplicate_spans_skipped,
            dangling_columns,
            "exact reconstruction recovered from anomalies"
        );
    }

    ExactReconstruction {
        text,
        fallback: None,
        duplicate_spans_skipped,
        dangling_columns,
    }
}
