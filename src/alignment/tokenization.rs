use crate::types::{FormatMapping, TextSpan, TokenPosition, TokenizedText};

/// Normalizes free text for cross-draft comparison.
///
/// Lower-cases, joins digit groups (`1,638` → `1638`), keeps decimal points
/// between digits, turns every other non-`[a-z0-9]` character into a
/// separator, then collapses separators to single spaces and trims.
///
/// All steps only look at adjacent characters inside one whitespace-free run,
/// so normalizing a whole text and normalizing each formatted token on its
/// own produce the same tokens.
pub fn normalize_text(text: &str) -> String {
    let lowered: Vec<char> = text.to_lowercase().chars().collect();
    let grouped = join_digit_groups(&lowered);

    let mut out = String::with_capacity(grouped.len());
    let mut pending_separator = false;
    for (idx, &c) in grouped.iter().enumerate() {
        let keep = c.is_ascii_lowercase()
            || c.is_ascii_digit()
            || (c == '.' && is_decimal_point(&grouped, idx));
        if !keep {
            pending_separator = true;
            continue;
        }
        if pending_separator && !out.is_empty() {
            out.push(' ');
        }
        pending_separator = false;
        out.push(c);
    }
    out
}

/// Whole-text normalization split into tokens.
pub fn normalize_whole_text(text: &str) -> Vec<String> {
    normalize_text(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Normalized tokens produced by one formatted token. Empty for pure punctuation.
pub fn normalize_formatted_token(token: &str) -> Vec<String> {
    normalize_whole_text(token)
}

/// Tokenizes one draft section and records where every normalized token came from.
pub fn tokenize_with_mapping(draft_id: &str, text: &str) -> TokenizedText {
    let spans = formatted_token_spans(text);
    let mut tokens = Vec::new();
    let mut token_positions = Vec::new();
    let mut filtered_spans = Vec::new();

    for (idx, span) in spans.iter().enumerate() {
        let original = &text[span.start_char..span.end_char];
        let next_start = spans
            .get(idx + 1)
            .map_or(text.len(), |next| next.start_char);
        let trailing = &text[span.end_char..next_start];

        let pieces = normalize_formatted_token(original);
        if pieces.is_empty() {
            filtered_spans.push(*span);
            continue;
        }
        for piece in pieces {
            token_positions.push(TokenPosition {
                token_index: tokens.len(),
                start_char: span.start_char,
                end_char: span.end_char,
                original_text: original.to_string(),
                normalized_text: piece.clone(),
                trailing_whitespace: trailing.to_string(),
            });
            tokens.push(piece);
        }
    }

    debug_assert_eq!(
        tokens,
        normalize_whole_text(text),
        "tokenization normalization contract violated"
    );

    if tokens.is_empty() && !text.trim().is_empty() {
        tracing::debug!(
            draft_id,
            text_len = text.len(),
            "section normalized to an empty token stream"
        );
    }

    TokenizedText {
        tokens,
        mapping: FormatMapping {
            draft_id: draft_id.to_string(),
            original_text: text.to_string(),
            token_positions,
            filtered_spans,
        },
    }
}

/// Byte spans of maximal non-whitespace runs.
fn formatted_token_spans(text: &str) -> Vec<TextSpan> {
    let mut spans = Vec::new();
    let mut start = None;
    for (idx, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(start_char) = start.take() {
                spans.push(TextSpan {
                    start_char,
                    end_char: idx,
                });
            }
        } else if start.is_none() {
            start = Some(idx);
        }
    }
    if let Some(start_char) = start {
        spans.push(TextSpan {
            start_char,
            end_char: text.len(),
        });
    }
    spans
}

/// Drops comma runs sitting directly between two digits.
fn join_digit_groups(chars: &[char]) -> Vec<char> {
    let mut out = Vec::with_capacity(chars.len());
    let mut idx = 0;
    while idx < chars.len() {
        let c = chars[idx];
        if c == ',' && out.last().is_some_and(char::is_ascii_digit) {
            let run_end = chars[idx..]
                .iter()
                .position(|&next| next != ',')
                .map_or(chars.len(), |offset| idx + offset);
            if chars.get(run_end).is_some_and(char::is_ascii_digit) {
                idx = run_end;
                continue;
            }
        }
        out.push(c);
        idx += 1;
    }
    out
}

#[inline]
fn is_decimal_point(chars: &[char], idx: usize) -> bool {
    idx > 0
        && chars[idx - 1].is_ascii_digit()
        && chars.get(idx + 1).is_some_and(char::is_ascii_digit)
}
