use super::SplitPoint;

/// Fallback for dissimilar drafts: targets are spread evenly over the current
/// sections (earlier sections take the remainder) and each current section is
/// cut in proportion to the character lengths of its targets.
pub(super) fn locate_proportionally(
    target_texts: &[String],
    current_texts: &[String],
) -> Vec<SplitPoint> {
    let current_count = current_texts.len().max(1);
    let per_section = target_texts.len() / current_count;
    let remainder = target_texts.len() % current_count;

    let mut points = Vec::with_capacity(target_texts.len());
    let mut next_target = 0usize;
    for (section, text) in current_texts.iter().enumerate() {
        let share = per_section + usize::from(section < remainder);
        let end = (next_target + share).min(target_texts.len());
        let weights: Vec<usize> = target_texts[next_target..end]
            .iter()
            .map(|target| target.chars().count().max(1))
            .collect();
        let total: usize = weights.iter().sum();
        let text_chars = text.chars().count();

        let mut covered = 0usize;
        for weight in weights {
            let char_pos = if total == 0 {
                0
            } else {
                text_chars * covered / total
            };
            points.push(SplitPoint {
                section,
                offset: snap_to_token_start(text, char_pos),
            });
            covered += weight;
        }
        next_target = end;
    }
    points
}

/// Byte offset of the first token start at or after character `char_pos`,
/// or the text length when no token follows.
pub(super) fn snap_to_token_start(text: &str, char_pos: usize) -> usize {
    let byte = text
        .char_indices()
        .nth(char_pos)
        .map_or(text.len(), |(idx, _)| idx);
    if byte == 0 || byte >= text.len() {
        return byte;
    }
    let mut cursor = byte;
    let after_space = text[..byte]
        .chars()
        .next_back()
        .is_some_and(char::is_whitespace);
    if !after_space {
        let rest = &text[cursor..];
        cursor += rest.find(char::is_whitespace).unwrap_or(rest.len());
    }
    let tail = &text[cursor..];
    cursor + tail.find(|c: char| !c.is_whitespace()).unwrap_or(tail.len())
}
