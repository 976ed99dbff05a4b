use super::SplitPoint;
use crate::types::Section;

/// Cuts the concatenated section texts at `points`, one piece per point.
///
/// Points are clamped onto the texts, floored to char boundaries and sorted;
/// the first piece always starts at the beginning of the draft and the last
/// one runs to its end, so every byte of the input lands in exactly one piece.
pub(super) fn cut_pieces(sections: &[Section], texts: &[String], points: &[SplitPoint]) -> Vec<Section> {
    let mut points: Vec<SplitPoint> = points.iter().map(|&point| clamp(point, texts)).collect();
    points.sort();
    if let Some(first) = points.first_mut() {
        *first = SplitPoint::ORIGIN;
    }
    let end = SplitPoint {
        section: texts.len().saturating_sub(1),
        offset: texts.last().map_or(0, String::len),
    };

    points
        .iter()
        .enumerate()
        .map(|(idx, &start)| {
            let stop = points.get(idx + 1).copied().unwrap_or(end);
            let body = slice_between(texts, start, stop);
            let header = if start.offset == 0 {
                sections
                    .get(start.section)
                    .and_then(|section| section.header.clone())
                    .filter(|header| !header.trim().is_empty() && body.starts_with(header.trim()))
            } else {
                None
            };
            Section {
                id: idx as u32 + 1,
                header,
                body,
            }
        })
        .collect()
}

fn clamp(point: SplitPoint, texts: &[String]) -> SplitPoint {
    let Some(last) = texts.len().checked_sub(1) else {
        return SplitPoint::ORIGIN;
    };
    let section = point.section.min(last);
    let text = &texts[section];
    let mut offset = point.offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    SplitPoint { section, offset }
}

fn slice_between(texts: &[String], start: SplitPoint, stop: SplitPoint) -> String {
    if start.section == stop.section {
        let text = &texts[start.section];
        return text[start.offset..stop.offset.max(start.offset)].to_string();
    }
    let mut body = texts[start.section][start.offset..].to_string();
    for text in &texts[start.section + 1..stop.section] {
        append_joined(&mut body, text);
    }
    append_joined(&mut body, &texts[stop.section][..stop.offset]);
    body
}

/// Appends `next`, separating with a newline only where the two texts would
/// otherwise fuse into one word.
fn append_joined(body: &mut String, next: &str) {
    if next.is_empty() {
        return;
    }
    let left_open = body.chars().next_back().is_some_and(|c| !c.is_whitespace());
    let right_open = next.chars().next().is_some_and(|c| !c.is_whitespace());
    if left_open && right_open {
        body.push('\n');
    }
    body.push_str(next);
}
