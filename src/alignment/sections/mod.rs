use crate::config::AlignerConfig;
use crate::error::AlignmentError;
use crate::types::{Draft, Section};

mod distribute;
mod locate;
mod split;
#[cfg(test)]
mod tests;

/// Position inside a draft: byte `offset` into the text of section `section`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct SplitPoint {
    section: usize,
    offset: usize,
}

impl SplitPoint {
    const ORIGIN: SplitPoint = SplitPoint {
        section: 0,
        offset: 0,
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MappingMethod {
    /// Target section starts located through a token alignment of both drafts.
    Aligned,
    /// Content too dissimilar: targets spread evenly and split by length.
    Proportional,
}

/// Where each target section begins inside one shorter draft.
#[derive(Clone, Debug)]
pub struct SectionMapping {
    pub method: MappingMethod,
    pub similarity: f64,
    points: Vec<SplitPoint>,
    current_sections: usize,
}

impl SectionMapping {
    /// For every current section, the target sections that begin inside it.
    /// Sections with an empty list are merged into the preceding piece.
    pub fn current_to_targets(&self) -> Vec<Vec<usize>> {
        let mut mapping = vec![Vec::new(); self.current_sections];
        for (target, point) in self.points.iter().enumerate() {
            if let Some(targets) = mapping.get_mut(point.section) {
                targets.push(target);
            }
        }
        mapping
    }
}

/// Maps the section boundaries of `target_texts` onto `current_texts`.
pub fn map_sections(
    target_texts: &[String],
    current_texts: &[String],
    config: &AlignerConfig,
) -> SectionMapping {
    let target = locate::SectionTokens::collect(target_texts);
    let current = locate::SectionTokens::collect(current_texts);
    let similarity = locate::token_overlap(target.tokens(), current.tokens());

    let (method, points) = if similarity >= config.section_similarity_threshold {
        (
            MappingMethod::Aligned,
            locate::locate_by_alignment(&target, &current, current_texts, config),
        )
    } else {
        (
            MappingMethod::Proportional,
            distribute::locate_proportionally(target_texts, current_texts),
        )
    };

    SectionMapping {
        method,
        similarity,
        points,
        current_sections: current_texts.len(),
    }
}

/// Brings every draft to the section count of the draft with the most
/// sections (the first such draft on ties) by splitting the sections of
/// shorter drafts where the target's sections begin.
///
/// Drafts already at the target count pass through untouched. Section text is
/// never dropped; sections that no target starts in are merged into the
/// preceding piece.
pub fn normalize_sections(
    drafts: &[Draft],
    config: &AlignerConfig,
) -> Result<Vec<Draft>, AlignmentError> {
    if drafts.is_empty() {
        return Ok(Vec::new());
    }
    let prepared: Vec<Draft> = drafts.iter().map(with_placeholder_section).collect();
    let target_count = prepared
        .iter()
        .map(|draft| draft.sections.len())
        .max()
        .unwrap_or(1);
    let Some(target) = prepared
        .iter()
        .find(|draft| draft.sections.len() == target_count)
    else {
        return Ok(prepared);
    };
    let target_id = target.draft_id.clone();
    let target_texts = section_texts(&target.sections);

    let mut normalized = Vec::with_capacity(prepared.len());
    for draft in prepared {
        if draft.sections.len() == target_count {
            normalized.push(draft);
            continue;
        }
        let current_texts = section_texts(&draft.sections);
        let mapping = map_sections(&target_texts, &current_texts, config);
        if mapping.method == MappingMethod::Proportional {
            tracing::warn!(
                draft_id = %draft.draft_id,
                target_id = %target_id,
                similarity = format!("{:.3}", mapping.similarity),
                "section content too dissimilar; splitting proportionally"
            );
        }
        tracing::debug!(
            draft_id = %draft.draft_id,
            target_id = %target_id,
            from = draft.sections.len(),
            to = target_count,
            method = ?mapping.method,
            mapping = ?mapping.current_to_targets(),
            "section normalizer: split draft"
        );
        let sections = split::cut_pieces(&draft.sections, &current_texts, &mapping.points);
        normalized.push(Draft { sections, ..draft });
    }

    check_section_counts(&normalized, target_count)?;
    Ok(normalized)
}

pub(crate) fn check_section_counts(drafts: &[Draft], expected: usize) -> Result<(), AlignmentError> {
    match drafts
        .iter()
        .find(|draft| draft.sections.len() != expected)
    {
        Some(draft) => Err(AlignmentError::section_divergence(
            draft.draft_id.clone(),
            expected,
            draft.sections.len(),
        )),
        None => Ok(()),
    }
}

fn with_placeholder_section(draft: &Draft) -> Draft {
    let mut draft = draft.clone();
    if draft.sections.is_empty() {
        draft.sections.push(Section::new(1, String::new()));
    }
    draft
}

fn section_texts(sections: &[Section]) -> Vec<String> {
    sections
        .iter()
        .map(|section| section.text().into_owned())
        .collect()
}
