use serde::{Deserialize, Serialize};

use crate::config::ConfidenceThresholds;
use crate::types::{AlignedSequence, CONSENSUS_DRAFT_ID, GAP};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn classify(score: f64, thresholds: &ConfidenceThresholds) -> Self {
        if score >= thresholds.high {
            Self::High
        } else if score >= thresholds.medium {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifferenceKind {
    Numeric,
    Word,
    /// One reading, but some drafts left the column empty.
    Omission,
    Other,
}

/// A column where the drafts do not all agree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDifference {
    pub column: usize,
    pub kind: DifferenceKind,
    /// Token of every real draft at this column, gaps included.
    pub tokens: Vec<String>,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BlockConfidence {
    pub scores: Vec<f64>,
    pub levels: Vec<ConfidenceLevel>,
    pub average: f64,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub differences: Vec<ColumnDifference>,
}

/// Scores every column of a block by the share of real drafts that hold its
/// most common token. Gaps never count towards a token.
pub fn score_block(sequences: &[&AlignedSequence], thresholds: &ConfidenceThresholds) -> BlockConfidence {
    let voters: Vec<&AlignedSequence> = sequences
        .iter()
        .copied()
        .filter(|sequence| sequence.draft_id != CONSENSUS_DRAFT_ID)
        .collect();
    let length = voters.iter().map(|sequence| sequence.len()).max().unwrap_or(0);
    let mut confidence = BlockConfidence::default();
    if voters.is_empty() {
        return confidence;
    }

    for column in 0..length {
        let cells: Vec<&str> = voters
            .iter()
            .map(|sequence| sequence.tokens.get(column).map_or(GAP, String::as_str))
            .collect();
        let mut distinct: Vec<(&str, usize)> = Vec::new();
        for cell in cells.iter().copied().filter(|cell| *cell != GAP) {
            match distinct.iter_mut().find(|(seen, _)| *seen == cell) {
                Some((_, count)) => *count += 1,
                None => distinct.push((cell, 1)),
            }
        }
        let most_common = distinct.iter().map(|(_, count)| *count).max().unwrap_or(0);
        let score = most_common as f64 / voters.len() as f64;
        let level = ConfidenceLevel::classify(score, thresholds);
        match level {
            ConfidenceLevel::High => confidence.high += 1,
            ConfidenceLevel::Medium => confidence.medium += 1,
            ConfidenceLevel::Low => confidence.low += 1,
        }
        confidence.scores.push(score);
        confidence.levels.push(level);

        let gapped = cells.iter().any(|cell| *cell == GAP);
        let is_difference = distinct.len() > 1 || (distinct.len() == 1 && gapped);
        if is_difference {
            confidence.differences.push(ColumnDifference {
                column,
                kind: classify_difference(&distinct),
                tokens: cells.iter().map(|cell| cell.to_string()).collect(),
                confidence: score,
            });
        }
    }

    if !confidence.scores.is_empty() {
        confidence.average = confidence.scores.iter().sum::<f64>() / confidence.scores.len() as f64;
    }
    confidence
}

fn classify_difference(distinct: &[(&str, usize)]) -> DifferenceKind {
    if distinct.len() == 1 {
        DifferenceKind::Omission
    } else if distinct
        .iter()
        .any(|(token, _)| token.chars().any(|c| c.is_ascii_digit()))
    {
        DifferenceKind::Numeric
    } else if distinct
        .iter()
        .all(|(token, _)| token.chars().all(char::is_alphabetic))
    {
        DifferenceKind::Word
    } else {
        DifferenceKind::Other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityAssessment {
    Excellent,
    VeryGood,
    Good,
    Fair,
    Poor,
    NoData,
}

/// Grades a whole document from its column confidences.
pub fn assess_quality<'a>(blocks: impl IntoIterator<Item = &'a BlockConfidence>) -> QualityAssessment {
    let mut columns = 0usize;
    let mut high = 0usize;
    let mut total = 0.0f64;
    for block in blocks {
        columns += block.scores.len();
        high += block.high;
        total += block.scores.iter().sum::<f64>();
    }
    if columns == 0 {
        return QualityAssessment::NoData;
    }
    let average = total / columns as f64;
    let high_share = high as f64 / columns as f64;
    if average >= 0.9 && high_share >= 0.8 {
        QualityAssessment::Excellent
    } else if average >= 0.8 && high_share >= 0.7 {
        QualityAssessment::VeryGood
    } else if average >= 0.7 && high_share >= 0.6 {
        QualityAssessment::Good
    } else if average >= 0.6 {
        QualityAssessment::Fair
    } else {
        QualityAssessment::Poor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aligned(draft_id: &str, tokens: &[&str]) -> AlignedSequence {
        AlignedSequence {
            draft_id: draft_id.to_string(),
            tokens: tokens.iter().map(|token| token.to_string()).collect(),
            original_to_alignment: Vec::new(),
        }
    }

    #[test]
    fn columns_are_scored_by_majority_share() {
        let a = aligned("a", &["the", "1638", "feet", "-"]);
        let b = aligned("b", &["the", "1688", "feet", "west"]);
        let c = aligned("c", &["the", "1638", "fect", "-"]);
        let d = aligned("d", &["the", "1638", "feet", "-"]);
        let conf = score_block(&[&a, &b, &c, &d], &ConfidenceThresholds::default());
        assert_eq!(conf.scores, [1.0, 0.75, 0.75, 0.25]);
        assert_eq!(
            conf.levels,
            [
                ConfidenceLevel::High,
                ConfidenceLevel::Medium,
                ConfidenceLevel::Medium,
                ConfidenceLevel::Low
            ]
        );
        assert_eq!((conf.high, conf.medium, conf.low), (1, 2, 1));
        assert!((conf.average - 0.6875).abs() < 1e-9);

        let kinds: Vec<(usize, DifferenceKind)> = conf
            .differences
            .iter()
            .map(|difference| (difference.column, difference.kind))
            .collect();
        assert_eq!(
            kinds,
            [
                (1, DifferenceKind::Numeric),
                (2, DifferenceKind::Word),
                (3, DifferenceKind::Omission)
            ]
        );
        assert_eq!(conf.differences[2].tokens, ["-", "west", "-", "-"]);
    }

    #[test]
    fn punctuated_disagreement_is_other() {
        let a = aligned("a", &["n"]);
        let b = aligned("b", &["n_e"]);
        let conf = score_block(&[&a, &b], &ConfidenceThresholds::default());
        assert_eq!(conf.differences[0].kind, DifferenceKind::Other);
    }

    #[test]
    fn consensus_row_is_ignored() {
        let a = aligned("a", &["lot"]);
        let b = aligned("b", &["lot"]);
        let consensus = aligned(CONSENSUS_DRAFT_ID, &["lit"]);
        let conf = score_block(&[&a, &b, &consensus], &ConfidenceThresholds::default());
        assert_eq!(conf.scores, [1.0]);
        assert!(conf.differences.is_empty());
    }

    #[test]
    fn all_gap_column_scores_zero_without_difference() {
        let a = aligned("a", &["-"]);
        let b = aligned("b", &["-"]);
        let conf = score_block(&[&a, &b], &ConfidenceThresholds::default());
        assert_eq!(conf.scores, [0.0]);
        assert!(conf.differences.is_empty());
    }

    #[test]
    fn quality_grades() {
        let block = |scores: &[f64]| {
            let thresholds = ConfidenceThresholds::default();
            let levels: Vec<ConfidenceLevel> = scores
                .iter()
                .map(|&score| ConfidenceLevel::classify(score, &thresholds))
                .collect();
            BlockConfidence {
                high: levels.iter().filter(|l| **l == ConfidenceLevel::High).count(),
                scores: scores.to_vec(),
                levels,
                ..BlockConfidence::default()
            }
        };
        assert_eq!(assess_quality([&block(&[1.0, 1.0, 1.0])]), QualityAssessment::Excellent);
        assert_eq!(
            assess_quality([&block(&[1.0, 1.0, 1.0, 0.5])]),
            QualityAssessment::VeryGood
        );
        assert_eq!(assess_quality([&block(&[1.0, 0.5])]), QualityAssessment::Fair);
        assert_eq!(assess_quality([&block(&[0.5, 0.25])]), QualityAssessment::Poor);
        assert_eq!(assess_quality(std::iter::empty()), QualityAssessment::NoData);
    }
}
