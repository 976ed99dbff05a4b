use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AlignmentError;

/// Token-level scores for the Needleman–Wunsch engine. Gaps are linear:
/// opening and extending a gap both cost `gap_score`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringParams {
    pub match_score: i32,
    pub mismatch_score: i32,
    /// Score of two different tokens that are near spellings of each other.
    pub near_match_score: i32,
    pub gap_score: i32,
}

impl ScoringParams {
    pub const DEFAULT_MATCH: i32 = 5;
    pub const DEFAULT_MISMATCH: i32 = -3;
    pub const DEFAULT_NEAR_MATCH: i32 = -1;
    pub const DEFAULT_GAP: i32 = -2;
    /// Largest accepted absolute value of any score.
    pub const MAX_MAGNITUDE: i32 = 10_000;
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            match_score: Self::DEFAULT_MATCH,
            mismatch_score: Self::DEFAULT_MISMATCH,
            near_match_score: Self::DEFAULT_NEAR_MATCH,
            gap_score: Self::DEFAULT_GAP,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceThresholds {
    pub high: f64,
    pub medium: f64,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            high: 0.8,
            medium: 0.4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignerConfig {
    pub scoring: ScoringParams,
    /// Minimum normalized Levenshtein similarity for two tokens to count as a near match.
    pub near_match_similarity: f64,
    /// Below this token-overlap ratio, sections are split proportionally instead of by alignment.
    pub section_similarity_threshold: f64,
    pub confidence: ConfidenceThresholds,
    /// Drafts beyond this count are ignored.
    pub max_drafts: usize,
    pub generate_consensus: bool,
    pub parallel_blocks: bool,
}

impl AlignerConfig {
    pub const DEFAULT_NEAR_MATCH_SIMILARITY: f64 = 0.75;
    pub const DEFAULT_SECTION_SIMILARITY_THRESHOLD: f64 = 0.6;
    pub const DEFAULT_MAX_DRAFTS: usize = 10;

    pub fn load(path: &Path) -> Result<Self, AlignmentError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| AlignmentError::io("read aligner config", e))?;
        serde_json::from_str(&data).map_err(|e| AlignmentError::json("parse aligner config", e))
    }

    pub fn validate(&self) -> Result<(), AlignmentError> {
        let scoring = &self.scoring;
        for (name, value) in [
            ("match_score", scoring.match_score),
            ("mismatch_score", scoring.mismatch_score),
            ("near_match_score", scoring.near_match_score),
            ("gap_score", scoring.gap_score),
        ] {
            if value.unsigned_abs() > ScoringParams::MAX_MAGNITUDE.unsigned_abs() {
                return Err(AlignmentError::invalid_input(format!(
                    "{name} must be within ±{}, got {value}",
                    ScoringParams::MAX_MAGNITUDE
                )));
            }
        }
        if scoring.match_score <= 0 {
            return Err(AlignmentError::invalid_input(format!(
                "match_score must be positive, got {}",
                scoring.match_score
            )));
        }
        if scoring.gap_score >= 0 {
            return Err(AlignmentError::invalid_input(format!(
                "gap_score must be negative, got {}",
                scoring.gap_score
            )));
        }
        if scoring.mismatch_score >= scoring.match_score
            || scoring.near_match_score >= scoring.match_score
        {
            return Err(AlignmentError::invalid_input(
                "mismatch and near-match scores must be below match_score",
            ));
        }
        for (name, value) in [
            ("near_match_similarity", self.near_match_similarity),
            ("section_similarity_threshold", self.section_similarity_threshold),
            ("confidence.high", self.confidence.high),
            ("confidence.medium", self.confidence.medium),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AlignmentError::invalid_input(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.confidence.medium > self.confidence.high {
            return Err(AlignmentError::invalid_input(
                "confidence.medium must not exceed confidence.high",
            ));
        }
        if self.max_drafts == 0 {
            return Err(AlignmentError::invalid_input("max_drafts must be at least 1"));
        }
        if scoring.mismatch_score <= scoring.gap_score.saturating_mul(2) {
            tracing::warn!(
                mismatch_score = scoring.mismatch_score,
                gap_score = scoring.gap_score,
                "mismatch scores no better than two gaps; substitutions will never share a column"
            );
        }
        Ok(())
    }
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringParams::default(),
            near_match_similarity: Self::DEFAULT_NEAR_MATCH_SIMILARITY,
            section_similarity_threshold: Self::DEFAULT_SECTION_SIMILARITY_THRESHOLD,
            confidence: ConfidenceThresholds::default(),
            max_drafts: Self::DEFAULT_MAX_DRAFTS,
            generate_consensus: true,
            parallel_blocks: true,
        }
    }
}
