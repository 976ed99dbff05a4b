use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::alignment::confidence::BlockConfidence;

/// Literal marker for "this draft contributed nothing at this column".
pub const GAP: &str = "-";
/// Reserved id of the synthetic majority-vote draft.
pub const CONSENSUS_DRAFT_ID: &str = "consensus";
/// `original_to_alignment` value of a token that landed in no column.
pub const UNALIGNED: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(default)]
    pub body: String,
}

impl Section {
    pub fn new(id: u32, body: impl Into<String>) -> Self {
        Self {
            id,
            header: None,
            body: body.into(),
        }
    }

    /// Text that is tokenized and aligned for this section: the header joined
    /// to the body unless the body already opens with it.
    pub fn text(&self) -> Cow<'_, str> {
        match self.header.as_deref().map(str::trim) {
            Some(header) if !header.is_empty() && !self.body.starts_with(header) => {
                Cow::Owned(format!("{header} {}", self.body))
            }
            _ => Cow::Borrowed(&self.body),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub draft_id: String,
    #[serde(
        default,
        alias = "documentId",
        skip_serializing_if = "Option::is_none"
    )]
    pub document_id: Option<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Draft {
    pub fn new(draft_id: impl Into<String>, sections: Vec<Section>) -> Self {
        Self {
            draft_id: draft_id.into(),
            document_id: None,
            sections,
        }
    }

    /// Convenience for single-section drafts.
    pub fn from_text(draft_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(draft_id, vec![Section::new(1, text)])
    }

    pub fn is_consensus(&self) -> bool {
        self.draft_id == CONSENSUS_DRAFT_ID
    }
}

/// Half-open byte range `[start_char, end_char)` into a section text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TextSpan {
    pub start_char: usize,
    pub end_char: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPosition {
    pub token_index: usize,
    /// Byte offset of the formatted token in the section text.
    pub start_char: usize,
    pub end_char: usize,
    /// The formatted token exactly as it appears in the source.
    pub original_text: String,
    pub normalized_text: String,
    /// Whitespace between this formatted token and the next one.
    pub trailing_whitespace: String,
}

impl TokenPosition {
    pub fn span(&self) -> TextSpan {
        TextSpan {
            start_char: self.start_char,
            end_char: self.end_char,
        }
    }
}

/// Links every normalized token of one draft section back to its source span.
///
/// Positions are indexed by normalized token index. Several tokens may share
/// one span when a single formatted token (`4°00'W.`) normalizes to several
/// tokens. Spans never overlap and are non-decreasing in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatMapping {
    pub draft_id: String,
    pub original_text: String,
    pub token_positions: Vec<TokenPosition>,
    /// Formatted tokens that normalized to nothing (pure punctuation).
    #[serde(default)]
    pub filtered_spans: Vec<TextSpan>,
}

impl FormatMapping {
    pub fn position(&self, token_index: usize) -> Option<&TokenPosition> {
        self.token_positions.get(token_index)
    }

    pub fn token_count(&self) -> usize {
        self.token_positions.len()
    }

    pub fn first_span(&self) -> Option<TextSpan> {
        self.token_positions.first().map(TokenPosition::span)
    }

    pub fn last_span(&self) -> Option<TextSpan> {
        self.token_positions.last().map(TokenPosition::span)
    }
}

/// Normalized tokens of one draft section plus the mapping back to its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedText {
    pub tokens: Vec<String>,
    pub mapping: FormatMapping,
}

/// One draft's normalized tokens for a block, as handed to a sequence aligner.
#[derive(Debug, Clone, Copy)]
pub struct SequenceInput<'a> {
    pub draft_id: &'a str,
    pub tokens: &'a [String],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignedSequence {
    pub draft_id: String,
    pub tokens: Vec<String>,
    /// Column of each pre-alignment token, or [`UNALIGNED`].
    pub original_to_alignment: Vec<i64>,
}

impl AlignedSequence {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn is_gap(&self, column: usize) -> bool {
        self.tokens.get(column).is_some_and(|token| token == GAP)
    }

    pub fn gap_count(&self) -> usize {
        self.tokens.iter().filter(|token| *token == GAP).count()
    }

    pub fn non_gap_tokens(&self) -> impl Iterator<Item = &str> {
        self.tokens
            .iter()
            .map(String::as_str)
            .filter(|token| *token != GAP)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockStats {
    pub min_tokens: usize,
    pub max_tokens: usize,
    pub avg_tokens: f64,
    pub unique_tokens: usize,
    pub gap_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockAlignment {
    pub block_id: u32,
    pub aligned_sequences: Vec<AlignedSequence>,
    pub alignment_length: usize,
    pub draft_count: usize,
    pub stats: BlockStats,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AlignmentOutput {
    pub blocks: BTreeMap<u32, BlockAlignment>,
}

/// Why an exact reconstruction degraded to space-joined tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    MissingFormatMapping,
    EmptyAlignmentMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftMetadata {
    pub original_token_count: usize,
    pub aligned_token_count: usize,
    pub gap_count: usize,
    pub exact_text_length: usize,
    /// Per column: how many other drafts hold the same token.
    pub agreement: Vec<usize>,
    /// Per column: the source spelling behind the display token.
    pub source_text: Vec<Option<String>>,
    pub duplicate_spans_skipped: usize,
    pub dangling_columns: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackReason>,
    pub reconstruction_exact: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusMetadata {
    pub generation_method: String,
    pub source_drafts: Vec<String>,
    pub token_count: usize,
    pub text_length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SequenceMetadata {
    Draft(DraftMetadata),
    Consensus(ConsensusMetadata),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedSequence {
    pub draft_id: String,
    /// Type 2 display tokens.
    pub tokens: Vec<String>,
    pub original_to_alignment: Vec<i64>,
    /// Type 1 reconstruction of the draft's section text.
    pub exact_text: String,
    pub formatting_applied: bool,
    pub metadata: SequenceMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    InsufficientDrafts { available: usize },
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConsensusOutcome {
    Generated,
    Skipped {
        #[serde(flatten)]
        reason: SkipReason,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedBlock {
    pub block_id: u32,
    pub aligned_sequences: Vec<FormattedSequence>,
    pub alignment_length: usize,
    pub draft_count: usize,
    pub consensus: ConsensusOutcome,
    pub confidence: BlockConfidence,
    pub stats: BlockStats,
}

impl FormattedBlock {
    /// The generated consensus row, if one was produced for this block.
    pub fn consensus_sequence(&self) -> Option<&FormattedSequence> {
        self.aligned_sequences
            .iter()
            .find(|sequence| matches!(sequence.metadata, SequenceMetadata::Consensus(_)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormatSummary {
    pub total_blocks: usize,
    pub successful_formats: usize,
    pub failed_formats: usize,
    pub consensus_generated: usize,
    pub consensus_skipped: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FormattedOutput {
    pub blocks: BTreeMap<u32, FormattedBlock>,
    pub summary: FormatSummary,
}

impl FormattedOutput {
    /// Consensus text of every block in block order, blank for skipped blocks.
    pub fn consensus_text(&self) -> Vec<String> {
        self.blocks
            .values()
            .map(|block| {
                block
                    .consensus_sequence()
                    .map(|sequence| sequence.exact_text.clone())
                    .unwrap_or_default()
            })
            .collect()
    }
}
