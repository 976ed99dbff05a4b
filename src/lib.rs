pub mod alignment;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod types;

pub use alignment::confidence::{
    assess_quality, score_block, BlockConfidence, ConfidenceLevel, DifferenceKind,
    QualityAssessment,
};
pub use alignment::consensus::{generate_consensus, ConsensusSequence};
pub use alignment::formatting::display::{agreement_counts, display_cells, DisplayCell};
pub use alignment::formatting::exact::{reconstruct, ExactReconstruction};
pub use alignment::formatting::format_block;
pub use alignment::progressive::align_block;
pub use alignment::report::{
    aggregate_reports, compute_document_report, failed_document_report, DocumentReport, Meta,
    Report, REPORT_SCHEMA_VERSION,
};
pub use alignment::sections::{map_sections, normalize_sections, MappingMethod, SectionMapping};
pub use alignment::tokenization::{
    normalize_formatted_token, normalize_text, normalize_whole_text, tokenize_with_mapping,
};
pub use config::{AlignerConfig, ConfidenceThresholds, ScoringParams};
pub use error::AlignmentError;
pub use pipeline::builder::ReconcilerBuilder;
pub use pipeline::runtime::{
    group_by_document, validate_drafts, AlignmentRun, Reconciler, Reconciliation,
    DEFAULT_DOCUMENT_ID,
};
pub use pipeline::traits::{SectionNormalizer, SequenceAligner, Tokenizer};
pub use types::{
    AlignedSequence, AlignmentOutput, BlockAlignment, ConsensusOutcome, Draft, FallbackReason,
    FormatMapping, FormattedBlock, FormattedOutput, FormattedSequence, Section,
    SequenceMetadata, SkipReason, TokenPosition, TokenizedText, CONSENSUS_DRAFT_ID, GAP,
};
