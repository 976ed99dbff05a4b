use std::path::Path;

use crate::config::AlignerConfig;
use crate::error::AlignmentError;
use crate::pipeline::defaults::{
    NormalizingTokenizer, ProgressiveSequenceAligner, SimilaritySectionNormalizer,
};
use crate::pipeline::runtime::{Reconciler, ReconcilerParts};
use crate::pipeline::traits::{SectionNormalizer, SequenceAligner, Tokenizer};

pub struct ReconcilerBuilder {
    config: AlignerConfig,
    tokenizer: Option<Box<dyn Tokenizer>>,
    sequence_aligner: Option<Box<dyn SequenceAligner>>,
    section_normalizer: Option<Box<dyn SectionNormalizer>>,
}

impl ReconcilerBuilder {
    pub fn new(config: AlignerConfig) -> Self {
        Self {
            config,
            tokenizer: None,
            sequence_aligner: None,
            section_normalizer: None,
        }
    }

    pub fn from_config_file(path: &Path) -> Result<Self, AlignmentError> {
        Ok(Self::new(AlignerConfig::load(path)?))
    }

    pub fn with_tokenizer(mut self, tokenizer: Box<dyn Tokenizer>) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    pub fn with_sequence_aligner(mut self, sequence_aligner: Box<dyn SequenceAligner>) -> Self {
        self.sequence_aligner = Some(sequence_aligner);
        self
    }

    pub fn with_section_normalizer(mut self, section_normalizer: Box<dyn SectionNormalizer>) -> Self {
        self.section_normalizer = Some(section_normalizer);
        self
    }

    pub fn build(self) -> Result<Reconciler, AlignmentError> {
        self.config.validate()?;
        let config = self.config;

        Ok(Reconciler::from_parts(ReconcilerParts {
            tokenizer: self
                .tokenizer
                .unwrap_or_else(|| Box::new(NormalizingTokenizer)),
            sequence_aligner: self
                .sequence_aligner
                .unwrap_or_else(|| Box::new(ProgressiveSequenceAligner::new(config.clone()))),
            section_normalizer: self
                .section_normalizer
                .unwrap_or_else(|| Box::new(SimilaritySectionNormalizer::new(config.clone()))),
            config,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        AlignedSequence, BlockAlignment, BlockStats, Draft, SequenceInput, TokenizedText,
    };

    struct UpperTokenizer;

    impl Tokenizer for UpperTokenizer {
        fn tokenize(&self, draft_id: &str, text: &str) -> TokenizedText {
            let mut tokenized = NormalizingTokenizer.tokenize(draft_id, text);
            for token in &mut tokenized.tokens {
                *token = token.to_uppercase();
            }
            tokenized
        }
    }

    /// Pads the first draft with one extra column, breaking the equal-length rule.
    struct RaggedAligner;

    impl SequenceAligner for RaggedAligner {
        fn align_block(
            &self,
            block_id: u32,
            sequences: &[SequenceInput<'_>],
        ) -> Result<BlockAlignment, AlignmentError> {
            let mut aligned_sequences: Vec<AlignedSequence> = sequences
                .iter()
                .map(|seq| AlignedSequence {
                    draft_id: seq.draft_id.to_string(),
                    tokens: seq.tokens.to_vec(),
                    original_to_alignment: (0..seq.tokens.len() as i64).collect(),
                })
                .collect();
            if let Some(first) = aligned_sequences.first_mut() {
                first.tokens.push("-".to_string());
            }
            let alignment_length = aligned_sequences.first().map_or(0, AlignedSequence::len);
            Ok(BlockAlignment {
                block_id,
                alignment_length,
                draft_count: aligned_sequences.len(),
                aligned_sequences,
                stats: BlockStats {
                    min_tokens: 0,
                    max_tokens: 0,
                    avg_tokens: 0.0,
                    unique_tokens: 0,
                    gap_count: 0,
                },
            })
        }
    }

    #[test]
    fn builder_uses_defaults() {
        let reconciler = ReconcilerBuilder::new(AlignerConfig::default())
            .build()
            .expect("build should succeed");
        assert_eq!(reconciler.config(), &AlignerConfig::default());
        let run = reconciler
            .align(&[Draft::from_text("a", "Lot 4"), Draft::from_text("b", "lot four")])
            .expect("aligns");
        assert_eq!(run.output.blocks.len(), 1);
    }

    #[test]
    fn builder_accepts_custom_tokenizer() {
        let reconciler = ReconcilerBuilder::new(AlignerConfig::default())
            .with_tokenizer(Box::new(UpperTokenizer))
            .build()
            .expect("build should succeed");
        let run = reconciler
            .align(&[Draft::from_text("a", "Lot 4")])
            .expect("aligns");
        assert_eq!(run.output.blocks[&1].aligned_sequences[0].tokens, ["LOT", "4"]);
    }

    #[test]
    fn ragged_custom_aligner_is_rejected() {
        let reconciler = ReconcilerBuilder::new(AlignerConfig::default())
            .with_sequence_aligner(Box::new(RaggedAligner))
            .build()
            .expect("build should succeed");
        let err = reconciler
            .align(&[Draft::from_text("a", "lot 4"), Draft::from_text("b", "lot 4")])
            .expect_err("unequal columns");
        assert!(matches!(
            err,
            AlignmentError::AlignmentColumnMismatch {
                block_id: 1,
                expected: 3,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn build_fails_on_invalid_config() {
        let mut config = AlignerConfig::default();
        config.scoring.gap_score = 1;
        assert!(ReconcilerBuilder::new(config).build().is_err());
    }

    #[test]
    fn builder_reads_config_file() {
        let path = std::env::temp_dir().join("draft_consensus_builder_config.json");
        std::fs::write(&path, r#"{"generate_consensus": false}"#).expect("write config");
        let reconciler = ReconcilerBuilder::from_config_file(&path)
            .expect("load")
            .build()
            .expect("build should succeed");
        assert!(!reconciler.config().generate_consensus);
        let _ = std::fs::remove_file(&path);

        assert!(ReconcilerBuilder::from_config_file(Path::new("/nonexistent/aligner.json")).is_err());
    }
}
