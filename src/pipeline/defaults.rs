use crate::alignment::progressive::align_block;
use crate::alignment::sections::normalize_sections;
use crate::alignment::tokenization::tokenize_with_mapping;
use crate::config::AlignerConfig;
use crate::error::AlignmentError;
use crate::pipeline::traits::{SectionNormalizer, SequenceAligner, Tokenizer};
use crate::types::{BlockAlignment, Draft, SequenceInput, TokenizedText};

pub struct NormalizingTokenizer;

impl Tokenizer for NormalizingTokenizer {
    fn tokenize(&self, draft_id: &str, text: &str) -> TokenizedText {
        tokenize_with_mapping(draft_id, text)
    }
}

pub struct ProgressiveSequenceAligner {
    config: AlignerConfig,
}

impl ProgressiveSequenceAligner {
    pub fn new(config: AlignerConfig) -> Self {
        Self { config }
    }
}

impl SequenceAligner for ProgressiveSequenceAligner {
    fn align_block(
        &self,
        block_id: u32,
        sequences: &[SequenceInput<'_>],
    ) -> Result<BlockAlignment, AlignmentError> {
        align_block(block_id, sequences, &self.config)
    }
}

pub struct SimilaritySectionNormalizer {
    config: AlignerConfig,
}

impl SimilaritySectionNormalizer {
    pub fn new(config: AlignerConfig) -> Self {
        Self { config }
    }
}

impl SectionNormalizer for SimilaritySectionNormalizer {
    fn normalize(&self, drafts: &[Draft]) -> Result<Vec<Draft>, AlignmentError> {
        normalize_sections(drafts, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizing_tokenizer_tokenize() {
        let tokenizer = NormalizingTokenizer;
        let out = tokenizer.tokenize("a", "N. 4°00'W., 1,638 feet");
        assert_eq!(out.tokens, ["n", "4", "00", "w", "1638", "feet"]);
        assert_eq!(out, tokenize_with_mapping("a", "N. 4°00'W., 1,638 feet"));
    }

    #[test]
    fn progressive_sequence_aligner_align_block() {
        let a: Vec<String> = ["lot", "4", "block", "2"].map(String::from).to_vec();
        let b: Vec<String> = ["lot", "block", "2"].map(String::from).to_vec();
        let inputs = [
            SequenceInput {
                draft_id: "a",
                tokens: &a,
            },
            SequenceInput {
                draft_id: "b",
                tokens: &b,
            },
        ];
        let aligner = ProgressiveSequenceAligner::new(AlignerConfig::default());
        let block = aligner.align_block(3, &inputs).expect("aligns");
        let expected = align_block(3, &inputs, &AlignerConfig::default()).expect("aligns");
        assert_eq!(block, expected);
        assert_eq!(block.block_id, 3);
    }

    #[test]
    fn similarity_section_normalizer_normalize() {
        let drafts = vec![
            Draft::new(
                "a",
                vec![
                    crate::types::Section::new(1, "north half"),
                    crate::types::Section::new(2, "of lot 4"),
                ],
            ),
            Draft::from_text("b", "north half of lot 4"),
        ];
        let normalizer = SimilaritySectionNormalizer::new(AlignerConfig::default());
        let out = normalizer.normalize(&drafts).expect("normalizes");
        assert_eq!(out, normalize_sections(&drafts, &AlignerConfig::default()).expect("normalizes"));
        assert_eq!(out[1].sections.len(), 2);
    }
}
