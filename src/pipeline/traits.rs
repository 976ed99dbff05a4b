use crate::error::AlignmentError;
use crate::types::{BlockAlignment, Draft, SequenceInput, TokenizedText};

pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, draft_id: &str, text: &str) -> TokenizedText;
}

pub trait SequenceAligner: Send + Sync {
    fn align_block(
        &self,
        block_id: u32,
        sequences: &[SequenceInput<'_>],
    ) -> Result<BlockAlignment, AlignmentError>;
}

pub trait SectionNormalizer: Send + Sync {
    fn normalize(&self, drafts: &[Draft]) -> Result<Vec<Draft>, AlignmentError>;
}
