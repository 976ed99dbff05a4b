use std::collections::{BTreeMap, HashSet};

use crate::alignment::formatting::format_block;
use crate::alignment::progressive::check_column_counts;
use crate::alignment::sections::check_section_counts;
use crate::config::AlignerConfig;
use crate::error::AlignmentError;
use crate::pipeline::traits::{SectionNormalizer, SequenceAligner, Tokenizer};
use crate::types::{
    AlignmentOutput, BlockAlignment, ConsensusOutcome, Draft, FormatMapping, FormatSummary,
    FormattedBlock, FormattedOutput, SequenceInput, SequenceMetadata,
};

/// Document key for drafts that carry no `document_id`.
pub const DEFAULT_DOCUMENT_ID: &str = "default";

pub struct Reconciler {
    config: AlignerConfig,
    tokenizer: Box<dyn Tokenizer>,
    sequence_aligner: Box<dyn SequenceAligner>,
    section_normalizer: Box<dyn SectionNormalizer>,
}

pub(crate) struct ReconcilerParts {
    pub config: AlignerConfig,
    pub tokenizer: Box<dyn Tokenizer>,
    pub sequence_aligner: Box<dyn SequenceAligner>,
    pub section_normalizer: Box<dyn SectionNormalizer>,
}

/// Alignment of one document together with what formatting needs afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentRun {
    /// Drafts after validation and section normalization.
    pub drafts: Vec<Draft>,
    pub output: AlignmentOutput,
    /// Format mappings per block, in the same order as its aligned sequences.
    pub mappings: BTreeMap<u32, Vec<FormatMapping>>,
}

/// Aligned and formatted result of one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub alignment: AlignmentRun,
    pub formatted: FormattedOutput,
}

impl Reconciler {
    pub(crate) fn from_parts(parts: ReconcilerParts) -> Self {
        Self {
            config: parts.config,
            tokenizer: parts.tokenizer,
            sequence_aligner: parts.sequence_aligner,
            section_normalizer: parts.section_normalizer,
        }
    }

    pub fn config(&self) -> &AlignerConfig {
        &self.config
    }

    /// Normalizes sections, then tokenizes and aligns every block.
    ///
    /// Block ids are the 1-based section positions shared by all drafts after
    /// normalization.
    pub fn align(&self, drafts: &[Draft]) -> Result<AlignmentRun, AlignmentError> {
        let drafts = validate_drafts(drafts, self.config.max_drafts)?;
        let normalized = self.section_normalizer.normalize(&drafts)?;
        let section_count = normalized
            .first()
            .map_or(0, |draft| draft.sections.len());
        check_section_counts(&normalized, section_count)?;

        let results = self.map_blocks(section_count, |section_idx| {
            self.align_section(&normalized, section_idx)
        });

        let mut output = AlignmentOutput::default();
        let mut mappings = BTreeMap::new();
        for result in results {
            let (block, block_mappings) = result?;
            mappings.insert(block.block_id, block_mappings);
            output.blocks.insert(block.block_id, block);
        }

        tracing::debug!(
            draft_count = normalized.len(),
            block_count = output.blocks.len(),
            "aligned drafts"
        );
        Ok(AlignmentRun {
            drafts: normalized,
            output,
            mappings,
        })
    }

    /// Builds display tokens, exact text and consensus for every block.
    ///
    /// Mappings are matched to aligned sequences by draft id; sequences
    /// without one fall back to joined tokens.
    pub fn reformat(
        &self,
        alignment: &AlignmentOutput,
        mappings: &BTreeMap<u32, Vec<FormatMapping>>,
    ) -> FormattedOutput {
        let blocks: Vec<&BlockAlignment> = alignment.blocks.values().collect();
        let formatted = self.map_blocks(blocks.len(), |idx| {
            let block = blocks[idx];
            let block_mappings = mappings.get(&block.block_id);
            let lookup: Vec<Option<&FormatMapping>> = block
                .aligned_sequences
                .iter()
                .map(|sequence| {
                    block_mappings.and_then(|all| {
                        all.iter()
                            .find(|mapping| mapping.draft_id == sequence.draft_id)
                    })
                })
                .collect();
            format_block(block, &lookup, &self.config)
        });

        let summary = summarize(&formatted);
        tracing::info!(
            total_blocks = summary.total_blocks,
            successful_formats = summary.successful_formats,
            failed_formats = summary.failed_formats,
            consensus_generated = summary.consensus_generated,
            consensus_skipped = summary.consensus_skipped.len(),
            "formatted alignment"
        );
        FormattedOutput {
            blocks: formatted
                .into_iter()
                .map(|block| (block.block_id, block))
                .collect(),
            summary,
        }
    }

    pub fn reconcile(&self, drafts: &[Draft]) -> Result<Reconciliation, AlignmentError> {
        let alignment = self.align(drafts)?;
        let formatted = self.reformat(&alignment.output, &alignment.mappings);
        Ok(Reconciliation {
            alignment,
            formatted,
        })
    }

    /// Reconciles every document independently, keyed by document id.
    ///
    /// A failing document is reported in its own entry and does not stop the
    /// others.
    pub fn reconcile_documents(
        &self,
        drafts: &[Draft],
    ) -> BTreeMap<String, Result<Reconciliation, AlignmentError>> {
        group_by_document(drafts)
            .into_iter()
            .map(|(document_id, group)| {
                let result = self.reconcile(&group);
                if let Err(err) = &result {
                    tracing::error!(document_id = %document_id, error = %err, "document failed");
                }
                (document_id, result)
            })
            .collect()
    }

    fn align_section(
        &self,
        drafts: &[Draft],
        section_idx: usize,
    ) -> Result<(BlockAlignment, Vec<FormatMapping>), AlignmentError> {
        let block_id = u32::try_from(section_idx + 1)
            .map_err(|_| AlignmentError::invalid_input("too many sections"))?;
        let tokenized: Vec<_> = drafts
            .iter()
            .map(|draft| {
                let text = draft
                    .sections
                    .get(section_idx)
                    .map(|section| section.text().into_owned())
                    .unwrap_or_default();
                self.tokenizer.tokenize(&draft.draft_id, &text)
            })
            .collect();
        let inputs: Vec<SequenceInput<'_>> = drafts
            .iter()
            .zip(&tokenized)
            .map(|(draft, tokenized)| SequenceInput {
                draft_id: &draft.draft_id,
                tokens: &tokenized.tokens,
            })
            .collect();

        let block = self.sequence_aligner.align_block(block_id, &inputs)?;
        check_column_counts(block_id, block.alignment_length, &block.aligned_sequences)?;
        let mappings = tokenized
            .into_iter()
            .map(|tokenized| tokenized.mapping)
            .collect();
        Ok((block, mappings))
    }

    fn map_blocks<T, F>(&self, count: usize, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Send + Sync,
    {
        #[cfg(feature = "parallel")]
        {
            if self.config.parallel_blocks && count > 1 {
                use rayon::prelude::*;
                return (0..count).into_par_iter().map(f).collect();
            }
        }
        (0..count).map(f).collect()
    }
}

/// Checks the draft list and returns the drafts that will be reconciled.
///
/// A draft named `consensus` passes validation but is dropped, so it neither
/// votes nor collides with the generated consensus row.
pub fn validate_drafts(drafts: &[Draft], max_drafts: usize) -> Result<Vec<Draft>, AlignmentError> {
    if drafts.is_empty() {
        return Err(AlignmentError::invalid_input("no drafts to reconcile"));
    }
    let mut seen = HashSet::new();
    for draft in drafts {
        if draft.draft_id.trim().is_empty() {
            return Err(AlignmentError::invalid_input("draft_id must not be empty"));
        }
        if !seen.insert(draft.draft_id.as_str()) {
            return Err(AlignmentError::invalid_input(format!(
                "duplicate draft_id '{}'",
                draft.draft_id
            )));
        }
        let mut section_ids = HashSet::new();
        if let Some(section) = draft
            .sections
            .iter()
            .find(|section| !section_ids.insert(section.id))
        {
            return Err(AlignmentError::invalid_input(format!(
                "draft '{}' has duplicate section id {}",
                draft.draft_id, section.id
            )));
        }
    }
    let mut kept: Vec<Draft> = drafts
        .iter()
        .filter(|draft| !draft.is_consensus())
        .cloned()
        .collect();
    if kept.len() < drafts.len() {
        tracing::warn!("input holds a consensus draft; it is dropped before alignment");
    }
    if kept.is_empty() {
        return Err(AlignmentError::invalid_input(
            "no drafts to reconcile besides a consensus draft",
        ));
    }
    if kept.len() > max_drafts {
        tracing::warn!(
            draft_count = kept.len(),
            max_drafts,
            "too many drafts; extra drafts are ignored"
        );
        kept.truncate(max_drafts);
    }
    Ok(kept)
}

/// Groups drafts by `document_id`, keeping input order inside each group.
pub fn group_by_document(drafts: &[Draft]) -> BTreeMap<String, Vec<Draft>> {
    let mut groups: BTreeMap<String, Vec<Draft>> = BTreeMap::new();
    for draft in drafts {
        let key = draft
            .document_id
            .clone()
            .unwrap_or_else(|| DEFAULT_DOCUMENT_ID.to_string());
        groups.entry(key).or_default().push(draft.clone());
    }
    groups
}

fn summarize(blocks: &[FormattedBlock]) -> FormatSummary {
    let mut summary = FormatSummary {
        total_blocks: blocks.len(),
        ..FormatSummary::default()
    };
    for block in blocks {
        for sequence in block
            .aligned_sequences
            .iter()
            .filter(|sequence| matches!(sequence.metadata, SequenceMetadata::Draft(_)))
        {
            if sequence.formatting_applied {
                summary.successful_formats += 1;
            } else {
                summary.failed_formats += 1;
            }
        }
        match block.consensus {
            ConsensusOutcome::Generated => summary.consensus_generated += 1,
            ConsensusOutcome::Skipped { .. } => summary.consensus_skipped.push(block.block_id),
        }
    }
    summary
}
