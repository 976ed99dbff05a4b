use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use draft_consensus::{
    ConsensusOutcome, DocumentReport, FormattedBlock, Reconciliation, SkipReason,
};

const DIFFERENCE_MARK: &str = "^";

pub fn render_document(
    document_id: &str,
    report: &DocumentReport,
    reconciliation: &Reconciliation,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "== document {document_id}: {} drafts, {} blocks, quality {:?}, avg confidence {:.2}",
        report.draft_count, report.block_count, report.quality, report.average_confidence
    );
    for block in reconciliation.formatted.blocks.values() {
        render_block(&mut out, block);
    }
    out.push('\n');
    out
}

fn render_block(out: &mut String, block: &FormattedBlock) {
    let consensus = match block.consensus {
        ConsensusOutcome::Generated => "generated".to_string(),
        ConsensusOutcome::Skipped {
            reason: SkipReason::InsufficientDrafts { available },
        } => format!("skipped ({available} drafts)"),
        ConsensusOutcome::Skipped {
            reason: SkipReason::Disabled,
        } => "disabled".to_string(),
    };
    let _ = writeln!(
        out,
        "-- block {} ({} columns, consensus {consensus})",
        block.block_id, block.alignment_length
    );

    let label_width = block
        .aligned_sequences
        .iter()
        .map(|sequence| sequence.draft_id.chars().count())
        .max()
        .unwrap_or(0);
    let widths: Vec<usize> = (0..block.alignment_length)
        .map(|column| {
            block
                .aligned_sequences
                .iter()
                .filter_map(|sequence| sequence.tokens.get(column))
                .map(|token| token.chars().count())
                .max()
                .unwrap_or(1)
                .max(DIFFERENCE_MARK.len())
        })
        .collect();

    for sequence in &block.aligned_sequences {
        let cells: Vec<&str> = sequence.tokens.iter().map(String::as_str).collect();
        write_row(out, &sequence.draft_id, label_width, &cells, &widths);
    }

    let mut marks = vec![""; block.alignment_length];
    for difference in &block.confidence.differences {
        if let Some(mark) = marks.get_mut(difference.column) {
            *mark = DIFFERENCE_MARK;
        }
    }
    if !block.confidence.differences.is_empty() {
        write_row(out, "", label_width, &marks, &widths);
    }
}

fn write_row(out: &mut String, label: &str, label_width: usize, cells: &[&str], widths: &[usize]) {
    let mut line = format!("{label:<label_width$} |");
    for (cell, width) in cells.iter().zip(widths) {
        let _ = write!(line, " {cell:<width$}");
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

pub fn write_tables(path: &Path, tables: &str) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| {
            format!(
                "Failed to create table output directory '{}': {err}",
                parent.display()
            )
        })?;
    }
    fs::write(path, tables)
        .map_err(|err| format!("Failed to write table report '{}': {err}", path.display()))
}
