use std::cmp::Ordering;

use serde::Serialize;

use crate::alignment::confidence::{assess_quality, DifferenceKind, QualityAssessment};
use crate::error::AlignmentError;
use crate::pipeline::runtime::Reconciliation;
use crate::types::FormatSummary;

pub const REPORT_SCHEMA_VERSION: u32 = 1;
const OUTLIER_TOP_N: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub schema_version: u32,
    pub meta: Meta,
    pub documents: Vec<DocumentReport>,
    pub aggregates: AggregateReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    pub generated_at: String,
    pub input_path: String,
    pub document_count: usize,
    pub draft_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub id: String,
    pub draft_count: usize,
    pub block_count: usize,
    pub total_columns: usize,
    pub quality: QualityAssessment,
    pub average_confidence: f32,
    pub gap_ratio: f32,
    pub levels: LevelCounts,
    pub differences: DifferenceCounts,
    pub summary: FormatSummary,
    /// Consensus text per block, blank where consensus was skipped.
    pub consensus_text: Vec<String>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LevelCounts {
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DifferenceCounts {
    pub numeric: u32,
    pub word: u32,
    pub omission: u32,
    pub other: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    pub counts: AggregateCounts,
    pub average_confidence: Option<MetricDistribution>,
    pub gap_ratio: Option<MetricDistribution>,
    pub quality: QualityCounts,
    pub lowest_confidence: Vec<OutlierEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateCounts {
    pub documents: u32,
    pub failed_documents: u32,
    pub blocks: u32,
    pub consensus_generated: u32,
    pub consensus_skipped: u32,
    pub failed_formats: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct QualityCounts {
    pub excellent: u32,
    pub very_good: u32,
    pub good: u32,
    pub fair: u32,
    pub poor: u32,
    pub no_data: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricDistribution {
    pub mean: f32,
    pub min: f32,
    pub p50: f32,
    pub p90: f32,
    pub max: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutlierEntry {
    pub id: String,
    pub value: f32,
}

pub fn compute_document_report(
    id: &str,
    reconciliation: &Reconciliation,
) -> Result<DocumentReport, AlignmentError> {
    let formatted = &reconciliation.formatted;
    let mut notes = Vec::new();
    let mut levels = LevelCounts::default();
    let mut differences = DifferenceCounts::default();
    let mut total_columns = 0usize;
    let mut total_cells = 0usize;
    let mut gap_cells = 0usize;

    for block in formatted.blocks.values() {
        let confidence = &block.confidence;
        total_columns += block.alignment_length;
        total_cells += block.alignment_length * block.draft_count;
        gap_cells += block.stats.gap_count;
        levels.high += to_u32(confidence.high);
        levels.medium += to_u32(confidence.medium);
        levels.low += to_u32(confidence.low);
        for difference in &confidence.differences {
            match difference.kind {
                DifferenceKind::Numeric => differences.numeric += 1,
                DifferenceKind::Word => differences.word += 1,
                DifferenceKind::Omission => differences.omission += 1,
                DifferenceKind::Other => differences.other += 1,
            }
        }
        if block.alignment_length == 0 {
            notes.push(format!("empty_block={}", block.block_id));
        }
    }
    if formatted.summary.failed_formats > 0 {
        notes.push(format!(
            "fallback_formats={}",
            formatted.summary.failed_formats
        ));
    }

    let scores: Vec<f64> = formatted
        .blocks
        .values()
        .flat_map(|block| block.confidence.scores.iter().copied())
        .collect();
    let gap_ratio = if total_cells == 0 {
        0.0
    } else {
        gap_cells as f64 / total_cells as f64
    };

    Ok(DocumentReport {
        id: id.to_string(),
        draft_count: reconciliation.alignment.drafts.len(),
        block_count: formatted.blocks.len(),
        total_columns,
        quality: assess_quality(formatted.blocks.values().map(|block| &block.confidence)),
        average_confidence: checked_f32(mean(&scores), "average_confidence")?,
        gap_ratio: checked_f32(gap_ratio, "gap_ratio")?,
        levels,
        differences,
        summary: formatted.summary.clone(),
        consensus_text: formatted.consensus_text(),
        notes,
    })
}

/// Placeholder entry for a document whose reconciliation failed outright.
pub fn failed_document_report(id: &str, draft_count: usize, error: &AlignmentError) -> DocumentReport {
    DocumentReport {
        id: id.to_string(),
        draft_count,
        block_count: 0,
        total_columns: 0,
        quality: QualityAssessment::NoData,
        average_confidence: 0.0,
        gap_ratio: 0.0,
        levels: LevelCounts::default(),
        differences: DifferenceCounts::default(),
        summary: FormatSummary::default(),
        consensus_text: Vec::new(),
        notes: vec![format!("error: {error}")],
    }
}

pub fn aggregate_reports(documents: &[DocumentReport]) -> AggregateReport {
    let failed: Vec<&DocumentReport> = documents
        .iter()
        .filter(|document| is_failed(document))
        .collect();
    let scored: Vec<&DocumentReport> = documents
        .iter()
        .filter(|document| !is_failed(document) && document.total_columns > 0)
        .collect();

    let mut quality = QualityCounts::default();
    for document in documents {
        match document.quality {
            QualityAssessment::Excellent => quality.excellent += 1,
            QualityAssessment::VeryGood => quality.very_good += 1,
            QualityAssessment::Good => quality.good += 1,
            QualityAssessment::Fair => quality.fair += 1,
            QualityAssessment::Poor => quality.poor += 1,
            QualityAssessment::NoData => quality.no_data += 1,
        }
    }

    let confidence: Vec<f64> = scored
        .iter()
        .map(|document| f64::from(document.average_confidence))
        .collect();
    let gap_ratio: Vec<f64> = scored
        .iter()
        .map(|document| f64::from(document.gap_ratio))
        .collect();

    let mut lowest: Vec<OutlierEntry> = scored
        .iter()
        .map(|document| OutlierEntry {
            id: document.id.clone(),
            value: document.average_confidence,
        })
        .collect();
    lowest.sort_by(|a, b| {
        a.value
            .partial_cmp(&b.value)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    lowest.truncate(OUTLIER_TOP_N);

    AggregateReport {
        counts: AggregateCounts {
            documents: to_u32(documents.len()),
            failed_documents: to_u32(failed.len()),
            blocks: to_u32(documents.iter().map(|d| d.block_count).sum()),
            consensus_generated: to_u32(
                documents.iter().map(|d| d.summary.consensus_generated).sum(),
            ),
            consensus_skipped: to_u32(
                documents.iter().map(|d| d.summary.consensus_skipped.len()).sum(),
            ),
            failed_formats: to_u32(documents.iter().map(|d| d.summary.failed_formats).sum()),
        },
        average_confidence: distribution_or_none(&confidence),
        gap_ratio: distribution_or_none(&gap_ratio),
        quality,
        lowest_confidence: lowest,
    }
}

fn is_failed(document: &DocumentReport) -> bool {
    document.notes.iter().any(|note| note.starts_with("error:"))
}

fn distribution_or_none(values: &[f64]) -> Option<MetricDistribution> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    Some(MetricDistribution {
        mean: checked_f32(mean(&sorted), "aggregate.mean").ok()?,
        min: checked_f32(sorted[0], "aggregate.min").ok()?,
        p50: checked_f32(percentile_sorted(&sorted, 0.5), "aggregate.p50").ok()?,
        p90: checked_f32(percentile_sorted(&sorted, 0.9), "aggregate.p90").ok()?,
        max: checked_f32(sorted[sorted.len() - 1], "aggregate.max").ok()?,
    })
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn percentile_sorted(sorted_values: &[f64], percentile: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }
    if sorted_values.len() == 1 {
        return sorted_values[0];
    }

    let clamped = percentile.clamp(0.0, 1.0);
    let max_index = (sorted_values.len() - 1) as f64;
    let rank = clamped * max_index;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted_values[lower]
    } else {
        let weight = rank - lower as f64;
        sorted_values[lower] * (1.0 - weight) + sorted_values[upper] * weight
    }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn checked_f32(value: f64, metric_name: &str) -> Result<f32, AlignmentError> {
    if !value.is_finite() {
        return Err(AlignmentError::invalid_input(format!(
            "metric '{metric_name}' produced non-finite value: {value}"
        )));
    }
    Ok(value as f32)
}
