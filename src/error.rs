use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlignmentError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parse error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    /// Aligned sequences of one block disagree on length. Downstream column
    /// indexing assumes equal lengths, so this is never truncated away.
    #[error(
        "block {block_id}: aligned sequence for draft '{draft_id}' has {actual} columns, expected {expected}"
    )]
    AlignmentColumnMismatch {
        block_id: u32,
        draft_id: String,
        expected: usize,
        actual: usize,
    },
    #[error(
        "section normalization did not converge: draft '{draft_id}' has {actual} sections, expected {expected}"
    )]
    SectionCountDivergence {
        draft_id: String,
        expected: usize,
        actual: usize,
    },
}

impl AlignmentError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub(crate) fn column_mismatch(
        block_id: u32,
        draft_id: impl Into<String>,
        expected: usize,
        actual: usize,
    ) -> Self {
        Self::AlignmentColumnMismatch {
            block_id,
            draft_id: draft_id.into(),
            expected,
            actual,
        }
    }

    pub(crate) fn section_divergence(
        draft_id: impl Into<String>,
        expected: usize,
        actual: usize,
    ) -> Self {
        Self::SectionCountDivergence {
            draft_id: draft_id.into(),
            expected,
            actual,
        }
    }
}
