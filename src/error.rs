use thiserror::Error;

/// Failure modes of a reconcile invocation.
///
/// Every variant is raised while validating inputs, before any output row is
/// produced. Duplicate keys and dropped mapping pairs are not errors; they are
/// reported through [`crate::merge::MergeReport`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// Key selection or mapping cannot be applied to the supplied datasets.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A mapping interchange payload is not valid JSON or has the wrong shape.
    #[error("mapping format error: {0}")]
    Format(String),

    /// One of the datasets has no rows.
    #[error(
        "empty input: primary has {primary_rows} row(s), secondary has {secondary_rows} row(s)"
    )]
    EmptyInput {
        primary_rows: usize,
        secondary_rows: usize,
    },
}

impl ReconcileError {
    pub fn configuration(message: impl Into<String>) -> Self {
        ReconcileError::Configuration(message.into())
    }

    pub fn format(message: impl Into<String>) -> Self {
        ReconcileError::Format(message.into())
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
