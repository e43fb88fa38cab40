use thiserror::Error;

/// Errors raised by the record store and the repositories built on it.
///
/// There is deliberately no `NotFound`: queries on empty partitions return an
/// empty list and deletes of missing keys succeed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Failed to marshal item for table '{table}': {message}")]
    Marshal { table: String, message: String },

    #[error("Failed to unmarshal items from table '{table}': {message}")]
    Unmarshal { table: String, message: String },

    #[error("{operation} on table '{table}'{} failed: {message}", key_suffix(.key))]
    StoreUnavailable {
        operation: &'static str,
        table: String,
        key: Option<String>,
        message: String,
    },

    #[error(
        "Batch write to table '{table}' failed at chunk {committed_chunks} \
         after {committed_chunks} chunk(s) / {committed_items} item(s) committed: {message}"
    )]
    PartialBatchFailure {
        table: String,
        /// Chunks are written in order, so this is also the failing chunk's index.
        committed_chunks: usize,
        committed_items: usize,
        message: String,
    },
}

fn key_suffix(key: &Option<String>) -> String {
    key.as_ref()
        .map(|k| format!(" for key '{k}'"))
        .unwrap_or_default()
}

impl Error {
    /// Whether the caller sent something unusable, as opposed to a backend failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
