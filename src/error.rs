use thiserror::Error;

/// Batch error
///
/// Every failure surfaced by the pipeline is one of these variants. The run
/// aborts on the first error; the last committed chunk stays committed and
/// the in-progress chunk is rolled back in full.
#[derive(Error, Debug)]
pub enum BatchError {
    /// A line of the input did not split into the configured number of fields.
    #[error("malformed record at line {line}: expected {expected} fields, found {found} in '{content}'")]
    MalformedRecord {
        line: u64,
        expected: usize,
        found: usize,
        content: String,
    },

    #[error("ItemReader from: {0}")]
    ItemReader(String),

    /// A required field was absent when mapping a field set to a record.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The sink rejected an insert. Carries the offending record and the
    /// sink error detail.
    #[error("insert rejected for record {record}: {detail}")]
    Write { record: String, detail: String },

    #[error("ItemWriter from: {0}")]
    ItemWriter(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),
}
