/// Flat-file item reader: delimited lines mapped to typed records.
pub mod flat_file;

/// Logger item writer, useful for debugging pipelines without a sink.
pub mod logger;

/// RDBC item writer for relational sinks through the sqlx `Any` driver.
pub mod rdbc;
