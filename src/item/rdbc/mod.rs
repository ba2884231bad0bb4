use sqlx::{query_builder::Separated, Any};

/// This module contains the RDBC writer implementation.
pub mod rdbc_writer;

/// Trait for binding record data to database query parameters.
///
/// Implementations push one bind per configured data column, in column
/// order. Values always travel as bind parameters; the writer never
/// concatenates them into the statement text.
pub trait RdbcItemBinder<T> {
    fn bind(&self, item: &T, query_builder: Separated<Any, &str>);
}

pub use rdbc_writer::{RdbcItemWriter, RdbcItemWriterBuilder};
