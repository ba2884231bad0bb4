use std::cell::RefCell;
use std::future::Future;

use log::{debug, error};
use serde::Serialize;
use sqlx::{Any, Pool, QueryBuilder, Transaction};

use crate::core::item::{ItemWriter, ItemWriterResult};
use crate::item::rdbc::RdbcItemBinder;
use crate::BatchError;

/// Bridges the step's synchronous writer protocol into sqlx's async API.
/// Requires a multi-threaded tokio runtime.
fn block_on<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

/// A writer for inserting records into a relational sink through the sqlx
/// `Any` driver.
///
/// Each chunk is written as one transaction: `write` begins the
/// transaction and issues one parameterized INSERT per record, `flush`
/// commits it, `close` rolls back anything left open on an abnormal exit
/// path. A rejected insert rolls the whole chunk back immediately, so a
/// chunk is either fully committed or not visible at all.
///
/// Primary-key generation is externalized: when an id column is
/// configured, its value is produced by a sink-side SQL expression from
/// configuration (for example `nextval('employee_id_seq')` on PostgreSQL
/// or `NULL` on SQLite to let rowid assignment apply). The expression is
/// operator configuration, not record data; record values are always
/// bound, never spliced into the statement.
pub struct RdbcItemWriter<'a, O> {
    pool: &'a Pool<Any>,
    table: &'a str,
    id: Option<(&'a str, &'a str)>,
    columns: Vec<&'a str>,
    item_binder: &'a dyn RdbcItemBinder<O>,
    transaction: RefCell<Option<Transaction<'static, Any>>>,
}

impl<O: Serialize> RdbcItemWriter<'_, O> {
    fn insert_one(&self, item: &O, tx: &mut Transaction<'static, Any>) -> ItemWriterResult {
        let mut query_builder = QueryBuilder::new("INSERT INTO ");
        query_builder.push(self.table);
        query_builder.push(" (");
        if let Some((id_column, _)) = self.id {
            query_builder.push(id_column);
            query_builder.push(", ");
        }
        query_builder.push(self.columns.join(", "));
        query_builder.push(") VALUES (");
        if let Some((_, id_expression)) = self.id {
            query_builder.push(id_expression);
            query_builder.push(", ");
        }
        self.item_binder.bind(item, query_builder.separated(", "));
        query_builder.push(")");

        let query = query_builder.build();

        match block_on(query.execute(&mut **tx)) {
            Ok(_) => Ok(()),
            Err(e) => {
                let record = serde_json::to_string(item)
                    .unwrap_or_else(|_| "<unserializable record>".to_string());
                error!(
                    "Failed to write record to table {}: {}",
                    self.table, e
                );
                Err(BatchError::Write {
                    record,
                    detail: e.to_string(),
                })
            }
        }
    }
}

impl<O: Serialize> ItemWriter<O> for RdbcItemWriter<'_, O> {
    /// Writes one chunk inside a fresh transaction.
    ///
    /// The first rejected insert rolls the transaction back and propagates
    /// the error; records inserted earlier in the chunk are discarded with
    /// it. On success the transaction stays open until `flush` commits.
    fn write(&self, items: &[O]) -> ItemWriterResult {
        if items.is_empty() {
            return Ok(());
        }

        let mut tx = match self.transaction.borrow_mut().take() {
            Some(tx) => tx,
            None => block_on(self.pool.begin())
                .map_err(|e| BatchError::ItemWriter(format!("failed to begin transaction: {e}")))?,
        };

        for item in items {
            if let Err(rejected) = self.insert_one(item, &mut tx) {
                if let Err(e) = block_on(tx.rollback()) {
                    error!("Rollback failed after rejected insert: {e}");
                }
                return Err(rejected);
            }
        }

        *self.transaction.borrow_mut() = Some(tx);
        Ok(())
    }

    /// Commits the chunk transaction. One commit per chunk.
    fn flush(&self) -> ItemWriterResult {
        if let Some(tx) = self.transaction.borrow_mut().take() {
            block_on(tx.commit())
                .map_err(|e| BatchError::ItemWriter(format!("failed to commit chunk: {e}")))?;
            debug!("Committed chunk to table {}", self.table);
        }
        Ok(())
    }

    /// Rolls back any transaction still open. Called by the step on every
    /// exit path, so an aborted run never leaves a transaction behind.
    fn close(&self) -> ItemWriterResult {
        if let Some(tx) = self.transaction.borrow_mut().take() {
            block_on(tx.rollback())
                .map_err(|e| BatchError::ItemWriter(format!("failed to roll back chunk: {e}")))?;
            debug!("Rolled back uncommitted chunk for table {}", self.table);
        }
        Ok(())
    }
}

/// Builder for `RdbcItemWriter`.
pub struct RdbcItemWriterBuilder<'a, T> {
    pool: Option<&'a Pool<Any>>,
    table: Option<&'a str>,
    id_column: Option<&'a str>,
    id_expression: Option<&'a str>,
    columns: Vec<&'a str>,
    item_binder: Option<&'a dyn RdbcItemBinder<T>>,
}

impl<'a, T> Default for RdbcItemWriterBuilder<'a, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> RdbcItemWriterBuilder<'a, T> {
    pub fn new() -> Self {
        Self {
            pool: None,
            table: None,
            id_column: None,
            id_expression: None,
            columns: Vec::new(),
            item_binder: None,
        }
    }

    pub fn pool(mut self, pool: &'a Pool<Any>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn table(mut self, table: &'a str) -> Self {
        self.table = Some(table);
        self
    }

    /// Sets the column populated by the sink-side id expression.
    pub fn id_column(mut self, id_column: &'a str) -> Self {
        self.id_column = Some(id_column);
        self
    }

    /// Sets the dialect-specific SQL expression producing the id value.
    pub fn id_expression(mut self, id_expression: &'a str) -> Self {
        self.id_expression = Some(id_expression);
        self
    }

    /// Adds a data column. Columns are bound in the order they are added.
    pub fn add_column(mut self, column: &'a str) -> Self {
        self.columns.push(column);
        self
    }

    pub fn item_binder(mut self, item_binder: &'a dyn RdbcItemBinder<T>) -> Self {
        self.item_binder = Some(item_binder);
        self
    }

    pub fn build(self) -> RdbcItemWriter<'a, T> {
        if self.columns.is_empty() {
            panic!("One or more columns are required");
        }

        let id = match (self.id_column, self.id_expression) {
            (Some(column), Some(expression)) => Some((column, expression)),
            (None, None) => None,
            _ => panic!("Id column and id expression must be configured together"),
        };

        RdbcItemWriter {
            pool: self.pool.expect("Pool is mandatory"),
            table: self.table.expect("Table name is mandatory"),
            id,
            columns: self.columns,
            item_binder: self.item_binder.expect("Item binder is mandatory"),
            transaction: RefCell::new(None),
        }
    }
}
