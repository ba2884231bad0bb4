use std::{
    cell::Cell,
    time::{Duration, Instant},
};

use log::{debug, error};

use crate::BatchError;

use super::{
    build_name,
    item::{DefaultProcessor, ItemProcessor, ItemReader, ItemWriter},
};

/// Status of a step execution.
///
/// A step starts in `Idle`, moves to `Running` when executed and ends in
/// either `Completed` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Idle,
    Running,
    Completed,
    Failed,
}

/// Timings and counters of a finished step execution.
#[derive(Debug)]
pub struct StepExecution {
    pub start: Instant,
    pub end: Instant,
    pub duration: Duration,
    pub status: StepStatus,
    /// Number of items read from the source
    pub read_count: usize,
    /// Number of items written to the sink
    pub write_count: usize,
    /// Number of chunks committed
    pub commit_count: usize,
}

/// A single phase of a batch job: read, process, write.
pub trait Step {
    fn execute(&self) -> Result<StepExecution, BatchError>;
    fn get_name(&self) -> &str;
    fn get_status(&self) -> StepStatus;
}

/// Chunk-oriented step implementation.
///
/// Drives the reader → processor → writer pipeline in chunks of at most
/// `chunk_size` items, with one writer flush (commit) per chunk. Execution
/// is fail-fast: the first reader, processor or writer error aborts the
/// run. Chunks flushed before the failure stay written; the failing chunk
/// is never partially written (the writer rolls it back on `close`).
pub struct StepInstance<'a, R, W> {
    name: String,
    reader: &'a dyn ItemReader<R>,
    processor: &'a dyn ItemProcessor<R, W>,
    writer: &'a dyn ItemWriter<W>,
    chunk_size: usize,
    status: Cell<StepStatus>,
    read_count: Cell<usize>,
    write_count: Cell<usize>,
    commit_count: Cell<usize>,
}

impl<R, W> Step for StepInstance<'_, R, W> {
    fn execute(&self) -> Result<StepExecution, BatchError> {
        let start = Instant::now();

        self.status.set(StepStatus::Running);
        debug!("Start of step: {}", self.name);

        let outcome = self.run_chunks();

        match &outcome {
            Ok(()) => {
                self.status.set(StepStatus::Completed);
                debug!(
                    "End of step: {}, {} items in {} chunks",
                    self.name,
                    self.write_count.get(),
                    self.commit_count.get()
                );
            }
            Err(err) => {
                self.status.set(StepStatus::Failed);
                error!(
                    "Step {} failed after {} committed chunks: {}",
                    self.name,
                    self.commit_count.get(),
                    err
                );
            }
        }

        outcome?;

        Ok(StepExecution {
            start,
            end: Instant::now(),
            duration: start.elapsed(),
            status: self.status.get(),
            read_count: self.read_count.get(),
            write_count: self.write_count.get(),
            commit_count: self.commit_count.get(),
        })
    }

    fn get_name(&self) -> &str {
        &self.name
    }

    fn get_status(&self) -> StepStatus {
        self.status.get()
    }
}

impl<R, W> StepInstance<'_, R, W> {
    pub fn get_read_count(&self) -> usize {
        self.read_count.get()
    }

    pub fn get_write_count(&self) -> usize {
        self.write_count.get()
    }

    pub fn get_commit_count(&self) -> usize {
        self.commit_count.get()
    }

    fn run_chunks(&self) -> Result<(), BatchError> {
        if self.chunk_size == 0 {
            return Err(BatchError::Configuration(
                "chunk size must be at least 1".to_string(),
            ));
        }

        self.writer.open()?;

        let outcome = self.drive();

        // The writer is closed on every exit path so an aborted chunk's
        // transaction is rolled back and resources are released. A close
        // failure only surfaces when the run itself succeeded.
        let closed = self.writer.close();
        outcome?;
        closed
    }

    fn drive(&self) -> Result<(), BatchError> {
        loop {
            let items = self.read_chunk()?;

            if !items.is_empty() {
                self.write_chunk(&items)?;
            }

            // A short chunk means the input is exhausted.
            if items.len() < self.chunk_size {
                return Ok(());
            }
        }
    }

    /// Pulls up to `chunk_size` items, processing each one as it is pulled.
    ///
    /// At most `chunk_size` items are in flight at any time. A reader or
    /// processor error aborts the run before anything of the current chunk
    /// is written.
    fn read_chunk(&self) -> Result<Vec<W>, BatchError> {
        debug!("Start reading chunk");
        let mut items = Vec::with_capacity(self.chunk_size);

        while items.len() < self.chunk_size {
            match self.reader.read()? {
                Some(item) => {
                    self.read_count.set(self.read_count.get() + 1);
                    items.push(self.processor.process(&item)?);
                }
                None => break,
            }
        }

        debug!("End reading chunk: {} items", items.len());
        Ok(items)
    }

    /// Writes one chunk and flushes it, committing the chunk as a unit.
    fn write_chunk(&self, items: &[W]) -> Result<(), BatchError> {
        debug!("Start writing chunk");

        self.writer.write(items)?;
        self.writer.flush()?;

        self.write_count.set(self.write_count.get() + items.len());
        self.commit_count.set(self.commit_count.get() + 1);

        debug!("End writing chunk");
        Ok(())
    }
}

/// Builder for `StepInstance`.
#[derive(Default)]
pub struct StepBuilder<'a, R, W> {
    name: Option<String>,
    reader: Option<&'a dyn ItemReader<R>>,
    processor: Option<&'a dyn ItemProcessor<R, W>>,
    writer: Option<&'a dyn ItemWriter<W>>,
    chunk_size: usize,
}

impl<'a, R, W> StepBuilder<'a, R, W> {
    pub fn new() -> StepBuilder<'a, R, W> {
        Self {
            name: None,
            reader: None,
            processor: None,
            writer: None,
            chunk_size: 1,
        }
    }

    pub fn name(mut self, name: String) -> StepBuilder<'a, R, W> {
        self.name = Some(name);
        self
    }

    pub fn reader(mut self, reader: &'a impl ItemReader<R>) -> StepBuilder<'a, R, W> {
        self.reader = Some(reader);
        self
    }

    pub fn processor(mut self, processor: &'a impl ItemProcessor<R, W>) -> StepBuilder<'a, R, W> {
        self.processor = Some(processor);
        self
    }

    pub fn writer(mut self, writer: &'a impl ItemWriter<W>) -> StepBuilder<'a, R, W> {
        self.writer = Some(writer);
        self
    }

    /// Sets the commit interval: the number of items per chunk.
    pub fn chunk(mut self, chunk_size: usize) -> StepBuilder<'a, R, W> {
        self.chunk_size = chunk_size;
        self
    }

    pub fn build(self) -> StepInstance<'a, R, W>
    where
        DefaultProcessor: ItemProcessor<R, W>,
    {
        let default_processor = &DefaultProcessor {};
        StepInstance {
            name: self.name.unwrap_or_else(build_name),
            reader: self.reader.expect("Reader is mandatory"),
            processor: self.processor.unwrap_or(default_processor),
            writer: self.writer.expect("Writer is mandatory"),
            chunk_size: self.chunk_size,
            status: Cell::new(StepStatus::Idle),
            read_count: Cell::new(0),
            write_count: Cell::new(0),
            commit_count: Cell::new(0),
        }
    }
}
