use crate::error::BatchError;

/// Result of a read attempt: `Ok(Some(item))` when an item was produced,
/// `Ok(None)` when the input is exhausted.
pub type ItemReaderResult<R> = Result<Option<R>, BatchError>;

/// Result of processing a single item.
pub type ItemProcessorResult<W> = Result<W, BatchError>;

/// Result of a writer operation.
pub type ItemWriterResult = Result<(), BatchError>;

/// Produces a lazy, finite, forward-only sequence of items.
///
/// A reader is not restartable once exhausted; reopen the source to read
/// again.
pub trait ItemReader<R> {
    fn read(&self) -> ItemReaderResult<R>;
}

/// Transforms one item into another. Must not mutate its input.
pub trait ItemProcessor<R, W> {
    fn process(&self, item: &R) -> ItemProcessorResult<W>;
}

/// Accepts one chunk of items at a time.
///
/// The step drives the chunk lifecycle through this trait: `open` once
/// before the first chunk, `write` then `flush` for each chunk, `close`
/// once after the last chunk or on abort. Transactional writers begin
/// their transaction in `write`, commit it in `flush` and roll back any
/// leftover transaction in `close`.
pub trait ItemWriter<W> {
    fn write(&self, items: &[W]) -> ItemWriterResult;
    fn flush(&self) -> ItemWriterResult {
        Ok(())
    }
    fn open(&self) -> ItemWriterResult {
        Ok(())
    }
    fn close(&self) -> ItemWriterResult {
        Ok(())
    }
}

/// Pass-through processor used when a step declares no processor.
#[derive(Default)]
pub struct DefaultProcessor;

impl<R: Clone> ItemProcessor<R, R> for DefaultProcessor {
    fn process(&self, item: &R) -> ItemProcessorResult<R> {
        Ok(item.clone())
    }
}
