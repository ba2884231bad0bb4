use csv::{ReaderBuilder, StringRecordsIntoIter, Trim};
use std::{cell::RefCell, io::Read};

use crate::{
    core::item::{ItemReader, ItemReaderResult},
    error::BatchError,
    item::flat_file::{FieldSet, FieldSetMapper},
};

/// A flat-file item reader.
///
/// Splits each non-empty line of a delimited source on the configured
/// delimiter, checks the token count against the ordered list of configured
/// field names and hands the resulting [`FieldSet`] to a
/// [`FieldSetMapper`] to build a typed record. The sequence is lazy,
/// finite and forward-only; once exhausted the source must be reopened to
/// read again.
///
/// # Examples
///
/// ```
/// use employee_etl::core::item::ItemReader;
/// use employee_etl::error::BatchError;
/// use employee_etl::item::flat_file::{FieldSet, FieldSetMapper, FlatFileItemReaderBuilder};
///
/// struct PairMapper;
///
/// impl FieldSetMapper<(String, String)> for PairMapper {
///     fn map_field_set(&self, fields: &FieldSet) -> Result<(String, String), BatchError> {
///         Ok((
///             fields.required("name")?.to_string(),
///             fields.required("department")?.to_string(),
///         ))
///     }
/// }
///
/// let data = "john,sales\njane,engineering";
///
/// let mapper = PairMapper;
/// let reader = FlatFileItemReaderBuilder::new()
///     .names(&["name", "department"])
///     .field_set_mapper(&mapper)
///     .from_reader(data.as_bytes());
///
/// let first = reader.read().unwrap().unwrap();
/// assert_eq!(first, ("john".to_string(), "sales".to_string()));
///
/// let second = reader.read().unwrap().unwrap();
/// assert_eq!(second, ("jane".to_string(), "engineering".to_string()));
///
/// assert!(reader.read().unwrap().is_none());
/// ```
pub struct FlatFileItemReader<'a, R, T> {
    /// Iterator over the parsed lines.
    ///
    /// `RefCell` provides the interior mutability needed to advance the
    /// iterator behind the `ItemReader` trait's `&self` signature.
    records: RefCell<StringRecordsIntoIter<R>>,
    field_names: Vec<String>,
    delimiter: u8,
    mapper: &'a dyn FieldSetMapper<T>,
}

impl<R: Read, T> ItemReader<T> for FlatFileItemReader<'_, R, T> {
    /// Reads and maps the next line of the source.
    ///
    /// # Returns
    /// - `Ok(Some(record))` for a well-formed line
    /// - `Ok(None)` when the input is exhausted
    /// - `Err(BatchError::MalformedRecord)` when the line's token count
    ///   does not match the configured field names; carries the 1-based
    ///   line number and the raw content
    /// - `Err(BatchError::Validation)` from the mapper
    /// - `Err(BatchError::ItemReader)` for I/O or parse-level failures
    fn read(&self) -> ItemReaderResult<T> {
        match self.records.borrow_mut().next() {
            Some(Ok(record)) => {
                if record.len() != self.field_names.len() {
                    let line = record.position().map_or(0, |position| position.line());
                    let separator = (self.delimiter as char).to_string();
                    let content = record.iter().collect::<Vec<_>>().join(&separator);
                    return Err(BatchError::MalformedRecord {
                        line,
                        expected: self.field_names.len(),
                        found: record.len(),
                        content,
                    });
                }

                let fields = FieldSet::new(&self.field_names, &record);
                let item = self.mapper.map_field_set(&fields)?;
                Ok(Some(item))
            }
            Some(Err(error)) => Err(BatchError::ItemReader(error.to_string())),
            None => Ok(None),
        }
    }
}

/// A builder for configuring flat-file reading.
///
/// Defaults: comma delimiter, no header row, all fields trimmed.
pub struct FlatFileItemReaderBuilder<'a, T> {
    delimiter: u8,
    has_headers: bool,
    field_names: Vec<String>,
    mapper: Option<&'a dyn FieldSetMapper<T>>,
}

impl<'a, T> Default for FlatFileItemReaderBuilder<'a, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> FlatFileItemReaderBuilder<'a, T> {
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            has_headers: false,
            field_names: Vec::new(),
            mapper: None,
        }
    }

    /// Sets the field delimiter (default: comma).
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets whether the first line is a header row and must be skipped.
    /// Off by default; the employee input carries no header.
    pub fn has_headers(mut self, yes: bool) -> Self {
        self.has_headers = yes;
        self
    }

    /// Sets the ordered field names the tokens of every line are matched
    /// against.
    pub fn names(mut self, names: &[impl AsRef<str>]) -> Self {
        self.field_names = names.iter().map(|n| n.as_ref().to_string()).collect();
        self
    }

    /// Sets the mapper turning each field set into a typed record.
    pub fn field_set_mapper(mut self, mapper: &'a dyn FieldSetMapper<T>) -> Self {
        self.mapper = Some(mapper);
        self
    }

    /// Creates a `FlatFileItemReader` from any `Read` source.
    pub fn from_reader<R: Read>(self, rdr: R) -> FlatFileItemReader<'a, R, T> {
        // Flexible parsing: the token count is checked against the
        // configured field names, not against the first line of the file.
        let rdr = ReaderBuilder::new()
            .trim(Trim::All)
            .delimiter(self.delimiter)
            .has_headers(self.has_headers)
            .flexible(true)
            .from_reader(rdr);

        FlatFileItemReader {
            records: RefCell::new(rdr.into_records()),
            field_names: self.field_names,
            delimiter: self.delimiter,
            mapper: self.mapper.expect("Field set mapper is mandatory"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::core::item::ItemReader;
    use crate::item::flat_file::{FieldSet, FieldSetMapper};
    use crate::BatchError;

    use super::FlatFileItemReaderBuilder;

    struct PairMapper;

    impl FieldSetMapper<(String, String)> for PairMapper {
        fn map_field_set(&self, fields: &FieldSet) -> Result<(String, String), BatchError> {
            Ok((
                fields.required("name")?.to_string(),
                fields.required("department")?.to_string(),
            ))
        }
    }

    fn collect(
        reader: &impl ItemReader<(String, String)>,
    ) -> Result<Vec<(String, String)>, BatchError> {
        let mut items = Vec::new();
        while let Some(item) = reader.read()? {
            items.push(item);
        }
        Ok(items)
    }

    #[test]
    fn reads_records_in_input_order() {
        let data = "john,sales\njane,engineering\nbob,marketing";

        let mapper = PairMapper;
        let reader = FlatFileItemReaderBuilder::new()
            .names(&["name", "department"])
            .field_set_mapper(&mapper)
            .from_reader(data.as_bytes());

        let items = collect(&reader).unwrap();

        assert_eq!(
            items,
            vec![
                ("john".to_string(), "sales".to_string()),
                ("jane".to_string(), "engineering".to_string()),
                ("bob".to_string(), "marketing".to_string()),
            ]
        );
    }

    #[test]
    fn field_count_mismatch_reports_line_and_content() {
        let data = "john,sales\nOnlyOneField\nbob,marketing";

        let mapper = PairMapper;
        let reader = FlatFileItemReaderBuilder::new()
            .names(&["name", "department"])
            .field_set_mapper(&mapper)
            .from_reader(data.as_bytes());

        assert!(reader.read().unwrap().is_some());

        let error = reader.read().unwrap_err();
        match error {
            BatchError::MalformedRecord {
                line,
                expected,
                found,
                content,
            } => {
                assert_eq!(line, 2);
                assert_eq!(expected, 2);
                assert_eq!(found, 1);
                assert_eq!(content, "OnlyOneField");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn too_many_fields_is_malformed_too() {
        let data = "john,sales,extra";

        let mapper = PairMapper;
        let reader = FlatFileItemReaderBuilder::new()
            .names(&["name", "department"])
            .field_set_mapper(&mapper)
            .from_reader(data.as_bytes());

        let error = reader.read().unwrap_err();
        assert!(matches!(
            error,
            BatchError::MalformedRecord {
                line: 1,
                expected: 2,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn header_row_is_skipped_when_configured() {
        let data = "name,department\njohn,sales";

        let mapper = PairMapper;
        let reader = FlatFileItemReaderBuilder::new()
            .has_headers(true)
            .names(&["name", "department"])
            .field_set_mapper(&mapper)
            .from_reader(data.as_bytes());

        let items = collect(&reader).unwrap();

        assert_eq!(items, vec![("john".to_string(), "sales".to_string())]);
    }

    #[test]
    fn custom_delimiter_is_honored() {
        let data = "john;sales";

        let mapper = PairMapper;
        let reader = FlatFileItemReaderBuilder::new()
            .delimiter(b';')
            .names(&["name", "department"])
            .field_set_mapper(&mapper)
            .from_reader(data.as_bytes());

        let items = collect(&reader).unwrap();

        assert_eq!(items, vec![("john".to_string(), "sales".to_string())]);
    }

    #[test]
    fn unconfigured_required_field_fails_validation() {
        let data = "john,sales";

        let mapper = PairMapper;
        let reader = FlatFileItemReaderBuilder::new()
            .names(&["first", "department"])
            .field_set_mapper(&mapper)
            .from_reader(data.as_bytes());

        let error = reader.read().unwrap_err();
        assert!(matches!(error, BatchError::Validation(_)));
    }

    #[test]
    fn exhausted_reader_keeps_returning_none() {
        let mapper = PairMapper;
        let reader = FlatFileItemReaderBuilder::new()
            .names(&["name", "department"])
            .field_set_mapper(&mapper)
            .from_reader("".as_bytes());

        assert!(reader.read().unwrap().is_none());
        assert!(reader.read().unwrap().is_none());
    }
}
