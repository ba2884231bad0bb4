use csv::StringRecord;

use crate::error::BatchError;

/// A module providing facilities for reading delimited flat files.
pub mod flat_file_reader;

pub use flat_file_reader::{FlatFileItemReader, FlatFileItemReaderBuilder};

/// One parsed line's tokens paired with the configured field names.
///
/// The reader guarantees that the token count matches the configured name
/// count before a `FieldSet` is built, so lookups by configured name always
/// resolve. `required` exists for mappers that need a field the
/// configuration may not have declared at all.
pub struct FieldSet<'a> {
    names: &'a [String],
    record: &'a StringRecord,
}

impl<'a> FieldSet<'a> {
    pub fn new(names: &'a [String], record: &'a StringRecord) -> Self {
        Self { names, record }
    }

    /// Returns the token for a configured field name, if the name is
    /// configured.
    pub fn get(&self, name: &str) -> Option<&str> {
        let index = self.names.iter().position(|n| n == name)?;
        self.record.get(index)
    }

    /// Returns the token for a configured field name or fails with a
    /// validation error. Never substitutes an empty string for an absent
    /// field.
    pub fn required(&self, name: &str) -> Result<&str, BatchError> {
        self.get(name)
            .ok_or_else(|| BatchError::Validation(format!("missing required field '{name}'")))
    }
}

/// Maps one field set to a typed record.
///
/// Plays the role a row mapper plays for database readers: the seam where
/// raw tokens become domain records.
pub trait FieldSetMapper<T> {
    fn map_field_set(&self, fields: &FieldSet) -> Result<T, BatchError>;
}

#[cfg(test)]
mod tests {
    use csv::StringRecord;

    use crate::BatchError;

    use super::FieldSet;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn get_resolves_tokens_by_configured_name() {
        let names = names(&["name", "department"]);
        let record = StringRecord::from(vec!["john", "sales"]);
        let fields = FieldSet::new(&names, &record);

        assert_eq!(fields.get("name"), Some("john"));
        assert_eq!(fields.get("department"), Some("sales"));
        assert_eq!(fields.get("salary"), None);
    }

    #[test]
    fn required_fails_for_unconfigured_names() {
        let names = names(&["first", "department"]);
        let record = StringRecord::from(vec!["john", "sales"]);
        let fields = FieldSet::new(&names, &record);

        let result = fields.required("name");

        assert!(matches!(result, Err(BatchError::Validation(_))));
    }

    #[test]
    fn empty_tokens_are_valid_values() {
        let names = names(&["name", "department"]);
        let record = StringRecord::from(vec!["", "sales"]);
        let fields = FieldSet::new(&names, &record);

        assert_eq!(fields.required("name").unwrap(), "");
    }
}
