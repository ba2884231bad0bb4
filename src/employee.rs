use std::fmt;

use log::info;
use serde::{Deserialize, Serialize};
use sqlx::{query_builder::Separated, Any};

use crate::{
    core::item::{ItemProcessor, ItemProcessorResult},
    error::BatchError,
    item::flat_file::{FieldSet, FieldSetMapper},
    item::rdbc::RdbcItemBinder,
};

/// An employee record: a name and a department.
///
/// Plain data with value equality. The processor replaces records instead
/// of mutating them, so the source record stays available for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub name: String,
    pub department: String,
}

impl Employee {
    pub fn new(name: impl Into<String>, department: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            department: department.into(),
        }
    }
}

impl fmt::Display for Employee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "name: {} department: {}", self.name, self.department)
    }
}

/// Maps one parsed line to an `Employee`.
///
/// Both fields are required; an absent field fails with a validation error
/// and is never replaced by an empty string. Empty tokens are valid values.
#[derive(Default)]
pub struct EmployeeFieldSetMapper;

impl FieldSetMapper<Employee> for EmployeeFieldSetMapper {
    fn map_field_set(&self, fields: &FieldSet) -> Result<Employee, BatchError> {
        Ok(Employee {
            name: fields.required("name")?.to_string(),
            department: fields.required("department")?.to_string(),
        })
    }
}

/// Uppercases the employee name, preserving the department.
///
/// Pure: builds a new record and leaves the input untouched. Logs one line
/// pairing the input and output representations; the log facade is the
/// observability sink, not part of the transform contract.
#[derive(Default)]
pub struct UpperCaseProcessor;

impl ItemProcessor<Employee, Employee> for UpperCaseProcessor {
    fn process(&self, item: &Employee) -> ItemProcessorResult<Employee> {
        let transformed = Employee {
            name: item.name.to_uppercase(),
            department: item.department.clone(),
        };

        info!("Converting ({}) into ({})", item, transformed);

        Ok(transformed)
    }
}

/// Binds the employee data columns, in `(name, department)` order.
pub struct EmployeeItemBinder;

impl RdbcItemBinder<Employee> for EmployeeItemBinder {
    fn bind(&self, item: &Employee, mut query_builder: Separated<Any, &str>) {
        query_builder.push_bind(item.name.clone());
        query_builder.push_bind(item.department.clone());
    }
}
