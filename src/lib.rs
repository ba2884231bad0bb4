/*!
 # Employee ETL

 A chunk-oriented batch pipeline importing employee records from a
 delimited flat file into a relational database: read one line at a time,
 uppercase the employee name, and insert the result — committing once per
 chunk of `chunk_size` records.

 ## Core concepts

 - **Job:** the whole batch process; a container for one or more steps.
 - **Step:** one read/process/write phase, executed in chunks with one
   commit per chunk. The first error aborts the run: chunks committed
   before it stay committed, the chunk in progress is rolled back in full.
 - **ItemReader:** retrieval of input, one item at a time.
 - **ItemProcessor:** the transform applied to each item as it is read.
 - **ItemWriter:** output of one chunk of items at a time.

 ## Example

 ```rust
 use employee_etl::core::job::{Job, JobBuilder};
 use employee_etl::core::step::{Step, StepBuilder, StepStatus};
 use employee_etl::employee::{EmployeeFieldSetMapper, UpperCaseProcessor};
 use employee_etl::item::flat_file::FlatFileItemReaderBuilder;
 use employee_etl::item::logger::LoggerWriter;

 let csv = "john,sales\njane,engineering\nbob,marketing";

 let mapper = EmployeeFieldSetMapper::default();
 let reader = FlatFileItemReaderBuilder::new()
     .delimiter(b',')
     .names(&["name", "department"])
     .field_set_mapper(&mapper)
     .from_reader(csv.as_bytes());

 let processor = UpperCaseProcessor::default();
 let writer = LoggerWriter;

 let step = StepBuilder::new()
     .name("import-employees".to_string())
     .reader(&reader)
     .processor(&processor)
     .writer(&writer)
     .chunk(2) // commit interval
     .build();

 let job = JobBuilder::new().start(&step).build();
 let result = job.run();

 assert!(result.is_ok());
 assert_eq!(step.get_status(), StepStatus::Completed);
 assert_eq!(step.get_read_count(), 3);
 assert_eq!(step.get_commit_count(), 2);
 ```

 Against a real sink, replace the [`item::logger::LoggerWriter`] with an
 [`item::rdbc::RdbcItemWriter`]: each chunk then becomes one database
 transaction, with the id column populated by a configurable sink-side
 expression such as `nextval('employee_id_seq')`.
*/

/// Core module for batch operations
pub mod core;

/// Error types for batch operations
pub mod error;

#[doc(inline)]
pub use error::*;

/// Set of item readers / writers (flat file reader, RDBC writer, logger)
pub mod item;

/// The employee domain: record, field-set mapper, processor, binder
pub mod employee;

/// TOML configuration of an import run
pub mod config;
