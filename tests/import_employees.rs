use std::error::Error;
use std::sync::Once;

use sqlx::{AnyPool, Row};
use tempfile::NamedTempFile;

use employee_etl::{
    core::{
        job::{Job, JobBuilder},
        step::{Step, StepBuilder, StepStatus},
    },
    employee::{EmployeeFieldSetMapper, EmployeeItemBinder, UpperCaseProcessor},
    item::flat_file::FlatFileItemReaderBuilder,
    item::rdbc::RdbcItemWriterBuilder,
};

static DRIVERS: Once = Once::new();

/// Creates a file-backed SQLite database reachable through the `Any`
/// driver, with the employee table of the sink schema.
async fn setup_sink() -> Result<(AnyPool, NamedTempFile), Box<dyn Error>> {
    DRIVERS.call_once(sqlx::any::install_default_drivers);

    let database_file = NamedTempFile::new()?;
    let connection_uri = format!("sqlite://{}", database_file.path().to_str().unwrap());
    let pool = AnyPool::connect(&connection_uri).await?;

    sqlx::query(
        "CREATE TABLE employees (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            department TEXT NOT NULL
        )",
    )
    .execute(&pool)
    .await?;

    Ok((pool, database_file))
}

async fn stored_employees(pool: &AnyPool) -> Result<Vec<(String, String)>, Box<dyn Error>> {
    let rows = sqlx::query("SELECT name, department FROM employees ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .iter()
        .map(|row| (row.get("name"), row.get("department")))
        .collect())
}

#[tokio::test(flavor = "multi_thread")]
async fn imports_three_records_in_two_chunks() -> Result<(), Box<dyn Error>> {
    let (pool, _database_file) = setup_sink().await?;

    let csv = "john,sales\njane,engineering\nbob,marketing";

    let mapper = EmployeeFieldSetMapper::default();
    let reader = FlatFileItemReaderBuilder::new()
        .names(&["name", "department"])
        .field_set_mapper(&mapper)
        .from_reader(csv.as_bytes());

    let processor = UpperCaseProcessor::default();

    let binder = EmployeeItemBinder;
    let writer = RdbcItemWriterBuilder::new()
        .pool(&pool)
        .table("employees")
        .id_column("id")
        .id_expression("NULL")
        .add_column("name")
        .add_column("department")
        .item_binder(&binder)
        .build();

    let step = StepBuilder::new()
        .name("import-employees".to_string())
        .reader(&reader)
        .processor(&processor)
        .writer(&writer)
        .chunk(2)
        .build();

    let job = JobBuilder::new().start(&step).build();
    let result = job.run();

    assert!(result.is_ok());
    assert_eq!(step.get_status(), StepStatus::Completed);
    assert_eq!(step.get_read_count(), 3);
    assert_eq!(step.get_write_count(), 3);
    assert_eq!(step.get_commit_count(), 2);

    // Names come back uppercased, departments untouched, input order kept.
    assert_eq!(
        stored_employees(&pool).await?,
        vec![
            ("JOHN".to_string(), "sales".to_string()),
            ("JANE".to_string(), "engineering".to_string()),
            ("BOB".to_string(), "marketing".to_string()),
        ]
    );

    // Ids are assigned by the sink.
    let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM employees ORDER BY id")
        .fetch_all(&pool)
        .await?;
    assert_eq!(ids, vec![1, 2, 3]);

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn commit_count_is_the_chunk_ceiling_of_the_input() -> Result<(), Box<dyn Error>> {
    let (pool, _database_file) = setup_sink().await?;

    let csv = (1..=7)
        .map(|i| format!("employee{i},department{i}"))
        .collect::<Vec<_>>()
        .join("\n");

    let mapper = EmployeeFieldSetMapper::default();
    let reader = FlatFileItemReaderBuilder::new()
        .names(&["name", "department"])
        .field_set_mapper(&mapper)
        .from_reader(csv.as_bytes());

    let processor = UpperCaseProcessor::default();

    let binder = EmployeeItemBinder;
    let writer = RdbcItemWriterBuilder::new()
        .pool(&pool)
        .table("employees")
        .id_column("id")
        .id_expression("NULL")
        .add_column("name")
        .add_column("department")
        .item_binder(&binder)
        .build();

    let step = StepBuilder::new()
        .reader(&reader)
        .processor(&processor)
        .writer(&writer)
        .chunk(3)
        .build();

    let job = JobBuilder::new().start(&step).build();
    job.run()?;

    // 7 records, chunk size 3: two full chunks and one final partial chunk.
    assert_eq!(step.get_commit_count(), 3);
    assert_eq!(step.get_write_count(), 7);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
        .fetch_one(&pool)
        .await?;
    assert_eq!(count, 7);

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_input_completes_with_zero_commits() -> Result<(), Box<dyn Error>> {
    let (pool, _database_file) = setup_sink().await?;

    let mapper = EmployeeFieldSetMapper::default();
    let reader = FlatFileItemReaderBuilder::new()
        .names(&["name", "department"])
        .field_set_mapper(&mapper)
        .from_reader("".as_bytes());

    let processor = UpperCaseProcessor::default();

    let binder = EmployeeItemBinder;
    let writer = RdbcItemWriterBuilder::new()
        .pool(&pool)
        .table("employees")
        .id_column("id")
        .id_expression("NULL")
        .add_column("name")
        .add_column("department")
        .item_binder(&binder)
        .build();

    let step = StepBuilder::new()
        .reader(&reader)
        .processor(&processor)
        .writer(&writer)
        .chunk(2)
        .build();

    let job = JobBuilder::new().start(&step).build();
    let result = job.run();

    assert!(result.is_ok());
    assert_eq!(step.get_status(), StepStatus::Completed);
    assert_eq!(step.get_read_count(), 0);
    assert_eq!(step.get_commit_count(), 0);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
        .fetch_one(&pool)
        .await?;
    assert_eq!(count, 0);

    Ok(())
}
