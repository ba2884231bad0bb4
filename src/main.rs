use std::{env, fs::File};

use anyhow::Context;
use log::info;
use sqlx::AnyPool;

use employee_etl::{
    config::ImportConfig,
    core::{
        job::{Job, JobBuilder},
        step::StepBuilder,
    },
    employee::{EmployeeFieldSetMapper, EmployeeItemBinder, UpperCaseProcessor},
    item::flat_file::FlatFileItemReaderBuilder,
    item::rdbc::RdbcItemWriterBuilder,
};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| "import.toml".to_string());
    let config = ImportConfig::load(&config_path)?;

    sqlx::any::install_default_drivers();
    let pool = AnyPool::connect(&config.connection_uri)
        .await
        .with_context(|| format!("cannot connect to sink {}", config.connection_uri))?;

    let file = File::open(&config.input_path)
        .with_context(|| format!("cannot open input file {}", config.input_path.display()))?;

    let mapper = EmployeeFieldSetMapper::default();
    let reader = FlatFileItemReaderBuilder::new()
        .names(&config.field_names)
        .field_set_mapper(&mapper)
        .from_reader(file);

    let processor = UpperCaseProcessor::default();
    let binder = EmployeeItemBinder;

    let mut writer_builder = RdbcItemWriterBuilder::new()
        .pool(&pool)
        .table(&config.target_table)
        .id_column(&config.id_column)
        .id_expression(&config.id_sequence_expression)
        .item_binder(&binder);
    for column in &config.field_names {
        writer_builder = writer_builder.add_column(column);
    }
    let writer = writer_builder.build();

    let step = StepBuilder::new()
        .name("import-employees".to_string())
        .reader(&reader)
        .processor(&processor)
        .writer(&writer)
        .chunk(config.chunk_size)
        .build();

    let job = JobBuilder::new()
        .name("employee-import".to_string())
        .start(&step)
        .build();

    job.run()?;

    info!(
        "Imported {} employees in {} chunks into {}",
        step.get_write_count(),
        step.get_commit_count(),
        config.target_table
    );

    Ok(())
}
