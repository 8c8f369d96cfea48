//! druidctl - command-line front end for druid-client.

use std::sync::Arc;

use anyhow::Context;
use druid_client::broker::{HttpBrokerConnector, QueryExecutor, Row};
use druid_client::cli::{self, Cli, Command};
use druid_client::config::Config;
use druid_client::error::DruidError;
use druid_client::ingest::{IngestionClient, IngestionSpec, TaskId};
use druid_client::logging;
use druid_client::transport::HttpTransport;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();

    if cli.log_file {
        logging::init_file_logging();
    } else {
        logging::init_stderr_logging();
    }

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<DruidError>() {
            Some(druid_err) => error!("{}: {:#}", druid_err.category(), e),
            None => error!("{:#}", e),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    config.client.apply_env_overrides();
    cli.apply_overrides(&mut config);

    let timeout = config.client.request_timeout();
    let ingest_connection = config.client.ingest_connection.clone();
    let broker_connection = config.client.broker_connection.clone();

    match cli.command {
        Command::Submit {
            spec,
            interval,
            max_ingestion_secs,
        } => {
            let poll = cli::poll_config(&config, interval, max_ingestion_secs);
            let spec = IngestionSpec::from_file(&spec)?;
            let client = IngestionClient::new(
                Arc::new(HttpTransport::with_timeout(timeout)?),
                Arc::new(config),
                ingest_connection,
                poll,
            );

            let report = client
                .submit(&spec)
                .await
                .context("Ingestion did not complete")?;
            println!(
                "{} SUCCESS after {} polls ({:.1}s)",
                report.task_id,
                report.polls,
                report.elapsed.as_secs_f64()
            );
        }
        Command::Status { task_id } => {
            let client = ingestion_client(config, ingest_connection, timeout)?;
            let status = client.task_status(&TaskId::new(task_id.clone())).await?;
            println!("{task_id} {status}");
        }
        Command::Shutdown { task_id } => {
            let client = ingestion_client(config, ingest_connection, timeout)?;
            client.shutdown(&TaskId::new(task_id.clone())).await?;
            println!("{task_id} shutdown requested");
        }
        Command::Query { sql, params, first } => {
            let executor = QueryExecutor::new(
                Arc::new(HttpBrokerConnector::new(timeout)?),
                Arc::new(config),
                broker_connection,
            );
            let params = cli::parse_params(&params);
            let params = (!params.is_empty()).then_some(params.as_slice());

            if first {
                if let Some(row) = executor.fetch_one(&sql, params).await? {
                    println!("{}", format_row(&row));
                }
            } else {
                let table = executor.fetch_table(&sql, params).await?;
                if !table.columns.is_empty() {
                    println!("{}", table.columns.join("\t"));
                }
                for row in &table.rows {
                    println!("{}", format_row(row));
                }
            }
        }
    }

    Ok(())
}

fn ingestion_client(
    config: Config,
    connection: String,
    timeout: std::time::Duration,
) -> anyhow::Result<IngestionClient> {
    let poll = cli::poll_config(&config, None, None);
    Ok(IngestionClient::new(
        Arc::new(HttpTransport::with_timeout(timeout)?),
        Arc::new(config),
        connection,
        poll,
    ))
}

fn format_row(row: &Row) -> String {
    row.iter()
        .map(|v| v.to_display_string())
        .collect::<Vec<_>>()
        .join("\t")
}
