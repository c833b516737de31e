//! `sales-insight` command-line front end.
//!
//! Each invocation serves one request against the configured sales store and
//! prints the JSON response on stdout. Logs go to stderr.

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use sales_insight::{
    api::{Response, SalesApi, SalesParams, SummaryParams},
    config::{self, SalesStore},
    core::product_index::ProductIndex,
    errors::Result,
};
use std::{path::PathBuf, process::ExitCode, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sales-insight")]
#[command(about = "Query and summarize gold jewelry sales records")]
#[command(version)]
struct Cli {
    /// Path of config.toml (defaults to $SALES_CONFIG, then ./config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List sales rows, newest first
    Sales {
        /// Product code
        #[arg(long)]
        kode_barang: Option<String>,

        /// Location
        #[arg(long)]
        lokasi: Option<String>,

        /// Month (1-12)
        #[arg(long)]
        bulan: Option<i64>,

        /// Year
        #[arg(long)]
        tahun: Option<i64>,

        /// Minimum unit weight in grams
        #[arg(long)]
        min_berat: Option<f64>,

        /// Maximum unit weight in grams
        #[arg(long)]
        max_berat: Option<f64>,

        /// Page size (at most 2000)
        #[arg(long, default_value_t = 100, allow_negative_numbers = true)]
        limit: i64,

        /// Rows to skip
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i64,
    },

    /// Rank total sold weight by product, location or period
    Summary {
        /// Grouping dimension: product, lokasi or bulan
        #[arg(long, default_value = "product")]
        by: String,

        /// Number of groups (1-1000, otherwise 10)
        #[arg(long, default_value_t = 10, allow_negative_numbers = true)]
        top: i64,

        /// Restrict to one year
        #[arg(long)]
        tahun: Option<i64>,

        /// Restrict to one month
        #[arg(long)]
        bulan: Option<i64>,
    },
}

fn build_api(cli: &Cli) -> Result<SalesApi> {
    let app_config = config::load_app_configuration(cli.config.as_deref())?;
    info!("Successfully processed application configuration.");

    let index = ProductIndex::load(&app_config.reference.product_master)
        .inspect_err(|e| error!("Failed to load product reference data: {}", e))?;

    Ok(SalesApi::new(
        SalesStore::from_config(&app_config.database),
        Arc::new(index),
    ))
}

async fn serve(api: &SalesApi, command: Commands) -> Response {
    match command {
        Commands::Sales {
            kode_barang,
            lokasi,
            bulan,
            tahun,
            min_berat,
            max_berat,
            limit,
            offset,
        } => {
            let params = SalesParams {
                kode_barang,
                lokasi,
                bulan,
                tahun,
                min_berat,
                max_berat,
                limit,
                offset,
            };
            Response::from_outcome(api.sales(params).await)
        }
        Commands::Summary {
            by,
            top,
            tahun,
            bulan,
        } => {
            let params = SummaryParams {
                by,
                top,
                tahun,
                bulan,
            };
            Response::from_outcome(api.summary(params).await)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    dotenv().ok(); // env vars can be set externally
    info!("Attempted to load .env file.");

    let cli = Cli::parse();

    let api = match build_api(&cli) {
        Ok(api) => api,
        Err(e) => {
            error!("Critical error during startup: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let response = serve(&api, cli.command).await;
    match serde_json::to_string_pretty(&response.body) {
        Ok(body) => println!("{body}"),
        Err(e) => {
            error!("Failed to render response: {}", e);
            return ExitCode::FAILURE;
        }
    }

    if response.status == 200 {
        ExitCode::SUCCESS
    } else {
        error!("Request failed with status {}", response.status);
        ExitCode::FAILURE
    }
}
