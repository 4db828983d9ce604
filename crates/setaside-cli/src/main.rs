//! `setaside`: fetch veteran set-aside contract opportunities from SAM.gov,
//! score them for recency, write them to Parquet and publish them for
//! analytics.

mod config;
mod display;
mod pipeline;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use setaside_fetch::SamClient;
use setaside_store::{
    AthenaEngine, CatalogCrawler, GlueCrawler, ObjectStore, QueryEngine, S3Store,
    load_sdk_config, read_parquet,
};
use tracing::{error, info};

use config::PipelineConfig;
use pipeline::{Clients, RunOptions};

#[derive(Parser)]
#[command(
    name = "setaside",
    version,
    about = "Veteran set-aside contract opportunities from SAM.gov, as Parquet."
)]
struct Cli {
    /// Verbosity level (-v, -vv). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pipeline once and print its status record as JSON.
    Run(RunArgs),

    /// Print the rows of a Parquet file written by `run`.
    Show {
        path: PathBuf,

        /// Show at most this many rows.
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// TOML config file; built-in defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long, env = "SAM_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Print each opportunity as it is written.
    #[arg(long)]
    print: bool,

    /// Stop after writing the local Parquet file.
    #[arg(long)]
    local_only: bool,

    #[arg(long)]
    keyword: Option<String>,

    #[arg(long)]
    days_back: Option<u32>,

    #[arg(long)]
    max_records: Option<usize>,

    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Search endpoint, for staging or mock servers.
    #[arg(long)]
    base_url: Option<String>,
}

impl RunArgs {
    fn apply(&self, config: &mut PipelineConfig) {
        if let Some(keyword) = &self.keyword {
            config.search.keyword = keyword.clone();
        }
        if let Some(days_back) = self.days_back {
            config.search.days_back = days_back;
        }
        if let Some(max_records) = self.max_records {
            config.search.max_records = max_records;
        }
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.search.base_url = base_url.clone();
        }
        if self.local_only {
            config.local_only();
        }
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{EnvFilter, fmt};

    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    info!("setaside v{}", env!("CARGO_PKG_VERSION"));

    let result = match cli.command {
        Command::Run(args) => tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("starting async runtime")
            .and_then(|runtime| runtime.block_on(run(args))),
        Command::Show { path, limit } => show(&path, limit),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            error!(error = format!("{err:#}"), "setaside failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: RunArgs) -> Result<ExitCode> {
    let mut config = PipelineConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    let search = SamClient::new(
        &config.search.base_url,
        args.api_key.clone(),
        config.request_timeout(),
    )
    .context("building search client")?;

    let sdk = if config.needs_aws() {
        Some(load_sdk_config(&config.publish.region).await)
    } else {
        None
    };
    let s3 = sdk.as_ref().map(S3Store::new);
    let glue = sdk.as_ref().map(GlueCrawler::new);
    let athena = sdk.as_ref().map(AthenaEngine::new);

    let clients = Clients {
        search: &search,
        store: s3.as_ref().map(|s| s as &dyn ObjectStore),
        crawler: glue.as_ref().map(|g| g as &dyn CatalogCrawler),
        query: athena.as_ref().map(|a| a as &dyn QueryEngine),
    };
    let options = RunOptions { print: args.print };

    let status = pipeline::run(&config, &clients, options, Utc::now()).await;
    println!("{}", serde_json::to_string(&status)?);

    Ok(if status.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn show(path: &Path, limit: Option<usize>) -> Result<ExitCode> {
    let batches = read_parquet(path).with_context(|| format!("reading {}", path.display()))?;
    let total: usize = batches.iter().map(|b| b.num_rows()).sum();
    let limit = limit.unwrap_or(total);

    let mut shown = 0;
    'batches: for batch in &batches {
        for row in 0..batch.num_rows() {
            if shown >= limit {
                break 'batches;
            }
            println!("{}", display::row_card(batch, row));
            shown += 1;
        }
    }

    info!(shown, total, path = %path.display(), "displayed rows");
    Ok(ExitCode::SUCCESS)
}
