// src/bin/cli.rs
//
//! CLI for querying object metadata in a bucket.
//!
//! Examples:
//! ```bash
//! s3query get-bucket            -b my-bucket --prefix logs/ --show-versions
//! s3query get-objects           -b my-bucket --keylist keys.txt
//! cat keys.txt | s3query --output json get-objects -b my-bucket
//! s3query head-object           -b my-bucket data/a.json
//! s3query get-detailed-objects  -b my-bucket --filter-params contains:log,newerthan:d2
//! ```

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use futures_util::TryStreamExt;
use std::io::{self, BufWriter, ErrorKind, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use s3query::constants::{ENV_ACCESS_KEY_ID, ENV_SECRET_ACCESS_KEY, UNKNOWN_BUCKET_MSG};
use s3query::input::{read_keylist, read_object_names};
use s3query::views::{write_records, EntryWriter};
use s3query::{
    filter, page_bucket, resolve_objects_blocking, ClientConfig, EntryStream, FilterParams, ListRequest,
    ObjectClient, PageCursor, S3ObjectClient, ViewType,
};

/// A closed stdout (e.g. piped into `head`) ends the program quietly.
fn output_error(e: io::Error) -> anyhow::Error {
    if e.kind() == ErrorKind::BrokenPipe {
        std::process::exit(0);
    }
    e.into()
}

// -- Commands

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(short = 'v',
        long,
        action = ArgAction::Count,
        global = true,
        help = "Increase log verbosity: -v = Info, -vv = Debug",
    )]
    verbose: u8,

    /// Output format
    #[arg(long, value_enum, default_value_t = ViewType::Cli, global = true)]
    output: ViewType,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the objects of a bucket.
    GetBucket {
        #[arg(short = 'b', long)]
        bucket: String,

        /// Only list keys starting with this prefix
        #[arg(long)]
        prefix: Option<String>,

        /// List every version instead of the current objects
        #[arg(long)]
        show_versions: bool,

        /// Resume the listing after this key
        #[arg(long, value_name = "KEY")]
        next_marker: Option<String>,
    },

    /// Resolve object names read from a key list or from piped stdin.
    GetObjects {
        #[arg(short = 'b', long)]
        bucket: String,

        /// File with one object name per line; `#` starts a comment line
        #[arg(long, value_name = "FILE")]
        keylist: Option<PathBuf>,
    },

    /// Resolve a single object name.
    HeadObject {
        #[arg(short = 'b', long)]
        bucket: String,

        name: String,
    },

    /// List the objects of a bucket matching filter parameters.
    GetDetailedObjects {
        #[arg(short = 'b', long)]
        bucket: String,

        #[arg(long)]
        prefix: Option<String>,

        /// Comma-separated `key:value` pairs, keys: contains, owner,
        /// newerthan, olderthan, largerthan, smallerthan
        #[arg(long, value_name = "PARAMS")]
        filter_params: Option<String>,
    },
}

/// Check if AWS credentials are available for S3 operations
fn check_aws_credentials() -> Result<()> {
    if std::env::var(ENV_ACCESS_KEY_ID).is_err() || std::env::var(ENV_SECRET_ACCESS_KEY).is_err() {
        bail!("Missing required AWS environment variables. Please set {} and {} (and optionally AWS_REGION) either in your environment or in a .env file.",
            ENV_ACCESS_KEY_ID, ENV_SECRET_ACCESS_KEY);
    }
    Ok(())
}

async fn connect() -> Result<Arc<S3ObjectClient>> {
    check_aws_credentials()?;
    let config = ClientConfig::from_env();
    debug!("Client configuration: {:?}", config);
    let client = S3ObjectClient::connect(&config)
        .await
        .context("Failed to build S3 client")?;
    Ok(Arc::new(client))
}

/// Fail with the unknown-bucket message when the bucket does not exist.
async fn ensure_bucket(client: &S3ObjectClient, bucket: &str) -> Result<()> {
    match client.head_bucket(bucket).await {
        Ok(info) => {
            debug!("Bucket {} found (region {:?})", info.name, info.region);
            Ok(())
        }
        Err(e) if e.is_not_found() => bail!(UNKNOWN_BUCKET_MSG),
        Err(e) => Err(e).with_context(|| format!("Failed to access bucket {bucket}")),
    }
}

async fn render_listing(mut entries: EntryStream, view: ViewType, bucket: &str, show_versions: bool) -> Result<()> {
    let out = BufWriter::new(io::stdout());
    let mut writer = EntryWriter::new(out, view, bucket, show_versions);

    while let Some(entry) = entries.try_next().await? {
        writer.write_entry(&entry).map_err(output_error)?;
    }
    writer.finish().map_err(output_error)?;
    Ok(())
}

async fn get_bucket_cmd(
    bucket: &str,
    prefix: Option<String>,
    show_versions: bool,
    next_marker: Option<String>,
    view: ViewType,
) -> Result<()> {
    let client = connect().await?;
    ensure_bucket(&client, bucket).await?;

    let request = ListRequest::new(bucket)
        .prefix(prefix)
        .include_versions(show_versions)
        .cursor(next_marker.map(PageCursor::new));

    info!("Listing bucket {}", bucket);
    render_listing(page_bucket(client, request), view, bucket, show_versions).await
}

async fn get_detailed_objects_cmd(
    bucket: &str,
    prefix: Option<String>,
    filter_params: Option<String>,
    view: ViewType,
) -> Result<()> {
    // Reject bad parameters before touching the network.
    let params = match filter_params {
        Some(raw) => FilterParams::parse(&raw)?,
        None => FilterParams::default(),
    };
    debug!("Filter parameters: {:?}", params);

    let client = connect().await?;
    ensure_bucket(&client, bucket).await?;

    let request = ListRequest::new(bucket).prefix(prefix);
    let entries = filter::apply(page_bucket(client, request), params);
    render_listing(entries, view, bucket, false).await
}

fn collect_names(keylist: Option<PathBuf>) -> Result<Vec<String>> {
    let names = match keylist {
        Some(path) => read_keylist(&path)?,
        None => {
            let stdin = io::stdin();
            if stdin.is_terminal() {
                bail!("No object names given: pipe names on stdin or pass --keylist FILE");
            }
            read_object_names(stdin.lock(), false)?
        }
    };

    if names.is_empty() {
        bail!("Stdin is empty or no object names were read");
    }
    Ok(names)
}

async fn resolve_cmd(bucket: String, names: Vec<String>, view: ViewType) -> Result<()> {
    let client = connect().await?;
    info!("Resolving {} object names in bucket {}", names.len(), bucket);

    // The batch runs on the library runtime; park a blocking thread on it
    // rather than a worker of this one.
    let records = tokio::task::spawn_blocking(move || resolve_objects_blocking(client, &bucket, names))
        .await
        .context("Object lookup thread panicked")??;

    let mut out = BufWriter::new(io::stdout());
    write_records(&mut out, view, &records).map_err(output_error)?;
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let view = cli.output;

    match cli.cmd {
        Command::GetBucket { bucket, prefix, show_versions, next_marker } => {
            get_bucket_cmd(&bucket, prefix, show_versions, next_marker, view).await?;
        }

        Command::GetObjects { bucket, keylist } => {
            let names = collect_names(keylist)?;
            resolve_cmd(bucket, names, view).await?;
        }

        Command::HeadObject { bucket, name } => {
            resolve_cmd(bucket, vec![name], view).await?;
        }

        Command::GetDetailedObjects { bucket, prefix, filter_params } => {
            get_detailed_objects_cmd(&bucket, prefix, filter_params, view).await?;
        }
    }

    io::stdout().flush().map_err(output_error)?;
    Ok(())
}

/// Main CLI function
#[tokio::main]
async fn main() -> ExitCode {
    // Loads any variables from .env file that are not already set
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    // Logs go to stderr; stdout carries the rendered output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    // Initialize tracing-log bridge to capture log crate messages from dependencies
    tracing_log::LogTracer::init().ok();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // User-facing messages carry their own wording; the chain follows.
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
