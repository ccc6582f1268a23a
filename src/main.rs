use cc_processor::config::ProcessorConfig;
use cc_processor::domain::ports::{AccountStore, AccountStoreBox, TransactionStoreBox};
use cc_processor::infrastructure::in_memory::{InMemoryAccountStore, InMemoryTransactionStore};
use cc_processor::interfaces::csv::account_reader::AccountReader;
use cc_processor::interfaces::csv::account_writer::AccountWriter;
use cc_processor::interfaces::csv::record_writer::RecordWriter;
use cc_processor::interfaces::handler::RequestHandler;
use cc_processor::interfaces::request::Response;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Charge requests, one JSON object per line
    requests: PathBuf,

    /// Accounts CSV (bank,account,balance) used to seed the balance table
    #[arg(long)]
    accounts: Option<PathBuf>,

    /// Write the transaction records as CSV to this path
    #[arg(long)]
    records: Option<PathBuf>,

    /// Write the final balance table as CSV to this path
    #[arg(long)]
    balances: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// JSON config file; the flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Attempts made while the bank is unavailable
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Backoff delay after the first failed attempt, in milliseconds
    #[arg(long)]
    base_delay_ms: Option<u64>,

    /// Probability in [0, 1] that a store call is treated as unavailable
    #[arg(long)]
    failure_rate: Option<f64>,

    /// Per-request deadline in milliseconds
    #[arg(long)]
    deadline_ms: Option<u64>,

    /// Target length of generated transaction identifiers
    #[arg(long)]
    id_length: Option<usize>,

    /// Maximum number of requests in flight
    #[arg(long, default_value_t = 64)]
    concurrency: usize,
}

impl Cli {
    fn processor_config(&self) -> Result<ProcessorConfig> {
        let mut config = match &self.config {
            Some(path) => ProcessorConfig::from_path(path).into_diagnostic()?,
            None => ProcessorConfig::default(),
        };

        if let Some(max_attempts) = self.max_attempts {
            config.max_attempts = max_attempts;
        }
        if let Some(base_delay_ms) = self.base_delay_ms {
            config.base_delay_ms = base_delay_ms;
        }
        if let Some(failure_rate) = self.failure_rate {
            config.failure_rate = failure_rate;
        }
        if let Some(deadline_ms) = self.deadline_ms {
            config.deadline_ms = Some(deadline_ms);
        }
        if let Some(id_length) = self.id_length {
            config.id_length = id_length;
        }

        config.validate().into_diagnostic()?;
        Ok(config)
    }
}

fn in_memory_stores() -> (AccountStoreBox, TransactionStoreBox) {
    (
        Box::new(InMemoryAccountStore::new()),
        Box::new(InMemoryTransactionStore::new()),
    )
}

#[cfg(feature = "storage-rocksdb")]
fn persistent_stores(path: &Path) -> Result<(AccountStoreBox, TransactionStoreBox)> {
    use cc_processor::infrastructure::rocksdb::RocksDBStore;

    let store = RocksDBStore::open(path).into_diagnostic()?;
    Ok((Box::new(store.clone()), Box::new(store)))
}

#[cfg(not(feature = "storage-rocksdb"))]
fn persistent_stores(path: &Path) -> Result<(AccountStoreBox, TransactionStoreBox)> {
    warn!(
        path = %path.display(),
        "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
    );
    Ok(in_memory_stores())
}

async fn seed_accounts(store: &dyn AccountStore, path: &Path) -> Result<()> {
    let file = File::open(path).into_diagnostic()?;
    for account in AccountReader::new(file).accounts() {
        match account {
            Ok(account) => store.store(account).await.into_diagnostic()?,
            Err(e) => warn!(error = %e, "Error reading account"),
        }
    }
    Ok(())
}

/// Handles every request line on its own task, at most `concurrency` at a time,
/// and returns the responses in input order.
///
/// Lines are read as raw bytes so a line that is not UTF-8 is answered like any
/// other malformed request. A read error stops reading, but requests already in
/// flight still run to completion before it is reported.
async fn process_requests(
    handler: Arc<RequestHandler>,
    path: &Path,
    concurrency: usize,
) -> Result<Vec<Response>> {
    let file = File::open(path).into_diagnostic()?;
    let mut tasks = JoinSet::new();
    let mut responses = Vec::new();
    let mut read_error = None;

    for (index, line) in BufReader::new(file).split(b'\n').enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, line = index + 1, "failed to read requests");
                read_error = Some(e);
                break;
            }
        };
        if line.trim_ascii().is_empty() {
            continue;
        }

        if tasks.len() >= concurrency
            && let Some(done) = tasks.join_next().await
        {
            responses.push(done.into_diagnostic()?);
        }

        let handler = Arc::clone(&handler);
        tasks.spawn(async move { (index, handler.handle_bytes(line.trim_ascii()).await) });
    }

    while let Some(done) = tasks.join_next().await {
        responses.push(done.into_diagnostic()?);
    }

    if let Some(e) = read_error {
        return Err(e).into_diagnostic();
    }

    responses.sort_by_key(|(index, _)| *index);
    Ok(responses.into_iter().map(|(_, response)| response).collect())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.processor_config()?;

    let (account_store, transaction_store) = match &cli.db_path {
        Some(path) => persistent_stores(path)?,
        None => in_memory_stores(),
    };

    if let Some(path) = &cli.accounts {
        seed_accounts(account_store.as_ref(), path).await?;
    }

    let handler = Arc::new(
        RequestHandler::from_config(&config, account_store, transaction_store).into_diagnostic()?,
    );

    let responses = process_requests(Arc::clone(&handler), &cli.requests, cli.concurrency.max(1)).await?;

    {
        let mut out = io::stdout().lock();
        for response in &responses {
            serde_json::to_writer(&mut out, response).into_diagnostic()?;
            writeln!(out).into_diagnostic()?;
        }
    }

    if let Some(path) = &cli.records {
        let records = handler.records().await.into_diagnostic()?;
        let file = File::create(path).into_diagnostic()?;
        RecordWriter::new(file)
            .write_records(records)
            .into_diagnostic()?;
    }

    if let Some(path) = &cli.balances {
        let accounts = handler.accounts().await.into_diagnostic()?;
        let file = File::create(path).into_diagnostic()?;
        AccountWriter::new(file)
            .write_accounts(accounts)
            .into_diagnostic()?;
    }

    Ok(())
}
