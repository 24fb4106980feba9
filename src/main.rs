//! Hedera operations batch runner.
//!
//! Reads a JSON array of operation requests, runs it through the
//! dispatcher and prints one result record per request.
//!
//! # Architecture Overview
//!
//! ```text
//!   batch.json / stdin
//!          │
//!          ▼
//!   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!   │  dispatch    │──▶│ transaction  │──▶│    codec     │
//!   │  (requests)  │   │  (builder)   │   │ (wire bytes) │
//!   └──────┬───────┘   └──────────────┘   └──────────────┘
//!          │                  │
//!          │                  ▼
//!          │           ┌──────────────┐
//!          │           │     keys     │
//!          │           │  (signing)   │
//!          │           └──────────────┘
//!          ▼
//!   ┌──────────────┐   ┌──────────────────────────────┐
//!   │    ledger    │──▶│ gateway (HTTP) or simulated  │
//!   │ (submission) │   │ in-memory ledger             │
//!   └──────────────┘   └──────────────────────────────┘
//!          │
//!          ▼
//!   JSON array of result records → stdout
//! ```
//!
//! # Exit Codes
//! - `0`: every item was processed (individual items may still have failed)
//! - `1`: fail-fast batch aborted, or the input could not be read
//! - `2`: configuration or credential error

use clap::Parser;
use serde_json::Value;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use hedera_ops::config::loader::{load_config, load_from_env};
use hedera_ops::config::{AppConfig, Credentials};
use hedera_ops::dispatch::{render, ItemResult};
use hedera_ops::ledger::{Hbar, LedgerTransport, MemoryLedger};
use hedera_ops::lifecycle::signals::spawn_signal_handler;
use hedera_ops::observability::init_logging;
use hedera_ops::{BatchOptions, Dispatcher, FailureMode, OperationError, SecretPolicy};

/// Operator balance seeded into the simulated ledger.
const SIMULATED_OPERATOR_BALANCE: Hbar = Hbar::from_hbar(10_000);

#[derive(Parser)]
#[command(name = "hedera-ops")]
#[command(about = "Run Hedera account and transaction operations in batch", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults plus HEDERA_* variables when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON array of requests, or `-` for stdin.
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Stop at the first failed item.
    #[arg(long)]
    fail_fast: bool,

    /// Items dispatched concurrently; results keep input order.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Run against an in-memory ledger instead of the gateway.
    #[arg(long)]
    simulate: bool,

    /// Replace generated private keys with a placeholder.
    #[arg(long)]
    redact_secrets: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => load_config(path),
        None => load_from_env(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            init_logging(&Default::default());
            tracing::error!(error = %e, "Configuration rejected");
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };
    init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        network = %config.operator.network,
        simulate = cli.simulate,
        "hedera-ops starting"
    );

    let items = match read_items(&cli.input) {
        Ok(items) => items,
        Err(message) => {
            tracing::error!(input = %cli.input, error = %message, "Cannot read batch");
            eprintln!("Error: {message}");
            return ExitCode::from(1);
        }
    };

    let dispatcher = match build_dispatcher(&cli, &config) {
        Ok(dispatcher) => dispatcher,
        Err(e) => {
            tracing::error!(error = %e, kind = e.kind(), "Dispatcher not started");
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };

    let signals = spawn_signal_handler(dispatcher.shutdown());

    let policy = dispatcher.secret_policy();
    let (results, code) = match dispatcher.run_batch(&items).await {
        Ok(results) => (results, ExitCode::SUCCESS),
        Err(aborted) => {
            eprintln!("Error: {aborted}");
            (aborted.results, ExitCode::from(1))
        }
    };

    signals.abort();

    print_results(&results, policy);
    code
}

fn build_dispatcher(cli: &Cli, config: &AppConfig) -> Result<Dispatcher, OperationError> {
    let transport: Arc<dyn LedgerTransport> = if cli.simulate {
        let credentials = Credentials::from_config(&config.operator)?;
        let keys = credentials.key_manager()?;
        tracing::warn!(
            operator = %credentials.account_id,
            balance = %SIMULATED_OPERATOR_BALANCE,
            "Using simulated ledger; nothing reaches the network"
        );
        Arc::new(MemoryLedger::new(credentials.network).with_account(
            credentials.account_id,
            keys.operator_public_key(),
            SIMULATED_OPERATOR_BALANCE,
        ))
    } else {
        Dispatcher::gateway_transport(config)?
    };

    let mut options = BatchOptions {
        failure_mode: if cli.fail_fast || config.batch.fail_fast {
            FailureMode::FailFast
        } else {
            FailureMode::Isolated
        },
        concurrency: config.batch.concurrency,
    };
    if let Some(concurrency) = cli.concurrency {
        options.concurrency = concurrency;
    }

    let mut dispatcher = Dispatcher::new(config, transport)?.with_options(options);
    if cli.redact_secrets {
        dispatcher = dispatcher.with_secret_policy(SecretPolicy::Redact);
    }
    Ok(dispatcher)
}

fn read_items(input: &str) -> Result<Vec<Value>, String> {
    let content = if input == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| format!("cannot read stdin: {e}"))?;
        buffer
    } else {
        std::fs::read_to_string(input).map_err(|e| format!("cannot read {input}: {e}"))?
    };

    match serde_json::from_str::<Value>(&content).map_err(|e| format!("invalid JSON: {e}"))? {
        Value::Array(items) => Ok(items),
        single @ Value::Object(_) => Ok(vec![single]),
        _ => Err("input must be a JSON array of request objects".into()),
    }
}

fn print_results(results: &[ItemResult], policy: SecretPolicy) {
    let records: Vec<Value> = results.iter().map(|r| render(r, policy)).collect();
    match serde_json::to_string_pretty(&records) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error: cannot render results: {e}"),
    }
}
