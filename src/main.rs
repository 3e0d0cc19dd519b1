//! Operator CLI for the materials access layer.
//!
//! Masks values the way the storefront displays them, classifies backend
//! error codes, and inspects or resets quota counters in the configured
//! store.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use materials_access::backend::RemoteError;
use materials_access::config::{load_config, AccessConfig, StorageKind};
use materials_access::disclosure::FieldKind;
use materials_access::observability::{logging, metrics};
use materials_access::resilience::{Retryability, RetryClassifier};
use materials_access::security::{QuotaKey, RateLimiter};
use materials_access::services::open_store;

#[derive(Parser)]
#[command(name = "materials-access")]
#[command(about = "Rate limit, retry and disclosure tooling for the materials marketplace", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum MaskKind {
    Phone,
    Name,
    Address,
    Reference,
}

impl From<MaskKind> for FieldKind {
    fn from(kind: MaskKind) -> Self {
        match kind {
            MaskKind::Phone => FieldKind::Phone,
            MaskKind::Name => FieldKind::Name,
            MaskKind::Address => FieldKind::Address,
            MaskKind::Reference => FieldKind::Reference,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the masked form of a value
    Mask {
        #[arg(value_enum)]
        kind: MaskKind,
        value: String,
    },
    /// Report whether a backend error code is retried
    Classify { code: String },
    /// Inspect or change quota counters
    Quota {
        #[command(subcommand)]
        action: QuotaAction,
    },
}

#[derive(Subcommand)]
enum QuotaAction {
    /// Show the counter without changing it
    Status(QuotaArgs),
    /// Consume one admission
    Admit(QuotaArgs),
    /// Delete the counter
    Clear(QuotaArgs),
}

#[derive(clap::Args)]
struct QuotaArgs {
    #[arg(short, long)]
    subject: Option<String>,

    #[arg(short, long)]
    endpoint: String,

    /// Overrides the configured limit for the endpoint.
    #[arg(short, long)]
    limit: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AccessConfig::default(),
    };

    logging::init(&config.observability);
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    match cli.command {
        Commands::Mask { kind, value } => {
            println!("{}", FieldKind::from(kind).mask(&value));
        }
        Commands::Classify { code } => {
            let classifier =
                RetryClassifier::with_extra_codes(config.retries.extra_non_retryable_codes.iter().cloned());
            let verdict = match classifier.classify(&RemoteError::with_code(code.clone(), "")) {
                Retryability::Retryable => "retryable",
                Retryability::NonRetryable => "non-retryable",
            };
            println!("{code}: {verdict}");
        }
        Commands::Quota { action } => run_quota(&config, action).await?,
    }

    Ok(())
}

async fn run_quota(config: &AccessConfig, action: QuotaAction) -> Result<(), Box<dyn std::error::Error>> {
    if config.storage.kind == StorageKind::Memory {
        tracing::warn!("Quota commands against in-memory storage do not persist");
    }

    let store = open_store(&config.storage).await?;
    let limiter = RateLimiter::new(store).with_fail_open(config.rate_limit.fail_open);

    let (args, admit, clear) = match action {
        QuotaAction::Status(args) => (args, false, false),
        QuotaAction::Admit(args) => (args, true, false),
        QuotaAction::Clear(args) => (args, false, true),
    };

    let key = QuotaKey::new(args.subject.as_deref(), args.endpoint.as_str());
    let rule = config.rate_limit.rule_for(&key.endpoint);
    let limit = args.limit.unwrap_or(rule.limit);

    if clear {
        limiter.clear(&key).await?;
        println!("cleared {key}");
        return Ok(());
    }

    if admit {
        let admitted = limiter
            .admit(&key, limit, Duration::from_secs(rule.window_secs))
            .await;
        println!("{key}: {}", if admitted { "admitted" } else { "denied" });
    }

    match limiter.status(&key, limit).await {
        Some(status) => println!("{}", serde_json::to_string_pretty(&status)?),
        None => println!("{key}: no record"),
    }
    Ok(())
}
