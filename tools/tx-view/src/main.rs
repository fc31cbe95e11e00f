//! TX-View: terminal transaction detail view.
//!
//! Resolves a transaction through `tx-resolver` and prints it with its
//! input sources and confirmation status.
//!
//! ## Usage
//!
//! ```bash
//! # Print once
//! tx-view <transaction-id>
//!
//! # Keep printing status changes until confirmed
//! tx-view <transaction-id> --follow
//!
//! # Other indexer, JSON output
//! tx-view <transaction-id> --api-url http://localhost:8000 --json
//! ```

mod render;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tx_resolver::{
    current_status, ChainTipPoller, ChainTipSource, ConfirmationTracker, HttpTransactionClient,
    ResolveOutcome, ResolverConfig, SharedChainTip, TokioScheduler, TransactionId,
    TransactionResolver,
};

/// Transaction detail view
#[derive(Parser, Debug)]
#[command(name = "tx-view")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Transaction identifier
    id: String,

    /// Indexer REST API base URL (overrides TXR_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Keep following the confirmation status until confirmed
    #[arg(short, long)]
    follow: bool,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = ResolverConfig::from_env();
    if let Some(url) = args.api_url.clone() {
        config.api_base_url = url;
    }
    config.validate().context("invalid configuration")?;

    let client = Arc::new(
        HttpTransactionClient::from_config(&config).context("failed to create indexer client")?,
    );

    // Chain tip publisher
    let tip = SharedChainTip::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller = ChainTipPoller::new(
        Arc::clone(&client),
        tip.clone(),
        config.chain_tip_poll_interval(),
    );
    poller.poll_once().await;
    let poller_handle = poller.spawn(shutdown_rx);

    let resolver =
        TransactionResolver::new(config.clone(), client, Arc::new(TokioScheduler::new()));
    let tracker = ConfirmationTracker::spawn(
        resolver.subscribe_view(),
        tip.subscribe(),
        config.confirmed_threshold,
    );

    let id = TransactionId::new(args.id.as_str());
    match resolver
        .resolve(id.clone())
        .await
        .with_context(|| format!("failed to resolve {}", id))?
    {
        ResolveOutcome::Resolved(_) => {}
        ResolveOutcome::PermanentlyNotFound { attempts } => {
            bail!("transaction {} not found after {} attempts", id, attempts)
        }
        ResolveOutcome::Superseded => bail!("resolution of {} was superseded", id),
    }

    let view = resolver.snapshot();
    let chain_tip = tip.blue_score();
    let status = current_status(&view, chain_tip, config.confirmed_threshold);
    if args.json {
        let value = render::render_json(&view, status, chain_tip);
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", render::render_text(&view, status, chain_tip));
    }

    if args.follow {
        follow(&tracker).await;
    }

    let _ = shutdown_tx.send(true);
    poller_handle.await.context("chain tip poller panicked")?;
    Ok(())
}

/// Print status changes until confirmed, not accepted, or Ctrl+C.
async fn follow(tracker: &ConfirmationTracker) {
    let mut status_rx = tracker.subscribe();
    loop {
        let status = *status_rx.borrow_and_update();
        if let Some(s) = status {
            if s.confirmed || !s.accepted {
                break;
            }
        }

        tokio::select! {
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("Status       {}", render::status_line(*status_rx.borrow()));
            }
            _ = tokio::signal::ctrl_c() => {
                info!("[tx-view] Interrupted");
                break;
            }
        }
    }
}
