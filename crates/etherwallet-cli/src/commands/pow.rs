//! `pow`: difficulty-targeted nonce search.
//!
//! The search runs on the blocking pool. Ctrl-C cancels it through the
//! shared token; the configured timeout bounds it otherwise.

use std::time::{Duration, Instant};

use clap::Args;

use etherwallet_protocol::pow::{search, CancelToken, SearchLimits};
use etherwallet_types::{EtherwalletError, Result};

use crate::output;
use crate::GlobalOpts;

#[derive(Args)]
pub struct PowArgs {
    /// Data to prefix every nonce with.
    pub data: String,

    /// Leading hex zeros required (default: config `pow_difficulty`).
    #[arg(long)]
    pub difficulty: Option<u32>,

    /// Give up after this many seconds (default: config `pow_timeout_secs`).
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Give up after this many hashes.
    #[arg(long, value_name = "N")]
    pub max_iterations: Option<u64>,
}

pub async fn run(args: PowArgs, opts: &GlobalOpts) -> Result<()> {
    let difficulty = args.difficulty.unwrap_or(opts.config.pow_difficulty);
    let timeout = match args.timeout {
        Some(0) => {
            return Err(EtherwalletError::ConfigError {
                reason: "--timeout must be greater than 0".into(),
            })
        }
        Some(secs) => Duration::from_secs(secs),
        None => opts.config.pow_timeout(),
    };

    let token = CancelToken::new();
    let limits = SearchLimits {
        cancel: Some(token.clone()),
        deadline: Instant::now().checked_add(timeout),
        max_iterations: args.max_iterations,
    };

    let data = args.data.into_bytes();
    let started = Instant::now();
    let mut task = tokio::task::spawn_blocking(move || search(&data, difficulty, &limits));

    let joined = tokio::select! {
        res = &mut task => res,
        Ok(()) = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupt received, cancelling search");
            token.cancel();
            task.await
        }
    };
    let proof = joined.map_err(|e| EtherwalletError::Cancelled {
        reason: format!("search task failed: {e}"),
    })??;

    output::print_fields(
        &[
            ("nonce", proof.nonce.to_string()),
            ("hash", proof.hash_hex),
            ("difficulty", proof.difficulty.to_string()),
            ("attempts", proof.attempts.to_string()),
            ("elapsed_ms", started.elapsed().as_millis().to_string()),
        ],
        opts.json,
    );
    Ok(())
}
